//! Shared domain types, errors, and the simulated workload routines.
//!
//! This crate has zero internal dependencies; everything else in the
//! workspace builds on top of it.

pub mod error;
pub mod types;
pub mod workload;
