//! Worker binary support: role selection and environment configuration.

pub mod config;
