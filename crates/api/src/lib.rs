//! HTTP ingress and read surface for the task pipeline.
//!
//! The API never executes work; it writes `PENDING` rows, reads task
//! state, and computes stats on demand. All execution happens in the
//! worker binary against the same store.

pub mod config;
pub mod error;
pub mod router;
pub mod routes;
pub mod state;
