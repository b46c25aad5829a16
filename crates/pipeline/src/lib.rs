//! The task lifecycle pipeline: dispatcher, execution engines, and the
//! stats aggregator.
//!
//! Each component is an independent polling loop against the shared
//! `TaskStore`; the components never talk to each other except through
//! row state. One active instance per role is assumed (the claim
//! protocol has no fencing tokens).

pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod executor;
pub mod stats;

pub use config::{DispatcherConfig, EngineConfig};
pub use dispatcher::Dispatcher;
pub use engine::ExecutionEngine;
pub use executor::{BoundedExecutor, Isolation, Workload};
pub use stats::{StatsAggregator, Summary};
