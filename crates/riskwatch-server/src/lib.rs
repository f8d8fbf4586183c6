//! RiskWatch Server Library
//!
//! This crate provides the allergy risk check server: the step pipeline that
//! streams progress events, the collaborators it drives, and the HTTP layer.

pub mod collaborators;
pub mod config;
pub mod error;
pub mod http;
pub mod metrics;
pub mod pipeline;
pub mod providers;
pub mod state;
pub mod store;

pub use collaborators::{AdviceGenerator, CollaboratorError, EnvironmentSource, RiskAnalyzer, UserStore};
pub use config::Config;
pub use error::ServerError;
pub use metrics::RunMetrics;
pub use pipeline::{EventSink, Pipeline, RunOutcome, StepError};
pub use state::AppState;
pub use store::MemoryStore;
