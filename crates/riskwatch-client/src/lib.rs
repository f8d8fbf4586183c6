//! Streaming client library for RiskWatch.
//!
//! Provides the HTTP client, the SSE record decoder, and the run tracker
//! that folds progress events into per-step state.

pub mod client;
pub mod decoder;
pub mod error;
pub mod tracker;

pub use client::RiskClient;
pub use decoder::RecordDecoder;
pub use error::ClientError;
pub use tracker::RunTracker;
