//! RiskWatch Core Domain Types
//!
//! This crate contains the types shared by the server and the client:
//! - The fixed step catalog and step/run status enums
//! - The progress event wire schema
//! - Request validation and the risk report payload
//!
//! Nothing here touches the network or an async runtime.

pub mod error;
pub mod event;
pub mod ids;
pub mod report;
pub mod request;
pub mod status;
pub mod step;

// Re-export commonly used types
pub use error::CoreError;
pub use event::StreamEvent;
pub use ids::{RunId, UserId};
pub use report::{AlertRecord, EnvironmentData, PollenCount, RiskAssessment, RiskLevel, RiskReport};
pub use request::{RiskCheckRequest, RunInput};
pub use status::{RunPhase, StepStatus};
pub use step::{Step, StepId};
