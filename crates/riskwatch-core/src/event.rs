//! Progress events sent from the server to the client.
//!
//! Each event is serialized as one JSON object tagged by `type`:
//!
//! ```text
//! {"type": "step_start", "step": "fetch_enviro_data"}
//! {"type": "step_complete", "step": "fetch_enviro_data"}
//! {"type": "result", "data": {...}}
//! {"type": "error", "message": "..."}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::step::StepId;

/// A single message on the progress channel.
///
/// Step identifiers travel as plain strings so that a record naming a step
/// this build does not know still decodes; the client treats it as a no-op.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// A step is about to run.
    StepStart { step: String },
    /// A step finished successfully.
    StepComplete { step: String },
    /// Terminal: the aggregated result of the run.
    Result { data: Value },
    /// Terminal: the run was abandoned.
    Error { message: String },
}

impl StreamEvent {
    /// Create a StepStart event.
    pub fn step_start(step: StepId) -> Self {
        Self::StepStart {
            step: step.as_str().to_string(),
        }
    }

    /// Create a StepComplete event.
    pub fn step_complete(step: StepId) -> Self {
        Self::StepComplete {
            step: step.as_str().to_string(),
        }
    }

    /// Create a Result event.
    pub fn result(data: Value) -> Self {
        Self::Result { data }
    }

    /// Create an Error event.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Returns true for `result` and `error`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Result { .. } | Self::Error { .. })
    }

    /// The step referenced by a step event, if it is a known step.
    pub fn step_id(&self) -> Option<StepId> {
        match self {
            Self::StepStart { step } | Self::StepComplete { step } => step.parse().ok(),
            _ => None,
        }
    }

    /// Short name of the event kind, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::StepStart { .. } => "step_start",
            Self::StepComplete { .. } => "step_complete",
            Self::Result { .. } => "result",
            Self::Error { .. } => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_step_start_wire_format() {
        let event = StreamEvent::step_start(StepId::FetchEnviroData);
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value, json!({"type": "step_start", "step": "fetch_enviro_data"}));
    }

    #[test]
    fn test_result_and_error_wire_format() {
        let event = StreamEvent::result(json!({"advice": "Stay in"}));
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"type": "result", "data": {"advice": "Stay in"}})
        );

        let event = StreamEvent::error("boom");
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"type": "error", "message": "boom"})
        );
    }

    #[test]
    fn test_unknown_step_still_decodes() {
        let json = r#"{"type":"step_start","step":"calibrate"}"#;
        let event: StreamEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.step_id(), None);
        assert!(!event.is_terminal());
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        let json = r#"{"type":"step_complete","step":"done","name":"Done."}"#;
        let event: StreamEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.step_id(), Some(StepId::Done));
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let json = r#"{"type":"heartbeat"}"#;
        assert!(serde_json::from_str::<StreamEvent>(json).is_err());
    }
}
