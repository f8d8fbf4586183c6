//! Status enums for Steps and Runs.

use serde::{Deserialize, Serialize};

/// Status of one pipeline step as observed by the client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Step has not started yet.
    #[default]
    Pending,
    /// Step is currently executing.
    Active,
    /// Step finished successfully.
    Completed,
}

impl StepStatus {
    /// Returns true once the step has finished.
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// Phase of a run from the client's point of view.
///
/// `Idle -> Connecting -> Streaming -> {Succeeded | Failed}`. Only starting
/// a new run leaves a terminal phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    /// No run has been started.
    #[default]
    Idle,
    /// Request sent, no event parsed yet.
    Connecting,
    /// At least one event has been parsed.
    Streaming,
    /// A `result` event arrived.
    Succeeded,
    /// An `error` event arrived or the transport failed.
    Failed,
}

impl RunPhase {
    /// Returns true if the run is in a terminal phase.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// Returns true while the run is waiting for its terminal event.
    pub fn is_in_progress(&self) -> bool {
        matches!(self, Self::Connecting | Self::Streaming)
    }
}
