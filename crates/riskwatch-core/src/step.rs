//! The fixed step catalog shared by both ends of the progress channel.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::status::StepStatus;

/// Identifier of a pipeline step.
///
/// The variant order is the pipeline order and never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepId {
    /// Geocode the location and read live air-quality and pollen data.
    FetchEnviroData,
    /// Ask the model for a risk level and safe outdoor duration.
    AnalyzeRisk,
    /// Ask the model for a short actionable alert.
    GenerateAdvice,
    /// Assemble the final report.
    Done,
}

impl StepId {
    /// All steps in pipeline order.
    pub const ALL: [StepId; 4] = [
        StepId::FetchEnviroData,
        StepId::AnalyzeRisk,
        StepId::GenerateAdvice,
        StepId::Done,
    ];

    /// Identifier as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FetchEnviroData => "fetch_enviro_data",
            Self::AnalyzeRisk => "analyze_risk",
            Self::GenerateAdvice => "generate_advice",
            Self::Done => "done",
        }
    }

    /// Position of this step in the pipeline.
    pub fn index(&self) -> usize {
        match self {
            Self::FetchEnviroData => 0,
            Self::AnalyzeRisk => 1,
            Self::GenerateAdvice => 2,
            Self::Done => 3,
        }
    }

    /// Human-readable label. Local to the client, never transmitted.
    pub fn label(&self) -> &'static str {
        match self {
            Self::FetchEnviroData => "Scanning Local Sensors...",
            Self::AnalyzeRisk => "Immunologist AI Analyzing...",
            Self::GenerateAdvice => "Finalizing Safety Report...",
            Self::Done => "Done.",
        }
    }

    /// Secondary description shown under the label.
    pub fn description(&self) -> &'static str {
        match self {
            Self::FetchEnviroData => "Connecting to OpenMeteo satellite data",
            Self::AnalyzeRisk => "Evaluating PM2.5 & Pollen risks",
            Self::GenerateAdvice => "Generating actionable advice",
            Self::Done => "Report ready",
        }
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StepId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| CoreError::UnknownStep(s.to_string()))
    }
}

/// One step of a run with its client-observed status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub id: StepId,
    pub status: StepStatus,
}

impl Step {
    /// A step that has not started.
    pub fn pending(id: StepId) -> Self {
        Self {
            id,
            status: StepStatus::Pending,
        }
    }

    /// Display name for the step.
    pub fn name(&self) -> &'static str {
        self.id.label()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_order() {
        for (i, id) in StepId::ALL.iter().enumerate() {
            assert_eq!(id.index(), i);
        }
        assert_eq!(StepId::ALL[0].as_str(), "fetch_enviro_data");
        assert_eq!(StepId::ALL[3].as_str(), "done");
    }

    #[test]
    fn test_parse_known_and_unknown() {
        assert_eq!("analyze_risk".parse::<StepId>().unwrap(), StepId::AnalyzeRisk);
        assert!(matches!(
            "warm_up".parse::<StepId>(),
            Err(CoreError::UnknownStep(s)) if s == "warm_up"
        ));
    }

    #[test]
    fn test_serde_matches_wire_id() {
        for id in StepId::ALL {
            let json = serde_json::to_string(&id).unwrap();
            assert_eq!(json, format!("\"{}\"", id.as_str()));
        }
    }
}
