//! Ports for the external services a risk check depends on.
//!
//! The pipeline only sees these traits. Real implementations live in
//! [`crate::providers`]; tests supply small fakes.

use async_trait::async_trait;
use thiserror::Error;

use riskwatch_core::{AlertRecord, EnvironmentData, RiskAssessment, UserId};

/// Failure reported by a collaborator.
///
/// The `Display` text is what the client sees in the `error` event.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    /// Network or decoding failure talking to an upstream API.
    #[error("API request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream API answered with a non-success status.
    #[error("{service} returned HTTP {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    /// Geocoding found nothing for the location.
    #[error("Could not find coordinates for {0}")]
    LocationNotFound(String),

    /// Upstream answered but the payload was not usable.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Service is not configured or not reachable.
    #[error("{0}")]
    Unavailable(String),
}

/// Retrieves live environmental data for a location.
#[async_trait]
pub trait EnvironmentSource: Send + Sync {
    async fn fetch(&self, location: &str) -> Result<EnvironmentData, CollaboratorError>;
}

/// Turns environmental data and an allergy list into a risk assessment.
#[async_trait]
pub trait RiskAnalyzer: Send + Sync {
    async fn analyze(
        &self,
        location: &str,
        data: &EnvironmentData,
        allergies: &[String],
    ) -> Result<RiskAssessment, CollaboratorError>;
}

/// Writes short advice text for an assessment.
#[async_trait]
pub trait AdviceGenerator: Send + Sync {
    async fn advise(
        &self,
        location: &str,
        risk: &RiskAssessment,
    ) -> Result<String, CollaboratorError>;
}

/// User profiles and alert history.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Allergies stored for a user, or `None` when the user is unknown.
    async fn user_allergies(&self, user_id: &UserId)
        -> Result<Option<Vec<String>>, CollaboratorError>;

    /// Append an alert to the user's history.
    async fn log_alert(&self, record: AlertRecord) -> Result<(), CollaboratorError>;

    /// Most recent alerts first.
    async fn alert_history(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<AlertRecord>, CollaboratorError>;
}
