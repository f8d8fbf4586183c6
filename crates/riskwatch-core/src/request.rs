//! Risk check request and its validated form.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::ids::UserId;

/// Request body for both risk check endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskCheckRequest {
    /// Free-form location, e.g. "Boston, MA".
    pub location: String,

    /// Stored profile to resolve allergies from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    /// Allergy terms supplied directly by the caller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allergies: Option<Vec<String>>,
}

impl RiskCheckRequest {
    /// Request for a location and explicit allergy list.
    pub fn new(location: impl Into<String>, allergies: Vec<String>) -> Self {
        Self {
            location: location.into(),
            user_id: None,
            allergies: Some(allergies),
        }
    }

    /// Attach a user identifier.
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// The user id, if present and not blank.
    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(UserId::from)
    }
}

/// Validated run parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunInput {
    pub location: String,
    pub allergies: Vec<String>,
    pub user_id: Option<UserId>,
}

impl RunInput {
    /// Validate raw parameters.
    ///
    /// The location and every allergy term are trimmed; blank terms are
    /// dropped. Fails if the location or the remaining list is empty.
    pub fn validate(
        location: &str,
        allergies: &[String],
        user_id: Option<UserId>,
    ) -> Result<Self, CoreError> {
        let location = location.trim();
        if location.is_empty() {
            return Err(CoreError::InvalidInput(
                "location must not be empty".to_string(),
            ));
        }

        let allergies: Vec<String> = allergies
            .iter()
            .map(|term| term.trim())
            .filter(|term| !term.is_empty())
            .map(String::from)
            .collect();
        if allergies.is_empty() {
            return Err(CoreError::InvalidInput(
                "allergies must not be empty".to_string(),
            ));
        }

        Ok(Self {
            location: location.to_string(),
            allergies,
            user_id,
        })
    }
}
