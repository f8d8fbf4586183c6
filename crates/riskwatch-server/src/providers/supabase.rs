//! User profiles and alert history in Supabase, over its PostgREST API.

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use riskwatch_core::{AlertRecord, UserId};

use crate::collaborators::{CollaboratorError, UserStore};
use crate::config::SupabaseConfig;

/// [`UserStore`] backed by the `users` and `alert_logs` tables.
pub struct SupabaseStore {
    http: reqwest::Client,
    rest_url: String,
    key: String,
}

impl SupabaseStore {
    pub fn new(http: reqwest::Client, config: &SupabaseConfig) -> Self {
        Self {
            http,
            rest_url: format!("{}/rest/v1", config.url.trim_end_matches('/')),
            key: config.key.clone(),
        }
    }

    fn table(&self, name: &str) -> String {
        format!("{}/{}", self.rest_url, name)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.key)
            .header(AUTHORIZATION, format!("Bearer {}", self.key))
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, CollaboratorError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        Err(CollaboratorError::Status {
            service: "Supabase",
            status: status.as_u16(),
            body: response.text().await.unwrap_or_default(),
        })
    }
}

#[async_trait]
impl UserStore for SupabaseStore {
    async fn user_allergies(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Vec<String>>, CollaboratorError> {
        let filter = format!("eq.{}", user_id);
        let request = self
            .http
            .get(self.table("users"))
            .query(&[("id", filter.as_str()), ("select", "*")]);
        let response = Self::check(self.authorize(request).send().await?).await?;

        let rows: Vec<UserRow> = response.json().await?;
        let Some(row) = rows.into_iter().next() else {
            return Ok(None);
        };

        let allergies = allergies_from_profile(&row.allergy_profile);
        debug!(user_id = %user_id, count = allergies.len(), "Loaded stored allergy profile");
        Ok(Some(allergies))
    }

    async fn log_alert(&self, record: AlertRecord) -> Result<(), CollaboratorError> {
        let request = self
            .http
            .post(self.table("alert_logs"))
            .header("Prefer", "return=minimal")
            .json(&record);
        Self::check(self.authorize(request).send().await?).await?;
        Ok(())
    }

    async fn alert_history(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<AlertRecord>, CollaboratorError> {
        let filter = format!("eq.{}", user_id);
        let limit = limit.to_string();
        let request = self.http.get(self.table("alert_logs")).query(&[
            ("user_id", filter.as_str()),
            ("select", "*"),
            ("order", "timestamp.desc"),
            ("limit", limit.as_str()),
        ]);
        let response = Self::check(self.authorize(request).send().await?).await?;

        let records: Vec<AlertRecord> = response.json().await?;
        Ok(records)
    }
}

#[derive(Debug, Deserialize)]
struct UserRow {
    #[serde(default)]
    allergy_profile: Value,
}

/// Read the allergy list out of a `users.allergy_profile` JSONB value.
///
/// Accepts a bare list or an object with an `allergies` list. Non-string
/// entries are skipped; any other shape yields an empty list.
pub fn allergies_from_profile(profile: &Value) -> Vec<String> {
    let list = match profile {
        Value::Array(items) => items,
        Value::Object(map) => match map.get("allergies") {
            Some(Value::Array(items)) => items,
            _ => return Vec::new(),
        },
        _ => return Vec::new(),
    };

    list.iter()
        .filter_map(|item| item.as_str())
        .map(str::to_string)
        .collect()
}
