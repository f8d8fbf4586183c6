//! In-process user store.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use tokio::sync::RwLock;

use riskwatch_core::{AlertRecord, UserId};

use crate::collaborators::{CollaboratorError, UserStore};

/// Alerts kept by [`MemoryStore::new`] before the oldest are evicted.
pub const DEFAULT_ALERT_CAPACITY: usize = 1000;

/// [`UserStore`] kept in memory.
///
/// Used when no database is configured. History is lost on restart and
/// bounded to a fixed number of alerts across all users.
pub struct MemoryStore {
    /// Allergy lists indexed by user.
    profiles: RwLock<HashMap<UserId, Vec<String>>>,

    /// Alerts in insertion order, oldest first.
    alerts: RwLock<VecDeque<AlertRecord>>,

    capacity: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_ALERT_CAPACITY)
    }
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store that keeps at most `capacity` alerts.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            profiles: RwLock::new(HashMap::new()),
            alerts: RwLock::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    /// Register or replace a user's allergy list.
    pub async fn set_profile(&self, user_id: UserId, allergies: Vec<String>) {
        self.profiles.write().await.insert(user_id, allergies);
    }

    /// Number of alerts logged across all users.
    pub async fn alert_count(&self) -> usize {
        self.alerts.read().await.len()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn user_allergies(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Vec<String>>, CollaboratorError> {
        Ok(self.profiles.read().await.get(user_id).cloned())
    }

    async fn log_alert(&self, record: AlertRecord) -> Result<(), CollaboratorError> {
        let mut alerts = self.alerts.write().await;
        while alerts.len() >= self.capacity {
            alerts.pop_front();
        }
        alerts.push_back(record);
        Ok(())
    }

    async fn alert_history(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<AlertRecord>, CollaboratorError> {
        let alerts = self.alerts.read().await;
        Ok(alerts
            .iter()
            .rev()
            .filter(|record| &record.user_id == user_id)
            .take(limit)
            .cloned()
            .collect())
    }
}
