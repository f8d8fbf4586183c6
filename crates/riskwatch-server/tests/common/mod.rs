//! Fake collaborators shared by the route tests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use riskwatch_core::{EnvironmentData, PollenCount, RiskAssessment, RiskLevel};
use riskwatch_server::{
    AdviceGenerator, AppState, CollaboratorError, EnvironmentSource, MemoryStore, Pipeline,
    RiskAnalyzer,
};

pub struct FakeSource;

#[async_trait]
impl EnvironmentSource for FakeSource {
    async fn fetch(&self, location: &str) -> Result<EnvironmentData, CollaboratorError> {
        if location == "Atlantis" {
            return Err(CollaboratorError::LocationNotFound(location.to_string()));
        }
        Ok(EnvironmentData {
            location_name: location.to_string(),
            aqi: 72.0,
            pm2_5: 18.5,
            pollen_count: PollenCount {
                grass: 45.0,
                tree: 3.0,
                weed: 1.0,
            },
            status: "Live Data".to_string(),
            ..Default::default()
        })
    }
}

pub struct FakeModel;

#[async_trait]
impl RiskAnalyzer for FakeModel {
    async fn analyze(
        &self,
        _location: &str,
        data: &EnvironmentData,
        _allergies: &[String],
    ) -> Result<RiskAssessment, CollaboratorError> {
        Ok(RiskAssessment {
            risk_level: RiskLevel::High,
            safe_duration: 30,
            reasoning: format!("Grass pollen at {}", data.pollen_count.grass),
        })
    }
}

#[async_trait]
impl AdviceGenerator for FakeModel {
    async fn advise(
        &self,
        location: &str,
        _risk: &RiskAssessment,
    ) -> Result<String, CollaboratorError> {
        Ok(format!("Wear a mask in {}.", location))
    }
}

/// App state over fakes, plus the store for seeding and inspection.
pub fn test_state() -> (Arc<AppState>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let model = Arc::new(FakeModel);
    let pipeline = Pipeline::new(Arc::new(FakeSource), model.clone(), model, store.clone());
    let state = AppState::new(pipeline, store.clone(), Duration::from_secs(15));
    (state, store)
}
