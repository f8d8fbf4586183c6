//! Result payload of a risk check and the alert log record derived from it.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::CoreError;
use crate::ids::UserId;

/// Pollen concentration in grains/m³.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PollenCount {
    pub grass: f64,
    pub tree: f64,
    pub weed: f64,
}

/// Live environmental readings for a location.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentData {
    pub location_name: String,
    pub lat: f64,
    pub lon: f64,
    /// US AQI; above 100 is unhealthy.
    pub aqi: f64,
    pub pm2_5: f64,
    pub pm10: f64,
    #[serde(default)]
    pub ozone: f64,
    #[serde(default)]
    pub dust: f64,
    pub pollen_count: PollenCount,
    pub status: String,
}

/// Overall allergy risk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    #[default]
    Moderate,
    High,
    Severe,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
            Self::Severe => "severe",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "moderate" => Ok(Self::Moderate),
            "high" => Ok(Self::High),
            "severe" => Ok(Self::Severe),
            other => Err(CoreError::Serialization(format!(
                "unknown risk level '{}'",
                other
            ))),
        }
    }
}

// Model output is not always lowercase.
impl<'de> Deserialize<'de> for RiskLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Risk assessment produced by the analysis step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub risk_level: RiskLevel,
    /// Maximum safe outdoor exposure in minutes.
    #[serde(deserialize_with = "minutes_from_number")]
    pub safe_duration: u32,
    pub reasoning: String,
}

fn minutes_from_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let value = f64::deserialize(deserializer)?;
    if !value.is_finite() || value < 0.0 {
        return Err(serde::de::Error::custom(format!(
            "safe_duration must be a non-negative number, got {}",
            value
        )));
    }
    Ok(value.round().min(f64::from(u32::MAX)) as u32)
}

/// Aggregated output of a successful run, carried by the `result` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskReport {
    pub location: String,
    pub user_allergies: Vec<String>,
    pub weather_data: EnvironmentData,
    pub risk_assessment: RiskAssessment,
    pub advice: String,
}

/// One row of a user's alert history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub user_id: UserId,
    pub location: String,
    pub risk_level: RiskLevel,
    pub aqi_snapshot: EnvironmentData,
    pub timestamp: DateTime<Utc>,
}

impl AlertRecord {
    /// Build the alert row for a finished report.
    pub fn from_report(user_id: UserId, report: &RiskReport) -> Self {
        Self {
            user_id,
            location: report.location.clone(),
            risk_level: report.risk_assessment.risk_level,
            aqi_snapshot: report.weather_data.clone(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_level_parse_is_case_insensitive() {
        assert_eq!("HIGH".parse::<RiskLevel>().unwrap(), RiskLevel::High);
        assert_eq!(" Severe ".parse::<RiskLevel>().unwrap(), RiskLevel::Severe);
        assert!("extreme".parse::<RiskLevel>().is_err());
    }

    #[test]
    fn test_assessment_rounds_fractional_minutes() {
        let json = r#"{"risk_level":"Moderate","safe_duration":45.6,"reasoning":"PM2.5 elevated"}"#;
        let assessment: RiskAssessment = serde_json::from_str(json).unwrap();
        assert_eq!(assessment.risk_level, RiskLevel::Moderate);
        assert_eq!(assessment.safe_duration, 46);
    }

    #[test]
    fn test_assessment_rejects_negative_minutes() {
        let json = r#"{"risk_level":"low","safe_duration":-5,"reasoning":"x"}"#;
        assert!(serde_json::from_str::<RiskAssessment>(json).is_err());
    }

    #[test]
    fn test_alert_record_from_report() {
        let report = RiskReport {
            location: "Boston, MA".to_string(),
            user_allergies: vec!["pollen".to_string()],
            weather_data: EnvironmentData {
                aqi: 42.0,
                ..Default::default()
            },
            risk_assessment: RiskAssessment {
                risk_level: RiskLevel::Low,
                safe_duration: 120,
                reasoning: "Clean air".to_string(),
            },
            advice: "Enjoy the day.".to_string(),
        };

        let record = AlertRecord::from_report(UserId::new("u1"), &report);
        assert_eq!(record.location, "Boston, MA");
        assert_eq!(record.risk_level, RiskLevel::Low);
        assert_eq!(record.aqi_snapshot.aqi, 42.0);
    }
}
