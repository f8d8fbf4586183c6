//! Live air quality and pollen data from Open-Meteo, geocoded via Nominatim.

use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use serde::Deserialize;
use tracing::{debug, info};

use riskwatch_core::{EnvironmentData, PollenCount};

use crate::collaborators::{CollaboratorError, EnvironmentSource};

/// Nominatim search endpoint.
pub const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/search";

/// Open-Meteo air quality endpoint.
pub const AIR_QUALITY_URL: &str = "https://air-quality-api.open-meteo.com/v1/air-quality";

/// Nominatim's usage policy requires an identifying user agent.
const AGENT: &str = concat!("riskwatch/", env!("CARGO_PKG_VERSION"));

const CURRENT_FIELDS: &str = "us_aqi,pm2_5,pm10,ozone,dust";
const HOURLY_FIELDS: &str = "alder_pollen,grass_pollen,mugwort_pollen";

/// [`EnvironmentSource`] backed by Nominatim and Open-Meteo.
pub struct OpenMeteoSource {
    http: reqwest::Client,
    geocode_url: String,
    air_quality_url: String,
}

impl OpenMeteoSource {
    /// Create a source using the public endpoints.
    pub fn new(http: reqwest::Client) -> Self {
        Self::with_endpoints(http, NOMINATIM_URL, AIR_QUALITY_URL)
    }

    /// Create a source against custom endpoints.
    pub fn with_endpoints(http: reqwest::Client, geocode_url: &str, air_quality_url: &str) -> Self {
        Self {
            http,
            geocode_url: geocode_url.to_string(),
            air_quality_url: air_quality_url.to_string(),
        }
    }

    /// Resolve a place name to latitude/longitude.
    async fn geocode(&self, location: &str) -> Result<(f64, f64), CollaboratorError> {
        let response = self
            .http
            .get(&self.geocode_url)
            .header(USER_AGENT, AGENT)
            .query(&[("q", location), ("format", "json"), ("limit", "1")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CollaboratorError::Status {
                service: "Nominatim",
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let places: Vec<NominatimPlace> = response.json().await?;
        let place = places
            .into_iter()
            .next()
            .ok_or_else(|| CollaboratorError::LocationNotFound(location.to_string()))?;

        place.coordinates()
    }
}

#[async_trait]
impl EnvironmentSource for OpenMeteoSource {
    async fn fetch(&self, location: &str) -> Result<EnvironmentData, CollaboratorError> {
        let (lat, lon) = self.geocode(location).await?;
        debug!(location, lat, lon, "Geocoded location");

        let response = self
            .http
            .get(&self.air_quality_url)
            .query(&[
                ("latitude", lat.to_string()),
                ("longitude", lon.to_string()),
                ("current", CURRENT_FIELDS.to_string()),
                ("hourly", HOURLY_FIELDS.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CollaboratorError::Status {
                service: "Open-Meteo",
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let body: AirQualityResponse = response.json().await?;
        let data = environment_from_response(location, lat, lon, body);
        info!(location, aqi = data.aqi, pm2_5 = data.pm2_5, "Fetched live environment data");
        Ok(data)
    }
}

/// One Nominatim search hit. Coordinates arrive as strings.
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

impl NominatimPlace {
    fn coordinates(&self) -> Result<(f64, f64), CollaboratorError> {
        let lat = self.lat.parse::<f64>();
        let lon = self.lon.parse::<f64>();
        match (lat, lon) {
            (Ok(lat), Ok(lon)) => Ok((lat, lon)),
            _ => Err(CollaboratorError::MalformedResponse(format!(
                "invalid coordinates '{}', '{}'",
                self.lat, self.lon
            ))),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct AirQualityResponse {
    #[serde(default)]
    current: CurrentReadings,
    #[serde(default)]
    hourly: HourlyReadings,
}

#[derive(Debug, Default, Deserialize)]
struct CurrentReadings {
    us_aqi: Option<f64>,
    pm2_5: Option<f64>,
    pm10: Option<f64>,
    ozone: Option<f64>,
    dust: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct HourlyReadings {
    #[serde(default)]
    alder_pollen: Vec<Option<f64>>,
    #[serde(default)]
    grass_pollen: Vec<Option<f64>>,
    #[serde(default)]
    mugwort_pollen: Vec<Option<f64>>,
}

/// First hourly value, or zero when the series is missing or null.
fn next_hour(series: &[Option<f64>]) -> f64 {
    series.first().copied().flatten().unwrap_or(0.0)
}

fn environment_from_response(
    location: &str,
    lat: f64,
    lon: f64,
    body: AirQualityResponse,
) -> EnvironmentData {
    let current = body.current;
    let hourly = body.hourly;

    EnvironmentData {
        location_name: location.to_string(),
        lat,
        lon,
        aqi: current.us_aqi.unwrap_or(0.0),
        pm2_5: current.pm2_5.unwrap_or(0.0),
        pm10: current.pm10.unwrap_or(0.0),
        ozone: current.ozone.unwrap_or(0.0),
        dust: current.dust.unwrap_or(0.0),
        pollen_count: PollenCount {
            grass: next_hour(&hourly.grass_pollen),
            tree: next_hour(&hourly.alder_pollen),
            weed: next_hour(&hourly.mugwort_pollen),
        },
        status: "Live Data".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_from_full_response() {
        let json = r#"{
            "latitude": 42.36,
            "longitude": -71.06,
            "current": {"time": "2024-05-01T12:00", "us_aqi": 57, "pm2_5": 14.2, "pm10": 20.1, "ozone": 61.0, "dust": 2.0},
            "hourly": {
                "time": ["2024-05-01T00:00", "2024-05-01T01:00"],
                "alder_pollen": [3.5, 4.0],
                "grass_pollen": [41.0, 39.0],
                "mugwort_pollen": [null, 1.0]
            }
        }"#;
        let body: AirQualityResponse = serde_json::from_str(json).unwrap();
        let data = environment_from_response("Boston, MA", 42.36, -71.06, body);

        assert_eq!(data.aqi, 57.0);
        assert_eq!(data.pm2_5, 14.2);
        assert_eq!(data.pollen_count.grass, 41.0);
        assert_eq!(data.pollen_count.tree, 3.5);
        assert_eq!(data.pollen_count.weed, 0.0);
        assert_eq!(data.status, "Live Data");
    }

    #[test]
    fn test_environment_from_sparse_response() {
        let body: AirQualityResponse = serde_json::from_str(r#"{"current": {}}"#).unwrap();
        let data = environment_from_response("Nowhere", 0.0, 0.0, body);

        assert_eq!(data.aqi, 0.0);
        assert_eq!(data.pollen_count, PollenCount::default());
    }

    #[test]
    fn test_nominatim_coordinates_parse() {
        let places: Vec<NominatimPlace> =
            serde_json::from_str(r#"[{"lat":"42.3554334","lon":"-71.060511","display_name":"Boston"}]"#)
                .unwrap();
        let (lat, lon) = places[0].coordinates().unwrap();
        assert!((lat - 42.3554334).abs() < 1e-9);
        assert!((lon + 71.060511).abs() < 1e-9);

        let bad = NominatimPlace {
            lat: "north".to_string(),
            lon: "0".to_string(),
        };
        assert!(matches!(
            bad.coordinates(),
            Err(CollaboratorError::MalformedResponse(_))
        ));
    }
}
