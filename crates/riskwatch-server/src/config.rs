//! Server configuration.

use std::time::Duration;

use crate::providers::GEMINI_BASE_URL;

/// Gemini model settings.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key sent as `x-goog-api-key`.
    pub api_key: String,

    /// Model name, e.g. `gemini-2.5-flash`.
    pub model: String,

    /// Sampling temperature.
    pub temperature: f32,

    /// API base URL.
    pub base_url: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gemini-2.5-flash".to_string(),
            temperature: 0.7,
            base_url: GEMINI_BASE_URL.to_string(),
        }
    }
}

/// Supabase project credentials.
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://abc.supabase.co`.
    pub url: String,

    /// Service or anon key.
    pub key: String,
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP bind address.
    pub http_bind_addr: String,

    pub gemini: GeminiConfig,

    /// When absent, profiles and alerts are kept in memory.
    pub supabase: Option<SupabaseConfig>,

    /// Whole-run deadline (seconds). Unbounded when absent.
    pub run_deadline_secs: Option<u64>,

    /// Interval between SSE keep-alive comments (seconds).
    pub keep_alive_secs: u64,

    /// Timeout for each outbound collaborator request (seconds).
    pub upstream_timeout_secs: u64,
}

impl Config {
    pub fn run_deadline(&self) -> Option<Duration> {
        self.run_deadline_secs.map(Duration::from_secs)
    }

    /// Keep-alive interval, never shorter than one second.
    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs.max(1))
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_bind_addr: "0.0.0.0:8001".to_string(),
            gemini: GeminiConfig::default(),
            supabase: None,
            run_deadline_secs: None,
            keep_alive_secs: 15,
            upstream_timeout_secs: 60,
        }
    }
}
