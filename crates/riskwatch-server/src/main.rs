//! RiskWatch Server
//!
//! Streams allergy risk checks to the dashboard over server-sent events.

use std::net::SocketAddr;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use riskwatch_server::config::{Config, GeminiConfig, SupabaseConfig};
use riskwatch_server::http::create_router;
use riskwatch_server::{AppState, ServerError};

/// RiskWatch allergy risk server.
#[derive(Parser, Debug)]
#[command(name = "riskwatch-server", about = "RiskWatch allergy risk server")]
struct Args {
    /// HTTP server address
    #[arg(long, env = "RISKWATCH_HTTP_ADDR", default_value = "0.0.0.0:8001")]
    http_addr: String,

    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    gemini_api_key: String,

    /// Gemini model name
    #[arg(long, env = "GEMINI_MODEL", default_value = "gemini-2.5-flash")]
    gemini_model: String,

    /// Supabase project URL
    #[arg(long, env = "SUPABASE_URL")]
    supabase_url: Option<String>,

    /// Supabase API key
    #[arg(long, env = "SUPABASE_KEY", hide_env_values = true)]
    supabase_key: Option<String>,

    /// Abort runs that take longer than this many seconds
    #[arg(long, env = "RISKWATCH_RUN_DEADLINE_SECS")]
    run_deadline_secs: Option<u64>,

    /// Seconds between SSE keep-alive comments
    #[arg(long, default_value = "15", value_parser = clap::value_parser!(u64).range(1..))]
    keep_alive_secs: u64,
}

impl Args {
    fn into_config(self) -> Config {
        let defaults = Config::default();

        let supabase = match (self.supabase_url, self.supabase_key) {
            (Some(url), Some(key)) if !url.is_empty() && !key.is_empty() => {
                Some(SupabaseConfig { url, key })
            }
            _ => None,
        };

        Config {
            http_bind_addr: self.http_addr,
            gemini: GeminiConfig {
                api_key: self.gemini_api_key,
                model: self.gemini_model,
                ..GeminiConfig::default()
            },
            supabase,
            run_deadline_secs: self.run_deadline_secs,
            keep_alive_secs: self.keep_alive_secs,
            ..defaults
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("riskwatch=info".parse()?))
        .with_target(true)
        .init();

    let config = args.into_config();
    let http_addr: SocketAddr = config
        .http_bind_addr
        .parse()
        .map_err(|_| ServerError::InvalidAddress(config.http_bind_addr.clone()))?;

    let state = AppState::from_config(&config)?;
    let router = create_router(state);

    info!(
        http_addr = %http_addr,
        model = %config.gemini.model,
        supabase = config.supabase.is_some(),
        "Starting RiskWatch server"
    );

    let listener = TcpListener::bind(http_addr).await.map_err(ServerError::Io)?;
    axum::serve(listener, router).await.map_err(ServerError::Io)?;

    Ok(())
}
