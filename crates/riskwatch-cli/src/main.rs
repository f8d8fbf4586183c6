//! RiskWatch CLI - Command line interface for the RiskWatch server.

use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use riskwatch_client::{RiskClient, RunTracker};
use riskwatch_core::{RiskCheckRequest, RiskReport, RunPhase, Step, StepStatus};

/// RiskWatch CLI - Allergy risk checks from the terminal
#[derive(Parser)]
#[command(name = "riskwatch")]
#[command(about = "CLI for the RiskWatch allergy risk server", long_about = None)]
struct Cli {
    /// Server base URL
    #[arg(short, long, env = "RISKWATCH_SERVER", default_value = "http://localhost:8001")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a risk check, showing progress as it streams
    Check {
        /// Location to check, e.g. "Boston, MA"
        #[arg(short, long)]
        location: String,

        /// Allergy term (repeatable)
        #[arg(short, long = "allergy")]
        allergies: Vec<String>,

        /// Use the stored profile of this user
        #[arg(short, long)]
        user_id: Option<String>,

        /// Give up after this many seconds
        #[arg(short, long, default_value = "120")]
        timeout: u64,
    },

    /// Show recent alerts for a user
    History {
        /// User ID
        #[arg(short, long)]
        user_id: String,

        /// Maximum number of alerts
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Check that the server is up
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("riskwatch=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let client = RiskClient::new(&cli.server);

    match cli.command {
        Commands::Check {
            location,
            allergies,
            user_id,
            timeout,
        } => {
            let mut request = RiskCheckRequest::new(location, allergies);
            if let Some(user_id) = user_id {
                request = request.with_user_id(user_id);
            }
            check(&client, request, Duration::from_secs(timeout)).await?;
        }
        Commands::History { user_id, limit } => {
            history(&client, &user_id, limit).await?;
        }
        Commands::Health => {
            health(&client).await?;
        }
    }

    Ok(())
}

async fn check(
    client: &RiskClient,
    request: RiskCheckRequest,
    timeout: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("Checking allergy risk for {}", request.location);

    let mut tracker = RunTracker::new();
    let mut printed: Vec<Step> = tracker.steps().to_vec();

    let streamed = tokio::time::timeout(
        timeout,
        client.stream_check(&request, &mut tracker, |t| {
            for step in changed_steps(&printed, t.steps()) {
                print_step(&step);
            }
            printed = t.steps().to_vec();
        }),
    )
    .await;

    match streamed {
        Err(_) => {
            return Err(format!("Risk check timed out after {}s", timeout.as_secs()).into());
        }
        Ok(Err(e)) => return Err(e.into()),
        Ok(Ok(())) => {}
    }

    match tracker.phase() {
        RunPhase::Succeeded => {
            println!();
            match tracker.report() {
                Some(report) => print_report(&report),
                None => {
                    let raw = tracker.result().cloned().unwrap_or_default();
                    println!("{}", serde_json::to_string_pretty(&raw)?);
                }
            }
            Ok(())
        }
        RunPhase::Failed => {
            let message = tracker.error().unwrap_or("unknown error");
            Err(format!("Risk check failed: {}", message).into())
        }
        _ => Err("Stream ended before the risk check finished".into()),
    }
}

async fn history(
    client: &RiskClient,
    user_id: &str,
    limit: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let alerts = client.alert_history(user_id, limit).await?;

    println!("Alerts for {} ({}):", user_id, alerts.len());
    println!("{:<17}  {:<9}  {:>5}  {}", "TIME", "RISK", "AQI", "LOCATION");
    println!("{}", "-".repeat(60));

    for alert in alerts {
        let time = alert
            .timestamp
            .with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M")
            .to_string();
        println!(
            "{:<17}  {:<9}  {:>5.0}  {}",
            time,
            alert.risk_level.as_str(),
            alert.aqi_snapshot.aqi,
            alert.location
        );
    }

    Ok(())
}

async fn health(client: &RiskClient) -> Result<(), Box<dyn std::error::Error>> {
    if client.health().await? {
        println!("{} is healthy", client.base_url());
        Ok(())
    } else {
        Err(format!("{} is not healthy", client.base_url()).into())
    }
}

/// Steps whose status differs between two snapshots, in pipeline order.
fn changed_steps(before: &[Step], after: &[Step]) -> Vec<Step> {
    after
        .iter()
        .zip(before)
        .filter(|(now, then)| now.status != then.status)
        .map(|(now, _)| *now)
        .collect()
}

fn print_step(step: &Step) {
    let marker = match step.status {
        StepStatus::Pending => "[ ]",
        StepStatus::Active => "[>]",
        StepStatus::Completed => "[x]",
    };
    println!("  {} {}", marker, step.name());
}

fn print_report(report: &RiskReport) {
    let risk = &report.risk_assessment;
    let data = &report.weather_data;

    println!("  Location:     {}", report.location);
    println!("  Allergies:    {}", report.user_allergies.join(", "));
    println!("  Risk level:   {}", risk.risk_level);
    println!("  Safe outside: {} min", risk.safe_duration);
    println!("  AQI:          {:.0}", data.aqi);
    println!("  PM2.5:        {:.1} µg/m³", data.pm2_5);
    println!(
        "  Pollen:       grass {:.0}, tree {:.0}, weed {:.0}",
        data.pollen_count.grass, data.pollen_count.tree, data.pollen_count.weed
    );
    println!("  Reasoning:    {}", risk.reasoning);
    println!();
    println!("{}", report.advice);
}

#[cfg(test)]
mod tests {
    use super::*;
    use riskwatch_core::{StepId, StreamEvent};

    #[test]
    fn test_changed_steps_reports_only_transitions() {
        let mut tracker = RunTracker::new();
        tracker.begin();
        let before = tracker.steps().to_vec();

        tracker.apply(StreamEvent::step_start(StepId::FetchEnviroData));
        tracker.apply(StreamEvent::step_start(StepId::AnalyzeRisk));

        let changes = changed_steps(&before, tracker.steps());
        let ids: Vec<_> = changes.iter().map(|s| (s.id, s.status)).collect();
        assert_eq!(
            ids,
            vec![
                (StepId::FetchEnviroData, StepStatus::Completed),
                (StepId::AnalyzeRisk, StepStatus::Active),
            ]
        );

        assert!(changed_steps(tracker.steps(), tracker.steps()).is_empty());
    }

    #[test]
    fn test_cli_parses_repeated_allergies() {
        let cli = Cli::parse_from([
            "riskwatch",
            "check",
            "--location",
            "Boston, MA",
            "--allergy",
            "grass",
            "--allergy",
            "dust",
        ]);

        match cli.command {
            Commands::Check {
                location,
                allergies,
                user_id,
                timeout,
            } => {
                assert_eq!(location, "Boston, MA");
                assert_eq!(allergies, vec!["grass", "dust"]);
                assert!(user_id.is_none());
                assert_eq!(timeout, 120);
            }
            _ => panic!("expected check command"),
        }
    }
}
