//! HTTP request handlers.

mod alerts;
mod health;
mod risk;

pub use alerts::alert_history;
pub use health::{health_check, metrics_handler, root};
pub use risk::{check_risk, check_risk_stream};
