//! Risk check handlers: streaming (SSE) and non-streaming.

use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use futures_util::stream::{self, Stream, StreamExt};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{error, warn};

use riskwatch_core::{RiskCheckRequest, StreamEvent};

use crate::http::error::ApiError;
use crate::pipeline::{EventSink, RunOutcome};
use crate::state::{AppState, EVENT_BUFFER};

/// Type alias for boxed SSE stream.
type SseEventStream = Pin<Box<dyn Stream<Item = Result<Event, Infallible>> + Send>>;

/// Fallback record when an event cannot be encoded.
const ENCODE_FAILURE: &str = r#"{"type":"error","message":"Failed to encode event"}"#;

/// Encode one event as a `data:` record.
fn to_sse_event(event: &StreamEvent) -> Event {
    match Event::default().json_data(event) {
        Ok(sse) => sse,
        Err(e) => {
            error!(error = %e, kind = event.kind(), "Failed to encode stream event");
            Event::default().data(ENCODE_FAILURE)
        }
    }
}

/// POST /api/check-risk-stream - Run a risk check, streaming progress.
///
/// Always answers `200 text/event-stream`; every failure, including a
/// malformed body, arrives as a single `error` event.
pub async fn check_risk_stream(
    State(state): State<Arc<AppState>>,
    json_result: Result<Json<RiskCheckRequest>, JsonRejection>,
) -> Sse<SseEventStream> {
    let keep_alive = KeepAlive::new().interval(state.keep_alive);

    let request = match json_result {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!(error = %rejection, "Invalid JSON in request body");
            let message = format!("Invalid request: {}", rejection.body_text());
            let error_stream: SseEventStream = Box::pin(stream::once(async move {
                Ok::<_, Infallible>(to_sse_event(&StreamEvent::error(message)))
            }));
            return Sse::new(error_stream).keep_alive(keep_alive);
        }
    };

    let (sink, rx) = EventSink::channel(EVENT_BUFFER);
    let pipeline = state.pipeline.clone();

    // Dropping the response drops `rx`, which cancels the run.
    tokio::spawn(async move {
        pipeline.run(request, sink).await;
    });

    let sse_stream: SseEventStream = Box::pin(
        ReceiverStream::new(rx).map(|event| Ok::<_, Infallible>(to_sse_event(&event))),
    );

    Sse::new(sse_stream).keep_alive(keep_alive)
}

/// POST /api/check-risk - Run a risk check and return the report.
pub async fn check_risk(
    State(state): State<Arc<AppState>>,
    json_result: Result<Json<RiskCheckRequest>, JsonRejection>,
) -> Response {
    let request = match json_result {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!(error = %rejection, "Invalid JSON in request body");
            return ApiError::InvalidJson {
                message: rejection.body_text(),
            }
            .into_response();
        }
    };

    let (sink, mut rx) = EventSink::channel(EVENT_BUFFER);

    // Progress events are not needed here; keep the channel drained.
    let drain = async move { while rx.recv().await.is_some() {} };
    let (outcome, ()) = tokio::join!(state.pipeline.run(request, sink), drain);

    match outcome {
        RunOutcome::Succeeded(report) => Json(report).into_response(),
        RunOutcome::Failed(e) => ApiError::from(e).into_response(),
        RunOutcome::Cancelled => ApiError::Internal {
            message: "Risk check was cancelled".to_string(),
        }
        .into_response(),
    }
}
