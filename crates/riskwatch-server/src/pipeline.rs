//! Step pipeline that streams progress for one risk check.
//!
//! A run resolves and validates its input, then executes [`StepId::ALL`]
//! strictly in order. Every step is bracketed by `step_start` and
//! `step_complete`; the run ends with exactly one `result` or `error`.
//! Nothing is emitted after the terminal event, and nothing at all once the
//! client has gone away.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info, info_span, warn, Instrument};

use riskwatch_core::{
    AlertRecord, EnvironmentData, RiskAssessment, RiskCheckRequest, RiskReport, RunId, RunInput,
    StepId, StreamEvent,
};

use crate::collaborators::{
    AdviceGenerator, CollaboratorError, EnvironmentSource, RiskAnalyzer, UserStore,
};
use crate::metrics::RunMetrics;

/// Why a run did not produce a result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepError {
    /// Input rejected before any step ran.
    #[error("{0}")]
    Validation(String),

    /// A collaborator failed; the message is passed through verbatim.
    #[error("{message}")]
    Collaborator { step: StepId, message: String },

    /// A step panicked.
    #[error("Unexpected error during {0}")]
    Panicked(StepId),

    /// The profile lookup panicked before any step ran.
    #[error("Unexpected error during profile lookup")]
    LookupPanicked,

    /// The run exceeded its configured deadline.
    #[error("Risk check timed out after {0}s")]
    DeadlineExceeded(u64),

    /// The report could not be serialized.
    #[error("Failed to encode result: {0}")]
    Encode(String),

    /// The client disconnected.
    #[error("Client disconnected")]
    Cancelled,
}

impl StepError {
    /// The step that failed, if the failure belongs to one.
    pub fn step(&self) -> Option<StepId> {
        match self {
            Self::Collaborator { step, .. } | Self::Panicked(step) => Some(*step),
            _ => None,
        }
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// `result` was emitted.
    Succeeded(RiskReport),
    /// `error` was emitted.
    Failed(StepError),
    /// The client went away; no terminal event was delivered.
    Cancelled,
}

/// Sending half of a run's event channel.
#[derive(Debug)]
pub struct EventSink {
    tx: mpsc::Sender<StreamEvent>,
}

impl EventSink {
    /// Create a sink and the receiver that feeds the HTTP response.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<StreamEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// Deliver one event, failing once the receiver is gone.
    pub async fn emit(&self, event: StreamEvent) -> Result<(), StepError> {
        self.tx.send(event).await.map_err(|_| StepError::Cancelled)
    }

    /// Resolves when the receiver has been dropped.
    pub async fn closed(&self) {
        self.tx.closed().await
    }
}

/// The risk check pipeline.
///
/// Holds no per-run state; one instance serves any number of concurrent runs.
pub struct Pipeline {
    source: Arc<dyn EnvironmentSource>,
    analyzer: Arc<dyn RiskAnalyzer>,
    advisor: Arc<dyn AdviceGenerator>,
    store: Arc<dyn UserStore>,
    metrics: Arc<RunMetrics>,
    deadline: Option<Duration>,
}

impl Pipeline {
    /// Create a pipeline over the given collaborators.
    pub fn new(
        source: Arc<dyn EnvironmentSource>,
        analyzer: Arc<dyn RiskAnalyzer>,
        advisor: Arc<dyn AdviceGenerator>,
        store: Arc<dyn UserStore>,
    ) -> Self {
        Self {
            source,
            analyzer,
            advisor,
            store,
            metrics: Arc::new(RunMetrics::new()),
            deadline: None,
        }
    }

    /// Abort runs that take longer than `deadline`.
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Record outcomes into shared counters.
    pub fn with_metrics(mut self, metrics: Arc<RunMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &Arc<RunMetrics> {
        &self.metrics
    }

    /// Execute one run, streaming its events into `sink`.
    ///
    /// The sink is dropped on return, which ends the event stream.
    pub async fn run(&self, request: RiskCheckRequest, sink: EventSink) -> RunOutcome {
        let run_id = RunId::generate();
        let span = info_span!("risk_run", run_id = %run_id, location = %request.location);

        async move {
            let active = self.metrics.start_run();
            info!(user_id = ?request.user_id, "Risk check started");

            let executed = match self.deadline {
                Some(deadline) => {
                    match tokio::time::timeout(deadline, self.execute(&request, &sink)).await {
                        Ok(result) => result,
                        Err(_) => Err(StepError::DeadlineExceeded(deadline.as_secs())),
                    }
                }
                None => self.execute(&request, &sink).await,
            };

            let outcome = match executed {
                Ok(report) => self.finish_success(report, &sink).await,
                Err(e) => self.finish_failure(e, &sink).await,
            };

            match &outcome {
                RunOutcome::Succeeded(_) => {
                    active.succeeded();
                    info!("Risk check completed");
                }
                RunOutcome::Failed(e) => {
                    active.failed();
                    warn!(error = %e, step = ?e.step(), "Risk check failed");
                }
                RunOutcome::Cancelled => {
                    active.cancelled();
                    info!("Risk check cancelled by client");
                }
            }

            outcome
        }
        .instrument(span)
        .await
    }

    async fn finish_success(&self, report: RiskReport, sink: &EventSink) -> RunOutcome {
        let data = match serde_json::to_value(&report) {
            Ok(data) => data,
            Err(e) => return self.finish_failure(StepError::Encode(e.to_string()), sink).await,
        };

        match sink.emit(StreamEvent::result(data)).await {
            Ok(()) => RunOutcome::Succeeded(report),
            Err(_) => RunOutcome::Cancelled,
        }
    }

    async fn finish_failure(&self, e: StepError, sink: &EventSink) -> RunOutcome {
        if e == StepError::Cancelled {
            return RunOutcome::Cancelled;
        }

        match sink.emit(StreamEvent::error(e.to_string())).await {
            Ok(()) => RunOutcome::Failed(e),
            Err(_) => RunOutcome::Cancelled,
        }
    }

    async fn execute(
        &self,
        request: &RiskCheckRequest,
        sink: &EventSink,
    ) -> Result<RiskReport, StepError> {
        let input = self.resolve_input(request).await?;

        let data = self
            .step(sink, StepId::FetchEnviroData, self.source.fetch(&input.location))
            .await?;

        let risk = self
            .step(
                sink,
                StepId::AnalyzeRisk,
                self.analyzer
                    .analyze(&input.location, &data, &input.allergies),
            )
            .await?;

        let advice = self
            .step(
                sink,
                StepId::GenerateAdvice,
                self.advisor.advise(&input.location, &risk),
            )
            .await?;

        self.step(sink, StepId::Done, async move {
            Ok::<_, CollaboratorError>(self.assemble(input, data, risk, advice))
        })
        .await
    }

    /// Run one step's work between its start and complete events.
    async fn step<T, F>(&self, sink: &EventSink, step: StepId, work: F) -> Result<T, StepError>
    where
        F: Future<Output = Result<T, CollaboratorError>>,
    {
        sink.emit(StreamEvent::step_start(step)).await?;
        debug!(step = %step, "Step started");

        let guarded = AssertUnwindSafe(work).catch_unwind();
        let result = tokio::select! {
            _ = sink.closed() => return Err(StepError::Cancelled),
            result = guarded => result,
        };

        match result {
            Ok(Ok(value)) => {
                sink.emit(StreamEvent::step_complete(step)).await?;
                debug!(step = %step, "Step completed");
                Ok(value)
            }
            Ok(Err(e)) => Err(StepError::Collaborator {
                step,
                message: e.to_string(),
            }),
            Err(_) => {
                error!(step = %step, "Step panicked");
                Err(StepError::Panicked(step))
            }
        }
    }

    /// Resolve the allergy list and validate the request.
    ///
    /// A stored profile wins over the request body. Lookup failures fall
    /// back to the request body; a panicking lookup ends the run.
    async fn resolve_input(&self, request: &RiskCheckRequest) -> Result<RunInput, StepError> {
        let user_id = request.user_id();
        let mut allergies = Vec::new();

        if let Some(user_id) = &user_id {
            let lookup = AssertUnwindSafe(self.store.user_allergies(user_id))
                .catch_unwind()
                .await;
            match lookup {
                Ok(Ok(Some(stored))) => allergies = stored,
                Ok(Ok(None)) => debug!(user_id = %user_id, "No stored profile"),
                Ok(Err(e)) => warn!(user_id = %user_id, error = %e, "Profile lookup failed"),
                Err(_) => {
                    error!(user_id = %user_id, "Profile lookup panicked");
                    return Err(StepError::LookupPanicked);
                }
            }
        }

        if allergies.iter().all(|term| term.trim().is_empty()) {
            allergies = request.allergies.clone().unwrap_or_default();
        }

        RunInput::validate(&request.location, &allergies, user_id)
            .map_err(|e| StepError::Validation(e.to_string()))
    }

    fn assemble(
        &self,
        input: RunInput,
        data: EnvironmentData,
        risk: RiskAssessment,
        advice: String,
    ) -> RiskReport {
        let report = RiskReport {
            location: input.location,
            user_allergies: input.allergies,
            weather_data: data,
            risk_assessment: risk,
            advice,
        };

        if let Some(user_id) = input.user_id {
            self.log_alert(AlertRecord::from_report(user_id, &report));
        }

        report
    }

    /// Fire-and-forget alert write. Failures never reach the client.
    fn log_alert(&self, record: AlertRecord) {
        let store = Arc::clone(&self.store);
        tokio::spawn(
            async move {
                let user_id = record.user_id.clone();
                if let Err(e) = store.log_alert(record).await {
                    warn!(user_id = %user_id, error = %e, "Failed to log alert");
                }
            }
            .in_current_span(),
        );
    }
}
