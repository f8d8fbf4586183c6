//! Client-side state of one risk check run.
//!
//! [`RunTracker::apply`] is the only way events change the state. Step
//! statuses only move forward (`pending → active → completed`), at most one
//! step is active, and every step before an active or completed step is
//! completed.

use serde_json::Value;
use tracing::debug;

use riskwatch_core::{RiskReport, RunPhase, Step, StepId, StepStatus, StreamEvent};

/// Step list and outcome of the current run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunTracker {
    steps: Vec<Step>,
    phase: RunPhase,
    result: Option<Value>,
    error: Option<String>,
}

impl Default for RunTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl RunTracker {
    /// Idle tracker with every step pending.
    pub fn new() -> Self {
        Self {
            steps: StepId::ALL.iter().copied().map(Step::pending).collect(),
            phase: RunPhase::Idle,
            result: None,
            error: None,
        }
    }

    /// Start a new run: clear everything and wait for the first event.
    pub fn begin(&mut self) {
        *self = Self::new();
        self.phase = RunPhase::Connecting;
    }

    /// Back to idle.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Apply one event. Events after a terminal outcome are ignored.
    pub fn apply(&mut self, event: StreamEvent) {
        if self.phase.is_terminal() {
            debug!(kind = event.kind(), "Ignoring event after terminal outcome");
            return;
        }
        if matches!(self.phase, RunPhase::Idle | RunPhase::Connecting) {
            self.phase = RunPhase::Streaming;
        }

        match event {
            StreamEvent::StepStart { step } => match step.parse::<StepId>() {
                Ok(id) => self.start_step(id),
                Err(_) => debug!(step = %step, "Ignoring unknown step"),
            },
            StreamEvent::StepComplete { step } => match step.parse::<StepId>() {
                Ok(id) => self.complete_through(id),
                Err(_) => debug!(step = %step, "Ignoring unknown step"),
            },
            StreamEvent::Result { data } => {
                self.result = Some(data);
                self.phase = RunPhase::Succeeded;
            }
            StreamEvent::Error { message } => {
                self.error = Some(message);
                self.phase = RunPhase::Failed;
            }
        }
    }

    /// Owned form of [`apply`](Self::apply), for replaying a recorded stream.
    pub fn fold(mut self, event: StreamEvent) -> Self {
        self.apply(event);
        self
    }

    /// Fail the run because the transport broke.
    pub fn fail_transport(&mut self, message: impl Into<String>) {
        if self.phase.is_terminal() {
            return;
        }
        self.error = Some(message.into());
        self.phase = RunPhase::Failed;
    }

    /// Mark `id` active, completing every earlier step.
    ///
    /// Earlier steps are forced to completed so a lost `step_complete`
    /// does not leave them hanging. A start for a step that already
    /// finished, or that a later step has overtaken, is stale and ignored.
    fn start_step(&mut self, id: StepId) {
        let index = id.index();
        let stale = self.steps[index].status.is_done()
            || self.steps[index + 1..]
                .iter()
                .any(|s| s.status != StepStatus::Pending);
        if stale {
            debug!(step = %id, "Ignoring stale step start");
            return;
        }

        for step in &mut self.steps[..index] {
            step.status = StepStatus::Completed;
        }
        self.steps[index].status = StepStatus::Active;
    }

    /// Mark `id` and any earlier stragglers completed.
    fn complete_through(&mut self, id: StepId) {
        for step in &mut self.steps[..=id.index()] {
            step.status = StepStatus::Completed;
        }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn status_of(&self, id: StepId) -> StepStatus {
        self.steps[id.index()].status
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Raw `result` payload, once the run succeeded.
    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    /// The payload as a typed report, if it has that shape.
    pub fn report(&self) -> Option<RiskReport> {
        let data = self.result.as_ref()?;
        serde_json::from_value(data.clone()).ok()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// True while waiting for or receiving events.
    pub fn is_loading(&self) -> bool {
        self.phase.is_in_progress()
    }

    pub fn active_step(&self) -> Option<StepId> {
        self.steps
            .iter()
            .find(|s| s.status == StepStatus::Active)
            .map(|s| s.id)
    }
}
