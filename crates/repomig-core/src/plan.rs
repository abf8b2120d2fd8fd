use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

pub const INDETERMINATE_COMPLETE: f64 = -1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanStepState {
    Initialized,
    Running,
    Completed,
    Error,
}

impl PlanStepState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Initialized => "INITIALIZED",
            Self::Running => "RUNNING",
            Self::Completed => "COMPLETED",
            Self::Error => "ERROR",
        }
    }

    fn accepts(self, next: Self) -> bool {
        if self == next {
            return true;
        }
        match self {
            Self::Initialized => true,
            Self::Running => next.is_terminal(),
            Self::Completed | Self::Error => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlanLogEntry {
    pub timestamp: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlanStepSnapshot {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub status: Option<String>,
    pub state: PlanStepState,
    #[serde(default = "indeterminate")]
    pub complete: f64,
    #[serde(default)]
    pub log: Vec<PlanLogEntry>,
}

fn indeterminate() -> f64 {
    INDETERMINATE_COMPLETE
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlanSnapshot {
    pub steps: Vec<PlanStepSnapshot>,
}

impl PlanSnapshot {
    pub fn from_value(value: &Value) -> Result<Self, PlanError> {
        serde_json::from_value(value.clone())
            .map_err(|source| PlanError::MalformedSnapshot { source })
    }
}

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("malformed plan snapshot: {source}")]
    MalformedSnapshot {
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlanStep {
    pub id: String,
    pub name: String,
    pub status: Option<String>,
    pub state: PlanStepState,
    pub complete: f64,
    log: Vec<PlanLogEntry>,
}

impl PlanStep {
    fn from_snapshot(snapshot: PlanStepSnapshot) -> Self {
        Self {
            id: snapshot.id,
            name: snapshot.name,
            status: snapshot.status,
            state: snapshot.state,
            complete: snapshot.complete,
            log: snapshot.log,
        }
    }

    pub fn log(&self) -> &[PlanLogEntry] {
        &self.log
    }

    pub fn is_indeterminate(&self) -> bool {
        self.complete < 0.0
    }

    fn merge_log(&mut self, incoming: Vec<PlanLogEntry>) -> usize {
        let mut appended = 0;
        for entry in incoming {
            if !self.log.contains(&entry) {
                self.log.push(entry);
                appended += 1;
            }
        }
        appended
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlanRefresh {
    pub appended_log_entries: usize,
    pub rejected_regressions: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlanModel {
    steps: Vec<PlanStep>,
}

impl PlanModel {
    pub fn from_snapshot(snapshot: PlanSnapshot) -> Self {
        Self {
            steps: snapshot
                .steps
                .into_iter()
                .map(PlanStep::from_snapshot)
                .collect(),
        }
    }

    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }

    pub fn step(&self, id: &str) -> Option<&PlanStep> {
        self.steps.iter().find(|step| step.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn has_failure(&self) -> bool {
        self.steps
            .iter()
            .any(|step| step.state == PlanStepState::Error)
    }

    pub fn is_settled(&self) -> bool {
        if self.steps.is_empty() {
            return false;
        }
        let running = self
            .steps
            .iter()
            .any(|step| step.state == PlanStepState::Running);
        if self.has_failure() {
            return !running;
        }
        self.steps
            .iter()
            .all(|step| step.state == PlanStepState::Completed)
    }

    pub fn apply_snapshot(&mut self, snapshot: PlanSnapshot) -> PlanRefresh {
        let mut refresh = PlanRefresh::default();

        for incoming in snapshot.steps {
            let Some(step) = self.steps.iter_mut().find(|step| step.id == incoming.id) else {
                self.steps.push(PlanStep::from_snapshot(incoming));
                continue;
            };

            if step.state.accepts(incoming.state) {
                step.name = incoming.name;
                step.status = incoming.status;
                step.state = incoming.state;
                step.complete = incoming.complete;
            } else {
                log::debug!(
                    "rejecting regressive plan step transition for '{}': {} -> {}",
                    step.id,
                    step.state.label(),
                    incoming.state.label()
                );
                refresh.rejected_regressions += 1;
            }

            refresh.appended_log_entries += step.merge_log(incoming.log);
        }

        refresh
    }
}
