use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use serde_json::{Value, json};

use repomig_core::collab::{ConfirmationDialog, Notifier, SurfaceMask};
use repomig_core::context::ContextStore;
use repomig_core::event::{EventQueue, WizardEvent};
use repomig_core::phase::{PendingAction, Phase, PhaseController, PhaseState};
use repomig_core::plan::PlanModel;
use repomig_core::poller::ProgressPoller;
use repomig_core::selection::{Candidate, SelectionChange, SelectionError};
use repomig_core::step::{Advance, EnabledRule, StepDefinition, StepSequence, ValidationError};
use repomig_core::transport::Transport;

use crate::remote::{self, ServiceOverview};
use crate::steps::{
    ExecutionStep, KEY_DEFAULTS, KEY_EXECUTION, KEY_OVERVIEW, KEY_PREVIEW, KEY_REPOSITORIES,
    OverviewStep, PreviewStep, RepositoryDefaultsStep, STEP_EXECUTION, STEP_OVERVIEW,
    STEP_PREVIEW, STEP_REPOSITORY_DEFAULTS, STEP_SELECT_REPOSITORIES, SelectRepositoriesStep,
};

pub struct HostShell<'a> {
    pub dialog: &'a mut dyn ConfirmationDialog,
    pub mask: &'a mut dyn SurfaceMask,
    pub notifier: &'a mut dyn Notifier,
}

#[derive(Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    Activated(String),
    Invalid(ValidationError),
    Declined,
    TransportFailed,
    Finished,
}

#[derive(Debug, PartialEq, Eq)]
pub enum AbortOutcome {
    Declined,
    Aborted,
    TransportFailed,
}

#[derive(Debug, PartialEq, Eq)]
pub enum PollProgress {
    Idle,
    Updated,
    Finished,
    ExecutionFailed,
    FetchFailed,
}

pub struct MigrationWizard<'a> {
    transport: &'a dyn Transport,
    context: ContextStore,
    sequence: StepSequence,
    controller: PhaseController,
    poller: ProgressPoller,
    plan: Option<PlanModel>,
    events: EventQueue,
    finished: bool,
    overview: OverviewStep,
    select: SelectRepositoriesStep,
    defaults: RepositoryDefaultsStep,
    preview: PreviewStep,
    execution: ExecutionStep,
}

impl<'a> MigrationWizard<'a> {
    pub fn new(transport: &'a dyn Transport, poll_interval: Duration) -> Result<Self> {
        let mut context = ContextStore::new();
        let mut sequence = StepSequence::new();

        let definitions = [
            StepDefinition {
                id: STEP_OVERVIEW.to_string(),
                context_key: KEY_OVERVIEW.to_string(),
                enabled: true,
                enabled_when: None,
            },
            StepDefinition {
                id: STEP_SELECT_REPOSITORIES.to_string(),
                context_key: KEY_REPOSITORIES.to_string(),
                enabled: true,
                enabled_when: None,
            },
            StepDefinition {
                id: STEP_REPOSITORY_DEFAULTS.to_string(),
                context_key: KEY_DEFAULTS.to_string(),
                enabled: false,
                enabled_when: Some(EnabledRule {
                    key: KEY_REPOSITORIES.to_string(),
                    predicate: |value| {
                        value
                            .and_then(|value| value.get("in_scope"))
                            .and_then(Value::as_bool)
                            .unwrap_or(false)
                    },
                }),
            },
            StepDefinition {
                id: STEP_PREVIEW.to_string(),
                context_key: KEY_PREVIEW.to_string(),
                enabled: true,
                enabled_when: None,
            },
            StepDefinition {
                id: STEP_EXECUTION.to_string(),
                context_key: KEY_EXECUTION.to_string(),
                enabled: true,
                enabled_when: None,
            },
        ];
        for definition in definitions {
            sequence
                .register(&mut context, definition)
                .context("failed to register wizard step")?;
        }

        let mut controller = PhaseController::new();
        controller.activate().context("failed to start the prepare phase")?;

        let mut events = EventQueue::new();
        events.push(WizardEvent::PhaseChanged {
            phase: controller.phase(),
            state: controller.state(),
        });
        let first = sequence
            .activate_first()
            .context("no enabled step to start from")?;
        events.push(WizardEvent::StepActivated { id: first });

        Ok(Self {
            transport,
            context,
            sequence,
            controller,
            poller: ProgressPoller::new(poll_interval),
            plan: None,
            events,
            finished: false,
            overview: OverviewStep::default(),
            select: SelectRepositoriesStep::new(),
            defaults: RepositoryDefaultsStep::new(),
            preview: PreviewStep,
            execution: ExecutionStep::default(),
        })
    }

    pub fn active_step(&self) -> Option<&str> {
        self.sequence.active_id()
    }

    pub fn phase(&self) -> Phase {
        self.controller.phase()
    }

    pub fn phase_state(&self) -> PhaseState {
        self.controller.state()
    }

    pub fn plan(&self) -> Option<&PlanModel> {
        self.plan.as_ref()
    }

    pub fn context(&self) -> &ContextStore {
        &self.context
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn poll_interval(&self) -> Duration {
        self.poller.interval()
    }

    pub fn drain_events(&mut self) -> Vec<WizardEvent> {
        self.events.drain()
    }

    pub fn overview_info(&self) -> Option<&ServiceOverview> {
        self.overview.info()
    }

    pub fn repository_candidates(&self) -> &[Candidate] {
        self.select.candidates()
    }

    pub fn is_repository_selected(&self, id: &str) -> bool {
        self.select.is_selected(id)
    }

    pub fn include_contents(&self) -> bool {
        self.select.include_contents()
    }

    pub fn set_include_contents(&mut self, include_contents: bool) {
        self.select.set_include_contents(include_contents);
    }

    pub fn toggle_repository(&mut self, id: &str) -> Result<SelectionChange, SelectionError> {
        let change = self.select.toggle(id)?;
        self.push_selection_change(change);
        Ok(change)
    }

    pub fn select_all_repositories(&mut self) -> SelectionChange {
        let change = self.select.select_all_or_none();
        self.push_selection_change(change);
        change
    }

    pub fn repository_defaults(&self) -> &RepositoryDefaultsStep {
        &self.defaults
    }

    pub fn set_repository_defaults(&mut self, target_store: String, batch_size: u64) {
        self.defaults.target_store = target_store;
        self.defaults.batch_size = batch_size;
    }

    pub fn execution_started(&self) -> bool {
        self.execution.started()
    }

    pub fn prepare_active(&mut self, shell: &mut HostShell<'_>) -> Result<bool> {
        let active = self
            .active_step()
            .context("no active step to prepare")?
            .to_string();

        let result = match active.as_str() {
            STEP_OVERVIEW => {
                shell.mask.mask("Loading migration overview");
                let result = self.overview.prepare(self.transport);
                shell.mask.unmask();
                result
            }
            STEP_SELECT_REPOSITORIES => {
                shell.mask.mask("Loading repositories");
                let result = self.select.prepare(self.transport);
                shell.mask.unmask();
                result
            }
            STEP_REPOSITORY_DEFAULTS => {
                self.defaults.prepare(&self.context);
                Ok(())
            }
            _ => Ok(()),
        };

        match result {
            Ok(()) => Ok(true),
            Err(error) => {
                log::warn!("failed to prepare step '{active}': {error}");
                shell.notifier.notify_error(&format!("{error}"));
                Ok(false)
            }
        }
    }

    pub fn move_next(&mut self, shell: &mut HostShell<'_>) -> Result<MoveOutcome> {
        if self.finished {
            return Ok(MoveOutcome::Finished);
        }

        let active = self
            .active_step()
            .context("no active step to move from")?
            .to_string();

        let committed = match active.as_str() {
            STEP_OVERVIEW => self.overview.commit(),
            STEP_SELECT_REPOSITORIES => self.select.commit(),
            STEP_REPOSITORY_DEFAULTS => self.defaults.commit(),
            STEP_PREVIEW => self
                .preview
                .commit(self.plan.as_ref().map_or(0, |plan| plan.steps().len())),
            STEP_EXECUTION => {
                return Ok(MoveOutcome::Invalid(ValidationError::new(
                    "execution is driven by the migration service; wait for completion or abort",
                )));
            }
            other => bail!("unknown wizard step '{other}'"),
        };
        let value = match committed {
            Ok(value) => value,
            Err(error) => return Ok(MoveOutcome::Invalid(error)),
        };
        self.sequence
            .commit_active(&mut self.context, value)
            .context("failed to record step values")?;

        let next = self.sequence.peek_advance().map(str::to_string);
        match next.as_deref() {
            Some(STEP_PREVIEW) => self.begin_preview(shell),
            Some(STEP_EXECUTION) => self.begin_run(shell),
            _ => Ok(self.plain_advance()),
        }
    }

    pub fn move_back(&mut self) -> Result<Option<String>> {
        let on_execution = self
            .active_step()
            .context("no active step to move from")?
            == STEP_EXECUTION;
        if on_execution {
            return Ok(None);
        }

        let Some(id) = self.sequence.retreat() else {
            return Ok(None);
        };
        self.events.push(WizardEvent::StepActivated { id: id.clone() });
        Ok(Some(id))
    }

    pub fn abort(&mut self, shell: &mut HostShell<'_>) -> Result<AbortOutcome> {
        if self.finished {
            bail!("the wizard has already finished");
        }

        self.controller
            .request(PendingAction::Abort)
            .context("abort is not possible right now")?;
        self.emit_phase();

        let confirmed = shell.dialog.confirm(
            "Abort migration",
            "The migration run will be aborted on the server and this wizard will restart. Continue?",
        )?;
        if !confirmed {
            self.controller.decline().context("failed to decline abort")?;
            self.emit_phase();
            return Ok(AbortOutcome::Declined);
        }

        self.controller.accept().context("failed to confirm abort")?;
        self.emit_phase();
        shell.mask.mask("Aborting migration");
        let result = remote::abort_migration(self.transport);
        shell.mask.unmask();

        match result {
            Ok(()) => {
                self.controller
                    .complete_success()
                    .context("failed to record abort")?;
                self.emit_phase();

                self.poller.stop();
                self.plan = None;
                self.context.clear();
                self.overview.reset();
                self.select.reset();
                self.defaults.reset();
                self.preview.reset();
                self.execution.reset();
                self.sequence.reset_all(&mut self.context);

                self.controller.reset();
                self.controller
                    .activate()
                    .context("failed to restart the prepare phase")?;
                self.emit_phase();
                self.events.push(WizardEvent::WizardAborted);
                if let Some(id) = self.sequence.active_id() {
                    self.events.push(WizardEvent::StepActivated { id: id.to_string() });
                }
                shell.notifier.notify_success("Migration aborted");
                Ok(AbortOutcome::Aborted)
            }
            Err(error) => {
                log::warn!("abort call failed: {error}");
                self.controller
                    .complete_failure()
                    .context("failed to record abort failure")?;
                self.emit_phase();
                shell.notifier.notify_error(&format!("{error}"));
                Ok(AbortOutcome::TransportFailed)
            }
        }
    }

    pub fn poll_execution(
        &mut self,
        shell: &mut HostShell<'_>,
        now: Instant,
    ) -> Result<PollProgress> {
        let Some(ticket) = self.poller.begin_fetch(now) else {
            return Ok(PollProgress::Idle);
        };

        match remote::fetch_status(self.transport) {
            Ok(snapshot) => {
                self.poller.complete_fetch(ticket, now);
                let plan = self
                    .plan
                    .as_mut()
                    .context("no plan while polling execution")?;
                let refresh = plan.apply_snapshot(snapshot);
                if refresh.rejected_regressions > 0 {
                    log::debug!(
                        "status fetch carried {} regressive step transitions",
                        refresh.rejected_regressions
                    );
                }
                let settled = plan.is_settled();
                let failed = plan.has_failure();
                self.events.push(WizardEvent::PlanUpdated);

                if !settled {
                    return Ok(PollProgress::Updated);
                }

                self.poller.stop();
                if failed {
                    self.controller
                        .complete_monitoring(false)
                        .context("failed to record execution failure")?;
                    self.emit_phase();
                    shell
                        .notifier
                        .notify_error("Migration failed; see the plan log for details");
                    Ok(PollProgress::ExecutionFailed)
                } else {
                    self.controller
                        .complete_monitoring(true)
                        .context("failed to record execution success")?;
                    self.emit_phase();
                    self.finished = true;
                    self.context.clear();
                    self.events.push(WizardEvent::WizardFinished);
                    shell.notifier.notify_success("Migration completed");
                    Ok(PollProgress::Finished)
                }
            }
            Err(error) => {
                log::warn!("status fetch failed, stopping poll loop: {error}");
                self.poller.stop();
                self.controller
                    .complete_monitoring(false)
                    .context("failed to record fetch failure")?;
                self.emit_phase();
                shell.notifier.notify_error(&format!("{error}"));
                Ok(PollProgress::FetchFailed)
            }
        }
    }

    fn begin_preview(&mut self, shell: &mut HostShell<'_>) -> Result<MoveOutcome> {
        self.controller
            .request(PendingAction::Begin)
            .context("cannot compute the plan right now")?;
        self.emit_phase();

        let confirmed = shell.dialog.confirm(
            "Compute migration plan",
            "The service will compute a migration plan for the selected scope. Continue?",
        )?;
        if !confirmed {
            self.controller.decline().context("failed to decline")?;
            self.emit_phase();
            return Ok(MoveOutcome::Declined);
        }

        self.controller.accept().context("failed to confirm")?;
        self.emit_phase();
        shell.mask.mask("Computing migration plan");
        let result = remote::preview_migration(self.transport, self.preview_payload());
        shell.mask.unmask();

        match result {
            Ok(snapshot) => {
                self.plan = Some(PlanModel::from_snapshot(snapshot));
                self.controller
                    .complete_success()
                    .context("failed to record preview")?;
                self.controller
                    .advance_to(Phase::Preview)
                    .context("failed to enter the preview phase")?;
                self.controller
                    .activate()
                    .context("failed to activate the preview phase")?;
                self.emit_phase();
                self.events.push(WizardEvent::PlanUpdated);
                shell.notifier.notify_success("Migration plan computed");
                Ok(self.plain_advance())
            }
            Err(error) => {
                log::warn!("preview call failed: {error}");
                self.controller
                    .complete_failure()
                    .context("failed to record preview failure")?;
                self.emit_phase();
                shell.notifier.notify_error(&format!("{error}"));
                Ok(MoveOutcome::TransportFailed)
            }
        }
    }

    fn begin_run(&mut self, shell: &mut HostShell<'_>) -> Result<MoveOutcome> {
        self.controller
            .request(PendingAction::Begin)
            .context("cannot begin the migration right now")?;
        self.emit_phase();

        let confirmed = shell.dialog.confirm(
            "Begin migration",
            "The migration will start executing on the server and cannot be undone. Continue?",
        )?;
        if !confirmed {
            self.controller.decline().context("failed to decline")?;
            self.emit_phase();
            return Ok(MoveOutcome::Declined);
        }

        self.controller.accept().context("failed to confirm")?;
        self.emit_phase();
        shell.mask.mask("Starting migration");
        let result = remote::run_migration(self.transport, Value::Null);
        shell.mask.unmask();

        match result {
            Ok(()) => {
                self.execution.mark_started();
                let started_at = repomig_core::time::now_utc_rfc3339().unwrap_or_default();
                self.context
                    .set(KEY_EXECUTION, json!({ "started_at": started_at }));
                self.controller
                    .complete_success()
                    .context("failed to record run start")?;
                self.controller
                    .advance_to(Phase::Execute)
                    .context("failed to enter the execute phase")?;
                self.controller
                    .activate()
                    .context("failed to activate the execute phase")?;
                self.emit_phase();
                self.poller.start(Instant::now());
                shell.notifier.notify_success("Migration started");
                Ok(self.plain_advance())
            }
            Err(error) => {
                log::warn!("run call failed: {error}");
                self.controller
                    .complete_failure()
                    .context("failed to record run failure")?;
                self.emit_phase();
                shell.notifier.notify_error(&format!("{error}"));
                Ok(MoveOutcome::TransportFailed)
            }
        }
    }

    fn plain_advance(&mut self) -> MoveOutcome {
        match self.sequence.advance() {
            Advance::Activated(id) => {
                self.events.push(WizardEvent::StepActivated { id: id.clone() });
                MoveOutcome::Activated(id)
            }
            Advance::Finished => MoveOutcome::Finished,
        }
    }

    fn preview_payload(&self) -> Value {
        json!({
            "repositories": self.context.get(KEY_REPOSITORIES).cloned().unwrap_or(Value::Null),
            "defaults": self.context.get(KEY_DEFAULTS).cloned().unwrap_or(Value::Null),
        })
    }

    fn push_selection_change(&mut self, change: SelectionChange) {
        self.events.push(WizardEvent::SelectionChanged {
            selected: change.selected_count,
            delta: change.delta,
        });
    }

    fn emit_phase(&mut self) {
        self.events.push(WizardEvent::PhaseChanged {
            phase: self.controller.phase(),
            state: self.controller.state(),
        });
    }
}
