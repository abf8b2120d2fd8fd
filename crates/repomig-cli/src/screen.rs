use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Result, bail};

use repomig_app::steps::{
    STEP_EXECUTION, STEP_OVERVIEW, STEP_PREVIEW, STEP_REPOSITORY_DEFAULTS,
    STEP_SELECT_REPOSITORIES,
};
use repomig_app::{AbortOutcome, App, HostShell, MigrationWizard, MoveOutcome, PollProgress};
use repomig_core::collab::{ConfirmationDialog, Notifier, SurfaceMask};
use repomig_core::phase::PhaseState;

use crate::prompt::PromptDriver;
use crate::render;

struct PromptDialog<'p> {
    prompt: &'p mut dyn PromptDriver,
}

impl ConfirmationDialog for PromptDialog<'_> {
    fn confirm(&mut self, title: &str, message: &str) -> Result<bool> {
        println!("\n== {title} ==");
        self.prompt.confirm(message, false)
    }
}

#[derive(Default)]
struct ConsoleMask;

impl SurfaceMask for ConsoleMask {
    fn mask(&mut self, message: &str) {
        println!("... {message}");
    }

    fn unmask(&mut self) {}
}

#[derive(Default)]
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify_success(&mut self, text: &str) {
        println!("{text}");
    }

    fn notify_error(&mut self, text: &str) {
        eprintln!("{text}");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScreenSignal {
    Continue,
    Quit,
}

fn with_shell<T>(
    prompt: &mut dyn PromptDriver,
    operation: impl FnOnce(&mut HostShell<'_>) -> Result<T>,
) -> Result<T> {
    let mut dialog = PromptDialog { prompt };
    let mut mask = ConsoleMask;
    let mut notifier = ConsoleNotifier;
    let mut shell = HostShell {
        dialog: &mut dialog,
        mask: &mut mask,
        notifier: &mut notifier,
    };
    operation(&mut shell)
}

pub(crate) fn run_migrate_with(
    app: &App<'_>,
    poll_interval: Duration,
    prompt: &mut dyn PromptDriver,
) -> Result<()> {
    let mut wizard = app.start_wizard(poll_interval)?;

    loop {
        for event in wizard.drain_events() {
            log::debug!("wizard event: {event:?}");
        }

        if wizard.is_finished() {
            if let Some(plan) = wizard.plan() {
                println!("{}", render::plan_table(plan));
            }
            println!("Migration finished.");
            return Ok(());
        }
        if wizard.phase_state() == PhaseState::Failed {
            if let Some(plan) = wizard.plan() {
                println!("{}", render::plan_table(plan));
            }
            bail!("the migration did not complete; inspect the plan output above");
        }

        let Some(step) = wizard.active_step().map(str::to_string) else {
            bail!("the wizard has no active step");
        };

        let signal = match step.as_str() {
            STEP_OVERVIEW => overview_screen(&mut wizard, prompt)?,
            STEP_SELECT_REPOSITORIES => select_screen(&mut wizard, prompt)?,
            STEP_REPOSITORY_DEFAULTS => defaults_screen(&mut wizard, prompt)?,
            STEP_PREVIEW => preview_screen(&mut wizard, prompt)?,
            STEP_EXECUTION => execution_screen(&mut wizard, prompt)?,
            other => bail!("unknown wizard step '{other}'"),
        };

        if signal == ScreenSignal::Quit {
            return Ok(());
        }
    }
}

fn overview_screen(
    wizard: &mut MigrationWizard<'_>,
    prompt: &mut dyn PromptDriver,
) -> Result<ScreenSignal> {
    if !with_shell(prompt, |shell| wizard.prepare_active(shell))? {
        return retry_or_quit(prompt);
    }

    if let Some(info) = wizard.overview_info() {
        println!("\n{}", render::overview_summary(info));
    }

    match prompt.select(
        "Repository storage migration",
        &options(&["Continue", "Quit"]),
    )? {
        0 => {
            advance(wizard, prompt)?;
            Ok(ScreenSignal::Continue)
        }
        _ => Ok(ScreenSignal::Quit),
    }
}

fn select_screen(
    wizard: &mut MigrationWizard<'_>,
    prompt: &mut dyn PromptDriver,
) -> Result<ScreenSignal> {
    if !with_shell(prompt, |shell| wizard.prepare_active(shell))? {
        return retry_or_quit(prompt);
    }

    println!(
        "\n{}",
        render::candidates_table(wizard.repository_candidates(), &|id| {
            wizard.is_repository_selected(id)
        })
    );

    let include = prompt.confirm(
        "Include repository contents in the migration?",
        wizard.include_contents(),
    )?;
    wizard.set_include_contents(include);

    if include {
        let supported = wizard
            .repository_candidates()
            .iter()
            .filter(|candidate| candidate.supported)
            .map(|candidate| (candidate.name.clone(), candidate.id.clone()))
            .collect::<Vec<_>>();
        let labels = supported.iter().map(|(name, _)| name.clone()).collect::<Vec<_>>();
        let preselected = supported
            .iter()
            .enumerate()
            .filter(|(_, (_, id))| wizard.is_repository_selected(id))
            .map(|(position, _)| position)
            .collect::<Vec<_>>();

        let chosen = prompt.multi_select("Select repositories to migrate", &labels, &preselected)?;
        for (position, (_, id)) in supported.iter().enumerate() {
            let want = chosen.contains(&position);
            if want != wizard.is_repository_selected(id) {
                if let Err(error) = wizard.toggle_repository(id) {
                    log::debug!("toggle rejected for '{id}': {error}");
                }
            }
        }
    }

    next_back_or_abort(wizard, prompt)
}

fn defaults_screen(
    wizard: &mut MigrationWizard<'_>,
    prompt: &mut dyn PromptDriver,
) -> Result<ScreenSignal> {
    with_shell(prompt, |shell| wizard.prepare_active(shell))?;

    let target_store = prompt.input(
        "Target blob store name",
        &wizard.repository_defaults().target_store,
    )?;
    let batch_raw = prompt.input(
        "Batch size",
        &wizard.repository_defaults().batch_size.to_string(),
    )?;
    let batch_size = batch_raw.trim().parse::<u64>().unwrap_or(0);
    wizard.set_repository_defaults(target_store, batch_size);

    next_back_or_abort(wizard, prompt)
}

fn preview_screen(
    wizard: &mut MigrationWizard<'_>,
    prompt: &mut dyn PromptDriver,
) -> Result<ScreenSignal> {
    if let Some(plan) = wizard.plan() {
        println!("\n{}", render::plan_table(plan));
    }

    match prompt.select(
        "Migration plan",
        &options(&["Begin migration", "Back", "Abort"]),
    )? {
        0 => advance(wizard, prompt)?,
        1 => {
            wizard.move_back()?;
        }
        _ => request_abort(wizard, prompt)?,
    }
    Ok(ScreenSignal::Continue)
}

fn execution_screen(
    wizard: &mut MigrationWizard<'_>,
    prompt: &mut dyn PromptDriver,
) -> Result<ScreenSignal> {
    loop {
        let progress = with_shell(prompt, |shell| {
            wizard.poll_execution(shell, Instant::now())
        })?;

        match progress {
            PollProgress::Updated => {
                if let Some(plan) = wizard.plan() {
                    println!("\n{}", render::plan_table(plan));
                }
            }
            PollProgress::Finished
            | PollProgress::ExecutionFailed
            | PollProgress::FetchFailed => return Ok(ScreenSignal::Continue),
            PollProgress::Idle => {}
        }

        thread::sleep(wizard.poll_interval());
    }
}

fn next_back_or_abort(
    wizard: &mut MigrationWizard<'_>,
    prompt: &mut dyn PromptDriver,
) -> Result<ScreenSignal> {
    match prompt.select("Next", &options(&["Continue", "Back", "Abort"]))? {
        0 => advance(wizard, prompt)?,
        1 => {
            wizard.move_back()?;
        }
        _ => request_abort(wizard, prompt)?,
    }
    Ok(ScreenSignal::Continue)
}

fn advance(wizard: &mut MigrationWizard<'_>, prompt: &mut dyn PromptDriver) -> Result<()> {
    let outcome = with_shell(prompt, |shell| wizard.move_next(shell))?;
    match outcome {
        MoveOutcome::Invalid(error) => println!("{error}"),
        MoveOutcome::Declined => println!("Cancelled."),
        _ => {}
    }
    Ok(())
}

fn request_abort(wizard: &mut MigrationWizard<'_>, prompt: &mut dyn PromptDriver) -> Result<()> {
    let outcome = with_shell(prompt, |shell| wizard.abort(shell))?;
    if outcome == AbortOutcome::Aborted {
        println!("The wizard returned to the first screen.");
    }
    Ok(())
}

fn retry_or_quit(prompt: &mut dyn PromptDriver) -> Result<ScreenSignal> {
    if prompt.select("Loading failed", &options(&["Retry", "Quit"]))? == 0 {
        Ok(ScreenSignal::Continue)
    } else {
        Ok(ScreenSignal::Quit)
    }
}

fn options(labels: &[&str]) -> Vec<String> {
    labels.iter().map(|label| (*label).to_string()).collect()
}
