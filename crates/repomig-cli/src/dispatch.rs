use std::time::Duration;

use anyhow::Result;
use comfy_table::{Cell, ContentArrangement, Table};

use repomig_app::App;
use repomig_app::doctor::{self, DoctorReport};
use repomig_core::config::resolve_config_path;
use repomig_core::plan::PlanModel;
use repomig_core::time::now_utc_rfc3339;

use crate::cli::{Cli, Command};
use crate::http::UreqTransport;
use crate::prompt::InquirePromptDriver;
use crate::render;
use crate::screen;

pub fn run_with_deps(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Migrate => run_migrate_command(),
        Command::Status => run_status_command(),
        Command::Doctor => run_doctor_command(),
    }
}

fn run_migrate_command() -> Result<()> {
    let config = repomig_app::ensure_config_ready()?;
    let transport = UreqTransport::from_config(&config.remote);
    let app = App::new(&transport);
    let mut prompt = InquirePromptDriver::new();

    screen::run_migrate_with(
        &app,
        Duration::from_millis(config.poll.interval_ms),
        &mut prompt,
    )
}

fn run_status_command() -> Result<()> {
    let config = repomig_app::ensure_config_ready()?;
    let transport = UreqTransport::from_config(&config.remote);
    let app = App::new(&transport);

    let plan = PlanModel::from_snapshot(app.fetch_status()?);

    if plan.is_empty() {
        println!("No migration plan is active.");
        return Ok(());
    }

    println!("{}", render::plan_table(&plan));
    if let Ok(fetched_at) = now_utc_rfc3339() {
        println!("Fetched at {fetched_at}");
    }
    Ok(())
}

fn run_doctor_command() -> Result<()> {
    let config_path = resolve_config_path()?;
    let (mut checks, config) = doctor::config_checks(&config_path);

    if let Some(config) = config {
        let transport = UreqTransport::from_config(&config.remote);
        checks.push(doctor::remote_check(&transport));
    }

    let report = DoctorReport { checks };
    print_doctor_report(&report);
    Ok(())
}

fn print_doctor_report(report: &DoctorReport) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Check", "Status", "Details"]);

    for check in &report.checks {
        table.add_row(vec![
            Cell::new(check.name.as_str()),
            Cell::new(check.state.to_string()),
            Cell::new(check.details.as_str()),
        ]);
    }

    println!("{table}");
    println!("{}", report.summary());
}
