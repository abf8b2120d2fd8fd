use anyhow::{Context, Result, anyhow, bail};

use repomig_core::config::{RepomigConfig, load_config, resolve_config_path};
use repomig_core::plan::PlanSnapshot;
use repomig_core::transport::Transport;

pub mod doctor;
pub mod remote;
pub mod steps;
pub mod wizard;

pub use wizard::{AbortOutcome, HostShell, MigrationWizard, MoveOutcome, PollProgress};

pub fn ensure_config_ready() -> Result<RepomigConfig> {
    let config_path = resolve_config_path().context("failed to resolve config path")?;

    if !config_path.exists() {
        bail!(
            "missing config at {}\nCreate ~/.config/repomig/config.toml with the remote endpoint. See README.md for setup instructions.",
            config_path.display()
        );
    }

    load_config(&config_path).map_err(|error| {
        anyhow!(
            "invalid config at {}: {error}\nFix the config and retry. See README.md for setup instructions.",
            config_path.display()
        )
    })
}

pub struct App<'a> {
    pub transport: &'a dyn Transport,
}

impl<'a> App<'a> {
    pub fn new(transport: &'a dyn Transport) -> Self {
        Self { transport }
    }

    pub fn start_wizard(
        &self,
        poll_interval: std::time::Duration,
    ) -> Result<MigrationWizard<'a>> {
        MigrationWizard::new(self.transport, poll_interval)
    }

    pub fn fetch_status(&self) -> Result<PlanSnapshot> {
        remote::fetch_status(self.transport).context("failed to fetch the migration status")
    }
}
