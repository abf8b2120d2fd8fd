use std::fmt;
use std::path::Path;

use repomig_core::config::{RepomigConfig, load_config};
use repomig_core::transport::Transport;

use crate::remote;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckState {
    Pass,
    Fail,
}

impl fmt::Display for CheckState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass => write!(f, "PASS"),
            Self::Fail => write!(f, "FAIL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoctorCheck {
    pub name: String,
    pub state: CheckState,
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoctorReport {
    pub checks: Vec<DoctorCheck>,
}

impl DoctorReport {
    pub fn has_failures(&self) -> bool {
        self.checks
            .iter()
            .any(|check| check.state == CheckState::Fail)
    }

    pub fn summary(&self) -> String {
        let passed = self
            .checks
            .iter()
            .filter(|check| check.state == CheckState::Pass)
            .count();
        let failed = self.checks.len().saturating_sub(passed);
        format!("{passed} passed, {failed} failed")
    }
}

pub fn config_checks(config_path: &Path) -> (Vec<DoctorCheck>, Option<RepomigConfig>) {
    let mut checks = Vec::new();

    if !config_path.exists() {
        checks.push(fail_check(
            "config file exists",
            format!("not found at {}", config_path.display()),
        ));
        return (checks, None);
    }
    checks.push(pass_check(
        "config file exists",
        format!("found at {}", config_path.display()),
    ));

    match load_config(config_path) {
        Ok(config) => {
            checks.push(pass_check("config parses and validates", "config is valid"));
            (checks, Some(config))
        }
        Err(error) => {
            checks.push(fail_check("config parses and validates", error.to_string()));
            (checks, None)
        }
    }
}

pub fn remote_check(transport: &dyn Transport) -> DoctorCheck {
    match remote::ping(transport) {
        Ok(()) => pass_check("migration service responds", "ping answered"),
        Err(error) => fail_check("migration service responds", error.to_string()),
    }
}

fn pass_check(name: &str, details: impl Into<String>) -> DoctorCheck {
    DoctorCheck {
        name: name.to_string(),
        state: CheckState::Pass,
        details: details.into(),
    }
}

fn fail_check(name: &str, details: impl Into<String>) -> DoctorCheck {
    DoctorCheck {
        name: name.to_string(),
        state: CheckState::Fail,
        details: details.into(),
    }
}
