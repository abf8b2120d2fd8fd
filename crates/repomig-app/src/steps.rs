use serde_json::{Value, json};

use repomig_core::context::ContextStore;
use repomig_core::selection::{
    Candidate, SelectionChange, SelectionConstraintModel, SelectionError,
};
use repomig_core::step::ValidationError;
use repomig_core::transport::Transport;

use crate::remote::{self, RemoteError, ServiceOverview};

pub const STEP_OVERVIEW: &str = "overview";
pub const STEP_SELECT_REPOSITORIES: &str = "select-repositories";
pub const STEP_REPOSITORY_DEFAULTS: &str = "repository-defaults";
pub const STEP_PREVIEW: &str = "preview";
pub const STEP_EXECUTION: &str = "execution";

pub const KEY_OVERVIEW: &str = "overview";
pub const KEY_REPOSITORIES: &str = "repositories";
pub const KEY_DEFAULTS: &str = "defaults";
pub const KEY_PREVIEW: &str = "preview";
pub const KEY_EXECUTION: &str = "execution";

pub const DEFAULT_BATCH_SIZE: u64 = 100;
const MAX_BATCH_SIZE: u64 = 10_000;

#[derive(Debug, Default)]
pub struct OverviewStep {
    info: Option<ServiceOverview>,
}

impl OverviewStep {
    pub fn prepare(&mut self, transport: &dyn Transport) -> Result<(), RemoteError> {
        self.info = Some(remote::fetch_overview(transport)?);
        Ok(())
    }

    pub fn info(&self) -> Option<&ServiceOverview> {
        self.info.as_ref()
    }

    pub fn commit(&self) -> Result<Value, ValidationError> {
        let info = self
            .info
            .as_ref()
            .ok_or_else(|| ValidationError::new("service overview has not been loaded yet"))?;
        Ok(json!({
            "acknowledged": true,
            "service_version": info.service_version,
            "target_model": info.target_model,
        }))
    }

    pub fn reset(&mut self) {
        self.info = None;
    }
}

#[derive(Debug)]
pub struct SelectRepositoriesStep {
    model: SelectionConstraintModel,
    include_contents: bool,
    loaded: bool,
}

impl SelectRepositoriesStep {
    pub fn new() -> Self {
        Self {
            model: SelectionConstraintModel::new(),
            include_contents: true,
            loaded: false,
        }
    }

    pub fn prepare(&mut self, transport: &dyn Transport) -> Result<(), RemoteError> {
        if self.loaded {
            return Ok(());
        }
        self.refresh(transport)
    }

    pub fn refresh(&mut self, transport: &dyn Transport) -> Result<(), RemoteError> {
        let candidates = remote::fetch_repositories(transport)?;
        self.model.reload(candidates);
        self.loaded = true;
        Ok(())
    }

    pub fn candidates(&self) -> &[Candidate] {
        self.model.candidates()
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.model.is_selected(id)
    }

    pub fn selected_count(&self) -> usize {
        self.model.selected_count()
    }

    pub fn include_contents(&self) -> bool {
        self.include_contents
    }

    pub fn set_include_contents(&mut self, include_contents: bool) {
        self.include_contents = include_contents;
    }

    pub fn toggle(&mut self, id: &str) -> Result<SelectionChange, SelectionError> {
        let version = self.model.version();
        self.model.toggle(version, id)
    }

    pub fn select_all_or_none(&mut self) -> SelectionChange {
        self.model.select_all_or_none()
    }

    pub fn commit(&self) -> Result<Value, ValidationError> {
        if !self.loaded {
            return Err(ValidationError::new(
                "the repository list has not been loaded yet",
            ));
        }
        if self.include_contents && self.model.selected_count() == 0 {
            return Err(ValidationError::new(
                "select at least one repository, or exclude repository contents",
            ));
        }

        let selected = if self.include_contents {
            self.model.selection()
        } else {
            Vec::new()
        };
        Ok(json!({
            "in_scope": self.include_contents,
            "selected": selected,
        }))
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for SelectRepositoriesStep {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct RepositoryDefaultsStep {
    pub target_store: String,
    pub batch_size: u64,
}

impl RepositoryDefaultsStep {
    pub fn new() -> Self {
        Self {
            target_store: String::new(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn prepare(&mut self, context: &ContextStore) {
        let Some(committed) = context.get(KEY_DEFAULTS) else {
            return;
        };
        if let Some(target_store) = committed.get("target_store").and_then(Value::as_str) {
            self.target_store = target_store.to_string();
        }
        if let Some(batch_size) = committed.get("batch_size").and_then(Value::as_u64) {
            self.batch_size = batch_size;
        }
    }

    pub fn commit(&self) -> Result<Value, ValidationError> {
        let target_store = self.target_store.trim();
        if target_store.is_empty() {
            return Err(ValidationError::new("target blob store must be named"));
        }
        if self.batch_size == 0 || self.batch_size > MAX_BATCH_SIZE {
            return Err(ValidationError::new(format!(
                "batch size must be between 1 and {MAX_BATCH_SIZE}"
            )));
        }
        Ok(json!({
            "target_store": target_store,
            "batch_size": self.batch_size,
        }))
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for RepositoryDefaultsStep {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default)]
pub struct PreviewStep;

impl PreviewStep {
    pub fn commit(&self, plan_step_count: usize) -> Result<Value, ValidationError> {
        if plan_step_count == 0 {
            return Err(ValidationError::new("no migration plan has been computed"));
        }
        Ok(json!({ "plan_steps": plan_step_count }))
    }

    pub fn reset(&mut self) {}
}

#[derive(Debug, Default)]
pub struct ExecutionStep {
    started: bool,
}

impl ExecutionStep {
    pub fn mark_started(&mut self) {
        self.started = true;
    }

    pub fn started(&self) -> bool {
        self.started
    }

    pub fn reset(&mut self) {
        self.started = false;
    }
}
