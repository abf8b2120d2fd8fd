use std::cell::Cell;
use std::rc::Rc;

use serde_json::Value;
use thiserror::Error;

use crate::context::{ContextStore, SubscriptionHandle};

pub type EnabledPredicate = fn(Option<&Value>) -> bool;

#[derive(Debug, Clone)]
pub struct EnabledRule {
    pub key: String,
    pub predicate: EnabledPredicate,
}

#[derive(Debug, Clone)]
pub struct StepDefinition {
    pub id: String,
    pub context_key: String,
    pub enabled: bool,
    pub enabled_when: Option<EnabledRule>,
}

struct RegisteredStep {
    id: String,
    context_key: String,
    enabled: Rc<Cell<bool>>,
    subscription: Option<SubscriptionHandle>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StepError {
    #[error("step '{id}' is not registered")]
    UnknownStep { id: String },
    #[error("step '{id}' is already registered")]
    DuplicateStep { id: String },
    #[error("cannot disable the active step '{id}'")]
    ActiveStepDisabled { id: String },
    #[error("no step is active")]
    NoActiveStep,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    Activated(String),
    Finished,
}

#[derive(Default)]
pub struct StepSequence {
    steps: Vec<RegisteredStep>,
    active: Option<usize>,
}

impl StepSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        context: &mut ContextStore,
        definition: StepDefinition,
    ) -> Result<(), StepError> {
        if self.steps.iter().any(|step| step.id == definition.id) {
            return Err(StepError::DuplicateStep { id: definition.id });
        }

        let enabled = Rc::new(Cell::new(definition.enabled));
        let subscription = definition.enabled_when.map(|rule| {
            let flag = Rc::clone(&enabled);
            let predicate = rule.predicate;
            flag.set(predicate(context.get(&rule.key)));
            context.subscribe(&rule.key, move |change| flag.set(predicate(change.new_value)))
        });

        self.steps.push(RegisteredStep {
            id: definition.id,
            context_key: definition.context_key,
            enabled,
            subscription,
        });
        Ok(())
    }

    pub fn ids(&self) -> Vec<&str> {
        self.steps.iter().map(|step| step.id.as_str()).collect()
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active.map(|index| self.steps[index].id.as_str())
    }

    pub fn is_enabled(&self, id: &str) -> Result<bool, StepError> {
        Ok(self.steps[self.position(id)?].enabled.get())
    }

    pub fn set_enabled(&mut self, id: &str, enabled: bool) -> Result<(), StepError> {
        let index = self.position(id)?;
        if !enabled && self.active == Some(index) {
            return Err(StepError::ActiveStepDisabled { id: id.to_string() });
        }
        self.steps[index].enabled.set(enabled);
        Ok(())
    }

    pub fn activate_first(&mut self) -> Option<String> {
        let index = self.steps.iter().position(|step| step.enabled.get())?;
        self.active = Some(index);
        Some(self.steps[index].id.clone())
    }

    pub fn peek_advance(&self) -> Option<&str> {
        let start = self.active.map_or(0, |index| index + 1);
        self.steps[start..]
            .iter()
            .find(|step| step.enabled.get())
            .map(|step| step.id.as_str())
    }

    pub fn advance(&mut self) -> Advance {
        let start = self.active.map_or(0, |index| index + 1);
        for index in start..self.steps.len() {
            if self.steps[index].enabled.get() {
                self.active = Some(index);
                return Advance::Activated(self.steps[index].id.clone());
            }
        }
        Advance::Finished
    }

    pub fn retreat(&mut self) -> Option<String> {
        let current = self.active?;
        for index in (0..current).rev() {
            if self.steps[index].enabled.get() {
                self.active = Some(index);
                return Some(self.steps[index].id.clone());
            }
        }
        None
    }

    pub fn commit_active(
        &self,
        context: &mut ContextStore,
        value: Value,
    ) -> Result<(), StepError> {
        let index = self.active.ok_or(StepError::NoActiveStep)?;
        context.set(&self.steps[index].context_key, value);
        Ok(())
    }

    pub fn reset_step(&self, context: &mut ContextStore, id: &str) -> Result<(), StepError> {
        let index = self.position(id)?;
        context.unset(&self.steps[index].context_key);
        Ok(())
    }

    pub fn reset_all(&mut self, context: &mut ContextStore) {
        let keys = self
            .steps
            .iter()
            .map(|step| step.context_key.clone())
            .collect::<Vec<_>>();
        for key in keys {
            context.unset(&key);
        }
        self.active = None;
        self.activate_first();
    }

    pub fn teardown(&mut self, context: &mut ContextStore) {
        for step in &mut self.steps {
            if let Some(handle) = step.subscription.take() {
                context.unsubscribe(handle);
            }
        }
        self.steps.clear();
        self.active = None;
    }

    fn position(&self, id: &str) -> Result<usize, StepError> {
        self.steps
            .iter()
            .position(|step| step.id == id)
            .ok_or_else(|| StepError::UnknownStep { id: id.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::context::ContextStore;

    use super::{Advance, EnabledRule, StepDefinition, StepError, StepSequence};

    fn definition(id: &str, enabled: bool) -> StepDefinition {
        StepDefinition {
            id: id.to_string(),
            context_key: id.to_string(),
            enabled,
            enabled_when: None,
        }
    }

    fn sequence_abc(context: &mut ContextStore, b_enabled: bool) -> StepSequence {
        let mut sequence = StepSequence::new();
        sequence
            .register(context, definition("a", true))
            .expect("register a");
        sequence
            .register(context, definition("b", b_enabled))
            .expect("register b");
        sequence
            .register(context, definition("c", true))
            .expect("register c");
        sequence.activate_first();
        sequence
    }

    #[test]
    fn advance_visits_enabled_steps_in_ascending_order() {
        let mut context = ContextStore::new();
        let mut sequence = sequence_abc(&mut context, false);

        assert_eq!(sequence.active_id(), Some("a"));
        assert_eq!(sequence.advance(), Advance::Activated("c".to_string()));
        assert_eq!(sequence.advance(), Advance::Finished);
    }

    #[test]
    fn advance_with_all_successors_disabled_finishes() {
        let mut context = ContextStore::new();
        let mut sequence = StepSequence::new();
        sequence
            .register(&mut context, definition("a", true))
            .expect("register a");
        sequence
            .register(&mut context, definition("b", false))
            .expect("register b");
        sequence.activate_first();

        assert_eq!(sequence.advance(), Advance::Finished);
        assert_eq!(sequence.active_id(), Some("a"));
    }

    #[test]
    fn retreat_activates_nearest_enabled_predecessor() {
        let mut context = ContextStore::new();
        let mut sequence = sequence_abc(&mut context, false);

        sequence.advance();
        assert_eq!(sequence.active_id(), Some("c"));
        assert_eq!(sequence.retreat(), Some("a".to_string()));
    }

    #[test]
    fn enabling_a_passed_step_makes_it_the_retreat_target() {
        let mut context = ContextStore::new();
        let mut sequence = sequence_abc(&mut context, false);

        sequence.advance();
        assert_eq!(sequence.active_id(), Some("c"));

        sequence.set_enabled("b", true).expect("enable b");
        assert_eq!(sequence.retreat(), Some("b".to_string()));
    }

    #[test]
    fn peek_advance_reports_the_next_enabled_step_without_moving() {
        let mut context = ContextStore::new();
        let mut sequence = sequence_abc(&mut context, false);

        assert_eq!(sequence.peek_advance(), Some("c"));
        assert_eq!(sequence.active_id(), Some("a"));

        sequence.advance();
        assert_eq!(sequence.peek_advance(), None);
    }

    #[test]
    fn retreat_from_first_enabled_step_stays_put() {
        let mut context = ContextStore::new();
        let mut sequence = sequence_abc(&mut context, true);

        assert_eq!(sequence.retreat(), None);
        assert_eq!(sequence.active_id(), Some("a"));
    }

    #[test]
    fn disabling_the_active_step_is_rejected() {
        let mut context = ContextStore::new();
        let mut sequence = sequence_abc(&mut context, true);

        let error = sequence.set_enabled("a", false).expect_err("should reject");
        assert_eq!(
            error,
            StepError::ActiveStepDisabled {
                id: "a".to_string()
            }
        );
        assert!(sequence.is_enabled("a").expect("known step"));
    }

    #[test]
    fn enabled_rule_follows_context_changes() {
        let mut context = ContextStore::new();
        let mut sequence = StepSequence::new();
        sequence
            .register(&mut context, definition("select", true))
            .expect("register select");
        sequence
            .register(
                &mut context,
                StepDefinition {
                    id: "defaults".to_string(),
                    context_key: "defaults".to_string(),
                    enabled: false,
                    enabled_when: Some(EnabledRule {
                        key: "repositories".to_string(),
                        predicate: |value| {
                            value
                                .and_then(|value| value.get("in_scope"))
                                .and_then(serde_json::Value::as_bool)
                                .unwrap_or(false)
                        },
                    }),
                },
            )
            .expect("register defaults");
        sequence.activate_first();

        assert!(!sequence.is_enabled("defaults").expect("known step"));

        context.set("repositories", json!({"in_scope": true}));
        assert!(sequence.is_enabled("defaults").expect("known step"));

        context.set("repositories", json!({"in_scope": false}));
        assert!(!sequence.is_enabled("defaults").expect("known step"));

        context.unset("repositories");
        assert!(!sequence.is_enabled("defaults").expect("known step"));
    }

    #[test]
    fn commit_active_writes_the_step_context_key() {
        let mut context = ContextStore::new();
        let sequence = {
            let mut sequence = StepSequence::new();
            sequence
                .register(&mut context, definition("overview", true))
                .expect("register");
            sequence.activate_first();
            sequence
        };

        sequence
            .commit_active(&mut context, json!({"acknowledged": true}))
            .expect("commit");
        assert_eq!(context.get("overview"), Some(&json!({"acknowledged": true})));
    }

    #[test]
    fn reset_step_removes_only_its_own_key() {
        let mut context = ContextStore::new();
        let mut sequence = sequence_abc(&mut context, true);

        sequence
            .commit_active(&mut context, json!(1))
            .expect("commit a");
        context.set("b", json!(2));

        sequence.reset_step(&mut context, "a").expect("reset a");
        assert_eq!(context.get("a"), None);
        assert_eq!(context.get("b"), Some(&json!(2)));
    }

    #[test]
    fn reset_all_clears_keys_and_reactivates_the_first_step() {
        let mut context = ContextStore::new();
        let mut sequence = sequence_abc(&mut context, true);

        sequence.advance();
        context.set("a", json!(1));
        context.set("c", json!(3));

        sequence.reset_all(&mut context);
        assert_eq!(sequence.active_id(), Some("a"));
        assert_eq!(context.get("a"), None);
        assert_eq!(context.get("c"), None);
    }

    #[test]
    fn teardown_releases_context_subscriptions() {
        let mut context = ContextStore::new();
        let mut sequence = StepSequence::new();
        sequence
            .register(
                &mut context,
                StepDefinition {
                    id: "defaults".to_string(),
                    context_key: "defaults".to_string(),
                    enabled: false,
                    enabled_when: Some(EnabledRule {
                        key: "repositories".to_string(),
                        predicate: |value| value.is_some(),
                    }),
                },
            )
            .expect("register");

        assert_eq!(context.subscriber_count(), 1);
        sequence.teardown(&mut context);
        assert_eq!(context.subscriber_count(), 0);
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut context = ContextStore::new();
        let mut sequence = StepSequence::new();
        sequence
            .register(&mut context, definition("a", true))
            .expect("register");
        let error = sequence
            .register(&mut context, definition("a", true))
            .expect_err("duplicate");
        assert_eq!(
            error,
            StepError::DuplicateStep {
                id: "a".to_string()
            }
        );
    }
}
