use std::collections::VecDeque;

use anyhow::{Result, anyhow};
use inquire::{Confirm, MultiSelect, Select, Text};

pub trait PromptDriver {
    fn confirm(&mut self, message: &str, default: bool) -> Result<bool>;
    fn input(&mut self, message: &str, default: &str) -> Result<String>;
    fn select(&mut self, message: &str, options: &[String]) -> Result<usize>;
    fn multi_select(
        &mut self,
        message: &str,
        options: &[String],
        preselected: &[usize],
    ) -> Result<Vec<usize>>;
}

#[derive(Debug, Default)]
pub struct InquirePromptDriver;

impl InquirePromptDriver {
    pub fn new() -> Self {
        Self
    }
}

impl PromptDriver for InquirePromptDriver {
    fn confirm(&mut self, message: &str, default: bool) -> Result<bool> {
        Ok(Confirm::new(message).with_default(default).prompt()?)
    }

    fn input(&mut self, message: &str, default: &str) -> Result<String> {
        Ok(Text::new(message).with_initial_value(default).prompt()?)
    }

    fn select(&mut self, message: &str, options: &[String]) -> Result<usize> {
        let selected = Select::new(message, options.to_vec()).prompt()?;

        options
            .iter()
            .position(|option| option == &selected)
            .ok_or_else(|| anyhow!("selected option was not found in options list"))
    }

    fn multi_select(
        &mut self,
        message: &str,
        options: &[String],
        preselected: &[usize],
    ) -> Result<Vec<usize>> {
        let selected = MultiSelect::new(message, options.to_vec())
            .with_default(preselected)
            .prompt()?;

        let mut indexes = Vec::with_capacity(selected.len());
        for value in &selected {
            let index = options
                .iter()
                .position(|option| option == value)
                .ok_or_else(|| anyhow!("selected option was not found in options list"))?;
            indexes.push(index);
        }
        Ok(indexes)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedPromptResponse {
    Confirm(bool),
    Input(String),
    Select(usize),
    MultiSelect(Vec<usize>),
}

#[derive(Debug, Default)]
pub struct ScriptedPromptDriver {
    responses: VecDeque<ScriptedPromptResponse>,
}

impl ScriptedPromptDriver {
    pub fn new(responses: Vec<ScriptedPromptResponse>) -> Self {
        Self {
            responses: responses.into(),
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.responses.is_empty()
    }

    fn next_response(&mut self) -> Result<ScriptedPromptResponse> {
        self.responses
            .pop_front()
            .ok_or_else(|| anyhow!("prompt response queue is empty"))
    }
}

impl PromptDriver for ScriptedPromptDriver {
    fn confirm(&mut self, _message: &str, _default: bool) -> Result<bool> {
        match self.next_response()? {
            ScriptedPromptResponse::Confirm(value) => Ok(value),
            unexpected => Err(anyhow!("expected confirm response, got {unexpected:?}")),
        }
    }

    fn input(&mut self, _message: &str, default: &str) -> Result<String> {
        match self.next_response()? {
            ScriptedPromptResponse::Input(value) if value.is_empty() => Ok(default.to_string()),
            ScriptedPromptResponse::Input(value) => Ok(value),
            unexpected => Err(anyhow!("expected input response, got {unexpected:?}")),
        }
    }

    fn select(&mut self, _message: &str, _options: &[String]) -> Result<usize> {
        match self.next_response()? {
            ScriptedPromptResponse::Select(value) => Ok(value),
            unexpected => Err(anyhow!("expected select response, got {unexpected:?}")),
        }
    }

    fn multi_select(
        &mut self,
        _message: &str,
        _options: &[String],
        _preselected: &[usize],
    ) -> Result<Vec<usize>> {
        match self.next_response()? {
            ScriptedPromptResponse::MultiSelect(values) => Ok(values),
            unexpected => Err(anyhow!("expected multi-select response, got {unexpected:?}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_prompt_returns_values_in_order() {
        let mut prompt = ScriptedPromptDriver::new(vec![
            ScriptedPromptResponse::Confirm(true),
            ScriptedPromptResponse::Input("blobs-new".to_string()),
            ScriptedPromptResponse::Select(2),
            ScriptedPromptResponse::MultiSelect(vec![0, 1]),
        ]);

        let options = vec!["a".to_string(), "b".to_string(), "c".to_string()];

        assert!(prompt.confirm("confirm", false).expect("confirm"));
        assert_eq!(prompt.input("input", "").expect("input"), "blobs-new");
        assert_eq!(prompt.select("select", &options).expect("select"), 2);
        assert_eq!(
            prompt
                .multi_select("multi", &options, &[])
                .expect("multi select"),
            vec![0, 1]
        );
        assert!(prompt.is_exhausted());
    }

    #[test]
    fn scripted_prompt_falls_back_to_the_default_on_empty_input() {
        let mut prompt =
            ScriptedPromptDriver::new(vec![ScriptedPromptResponse::Input(String::new())]);
        assert_eq!(prompt.input("input", "100").expect("input"), "100");
    }

    #[test]
    fn scripted_prompt_errors_on_type_mismatch() {
        let mut prompt =
            ScriptedPromptDriver::new(vec![ScriptedPromptResponse::Input("x".to_string())]);
        let error = prompt.confirm("confirm", false).expect_err("should fail");
        assert!(error.to_string().contains("expected confirm response"));
    }

    #[test]
    fn scripted_prompt_errors_when_exhausted() {
        let mut prompt = ScriptedPromptDriver::new(vec![]);
        let error = prompt.input("input", "").expect_err("should fail");
        assert!(error.to_string().contains("queue is empty"));
    }
}
