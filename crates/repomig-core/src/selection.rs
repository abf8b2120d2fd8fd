use std::collections::BTreeSet;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub format: Option<String>,
    pub supported: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CollectionVersion(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionChange {
    pub selected_count: usize,
    pub delta: i64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("'{id}' is not supported by the migration service")]
    Unsupported { id: String },
    #[error("'{id}' is not in the candidate collection")]
    UnknownRecord { id: String },
    #[error("selection operation referenced a stale candidate collection")]
    StaleVersion,
}

#[derive(Debug, Default)]
pub struct SelectionConstraintModel {
    candidates: Vec<Candidate>,
    selected: BTreeSet<String>,
    version: CollectionVersion,
}

impl SelectionConstraintModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reload(&mut self, candidates: Vec<Candidate>) -> CollectionVersion {
        self.candidates = candidates;
        self.selected.clear();
        self.version = CollectionVersion(self.version.0 + 1);
        self.version
    }

    pub fn version(&self) -> CollectionVersion {
        self.version
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    pub fn selection(&self) -> Vec<String> {
        self.candidates
            .iter()
            .filter(|candidate| self.selected.contains(&candidate.id))
            .map(|candidate| candidate.id.clone())
            .collect()
    }

    pub fn toggle(
        &mut self,
        version: CollectionVersion,
        id: &str,
    ) -> Result<SelectionChange, SelectionError> {
        if version != self.version {
            log::debug!("discarding stale selection toggle for '{id}'");
            return Err(SelectionError::StaleVersion);
        }

        let candidate = self
            .candidates
            .iter()
            .find(|candidate| candidate.id == id)
            .ok_or_else(|| SelectionError::UnknownRecord { id: id.to_string() })?;

        if !candidate.supported {
            return Err(SelectionError::Unsupported { id: id.to_string() });
        }

        let delta = if self.selected.remove(id) {
            -1
        } else {
            self.selected.insert(id.to_string());
            1
        };

        Ok(SelectionChange {
            selected_count: self.selected.len(),
            delta,
        })
    }

    pub fn select_all_or_none(&mut self) -> SelectionChange {
        let selectable = self
            .candidates
            .iter()
            .filter(|candidate| candidate.supported)
            .map(|candidate| candidate.id.clone())
            .collect::<BTreeSet<_>>();

        let before = self.selected.len() as i64;
        if self.selected == selectable {
            self.selected.clear();
        } else {
            self.selected = selectable;
        }

        SelectionChange {
            selected_count: self.selected.len(),
            delta: self.selected.len() as i64 - before,
        }
    }
}
