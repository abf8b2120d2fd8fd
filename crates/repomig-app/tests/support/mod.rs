use std::collections::VecDeque;
use std::sync::Mutex;

use anyhow::anyhow;
use serde_json::json;

use repomig_core::collab::{ConfirmationDialog, Notifier, SurfaceMask};
use repomig_core::transport::{RemoteRequest, RemoteResponse, Transport};

#[derive(Debug, Clone)]
pub struct Call {
    pub method: String,
    #[allow(dead_code)]
    pub payload: serde_json::Value,
}

#[derive(Default)]
pub struct QueueTransport {
    responses: Mutex<VecDeque<anyhow::Result<RemoteResponse>>>,
    calls: Mutex<Vec<Call>>,
}

impl QueueTransport {
    pub fn new(responses: Vec<anyhow::Result<RemoteResponse>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn methods(&self) -> Vec<String> {
        self.calls().into_iter().map(|call| call.method).collect()
    }
}

impl Transport for QueueTransport {
    fn call(&self, request: RemoteRequest) -> anyhow::Result<RemoteResponse> {
        self.calls.lock().expect("calls lock").push(Call {
            method: request.method.clone(),
            payload: request.payload.clone(),
        });

        self.responses
            .lock()
            .expect("responses lock")
            .pop_front()
            .unwrap_or_else(|| Err(anyhow!("missing scripted response")))
    }
}

#[derive(Debug, Default)]
pub struct ScriptedDialog {
    answers: VecDeque<bool>,
    pub questions: Vec<String>,
}

impl ScriptedDialog {
    pub fn new(answers: Vec<bool>) -> Self {
        Self {
            answers: answers.into(),
            questions: Vec::new(),
        }
    }
}

impl ConfirmationDialog for ScriptedDialog {
    fn confirm(&mut self, title: &str, _message: &str) -> anyhow::Result<bool> {
        self.questions.push(title.to_string());
        self.answers
            .pop_front()
            .ok_or_else(|| anyhow!("confirmation queue is empty"))
    }
}

#[derive(Debug, Default)]
pub struct RecordingMask {
    pub log: Vec<String>,
}

impl SurfaceMask for RecordingMask {
    fn mask(&mut self, message: &str) {
        self.log.push(format!("mask:{message}"));
    }

    fn unmask(&mut self) {
        self.log.push("unmask".to_string());
    }
}

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub log: Vec<String>,
}

impl Notifier for RecordingNotifier {
    fn notify_success(&mut self, text: &str) {
        self.log.push(format!("success:{text}"));
    }

    fn notify_error(&mut self, text: &str) {
        self.log.push(format!("error:{text}"));
    }
}

pub fn ok(data: serde_json::Value) -> anyhow::Result<RemoteResponse> {
    Ok(RemoteResponse::ok(data))
}

pub fn accepted() -> anyhow::Result<RemoteResponse> {
    Ok(RemoteResponse::accepted())
}

#[allow(dead_code)]
pub fn rejected(message: &str) -> anyhow::Result<RemoteResponse> {
    Ok(RemoteResponse::rejected(message))
}

pub fn unreachable_network(message: &str) -> anyhow::Result<RemoteResponse> {
    Err(anyhow!("{message}"))
}

pub fn overview_response() -> anyhow::Result<RemoteResponse> {
    ok(json!({
        "service_version": "3.41.1",
        "current_model": "filesystem",
        "target_model": "object-store",
        "repository_count": 3,
    }))
}

pub fn repository_list_response() -> anyhow::Result<RemoteResponse> {
    ok(json!({
        "repositories": [
            {"id": "r1", "name": "releases", "format": "maven2", "supported": true},
            {"id": "r2", "name": "legacy", "format": "site", "supported": false,
             "reason": "unsupported repository format"},
            {"id": "r3", "name": "snapshots", "format": "maven2", "supported": true},
        ],
    }))
}

pub fn plan_response(states: &[(&str, &str, f64)]) -> anyhow::Result<RemoteResponse> {
    let steps = states
        .iter()
        .map(|(id, state, complete)| {
            json!({
                "id": id,
                "name": format!("Migrate {id}"),
                "status": "scheduled",
                "state": state,
                "complete": complete,
                "log": [],
            })
        })
        .collect::<Vec<_>>();
    ok(json!({ "steps": steps }))
}
