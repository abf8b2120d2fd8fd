use serde_json::Value;

use repomig_core::config::RemoteConfig;
use repomig_core::transport::{RemoteRequest, RemoteResponse, Transport};

pub struct UreqTransport {
    agent: ureq::Agent,
    endpoint: String,
    token: Option<String>,
}

impl UreqTransport {
    pub fn from_config(remote: &RemoteConfig) -> Self {
        Self {
            agent: ureq::Agent::new_with_defaults(),
            endpoint: remote.endpoint.trim_end_matches('/').to_string(),
            token: remote.token.clone(),
        }
    }
}

impl Transport for UreqTransport {
    fn call(&self, request: RemoteRequest) -> anyhow::Result<RemoteResponse> {
        let url = format!("{}/{}", self.endpoint, request.method);
        log::debug!("POST {url}");

        let mut post = self.agent.post(&url);
        if let Some(token) = &self.token {
            post = post.header("Authorization", &format!("Bearer {token}"));
        }

        let response = post.send_json(&request.payload)?;
        let envelope: Value = response.into_body().read_json()?;

        Ok(RemoteResponse {
            success: envelope
                .get("success")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            data: envelope.get("data").filter(|data| !data.is_null()).cloned(),
            message: envelope
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }
}
