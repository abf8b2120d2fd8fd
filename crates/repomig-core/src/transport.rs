use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct RemoteRequest {
    pub method: String,
    pub payload: Value,
}

impl RemoteRequest {
    pub fn new(method: impl Into<String>, payload: Value) -> Self {
        Self {
            method: method.into(),
            payload,
        }
    }

    pub fn bare(method: impl Into<String>) -> Self {
        Self::new(method, Value::Null)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RemoteResponse {
    pub success: bool,
    pub data: Option<Value>,
    pub message: Option<String>,
}

impl RemoteResponse {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn accepted() -> Self {
        Self {
            success: true,
            data: None,
            message: None,
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("remote call '{method}' failed: {source}")]
    Call {
        method: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("remote call '{method}' was rejected: {message}")]
    Rejected { method: String, message: String },
}

pub trait Transport {
    fn call(&self, request: RemoteRequest) -> anyhow::Result<RemoteResponse>;
}

pub fn call_expecting_success(
    transport: &dyn Transport,
    request: RemoteRequest,
) -> Result<RemoteResponse, TransportError> {
    let method = request.method.clone();
    let response = transport.call(request).map_err(|source| TransportError::Call {
        method: method.clone(),
        source,
    })?;

    if !response.success {
        let message = response
            .message
            .unwrap_or_else(|| "remote service reported a failure".to_string());
        return Err(TransportError::Rejected { method, message });
    }

    Ok(response)
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;
    use serde_json::json;

    use super::{RemoteRequest, RemoteResponse, Transport, call_expecting_success};

    struct OneShot(anyhow::Result<RemoteResponse>);

    impl Transport for OneShot {
        fn call(&self, _request: RemoteRequest) -> anyhow::Result<RemoteResponse> {
            match &self.0 {
                Ok(response) => Ok(response.clone()),
                Err(error) => Err(anyhow!("{error}")),
            }
        }
    }

    #[test]
    fn successful_response_passes_through() {
        let transport = OneShot(Ok(RemoteResponse::ok(json!({"steps": []}))));
        let response = call_expecting_success(&transport, RemoteRequest::bare("migration/status"))
            .expect("success");
        assert_eq!(response.data, Some(json!({"steps": []})));
    }

    #[test]
    fn rejected_response_becomes_a_typed_error() {
        let transport = OneShot(Ok(RemoteResponse::rejected("not ready")));
        let error = call_expecting_success(&transport, RemoteRequest::bare("migration/run"))
            .expect_err("should fail");
        assert!(error.to_string().contains("'migration/run' was rejected"));
        assert!(error.to_string().contains("not ready"));
    }

    #[test]
    fn transport_failure_names_the_method() {
        let transport = OneShot(Err(anyhow!("connection refused")));
        let error = call_expecting_success(&transport, RemoteRequest::bare("system/ping"))
            .expect_err("should fail");
        assert!(error.to_string().contains("'system/ping' failed"));
    }
}
