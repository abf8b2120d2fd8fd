use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use repomig_core::plan::{PlanError, PlanSnapshot};
use repomig_core::selection::Candidate;
use repomig_core::transport::{
    RemoteRequest, Transport, TransportError, call_expecting_success,
};

pub const METHOD_PING: &str = "system/ping";
pub const METHOD_OVERVIEW: &str = "migration/overview";
pub const METHOD_REPOSITORY_LIST: &str = "repository/list";
pub const METHOD_PREVIEW: &str = "migration/preview";
pub const METHOD_RUN: &str = "migration/run";
pub const METHOD_STATUS: &str = "migration/status";
pub const METHOD_ABORT: &str = "migration/abort";

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("malformed '{method}' response: {source}")]
    Decode {
        method: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("'{method}' response carried no data")]
    MissingData { method: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceOverview {
    pub service_version: String,
    pub current_model: String,
    pub target_model: String,
    pub repository_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct RepositoryList {
    repositories: Vec<Candidate>,
}

pub fn ping(transport: &dyn Transport) -> Result<(), RemoteError> {
    call_expecting_success(transport, RemoteRequest::bare(METHOD_PING))?;
    Ok(())
}

pub fn fetch_overview(transport: &dyn Transport) -> Result<ServiceOverview, RemoteError> {
    let data = data_of(transport, METHOD_OVERVIEW, Value::Null)?;
    decode(METHOD_OVERVIEW, data)
}

pub fn fetch_repositories(transport: &dyn Transport) -> Result<Vec<Candidate>, RemoteError> {
    let data = data_of(transport, METHOD_REPOSITORY_LIST, Value::Null)?;
    let list: RepositoryList = decode(METHOD_REPOSITORY_LIST, data)?;
    Ok(list.repositories)
}

pub fn preview_migration(
    transport: &dyn Transport,
    payload: Value,
) -> Result<PlanSnapshot, RemoteError> {
    let data = data_of(transport, METHOD_PREVIEW, payload)?;
    snapshot_of(METHOD_PREVIEW, &data)
}

pub fn run_migration(transport: &dyn Transport, payload: Value) -> Result<(), RemoteError> {
    call_expecting_success(transport, RemoteRequest::new(METHOD_RUN, payload))?;
    Ok(())
}

pub fn fetch_status(transport: &dyn Transport) -> Result<PlanSnapshot, RemoteError> {
    let data = data_of(transport, METHOD_STATUS, Value::Null)?;
    snapshot_of(METHOD_STATUS, &data)
}

pub fn abort_migration(transport: &dyn Transport) -> Result<(), RemoteError> {
    call_expecting_success(transport, RemoteRequest::bare(METHOD_ABORT))?;
    Ok(())
}

fn data_of(
    transport: &dyn Transport,
    method: &'static str,
    payload: Value,
) -> Result<Value, RemoteError> {
    let response = call_expecting_success(transport, RemoteRequest::new(method, payload))?;
    response.data.ok_or(RemoteError::MissingData { method })
}

fn decode<T: serde::de::DeserializeOwned>(
    method: &'static str,
    data: Value,
) -> Result<T, RemoteError> {
    serde_json::from_value(data).map_err(|source| RemoteError::Decode { method, source })
}

fn snapshot_of(method: &'static str, data: &Value) -> Result<PlanSnapshot, RemoteError> {
    PlanSnapshot::from_value(data).map_err(|error| match error {
        PlanError::MalformedSnapshot { source } => RemoteError::Decode { method, source },
    })
}
