//! Resolved options → HTTP request dispatch
//!
//! Builds the endpoint URL, encodes the resolved options as a query string
//! (GET/DELETE) or form body (POST/PUT), performs exactly one request and
//! hands the raw response to a caller-supplied evaluator.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, info};

use crate::catalog::{ApiCatalog, HttpMethod, TaskDefinition};
use crate::error::TaskSyncError;
use crate::resolve::ResolvedOptions;
use crate::schema::is_local;

/// Host used when `--host` is an instance ID rather than a URL.
pub const REMOTE_DOMAIN: &str = "cloud.zeyos.com";
/// Remote-call script name, suffixed with the catalog version.
pub const REMOTE_SCRIPT: &str = "tasksync";

/// A selected task bound to its endpoint.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct CallDefinition<'a> {
    pub api: String,
    pub task: &'a TaskDefinition,
    pub base_url: String,
    pub method: HttpMethod,
}

impl<'a> CallDefinition<'a> {
    pub fn new(api: impl Into<String>, task: &'a TaskDefinition, base_url: impl Into<String>) -> Self {
        Self {
            api: api.into(),
            task,
            base_url: base_url.into(),
            method: task.http_method(),
        }
    }

    /// `<base>/<api>/<task>`
    pub fn url(&self) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(&self.api),
            urlencoding::encode(&self.task.cmd)
        )
    }
}

/// Unparsed response handed to the evaluator.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

/// Resolve the base endpoint from `--host` or the catalog.
///
/// A host starting with an HTTP scheme is used verbatim; anything else is an
/// instance ID on the hosted domain.
pub fn endpoint_url(host: Option<&str>, catalog: &ApiCatalog) -> Result<String, TaskSyncError> {
    match host.map(str::trim).filter(|h| !h.is_empty()) {
        Some(host) if has_http_scheme(host) => Ok(host.to_string()),
        Some(instance) => Ok(format!(
            "https://{REMOTE_DOMAIN}/{}/remotecall/{REMOTE_SCRIPT}-{}.api",
            urlencoding::encode(instance),
            catalog.version
        )),
        None => catalog.url.clone().ok_or(TaskSyncError::NoEndpoint),
    }
}

fn has_http_scheme(host: &str) -> bool {
    let lower = host.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Blocking client with a request timeout.
pub fn build_client(timeout: Duration) -> Result<Client, TaskSyncError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(TaskSyncError::RequestFailed)
}

/// Options sent upstream: local-only and null entries are dropped, scalars
/// become plain text and objects/arrays compact JSON.
pub fn request_pairs(options: &ResolvedOptions) -> Vec<(String, String)> {
    options
        .iter()
        .filter(|(name, value)| !is_local(name) && !value.is_null())
        .map(|(name, value)| (name.clone(), encode_value(value)))
        .collect()
}

fn encode_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Perform the request for `call` and return the raw response.
pub fn execute(
    client: &Client,
    options: &ResolvedOptions,
    call: &CallDefinition<'_>,
) -> Result<RawResponse, TaskSyncError> {
    let url = call.url();
    let pairs = request_pairs(options);
    info!(method = %call.method, %url, params = pairs.len(), "sending request");

    let mut req = client.request(call.method.into(), &url);
    if call.method.uses_query() {
        if !pairs.is_empty() {
            req = req.query(&pairs);
        }
    } else {
        req = req.form(&pairs);
    }

    let resp = req.send().map_err(TaskSyncError::RequestFailed)?;
    let status = resp.status();
    let body = resp.text().map_err(TaskSyncError::ResponseRead)?;
    debug!(%status, bytes = body.len(), "received response");

    Ok(RawResponse { status, body })
}

/// Execute `call` and pass the raw response to `eval_response`.
pub fn dispatch<T, F>(
    client: &Client,
    options: &ResolvedOptions,
    call: &CallDefinition<'_>,
    eval_response: F,
) -> Result<T, TaskSyncError>
where
    F: FnOnce(RawResponse) -> Result<T, TaskSyncError>,
{
    let raw = execute(client, options, call)?;
    eval_response(raw)
}
