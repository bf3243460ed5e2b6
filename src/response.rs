//! Raw response → decoded result → table, YAML or file
//!
//! Every task shares [`evaluate`]; what happens with the result afterwards
//! depends on the task's [`ResponseHandler`].

use std::io::Write;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, info};

use crate::dispatch::RawResponse;
use crate::error::TaskSyncError;
use crate::resolve::ResolvedOptions;
use crate::table::{cell_or_dash, render_table};

/// Export table columns: record field → header.
pub const EXPORT_COLUMNS: &[(&str, &str)] = &[
    ("name", "Name"),
    ("tasknum", "Task No."),
    ("assigneduser", "Assignee"),
    ("duedate", "Due date"),
    ("priority", "Priority"),
    ("project", "Project"),
];

/// Decode a response body and return its `result` field.
pub fn evaluate(raw: &RawResponse) -> Result<Value, TaskSyncError> {
    let failed_status = || TaskSyncError::HttpStatus { status: raw.status };

    if raw.body.trim().is_empty() {
        if !raw.status.is_success() {
            return Err(failed_status());
        }
        return Err(TaskSyncError::EmptyResponse);
    }

    let decoded: Value = match serde_json::from_str(&raw.body) {
        Ok(v) => v,
        Err(_) if !raw.status.is_success() => return Err(failed_status()),
        Err(e) => return Err(TaskSyncError::MalformedResponse(e)),
    };

    if let Some(error) = decoded.get("error").filter(|e| !e.is_null()) {
        return Err(TaskSyncError::ServerError {
            message: error_message(error),
        });
    }
    if !raw.status.is_success() {
        return Err(failed_status());
    }

    match decoded {
        Value::Object(mut obj) => obj.remove("result").ok_or(TaskSyncError::MissingResult),
        _ => Err(TaskSyncError::MissingResult),
    }
}

fn error_message(error: &Value) -> String {
    match error {
        Value::String(s) => s.clone(),
        Value::Object(obj) => obj
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string()),
        other => other.to_string(),
    }
}

/// Per-task treatment of the request and its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseHandler {
    /// `tasks export`: table on stdout, or YAML file
    TaskExport,
    /// `tasks import`: YAML file submitted as `data`
    TaskImport,
    /// Anything else: YAML on stdout, or YAML file
    Generic,
}

impl ResponseHandler {
    pub fn for_task(api: &str, task: &str) -> Self {
        match (api, task) {
            ("tasks", "export") => Self::TaskExport,
            ("tasks", "import") => Self::TaskImport,
            _ => Self::Generic,
        }
    }

    /// Adjust the options before the request is sent.
    pub fn prepare(
        &self,
        options: &mut ResolvedOptions,
        file: Option<&Path>,
    ) -> Result<(), TaskSyncError> {
        if *self != Self::TaskImport {
            return Ok(());
        }

        let path = file.unwrap_or_else(|| Path::new(""));
        let records = read_import_file(path)?;
        debug!(
            path = %path.display(),
            records = records.as_array().map_or(0, Vec::len),
            "read import file"
        );
        options.insert("data".to_string(), Value::String(records.to_string()));
        Ok(())
    }

    /// Evaluate the response and emit the result.
    pub fn handle(
        &self,
        raw: RawResponse,
        file: Option<&Path>,
        out: &mut dyn Write,
    ) -> Result<(), TaskSyncError> {
        let result = evaluate(&raw)?;

        match (self, file) {
            (Self::TaskImport, _) => {
                let summary = match &result {
                    Value::Number(n) => format!("{n} task record(s) imported"),
                    other => format!("Import finished\n{}", to_yaml(other)?),
                };
                writeln!(out, "{}", summary.trim_end()).map_err(TaskSyncError::Stdout)
            }
            (_, Some(path)) => {
                write_yaml(path, &result)?;
                info!(path = %path.display(), "wrote result");
                writeln!(out, "Output written to {}", path.display()).map_err(TaskSyncError::Stdout)
            }
            (Self::TaskExport, None) => {
                write!(out, "{}", render_task_table(&result)).map_err(TaskSyncError::Stdout)
            }
            (Self::Generic, None) => {
                let yaml = to_yaml(&result)?;
                write!(out, "{yaml}").map_err(TaskSyncError::Stdout)
            }
        }
    }
}

/// Task records as a table; a single object is one row.
pub fn render_task_table(result: &Value) -> String {
    let records: Vec<&Value> = match result {
        Value::Array(items) => items.iter().collect(),
        Value::Null => Vec::new(),
        other => vec![other],
    };

    let headers: Vec<&str> = EXPORT_COLUMNS.iter().map(|(_, h)| *h).collect();
    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|record| {
            EXPORT_COLUMNS
                .iter()
                .map(|(field, _)| cell_or_dash(scalar_text(record.get(*field)).as_deref()))
                .collect()
        })
        .collect();

    render_table(&headers, &rows)
}

fn scalar_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn to_yaml(value: &Value) -> Result<String, TaskSyncError> {
    serde_yaml::to_string(value).map_err(TaskSyncError::RenderYaml)
}

/// Serialize `value` as YAML into `path`.
pub fn write_yaml(path: &Path, value: &Value) -> Result<(), TaskSyncError> {
    let output_err = |source: Box<dyn std::error::Error + Send + Sync>| TaskSyncError::OutputWrite {
        path: path.to_path_buf(),
        source,
    };
    let yaml = serde_yaml::to_string(value).map_err(|e| output_err(e.into()))?;
    std::fs::write(path, yaml).map_err(|e| output_err(e.into()))
}

/// Read a YAML sequence of task records.
pub fn read_import_file(path: &Path) -> Result<Value, TaskSyncError> {
    if !path.is_file() {
        return Err(TaskSyncError::ImportFileNotFound {
            path: path.to_path_buf(),
        });
    }

    let invalid = |source: Box<dyn std::error::Error + Send + Sync>| TaskSyncError::InvalidImportFile {
        path: path.to_path_buf(),
        source,
    };
    let text = std::fs::read_to_string(path).map_err(|e| invalid(e.into()))?;
    let records: Value = serde_yaml::from_str(&text).map_err(|e| invalid(e.into()))?;
    if !records.is_array() {
        return Err(invalid("expected a sequence of task records".into()));
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use serde_json::json;

    fn raw(status: u16, body: &str) -> RawResponse {
        RawResponse {
            status: StatusCode::from_u16(status).unwrap(),
            body: body.to_string(),
        }
    }

    #[test]
    fn evaluate_returns_result() {
        let result = evaluate(&raw(200, r#"{"result":[{"name":"a"}]}"#)).unwrap();
        assert_eq!(result, json!([{"name": "a"}]));
    }

    #[test]
    fn evaluate_null_result_is_present() {
        assert_eq!(evaluate(&raw(200, r#"{"result":null}"#)).unwrap(), Value::Null);
    }

    #[test]
    fn evaluate_empty_body() {
        assert!(matches!(evaluate(&raw(200, "  ")), Err(TaskSyncError::EmptyResponse)));
    }

    #[test]
    fn evaluate_malformed_body() {
        assert!(matches!(
            evaluate(&raw(200, "<html>")),
            Err(TaskSyncError::MalformedResponse(_))
        ));
    }

    #[test]
    fn evaluate_error_field() {
        let err = evaluate(&raw(200, r#"{"error":"invalid token"}"#)).unwrap_err();
        assert!(matches!(&err, TaskSyncError::ServerError { message } if message == "invalid token"));
    }

    #[test]
    fn evaluate_error_object_message() {
        let err = evaluate(&raw(403, r#"{"error":{"code":7,"message":"denied"}}"#)).unwrap_err();
        assert_eq!(err.to_string(), "denied");
    }

    #[test]
    fn evaluate_missing_result() {
        assert!(matches!(
            evaluate(&raw(200, r#"{"status":"ok"}"#)),
            Err(TaskSyncError::MissingResult)
        ));
        assert!(matches!(evaluate(&raw(200, "[1,2]")), Err(TaskSyncError::MissingResult)));
    }

    #[test]
    fn evaluate_failed_status_without_error_field() {
        assert!(matches!(
            evaluate(&raw(500, "oops")),
            Err(TaskSyncError::HttpStatus { status }) if status.as_u16() == 500
        ));
        assert!(matches!(
            evaluate(&raw(502, r#"{"result":1}"#)),
            Err(TaskSyncError::HttpStatus { .. })
        ));
    }

    #[test]
    fn task_table_substitutes_dashes() {
        let table = render_task_table(&json!([
            {"name": "Fix bug", "tasknum": "T-1", "assigneduser": null, "duedate": "",
             "priority": 2, "project": "Core"}
        ]));
        let row = table.lines().nth(3).unwrap();
        let cells: Vec<_> = row.split('|').map(str::trim).filter(|c| !c.is_empty()).collect();
        assert_eq!(cells, vec!["Fix bug", "T-1", "-", "-", "2", "Core"]);
    }

    #[test]
    fn handler_selection() {
        assert_eq!(ResponseHandler::for_task("tasks", "export"), ResponseHandler::TaskExport);
        assert_eq!(ResponseHandler::for_task("tasks", "import"), ResponseHandler::TaskImport);
        assert_eq!(ResponseHandler::for_task("projects", "list"), ResponseHandler::Generic);
    }

    #[test]
    fn generic_handler_prints_yaml() {
        let mut out = Vec::new();
        ResponseHandler::Generic
            .handle(raw(200, r#"{"result":{"name":"alice"}}"#), None, &mut out)
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "name: alice\n");
    }

    #[test]
    fn import_summary_renders_structured_result_as_yaml() {
        let mut out = Vec::new();
        ResponseHandler::TaskImport
            .handle(raw(200, r#"{"result":{"created":2,"updated":1}}"#), None, &mut out)
            .unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Import finished\ncreated: 2\nupdated: 1\n"
        );
    }

    #[test]
    fn import_prepare_requires_file() {
        let mut options = ResolvedOptions::new();
        let err = ResponseHandler::TaskImport
            .prepare(&mut options, Some(Path::new("/definitely/not/here.yaml")))
            .unwrap_err();
        assert!(matches!(err, TaskSyncError::ImportFileNotFound { .. }));
        assert!(!options.contains_key("data"));
    }

    #[test]
    fn import_rejects_non_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.yaml");
        std::fs::write(&path, "name: single\n").unwrap();
        assert!(matches!(
            read_import_file(&path),
            Err(TaskSyncError::InvalidImportFile { .. })
        ));
    }

    #[test]
    fn export_then_import_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.yaml");
        let records = json!([
            {"name": "Fix bug", "tasknum": "T-1", "assigneduser": "alice",
             "duedate": "2024-01-01", "priority": "high", "project": "Core"},
            {"name": "Write docs", "tasknum": "T-2", "assigneduser": null,
             "duedate": null, "priority": 3, "project": "Docs"}
        ]);

        write_yaml(&path, &records).unwrap();

        let mut options = ResolvedOptions::new();
        ResponseHandler::TaskImport
            .prepare(&mut options, Some(&path))
            .unwrap();

        let data = options["data"].as_str().unwrap();
        let decoded: Value = serde_json::from_str(data).unwrap();
        assert_eq!(decoded, records);
    }
}
