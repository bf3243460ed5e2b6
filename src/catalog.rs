//! API catalog document → typed, immutable lookup structure
//!
//! The catalog lists every callable class, the tasks of each class, and the
//! parameter schema of each task. It is loaded once at startup.

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;

use crate::error::TaskSyncError;

const BUNDLED_CATALOG: &str = include_str!("../api.json");

/// The parsed API catalog.
#[derive(Debug, Clone, Deserialize)]
#[non_exhaustive]
pub struct ApiCatalog {
    /// API version, part of the synthesized endpoint path
    pub version: String,
    /// Endpoint used when no `--host` is given
    #[serde(default)]
    pub url: Option<String>,
    /// Class name → ordered task definitions
    pub data: BTreeMap<String, Vec<TaskDefinition>>,
}

/// One callable task within a class.
#[derive(Debug, Clone, Deserialize)]
#[non_exhaustive]
pub struct TaskDefinition {
    pub cmd: String,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub param: Option<Vec<ParamSpec>>,
    #[serde(default, rename = "return")]
    pub returns: Option<ReturnSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReturnSpec {
    #[serde(default, rename = "type")]
    pub type_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A single task (or generic CLI) parameter.
#[derive(Debug, Clone, Deserialize)]
#[non_exhaustive]
pub struct ParamSpec {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub type_name: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub optional: Option<bool>,
    #[serde(default)]
    pub input: Option<InputMode>,
}

/// How a promptable parameter is collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    Hidden,
    #[serde(other)]
    Text,
}

/// Primitive type tag of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParamType {
    #[default]
    String,
    Boolean,
    Number,
    Object,
    Array,
}

/// HTTP method a task is invoked with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl ApiCatalog {
    /// The catalog shipped with the binary.
    pub fn bundled() -> Result<Self, TaskSyncError> {
        Self::from_json(BUNDLED_CATALOG)
    }

    pub fn from_json(json: &str) -> Result<Self, TaskSyncError> {
        serde_json::from_str(json).map_err(TaskSyncError::InvalidCatalog)
    }

    /// Resolve a task by class and task name. The first matching `cmd` wins.
    pub fn lookup(&self, api: &str, task: &str) -> Result<&TaskDefinition, TaskSyncError> {
        let tasks = self.tasks(api).ok_or_else(|| TaskSyncError::UnknownApi {
            api: api.to_string(),
        })?;
        tasks
            .iter()
            .find(|t| t.cmd == task)
            .ok_or_else(|| TaskSyncError::UnknownTask {
                api: api.to_string(),
                task: task.to_string(),
            })
    }

    pub fn contains(&self, api: &str, task: &str) -> bool {
        self.lookup(api, task).is_ok()
    }

    pub fn tasks(&self, api: &str) -> Option<&[TaskDefinition]> {
        self.data.get(api).map(Vec::as_slice)
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }
}

impl TaskDefinition {
    pub fn params(&self) -> &[ParamSpec] {
        self.param.as_deref().unwrap_or_default()
    }

    pub fn http_method(&self) -> HttpMethod {
        HttpMethod::normalize(self.method.as_deref())
    }

    pub fn return_type(&self) -> Option<&str> {
        self.returns.as_ref().and_then(|r| r.type_name.as_deref())
    }
}

impl ParamSpec {
    pub fn new(name: impl Into<String>, param_type: ParamType) -> Self {
        Self {
            name: name.into(),
            type_name: Some(param_type.as_str().to_string()),
            description: String::new(),
            optional: None,
            input: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn input(mut self, mode: InputMode) -> Self {
        self.input = Some(mode);
        self
    }

    pub fn required(mut self) -> Self {
        self.optional = Some(false);
        self
    }

    pub fn param_type(&self) -> ParamType {
        self.type_name
            .as_deref()
            .map(ParamType::from_alias)
            .unwrap_or_default()
    }

    /// Only an explicit `"optional": false` makes a parameter required.
    pub fn is_required(&self) -> bool {
        self.optional == Some(false)
    }

    pub fn is_promptable(&self) -> bool {
        self.input.is_some()
    }

    pub fn is_hidden(&self) -> bool {
        self.input == Some(InputMode::Hidden)
    }

    /// Type label as written in the catalog, for help output.
    pub fn type_label(&self) -> &str {
        self.type_name.as_deref().unwrap_or("string")
    }
}

impl ParamType {
    /// Map a catalog type name onto a type tag. Unknown names are strings.
    pub fn from_alias(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "bool" | "boolean" => Self::Boolean,
            "int" | "integer" | "num" | "numeric" | "float" | "number" => Self::Number,
            "object" => Self::Object,
            "array" => Self::Array,
            _ => Self::String,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::Object => "object",
            Self::Array => "array",
        }
    }
}

impl HttpMethod {
    /// Case-insensitive; anything other than GET/PUT/DELETE becomes POST.
    pub fn normalize(method: Option<&str>) -> Self {
        match method.map(str::to_ascii_uppercase).as_deref() {
            Some("GET") => Self::Get,
            Some("PUT") => Self::Put,
            Some("DELETE") => Self::Delete,
            _ => Self::Post,
        }
    }

    /// Whether parameters travel in the query string rather than a form body.
    pub fn uses_query(&self) -> bool {
        matches!(self, Self::Get | Self::Delete)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}
