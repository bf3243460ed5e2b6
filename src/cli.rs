//! One invocation, end to end
//!
//! Parse → resolve the class and task → re-parse with the task parameters →
//! validate → prompt → send → hand the response to the task's handler.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::args::{help_target, parse_args, resolve_target, trailing_file, Target};
use crate::catalog::ApiCatalog;
use crate::config::ConfigDefaults;
use crate::dispatch::{build_client, dispatch, endpoint_url, CallDefinition};
use crate::error::TaskSyncError;
use crate::help::{render_help, render_param_list};
use crate::prompt::{prompt_missing, Prompter};
use crate::resolve::{resolve_options, Resolution};
use crate::response::ResponseHandler;
use crate::schema::{derive_schema, generic_params, merge_schemas, DEFAULT_TIMEOUT_SECS};

/// How a successful invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    HelpShown,
}

/// Everything one invocation needs, passed explicitly.
pub struct Session<'a> {
    catalog: &'a ApiCatalog,
    cwd: PathBuf,
    prompter: &'a mut dyn Prompter,
    out: &'a mut dyn Write,
}

impl<'a> Session<'a> {
    pub fn new(
        catalog: &'a ApiCatalog,
        cwd: impl Into<PathBuf>,
        prompter: &'a mut dyn Prompter,
        out: &'a mut dyn Write,
    ) -> Self {
        Self {
            catalog,
            cwd: cwd.into(),
            prompter,
            out,
        }
    }

    /// Run `argv` (binary name first).
    ///
    /// Usage or the parameter list is written to the output before a
    /// dispatch or validation error is returned.
    pub fn run<S: AsRef<str>>(&mut self, argv: &[S]) -> Result<Outcome, TaskSyncError> {
        let catalog = self.catalog;
        let generic = generic_params();
        let generic_schema = derive_schema(&generic);
        let parsed = parse_args(argv, &generic_schema)?;

        if parsed.flag("help") {
            let (api, task) = help_target(&parsed.positionals);
            self.print(&render_help(catalog, api, task))?;
            return Ok(Outcome::HelpShown);
        }

        let target = match self.resolve_target(&parsed.positionals) {
            Ok(target) => target,
            Err(err) => {
                let api = match &err {
                    TaskSyncError::UnknownApi { api } | TaskSyncError::UnknownTask { api, .. } => {
                        Some(api.as_str())
                    }
                    _ => None,
                };
                self.print(&render_help(catalog, api, None))?;
                return Err(err);
            }
        };
        let def = catalog.lookup(&target.api, &target.task)?;
        debug!(api = %target.api, task = %target.task, "resolved task");

        let defaults = ConfigDefaults::load(parsed.string("config"), &self.cwd)?;

        let schema = merge_schemas(&derive_schema(def.params()), &generic_schema);
        let mut parsed = parse_args(argv, &schema)?;
        // Task flags now consume their values, so the positional file is final
        if let Some(file) = trailing_file(&parsed.positionals, &target.api, &target.task) {
            debug!(%file, "positional file");
            parsed
                .values
                .entry("file".to_string())
                .or_insert(Value::String(file));
        }

        let params: Vec<_> = generic.iter().chain(def.params()).cloned().collect();
        let resolution = resolve_options(&params, &parsed, &defaults);
        if let Err(err) = resolution.ensure_complete() {
            self.print(&render_param_list(
                "The following parameters are missing",
                &resolution.missing,
            ))?;
            return Err(err);
        }

        let Resolution {
            mut options,
            promptable,
            ..
        } = resolution;
        prompt_missing(&mut options, &promptable, &mut *self.prompter)?;

        let file = options
            .get("file")
            .and_then(Value::as_str)
            .map(|f| self.cwd.join(f));
        let handler = ResponseHandler::for_task(&target.api, &target.task);
        handler.prepare(&mut options, file.as_deref())?;

        let base_url = endpoint_url(options.get("host").and_then(Value::as_str), catalog)?;
        let call = CallDefinition::new(target.api.clone(), def, base_url);
        let client = build_client(request_timeout(options.get("timeout")))?;

        let output_file = match handler {
            ResponseHandler::TaskImport => None,
            _ => file,
        };
        let out = &mut *self.out;
        dispatch(&client, &options, &call, |raw| {
            handler.handle(raw, output_file.as_deref(), out)
        })?;

        Ok(Outcome::Completed)
    }

    fn resolve_target(&self, positionals: &[String]) -> Result<Target, TaskSyncError> {
        let target = resolve_target(positionals, self.catalog)?;
        self.catalog.lookup(&target.api, &target.task)?;
        Ok(target)
    }

    fn print(&mut self, text: &str) -> Result<(), TaskSyncError> {
        self.out
            .write_all(text.as_bytes())
            .map_err(TaskSyncError::Stdout)
    }
}

fn request_timeout(value: Option<&Value>) -> Duration {
    value
        .and_then(Value::as_f64)
        .filter(|secs| *secs > 0.0)
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
}

/// `--log-level` from the command line, if given.
pub fn log_level_arg<S: AsRef<str>>(argv: &[S]) -> Option<String> {
    let parsed = parse_args(argv, &derive_schema(&generic_params())).ok()?;
    parsed.string("log-level").map(str::to_string)
}
