//! Option schema → clap `Command` → parsed arguments
//!
//! The command is rebuilt for every schema: once with the generic parameters
//! to find the API class and task, then with the task parameters merged in.

use std::collections::BTreeMap;

use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches, Command};
use serde_json::Value;
use tracing::debug;

use crate::catalog::{ApiCatalog, ParamType};
use crate::error::TaskSyncError;
use crate::schema::{env_var_for, long_for_short, short_alias, OptionSchema};

const OPERANDS: &str = "__operands";

/// Flag values and positional tokens of one parse.
#[derive(Debug, Clone, Default)]
pub struct ParsedArgs {
    /// Parameter name → value, only for flags actually given
    pub values: BTreeMap<String, Value>,
    /// Positional tokens in order
    pub positionals: Vec<String>,
    /// Tokens dropped because their flag is not in the schema
    pub ignored: Vec<String>,
}

impl ParsedArgs {
    pub fn flag(&self, name: &str) -> bool {
        self.values.get(name).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn string(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(Value::as_str)
    }
}

/// The class, task and optional positional filename of an invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub api: String,
    pub task: String,
    pub file: Option<String>,
}

/// Parse `argv` (binary name first) against `schema`.
///
/// Flags not in the schema are dropped on their own; a value written after
/// one stays a positional token.
pub fn parse_args<S: AsRef<str>>(
    argv: &[S],
    schema: &OptionSchema,
) -> Result<ParsedArgs, TaskSyncError> {
    let (kept, ignored) = split_unknown_flags(argv, schema);
    if !ignored.is_empty() {
        debug!(?ignored, "ignoring flags not in schema");
    }

    let matches = build_command(schema)
        .try_get_matches_from(kept)
        .map_err(TaskSyncError::InvalidArguments)?;

    let mut values = BTreeMap::new();
    for (name, param_type) in schema {
        if let Some(value) = extract_value(&matches, name, *param_type) {
            values.insert(name.clone(), value);
        }
    }

    let positionals = matches
        .get_many::<String>(OPERANDS)
        .map(|vals| vals.cloned().collect())
        .unwrap_or_default();

    Ok(ParsedArgs {
        values,
        positionals,
        ignored,
    })
}

/// Build the clap command for a schema.
pub fn build_command(schema: &OptionSchema) -> Command {
    let mut cmd = Command::new("tasksync")
        .disable_help_flag(true)
        .disable_version_flag(true)
        .arg(
            Arg::new(OPERANDS)
                .value_name("API TASK [FILE]")
                .num_args(0..)
                .action(ArgAction::Append),
        );

    for (name, param_type) in schema {
        let mut arg = Arg::new(name.clone()).long(name.clone());
        if let Some(short) = short_alias(name) {
            arg = arg.short(short);
        }
        if let Some(var) = env_var_for(name) {
            arg = arg.env(var);
        }

        let arg = match param_type {
            ParamType::Boolean => arg.action(ArgAction::SetTrue),
            ParamType::Number => arg
                .action(ArgAction::Set)
                .value_parser(clap::value_parser!(f64))
                .allow_negative_numbers(true),
            ParamType::Array => arg.action(ArgAction::Append),
            ParamType::String | ParamType::Object => arg.action(ArgAction::Set),
        };

        cmd = cmd.arg(arg);
    }

    cmd
}

/// Pick `(API, TASK[, FILE])` out of the positional tokens.
///
/// The class and task are the rightmost adjacent pair known to the catalog;
/// the token right after them, if any, is the file. Without a known pair the
/// rightmost known class and its successor are reported, else the last two
/// tokens, so lookup names the unknown part.
pub fn resolve_target(
    positionals: &[String],
    catalog: &ApiCatalog,
) -> Result<Target, TaskSyncError> {
    let n = positionals.len();
    if n < 2 {
        return Err(TaskSyncError::MissingApiOrTask);
    }

    let pair_at = |i: usize| Target {
        api: positionals[i].clone(),
        task: positionals[i + 1].clone(),
        file: positionals.get(i + 2).cloned(),
    };

    if let Some(i) = (0..n - 1)
        .rev()
        .find(|&i| catalog.contains(&positionals[i], &positionals[i + 1]))
    {
        return Ok(pair_at(i));
    }

    let i = (0..n - 1)
        .rev()
        .find(|&i| catalog.tasks(&positionals[i]).is_some())
        .unwrap_or(n - 2);
    Ok(Target {
        file: None,
        ..pair_at(i)
    })
}

/// The token following the rightmost `api task` pair, if any.
pub fn trailing_file(positionals: &[String], api: &str, task: &str) -> Option<String> {
    positionals
        .windows(2)
        .rposition(|pair| pair[0] == api && pair[1] == task)
        .and_then(|i| positionals.get(i + 2).cloned())
}

/// Class and task named in help mode: `--help`, `--help API`, `--help API TASK`.
pub fn help_target(positionals: &[String]) -> (Option<&str>, Option<&str>) {
    match positionals {
        [] => (None, None),
        [api] => (Some(api.as_str()), None),
        [.., api, task] => (Some(api.as_str()), Some(task.as_str())),
    }
}

fn extract_value(matches: &ArgMatches, name: &str, param_type: ParamType) -> Option<Value> {
    match matches.value_source(name) {
        Some(ValueSource::CommandLine) | Some(ValueSource::EnvVariable) => {}
        _ => return None,
    }

    match param_type {
        ParamType::Boolean => Some(Value::Bool(matches.get_flag(name))),
        ParamType::Number => matches.get_one::<f64>(name).map(|n| number_value(*n)),
        ParamType::Array => matches
            .get_many::<String>(name)
            .map(|vals| Value::Array(vals.cloned().map(Value::String).collect())),
        ParamType::Object => matches.get_one::<String>(name).map(|raw| {
            // Try to parse as JSON, fall back to string
            serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.clone()))
        }),
        ParamType::String => matches
            .get_one::<String>(name)
            .map(|s| Value::String(s.clone())),
    }
}

fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

fn split_unknown_flags<S: AsRef<str>>(
    argv: &[S],
    schema: &OptionSchema,
) -> (Vec<String>, Vec<String>) {
    let mut kept = Vec::with_capacity(argv.len());
    let mut ignored = Vec::new();
    let mut iter = argv.iter().map(|s| s.as_ref().to_string());

    if let Some(bin) = iter.next() {
        kept.push(bin);
    }

    while let Some(arg) = iter.next() {
        if arg == "--" {
            kept.push(arg);
            kept.extend(iter.by_ref());
            break;
        }

        let (name, has_inline_value) = if let Some(body) = arg.strip_prefix("--") {
            match body.split_once('=') {
                Some((name, _)) => (Some(name.to_string()), true),
                None => (Some(body.to_string()), false),
            }
        } else if arg.len() > 1 && arg.starts_with('-') {
            let mut chars = arg[1..].chars();
            let name = chars.next().and_then(long_for_short).map(str::to_string);
            (name, chars.next().is_some())
        } else {
            kept.push(arg);
            continue;
        };

        match name.and_then(|n| schema.get(&n)) {
            Some(param_type) => {
                let takes_value = *param_type != ParamType::Boolean && !has_inline_value;
                kept.push(arg);
                if takes_value {
                    if let Some(value) = iter.next() {
                        kept.push(value);
                    }
                }
            }
            None => ignored.push(arg),
        }
    }

    (kept, ignored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ParamSpec;
    use crate::schema::{derive_schema, generic_params, merge_schemas};
    use serde_json::json;

    fn generic_schema() -> OptionSchema {
        derive_schema(&generic_params())
    }

    fn full_schema() -> OptionSchema {
        let task = derive_schema(&[
            ParamSpec::new("project", ParamType::String),
            ParamSpec::new("completed", ParamType::Boolean),
            ParamSpec::new("effort", ParamType::Number),
            ParamSpec::new("tags", ParamType::Array),
            ParamSpec::new("filter", ParamType::Object),
        ]);
        merge_schemas(&task, &generic_schema())
    }

    fn catalog() -> ApiCatalog {
        ApiCatalog::from_json(
            r#"{"version": "1.0.0", "data": {"tasks": [{"cmd": "export"}, {"cmd": "import"}]}}"#,
        )
        .unwrap()
    }

    fn strings(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_collects_positionals_in_order() {
        let parsed = parse_args(&["tasksync", "tasks", "export"], &generic_schema()).unwrap();
        assert_eq!(parsed.positionals, strings(&["tasks", "export"]));
        assert!(!parsed.flag("help"));
        assert_eq!(parsed.string("file"), None);
    }

    #[test]
    fn parse_short_aliases() {
        let parsed = parse_args(
            &["tasksync", "-c", "alt.json", "-f", "out.yaml", "-h"],
            &generic_schema(),
        )
        .unwrap();
        assert_eq!(parsed.string("config"), Some("alt.json"));
        assert_eq!(parsed.string("file"), Some("out.yaml"));
        assert!(parsed.flag("help"));
    }

    #[test]
    fn parse_drops_unknown_flags_alone() {
        let parsed = parse_args(
            &["tasksync", "--project", "Core", "tasks", "--verbose", "export"],
            &generic_schema(),
        )
        .unwrap();
        assert_eq!(parsed.positionals, strings(&["Core", "tasks", "export"]));
        assert_eq!(parsed.ignored, strings(&["--project", "--verbose"]));
    }

    #[test]
    fn parse_unknown_boolean_keeps_class_name() {
        let parsed = parse_args(
            &["tasksync", "--completed", "tasks", "export"],
            &generic_schema(),
        )
        .unwrap();
        assert_eq!(parsed.positionals, strings(&["tasks", "export"]));
        assert_eq!(parsed.ignored, strings(&["--completed"]));
    }

    #[test]
    fn parse_unknown_negative_short_is_dropped() {
        let parsed = parse_args(
            &["tasksync", "--effort", "-2", "tasks", "complete"],
            &generic_schema(),
        )
        .unwrap();
        assert_eq!(parsed.positionals, strings(&["tasks", "complete"]));
    }

    #[test]
    fn parse_reads_env_fallback_and_flag_wins() {
        std::env::set_var("TASKSYNC_HOST", "env-instance");
        let from_env = parse_args(&["tasksync", "tasks", "export"], &generic_schema());
        let from_flag = parse_args(
            &["tasksync", "--host", "cli-instance", "tasks", "export"],
            &generic_schema(),
        );
        std::env::remove_var("TASKSYNC_HOST");

        assert_eq!(from_env.unwrap().string("host"), Some("env-instance"));
        assert_eq!(from_flag.unwrap().string("host"), Some("cli-instance"));
    }

    #[test]
    fn parse_unknown_inline_flag_keeps_next_positional() {
        let parsed = parse_args(
            &["tasksync", "--project=Core", "tasks", "export"],
            &generic_schema(),
        )
        .unwrap();
        assert_eq!(parsed.positionals, strings(&["tasks", "export"]));
        assert_eq!(parsed.ignored, strings(&["--project=Core"]));
    }

    #[test]
    fn parse_typed_values() {
        let parsed = parse_args(
            &[
                "tasksync",
                "tasks",
                "export",
                "--project",
                "Core",
                "--completed",
                "--effort",
                "-2.5",
                "--tags",
                "a",
                "--tags",
                "b",
                "--filter",
                r#"{"state":"open"}"#,
                "--timeout",
                "10",
            ],
            &full_schema(),
        )
        .unwrap();

        assert_eq!(parsed.values["project"], json!("Core"));
        assert_eq!(parsed.values["completed"], json!(true));
        assert_eq!(parsed.values["effort"], json!(-2.5));
        assert_eq!(parsed.values["tags"], json!(["a", "b"]));
        assert_eq!(parsed.values["filter"], json!({"state": "open"}));
        assert_eq!(parsed.values["timeout"], json!(10));
        assert_eq!(parsed.positionals, strings(&["tasks", "export"]));
    }

    #[test]
    fn parse_object_falls_back_to_string() {
        let parsed = parse_args(&["tasksync", "--filter", "open"], &full_schema()).unwrap();
        assert_eq!(parsed.values["filter"], json!("open"));
    }

    #[test]
    fn parse_absent_boolean_is_not_recorded() {
        let parsed = parse_args(&["tasksync", "tasks", "export"], &full_schema()).unwrap();
        assert!(!parsed.values.contains_key("completed"));
        assert!(!parsed.values.contains_key("help"));
    }

    #[test]
    fn parse_rejects_bad_number() {
        let err = parse_args(&["tasksync", "--effort", "lots"], &full_schema()).unwrap_err();
        assert!(matches!(err, TaskSyncError::InvalidArguments(_)));
    }

    #[test]
    fn resolve_target_requires_two_positionals() {
        assert!(matches!(
            resolve_target(&[], &catalog()),
            Err(TaskSyncError::MissingApiOrTask)
        ));
        assert!(matches!(
            resolve_target(&strings(&["tasks"]), &catalog()),
            Err(TaskSyncError::MissingApiOrTask)
        ));
    }

    #[test]
    fn resolve_target_uses_last_two() {
        let target = resolve_target(&strings(&["junk", "tasks", "export"]), &catalog()).unwrap();
        assert_eq!(target.api, "tasks");
        assert_eq!(target.task, "export");
        assert_eq!(target.file, None);
    }

    #[test]
    fn resolve_target_reads_trailing_file() {
        let target =
            resolve_target(&strings(&["tasks", "export", "out.yaml"]), &catalog()).unwrap();
        assert_eq!(
            target,
            Target {
                api: "tasks".into(),
                task: "export".into(),
                file: Some("out.yaml".into()),
            }
        );
    }

    #[test]
    fn resolve_target_prefers_rightmost_known_pair() {
        let target = resolve_target(
            &strings(&["tasks", "export", "Core", "out.yaml"]),
            &catalog(),
        )
        .unwrap();
        assert_eq!((target.api.as_str(), target.task.as_str()), ("tasks", "export"));
        assert_eq!(target.file.as_deref(), Some("Core"));
    }

    #[test]
    fn resolve_target_reports_unknown_task_of_known_class() {
        let target = resolve_target(&strings(&["Core", "tasks", "purge"]), &catalog()).unwrap();
        assert_eq!((target.api.as_str(), target.task.as_str()), ("tasks", "purge"));
        assert_eq!(target.file, None);

        let target = resolve_target(&strings(&["a", "b", "c"]), &catalog()).unwrap();
        assert_eq!((target.api.as_str(), target.task.as_str()), ("b", "c"));
    }

    #[test]
    fn trailing_file_follows_pair() {
        let tokens = strings(&["tasks", "export", "out.yaml"]);
        assert_eq!(trailing_file(&tokens, "tasks", "export").as_deref(), Some("out.yaml"));
        assert_eq!(trailing_file(&tokens[..2], "tasks", "export"), None);
        assert_eq!(trailing_file(&tokens, "tasks", "import"), None);
    }

    #[test]
    fn help_target_forms() {
        assert_eq!(help_target(&[]), (None, None));
        assert_eq!(help_target(&strings(&["tasks"])), (Some("tasks"), None));
        assert_eq!(
            help_target(&strings(&["tasks", "export"])),
            (Some("tasks"), Some("export"))
        );
    }
}
