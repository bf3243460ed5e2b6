//! Parameter lists → option schema
//!
//! Turns generic CLI parameters and task parameters into the name → type
//! mapping the argument parser is built from.

use std::collections::BTreeMap;

use crate::catalog::{InputMode, ParamSpec, ParamType};

/// Parameter name → primitive type tag.
pub type OptionSchema = BTreeMap<String, ParamType>;

/// Short flag → long parameter name.
pub const SHORT_ALIASES: &[(char, &str)] = &[('c', "config"), ('h', "help"), ('f', "file")];

/// Generic parameters that configure the client and are never sent upstream.
pub const LOCAL_PARAMS: &[&str] = &["help", "config", "host", "file", "timeout", "log-level"];

/// Generic parameters that fall back to a `TASKSYNC_*` environment variable.
pub const ENV_BACKED_PARAMS: &[&str] = &["host", "username", "password"];

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Parameters every invocation accepts, in help order.
pub fn generic_params() -> Vec<ParamSpec> {
    vec![
        ParamSpec::new("help", ParamType::Boolean).description("Show help"),
        ParamSpec::new("config", ParamType::String).description("Configuration file"),
        ParamSpec::new("username", ParamType::String)
            .description("User name")
            .input(InputMode::Text),
        ParamSpec::new("password", ParamType::String)
            .description("User password")
            .input(InputMode::Hidden),
        ParamSpec::new("host", ParamType::String).description("ZeyOS instance ID or host URL"),
        ParamSpec::new("file", ParamType::String).description("Output or input filename"),
        ParamSpec::new("timeout", ParamType::Number)
            .description(format!("Request timeout in seconds (default {DEFAULT_TIMEOUT_SECS})")),
        ParamSpec::new("log-level", ParamType::String)
            .description("Log filter when RUST_LOG is unset (default warn)"),
    ]
}

/// Derive the option schema of a parameter list. Unnamed entries are skipped.
pub fn derive_schema(params: &[ParamSpec]) -> OptionSchema {
    params
        .iter()
        .filter(|p| !p.name.is_empty())
        .map(|p| (p.name.clone(), p.param_type()))
        .collect()
}

/// Combine the task schema with the generic one; generic entries win on collision.
pub fn merge_schemas(task: &OptionSchema, generic: &OptionSchema) -> OptionSchema {
    let mut merged = task.clone();
    merged.extend(generic.iter().map(|(k, v)| (k.clone(), *v)));
    merged
}

pub fn short_alias(name: &str) -> Option<char> {
    SHORT_ALIASES
        .iter()
        .find(|(_, long)| *long == name)
        .map(|(short, _)| *short)
}

pub fn long_for_short(short: char) -> Option<&'static str> {
    SHORT_ALIASES
        .iter()
        .find(|(s, _)| *s == short)
        .map(|(_, long)| *long)
}

pub fn is_local(name: &str) -> bool {
    LOCAL_PARAMS.contains(&name)
}

/// `TASKSYNC_HOST` for `host`, etc.
pub fn env_var_for(name: &str) -> Option<String> {
    ENV_BACKED_PARAMS
        .contains(&name)
        .then(|| format!("TASKSYNC_{}", name.to_ascii_uppercase().replace('-', "_")))
}
