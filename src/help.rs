//! Usage, parameter lists and catalog browsing.

use std::fmt::Write as _;

use crate::catalog::{ApiCatalog, ParamSpec, TaskDefinition};
use crate::schema::{generic_params, SHORT_ALIASES};
use crate::table::{cell_or_dash, render_table};

pub const APP_NAME: &str = "ZeyOS TaskSync client";
pub const APP_BIN: &str = "tasksync";

pub fn render_usage() -> String {
    let shorts: Vec<String> = SHORT_ALIASES
        .iter()
        .map(|(s, long)| format!("-{s} = --{long}"))
        .collect();
    format!(
        "{APP_NAME} (Version: {})\n\nUSAGE:\n\n\t{APP_BIN} [OPTIONS] API TASK [FILE]\n\n\tShorthands: {}\n",
        env!("CARGO_PKG_VERSION"),
        shorts.join(", ")
    )
}

/// `name* {type}  : description`, one line per parameter, aligned.
pub fn render_param_list(title: &str, params: &[ParamSpec]) -> String {
    let labels: Vec<String> = params
        .iter()
        .map(|p| {
            format!(
                "{}{} {{{}}}",
                p.name,
                if p.is_required() { "*" } else { "" },
                p.type_label()
            )
        })
        .collect();
    let width = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);

    let mut out = format!("\n{title}:\n\n");
    for (label, param) in labels.iter().zip(params) {
        let _ = writeln!(out, "\t{label:<width$}  : {}", param.description);
    }
    out
}

pub fn render_class_list(catalog: &ApiCatalog) -> String {
    let mut out = String::from("Available API classes:\n");
    for class in catalog.classes() {
        let _ = writeln!(out, "\t* {class}");
    }
    out
}

/// Task table of one class, or `None` when the class is unknown.
pub fn render_task_table(catalog: &ApiCatalog, api: &str) -> Option<String> {
    let tasks = catalog.tasks(api)?;
    let rows: Vec<Vec<String>> = tasks
        .iter()
        .map(|t| {
            vec![
                t.cmd.clone(),
                t.http_method().to_string(),
                cell_or_dash(t.description.as_deref()),
                cell_or_dash(t.return_type()),
            ]
        })
        .collect();

    Some(format!(
        "Showing API tasks for: {api}\n\n{}",
        render_table(&["Task", "Method", "Description", "Returns"], &rows)
    ))
}

pub fn render_task_detail(api: &str, def: &TaskDefinition) -> String {
    let mut out = format!("Help for {api} -> {}\n\n", def.cmd);
    if let Some(description) = &def.description {
        let _ = writeln!(out, "\t{description}");
    }
    let _ = writeln!(out, "\tRequest method: {}", def.http_method());
    if let Some(returns) = &def.returns {
        let _ = writeln!(
            out,
            "\tReturn {{{}}} {}",
            returns.type_name.as_deref().unwrap_or("-"),
            returns.description.as_deref().unwrap_or("")
        );
    }
    if !def.params().is_empty() {
        out.push_str(&render_param_list("Call parameters", def.params()));
    }
    out
}

/// Full help output for `--help [API [TASK]]`.
///
/// An unknown class falls back to the class list; an unknown task reports
/// the lookup failure.
pub fn render_help(catalog: &ApiCatalog, api: Option<&str>, task: Option<&str>) -> String {
    let mut out = render_usage();
    out.push('\n');

    match (api, task) {
        (Some(api), Some(task)) => match catalog.lookup(api, task) {
            Ok(def) => out.push_str(&render_task_detail(api, def)),
            Err(err) => {
                let _ = writeln!(out, "Failed to initialize API options - {err}");
                if let Some(hint) = err.hint() {
                    let _ = writeln!(out, "{hint}");
                }
            }
        },
        (Some(api), None) => match render_task_table(catalog, api) {
            Some(table) => out.push_str(&table),
            None => {
                let _ = writeln!(out, "Unknown API: {api}\n");
                out.push_str(&render_class_list(catalog));
            }
        },
        _ => {
            out.push_str(&render_param_list("General parameters", &generic_params()));
            out.push('\n');
            out.push_str(&render_class_list(catalog));
        }
    }

    out
}
