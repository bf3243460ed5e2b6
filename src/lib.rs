//! Drive a remote task-management API from the command line.
//!
//! A static API catalog lists classes, their tasks, and each task's HTTP
//! method and parameters. An invocation names a class and task; the crate
//! derives the CLI options for that task, validates and prompts for inputs,
//! performs one HTTP request and renders the result.
//!
//! # Usage
//!
//! ```no_run
//! use tasksync::{ApiCatalog, Session, TerminalPrompter};
//!
//! let catalog = ApiCatalog::bundled().unwrap();
//! let mut prompter = TerminalPrompter;
//! let mut stdout = std::io::stdout();
//! let mut session = Session::new(&catalog, ".", &mut prompter, &mut stdout);
//!
//! session.run(&["tasksync", "--host", "acme", "tasks", "export"]).unwrap();
//! ```

pub mod args;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod help;
pub mod prompt;
pub mod resolve;
pub mod response;
pub mod schema;
pub mod table;

pub use args::{parse_args, resolve_target, ParsedArgs, Target};
pub use catalog::{ApiCatalog, HttpMethod, InputMode, ParamSpec, ParamType, TaskDefinition};
pub use cli::{Outcome, Session};
pub use config::ConfigDefaults;
pub use dispatch::{dispatch, endpoint_url, CallDefinition, RawResponse};
pub use error::TaskSyncError;
pub use prompt::{Prompter, ScriptedPrompter, TerminalPrompter};
pub use resolve::{resolve_options, Resolution, ResolvedOptions};
pub use response::{evaluate, ResponseHandler};
pub use schema::{derive_schema, generic_params, merge_schemas, OptionSchema};

// Re-export dependencies for downstream crates
pub use clap;
pub use reqwest;
