//! Parsed arguments + config defaults → resolved options
//!
//! Decides which parameters already have values, which required ones are
//! missing, and which should be collected interactively.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::args::ParsedArgs;
use crate::catalog::ParamSpec;
use crate::config::ConfigDefaults;
use crate::error::TaskSyncError;

/// Parameter name → value passed into the outgoing request.
pub type ResolvedOptions = BTreeMap<String, Value>;

/// Outcome of validating one invocation's parameters.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub options: ResolvedOptions,
    /// Required promptable parameters without a value
    pub missing: Vec<ParamSpec>,
    /// Every promptable parameter, supplied or not
    pub promptable: Vec<ParamSpec>,
}

impl Resolution {
    /// Fail with `MissingRequiredParameter` when anything required is absent.
    pub fn ensure_complete(&self) -> Result<(), TaskSyncError> {
        if self.missing.is_empty() {
            return Ok(());
        }
        Err(TaskSyncError::MissingRequiredParameter {
            names: self.missing.iter().map(|p| p.name.clone()).collect(),
        })
    }
}

/// Resolve `params` (generic parameters followed by task parameters).
///
/// A value given on the command line wins over the config file. Only
/// parameters that are both required and promptable can be missing.
pub fn resolve_options(
    params: &[ParamSpec],
    parsed: &ParsedArgs,
    defaults: &ConfigDefaults,
) -> Resolution {
    let mut resolution = Resolution::default();

    for param in params.iter().filter(|p| !p.name.is_empty()) {
        let value = parsed
            .values
            .get(&param.name)
            .filter(|v| !v.is_null())
            .or_else(|| defaults.get(&param.name));

        match value {
            Some(value) => {
                resolution.options.insert(param.name.clone(), value.clone());
            }
            None if param.is_required() && param.is_promptable() => {
                if !resolution.missing.iter().any(|m| m.name == param.name) {
                    resolution.missing.push(param.clone());
                }
            }
            None => {}
        }

        if param.is_promptable() && !resolution.promptable.iter().any(|p| p.name == param.name) {
            resolution.promptable.push(param.clone());
        }
    }

    resolution
}
