//! Interactive collection of promptable parameters.
//!
//! Parameters are asked for one at a time, in declaration order. A cancelled
//! prompt aborts the whole invocation before any request is sent.

use std::collections::VecDeque;
use std::io::{self, BufRead, IsTerminal, Write};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use serde_json::Value;
use tracing::{debug, warn};

use crate::catalog::{ParamSpec, ParamType};
use crate::error::TaskSyncError;
use crate::resolve::ResolvedOptions;

/// Source of answers for promptable parameters.
pub trait Prompter {
    /// Ask for one value. `Ok(None)` means no answer is available and the
    /// parameter stays unset.
    fn prompt(&mut self, label: &str, hidden: bool) -> Result<Option<String>, TaskSyncError>;
}

/// Prompt for every promptable parameter that has no value yet.
///
/// Returns the number of parameters that received an answer.
pub fn prompt_missing(
    options: &mut ResolvedOptions,
    promptable: &[ParamSpec],
    prompter: &mut dyn Prompter,
) -> Result<usize, TaskSyncError> {
    let mut answered = 0;

    for param in promptable {
        if options.get(&param.name).is_some_and(|v| !v.is_null()) {
            continue;
        }

        match prompter.prompt(&prompt_label(param), param.is_hidden())? {
            Some(answer) => {
                options.insert(param.name.clone(), coerce(answer, param.param_type()));
                answered += 1;
            }
            None => debug!(param = %param.name, "no answer, leaving unset"),
        }
    }

    Ok(answered)
}

pub fn prompt_label(param: &ParamSpec) -> String {
    format!("{} <{}>: ", param.description, param.name)
}

fn coerce(answer: String, param_type: ParamType) -> Value {
    match param_type {
        ParamType::Number => match answer.trim().parse::<f64>() {
            Ok(n) => serde_json::Number::from_f64(n)
                .map(Value::Number)
                .unwrap_or(Value::String(answer)),
            Err(_) => Value::String(answer),
        },
        ParamType::Boolean => match answer.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "y" | "1" => Value::Bool(true),
            "false" | "no" | "n" | "0" => Value::Bool(false),
            _ => Value::String(answer),
        },
        _ => Value::String(answer),
    }
}

/// Prompts on the controlling terminal; hidden inputs are not echoed.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn prompt(&mut self, label: &str, hidden: bool) -> Result<Option<String>, TaskSyncError> {
        if !io::stdin().is_terminal() {
            warn!(prompt = label.trim_end(), "stdin is not a terminal, skipping prompt");
            return Ok(None);
        }

        let mut stderr = io::stderr();
        write!(stderr, "{label}").map_err(TaskSyncError::Prompt)?;
        stderr.flush().map_err(TaskSyncError::Prompt)?;

        let answer = if hidden { read_hidden()? } else { read_visible()? };
        Ok(Some(answer))
    }
}

fn read_visible() -> Result<String, TaskSyncError> {
    let mut line = String::new();
    let n = io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(TaskSyncError::Prompt)?;
    if n == 0 {
        return Err(TaskSyncError::PromptCancelled);
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Leaves raw mode when dropped, including on early return.
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

fn read_hidden() -> Result<String, TaskSyncError> {
    let guard = RawModeGuard::enable().map_err(TaskSyncError::Prompt)?;
    let mut value = String::new();

    loop {
        let Event::Key(KeyEvent {
            code,
            modifiers,
            kind,
            ..
        }) = event::read().map_err(TaskSyncError::Prompt)?
        else {
            continue;
        };
        if kind != KeyEventKind::Press {
            continue;
        }

        match code {
            KeyCode::Enter => break,
            KeyCode::Char('c') | KeyCode::Char('d')
                if modifiers.contains(KeyModifiers::CONTROL) =>
            {
                return Err(TaskSyncError::PromptCancelled)
            }
            KeyCode::Esc => return Err(TaskSyncError::PromptCancelled),
            KeyCode::Backspace => {
                value.pop();
            }
            KeyCode::Char(c) => value.push(c),
            _ => {}
        }
    }

    drop(guard);
    eprintln!();
    Ok(value)
}

/// Answers prompts from a fixed script; used where no terminal exists.
///
/// An exhausted script cancels, like closing stdin.
#[derive(Debug, Default, Clone)]
pub struct ScriptedPrompter {
    answers: VecDeque<Option<String>>,
    /// `(label, hidden)` of every prompt shown
    pub asked: Vec<(String, bool)>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(|a| a.map(Into::into)).collect(),
            asked: Vec::new(),
        }
    }
}

impl Prompter for ScriptedPrompter {
    fn prompt(&mut self, label: &str, hidden: bool) -> Result<Option<String>, TaskSyncError> {
        self.asked.push((label.to_string(), hidden));
        self.answers
            .pop_front()
            .ok_or(TaskSyncError::PromptCancelled)
    }
}
