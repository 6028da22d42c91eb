//! Script-mode command shell: one command per stdin line.

mod commands;
mod context;
pub mod output;
mod registry;

use std::io::{self, BufRead};

use finledger_config::ConfigError;
use finledger_core::StoreError;
use thiserror::Error;

use crate::errors::EngineError;

pub use context::{CliContext, DATA_ENV, OWNER_ENV};
pub use registry::{CommandEntry, CommandRegistry};

/// Failures that stop the shell.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Invalid input: {0}")]
    Input(String),
}

/// Failures of a single command. Reported, then the shell moves on.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
    #[error("exit requested")]
    ExitRequested,
}

pub type CommandResult = Result<(), CommandError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Exit,
}

/// Builds the context from the environment and runs stdin as a script.
pub fn run_cli() -> Result<(), CliError> {
    let mut context = CliContext::from_env()?;
    let stdin = io::stdin();
    run_script(&mut context, stdin.lock())
}

pub fn run_script(context: &mut CliContext, input: impl BufRead) -> Result<(), CliError> {
    for line in input.lines() {
        let line = line?;
        match handle_line(context, &line) {
            LoopControl::Continue => {}
            LoopControl::Exit => break,
        }
    }
    Ok(())
}

pub fn handle_line(context: &mut CliContext, line: &str) -> LoopControl {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return LoopControl::Continue;
    }

    let tokens = match shell_words::split(trimmed) {
        Ok(tokens) => tokens,
        Err(err) => {
            output::warning(format!("Could not parse `{trimmed}`: {err}"));
            return LoopControl::Continue;
        }
    };
    let Some((raw, rest)) = tokens.split_first() else {
        return LoopControl::Continue;
    };
    let args: Vec<&str> = rest.iter().map(String::as_str).collect();

    match context.dispatch(&raw.to_lowercase(), raw, &args) {
        Ok(control) => control,
        Err(err) => {
            context.report_error(err);
            LoopControl::Continue
        }
    }
}
