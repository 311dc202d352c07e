// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::Deserialize;
use serde_json::Value;

use crate::errors::ModuleError;

/// A parsed script module.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Program {
    #[serde(default)]
    pub name: Option<String>,
    pub steps: Vec<Step>,
}

/// One instruction of a script.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Report a new value; state unchanged.
    Emit { value: Value },
    /// Pause execution.
    Sleep { ms: u64 },
    /// Enter `Suspended`, optionally reporting a value, until a message is
    /// sent to the process. The message becomes the new value.
    Suspend {
        #[serde(default)]
        value: Option<Value>,
    },
    /// Finish successfully with `value`.
    Complete {
        #[serde(default)]
        value: Value,
    },
    /// Finish with an error.
    Fail { message: String },
}

impl Step {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Step::Complete { .. } | Step::Fail { .. })
    }
}

/// Parse and validate script source.
///
/// Rejects scripts with no steps and steps after a `complete`/`fail`.
pub fn parse_program(source: &[u8]) -> Result<Program, ModuleError> {
    let text = std::str::from_utf8(source)
        .map_err(|e| ModuleError::InvalidSource(format!("source is not UTF-8: {}", e)))?;
    let program: Program =
        serde_yaml::from_str(text).map_err(|e| ModuleError::InvalidSource(e.to_string()))?;

    if program.steps.is_empty() {
        return Err(ModuleError::EmptyProgram);
    }

    if let Some(index) = program.steps.iter().position(Step::is_terminal) {
        if index + 1 < program.steps.len() {
            return Err(ModuleError::UnreachableSteps {
                index,
                remaining: program.steps.len() - index - 1,
            });
        }
    }

    Ok(program)
}
