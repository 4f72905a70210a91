//! Operator recovery after an engine failure
//!
//! When the engine exits non-zero the controller asks a `RecoveryPolicy`
//! what to do. The terminal prompt is the interactive policy; scripted
//! policies and closures drive the same protocol unattended.

use std::collections::VecDeque;
use std::fmt;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// What to do after a failed engine run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryChoice {
    /// Run the identical command line again
    Retry,
    /// Treat the run as successful, e.g. after producing the outputs by hand
    Continue,
    /// Stop and keep temporary files and logs for inspection
    AbortKeep,
    /// Stop and delete temporary files and the wrapper log
    AbortDelete,
}

impl RecoveryChoice {
    /// Parse operator input; anything unrecognized aborts and keeps files
    pub fn parse(input: &str) -> Self {
        match input.trim().to_lowercase().as_str() {
            "r" | "retry" => RecoveryChoice::Retry,
            "c" | "continue" => RecoveryChoice::Continue,
            "xd" => RecoveryChoice::AbortDelete,
            _ => RecoveryChoice::AbortKeep,
        }
    }

    pub fn is_abort(&self) -> bool {
        matches!(self, RecoveryChoice::AbortKeep | RecoveryChoice::AbortDelete)
    }
}

impl fmt::Display for RecoveryChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecoveryChoice::Retry => write!(f, "retry"),
            RecoveryChoice::Continue => write!(f, "continue"),
            RecoveryChoice::AbortKeep => write!(f, "abort (keep files)"),
            RecoveryChoice::AbortDelete => write!(f, "abort (delete files)"),
        }
    }
}

/// Everything the operator needs to judge a failed run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureContext {
    pub command_line: String,
    /// Wrapper log holding the engine's output, when one was requested
    pub log: Option<PathBuf>,
    /// `None` when the process was killed by a signal or never started
    pub exit_code: Option<i32>,
    /// 1-based attempt number
    pub attempt: u32,
    /// Set when the engine could not be started
    pub spawn_error: Option<String>,
}

impl fmt::Display for FailureContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.spawn_error, self.exit_code) {
            (Some(err), _) => write!(f, "attempt {} could not start: {}", self.attempt, err),
            (None, Some(code)) => write!(f, "attempt {} exited with code {}", self.attempt, code),
            (None, None) => write!(f, "attempt {} was terminated by a signal", self.attempt),
        }
    }
}

/// Decides how to proceed after an engine failure
pub trait RecoveryPolicy {
    fn on_failure(&mut self, failure: &FailureContext) -> RecoveryChoice;
}

impl<F> RecoveryPolicy for F
where
    F: FnMut(&FailureContext) -> RecoveryChoice,
{
    fn on_failure(&mut self, failure: &FailureContext) -> RecoveryChoice {
        self(failure)
    }
}

/// Never retries; every failure aborts and keeps files
#[derive(Debug, Clone, Copy, Default)]
pub struct AbortOnFailure;

impl RecoveryPolicy for AbortOnFailure {
    fn on_failure(&mut self, _failure: &FailureContext) -> RecoveryChoice {
        RecoveryChoice::AbortKeep
    }
}

/// Replays a fixed list of choices, then aborts keeping files
#[derive(Debug, Clone, Default)]
pub struct ScriptedRecovery {
    choices: VecDeque<RecoveryChoice>,
}

impl ScriptedRecovery {
    pub fn new(choices: impl IntoIterator<Item = RecoveryChoice>) -> Self {
        Self {
            choices: choices.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.choices.len()
    }
}

impl RecoveryPolicy for ScriptedRecovery {
    fn on_failure(&mut self, _failure: &FailureContext) -> RecoveryChoice {
        self.choices.pop_front().unwrap_or(RecoveryChoice::AbortKeep)
    }
}

/// Asks the operator on a terminal (or any reader/writer pair)
pub struct TerminalPrompt {
    input: Box<dyn BufRead>,
    output: Box<dyn Write>,
    program_name: String,
}

impl TerminalPrompt {
    /// Prompt on stdin and stdout
    pub fn new() -> Self {
        Self::with_io(io::BufReader::new(io::stdin()), io::stdout())
    }

    pub fn with_io(input: impl BufRead + 'static, output: impl Write + 'static) -> Self {
        Self {
            input: Box::new(input),
            output: Box::new(output),
            program_name: "MeshLab".to_string(),
        }
    }

    fn write_menu(&mut self, failure: &FailureContext) -> io::Result<()> {
        let name = &self.program_name;
        writeln!(self.output)?;
        writeln!(
            self.output,
            "{} did not finish successfully ({}). Review the log file and the input file(s) to see what went wrong.",
            name, failure
        )?;
        writeln!(self.output, "{} command: \"{}\"", name, failure.command_line)?;
        if let Some(log) = &failure.log {
            writeln!(self.output, "log: \"{}\"", log.display())?;
        }
        writeln!(self.output, "Where do we go from here?")?;
        writeln!(
            self.output,
            " r  - retry running {} (probably after you've fixed any problems with the input files)",
            name
        )?;
        writeln!(
            self.output,
            " c  - continue on with the script (probably after you've manually re-run and generated the desired output file(s))"
        )?;
        writeln!(self.output, " x  - exit, keeping the temporary files and log")?;
        writeln!(self.output, " xd - exit, deleting the temporary files and log")?;
        write!(self.output, "Select r, c, x (default), or xd: ")?;
        self.output.flush()
    }

    fn ask(&mut self, failure: &FailureContext) -> io::Result<RecoveryChoice> {
        self.write_menu(failure)?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(RecoveryChoice::AbortKeep);
        }
        let choice = RecoveryChoice::parse(&line);
        let message = match choice {
            RecoveryChoice::Retry => format!("Retrying {} cmd ...", self.program_name),
            RecoveryChoice::Continue => "Continuing on ...".to_string(),
            RecoveryChoice::AbortKeep => "Exiting ...".to_string(),
            RecoveryChoice::AbortDelete => "Deleting temporary and log files and exiting ...".to_string(),
        };
        writeln!(self.output, "{}", message)?;
        Ok(choice)
    }
}

impl Default for TerminalPrompt {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TerminalPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TerminalPrompt")
            .field("program_name", &self.program_name)
            .finish_non_exhaustive()
    }
}

impl RecoveryPolicy for TerminalPrompt {
    fn on_failure(&mut self, failure: &FailureContext) -> RecoveryChoice {
        self.ask(failure).unwrap_or_else(|e| {
            log::warn!("Recovery prompt failed ({}); aborting and keeping files", e);
            RecoveryChoice::AbortKeep
        })
    }
}
