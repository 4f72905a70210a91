//! Engine process runners

use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::process::Stdio;

use log::debug;

use super::invocation::ProcessInvocation;

/// Where the engine's stdout and stderr go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// Shared with this process
    Inherit,
    /// Discarded
    Null,
    /// Appended to a file
    Append(PathBuf),
}

/// Runs one engine invocation to completion
///
/// Returns the exit code, or `None` when the process was killed by a
/// signal. An `Err` means the process could not be started at all.
pub trait EngineRunner {
    fn run(&mut self, invocation: &ProcessInvocation, output: &OutputTarget) -> io::Result<Option<i32>>;
}

/// Spawns the real engine executable and waits for it
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

impl EngineRunner for SystemRunner {
    fn run(&mut self, invocation: &ProcessInvocation, output: &OutputTarget) -> io::Result<Option<i32>> {
        let mut command = invocation.to_command();
        command.stdin(Stdio::null());

        match output {
            OutputTarget::Inherit => {
                command.stdout(Stdio::inherit()).stderr(Stdio::inherit());
            }
            OutputTarget::Null => {
                command.stdout(Stdio::null()).stderr(Stdio::null());
            }
            OutputTarget::Append(path) => {
                let file = OpenOptions::new().create(true).append(true).open(path)?;
                let stderr = file.try_clone()?;
                command.stdout(Stdio::from(file)).stderr(Stdio::from(stderr));
            }
        }

        debug!("Spawning {}", invocation.command_line());
        let status = command.status()?;
        Ok(status.code())
    }
}

impl<F> EngineRunner for F
where
    F: FnMut(&ProcessInvocation, &OutputTarget) -> io::Result<Option<i32>>,
{
    fn run(&mut self, invocation: &ProcessInvocation, output: &OutputTarget) -> io::Result<Option<i32>> {
        self(invocation, output)
    }
}
