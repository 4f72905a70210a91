//! Script execution
//!
//! The controller turns a finished `Script` into one engine run: it writes
//! the transient files, builds the command line, runs the engine until it
//! succeeds or the recovery policy gives up, reads measurements back from
//! the engine log and removes what it created.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::artifacts::{delete_matching, TransientArtifacts};
use super::invocation::{default_output_mask, MaskOptions, ProcessInvocation};
use super::recovery::{FailureContext, RecoveryChoice, RecoveryPolicy, TerminalPrompt};
use super::runner::{EngineRunner, OutputTarget, SystemRunner};
use crate::config::EngineConfig;
use crate::error::{MeshScriptError, Result};
use crate::filters::layers::delete_record;
use crate::results::{MeasurementResults, ResultIngestor};
use crate::script::{FilterRecord, InputRole, Script, ScriptAssembler};

const OUTPUT_START: &str = "***START OF MESHLAB STDOUT & STDERR***";
const OUTPUT_END: &str = "***END OF MESHLAB STDOUT & STDERR***";

/// Per-run options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOptions {
    /// Append the command line and the engine's stdout/stderr here
    pub wrapper_log: Option<PathBuf>,
    /// Log file written by the engine itself (`-l`); a transient one is
    /// created when measurements must be parsed and none is given
    pub engine_log: Option<PathBuf>,
    /// Pass engine output through when there is no wrapper log;
    /// `None` uses the configured default
    pub print_output: Option<bool>,
    /// Parse requested measurements from the engine log after the run
    pub parse_results: bool,
    /// Keep the assembled script here instead of a transient file
    pub script_path: Option<PathBuf>,
    /// Save every layer into this project file (`-w`)
    pub project_out: Option<PathBuf>,
    /// Overwrite meshes referenced by `project_out` (`-v`)
    pub overwrite_project: bool,
    /// Attributes saved with outputs that have no explicit mask
    pub mask: MaskOptions,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            wrapper_log: None,
            engine_log: None,
            print_output: None,
            parse_results: true,
            script_path: None,
            project_out: None,
            overwrite_project: false,
            mask: MaskOptions::default(),
        }
    }
}

impl ExecutionOptions {
    pub fn with_wrapper_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.wrapper_log = Some(path.into());
        self
    }

    pub fn with_engine_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.engine_log = Some(path.into());
        self
    }

    pub fn with_script_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.script_path = Some(path.into());
        self
    }

    pub fn with_project_out(mut self, path: impl Into<PathBuf>, overwrite: bool) -> Self {
        self.project_out = Some(path.into());
        self.overwrite_project = overwrite;
        self
    }

    pub fn quiet(mut self) -> Self {
        self.print_output = Some(false);
        self
    }
}

/// How a run that did not abort ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The engine exited with code 0
    Success,
    /// The engine failed and the operator chose to carry on
    Continued,
}

/// Summary of one execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub run_id: Uuid,
    pub outcome: Outcome,
    pub attempts: u32,
    /// Exit code of the last attempt
    pub exit_code: Option<i32>,
    pub command_line: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub results: MeasurementResults,
}

/// Runs scripts through an engine runner under a recovery policy
pub struct ExecutionController {
    runner: Box<dyn EngineRunner>,
    policy: Box<dyn RecoveryPolicy>,
    config: EngineConfig,
}

impl std::fmt::Debug for ExecutionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionController")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Files prepared for a run, before the engine is started
struct PreparedRun {
    artifacts: TransientArtifacts,
    invocation: ProcessInvocation,
    engine_log: Option<PathBuf>,
    parse_results: bool,
}

impl ExecutionController {
    pub fn new(
        config: EngineConfig,
        runner: impl EngineRunner + 'static,
        policy: impl RecoveryPolicy + 'static,
    ) -> Self {
        Self {
            runner: Box::new(runner),
            policy: Box::new(policy),
            config,
        }
    }

    /// Real engine, asking the operator on the terminal after failures
    pub fn interactive(config: EngineConfig) -> Self {
        Self::new(config, SystemRunner::new(), TerminalPrompt::new())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run `script` once
    ///
    /// The script is finalized up front, so it cannot be run again even
    /// when the run aborts. Only an operator abort is returned as an
    /// engine error; every other failure goes through the recovery policy.
    pub fn execute(&mut self, script: &mut Script, options: &ExecutionOptions) -> Result<ExecutionReport> {
        script.finalize()?;

        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let span = tracing::info_span!("execute", %run_id);
        let _guard = span.enter();

        let prepared = self.prepare(script, options, &run_id)?;
        let command_line = prepared.invocation.command_line();
        let print_output = options.print_output.unwrap_or(self.config.print_output);
        let target = match &options.wrapper_log {
            Some(log) => OutputTarget::Append(log.clone()),
            None if print_output => OutputTarget::Inherit,
            None => OutputTarget::Null,
        };

        match &options.wrapper_log {
            Some(log) => append_to(
                log,
                &format!("meshlabserver cmd = {}\n{}\n", command_line, OUTPUT_START),
            )?,
            None => info!("meshlabserver cmd = {}", command_line),
        }

        let mut attempt = 0;
        let (outcome, exit_code) = loop {
            attempt += 1;
            tracing::info!(%run_id, attempt, "Running engine");

            let (exit_code, spawn_error) = match self.runner.run(&prepared.invocation, &target) {
                Ok(Some(0)) => break (Outcome::Success, Some(0)),
                Ok(code) => (code, None),
                Err(e) => (None, Some(e.to_string())),
            };
            tracing::warn!(%run_id, attempt, ?exit_code, error = ?spawn_error, "Engine run failed");

            let failure = FailureContext {
                command_line: command_line.clone(),
                log: options.wrapper_log.clone(),
                exit_code,
                attempt,
                spawn_error,
            };
            let choice = self.policy.on_failure(&failure);
            info!("Recovery choice after {}: {}", failure, choice);

            match choice {
                RecoveryChoice::Retry => continue,
                RecoveryChoice::Continue => break (Outcome::Continued, exit_code),
                RecoveryChoice::AbortKeep => {
                    let kept = prepared.artifacts.retain();
                    debug!("Keeping {} transient files", kept.len());
                    return Err(MeshScriptError::EngineAborted {
                        command_line,
                        log: options.wrapper_log.clone().or(prepared.engine_log),
                        retained: true,
                    });
                }
                RecoveryChoice::AbortDelete => {
                    self.delete_everything(prepared.artifacts, options.wrapper_log.as_deref());
                    return Err(MeshScriptError::EngineAborted {
                        command_line,
                        log: options.wrapper_log.clone(),
                        retained: false,
                    });
                }
            }
        };

        if let Some(log) = &options.wrapper_log {
            let code = exit_code.map_or_else(|| "None".to_string(), |c| c.to_string());
            append_to(
                log,
                &format!("{}\nmeshlabserver return code = {}\n\n", OUTPUT_END, code),
            )?;
        }

        let ingested = match (&prepared.engine_log, prepared.parse_results) {
            (Some(log), true) => Some(
                ResultIngestor::new(script.engine_version())
                    .ingest(log, script.requested_measurements()),
            ),
            _ => None,
        };

        if let Err(e) = prepared.artifacts.cleanup() {
            warn!("Could not remove every transient file: {}", e);
        }

        let results = match (ingested, outcome) {
            (Some(Ok(results)), _) => results,
            (Some(Err(e)), Outcome::Success) => return Err(e),
            (Some(Err(e)), Outcome::Continued) => {
                warn!("No measurements after a continued run: {}", e);
                MeasurementResults::default()
            }
            (None, _) => MeasurementResults::default(),
        };
        if !results.is_empty() {
            script.attach_results(results.clone());
        }

        tracing::info!(%run_id, attempts = attempt, ?outcome, "Engine run finished");
        Ok(ExecutionReport {
            run_id,
            outcome,
            attempts: attempt,
            exit_code,
            command_line,
            started_at,
            finished_at: Utc::now(),
            results,
        })
    }

    /// Write the transient files and build the command line
    fn prepare(&self, script: &Script, options: &ExecutionOptions, run_id: &Uuid) -> Result<PreparedRun> {
        let mut artifacts = TransientArtifacts::new(
            &self.config.temp_dir,
            &self.config.temp_prefix,
            &run_id.simple().to_string(),
        );
        let mut builder = ProcessInvocation::builder(&self.config.executable);
        let mut records: Vec<FilterRecord> = Vec::with_capacity(script.records().len() + 1);

        if script.inputs().is_empty() {
            // The engine refuses to start without an input mesh.
            let placeholder = artifacts.placeholder_input()?;
            builder = builder.mesh(placeholder);
            records.push(delete_record());
        }
        records.extend(script.records().iter().cloned());

        let parse_results = options.parse_results && script.requested_measurements().any();
        let engine_log = match &options.engine_log {
            Some(path) => {
                fs::write(path, "")?;
                Some(path.clone())
            }
            None if parse_results => Some(artifacts.engine_log()?),
            None => None,
        };
        if let Some(log) = &engine_log {
            builder = builder.engine_log(log);
        }

        for input in script.inputs().iter().filter(|i| i.role == InputRole::Project) {
            builder = builder.project(&input.path);
        }
        if let Some(project) = &options.project_out {
            builder = builder.project_out(project, options.overwrite_project);
        }
        for input in script.inputs().iter().filter(|i| i.role == InputRole::Mesh) {
            builder = builder.mesh(&input.path);
        }

        for output in script.outputs() {
            let mask = match &output.mask {
                Some(mask) => mask.clone(),
                None => default_output_mask(&output.path, options.mask, script.engine_version()),
            };
            builder = builder.output(&output.path, mask);
        }

        if records.is_empty() {
            debug!("No filters; running the engine as a converter");
        } else {
            let path = match &options.script_path {
                Some(path) => {
                    ScriptAssembler::new().save(&records, path)?;
                    path.clone()
                }
                None => artifacts.script(&records)?,
            };
            builder = builder.script(path);
        }

        Ok(PreparedRun {
            artifacts,
            invocation: builder.build(),
            engine_log,
            parse_results,
        })
    }

    /// Remove this run's files, every file with the temp prefix and the wrapper log
    fn delete_everything(&self, artifacts: TransientArtifacts, wrapper_log: Option<&Path>) {
        if let Err(e) = artifacts.cleanup() {
            warn!("Could not remove every transient file: {}", e);
        }
        match delete_matching(&self.config.temp_dir, &self.config.temp_prefix) {
            Ok(count) => debug!("Deleted {} files matching {}*", count, self.config.temp_prefix),
            Err(e) => warn!("Could not sweep {}* files: {}", self.config.temp_prefix, e),
        }
        if let Some(log) = wrapper_log {
            if let Err(e) = fs::remove_file(log) {
                warn!("Could not delete log {}: {}", log.display(), e);
            }
        }
    }
}

fn append_to(path: &Path, text: &str) -> Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(text.as_bytes())?;
    Ok(())
}
