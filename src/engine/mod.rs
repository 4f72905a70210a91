//! Engine Module
//!
//! Everything needed to run a script through `meshlabserver`:
//! - Command-line construction and default output masks
//! - Process runners (the real executable or a test double)
//! - The operator recovery protocol after failures
//! - Transient file management
//! - The execution controller tying them together

mod artifacts;
mod controller;
mod invocation;
mod recovery;
mod runner;

pub use artifacts::{delete_matching, TransientArtifacts};
pub use controller::{ExecutionController, ExecutionOptions, ExecutionReport, Outcome};
pub use invocation::{default_output_mask, InvocationBuilder, MaskOptions, OutputSpec, ProcessInvocation};
pub use recovery::{
    AbortOnFailure, FailureContext, RecoveryChoice, RecoveryPolicy, ScriptedRecovery, TerminalPrompt,
};
pub use runner::{EngineRunner, OutputTarget, SystemRunner};
