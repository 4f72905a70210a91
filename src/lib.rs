//! meshscript - MeshLab filter scripts with static layer tracking
//!
//! Scripts are built by calling filter emitters against a `Script`. Each
//! emitter appends the XML fragment of one engine filter and declares how
//! that filter changes the engine's layer stack, so the current layer and
//! every layer label are known before the engine ever runs.
//!
//! # Architecture
//!
//! - `layers`: the predicted layer stack and the effects that drive it
//! - `filters`: emitters for the engine's filters
//! - `script`: the script itself, its assembler and project files
//! - `engine`: running `meshlabserver` with operator-driven recovery
//! - `results`: measurements parsed back from the engine log

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod filters;
pub mod layers;
pub mod results;
pub mod script;

pub use error::{MeshScriptError, Result};
