//! Error handling for meshscript
//!
//! Layer-stack errors are programming errors in an emitter's declared
//! effect and are never recoverable. Engine failures are handled by the
//! recovery protocol and only surface here once the operator aborts.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for meshscript operations
pub type Result<T> = std::result::Result<T, MeshScriptError>;

/// Main error type for meshscript operations
#[derive(Error, Debug)]
pub enum MeshScriptError {
    // Layer Stack Errors
    #[error("Layer index {index} out of range (stack has {len} layers)")]
    LayerIndexOutOfRange { index: usize, len: usize },

    #[error("Layer stack is empty: there is no current layer")]
    EmptyLayerStack,

    #[error("Layer stack already seeded with {len} layers")]
    AlreadySeeded { len: usize },

    // Script Errors
    #[error("Script has no filters")]
    EmptyScript,

    #[error("Script has already been executed and cannot be modified or re-run")]
    ScriptFinalized,

    #[error("Invalid parameter for '{filter}': {reason}")]
    InvalidParameter { filter: String, reason: String },

    // Project File Errors
    #[error("Invalid project file {path}: {reason}")]
    InvalidProjectFile { path: PathBuf, reason: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    // Engine Errors
    #[error("Engine run aborted: {command_line} (artifacts {})", disposition(.retained))]
    EngineAborted {
        command_line: String,
        log: Option<PathBuf>,
        retained: bool,
    },

    // Result Errors
    #[error("Failed to parse {what} from engine log: {reason}")]
    ResultParse { what: &'static str, reason: String },

    // Configuration Errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Config file error: {0}")]
    ConfigFile(#[from] toml::de::Error),

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn disposition(retained: &bool) -> &'static str {
    if *retained {
        "retained"
    } else {
        "deleted"
    }
}

impl MeshScriptError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            MeshScriptError::LayerIndexOutOfRange { .. } => "LAYER_INDEX_OUT_OF_RANGE",
            MeshScriptError::EmptyLayerStack => "EMPTY_LAYER_STACK",
            MeshScriptError::AlreadySeeded { .. } => "ALREADY_SEEDED",
            MeshScriptError::EmptyScript => "EMPTY_SCRIPT",
            MeshScriptError::ScriptFinalized => "SCRIPT_FINALIZED",
            MeshScriptError::InvalidParameter { .. } => "INVALID_PARAMETER",
            MeshScriptError::InvalidProjectFile { .. } => "INVALID_PROJECT_FILE",
            MeshScriptError::FileNotFound { .. } => "FILE_NOT_FOUND",
            MeshScriptError::EngineAborted { .. } => "ENGINE_ABORTED",
            MeshScriptError::ResultParse { .. } => "RESULT_PARSE",
            MeshScriptError::Config(_) => "CONFIG_ERROR",
            MeshScriptError::ConfigFile(_) => "CONFIG_FILE_ERROR",
            MeshScriptError::Io(_) => "IO_ERROR",
            MeshScriptError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Whether this error signals a bug in an emitter's declared layer effect
    pub fn is_layer_invariant_violation(&self) -> bool {
        matches!(
            self,
            MeshScriptError::LayerIndexOutOfRange { .. }
                | MeshScriptError::EmptyLayerStack
                | MeshScriptError::AlreadySeeded { .. }
        )
    }

    /// Check if this error is recoverable
    ///
    /// Layer invariant violations and operator aborts never are.
    pub fn is_recoverable(&self) -> bool {
        match self {
            MeshScriptError::FileNotFound { .. } => true,
            MeshScriptError::InvalidParameter { .. } => true,
            MeshScriptError::ResultParse { .. } => true,
            MeshScriptError::Config(_) => true,
            MeshScriptError::ConfigFile(_) => true,
            _ => false,
        }
    }

    /// Get a recovery suggestion for this error
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            MeshScriptError::LayerIndexOutOfRange { .. } | MeshScriptError::EmptyLayerStack => {
                Some("A filter declared a layer effect that does not match the stack; report it as a bug.")
            }
            MeshScriptError::ScriptFinalized => {
                Some("Build a new script, using the previous output file as its input.")
            }
            MeshScriptError::InvalidProjectFile { .. } => {
                Some("Check that the project file is a MeshLab project with MLMesh entries.")
            }
            MeshScriptError::FileNotFound { .. } => Some("Check the file path and try again."),
            MeshScriptError::EngineAborted { retained: true, .. } => {
                Some("Temporary files were kept; inspect the log and the script file.")
            }
            MeshScriptError::Config(_) | MeshScriptError::ConfigFile(_) => {
                Some("Check meshscript.toml and the MESHSCRIPT_* environment variables.")
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = MeshScriptError::LayerIndexOutOfRange { index: 3, len: 2 };
        assert_eq!(err.error_code(), "LAYER_INDEX_OUT_OF_RANGE");
        assert_eq!(MeshScriptError::EmptyScript.error_code(), "EMPTY_SCRIPT");
    }

    #[test]
    fn test_stack_errors_not_recoverable() {
        let err = MeshScriptError::EmptyLayerStack;
        assert!(err.is_layer_invariant_violation());
        assert!(!err.is_recoverable());
        assert!(err.recovery_suggestion().is_some());
    }

    #[test]
    fn test_aborted_message_reports_retention() {
        let kept = MeshScriptError::EngineAborted {
            command_line: "meshlabserver -i a.ply".to_string(),
            log: None,
            retained: true,
        };
        assert!(kept.to_string().contains("retained"));

        let deleted = MeshScriptError::EngineAborted {
            command_line: "meshlabserver -i a.ply".to_string(),
            log: None,
            retained: false,
        };
        assert!(deleted.to_string().contains("deleted"));
        assert!(!deleted.is_recoverable());
    }
}
