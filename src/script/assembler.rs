//! Script Assembler
//!
//! Wraps the ordered fragments of a script in the fixed opening and
//! closing markers the engine expects. Layer state is never consulted.

use std::fs;
use std::io::Write;
use std::path::Path;

use log::debug;
use tempfile::TempPath;

use super::{FilterRecord, Script};
use crate::error::{MeshScriptError, Result};

/// Opening marker of every filter script
pub const OPENING_MARKER: &str = "<!DOCTYPE FilterScript>\n<FilterScript>\n";

/// Closing marker of every filter script
pub const CLOSING_MARKER: &str = "</FilterScript>\n";

/// Serializes filter records into a script
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptAssembler {
    require_records: bool,
}

impl ScriptAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail with `EmptyScript` instead of producing a pass-through script
    pub fn require_records(mut self, require: bool) -> Self {
        self.require_records = require;
        self
    }

    /// Concatenate markers and fragments, in append order
    pub fn assemble(&self, records: &[FilterRecord]) -> Result<String> {
        if records.is_empty() && self.require_records {
            return Err(MeshScriptError::EmptyScript);
        }

        let body_len: usize = records.iter().map(|r| r.fragment().len()).sum();
        let mut text = String::with_capacity(OPENING_MARKER.len() + body_len + CLOSING_MARKER.len());
        text.push_str(OPENING_MARKER);
        for record in records {
            text.push_str(record.fragment());
        }
        text.push_str(CLOSING_MARKER);
        Ok(text)
    }

    /// Assemble a script's records
    pub fn serialize(&self, script: &Script) -> Result<String> {
        self.assemble(script.records())
    }

    /// Write the assembled script to a persistent file
    pub fn save(&self, records: &[FilterRecord], path: &Path) -> Result<()> {
        let text = self.assemble(records)?;
        fs::write(path, text)?;
        debug!("Saved filter script to {}", path.display());
        Ok(())
    }

    /// Write the assembled script to a transient artifact in `dir`
    ///
    /// The artifact is deleted when the returned handle is dropped, unless
    /// it is explicitly kept.
    pub fn write_artifact(
        &self,
        records: &[FilterRecord],
        dir: &Path,
        prefix: &str,
    ) -> Result<TempPath> {
        let text = self.assemble(records)?;
        let mut file = tempfile::Builder::new()
            .prefix(prefix)
            .suffix(".mlx")
            .tempfile_in(dir)?;
        file.write_all(text.as_bytes())?;
        file.flush()?;

        let path = file.into_temp_path();
        debug!(
            "Wrote {} filters to script artifact {}",
            records.len(),
            path.display()
        );
        Ok(path)
    }
}
