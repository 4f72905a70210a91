//! Transient files created for one engine run

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use tempfile::TempPath;
use walkdir::WalkDir;

use crate::error::Result;
use crate::script::{FilterRecord, ScriptAssembler};

/// Temporary files owned by one execution
///
/// Every file is created in `dir` with a name starting with
/// `<prefix><run id>_`, so concurrent or sequential runs never collide
/// and an abort can sweep them by prefix. Dropping the set deletes the
/// files; `retain` keeps them on disk.
#[derive(Debug)]
pub struct TransientArtifacts {
    dir: PathBuf,
    prefix: String,
    files: Vec<TempPath>,
}

impl TransientArtifacts {
    pub fn new(dir: impl Into<PathBuf>, prefix: &str, run_id: &str) -> Self {
        Self {
            dir: dir.into(),
            prefix: format!("{}{}_", prefix, run_id),
            files: Vec::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Name prefix shared by every file of this run
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Paths of the files created so far
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|p| p.to_path_buf()).collect()
    }

    fn create(&mut self, suffix: &str, contents: &[u8]) -> Result<PathBuf> {
        let mut file = tempfile::Builder::new()
            .prefix(&self.prefix)
            .suffix(suffix)
            .tempfile_in(&self.dir)?;
        file.write_all(contents)?;
        file.flush()?;

        let path = file.into_temp_path();
        let owned = path.to_path_buf();
        debug!("Created transient artifact {}", owned.display());
        self.files.push(path);
        Ok(owned)
    }

    /// One-vertex point cloud that lets the engine start without real inputs
    pub fn placeholder_input(&mut self) -> Result<PathBuf> {
        self.create(".xyz", b"0 0 0")
    }

    /// Assembled filter script
    pub fn script(&mut self, records: &[FilterRecord]) -> Result<PathBuf> {
        let path = ScriptAssembler::new().write_artifact(records, &self.dir, &self.prefix)?;
        let owned = path.to_path_buf();
        self.files.push(path);
        Ok(owned)
    }

    /// Empty file for the engine's own log
    pub fn engine_log(&mut self) -> Result<PathBuf> {
        self.create(".txt", b"")
    }

    /// Keep every file on disk and return their paths
    pub fn retain(self) -> Vec<PathBuf> {
        self.files
            .into_iter()
            .filter_map(|path| path.keep().ok())
            .collect()
    }

    /// Delete every file now, reporting the first failure
    pub fn cleanup(self) -> Result<()> {
        let mut first_error = None;
        for path in self.files {
            let display = path.to_path_buf();
            if let Err(e) = path.close() {
                warn!("Could not delete {}: {}", display.display(), e);
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}

/// Delete files directly inside `dir` whose name starts with `prefix`
///
/// Returns how many files were removed.
pub fn delete_matching(dir: &Path, prefix: &str) -> Result<usize> {
    let mut removed = 0;
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .file_name()
            .to_str()
            .map(|name| name.starts_with(prefix))
            .unwrap_or(false);
        if matches {
            fs::remove_file(entry.path())?;
            debug!("Deleted {}", entry.path().display());
            removed += 1;
        }
    }
    Ok(removed)
}
