//! Filter records and the sinks emitters write them into

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::assembler::{CLOSING_MARKER, OPENING_MARKER};
use super::EngineVersion;
use crate::error::Result;
use crate::layers::{LayerEffect, LayerStack};
use crate::results::Measurement;

/// One serialized filter plus the layer effect it declares
///
/// Immutable once built; a script executes records in append order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterRecord {
    fragment: String,
    effect: LayerEffect,
}

impl FilterRecord {
    pub fn new(fragment: impl Into<String>, effect: LayerEffect) -> Self {
        Self {
            fragment: fragment.into(),
            effect,
        }
    }

    /// A record that edits the current layer in place
    pub fn in_place(fragment: impl Into<String>) -> Self {
        Self::new(fragment, LayerEffect::None)
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    pub fn effect(&self) -> &LayerEffect {
        &self.effect
    }
}

/// Anything an emitter can append a filter record to
pub trait FilterSink {
    /// Engine release the fragments must target
    fn engine_version(&self) -> EngineVersion;

    /// Append a record, applying its layer effect if the sink tracks layers
    fn push(&mut self, record: FilterRecord) -> Result<()>;

    /// The tracked layer stack, if any
    fn layers(&self) -> Option<&LayerStack> {
        None
    }

    /// Ask for a measurement to be parsed from the engine log after a run
    fn request_measurement(&mut self, _measurement: Measurement) {}

    /// Label of the current layer, when the sink tracks layers and one exists
    fn current_label(&self) -> Option<&str> {
        self.layers().and_then(|layers| layers.current_label().ok())
    }
}

/// Script file written directly to disk, with no layer tracking
///
/// Useful for producing a script for the engine's GUI or another runner;
/// layer effects are accepted and ignored.
#[derive(Debug)]
pub struct ScriptFile {
    path: PathBuf,
    writer: BufWriter<File>,
    engine_version: EngineVersion,
    filter_count: usize,
}

impl ScriptFile {
    /// Create (truncate) the file and write the opening marker
    pub fn create(path: impl Into<PathBuf>, engine_version: EngineVersion) -> Result<Self> {
        let path = path.into();
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(OPENING_MARKER.as_bytes())?;

        Ok(Self {
            path,
            writer,
            engine_version,
            filter_count: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn filter_count(&self) -> usize {
        self.filter_count
    }

    /// Write the closing marker and flush
    pub fn finish(mut self) -> Result<PathBuf> {
        if self.filter_count == 0 {
            log::warn!("No filters written to {}", self.path.display());
        }
        self.writer.write_all(CLOSING_MARKER.as_bytes())?;
        self.writer.flush()?;
        Ok(self.path)
    }
}

impl FilterSink for ScriptFile {
    fn engine_version(&self) -> EngineVersion {
        self.engine_version
    }

    fn push(&mut self, record: FilterRecord) -> Result<()> {
        self.writer.write_all(record.fragment().as_bytes())?;
        self.filter_count += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_accessors() {
        let record = FilterRecord::new(
            "  <filter name=\"Box/Cube\"/>\n",
            LayerEffect::AddLayer("Cube".into()),
        );
        assert!(record.fragment().contains("Box/Cube"));
        assert_eq!(record.effect(), &LayerEffect::AddLayer("Cube".into()));
        assert!(FilterRecord::in_place("x").effect().is_none());
    }

    #[test]
    fn test_script_file_ignores_layer_effects() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bare.mlx");

        let mut sink = ScriptFile::create(&path, EngineVersion::default()).unwrap();
        assert!(sink.layers().is_none());
        sink.push(FilterRecord::new(
            "  <filter name=\"Delete Current Mesh\"/>\n",
            LayerEffect::DeleteLayer(None),
        ))
        .unwrap();
        assert_eq!(sink.current_label(), None);
        let written = sink.finish().unwrap();

        let text = std::fs::read_to_string(written).unwrap();
        assert_eq!(
            text,
            format!(
                "{}  <filter name=\"Delete Current Mesh\"/>\n{}",
                OPENING_MARKER, CLOSING_MARKER
            )
        );
    }
}
