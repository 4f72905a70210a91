//! Filter Script Module
//!
//! A `Script` owns the ordered filter records, the input and output
//! manifests and the layer stack those records are predicted to produce.
//! Emitters append to it through the `FilterSink` trait; the execution
//! controller consumes it once.

mod assembler;
pub mod project;
mod record;
mod version;

use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};

pub use assembler::{ScriptAssembler, CLOSING_MARKER, OPENING_MARKER};
pub use record::{FilterRecord, FilterSink, ScriptFile};
pub use version::EngineVersion;

use crate::engine::{ExecutionController, ExecutionOptions, ExecutionReport};
use crate::error::{MeshScriptError, Result};
use crate::filters::{clean, layers as layer_filters};
use crate::layers::LayerStack;
use crate::results::{Measurement, MeasurementRequest, MeasurementResults};

/// How the engine loads an input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputRole {
    Mesh,
    Project,
}

/// Declared input file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputFile {
    pub path: PathBuf,
    pub role: InputRole,
}

/// Declared output file, with an explicit mask or the extension default
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputFile {
    pub path: PathBuf,
    /// Flag and tokens, e.g. `"-m vc vn"`
    pub mask: Option<String>,
}

impl OutputFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            mask: None,
        }
    }

    pub fn with_mask(path: impl Into<PathBuf>, mask: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            mask: Some(mask.into()),
        }
    }
}

/// Lowercased extension of a path
pub(crate) fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.trim().to_lowercase())
}

/// Layer label the engine gives a mesh loaded from `path`
fn layer_label(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// A filter script under construction
#[derive(Debug, Clone)]
pub struct Script {
    records: Vec<FilterRecord>,
    layers: LayerStack,
    inputs: Vec<InputFile>,
    outputs: Vec<OutputFile>,
    engine_version: EngineVersion,
    requested: MeasurementRequest,
    results: MeasurementResults,
    executed: bool,
}

impl Script {
    /// Script with no inputs and an empty layer stack
    pub fn new(engine_version: EngineVersion) -> Self {
        Self {
            records: Vec::new(),
            layers: LayerStack::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            engine_version,
            requested: MeasurementRequest::default(),
            results: MeasurementResults::default(),
            executed: false,
        }
    }

    pub fn builder() -> ScriptBuilder {
        ScriptBuilder::new()
    }

    /// Append a record, applying its layer effect first
    ///
    /// The record is only stored when the effect applies cleanly, so the
    /// stack always matches the records.
    pub fn append(&mut self, record: FilterRecord) -> Result<()> {
        if self.executed {
            return Err(MeshScriptError::ScriptFinalized);
        }
        self.layers.apply(record.effect())?;
        debug!("Appended filter ({})", record.effect());
        self.records.push(record);
        Ok(())
    }

    /// Declare another output file
    pub fn add_output(&mut self, output: OutputFile) -> Result<()> {
        if self.executed {
            return Err(MeshScriptError::ScriptFinalized);
        }
        self.outputs.push(output);
        Ok(())
    }

    /// Assembled script text
    pub fn to_script_text(&self) -> Result<String> {
        ScriptAssembler::new().serialize(self)
    }

    /// Save the assembled script, e.g. for use in the engine's GUI
    pub fn save(&self, path: &Path) -> Result<()> {
        if self.records.is_empty() {
            log::warn!("Saving a script with no filters to {}", path.display());
        }
        ScriptAssembler::new().save(&self.records, path)
    }

    /// Execute the script once with `controller`
    pub fn run(
        &mut self,
        controller: &mut ExecutionController,
        options: &ExecutionOptions,
    ) -> Result<ExecutionReport> {
        controller.execute(self, options)
    }

    pub fn records(&self) -> &[FilterRecord] {
        &self.records
    }

    pub fn layers(&self) -> &LayerStack {
        &self.layers
    }

    pub fn inputs(&self) -> &[InputFile] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[OutputFile] {
        &self.outputs
    }

    pub fn engine_version(&self) -> EngineVersion {
        self.engine_version
    }

    pub fn requested_measurements(&self) -> &MeasurementRequest {
        &self.requested
    }

    /// Measurements parsed after the last run
    pub fn results(&self) -> &MeasurementResults {
        &self.results
    }

    pub fn is_executed(&self) -> bool {
        self.executed
    }

    /// Mark the script consumed; fails if it already was
    pub(crate) fn finalize(&mut self) -> Result<()> {
        if self.executed {
            return Err(MeshScriptError::ScriptFinalized);
        }
        self.executed = true;
        Ok(())
    }

    pub(crate) fn attach_results(&mut self, results: MeasurementResults) {
        self.results = results;
    }

    /// Merge duplicated vertices on every layer loaded from an STL file
    fn merge_stl_layers(&mut self, stl_layers: &[usize]) -> Result<()> {
        for &layer in stl_layers {
            if self.layers.current_index() != Some(layer) {
                layer_filters::change(self, layer)?;
            }
            clean::merge_vert(self, 0.0)?;
        }

        let last = self.layers.len().saturating_sub(1);
        if self.layers.current_index() != Some(last) {
            layer_filters::change(self, last)?;
        }
        Ok(())
    }
}

impl FilterSink for Script {
    fn engine_version(&self) -> EngineVersion {
        self.engine_version
    }

    fn push(&mut self, record: FilterRecord) -> Result<()> {
        self.append(record)
    }

    fn layers(&self) -> Option<&LayerStack> {
        Some(&self.layers)
    }

    fn request_measurement(&mut self, measurement: Measurement) {
        self.requested.request(measurement);
    }
}

/// Builder for a `Script` with declared inputs and outputs
#[derive(Debug, Clone)]
pub struct ScriptBuilder {
    projects: Vec<PathBuf>,
    meshes: Vec<PathBuf>,
    outputs: Vec<OutputFile>,
    engine_version: EngineVersion,
    merge_stl: bool,
}

impl Default for ScriptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptBuilder {
    pub fn new() -> Self {
        Self {
            projects: Vec::new(),
            meshes: Vec::new(),
            outputs: Vec::new(),
            engine_version: EngineVersion::default(),
            merge_stl: true,
        }
    }

    /// Input mesh; loaded after every project
    pub fn mesh(mut self, path: impl Into<PathBuf>) -> Self {
        self.meshes.push(path.into());
        self
    }

    pub fn meshes<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.meshes.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Input project; its meshes are loaded in document order
    pub fn project(mut self, path: impl Into<PathBuf>) -> Self {
        self.projects.push(path.into());
        self
    }

    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.outputs.push(OutputFile::new(path));
        self
    }

    pub fn output_with_mask(mut self, path: impl Into<PathBuf>, mask: impl Into<String>) -> Self {
        self.outputs.push(OutputFile::with_mask(path, mask));
        self
    }

    pub fn engine_version(mut self, version: EngineVersion) -> Self {
        self.engine_version = version;
        self
    }

    /// Emit `Merge Close Vertices` for STL inputs (default: on)
    pub fn merge_stl_vertices(mut self, merge: bool) -> Self {
        self.merge_stl = merge;
        self
    }

    /// Read project files, seed the layer stack and emit STL merges
    pub fn build(self) -> Result<Script> {
        let mut labels = Vec::new();
        let mut stl_layers = Vec::new();
        let mut inputs = Vec::with_capacity(self.projects.len() + self.meshes.len());

        for path in &self.projects {
            for mesh in project::read_project(path)? {
                if mesh.extension().as_deref() == Some("stl") {
                    stl_layers.push(labels.len());
                }
                labels.push(mesh.label);
            }
            inputs.push(InputFile {
                path: path.clone(),
                role: InputRole::Project,
            });
        }

        for path in &self.meshes {
            if extension_of(path).as_deref() == Some("stl") {
                stl_layers.push(labels.len());
            }
            labels.push(layer_label(path));
            inputs.push(InputFile {
                path: path.clone(),
                role: InputRole::Mesh,
            });
        }

        let mut script = Script::new(self.engine_version);
        script.layers.seed(labels)?;
        script.inputs = inputs;
        script.outputs = self.outputs;

        if self.merge_stl && !stl_layers.is_empty() {
            script.merge_stl_layers(&stl_layers)?;
        }

        info!(
            "Script for MeshLab {} with {} inputs, {} layers",
            script.engine_version,
            script.inputs.len(),
            script.layers.len()
        );
        Ok(script)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::LayerEffect;

    #[test]
    fn test_mesh_inputs_seed_layers() {
        let script = Script::builder()
            .mesh("scans/bunny.ply")
            .mesh("teapot.obj")
            .build()
            .unwrap();

        assert_eq!(script.layers().entries(), &["bunny", "teapot"]);
        assert_eq!(script.layers().current_index(), Some(1));
        assert!(script.records().is_empty());
        assert_eq!(script.inputs()[0].role, InputRole::Mesh);
    }

    #[test]
    fn test_mesh_label_is_file_stem() {
        let mut script = Script::builder()
            .mesh("parts/left/c.obj")
            .mesh("archive.tar.ply")
            .build()
            .unwrap();
        assert_eq!(script.layers().entries(), &["c", "archive.tar"]);

        // Derived labels build on the stem, not the directory.
        layer_filters::change(&mut script, 0).unwrap();
        layer_filters::duplicate(&mut script).unwrap();
        assert_eq!(script.layers().current_label().unwrap(), "c_copy");
    }

    #[test]
    fn test_stl_inputs_emit_merge_and_return_to_last() {
        let script = Script::builder()
            .mesh("a.stl")
            .mesh("b.ply")
            .build()
            .unwrap();

        let names: Vec<&str> = script.records().iter().map(|r| r.fragment()).collect();
        assert_eq!(names.len(), 3);
        assert!(names[0].contains("Change the current layer"));
        assert!(names[1].contains("Merge Close Vertices"));
        assert!(names[2].contains("Change the current layer"));
        assert_eq!(script.layers().current_index(), Some(1));
    }

    #[test]
    fn test_stl_merge_can_be_disabled() {
        let script = Script::builder()
            .mesh("a.stl")
            .merge_stl_vertices(false)
            .build()
            .unwrap();
        assert!(script.records().is_empty());
    }

    #[test]
    fn test_failed_effect_does_not_append() {
        let mut script = Script::new(EngineVersion::default());
        let err = script
            .append(FilterRecord::new("x", LayerEffect::DeleteLayer(None)))
            .unwrap_err();
        assert!(matches!(err, MeshScriptError::EmptyLayerStack));
        assert!(script.records().is_empty());
    }

    #[test]
    fn test_finalized_script_rejects_appends() {
        let mut script = Script::new(EngineVersion::default());
        script.finalize().unwrap();
        assert!(matches!(
            script.append(FilterRecord::in_place("x")),
            Err(MeshScriptError::ScriptFinalized)
        ));
        assert!(matches!(
            script.finalize(),
            Err(MeshScriptError::ScriptFinalized)
        ));
    }
}
