//! Cleaning and deletion filters
//!
//! All of these act on the current layer in place.

use super::{emit, FilterXml};
use crate::error::{MeshScriptError, Result};
use crate::layers::LayerEffect;
use crate::script::FilterSink;

/// Merge vertices closer than `threshold`
///
/// A threshold of 0 only merges exact duplicates, which is what STL files
/// need since they store every triangle's vertices separately.
pub fn merge_vert(sink: &mut impl FilterSink, threshold: f64) -> Result<()> {
    let filter = FilterXml::new("Merge Close Vertices")
        .abs_perc("Threshold", "Merging distance", threshold, 0.0, 1.0)
        .tooltip(
            "All the vertices that closer than this threshold are merged together. \
             Use very small values, default value is 1/10000 of bounding box diagonal.",
        );
    emit(sink, filter, LayerEffect::None)
}

/// Options for `close_holes`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloseHoles {
    /// Largest hole to close, counted in boundary edges
    pub max_hole_edges: u32,
    /// Only close holes with a selected boundary face
    pub selected: bool,
    /// Leave the new faces selected
    pub select_new_faces: bool,
    pub prevent_self_intersection: bool,
}

impl Default for CloseHoles {
    fn default() -> Self {
        Self {
            max_hole_edges: 30,
            selected: false,
            select_new_faces: true,
            prevent_self_intersection: true,
        }
    }
}

pub fn close_holes(sink: &mut impl FilterSink, options: CloseHoles) -> Result<()> {
    let filter = FilterXml::new("Close Holes")
        .int("maxholesize", "Max size to be closed", i64::from(options.max_hole_edges))
        .bool("Selected", "Close holes with selected faces", options.selected)
        .bool("NewFaceSelected", "Select the newly created faces", options.select_new_faces)
        .bool(
            "SelfIntersection",
            "Prevent creation of selfIntersecting faces",
            options.prevent_self_intersection,
        );
    emit(sink, filter, LayerEffect::None)
}

/// Delete selected faces, vertices, or both
pub fn delete_selected(sink: &mut impl FilterSink, faces: bool, vertices: bool) -> Result<()> {
    let name = match (faces, vertices) {
        (true, true) => "Delete Selected Faces and Vertices",
        (true, false) => "Delete Selected Faces",
        (false, true) => "Delete Selected Vertices",
        (false, false) => {
            return Err(MeshScriptError::InvalidParameter {
                filter: "Delete Selected".to_string(),
                reason: "nothing to delete: neither faces nor vertices requested".to_string(),
            })
        }
    };
    emit(sink, FilterXml::new(name), LayerEffect::None)
}

pub fn unreferenced_vert(sink: &mut impl FilterSink) -> Result<()> {
    emit(sink, FilterXml::new("Remove Unreferenced Vertex"), LayerEffect::None)
}

pub fn duplicate_faces(sink: &mut impl FilterSink) -> Result<()> {
    emit(sink, FilterXml::new("Remove Duplicate Faces"), LayerEffect::None)
}

pub fn duplicate_verts(sink: &mut impl FilterSink) -> Result<()> {
    emit(sink, FilterXml::new("Remove Duplicated Vertex"), LayerEffect::None)
}

pub fn zero_area_faces(sink: &mut impl FilterSink) -> Result<()> {
    emit(sink, FilterXml::new("Remove Zero Area Faces"), LayerEffect::None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::{EngineVersion, Script};

    #[test]
    fn test_delete_selected_variants() {
        let mut script = Script::new(EngineVersion::default());
        delete_selected(&mut script, true, false).unwrap();
        delete_selected(&mut script, false, true).unwrap();
        assert!(delete_selected(&mut script, false, false).is_err());

        assert_eq!(
            script.records()[0].fragment(),
            "  <filter name=\"Delete Selected Faces\"/>\n"
        );
        assert_eq!(script.records().len(), 2);
    }

    #[test]
    fn test_close_holes_defaults() {
        let mut script = Script::new(EngineVersion::default());
        close_holes(&mut script, CloseHoles::default()).unwrap();
        let fragment = script.records()[0].fragment();
        assert!(fragment.contains("name=\"maxholesize\" value=\"30\""));
        assert!(fragment.contains("name=\"NewFaceSelected\" value=\"true\""));
    }
}
