//! Layer management filters

use log::warn;

use super::{current_label, emit, FilterXml};
use crate::error::Result;
use crate::layers::LayerEffect;
use crate::script::{FilterRecord, FilterSink};

/// Label the engine gives a flattened layer
pub const MERGED_MESH: &str = "Merged Mesh";

/// Options for `join`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinOptions {
    pub merge_visible: bool,
    pub merge_vertices: bool,
    /// Delete the source layers; only the merged layer remains
    pub delete_layers: bool,
    pub keep_unreferenced: bool,
}

impl Default for JoinOptions {
    fn default() -> Self {
        Self {
            merge_visible: true,
            merge_vertices: false,
            delete_layers: true,
            keep_unreferenced: false,
        }
    }
}

/// Flatten all visible layers into a new "Merged Mesh" layer
///
/// Textures are discarded. All layers are assumed visible, which is always
/// the case for scripts run by the engine's server.
pub fn join(sink: &mut impl FilterSink, options: JoinOptions) -> Result<()> {
    let filter = FilterXml::new("Flatten Visible Layers")
        .bool("MergeVisible", "Merge Only Visible Layers", options.merge_visible)
        .bool("MergeVertices", "Merge duplicate vertices", options.merge_vertices)
        .bool("DeleteLayer", "Delete Layers", options.delete_layers)
        .bool("AlsoUnreferenced", "Keep unreferenced vertices", options.keep_unreferenced);

    let effect = if options.delete_layers {
        LayerEffect::Collapse(MERGED_MESH.to_string())
    } else {
        LayerEffect::AddLayer(MERGED_MESH.to_string())
    };
    emit(sink, filter, effect)
}

/// Record that deletes the current layer
pub fn delete_record() -> FilterRecord {
    FilterXml::new("Delete Current Mesh").into_record(LayerEffect::DeleteLayer(None))
}

/// Delete the current layer
pub fn delete(sink: &mut impl FilterSink) -> Result<()> {
    sink.push(delete_record())
}

/// Rename the current layer; output project files use the labels as filenames
pub fn rename(sink: &mut impl FilterSink, label: &str) -> Result<()> {
    let filter = FilterXml::new("Rename Current Mesh").string("newName", "New Label", label);
    emit(sink, filter, LayerEffect::RenameCurrent(label.to_string()))
}

/// Make layer `index` current
///
/// Some server builds crash on this filter even though the GUI runs it
/// fine; it is emitted anyway.
pub fn change(sink: &mut impl FilterSink, index: usize) -> Result<()> {
    warn!(
        "Changing current layer to #{}: this filter is unreliable in some meshlabserver builds",
        index
    );
    let filter = FilterXml::new("Change the current layer")
        .mesh("mesh", "Mesh", index)
        .tooltip("The number of the layer to change to");
    emit(sink, filter, LayerEffect::ChangeCurrent(index))
}

/// Duplicate the current layer as "<label>_copy"
pub fn duplicate(sink: &mut impl FilterSink) -> Result<()> {
    let label = format!("{}_copy", current_label(&*sink)?);
    emit(
        sink,
        FilterXml::new("Duplicate Current layer"),
        LayerEffect::AddLayer(label),
    )
}

/// Split the current mesh into connected components "CC 0", "CC 1", ...
///
/// The engine decides the part count at run time. Without `part_count`
/// the layers it creates cannot be predicted and are not tracked.
pub fn split_parts(sink: &mut impl FilterSink, part_count: Option<usize>) -> Result<()> {
    let filter = FilterXml::new("Split in Connected Components");
    let effect = match part_count {
        Some(count) => LayerEffect::AddLayers((0..count).map(|i| format!("CC {}", i)).collect()),
        None => {
            warn!("Part count not provided; layers created by the split are not tracked");
            LayerEffect::None
        }
    };
    emit(sink, filter, effect)
}
