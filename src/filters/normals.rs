//! Face orientation filters

use super::{emit, FilterXml};
use crate::error::Result;
use crate::layers::LayerEffect;
use crate::script::FilterSink;

/// Make all face orientations coherent
pub fn reorient(sink: &mut impl FilterSink) -> Result<()> {
    emit(
        sink,
        FilterXml::new("Re-Orient all faces coherentely"),
        LayerEffect::None,
    )
}

/// Invert faces; without `force` the engine tries to point normals outward
pub fn flip(sink: &mut impl FilterSink, force: bool, selected: bool) -> Result<()> {
    let filter = FilterXml::new("Invert Faces Orientation")
        .bool("forceFlip", "Force Flip", force)
        .bool("onlySelected", "Flip only selected faces", selected);
    emit(sink, filter, LayerEffect::None)
}

/// Reorient coherently, then make sure normals point outward
pub fn fix_normals(sink: &mut impl FilterSink) -> Result<()> {
    reorient(sink)?;
    flip(sink, false, false)
}
