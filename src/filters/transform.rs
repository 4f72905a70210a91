//! Transformation filters
//!
//! Translate, rotate and scale are expressed as per-vertex geometric
//! functions, which are more accurate than the engine's matrix transforms.

use serde::{Deserialize, Serialize};

use super::{emit, format_float, FilterXml};
use crate::error::Result;
use crate::layers::LayerEffect;
use crate::script::{EngineVersion, FilterSink};

/// Principal axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Move every vertex by `offset`
pub fn translate(sink: &mut impl FilterSink, offset: [f64; 3]) -> Result<()> {
    vert_function(
        sink,
        &format!("x+({})", format_float(offset[0])),
        &format!("y+({})", format_float(offset[1])),
        &format!("z+({})", format_float(offset[2])),
        false,
    )
}

/// Rotate about `axis` through the origin by `degrees`
pub fn rotate(sink: &mut impl FilterSink, axis: Axis, degrees: f64) -> Result<()> {
    let angle = format_float(degrees.to_radians());
    let (x, y, z) = match axis {
        Axis::X => (
            "x".to_string(),
            format!("y*cos({a})-z*sin({a})", a = angle),
            format!("y*sin({a})+z*cos({a})", a = angle),
        ),
        Axis::Y => (
            format!("z*sin({a})+x*cos({a})", a = angle),
            "y".to_string(),
            format!("z*cos({a})-x*sin({a})", a = angle),
        ),
        Axis::Z => (
            format!("x*cos({a})-y*sin({a})", a = angle),
            format!("x*sin({a})+y*cos({a})", a = angle),
            "z".to_string(),
        ),
    };
    vert_function(sink, &x, &y, &z, false)
}

/// Scale about the origin, per axis
pub fn scale(sink: &mut impl FilterSink, factor: [f64; 3]) -> Result<()> {
    vert_function(
        sink,
        &format!("x*({})", format_float(factor[0])),
        &format!("y*({})", format_float(factor[1])),
        &format!("z*({})", format_float(factor[2])),
        false,
    )
}

/// New vertex coordinates from muparser expressions
///
/// `selected` restricts the function to selected vertices; it needs
/// MeshLab 2016.12 and is ignored by older engines.
pub fn vert_function(
    sink: &mut impl FilterSink,
    x_func: &str,
    y_func: &str,
    z_func: &str,
    selected: bool,
) -> Result<()> {
    let filter = if sink.engine_version() < EngineVersion::V2016_12 {
        FilterXml::new("Geometric Function")
            .string("x", "func x = ", x_func)
            .string("y", "func y = ", y_func)
            .string("z", "func z = ", z_func)
    } else {
        FilterXml::new("Per Vertex Geometric Function")
            .string("x", "func x = ", x_func)
            .string("y", "func y = ", y_func)
            .string("z", "func z = ", z_func)
            .bool("onselected", "only on selection", selected)
    };
    emit(sink, filter, LayerEffect::None)
}

/// Apply the current transformation matrix to the vertex coordinates
pub fn freeze_matrix(sink: &mut impl FilterSink, all_layers: bool) -> Result<()> {
    let filter = FilterXml::new("Freeze Current Matrix").bool(
        "allLayers",
        "Apply to all visible Layers",
        all_layers,
    );
    emit(sink, filter, LayerEffect::None)
}
