//! Selection filters
//!
//! Selections feed the `Selected` flags of other filters and the
//! `clean::delete_selected` family. None of them touch the layer stack.

use super::{emit, format_float, FilterXml};
use crate::error::{MeshScriptError, Result};
use crate::layers::LayerEffect;
use crate::script::FilterSink;

/// Clear the face and/or vertex selection
pub fn deselect(sink: &mut impl FilterSink, faces: bool, vertices: bool) -> Result<()> {
    let filter = FilterXml::new("Select None")
        .bool("allFaces", "De-select all Faces", faces)
        .tooltip("If true the filter will de-select all the faces.")
        .bool("allVerts", "De-select all Vertices", vertices)
        .tooltip("If true the filter will de-select all the vertices.");
    emit(sink, filter, LayerEffect::None)
}

pub fn invert(sink: &mut impl FilterSink, faces: bool, vertices: bool) -> Result<()> {
    let filter = FilterXml::new("Invert Selection")
        .bool("InvFaces", "Invert Faces", faces)
        .bool("InvVerts", "Invert Vertices", vertices);
    emit(sink, filter, LayerEffect::None)
}

/// Select vertices and faces on the mesh boundary
pub fn border(sink: &mut impl FilterSink) -> Result<()> {
    emit(sink, FilterXml::new("Select Border"), LayerEffect::None)
}

/// Dilate the selection by one ring per iteration
pub fn grow(sink: &mut impl FilterSink, iterations: u32) -> Result<()> {
    for _ in 0..iterations {
        emit(sink, FilterXml::new("Dilate Selection"), LayerEffect::None)?;
    }
    Ok(())
}

/// Erode the selection by one ring per iteration
pub fn shrink(sink: &mut impl FilterSink, iterations: u32) -> Result<()> {
    for _ in 0..iterations {
        emit(sink, FilterXml::new("Erode Selection"), LayerEffect::None)?;
    }
    Ok(())
}

pub fn self_intersecting_face(sink: &mut impl FilterSink) -> Result<()> {
    emit(sink, FilterXml::new("Select Self Intersecting Faces"), LayerEffect::None)
}

pub fn nonmanifold_vert(sink: &mut impl FilterSink) -> Result<()> {
    emit(sink, FilterXml::new("Select non Manifold Vertices"), LayerEffect::None)
}

pub fn nonmanifold_edge(sink: &mut impl FilterSink) -> Result<()> {
    emit(sink, FilterXml::new("Select non Manifold Edges"), LayerEffect::None)
}

/// Select connected components smaller than `ratio` of the largest one
///
/// `ratio` is a face-count ratio in `0..=1`; larger values select more.
pub fn small_parts(sink: &mut impl FilterSink, ratio: f64, non_closed_only: bool) -> Result<()> {
    if !(0.0..=1.0).contains(&ratio) {
        return Err(MeshScriptError::InvalidParameter {
            filter: "Small component selection".to_string(),
            reason: format!("ratio {} is outside 0..1", ratio),
        });
    }
    let filter = FilterXml::new("Small component selection")
        .float("NbFaceRatio", "Small component ratio", ratio)
        .bool("NonClosedOnly", "Select only non closed components", non_closed_only);
    emit(sink, filter, LayerEffect::None)
}

/// Select vertices whose quality lies in `min..=max`
///
/// With `inclusive`, a face is selected only when all its vertices are.
pub fn vert_quality(sink: &mut impl FilterSink, min: f64, max: f64, inclusive: bool) -> Result<()> {
    let filter = FilterXml::new("Select by Vertex Quality")
        .dynamic_float("minQ", "Min Quality", min, 0.0, 0.1)
        .dynamic_float("maxQ", "Max Quality", max, 0.0, 0.1)
        .bool("Inclusive", "Inclusive Sel.", inclusive);
    emit(sink, filter, LayerEffect::None)
}

/// Select faces where the muparser expression is true
///
/// Per-face variables: `x0`..`z2`, `nx0`.., `r0`.., `q0`..`q2`, `fi`.
pub fn face_function(sink: &mut impl FilterSink, function: &str) -> Result<()> {
    let filter = FilterXml::new("Conditional Face Selection")
        .string("condSelect", "boolean function", function);
    emit(sink, filter, LayerEffect::None)
}

/// Select vertices where the muparser expression is true
///
/// With `strict_faces`, a face is selected only when all its vertices are.
pub fn vert_function(sink: &mut impl FilterSink, function: &str, strict_faces: bool) -> Result<()> {
    let filter = FilterXml::new("Conditional Vertex Selection")
        .string("condSelect", "boolean function", function)
        .bool("strictSelect", "Strict face selection", strict_faces);
    emit(sink, filter, LayerEffect::None)
}

/// Select every vertex within `radius` of `center`
pub fn spherical(
    sink: &mut impl FilterSink,
    radius: f64,
    center: [f64; 3],
    strict_faces: bool,
) -> Result<()> {
    let function = format!(
        "sqrt((x-{})^2+(y-{})^2+(z-{})^2)<={}",
        format_float(center[0]),
        format_float(center[1]),
        format_float(center[2]),
        format_float(radius)
    );
    vert_function(sink, &function, strict_faces)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::clean;
    use crate::script::{EngineVersion, Script};

    #[test]
    fn test_grow_and_shrink_repeat() {
        let mut script = Script::new(EngineVersion::default());
        grow(&mut script, 3).unwrap();
        shrink(&mut script, 0).unwrap();
        shrink(&mut script, 1).unwrap();

        let text = script.to_script_text().unwrap();
        assert_eq!(text.matches("Dilate Selection").count(), 3);
        assert_eq!(text.matches("Erode Selection").count(), 1);
    }

    #[test]
    fn test_spherical_escapes_comparison() {
        let mut script = Script::new(EngineVersion::default());
        spherical(&mut script, 2.5, [1.0, 0.0, -1.0], true).unwrap();

        let fragment = script.records()[0].fragment();
        assert!(fragment.contains("<filter name=\"Conditional Vertex Selection\">"));
        assert!(fragment.contains("value=\"sqrt((x-1.0)^2+(y-0.0)^2+(z--1.0)^2)&lt;=2.5\""));
        assert!(fragment.contains("name=\"strictSelect\" value=\"true\""));
    }

    #[test]
    fn test_small_parts_ratio_bounds() {
        let mut script = Script::new(EngineVersion::default());
        assert!(small_parts(&mut script, 1.5, false).is_err());
        assert!(script.records().is_empty());

        small_parts(&mut script, 0.2, true).unwrap();
        let fragment = script.records()[0].fragment();
        assert!(fragment.contains("name=\"NbFaceRatio\" value=\"0.2\""));
        assert!(fragment.contains("name=\"NonClosedOnly\" value=\"true\""));
    }

    #[test]
    fn test_select_then_delete_keeps_layers() {
        let mut script = Script::builder().mesh("scan.ply").build().unwrap();
        nonmanifold_edge(&mut script).unwrap();
        grow(&mut script, 1).unwrap();
        clean::delete_selected(&mut script, true, true).unwrap();
        deselect(&mut script, true, true).unwrap();

        assert_eq!(script.records().len(), 4);
        assert_eq!(script.layers().entries(), &["scan"]);
        assert_eq!(script.layers().current_index(), Some(0));
    }
}
