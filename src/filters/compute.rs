//! Measurement and computation filters

use super::{current_label, emit, FilterXml};
use crate::error::Result;
use crate::layers::LayerEffect;
use crate::results::Measurement;
use crate::script::FilterSink;

/// Slicing plane orientation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SectionAxis {
    X,
    Y,
    Z,
    /// Plane perpendicular to an arbitrary vector
    Custom([f64; 3]),
}

impl SectionAxis {
    fn index(&self) -> usize {
        match self {
            SectionAxis::X => 0,
            SectionAxis::Y => 1,
            SectionAxis::Z => 2,
            SectionAxis::Custom(_) => 3,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            SectionAxis::X => "X",
            SectionAxis::Y => "Y",
            SectionAxis::Z => "Z",
            SectionAxis::Custom(_) => "custom",
        }
    }

    fn vector(&self) -> [f64; 3] {
        match self {
            SectionAxis::Custom(v) => *v,
            _ => [0.0, 0.0, 1.0],
        }
    }
}

/// Point the section plane offset is measured from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaneReference {
    BoundingBoxCenter,
    BoundingBoxMin,
    #[default]
    Origin,
}

impl PlaneReference {
    fn index(self) -> usize {
        match self {
            PlaneReference::BoundingBoxCenter => 0,
            PlaneReference::BoundingBoxMin => 1,
            PlaneReference::Origin => 2,
        }
    }
}

/// Slice the current mesh with a plane
///
/// Creates `<label>_sect_<axis>_<offset>` holding the section polyline and,
/// with `surface`, `<label>_sect_<axis>_<offset>_mesh` holding its
/// triangulation (closed polylines only). The offset in the label is
/// truncated to an integer.
pub fn section(
    sink: &mut impl FilterSink,
    axis: SectionAxis,
    offset: f64,
    surface: bool,
    reference: PlaneReference,
) -> Result<()> {
    let filter = FilterXml::new("Compute Planar Section")
        .enumeration(
            "planeAxis",
            "Plane perpendicular to",
            axis.index(),
            &["X Axis", "Y Axis", "Z Axis", "Custom Axis"],
        )
        .point("customAxis", "Custom axis", axis.vector())
        .float("planeOffset", "Cross plane offset", offset)
        .enumeration(
            "relativeTo",
            "plane reference",
            reference.index(),
            &["Bounding box center", "Bounding box min", "Origin"],
        )
        .bool("createSectionSurface", "Create also section surface", surface);

    let base = format!(
        "{}_sect_{}_{}",
        current_label(&*sink)?,
        axis.label(),
        offset.trunc() as i64
    );
    let effect = if surface {
        let mesh = format!("{}_mesh", base);
        LayerEffect::AddLayers(vec![base, mesh])
    } else {
        LayerEffect::AddLayer(base)
    };
    emit(sink, filter, effect)
}

/// Bounding box, areas, volume, barycenters and inertia of the current mesh
///
/// Results are written to the engine log and parsed after the run.
pub fn measure_geometry(sink: &mut impl FilterSink) -> Result<()> {
    emit(
        sink,
        FilterXml::xml("Compute Geometric Measures"),
        LayerEffect::None,
    )?;
    sink.request_measurement(Measurement::Geometry);
    Ok(())
}

/// Element counts, manifoldness, genus and holes of the current mesh
pub fn measure_topology(sink: &mut impl FilterSink) -> Result<()> {
    emit(
        sink,
        FilterXml::xml("Compute Topological Measures"),
        LayerEffect::None,
    )?;
    sink.request_measurement(Measurement::Topology);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::Script;

    fn bunny() -> Script {
        Script::builder().mesh("bunny.ply").build().unwrap()
    }

    #[test]
    fn test_section_labels() {
        let mut script = bunny();
        section(&mut script, SectionAxis::Z, 2.7, false, PlaneReference::Origin).unwrap();
        assert_eq!(script.layers().current_label().unwrap(), "bunny_sect_Z_2");

        section(&mut script, SectionAxis::Custom([1.0, 1.0, 0.0]), -1.5, true, PlaneReference::BoundingBoxCenter)
            .unwrap();
        assert_eq!(
            script.layers().entries(),
            &[
                "bunny",
                "bunny_sect_Z_2",
                "bunny_sect_Z_2_sect_custom_-1",
                "bunny_sect_Z_2_sect_custom_-1_mesh",
            ]
        );
        assert!(script.records()[1]
            .fragment()
            .contains("x=\"1.0\" y=\"1.0\" z=\"0.0\""));
    }

    #[test]
    fn test_measure_requests_parsing() {
        let mut script = bunny();
        measure_geometry(&mut script).unwrap();
        measure_topology(&mut script).unwrap();

        let requested = script.requested_measurements();
        assert!(requested.geometry);
        assert!(requested.topology);
        assert!(!requested.hausdorff);
        assert_eq!(
            script.records()[0].fragment(),
            "  <xmlfilter name=\"Compute Geometric Measures\"/>\n"
        );
    }
}
