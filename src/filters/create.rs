//! Primitive creation filters
//!
//! Every primitive lands in a new layer, which becomes current. Follow-up
//! transforms (placement, orientation) and optional coloring are emitted
//! against that layer.

use super::transform::{self, Axis};
use super::vert_color::{self, Color};
use super::{emit, FilterXml};
use crate::error::{MeshScriptError, Result};
use crate::layers::LayerEffect;
use crate::script::{EngineVersion, FilterSink};

fn invalid(filter: &str, reason: impl Into<String>) -> MeshScriptError {
    MeshScriptError::InvalidParameter {
        filter: filter.to_string(),
        reason: reason.into(),
    }
}

fn color_if(sink: &mut impl FilterSink, color: Option<Color>) -> Result<()> {
    match color {
        Some(color) => vert_color::uniform_color(sink, color),
        None => Ok(()),
    }
}

/// Axis-aligned box of `size`, built from six quads
///
/// The engine creates a unit cube centered on the origin; unless `center`
/// is set it is moved into the positive octant.
pub fn cube(
    sink: &mut impl FilterSink,
    size: [f64; 3],
    center: bool,
    color: Option<Color>,
) -> Result<()> {
    let name = if sink.engine_version() < EngineVersion::V2016_12 {
        "Box"
    } else {
        "Box/Cube"
    };
    let filter = FilterXml::new(name).float("size", "Scale factor", 1.0);
    emit(sink, filter, LayerEffect::AddLayer("Cube".to_string()))?;

    transform::scale(sink, size)?;
    if !center {
        transform::translate(sink, [size[0] / 2.0, size[1] / 2.0, size[2] / 2.0])?;
    }
    color_if(sink, color)
}

/// Cylinder or cone parameters, modelled on OpenSCAD's `cylinder`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cylinder {
    pub height: f64,
    /// Bottom radius
    pub radius1: f64,
    /// Top radius
    pub radius2: f64,
    /// Center the height on the origin instead of resting on it
    pub center: bool,
    pub segments: u32,
    pub up: Axis,
    pub color: Option<Color>,
}

impl Default for Cylinder {
    fn default() -> Self {
        Self {
            height: 1.0,
            radius1: 1.0,
            radius2: 1.0,
            center: false,
            segments: 32,
            up: Axis::Z,
            color: None,
        }
    }
}

impl Cylinder {
    pub fn new(height: f64, radius: f64) -> Self {
        Self {
            height,
            radius1: radius,
            radius2: radius,
            ..Self::default()
        }
    }

    pub fn cone(height: f64, radius1: f64, radius2: f64) -> Self {
        Self {
            height,
            radius1,
            radius2,
            ..Self::default()
        }
    }
}

/// Cylinder or cone; the engine builds it centered with Y up
pub fn cylinder(sink: &mut impl FilterSink, params: &Cylinder) -> Result<()> {
    if params.segments < 3 {
        return Err(invalid("Cone", "at least 3 segments are required"));
    }
    let filter = FilterXml::new("Cone")
        .float("h", "Height", params.height)
        .float("r0", "Radius 1", params.radius1)
        .float("r1", "Radius 2", params.radius2)
        .int("subdiv", "Side", i64::from(params.segments));
    emit(sink, filter, LayerEffect::AddLayer("Cone".to_string()))?;

    if !params.center {
        transform::translate(sink, [0.0, params.height / 2.0, 0.0])?;
    }
    match params.up {
        Axis::Z => transform::rotate(sink, Axis::X, 90.0)?,
        Axis::X => transform::rotate(sink, Axis::Z, -90.0)?,
        Axis::Y => {}
    }
    color_if(sink, params.color)
}

/// Icosahedron subdivided `subdivisions` times (0-8); F = 20 * 4^subdivisions
pub fn icosphere(
    sink: &mut impl FilterSink,
    radius: f64,
    subdivisions: u32,
    color: Option<Color>,
) -> Result<()> {
    if subdivisions > 8 {
        return Err(invalid("Sphere", "subdivision level must be 0-8"));
    }
    let filter = FilterXml::new("Sphere")
        .float("radius", "Radius", radius)
        .int("subdiv", "Subdiv. Level", i64::from(subdivisions));
    emit(sink, filter, LayerEffect::AddLayer("Sphere".to_string()))?;
    color_if(sink, color)
}

/// Spherical cap subtending `angle` degrees (less than 180)
pub fn sphere_cap(
    sink: &mut impl FilterSink,
    angle: f64,
    subdivisions: u32,
    color: Option<Color>,
) -> Result<()> {
    if !(angle > 0.0 && angle < 180.0) {
        return Err(invalid("Sphere Cap", "angle must be between 0 and 180 degrees"));
    }
    if subdivisions > 8 {
        return Err(invalid("Sphere Cap", "subdivision level must be 0-8"));
    }
    let filter = FilterXml::new("Sphere Cap")
        .float("angle", "Angle", angle)
        .int("subdiv", "Subdiv. Level", i64::from(subdivisions));
    emit(sink, filter, LayerEffect::AddLayer("Sphere Cap".to_string()))?;
    color_if(sink, color)
}

/// Torus parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Torus {
    /// Origin to cross-section center
    pub major_radius: f64,
    /// Cross-section radius
    pub minor_radius: f64,
    pub major_segments: u32,
    pub minor_segments: u32,
    pub color: Option<Color>,
}

impl Default for Torus {
    fn default() -> Self {
        Self {
            major_radius: 3.0,
            minor_radius: 1.0,
            major_segments: 48,
            minor_segments: 12,
            color: None,
        }
    }
}

impl Torus {
    /// Torus with the given inner and outer diameters
    pub fn from_diameters(inner: f64, outer: f64) -> Self {
        let major_radius = (inner + outer) / 4.0;
        Self {
            major_radius,
            minor_radius: major_radius - inner / 2.0,
            ..Self::default()
        }
    }
}

pub fn torus(sink: &mut impl FilterSink, params: &Torus) -> Result<()> {
    let filter = FilterXml::new("Torus")
        .float("hRadius", "Horizontal Radius", params.major_radius)
        .float("vRadius", "Vertical Radius", params.minor_radius)
        .int("hSubdiv", "Horizontal Subdivision", i64::from(params.major_segments))
        .int("vSubdiv", "Vertical Subdivision", i64::from(params.minor_segments));
    emit(sink, filter, LayerEffect::AddLayer("Torus".to_string()))?;
    color_if(sink, params.color)
}

/// Flat grid parameters (XY plane)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    pub size: [f64; 2],
    pub x_segments: u32,
    pub y_segments: u32,
    /// Center on the origin instead of the positive XY quadrant
    pub center: bool,
    pub color: Option<Color>,
}

impl Default for Grid {
    fn default() -> Self {
        Self {
            size: [1.0, 1.0],
            x_segments: 1,
            y_segments: 1,
            center: false,
            color: None,
        }
    }
}

/// 2D grid on the XY plane
///
/// The engine's own `center` flag does not center the grid, and z values
/// come out slightly off zero; both are corrected with vertex functions.
pub fn grid(sink: &mut impl FilterSink, params: &Grid) -> Result<()> {
    if params.x_segments == 0 || params.y_segments == 0 {
        return Err(invalid("Grid Generator", "at least one segment per axis is required"));
    }
    let [size_x, size_y] = params.size;
    let filter = FilterXml::new("Grid Generator")
        .float("absScaleX", "x scale", size_x)
        .float("absScaleY", "y scale", size_y)
        .int("numVertX", "num vertices on x", i64::from(params.x_segments) + 1)
        .int("numVertY", "num vertices on y", i64::from(params.y_segments) + 1)
        .bool("center", "centered on origin", false);
    emit(sink, filter, LayerEffect::AddLayer("Grid Generator".to_string()))?;

    transform::vert_function(sink, "x", "y", "rint(z)", false)?;
    if params.center {
        transform::translate(sink, [size_x / 2.0, -size_y / 2.0, 0.0])?;
    } else {
        transform::translate(sink, [size_x, 0.0, 0.0])?;
    }
    color_if(sink, params.color)
}

/// Flat disk (`inner_radius == 0`) or annulus centered on the origin
pub fn annulus(
    sink: &mut impl FilterSink,
    outer_radius: f64,
    inner_radius: f64,
    segments: u32,
    color: Option<Color>,
) -> Result<()> {
    if inner_radius < 0.0 || inner_radius >= outer_radius {
        return Err(invalid(
            "Annulus",
            "inner radius must be non-negative and smaller than the outer radius",
        ));
    }
    if segments < 3 {
        return Err(invalid("Annulus", "at least 3 segments are required"));
    }
    let filter = FilterXml::new("Annulus")
        .float("externalRadius", "External Radius", outer_radius)
        .float("internalRadius", "Internal Radius", inner_radius)
        .int("sides", "Sides", i64::from(segments));
    emit(sink, filter, LayerEffect::AddLayer("Annulus".to_string()))?;
    color_if(sink, color)
}
