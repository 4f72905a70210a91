//! Remeshing filters
//!
//! Decimation works in place. Resampling, hull and reconstruction leave the
//! source untouched and build their result in a new layer, which becomes
//! current.

use super::{emit, FilterXml};
use crate::error::{MeshScriptError, Result};
use crate::layers::LayerEffect;
use crate::script::FilterSink;

/// Label of the layer created by `uniform_resampling`
pub const RESAMPLED_LAYER: &str = "Offset mesh";
/// Label of the layer created by `hull`
pub const HULL_LAYER: &str = "Convex Hull";
/// Label of the layer created by `reconstruct_surface_poisson`
pub const POISSON_LAYER: &str = "Poisson mesh";

/// Quadric edge collapse decimation options
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Simplify {
    /// Keep texture coordinates; selects the texture-aware variant
    pub texture: bool,
    pub target_faces: u32,
    /// Target size as a fraction of the input; overrides `target_faces` when non-zero
    pub target_fraction: f64,
    pub quality_threshold: f64,
    pub preserve_boundary: bool,
    pub boundary_weight: f64,
    pub preserve_normal: bool,
    pub optimal_placement: bool,
    pub planar_quadric: bool,
    pub selected: bool,
    /// Texture variant only
    pub extra_tex_coord_weight: f64,
    /// Plain variant only
    pub preserve_topology: bool,
    /// Plain variant only
    pub quality_weight: bool,
    /// Plain variant only
    pub autoclean: bool,
}

impl Default for Simplify {
    fn default() -> Self {
        Self {
            texture: true,
            target_faces: 25000,
            target_fraction: 0.0,
            quality_threshold: 0.3,
            preserve_boundary: false,
            boundary_weight: 1.0,
            preserve_normal: false,
            optimal_placement: true,
            planar_quadric: false,
            selected: false,
            extra_tex_coord_weight: 1.0,
            preserve_topology: true,
            quality_weight: false,
            autoclean: true,
        }
    }
}

/// Reduce the face count of the current mesh
pub fn simplify(sink: &mut impl FilterSink, options: &Simplify) -> Result<()> {
    let name = if options.texture {
        "Quadric Edge Collapse Decimation (with texture)"
    } else {
        "Quadric Edge Collapse Decimation"
    };
    if !(0.0..=1.0).contains(&options.target_fraction) {
        return Err(MeshScriptError::InvalidParameter {
            filter: name.to_string(),
            reason: format!("target fraction {} is outside 0..1", options.target_fraction),
        });
    }

    let filter = FilterXml::new(name)
        .int("TargetFaceNum", "Target number of faces", i64::from(options.target_faces))
        .float("TargetPerc", "Percentage reduction (0..1)", options.target_fraction)
        .float("QualityThr", "Quality threshold", options.quality_threshold)
        .bool("PreserveBoundary", "Preserve Boundary of the mesh", options.preserve_boundary)
        .float("BoundaryWeight", "Boundary Preserving Weight", options.boundary_weight)
        .bool(
            "OptimalPlacement",
            "Optimal position of simplified vertices",
            options.optimal_placement,
        )
        .bool("PreserveNormal", "Preserve Normal", options.preserve_normal)
        .bool("PlanarQuadric", "Planar Simplification", options.planar_quadric)
        .bool("Selected", "Simplify only selected faces", options.selected);

    let filter = if options.texture {
        filter.float("Extratcoordw", "Texture Weight", options.extra_tex_coord_weight)
    } else {
        filter
            .bool("PreserveTopology", "Preserve Topology", options.preserve_topology)
            .bool("QualityWeight", "Weighted Simplification", options.quality_weight)
            .bool("AutoClean", "Post-simplification cleaning", options.autoclean)
    };
    emit(sink, filter, LayerEffect::None)
}

/// Uniform (marching cubes) resampling options
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformResampling {
    /// Cell size in absolute units
    pub voxel: f64,
    /// Distance of the new surface from the original; negative is an inset
    pub offset: f64,
    pub merge_vert: bool,
    /// Stair-stepped output, as a 3D printer would produce
    pub discretize: bool,
    pub multisample: bool,
    /// Build a shell on both sides of the surface; needs a non-zero offset
    pub thicken: bool,
}

impl Default for UniformResampling {
    fn default() -> Self {
        Self {
            voxel: 1.0,
            offset: 0.0,
            merge_vert: true,
            discretize: false,
            multisample: false,
            thicken: false,
        }
    }
}

/// Rebuild the current mesh on a regular grid into a new layer
pub fn uniform_resampling(sink: &mut impl FilterSink, options: &UniformResampling) -> Result<()> {
    if options.voxel <= 0.0 {
        return Err(MeshScriptError::InvalidParameter {
            filter: "Uniform Mesh Resampling".to_string(),
            reason: "voxel size must be positive".to_string(),
        });
    }
    let filter = FilterXml::new("Uniform Mesh Resampling")
        .abs_perc("CellSize", "Precision", options.voxel, 0.0, 100.0)
        .abs_perc("Offset", "Offset", options.offset, -100.0, 100.0)
        .bool("mergeCloseVert", "Clean Vertices", options.merge_vert)
        .bool("discretize", "Discretize", options.discretize)
        .bool("multisample", "Multisample", options.multisample)
        .bool("absDist", "Absolute Distance", options.thicken);
    emit(sink, filter, LayerEffect::AddLayer(RESAMPLED_LAYER.to_string()))
}

/// Convex hull of the current mesh, in a new layer
pub fn hull(sink: &mut impl FilterSink, reorient_normals: bool) -> Result<()> {
    let filter = FilterXml::new("Convex Hull").bool(
        "reorient",
        "Re-orient all faces coherentely",
        reorient_normals,
    );
    emit(sink, filter, LayerEffect::AddLayer(HULL_LAYER.to_string()))
}

/// Poisson surface reconstruction options
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoissonReconstruction {
    /// Octree depth; 5..10 is the useful range
    pub octree_depth: u32,
    pub solver_divide: u32,
    pub samples_per_node: f64,
    /// Isosurface correction; below 1 shrinks, above 1 grows
    pub offset: f64,
}

impl Default for PoissonReconstruction {
    fn default() -> Self {
        Self {
            octree_depth: 10,
            solver_divide: 8,
            samples_per_node: 1.0,
            offset: 1.0,
        }
    }
}

/// Reconstruct a watertight surface from the current point set, in a new layer
pub fn reconstruct_surface_poisson(
    sink: &mut impl FilterSink,
    options: &PoissonReconstruction,
) -> Result<()> {
    let filter = FilterXml::new("Surface Reconstruction: Poisson")
        .int("OctDepth", "Octree Depth", i64::from(options.octree_depth))
        .int("SolverDivide", "Solver Divide", i64::from(options.solver_divide))
        .float("SamplesPerNode", "Samples per Node", options.samples_per_node)
        .float("Offset", "Surface offsetting", options.offset);
    emit(sink, filter, LayerEffect::AddLayer(POISSON_LAYER.to_string()))
}
