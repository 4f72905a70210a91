//! Sampling filters

use super::{emit, FilterXml};
use crate::error::Result;
use crate::layers::LayerEffect;
use crate::results::Measurement;
use crate::script::FilterSink;

/// Hausdorff distance options
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hausdorff {
    /// Layer whose surface is sampled
    pub sampled_layer: usize,
    /// Layer searched for the closest point of each sample
    pub target_layer: usize,
    /// Keep both sample clouds as new layers
    pub save_samples: bool,
    pub sample_vertices: bool,
    pub sample_edges: bool,
    pub sample_faux_edges: bool,
    pub sample_faces: bool,
    pub sample_count: u32,
    /// Samples with nothing closer than this are rejected
    pub max_distance: f64,
    pub max_distance_limit: f64,
}

impl Default for Hausdorff {
    fn default() -> Self {
        Self {
            sampled_layer: 1,
            target_layer: 0,
            save_samples: false,
            sample_vertices: true,
            sample_edges: true,
            sample_faux_edges: false,
            sample_faces: true,
            sample_count: 1000,
            max_distance: 10.0,
            max_distance_limit: 100.0,
        }
    }
}

/// Labels of the layers created when samples are saved
pub const HAUSDORFF_SAMPLE_LAYERS: [&str; 2] = ["Hausdorff Sample Point", "Hausdorff Closest Points"];

/// One-sided Hausdorff distance from the sampled layer to the target layer
///
/// The distances are written to the engine log and parsed after the run.
pub fn hausdorff_distance(sink: &mut impl FilterSink, options: &Hausdorff) -> Result<()> {
    let filter = FilterXml::new("Hausdorff Distance")
        .mesh("SampledMesh", "Sampled Mesh", options.sampled_layer)
        .mesh("TargetMesh", "Target Mesh", options.target_layer)
        .bool("SaveSample", "Save Samples", options.save_samples)
        .bool("SampleVert", "Sample Vertexes", options.sample_vertices)
        .bool("SampleEdge", "Sample Edges", options.sample_edges)
        .bool("SampleFauxEdge", "Sample FauxEdge", options.sample_faux_edges)
        .bool("SampleFace", "Sample Faces", options.sample_faces)
        .int("SampleNum", "Number of samples", i64::from(options.sample_count))
        .abs_perc(
            "MaxDist",
            "Max Distance",
            options.max_distance,
            0.0,
            options.max_distance_limit,
        );

    let effect = if options.save_samples {
        LayerEffect::AddLayers(HAUSDORFF_SAMPLE_LAYERS.iter().map(|l| l.to_string()).collect())
    } else {
        LayerEffect::None
    };
    emit(sink, filter, effect)?;
    sink.request_measurement(Measurement::Hausdorff);
    Ok(())
}

/// Poisson-disk sampling options
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoissonDisk {
    pub sample_count: u32,
    /// Explicit disk radius; overrides the count when non-zero
    pub radius: f64,
    pub montecarlo_rate: u32,
    /// Also keep the Montecarlo cloud the samples were pruned from
    pub save_montecarlo: bool,
    pub approximate_geodesic: bool,
    /// Use the base mesh vertices as the candidate set
    pub subsample: bool,
    pub refine: bool,
    pub refine_layer: usize,
    pub best_sample: bool,
    pub best_sample_pool: u32,
    pub exact_count: bool,
    pub radius_variance: f64,
}

impl Default for PoissonDisk {
    fn default() -> Self {
        Self {
            sample_count: 1000,
            radius: 0.0,
            montecarlo_rate: 20,
            save_montecarlo: false,
            approximate_geodesic: false,
            subsample: false,
            refine: false,
            refine_layer: 0,
            best_sample: true,
            best_sample_pool: 10,
            exact_count: false,
            radius_variance: 1.0,
        }
    }
}

/// Poisson-disk sample the current layer into a new point-cloud layer
///
/// Unlike most creating filters, the engine stays on the source layer.
pub fn poisson_disk(sink: &mut impl FilterSink, options: &PoissonDisk) -> Result<()> {
    let filter = FilterXml::new("Poisson-disk Sampling")
        .int("SampleNum", "Number of samples", i64::from(options.sample_count))
        .abs_perc("Radius", "Explicit Radius", options.radius, 0.0, 100.0)
        .int("MontecarloRate", "MonterCarlo OverSampling", i64::from(options.montecarlo_rate))
        .bool("SaveMontecarlo", "Save Montecarlo", options.save_montecarlo)
        .bool(
            "ApproximateGeodesicDistance",
            "Approximate Geodesic Distance",
            options.approximate_geodesic,
        )
        .bool("Subsample", "Base Mesh Subsampling", options.subsample)
        .bool("RefineFlag", "Refine Existing Samples", options.refine)
        .mesh("RefineMesh", "Samples to be refined", options.refine_layer)
        .bool("BestSampleFlag", "Best Sample Heuristic", options.best_sample)
        .int("BestSamplePool", "Best Sample Pool Size", i64::from(options.best_sample_pool))
        .bool("ExactNumFlag", "Exact number of samples", options.exact_count)
        .float("RadiusVariance", "Radius Variance", options.radius_variance);

    let effect = if options.save_montecarlo {
        LayerEffect::AppendLayers(vec![
            "Montecarlo Samples".to_string(),
            "Poisson-disk Samples".to_string(),
        ])
    } else {
        LayerEffect::AppendLayer("Poisson-disk Samples".to_string())
    };
    emit(sink, filter, effect)
}
