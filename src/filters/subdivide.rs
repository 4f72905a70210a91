//! Subdivision filters

use super::{emit, FilterXml};
use crate::error::Result;
use crate::layers::LayerEffect;
use crate::script::FilterSink;

/// Weighting scheme for loop subdivision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopWeight {
    #[default]
    Loop,
    EnhanceRegularity,
    EnhanceContinuity,
}

impl LoopWeight {
    fn index(self) -> usize {
        match self {
            LoopWeight::Loop => 0,
            LoopWeight::EnhanceRegularity => 1,
            LoopWeight::EnhanceContinuity => 2,
        }
    }
}

fn with_common(
    filter: FilterXml,
    iterations: u32,
    edge_threshold: f64,
    selected: bool,
) -> FilterXml {
    filter
        .int("Iterations", "Iterations", i64::from(iterations))
        .abs_perc("Threshold", "Edge Threshold", edge_threshold, 0.0, 100.0)
        .tooltip(
            "All the edges longer than this threshold will be refined. \
             Setting this value to zero will force an uniform refinement.",
        )
        .bool("Selected", "Affect only selected faces", selected)
}

/// Split every edge longer than `edge_threshold` at its midpoint
pub fn midpoint(
    sink: &mut impl FilterSink,
    iterations: u32,
    edge_threshold: f64,
    selected: bool,
) -> Result<()> {
    let filter = with_common(
        FilterXml::new("Subdivision Surfaces: Midpoint"),
        iterations,
        edge_threshold,
        selected,
    );
    emit(sink, filter, LayerEffect::None)
}

pub fn loop_subdivide(
    sink: &mut impl FilterSink,
    iterations: u32,
    weight: LoopWeight,
    edge_threshold: f64,
    selected: bool,
) -> Result<()> {
    let filter = FilterXml::new("Subdivision Surfaces: Loop").enumeration(
        "LoopWeight",
        "Weighting scheme",
        weight.index(),
        &["Loop", "Enhance regularity", "Enhance continuity"],
    );
    let filter = with_common(filter, iterations, edge_threshold, selected);
    emit(sink, filter, LayerEffect::None)
}
