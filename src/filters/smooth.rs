//! Smoothing filters

use super::{emit, FilterXml};
use crate::error::Result;
use crate::layers::LayerEffect;
use crate::script::FilterSink;

/// Laplacian smoothing options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Laplacian {
    pub iterations: u32,
    /// Smooth boundary edges only along the boundary polyline
    pub boundary: bool,
    /// Cotangent weights instead of the umbrella scheme
    pub cotangent_weight: bool,
    pub selected: bool,
}

impl Default for Laplacian {
    fn default() -> Self {
        Self {
            iterations: 1,
            boundary: true,
            cotangent_weight: true,
            selected: false,
        }
    }
}

pub fn laplacian(sink: &mut impl FilterSink, options: Laplacian) -> Result<()> {
    let filter = FilterXml::new("Laplacian Smooth")
        .int("stepSmoothNum", "Smoothing steps", i64::from(options.iterations))
        .bool("Boundary", "1D Boundary Smoothing", options.boundary)
        .bool("cotangentWeight", "Cotangent weighting", options.cotangent_weight)
        .bool("Selected", "Affect only selected faces", options.selected);
    emit(sink, filter, LayerEffect::None)
}
