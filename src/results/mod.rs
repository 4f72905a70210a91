//! Measurement results
//!
//! Measuring filters only write free text to the engine log. A script
//! records which measurements it asked for; after a run the ingestor reads
//! the log back and attaches typed results to the script.

mod parse;

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use log::info;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub use parse::{parse_geometry, parse_hausdorff, parse_topology};

use crate::error::{MeshScriptError, Result};
use crate::script::EngineVersion;

/// A measurement whose result is read back from the engine log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Measurement {
    Geometry,
    Topology,
    Hausdorff,
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Measurement::Geometry => "geometry",
            Measurement::Topology => "topology",
            Measurement::Hausdorff => "hausdorff",
        };
        write!(f, "{}", name)
    }
}

/// Measurements requested by the filters of a script
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasurementRequest {
    pub geometry: bool,
    pub topology: bool,
    pub hausdorff: bool,
}

impl MeasurementRequest {
    pub fn request(&mut self, measurement: Measurement) {
        match measurement {
            Measurement::Geometry => self.geometry = true,
            Measurement::Topology => self.topology = true,
            Measurement::Hausdorff => self.hausdorff = true,
        }
    }

    pub fn any(&self) -> bool {
        self.geometry || self.topology || self.hausdorff
    }
}

/// A count the engine reports as "undefined" on non-manifold meshes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountOrUndefined {
    Count(u64),
    Undefined,
}

impl Serialize for CountOrUndefined {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            CountOrUndefined::Count(n) => serializer.serialize_u64(*n),
            CountOrUndefined::Undefined => serializer.serialize_str("undefined"),
        }
    }
}

impl<'de> Deserialize<'de> for CountOrUndefined {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Count(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Count(n) => Ok(CountOrUndefined::Count(n)),
            Raw::Text(text) if text == "undefined" => Ok(CountOrUndefined::Undefined),
            Raw::Text(text) => Err(serde::de::Error::custom(format!(
                "expected a count or \"undefined\", got \"{}\"",
                text
            ))),
        }
    }
}

impl fmt::Display for CountOrUndefined {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CountOrUndefined::Count(n) => write!(f, "{}", n),
            CountOrUndefined::Undefined => write!(f, "undefined"),
        }
    }
}

/// Output of `Compute Geometric Measures`
///
/// Fields are `None` when the engine did not print them (older versions
/// skip the bounding box lines, open meshes have no volume).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeometryMeasures {
    pub aabb_min: Option<[f64; 3]>,
    pub aabb_max: Option<[f64; 3]>,
    pub aabb_size: Option<[f64; 3]>,
    pub aabb_diag: Option<f64>,
    pub volume_mm3: Option<f64>,
    pub volume_cm3: Option<f64>,
    pub area_mm2: Option<f64>,
    pub area_cm2: Option<f64>,
    pub total_edge_length: Option<f64>,
    pub total_edge_length_incl_faux: Option<f64>,
    pub barycenter: Option<[f64; 3]>,
    pub vert_barycenter: Option<[f64; 3]>,
    pub center_of_mass: Option<[f64; 3]>,
    pub inertia_tensor: Option<[[f64; 3]; 3]>,
    pub principal_axes: Option<[[f64; 3]; 3]>,
    pub axis_momenta: Option<[f64; 3]>,
}

/// Output of `Compute Topological Measures`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyMeasures {
    pub vert_num: Option<u64>,
    pub edge_num: Option<u64>,
    pub face_num: Option<u64>,
    pub unref_vert_num: Option<u64>,
    pub boundary_edge_num: Option<u64>,
    pub part_num: Option<u64>,
    pub manifold: bool,
    pub non_manifold_edge: u64,
    pub non_manifold_vert: u64,
    pub genus: Option<CountOrUndefined>,
    pub hole_num: Option<CountOrUndefined>,
}

impl Default for TopologyMeasures {
    fn default() -> Self {
        Self {
            vert_num: None,
            edge_num: None,
            face_num: None,
            unref_vert_num: None,
            boundary_edge_num: None,
            part_num: None,
            manifold: true,
            non_manifold_edge: 0,
            non_manifold_vert: 0,
            genus: None,
            hole_num: None,
        }
    }
}

/// Output of `Hausdorff Distance`
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HausdorffDistance {
    pub number_points: u64,
    pub min_distance: f64,
    pub max_distance: f64,
    pub mean_distance: f64,
    pub rms_distance: f64,
}

/// Results attached to a script after a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeasurementResults {
    pub geometry: Option<GeometryMeasures>,
    pub topology: Option<TopologyMeasures>,
    pub hausdorff: Option<HausdorffDistance>,
}

impl MeasurementResults {
    pub fn is_empty(&self) -> bool {
        self.geometry.is_none() && self.topology.is_none() && self.hausdorff.is_none()
    }
}

/// Reads an engine log back into typed measurements
#[derive(Debug, Clone, Copy)]
pub struct ResultIngestor {
    version: EngineVersion,
}

impl ResultIngestor {
    pub fn new(version: EngineVersion) -> Self {
        Self { version }
    }

    /// Parse the requested measurements from the log at `path`
    pub fn ingest(&self, path: &Path, request: &MeasurementRequest) -> Result<MeasurementResults> {
        let text = fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => MeshScriptError::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => MeshScriptError::Io(e),
        })?;
        self.ingest_text(&text, request)
    }

    pub fn ingest_text(&self, text: &str, request: &MeasurementRequest) -> Result<MeasurementResults> {
        let mut results = MeasurementResults::default();

        if request.geometry {
            let geometry = parse_geometry(text, self.version);
            log_fields(Measurement::Geometry, &geometry)?;
            results.geometry = Some(geometry);
        }
        if request.topology {
            let topology = parse_topology(text)?;
            log_fields(Measurement::Topology, &topology)?;
            results.topology = Some(topology);
        }
        if request.hausdorff {
            let hausdorff = parse_hausdorff(text)?;
            log_fields(Measurement::Hausdorff, &hausdorff)?;
            results.hausdorff = Some(hausdorff);
        }
        Ok(results)
    }
}

/// One `key = value` line per measured field
fn log_fields<T: Serialize>(measurement: Measurement, value: &T) -> Result<()> {
    if let serde_json::Value::Object(fields) = serde_json::to_value(value)? {
        for (key, value) in fields.iter().filter(|(_, v)| !v.is_null()) {
            info!("{} {:27} = {}", measurement, key, value);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_request_tracking() {
        let mut request = MeasurementRequest::default();
        assert!(!request.any());
        request.request(Measurement::Hausdorff);
        assert!(request.any());
        assert!(request.hausdorff);
        assert!(!request.geometry);
    }

    #[test]
    fn test_count_or_undefined_serializes_like_the_log() {
        let t = TopologyMeasures {
            genus: Some(CountOrUndefined::Undefined),
            hole_num: Some(CountOrUndefined::Count(2)),
            ..TopologyMeasures::default()
        };
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["genus"], "undefined");
        assert_eq!(json["hole_num"], 2);
        assert_eq!(json["manifold"], true);

        let back: TopologyMeasures = serde_json::from_value(json).unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn test_ingest_only_requested() {
        let mut log = NamedTempFile::new().unwrap();
        writeln!(log, "V: 8 E: 18 F: 12").unwrap();
        writeln!(log, "Mesh Volume is 1.000000").unwrap();

        let request = MeasurementRequest {
            topology: true,
            ..MeasurementRequest::default()
        };
        let results = ResultIngestor::new(EngineVersion::default())
            .ingest(log.path(), &request)
            .unwrap();

        assert!(results.geometry.is_none());
        assert_eq!(results.topology.unwrap().face_num, Some(12));
    }

    #[test]
    fn test_ingest_missing_log() {
        let err = ResultIngestor::new(EngineVersion::default())
            .ingest(Path::new("/nonexistent/engine.log"), &MeasurementRequest::default())
            .unwrap_err();
        assert!(matches!(err, MeshScriptError::FileNotFound { .. }));
    }
}
