//! Engine log scanners
//!
//! The measuring filters print their results as free text in the engine
//! log. Each scanner looks for the known line prefixes and picks values by
//! whitespace-token position. Numbers that do not parse as floats become
//! NaN; integer counts that do not parse are an error.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{CountOrUndefined, GeometryMeasures, HausdorffDistance, TopologyMeasures};
use crate::error::{MeshScriptError, Result};
use crate::script::EngineVersion;

static SAMPLED_POINTS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*Sampled (\d+) pts").expect("sample count pattern must compile"));

static DISTANCE_ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\D+(\d+\.*\d*)\D+(\d+\.*\d*)\D+(\d+\.*\d*)\D+(\d+\.*\d*)")
        .expect("distance row pattern must compile")
});

fn to_float(token: Option<&&str>) -> f64 {
    token.and_then(|t| t.parse::<f64>().ok()).unwrap_or(f64::NAN)
}

fn token_float(line: &str, index: usize) -> f64 {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    to_float(tokens.get(index))
}

fn token_triple(line: &str, start: usize) -> [f64; 3] {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    [
        to_float(tokens.get(start)),
        to_float(tokens.get(start + 1)),
        to_float(tokens.get(start + 2)),
    ]
}

fn matrix_rows<'a>(lines: &mut impl Iterator<Item = &'a str>) -> [[f64; 3]; 3] {
    let mut rows = [[f64::NAN; 3]; 3];
    for row in rows.iter_mut() {
        if let Some(line) = lines.next() {
            *row = token_triple(line, 1);
        }
    }
    rows
}

fn token_count(line: &str, index: usize, what: &'static str) -> Result<u64> {
    let token = line
        .split_whitespace()
        .nth(index)
        .ok_or_else(|| MeshScriptError::ResultParse {
            what,
            reason: format!("missing value in line '{}'", line.trim()),
        })?;
    token.parse().map_err(|_| MeshScriptError::ResultParse {
        what,
        reason: format!("'{}' is not a count", token),
    })
}

/// Scan the output of `Compute Geometric Measures`
///
/// Scanning stops at the principal axis momenta, the last value the
/// filter prints, so a log holding several runs yields the first.
pub fn parse_geometry(log: &str, version: EngineVersion) -> GeometryMeasures {
    let mut geometry = GeometryMeasures::default();
    let mut lines = log.lines();

    while let Some(line) = lines.next() {
        if line.contains("Mesh Bounding Box min") {
            geometry.aabb_min = Some(token_triple(line, 4));
        }
        if line.contains("Mesh Bounding Box max") {
            geometry.aabb_max = Some(token_triple(line, 4));
        }
        if line.contains("Mesh Bounding Box Size") {
            geometry.aabb_size = Some(token_triple(line, 4));
        }
        if line.contains("Mesh Bounding Box Diag") {
            geometry.aabb_diag = Some(token_float(line, 4));
        }
        if line.contains("Mesh Volume") {
            let volume = token_float(line, 3);
            geometry.volume_mm3 = Some(volume);
            geometry.volume_cm3 = Some(volume * 0.001);
        }
        if line.contains("Mesh Surface") {
            let area = token_float(line, version.surface_area_token());
            geometry.area_mm2 = Some(area);
            geometry.area_cm2 = Some(area * 0.01);
        }
        if line.contains("Mesh Total Len of") {
            let length = token_float(line, 7);
            if line.contains("including faux edges") {
                geometry.total_edge_length_incl_faux = Some(length);
            } else {
                geometry.total_edge_length = Some(length);
            }
        }
        if line.contains("Thin shell barycenter") {
            geometry.barycenter = Some(token_triple(line, 3));
        }
        if line.contains("Thin shell (faces) barycenter") {
            geometry.barycenter = Some(token_triple(line, 4));
        }
        if line.contains("Vertices barycenter") {
            geometry.vert_barycenter = Some(token_triple(line, 2));
        }
        if line.contains("Center of Mass") {
            geometry.center_of_mass = Some(token_triple(line, 4));
        }
        if line.contains("Inertia Tensor") {
            geometry.inertia_tensor = Some(matrix_rows(&mut lines));
        }
        if line.contains("Principal axes") {
            geometry.principal_axes = Some(matrix_rows(&mut lines));
        }
        if line.contains("axis momenta") {
            geometry.axis_momenta = Some(match lines.next() {
                Some(next) => token_triple(next, 1),
                None => [f64::NAN; 3],
            });
            break;
        }
    }
    geometry
}

/// Scan the output of `Compute Topological Measures`
pub fn parse_topology(log: &str) -> Result<TopologyMeasures> {
    let mut topology = TopologyMeasures::default();

    for line in log.lines() {
        if line.contains("V:") {
            let counts = line.replace("V:", " ").replace("E:", " ").replace("F:", " ");
            topology.vert_num = Some(token_count(&counts, 0, "vertex count")?);
            topology.edge_num = Some(token_count(&counts, 1, "edge count")?);
            topology.face_num = Some(token_count(&counts, 2, "face count")?);
        }
        if line.contains("Unreferenced Vertices") {
            topology.unref_vert_num = Some(token_count(line, 2, "unreferenced vertices")?);
        }
        if line.contains("Boundary Edges") {
            topology.boundary_edge_num = Some(token_count(line, 2, "boundary edges")?);
        }
        if line.contains("Mesh is composed by") {
            topology.part_num = Some(token_count(line, 4, "part count")?);
        }
        if line.contains("non 2-manifold mesh") {
            topology.manifold = false;
        }
        if line.contains("non two manifold edges") {
            topology.non_manifold_edge = token_count(line, 2, "non-manifold edges")?;
        }
        if line.contains("non two manifold vertexes") {
            topology.non_manifold_vert = token_count(line, 2, "non-manifold vertices")?;
        }
        if line.contains("Genus is") {
            topology.genus = Some(count_or_undefined(line, "undefined", "genus")?);
        }
        if line.contains("holes") {
            // The non-manifold wording is "...has a undefined number of holes".
            topology.hole_num = Some(count_or_undefined(line, "a", "hole count")?);
        }
    }
    Ok(topology)
}

fn count_or_undefined(line: &str, undefined: &str, what: &'static str) -> Result<CountOrUndefined> {
    match line.split_whitespace().nth(2) {
        Some(token) if token == undefined => Ok(CountOrUndefined::Undefined),
        _ => token_count(line, 2, what).map(CountOrUndefined::Count),
    }
}

/// Scan the output of `Hausdorff Distance`
///
/// The distance row follows the "Hausdorff Distance computed" line by two
/// lines; with several runs in one log the last one wins.
pub fn parse_hausdorff(log: &str) -> Result<HausdorffDistance> {
    let lines: Vec<&str> = log.lines().collect();
    let mut number_points = 0;
    let mut data = "";

    for (idx, line) in lines.iter().enumerate() {
        if let Some(caps) = SAMPLED_POINTS.captures(line) {
            number_points = caps[1].parse().map_err(|_| MeshScriptError::ResultParse {
                what: "hausdorff sample count",
                reason: format!("'{}' is not a count", &caps[1]),
            })?;
        }
        if line.contains("Hausdorff Distance computed") {
            data = lines.get(idx + 2).copied().unwrap_or("");
        }
    }

    let caps = DISTANCE_ROW
        .captures(data)
        .ok_or_else(|| MeshScriptError::ResultParse {
            what: "hausdorff distance",
            reason: "no distance row after 'Hausdorff Distance computed'".to_string(),
        })?;
    let value = |i: usize| to_float(Some(&&caps[i]));

    Ok(HausdorffDistance {
        number_points,
        min_distance: value(1),
        max_distance: value(2),
        mean_distance: value(3),
        rms_distance: value(4),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const GEOMETRY_LOG: &str = "\
Opened mesh bunny.ply in 120 msec
Mesh Bounding Box min -1.000000 -2.000000 -3.000000
Mesh Bounding Box max 1.000000 2.000000 3.000000
Mesh Bounding Box Size 2.000000 4.000000 6.000000
Mesh Bounding Box Diag 7.483315
Mesh Volume is 48.000000
Mesh Surface Area is 88.000000
Mesh Total Len of 36 Edges is 144.000000 Avg Len 4.000000
Mesh Total Len of 54 Edges is 200.000000 Avg Len 3.703704 (including faux edges))
Thin shell (faces) barycenter:  0.000000 0.500000 -0.250000
Vertices barycenter 0.000000 0.000000 0.000000
Center of Mass  is 0.100000 0.200000 0.300000
Inertia Tensor is :
    | 208.000000 0.000000 0.000000 |
    | 0.000000 160.000000 0.000000 |
    | 0.000000 0.000000 80.000000 |
Principal axes are :
    | 1.000000 0.000000 0.000000 |
    | 0.000000 1.000000 0.000000 |
    | 0.000000 0.000000 1.000000 |
axis momenta are :
    | 208.000000 160.000000 80.000000 |
Mesh Volume is 1.000000
";

    #[test]
    fn test_parse_geometry_2016() {
        let g = parse_geometry(GEOMETRY_LOG, EngineVersion::V2016_12);

        let min = g.aabb_min.unwrap();
        assert_relative_eq!(min[2], -3.0);
        assert_relative_eq!(g.aabb_size.unwrap()[1], 4.0);
        assert_relative_eq!(g.aabb_diag.unwrap(), 7.483315);
        assert_relative_eq!(g.volume_mm3.unwrap(), 48.0);
        assert_relative_eq!(g.volume_cm3.unwrap(), 0.048);
        assert_relative_eq!(g.area_mm2.unwrap(), 88.0);
        assert_relative_eq!(g.area_cm2.unwrap(), 0.88);
        assert_relative_eq!(g.total_edge_length.unwrap(), 144.0);
        assert_relative_eq!(g.total_edge_length_incl_faux.unwrap(), 200.0);
        assert_relative_eq!(g.barycenter.unwrap()[1], 0.5);
        assert_relative_eq!(g.center_of_mass.unwrap()[2], 0.3);
        assert_relative_eq!(g.inertia_tensor.unwrap()[1][1], 160.0);
        assert_relative_eq!(g.principal_axes.unwrap()[2][2], 1.0);
        assert_relative_eq!(g.axis_momenta.unwrap()[0], 208.0);
    }

    #[test]
    fn test_parse_geometry_stops_after_momenta() {
        let g = parse_geometry(GEOMETRY_LOG, EngineVersion::V2016_12);
        // The trailing volume line belongs to a later run.
        assert_relative_eq!(g.volume_mm3.unwrap(), 48.0);
    }

    #[test]
    fn test_surface_column_depends_on_version() {
        let log = "Mesh Surface is 12.5\n";
        let g = parse_geometry(log, EngineVersion::V1_3_4Beta);
        assert_relative_eq!(g.area_mm2.unwrap(), 12.5);

        let g = parse_geometry(log, EngineVersion::V2016_12);
        assert!(g.area_mm2.unwrap().is_nan());
    }

    #[test]
    fn test_parse_topology_manifold() {
        let log = "\
V:   482 E:  1440 F:   960
Unreferenced Vertices 0
Boundary Edges 0
Mesh is composed by 1 connected component(s)
Mesh is two-manifold
Mesh has 0 holes
Genus is 0
";
        let t = parse_topology(log).unwrap();
        assert_eq!(t.vert_num, Some(482));
        assert_eq!(t.edge_num, Some(1440));
        assert_eq!(t.face_num, Some(960));
        assert_eq!(t.unref_vert_num, Some(0));
        assert_eq!(t.part_num, Some(1));
        assert!(t.manifold);
        assert_eq!(t.hole_num, Some(CountOrUndefined::Count(0)));
        assert_eq!(t.genus, Some(CountOrUndefined::Count(0)));
    }

    #[test]
    fn test_parse_topology_non_manifold() {
        let log = "\
V: 10 E: 20 F: 8
Mesh has 3 non two manifold edges and 2 faces are incident on these edges
Mesh has 1 non two manifold vertexes and 4 faces are incident on these vertices
Mesh has a undefined number of holes (non 2-manifold mesh)
Genus is undefined (non 2-manifold mesh)
";
        let t = parse_topology(log).unwrap();
        assert!(!t.manifold);
        assert_eq!(t.non_manifold_edge, 3);
        assert_eq!(t.non_manifold_vert, 1);
        assert_eq!(t.hole_num, Some(CountOrUndefined::Undefined));
        assert_eq!(t.genus, Some(CountOrUndefined::Undefined));
    }

    #[test]
    fn test_parse_topology_rejects_bad_count() {
        let err = parse_topology("Boundary Edges many\n").unwrap_err();
        assert!(matches!(err, MeshScriptError::ResultParse { .. }));
    }

    #[test]
    fn test_parse_hausdorff() {
        let log = "\
Applied filter Hausdorff Distance
     Sampled 1000 pts (rng: 0) on bunny searched closest on scan
     Hausdorff Distance computed
     Mesh bbox Diag 7.483315
     min : 0.000000   max 0.123456   mean : 0.010000   RMS : 0.020000
";
        let h = parse_hausdorff(log).unwrap();
        assert_eq!(h.number_points, 1000);
        assert_relative_eq!(h.min_distance, 0.0);
        assert_relative_eq!(h.max_distance, 0.123456);
        assert_relative_eq!(h.mean_distance, 0.01);
        assert_relative_eq!(h.rms_distance, 0.02);
    }

    #[test]
    fn test_parse_hausdorff_missing_row() {
        assert!(matches!(
            parse_hausdorff("nothing here\n"),
            Err(MeshScriptError::ResultParse { .. })
        ));
    }
}
