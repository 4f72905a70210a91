//! MeshLab project files (`.mlp`)
//!
//! A project lists meshes (with a label and a 4x4 placement matrix) and
//! rasters (images with a calibrated camera). Reading only needs the mesh
//! entries, in document order, to seed a script's layer stack.

use std::fmt::Write as _;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{MeshScriptError, Result};
use crate::filters::escape_attribute;

static PROJECT_ROOT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<MeshLabProject\b").expect("project root pattern must compile"));

static MESH_ELEMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<MLMesh\b([^>]*?)(?:/>|>(.*?)</MLMesh>)")
        .expect("mesh element pattern must compile")
});

static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([A-Za-z_][\w.-]*)\s*=\s*"([^"]*)""#).expect("attribute pattern must compile")
});

static MATRIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<MLMatrix44>(.*?)</MLMatrix44>").expect("matrix pattern must compile")
});

pub type Matrix44 = [[f64; 4]; 4];

pub const IDENTITY: Matrix44 = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

/// Mesh entry of a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectMesh {
    pub filename: String,
    pub label: String,
    pub matrix: Matrix44,
}

impl ProjectMesh {
    /// Entry labelled with its filename, at the identity placement
    pub fn new(filename: impl Into<String>) -> Self {
        let filename = filename.into();
        Self {
            label: filename.clone(),
            filename,
            matrix: IDENTITY,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_matrix(mut self, matrix: Matrix44) -> Self {
        self.matrix = matrix;
        self
    }

    /// Lowercased extension of the mesh filename
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.trim().to_lowercase())
    }
}

/// Calibrated camera of a raster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterCamera {
    pub translation: [f64; 4],
    pub rotation: Matrix44,
    pub focal_mm: f64,
    pub viewport_px: [u32; 2],
    pub pixel_size_mm: [f64; 2],
    #[serde(default)]
    pub lens_distortion: [f64; 2],
    /// Defaults to the image center
    #[serde(default)]
    pub center_px: Option<[u32; 2]>,
}

impl RasterCamera {
    pub fn center(&self) -> [u32; 2] {
        self.center_px
            .unwrap_or([self.viewport_px[0] / 2, self.viewport_px[1] / 2])
    }
}

/// Raster (image) entry of a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRaster {
    pub filename: String,
    pub label: Option<String>,
    pub semantic: u32,
    pub camera: RasterCamera,
}

impl ProjectRaster {
    pub fn new(filename: impl Into<String>, camera: RasterCamera) -> Self {
        Self {
            filename: filename.into(),
            label: None,
            semantic: 1,
            camera,
        }
    }
}

fn invalid(path: &Path, reason: impl Into<String>) -> MeshScriptError {
    MeshScriptError::InvalidProjectFile {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

/// Read the mesh entries of a project, in document order
pub fn read_project(path: &Path) -> Result<Vec<ProjectMesh>> {
    let text = fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => invalid(path, "file not found"),
        _ => invalid(path, e.to_string()),
    })?;

    let meshes = parse_project(&text).map_err(|reason| invalid(path, reason))?;
    debug!(
        "Project {} references {} meshes",
        path.display(),
        meshes.len()
    );
    Ok(meshes)
}

fn parse_project(text: &str) -> std::result::Result<Vec<ProjectMesh>, String> {
    if !PROJECT_ROOT.is_match(text) {
        return Err("missing MeshLabProject element".to_string());
    }

    let mut meshes = Vec::new();
    for (position, element) in MESH_ELEMENT.captures_iter(text).enumerate() {
        let mut filename = None;
        let mut label = None;
        for attr in ATTRIBUTE.captures_iter(&element[1]) {
            match &attr[1] {
                "filename" => filename = Some(unescape_attribute(&attr[2])),
                "label" => label = Some(unescape_attribute(&attr[2])),
                _ => {}
            }
        }

        let filename =
            filename.ok_or_else(|| format!("MLMesh #{} has no filename attribute", position))?;
        let label = label.ok_or_else(|| format!("MLMesh #{} has no label attribute", position))?;

        let matrix = match element.get(2).and_then(|body| MATRIX.captures(body.as_str())) {
            Some(m) => parse_matrix(&m[1])
                .ok_or_else(|| format!("MLMesh '{}' has a malformed MLMatrix44", label))?,
            None => IDENTITY,
        };

        meshes.push(ProjectMesh {
            filename,
            label,
            matrix,
        });
    }
    Ok(meshes)
}

fn parse_matrix(body: &str) -> Option<Matrix44> {
    let values: Vec<f64> = body
        .split_whitespace()
        .map(|v| v.parse::<f64>())
        .collect::<std::result::Result<_, _>>()
        .ok()?;
    if values.len() != 16 {
        return None;
    }
    let mut matrix = [[0.0; 4]; 4];
    for (i, value) in values.into_iter().enumerate() {
        matrix[i / 4][i % 4] = value;
    }
    Some(matrix)
}

fn unescape_attribute(value: &str) -> String {
    value
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

fn matrix_row(row: &[f64; 4]) -> String {
    format!("{} {} {} {} ", row[0], row[1], row[2], row[3])
}

/// Render a project document
pub fn render_project(meshes: &[ProjectMesh], rasters: &[ProjectRaster]) -> String {
    let mut out = String::from("<!DOCTYPE MeshLabDocument>\n<MeshLabProject>\n");

    if meshes.is_empty() {
        out.push_str(" <MeshGroup/>\n");
    } else {
        out.push_str(" <MeshGroup>\n");
        for mesh in meshes {
            let _ = writeln!(
                out,
                "  <MLMesh filename=\"{}\" label=\"{}\">",
                escape_attribute(&mesh.filename),
                escape_attribute(&mesh.label)
            );
            out.push_str("   <MLMatrix44>\n");
            for row in &mesh.matrix {
                out.push_str(&matrix_row(row));
                out.push('\n');
            }
            out.push_str("</MLMatrix44>\n  </MLMesh>\n");
        }
        out.push_str(" </MeshGroup>\n");
    }

    if rasters.is_empty() {
        out.push_str(" <RasterGroup/>\n");
    } else {
        out.push_str(" <RasterGroup>\n");
        for raster in rasters {
            let label = raster.label.as_deref().unwrap_or(&raster.filename);
            let camera = &raster.camera;
            let rotation: String = camera.rotation.iter().map(matrix_row).collect();
            let center = camera.center();
            let t = camera.translation;

            let _ = writeln!(out, "  <MLRaster label=\"{}\">", escape_attribute(label));
            let _ = writeln!(
                out,
                "   <VCGCamera TranslationVector=\"{} {} {} {}\" RotationMatrix=\"{}\" \
                 FocalMm=\"{}\" ViewportPx=\"{} {}\" PixelSizeMm=\"{} {}\" \
                 LensDistortion=\"{} {}\" CenterPx=\"{} {}\" />",
                t[0],
                t[1],
                t[2],
                t[3],
                rotation,
                camera.focal_mm,
                camera.viewport_px[0],
                camera.viewport_px[1],
                camera.pixel_size_mm[0],
                camera.pixel_size_mm[1],
                camera.lens_distortion[0],
                camera.lens_distortion[1],
                center[0],
                center[1]
            );
            let _ = writeln!(
                out,
                "   <Plane semantic=\"{}\" fileName=\"{}\"/>",
                raster.semantic,
                escape_attribute(&raster.filename)
            );
            out.push_str(" </MLRaster>\n");
        }
        out.push_str(" </RasterGroup>\n");
    }

    out.push_str("</MeshLabProject>\n");
    out
}

/// Write a project document to `path`
pub fn write_project(path: &Path, meshes: &[ProjectMesh], rasters: &[ProjectRaster]) -> Result<()> {
    fs::write(path, render_project(meshes, rasters))?;
    debug!(
        "Wrote project {} ({} meshes, {} rasters)",
        path.display(),
        meshes.len(),
        rasters.len()
    );
    Ok(())
}
