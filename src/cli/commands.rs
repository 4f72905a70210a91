//! CLI Command Implementations
//!
//! Each command builds a fixed script and runs it once.

use std::path::{Path, PathBuf};

use log::info;

use crate::config::EngineConfig;
use crate::engine::{ExecutionController, ExecutionOptions, ExecutionReport, Outcome};
use crate::error::Result;
use crate::filters::layers::{self, JoinOptions};
use crate::filters::transform::{self, Axis};
use crate::filters::vert_color::Color;
use crate::filters::{compute, create, format_float, subdivide};
use crate::script::{extension_of, EngineVersion, OutputFile, Script};

/// Shared settings for every command
#[derive(Debug, Clone)]
pub struct RunContext {
    pub config: EngineConfig,
    pub options: ExecutionOptions,
}

impl RunContext {
    pub fn new(config: EngineConfig, wrapper_log: Option<PathBuf>, quiet: bool) -> Self {
        let mut options = ExecutionOptions::default();
        options.wrapper_log = wrapper_log;
        if quiet {
            options = options.quiet();
        }
        Self { config, options }
    }

    fn run(&self, script: &mut Script) -> Result<ExecutionReport> {
        let mut controller = ExecutionController::interactive(self.config.clone());
        let report = script.run(&mut controller, &self.options)?;
        if report.outcome == Outcome::Continued {
            println!("meshlabserver failed; continuing as requested");
        }
        Ok(report)
    }
}

/// Heroic shield built from colored annuli and a five-point star, bent
/// onto a sphere
pub fn shield_script(version: EngineVersion) -> Result<Script> {
    let segments = 50;
    let star_points: u32 = 5;
    let radius = 2.0;
    let ring = 1.0;
    let sphere_radius: f64 = 2.0 * (radius + 3.0 * ring);

    // The star is a central pentagon with a triangle on each edge, drawn as
    // overlapping diamonds.
    let outer_angle = (180.0 / f64::from(star_points)).to_radians();
    let inner_angle = (90.0 / f64::from(star_points)).to_radians();
    let polygon_radius = radius / (1.0 + outer_angle.tan() / inner_angle.tan());
    let width = polygon_radius * outer_angle.tan();
    let height = width / inner_angle.tan();

    let mut script = Script::new(version);

    // Front: concentric rings, subdivided for a smoother bend.
    create::annulus(&mut script, radius, 0.0, segments, Color::named("blue"))?;
    create::annulus(&mut script, radius + ring, radius, segments, Color::named("red"))?;
    create::annulus(&mut script, radius + 2.0 * ring, radius + ring, segments, Color::named("white"))?;
    create::annulus(&mut script, radius + 3.0 * ring, radius + 2.0 * ring, segments, Color::named("red"))?;
    layers::join(&mut script, JoinOptions::default())?;
    subdivide::midpoint(&mut script, 2, 0.0, false)?;

    // Back, facing down and just below the front.
    create::annulus(&mut script, radius + 3.0 * ring, 0.0, segments, Color::named("silver"))?;
    transform::rotate(&mut script, Axis::Y, 180.0)?;
    transform::translate(&mut script, [0.0, 0.0, -0.005])?;
    subdivide::midpoint(&mut script, 4, 0.0, false)?;

    // One diamond of the star; corners at distance 1 from its center.
    create::grid(
        &mut script,
        &create::Grid {
            size: [2f64.sqrt(), 2f64.sqrt()],
            x_segments: 10,
            y_segments: 10,
            center: true,
            color: Color::named("white"),
        },
    )?;
    transform::rotate(&mut script, Axis::Z, 45.0)?;
    transform::scale(&mut script, [width, height, 1.0])?;
    transform::translate(&mut script, [0.0, polygon_radius, 0.001])?;

    for _ in 1..star_points {
        layers::duplicate(&mut script)?;
        transform::rotate(&mut script, Axis::Z, 360.0 / f64::from(star_points))?;
    }

    layers::join(&mut script, JoinOptions::default())?;
    let z_func = format!(
        "sqrt({}-x^2-y^2)-{}+z",
        format_float(sphere_radius.powi(2)),
        format_float(sphere_radius)
    );
    transform::vert_function(&mut script, "x", "y", &z_func, false)?;

    Ok(script)
}

/// Generate the shield and save it to `output`
pub fn shield(ctx: &RunContext, output: &Path) -> Result<()> {
    info!("Generating shield: {}", output.display());

    let mut script = shield_script(ctx.config.engine_version)?;
    script.add_output(OutputFile::new(output))?;
    let report = ctx.run(&mut script)?;

    println!(
        "Shield written to {} ({} attempt(s))",
        output.display(),
        report.attempts
    );
    Ok(())
}

/// Print the shield script, or save it for use in the MeshLab GUI
pub fn emit_shield(ctx: &RunContext, output: Option<&Path>) -> Result<()> {
    let script = shield_script(ctx.config.engine_version)?;
    match output {
        Some(path) => {
            script.save(path)?;
            println!("Script saved: {}", path.display());
        }
        None => print!("{}", script.to_script_text()?),
    }
    Ok(())
}

/// Measure a mesh or project and print the results as JSON
pub fn measure(ctx: &RunContext, input: &Path) -> Result<()> {
    info!("Measuring: {}", input.display());

    let builder = Script::builder().engine_version(ctx.config.engine_version);
    let builder = if extension_of(input).as_deref() == Some("mlp") {
        builder.project(input)
    } else {
        builder.mesh(input)
    };
    let mut script = builder.build()?;
    compute::measure_geometry(&mut script)?;
    compute::measure_topology(&mut script)?;

    ctx.run(&mut script)?;
    println!("{}", serde_json::to_string_pretty(script.results())?);
    Ok(())
}

/// Convert `input` to `output` with no filters applied
pub fn convert(ctx: &RunContext, input: &Path, output: &Path, mask: Option<&str>) -> Result<()> {
    info!("Converting {} -> {}", input.display(), output.display());

    let builder = Script::builder()
        .engine_version(ctx.config.engine_version)
        .mesh(input)
        .merge_stl_vertices(false);
    let builder = match mask {
        Some(mask) => builder.output_with_mask(output, mask),
        None => builder.output(output),
    };
    let mut script = builder.build()?;

    ctx.run(&mut script)?;
    println!("Converted: {}", output.display());
    Ok(())
}
