//! Engine command lines

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::{Deserialize, Serialize};

use crate::script::{extension_of, EngineVersion};

/// Attributes saved with an output mesh
///
/// Not every format supports every attribute; the engine ignores the ones
/// it cannot write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskOptions {
    /// Wedge texture coordinates (`wt`)
    pub texture: bool,
    /// Vertex normals (`vn`)
    pub vert_normals: bool,
    /// Vertex colors (`vc`)
    pub vert_colors: bool,
    /// Face colors (`fc`)
    pub face_colors: bool,
}

impl Default for MaskOptions {
    fn default() -> Self {
        Self {
            texture: true,
            vert_normals: true,
            vert_colors: false,
            face_colors: false,
        }
    }
}

/// Output mask for `path` chosen from its extension
///
/// STL, DXF and XYZ outputs get no mask at all. Everything else gets the
/// version's mask flag followed by the enabled attribute tokens.
pub fn default_output_mask(path: &Path, options: MaskOptions, version: EngineVersion) -> String {
    if matches!(extension_of(path).as_deref(), Some("stl" | "dxf" | "xyz")) {
        return String::new();
    }

    let mut mask = version.output_mask_flag().to_string();
    let tokens = [
        (options.vert_normals, "vn"),
        (options.texture, "wt"),
        (options.vert_colors, "vc"),
        (options.face_colors, "fc"),
    ];
    for (_, token) in tokens.iter().filter(|(enabled, _)| *enabled) {
        mask.push(' ');
        mask.push_str(token);
    }
    mask
}

/// Output mesh with its resolved mask
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSpec {
    pub path: PathBuf,
    pub mask: String,
}

/// A fully resolved engine command line
///
/// Arguments are passed to the process directly, never through a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInvocation {
    program: PathBuf,
    args: Vec<String>,
}

impl ProcessInvocation {
    pub fn builder(program: impl Into<PathBuf>) -> InvocationBuilder {
        InvocationBuilder::new(program)
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Values following every occurrence of `flag`
    pub fn values_of<'a>(&'a self, flag: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.args
            .windows(2)
            .filter(move |pair| pair[0] == flag)
            .map(|pair| pair[1].as_str())
    }

    /// Printable command line, quoting arguments that contain whitespace
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.display().to_string())
            .chain(self.args.iter().cloned())
            .map(|arg| {
                if arg.is_empty() || arg.contains(char::is_whitespace) {
                    format!("\"{}\"", arg)
                } else {
                    arg
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        command
    }
}

impl fmt::Display for ProcessInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.command_line())
    }
}

/// Collects the pieces of a command line in any order and emits them in
/// the order the engine expects
#[derive(Debug, Clone)]
pub struct InvocationBuilder {
    program: PathBuf,
    engine_log: Option<PathBuf>,
    projects: Vec<PathBuf>,
    project_out: Option<(PathBuf, bool)>,
    meshes: Vec<PathBuf>,
    outputs: Vec<OutputSpec>,
    script: Option<PathBuf>,
}

impl InvocationBuilder {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            engine_log: None,
            projects: Vec::new(),
            project_out: None,
            meshes: Vec::new(),
            outputs: Vec::new(),
            script: None,
        }
    }

    /// File the engine writes its own log to (`-l`)
    pub fn engine_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.engine_log = Some(path.into());
        self
    }

    pub fn project(mut self, path: impl Into<PathBuf>) -> Self {
        self.projects.push(path.into());
        self
    }

    /// Save all layers into a project (`-w`); `overwrite` adds `-v`
    pub fn project_out(mut self, path: impl Into<PathBuf>, overwrite: bool) -> Self {
        self.project_out = Some((path.into(), overwrite));
        self
    }

    pub fn mesh(mut self, path: impl Into<PathBuf>) -> Self {
        self.meshes.push(path.into());
        self
    }

    pub fn output(mut self, path: impl Into<PathBuf>, mask: impl Into<String>) -> Self {
        self.outputs.push(OutputSpec {
            path: path.into(),
            mask: mask.into(),
        });
        self
    }

    pub fn script(mut self, path: impl Into<PathBuf>) -> Self {
        self.script = Some(path.into());
        self
    }

    pub fn build(self) -> ProcessInvocation {
        let mut args = Vec::new();

        if let Some(log) = &self.engine_log {
            push_pair(&mut args, "-l", log);
        }
        for project in &self.projects {
            push_pair(&mut args, "-p", project);
        }
        if let Some((project, overwrite)) = &self.project_out {
            push_pair(&mut args, "-w", project);
            if *overwrite {
                args.push("-v".to_string());
            }
        }
        for mesh in &self.meshes {
            push_pair(&mut args, "-i", mesh);
        }
        for output in &self.outputs {
            push_pair(&mut args, "-o", &output.path);
            args.extend(output.mask.split_whitespace().map(str::to_string));
        }
        if let Some(script) = &self.script {
            push_pair(&mut args, "-s", script);
        }

        ProcessInvocation {
            program: self.program,
            args,
        }
    }
}

fn push_pair(args: &mut Vec<String>, flag: &str, value: &Path) {
    args.push(flag.to_string());
    args.push(value.display().to_string());
}
