//! CLI Module
//!
//! Command-line interface for running generated scripts through meshlabserver.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Build MeshLab filter scripts and run them with meshlabserver
#[derive(Parser, Debug)]
#[command(name = "meshscript")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Engine config file (default: ./meshscript.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// meshlabserver executable
    #[arg(long, global = true)]
    pub engine: Option<PathBuf>,

    /// MeshLab version to generate scripts for (1.3.3, 1.3.4BETA, 2016.12)
    #[arg(long, global = true)]
    pub engine_version: Option<String>,

    /// Append the command line and meshlabserver output to this file
    #[arg(long, global = true)]
    pub log: Option<PathBuf>,

    /// Do not pass meshlabserver output through to the terminal
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate the parametric shield model
    #[command(name = "shield")]
    Shield {
        /// Output mesh file
        output: PathBuf,
    },

    /// Measure geometry and topology of a mesh and print them as JSON
    #[command(name = "measure")]
    Measure {
        /// Mesh or project (.mlp) to measure
        input: PathBuf,
    },

    /// Convert a mesh to another format without applying any filter
    #[command(name = "convert")]
    Convert {
        /// Input mesh
        input: PathBuf,

        /// Output mesh; the format follows the extension
        output: PathBuf,

        /// Output mask including its flag, e.g. "-m vc vn"
        #[arg(short, long, allow_hyphen_values = true)]
        mask: Option<String>,
    },

    /// Print the shield filter script without running it
    #[command(name = "emit-shield")]
    EmitShield {
        /// Write the script to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}
