// SPDX-License-Identifier: MIT OR Apache-2.0
//! Command-line arguments.

use clap::{Parser, Subcommand};
use splatpath_sequencer::{PresetKind, Vec3};
use std::path::PathBuf;

/// Camera path tooling for splat scenes
#[derive(Parser, Debug)]
#[command(name = "splatpath", author, version, about, long_about = None)]
pub struct Cli {
    /// Export config file (RON)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Summarize a path file
    Inspect {
        /// Path file (JSON)
        path: PathBuf,

        /// Frame rate used for the frame count, defaults to the config's
        #[arg(long)]
        fps: Option<u32>,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the pose sampled at a keyframe time as JSON
    Sample {
        /// Path file (JSON)
        path: PathBuf,

        /// Keyframe time in seconds
        #[arg(short, long, allow_hyphen_values = true)]
        time: f32,

        /// Position smoothing in [0, 1], defaults to the config's
        #[arg(short, long)]
        smoothing: Option<f32>,
    },

    /// Generate a preset camera move
    Preset {
        /// turntable, dolly-in, crane-up or figure-8
        kind: PresetKind,

        /// Output path file
        #[arg(short, long)]
        out: PathBuf,

        /// Total duration in seconds
        #[arg(short, long, default_value_t = 8.0)]
        duration: f32,

        /// Point to frame, as x,y,z
        #[arg(long, value_parser = parse_vec3, default_value = "0,0,0")]
        target: Vec3,

        /// Horizontal distance from the target
        #[arg(long, default_value_t = 5.0)]
        radius: f32,

        /// Camera height above the target
        #[arg(long, default_value_t = 1.5)]
        height: f32,

        /// Vertical field of view in degrees
        #[arg(long, default_value_t = splatpath_sequencer::keyframe::DEFAULT_FOV)]
        fov: f32,
    },

    /// Query a remote export session
    Status {
        /// Session ID returned when the export started
        session: String,
    },

    /// Write the effective export config as RON
    Config {
        /// Destination, defaults to stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

/// Parse `x,y,z`
pub fn parse_vec3(raw: &str) -> Result<Vec3, String> {
    let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(format!("expected x,y,z but got '{raw}'"));
    }

    let mut out = [0.0; 3];
    for (slot, part) in out.iter_mut().zip(&parts) {
        *slot = part
            .parse::<f32>()
            .map_err(|e| format!("invalid component '{part}': {e}"))?;
    }
    Ok(out)
}
