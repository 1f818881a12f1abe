// SPDX-License-Identifier: MIT OR Apache-2.0
//! Subcommand implementations.

use crate::cli::{Cli, Command};
use serde::Serialize;
use splatpath_export::settings::frame_count_for;
use splatpath_export::{
    ConfigError, EncoderClient, ExportConfig, HttpEncoderClient, NetworkError, SessionId,
};
use splatpath_sequencer::presets::{self, PresetFraming};
use splatpath_sequencer::{load_path, path_duration, save_path, sample_pose, Keyframe, PathFileError};
use std::path::Path;
use thiserror::Error;

/// Errors surfaced to the user
#[derive(Debug, Error)]
pub enum CliError {
    /// Path file could not be read or written
    #[error("Path file error: {0}")]
    PathFile(#[from] PathFileError),

    /// Config could not be loaded or written
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Remote encoder request failed
    #[error(transparent)]
    Network(#[from] NetworkError),

    /// Output could not be serialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Argument out of range
    #[error("{0}")]
    InvalidArgument(String),

    /// Path has no keyframes to sample
    #[error("Path is empty")]
    EmptyPath,
}

/// Execute the parsed command line
pub async fn run(cli: Cli) -> Result<(), CliError> {
    let config = ExportConfig::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Command::Inspect { path, fps, json } => {
            let keyframes = load_path(&path)?;
            let summary = PathSummary::new(&keyframes, fps.unwrap_or(config.fps));
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print!("{summary}");
            }
        }
        Command::Sample {
            path,
            time,
            smoothing,
        } => {
            let keyframes = load_path(&path)?;
            let smoothing = smoothing.unwrap_or(config.smoothing);
            let pose = sample(&keyframes, time, smoothing)?;
            println!("{}", serde_json::to_string_pretty(&pose)?);
        }
        Command::Preset {
            kind,
            out,
            duration,
            target,
            radius,
            height,
            fov,
        } => {
            let framing = PresetFraming {
                target,
                radius,
                height,
                fov,
            };
            let keyframes = preset(kind, &framing, duration, &out)?;
            println!("Wrote {} keyframes ({kind}) to {}", keyframes.len(), out.display());
        }
        Command::Status { session } => {
            let client = HttpEncoderClient::from_config(&config)?;
            let report = client.status(&SessionId(session)).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Config { out } => match out {
            Some(path) => config.save(&path)?,
            None => {
                let pretty = ron::ser::PrettyConfig::default();
                let content = ron::ser::to_string_pretty(&config, pretty).map_err(ConfigError::from)?;
                println!("{content}");
            }
        },
    }
    Ok(())
}

/// Overview printed by `inspect`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathSummary {
    /// Number of keyframes
    pub keyframes: usize,
    /// Time of the first keyframe
    pub start: f32,
    /// Seconds from first to last keyframe
    pub duration: f32,
    /// Frame rate the frame count is computed at
    pub fps: u32,
    /// Frames an export would render
    pub frames: u32,
    /// Keyframe times in order
    pub times: Vec<f32>,
}

impl PathSummary {
    /// Summarize a sorted keyframe list
    pub fn new(keyframes: &[Keyframe], fps: u32) -> Self {
        let duration = path_duration(keyframes);
        Self {
            keyframes: keyframes.len(),
            start: keyframes.first().map_or(0.0, |k| k.t),
            duration,
            fps,
            frames: frame_count_for(duration, fps),
            times: keyframes.iter().map(|k| k.t).collect(),
        }
    }
}

impl std::fmt::Display for PathSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "keyframes: {}", self.keyframes)?;
        writeln!(f, "start:     {:.3}s", self.start)?;
        writeln!(f, "duration:  {:.3}s", self.duration)?;
        writeln!(f, "frames:    {} @ {} fps", self.frames, self.fps)?;
        for (i, t) in self.times.iter().enumerate() {
            writeln!(f, "  [{i}] t = {t:.3}")?;
        }
        Ok(())
    }
}

fn sample(
    keyframes: &[Keyframe],
    time: f32,
    smoothing: f32,
) -> Result<splatpath_sequencer::CameraPose, CliError> {
    if !(0.0..=1.0).contains(&smoothing) {
        return Err(CliError::InvalidArgument(format!(
            "smoothing must be within [0, 1], got {smoothing}"
        )));
    }
    sample_pose(keyframes, time, smoothing).ok_or(CliError::EmptyPath)
}

fn preset(
    kind: splatpath_sequencer::PresetKind,
    framing: &PresetFraming,
    duration: f32,
    out: &Path,
) -> Result<Vec<Keyframe>, CliError> {
    if !duration.is_finite() || duration <= 0.0 {
        return Err(CliError::InvalidArgument(format!(
            "duration must be positive, got {duration}"
        )));
    }
    let keyframes = presets::generate(kind, framing, duration);
    save_path(out, &keyframes)?;
    Ok(keyframes)
}
