// SPDX-License-Identifier: MIT OR Apache-2.0
//! Render settings sent with an export and the persisted export config.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use splatpath_sequencer::{path_duration, Keyframe};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Export request format version
pub const EXPORT_FORMAT_VERSION: u32 = 1;

/// Environment variable overriding [`ExportConfig::server_url`]
pub const SERVER_URL_ENV: &str = "SPLATPATH_EXPORT_SERVER";

/// Default remote encoder address
pub const DEFAULT_SERVER_URL: &str = "http://localhost:5174";

/// Output parameters for one export
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderSettings {
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
    /// Frames per second
    pub fps: u32,
    /// Seconds of path to render
    pub duration: f32,
    /// Number of frames, `ceil(duration * fps)`
    pub frame_count: u32,
    /// Position smoothing in `[0, 1]`
    pub smoothing: f32,
}

impl RenderSettings {
    /// Settings with `frame_count` derived from `duration` and `fps`
    pub fn from_duration(width: u32, height: u32, fps: u32, duration: f32, smoothing: f32) -> Self {
        Self {
            width,
            height,
            fps,
            duration,
            frame_count: frame_count_for(duration, fps),
            smoothing: smoothing.clamp(0.0, 1.0),
        }
    }

    /// Check that these settings can be rendered
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.duration.is_finite() || self.duration <= 0.0 {
            return Err(ValidationError::InvalidDuration(self.duration));
        }
        if self.fps == 0 {
            return Err(ValidationError::InvalidFrameRate(self.fps));
        }
        if self.width == 0 || self.height == 0 {
            return Err(ValidationError::InvalidResolution {
                width: self.width,
                height: self.height,
            });
        }
        if self.frame_count == 0 {
            return Err(ValidationError::NoFrames);
        }
        Ok(())
    }

    /// Path time offset of a frame, relative to the first keyframe
    pub fn frame_time(&self, frame: u32) -> f32 {
        frame as f32 / self.fps as f32
    }
}

/// Number of frames needed to cover `duration` at `fps`
pub fn frame_count_for(duration: f32, fps: u32) -> u32 {
    if !duration.is_finite() || duration <= 0.0 {
        return 0;
    }
    (duration * fps as f32).ceil() as u32
}

/// Everything the remote encoder receives when a session starts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSettings {
    /// Request format version
    pub version: u32,
    /// Scene being rendered
    pub scene_url: String,
    /// Keyframe snapshot, sorted by time
    pub keyframes: Vec<Keyframe>,
    /// Output parameters
    pub render: RenderSettings,
}

impl ExportSettings {
    /// Build settings for a keyframe snapshot using the path's own duration
    pub fn new(scene_url: impl Into<String>, keyframes: Vec<Keyframe>, config: &ExportConfig) -> Self {
        let duration = path_duration(&keyframes);
        Self {
            version: EXPORT_FORMAT_VERSION,
            scene_url: scene_url.into(),
            render: RenderSettings::from_duration(
                config.width,
                config.height,
                config.fps,
                duration,
                config.smoothing,
            ),
            keyframes,
        }
    }

    /// Override the rendered duration, recomputing the frame count
    pub fn with_duration(mut self, duration: f32) -> Self {
        self.render.duration = duration;
        self.render.frame_count = frame_count_for(duration, self.render.fps);
        self
    }

    /// Check keyframes and render settings
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.keyframes.len() < 2 {
            return Err(ValidationError::NotEnoughKeyframes(self.keyframes.len()));
        }
        self.render.validate()
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading or writing the file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid RON
    #[error("Invalid config: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// The config could not be serialized
    #[error("Failed to write config: {0}")]
    Serialize(#[from] ron::Error),
}

/// Persisted export defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Base URL of the remote encoder
    pub server_url: String,
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
    /// Frames per second
    pub fps: u32,
    /// Position smoothing in `[0, 1]`
    pub smoothing: f32,
    /// Timeout for each encoder request
    pub request_timeout_secs: u64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            width: 1280,
            height: 720,
            fps: 30,
            smoothing: 1.0,
            request_timeout_secs: 30,
        }
    }
}

impl ExportConfig {
    /// Load config from a RON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: ExportConfig = ron::from_str(&content)?;
        Ok(config.with_env_overrides())
    }

    /// Load config from `path` if it exists, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) if path.exists() => Self::load(path),
            Some(path) => {
                tracing::debug!("No config at {:?}, using defaults", path);
                Ok(Self::default().with_env_overrides())
            }
            None => Ok(Self::default().with_env_overrides()),
        }
    }

    /// Save config as pretty RON
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let pretty = ron::ser::PrettyConfig::default()
            .depth_limit(2)
            .separate_tuple_members(true);
        let content = ron::ser::to_string_pretty(self, pretty)?;
        std::fs::write(path, content)?;
        tracing::info!("Saved export config to {:?}", path);
        Ok(())
    }

    /// Apply environment overrides
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var(SERVER_URL_ENV) {
            if !url.trim().is_empty() {
                self.server_url = url.trim().to_string();
            }
        }
        self
    }

    /// Per-request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}
