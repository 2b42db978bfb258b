//! Runtime configuration for deserialization and interpretation.
//!
//! Loaded from TOML. Every field has a default, so an empty file is a valid
//! configuration:
//!
//! ```toml
//! frame_rate = 30
//! default_dialogue_duration = 2.5
//! max_walk_depth = 128
//!
//! [limits]
//! max_text_length = 2048
//! ```

use std::path::{Path, PathBuf};

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Size limits enforced while loading and interpreting graphs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Limits {
    /// Largest accepted document, in bytes of JSON input.
    pub max_document_bytes: usize,
    /// Largest accepted dialogue text, in bytes, before tag parsing.
    pub max_text_length: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_document_bytes: 4 * 1024 * 1024,
            max_text_length: 8 * 1024,
        }
    }
}

/// Tunables for the walker and the visibility engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Step rate of the inverse time lookup, in frames per second.
    pub frame_rate: u32,
    /// Clip length for dialogue nodes without an explicit `duration`.
    pub default_dialogue_duration: f32,
    /// Clip length for choice and action nodes without an explicit `duration`.
    pub default_choice_duration: f32,
    pub default_start_offset: f32,
    pub default_end_offset: f32,
    /// Maximum number of nodes visited in one uninterrupted walk. `None` disables the guard.
    pub max_walk_depth: Option<usize>,
    /// Maximum depth of a processor pull. `None` disables the guard.
    pub max_processor_depth: Option<usize>,
    pub limits: Limits,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            frame_rate: 60,
            default_dialogue_duration: 3.0,
            default_choice_duration: 5.0,
            default_start_offset: 0.0,
            default_end_offset: 0.0,
            max_walk_depth: Some(512),
            max_processor_depth: Some(64),
            limits: Limits::default(),
        }
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("config file not found at {0}")]
    #[diagnostic(code(ds::config::not_found))]
    NotFound(PathBuf),

    #[error("failed to parse config: {0}")]
    #[diagnostic(code(ds::config::parse_error))]
    Parse(#[from] toml::de::Error),

    #[error("io error: {0}")]
    #[diagnostic(code(ds::config::io_error))]
    Io(#[from] std::io::Error),

    #[error("invalid config value `{field}`: {reason}")]
    #[diagnostic(code(ds::config::invalid))]
    Invalid { field: &'static str, reason: String },
}

impl RuntimeConfig {
    /// Parses and validates a TOML configuration.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: RuntimeConfig = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration file from disk.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Checks ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frame_rate == 0 {
            return Err(ConfigError::Invalid {
                field: "frame_rate",
                reason: "must be at least 1".to_string(),
            });
        }
        let durations = [
            ("default_dialogue_duration", self.default_dialogue_duration),
            ("default_choice_duration", self.default_choice_duration),
            ("default_start_offset", self.default_start_offset),
            ("default_end_offset", self.default_end_offset),
        ];
        for (field, value) in durations {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("expected a finite non-negative number, found {value}"),
                });
            }
        }
        Ok(())
    }

    /// Seconds between two samples of the inverse time lookup.
    pub fn frame_step(&self) -> f32 {
        1.0 / self.frame_rate.max(1) as f32
    }
}
