// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Imprint configuration system

use super::options::{DebugMode, ImprintOptions, OutputMode};
use super::result::ImprintResult;
use crate::geometry::Mesh;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file looked up by [`ImprintConfig::load`]
pub const CONFIG_FILE: &str = "imprint.toml";

/// Imprint configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImprintConfig {
    /// Coincidence distance in model units
    pub tolerance: f64,
    /// Engine options
    pub options: ImprintOptions,
}

impl Default for ImprintConfig {
    fn default() -> Self {
        Self {
            tolerance: 0.075,
            options: ImprintOptions::default(),
        }
    }
}

impl ImprintConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: ImprintConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides
    pub fn load() -> Result<Self> {
        let mut config = if PathBuf::from(CONFIG_FILE).exists() {
            Self::from_file(CONFIG_FILE)?
        } else {
            Self::default()
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `IMPRINT_*` overrides read through `var`
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(tolerance) = var("IMPRINT_TOLERANCE") {
            self.tolerance = tolerance
                .trim()
                .parse()
                .with_context(|| format!("Invalid IMPRINT_TOLERANCE: {}", tolerance))?;
        }

        if let Some(mode) = var("IMPRINT_OUTPUT_MODE") {
            self.options.output_mode = match OutputMode::from_str(mode.trim()) {
                Some(mode) => mode,
                None => bail!("Unknown IMPRINT_OUTPUT_MODE: {}", mode),
            };
        }

        if let Some(kind) = var("IMPRINT_DEBUG_OUTPUT") {
            let cell_id = match var("IMPRINT_DEBUG_CELL") {
                Some(cell) => cell
                    .trim()
                    .parse()
                    .with_context(|| format!("Invalid IMPRINT_DEBUG_CELL: {}", cell))?,
                None => bail!("IMPRINT_DEBUG_OUTPUT requires IMPRINT_DEBUG_CELL"),
            };
            self.options.debug_mode = match kind.trim().to_lowercase().as_str() {
                "input_points" => DebugMode::InputPointsForCell(cell_id),
                "triangulation" => DebugMode::TriangulationForCell(cell_id),
                "none" => DebugMode::None,
                _ => bail!("Unknown IMPRINT_DEBUG_OUTPUT: {}", kind),
            };
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }

    /// Run the engine with this configuration
    pub fn run(&self, target: &Mesh, imprint: &Mesh) -> Result<ImprintResult> {
        super::imprint(target, imprint, self.tolerance, &self.options)
            .with_context(|| format!("Imprint failed with tolerance {}", self.tolerance))
    }
}
