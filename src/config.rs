use crate::error::{ManipulatorError, ManipulatorResult};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Engine configuration, one section per subsystem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ManipulatorConfig {
    pub drag: DragConfig,
    pub resize: ResizeConfig,
    pub units: UnitConfig,
    pub guides: GuideConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragConfig {
    /// Distance (px) at which a target guide locks onto a static guide
    pub snap_offset: f64,
    /// Compute the spacing readouts for matched guides
    pub guides_info: bool,
    /// Keep the overlay empty; matches are still computed and emitted
    pub skip_guides_render: bool,
    /// Render every guide line, not only the active ones
    pub debug: bool,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            snap_offset: 5.0,
            guides_info: true,
            skip_guides_render: false,
            debug: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResizeConfig {
    pub key_width: String,
    pub key_height: String,
    /// Commit in the unit found on the model at resize start
    pub current_unit: bool,
    pub keep_auto_width: bool,
    pub keep_auto_height: bool,
    pub min_dim: f64,
    pub step: f64,
    /// Never write top/left, even for freely positioned targets
    pub skip_position_update: bool,
    pub keep_ratio_on_shift: bool,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self {
            key_width: "width".to_string(),
            key_height: "height".to_string(),
            current_unit: true,
            keep_auto_width: false,
            keep_auto_height: false,
            min_dim: 10.0,
            step: 1.0,
            skip_position_update: false,
            keep_ratio_on_shift: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitConfig {
    pub dpi: f64,
    pub round_decimals: usize,
}

impl Default for UnitConfig {
    fn default() -> Self {
        Self {
            dpi: 96.0,
            round_decimals: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuideConfig {
    /// Max distance (px) for a static guide to count as coincident
    pub match_tolerance: f64,
    pub refresh_debounce_ms: u64,
}

impl Default for GuideConfig {
    fn default() -> Self {
        Self {
            match_tolerance: 1.0,
            refresh_debounce_ms: 200,
        }
    }
}

impl ManipulatorConfig {
    /// Parse a configuration from JSON, missing fields take their defaults
    pub fn from_json_str(json: &str) -> ManipulatorResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ManipulatorError::config(format!("invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> ManipulatorResult<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        let reader = BufReader::new(file);
        let config: Self = serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse config from: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ManipulatorResult<()> {
        if self.units.dpi <= 0.0 || !self.units.dpi.is_finite() {
            return Err(ManipulatorError::config("dpi must be a positive number"));
        }
        if self.drag.snap_offset < 0.0 {
            return Err(ManipulatorError::config("snap_offset must not be negative"));
        }
        if self.resize.min_dim < 0.0 {
            return Err(ManipulatorError::config("min_dim must not be negative"));
        }
        if self.resize.step <= 0.0 {
            return Err(ManipulatorError::config("step must be greater than zero"));
        }
        if self.guides.match_tolerance <= 0.0 {
            return Err(ManipulatorError::config(
                "match_tolerance must be greater than zero",
            ));
        }
        Ok(())
    }
}
