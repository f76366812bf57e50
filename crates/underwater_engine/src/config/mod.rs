//! Configuration system
//!
//! Session-level configuration for the underwater pipeline. Values are fixed
//! between reconfiguration boundaries; nothing here changes mid-frame.

use serde::{Deserialize, Serialize};

use crate::render::resources::AmbientRefresh;
use crate::render::systems::underwater::BoundaryMode;

/// Configuration trait with file loading support
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        // Try different formats
        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, Default::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A value is outside its permitted range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Settings for the underwater masking and compositing pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UnderwaterConfig {
    /// How the water extent is bounded (infinite ocean or finite volume)
    pub boundary_mode: BoundaryMode,

    /// Fraction of the far clip distance at which the horizon plane is
    /// rasterized. Pulling it in front of the true far plane avoids
    /// precision and clipping artifacts there. Must lie in (0, 1].
    pub far_plane_multiplier: f32,

    /// Run the mask artifact-correction compute pass
    pub artifact_correction: bool,

    /// Re-copy surface material parameters into the compositor material
    /// every frame. Cheaper when false, but the underwater appearance can
    /// drift if the surface material changes later.
    pub copy_surface_params_each_frame: bool,

    /// When the ambient lighting snapshot is refreshed
    pub ambient_refresh: AmbientRefresh,

    /// Single-pass stereo rendering: mask targets carry two array layers
    /// and compute dispatches cover both eyes
    pub single_pass_stereo: bool,

    /// Use a full 32-bit float mask texture instead of 16-bit. Some GPUs
    /// mishandle 16-bit single-channel targets.
    pub full_float_mask: bool,

    /// Debug: composite the raw mask instead of the treated image
    pub view_mask: bool,

    /// Debug: skip the surface tile pass, leaving only the horizon write
    pub disable_tile_pass: bool,
}

impl Default for UnderwaterConfig {
    fn default() -> Self {
        Self {
            boundary_mode: BoundaryMode::FullScreen,
            far_plane_multiplier: 0.68,
            artifact_correction: true,
            copy_surface_params_each_frame: true,
            ambient_refresh: AmbientRefresh::EveryFrame,
            single_pass_stereo: false,
            full_float_mask: false,
            view_mask: false,
            disable_tile_pass: false,
        }
    }
}

impl UnderwaterConfig {
    /// Check that all values are inside their permitted ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.far_plane_multiplier > 0.0 && self.far_plane_multiplier <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "far_plane_multiplier must lie in (0, 1], got {}",
                self.far_plane_multiplier
            )));
        }
        Ok(())
    }
}

impl Config for UnderwaterConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(UnderwaterConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_multiplier() {
        let mut config = UnderwaterConfig::default();

        config.far_plane_multiplier = 0.0;
        assert!(config.validate().is_err());

        config.far_plane_multiplier = 1.5;
        assert!(config.validate().is_err());

        config.far_plane_multiplier = f32::NAN;
        assert!(config.validate().is_err());

        config.far_plane_multiplier = 1.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parses_partial_toml() {
        let config: UnderwaterConfig = toml::from_str(
            r#"
            boundary_mode = "GeometryVolume"
            far_plane_multiplier = 0.5
            "#,
        )
        .unwrap();

        assert_eq!(config.boundary_mode, BoundaryMode::GeometryVolume);
        assert!((config.far_plane_multiplier - 0.5).abs() < f32::EPSILON);
        // Unspecified fields keep their defaults.
        assert!(config.artifact_correction);
    }

    #[test]
    fn parses_ron() {
        let config: UnderwaterConfig =
            ron::from_str("(boundary_mode: Silhouette2D, single_pass_stereo: true)").unwrap();

        assert_eq!(config.boundary_mode, BoundaryMode::Silhouette2D);
        assert!(config.single_pass_stereo);
    }
}
