//! Runtime configuration, read from an optional `ar_blocks.toml`.
//!
//! Every field defaults to the matching value in `constants`, so an empty or
//! partial file is valid.
use std::path::Path;

use bevy::prelude::Resource;
use serde::Deserialize;

use crate::utils::constants::{
    cube_constants::{CUBE_MASS, CUBE_MAX_FORCE, CUBE_SCALE},
    crosshair_constants::{CROSSHAIR_CAMERA_OFFSET, CROSSHAIR_MOVE_DURATION, CROSSHAIR_SIZE},
    physics_constants::{ANGULAR_DAMPING, FRICTION, GRAVITY, LINEAR_DAMPING},
    placement_constants::{PLACEMENT_CUTOFF_DISTANCE, SECOND_CUBE_Z_OFFSET},
    timing_constants::{CUBE_SETTLE_DELAY, NO_SURFACE_WARNING_DURATION},
    tracker_constants::{
        CEILING_HEIGHT, FLOOR_HEIGHT, PLANE_HALF_EXTENT, TRACKER_MAX_MESH_ANCHORS,
        TRACKER_SCAN_INTERVAL, TRACKER_SCAN_RADIUS, TRACKER_SEED,
    },
};
use crate::utils::errors::ArError;

pub const CONFIG_FILE_NAME: &str = "ar_blocks.toml";

#[derive(Resource, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ArConfig {
    pub cube: CubeConfig,
    pub placement: PlacementConfig,
    pub crosshair: CrosshairConfig,
    pub timing: TimingConfig,
    pub tracker: TrackerConfig,
    pub physics: PhysicsConfig,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct CubeConfig {
    pub scale: f32,
    pub mass: f32,
    pub max_force: f32,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct PlacementConfig {
    pub cutoff_distance: f32,
    pub second_cube_z_offset: f32,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct CrosshairConfig {
    pub size: f32,
    pub camera_offset: f32,
    pub move_duration: f32,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct TimingConfig {
    pub cube_settle_delay: f32,
    pub no_surface_warning: f32,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct TrackerConfig {
    pub seed: u64,
    pub scan_interval: f32,
    pub max_mesh_anchors: usize,
    pub scan_radius: f32,
    pub floor_height: f32,
    pub ceiling_height: f32,
    pub plane_half_extent: f32,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct PhysicsConfig {
    pub gravity: f32,
    pub friction: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
}

impl Default for ArConfig {
    fn default() -> Self {
        Self {
            cube: CubeConfig::default(),
            placement: PlacementConfig::default(),
            crosshair: CrosshairConfig::default(),
            timing: TimingConfig::default(),
            tracker: TrackerConfig::default(),
            physics: PhysicsConfig::default(),
        }
    }
}

impl Default for CubeConfig {
    fn default() -> Self {
        Self {
            scale: CUBE_SCALE,
            mass: CUBE_MASS,
            max_force: CUBE_MAX_FORCE,
        }
    }
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            cutoff_distance: PLACEMENT_CUTOFF_DISTANCE,
            second_cube_z_offset: SECOND_CUBE_Z_OFFSET,
        }
    }
}

impl Default for CrosshairConfig {
    fn default() -> Self {
        Self {
            size: CROSSHAIR_SIZE,
            camera_offset: CROSSHAIR_CAMERA_OFFSET,
            move_duration: CROSSHAIR_MOVE_DURATION,
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            cube_settle_delay: CUBE_SETTLE_DELAY,
            no_surface_warning: NO_SURFACE_WARNING_DURATION,
        }
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            seed: TRACKER_SEED,
            scan_interval: TRACKER_SCAN_INTERVAL,
            max_mesh_anchors: TRACKER_MAX_MESH_ANCHORS,
            scan_radius: TRACKER_SCAN_RADIUS,
            floor_height: FLOOR_HEIGHT,
            ceiling_height: CEILING_HEIGHT,
            plane_half_extent: PLANE_HALF_EXTENT,
        }
    }
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            friction: FRICTION,
            linear_damping: LINEAR_DAMPING,
            angular_damping: ANGULAR_DAMPING,
        }
    }
}

impl ArConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ArError> {
        Ok(toml::from_str(source)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ArError> {
        let source = std::fs::read_to_string(path).map_err(|source| ArError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Loads `path` if it exists, otherwise (or on any error) the defaults.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            log::info!("No {} found, using default configuration", path.display());
            return Self::default();
        }
        match Self::from_file(path) {
            Ok(config) => {
                log::info!("Loaded configuration from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("{e}, using default configuration");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = ArConfig::from_toml_str("").unwrap();
        assert_eq!(config, ArConfig::default());
        assert_eq!(config.placement.cutoff_distance, 1.0);
        assert_eq!(config.cube.max_force, 5.0);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = ArConfig::from_toml_str(
            r#"
            [cube]
            max_force = 8.0

            [timing]
            no_surface_warning = 2.5

            [physics]
            friction = 0.3
            "#,
        )
        .unwrap();
        assert_eq!(config.cube.max_force, 8.0);
        assert_eq!(config.cube.scale, CUBE_SCALE);
        assert_eq!(config.timing.no_surface_warning, 2.5);
        assert_eq!(config.timing.cube_settle_delay, CUBE_SETTLE_DELAY);
        assert_eq!(config.physics.friction, 0.3);
        assert_eq!(config.physics.gravity, GRAVITY);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let err = ArConfig::from_toml_str("[cube]\nmax_force = \"lots\"").unwrap_err();
        assert!(matches!(err, ArError::ConfigParse(_)));
    }

    #[test]
    fn example_file_matches_defaults() {
        let config =
            ArConfig::from_toml_str(include_str!("../../ar_blocks.example.toml")).unwrap();
        assert_eq!(config, ArConfig::default());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = ArConfig::load_or_default(Path::new("does/not/exist/ar_blocks.toml"));
        assert_eq!(config, ArConfig::default());
    }
}
