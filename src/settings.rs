//! Simulation settings
//!
//! Loaded once at scene start from JSON (or defaults) and validated before any
//! buffers are allocated. Nothing here changes while the simulation runs.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Rejected or unreadable configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("ball_count must be > 0")]
    NoBalls,
    #[error("cell_size must be finite and > 0 (got {0})")]
    CellSize(f32),
    #[error("ball_radius must be finite and > 0 (got {0})")]
    BallRadius(f32),
    #[error("restitution must be within [0, 1] (got {0})")]
    Restitution(f32),
    #[error("gravity must be finite (got {0})")]
    Gravity(f32),
    #[error("initial_velocity_range must be finite and >= 0 on every axis (got {0})")]
    VelocityRange(Vec3),
    #[error("spawn volume min {min} must not exceed max {max}")]
    SpawnVolume { min: Vec3, max: Vec3 },
    #[error("room bounds are inverted or empty: {0}")]
    RoomBounds(&'static str),
    #[error("fixed_dt must be finite and > 0 (got {0})")]
    FixedDt(f32),
    #[error("batch_size must be > 0")]
    BatchSize,
    #[error("worker_threads must be > 0 when set")]
    WorkerThreads,
}

/// Axis-aligned box balls are spawned in
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnVolume {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for SpawnVolume {
    fn default() -> Self {
        Self {
            min: Vec3::new(-SPAWN_HALF_WIDTH, 0.0, -SPAWN_HALF_WIDTH),
            max: Vec3::new(SPAWN_HALF_WIDTH, SPAWN_MAX_HEIGHT, SPAWN_HALF_WIDTH),
        }
    }
}

/// Room made of a floor, four walls and an optional ceiling
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomConfig {
    pub left_x: f32,
    pub right_x: f32,
    pub back_z: f32,
    pub front_z: f32,
    pub ground_y: f32,
    /// Height of the walls above the ground
    pub wall_height: f32,
    /// Close the box with a ceiling at `ground_y + wall_height`
    pub ceiling: bool,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            left_x: -ROOM_HALF_WIDTH,
            right_x: ROOM_HALF_WIDTH,
            back_z: -ROOM_HALF_WIDTH,
            front_z: ROOM_HALF_WIDTH,
            ground_y: 0.0,
            wall_height: WALL_HEIGHT,
            ceiling: false,
        }
    }
}

impl RoomConfig {
    /// Lowest corner of the room interior
    pub fn min(&self) -> Vec3 {
        Vec3::new(self.left_x, self.ground_y, self.back_z)
    }

    /// Highest corner of the room interior
    pub fn max(&self) -> Vec3 {
        Vec3::new(self.right_x, self.ground_y + self.wall_height, self.front_z)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let values = [
            self.left_x,
            self.right_x,
            self.back_z,
            self.front_z,
            self.ground_y,
            self.wall_height,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ConfigError::RoomBounds("all bounds must be finite"));
        }
        if self.left_x >= self.right_x {
            return Err(ConfigError::RoomBounds("left_x must be < right_x"));
        }
        if self.back_z >= self.front_z {
            return Err(ConfigError::RoomBounds("back_z must be < front_z"));
        }
        if self.wall_height <= 0.0 {
            return Err(ConfigError::RoomBounds("wall_height must be > 0"));
        }
        Ok(())
    }
}

/// Complete simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of balls, fixed for the simulation's lifetime
    pub ball_count: usize,
    /// Vertical acceleration (m/s², negative is down)
    pub gravity: f32,
    pub ball_radius: f32,
    /// Per-axis half range of the random initial velocity
    pub initial_velocity_range: Vec3,
    /// Edge length of a spatial hash cell
    pub cell_size: f32,
    /// Shared by wall and ball collisions
    pub restitution: f32,
    pub spawn: SpawnVolume,
    pub room: RoomConfig,
    /// Fixed physics timestep (seconds)
    pub fixed_dt: f32,
    /// Seed for spawn positions and velocities
    pub seed: u64,
    /// Worker threads for the stage pool (None = one per core)
    pub worker_threads: Option<usize>,
    /// Balls per parallel task
    pub batch_size: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            ball_count: DEFAULT_BALL_COUNT,
            gravity: GRAVITY,
            ball_radius: BALL_RADIUS,
            initial_velocity_range: Vec3::splat(INITIAL_VELOCITY_RANGE),
            cell_size: CELL_SIZE,
            restitution: RESTITUTION,
            spawn: SpawnVolume::default(),
            room: RoomConfig::default(),
            fixed_dt: SIM_DT,
            seed: 42,
            worker_threads: None,
            batch_size: WORKER_BATCH_SIZE,
        }
    }
}

impl SimulationConfig {
    /// Parse a JSON config; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&contents)?;
        log::info!("Loaded simulation config ({} balls)", config.ball_count);
        Ok(config)
    }

    /// Override the ball count (menu / command line entry)
    pub fn with_ball_count(mut self, ball_count: usize) -> Self {
        self.ball_count = ball_count;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ball_count == 0 {
            return Err(ConfigError::NoBalls);
        }
        if !self.cell_size.is_finite() || self.cell_size <= 0.0 {
            return Err(ConfigError::CellSize(self.cell_size));
        }
        if !self.ball_radius.is_finite() || self.ball_radius <= 0.0 {
            return Err(ConfigError::BallRadius(self.ball_radius));
        }
        if !(0.0..=1.0).contains(&self.restitution) {
            return Err(ConfigError::Restitution(self.restitution));
        }
        if !self.gravity.is_finite() {
            return Err(ConfigError::Gravity(self.gravity));
        }
        let range = self.initial_velocity_range;
        if !range.is_finite() || range.min_element() < 0.0 {
            return Err(ConfigError::VelocityRange(range));
        }
        let spawn = self.spawn;
        if !spawn.min.is_finite() || !spawn.max.is_finite() || spawn.min.cmpgt(spawn.max).any() {
            return Err(ConfigError::SpawnVolume {
                min: spawn.min,
                max: spawn.max,
            });
        }
        self.room.validate()?;
        if !self.fixed_dt.is_finite() || self.fixed_dt <= 0.0 {
            return Err(ConfigError::FixedDt(self.fixed_dt));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::BatchSize);
        }
        if self.worker_threads == Some(0) {
            return Err(ConfigError::WorkerThreads);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_balls() {
        let config = SimulationConfig::default().with_ball_count(0);
        assert!(matches!(config.validate(), Err(ConfigError::NoBalls)));
    }

    #[test]
    fn test_rejects_bad_cell_size() {
        for cell_size in [0.0, -0.5, f32::NAN, f32::INFINITY] {
            let config = SimulationConfig {
                cell_size,
                ..Default::default()
            };
            assert!(matches!(config.validate(), Err(ConfigError::CellSize(_))));
        }
    }

    #[test]
    fn test_rejects_restitution_out_of_range() {
        let config = SimulationConfig {
            restitution: 1.5,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Restitution(_))));
    }

    #[test]
    fn test_rejects_inverted_spawn_volume() {
        let config = SimulationConfig {
            spawn: SpawnVolume {
                min: Vec3::splat(1.0),
                max: Vec3::ZERO,
            },
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::SpawnVolume { .. })
        ));
    }

    #[test]
    fn test_rejects_inverted_room() {
        let config = SimulationConfig {
            room: RoomConfig {
                left_x: 5.0,
                right_x: -5.0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::RoomBounds(_))));
    }

    #[test]
    fn test_rejects_zero_workers() {
        let config = SimulationConfig {
            worker_threads: Some(0),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::WorkerThreads)));
    }

    #[test]
    fn test_json_partial_config_uses_defaults() {
        let config = SimulationConfig::from_json_str(r#"{ "ball_count": 500, "cell_size": 1.0 }"#)
            .unwrap();
        assert_eq!(config.ball_count, 500);
        assert_eq!(config.cell_size, 1.0);
        assert_eq!(config.gravity, GRAVITY);
        assert_eq!(config.room, RoomConfig::default());
    }

    #[test]
    fn test_json_partial_spawn_volume_keeps_default_max() {
        let config =
            SimulationConfig::from_json_str(r#"{ "spawn": { "min": [-1.0, 2.0, -1.0] } }"#)
                .unwrap();
        assert_eq!(config.spawn.min, Vec3::new(-1.0, 2.0, -1.0));
        assert_eq!(config.spawn.max, SpawnVolume::default().max);
    }

    #[test]
    fn test_json_invalid_values_rejected() {
        let result = SimulationConfig::from_json_str(r#"{ "cell_size": -1.0 }"#);
        assert!(matches!(result, Err(ConfigError::CellSize(_))));
    }

    #[test]
    fn test_json_malformed_is_parse_error() {
        let result = SimulationConfig::from_json_str("{ ball_count: ");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_json_roundtrip_preserves_room() {
        let config = SimulationConfig {
            room: RoomConfig {
                ceiling: true,
                wall_height: 12.0,
                ..Default::default()
            },
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let parsed = SimulationConfig::from_json_str(&json).unwrap();
        assert_eq!(parsed.room, config.room);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let result = SimulationConfig::load("/definitely/not/here.json");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
