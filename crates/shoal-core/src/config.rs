//! Configuration loading and typed config structures for a pond.
//!
//! The canonical configuration lives in `shoal-config.yaml` at the
//! project root. This module defines strongly-typed structs that mirror
//! the YAML structure, and provides a loader that reads and validates
//! the file. A missing file falls back to defaults so a pond can start
//! with nothing but a broker and a Dragonfly on localhost.

use std::path::Path;

use serde::Deserialize;
use shoal_types::SwimArea;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level pond configuration.
///
/// Mirrors the structure of `shoal-config.yaml`. All fields have
/// defaults matching the reference pond.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ShoalConfig {
    /// Pond identity and swim area.
    #[serde(default)]
    pub world: WorldConfig,

    /// Tick, spawn, and movement tuning.
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// Infrastructure connection strings.
    #[serde(default)]
    pub infrastructure: InfrastructureConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ShoalConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values for infrastructure
    /// URLs:
    /// - `NATS_URL` overrides `infrastructure.nats_url`
    /// - `DRAGONFLY_URL` overrides `infrastructure.dragonfly_url`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yml::from_str(&contents)?;
        config.infrastructure.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.infrastructure.apply_env_overrides();
        Ok(config)
    }
}

/// Pond identity and swim area configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorldConfig {
    /// The unique name of this pond on the bus.
    #[serde(default = "default_pond_name")]
    pub pond_name: String,

    /// Random seed for reproducible simulation runs.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Swim area width in simulation units.
    #[serde(default = "default_width")]
    pub width: f64,

    /// Swim area height in simulation units.
    #[serde(default = "default_height")]
    pub height: f64,

    /// Distance from the edges inside which new fish are placed.
    #[serde(default = "default_spawn_margin")]
    pub spawn_margin: f64,
}

impl WorldConfig {
    /// The swim area implied by this configuration.
    pub const fn area(&self) -> SwimArea {
        SwimArea::new(self.width, self.height, self.spawn_margin)
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            pond_name: default_pond_name(),
            seed: default_seed(),
            width: default_width(),
            height: default_height(),
            spawn_margin: default_spawn_margin(),
        }
    }
}

/// Tick, spawn, and movement tuning.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Real-time milliseconds per simulation tick.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Wall-clock seconds between automatic local spawns.
    #[serde(default = "default_spawn_interval_secs")]
    pub spawn_interval_secs: u64,

    /// Lifetime in seconds given to each locally spawned fish.
    #[serde(default = "default_initial_lifetime_secs")]
    pub initial_lifetime_secs: f64,

    /// Movement speed in units per tick for newly placed fish.
    #[serde(default = "default_swim_speed")]
    pub swim_speed: f64,

    /// Simulated seconds of lifetime consumed per tick.
    #[serde(default = "default_lifetime_decay_per_tick")]
    pub lifetime_decay_per_tick: f64,

    /// Seconds each animation frame is held before advancing.
    #[serde(default = "default_frame_duration_secs")]
    pub frame_duration_secs: f64,

    /// Length of the cyclic animation frame sequence.
    #[serde(default = "default_frame_cycle")]
    pub frame_cycle: usize,

    /// Per-tick probability of a random heading perturbation.
    #[serde(default = "default_turn_chance")]
    pub turn_chance: f64,

    /// Maximum magnitude of a heading perturbation, in radians.
    #[serde(default = "default_turn_max_radians")]
    pub turn_max_radians: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            spawn_interval_secs: default_spawn_interval_secs(),
            initial_lifetime_secs: default_initial_lifetime_secs(),
            swim_speed: default_swim_speed(),
            lifetime_decay_per_tick: default_lifetime_decay_per_tick(),
            frame_duration_secs: default_frame_duration_secs(),
            frame_cycle: default_frame_cycle(),
            turn_chance: default_turn_chance(),
            turn_max_radians: default_turn_max_radians(),
        }
    }
}

/// Infrastructure connection strings and ports.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InfrastructureConfig {
    /// NATS server URL for the fish-exchange bus.
    #[serde(default = "default_nats_url")]
    pub nats_url: String,

    /// Dragonfly/Redis URL for the fish record mirror.
    #[serde(default = "default_dragonfly_url")]
    pub dragonfly_url: String,

    /// Bus subject the pond subscribes to and publishes on by default.
    #[serde(default = "default_topic")]
    pub topic: String,

    /// TCP port for the control and metrics HTTP surface.
    #[serde(default = "default_control_port")]
    pub control_port: u16,
}

impl InfrastructureConfig {
    /// Override URLs from the environment, when set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("NATS_URL") {
            self.nats_url = url;
        }
        if let Ok(url) = std::env::var("DRAGONFLY_URL") {
            self.dragonfly_url = url;
        }
    }
}

impl Default for InfrastructureConfig {
    fn default() -> Self {
        Self {
            nats_url: default_nats_url(),
            dragonfly_url: default_dragonfly_url(),
            topic: default_topic(),
            control_port: default_control_port(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default tracing filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_pond_name() -> String {
    String::from("NetLink")
}

const fn default_seed() -> u64 {
    42
}

const fn default_width() -> f64 {
    800.0
}

const fn default_height() -> f64 {
    600.0
}

const fn default_spawn_margin() -> f64 {
    50.0
}

const fn default_tick_interval_ms() -> u64 {
    16
}

const fn default_spawn_interval_secs() -> u64 {
    14
}

const fn default_initial_lifetime_secs() -> f64 {
    15.0
}

const fn default_swim_speed() -> f64 {
    2.0
}

const fn default_lifetime_decay_per_tick() -> f64 {
    0.016
}

const fn default_frame_duration_secs() -> f64 {
    0.1
}

const fn default_frame_cycle() -> usize {
    4
}

const fn default_turn_chance() -> f64 {
    0.02
}

const fn default_turn_max_radians() -> f64 {
    0.5
}

fn default_nats_url() -> String {
    String::from("nats://localhost:4222")
}

fn default_dragonfly_url() -> String {
    String::from("redis://localhost:6379")
}

fn default_topic() -> String {
    String::from("shoal.pond")
}

const fn default_control_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    String::from("info")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_pond() {
        let config = ShoalConfig::default();
        assert_eq!(config.world.pond_name, "NetLink");
        assert!((config.world.width - 800.0).abs() < f64::EPSILON);
        assert!((config.world.height - 600.0).abs() < f64::EPSILON);
        assert_eq!(config.simulation.tick_interval_ms, 16);
        assert_eq!(config.simulation.spawn_interval_secs, 14);
        assert!((config.simulation.initial_lifetime_secs - 15.0).abs() < f64::EPSILON);
        assert!((config.simulation.swim_speed - 2.0).abs() < f64::EPSILON);
        assert_eq!(config.infrastructure.control_port, 8000);
    }

    #[test]
    fn parse_partial_yaml_fills_defaults() {
        let yaml = r"
world:
  pond_name: HoneyBee
simulation:
  spawn_interval_secs: 5
";
        let config = ShoalConfig::parse(yaml).unwrap();
        assert_eq!(config.world.pond_name, "HoneyBee");
        assert_eq!(config.simulation.spawn_interval_secs, 5);
        // Untouched sections keep defaults.
        assert_eq!(config.simulation.tick_interval_ms, 16);
        assert_eq!(config.infrastructure.topic, "shoal.pond");
    }

    #[test]
    fn parse_rejects_malformed_yaml() {
        let result = ShoalConfig::parse(": not yaml [");
        assert!(result.is_err());
    }

    #[test]
    fn world_area_uses_configured_bounds() {
        let yaml = r"
world:
  width: 1024.0
  height: 768.0
  spawn_margin: 32.0
";
        let config = ShoalConfig::parse(yaml).unwrap();
        let area = config.world.area();
        assert!((area.width - 1024.0).abs() < f64::EPSILON);
        assert!((area.height - 768.0).abs() < f64::EPSILON);
        assert!((area.margin - 32.0).abs() < f64::EPSILON);
    }
}
