//! # Physics Configuration
//!
//! Settings for the collision query engine, the character controller and the
//! fixed-step loop that drives them. All structures are serde-derived and can
//! be loaded from `.toml` or `.ron` through the [`Config`] trait.
//!
//! ```toml
//! fixed_timestep = 0.016666668
//! max_substeps = 8
//! log_level = "info"
//!
//! [query]
//! contact_epsilon = 0.0001
//! bisection_iterations = 10
//!
//! [controller]
//! radius = 0.4
//! skin_width = 0.02
//! ```

use serde::{Deserialize, Serialize};

use crate::foundation::{logging, math::utils};

pub use crate::config::{Config, ConfigError};

/// # Query Configuration
///
/// Tuning for the capsule sweep solver. The defaults are the values the
/// solver was calibrated with; shrinking `min_step_fraction` trades time for
/// thinner-contact robustness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Extra distance at which a capsule counts as touching
    pub contact_epsilon: f32,
    /// Bisection passes used to tighten a time of impact
    pub bisection_iterations: u32,
    /// Hard cap on conservative-advancement steps per triangle
    pub max_sweep_iterations: u32,
    /// Minimum advancement step as a fraction of the capsule radius
    pub min_step_fraction: f32,
    /// Absolute floor on the advancement step
    pub min_step_floor: f32,
}

impl QueryConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.contact_epsilon >= 0.0) {
            return Err(ConfigError::Invalid("contact_epsilon must be non-negative".to_string()));
        }
        if self.max_sweep_iterations == 0 {
            return Err(ConfigError::Invalid("max_sweep_iterations must be at least 1".to_string()));
        }
        if !(self.min_step_floor > 0.0) || !(self.min_step_fraction >= 0.0) {
            return Err(ConfigError::Invalid(
                "sweep step must be positive (min_step_floor > 0, min_step_fraction >= 0)".to_string(),
            ));
        }
        Ok(())
    }

    /// Minimum advancement step for a capsule of the given radius
    pub fn min_step(&self, radius: f32) -> f32 {
        (radius * self.min_step_fraction).max(self.min_step_floor)
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            contact_epsilon: 1e-4,
            bisection_iterations: 10,
            max_sweep_iterations: 256,
            min_step_fraction: 0.02,
            min_step_floor: 1e-4,
        }
    }
}

/// # Controller Configuration
///
/// Default tuning copied into every new character controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Capsule radius
    pub radius: f32,
    /// Half length of the capsule's inner segment
    pub half_height: f32,
    /// Gap kept between the capsule and any surface it stops against
    pub skin_width: f32,
    /// How far below the capsule the ground probe reaches
    pub snap_distance: f32,
    /// Upward speed above which the ground probe is skipped
    pub max_snap_rise_speed: f32,
    /// Slide passes per fixed step
    pub max_slide_iterations: u32,
    /// Walkable slope limit in degrees
    pub max_slope_degrees: f32,
}

impl ControllerConfig {
    /// Minimum ground normal y for the configured slope limit
    pub fn min_ground_dot(&self) -> f32 {
        utils::deg_to_rad(self.max_slope_degrees).cos()
    }

    /// Set the capsule shape
    pub fn with_capsule(mut self, radius: f32, half_height: f32) -> Self {
        self.radius = radius;
        self.half_height = half_height;
        self
    }

    /// Set the skin width
    pub fn with_skin_width(mut self, skin_width: f32) -> Self {
        self.skin_width = skin_width;
        self
    }

    /// Set the ground snap distance
    pub fn with_snap_distance(mut self, snap_distance: f32) -> Self {
        self.snap_distance = snap_distance;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.radius > 0.0) {
            return Err(ConfigError::Invalid("controller radius must be positive".to_string()));
        }
        if !(self.half_height >= 0.0) {
            return Err(ConfigError::Invalid("controller half_height must be non-negative".to_string()));
        }
        if !(self.skin_width >= 0.0) || self.skin_width >= self.radius {
            return Err(ConfigError::Invalid(
                "skin_width must be non-negative and smaller than the radius".to_string(),
            ));
        }
        if !(self.snap_distance >= 0.0) {
            return Err(ConfigError::Invalid("snap_distance must be non-negative".to_string()));
        }
        if self.max_slide_iterations == 0 {
            return Err(ConfigError::Invalid("max_slide_iterations must be at least 1".to_string()));
        }
        if !(0.0..90.0).contains(&self.max_slope_degrees) {
            return Err(ConfigError::Invalid("max_slope_degrees must be in [0, 90)".to_string()));
        }
        Ok(())
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            radius: 0.4,
            half_height: 0.5,
            skin_width: 0.02,
            snap_distance: 0.3,
            max_snap_rise_speed: 2.0,
            max_slide_iterations: 4,
            max_slope_degrees: 45.0,
        }
    }
}

/// # Physics Configuration
///
/// Top-level settings for the collision and character movement core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Length of one fixed step in seconds
    pub fixed_timestep: f32,
    /// Maximum fixed steps run per frame
    pub max_substeps: u32,
    /// Default log filter passed to the logger bootstrap
    pub log_level: String,
    /// Sweep solver tuning
    pub query: QueryConfig,
    /// Character controller defaults
    pub controller: ControllerConfig,
}

impl PhysicsConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self {
            fixed_timestep: 1.0 / 60.0,
            max_substeps: 8,
            log_level: "info".to_string(),
            query: QueryConfig::default(),
            controller: ControllerConfig::default(),
        }
    }

    /// Set the fixed timestep
    pub fn with_fixed_timestep(mut self, step: f32) -> Self {
        self.fixed_timestep = step;
        self
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Set the controller defaults
    pub fn with_controller(mut self, controller: ControllerConfig) -> Self {
        self.controller = controller;
        self
    }

    /// Start the logger with `log_level` as the default filter
    pub fn init_logging(&self) {
        logging::init_with_level(&self.log_level);
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.log_level.trim().is_empty() {
            return Err(ConfigError::Invalid("log_level must not be empty".to_string()));
        }
        if !(self.fixed_timestep > 0.0) {
            return Err(ConfigError::Invalid("fixed_timestep must be positive".to_string()));
        }
        if self.max_substeps == 0 {
            return Err(ConfigError::Invalid("max_substeps must be at least 1".to_string()));
        }
        self.query.validate()?;
        self.controller.validate()?;
        Ok(())
    }
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Config for PhysicsConfig {
    fn check(&self) -> Result<(), ConfigError> {
        self.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigFormat;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_config_is_valid() {
        let config = PhysicsConfig::default();
        assert!(config.validate().is_ok());
        assert_relative_eq!(config.query.min_step(0.5), 0.01, epsilon = 1e-7);
        assert_relative_eq!(config.query.min_step(0.001), 1e-4);
        assert_relative_eq!(config.controller.min_ground_dot(), 0.70710677, epsilon = 1e-6);
    }

    #[test]
    fn test_rejects_skin_wider_than_radius() {
        let config = PhysicsConfig::new()
            .with_controller(ControllerConfig::default().with_capsule(0.1, 0.5).with_skin_width(0.2));
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = PhysicsConfig::new()
            .with_fixed_timestep(0.02)
            .with_log_level("debug")
            .with_controller(ControllerConfig::default().with_snap_distance(0.5));

        let text = config.to_string_with(ConfigFormat::Toml).unwrap();
        let parsed = PhysicsConfig::from_str_with(&text, ConfigFormat::Toml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_ron_round_trip_through_file() {
        let path = std::env::temp_dir().join(format!("collision_core_cfg_{}.ron", std::process::id()));
        let config = PhysicsConfig::new().with_log_level("collision_core=trace");

        config.save_to_file(&path).unwrap();
        let loaded = PhysicsConfig::load_from_file(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed = PhysicsConfig::from_str_with("max_substeps = 3\n", ConfigFormat::Toml).unwrap();
        assert_eq!(parsed.max_substeps, 3);
        assert_eq!(parsed.query, QueryConfig::default());
    }

    #[test]
    fn test_invalid_file_values_are_rejected() {
        let result = PhysicsConfig::from_str_with("fixed_timestep = -1.0\n", ConfigFormat::Toml);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_log_level_drives_logger_bootstrap() {
        let config = PhysicsConfig::new().with_log_level("collision_core=debug");
        assert!(config.validate().is_ok());
        // Repeated initialization is ignored
        config.init_logging();
        config.init_logging();

        let blank = PhysicsConfig::new().with_log_level("  ");
        assert!(matches!(blank.validate(), Err(ConfigError::Invalid(_))));
    }
}
