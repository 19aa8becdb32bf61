//! Character controller components

use crate::core::config::ControllerConfig;
use crate::ecs::Component;
use crate::foundation::math::{utils, Vec3};

/// Movement state of a character after its last fixed step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControllerState {
    /// Moved without touching anything
    #[default]
    Free,
    /// Slid along at least one blocking contact
    Sliding,
    /// Ground probe found walkable ground
    Grounded,
    /// Ground probe found nothing walkable
    Airborne,
}

/// Ground contact state persisted between fixed steps
#[derive(Debug, Clone, PartialEq)]
pub struct GroundState {
    /// Normal of the last walkable ground contact, `+Y` when airborne
    pub normal: Vec3,
    /// Standing on walkable ground after the last step
    pub grounded: bool,
    /// Value of `grounded` one step earlier
    pub was_grounded: bool,
    /// Consecutive steps spent grounded
    pub frames_grounded: u32,
    /// Consecutive steps spent airborne
    pub frames_airborne: u32,
    /// State reached at the end of the last step
    pub state: ControllerState,
    /// Blocking contacts resolved during the last step
    pub contacts: u32,
}

impl GroundState {
    /// Just left the ground this step
    pub fn left_ground(&self) -> bool {
        self.was_grounded && !self.grounded
    }

    /// Just landed this step
    pub fn landed(&self) -> bool {
        !self.was_grounded && self.grounded
    }

    pub(crate) fn advance(&mut self, grounded: bool) {
        self.was_grounded = self.grounded;
        self.grounded = grounded;
        if grounded {
            self.frames_grounded = self.frames_grounded.saturating_add(1);
            self.frames_airborne = 0;
        } else {
            self.frames_airborne = self.frames_airborne.saturating_add(1);
            self.frames_grounded = 0;
            self.normal = Vec3::y();
        }
    }
}

impl Default for GroundState {
    fn default() -> Self {
        Self {
            normal: Vec3::y(),
            grounded: false,
            was_grounded: false,
            frames_grounded: 0,
            frames_airborne: 0,
            state: ControllerState::Free,
            contacts: 0,
        }
    }
}

/// Capsule shape, tuning and ground state of a kinematic character
///
/// The capsule is vertical and centered on the body position. Its inner
/// segment spans `half_height` above and below the center.
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterControllerComponent {
    /// Capsule radius
    pub radius: f32,
    /// Half length of the inner segment
    pub half_height: f32,
    /// Gap kept from surfaces the character stops against
    pub skin_width: f32,
    /// Reach of the ground probe below the capsule
    pub snap_distance: f32,
    /// Upward speed above which ground snapping is skipped
    pub max_snap_rise_speed: f32,
    /// Slide passes per step
    pub max_slide_iterations: u32,
    /// Minimum normal y of walkable ground
    pub min_ground_dot: f32,
    /// Persisted ground contact state
    pub ground: GroundState,
}

impl Component for CharacterControllerComponent {}

impl CharacterControllerComponent {
    /// Create a controller from configured defaults
    pub fn from_config(config: &ControllerConfig) -> Self {
        Self {
            radius: config.radius,
            half_height: config.half_height,
            skin_width: config.skin_width,
            snap_distance: config.snap_distance,
            max_snap_rise_speed: config.max_snap_rise_speed,
            max_slide_iterations: config.max_slide_iterations,
            min_ground_dot: config.min_ground_dot(),
            ground: GroundState::default(),
        }
    }

    /// Create a controller with default tuning and the given capsule
    pub fn new(radius: f32, half_height: f32) -> Self {
        Self::from_config(&ControllerConfig::default().with_capsule(radius, half_height))
    }

    /// Builder pattern: Set the walkable slope limit in degrees
    pub fn with_max_slope_degrees(mut self, degrees: f32) -> Self {
        self.min_ground_dot = utils::deg_to_rad(degrees).cos();
        self
    }

    /// Builder pattern: Set the skin width
    pub fn with_skin_width(mut self, skin_width: f32) -> Self {
        self.skin_width = skin_width;
        self
    }

    /// Builder pattern: Set the ground snap distance
    pub fn with_snap_distance(mut self, snap_distance: f32) -> Self {
        self.snap_distance = snap_distance;
        self
    }

    /// Is `normal` walkable ground for this character
    pub fn is_walkable(&self, normal: &Vec3) -> bool {
        normal.y >= self.min_ground_dot
    }
}

impl Default for CharacterControllerComponent {
    fn default() -> Self {
        Self::from_config(&ControllerConfig::default())
    }
}

/// Requested motion for a character this step
///
/// The horizontal part of `desired_velocity` replaces the body's horizontal
/// velocity. Vertical velocity is kept unless `vertical` overrides it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MovementIntentComponent {
    /// Requested velocity; only x and z are applied
    pub desired_velocity: Vec3,
    /// Overrides the body's vertical velocity, e.g. for a jump
    pub vertical: Option<f32>,
}

impl Component for MovementIntentComponent {}

impl MovementIntentComponent {
    /// Walk with the given horizontal velocity
    pub fn walk(desired_velocity: Vec3) -> Self {
        Self {
            desired_velocity,
            vertical: None,
        }
    }

    /// Builder pattern: Override vertical velocity
    pub fn with_vertical(mut self, vertical: f32) -> Self {
        self.vertical = Some(vertical);
        self
    }

    /// Velocity after applying this intent to `current`
    pub fn apply(&self, current: &Vec3) -> Vec3 {
        Vec3::new(
            self.desired_velocity.x,
            self.vertical.unwrap_or(current.y),
            self.desired_velocity.z,
        )
    }
}
