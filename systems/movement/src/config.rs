use std::time::Duration;

use warden_core::ItemKind;
use warden_navigation::DEFAULT_MAX_ATTEMPTS;

/// Tunables shared by every enemy controller.
#[derive(Clone, Debug, PartialEq)]
pub struct MovementConfig {
    /// Walking speed while patrolling, in units per second.
    pub patrol_speed: f32,
    /// Running speed while chasing the player.
    pub chase_speed: f32,
    /// Running speed while evading or fetching a weapon.
    pub evade_speed: f32,
    /// Distance below which a waypoint counts as reached.
    pub arrival_epsilon: f32,
    /// Distance to the player at which a chase halts.
    pub stopping_distance: f32,
    /// Bound on candidates examined by the obstacle-aware navigator.
    pub max_attempts: usize,
    /// Weapon kinds in order of preference. Earlier kinds always win.
    pub weapon_priority: Vec<ItemKind>,
    /// Distance from which a weapon-seeking enemy requests the pickup.
    pub pickup_radius: f32,
    /// Pause after a failed maneuver before the next attempt.
    pub retry_cooldown: Duration,
}

impl MovementConfig {
    /// Creates a configuration with the provided speeds and default tunables.
    #[must_use]
    pub fn new(patrol_speed: f32, chase_speed: f32) -> Self {
        Self {
            patrol_speed,
            chase_speed,
            evade_speed: chase_speed,
            ..Self::default()
        }
    }
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            patrol_speed: 2.0,
            chase_speed: 3.5,
            evade_speed: 3.5,
            arrival_epsilon: 0.1,
            stopping_distance: 1.5,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            weapon_priority: vec![ItemKind::Rifle, ItemKind::Shotgun, ItemKind::Pistol],
            pickup_radius: 0.5,
            retry_cooldown: Duration::from_secs(1),
        }
    }
}
