use warden_core::{NavigationError, Point};
use warden_navigation::NavigationMesh;

use crate::{
    strategy::{toward, MovementStrategy, Step, Tick},
    MovementConfig,
};

/// Runs at the player, detouring through any door that lies on the way.
#[derive(Clone, Debug)]
pub struct Chase {
    doors: Vec<Point>,
    speed: f32,
    stopping_distance: f32,
}

impl Chase {
    /// Creates a chase that may route through the provided doors.
    #[must_use]
    pub fn new(doors: Vec<Point>, config: &MovementConfig) -> Self {
        Self {
            doors,
            speed: config.chase_speed,
            stopping_distance: config.stopping_distance,
        }
    }

    /// Door lying between `position` and `target` that is closest to
    /// `position`.
    ///
    /// A door qualifies when the vectors position→door and door→target point
    /// into the same half-plane. Ties resolve to the earlier door.
    #[must_use]
    pub fn detour(&self, position: Point, target: Point) -> Option<Point> {
        let mut best: Option<(f32, Point)> = None;
        for &door in &self.doors {
            let to_door = door.to_vec2() - position.to_vec2();
            let onward = target.to_vec2() - door.to_vec2();
            if to_door.dot(onward) <= 0.0 {
                continue;
            }
            let distance = door.distance_squared(position);
            if best.map_or(true, |(closest, _)| distance < closest) {
                best = Some((distance, door));
            }
        }
        best.map(|(_, door)| door)
    }
}

impl MovementStrategy for Chase {
    fn advance(
        &mut self,
        _mesh: &mut NavigationMesh,
        tick: &Tick<'_>,
    ) -> Result<Step, NavigationError> {
        let Some(target) = tick.target else {
            return Ok(Step::Hold);
        };
        let reach = self.speed * tick.dt;

        if let Some(door) = self.detour(tick.position, target) {
            return Ok(Step::Displace(toward(tick.position, door, reach)));
        }

        let remaining = tick.position.distance(target) - self.stopping_distance;
        if remaining <= 0.0 {
            return Ok(Step::Hold);
        }
        Ok(Step::Displace(toward(tick.position, target, reach.min(remaining))))
    }

    // Chasing replans from scratch every tick.
    fn needs_repositioning(&mut self, _reposition: bool) {}

    fn stop_maneuvers(&mut self, _stop: bool) {}

    fn is_busy(&self) -> bool {
        false
    }
}
