//! Shared contract implemented by every movement strategy.

use glam::Vec2;
use warden_core::{ItemId, ItemKind, LineOfSight, NavigationError, Point};
use warden_navigation::NavigationMesh;
use warden_world::{query::ItemView, GroundItem};

/// Decision produced by a strategy for a single tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Step {
    /// Stay in place.
    Hold,
    /// Move the body by the provided displacement.
    Displace(Vec2),
    /// Pick up the item within reach.
    PickUp(ItemId),
}

/// Read-only inputs available to a strategy during one tick.
pub struct Tick<'a> {
    /// Current position of the enemy body.
    pub position: Point,
    /// Current position of the player, if known.
    pub target: Option<Point>,
    /// Item carried by the enemy.
    pub equipped: Option<ItemKind>,
    /// Seconds of simulated time covered by the tick.
    pub dt: f32,
    /// Oracle answering whether straight segments are blocked.
    pub line_of_sight: &'a dyn LineOfSight,
    /// Ground items visible to weapon seeking.
    pub items: &'a dyn ItemLocator,
}

impl std::fmt::Debug for Tick<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tick")
            .field("position", &self.position)
            .field("target", &self.target)
            .field("equipped", &self.equipped)
            .field("dt", &self.dt)
            .finish_non_exhaustive()
    }
}

/// Common capability set of the movement strategies.
///
/// Multi-tick maneuvers keep their progress in the strategy itself and are
/// resumed by the next call to [`MovementStrategy::advance`].
pub trait MovementStrategy {
    /// Advances the strategy by one tick.
    ///
    /// Configuration errors are returned; transient planning failures are
    /// logged and reported as [`Step::Hold`].
    fn advance(
        &mut self,
        mesh: &mut NavigationMesh,
        tick: &Tick<'_>,
    ) -> Result<Step, NavigationError>;

    /// Requests that the strategy replans from the body's current position
    /// on its next tick.
    fn needs_repositioning(&mut self, reposition: bool);

    /// Cancels any in-flight maneuver when `stop` is `true` and keeps new
    /// maneuvers from starting until called again with `false`.
    fn stop_maneuvers(&mut self, stop: bool);

    /// Reports whether a multi-tick maneuver is in flight.
    fn is_busy(&self) -> bool;
}

/// Read access to the items lying on the ground.
pub trait ItemLocator {
    /// Item of `kind` closest to `from`.
    fn nearest_of_kind(&self, kind: ItemKind, from: Point) -> Option<GroundItem>;

    /// Looks up an item by identifier.
    fn item(&self, item: ItemId) -> Option<GroundItem>;
}

impl ItemLocator for ItemView<'_> {
    fn nearest_of_kind(&self, kind: ItemKind, from: Point) -> Option<GroundItem> {
        ItemView::nearest_of_kind(self, kind, from)
    }

    fn item(&self, item: ItemId) -> Option<GroundItem> {
        self.get(item)
    }
}

/// Displacement from `from` toward `to`, clamped to `reach` so the body never
/// overshoots its goal.
#[must_use]
pub fn toward(from: Point, to: Point, reach: f32) -> Vec2 {
    let delta = to.to_vec2() - from.to_vec2();
    let distance = delta.length();
    if distance <= reach || distance == 0.0 {
        delta
    } else {
        delta * (reach / distance)
    }
}

/// Sequence of points walked one after another.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Route {
    points: Vec<Point>,
    leg: usize,
}

impl Route {
    pub(crate) fn new(points: Vec<Point>) -> Self {
        Self { points, leg: 0 }
    }

    /// Displacement toward the current leg, or `None` once every point was
    /// reached.
    pub(crate) fn advance(&mut self, position: Point, reach: f32, epsilon: f32) -> Option<Vec2> {
        while let Some(&target) = self.points.get(self.leg) {
            if position.distance(target) < epsilon {
                self.leg += 1;
                continue;
            }
            return Some(toward(position, target, reach));
        }
        None
    }
}

/// Logs a downgraded planning failure, or hands configuration errors back.
pub(crate) fn disengage(
    error: NavigationError,
    strategy: &'static str,
) -> Result<Step, NavigationError> {
    if error.is_configuration() {
        return Err(error);
    }
    tracing::warn!(strategy, %error, "maneuver aborted");
    Ok(Step::Hold)
}
