#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Warden navigation engine.
//!
//! This crate defines the value types and the message surface that connect
//! the host world, the navigation algorithms, and the movement system. The
//! host submits [`Command`] values describing desired mutations, the world
//! executes them via its `apply` entry point, and then broadcasts [`Event`]
//! values that the movement system reacts to deterministically. The movement
//! system reads immutable snapshots and answers exclusively with new command
//! batches.

use std::{fmt, time::Duration};

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Immutable two-dimensional coordinate expressed in world units.
///
/// Equality is exact floating-point equality. Navigation code addresses
/// waypoints through [`WaypointId`] handles and only falls back to value
/// comparison at the path-search boundary.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    x: f32,
    y: f32,
}

impl Point {
    /// Point located at the world origin.
    pub const ORIGIN: Self = Self::new(0.0, 0.0);

    /// Creates a new point from its coordinates.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Horizontal coordinate of the point.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Vertical coordinate of the point.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }

    /// Squared Euclidean distance to another point.
    #[must_use]
    pub fn distance_squared(self, other: Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Point) -> f32 {
        self.distance_squared(other).sqrt()
    }

    /// Converts the point into a vector for steering arithmetic.
    #[must_use]
    pub const fn to_vec2(self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Creates a point from a vector.
    #[must_use]
    pub const fn from_vec2(value: Vec2) -> Self {
        Self::new(value.x, value.y)
    }

    /// Returns the point translated by the provided displacement.
    #[must_use]
    pub fn offset(self, displacement: Vec2) -> Self {
        Self::from_vec2(self.to_vec2() + displacement)
    }
}

impl From<Vec2> for Point {
    fn from(value: Vec2) -> Self {
        Self::from_vec2(value)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Straight line segment between two points.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    start: Point,
    end: Point,
}

impl Segment {
    /// Creates a segment spanning the provided endpoints.
    #[must_use]
    pub const fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    /// First endpoint of the segment.
    #[must_use]
    pub const fn start(&self) -> Point {
        self.start
    }

    /// Second endpoint of the segment.
    #[must_use]
    pub const fn end(&self) -> Point {
        self.end
    }

    /// Reports whether the two segments share at least one point.
    ///
    /// Touching endpoints and collinear overlaps count as intersections.
    #[must_use]
    pub fn intersects(&self, other: &Segment) -> bool {
        let d1 = orientation(other.start, other.end, self.start);
        let d2 = orientation(other.start, other.end, self.end);
        let d3 = orientation(self.start, self.end, other.start);
        let d4 = orientation(self.start, self.end, other.end);

        let straddles_other = (d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0);
        let straddles_self = (d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0);
        if straddles_other && straddles_self {
            return true;
        }

        (d1 == 0.0 && within_bounds(other.start, other.end, self.start))
            || (d2 == 0.0 && within_bounds(other.start, other.end, self.end))
            || (d3 == 0.0 && within_bounds(self.start, self.end, other.start))
            || (d4 == 0.0 && within_bounds(self.start, self.end, other.end))
    }
}

fn orientation(a: Point, b: Point, c: Point) -> f32 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

fn within_bounds(a: Point, b: Point, candidate: Point) -> bool {
    candidate.x >= a.x.min(b.x)
        && candidate.x <= a.x.max(b.x)
        && candidate.y >= a.y.min(b.y)
        && candidate.y <= a.y.max(b.y)
}

/// Stable handle of a waypoint inside a single waypoint graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WaypointId(usize);

impl WaypointId {
    /// Creates a new waypoint handle from its position in the graph.
    #[must_use]
    pub const fn new(value: usize) -> Self {
        Self(value)
    }

    /// Retrieves the zero-based position of the waypoint in its graph.
    #[must_use]
    pub const fn get(&self) -> usize {
        self.0
    }
}

impl fmt::Display for WaypointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Unique identifier assigned to an enemy by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to an item lying in the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(u32);

impl ItemId {
    /// Creates a new item identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Types of weapons that can lie on the ground and be equipped.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum ItemKind {
    /// Close-range sidearm.
    Pistol,
    /// Spread weapon with a short reach.
    Shotgun,
    /// Long-range automatic weapon.
    Rifle,
}

/// Behavioural archetype assigned to an enemy at spawn time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    /// Patrols and chases the player once aware of it.
    Guard,
    /// Patrols and flees around its waypoint circuit once aware of the player.
    Coward,
}

/// Hand-authored navigation data attached to an enemy.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EnemyLayout {
    /// Cyclic list of points walked while patrolling.
    pub patrol_route: Vec<Point>,
    /// Local waypoints describing the enemy's room. The first entry is the
    /// waypoint reachable from the spawn position.
    pub waypoints: Vec<Point>,
    /// Door waypoints used to route chases around room boundaries.
    pub doors: Vec<Point>,
}

/// Line-of-sight oracle answering whether a straight segment is obstructed.
pub trait LineOfSight {
    /// Returns `true` when the segment from `from` to `to` is blocked.
    fn is_obstructed(&self, from: Point, to: Point) -> bool;
}

impl<F> LineOfSight for F
where
    F: Fn(Point, Point) -> bool,
{
    fn is_obstructed(&self, from: Point, to: Point) -> bool {
        self(from, to)
    }
}

/// Failures reported by the navigation core.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum NavigationError {
    /// A required navigation structure was used before it was set up.
    #[error("navigation used before {what} was initialised")]
    MissingReference {
        /// Name of the missing structure.
        what: &'static str,
    },
    /// A strategy was configured with an empty waypoint set.
    #[error("{what} requires at least one waypoint")]
    EmptyWaypoints {
        /// Name of the waypoint set that was empty.
        what: &'static str,
    },
    /// A point could not be resolved to a waypoint of the graph.
    #[error("point {point} is not a waypoint of the graph")]
    PointNotInGraph {
        /// Point that failed to resolve.
        point: Point,
    },
    /// A waypoint handle does not belong to the graph.
    #[error("waypoint {waypoint} is outside a graph of {len} waypoints")]
    UnknownWaypoint {
        /// Offending handle.
        waypoint: WaypointId,
        /// Number of waypoints in the graph.
        len: usize,
    },
    /// The two waypoints lie in different connected components.
    #[error("no route from waypoint {from} to waypoint {to}")]
    NoRoute {
        /// Waypoint the search started from.
        from: WaypointId,
        /// Waypoint the search was asked to reach.
        to: WaypointId,
    },
    /// Every candidate waypoint was obstructed or the retry bound was hit.
    #[error("no unobstructed waypoint found after {attempts} attempts")]
    NoClearWaypoint {
        /// Number of candidates examined before giving up.
        attempts: usize,
    },
}

impl NavigationError {
    /// Reports whether retrying the same request later may succeed.
    ///
    /// Only obstruction failures are transient; configuration and lookup
    /// failures persist until the caller changes its inputs.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::NoClearWaypoint { .. })
    }

    /// Reports whether the error stems from an ordering bug during setup.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::MissingReference { .. } | Self::EmptyWaypoints { .. }
        )
    }
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Replaces the static level geometry and the shared room connectors.
    ConfigureLevel {
        /// Wall segments that obstruct line of sight.
        walls: Vec<Segment>,
        /// Room-connecting waypoints shared by every enemy.
        global_waypoints: Vec<Point>,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Updates the player's position feed.
    SetPlayerPosition {
        /// Current position of the player body.
        position: Point,
    },
    /// Requests that a new enemy be placed into the world.
    SpawnEnemy {
        /// Behavioural archetype of the enemy.
        kind: EnemyKind,
        /// Spawn position of the enemy body.
        position: Point,
        /// Authored navigation data for the enemy.
        layout: EnemyLayout,
        /// Weapon carried at spawn, if any.
        equipped: Option<ItemKind>,
    },
    /// Requests removal of an enemy from the world.
    DespawnEnemy {
        /// Identifier of the enemy to remove.
        enemy: EnemyId,
    },
    /// Updates the externally computed awareness signal of an enemy.
    SetAwareness {
        /// Identifier of the enemy whose awareness changed.
        enemy: EnemyId,
        /// Whether the enemy is aware of the player.
        aware: bool,
        /// Whether the player is currently hidden from the enemy.
        target_hidden: bool,
    },
    /// Applies a displacement to an enemy body.
    MoveEnemy {
        /// Identifier of the enemy to move.
        enemy: EnemyId,
        /// Displacement in world units for this tick.
        displacement: Vec2,
    },
    /// Places a new item on the ground.
    SpawnItem {
        /// Type of the item.
        kind: ItemKind,
        /// Ground position of the item.
        position: Point,
    },
    /// Removes an item from the ground without equipping it.
    RemoveItem {
        /// Identifier of the item to remove.
        item: ItemId,
    },
    /// Requests that an enemy pick up an item within reach.
    PickUpItem {
        /// Identifier of the enemy picking up the item.
        enemy: EnemyId,
        /// Identifier of the item to pick up.
        item: ItemId,
    },
    /// Requests that an enemy drop its equipped item at its feet.
    DropItem {
        /// Identifier of the enemy dropping its item.
        enemy: EnemyId,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Confirms that the level geometry was replaced.
    LevelConfigured {
        /// Number of wall segments in the level.
        wall_count: usize,
        /// Number of shared room-connecting waypoints.
        global_waypoint_count: usize,
    },
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Reports the player's new position.
    PlayerMoved {
        /// Position of the player body.
        position: Point,
    },
    /// Confirms that an enemy was created.
    EnemySpawned {
        /// Identifier assigned to the enemy.
        enemy: EnemyId,
        /// Behavioural archetype of the enemy.
        kind: EnemyKind,
        /// Spawn position of the enemy body.
        position: Point,
    },
    /// Confirms that an enemy was removed.
    EnemyDespawned {
        /// Identifier of the removed enemy.
        enemy: EnemyId,
    },
    /// Reports that an enemy's awareness signal changed.
    AwarenessChanged {
        /// Identifier of the enemy.
        enemy: EnemyId,
        /// Whether the enemy is aware of the player.
        aware: bool,
        /// Whether the player is hidden from the enemy.
        target_hidden: bool,
    },
    /// Confirms that an enemy body moved.
    EnemyMoved {
        /// Identifier of the enemy.
        enemy: EnemyId,
        /// Position before the move.
        from: Point,
        /// Position after the move.
        to: Point,
    },
    /// Confirms that an item was placed on the ground.
    ItemSpawned {
        /// Identifier assigned to the item.
        item: ItemId,
        /// Type of the item.
        kind: ItemKind,
        /// Ground position of the item.
        position: Point,
    },
    /// Confirms that an item left the ground.
    ItemRemoved {
        /// Identifier of the removed item.
        item: ItemId,
    },
    /// Confirms that an enemy equipped an item.
    ItemPickedUp {
        /// Identifier of the enemy.
        enemy: EnemyId,
        /// Identifier of the item that was picked up.
        item: ItemId,
        /// Type of the equipped item.
        kind: ItemKind,
    },
    /// Reports that a pickup request was rejected.
    ItemPickupRejected {
        /// Identifier of the enemy.
        enemy: EnemyId,
        /// Identifier of the requested item.
        item: ItemId,
        /// Reason the pickup failed.
        reason: PickupError,
    },
}

/// Reasons an item pickup may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PickupError {
    /// No enemy with the provided identifier exists.
    MissingEnemy,
    /// No item with the provided identifier lies on the ground.
    MissingItem,
    /// The item lies outside the enemy's reach.
    OutOfReach,
    /// The enemy already carries an item.
    AlreadyEquipped,
}
