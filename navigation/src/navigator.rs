//! Retry loop that finds a waypoint reachable in a straight line.

use std::collections::BTreeSet;

use tracing::trace;
use warden_core::{LineOfSight, NavigationError, Point};

use crate::spatial_index::{Nearest, SpatialIndex};

/// Upper bound on candidates examined by a single search.
pub const DEFAULT_MAX_ATTEMPTS: usize = 200;

/// Waypoint accepted by [`ObstacleAwareNavigator::find_clear`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClearWaypoint {
    /// Accepted waypoint.
    pub waypoint: Nearest,
    /// Number of candidates examined, including the accepted one.
    pub attempts: usize,
}

/// Finds the nearest waypoint that can be walked to without crossing an
/// obstacle.
///
/// Each attempt asks the spatial index for the nearest waypoint outside the
/// exclusion set and tests the segment to it. Obstructed candidates join the
/// exclusion set, so they are rejected in increasing distance order. The
/// search gives up after a fixed number of attempts.
#[derive(Clone, Debug)]
pub struct ObstacleAwareNavigator {
    max_attempts: usize,
    excluded: BTreeSet<usize>,
    rejected: Vec<usize>,
}

impl ObstacleAwareNavigator {
    /// Creates a navigator that examines at most `max_attempts` candidates.
    #[must_use]
    pub fn new(max_attempts: usize) -> Self {
        Self {
            max_attempts,
            excluded: BTreeSet::new(),
            rejected: Vec::new(),
        }
    }

    /// Maximum number of candidates examined per search.
    #[must_use]
    pub const fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Slots rejected by the latest search, in the order they were rejected.
    #[must_use]
    pub fn rejected(&self) -> &[usize] {
        &self.rejected
    }

    /// Finds the nearest waypoint of `index` visible from `origin`.
    ///
    /// Every call starts a new planning episode with an empty exclusion set.
    pub fn find_clear<L>(
        &mut self,
        index: &SpatialIndex,
        origin: Point,
        line_of_sight: &L,
    ) -> Result<ClearWaypoint, NavigationError>
    where
        L: LineOfSight + ?Sized,
    {
        if index.is_empty() {
            return Err(NavigationError::EmptyWaypoints {
                what: "spatial index",
            });
        }

        self.excluded.clear();
        self.rejected.clear();

        for attempt in 1..=self.max_attempts {
            let Some(candidate) = index.nearest_excluding(origin, &self.excluded) else {
                return Err(NavigationError::NoClearWaypoint {
                    attempts: attempt - 1,
                });
            };

            if !line_of_sight.is_obstructed(origin, candidate.point) {
                return Ok(ClearWaypoint {
                    waypoint: candidate,
                    attempts: attempt,
                });
            }

            trace!(slot = candidate.slot, attempt, "candidate waypoint obstructed");
            let _ = self.excluded.insert(candidate.slot);
            self.rejected.push(candidate.slot);
        }

        Err(NavigationError::NoClearWaypoint {
            attempts: self.max_attempts,
        })
    }
}

impl Default for ObstacleAwareNavigator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}
