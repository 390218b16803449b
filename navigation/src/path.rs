//! Breadth-first route search over waypoint graphs.

use std::collections::VecDeque;

use warden_core::{NavigationError, Point, WaypointId};

use crate::graph::WaypointGraph;

/// Reusable breadth-first search over a [`WaypointGraph`].
///
/// Routes are shortest in edge count. Neighbours are visited in ascending
/// handle order, so equal-length alternatives always resolve the same way.
/// The scratch buffers are kept between searches to avoid reallocating.
#[derive(Clone, Debug, Default)]
pub struct PathSearch {
    queue: VecDeque<WaypointId>,
    predecessors: Vec<Option<WaypointId>>,
    visited: Vec<bool>,
}

impl PathSearch {
    /// Creates a path search with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes the waypoint sequence from `start` to `goal`, both inclusive.
    pub fn route(
        &mut self,
        graph: &WaypointGraph,
        start: WaypointId,
        goal: WaypointId,
    ) -> Result<Vec<WaypointId>, NavigationError> {
        for waypoint in [start, goal] {
            if !graph.contains(waypoint) {
                return Err(NavigationError::UnknownWaypoint {
                    waypoint,
                    len: graph.len(),
                });
            }
        }

        if start == goal {
            return Ok(vec![start]);
        }

        self.prepare(graph.len());
        self.visited[start.get()] = true;
        self.queue.push_back(start);

        while let Some(current) = self.queue.pop_front() {
            for neighbor in graph.neighbors(current) {
                if self.visited[neighbor.get()] {
                    continue;
                }
                self.visited[neighbor.get()] = true;
                self.predecessors[neighbor.get()] = Some(current);

                if neighbor == goal {
                    return Ok(self.reconstruct(start, goal));
                }
                self.queue.push_back(neighbor);
            }
        }

        Err(NavigationError::NoRoute {
            from: start,
            to: goal,
        })
    }

    /// Computes the route between two waypoint positions.
    ///
    /// Both positions must match a waypoint of the graph exactly; a miss
    /// fails with [`NavigationError::PointNotInGraph`].
    pub fn shortest_path(
        &mut self,
        graph: &WaypointGraph,
        start: Point,
        goal: Point,
    ) -> Result<Vec<Point>, NavigationError> {
        let start = graph.resolve(start)?;
        let goal = graph.resolve(goal)?;
        let route = self.route(graph, start, goal)?;
        Ok(positions(graph, &route))
    }

    /// Computes the route from `start` to the home waypoint, handle zero.
    pub fn path_to_home(
        &mut self,
        graph: &WaypointGraph,
        start: Point,
    ) -> Result<Vec<Point>, NavigationError> {
        let Some(home) = graph.position(WaypointId::new(0)) else {
            return Err(NavigationError::EmptyWaypoints {
                what: "waypoint graph",
            });
        };
        self.shortest_path(graph, start, home)
    }

    fn prepare(&mut self, len: usize) {
        self.queue.clear();
        self.predecessors.clear();
        self.predecessors.resize(len, None);
        self.visited.clear();
        self.visited.resize(len, false);
    }

    fn reconstruct(&self, start: WaypointId, goal: WaypointId) -> Vec<WaypointId> {
        let mut route = vec![goal];
        let mut current = goal;
        while current != start {
            let Some(previous) = self.predecessors[current.get()] else {
                break;
            };
            route.push(previous);
            current = previous;
        }
        route.reverse();
        route
    }
}

/// Maps a route of handles onto waypoint positions.
#[must_use]
pub fn positions(graph: &WaypointGraph, route: &[WaypointId]) -> Vec<Point> {
    route
        .iter()
        .filter_map(|waypoint| graph.position(*waypoint))
        .collect()
}
