//! Undirected waypoint graphs and the procedures that build and merge them.

use std::collections::{BTreeSet, VecDeque};

use tracing::warn;
use warden_core::{LineOfSight, NavigationError, Point, WaypointId};

/// Undirected adjacency-list graph over an ordered set of waypoints.
///
/// Waypoint handles are positions in the point sequence and stay stable for
/// the lifetime of the graph. Every mutation inserts edges in both
/// directions, so `a` lists `b` as a neighbour exactly when `b` lists `a`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WaypointGraph {
    points: Vec<Point>,
    adjacency: Vec<BTreeSet<WaypointId>>,
}

impl WaypointGraph {
    /// Creates a graph of isolated waypoints.
    #[must_use]
    pub fn new(points: Vec<Point>) -> Self {
        let adjacency = vec![BTreeSet::new(); points.len()];
        Self { points, adjacency }
    }

    /// Connects every waypoint to its predecessor and successor, wrapping
    /// around at both ends.
    ///
    /// Zero points produce an empty graph and a single point stays isolated.
    /// Two points share one edge, and from three points on the result is a
    /// cycle in which every waypoint has exactly two neighbours.
    #[must_use]
    pub fn ring(points: &[Point]) -> Self {
        let mut graph = Self::new(points.to_vec());
        let count = points.len();
        for index in 0..count {
            let next = (index + 1) % count;
            if next != index {
                graph.connect(index, next);
            }
        }
        graph
    }

    /// Connects every pair of waypoints whose straight segment is unobstructed.
    ///
    /// Issues one line-of-sight query per unordered pair.
    #[must_use]
    pub fn visibility<L>(points: &[Point], line_of_sight: &L) -> Self
    where
        L: LineOfSight + ?Sized,
    {
        let mut graph = Self::new(points.to_vec());
        for (first, &from) in points.iter().enumerate() {
            for (offset, &to) in points[first + 1..].iter().enumerate() {
                if !line_of_sight.is_obstructed(from, to) {
                    graph.connect(first, first + 1 + offset);
                }
            }
        }
        graph
    }

    /// Number of waypoints in the graph.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Reports whether the graph contains no waypoints.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Waypoint positions in handle order.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Iterator over every waypoint handle in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = WaypointId> {
        (0..self.points.len()).map(WaypointId::new)
    }

    /// Reports whether the handle belongs to the graph.
    #[must_use]
    pub fn contains(&self, waypoint: WaypointId) -> bool {
        waypoint.get() < self.points.len()
    }

    /// Position of the waypoint, if the handle belongs to the graph.
    #[must_use]
    pub fn position(&self, waypoint: WaypointId) -> Option<Point> {
        self.points.get(waypoint.get()).copied()
    }

    /// Neighbours of the waypoint in ascending handle order.
    ///
    /// Unknown handles have no neighbours.
    pub fn neighbors(&self, waypoint: WaypointId) -> impl Iterator<Item = WaypointId> + '_ {
        self.adjacency
            .get(waypoint.get())
            .into_iter()
            .flat_map(|neighbors| neighbors.iter().copied())
    }

    /// Number of neighbours of the waypoint.
    #[must_use]
    pub fn degree(&self, waypoint: WaypointId) -> usize {
        self.adjacency
            .get(waypoint.get())
            .map_or(0, BTreeSet::len)
    }

    /// Reports whether an edge joins the two waypoints.
    #[must_use]
    pub fn contains_edge(&self, first: WaypointId, second: WaypointId) -> bool {
        self.adjacency
            .get(first.get())
            .is_some_and(|neighbors| neighbors.contains(&second))
    }

    /// Number of undirected edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(BTreeSet::len).sum::<usize>() / 2
    }

    /// Every undirected edge once, with the lower handle first.
    pub fn edges(&self) -> impl Iterator<Item = (WaypointId, WaypointId)> + '_ {
        self.adjacency
            .iter()
            .enumerate()
            .flat_map(|(index, neighbors)| {
                neighbors
                    .iter()
                    .copied()
                    .filter(move |neighbor| neighbor.get() > index)
                    .map(move |neighbor| (WaypointId::new(index), neighbor))
            })
    }

    /// Adds an undirected edge between two waypoints.
    ///
    /// Self-loops are ignored.
    pub fn add_edge(
        &mut self,
        first: WaypointId,
        second: WaypointId,
    ) -> Result<(), NavigationError> {
        for waypoint in [first, second] {
            if !self.contains(waypoint) {
                return Err(NavigationError::UnknownWaypoint {
                    waypoint,
                    len: self.len(),
                });
            }
        }

        if first != second {
            self.connect(first.get(), second.get());
        }
        Ok(())
    }

    /// Finds the first waypoint located exactly at `point`.
    #[must_use]
    pub fn find(&self, point: Point) -> Option<WaypointId> {
        self.points
            .iter()
            .position(|candidate| *candidate == point)
            .map(WaypointId::new)
    }

    /// Resolves `point` to a waypoint handle, failing loudly on a miss.
    pub fn resolve(&self, point: Point) -> Result<WaypointId, NavigationError> {
        self.find(point)
            .ok_or(NavigationError::PointNotInGraph { point })
    }

    /// Splits the graph into its connected components.
    ///
    /// Components are ordered by their lowest waypoint handle and each one is
    /// re-indexed to a contiguous zero-based space that preserves the
    /// original waypoint order.
    #[must_use]
    pub fn components(&self) -> Vec<Subgraph> {
        let mut visited = vec![false; self.len()];
        let mut components = Vec::new();

        for seed in self.ids() {
            if visited[seed.get()] {
                continue;
            }
            let members = self.collect_component(seed, &mut visited);
            components.push(self.extract(members));
        }

        components
    }

    /// Extracts the connected component containing `seed`.
    #[must_use]
    pub fn component_of(&self, seed: WaypointId) -> Option<Subgraph> {
        if !self.contains(seed) {
            return None;
        }

        let mut visited = vec![false; self.len()];
        let members = self.collect_component(seed, &mut visited);
        Some(self.extract(members))
    }

    /// Concatenates two graphs, shifting the handles of `other` by `self.len()`.
    #[must_use]
    pub fn disjoint_union(&self, other: &WaypointGraph) -> WaypointGraph {
        let offset = self.len();
        let mut points = Vec::with_capacity(self.len() + other.len());
        points.extend_from_slice(&self.points);
        points.extend_from_slice(&other.points);

        let mut adjacency = self.adjacency.clone();
        adjacency.extend(other.adjacency.iter().map(|neighbors| {
            neighbors
                .iter()
                .map(|neighbor| WaypointId::new(neighbor.get() + offset))
                .collect::<BTreeSet<_>>()
        }));

        WaypointGraph { points, adjacency }
    }

    /// Merges `other` into a copy of this graph and bridges the two with a
    /// single edge.
    ///
    /// The bridge joins the closest pair of waypoints, one from each graph,
    /// whose connecting segment is unobstructed. The search is a brute-force
    /// scan over every pair. When no pair is visible the disjoint union is
    /// returned without a bridge and a warning is logged.
    #[must_use]
    pub fn link<L>(&self, other: &WaypointGraph, line_of_sight: &L) -> LinkOutcome
    where
        L: LineOfSight + ?Sized,
    {
        let offset = self.len();
        let mut graph = self.disjoint_union(other);
        let mut best: Option<(f32, usize, usize)> = None;

        for (first, &from) in self.points.iter().enumerate() {
            for (second, &to) in other.points.iter().enumerate() {
                let distance_squared = from.distance_squared(to);
                if best.is_some_and(|(closest, _, _)| distance_squared >= closest) {
                    continue;
                }
                if line_of_sight.is_obstructed(from, to) {
                    continue;
                }
                best = Some((distance_squared, first, second));
            }
        }

        let bridge = best.map(|(_, first, second)| {
            graph.connect(first, offset + second);
            (WaypointId::new(first), WaypointId::new(offset + second))
        });

        if bridge.is_none() && !self.is_empty() && !other.is_empty() {
            warn!(
                first_len = self.len(),
                second_len = other.len(),
                "no unobstructed pair links the waypoint graphs; keeping them disjoint"
            );
        }

        LinkOutcome { graph, bridge }
    }

    fn connect(&mut self, first: usize, second: usize) {
        let _ = self.adjacency[first].insert(WaypointId::new(second));
        let _ = self.adjacency[second].insert(WaypointId::new(first));
    }

    fn collect_component(&self, seed: WaypointId, visited: &mut [bool]) -> Vec<WaypointId> {
        let mut members = Vec::new();
        let mut queue = VecDeque::new();
        visited[seed.get()] = true;
        queue.push_back(seed);

        while let Some(current) = queue.pop_front() {
            members.push(current);
            for neighbor in self.neighbors(current) {
                if visited[neighbor.get()] {
                    continue;
                }
                visited[neighbor.get()] = true;
                queue.push_back(neighbor);
            }
        }

        members.sort_unstable();
        members
    }

    fn extract(&self, members: Vec<WaypointId>) -> Subgraph {
        let mut local_of = vec![None; self.len()];
        for (local, original) in members.iter().enumerate() {
            local_of[original.get()] = Some(local);
        }

        let points = members
            .iter()
            .map(|original| self.points[original.get()])
            .collect();
        let mut graph = WaypointGraph::new(points);
        for (local, original) in members.iter().enumerate() {
            for neighbor in self.neighbors(*original) {
                if let Some(neighbor_local) = local_of[neighbor.get()] {
                    graph.connect(local, neighbor_local);
                }
            }
        }

        Subgraph {
            graph,
            origins: members,
        }
    }
}

/// Connected piece of a larger graph, re-indexed from zero.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Subgraph {
    graph: WaypointGraph,
    origins: Vec<WaypointId>,
}

impl Subgraph {
    /// Builds the visibility graph over `points` and keeps only the component
    /// reachable from the first point.
    ///
    /// An empty point set produces an empty subgraph.
    #[must_use]
    pub fn reachable<L>(points: &[Point], line_of_sight: &L) -> Subgraph
    where
        L: LineOfSight + ?Sized,
    {
        WaypointGraph::visibility(points, line_of_sight)
            .component_of(WaypointId::new(0))
            .unwrap_or_default()
    }

    /// Re-indexed graph of the component.
    #[must_use]
    pub fn graph(&self) -> &WaypointGraph {
        &self.graph
    }

    /// Consumes the subgraph, yielding its re-indexed graph.
    #[must_use]
    pub fn into_graph(self) -> WaypointGraph {
        self.graph
    }

    /// Handle that the local waypoint carried in the source graph.
    #[must_use]
    pub fn origin(&self, local: WaypointId) -> Option<WaypointId> {
        self.origins.get(local.get()).copied()
    }

    /// Source handles of every local waypoint in local order.
    #[must_use]
    pub fn origins(&self) -> &[WaypointId] {
        &self.origins
    }
}

/// Result of bridging two waypoint graphs.
#[derive(Clone, Debug, PartialEq)]
pub struct LinkOutcome {
    /// Disjoint union of both graphs plus the bridge edge, if any.
    pub graph: WaypointGraph,
    /// Endpoints of the bridge in merged handles, first graph's endpoint first.
    pub bridge: Option<(WaypointId, WaypointId)>,
}

impl LinkOutcome {
    /// Reports whether the two graphs were joined.
    #[must_use]
    pub fn is_linked(&self) -> bool {
        self.bridge.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(_: Point, _: Point) -> bool {
        false
    }

    fn path_points(count: usize) -> Vec<Point> {
        (0..count).map(|index| Point::new(index as f32, 0.0)).collect()
    }

    fn id(value: usize) -> WaypointId {
        WaypointId::new(value)
    }

    fn assert_symmetric(graph: &WaypointGraph) {
        for first in graph.ids() {
            for second in graph.neighbors(first) {
                assert!(
                    graph.contains_edge(second, first),
                    "edge {first} -> {second} lacks its reverse"
                );
            }
        }
    }

    #[test]
    fn ring_is_symmetric_for_small_counts() {
        for count in 0..=10 {
            let graph = WaypointGraph::ring(&path_points(count));
            assert_eq!(graph.len(), count);
            assert_symmetric(&graph);

            for waypoint in graph.ids() {
                assert!(!graph.contains_edge(waypoint, waypoint));
                let expected = match count {
                    1 => 0,
                    2 => 1,
                    _ => 2,
                };
                assert_eq!(graph.degree(waypoint), expected, "count {count}");
            }
        }
    }

    #[test]
    fn ring_wraps_last_to_first() {
        let graph = WaypointGraph::ring(&path_points(5));
        assert!(graph.contains_edge(id(4), id(0)));
        assert!(graph.contains_edge(id(0), id(1)));
        assert_eq!(graph.edge_count(), 5);
    }

    #[test]
    fn visibility_skips_obstructed_pairs() {
        let points = vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(3.0, 0.0),
        ];
        let wall_at_two = |from: Point, to: Point| {
            let (low, high) = (from.x().min(to.x()), from.x().max(to.x()));
            low < 2.0 && high > 2.0
        };
        let graph = WaypointGraph::visibility(&points, &wall_at_two);

        assert!(graph.contains_edge(id(0), id(1)));
        assert!(!graph.contains_edge(id(0), id(2)));
        assert!(!graph.contains_edge(id(1), id(2)));
        assert_symmetric(&graph);
    }

    #[test]
    fn add_edge_rejects_unknown_handles() {
        let mut graph = WaypointGraph::new(path_points(2));
        assert_eq!(
            graph.add_edge(id(0), id(5)),
            Err(NavigationError::UnknownWaypoint {
                waypoint: id(5),
                len: 2
            })
        );
        graph.add_edge(id(1), id(1)).expect("self loop is ignored");
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn components_preserve_original_order() {
        let mut graph = WaypointGraph::new(path_points(6));
        graph.add_edge(id(0), id(3)).expect("edge");
        graph.add_edge(id(3), id(5)).expect("edge");
        graph.add_edge(id(1), id(4)).expect("edge");

        let components = graph.components();
        assert_eq!(components.len(), 3);

        assert_eq!(components[0].origins(), &[id(0), id(3), id(5)]);
        assert_eq!(
            components[0].graph().points(),
            &[Point::new(0.0, 0.0), Point::new(3.0, 0.0), Point::new(5.0, 0.0)]
        );
        assert!(components[0].graph().contains_edge(id(0), id(1)));
        assert!(components[0].graph().contains_edge(id(1), id(2)));
        assert!(!components[0].graph().contains_edge(id(0), id(2)));

        assert_eq!(components[1].origins(), &[id(1), id(4)]);
        assert_eq!(components[2].origins(), &[id(2)]);
        assert_eq!(components[2].graph().edge_count(), 0);
    }

    #[test]
    fn reachable_keeps_component_of_first_point() {
        let points = vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(1.0, 0.0),
        ];
        let wall_at_five = |from: Point, to: Point| {
            let (low, high) = (from.x().min(to.x()), from.x().max(to.x()));
            low < 5.0 && high > 5.0
        };
        let subgraph = Subgraph::reachable(&points, &wall_at_five);

        assert_eq!(subgraph.origins(), &[id(0), id(2)]);
        assert_eq!(subgraph.origin(id(1)), Some(id(2)));
        assert_eq!(subgraph.graph().edge_count(), 1);
    }

    #[test]
    fn reachable_on_empty_input_is_empty() {
        let subgraph = Subgraph::reachable(&[], &open);
        assert!(subgraph.graph().is_empty());
    }

    #[test]
    fn link_bridges_closest_visible_pair() {
        let left = WaypointGraph::ring(&[
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 1.0),
        ]);
        let right = WaypointGraph::ring(&[
            Point::new(3.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(4.0, 1.0),
            Point::new(3.0, 1.0),
        ]);
        let outcome = left.link(&right, &open);

        assert_eq!(outcome.graph.len(), 8);
        assert_eq!(outcome.graph.edge_count(), 9);
        assert_eq!(outcome.bridge, Some((id(1), id(4))));
        assert_symmetric(&outcome.graph);
    }

    #[test]
    fn link_skips_obstructed_pairs() {
        let left = WaypointGraph::new(vec![Point::new(0.0, 0.0), Point::new(0.0, 5.0)]);
        let right = WaypointGraph::new(vec![Point::new(1.0, 0.0), Point::new(1.0, 5.0)]);
        let blocks_bottom = |from: Point, to: Point| from.y() < 1.0 && to.y() < 1.0;
        let outcome = left.link(&right, &blocks_bottom);

        assert_eq!(outcome.bridge, Some((id(1), id(3))));
    }

    #[test]
    fn link_without_visible_pair_returns_disjoint_union() {
        let left = WaypointGraph::ring(&path_points(3));
        let right = WaypointGraph::ring(&[Point::new(9.0, 9.0), Point::new(9.0, 8.0)]);
        let outcome = left.link(&right, &|_: Point, _: Point| true);

        assert!(!outcome.is_linked());
        assert_eq!(outcome.graph, left.disjoint_union(&right));
        assert_eq!(outcome.graph.components().len(), 2);
    }
}
