//! Per-enemy construction of the connected navigation graph.

use tracing::{debug, warn};
use warden_core::{LineOfSight, NavigationError, Point, WaypointId};

use crate::{
    graph::{Subgraph, WaypointGraph},
    path::PathSearch,
    spatial_index::SpatialIndex,
};

/// How an enemy's authored waypoints are connected before merging.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LocalTopology {
    /// Visibility graph restricted to the component reachable from the first
    /// waypoint.
    #[default]
    Reachable,
    /// Deterministic ring over the authored order.
    Ring,
}

/// Tunables for [`GraphAssembly`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AssemblyConfig {
    topology: LocalTopology,
}

impl AssemblyConfig {
    /// Creates a configuration using the provided local topology.
    #[must_use]
    pub const fn new(topology: LocalTopology) -> Self {
        Self { topology }
    }

    /// Topology used for the enemy's own waypoints.
    #[must_use]
    pub const fn topology(&self) -> LocalTopology {
        self.topology
    }
}

/// Room-connecting waypoints shared by every enemy of a level.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GlobalWaypoints {
    points: Vec<Point>,
}

impl GlobalWaypoints {
    /// Wraps the provided connector points.
    #[must_use]
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Connector positions.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }
}

/// Connected navigation graph owned by a single enemy, together with the
/// spatial index over its waypoints and a reusable path search.
///
/// Handles `0..local().len()` address the enemy's own waypoints, so handle
/// zero is the home waypoint whenever the enemy authored any.
#[derive(Clone, Debug, Default)]
pub struct NavigationMesh {
    graph: WaypointGraph,
    local: WaypointGraph,
    index: SpatialIndex,
    search: PathSearch,
}

impl NavigationMesh {
    /// Wraps an already connected graph, building its spatial index.
    #[must_use]
    pub fn new(graph: WaypointGraph, local: WaypointGraph) -> Self {
        let index = SpatialIndex::build(graph.points());
        Self {
            graph,
            local,
            index,
            search: PathSearch::new(),
        }
    }

    /// Merged navigation graph.
    #[must_use]
    pub fn graph(&self) -> &WaypointGraph {
        &self.graph
    }

    /// Spatial index over the merged graph's waypoints; slots are handles.
    #[must_use]
    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    /// Positions of the enemy's own waypoints.
    #[must_use]
    pub fn waypoints(&self) -> &[Point] {
        self.local.points()
    }

    /// Connections among the enemy's own waypoints.
    #[must_use]
    pub fn connections(&self) -> &WaypointGraph {
        &self.local
    }

    /// Reports whether the mesh has no waypoints at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    /// Shortest route between two waypoints of the merged graph.
    pub fn route(
        &mut self,
        from: WaypointId,
        to: WaypointId,
    ) -> Result<Vec<WaypointId>, NavigationError> {
        self.search.route(&self.graph, from, to)
    }

    /// Position of a waypoint of the merged graph.
    pub fn position(&self, waypoint: WaypointId) -> Result<Point, NavigationError> {
        self.graph
            .position(waypoint)
            .ok_or(NavigationError::UnknownWaypoint {
                waypoint,
                len: self.graph.len(),
            })
    }
}

/// Result of assembling one enemy's navigation mesh.
#[derive(Clone, Debug)]
pub struct Assembly {
    /// Assembled mesh.
    pub mesh: NavigationMesh,
    /// Number of pieces that could not be bridged into the mesh.
    pub unlinked: usize,
}

/// Builds enemy navigation meshes from authored waypoints.
///
/// The enemy's own waypoints are connected first. Each connected component
/// of the global connector graph and every peer graph is then bridged in.
/// Pieces that cannot see the growing mesh are retried after every
/// successful bridge, because a later piece may bring them into view. Pieces
/// that never link stay out of the mesh.
#[derive(Debug)]
pub struct GraphAssembly<'a, L: ?Sized> {
    config: AssemblyConfig,
    global: &'a GlobalWaypoints,
    line_of_sight: &'a L,
}

impl<'a, L> GraphAssembly<'a, L>
where
    L: LineOfSight + ?Sized,
{
    /// Creates an assembly step bound to the level's connectors and oracle.
    #[must_use]
    pub fn new(config: AssemblyConfig, global: &'a GlobalWaypoints, line_of_sight: &'a L) -> Self {
        Self {
            config,
            global,
            line_of_sight,
        }
    }

    /// Connects `local` according to the configured topology.
    #[must_use]
    pub fn local_graph(&self, local: &[Point]) -> WaypointGraph {
        match self.config.topology() {
            LocalTopology::Reachable => Subgraph::reachable(local, self.line_of_sight).into_graph(),
            LocalTopology::Ring => WaypointGraph::ring(local),
        }
    }

    /// Assembles the mesh for an enemy authored with `local` waypoints.
    ///
    /// `peers` are the local graphs of enemies assembled earlier.
    #[must_use]
    pub fn assemble(&self, local: &[Point], peers: &[&WaypointGraph]) -> Assembly {
        let local_graph = self.local_graph(local);
        let global_graph = WaypointGraph::visibility(self.global.points(), self.line_of_sight);

        let mut pending: Vec<WaypointGraph> = global_graph
            .components()
            .into_iter()
            .map(Subgraph::into_graph)
            .collect();
        pending.extend(
            peers
                .iter()
                .filter(|peer| !peer.is_empty())
                .map(|peer| (*peer).clone()),
        );

        let mut merged = local_graph.clone();
        if merged.is_empty() && !pending.is_empty() {
            merged = pending.remove(0);
        }

        loop {
            let mut progressed = false;
            let mut still_pending = Vec::with_capacity(pending.len());

            for piece in pending {
                let outcome = quiet_link(&merged, &piece, self.line_of_sight);
                match outcome {
                    Some(graph) => {
                        merged = graph;
                        progressed = true;
                    }
                    None => still_pending.push(piece),
                }
            }

            pending = still_pending;
            if !progressed || pending.is_empty() {
                break;
            }
        }

        if !pending.is_empty() {
            warn!(
                unlinked = pending.len(),
                waypoints = merged.len(),
                "navigation pieces could not be linked; cross-room routing limited"
            );
        }
        debug!(
            local = local_graph.len(),
            merged = merged.len(),
            edges = merged.edge_count(),
            "assembled navigation mesh"
        );

        Assembly {
            mesh: NavigationMesh::new(merged, local_graph),
            unlinked: pending.len(),
        }
    }
}

fn quiet_link<L>(
    merged: &WaypointGraph,
    piece: &WaypointGraph,
    line_of_sight: &L,
) -> Option<WaypointGraph>
where
    L: LineOfSight + ?Sized,
{
    if merged.is_empty() || piece.is_empty() {
        return None;
    }

    // Probe visibility first so retried pieces do not log a warning per pass.
    let visible = merged.points().iter().any(|&from| {
        piece
            .points()
            .iter()
            .any(|&to| !line_of_sight.is_obstructed(from, to))
    });
    if !visible {
        return None;
    }

    let outcome = merged.link(piece, line_of_sight);
    outcome.is_linked().then_some(outcome.graph)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(_: Point, _: Point) -> bool {
        false
    }

    fn square(origin: Point) -> Vec<Point> {
        vec![
            origin,
            Point::new(origin.x() + 1.0, origin.y()),
            Point::new(origin.x() + 1.0, origin.y() + 1.0),
            Point::new(origin.x(), origin.y() + 1.0),
        ]
    }

    #[test]
    fn local_waypoints_keep_leading_handles() {
        let global = GlobalWaypoints::new(vec![Point::new(5.0, 0.0)]);
        let assembly = GraphAssembly::new(AssemblyConfig::default(), &global, &open);
        let local = square(Point::ORIGIN);

        let result = assembly.assemble(&local, &[]);

        assert_eq!(&result.mesh.graph().points()[..4], local.as_slice());
        assert_eq!(result.mesh.waypoints(), local.as_slice());
        assert_eq!(result.mesh.graph().len(), 5);
        assert_eq!(result.unlinked, 0);
        assert_eq!(result.mesh.graph().components().len(), 1);
    }

    #[test]
    fn ring_topology_is_used_when_configured() {
        let global = GlobalWaypoints::default();
        let assembly =
            GraphAssembly::new(AssemblyConfig::new(LocalTopology::Ring), &global, &open);
        let result = assembly.assemble(&square(Point::ORIGIN), &[]);

        assert_eq!(result.mesh.connections().edge_count(), 4);
        assert!(!result
            .mesh
            .connections()
            .contains_edge(WaypointId::new(0), WaypointId::new(2)));
    }

    #[test]
    fn pieces_seen_only_through_peers_are_linked_on_a_later_pass() {
        // A wall at x = 10 hides the far connector from the local room, but
        // the peer room straddles the wall's end.
        let wall = |from: Point, to: Point| {
            let (low, high) = (from.x().min(to.x()), from.x().max(to.x()));
            low < 10.0 && high > 10.0 && from.y().max(to.y()) < 20.0
        };
        let global = GlobalWaypoints::new(vec![Point::new(15.0, 0.0)]);
        let peer = WaypointGraph::ring(&[Point::new(5.0, 25.0), Point::new(15.0, 25.0)]);
        let assembly = GraphAssembly::new(AssemblyConfig::default(), &global, &wall);

        let result = assembly.assemble(&square(Point::ORIGIN), &[&peer]);

        assert_eq!(result.unlinked, 0);
        assert_eq!(result.mesh.graph().len(), 7);
        assert_eq!(result.mesh.graph().components().len(), 1);
    }

    #[test]
    fn unreachable_pieces_are_counted() {
        let global = GlobalWaypoints::new(vec![Point::new(50.0, 50.0)]);
        let blocked_far = |from: Point, to: Point| from.x().max(to.x()) > 20.0;
        let assembly = GraphAssembly::new(AssemblyConfig::default(), &global, &blocked_far);

        let result = assembly.assemble(&square(Point::ORIGIN), &[]);

        assert_eq!(result.unlinked, 1);
        assert_eq!(result.mesh.graph().len(), 4);
    }

    #[test]
    fn mesh_routes_between_rooms() {
        let global = GlobalWaypoints::new(vec![Point::new(3.0, 0.0)]);
        let assembly = GraphAssembly::new(AssemblyConfig::default(), &global, &open);
        let mut mesh = assembly.assemble(&square(Point::ORIGIN), &[]).mesh;

        let connector = WaypointId::new(4);
        let route = mesh.route(WaypointId::new(3), connector).expect("route");
        assert_eq!(route.first(), Some(&WaypointId::new(3)));
        assert_eq!(route.last(), Some(&connector));
        assert_eq!(mesh.position(connector), Ok(Point::new(3.0, 0.0)));
    }

    #[test]
    fn enemy_without_local_waypoints_adopts_the_global_graph() {
        let global = GlobalWaypoints::new(vec![Point::new(1.0, 1.0), Point::new(2.0, 1.0)]);
        let assembly = GraphAssembly::new(AssemblyConfig::default(), &global, &open);
        let result = assembly.assemble(&[], &[]);

        assert!(result.mesh.waypoints().is_empty());
        assert_eq!(result.mesh.graph().len(), 2);
        assert!(!result.mesh.is_empty());
    }
}
