#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Spatial reasoning and graph search used by enemy navigation.
//!
//! Everything in this crate is independent of the host world: callers hand
//! in point sets and a [`LineOfSight`](warden_core::LineOfSight) oracle and
//! receive immutable indices, graphs and routes back.

pub mod assembly;
pub mod graph;
pub mod navigator;
pub mod path;
pub mod spatial_index;

pub use assembly::{
    Assembly, AssemblyConfig, GlobalWaypoints, GraphAssembly, LocalTopology, NavigationMesh,
};
pub use graph::{LinkOutcome, Subgraph, WaypointGraph};
pub use navigator::{ClearWaypoint, ObstacleAwareNavigator, DEFAULT_MAX_ATTEMPTS};
pub use path::PathSearch;
pub use spatial_index::{Nearest, SpatialIndex};
