//! axial-core: centrality engine for road-network analysis.
//!
//! A pure Rust library that maintains a weighted undirected graph of opaque
//! vertex identities and computes betweenness, closeness, and total-depth
//! centrality with a radius- and subgraph-restricted variant of Brandes'
//! algorithm, fanned out across a worker pool for multi-source runs.
//! No CAD dependencies — this crate compiles standalone.
//!
//! Designed as the analysis core behind road-network ("space syntax") and
//! facility-coverage tooling, but usable for any weighted undirected graph.

mod centrality;
mod error;
mod graph;
mod heap;

pub use centrality::{
    coverage_within_radius, run_centrality, single_source_centrality, CentralityOptions,
    CentralityResult, SourceCentrality, VertexIndex, DEFAULT_PARALLEL_THRESHOLD,
    DEFAULT_TASK_COUNT,
};
pub use error::{GraphError, GraphResult};
pub use graph::{Edge, VertexId, WeightedGraph};
pub use heap::MinPriorityQueue;
