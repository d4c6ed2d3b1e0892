use thiserror::Error;

/// Errors surfaced by graph construction and centrality runs.
///
/// All variants are detected eagerly — at edge insertion or at run entry —
/// and propagated to the caller. Numeric edge cases (disconnected vertices,
/// zero-weight edges, equal-distance ties) are handled by the traversal
/// policy and never produce an error.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum GraphError {
    /// Edge insertion with a negative weight. The graph is left unmodified.
    #[error("invalid edge weight {weight}: must be non-negative")]
    InvalidWeight { weight: f64 },

    /// A vertex referenced by a query — a source, an edge endpoint, or an
    /// entry in a subgraph restriction — is not part of the graph.
    #[error("vertex not found in graph")]
    VertexNotFound,

    /// The operation requires a graph with at least one vertex.
    #[error("graph has no vertices")]
    EmptyGraph,

    /// Dequeue from an empty priority queue.
    #[error("priority queue is empty")]
    EmptyQueue,
}

pub type GraphResult<T> = Result<T, GraphError>;
