use std::collections::HashMap;
use std::hash::Hash;

use crate::error::{GraphError, GraphResult};

/// Capability bound for caller-supplied vertex identities: hashable,
/// totally ordered, cheap to clone, and shareable across worker threads.
///
/// Blanket-implemented — any suitable type (integer ids, interned strings,
/// segment handles) is a vertex identity without further ceremony.
pub trait VertexId: Clone + Eq + Hash + Ord + Send + Sync {}

impl<T: Clone + Eq + Hash + Ord + Send + Sync> VertexId for T {}

/// An incident edge as seen from one endpoint: the far endpoint plus the
/// traversal cost (segment length, angular change, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct Edge<V> {
    pub destination: V,
    pub weight: f64,
}

/// Undirected weighted graph over opaque vertex identities.
///
/// Edges are stored in both endpoints' adjacency lists, so
/// [`outgoing_edges`](WeightedGraph::outgoing_edges) of either endpoint sees
/// the edge with the other endpoint as `destination`. Vertices enumerate in
/// insertion order — index assignment for the centrality engine and the
/// parallel partitioning depend on that order being deterministic.
///
/// Once built the graph is read-only for the duration of an analysis; the
/// only sanctioned mutation mid-lifecycle is the transient virtual-source
/// vertex used by coverage queries, which is removed again before any other
/// reader touches the graph. Callers that need concurrent coverage queries
/// clone the graph and query the copies.
#[derive(Debug, Clone)]
pub struct WeightedGraph<V> {
    order: Vec<V>,
    adjacency: HashMap<V, Vec<Edge<V>>>,
    edge_count: usize,
}

impl<V: VertexId> WeightedGraph<V> {
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            adjacency: HashMap::new(),
            edge_count: 0,
        }
    }

    /// Pre-allocate for a known vertex count.
    pub fn with_capacity(vertex_count: usize) -> Self {
        Self {
            order: Vec::with_capacity(vertex_count),
            adjacency: HashMap::with_capacity(vertex_count),
            edge_count: 0,
        }
    }

    /// Build a graph from `(u, v, weight)` triples, adding endpoints as they
    /// appear. This is the primary load path for geometry producers that
    /// emit one triple per road segment.
    pub fn from_edges<I>(edges: I) -> GraphResult<Self>
    where
        I: IntoIterator<Item = (V, V, f64)>,
    {
        let mut graph = Self::new();
        for (u, v, weight) in edges {
            graph.add_vertex(u.clone());
            graph.add_vertex(v.clone());
            graph.add_edge(&u, &v, weight)?;
        }
        Ok(graph)
    }

    /// Register a vertex. Idempotent — re-adding an existing vertex is a
    /// no-op. Returns whether the vertex was newly inserted.
    pub fn add_vertex(&mut self, vertex: V) -> bool {
        if self.adjacency.contains_key(&vertex) {
            return false;
        }
        self.order.push(vertex.clone());
        self.adjacency.insert(vertex, Vec::new());
        true
    }

    /// Remove a vertex and every edge incident to it.
    pub fn remove_vertex(&mut self, vertex: &V) -> GraphResult<()> {
        let incident = self
            .adjacency
            .remove(vertex)
            .ok_or(GraphError::VertexNotFound)?;

        for edge in &incident {
            self.edge_count -= 1;
            if &edge.destination == vertex {
                // Self-loop: stored once, already gone with the list.
                continue;
            }
            if let Some(list) = self.adjacency.get_mut(&edge.destination) {
                list.retain(|e| &e.destination != vertex);
            }
        }

        self.order.retain(|v| v != vertex);
        Ok(())
    }

    /// Add an undirected edge between two existing vertices.
    ///
    /// Fails with [`GraphError::InvalidWeight`] for a negative weight and
    /// [`GraphError::VertexNotFound`] for an absent endpoint; the graph is
    /// unmodified on either failure. Zero weights are legal. A duplicate
    /// `(u, v)` pair is ignored and reported as `Ok(false)` — parallel edges
    /// would double-count shortest paths.
    pub fn add_edge(&mut self, u: &V, v: &V, weight: f64) -> GraphResult<bool> {
        if weight < 0.0 {
            return Err(GraphError::InvalidWeight { weight });
        }
        if !self.adjacency.contains_key(u) || !self.adjacency.contains_key(v) {
            return Err(GraphError::VertexNotFound);
        }
        if self.has_edge(u, v) {
            return Ok(false);
        }

        if let Some(list) = self.adjacency.get_mut(u) {
            list.push(Edge {
                destination: v.clone(),
                weight,
            });
        }
        if u != v {
            if let Some(list) = self.adjacency.get_mut(v) {
                list.push(Edge {
                    destination: u.clone(),
                    weight,
                });
            }
        }
        self.edge_count += 1;
        Ok(true)
    }

    pub fn has_vertex(&self, vertex: &V) -> bool {
        self.adjacency.contains_key(vertex)
    }

    /// O(degree) incident-edge scan.
    pub fn has_edge(&self, u: &V, v: &V) -> bool {
        self.adjacency
            .get(u)
            .map(|list| list.iter().any(|e| &e.destination == v))
            .unwrap_or(false)
    }

    /// Edges incident to `vertex`, far endpoint exposed as `destination`.
    /// Returns an empty slice for an unknown vertex.
    pub fn outgoing_edges(&self, vertex: &V) -> &[Edge<V>] {
        self.adjacency
            .get(vertex)
            .map(|list| list.as_slice())
            .unwrap_or(&[])
    }

    /// Vertices in insertion order.
    pub fn vertices(&self) -> &[V] {
        &self.order
    }

    pub fn vertices_count(&self) -> usize {
        self.order.len()
    }

    pub fn edges_count(&self) -> usize {
        self.edge_count
    }
}

impl<V: VertexId> Default for WeightedGraph<V> {
    fn default() -> Self {
        Self::new()
    }
}
