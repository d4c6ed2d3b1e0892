use std::collections::HashMap;

use rayon::prelude::*;
use tracing::debug;

use crate::error::{GraphError, GraphResult};
use crate::graph::{VertexId, WeightedGraph};
use crate::heap::MinPriorityQueue;

/// Number of contiguous source chunks handed to the worker pool.
pub const DEFAULT_TASK_COUNT: usize = 30;

/// Graphs below this vertex count run sequentially — the fan-out overhead
/// dominates on small networks.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 30;

/// Distances are rounded to six decimals before comparison, collapsing
/// floating-point noise that would otherwise split genuinely equal path
/// lengths into spurious near-tie branches.
fn round_distance(distance: f64) -> f64 {
    (distance * 1e6).round() / 1e6
}

/// Insertion-ordered vertex snapshot with O(1) identity → index lookup.
///
/// Built once per analysis and shared by every source run, so per-source
/// state can live in dense index-addressed arrays instead of maps.
#[derive(Debug, Clone)]
pub struct VertexIndex<V> {
    vertices: Vec<V>,
    positions: HashMap<V, usize>,
}

impl<V: VertexId> VertexIndex<V> {
    pub fn new(graph: &WeightedGraph<V>) -> Self {
        let vertices = graph.vertices().to_vec();
        let positions = vertices
            .iter()
            .cloned()
            .enumerate()
            .map(|(index, vertex)| (vertex, index))
            .collect();
        Self { vertices, positions }
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn index_of(&self, vertex: &V) -> Option<usize> {
        self.positions.get(vertex).copied()
    }

    pub fn vertex(&self, index: usize) -> &V {
        &self.vertices[index]
    }

    pub fn vertices(&self) -> &[V] {
        &self.vertices
    }
}

/// Configuration for a centrality run.
///
/// Defaults reproduce the global axial analysis: every vertex a source,
/// unbounded radius, detour filter on, raw (unnormalized) scores.
#[derive(Debug, Clone)]
pub struct CentralityOptions<V> {
    /// Maximum path distance from a source; vertices beyond it are never
    /// reached by that source. Infinite by default.
    pub radius: f64,
    /// Source vertices to run from. `None` runs every vertex.
    pub sources: Option<Vec<V>>,
    /// Per-source allow-lists, indexed by source vertex index: entry `i`
    /// restricts the traversal from source `i` to the listed vertex indices.
    /// Typically the `sub_graphs` output of a previous finite-radius run.
    /// Enables closeness scoring.
    pub sub_graphs: Option<Vec<Vec<usize>>>,
    /// Reject relaxations that close a triangle with a predecessor (see
    /// [`single_source_centrality`]). On by default for axial-line graphs;
    /// disable for textbook Brandes behavior on general graphs.
    pub detour_filter: bool,
    /// Scale betweenness by 1/((n-1)(n-2)) and closeness by (n-1) after the
    /// merge.
    pub normalize: bool,
    pub task_count: usize,
    pub parallel_threshold: usize,
}

impl<V> Default for CentralityOptions<V> {
    fn default() -> Self {
        Self {
            radius: f64::INFINITY,
            sources: None,
            sub_graphs: None,
            detour_filter: true,
            normalize: false,
            task_count: DEFAULT_TASK_COUNT,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

impl<V> CentralityOptions<V> {
    pub fn radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    pub fn sources(mut self, sources: Vec<V>) -> Self {
        self.sources = Some(sources);
        self
    }

    pub fn sub_graphs(mut self, sub_graphs: Vec<Vec<usize>>) -> Self {
        self.sub_graphs = Some(sub_graphs);
        self
    }

    pub fn detour_filter(mut self, enabled: bool) -> Self {
        self.detour_filter = enabled;
        self
    }

    pub fn normalize(mut self, enabled: bool) -> Self {
        self.normalize = enabled;
        self
    }
}

/// Output of one single-source pass. All vertex-addressed data is keyed by
/// vertex index (see [`VertexIndex`]).
#[derive(Debug, Clone)]
pub struct SourceCentrality {
    /// This source's betweenness contribution per vertex. Each unordered
    /// vertex pair contributes once: the dependency accumulated from one
    /// endpoint carries a factor of one half, its mirror run the other.
    pub betweenness: Vec<f64>,
    /// Sum of finite shortest-path distances from the source.
    pub total_depth: f64,
    /// Number of vertices with a finite distance, the source included.
    pub reach_count: usize,
    /// Reach-weighted reciprocal depth. Zero unless the run was
    /// subgraph-restricted.
    pub closeness: f64,
    /// Vertex indices in finish order (non-decreasing distance, source
    /// first). Under a finite radius this is the source's reachable
    /// subgraph.
    pub reached: Vec<usize>,
}

/// One restricted Brandes pass: Dijkstra with multiple-shortest-path
/// counting from `source`, followed by dependency back-propagation.
///
/// `allowed` confines the traversal to a vertex-index subset (the source is
/// always admitted); `radius` cuts off relaxations whose rounded distance
/// exceeds it. With `detour_filter` set, a relaxation from `u` to `w` is
/// rejected when `w` is one of `u`'s shortest-path predecessors or adjacent
/// to one — on axial-line graphs such steps double back through a triangle
/// of near-collinear segments and would inflate path counts.
///
/// A disconnected graph is not an error: unreached vertices keep an
/// infinite distance and are excluded from depth and reach count.
pub fn single_source_centrality<V: VertexId>(
    graph: &WeightedGraph<V>,
    index: &VertexIndex<V>,
    source: &V,
    radius: f64,
    allowed: Option<&[usize]>,
    detour_filter: bool,
) -> GraphResult<SourceCentrality> {
    let n = index.len();
    let source_index = index.index_of(source).ok_or(GraphError::VertexNotFound)?;

    let allowed_mask = match allowed {
        Some(list) => {
            let mut mask = vec![false; n];
            for &i in list {
                if i >= n {
                    return Err(GraphError::VertexNotFound);
                }
                mask[i] = true;
            }
            mask[source_index] = true;
            Some(mask)
        }
        None => None,
    };

    let mut distance = vec![f64::INFINITY; n];
    let mut sigma = vec![0u64; n];
    let mut delta = vec![0.0f64; n];
    let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut finished = vec![false; n];
    let mut stack: Vec<usize> = Vec::with_capacity(n);

    distance[source_index] = 0.0;
    sigma[source_index] = 1;
    let mut queue = MinPriorityQueue::with_capacity(n);
    queue.enqueue(source_index, 0.0);

    while !queue.is_empty() {
        let u = queue.dequeue_min()?;
        finished[u] = true;
        stack.push(u);

        for edge in graph.outgoing_edges(index.vertex(u)) {
            let w = match index.index_of(&edge.destination) {
                Some(w) => w,
                None => continue,
            };

            if let Some(mask) = &allowed_mask {
                if !mask[w] {
                    continue;
                }
            }
            if finished[w] {
                continue;
            }
            if detour_filter && !predecessors[u].is_empty() {
                if predecessors[u].contains(&w) {
                    continue;
                }
                if predecessors[u]
                    .iter()
                    .any(|&p| graph.has_edge(index.vertex(p), &edge.destination))
                {
                    continue;
                }
            }

            let candidate = round_distance(distance[u] + edge.weight);
            if candidate > radius {
                continue;
            }

            if candidate < distance[w] {
                distance[w] = candidate;
                sigma[w] = sigma[u];
                predecessors[w].clear();
                predecessors[w].push(u);
                if queue.contains(w) {
                    queue.update_priority(w, candidate);
                } else {
                    queue.enqueue(w, candidate);
                }
            } else if candidate == distance[w] {
                // Another shortest path to w.
                sigma[w] += sigma[u];
                predecessors[w].push(u);
            }
        }
    }

    // Snapshot the finish order before accumulation drains the stack.
    let reached = stack.clone();

    let mut betweenness = vec![0.0f64; n];
    while let Some(w) = stack.pop() {
        let coefficient = (1.0 + delta[w]) / sigma[w] as f64;
        for i in 0..predecessors[w].len() {
            let v = predecessors[w][i];
            delta[v] += sigma[v] as f64 * coefficient;
        }
        if w != source_index {
            betweenness[w] += delta[w] * 0.5;
        }
    }

    let mut total_depth = 0.0;
    let mut reach_count = 0usize;
    for &d in &distance {
        if d.is_finite() {
            total_depth += d;
            reach_count += 1;
        }
    }

    let closeness = match allowed {
        Some(list) if total_depth > 0.0 && n > 1 => {
            let scale = (list.len() as f64 - 1.0) / (n as f64 - 1.0);
            (1.0 / total_depth) * scale
        }
        _ => 0.0,
    };

    Ok(SourceCentrality {
        betweenness,
        total_depth,
        reach_count,
        closeness,
        reached,
    })
}

/// Final per-vertex maps of a multi-source run.
#[derive(Debug, Clone)]
pub struct CentralityResult<V> {
    /// Betweenness summed over all sources (self-contributions excluded).
    pub betweenness: HashMap<V, f64>,
    /// Per-source total depth, written by that source's run. Vertices that
    /// were not sources keep 0.
    pub total_depth: HashMap<V, f64>,
    /// Per-source reach count, written by that source's run.
    pub node_count: HashMap<V, f64>,
    /// Per-source closeness; populated only for subgraph-restricted runs.
    pub closeness: Option<HashMap<V, f64>>,
    /// Per-source reached vertex indices in finish order; populated only
    /// under a finite radius. Feed back as
    /// [`CentralityOptions::sub_graphs`] for a second, locally restricted
    /// pass.
    pub sub_graphs: Option<Vec<Vec<usize>>>,
}

struct SourceRecord {
    source: usize,
    total_depth: f64,
    reach_count: usize,
    closeness: f64,
    reached: Vec<usize>,
}

struct TaskPartial {
    betweenness: Vec<f64>,
    records: Vec<SourceRecord>,
}

/// Run the centrality engine over every source (or the configured subset)
/// and merge per-source results.
///
/// Validation is eager: an empty graph, an unknown source, or a subgraph
/// entry referencing a vertex outside the graph fails before any source
/// runs, leaving no partial result. At or above the parallel threshold the
/// source list is split into `task_count` contiguous chunks (the last chunk
/// absorbs the remainder); each chunk runs on the worker pool with a private
/// betweenness accumulator, and a single-threaded reduction merges the
/// partials. Betweenness totals are identical across scheduling orders up
/// to floating-point summation order.
pub fn run_centrality<V: VertexId>(
    graph: &WeightedGraph<V>,
    options: &CentralityOptions<V>,
) -> GraphResult<CentralityResult<V>> {
    if graph.vertices_count() == 0 {
        return Err(GraphError::EmptyGraph);
    }

    let index = VertexIndex::new(graph);
    let n = index.len();

    let source_indices: Vec<usize> = match &options.sources {
        Some(sources) => sources
            .iter()
            .map(|v| index.index_of(v).ok_or(GraphError::VertexNotFound))
            .collect::<GraphResult<_>>()?,
        None => (0..n).collect(),
    };

    if let Some(subs) = &options.sub_graphs {
        for &s in &source_indices {
            let allowed = subs.get(s).ok_or(GraphError::VertexNotFound)?;
            if allowed.iter().any(|&i| i >= n) {
                return Err(GraphError::VertexNotFound);
            }
        }
    }

    let track_reached = options.radius.is_finite();
    let parallel = n >= options.parallel_threshold
        && options.task_count > 0
        && source_indices.len() >= options.task_count;

    debug!(
        vertices = n,
        edges = graph.edges_count(),
        sources = source_indices.len(),
        radius = options.radius,
        parallel,
        "centrality run started"
    );

    let mut betweenness = vec![0.0f64; n];
    let mut total_depth = vec![0.0f64; n];
    let mut node_count = vec![0.0f64; n];
    let mut closeness = vec![0.0f64; n];
    let mut sub_graphs_out: Option<Vec<Vec<usize>>> =
        track_reached.then(|| vec![Vec::new(); n]);

    if parallel {
        let chunk = source_indices.len() / options.task_count;
        let mut chunks: Vec<&[usize]> = Vec::with_capacity(options.task_count);
        for task in 0..options.task_count {
            let start = task * chunk;
            let end = if task == options.task_count - 1 {
                source_indices.len()
            } else {
                start + chunk
            };
            chunks.push(&source_indices[start..end]);
        }
        debug!(tasks = chunks.len(), chunk_size = chunk, "parallel fan-out");

        let partials: Vec<GraphResult<TaskPartial>> = chunks
            .into_par_iter()
            .map(|sources| {
                let mut partial = TaskPartial {
                    betweenness: vec![0.0; n],
                    records: Vec::with_capacity(sources.len()),
                };
                for &s in sources {
                    let run = single_source_centrality(
                        graph,
                        &index,
                        index.vertex(s),
                        options.radius,
                        per_source_allowed(options, s),
                        options.detour_filter,
                    )?;
                    for (acc, value) in partial.betweenness.iter_mut().zip(&run.betweenness) {
                        *acc += value;
                    }
                    partial.records.push(SourceRecord {
                        source: s,
                        total_depth: run.total_depth,
                        reach_count: run.reach_count,
                        closeness: run.closeness,
                        reached: run.reached,
                    });
                }
                Ok(partial)
            })
            .collect();

        // Single-threaded reduction: betweenness sums are commutative, and
        // chunk disjointness gives every per-source slot exactly one writer.
        for partial in partials {
            let partial = partial?;
            for (acc, value) in betweenness.iter_mut().zip(&partial.betweenness) {
                *acc += value;
            }
            for record in partial.records {
                total_depth[record.source] = record.total_depth;
                node_count[record.source] = record.reach_count as f64;
                closeness[record.source] = record.closeness;
                if let Some(out) = &mut sub_graphs_out {
                    out[record.source] = record.reached;
                }
            }
        }
    } else {
        for &s in &source_indices {
            let run = single_source_centrality(
                graph,
                &index,
                index.vertex(s),
                options.radius,
                per_source_allowed(options, s),
                options.detour_filter,
            )?;
            for (acc, value) in betweenness.iter_mut().zip(&run.betweenness) {
                *acc += value;
            }
            total_depth[s] = run.total_depth;
            node_count[s] = run.reach_count as f64;
            closeness[s] = run.closeness;
            if let Some(out) = &mut sub_graphs_out {
                out[s] = run.reached;
            }
        }
    }

    if options.normalize {
        let nf = n as f64;
        if n > 2 {
            let scale = 1.0 / ((nf - 1.0) * (nf - 2.0));
            for value in betweenness.iter_mut() {
                *value *= scale;
            }
        }
        if n > 1 {
            for value in closeness.iter_mut() {
                *value *= nf - 1.0;
            }
        }
    }

    debug!(sources = source_indices.len(), "centrality run complete");

    let to_map = |values: &[f64]| -> HashMap<V, f64> {
        index
            .vertices()
            .iter()
            .cloned()
            .zip(values.iter().copied())
            .collect()
    };

    Ok(CentralityResult {
        betweenness: to_map(&betweenness),
        total_depth: to_map(&total_depth),
        node_count: to_map(&node_count),
        closeness: options.sub_graphs.is_some().then(|| to_map(&closeness)),
        sub_graphs: sub_graphs_out,
    })
}

fn per_source_allowed<V>(options: &CentralityOptions<V>, source: usize) -> Option<&[usize]> {
    options
        .sub_graphs
        .as_ref()
        .map(|subs| subs[source].as_slice())
}

/// Facility-coverage query: which vertices lie within `radius` of a site.
///
/// Joins a synthetic `virtual_source` vertex to the site's entry vertices
/// with the given connection weights, runs one radius-limited pass, then
/// removes the synthetic vertex again — the graph is restored before this
/// returns, on the error paths included. The returned vertices exclude the
/// synthetic source.
///
/// `virtual_source` must not collide with an existing vertex. The protocol
/// mutates the graph, so it takes exclusive access; run concurrent coverage
/// queries against independent clones.
pub fn coverage_within_radius<V: VertexId>(
    graph: &mut WeightedGraph<V>,
    virtual_source: V,
    entries: &[(V, f64)],
    radius: f64,
) -> GraphResult<Vec<V>> {
    debug_assert!(
        !graph.has_vertex(&virtual_source),
        "virtual source collides with an existing vertex"
    );
    graph.add_vertex(virtual_source.clone());

    for (entry, weight) in entries {
        if let Err(error) = graph.add_edge(&virtual_source, entry, *weight) {
            graph.remove_vertex(&virtual_source)?;
            return Err(error);
        }
    }

    let index = VertexIndex::new(graph);
    let source_index = index.index_of(&virtual_source);
    let outcome = single_source_centrality(graph, &index, &virtual_source, radius, None, true);

    let result = outcome.map(|run| {
        run.reached
            .iter()
            .filter(|&&i| Some(i) != source_index)
            .map(|&i| index.vertex(i).clone())
            .collect()
    });

    graph.remove_vertex(&virtual_source)?;
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path_graph(n: u32) -> WeightedGraph<u32> {
        let mut g = WeightedGraph::new();
        for i in 0..n {
            g.add_vertex(i);
        }
        for i in 0..n - 1 {
            g.add_edge(&i, &(i + 1), 1.0).unwrap();
        }
        g
    }

    fn ring_graph(n: u32) -> WeightedGraph<u32> {
        let mut g = WeightedGraph::new();
        for i in 0..n {
            g.add_vertex(i);
        }
        for i in 0..n {
            g.add_edge(&i, &((i + 1) % n), 1.0).unwrap();
        }
        g
    }

    /// Triangle where the long side equals the two short sides combined, so
    /// textbook counting sees two equal-length routes between its endpoints.
    fn flat_triangle() -> WeightedGraph<u32> {
        let mut g = WeightedGraph::new();
        for i in 0..3u32 {
            g.add_vertex(i);
        }
        g.add_edge(&0, &1, 1.0).unwrap();
        g.add_edge(&1, &2, 1.0).unwrap();
        g.add_edge(&0, &2, 2.0).unwrap();
        g
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    // --- Single-source tests ---

    #[test]
    fn test_path_graph_brandes_sanity() {
        let g = path_graph(4);
        let result = run_centrality(&g, &CentralityOptions::default()).unwrap();
        assert_close(result.betweenness[&0], 0.0);
        assert_close(result.betweenness[&1], 2.0);
        assert_close(result.betweenness[&2], 2.0);
        assert_close(result.betweenness[&3], 0.0);
    }

    #[test]
    fn test_ring_betweenness_symmetric() {
        for n in [3u32, 5, 8] {
            let g = ring_graph(n);
            let result = run_centrality(&g, &CentralityOptions::default()).unwrap();
            let reference = result.betweenness[&0];
            for v in 1..n {
                assert_close(result.betweenness[&v], reference);
            }
        }
    }

    #[test]
    fn test_detour_filter_suppresses_triangle_paths() {
        let g = flat_triangle();

        let filtered = run_centrality(&g, &CentralityOptions::default()).unwrap();
        assert_close(filtered.betweenness[&1], 0.0);

        let textbook =
            run_centrality(&g, &CentralityOptions::default().detour_filter(false)).unwrap();
        assert_close(textbook.betweenness[&1], 0.5);
    }

    #[test]
    fn test_total_depth_and_reach() {
        let g = path_graph(4);
        let result = run_centrality(&g, &CentralityOptions::default()).unwrap();
        assert_close(result.total_depth[&0], 6.0); // 1 + 2 + 3
        assert_close(result.total_depth[&1], 4.0); // 1 + 1 + 2
        assert_close(result.node_count[&0], 4.0);
        assert!(result.closeness.is_none());
        assert!(result.sub_graphs.is_none());
    }

    #[test]
    fn test_radius_cutoff_inclusive() {
        let g = path_graph(6);
        let index = VertexIndex::new(&g);
        let run = single_source_centrality(&g, &index, &0, 2.0, None, true).unwrap();
        // Distance exactly equal to the radius is still within it.
        assert_eq!(run.reached, vec![0, 1, 2]);
        assert_close(run.total_depth, 3.0);
        assert_eq!(run.reach_count, 3);
    }

    #[test]
    fn test_radius_monotonic_reach() {
        let g = path_graph(8);
        let index = VertexIndex::new(&g);
        let mut previous: Vec<usize> = Vec::new();
        for radius in [1.0, 3.0, 5.0, f64::INFINITY] {
            let run = single_source_centrality(&g, &index, &0, radius, None, true).unwrap();
            assert!(
                previous.iter().all(|i| run.reached.contains(i)),
                "radius {radius} lost vertices reached at a smaller radius"
            );
            previous = run.reached;
        }
    }

    #[test]
    fn test_finite_radius_records_sub_graphs() {
        let g = path_graph(5);
        let result =
            run_centrality(&g, &CentralityOptions::default().radius(2.0)).unwrap();
        let subs = result.sub_graphs.unwrap();
        assert_eq!(subs[0], vec![0, 1, 2]);
        assert_eq!(subs[2], vec![2, 1, 3, 0, 4]);
    }

    #[test]
    fn test_subgraph_restriction_limits_reach() {
        let g = path_graph(4);
        let index = VertexIndex::new(&g);
        let run = single_source_centrality(&g, &index, &0, f64::INFINITY, Some(&[0, 1]), true)
            .unwrap();
        assert_eq!(run.reached, vec![0, 1]);
        assert_close(run.total_depth, 1.0);
        // (1 / depth) * (|S|-1)/(n-1) = 1 * 1/3
        assert_close(run.closeness, 1.0 / 3.0);
    }

    #[test]
    fn test_subgraph_second_pass_closeness() {
        let g = path_graph(3);
        let everywhere = vec![vec![0, 1, 2]; 3];
        let result =
            run_centrality(&g, &CentralityOptions::default().sub_graphs(everywhere)).unwrap();
        let closeness = result.closeness.unwrap();
        assert_close(closeness[&0], 1.0 / 3.0);
        assert_close(closeness[&1], 1.0 / 2.0);
        assert_close(closeness[&2], 1.0 / 3.0);
    }

    #[test]
    fn test_two_pass_local_analysis() {
        // Pass 1 collects radius-limited clusters, pass 2 scores inside them.
        // Chain 0-1-2-3 with a long final segment that falls outside the
        // radius, isolating vertex 3.
        let mut g = WeightedGraph::new();
        for i in 0..4u32 {
            g.add_vertex(i);
        }
        g.add_edge(&0, &1, 1.0).unwrap();
        g.add_edge(&1, &2, 1.0).unwrap();
        g.add_edge(&2, &3, 10.0).unwrap();

        let first = run_centrality(&g, &CentralityOptions::default().radius(2.0)).unwrap();
        let clusters = first.sub_graphs.unwrap();
        assert_eq!(clusters[3], vec![3]);

        let second =
            run_centrality(&g, &CentralityOptions::default().sub_graphs(clusters)).unwrap();
        let closeness = second.closeness.unwrap();
        // Vertex 1 reaches its whole cluster in one step each way.
        assert_close(closeness[&1], (1.0 / 2.0) * (2.0 / 3.0));
        assert_close(closeness[&0], (1.0 / 3.0) * (2.0 / 3.0));
        assert!(closeness[&1] > closeness[&0]);
        // An isolated cluster has zero depth, so closeness stays zero.
        assert_close(closeness[&3], 0.0);
    }

    #[test]
    fn test_normalization() {
        let g = path_graph(4);
        let result =
            run_centrality(&g, &CentralityOptions::default().normalize(true)).unwrap();
        // 2 / ((4-1) * (4-2))
        assert_close(result.betweenness[&1], 2.0 / 6.0);

        let g = path_graph(3);
        let everywhere = vec![vec![0, 1, 2]; 3];
        let result = run_centrality(
            &g,
            &CentralityOptions::default()
                .sub_graphs(everywhere)
                .normalize(true),
        )
        .unwrap();
        let closeness = result.closeness.unwrap();
        assert_close(closeness[&1], 1.0); // (1/2) * (3-1)
    }

    #[test]
    fn test_normalize_tiny_graph_no_panic() {
        let mut g = WeightedGraph::new();
        g.add_vertex(0u32);
        let result =
            run_centrality(&g, &CentralityOptions::default().normalize(true)).unwrap();
        assert_close(result.betweenness[&0], 0.0);
        assert_close(result.node_count[&0], 1.0);
    }

    #[test]
    fn test_disconnected_components_not_an_error() {
        let mut g = WeightedGraph::new();
        for i in 0..4u32 {
            g.add_vertex(i);
        }
        g.add_edge(&0, &1, 1.0).unwrap();
        g.add_edge(&2, &3, 1.0).unwrap();
        let result = run_centrality(&g, &CentralityOptions::default()).unwrap();
        assert_close(result.node_count[&0], 2.0);
        assert_close(result.total_depth[&0], 1.0);
        assert_close(result.betweenness[&0], 0.0);
    }

    #[test]
    fn test_zero_weight_edge_traversed() {
        let mut g = WeightedGraph::new();
        for i in 0..3u32 {
            g.add_vertex(i);
        }
        g.add_edge(&0, &1, 0.0).unwrap();
        g.add_edge(&1, &2, 1.0).unwrap();
        let index = VertexIndex::new(&g);
        let run = single_source_centrality(&g, &index, &0, f64::INFINITY, None, true).unwrap();
        assert_eq!(run.reach_count, 3);
        assert_close(run.total_depth, 1.0);
    }

    #[test]
    fn test_restricted_source_set() {
        let g = path_graph(3);
        let result =
            run_centrality(&g, &CentralityOptions::default().sources(vec![0])).unwrap();
        assert_close(result.total_depth[&0], 3.0);
        assert_close(result.node_count[&0], 3.0);
        // Non-sources keep their zero initialization.
        assert_close(result.total_depth[&1], 0.0);
        assert_close(result.node_count[&1], 0.0);
    }

    // --- Error paths ---

    #[test]
    fn test_empty_graph_fails() {
        let g: WeightedGraph<u32> = WeightedGraph::new();
        assert_eq!(
            run_centrality(&g, &CentralityOptions::default()).unwrap_err(),
            GraphError::EmptyGraph
        );
    }

    #[test]
    fn test_unknown_source_fails() {
        let g = path_graph(3);
        assert_eq!(
            run_centrality(&g, &CentralityOptions::default().sources(vec![99])).unwrap_err(),
            GraphError::VertexNotFound
        );
    }

    #[test]
    fn test_unknown_single_source_fails() {
        let g = path_graph(3);
        let index = VertexIndex::new(&g);
        assert_eq!(
            single_source_centrality(&g, &index, &99, f64::INFINITY, None, true).unwrap_err(),
            GraphError::VertexNotFound
        );
    }

    #[test]
    fn test_subgraph_index_out_of_range_fails() {
        let g = path_graph(3);
        let bad = vec![vec![0, 99], vec![1], vec![2]];
        assert_eq!(
            run_centrality(&g, &CentralityOptions::default().sub_graphs(bad)).unwrap_err(),
            GraphError::VertexNotFound
        );
    }

    #[test]
    fn test_short_subgraph_table_fails() {
        let g = path_graph(3);
        let short = vec![vec![0], vec![1]];
        assert_eq!(
            run_centrality(&g, &CentralityOptions::default().sub_graphs(short)).unwrap_err(),
            GraphError::VertexNotFound
        );
    }

    // --- Parallel aggregation ---

    fn chorded_ring(n: u32) -> WeightedGraph<u32> {
        let mut g = ring_graph(n);
        for i in (0..n).step_by(5) {
            g.add_edge(&i, &((i + n / 2) % n), 2.5).unwrap();
        }
        g
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let g = chorded_ring(40);

        let mut sequential_options = CentralityOptions::default();
        sequential_options.parallel_threshold = usize::MAX;
        let sequential = run_centrality(&g, &sequential_options).unwrap();

        let parallel = run_centrality(&g, &CentralityOptions::default()).unwrap();

        for v in 0..40u32 {
            let difference =
                (sequential.betweenness[&v] - parallel.betweenness[&v]).abs();
            assert!(
                difference < 1e-6,
                "betweenness diverged at {v}: {difference}"
            );
            assert_eq!(sequential.total_depth[&v], parallel.total_depth[&v]);
            assert_eq!(sequential.node_count[&v], parallel.node_count[&v]);
        }
    }

    #[test]
    fn test_parallel_matches_sequential_with_radius() {
        let g = chorded_ring(35);

        let mut sequential_options = CentralityOptions::default().radius(4.0);
        sequential_options.parallel_threshold = usize::MAX;
        let sequential = run_centrality(&g, &sequential_options).unwrap();

        let parallel = run_centrality(&g, &CentralityOptions::default().radius(4.0)).unwrap();

        assert_eq!(sequential.sub_graphs, parallel.sub_graphs);
        for v in 0..35u32 {
            assert!((sequential.betweenness[&v] - parallel.betweenness[&v]).abs() < 1e-6);
        }
    }

    #[test]
    fn test_rerun_is_idempotent() {
        let g = chorded_ring(12);
        let first = run_centrality(&g, &CentralityOptions::default()).unwrap();
        let second = run_centrality(&g, &CentralityOptions::default()).unwrap();
        for v in 0..12u32 {
            assert_close(first.betweenness[&v], second.betweenness[&v]);
            assert_close(first.total_depth[&v], second.total_depth[&v]);
        }
    }

    // --- Coverage queries ---

    #[test]
    fn test_coverage_within_radius() {
        let mut g = WeightedGraph::new();
        for name in ["n0", "n1", "n2", "n3"] {
            g.add_vertex(name);
        }
        g.add_edge(&"n0", &"n1", 1.0).unwrap();
        g.add_edge(&"n1", &"n2", 1.0).unwrap();
        g.add_edge(&"n2", &"n3", 1.0).unwrap();

        let vertices_before = g.vertices_count();
        let edges_before = g.edges_count();

        let reached =
            coverage_within_radius(&mut g, "site", &[("n1", 0.5)], 1.5).unwrap();
        assert!(reached.contains(&"n0"));
        assert!(reached.contains(&"n1"));
        assert!(reached.contains(&"n2"));
        assert!(!reached.contains(&"n3"));
        assert!(!reached.contains(&"site"));

        // The protocol leaves no trace.
        assert_eq!(g.vertices_count(), vertices_before);
        assert_eq!(g.edges_count(), edges_before);
        assert!(!g.has_vertex(&"site"));
    }

    #[test]
    fn test_coverage_restores_graph_on_error() {
        let mut g = WeightedGraph::new();
        g.add_vertex("n0");

        let result = coverage_within_radius(&mut g, "site", &[("missing", 1.0)], 5.0);
        assert_eq!(result.unwrap_err(), GraphError::VertexNotFound);
        assert_eq!(g.vertices_count(), 1);
        assert!(!g.has_vertex(&"site"));
    }

    #[test]
    fn test_coverage_multiple_entries() {
        // Two entries on opposite ends of a chain; coverage reaches inward
        // from both.
        let mut g = path_graph(7);
        let reached = coverage_within_radius(&mut g, 100u32, &[(0, 0.0), (6, 0.0)], 2.0).unwrap();
        assert!(reached.contains(&0));
        assert!(reached.contains(&2));
        assert!(reached.contains(&6));
        assert!(reached.contains(&4));
        assert!(!reached.contains(&3));
    }
}
