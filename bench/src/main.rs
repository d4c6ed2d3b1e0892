use std::time::Instant;

use axial_core::{run_centrality, CentralityOptions, WeightedGraph};

fn main() {
    let args: Vec<String> = std::env::args().collect();

    let mode = args.get(1).map(|s| s.as_str()).unwrap_or("all");
    let node_count: u32 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(1_000);

    if mode == "help" || mode == "--help" {
        println!("Usage: axial-bench [mode] [node_count]");
        println!();
        println!("Modes:");
        println!("  all      Run all generators and benchmark each (default)");
        println!("  ring     Ring road with cross-town chords");
        println!("  grid     Orthogonal street grid");
        println!("  organic  Random segment lengths on a grown network");
        println!();
        println!("Default node_count: 1000");
        return;
    }

    println!("axial-bench");
    println!("===========");
    println!();

    let generators: Vec<(&str, fn(u32) -> WeightedGraph<u32>)> = match mode {
        "ring" => vec![("Ring + chords", gen_ring)],
        "grid" => vec![("Street grid", gen_grid)],
        "organic" => vec![("Organic growth", gen_organic)],
        "all" => vec![
            ("Ring + chords", gen_ring as fn(u32) -> WeightedGraph<u32>),
            ("Street grid", gen_grid),
            ("Organic growth", gen_organic),
        ],
        _ => {
            eprintln!("Unknown mode: {}. Use --help for options.", mode);
            return;
        }
    };

    for (name, generator) in generators {
        run_benchmark(name, generator, node_count);
    }
}

fn run_benchmark(name: &str, generator: fn(u32) -> WeightedGraph<u32>, node_count: u32) {
    println!("--- {} ---", name);
    println!("Target: {} vertices", node_count);

    let t = Instant::now();
    let graph = generator(node_count);
    let gen_time = t.elapsed();
    println!(
        "Generated in {:.2}s — {} vertices, {} edges",
        gen_time.as_secs_f64(),
        graph.vertices_count(),
        graph.edges_count()
    );

    println!();
    println!("{:>12} {:>10} {:>12}", "variant", "radius", "time");
    println!("{:->12} {:->10} {:->12}", "", "", "");

    let variants: [(&str, CentralityOptions<u32>); 4] = [
        ("global", CentralityOptions::default()),
        ("local", CentralityOptions::default().radius(25.0)),
        ("textbook", CentralityOptions::default().detour_filter(false)),
        ("sequential", {
            let mut options = CentralityOptions::default();
            options.parallel_threshold = usize::MAX;
            options
        }),
    ];

    for (label, options) in variants {
        let t = Instant::now();
        let result = run_centrality(&graph, &options).expect("benchmark graph is valid");
        let elapsed = t.elapsed();
        let radius = if options.radius.is_finite() {
            format!("{:.0}", options.radius)
        } else {
            "inf".to_string()
        };
        println!(
            "{:>12} {:>10} {:>10.1}ms",
            label,
            radius,
            elapsed.as_secs_f64() * 1000.0
        );
        // Keep the result alive so the computation isn't optimized away.
        assert_eq!(result.betweenness.len(), graph.vertices_count());
    }
    println!();
}

// ---------------------------------------------------------------------------
// Generators — deterministic, road-network-shaped topologies
// ---------------------------------------------------------------------------

/// Simple LCG for deterministic, fast pseudo-random numbers.
struct FastRng(u64);

impl FastRng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next(&mut self, max: u64) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.0 >> 33) % max
    }
    fn next_f64(&mut self) -> f64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }
}

/// Ring road with random cross-town chords: high-betweenness shortcuts
/// through an otherwise uniform loop.
fn gen_ring(node_count: u32) -> WeightedGraph<u32> {
    let mut graph = WeightedGraph::with_capacity(node_count as usize);
    let mut rng = FastRng::new(42);

    for i in 0..node_count {
        graph.add_vertex(i);
    }
    for i in 0..node_count {
        let weight = 5.0 + rng.next_f64() * 10.0;
        let _ = graph.add_edge(&i, &((i + 1) % node_count), weight);
    }
    // One chord per ~10 vertices
    for _ in 0..node_count / 10 {
        let a = rng.next(node_count as u64) as u32;
        let b = rng.next(node_count as u64) as u32;
        if a != b {
            let weight = 20.0 + rng.next_f64() * 30.0;
            let _ = graph.add_edge(&a, &b, weight);
        }
    }
    graph
}

/// Orthogonal street grid: √n × √n lattice with slightly uneven block
/// lengths. The densest shortest-path tie structure of the three.
fn gen_grid(node_count: u32) -> WeightedGraph<u32> {
    let side = (node_count as f64).sqrt() as u32;
    let mut graph = WeightedGraph::with_capacity((side * side) as usize);
    let mut rng = FastRng::new(12345);

    for i in 0..side * side {
        graph.add_vertex(i);
    }
    for row in 0..side {
        for col in 0..side {
            let id = row * side + col;
            let weight = 9.0 + rng.next_f64() * 2.0;
            if col + 1 < side {
                let _ = graph.add_edge(&id, &(id + 1), weight);
            }
            if row + 1 < side {
                let _ = graph.add_edge(&id, &(id + side), weight);
            }
        }
    }
    graph
}

/// Organic growth: each new vertex attaches to a random earlier one, with
/// occasional loop-forming extra segments. Produces the winding, branchy
/// topology of unplanned street networks.
fn gen_organic(node_count: u32) -> WeightedGraph<u32> {
    let mut graph = WeightedGraph::with_capacity(node_count as usize);
    let mut rng = FastRng::new(77777);

    graph.add_vertex(0);
    for i in 1..node_count {
        graph.add_vertex(i);
        let attach = rng.next(i as u64) as u32;
        let weight = 3.0 + rng.next_f64() * 12.0;
        let _ = graph.add_edge(&i, &attach, weight);

        // 15% chance of a second segment closing a loop
        if rng.next(100) < 15 && i > 1 {
            let other = rng.next(i as u64) as u32;
            if other != attach {
                let weight = 3.0 + rng.next_f64() * 12.0;
                let _ = graph.add_edge(&i, &other, weight);
            }
        }
    }
    graph
}
