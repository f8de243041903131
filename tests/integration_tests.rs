//! Integration tests for relax-bench
//!
//! Runs the driver pipeline end to end: graph file → CSR → measured kernel → summary

use relax_bench::engine::Executor;
use relax_bench::kernels::cc::{label_propagation_with_state, union_find_components, CcState};
use relax_bench::kernels::pagerank::{pagerank_with_state, PrState};
use relax_bench::kernels::sssp::{delta_step_with_state, SsspState};
use relax_bench::kernels::{dijkstra, PrConfig, SsspConfig, INFINITY};
use relax_bench::perf::Measurement;
use relax_bench::report::{BenchmarkRecord, CcSummary, PrSummary, SsspSummary, Summary};
use relax_bench::storage::{
    load_graph, parse_snap, read_adjacency, to_adjacency_string, write_adjacency, GraphFormat,
};
use relax_bench::{CsrGraph, NodeId};
use serial_test::serial;
use tempfile::tempdir;

/// Two weighted triangles joined by a one-way bridge 2 → 3, plus an isolated vertex 6
fn bridged_triangles() -> CsrGraph {
    let edges = [
        (0, 1, 4),
        (1, 2, 1),
        (2, 0, 2),
        (0, 2, 7),
        (2, 3, 10),
        (3, 4, 1),
        (4, 5, 1),
        (5, 3, 1),
    ];
    let edges: Vec<_> = edges
        .iter()
        .map(|&(s, d, w)| (NodeId(s), NodeId(d), w))
        .collect();
    CsrGraph::from_edge_list_with_nodes(7, &edges).unwrap()
}

#[tokio::test]
async fn test_adjacency_file_to_sssp() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bridged.adj");
    let graph = bridged_triangles();

    write_adjacency(&graph, &path, true).await.unwrap();
    let loaded = load_graph(&path, GraphFormat::from_path(&path)).await.unwrap();
    assert_eq!(loaded, graph);

    let exec = Executor::new(2).unwrap();
    let config = SsspConfig::new(0).with_shift(2);
    let mut state = SsspState::new(loaded.num_nodes());
    state.reset(0);
    let stats = delta_step_with_state(&exec, &loaded, &config, &state).unwrap();
    let distances = state.into_distances();

    assert_eq!(distances, vec![0, 4, 5, 15, 16, 17, INFINITY]);
    assert_eq!(distances, dijkstra(&loaded, 0));
    assert!(stats.relaxations >= 5);

    let summary = SsspSummary::from_distances(&distances);
    assert_eq!(summary.max_distance, 17);
    assert_eq!(summary.reachable, 6);
}

#[test]
fn test_cc_on_symmetrized_input() {
    let graph = bridged_triangles();
    assert!(!graph.is_symmetric());
    let sym = graph.symmetrized().unwrap();

    let exec = Executor::new(4).unwrap();
    let state = CcState::new(sym.num_nodes());
    let rounds = label_propagation_with_state(&exec, &sym, &state);
    let labels = state.labels();

    // bridge joins both triangles; vertex 6 stays alone
    assert_eq!(labels, vec![0, 0, 0, 0, 0, 0, 6]);
    assert_eq!(labels, union_find_components(&graph));
    assert!(rounds >= 2);

    let summary = CcSummary::from_labels(&labels);
    assert_eq!(summary.components, 2);
    assert_eq!(summary.largest, 6);
}

#[test]
fn test_two_triangles_scenario() {
    let snap = "# two triangles\n0 1\n1 2\n2 0\n3 4\n4 5\n5 3\n";
    let graph = parse_snap(snap).unwrap().symmetrized().unwrap();

    let exec = Executor::new(2).unwrap();
    let state = CcState::new(graph.num_nodes());
    label_propagation_with_state(&exec, &graph, &state);

    let mut distinct = state.labels();
    distinct.sort_unstable();
    distinct.dedup();
    assert_eq!(distinct, vec![0, 3]);
}

#[test]
fn test_pagerank_with_dangling_vertices() {
    let graph = bridged_triangles();
    let exec = Executor::new(3).unwrap();
    let mut state = PrState::new(graph.num_nodes());

    let active = pagerank_with_state(&exec, &graph, &PrConfig::default(), &mut state);
    assert!(!active.is_empty() && active.len() <= 10);

    let ranks = state.ranks();
    let summary = PrSummary::from_ranks(&ranks);
    assert!((summary.rank_sum - 1.0).abs() < 1e-5);
    // the isolated vertex only receives teleport and dangling mass
    assert!(ranks[6] < ranks[3]);
}

#[tokio::test]
async fn test_snap_to_adjacency_conversion() {
    let dir = tempdir().unwrap();
    let snap_path = dir.path().join("edges.txt");
    let adj_path = dir.path().join("edges.adj");
    tokio::fs::write(&snap_path, "# FromNodeId ToNodeId\n2 0\n0 2\n0 1\n")
        .await
        .unwrap();

    let graph = load_graph(&snap_path, GraphFormat::Snap).await.unwrap();
    write_adjacency(&graph, &adj_path, true).await.unwrap();

    let text = tokio::fs::read_to_string(&adj_path).await.unwrap();
    assert_eq!(text, to_adjacency_string(&graph, true));
    assert!(text.starts_with("WeightedAdjacencyGraph\n3\n3\n0\n2\n2\n1\n2\n0\n"));

    let back = read_adjacency(&adj_path).await.unwrap();
    assert_eq!(back.neighbors(0), &[1, 2]);
    assert_eq!(back.neighbors(2), &[0]);
}

#[tokio::test]
#[serial]
async fn test_measured_run_produces_record() {
    let dir = tempdir().unwrap();
    let record_path = dir.path().join("runs.jsonl");
    let graph = bridged_triangles();

    // Counters before the pool, as the drivers do
    let mut measurement = Measurement::with_counters(true);
    let exec = Executor::new(2).unwrap();
    let config = SsspConfig::new(0);
    let mut state = SsspState::new(graph.num_nodes());
    state.reset(0);

    let (stats, sample) =
        measurement.measure(|| delta_step_with_state(&exec, &graph, &config, &state));
    stats.unwrap();
    assert!(sample.readings.len() <= measurement.counters().len());

    let record = BenchmarkRecord::new(
        "sssp",
        &dir.path().join("bridged.adj"),
        (graph.num_nodes(), graph.num_edges()),
        exec.threads(),
        &sample,
        Summary::Sssp(SsspSummary::from_distances(&state.to_vec())),
    )
    .with_param("source", 0);
    record.append_jsonl(&record_path).await.unwrap();

    let text = tokio::fs::read_to_string(&record_path).await.unwrap();
    let back: BenchmarkRecord = serde_json::from_str(text.trim_end()).unwrap();
    assert_eq!(back.benchmark, "sssp");
    assert_eq!(back.threads, 2);
    assert_eq!(back.params["source"], 0);
    assert!(matches!(back.summary, Summary::Sssp(s) if s.reachable == 6));
}
