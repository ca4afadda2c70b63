// Tests for graph export functionality

use taxograph_core::export::{save_graph, NodeJson};
use taxograph_core::graph::{EdgeKind, NodeKind, TopicGraph, TopicNode};
use taxograph_core::GraphJson;
use taxograph_scraper::LabelSet;

// ============================================================================
// Helpers
// ============================================================================

fn labeled(id: &str, kind: NodeKind, cluster: &str, label_en: &str) -> TopicNode {
    let mut labels = LabelSet::default();
    labels.en = Some(label_en.to_string());
    TopicNode {
        id: id.to_string(),
        kind,
        cluster: Some(cluster.to_string()),
        url: format!("http://metadata.un.org/thesaurus/{}", id),
        labels,
    }
}

fn sample_graph() -> TopicGraph {
    let mut graph = TopicGraph::new();
    graph.add_node(labeled(
        "01",
        NodeKind::MetaTopic,
        "01",
        "POLITICAL AND LEGAL QUESTIONS",
    ));
    graph.add_node(labeled("010100", NodeKind::Topic, "01", "Political conditions"));
    graph.add_node(labeled(
        "010101",
        NodeKind::Subtopic,
        "01",
        "Peacekeeping operations",
    ));
    graph.add_edge("01", "010100", EdgeKind::MetaToTopic);
    graph.add_edge("010100", "010101", EdgeKind::TopicToSubtopic);
    graph.add_edge("010100", "01", EdgeKind::NodeToCluster);
    graph.add_edge("010101", "01", EdgeKind::NodeToCluster);
    graph.register_cluster(
        "01".to_string(),
        "#f44336".to_string(),
        "POLITICAL AND LEGAL QUESTIONS".to_string(),
    );
    graph
}

fn find_node<'a>(exported: &'a GraphJson, key: &str) -> &'a NodeJson {
    exported
        .nodes
        .iter()
        .find(|node| node.key == key)
        .unwrap_or_else(|| panic!("exported graph has no node {}", key))
}

// ============================================================================
// Shape
// ============================================================================

#[test]
fn test_to_json_counts_match_the_graph() {
    let graph = sample_graph();
    let exported = graph.to_json();

    assert_eq!(exported.nodes.len(), graph.node_count());
    assert_eq!(exported.edges.len(), graph.edge_count());
    assert_eq!(exported.clusters.len(), 1);
    assert_eq!(exported.tags.len(), 1);
}

#[test]
fn test_exported_node_carries_concept_attributes() {
    let exported = sample_graph().to_json();
    let node = find_node(&exported, "010101");

    assert_eq!(node.node_type, "subtopic");
    assert_eq!(node.tag, "Concept");
    assert_eq!(node.cluster.as_deref(), Some("01"));
    assert_eq!(node.url, "http://metadata.un.org/thesaurus/010101");
    assert_eq!(node.label_en.as_deref(), Some("Peacekeeping operations"));
    assert_eq!(node.label_fr, None);
    assert!(node.score > 0.0);
}

#[test]
fn test_coordinates_stay_within_layout_bounds() {
    let exported = sample_graph().to_json();

    for node in &exported.nodes {
        assert!((-500.0..500.0).contains(&node.x), "x for {}", node.key);
        assert!((-500.0..500.0).contains(&node.y), "y for {}", node.key);
    }
}

#[test]
fn test_tags_table_is_the_single_concept_tag() {
    let exported = sample_graph().to_json();

    assert_eq!(exported.tags.len(), 1);
    assert_eq!(exported.tags[0].key, "Concept");
    assert_eq!(exported.tags[0].image, "concept.svg");
}

#[test]
fn test_serialized_field_names() {
    let value = serde_json::to_value(sample_graph().to_json()).unwrap();

    let node = &value["nodes"][0];
    assert!(node.get("key").is_some());
    assert!(node.get("node_type").is_some());
    assert!(node.get("label_en").is_some());
    assert!(node.get("label_zh").is_some());
    assert!(node.get("score").is_some());

    let cluster = &value["clusters"][0];
    assert!(cluster.get("clusterLabel").is_some());
    assert!(cluster.get("label").is_none());

    let edge = &value["edges"][0];
    assert_eq!(edge.as_array().map(Vec::len), Some(2));
}

// ============================================================================
// Scores
// ============================================================================

#[test]
fn test_scores_reflect_the_current_edge_set() {
    let mut graph = TopicGraph::new();
    graph.add_node(labeled("a", NodeKind::Subtopic, "01", "A"));
    graph.add_node(labeled("b", NodeKind::Subtopic, "01", "B"));
    graph.add_node(labeled("c", NodeKind::Subtopic, "01", "C"));

    // Edgeless: every node sits on the uniform fallback vector.
    let before = graph.to_json();
    let uniform = 1.0 / 3.0_f64.sqrt();
    assert!((find_node(&before, "c").score - uniform).abs() < 1e-9);

    // With an a-b edge the isolated node drops out of the eigenvector.
    graph.add_edge("a", "b", EdgeKind::SubtopicRelated);
    let after = graph.to_json();
    assert!(find_node(&after, "c").score.abs() < 1e-9);
    assert!(find_node(&after, "a").score > find_node(&after, "c").score);
}

// ============================================================================
// Uncrawled endpoints
// ============================================================================

#[test]
fn test_edges_to_uncrawled_endpoints_are_kept() {
    let mut graph = TopicGraph::new();
    graph.add_node(labeled("010101", NodeKind::Subtopic, "01", "Peacekeeping"));
    graph.add_edge("010101", "010199", EdgeKind::SubtopicRelated);

    let exported = graph.to_json();

    assert_eq!(exported.nodes.len(), 1);
    assert_eq!(exported.edges.len(), 1);
    assert!(exported.edges[0].contains(&"010199".to_string()));
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn test_save_graph_creates_parent_directories_and_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out").join("nested").join("graph.json");

    let exported = sample_graph().to_json();
    save_graph(&exported, &path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let parsed: GraphJson = serde_json::from_str(&text).unwrap();

    assert_eq!(parsed.nodes.len(), exported.nodes.len());
    assert_eq!(parsed.edges.len(), exported.edges.len());
    assert_eq!(parsed.clusters[0].label, "POLITICAL AND LEGAL QUESTIONS");
    assert_eq!(parsed.tags[0].key, "Concept");
}
