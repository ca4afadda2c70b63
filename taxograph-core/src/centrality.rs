use crate::graph::TopicGraph;
use std::collections::HashMap;

const MAX_ITERATIONS: usize = 100;
const TOLERANCE: f64 = 1e-6;

/// Eigenvector centrality by power iteration, keyed by concept id.
///
/// Scores start uniform at `1/sqrt(n)`, each round replaces a vertex's
/// score with the sum of its neighbors' and L2-normalizes the vector,
/// stopping once successive vectors differ by less than the tolerance.
/// If the cutoff is hit first the last iterate is returned as-is. Bare
/// vertices participate like any other.
pub fn eigenvector_centrality(graph: &TopicGraph) -> HashMap<String, f64> {
    let inner = graph.inner();
    let n = inner.node_count();
    if n == 0 {
        return HashMap::new();
    }

    let initial = 1.0 / (n as f64).sqrt();
    let mut scores = vec![initial; n];
    let mut next = vec![0.0; n];

    for _ in 0..MAX_ITERATIONS {
        next.fill(0.0);
        for index in inner.node_indices() {
            for neighbor in inner.neighbors(index) {
                next[index.index()] += scores[neighbor.index()];
            }
        }

        let norm: f64 = next.iter().map(|score| score * score).sum::<f64>().sqrt();
        if norm > 0.0 {
            for score in &mut next {
                *score /= norm;
            }
        } else {
            // Graph without edges, fall back to the uniform vector.
            next.fill(initial);
        }

        let diff: f64 = scores
            .iter()
            .zip(next.iter())
            .map(|(old, new)| (old - new).powi(2))
            .sum::<f64>()
            .sqrt();
        std::mem::swap(&mut scores, &mut next);
        if diff < TOLERANCE {
            break;
        }
    }

    inner
        .node_indices()
        .map(|index| (inner[index].clone(), scores[index.index()]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EdgeKind, NodeKind, TopicNode};
    use taxograph_scraper::LabelSet;

    fn related(graph: &mut TopicGraph, source: &str, target: &str) {
        graph.add_edge(source, target, EdgeKind::SubtopicRelated);
    }

    #[test]
    fn test_empty_graph_has_no_scores() {
        let graph = TopicGraph::new();
        assert!(eigenvector_centrality(&graph).is_empty());
    }

    #[test]
    fn test_triangle_scores_are_uniform() {
        let mut graph = TopicGraph::new();
        related(&mut graph, "a", "b");
        related(&mut graph, "b", "c");
        related(&mut graph, "c", "a");

        let scores = eigenvector_centrality(&graph);

        let expected = 1.0 / 3.0_f64.sqrt();
        for id in ["a", "b", "c"] {
            assert!((scores[id] - expected).abs() < 1e-4, "score for {}", id);
        }
    }

    #[test]
    fn test_star_center_scores_highest() {
        let mut graph = TopicGraph::new();
        related(&mut graph, "hub", "a");
        related(&mut graph, "hub", "b");
        related(&mut graph, "hub", "c");

        let scores = eigenvector_centrality(&graph);

        assert!(scores["hub"] > scores["a"]);
        assert!((scores["a"] - scores["b"]).abs() < 1e-6);
        assert!((scores["b"] - scores["c"]).abs() < 1e-6);
    }

    #[test]
    fn test_edgeless_graph_falls_back_to_uniform() {
        let mut graph = TopicGraph::new();
        for id in ["a", "b", "c", "d"] {
            graph.add_node(TopicNode {
                id: id.to_string(),
                kind: NodeKind::Subtopic,
                cluster: None,
                url: format!("http://example.org/{}", id),
                labels: LabelSet::default(),
            });
        }

        let scores = eigenvector_centrality(&graph);

        let expected = 1.0 / 4.0_f64.sqrt();
        assert_eq!(scores.len(), 4);
        assert!(scores.values().all(|score| (score - expected).abs() < 1e-9));
    }

    #[test]
    fn test_disconnected_components_all_score_positive() {
        let mut graph = TopicGraph::new();
        related(&mut graph, "a", "b");
        related(&mut graph, "c", "d");

        let scores = eigenvector_centrality(&graph);

        assert_eq!(scores.len(), 4);
        assert!(scores.values().all(|score| *score > 0.0));
    }
}
