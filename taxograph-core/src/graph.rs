use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use taxograph_scraper::LabelSet;
use tracing::{debug, warn};

/// Hierarchy level of a crawled concept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    MetaTopic,
    Topic,
    Subtopic,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::MetaTopic => "meta_topic",
            NodeKind::Topic => "topic",
            NodeKind::Subtopic => "subtopic",
        }
    }
}

/// Relationship kind carried by an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    MetaToTopic,
    TopicToSubtopic,
    SubtopicRelated,
    NodeToCluster,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::MetaToTopic => "meta_topic->topic",
            EdgeKind::TopicToSubtopic => "topic->subtopic",
            EdgeKind::SubtopicRelated => "subtopic->related",
            EdgeKind::NodeToCluster => "node->cluster",
        }
    }
}

/// Attributes of a crawled concept node.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicNode {
    pub id: String,
    pub kind: NodeKind,
    /// Owning cluster id. A meta-topic is its own cluster.
    pub cluster: Option<String>,
    pub url: String,
    pub labels: LabelSet,
}

/// Cluster legend entry carried through to the exported JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterEntry {
    pub key: String,
    pub color: String,
    #[serde(rename = "clusterLabel")]
    pub label: String,
}

/// Fixed color wheel for cluster legend entries. `#795548` appears twice,
/// for clusters 13 and 18.
pub const CLUSTER_PALETTE: [&str; 18] = [
    "#f44336", "#9c27b0", "#3f51b5", "#2196f3", "#009688", "#4caf50",
    "#8bc34a", "#cddc39", "#ffeb3b", "#ffc107", "#ff9800", "#ff5722",
    "#795548", "#9e9e9e", "#607d8b", "#e91e63", "#673ab7", "#795548",
];

/// Color for a meta-topic id, whose numeric value indexes the palette
/// 1-based, wrapping past its end.
pub fn palette_color(meta_id: &str) -> &'static str {
    match meta_id.parse::<usize>() {
        Ok(n) if n >= 1 => CLUSTER_PALETTE[(n - 1) % CLUSTER_PALETTE.len()],
        _ => {
            warn!(
                "Meta topic id {} has no numeric palette position, using the first color",
                meta_id
            );
            CLUSTER_PALETTE[0]
        }
    }
}

/// In-memory undirected multigraph of the crawled thesaurus.
///
/// Structure and attributes are tracked separately: an edge may name a
/// concept before it has been crawled, which creates a bare vertex that is
/// upgraded in place once its document arrives. Node attributes are
/// first-write-wins and edges are identified by their unordered endpoint
/// pair plus kind, so re-inserting either is a no-op.
pub struct TopicGraph {
    graph: UnGraph<String, EdgeKind>,
    indices: HashMap<String, NodeIndex>,
    nodes: HashMap<String, TopicNode>,
    edge_keys: HashSet<(String, String, EdgeKind)>,
    clusters: Vec<ClusterEntry>,
}

impl TopicGraph {
    pub fn new() -> Self {
        Self {
            graph: UnGraph::new_undirected(),
            indices: HashMap::new(),
            nodes: HashMap::new(),
            edge_keys: HashSet::new(),
            clusters: Vec::new(),
        }
    }

    /// Vertex for an id, created bare if not seen before.
    fn vertex(&mut self, id: &str) -> NodeIndex {
        if let Some(&index) = self.indices.get(id) {
            return index;
        }
        let index = self.graph.add_node(id.to_string());
        self.indices.insert(id.to_string(), index);
        index
    }

    /// Attaches attributes to a node. Returns false without touching
    /// anything when the id already has attributes.
    pub fn add_node(&mut self, node: TopicNode) -> bool {
        if self.nodes.contains_key(&node.id) {
            warn!("Node {} already exists", node.id);
            return false;
        }
        self.vertex(&node.id);
        self.nodes.insert(node.id.clone(), node);
        true
    }

    /// Inserts an edge between two ids, creating bare endpoints as needed.
    /// Returns false when an edge with the same unordered endpoints and
    /// kind already exists.
    pub fn add_edge(&mut self, source: &str, target: &str, kind: EdgeKind) -> bool {
        let key = Self::edge_key(source, target, kind);
        if self.edge_keys.contains(&key) {
            debug!("Edge {} -> {} ({}) already exists", source, target, kind.as_str());
            return false;
        }
        let source_index = self.vertex(source);
        let target_index = self.vertex(target);
        self.graph.add_edge(source_index, target_index, kind);
        self.edge_keys.insert(key);
        true
    }

    fn edge_key(source: &str, target: &str, kind: EdgeKind) -> (String, String, EdgeKind) {
        if source <= target {
            (source.to_string(), target.to_string(), kind)
        } else {
            (target.to_string(), source.to_string(), kind)
        }
    }

    /// Adds a legend entry, skipping keys already registered.
    pub fn register_cluster(&mut self, key: String, color: String, label: String) -> bool {
        if self.clusters.iter().any(|cluster| cluster.key == key) {
            return false;
        }
        self.clusters.push(ClusterEntry { key, color, label });
        true
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node(&self, id: &str) -> Option<&TopicNode> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &TopicNode> {
        self.nodes.values()
    }

    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, EdgeKind)> {
        self.graph.edge_references().map(|edge| {
            (
                self.graph[edge.source()].as_str(),
                self.graph[edge.target()].as_str(),
                *edge.weight(),
            )
        })
    }

    pub fn clusters(&self) -> &[ClusterEntry] {
        &self.clusters
    }

    /// Number of nodes with attributes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of vertices, bare ones included.
    pub fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Ids referenced by some edge whose documents never arrived.
    pub fn dangling_ids(&self) -> Vec<&str> {
        self.graph
            .node_weights()
            .filter(|id| !self.nodes.contains_key(id.as_str()))
            .map(String::as_str)
            .collect()
    }

    pub(crate) fn inner(&self) -> &UnGraph<String, EdgeKind> {
        &self.graph
    }
}

impl Default for TopicGraph {
    fn default() -> Self {
        Self::new()
    }
}
