use crate::centrality::eigenvector_centrality;
use crate::graph::{ClusterEntry, TopicGraph};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io;
use std::path::Path;
use tracing::{info, warn};

/// Top-level shape of the exported graph JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphJson {
    pub nodes: Vec<NodeJson>,
    pub edges: Vec<[String; 2]>,
    pub clusters: Vec<ClusterEntry>,
    pub tags: Vec<TagJson>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeJson {
    pub key: String,
    pub x: f64,
    pub y: f64,
    pub cluster: Option<String>,
    pub url: String,
    pub node_type: String,
    pub tag: String,
    pub label_en: Option<String>,
    pub label_ar: Option<String>,
    pub label_es: Option<String>,
    pub label_fr: Option<String>,
    pub label_ru: Option<String>,
    pub label_zh: Option<String>,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagJson {
    pub key: String,
    pub image: String,
}

// Every node renders under the single Concept tag.
const CONCEPT_TAG: &str = "Concept";
const CONCEPT_TAG_IMAGE: &str = "concept.svg";

impl TopicGraph {
    /// Serializable view of the graph.
    ///
    /// Centrality scores are recomputed on every call so the view always
    /// reflects the current edge set. Layout coordinates are drawn fresh
    /// and uniformly from [-500, 500); consumers run their own layout and
    /// only need a starting scatter.
    pub fn to_json(&self) -> GraphJson {
        let scores = eigenvector_centrality(self);
        let mut rng = rand::rng();

        let dangling = self.dangling_ids();
        if !dangling.is_empty() {
            warn!(
                "{} edge endpoints were referenced but never crawled",
                dangling.len()
            );
        }

        let nodes = self
            .nodes()
            .map(|node| NodeJson {
                key: node.id.clone(),
                x: rng.random_range(-500.0..500.0),
                y: rng.random_range(-500.0..500.0),
                cluster: node.cluster.clone(),
                url: node.url.clone(),
                node_type: node.kind.as_str().to_string(),
                tag: CONCEPT_TAG.to_string(),
                label_en: node.labels.en.clone(),
                label_ar: node.labels.ar.clone(),
                label_es: node.labels.es.clone(),
                label_fr: node.labels.fr.clone(),
                label_ru: node.labels.ru.clone(),
                label_zh: node.labels.zh.clone(),
                score: scores.get(&node.id).copied().unwrap_or(0.0),
            })
            .collect();

        let edges = self
            .edges()
            .map(|(source, target, _)| [source.to_string(), target.to_string()])
            .collect();

        GraphJson {
            nodes,
            edges,
            clusters: self.clusters().to_vec(),
            tags: vec![TagJson {
                key: CONCEPT_TAG.to_string(),
                image: CONCEPT_TAG_IMAGE.to_string(),
            }],
        }
    }
}

/// Writes the graph JSON to a file, creating parent directories as needed.
pub fn save_graph(graph: &GraphJson, path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, graph)?;
    info!("Saved graph JSON to {}", path.display());
    Ok(())
}
