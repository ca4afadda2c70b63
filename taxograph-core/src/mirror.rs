use crate::graph::{EdgeKind, NodeKind, TopicNode};
use neo4rs::{query, ConfigBuilder, Graph};
use tracing::{debug, info};

const FETCH_SIZE: usize = 500;
const MAX_CONNECTIONS: usize = 10;

/// Live mirror of the topic graph in a Neo4j instance.
///
/// The mirror receives the same upserts the in-memory store accepts, so at
/// any point during a crawl it holds a consistent prefix of the graph. All
/// writes are MERGEs keyed on the concept id and safe to replay.
pub struct GraphMirror {
    graph: Graph,
}

impl GraphMirror {
    /// Connects to a Neo4j instance over bolt.
    pub async fn connect(uri: &str, user: &str, password: &str) -> Result<Self, neo4rs::Error> {
        let config = ConfigBuilder::default()
            .uri(uri)
            .user(user)
            .password(password)
            .fetch_size(FETCH_SIZE)
            .max_connections(MAX_CONNECTIONS)
            .build()?;
        let graph = Graph::connect(config).await?;
        info!("Connected to Neo4j at {}", uri);
        Ok(Self { graph })
    }

    /// Round-trips a trivial query so a dead endpoint fails the crawl at
    /// startup instead of midway.
    pub async fn verify_connectivity(&self) -> Result<(), neo4rs::Error> {
        let mut stream = self.graph.execute(query("RETURN 1")).await?;
        while stream.next().await?.is_some() {}
        Ok(())
    }

    /// Upserts a node with its kind label, cluster and display labels.
    pub async fn merge_node(&self, node: &TopicNode) -> Result<(), neo4rs::Error> {
        debug!("Mirroring node {}", node.id);
        let q = query(&merge_node_cypher(node.kind))
            .param("id", node.id.as_str())
            .param("cluster", node.cluster.as_deref().unwrap_or(""))
            .param("label_en", node.labels.en.as_deref().unwrap_or(""))
            .param("label_ar", node.labels.ar.as_deref().unwrap_or(""))
            .param("label_es", node.labels.es.as_deref().unwrap_or(""))
            .param("label_fr", node.labels.fr.as_deref().unwrap_or(""))
            .param("label_ru", node.labels.ru.as_deref().unwrap_or(""))
            .param("label_zh", node.labels.zh.as_deref().unwrap_or(""));

        let mut stream = self.graph.execute(q).await?;
        while stream.next().await?.is_some() {}
        Ok(())
    }

    /// Upserts an edge, along with both endpoints as bare nodes if they
    /// have not been mirrored yet.
    pub async fn merge_edge(
        &self,
        source: &str,
        target: &str,
        kind: EdgeKind,
    ) -> Result<(), neo4rs::Error> {
        debug!("Mirroring edge {} -> {} ({})", source, target, kind.as_str());
        let q = query(&merge_edge_cypher(kind))
            .param("source", source)
            .param("target", target);

        let mut stream = self.graph.execute(q).await?;
        while stream.next().await?.is_some() {}
        Ok(())
    }

    /// Deletes every node and relationship in the mirrored database.
    pub async fn clear_all(&self) -> Result<(), neo4rs::Error> {
        let mut stream = self.graph.execute(query("MATCH (n) DETACH DELETE n")).await?;
        while stream.next().await?.is_some() {}
        info!("Cleared all mirrored data");
        Ok(())
    }
}

fn kind_label(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::MetaTopic => "MetaTopic",
        NodeKind::Topic => "Topic",
        NodeKind::Subtopic => "Subtopic",
    }
}

fn relationship_type(kind: EdgeKind) -> &'static str {
    match kind {
        EdgeKind::MetaToTopic => "HAS_TOPIC",
        EdgeKind::TopicToSubtopic => "HAS_SUBTOPIC",
        EdgeKind::SubtopicRelated => "RELATED_TO",
        EdgeKind::NodeToCluster => "IN_CLUSTER",
    }
}

// Kind labels and relationship types cannot be parameterized in Cypher,
// so the query text is built per kind from the static tables above.
fn merge_node_cypher(kind: NodeKind) -> String {
    format!(
        "MERGE (n {{id: $id}}) \
         SET n:{}, \
             n.cluster = $cluster, \
             n.labelEn = $label_en, \
             n.labelAr = $label_ar, \
             n.labelEs = $label_es, \
             n.labelFr = $label_fr, \
             n.labelRu = $label_ru, \
             n.labelZh = $label_zh",
        kind_label(kind)
    )
}

fn merge_edge_cypher(kind: EdgeKind) -> String {
    // Hierarchy and cluster membership are directed, relatedness is not.
    let pattern = match kind {
        EdgeKind::SubtopicRelated => "MERGE (source)-[r:{REL}]-(target)",
        _ => "MERGE (source)-[r:{REL}]->(target)",
    };
    format!(
        "MERGE (source {{id: $source}}) \
         MERGE (target {{id: $target}}) \
         {}",
        pattern.replace("{REL}", relationship_type(kind))
    )
}
