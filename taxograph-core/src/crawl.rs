use crate::graph::{palette_color, EdgeKind, NodeKind, TopicGraph, TopicNode};
use crate::mirror::GraphMirror;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use taxograph_scraper::{extract, extract_meta_topic_ids, ThesaurusClient};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("Scrape failed: {0}")]
    Scrape(#[from] taxograph_scraper::ScrapeError),

    #[error("Fixpoint not reached after {iterations} iterations, {remaining} ids still unexplored")]
    FixpointDiverged { iterations: usize, remaining: usize },

    #[error("Graph mirror failed: {0}")]
    Mirror(#[from] neo4rs::Error),
}

/// Callback invoked with a status message as the crawl advances.
pub type CrawlProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Options for configuring a crawl run.
pub struct CrawlOptions {
    /// Upper bound on fixpoint expansion iterations.
    pub max_iterations: usize,
    /// Render an animated spinner while crawling.
    pub show_progress: bool,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            show_progress: true,
        }
    }
}

/// Counters accumulated over a crawl run.
///
/// The per-level counts tally discovered identifiers, so an id whose
/// document turned out to be unreachable still counts at its level and
/// shows up in `failed_fetches` as well.
#[derive(Debug, Clone, Default)]
pub struct CrawlStats {
    pub meta_topics: usize,
    pub topics: usize,
    pub subtopics: usize,
    pub fixpoint_iterations: usize,
    pub failed_fetches: usize,
    pub nodes: usize,
    pub edges: usize,
}

/// Crawls the thesaurus level by level and assembles the topic graph.
///
/// Meta-topic ids come from the HTML category page; each level's documents
/// then name the ids of the next. Subtopics can reference further
/// subtopics, so that level repeats on the yet-unknown remainder until a
/// pass discovers nothing new.
pub struct ThesaurusCrawler {
    client: ThesaurusClient,
    graph: TopicGraph,
    mirror: Option<GraphMirror>,
    options: CrawlOptions,
    progress: Option<ProgressBar>,
    known_meta_topics: HashSet<String>,
    known_topics: HashSet<String>,
    known_subtopics: HashSet<String>,
    stats: CrawlStats,
}

impl ThesaurusCrawler {
    pub fn new(client: ThesaurusClient, options: CrawlOptions) -> Self {
        let progress = options.show_progress.then(|| {
            let progress = ProgressBar::new_spinner();
            progress.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.cyan} {msg}")
                    .unwrap(),
            );
            progress
        });

        // Tick the spinner from the client's per-fetch callback.
        let client = match &progress {
            Some(progress) => {
                let progress = progress.clone();
                let fetched = Arc::new(AtomicUsize::new(0));
                client.with_progress_callback(Arc::new(move |_id| {
                    let count = fetched.fetch_add(1, Ordering::Relaxed) + 1;
                    progress.set_message(format!("Fetched {} concepts", count));
                    progress.tick();
                }))
            }
            None => client,
        };

        Self {
            client,
            graph: TopicGraph::new(),
            mirror: None,
            options,
            progress,
            known_meta_topics: HashSet::new(),
            known_topics: HashSet::new(),
            known_subtopics: HashSet::new(),
            stats: CrawlStats::default(),
        }
    }

    /// Attaches a Neo4j mirror that receives every accepted upsert.
    pub fn with_mirror(mut self, mirror: GraphMirror) -> Self {
        self.mirror = Some(mirror);
        self
    }

    pub fn graph(&self) -> &TopicGraph {
        &self.graph
    }

    pub fn stats(&self) -> &CrawlStats {
        &self.stats
    }

    pub fn mirror(&self) -> Option<&GraphMirror> {
        self.mirror.as_ref()
    }

    pub fn known_meta_topics(&self) -> &HashSet<String> {
        &self.known_meta_topics
    }

    pub fn known_topics(&self) -> &HashSet<String> {
        &self.known_topics
    }

    pub fn known_subtopics(&self) -> &HashSet<String> {
        &self.known_subtopics
    }

    /// Runs the full crawl: category page, meta-topic and topic levels,
    /// then the subtopic level to a fixpoint.
    pub async fn crawl(
        &mut self,
        progress_callback: Option<CrawlProgressCallback>,
    ) -> Result<CrawlStats, CrawlError> {
        let result = self.crawl_levels(progress_callback.as_ref()).await;
        if let Some(progress) = &self.progress {
            match &result {
                Ok(stats) => progress.finish_with_message(format!(
                    "Crawl complete: {} nodes, {} edges",
                    stats.nodes, stats.edges
                )),
                Err(_) => progress.finish_and_clear(),
            }
        }
        result
    }

    async fn crawl_levels(
        &mut self,
        callback: Option<&CrawlProgressCallback>,
    ) -> Result<CrawlStats, CrawlError> {
        info!("Started crawling the thesaurus");
        self.report(callback, "Fetching the category page".to_string());
        let page = self.client.fetch_categories_page().await?;
        let meta_ids = extract_meta_topic_ids(&page)?;
        info!("Found {} meta topics", meta_ids.len());

        self.report(callback, format!("Crawling {} meta topics", meta_ids.len()));
        self.known_meta_topics.extend(meta_ids.iter().cloned());
        let topic_ids = self.crawl_level(&meta_ids, NodeKind::MetaTopic).await?;
        info!("Found {} topics", topic_ids.len());

        self.report(callback, format!("Crawling {} topics", topic_ids.len()));
        self.known_topics.extend(topic_ids.iter().cloned());
        let subtopic_ids = self.crawl_level(&topic_ids, NodeKind::Topic).await?;
        info!("Found {} subtopics", subtopic_ids.len());

        let mut unexplored = subtopic_ids;
        let mut iteration = 0;
        while !unexplored.is_empty() {
            if iteration >= self.options.max_iterations {
                return Err(CrawlError::FixpointDiverged {
                    iterations: iteration,
                    remaining: unexplored.len(),
                });
            }
            iteration += 1;
            self.report(
                callback,
                format!(
                    "Fixpoint iteration {}: {} unexplored subtopics",
                    iteration,
                    unexplored.len()
                ),
            );
            // Mark the frontier known up front so self- and cross-references
            // inside it do not re-enter.
            self.known_subtopics.extend(unexplored.iter().cloned());
            let discovered = self.crawl_level(&unexplored, NodeKind::Subtopic).await?;
            unexplored = discovered
                .into_iter()
                .filter(|id| !self.known_subtopics.contains(id))
                .collect();
            debug!("{} unexplored ids after iteration {}", unexplored.len(), iteration);
        }

        self.stats.meta_topics = self.known_meta_topics.len();
        self.stats.topics = self.known_topics.len();
        self.stats.subtopics = self.known_subtopics.len();
        self.stats.fixpoint_iterations = iteration;
        self.stats.nodes = self.graph.node_count();
        self.stats.edges = self.graph.edge_count();
        info!(
            "Reached a fixpoint after {} iterations: {} nodes, {} edges",
            iteration, self.stats.nodes, self.stats.edges
        );
        Ok(self.stats.clone())
    }

    /// Crawls one level: fetches every id's document, stores the nodes and
    /// edges it names, and returns the ids discovered for the next level.
    async fn crawl_level(
        &mut self,
        ids: &HashSet<String>,
        kind: NodeKind,
    ) -> Result<HashSet<String>, CrawlError> {
        let documents = self.client.fetch_concepts(ids).await?;
        let absent = documents.values().filter(|document| document.is_none()).count();
        if absent > 0 {
            self.stats.failed_fetches += absent;
            debug!(
                "{} of {} {} documents were unreachable",
                absent,
                ids.len(),
                kind.as_str()
            );
        }

        let mut next_ids = HashSet::new();
        for value in documents.values().flatten() {
            let document = extract(value, kind == NodeKind::Subtopic)?;

            let node = TopicNode {
                id: document.id.clone(),
                kind,
                cluster: match kind {
                    // A meta-topic is its own cluster.
                    NodeKind::MetaTopic => Some(document.id.clone()),
                    _ => document.cluster.clone(),
                },
                url: document.url.clone(),
                labels: document.labels.clone(),
            };
            self.insert_node(node).await?;

            match kind {
                NodeKind::MetaTopic => {
                    let label = document
                        .labels
                        .en
                        .clone()
                        .unwrap_or_else(|| document.id.clone());
                    self.graph.register_cluster(
                        document.id.clone(),
                        palette_color(&document.id).to_string(),
                        label,
                    );
                }
                _ => {
                    if let Some(cluster) = &document.cluster {
                        self.insert_edge(&document.id, cluster, EdgeKind::NodeToCluster)
                            .await?;
                    }
                }
            }

            let hierarchy_kind = match kind {
                NodeKind::MetaTopic => EdgeKind::MetaToTopic,
                _ => EdgeKind::TopicToSubtopic,
            };
            if kind == NodeKind::Topic && document.children.is_empty() {
                warn!("Topic {} has no subtopics", document.id);
            }
            for child in &document.children {
                self.insert_edge(&document.id, child, hierarchy_kind).await?;
                next_ids.insert(child.clone());
            }

            if kind == NodeKind::Subtopic {
                for related in &document.related {
                    if !self.known_subtopics.contains(related) {
                        debug!("Related subtopic {} not crawled yet", related);
                        next_ids.insert(related.clone());
                    }
                    self.insert_edge(&document.id, related, EdgeKind::SubtopicRelated)
                        .await?;
                }
            }
        }

        debug!(
            "{} nodes, {} edges after the {} level",
            self.graph.node_count(),
            self.graph.edge_count(),
            kind.as_str()
        );
        Ok(next_ids)
    }

    async fn insert_node(&mut self, node: TopicNode) -> Result<(), CrawlError> {
        if self.graph.add_node(node.clone())
            && let Some(mirror) = &self.mirror
        {
            mirror.merge_node(&node).await?;
        }
        Ok(())
    }

    async fn insert_edge(
        &mut self,
        source: &str,
        target: &str,
        kind: EdgeKind,
    ) -> Result<(), CrawlError> {
        if self.graph.add_edge(source, target, kind)
            && let Some(mirror) = &self.mirror
        {
            mirror.merge_edge(source, target, kind).await?;
        }
        Ok(())
    }

    fn report(&self, callback: Option<&CrawlProgressCallback>, message: String) {
        if let Some(progress) = &self.progress {
            progress.set_message(message.clone());
            progress.tick();
        }
        if let Some(callback) = callback {
            callback(message);
        }
    }
}
