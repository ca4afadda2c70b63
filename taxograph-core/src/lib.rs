pub mod centrality;
pub mod crawl;
pub mod export;
pub mod graph;
pub mod mirror;

pub use crawl::{CrawlError, CrawlOptions, CrawlProgressCallback, CrawlStats, ThesaurusCrawler};
pub use export::{save_graph, GraphJson};
pub use graph::{EdgeKind, NodeKind, TopicGraph, TopicNode};
pub use mirror::GraphMirror;
