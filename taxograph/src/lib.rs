// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{expand_output_path, handle_crawl, resolve_mirror_password};

// Re-export crawl functionality from taxograph-core
pub use taxograph_core::crawl::{
    CrawlError, CrawlOptions, CrawlProgressCallback, CrawlStats, ThesaurusCrawler,
};
