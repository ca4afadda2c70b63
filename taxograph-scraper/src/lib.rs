pub mod categories;
pub mod client;
pub mod document;
pub mod error;

pub use categories::extract_meta_topic_ids;
pub use client::{FetchProgressCallback, ThesaurusClient, DEFAULT_BASE_URL, DEFAULT_CATEGORIES_URL};
pub use document::{extract, ConceptDocument, LabelSet};
pub use error::ScrapeError;
