use crate::error::{Result, ScrapeError};
use scraper::{Html, Selector};
use std::collections::HashSet;
use tracing::debug;

/// Extracts meta-topic ids from the category listing page.
///
/// Each category sits in a `row collapsible` block whose domain link text
/// reads `"<id> - <name>"`; the id is everything before the first separator.
/// An empty result means the page layout changed and the crawl has no roots,
/// so it is reported as an error rather than an empty set.
pub fn extract_meta_topic_ids(html: &str) -> Result<HashSet<String>> {
    let document = Html::parse_document(html);
    let row_selector = Selector::parse("div.row.collapsible").unwrap();
    let domain_selector = Selector::parse(".bc-link.domain").unwrap();

    let mut ids = HashSet::new();
    for row in document.select(&row_selector) {
        let Some(link) = row.select(&domain_selector).next() else {
            debug!("Skipping category row without a domain link");
            continue;
        };
        let text: String = link.text().collect();
        let id = text.trim().split(" - ").next().unwrap_or_default();
        if id.is_empty() {
            debug!("Skipping category row with a blank id");
            continue;
        }
        ids.insert(id.to_string());
    }

    if ids.is_empty() {
        return Err(ScrapeError::EmptyCategoryPage);
    }
    debug!("Extracted {} meta topic ids from the category page", ids.len());
    Ok(ids)
}
