use crate::error::{Result, ScrapeError};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use tracing::warn;

/// Multilingual label container covering the six official UN languages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSet {
    pub en: Option<String>,
    pub ar: Option<String>,
    pub es: Option<String>,
    pub fr: Option<String>,
    pub ru: Option<String>,
    pub zh: Option<String>,
}

impl LabelSet {
    /// Stores a label under its language code. Labels in languages outside
    /// the six official ones are dropped.
    fn set(&mut self, language: &str, value: String) {
        match language {
            "en" => self.en = Some(value),
            "ar" => self.ar = Some(value),
            "es" => self.es = Some(value),
            "fr" => self.fr = Some(value),
            "ru" => self.ru = Some(value),
            "zh" => self.zh = Some(value),
            _ => {}
        }
    }

    pub fn is_empty(&self) -> bool {
        self.en.is_none()
            && self.ar.is_none()
            && self.es.is_none()
            && self.fr.is_none()
            && self.ru.is_none()
            && self.zh.is_none()
    }
}

/// A concept document with the fields the crawler consumes, extracted from
/// the raw JSON-LD body.
#[derive(Debug, Clone, PartialEq)]
pub struct ConceptDocument {
    /// Last path segment of the concept URL.
    pub id: String,
    /// Canonical concept URL, as published in the document's `@id`.
    pub url: String,
    pub labels: LabelSet,
    /// Identifier of the owning scheme, absent on documents without one.
    pub cluster: Option<String>,
    /// Narrower concepts (or top concepts, on a meta-topic document).
    pub children: HashSet<String>,
    /// Related concepts. Only populated on subtopic documents in practice.
    pub related: HashSet<String>,
}

// JSON-LD keys are full predicate IRIs, so the serde schema renames each
// field to the IRI it is read from. Unknown keys are ignored.
#[derive(Debug, Deserialize)]
struct RawConcept {
    #[serde(rename = "@id")]
    id: Option<String>,

    #[serde(rename = "http://purl.org/dc/terms/title", default)]
    titles: Vec<RawLabel>,

    #[serde(rename = "http://www.w3.org/2004/02/skos/core#prefLabel", default)]
    pref_labels: Vec<RawLabel>,

    #[serde(rename = "http://www.w3.org/2004/02/skos/core#hasTopConcept", default)]
    top_concepts: Vec<RawReference>,

    #[serde(rename = "http://www.w3.org/2004/02/skos/core#narrower", default)]
    narrower: Vec<RawReference>,

    #[serde(rename = "http://www.w3.org/2004/02/skos/core#related", default)]
    related: Vec<RawReference>,

    #[serde(rename = "http://www.w3.org/2004/02/skos/core#inScheme", default)]
    in_scheme: Vec<RawReference>,
}

#[derive(Debug, Deserialize)]
struct RawLabel {
    #[serde(rename = "@language")]
    language: Option<String>,
    #[serde(rename = "@value")]
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawReference {
    #[serde(rename = "@id")]
    id: Option<String>,
}

/// Extracts the crawler-facing view of a JSON-LD concept document.
///
/// Meta-topic and topic documents label themselves through the Dublin Core
/// title predicate, subtopics through the SKOS prefLabel one, so the caller
/// states which applies. A document without an `@id` is unusable and fails
/// hard; every other field degrades to its empty default when absent.
pub fn extract(value: &Value, is_subtopic: bool) -> Result<ConceptDocument> {
    let raw = RawConcept::deserialize(value)
        .map_err(|e| ScrapeError::MalformedDocument(e.to_string()))?;

    let url = match raw.id {
        Some(url) => url,
        None => {
            let snippet: String = value.to_string().chars().take(120).collect();
            return Err(ScrapeError::MissingIdentity(snippet));
        }
    };
    let id = last_path_segment(&url).to_string();

    let mut labels = LabelSet::default();
    let raw_labels = if is_subtopic { raw.pref_labels } else { raw.titles };
    for label in raw_labels {
        if let (Some(language), Some(value)) = (label.language, label.value) {
            labels.set(&language, value);
        }
    }

    let cluster = raw
        .in_scheme
        .first()
        .and_then(|reference| reference.id.as_deref())
        .map(|scheme| last_path_segment(scheme).to_string());
    if cluster.is_none() {
        warn!("Concept {} has no scheme reference", id);
    }

    let mut children = reference_ids(raw.top_concepts);
    children.extend(reference_ids(raw.narrower));
    let related = reference_ids(raw.related);

    Ok(ConceptDocument {
        id,
        url,
        labels,
        cluster,
        children,
        related,
    })
}

fn reference_ids(references: Vec<RawReference>) -> HashSet<String> {
    references
        .into_iter()
        .filter_map(|reference| reference.id)
        .map(|url| last_path_segment(&url).to_string())
        .collect()
}

/// Returns the text after the last `/`, the whole input if it has none.
pub fn last_path_segment(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}
