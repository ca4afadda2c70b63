use crate::error::Result;
use crate::error::ScrapeError;
use futures::future::join_all;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://metadata.un.org/thesaurus";
pub const DEFAULT_CATEGORIES_URL: &str = "https://metadata.un.org/thesaurus/categories?lang=en";

// The endpoint serves JSON-LD to browser user agents only.
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/44.0.2403.157 Safari/537.36";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_CONCURRENCY: usize = 10;

/// Callback type for fetch completions, called with the concept id.
pub type FetchProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// HTTP client for the thesaurus endpoint.
pub struct ThesaurusClient {
    client: Client,
    base_url: String,
    categories_url: String,
    concurrency: usize,
    progress_callback: Option<FetchProgressCallback>,
}

impl ThesaurusClient {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT_SECS)
    }

    /// Creates a client with the specified request timeout.
    pub fn with_timeout(timeout_secs: u64) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/ld+json"));

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs / 2))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            categories_url: DEFAULT_CATEGORIES_URL.to_string(),
            concurrency: DEFAULT_CONCURRENCY,
            progress_callback: None,
        }
    }

    /// Overrides the concept endpoint root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Overrides the category listing page URL.
    pub fn with_categories_url(mut self, categories_url: impl Into<String>) -> Self {
        self.categories_url = categories_url.into();
        self
    }

    /// Sets the maximum number of in-flight concept fetches.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Sets a callback invoked after each completed fetch.
    pub fn with_progress_callback(mut self, callback: FetchProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// URL of the JSON-LD document for a concept id.
    pub fn concept_url(&self, id: &str) -> String {
        format!("{}/{}.json", self.base_url, id)
    }

    /// Fetches a batch of concept documents concurrently, bounded by the
    /// configured concurrency limit.
    ///
    /// Returns one entry per requested id. A fetch that fails or yields an
    /// unusable body is logged and recorded as `None` so a flaky document
    /// never sinks the whole batch.
    pub async fn fetch_concepts(
        &self,
        ids: &HashSet<String>,
    ) -> Result<HashMap<String, Option<Value>>> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency.max(1)));
        let mut handles = Vec::with_capacity(ids.len());

        for id in ids {
            let client = self.client.clone();
            let url = self.concept_url(id);
            let id = id.clone();
            let semaphore = semaphore.clone();
            let progress_callback = self.progress_callback.clone();

            handles.push(tokio::spawn(async move {
                let _permit = semaphore.acquire().await.unwrap();
                let document = match Self::fetch_concept_static(&client, &url).await {
                    Ok(document) => Some(document),
                    Err(e) => {
                        warn!("Failed to fetch concept {}: {}", id, e);
                        None
                    }
                };
                if let Some(callback) = progress_callback {
                    callback(id.clone());
                }
                (id, document)
            }));
        }

        let mut documents = HashMap::with_capacity(handles.len());
        for joined in join_all(handles).await {
            let (id, document) = joined?;
            documents.insert(id, document);
        }
        Ok(documents)
    }

    /// Static fetch of one concept document for use in spawned tasks.
    ///
    /// The endpoint wraps every concept in a single-element JSON-LD array;
    /// anything else is treated as malformed.
    async fn fetch_concept_static(client: &Client, url: &str) -> Result<Value> {
        debug!("Fetching {}", url);
        let response = client.get(url).send().await?.error_for_status()?;
        let body: Value = response.json().await?;
        match body.as_array().and_then(|documents| documents.first()) {
            Some(document) => Ok(document.clone()),
            None => Err(ScrapeError::MalformedDocument(format!(
                "expected a non-empty JSON-LD array at {}",
                url
            ))),
        }
    }

    /// Fetches the HTML category listing page.
    pub async fn fetch_categories_page(&self) -> Result<String> {
        debug!("Fetching {}", self.categories_url);
        let response = self
            .client
            .get(&self.categories_url)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.text().await?)
    }
}

impl Default for ThesaurusClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(server_uri: &str) -> ThesaurusClient {
        ThesaurusClient::new()
            .with_base_url(server_uri)
            .with_categories_url(format!("{}/categories", server_uri))
    }

    fn ids(values: &[&str]) -> HashSet<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    async fn mount_concept(server: &MockServer, id: &str, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path(format!("/{}.json", id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    #[test]
    fn test_concept_url_formatting() {
        let client = ThesaurusClient::new().with_base_url("http://example.org/thesaurus/");
        assert_eq!(
            client.concept_url("010200"),
            "http://example.org/thesaurus/010200.json"
        );
    }

    #[tokio::test]
    async fn test_fetch_concepts_returns_parsed_documents() {
        let server = MockServer::start().await;
        mount_concept(
            &server,
            "01",
            json!([{ "@id": "http://metadata.un.org/thesaurus/01" }]),
        )
        .await;

        let client = test_client(&server.uri());
        let documents = client.fetch_concepts(&ids(&["01"])).await.unwrap();

        assert_eq!(documents.len(), 1);
        let document = documents["01"].as_ref().unwrap();
        assert_eq!(document["@id"], "http://metadata.un.org/thesaurus/01");
    }

    #[tokio::test]
    async fn test_fetch_concepts_sends_ld_json_accept_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/01.json"))
            .and(header("accept", "application/ld+json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "@id": "x/01" }])))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let documents = client.fetch_concepts(&ids(&["01"])).await.unwrap();

        // The mock only matches when the Accept header was sent.
        assert!(documents["01"].is_some());
    }

    #[tokio::test]
    async fn test_fetch_concepts_maps_failures_to_absent() {
        let server = MockServer::start().await;
        mount_concept(&server, "01", json!([{ "@id": "x/01" }])).await;
        Mock::given(method("GET"))
            .and(path("/02.json"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let documents = client.fetch_concepts(&ids(&["01", "02"])).await.unwrap();

        assert!(documents["01"].is_some());
        assert!(documents["02"].is_none());
    }

    #[tokio::test]
    async fn test_fetch_concepts_treats_empty_array_as_absent() {
        let server = MockServer::start().await;
        mount_concept(&server, "01", json!([])).await;

        let client = test_client(&server.uri());
        let documents = client.fetch_concepts(&ids(&["01"])).await.unwrap();

        assert!(documents["01"].is_none());
    }

    #[tokio::test]
    async fn test_fetch_concepts_with_bounded_concurrency() {
        let server = MockServer::start().await;
        let batch = ["01", "02", "03", "04", "05"];
        for id in &batch {
            mount_concept(&server, id, json!([{ "@id": format!("x/{}", id) }])).await;
        }

        let client = test_client(&server.uri()).with_concurrency(2);
        let documents = client.fetch_concepts(&ids(&batch)).await.unwrap();

        assert_eq!(documents.len(), batch.len());
        assert!(documents.values().all(|document| document.is_some()));
    }

    #[tokio::test]
    async fn test_fetch_concepts_reports_progress() {
        let server = MockServer::start().await;
        mount_concept(&server, "01", json!([{ "@id": "x/01" }])).await;
        Mock::given(method("GET"))
            .and(path("/02.json"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let completed = Arc::new(AtomicUsize::new(0));
        let counter = completed.clone();
        let client = test_client(&server.uri()).with_progress_callback(Arc::new(move |_id| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        client.fetch_concepts(&ids(&["01", "02"])).await.unwrap();

        // Fires per completed fetch, successful or not.
        assert_eq!(completed.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fetch_categories_page_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/categories"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>categories</html>"))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let body = client.fetch_categories_page().await.unwrap();

        assert!(body.contains("categories"));
    }

    #[tokio::test]
    async fn test_fetch_categories_page_propagates_http_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/categories"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let error = client.fetch_categories_page().await.unwrap_err();

        assert!(matches!(error, ScrapeError::HttpError(_)));
    }
}
