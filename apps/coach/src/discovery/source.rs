//! Listings source — pluggable, trait-based backend for the discovery scan.
//!
//! Default: `AdzunaSource` (HTTP search API). The trait seam keeps the scan
//! pipeline testable without network access.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::discovery::JobPosting;

/// Results per page requested from the listings API.
pub const PAGE_SIZE: usize = 50;
/// Pagination cap per (title, location) pair.
pub const MAX_PAGES: u32 = 3;

const HTTP_TIMEOUT_SECS: u64 = 15;

/// One page of search results for a (job title, location) query.
/// Implementations return an empty page when unconfigured or on fetch
/// errors; the scan treats that as "nothing more here", never as a failure.
#[async_trait]
pub trait JobSource: Send + Sync {
    async fn fetch_page(&self, job_title: &str, location: &str, page: u32) -> Vec<JobPosting>;
}

/// Fetches up to [`MAX_PAGES`] pages, stopping early when a page comes back
/// short of [`PAGE_SIZE`].
pub async fn fetch_all(source: &dyn JobSource, job_title: &str, location: &str) -> Vec<JobPosting> {
    let mut results = Vec::new();
    for page in 1..=MAX_PAGES {
        let batch = source.fetch_page(job_title, location, page).await;
        let short_page = batch.len() < PAGE_SIZE;
        results.extend(batch);
        if short_page {
            break;
        }
    }
    results
}

// ────────────────────────────────────────────────────────────────────────────
// Adzuna backend
// ────────────────────────────────────────────────────────────────────────────

const ADZUNA_BASE: &str = "https://api.adzuna.com/v1/api/jobs";

pub struct AdzunaSource {
    client: reqwest::Client,
    app_id: Option<String>,
    app_key: Option<String>,
    country: String,
}

#[derive(Debug, Deserialize)]
struct AdzunaPage {
    #[serde(default)]
    results: Vec<AdzunaResult>,
}

#[derive(Debug, Deserialize)]
struct AdzunaResult {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    company: Option<DisplayName>,
    #[serde(default)]
    location: Option<DisplayName>,
    #[serde(default)]
    salary_min: Option<f64>,
    #[serde(default)]
    salary_max: Option<f64>,
    #[serde(default)]
    redirect_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DisplayName {
    #[serde(default)]
    display_name: Option<String>,
}

impl AdzunaSource {
    pub fn new(
        app_id: Option<String>,
        app_key: Option<String>,
        country: String,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            app_id,
            app_key,
            country,
        })
    }
}

#[async_trait]
impl JobSource for AdzunaSource {
    async fn fetch_page(&self, job_title: &str, location: &str, page: u32) -> Vec<JobPosting> {
        let (Some(app_id), Some(app_key)) = (&self.app_id, &self.app_key) else {
            return Vec::new();
        };

        let url = format!("{ADZUNA_BASE}/{}/search/{page}", self.country);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("app_id", app_id.as_str()),
                ("app_key", app_key.as_str()),
                ("results_per_page", &PAGE_SIZE.to_string()),
                ("what", job_title),
                ("where", location),
                ("content-type", "application/json"),
            ])
            .send()
            .await;

        let body: Value = match response.and_then(|r| r.error_for_status()) {
            Ok(resp) => match resp.json().await {
                Ok(body) => body,
                Err(e) => {
                    warn!("Adzuna response unreadable page={page}: {e}");
                    return Vec::new();
                }
            },
            Err(e) => {
                warn!("Adzuna fetch error page={page}: {e}");
                return Vec::new();
            }
        };

        let page_data: AdzunaPage = match serde_json::from_value(body.clone()) {
            Ok(p) => p,
            Err(e) => {
                warn!("Adzuna page shape unexpected: {e}");
                return Vec::new();
            }
        };

        let raw_results = body
            .get("results")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        page_data
            .results
            .into_iter()
            .zip(raw_results)
            .map(|(r, raw)| map_result(r, raw))
            .collect()
    }
}

fn map_result(r: AdzunaResult, raw: Value) -> JobPosting {
    JobPosting {
        external_id: r.id.map(value_to_id).unwrap_or_default(),
        title: r.title.unwrap_or_default(),
        description: r.description.unwrap_or_default(),
        company_name: r.company.and_then(|c| c.display_name).unwrap_or_default(),
        location: r.location.and_then(|l| l.display_name).unwrap_or_default(),
        salary_min: r.salary_min.unwrap_or(0.0) as i64,
        salary_max: r.salary_max.unwrap_or(0.0) as i64,
        source_url: r.redirect_url.unwrap_or_default(),
        raw_data: raw,
    }
}

/// Adzuna ids arrive as either a string or a number.
fn value_to_id(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct StubSource {
        pages: Vec<Vec<JobPosting>>,
    }

    #[async_trait]
    impl JobSource for StubSource {
        async fn fetch_page(&self, _what: &str, _where: &str, page: u32) -> Vec<JobPosting> {
            self.pages
                .get((page - 1) as usize)
                .cloned()
                .unwrap_or_default()
        }
    }

    fn posting(n: usize) -> JobPosting {
        JobPosting {
            external_id: n.to_string(),
            title: format!("Job {n}"),
            description: String::new(),
            company_name: String::new(),
            location: String::new(),
            salary_min: 0,
            salary_max: 0,
            source_url: format!("https://example.com/{n}"),
            raw_data: json!({}),
        }
    }

    fn full_page(offset: usize) -> Vec<JobPosting> {
        (0..PAGE_SIZE).map(|i| posting(offset + i)).collect()
    }

    #[tokio::test]
    async fn test_fetch_all_stops_on_short_page() {
        let source = StubSource {
            pages: vec![full_page(0), vec![posting(1000)], full_page(2000)],
        };
        let results = fetch_all(&source, "dev", "paris").await;
        // Page 3 is never requested once page 2 comes back short.
        assert_eq!(results.len(), PAGE_SIZE + 1);
    }

    #[tokio::test]
    async fn test_fetch_all_respects_page_cap() {
        let source = StubSource {
            pages: vec![full_page(0), full_page(100), full_page(200), full_page(300)],
        };
        let results = fetch_all(&source, "dev", "paris").await;
        assert_eq!(results.len(), PAGE_SIZE * MAX_PAGES as usize);
    }

    #[tokio::test]
    async fn test_unconfigured_adzuna_returns_empty() {
        let source = AdzunaSource::new(None, None, "fr".to_string()).unwrap();
        let results = source.fetch_page("dev", "paris", 1).await;
        assert!(results.is_empty());
    }

    #[test]
    fn test_map_result_handles_adzuna_shape() {
        let raw = json!({
            "id": 12345,
            "title": "Rust Developer",
            "description": "Build things",
            "company": {"display_name": "Acme"},
            "location": {"display_name": "Paris"},
            "salary_min": 50000.0,
            "salary_max": 65000.5,
            "redirect_url": "https://adzuna.example/j/12345"
        });
        let parsed: AdzunaResult = serde_json::from_value(raw.clone()).unwrap();
        let posting = map_result(parsed, raw);

        assert_eq!(posting.external_id, "12345");
        assert_eq!(posting.company_name, "Acme");
        assert_eq!(posting.location, "Paris");
        assert_eq!(posting.salary_max, 65000);
        assert_eq!(posting.source_url, "https://adzuna.example/j/12345");
    }

    #[test]
    fn test_map_result_tolerates_missing_fields() {
        let parsed: AdzunaResult = serde_json::from_value(json!({})).unwrap();
        let posting = map_result(parsed, json!({}));
        assert!(posting.title.is_empty());
        assert_eq!(posting.salary_min, 0);
    }
}
