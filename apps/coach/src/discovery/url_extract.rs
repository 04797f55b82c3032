//! Single-URL extraction: fetch a job page and pull best-effort fields out
//! of the markup using fallback selector chains.

use scraper::{Html, Selector};
use serde_json::json;
use tracing::warn;

use crate::discovery::JobPosting;

const HTTP_TIMEOUT_SECS: u64 = 20;
const MAX_TITLE_LEN: usize = 200;
const MAX_DESC_LEN: usize = 5000;
const USER_AGENT: &str = "JobmateBot/1.0";

/// Fetches the page and extracts job fields. Fetch or parse trouble degrades
/// to empty fields rather than failing — the caller decides whether an empty
/// posting is acceptable.
pub async fn extract_job_from_url(url: &str) -> JobPosting {
    let client = match reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(HTTP_TIMEOUT_SECS))
        .user_agent(USER_AGENT)
        .build()
    {
        Ok(c) => c,
        Err(e) => {
            warn!("HTTP client build failed: {e}");
            return empty_posting(url);
        }
    };

    let html = match fetch_html(&client, url).await {
        Some(html) => html,
        None => return empty_posting(url),
    };

    parse_job_html(&html, url)
}

async fn fetch_html(client: &reqwest::Client, url: &str) -> Option<String> {
    let response = client.get(url).send().await;
    match response.and_then(|r| r.error_for_status()) {
        Ok(resp) => match resp.text().await {
            Ok(html) => Some(html),
            Err(e) => {
                warn!("URL body unreadable url={url}: {e}");
                None
            }
        },
        Err(e) => {
            warn!("URL fetch failed url={url}: {e}");
            None
        }
    }
}

/// Pure extraction over fetched markup. Selector chains, most specific
/// first; every field falls back to empty.
pub fn parse_job_html(html: &str, url: &str) -> JobPosting {
    let doc = Html::parse_document(html);

    // Title: og:title > <title> > first <h1>
    let title = meta(&doc, "og:title")
        .or_else(|| text(&doc, "title"))
        .or_else(|| text(&doc, "h1"))
        .unwrap_or_default();
    let title = clean(&title, MAX_TITLE_LEN);

    // Company: common job-board markup
    let company = meta(&doc, "og:site_name")
        .or_else(|| {
            attr(
                &doc,
                r#"[itemprop="hiringOrganization"] [itemprop="name"]"#,
                "content",
            )
        })
        .or_else(|| text(&doc, r#"[itemprop="hiringOrganization"]"#))
        .unwrap_or_default();
    let company = clean(&company, MAX_TITLE_LEN);

    let location = attr(&doc, r#"[itemprop="jobLocation"]"#, "content")
        .or_else(|| text(&doc, r#"[itemprop="jobLocation"]"#))
        .unwrap_or_default();
    let location = clean(&location, MAX_TITLE_LEN);

    // Description: og:description > itemprop > <article> > <main>
    let description = meta(&doc, "og:description")
        .or_else(|| text(&doc, r#"[itemprop="description"]"#))
        .or_else(|| text(&doc, "article"))
        .or_else(|| text(&doc, "main"))
        .unwrap_or_default();
    let description = clean(&description, MAX_DESC_LEN);

    JobPosting {
        external_id: String::new(),
        raw_data: json!({
            "title": title,
            "description": description,
            "company_name": company,
            "location": location,
            "source_url": url,
        }),
        title,
        description,
        company_name: company,
        location,
        salary_min: 0,
        salary_max: 0,
        source_url: url.to_string(),
    }
}

fn empty_posting(url: &str) -> JobPosting {
    parse_job_html("", url)
}

fn meta(doc: &Html, prop: &str) -> Option<String> {
    attr(doc, &format!(r#"meta[property="{prop}"]"#), "content")
        .or_else(|| attr(doc, &format!(r#"meta[name="{prop}"]"#), "content"))
}

fn text(doc: &Html, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    let element = doc.select(&sel).next()?;
    let joined = element.text().collect::<Vec<_>>().join(" ");
    non_empty(joined)
}

fn attr(doc: &Html, selector: &str, attribute: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    let element = doc.select(&sel).next()?;
    non_empty(element.value().attr(attribute)?.to_string())
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Collapse whitespace runs and truncate to `max` characters.
fn clean(s: &str, max: usize) -> String {
    let collapsed = s.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(max).collect()
}
