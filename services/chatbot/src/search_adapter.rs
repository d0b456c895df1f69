//! Web search through the DuckDuckGo instant-answer API.
//!
//! The instant-answer endpoint needs no key and returns an abstract plus a
//! list of related topics, some of them grouped under a heading. Both are
//! flattened into a single ordered list of hits.

use crate::config::SearchSettings;
use async_trait::async_trait;
use chatbot_core::{AdapterError, Outcome, WebSearch};
use reqwest::Client;
use serde::Deserialize;

pub const RESULTS_HEADER: &str = "Here are the top search results:";
pub const NO_RESULTS: &str = "No results found.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub title: String,
    pub snippet: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InstantAnswer {
    #[serde(default)]
    heading: String,
    #[serde(default)]
    abstract_text: String,
    #[serde(default)]
    related_topics: Vec<RelatedTopic>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RelatedTopic {
    Group {
        #[serde(rename = "Topics")]
        topics: Vec<RelatedTopic>,
    },
    Entry {
        #[serde(rename = "Text", default)]
        text: String,
        #[serde(rename = "FirstURL", default)]
        first_url: String,
        #[serde(rename = "Result", default)]
        result: String,
    },
}

impl InstantAnswer {
    fn into_hits(self) -> Vec<SearchHit> {
        let mut hits = Vec::new();
        if !self.abstract_text.trim().is_empty() {
            hits.push(SearchHit {
                title: self.heading,
                snippet: self.abstract_text,
            });
        }
        flatten_topics(self.related_topics, &mut hits);
        hits
    }
}

fn flatten_topics(topics: Vec<RelatedTopic>, hits: &mut Vec<SearchHit>) {
    for topic in topics {
        match topic {
            RelatedTopic::Group { topics } => flatten_topics(topics, hits),
            RelatedTopic::Entry {
                text,
                first_url,
                result,
            } => {
                if text.trim().is_empty() {
                    continue;
                }
                hits.push(entry_hit(text, first_url, &result));
            }
        }
    }
}

/// DuckDuckGo puts the title in the anchor of the `Result` HTML and repeats
/// it at the start of `Text`, usually followed by " - ".
fn entry_hit(text: String, first_url: String, result_html: &str) -> SearchHit {
    let title = anchor_text(result_html)
        .or_else(|| text.split(" - ").next().map(str::to_string))
        .filter(|title| !title.trim().is_empty())
        .unwrap_or(first_url);

    let snippet = text
        .strip_prefix(title.as_str())
        .map(|rest| rest.trim_start_matches(" - ").trim())
        .filter(|rest| !rest.is_empty())
        .map(str::to_string)
        .unwrap_or(text);

    SearchHit { title, snippet }
}

fn anchor_text(html: &str) -> Option<String> {
    let start = html.find("<a")?;
    let open_end = start + html[start..].find('>')? + 1;
    let close = open_end + html[open_end..].find("</a>")?;
    let text = html[open_end..close].trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => format!("{}...", &text[..byte_index]),
        None => text.to_string(),
    }
}

/// Renders hits as one block of text: a header line followed by one
/// `- title: snippet` line per hit.
pub fn format_results(hits: &[SearchHit], snippet_chars: usize) -> String {
    let mut lines = vec![RESULTS_HEADER.to_string()];
    if hits.is_empty() {
        lines.push(NO_RESULTS.to_string());
    }
    for hit in hits {
        lines.push(format!(
            "- {}: {}",
            hit.title,
            truncate_chars(&hit.snippet, snippet_chars)
        ));
    }
    lines.join("\n")
}

pub struct SearchAdapter {
    http: Client,
    settings: SearchSettings,
}

impl SearchAdapter {
    pub fn new(settings: SearchSettings) -> Self {
        Self {
            http: Client::new(),
            settings,
        }
    }

    async fn fetch_hits(&self, query: &str) -> Result<Vec<SearchHit>, AdapterError> {
        let url = format!("{}/", self.settings.base_url.trim_end_matches('/'));
        let response = self
            .http
            .get(url)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ])
            .send()
            .await
            .map_err(|e| AdapterError::Upstream(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AdapterError::Upstream(format!(
                "search service returned {status}"
            )));
        }
        let answer: InstantAnswer = response
            .json()
            .await
            .map_err(|e| AdapterError::Upstream(format!("could not decode search results: {e}")))?;

        let mut hits = answer.into_hits();
        hits.truncate(self.settings.max_results);
        Ok(hits)
    }
}

#[async_trait]
impl WebSearch for SearchAdapter {
    async fn search(&self, query: &str) -> Outcome {
        tracing::info!("Searching the web for {:?}", query);
        match self.fetch_hits(query).await {
            Ok(hits) => {
                tracing::debug!("Search returned {} hits", hits.len());
                Outcome::ok(format_results(&hits, self.settings.snippet_chars))
            }
            Err(e) => {
                tracing::warn!("Web search failed: {}", e);
                e.into()
            }
        }
    }
}
