use async_trait::async_trait;
use serde::Deserialize;

use super::{single_string_schema, string_arg, Tool, ToolError};

const DUCKDUCKGO_ENDPOINT: &str = "https://api.duckduckgo.com/";
const MAX_RELATED_TOPICS: usize = 5;

/// Web search through the DuckDuckGo Instant Answer API
pub struct WebSearchTool {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InstantAnswer {
    #[serde(default)]
    heading: String,
    #[serde(default)]
    abstract_text: String,
    #[serde(default, rename = "AbstractURL")]
    abstract_url: String,
    // Instant answers such as timezones arrive as objects
    #[serde(default)]
    answer: serde_json::Value,
    #[serde(default)]
    definition: serde_json::Value,
    #[serde(default)]
    related_topics: Vec<RelatedTopic>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RelatedTopic {
    #[serde(default)]
    text: Option<String>,
    #[serde(default, rename = "FirstURL")]
    first_url: Option<String>,
    // Grouped topics nest another level
    #[serde(default)]
    topics: Vec<RelatedTopic>,
}

impl WebSearchTool {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: DUCKDUCKGO_ENDPOINT.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub async fn search(&self, query: &str) -> Result<String, ToolError> {
        tracing::debug!(query, "web search");
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ToolError::Service {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        // The API answers with `application/x-javascript`, so parse the body by hand
        let body = response.text().await?;
        let answer: InstantAnswer = serde_json::from_str(&body)?;
        Ok(render_answer(query, &answer))
    }
}

impl Default for WebSearchTool {
    fn default() -> Self {
        Self::new()
    }
}

fn flatten_topics<'a>(topics: &'a [RelatedTopic], out: &mut Vec<&'a RelatedTopic>) {
    for topic in topics {
        if topic.topics.is_empty() {
            out.push(topic);
        } else {
            flatten_topics(&topic.topics, out);
        }
    }
}

fn non_empty_str(value: &serde_json::Value) -> Option<&str> {
    value.as_str().filter(|s| !s.is_empty())
}

fn render_answer(query: &str, answer: &InstantAnswer) -> String {
    let mut sections = Vec::new();

    if !answer.heading.is_empty() {
        sections.push(answer.heading.clone());
    }
    if !answer.abstract_text.is_empty() {
        let mut text = answer.abstract_text.clone();
        if !answer.abstract_url.is_empty() {
            text.push_str(&format!(" (source: {})", answer.abstract_url));
        }
        sections.push(text);
    }
    if let Some(text) = non_empty_str(&answer.answer) {
        sections.push(format!("Answer: {}", text));
    }
    if let Some(text) = non_empty_str(&answer.definition) {
        sections.push(format!("Definition: {}", text));
    }

    let mut topics = Vec::new();
    flatten_topics(&answer.related_topics, &mut topics);
    let related: Vec<String> = topics
        .into_iter()
        .filter_map(|topic| {
            let text = topic.text.as_deref().filter(|t| !t.is_empty())?;
            Some(match topic.first_url.as_deref() {
                Some(url) if !url.is_empty() => format!("- {} ({})", text, url),
                _ => format!("- {}", text),
            })
        })
        .take(MAX_RELATED_TOPICS)
        .collect();
    if !related.is_empty() {
        sections.push(format!("Related:\n{}", related.join("\n")));
    }

    if sections.is_empty() {
        format!("No results found for '{}'.", query)
    } else {
        sections.join("\n\n")
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web for up-to-date information about destinations, events, prices and travel conditions."
    }

    fn input_schema(&self) -> serde_json::Value {
        single_string_schema("query", "The search query")
    }

    async fn call(&self, input: serde_json::Value) -> Result<String, ToolError> {
        let query = string_arg(&input, "query")?;
        self.search(&query).await
    }
}
