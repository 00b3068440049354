// crates/askbridge/src/tools/search.rs
// Web search over SerpAPI (Google engine)

use super::{ToolAdapter, ToolDescriptor, ToolError, ToolKind, string_arg};
use crate::config::SearchSettings;
use crate::utils::truncate;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

pub const TOOL_NAME: &str = "web_search";
/// Provider hard cap on results per call
pub const MAX_RESULTS: u64 = 10;

/// One organic search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub title: String,
    pub link: String,
    pub snippet: String,
    pub position: u64,
}

pub struct WebSearchTool {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    default_results: u64,
    descriptor: ToolDescriptor,
}

impl WebSearchTool {
    /// None when no SerpAPI key is configured
    pub fn from_settings(settings: &SearchSettings) -> Option<Self> {
        let api_key = settings.api_key.clone()?;
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Some(Self {
            client,
            api_key,
            base_url: settings.base_url.clone(),
            default_results: u64::from(settings.default_results),
            descriptor: Self::describe(),
        })
    }

    fn describe() -> ToolDescriptor {
        ToolDescriptor::new(
            TOOL_NAME,
            "Search the web with Google. Returns up to 10 results with title, link and snippet.",
            json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Search query"
                    },
                    "num_results": {
                        "type": "integer",
                        "description": "Number of results to return (1-10)",
                        "minimum": 1,
                        "maximum": MAX_RESULTS,
                        "default": 5
                    }
                },
                "required": ["query"]
            }),
            ToolKind::Data,
        )
    }

    fn request_url(&self, query: &str, num: u64) -> String {
        let sep = if self.base_url.contains('?') { '&' } else { '?' };
        format!(
            "{}{}engine=google&q={}&num={}&api_key={}",
            self.base_url,
            sep,
            urlencoding::encode(query),
            num,
            urlencoding::encode(&self.api_key)
        )
    }
}

/// Clamp a requested result count into 1..=10
fn result_count(arguments: &Value, default: u64) -> u64 {
    arguments
        .get("num_results")
        .and_then(|v| v.as_u64().or_else(|| v.as_str().and_then(|s| s.parse().ok())))
        .unwrap_or(default)
        .clamp(1, MAX_RESULTS)
}

/// Map a non-success HTTP status to a tool failure
fn status_error(status: StatusCode, body: &str) -> ToolError {
    let provider_msg = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| truncate(body, 200));

    if is_no_results(&provider_msg) {
        return ToolError::empty(provider_msg);
    }
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ToolError::unavailable(format!("search provider rejected the API key ({})", status))
        }
        s if s == StatusCode::TOO_MANY_REQUESTS || s.is_server_error() => {
            ToolError::unavailable(format!("search provider returned HTTP {}", s.as_u16()))
        }
        s => ToolError::invalid(format!("search rejected (HTTP {}): {}", s.as_u16(), provider_msg)),
    }
}

fn is_no_results(message: &str) -> bool {
    message.contains("hasn't returned any results") || message.contains("no results")
}

/// Extract organic results from a SerpAPI response body
pub fn parse_search_results(body: &Value, limit: usize) -> Result<Vec<SearchHit>, ToolError> {
    if let Some(err) = body.get("error").and_then(Value::as_str) {
        return Err(if is_no_results(err) {
            ToolError::empty(err)
        } else {
            ToolError::unavailable(format!("search provider error: {}", err))
        });
    }

    let hits: Vec<SearchHit> = body
        .get("organic_results")
        .and_then(Value::as_array)
        .map(|results| {
            results
                .iter()
                .take(limit)
                .enumerate()
                .map(|(i, r)| SearchHit {
                    title: r["title"].as_str().unwrap_or("(no title)").to_string(),
                    link: r["link"].as_str().unwrap_or_default().to_string(),
                    snippet: r["snippet"].as_str().unwrap_or_default().to_string(),
                    position: r["position"].as_u64().unwrap_or(i as u64 + 1),
                })
                .collect()
        })
        .unwrap_or_default();

    if hits.is_empty() {
        return Err(ToolError::empty("search returned no results"));
    }
    Ok(hits)
}

#[async_trait]
impl ToolAdapter for WebSearchTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn invoke(&self, arguments: &Value) -> Result<Value, ToolError> {
        let query = string_arg(arguments, "query")
            .ok_or_else(|| ToolError::invalid("search query is required"))?;
        let num = result_count(arguments, self.default_results);

        debug!(query = %query, num, "Web search");
        let response = self
            .client
            .get(self.request_url(query, num))
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                let e = e.without_url();
                if e.is_timeout() {
                    ToolError::unavailable("search request timed out")
                } else if e.is_connect() {
                    ToolError::unavailable("could not connect to the search provider")
                } else {
                    ToolError::unavailable(format!("search request failed: {}", e))
                }
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| {
                ToolError::unavailable(format!("failed to read search response: {}", e.without_url()))
            })?;

        if !status.is_success() {
            let err = status_error(status, &text);
            warn!(status = %status, error = %err, "Web search failed");
            return Err(err);
        }

        let body: Value = serde_json::from_str(&text).map_err(|e| {
            ToolError::unavailable(format!("failed to parse search response: {}", e))
        })?;
        let hits = parse_search_results(&body, num as usize)?;

        info!(query = %query, results = hits.len(), "Web search complete");
        Ok(json!({ "query": query, "results": hits }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolErrorKind;
    use std::time::Duration;

    fn settings(base_url: &str) -> SearchSettings {
        SearchSettings {
            api_key: Some("serp-key".into()),
            base_url: base_url.into(),
            default_results: 5,
            timeout: Duration::from_millis(500),
        }
    }

    // ============================================================================
    // Construction
    // ============================================================================

    #[test]
    fn test_requires_key() {
        let mut s = settings("https://serpapi.com/search");
        s.api_key = None;
        assert!(WebSearchTool::from_settings(&s).is_none());
    }

    #[test]
    fn test_request_url() {
        let tool = WebSearchTool::from_settings(&settings("https://serpapi.com/search")).unwrap();
        let url = tool.request_url("FF11 アークエンジェル", 5);
        assert!(url.starts_with("https://serpapi.com/search?engine=google&q=FF11%20"));
        assert!(url.ends_with("&num=5&api_key=serp-key"));
        assert!(url::Url::parse(&url).is_ok());

        let tool = WebSearchTool::from_settings(&settings("http://proxy/search?hl=ja")).unwrap();
        assert!(tool.request_url("q", 1).starts_with("http://proxy/search?hl=ja&engine=google"));
    }

    #[test]
    fn test_result_count_clamped() {
        assert_eq!(result_count(&json!({}), 5), 5);
        assert_eq!(result_count(&json!({"num_results": 0}), 5), 1);
        assert_eq!(result_count(&json!({"num_results": 50}), 5), 10);
        assert_eq!(result_count(&json!({"num_results": "3"}), 5), 3);
    }

    // ============================================================================
    // Response parsing
    // ============================================================================

    #[test]
    fn test_parse_organic_results() {
        let body = json!({
            "search_metadata": {"status": "Success"},
            "organic_results": [
                {
                    "position": 1,
                    "title": "Fighters of the Crystal - Final Fantasy Wiki",
                    "link": "https://finalfantasy.fandom.com/wiki/Fighters_of_the_Crystal",
                    "snippet": "The battle theme for Ark Angels in Chains of Promathia."
                },
                {
                    "title": "FFXI OST",
                    "link": "https://example.org/ffxi"
                }
            ]
        });
        let hits = parse_search_results(&body, 10).unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits[0].title.contains("Fighters of the Crystal"));
        assert_eq!(hits[1].position, 2);
        assert_eq!(hits[1].snippet, "");
    }

    #[test]
    fn test_parse_respects_limit() {
        let results: Vec<Value> = (1..=10)
            .map(|i| json!({"title": format!("r{}", i), "link": "l", "position": i}))
            .collect();
        let hits = parse_search_results(&json!({"organic_results": results}), 3).unwrap();
        assert_eq!(hits.len(), 3);
    }

    #[test]
    fn test_parse_no_results_error() {
        let body = json!({"error": "Google hasn't returned any results for this query."});
        let err = parse_search_results(&body, 5).unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::EmptyResult);
    }

    #[test]
    fn test_parse_empty_organic() {
        let err = parse_search_results(&json!({"organic_results": []}), 5).unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::EmptyResult);
        let err = parse_search_results(&json!({}), 5).unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::EmptyResult);
    }

    #[test]
    fn test_parse_provider_error() {
        let err = parse_search_results(&json!({"error": "Invalid API key."}), 5).unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::Unavailable);
    }

    #[test]
    fn test_status_errors() {
        assert_eq!(
            status_error(StatusCode::UNAUTHORIZED, r#"{"error":"Invalid API key"}"#).kind,
            ToolErrorKind::Unavailable
        );
        assert_eq!(
            status_error(StatusCode::SERVICE_UNAVAILABLE, "").kind,
            ToolErrorKind::Unavailable
        );
        assert_eq!(
            status_error(StatusCode::BAD_REQUEST, r#"{"error":"Missing query `q` parameter."}"#).kind,
            ToolErrorKind::InvalidArguments
        );
        assert_eq!(
            status_error(
                StatusCode::BAD_REQUEST,
                r#"{"error":"Google hasn't returned any results for this query."}"#
            )
            .kind,
            ToolErrorKind::EmptyResult
        );
    }

    // ============================================================================
    // Invocation
    // ============================================================================

    #[tokio::test]
    async fn test_invoke_requires_query() {
        let tool = WebSearchTool::from_settings(&settings("http://127.0.0.1:1/search")).unwrap();
        let err = tool.invoke(&json!({"query": " "})).await.unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::InvalidArguments);
    }

    #[tokio::test]
    async fn test_invoke_unreachable_is_unavailable() {
        let tool = WebSearchTool::from_settings(&settings("http://127.0.0.1:1/search")).unwrap();
        let err = tool.invoke(&json!({"query": "FF11"})).await.unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::Unavailable);
        assert!(!err.message.contains("serp-key"));
    }

    /// Serves one response that promises more body than it sends
    async fn truncated_body_server() -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 2048];
            let _ = socket.read(&mut buf).await;
            let _ = socket
                .write_all(
                    b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\
                      Content-Length: 1000\r\n\r\n{\"organic_results\": [",
                )
                .await;
        });
        format!("http://{}/search", addr)
    }

    #[tokio::test]
    async fn test_body_error_hides_api_key() {
        let tool = WebSearchTool::from_settings(&settings(&truncated_body_server().await)).unwrap();
        let err = tool.invoke(&json!({"query": "FF11"})).await.unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::Unavailable);
        assert!(err.message.starts_with("failed to read search response"));
        assert!(!err.message.contains("serp-key"));
        assert!(!err.message.contains("api_key"));
    }
}
