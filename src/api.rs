use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

use crate::query::Order;

/// Fallback when the backend's error body is absent or malformed.
pub const GENERIC_FETCH_ERROR: &str = "Something went wrong while fetching videos.";

/// A single video result. Immutable once received.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VideoItem {
  pub id: String,
  pub title: String,
  pub thumbnail_url: String,
  pub channel_title: String,
  pub published_at: String,
  pub url: String,
}

/// One page of search results.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoResponse {
  #[serde(default)]
  pub items: Vec<VideoItem>,
  pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
  error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
  message: Option<String>,
}

#[derive(Debug, Error)]
pub enum FetchError {
  /// Non-2xx response; the message comes from the structured error body when possible.
  #[error("{0}")]
  Http(String),
  /// Transport-level failure.
  #[error("{}", GENERIC_FETCH_ERROR)]
  Network(#[from] reqwest::Error),
  /// Request intentionally superseded or torn down. Never surfaced to the user.
  #[error("request cancelled")]
  Cancelled,
}

impl FetchError {
  pub fn is_cancelled(&self) -> bool {
    matches!(self, FetchError::Cancelled)
  }
}

/// Extract a human-readable message from an error response body,
/// degrading to the generic message on any parse failure.
fn error_message_from_body(body: &str) -> String {
  serde_json::from_str::<ApiErrorBody>(body)
    .ok()
    .and_then(|b| b.error)
    .and_then(|e| e.message)
    .filter(|m| !m.is_empty())
    .unwrap_or_else(|| GENERIC_FETCH_ERROR.to_string())
}

/// Parameters for one paginated search request.
#[derive(Debug, Clone)]
pub struct FetchParams {
  pub query: String,
  pub order: Order,
  pub limit: usize,
  pub page_token: Option<String>,
}

/// Issue one search request against the backend.
/// `GET <base>?query=..&order=..&limit=..[&pageToken=..]`
pub async fn fetch_videos(client: &Client, base_url: &str, params: &FetchParams) -> Result<VideoResponse, FetchError> {
  let mut query: Vec<(&str, String)> = vec![
    ("query", params.query.clone()),
    ("order", params.order.api_value().to_string()),
    ("limit", params.limit.to_string()),
  ];
  if let Some(ref token) = params.page_token {
    query.push(("pageToken", token.clone()));
  }

  let response = client.get(base_url).query(&query).send().await?;
  if !response.status().is_success() {
    let body = response.text().await.unwrap_or_default();
    return Err(FetchError::Http(error_message_from_body(&body)));
  }
  Ok(response.json::<VideoResponse>().await?)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn error_body_with_message_is_used() {
    let body = r#"{"error":{"message":"quota exceeded","code":"quotaExceeded","status":403}}"#;
    assert_eq!(error_message_from_body(body), "quota exceeded");
  }

  #[test]
  fn error_body_without_message_falls_back() {
    assert_eq!(error_message_from_body(r#"{"error":{}}"#), GENERIC_FETCH_ERROR);
    assert_eq!(error_message_from_body(r#"{"error":{"message":""}}"#), GENERIC_FETCH_ERROR);
    assert_eq!(error_message_from_body("{}"), GENERIC_FETCH_ERROR);
  }

  #[test]
  fn malformed_error_body_falls_back() {
    assert_eq!(error_message_from_body("<html>502</html>"), GENERIC_FETCH_ERROR);
    assert_eq!(error_message_from_body(""), GENERIC_FETCH_ERROR);
  }

  #[test]
  fn response_deserializes_camel_case() {
    let json = r#"{
      "items": [{
        "id": "abc123",
        "title": "A video",
        "thumbnailUrl": "https://example.com/t.jpg",
        "channelTitle": "A channel",
        "publishedAt": "2024-05-01T12:00:00Z",
        "url": "https://example.com/watch?v=abc123"
      }],
      "nextPageToken": "T1"
    }"#;
    let response: VideoResponse = serde_json::from_str(json).unwrap();
    assert_eq!(response.items.len(), 1);
    assert_eq!(response.items[0].channel_title, "A channel");
    assert_eq!(response.next_page_token.as_deref(), Some("T1"));
  }

  #[test]
  fn response_without_token_or_items_deserializes() {
    let response: VideoResponse = serde_json::from_str("{}").unwrap();
    assert!(response.items.is_empty());
    assert!(response.next_page_token.is_none());
  }

  #[test]
  fn cancelled_is_distinguishable() {
    assert!(FetchError::Cancelled.is_cancelled());
    assert!(!FetchError::Http("boom".to_string()).is_cancelled());
  }
}
