use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::config::{Config, RetryConfig};
use crate::hardcover::api_types::{
  ApiEditionPagesData, ApiGraphQlError, ApiUpdateReadData, ApiUserBooksData, GraphQlResponse,
};
use crate::hardcover::gateway::{GatewayError, GatewayResult, RemoteGateway};
use crate::hardcover::params::ListKey;
use crate::hardcover::types::{
  ConfirmedSession, EditionId, ProgressUpdate, SessionId, UserBookEntry,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

const GET_USER_BOOKS: &str = r#"query GetUserBooks($limit: Int!, $statusId: Int!, $orderBy: [user_books_order_by!]) {
  me {
    user_books(where: {status_id: {_eq: $statusId}}, limit: $limit, order_by: $orderBy) {
      status_id
      book { id title pages image { url } }
      edition { id pages image { url } }
      user_book_reads(order_by: {id: desc}, limit: 1) {
        id
        progress_pages
        progress
        started_at
        edition { id pages image { url } }
      }
    }
  }
}"#;

const UPDATE_USER_BOOK_READ: &str = r#"mutation UpdateUserBookRead($id: Int!, $object: DatesReadInput!) {
  update_user_book_read(id: $id, object: $object) {
    error
    user_book_read { id progress progress_pages edition_id }
  }
}"#;

const GET_EDITION_PAGE_COUNT: &str = r#"query GetEditionPageCount($editionId: Int!) {
  editions_by_pk(id: $editionId) { id pages book { pages } }
}"#;

/// Hardcover GraphQL API client
#[derive(Clone)]
pub struct HardcoverClient {
  http: reqwest::Client,
  url: Url,
  token: String,
  retry: RetryConfig,
}

impl HardcoverClient {
  pub fn new(config: &Config, token: String) -> Result<Self> {
    if token.trim().is_empty() {
      return Err(eyre!("Hardcover API token is empty"));
    }

    let url = config.api_url()?;
    let http = reqwest::Client::builder()
      .timeout(REQUEST_TIMEOUT)
      .user_agent(concat!("hardshelf/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      http,
      url,
      // Tokens are often pasted with the scheme included
      token: token.trim().trim_start_matches("Bearer ").to_string(),
      retry: config.retry,
    })
  }

  /// Run a GraphQL document, retrying transient failures with exponential backoff.
  async fn query<T: DeserializeOwned>(&self, document: &str, variables: Value) -> GatewayResult<T> {
    let attempts = self.retry.attempts.max(1);
    let mut attempt = 1;

    loop {
      match self.send(document, &variables).await {
        Err(e) if e.is_transient() && attempt < attempts => {
          let delay = self.retry.base_delay() * 2u32.saturating_pow(attempt - 1);
          warn!(attempt, ?delay, error = %e, "Hardcover request failed, retrying");
          tokio::time::sleep(delay).await;
          attempt += 1;
        }
        other => return other,
      }
    }
  }

  async fn send<T: DeserializeOwned>(&self, document: &str, variables: &Value) -> GatewayResult<T> {
    let body = json!({
      "query": document,
      "variables": variables,
    });

    let response = self
      .http
      .post(self.url.clone())
      .bearer_auth(&self.token)
      .json(&body)
      .send()
      .await
      .map_err(|e| GatewayError::Network(e.to_string()))?;

    let status = response.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
      return Err(GatewayError::Auth(format!("server responded {}", status)));
    }
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
      return Err(GatewayError::Network(format!("server responded {}", status)));
    }

    let payload: GraphQlResponse<T> = response.json().await.map_err(|e| {
      if e.is_decode() {
        GatewayError::GraphQl(format!("malformed response: {}", e))
      } else {
        GatewayError::Network(e.to_string())
      }
    })?;

    if !payload.errors.is_empty() {
      return Err(classify_graphql_errors(&payload.errors));
    }

    payload
      .data
      .ok_or_else(|| GatewayError::GraphQl("No data returned from Hardcover API".to_string()))
  }
}

/// Map GraphQL error codes onto the gateway taxonomy.
pub fn classify_graphql_errors(errors: &[ApiGraphQlError]) -> GatewayError {
  let message = errors
    .iter()
    .map(|e| e.message.as_str())
    .collect::<Vec<_>>()
    .join(", ");

  let codes: Vec<&str> = errors.iter().filter_map(|e| e.code()).collect();
  if codes
    .iter()
    .any(|c| matches!(*c, "invalid-jwt" | "access-denied" | "invalid-headers"))
  {
    GatewayError::Auth(message)
  } else if codes
    .iter()
    .any(|c| matches!(*c, "validation-failed" | "parse-failed" | "bad-request"))
  {
    GatewayError::Validation(message)
  } else {
    GatewayError::GraphQl(message)
  }
}

#[async_trait]
impl RemoteGateway for HardcoverClient {
  async fn fetch_list(&self, key: &ListKey) -> GatewayResult<Vec<UserBookEntry>> {
    debug!(list = %key.description(), "Fetching user books");

    let data: ApiUserBooksData = self
      .query(
        GET_USER_BOOKS,
        json!({
          "limit": key.limit,
          "statusId": key.status.id(),
          "orderBy": key.sort.order_by(),
        }),
      )
      .await?;

    Ok(data.into_entries())
  }

  async fn write_progress(
    &self,
    session_id: SessionId,
    update: ProgressUpdate,
  ) -> GatewayResult<ConfirmedSession> {
    let mut object = Map::new();
    if let Some(pages) = update.pages {
      object.insert("progress_pages".to_string(), json!(pages));
    }
    if let Some(seconds) = update.seconds.filter(|s| *s > 0) {
      object.insert("progress_seconds".to_string(), json!(seconds));
    }
    if object.is_empty() {
      return Err(GatewayError::Validation(
        "progress update has neither pages nor seconds".to_string(),
      ));
    }

    debug!(session_id, ?update, "Writing reading progress");

    let data: ApiUpdateReadData = self
      .query(
        UPDATE_USER_BOOK_READ,
        json!({ "id": session_id, "object": Value::Object(object) }),
      )
      .await?;

    let payload = data.update_user_book_read.ok_or_else(|| {
      GatewayError::GraphQl(format!("reading session {} not found", session_id))
    })?;
    if let Some(error) = payload.error {
      return Err(GatewayError::Validation(error));
    }

    payload
      .user_book_read
      .map(|read| read.into_confirmed(session_id))
      .ok_or_else(|| GatewayError::GraphQl("update returned no reading session".to_string()))
  }

  async fn edition_page_count(&self, edition_id: EditionId) -> GatewayResult<Option<u32>> {
    let data: ApiEditionPagesData = self
      .query(GET_EDITION_PAGE_COUNT, json!({ "editionId": edition_id }))
      .await?;

    Ok(data.page_count())
  }
}
