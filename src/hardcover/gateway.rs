//! The narrow interface the store uses to reach the remote API.

use async_trait::async_trait;
use thiserror::Error;

use super::params::ListKey;
use super::types::{ConfirmedSession, EditionId, ProgressUpdate, SessionId, UserBookEntry};

/// Classified failure of a remote call.
///
/// Messages are kept as strings so the error can be cloned into every
/// subscriber's copy of a query state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
  /// Missing or rejected credential
  #[error("authentication failed: {0}")]
  Auth(String),
  /// Transport failure, may succeed on a later attempt
  #[error("network error: {0}")]
  Network(String),
  /// Semantic error reported by the GraphQL endpoint
  #[error("GraphQL error: {0}")]
  GraphQl(String),
  /// Malformed request payload
  #[error("invalid request: {0}")]
  Validation(String),
}

impl GatewayError {
  pub fn not_initialized() -> Self {
    Self::Auth("Hardcover client not initialized".to_string())
  }

  /// Whether another attempt could succeed
  pub fn is_transient(&self) -> bool {
    matches!(self, Self::Network(_))
  }
}

pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// Remote API consumed by the store.
#[async_trait]
pub trait RemoteGateway: Send + Sync {
  /// Fetch the user's books matching the list key, in server order.
  async fn fetch_list(&self, key: &ListKey) -> GatewayResult<Vec<UserBookEntry>>;

  /// Write progress for a reading session.
  async fn write_progress(
    &self,
    session_id: SessionId,
    update: ProgressUpdate,
  ) -> GatewayResult<ConfirmedSession>;

  /// Page count of an edition, if the server knows it.
  async fn edition_page_count(&self, edition_id: EditionId) -> GatewayResult<Option<u32>>;
}
