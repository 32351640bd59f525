//! Query state envelope shared between the cache and its subscribers.
//!
//! Modeled after TanStack Query: a query keeps its last good `data` while a
//! refresh is in flight, and an error is reported alongside whatever data
//! was already there.
//!
//! # Example
//!
//! ```ignore
//! let state = handle.state();
//!
//! if state.is_loading {
//!     render_spinner();
//! } else if let Some(err) = &state.error {
//!     render_error(err);
//! } else if let Some(books) = state.data() {
//!     render_books(books);
//! }
//! ```

use chrono::{DateTime, Utc};

use crate::hardcover::GatewayError;

/// The state of a query
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState<T> {
  /// Last successfully fetched value, possibly patched by optimistic updates
  pub data: Option<T>,
  /// First fetch in flight, nothing to show yet
  pub is_loading: bool,
  /// Background refresh in flight, `data` still valid
  pub is_refetching: bool,
  pub is_error: bool,
  pub error: Option<GatewayError>,
  /// When `data` last arrived from the server
  pub updated_at: Option<DateTime<Utc>>,
}

impl<T> Default for QueryState<T> {
  fn default() -> Self {
    Self {
      data: None,
      is_loading: false,
      is_refetching: false,
      is_error: false,
      error: None,
      updated_at: None,
    }
  }
}

impl<T> QueryState<T> {
  /// Either a first load or a refresh is in flight
  pub fn is_fetching(&self) -> bool {
    self.is_loading || self.is_refetching
  }

  pub fn is_success(&self) -> bool {
    self.data.is_some() && !self.is_error
  }

  pub fn data(&self) -> Option<&T> {
    self.data.as_ref()
  }

  pub fn error(&self) -> Option<&GatewayError> {
    self.error.as_ref()
  }

  /// Enter the in-flight state. A refetch keeps `data` visible.
  pub(crate) fn begin(&mut self, refetch: bool) {
    if refetch {
      self.is_refetching = true;
    } else {
      self.is_loading = true;
    }
    self.is_error = false;
    self.error = None;
  }

  pub(crate) fn succeed(&mut self, data: T) {
    self.data = Some(data);
    self.is_loading = false;
    self.is_refetching = false;
    self.is_error = false;
    self.error = None;
    self.updated_at = Some(Utc::now());
  }

  /// Leave the in-flight state without touching `data` or the error.
  pub(crate) fn abandon(&mut self) {
    self.is_loading = false;
    self.is_refetching = false;
  }

  /// Record a failure; `data` is left untouched.
  pub(crate) fn fail(&mut self, error: GatewayError) {
    self.is_loading = false;
    self.is_refetching = false;
    self.is_error = true;
    self.error = Some(error);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_lifecycle_success() {
    let mut state: QueryState<Vec<i32>> = QueryState::default();
    assert!(!state.is_fetching());

    state.begin(false);
    assert!(state.is_loading);
    assert!(state.data().is_none());

    state.succeed(vec![1, 2, 3]);
    assert!(state.is_success());
    assert!(!state.is_fetching());
    assert!(state.updated_at.is_some());
    assert_eq!(state.data(), Some(&vec![1, 2, 3]));
  }

  #[test]
  fn test_refetch_keeps_data() {
    let mut state = QueryState::default();
    state.succeed(42);

    state.begin(true);
    assert!(state.is_refetching);
    assert!(!state.is_loading);
    assert_eq!(state.data(), Some(&42));

    state.fail(GatewayError::Network("timeout".to_string()));
    assert!(state.is_error);
    assert!(!state.is_fetching());
    assert_eq!(state.data(), Some(&42));
  }

  #[test]
  fn test_abandon_keeps_data() {
    let mut state = QueryState::default();
    state.succeed(7);
    let updated_at = state.updated_at;

    state.begin(true);
    state.abandon();
    assert!(!state.is_fetching());
    assert!(state.is_success());
    assert_eq!(state.data(), Some(&7));
    assert_eq!(state.updated_at, updated_at);
  }

  #[test]
  fn test_first_load_failure_has_no_data() {
    let mut state: QueryState<i32> = QueryState::default();
    state.begin(false);
    state.fail(GatewayError::Network("offline".to_string()));
    assert_eq!(state.data(), None);
    assert_eq!(state.error(), Some(&GatewayError::Network("offline".to_string())));

    // Retrying clears the error while in flight
    state.begin(false);
    assert!(!state.is_error);
    assert!(state.error().is_none());
  }
}
