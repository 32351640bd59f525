//! Holder for the one active gateway.
//!
//! The context starts disconnected. It is connected once credentials are
//! available and replaced or disconnected when they change; every operation
//! reads the current gateway at the moment it runs.

use std::sync::{Arc, PoisonError, RwLock};
use tracing::info;

use crate::hardcover::{GatewayError, GatewayResult, RemoteGateway};

#[derive(Clone, Default)]
pub struct ClientContext {
  gateway: Arc<RwLock<Option<Arc<dyn RemoteGateway>>>>,
}

impl ClientContext {
  pub fn new() -> Self {
    Self::default()
  }

  /// A context already connected to `gateway`
  #[cfg(test)]
  pub fn connected(gateway: Arc<dyn RemoteGateway>) -> Self {
    let ctx = Self::new();
    ctx.connect(gateway);
    ctx
  }

  /// Install `gateway` as the active client, replacing any previous one.
  pub fn connect(&self, gateway: Arc<dyn RemoteGateway>) {
    let mut slot = self.gateway.write().unwrap_or_else(PoisonError::into_inner);
    if slot.replace(gateway).is_some() {
      info!("Replaced Hardcover client");
    } else {
      info!("Connected Hardcover client");
    }
  }

  pub fn disconnect(&self) {
    let mut slot = self.gateway.write().unwrap_or_else(PoisonError::into_inner);
    if slot.take().is_some() {
      info!("Disconnected Hardcover client");
    }
  }

  pub fn is_connected(&self) -> bool {
    self
      .gateway
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .is_some()
  }

  /// The active gateway, or an auth error when no credential is configured.
  pub fn gateway(&self) -> GatewayResult<Arc<dyn RemoteGateway>> {
    self
      .gateway
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .clone()
      .ok_or_else(GatewayError::not_initialized)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::FakeGateway;

  #[test]
  fn test_disconnected_context_reports_auth_error() {
    let ctx = ClientContext::new();
    assert!(!ctx.is_connected());
    assert!(matches!(ctx.gateway(), Err(GatewayError::Auth(_))));
  }

  #[test]
  fn test_connect_and_disconnect() {
    let ctx = ClientContext::new();
    ctx.connect(Arc::new(FakeGateway::new(Vec::new())));
    assert!(ctx.is_connected());
    assert!(ctx.gateway().is_ok());

    // Clones share the slot
    let other = ctx.clone();
    other.disconnect();
    assert!(!ctx.is_connected());
  }
}
