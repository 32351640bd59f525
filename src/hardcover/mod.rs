pub mod api_types;
pub mod client;
pub mod gateway;
pub mod params;
pub mod types;

pub use client::HardcoverClient;
pub use gateway::{GatewayError, GatewayResult, RemoteGateway};
pub use params::{BookStatus, ListKey, SortSpec};
pub use types::{ConfirmedSession, ProgressUpdate, SessionId, UserBookEntry};
