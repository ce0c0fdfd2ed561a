//! bookswap-server: HTTP API server for the BookSwap exchange platform.
//!
//! This crate provides:
//! - REST endpoints for the offer lifecycle, conversations, notifications,
//!   and reviews
//! - Session-token validation (JWT); token issuance is an external
//!   collaborator
//! - Server-Sent Events (SSE) for per-user notification streams and
//!   per-conversation chat streams
//!
//! # Architecture
//!
//! The server is built on Axum. The domain engine (`bookswap-exchange`)
//! never touches the transport; it publishes through the [`events::ChannelRegistry`],
//! which owns one broadcast channel per connected user and per
//! conversation and implements the engine's `LivePush` capability.

pub mod config;
pub mod error;
pub mod events;
pub mod extract;
pub mod routes;
pub mod state;

// Re-exports for convenience
pub use config::{ConfigError, ServerConfig};
pub use error::{ApiError, ApiResult};
pub use events::ChannelRegistry;
pub use state::AppState;

// Re-export dependent crates
pub use bookswap_core;
pub use bookswap_exchange;
pub use bookswap_store;
