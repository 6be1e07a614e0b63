//! # Adapters Layer (Hexagonal Architecture)
//!
//! Implements outbound port traits against real infrastructure.

#[cfg(feature = "http")]
mod http_rpc;

#[cfg(feature = "http")]
pub use http_rpc::{HttpAdminRpcClient, HttpClientError, ADD_PEER_REQUEST_ID, NODE_INFO_REQUEST_ID};
