//! # Peer Count Derivation
//!
//! Compatibility constraint: geth's `admin.peers` console output is free text.
//! Each connected peer shows up once as an `enode://` entry, and again inside
//! the `eth: "handshake"` protocol description on nodes that have not finished
//! the eth handshake with it. The peer count is therefore
//! `count("enode://") - count("eth: \"handshake\"")`.
//!
//! Any change to geth's console rendering silently breaks this; keep the
//! heuristic here and nowhere else.

use super::types::ENODE_SCHEME;

/// Marker of the protocol-handshake line that repeats the enode token.
pub const HANDSHAKE_ARTIFACT: &str = "eth: \"handshake\"";

/// Derive the number of connected peers from raw `admin.peers` output.
pub fn count_peers(output: &str) -> i64 {
    let enodes = output.matches(ENODE_SCHEME).count() as i64;
    let handshakes = output.matches(HANDSHAKE_ARTIFACT).count() as i64;
    enodes - handshakes
}
