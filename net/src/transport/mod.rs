//! Transport layer: TCP + optional TLS, frame I/O, and the handshake.
//!
//! Split into a blocking variant (`sync_transport`, built on
//! `std::net::TcpStream`) and a cooperatively-scheduled variant
//! (`async_transport`, built on `tokio::net::TcpStream`) — the same
//! sync/async duplication `qail-pg`'s driver shows between its (absent,
//! never-retrieved) blocking path and its `driver/connection.rs` tokio
//! path, generalized here to actually carry both.
//!
//! Both variants share the handshake byte layout defined in this module so
//! the wire-level contract can't drift between them.

pub mod async_transport;
pub mod sync_transport;

pub use async_transport::AsyncTransport;
pub use sync_transport::SyncTransport;

use vexdb_core::error::{AuthenticationError, HandshakeError};

/// Build the handshake payload: `"user:password\x03\x00"`.
pub fn handshake_payload(user: &str, password: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(user.len() + password.len() + 3);
    out.extend_from_slice(user.as_bytes());
    out.push(b':');
    out.extend_from_slice(password.as_bytes());
    out.push(0x03);
    out.push(0x00);
    out
}

/// Interpret the server's handshake reply: zero bytes means the server
/// closed the connection (rejected auth); any non-empty reply is treated
/// as an accepted protocol-version ack.
pub fn check_handshake_reply(reply: &[u8]) -> Result<(), vexdb_core::error::Error> {
    if reply.is_empty() {
        return Err(AuthenticationError.into());
    }
    Ok(())
}

/// Truncated handshake (connection closed mid-read) maps to `HandshakeError`.
pub fn handshake_truncated() -> vexdb_core::error::Error {
    HandshakeError::Truncated.into()
}
