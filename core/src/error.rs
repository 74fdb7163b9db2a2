//! Root error taxonomy.
//!
//! Mirrors the family tree from the protocol design: connection errors and
//! codec errors are leaves that convert into the crate-wide [`Error`] via
//! `#[from]`, the same shape `qail-pg`'s `PgError` used for its own (much
//! smaller) family.

use thiserror::Error;

/// Errors raised while encoding or decoding a typed value off the wire.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CodecError {
    #[error("unknown type code {0}")]
    UnknownTypeCode(i8),
    #[error("truncated input: expected at least {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },
    #[error("vector length mismatch: header declared {declared}, decoded {actual}")]
    LengthMismatch { declared: usize, actual: usize },
    #[error("invalid utf-8 in {field}")]
    InvalidUtf8 { field: &'static str },
    #[error("unsupported value for this operation: {0}")]
    Unsupported(&'static str),
    #[error("corrupt compressed frame: {0}")]
    Compression(String),
}

/// Errors raised while connecting, handshaking, or performing I/O.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("operation timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("connection closed by peer")]
    Closed,
    #[error("tls error: {0}")]
    Tls(String),
}

#[derive(Debug, Error)]
pub enum HandshakeError {
    #[error("handshake truncated: server closed before replying")]
    Truncated,
    #[error("handshake i/o error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
#[error("authentication rejected by server")]
pub struct AuthenticationError;

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("pool exhausted: no connection available within {0:?}")]
    Exhausted(std::time::Duration),
    #[error(transparent)]
    Connection(#[from] ConnectionError),
}

/// A query that failed on the server side. Carries the server's own message
/// verbatim; this variant is never retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("server error: {0}")]
pub struct QError(pub String);

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unknown field `{field}` on model `{model}`")]
    UnknownField { model: String, field: String },
    #[error("model `{0}` is not registered")]
    NotRegistered(String),
    #[error("reflection failed for `{table}`: {reason}")]
    Reflection { table: String, reason: String },
    #[error("unknown type character `{0}` returned by server metadata")]
    UnknownTypeChar(char),
    #[error("schema descriptor serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum DsnError {
    #[error("invalid dsn `{0}`: missing scheme")]
    MissingScheme(String),
    #[error("unsupported scheme `{0}`, expected `vexdb` or `vexdb+tls`")]
    UnsupportedScheme(String),
    #[error("invalid dsn `{0}`: {1}")]
    Malformed(String, &'static str),
}

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("service not found for fqn `{0}`")]
    ServiceNotFound(String),
    #[error("registry config error: {0}")]
    Config(String),
    #[error(transparent)]
    Connection(#[from] ConnectionError),
}

/// The crate-wide error type. Every family above converts into this via
/// `#[from]` so callers can use `?` through any layer.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    #[error(transparent)]
    Handshake(#[from] HandshakeError),
    #[error(transparent)]
    Authentication(#[from] AuthenticationError),
    #[error(transparent)]
    Pool(#[from] PoolError),
    #[error(transparent)]
    Server(#[from] QError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Dsn(#[from] DsnError),
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether this error belongs to the `ConnectionError` subtree — the
    /// default retryable family per the session's retry boundary.
    pub fn is_retryable_default(&self) -> bool {
        matches!(self, Error::Connection(_) | Error::Handshake(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qerror_never_matches_default_retryable() {
        let e: Error = QError("division by zero".into()).into();
        assert!(!e.is_retryable_default());
    }

    #[test]
    fn connection_error_is_default_retryable() {
        let e: Error = ConnectionError::Closed.into();
        assert!(e.is_retryable_default());
    }
}
