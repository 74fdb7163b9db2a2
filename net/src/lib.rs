//! Sockets, TLS, pooling, reflection-backed sessions, and service discovery
//! built on top of `vexdb-core`'s I/O-free codec, AST, and model types.

pub mod config;
pub mod discovery;
pub mod pool;
pub mod registry;
pub mod retry;
pub mod session;
pub mod subscription;
pub mod transport;

pub use config::ConnectOptions;
pub use pool::{AsyncPool, SyncPool};
pub use retry::RetryPolicy;
pub use session::{AsyncSession, ResultSet, RowView, SyncSession};
pub use subscription::Subscription;
pub use transport::{AsyncTransport, SyncTransport};
