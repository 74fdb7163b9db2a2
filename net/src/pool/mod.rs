//! Bounded connection pools: a sync variant on `std::sync::{Mutex,
//! Condvar}` and an async variant on `tokio::sync::{Mutex, Notify}`,
//! mirroring the blocking/cooperative duplication of [`crate::transport`]
//! and [`crate::session`].
//!
//! No teacher precedent — `qail-pg` never pooled connections. Grounded on
//! the bounded-wait contract named in spec.md §4.5/§5 directly: `min_size
//! ≤ size ≤ max_size`, `acquire` opens below cap or waits up to `timeout`,
//! `PoolExhaustedError` on deadline.

pub mod async_pool;
pub mod sync_pool;

pub use async_pool::AsyncPool;
pub use sync_pool::SyncPool;
