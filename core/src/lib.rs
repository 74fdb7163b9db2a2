//! Protocol-level types shared by every transport: the typed value model,
//! the wire codec, the query AST and its compiler, and schema reflection.
//!
//! This crate is intentionally I/O-free — sockets, TLS, pooling, and
//! service discovery live in `vexdb-net`, which depends on this crate the
//! way `qail-pg` depended on `qail-core` for its AST and type system.

pub mod ast;
pub mod codec;
pub mod compiler;
pub mod dsn;
pub mod error;
pub mod literal;
pub mod model;
pub mod temporal;
pub mod value;

pub use ast::{Action, AggFunc, BinOp, Expr, JoinKind, Query, SortOrder, UnaryOp};
pub use codec::frame::MessageKind;
pub use codec::{decode_message, encode_message};
pub use compiler::compile;
pub use dsn::Dsn;
pub use error::{Error, Result};
pub use model::{Field, Registry, SchemaDescriptor};
pub use value::{Attr, Kind, Scalar, Table, Value, Vector};
