pub mod builders;
pub mod cmd;
pub mod expr;
pub mod operators;

pub use self::cmd::Query;
pub use self::expr::{Expr, Join};
pub use self::operators::{Action, AggFunc, BinOp, JoinKind, SortOrder, UnaryOp};
