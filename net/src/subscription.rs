//! The subscription listener: issues `.u.sub[...]` on a dedicated async
//! connection and delivers `(tableName, data)` updates to a user callback
//! in arrival order.
//!
//! Built directly on [`crate::transport::AsyncTransport`] rather than
//! [`crate::session::AsyncSession`] — a subscription connection never
//! sends further sync requests after the initial `.u.sub` call, it only
//! receives async push frames, so the retry-wrapped session layer doesn't
//! apply here.

use vexdb_core::error::Error;
use vexdb_core::value::{Value, Vector};

use crate::config::ConnectOptions;
use crate::session::call_frame;
use crate::transport::AsyncTransport;

pub struct Subscription {
    transport: AsyncTransport,
}

impl Subscription {
    /// Connect and issue `.u.sub[tableSymbol; symbolVectorOrEmpty]`.
    pub async fn subscribe(opts: ConnectOptions, table: &str, columns: Option<&[String]>) -> Result<Self, Error> {
        let mut transport = AsyncTransport::connect(&opts).await?;
        let cols = match columns {
            Some(names) => Value::Vector(Vector::Symbol(names.iter().cloned().map(Some).collect()), vexdb_core::value::Attr::None),
            None => Value::Vector(Vector::Symbol(Vec::new()), vexdb_core::value::Attr::None),
        };
        let frame = call_frame(".u.sub", &[Value::symbol(table), cols]);
        transport.send(&frame).await?;
        Ok(Subscription { transport })
    }

    /// Receive updates until the connection closes or `callback` returns
    /// `false`. The server delivers `(functionSym; tableName; data)`; the
    /// leading function symbol is stripped before the callback runs.
    pub async fn listen<F>(mut self, mut callback: F) -> Result<(), Error>
    where
        F: FnMut(String, Value) -> bool,
    {
        loop {
            let frame = self.transport.recv().await?;
            let Value::Mixed(mut items) = frame else {
                continue;
            };
            if items.len() < 3 {
                continue;
            }
            let data = items.pop().expect("checked len >= 3");
            let table_name = match items.pop() {
                Some(Value::Scalar(vexdb_core::value::Scalar::Symbol(name))) => name,
                _ => continue,
            };
            if !callback(table_name, data) {
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixed_frame_with_fewer_than_three_items_is_ignored() {
        let frame = Value::Mixed(vec![Value::symbol("upd"), Value::symbol("trade")]);
        assert!(matches!(frame, Value::Mixed(items) if items.len() < 3));
    }
}
