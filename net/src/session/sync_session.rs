use std::sync::Arc;
use std::thread;

use vexdb_core::ast::Query;
use vexdb_core::compiler;
use vexdb_core::error::{Error, ModelError, QError};
use vexdb_core::model::{Registry, SchemaDescriptor};
use vexdb_core::value::{Value, Vector};

use super::{call_frame, ResultSet};
use crate::config::ConnectOptions;
use crate::transport::SyncTransport;

fn string_value(s: &str) -> Value {
    Value::Vector(Vector::Char(s.bytes().map(Some).collect()), vexdb_core::value::Attr::None)
}

fn symbol_list(v: Value) -> Vec<String> {
    match v {
        Value::Vector(Vector::Symbol(xs), _) => xs.into_iter().flatten().collect(),
        _ => Vec::new(),
    }
}

/// A blocking session: owns one [`SyncTransport`] and applies the
/// connection's [`crate::retry::RetryPolicy`] around every request.
pub struct SyncSession {
    transport: SyncTransport,
    opts: ConnectOptions,
}

impl SyncSession {
    pub fn connect(opts: ConnectOptions) -> Result<Self, Error> {
        let transport = SyncTransport::connect(&opts)?;
        Ok(SyncSession { transport, opts })
    }

    fn request(&mut self, value: &Value) -> Result<Value, Error> {
        let policy = self.opts.retry.clone();
        let mut attempt = 0;
        loop {
            let outcome = self.transport.send(value).and_then(|_| self.transport.recv());
            match outcome {
                Ok(Value::Error(msg)) => return Err(QError(msg).into()),
                Ok(v) => return Ok(v),
                Err(e) if policy.is_retryable(&e) && attempt < policy.max_retries => {
                    thread::sleep(policy.delay_for(attempt));
                    attempt += 1;
                    self.transport = SyncTransport::connect(&self.opts)?;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Send a raw expression string and return the server's reply verbatim.
    pub fn raw(&mut self, expression: &str) -> Result<Value, Error> {
        self.request(&string_value(expression))
    }

    /// Compile `query` and send it as a raw expression.
    pub fn exec(&mut self, query: &Query) -> Result<Value, Error> {
        let text = compiler::compile(query)?;
        self.raw(&text)
    }

    pub fn call(&mut self, func: &str, args: &[Value]) -> Result<Value, Error> {
        self.request(&call_frame(func, args))
    }

    pub fn create_table(&mut self, descriptor: &SchemaDescriptor) -> Result<(), Error> {
        self.raw(&descriptor.to_ddl())?;
        Registry::global().register(descriptor.clone());
        Ok(())
    }

    pub fn drop_table(&mut self, name: &str) -> Result<(), Error> {
        self.raw(&format!("delete {name}"))?;
        Ok(())
    }

    pub fn table_exists(&mut self, name: &str) -> Result<bool, Error> {
        Ok(self.tables()?.iter().any(|t| t == name))
    }

    pub fn tables(&mut self) -> Result<Vec<String>, Error> {
        Ok(symbol_list(self.call("tables", &[])?))
    }

    /// Reflect a live table's schema via `meta`/`keys` and register it.
    pub fn reflect(&mut self, name: &str) -> Result<Arc<SchemaDescriptor>, Error> {
        let meta = self.call("meta", &[Value::symbol(name)])?;
        let meta_table = meta.as_table().ok_or_else(|| ModelError::Reflection {
            table: name.to_string(),
            reason: "`meta` did not return a table".into(),
        })?;
        let mut descriptor = SchemaDescriptor::from_meta(name, meta_table)?;

        let keys = self.call("keys", &[Value::symbol(name)])?;
        descriptor.mark_keys(&symbol_list(keys));

        Registry::global().register(descriptor);
        Registry::global().require(name).map_err(Error::from)
    }

    pub fn reflect_all(&mut self) -> Result<Vec<Arc<SchemaDescriptor>>, Error> {
        let names = self.tables()?;
        names.iter().map(|n| self.reflect(n)).collect()
    }

    pub fn namespaces(&mut self) -> Result<Vec<String>, Error> {
        Ok(symbol_list(self.call("namespaces", &[])?))
    }

    pub fn functions(&mut self, namespace: Option<&str>) -> Result<Vec<String>, Error> {
        let args: Vec<Value> = namespace.map(Value::symbol).into_iter().collect();
        Ok(symbol_list(self.call("functions", &args)?))
    }

    /// Run `query`, wrapping the server's table reply in a [`ResultSet`]
    /// bound to a registered model when one is known for the table.
    pub fn query(&mut self, query: &Query) -> Result<ResultSet, Error> {
        let reply = self.exec(query)?;
        let table = reply.as_table().cloned().ok_or_else(|| ModelError::Reflection {
            table: query.table.clone(),
            reason: "query did not return a table".into(),
        })?;
        let model = Registry::global().get(&query.table);
        Ok(ResultSet::new(table, model))
    }

    pub fn ping(&mut self) -> Result<(), Error> {
        self.transport.ping()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_value_round_trips_through_char_vector() {
        match string_value("2+3") {
            Value::Vector(Vector::Char(xs), _) => {
                let bytes: Vec<u8> = xs.into_iter().flatten().collect();
                assert_eq!(bytes, b"2+3");
            }
            _ => panic!("expected char vector"),
        }
    }

    #[test]
    fn symbol_list_extracts_names() {
        let v = Value::Vector(Vector::Symbol(vec![Some("a".into()), Some("b".into())]), vexdb_core::value::Attr::None);
        assert_eq!(symbol_list(v), vec!["a".to_string(), "b".to_string()]);
    }
}
