use std::sync::Arc;

use vexdb_core::ast::Query;
use vexdb_core::compiler;
use vexdb_core::error::{Error, ModelError, QError};
use vexdb_core::model::{Registry, SchemaDescriptor};
use vexdb_core::value::{Value, Vector};

use super::{call_frame, ResultSet};
use crate::config::ConnectOptions;
use crate::transport::AsyncTransport;

fn string_value(s: &str) -> Value {
    Value::Vector(Vector::Char(s.bytes().map(Some).collect()), vexdb_core::value::Attr::None)
}

fn symbol_list(v: Value) -> Vec<String> {
    match v {
        Value::Vector(Vector::Symbol(xs), _) => xs.into_iter().flatten().collect(),
        _ => Vec::new(),
    }
}

/// The cooperatively-scheduled counterpart of [`super::SyncSession`] — same
/// contract, suspending at I/O boundaries instead of blocking.
pub struct AsyncSession {
    transport: AsyncTransport,
    opts: ConnectOptions,
}

impl AsyncSession {
    pub async fn connect(opts: ConnectOptions) -> Result<Self, Error> {
        let transport = AsyncTransport::connect(&opts).await?;
        Ok(AsyncSession { transport, opts })
    }

    async fn request(&mut self, value: &Value) -> Result<Value, Error> {
        let policy = self.opts.retry.clone();
        let mut attempt = 0;
        loop {
            let outcome = match self.transport.send(value).await {
                Ok(()) => self.transport.recv().await,
                Err(e) => Err(e),
            };
            match outcome {
                Ok(Value::Error(msg)) => return Err(QError(msg).into()),
                Ok(v) => return Ok(v),
                Err(e) if policy.is_retryable(&e) && attempt < policy.max_retries => {
                    tokio::time::sleep(policy.delay_for(attempt)).await;
                    attempt += 1;
                    self.transport = AsyncTransport::connect(&self.opts).await?;
                }
                Err(e) => return Err(e),
            }
        }
    }

    pub async fn raw(&mut self, expression: &str) -> Result<Value, Error> {
        self.request(&string_value(expression)).await
    }

    pub async fn exec(&mut self, query: &Query) -> Result<Value, Error> {
        let text = compiler::compile(query)?;
        self.raw(&text).await
    }

    pub async fn call(&mut self, func: &str, args: &[Value]) -> Result<Value, Error> {
        self.request(&call_frame(func, args)).await
    }

    pub async fn create_table(&mut self, descriptor: &SchemaDescriptor) -> Result<(), Error> {
        self.raw(&descriptor.to_ddl()).await?;
        Registry::global().register(descriptor.clone());
        Ok(())
    }

    pub async fn drop_table(&mut self, name: &str) -> Result<(), Error> {
        self.raw(&format!("delete {name}")).await?;
        Ok(())
    }

    pub async fn table_exists(&mut self, name: &str) -> Result<bool, Error> {
        Ok(self.tables().await?.iter().any(|t| t == name))
    }

    pub async fn tables(&mut self) -> Result<Vec<String>, Error> {
        Ok(symbol_list(self.call("tables", &[]).await?))
    }

    pub async fn reflect(&mut self, name: &str) -> Result<Arc<SchemaDescriptor>, Error> {
        let meta = self.call("meta", &[Value::symbol(name)]).await?;
        let meta_table = meta.as_table().ok_or_else(|| ModelError::Reflection {
            table: name.to_string(),
            reason: "`meta` did not return a table".into(),
        })?;
        let mut descriptor = SchemaDescriptor::from_meta(name, meta_table)?;

        let keys = self.call("keys", &[Value::symbol(name)]).await?;
        descriptor.mark_keys(&symbol_list(keys));

        Registry::global().register(descriptor);
        Registry::global().require(name).map_err(Error::from)
    }

    pub async fn reflect_all(&mut self) -> Result<Vec<Arc<SchemaDescriptor>>, Error> {
        let names = self.tables().await?;
        let mut out = Vec::with_capacity(names.len());
        for n in &names {
            out.push(self.reflect(n).await?);
        }
        Ok(out)
    }

    pub async fn namespaces(&mut self) -> Result<Vec<String>, Error> {
        Ok(symbol_list(self.call("namespaces", &[]).await?))
    }

    pub async fn functions(&mut self, namespace: Option<&str>) -> Result<Vec<String>, Error> {
        let args: Vec<Value> = namespace.map(Value::symbol).into_iter().collect();
        Ok(symbol_list(self.call("functions", &args).await?))
    }

    pub async fn query(&mut self, query: &Query) -> Result<ResultSet, Error> {
        let reply = self.exec(query).await?;
        let table = reply.as_table().cloned().ok_or_else(|| ModelError::Reflection {
            table: query.table.clone(),
            reason: "query did not return a table".into(),
        })?;
        let model = Registry::global().get(&query.table);
        Ok(ResultSet::new(table, model))
    }

    pub async fn ping(&mut self) -> Result<(), Error> {
        self.transport.ping().await
    }
}
