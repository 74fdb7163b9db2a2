use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::client::TlsStream;
use tokio_rustls::rustls::ClientConfig;
use tokio_rustls::TlsConnector;
use tracing::{debug, trace};
use vexdb_core::codec::frame::{FrameHeader, MessageKind, HEADER_LEN};
use vexdb_core::codec::{self};
use vexdb_core::error::{ConnectionError, Error};
use vexdb_core::value::Value;

use super::{check_handshake_reply, handshake_payload, handshake_truncated};
use crate::config::ConnectOptions;

enum Stream {
    Plain(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
}

impl Stream {
    async fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()> {
        match self {
            Stream::Plain(s) => s.write_all(buf).await,
            Stream::Tls(s) => s.write_all(buf).await,
        }
    }

    async fn read_exact(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            Stream::Plain(s) => s.read_exact(buf).await,
            Stream::Tls(s) => s.read_exact(buf).await,
        }
    }

    async fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            Stream::Plain(s) => s.read(buf).await,
            Stream::Tls(s) => s.read(buf).await,
        }
    }
}

fn tls_config() -> Result<Arc<ClientConfig>, Error> {
    let mut roots = tokio_rustls::rustls::RootCertStore::empty();
    for cert in rustls_native_certs::load_native_certs().certs {
        let _ = roots.add(cert);
    }
    let config = ClientConfig::builder().with_root_certificates(roots).with_no_client_auth();
    Ok(Arc::new(config))
}

/// A cooperatively-scheduled connection to the server. Same frame contract
/// as [`super::SyncTransport`], suspending at I/O boundaries instead of
/// blocking the calling thread.
pub struct AsyncTransport {
    stream: Stream,
    timeout: Duration,
}

impl AsyncTransport {
    pub async fn connect(opts: &ConnectOptions) -> Result<Self, Error> {
        let addr = format!("{}:{}", opts.host, opts.port);
        trace!(addr = %addr, "async transport connecting");
        let connect_fut = TcpStream::connect(&addr);
        let tcp = timeout(opts.timeout, connect_fut)
            .await
            .map_err(|_| ConnectionError::Timeout(opts.timeout))?
            .map_err(|source| ConnectionError::Connect { addr: addr.clone(), source })?;
        tcp.set_nodelay(true).ok();

        let stream = if opts.tls {
            let config = tls_config()?;
            let connector = TlsConnector::from(config);
            let server_name = tokio_rustls::rustls::pki_types::ServerName::try_from(opts.host.clone())
                .map_err(|_| ConnectionError::Tls(format!("invalid server name `{}`", opts.host)))?
                .to_owned();
            let tls = connector.connect(server_name, tcp).await.map_err(|e| ConnectionError::Tls(e.to_string()))?;
            Stream::Tls(Box::new(tls))
        } else {
            Stream::Plain(tcp)
        };

        let mut transport = AsyncTransport { stream, timeout: opts.timeout };
        transport.handshake(opts.user.as_deref().unwrap_or(""), opts.password.as_deref().unwrap_or("")).await?;
        Ok(transport)
    }

    async fn handshake(&mut self, user: &str, password: &str) -> Result<(), Error> {
        let payload = handshake_payload(user, password);
        self.stream.write_all(&payload).await.map_err(ConnectionError::Io)?;
        let mut reply = [0u8; 1];
        match self.stream.read(&mut reply).await {
            Ok(0) => Err(handshake_truncated()),
            Ok(_) => {
                debug!("handshake accepted");
                check_handshake_reply(&reply)
            }
            Err(e) => Err(ConnectionError::Io(e).into()),
        }
    }

    pub async fn send(&mut self, value: &Value) -> Result<(), Error> {
        let frame = codec::encode_message(value, MessageKind::Sync, true);
        timeout(self.timeout, self.stream.write_all(&frame))
            .await
            .map_err(|_| ConnectionError::Timeout(self.timeout))?
            .map_err(ConnectionError::Io)?;
        Ok(())
    }

    pub async fn recv(&mut self) -> Result<Value, Error> {
        let mut header_buf = [0u8; HEADER_LEN];
        timeout(self.timeout, self.stream.read_exact(&mut header_buf))
            .await
            .map_err(|_| ConnectionError::Timeout(self.timeout))?
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::UnexpectedEof {
                    ConnectionError::Closed
                } else {
                    ConnectionError::Io(e)
                }
            })?;
        let header = FrameHeader::parse(&header_buf)?;
        let mut body = vec![0u8; header.length as usize - HEADER_LEN];
        self.stream.read_exact(&mut body).await.map_err(ConnectionError::Io)?;

        let mut whole = Vec::with_capacity(header.length as usize);
        whole.extend_from_slice(&header_buf);
        whole.extend_from_slice(&body);
        let (value, kind) = codec::decode_message(&whole)?;
        trace!(?kind, "frame received");
        Ok(value)
    }

    pub async fn ping(&mut self) -> Result<(), Error> {
        self.send(&Value::symbol("")).await?;
        self.recv().await?;
        Ok(())
    }

    pub async fn close(self) {
        drop(self);
    }
}
