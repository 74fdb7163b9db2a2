use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use rustls::{ClientConfig, ClientConnection, StreamOwned};
use tracing::{debug, trace};
use vexdb_core::codec::frame::{FrameHeader, MessageKind, HEADER_LEN};
use vexdb_core::codec::{self};
use vexdb_core::error::{ConnectionError, Error};
use vexdb_core::value::Value;

use super::{check_handshake_reply, handshake_payload, handshake_truncated};
use crate::config::ConnectOptions;

enum Stream {
    Plain(TcpStream),
    Tls(Box<StreamOwned<ClientConnection, TcpStream>>),
}

impl Read for Stream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Stream::Plain(s) => s.read(buf),
            Stream::Tls(s) => s.read(buf),
        }
    }
}

impl Write for Stream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Stream::Plain(s) => s.write(buf),
            Stream::Tls(s) => s.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Stream::Plain(s) => s.flush(),
            Stream::Tls(s) => s.flush(),
        }
    }
}

fn tls_config() -> Result<Arc<ClientConfig>, Error> {
    let mut roots = rustls::RootCertStore::empty();
    for cert in rustls_native_certs::load_native_certs().certs {
        let _ = roots.add(cert);
    }
    let config = ClientConfig::builder().with_root_certificates(roots).with_no_client_auth();
    Ok(Arc::new(config))
}

/// A blocking connection to the server: one TCP (optionally TLS-wrapped)
/// socket, carrying frames one in-flight request at a time.
pub struct SyncTransport {
    stream: Stream,
}

impl SyncTransport {
    pub fn connect(opts: &ConnectOptions) -> Result<Self, Error> {
        let addr = format!("{}:{}", opts.host, opts.port);
        trace!(addr = %addr, "sync transport connecting");
        let tcp = TcpStream::connect(&addr).map_err(|source| ConnectionError::Connect {
            addr: addr.clone(),
            source,
        })?;
        tcp.set_read_timeout(Some(opts.timeout)).map_err(|e| ConnectionError::Io(e))?;
        tcp.set_nodelay(true).ok();

        let stream = if opts.tls {
            let config = tls_config()?;
            let server_name = rustls::pki_types::ServerName::try_from(opts.host.clone())
                .map_err(|_| ConnectionError::Tls(format!("invalid server name `{}`", opts.host)))?;
            let conn = ClientConnection::new(config, server_name)
                .map_err(|e| ConnectionError::Tls(e.to_string()))?;
            Stream::Tls(Box::new(StreamOwned::new(conn, tcp)))
        } else {
            Stream::Plain(tcp)
        };

        let mut transport = SyncTransport { stream };
        transport.handshake(opts.user.as_deref().unwrap_or(""), opts.password.as_deref().unwrap_or(""))?;
        Ok(transport)
    }

    fn handshake(&mut self, user: &str, password: &str) -> Result<(), Error> {
        let payload = handshake_payload(user, password);
        self.stream.write_all(&payload).map_err(ConnectionError::Io)?;
        let mut reply = [0u8; 1];
        match self.stream.read(&mut reply) {
            Ok(0) => Err(handshake_truncated()),
            Ok(_) => {
                debug!("handshake accepted");
                check_handshake_reply(&reply)
            }
            Err(e) => Err(ConnectionError::Io(e).into()),
        }
    }

    pub fn send(&mut self, value: &Value) -> Result<(), Error> {
        let frame = codec::encode_message(value, MessageKind::Sync, true);
        self.stream.write_all(&frame).map_err(ConnectionError::Io)?;
        Ok(())
    }

    pub fn recv(&mut self) -> Result<Value, Error> {
        let mut header_buf = [0u8; HEADER_LEN];
        self.stream.read_exact(&mut header_buf).map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                ConnectionError::Closed
            } else {
                ConnectionError::Io(e)
            }
        })?;
        let header = FrameHeader::parse(&header_buf)?;
        let mut body = vec![0u8; header.length as usize - HEADER_LEN];
        self.stream.read_exact(&mut body).map_err(ConnectionError::Io)?;

        let mut whole = Vec::with_capacity(header.length as usize);
        whole.extend_from_slice(&header_buf);
        whole.extend_from_slice(&body);
        let (value, kind) = codec::decode_message(&whole)?;
        trace!(?kind, "frame received");
        Ok(value)
    }

    pub fn ping(&mut self) -> Result<(), Error> {
        self.send(&Value::symbol(""))?;
        self.recv()?;
        Ok(())
    }

    pub fn close(self) {
        drop(self);
    }

    pub fn set_timeout(&mut self, timeout: Duration) -> Result<(), Error> {
        let tcp = match &self.stream {
            Stream::Plain(s) => s,
            Stream::Tls(s) => s.get_ref(),
        };
        tcp.set_read_timeout(Some(timeout)).map_err(ConnectionError::Io)?;
        Ok(())
    }
}
