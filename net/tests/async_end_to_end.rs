//! Async-path counterparts of `end_to_end.rs`'s fake-server scenarios,
//! driving `AsyncSession`/`AsyncPool`/`AsyncTransport` through the same
//! handshake/frame contract instead of `SyncSession`/`SyncPool`.
//!
//! Grounded the same way as `end_to_end.rs`: a hand-rolled fake server
//! implements the exact wire contract from `transport/mod.rs` rather than
//! mocking at a higher level, here built on `tokio::net::TcpListener`
//! instead of `std::net`.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use vexdb_core::codec::frame::{FrameHeader, MessageKind, HEADER_LEN};
use vexdb_core::codec::{self};
use vexdb_core::value::{Attr, Scalar, Value, Vector};
use vexdb_net::{AsyncPool, AsyncSession, ConnectOptions};

async fn spawn_fake_server<F>(respond: F) -> SocketAddr
where
    F: Fn(Value) -> Value + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    let respond = Arc::new(respond);
    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else { return };
            let respond = Arc::clone(&respond);
            tokio::spawn(handle_connection(stream, respond));
        }
    });
    addr
}

async fn handle_connection(mut stream: TcpStream, respond: Arc<dyn Fn(Value) -> Value + Send + Sync>) {
    let mut handshake_buf = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        match stream.read(&mut byte).await {
            Ok(0) => return,
            Ok(_) => {
                handshake_buf.push(byte[0]);
                if handshake_buf.ends_with(&[0x03, 0x00]) {
                    break;
                }
            }
            Err(_) => return,
        }
    }
    if stream.write_all(&[0x06]).await.is_err() {
        return;
    }

    loop {
        let mut header_buf = [0u8; HEADER_LEN];
        if stream.read_exact(&mut header_buf).await.is_err() {
            return;
        }
        let Ok(header) = FrameHeader::parse(&header_buf) else { return };
        let mut body = vec![0u8; header.length as usize - HEADER_LEN];
        if stream.read_exact(&mut body).await.is_err() {
            return;
        }
        let mut whole = header_buf.to_vec();
        whole.extend_from_slice(&body);
        let Ok((request, _)) = codec::decode_message(&whole) else { return };

        let reply = respond(request);
        let frame = codec::encode_message(&reply, MessageKind::Response, true);
        if stream.write_all(&frame).await.is_err() {
            return;
        }
    }
}

fn char_vector_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Vector(Vector::Char(xs), _) => {
            let bytes: Vec<u8> = xs.iter().filter_map(|b| *b).collect();
            String::from_utf8(bytes).ok()
        }
        _ => None,
    }
}

#[tokio::test]
async fn async_raw_expression_round_trip() {
    let addr = spawn_fake_server(|request| {
        assert_eq!(char_vector_to_string(&request).as_deref(), Some("2+3"));
        Value::Scalar(Scalar::Long(5))
    })
    .await;

    let opts = ConnectOptions::new(addr.ip().to_string(), addr.port()).user("u").password("p");
    let mut session = AsyncSession::connect(opts).await.expect("connect");
    let reply = session.raw("2+3").await.expect("raw");
    assert_eq!(reply, Value::Scalar(Scalar::Long(5)));
}

#[tokio::test]
async fn async_create_table_sends_expected_ddl() {
    let captured = Arc::new(Mutex::new(None));
    let captured_in_server = Arc::clone(&captured);
    let addr = spawn_fake_server(move |request| {
        *captured_in_server.lock().unwrap() = char_vector_to_string(&request);
        Value::Scalar(Scalar::Boolean(true))
    })
    .await;

    let opts = ConnectOptions::new(addr.ip().to_string(), addr.port());
    let mut session = AsyncSession::connect(opts).await.expect("connect");
    let descriptor = vexdb_core::model::SchemaDescriptor::new("trade")
        .field("sym", vexdb_core::value::Kind::Symbol)
        .field("price", vexdb_core::value::Kind::Float)
        .field("size", vexdb_core::value::Kind::Long);
    session.create_table(&descriptor).await.expect("create_table");

    let sent = captured.lock().unwrap().clone();
    assert_eq!(sent.as_deref(), Some("trade:([] sym:`s$(); price:`f$(); size:`j$())"));
}

#[tokio::test]
async fn async_decompresses_long_vector_of_ones() {
    let ones = Value::Vector(Vector::Long(vec![Some(1); 10_000]), Attr::None);
    let bytes = codec::encode_message(&ones, MessageKind::Response, true);
    let (decoded, _) = codec::decode_message(&bytes).expect("decode");
    match decoded {
        Value::Vector(Vector::Long(xs), _) => {
            assert_eq!(xs.len(), 10_000);
            assert!(xs.iter().all(|x| *x == Some(1)));
        }
        other => panic!("expected long vector, got {other:?}"),
    }
}

/// Pool of `min=1, max=2`; three concurrent acquirers with a short timeout
/// — the third is exhausted, and once one releases, a waiter succeeds.
#[tokio::test]
async fn async_pool_exhaustion_and_recovery() {
    let addr = spawn_fake_server(|_request| Value::Scalar(Scalar::Boolean(true))).await;
    let mut opts = ConnectOptions::new(addr.ip().to_string(), addr.port()).pool_size(1, 2);
    opts.pool_acquire_timeout = Duration::from_millis(150);
    let pool = Arc::new(AsyncPool::new(opts).await.expect("pool construction"));

    let first = pool.acquire().await.expect("first acquire succeeds");
    let second = pool.acquire().await.expect("second acquire succeeds (grows to max)");

    let start = std::time::Instant::now();
    let third = pool.acquire().await;
    assert!(third.is_err(), "third acquirer must be exhausted at max_size=2");
    assert!(start.elapsed() < Duration::from_millis(500), "exhaustion must resolve near the configured timeout");

    drop(first);

    let waiter = pool.acquire().await;
    assert!(waiter.is_ok(), "a waiter must succeed once a session is released");

    drop(second);
    drop(waiter);
}
