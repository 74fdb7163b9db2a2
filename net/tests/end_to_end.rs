//! Literal end-to-end scenarios: a minimal fake TCP server stands in for a
//! real server so `SyncSession`/`SyncPool` can be driven through their real
//! handshake, framing, and pooling paths without a live dependency.
//!
//! Grounded on the handshake/frame contract in `transport/mod.rs` and
//! `transport/sync_transport.rs` — the fake server below implements exactly
//! that contract (`"user:pass\x03\x00"` then a single ack byte, followed by
//! framed request/response pairs) rather than a simplified stand-in.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use vexdb_core::codec::frame::{FrameHeader, MessageKind, HEADER_LEN};
use vexdb_core::codec::{self};
use vexdb_core::value::{Attr, Scalar, Value, Vector};
use vexdb_net::{ConnectOptions, SyncPool, SyncSession};

/// Spawn a fake server on an ephemeral port. `respond` maps each decoded
/// request `Value` to the `Value` the server sends back; it runs once per
/// request, on the connection's own handler thread.
fn spawn_fake_server<F>(respond: F) -> SocketAddr
where
    F: Fn(Value) -> Value + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    let respond = Arc::new(respond);
    std::thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(stream) = stream else { continue };
            let respond = Arc::clone(&respond);
            std::thread::spawn(move || handle_connection(stream, respond));
        }
    });
    addr
}

fn handle_connection(mut stream: TcpStream, respond: Arc<dyn Fn(Value) -> Value + Send + Sync>) {
    stream.set_read_timeout(Some(Duration::from_secs(2))).ok();

    let mut handshake_buf = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        match stream.read(&mut byte) {
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
    if stream.write_all(&[0x06]).is_err() {
        return;
    }

    loop {
        let mut header_buf = [0u8; HEADER_LEN];
        if stream.read_exact(&mut header_buf).is_err() {
            return;
        }
        let Ok(header) = FrameHeader::parse(&header_buf) else { return };
        let mut body = vec![0u8; header.length as usize - HEADER_LEN];
        if stream.read_exact(&mut body).is_err() {
            return;
        }
        let mut whole = header_buf.to_vec();
        whole.extend_from_slice(&body);
        let Ok((request, _)) = codec::decode_message(&whole) else { return };

        let reply = respond(request);
        let frame = codec::encode_message(&reply, MessageKind::Response, true);
        if stream.write_all(&frame).is_err() {
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

/// Scenario 1: connect, handshake, `raw("2+3")`, receive long `5`.
#[test]
fn scenario_raw_expression_round_trip() {
    let addr = spawn_fake_server(|request| {
        assert_eq!(char_vector_to_string(&request).as_deref(), Some("2+3"));
        Value::Scalar(Scalar::Long(5))
    });

    let opts = ConnectOptions::new(addr.ip().to_string(), addr.port()).user("u").password("p");
    let mut session = SyncSession::connect(opts).expect("connect");
    let reply = session.raw("2+3").expect("raw");
    assert_eq!(reply, Value::Scalar(Scalar::Long(5)));
}

/// Scenario 2: `create_table(Trade)` sends the exact DDL string.
#[test]
fn scenario_create_table_sends_expected_ddl() {
    let captured = Arc::new(Mutex::new(None));
    let captured_in_server = Arc::clone(&captured);
    let addr = spawn_fake_server(move |request| {
        *captured_in_server.lock().unwrap() = char_vector_to_string(&request);
        Value::Scalar(Scalar::Boolean(true))
    });

    let opts = ConnectOptions::new(addr.ip().to_string(), addr.port());
    let mut session = SyncSession::connect(opts).expect("connect");
    let descriptor = vexdb_core::model::SchemaDescriptor::new("trade")
        .field("sym", vexdb_core::value::Kind::Symbol)
        .field("price", vexdb_core::value::Kind::Float)
        .field("size", vexdb_core::value::Kind::Long);
    session.create_table(&descriptor).expect("create_table");

    let sent = captured.lock().unwrap().clone();
    assert_eq!(sent.as_deref(), Some("trade:([] sym:`s$(); price:`f$(); size:`j$())"));
}

/// Scenario 4: decode a fixture table frame and iterate its rows.
#[test]
fn scenario_decodes_and_iterates_fixture_table() {
    use vexdb_core::value::Table;

    let table = Table::new(vec![
        ("sym".into(), Vector::Symbol(vec![Some("AAPL".into()), Some("GOOG".into())])),
        ("price".into(), Vector::Float(vec![Some(150.25), Some(2800.0)])),
    ]);
    let bytes = codec::encode_message(&Value::Table(table), MessageKind::Response, false);
    let (decoded, _) = codec::decode_message(&bytes).expect("decode fixture");
    let rs = vexdb_net::ResultSet::anonymous(decoded.as_table().cloned().expect("table"));

    let row0 = rs.get(0).expect("row 0");
    assert_eq!(row0.get("sym"), Some(Value::Scalar(Scalar::Symbol("AAPL".into()))));
    assert_eq!(row0.get("price"), Some(Value::Scalar(Scalar::Float(150.25))));

    let row1 = rs.get(1).expect("row 1");
    assert_eq!(row1.get("sym"), Some(Value::Scalar(Scalar::Symbol("GOOG".into()))));
}

/// Scenario 5: decompress a fixture representing a 10,000-long vector of
/// ones. No real server fixture is available, so the fixture is produced by
/// this codec's own compressor — still exercises the exact decode path a
/// server-compressed frame would take.
#[test]
fn scenario_decompresses_long_vector_of_ones() {
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

/// Scenario 6: pool of `min=1, max=2`; three concurrent acquirers with a
/// short timeout — the third is exhausted, and once one releases, a waiter
/// succeeds.
#[test]
fn scenario_pool_exhaustion_and_recovery() {
    let addr = spawn_fake_server(|_request| Value::Scalar(Scalar::Boolean(true)));
    let mut opts = ConnectOptions::new(addr.ip().to_string(), addr.port()).pool_size(1, 2);
    opts.pool_acquire_timeout = Duration::from_millis(100);
    let pool = Arc::new(SyncPool::new(opts).expect("pool construction"));

    let first = pool.acquire().expect("first acquire succeeds");
    let second = pool.acquire().expect("second acquire succeeds (grows to max)");

    let start = std::time::Instant::now();
    let third = pool.acquire();
    assert!(third.is_err(), "third acquirer must be exhausted at max_size=2");
    assert!(start.elapsed() < Duration::from_millis(250), "exhaustion must resolve near the configured timeout");

    drop(first);

    let pool_for_waiter = Arc::clone(&pool);
    let waiter = std::thread::spawn(move || pool_for_waiter.acquire().is_ok());
    assert!(waiter.join().expect("waiter thread"), "a waiter must succeed once a session is released");

    drop(second);
}
