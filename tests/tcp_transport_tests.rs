//! TCP Transport Tests
//!
//! These tests run the transport against a loopback server thread.

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use eyetribe::{Client, Config, EyeTribeError, TcpTransport, Transport};
use serde_json::{json, Value};

// =============================================================================
// Helper Functions
// =============================================================================

/// Config without heartbeats so the server sees only client requests
fn quiet_config() -> Config {
    Config::builder()
        .heartbeat_interval_ms(0)
        .match_timeout_ms(5000)
        .build()
}

/// Accept one connection and hand it to `script`
fn serve<F>(script: F) -> (String, JoinHandle<()>)
where
    F: FnOnce(BufReader<TcpStream>, TcpStream) + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port().to_string();

    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        let reader = BufReader::new(stream.try_clone().unwrap());
        script(reader, stream);
    });

    (port, handle)
}

fn read_json(reader: &mut BufReader<TcpStream>) -> Value {
    let mut line = String::new();
    reader.read_line(&mut line).unwrap();
    serde_json::from_str(line.trim_end()).unwrap()
}

fn send_line(stream: &mut TcpStream, frame: &str) {
    stream.write_all(frame.as_bytes()).unwrap();
    stream.write_all(b"\n").unwrap();
    stream.flush().unwrap();
}

/// Write a frame the client may already have stopped listening for
fn send_line_lossy(stream: &mut TcpStream, frame: &str) {
    let _ = stream.write_all(format!("{}\n", frame).as_bytes());
    let _ = stream.flush();
}

// =============================================================================
// Exchange Tests
// =============================================================================

#[test]
fn test_send_and_match_over_tcp() {
    let (port, server) = serve(|mut reader, mut stream| {
        let request = read_json(&mut reader);
        assert_eq!(
            request,
            json!({"category": "tracker", "request": "get", "values": ["version"]})
        );

        send_line(&mut stream, r#"{"category":"heartbeat","statuscode":200}"#);
        send_line(&mut stream, r#"{"category":"calibration","request":"pointend","values":{"statuscode":200}}"#);
        send_line(&mut stream, r#"{"category":"tracker","request":"get","values":{"version":1}}"#);
    });

    let mut transport = TcpTransport::new(quiet_config());
    transport.connect("127.0.0.1", &port).unwrap();
    assert!(transport.is_connected());

    transport
        .send_bytes(br#"{"category":"tracker","request":"get","values":["version"]}"#)
        .unwrap();
    let response = transport.read_blocking_match("request", "get").unwrap();

    assert_eq!(response.category, "tracker");
    assert_eq!(response.field_as::<i64>("version").unwrap(), 1);

    transport.close();
    assert!(!transport.is_connected());
    server.join().unwrap();
}

#[test]
fn test_client_over_tcp() {
    let (port, server) = serve(|mut reader, mut stream| {
        assert_eq!(read_json(&mut reader)["values"], json!(["framerate"]));
        send_line(&mut stream, r#"{"category":"tracker","request":"get","values":{"framerate":60}}"#);

        let start = read_json(&mut reader);
        assert_eq!(start["values"], json!({"pointcount": 9}));
        send_line(&mut stream, r#"{"category":"calibration","request":"start","statuscode":200,"values":{}}"#);
    });

    let config = Config::builder()
        .host("127.0.0.1")
        .port(port)
        .heartbeat_interval_ms(0)
        .match_timeout_ms(5000)
        .build();
    let mut client = Client::from_config(config);
    client.connect_configured().unwrap();

    assert_eq!(client.framerate().unwrap(), 60);
    assert!(client.calib_start(9).unwrap());

    client.close();
    server.join().unwrap();
}

// =============================================================================
// Heartbeat Tests
// =============================================================================

#[test]
fn test_heartbeat_sent_periodically() {
    let (port, server) = serve(|mut reader, _stream| {
        for _ in 0..2 {
            assert_eq!(read_json(&mut reader), json!({"category": "heartbeat"}));
        }
    });

    let config = Config::builder().heartbeat_interval_ms(20).build();
    let mut transport = TcpTransport::new(config);
    transport.connect("127.0.0.1", &port).unwrap();

    server.join().unwrap();
    transport.close();
}

// =============================================================================
// Failure Tests
// =============================================================================

#[test]
fn test_match_timeout() {
    let (port, server) = serve(|mut reader, _stream| {
        // Hold the connection open until the client gives up
        let mut line = String::new();
        let _ = reader.read_line(&mut line);
    });

    let config = Config::builder()
        .heartbeat_interval_ms(0)
        .match_timeout_ms(100)
        .build();
    let mut transport = TcpTransport::new(config);
    transport.connect("127.0.0.1", &port).unwrap();

    let err = transport.read_blocking_match("request", "get").unwrap_err();
    assert!(matches!(err, EyeTribeError::Timeout(100)));

    transport.close();
    server.join().unwrap();
}

#[test]
fn test_server_close_is_connection_error() {
    let (port, server) = serve(|_reader, mut stream| {
        send_line(&mut stream, r#"{"category":"heartbeat","statuscode":200}"#);
    });

    let mut transport = TcpTransport::new(quiet_config());
    transport.connect("127.0.0.1", &port).unwrap();
    server.join().unwrap();

    let err = transport.read_blocking_match("request", "get").unwrap_err();
    assert!(matches!(err, EyeTribeError::Connection(_)));
    assert!(!transport.is_connected());
}

#[test]
fn test_late_reply_is_not_taken_by_next_call() {
    let (port, server) = serve(|mut reader, mut stream| {
        assert_eq!(read_json(&mut reader)["values"], json!(["version"]));
        thread::sleep(Duration::from_millis(400));
        send_line_lossy(&mut stream, r#"{"category":"tracker","request":"get","values":{"version":1}}"#);
    });

    let config = Config::builder()
        .heartbeat_interval_ms(0)
        .match_timeout_ms(200)
        .build();
    let mut client = Client::new(TcpTransport::new(config));
    client.connect("127.0.0.1", &port).unwrap();

    assert!(matches!(client.version().unwrap_err(), EyeTribeError::Timeout(200)));
    assert!(!client.transport().is_connected());

    // The connection is gone, so the late version reply cannot answer this
    let err = client.frame_data().unwrap_err();
    assert!(matches!(err, EyeTribeError::Connection(_)));

    server.join().unwrap();
}

#[test]
fn test_reconnect_after_failure() {
    let (first_port, first) = serve(|_reader, _stream| {});
    let (second_port, second) = serve(|mut reader, mut stream| {
        read_json(&mut reader);
        send_line(&mut stream, r#"{"category":"tracker","request":"get","values":{"version":1}}"#);
    });

    let mut transport = TcpTransport::new(quiet_config());
    transport.connect("127.0.0.1", &first_port).unwrap();
    first.join().unwrap();
    assert!(transport.read_blocking_match("request", "get").is_err());

    transport.connect("127.0.0.1", &second_port).unwrap();
    transport
        .send_bytes(br#"{"category":"tracker","request":"get","values":["version"]}"#)
        .unwrap();
    let response = transport.read_blocking_match("request", "get").unwrap();
    assert_eq!(response.field_as::<i64>("version").unwrap(), 1);

    transport.close();
    second.join().unwrap();
}

#[test]
fn test_malformed_frame_is_decoding_error() {
    let (port, server) = serve(|_reader, mut stream| {
        send_line(&mut stream, "{garbage");
    });

    let mut transport = TcpTransport::new(quiet_config());
    transport.connect("127.0.0.1", &port).unwrap();
    server.join().unwrap();

    let err = transport.read_blocking_match("request", "get").unwrap_err();
    assert!(matches!(err, EyeTribeError::Decoding(_)));
    assert!(!transport.is_connected());
}

#[test]
fn test_oversized_frame_drops_connection() {
    let (port, server) = serve(|_reader, mut stream| {
        let big = format!(r#"{{"category":"tracker","request":"get","values":{{"pad":"{}"}}}}"#, "x".repeat(200));
        send_line(&mut stream, &big);
        send_line_lossy(&mut stream, r#"{"category":"tracker","request":"get","values":{"version":1}}"#);
    });

    let config = Config::builder()
        .heartbeat_interval_ms(0)
        .match_timeout_ms(5000)
        .max_frame_size(100)
        .build();
    let mut transport = TcpTransport::new(config);
    transport.connect("127.0.0.1", &port).unwrap();
    server.join().unwrap();

    let err = transport.read_blocking_match("request", "get").unwrap_err();
    assert!(matches!(err, EyeTribeError::Decoding(_)));
    assert!(!transport.is_connected());

    // Later calls report the dropped connection instead of a stale frame
    let err = transport.read_blocking_match("request", "get").unwrap_err();
    assert!(matches!(err, EyeTribeError::Connection(_)));
    let err = transport.send_bytes(b"{}").unwrap_err();
    assert!(matches!(err, EyeTribeError::Connection(_)));
}

#[test]
fn test_connection_refused() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port().to_string()
    };

    let mut transport = TcpTransport::new(quiet_config());
    let err = transport.connect("127.0.0.1", &port).unwrap_err();
    assert!(matches!(err, EyeTribeError::Connection(_)));
    assert!(!transport.is_connected());
}

#[test]
fn test_invalid_port() {
    let mut transport = TcpTransport::new(quiet_config());
    let err = transport.connect("127.0.0.1", "not-a-port").unwrap_err();
    match err {
        EyeTribeError::Connection(e) => assert_eq!(e.kind(), std::io::ErrorKind::InvalidInput),
        other => panic!("Expected Connection, got {:?}", other),
    }
    assert!(!transport.is_connected());
}

#[test]
fn test_operations_before_connect() {
    let mut transport = TcpTransport::default();

    assert!(matches!(
        transport.send_bytes(b"{}").unwrap_err(),
        EyeTribeError::NotConnected
    ));
    assert!(matches!(
        transport.read_blocking_match("request", "get").unwrap_err(),
        EyeTribeError::NotConnected
    ));

    // Closing a disconnected transport is a no-op
    transport.close();
}
