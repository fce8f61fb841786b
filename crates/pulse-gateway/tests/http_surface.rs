//! End-to-end checks over a real listener, using raw HTTP and WebSocket
//! framing so no client crate is needed.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;

use pulse_gateway::{
    app_state::AppState,
    config::{self, GatewayConfig},
    router,
    routes::LIVENESS_BODY,
};

const IO_TIMEOUT: Duration = Duration::from_secs(5);

async fn serve() -> SocketAddr {
    serve_with(GatewayConfig::default()).await
}

async fn serve_with(cfg: GatewayConfig) -> SocketAddr {
    let app = router::build_router(AppState::new(cfg));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn http_get(addr: SocketAddr, path: &str, extra_headers: &str) -> String {
    let mut s = TcpStream::connect(addr).await.unwrap();
    let req = format!(
        "GET {path} HTTP/1.1\r\nHost: localhost\r\n{extra_headers}Connection: close\r\n\r\n"
    );
    s.write_all(req.as_bytes()).await.unwrap();
    let mut out = String::new();
    timeout(IO_TIMEOUT, s.read_to_string(&mut out)).await.unwrap().unwrap();
    out
}

struct RawWs {
    stream: TcpStream,
    buf: Vec<u8>,
}

impl RawWs {
    async fn connect(addr: SocketAddr) -> Self {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let req = "GET /v1/ws HTTP/1.1\r\n\
                   Host: localhost\r\n\
                   Upgrade: websocket\r\n\
                   Connection: Upgrade\r\n\
                   Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\
                   Sec-WebSocket-Version: 13\r\n\r\n";
        stream.write_all(req.as_bytes()).await.unwrap();

        let mut ws = Self { stream, buf: Vec::new() };
        let head_end = loop {
            if let Some(pos) = ws.buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
            ws.fill().await;
        };
        let head = String::from_utf8_lossy(&ws.buf[..head_end]).to_string();
        assert!(head.starts_with("HTTP/1.1 101"), "unexpected handshake: {head}");
        ws.buf.drain(..head_end);
        ws
    }

    async fn fill(&mut self) {
        let mut chunk = [0u8; 1024];
        let n = timeout(IO_TIMEOUT, self.stream.read(&mut chunk))
            .await
            .expect("read timed out")
            .unwrap();
        assert!(n > 0, "server closed the connection");
        self.buf.extend_from_slice(&chunk[..n]);
    }

    /// Next text frame payload; control frames are skipped.
    async fn next_text(&mut self) -> String {
        loop {
            while self.buf.len() < 2 {
                self.fill().await;
            }
            let opcode = self.buf[0] & 0x0f;
            let len = (self.buf[1] & 0x7f) as usize;
            assert!(len < 126, "test frames are short");
            while self.buf.len() < 2 + len {
                self.fill().await;
            }
            let payload: Vec<u8> = self.buf.drain(..2 + len).skip(2).collect();
            if opcode == 0x1 {
                return String::from_utf8(payload).unwrap();
            }
        }
    }

    /// Like `next_text`, but gives up after `wait`.
    async fn next_text_within(&mut self, wait: Duration) -> Option<String> {
        timeout(wait, self.next_text()).await.ok()
    }

    /// Send one client text frame (clients must mask).
    async fn send_text(&mut self, text: &str) {
        let payload = text.as_bytes();
        assert!(payload.len() < 126, "test frames are short");
        let mask = [0x37u8, 0xfa, 0x21, 0x3d];
        let mut frame = vec![0x81, 0x80 | payload.len() as u8];
        frame.extend_from_slice(&mask);
        frame.extend(payload.iter().enumerate().map(|(i, b)| b ^ mask[i % 4]));
        self.stream.write_all(&frame).await.unwrap();
    }

    async fn next_count(&mut self) -> u64 {
        let v: serde_json::Value = serde_json::from_str(&self.next_text().await).unwrap();
        assert_eq!(v["type"], "activeSessions");
        v["data"].as_u64().unwrap()
    }
}

#[tokio::test]
async fn liveness_returns_static_string() {
    let addr = serve().await;
    let resp = http_get(addr, "/", "").await;
    assert!(resp.starts_with("HTTP/1.1 200"));
    assert!(resp.ends_with(LIVENESS_BODY));
}

#[tokio::test]
async fn cors_allows_any_origin() {
    let addr = serve().await;
    let resp = http_get(addr, "/", "Origin: http://example.test\r\n").await;
    assert!(resp.to_ascii_lowercase().contains("access-control-allow-origin: *"));
}

#[tokio::test]
async fn sessions_and_metrics_start_at_zero() {
    let addr = serve().await;
    let resp = http_get(addr, "/v1/sessions", "").await;
    assert!(resp.starts_with("HTTP/1.1 200"));
    assert!(resp.ends_with(r#"{"active":0}"#));

    let resp = http_get(addr, "/metrics", "").await;
    assert!(resp.contains("# TYPE pulse_sessions_active gauge"));
}

#[tokio::test]
async fn websocket_clients_see_count_changes() {
    let addr = serve().await;

    let mut a = RawWs::connect(addr).await;
    assert_eq!(a.next_count().await, 1);

    let mut b = RawWs::connect(addr).await;
    assert_eq!(b.next_count().await, 2);
    assert_eq!(a.next_count().await, 2);

    drop(b);
    assert_eq!(a.next_count().await, 1);

    let resp = http_get(addr, "/v1/sessions", "").await;
    assert!(resp.ends_with(r#"{"active":1}"#));
}

#[tokio::test]
async fn text_ping_gets_pong() {
    let addr = serve().await;
    let mut a = RawWs::connect(addr).await;
    assert_eq!(a.next_count().await, 1);

    a.send_text(r#"{"v":1,"type":"ping"}"#).await;
    assert_eq!(a.next_text().await, r#"{"v":1,"type":"pong"}"#);
}

#[tokio::test]
async fn malformed_frame_keeps_session_open() {
    let addr = serve().await;
    let mut a = RawWs::connect(addr).await;
    assert_eq!(a.next_count().await, 1);

    a.send_text("{not json").await;
    a.send_text(r#"{"v":1,"type":"ping"}"#).await;
    assert_eq!(a.next_text().await, r#"{"v":1,"type":"pong"}"#);

    let mut b = RawWs::connect(addr).await;
    assert_eq!(b.next_count().await, 2);
    assert_eq!(a.next_count().await, 2);

    let resp = http_get(addr, "/v1/sessions", "").await;
    assert!(resp.ends_with(r#"{"active":2}"#));
}

#[tokio::test]
async fn idle_session_times_out_and_peers_see_the_drop() {
    let cfg = config::load_from_str(
        "version: 1\ngateway:\n  ping_interval_ms: 5000\n  idle_timeout_ms: 10000\n",
    )
    .unwrap();
    let addr = serve_with(cfg).await;

    let mut idle = RawWs::connect(addr).await;
    assert_eq!(idle.next_count().await, 1);
    let mut active = RawWs::connect(addr).await;
    assert_eq!(active.next_count().await, 2);
    assert_eq!(idle.next_count().await, 2);

    // Keep `active` alive with pings until the idle peer is dropped.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(20);
    let mut dropped_to = None;
    while dropped_to.is_none() {
        assert!(tokio::time::Instant::now() < deadline, "idle session never timed out");
        active.send_text(r#"{"v":1,"type":"ping"}"#).await;
        while let Some(text) = active.next_text_within(Duration::from_secs(2)).await {
            let v: serde_json::Value = serde_json::from_str(&text).unwrap();
            if v["type"] == "activeSessions" {
                dropped_to = v["data"].as_u64();
                break;
            }
            assert_eq!(v["type"], "pong");
        }
    }
    assert_eq!(dropped_to, Some(1));

    let v: serde_json::Value = serde_json::from_str(&idle.next_text().await).unwrap();
    assert_eq!(v["type"], "error");
    assert_eq!(v["data"]["code"], "TIMEOUT");
}
