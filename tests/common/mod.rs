//! Shared utilities for integration testing.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use risk_gateway::config::{FailurePolicy, GatewayConfig};
use risk_gateway::{HttpServer, Shutdown};
use secrecy::SecretString;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// One request received by the mock scoring service.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct RecordedCall {
    pub request_line: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

#[allow(dead_code)]
impl RecordedCall {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

/// Handle on a running mock scoring service.
#[derive(Clone)]
pub struct MockScoring {
    pub addr: SocketAddr,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

#[allow(dead_code)]
impl MockScoring {
    pub fn url(&self) -> String {
        format!("http://{}/v1/authenticate?include=risk", self.addr)
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

/// Start a mock scoring service that always answers `status` with `body`.
#[allow(dead_code)]
pub async fn start_mock_scoring(status: u16, body: &'static str) -> MockScoring {
    start_programmable_scoring(move || async move { (status, body.to_string()) }).await
}

/// Start a programmable mock scoring service on an ephemeral port.
pub async fn start_programmable_scoring<F, Fut>(f: F) -> MockScoring
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let calls = Arc::new(Mutex::new(Vec::new()));
    let f = Arc::new(f);

    let recorded = calls.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    let recorded = recorded.clone();
                    tokio::spawn(async move {
                        let Some(call) = read_request(&mut socket).await else {
                            return;
                        };
                        recorded.lock().unwrap().push(call);

                        let (status, body) = f().await;
                        let status_text = match status {
                            200 => "200 OK",
                            400 => "400 Bad Request",
                            401 => "401 Unauthorized",
                            500 => "500 Internal Server Error",
                            502 => "502 Bad Gateway",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    MockScoring { addr, calls }
}

/// Read one HTTP/1.1 request with a `Content-Length` body.
async fn read_request(socket: &mut TcpStream) -> Option<RecordedCall> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).into_owned();
    let mut lines = head.split("\r\n");
    let request_line = lines.next().unwrap_or_default().to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();

    let content_length = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = buf[header_end..].to_vec();
    while body.len() < content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }

    Some(RecordedCall {
        request_line,
        headers,
        body,
    })
}

/// A local address nothing listens on.
#[allow(dead_code)]
pub fn unreachable_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/v1/authenticate", addr)
}

/// Gateway configuration pointing at `scoring_url`, threshold 0.9.
#[allow(dead_code)]
pub fn test_config(scoring_url: String) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.scoring.url = scoring_url;
    config.scoring.api_secret = Some(SecretString::from("secret"));
    config.scoring.app_id = Some("pk_test".to_string());
    config.scoring.risk_threshold = 0.9;
    config.scoring.timeout_ms = 2000;
    config.scoring.failure_policy = FailurePolicy::FailClosed;
    config.scoring.use_system_proxy = false;
    config
}

/// Slow responder used for timeout tests.
#[allow(dead_code)]
pub async fn start_slow_scoring(delay: Duration) -> MockScoring {
    start_programmable_scoring(move || async move {
        tokio::time::sleep(delay).await;
        (200, r#"{"risk":0.1}"#.to_string())
    })
    .await
}

/// Serve the gateway on an ephemeral port until the returned handle is triggered.
#[allow(dead_code)]
pub async fn start_gateway(config: GatewayConfig) -> (SocketAddr, Shutdown) {
    let shutdown = Shutdown::new();
    let server = HttpServer::new(config).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

/// HTTP client that bypasses any system proxy.
#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
