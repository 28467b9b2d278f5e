//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderMap;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use captain_gateway::api::DomainRouters;
use captain_gateway::context::{Identity, IdentityResolver, Namespace};
use captain_gateway::{GatewayConfig, HttpServer, ServiceManager, Services, Shutdown};

/// What the mock upstream saw.
#[derive(Debug)]
pub struct Recorded {
    pub request_line: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Start a mock upstream that records each request and answers `200 body`.
pub async fn start_recording_backend(
    body: &'static str,
) -> (SocketAddr, mpsc::UnboundedReceiver<Recorded>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            let tx = tx.clone();
            tokio::spawn(async move {
                let mut reader = BufReader::new(socket);

                let mut request_line = String::new();
                if reader.read_line(&mut request_line).await.is_err() {
                    return;
                }
                let mut headers = Vec::new();
                loop {
                    let mut line = String::new();
                    if reader.read_line(&mut line).await.unwrap_or(0) == 0 {
                        break;
                    }
                    let line = line.trim_end();
                    if line.is_empty() {
                        break;
                    }
                    if let Some((k, v)) = line.split_once(':') {
                        headers.push((k.trim().to_string(), v.trim().to_string()));
                    }
                }

                let length = headers
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, v)| v.parse::<usize>().ok())
                    .unwrap_or(0);
                let mut buf = vec![0; length];
                let _ = reader.read_exact(&mut buf).await;

                let _ = tx.send(Recorded {
                    request_line: request_line.trim_end().to_string(),
                    headers,
                    body: String::from_utf8_lossy(&buf).into_owned(),
                });

                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nX-Upstream: netdata\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let mut socket = reader.into_inner();
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (addr, rx)
}

/// `captain-session=<name>` cookie is a session, `x-captain-auth` is a token.
pub struct CookieSession;

impl CookieSession {
    fn session(headers: &HeaderMap) -> Option<Identity> {
        headers
            .get("cookie")
            .and_then(|v| v.to_str().ok())
            .and_then(|c| {
                c.split(';')
                    .find_map(|p| p.trim().strip_prefix("captain-session="))
            })
            .map(Identity::new)
    }
}

impl IdentityResolver for CookieSession {
    fn resolve(&self, headers: &HeaderMap, _namespace: Option<&Namespace>) -> Option<Identity> {
        headers
            .get("x-captain-auth")
            .and_then(|v| v.to_str().ok())
            .map(Identity::new)
            .or_else(|| Self::session(headers))
    }

    fn resolve_session(&self, headers: &HeaderMap) -> Option<Identity> {
        Self::session(headers)
    }
}

/// A running gateway on an ephemeral port.
pub struct Gateway {
    pub addr: SocketAddr,
    pub manager: Arc<ServiceManager>,
    pub shutdown: Shutdown,
}

impl Gateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for Gateway {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub async fn start_gateway(config: GatewayConfig, routers: DomainRouters) -> Gateway {
    let manager = Arc::new(ServiceManager::new(config.tls.force_https));
    let shutdown = Shutdown::new();
    let services = Services::new(manager.clone())
        .with_identity(Arc::new(CookieSession))
        .with_routers(routers);

    let server = HttpServer::new(config, services, shutdown.clone()).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(server.run(listener));

    Gateway {
        addr,
        manager,
        shutdown,
    }
}

/// Client that reports redirects instead of following them.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
