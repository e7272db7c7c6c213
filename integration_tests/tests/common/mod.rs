#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// Minimal HTTP endpoint answering every request with the same response.
pub struct MockFeed {
    pub addr: SocketAddr,
    requests: Arc<AtomicUsize>,
    handle: JoinHandle<()>,
}

impl MockFeed {
    pub async fn start(status_line: &'static str, body: impl Into<String>) -> anyhow::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let requests = Arc::new(AtomicUsize::new(0));
        let body = Arc::new(body.into());

        let counter = Arc::clone(&requests);
        let handle = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                let body = Arc::clone(&body);
                tokio::spawn(async move {
                    let _ = respond(stream, status_line, &body).await;
                });
            }
        });

        Ok(Self {
            addr,
            requests,
            handle,
        })
    }

    pub async fn ok(body: impl Into<String>) -> anyhow::Result<Self> {
        Self::start("200 OK", body).await
    }

    pub fn url(&self) -> String {
        format!("http://{}/api/tiles", self.addr)
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl Drop for MockFeed {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn respond(mut stream: TcpStream, status_line: &str, body: &str) -> std::io::Result<()> {
    let mut request = Vec::new();
    let mut chunk = [0u8; 1024];
    while !request.windows(4).any(|window| window == b"\r\n\r\n") {
        let read = stream.read(&mut chunk).await?;
        if read == 0 {
            break;
        }
        request.extend_from_slice(&chunk[..read]);
    }

    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_line,
        body.len(),
        body
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await
}

/// An address nothing is listening on.
pub async fn closed_endpoint() -> anyhow::Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(format!("http://{}/api/tiles", addr))
}

pub const SAMPLE_FEED: &str = r#"{
    "A1": "{\"status\":\"완료\",\"player\":7}",
    "B2": "not json",
    "C3": "{\"status\":\"예약중\",\"player\":\"3\"}",
    "D4": "{\"status\":\"시작중\",\"player\":\"7\"}",
    "E5": "{\"status\":\"보류\",\"player\":3}"
}"#;
