use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Router;
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, Method, Uri};
use tokio::net::TcpListener;

/// Requests to paths starting with this prefix are answered after a long delay.
pub const SLOW_PREFIX: &str = "/slow";

/// A request as the server received it.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    /// Request target exactly as sent, path plus query.
    pub path: String,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl CapturedRequest {
    /// First value of a header, empty if absent.
    pub fn header(&self, name: &str) -> &str {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }
}

type Captured = Arc<Mutex<Vec<CapturedRequest>>>;

/// Local HTTP server recording every request it answers.
pub struct TestServer {
    addr: SocketAddr,
    requests: Captured,
}

impl TestServer {
    pub async fn start() -> Result<Self> {
        let _ = env_logger::builder().is_test(true).try_init();

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let requests = Captured::default();

        let app = Router::new().fallback(record).with_state(requests.clone());
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self { addr, requests })
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().expect("lock must not be poisoned").clone()
    }
}

async fn record(
    State(requests): State<Captured>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let path = uri
        .path_and_query()
        .map(|v| v.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());
    let slow = path.starts_with(SLOW_PREFIX);

    requests
        .lock()
        .expect("lock must not be poisoned")
        .push(CapturedRequest {
            method: method.to_string(),
            path,
            headers,
            body: body.to_vec(),
        });

    if slow {
        tokio::time::sleep(Duration::from_secs(10)).await;
    }

    ([(CONTENT_TYPE, "application/json")], r#"{"acknowledged":true}"#)
}
