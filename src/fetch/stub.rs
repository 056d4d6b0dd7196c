//! Canned-response `HttpClient` for exercising the coordinate sources
//! without a network.

use super::HttpClient;
use async_trait::async_trait;
use reqwest::{Request, Response};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

enum Reply {
    Status(u16, String),
    TransportError,
}

/// Answers by URL path. Unknown paths get an empty 404.
#[derive(Default)]
pub struct StubClient {
    replies: HashMap<String, Reply>,
    latency: Duration,
    requests: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl StubClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, path: &str, status: u16, body: &str) -> Self {
        self.replies
            .insert(path.to_string(), Reply::Status(status, body.to_string()));
        self
    }

    pub fn fail(mut self, path: &str) -> Self {
        self.replies.insert(path.to_string(), Reply::TransportError);
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Paths requested so far, in arrival order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    /// Highest number of requests that were in flight at once.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

fn status_response(status: u16, body: String) -> Response {
    http::Response::builder()
        .status(status)
        .body(body)
        .unwrap()
        .into()
}

#[async_trait]
impl HttpClient for StubClient {
    async fn execute(&self, req: Request) -> reqwest::Result<Response> {
        let path = req.url().path().to_string();
        self.requests.lock().unwrap().push(path.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.latency).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.replies.get(&path) {
            Some(Reply::Status(status, body)) => Ok(status_response(*status, body.clone())),
            // A relative URL fails in the request builder, which yields a
            // genuine `reqwest::Error` without touching the network.
            Some(Reply::TransportError) => Err(reqwest::Client::new()
                .get("not a url")
                .build()
                .unwrap_err()),
            None => Ok(status_response(404, String::new())),
        }
    }
}
