use async_trait::async_trait;
use reqwest::{Request, Response};

/// Seam between the coordinate sources and the network, so lookups can be
/// driven by any transport that executes a `reqwest::Request`.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
