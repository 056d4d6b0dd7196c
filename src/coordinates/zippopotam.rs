use anyhow::Result;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use super::{CoordinateSource, CoordinateTable};
use crate::fetch::HttpClient;
use crate::record::LatLon;

pub const DEFAULT_BASE_URL: &str = "https://api.zippopotam.us/us";

/// Pause each worker takes before a request, to stay polite to the API.
pub const REQUEST_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Deserialize)]
struct PlacesResponse {
    #[serde(default)]
    places: Vec<Place>,
}

#[derive(Debug, Deserialize)]
struct Place {
    latitude: String,
    longitude: String,
}

/// Per-ZIP lookups against the Zippopotam.us API, `concurrency` at a time.
pub struct Zippopotam<C> {
    client: Arc<C>,
    base_url: String,
    concurrency: usize,
    delay: Duration,
}

impl<C: HttpClient + 'static> Zippopotam<C> {
    pub fn new(client: C, concurrency: usize) -> Self {
        Self {
            client: Arc::new(client),
            base_url: DEFAULT_BASE_URL.to_string(),
            concurrency: concurrency.max(1),
            delay: REQUEST_DELAY,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Extracts the first place's coordinates from an API response body.
pub fn parse_places(body: &[u8]) -> Option<LatLon> {
    let response: PlacesResponse = serde_json::from_slice(body).ok()?;
    let place = response.places.first()?;
    let lat = place.latitude.trim().parse().ok()?;
    let lon = place.longitude.trim().parse().ok()?;
    Some(LatLon::new(lat, lon)).filter(LatLon::is_finite)
}

async fn lookup_one<C: HttpClient>(client: &C, url: &str) -> Result<Option<LatLon>> {
    let req = reqwest::Request::new(reqwest::Method::GET, url.parse()?);
    let resp = client.execute(req).await?;
    if resp.status() != reqwest::StatusCode::OK {
        debug!(url, status = %resp.status(), "No coordinates for ZIP");
        return Ok(None);
    }
    let body = resp.bytes().await?;
    Ok(parse_places(&body))
}

#[async_trait::async_trait]
impl<C: HttpClient + 'static> CoordinateSource for Zippopotam<C> {
    fn name(&self) -> &str {
        "zippopotam"
    }

    async fn lookup(&self, zip_codes: &[String]) -> Result<CoordinateTable> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for zip in zip_codes {
            let sem = semaphore.clone();
            let client = self.client.clone();
            let url = format!("{}/{}", self.base_url.trim_end_matches('/'), zip);
            let zip = zip.clone();
            let delay = self.delay;

            tasks.spawn(async move {
                let _permit = sem.acquire_owned().await.ok()?;
                tokio::time::sleep(delay).await;
                match lookup_one(client.as_ref(), &url).await {
                    Ok(point) => point.map(|p| (zip, p)),
                    Err(e) => {
                        warn!(zip = %zip, error = %e, "ZIP lookup failed");
                        None
                    }
                }
            });
        }

        let mut table = CoordinateTable::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Some((zip, point))) => table.insert(zip, point),
                Ok(None) => {}
                Err(e) => warn!(error = %e, "ZIP lookup task panicked"),
            }
        }
        Ok(table)
    }
}
