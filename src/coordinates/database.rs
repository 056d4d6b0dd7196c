use anyhow::{Context, Result};
use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::{CoordinateSource, CoordinateTable};
use crate::fetch::{HttpClient, fetch_bytes};
use crate::record::LatLon;

pub const DEFAULT_DATABASE_URL: &str =
    "https://raw.githubusercontent.com/kelvins/US-ZipCodes-Database/master/US-ZipCodes.csv";

#[derive(Debug, Deserialize)]
struct DatabaseRow {
    #[serde(rename = "ZipCode")]
    zip_code: String,
    #[serde(rename = "Latitude")]
    latitude: String,
    #[serde(rename = "Longitude")]
    longitude: String,
}

/// Resolves ZIP codes from a bulk CSV database, downloaded on first use.
pub struct ZipDatabase<C> {
    client: C,
    url: String,
    table: OnceCell<CoordinateTable>,
}

impl<C: HttpClient> ZipDatabase<C> {
    pub fn new(client: C) -> Self {
        Self::with_url(client, DEFAULT_DATABASE_URL)
    }

    pub fn with_url(client: C, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            table: OnceCell::new(),
        }
    }

    async fn table(&self) -> Result<&CoordinateTable> {
        self.table
            .get_or_try_init(|| async {
                info!(url = %self.url, "Downloading ZIP code database");
                let bytes = fetch_bytes(&self.client, &self.url)
                    .await
                    .with_context(|| format!("Failed to download {}", self.url))?;
                let table = parse_database(&bytes)?;
                info!(entries = table.len(), "ZIP code database loaded");
                Ok::<_, anyhow::Error>(table)
            })
            .await
    }
}

/// Parses `ZipCode,Latitude,Longitude` rows. Rows whose coordinates do not
/// parse to finite numbers are skipped.
pub fn parse_database(bytes: &[u8]) -> Result<CoordinateTable> {
    let mut rdr = csv::Reader::from_reader(bytes);
    let mut table = CoordinateTable::default();
    let mut skipped = 0usize;

    for result in rdr.deserialize() {
        let row: DatabaseRow = result?;
        let point = match (row.latitude.trim().parse(), row.longitude.trim().parse()) {
            (Ok(lat), Ok(lon)) => Some(LatLon::new(lat, lon)),
            _ => None,
        };
        // `f64::from_str` accepts "NaN" and "inf", which JSON cannot store.
        match point.filter(LatLon::is_finite) {
            Some(point) => table.insert(row.zip_code.trim(), point),
            None => skipped += 1,
        }
    }

    debug!(skipped, "Database rows without usable coordinates");
    Ok(table)
}

#[async_trait::async_trait]
impl<C: HttpClient> CoordinateSource for ZipDatabase<C> {
    fn name(&self) -> &str {
        "zip-database"
    }

    async fn lookup(&self, zip_codes: &[String]) -> Result<CoordinateTable> {
        let database = self.table().await?;
        let mut found = CoordinateTable::default();
        for zip in zip_codes {
            if let Some(point) = database.get(zip) {
                found.insert(zip.clone(), point);
            }
        }
        Ok(found)
    }
}
