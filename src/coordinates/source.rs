use anyhow::Result;
use std::path::Path;
use tracing::{info, warn};

use super::CoordinateTable;

/// Abstraction over a provider of ZIP coordinates.
#[async_trait::async_trait]
pub trait CoordinateSource {
    /// Human-readable name used in log lines.
    fn name(&self) -> &str;

    /// Resolves as many of `zip_codes` as the source knows. Unknown ZIP
    /// codes are absent from the returned table.
    async fn lookup(&self, zip_codes: &[String]) -> Result<CoordinateTable>;
}

/// ZIP codes per lookup batch; the table is saved after each one.
const CHUNK_SIZE: usize = 100;

/// Resolves every ZIP in `zip_codes` that `table` lacks, saving progress to
/// `save_to` after each batch. Returns how many entries were added.
#[tracing::instrument(skip_all, fields(source = source.name(), requested = zip_codes.len()))]
pub async fn fill_missing<S: CoordinateSource + Sync>(
    source: &S,
    table: &mut CoordinateTable,
    zip_codes: &[String],
    save_to: &Path,
) -> Result<usize> {
    let mut missing: Vec<String> = zip_codes
        .iter()
        .filter(|zip| !table.contains(zip))
        .cloned()
        .collect();
    missing.sort();
    missing.dedup();

    if missing.is_empty() {
        info!("All ZIP codes already have coordinates");
        return Ok(0);
    }
    info!(missing = missing.len(), "Resolving missing ZIP codes");

    let mut added = 0;
    for (idx, chunk) in missing.chunks(CHUNK_SIZE).enumerate() {
        let fetched = source.lookup(chunk).await?;
        let found = fetched.len();
        added += table.merge_missing(fetched);

        if found < chunk.len() {
            warn!(chunk = idx, not_found = chunk.len() - found, "Some ZIP codes were not found");
        }

        table.save(save_to)?;
        info!(chunk = idx, total = table.len(), "Saved progress");
    }

    info!(added, total = table.len(), "Coordinate fetch complete");
    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::LatLon;
    use std::sync::Mutex;

    /// Knows every ZIP starting with "1" and records the batch sizes it saw.
    struct StubSource {
        batches: Mutex<Vec<usize>>,
    }

    #[async_trait::async_trait]
    impl CoordinateSource for StubSource {
        fn name(&self) -> &str {
            "stub"
        }

        async fn lookup(&self, zip_codes: &[String]) -> Result<CoordinateTable> {
            self.batches.lock().unwrap().push(zip_codes.len());
            let mut table = CoordinateTable::default();
            for zip in zip_codes.iter().filter(|z| z.starts_with('1')) {
                table.insert(zip.clone(), LatLon::new(40.0, -74.0));
            }
            Ok(table)
        }
    }

    #[tokio::test]
    async fn test_fill_missing_skips_known_and_batches() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zip_coordinates.json");

        let mut table = CoordinateTable::default();
        table.insert("10000", LatLon::new(1.0, 1.0));

        let mut zips: Vec<String> = (0..150).map(|i| format!("{}", 10000 + i)).collect();
        zips.push("90210".to_string());
        zips.push("10001".to_string());

        let source = StubSource {
            batches: Mutex::new(Vec::new()),
        };
        let added = fill_missing(&source, &mut table, &zips, &path).await.unwrap();

        assert_eq!(added, 149);
        assert_eq!(table.get("10000"), Some(LatLon::new(1.0, 1.0)));
        assert!(!table.contains("90210"));
        assert_eq!(*source.batches.lock().unwrap(), vec![100, 50]);
        assert_eq!(CoordinateTable::load(&path).unwrap(), table);
    }

    #[tokio::test]
    async fn test_fill_missing_nothing_to_do() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zip_coordinates.json");
        let mut table = CoordinateTable::default();
        table.insert("10001", LatLon::new(40.0, -74.0));

        let source = StubSource {
            batches: Mutex::new(Vec::new()),
        };
        let added = fill_missing(&source, &mut table, &["10001".to_string()], &path)
            .await
            .unwrap();
        assert_eq!(added, 0);
        assert!(source.batches.lock().unwrap().is_empty());
        assert!(!path.exists());
    }
}
