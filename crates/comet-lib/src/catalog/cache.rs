use super::types::CatalogEntry;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

const CATALOG_FILENAME: &str = "catalog.json";

/// Snapshot of the remote catalog kept on disk as a fallback for runs where
/// the catalog endpoint is unreachable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedCatalog {
    pub fetched_at: DateTime<Utc>,
    pub entries: Vec<CatalogEntry>,
}

pub fn catalog_cache_path(data_root: &Path) -> PathBuf {
    data_root.join(CATALOG_FILENAME)
}

/// Persist the fetched catalog beside the cache root.
pub async fn save_catalog(data_root: &Path, entries: &[CatalogEntry]) -> Result<()> {
    let snapshot = CachedCatalog {
        fetched_at: Utc::now(),
        entries: entries.to_vec(),
    };

    let path = catalog_cache_path(data_root);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .context("Failed to create catalog cache directory")?;
    }

    let json = serde_json::to_string_pretty(&snapshot)
        .context("Failed to serialize catalog snapshot")?;
    fs::write(&path, json)
        .await
        .with_context(|| format!("Failed to write catalog cache {:?}", path))?;

    log::debug!("Saved catalog cache to {:?}", path);
    Ok(())
}

/// Load the catalog snapshot written by a previous run.
pub async fn load_catalog(data_root: &Path) -> Result<CachedCatalog> {
    let path = catalog_cache_path(data_root);
    let contents = fs::read_to_string(&path)
        .await
        .with_context(|| format!("Failed to read catalog cache {:?}", path))?;

    serde_json::from_str(&contents).context("Failed to parse catalog cache")
}
