use super::cache::{load_catalog, save_catalog};
use super::types::{CatalogEntry, ConfigEntry, TargetRegistry};
use anyhow::{Context, Result};
use chrono::Utc;
use std::path::PathBuf;

/// Client for the catalog API that supplies resolved target records.
///
/// A successful fetch refreshes the on-disk snapshot; a failed fetch falls
/// back to the snapshot from an earlier run, so the launcher stays usable
/// while the catalog endpoint is down.
pub struct CatalogClient {
    api_url: String,
    client: reqwest::Client,
    data_root: PathBuf,
}

impl CatalogClient {
    pub fn new(api_url: impl Into<String>, client: reqwest::Client, data_root: PathBuf) -> Self {
        let mut api_url = api_url.into();
        if !api_url.ends_with('/') {
            api_url.push('/');
        }
        Self {
            api_url,
            client,
            data_root,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}api/{}/", self.api_url, path);
        log::debug!("Catalog request: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Catalog request failed: {}", url))?;

        if !response.status().is_success() {
            anyhow::bail!("Catalog HTTP error {}: {}", response.status(), url);
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to decode catalog response from {}", url))
    }

    /// Fetch target records from the API.
    pub async fn fetch_entries(&self) -> Result<Vec<CatalogEntry>> {
        self.get_json("clients").await
    }

    /// Fetch per-target config records from the API.
    pub async fn fetch_configs(&self) -> Result<Vec<ConfigEntry>> {
        self.get_json("configs").await
    }

    /// Build the target registry: fresh catalog when reachable, cached
    /// snapshot otherwise. Config records are attached on a best-effort
    /// basis; a config fetch failure never fails registry construction.
    pub async fn load_registry(&self) -> Result<TargetRegistry> {
        let entries = match self.fetch_entries().await {
            Ok(entries) => {
                if let Err(e) = save_catalog(&self.data_root, &entries).await {
                    log::warn!("Failed to refresh catalog cache: {}", e);
                }
                entries
            }
            Err(fetch_err) => {
                log::error!("Failed to fetch catalog: {}", fetch_err);
                let snapshot = load_catalog(&self.data_root)
                    .await
                    .context("Catalog unreachable and no cached snapshot exists")?;
                let age_hours = (Utc::now() - snapshot.fetched_at).num_hours();
                log::info!("Using cached catalog (age: {} hours)", age_hours);
                snapshot.entries
            }
        };

        let mut registry = TargetRegistry::from_entries(&entries);
        if registry.is_empty() {
            log::warn!("Catalog contains no visible targets");
        }

        match self.fetch_configs().await {
            Ok(configs) => {
                log::debug!("Found {} configs", configs.len());
                registry.attach_configs(&configs);
            }
            Err(e) => log::debug!("Skipping configs: {}", e),
        }

        Ok(registry)
    }
}
