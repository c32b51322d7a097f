pub mod cache;
pub mod client;
pub mod types;

pub use cache::{load_catalog, save_catalog, CachedCatalog};
pub use client::CatalogClient;
pub use types::{
    CatalogEntry, ConfigEntry, Target, TargetConfig, TargetKind, TargetRegistry, VersionFamily,
};
