/// Core types describing launchable targets.
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Jar name and loader class used by Fabric-kind targets. These are fixed:
/// every Fabric target boots through the same bootstrap jar and entry point.
pub const FABRIC_BOOTSTRAP_JAR: &str = "fabric-1.21.jar";
pub const FABRIC_ENTRY_CLASS: &str = "net.fabricmc.loader.impl.launch.knot.KnotClient";

/// Raw target record as served by the catalog API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: i64,
    pub name: String,
    pub filename: String,
    pub main_class: String,
    pub version: String,
    pub internal: bool,
    pub working: bool,
    pub fabric: bool,
    pub show_in_loader: bool,
}

/// Raw per-target config record as served by the catalog API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigEntry {
    pub id: i64,
    pub file: String,
    pub config_path: String,
    pub client_name: String,
}

/// How a target boots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    /// Launches through its own entry point with the shared library set.
    Standard,
    /// Launches through the fixed Knot entry point with the Fabric
    /// library/native set and a fixed bootstrap jar.
    Fabric,
}

impl TargetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Standard => "standard",
            TargetKind::Fabric => "fabric",
        }
    }
}

/// Library/native bundle generation, derived from the version tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionFamily {
    /// 1.12-era targets use the old library and native bundles.
    Legacy,
    Modern,
}

/// A downloadable config file attached to a target.
#[derive(Debug, Clone)]
pub struct TargetConfig {
    pub id: i64,
    /// Absolute URL of the config file.
    pub file_url: String,
    /// Directory under the target's cache dir the file installs into.
    pub config_dir: String,
    pub filename: String,
}

impl TargetConfig {
    pub fn from_entry(entry: &ConfigEntry) -> Self {
        let filename = entry
            .file
            .rsplit('/')
            .next()
            .unwrap_or(entry.file.as_str())
            .to_string();
        Self {
            id: entry.id,
            file_url: entry.file.clone(),
            config_dir: entry.config_path.clone(),
            filename,
        }
    }
}

/// One launchable target: catalog metadata plus derived local paths.
/// Immutable after construction except for the append-only `configs` list.
#[derive(Debug, Clone)]
pub struct Target {
    pub id: i64,
    pub name: String,
    /// Remote filename of the target's own artifact.
    pub download_url: String,
    pub entry_point: String,
    /// Launch version tag. For standard targets the catalog's patch suffix
    /// is already cut ("1.12.2" -> "1.12"), matching the asset index naming.
    pub version_tag: String,
    /// Prefer resources bundled inside the target's own directory.
    pub internal: bool,
    pub working: bool,
    pub kind: TargetKind,
    pub configs: Vec<TargetConfig>,
}

impl Target {
    pub fn from_entry(entry: &CatalogEntry) -> Self {
        let kind = if entry.fabric {
            TargetKind::Fabric
        } else {
            TargetKind::Standard
        };

        // Standard targets drop the two-character patch suffix; Fabric
        // targets keep the full tag and pin their asset index separately.
        let version_tag = match kind {
            TargetKind::Standard if entry.version.len() > 2 => {
                entry.version[..entry.version.len() - 2].to_string()
            }
            _ => entry.version.clone(),
        };

        Self {
            id: entry.id,
            name: entry.name.clone(),
            download_url: entry.filename.clone(),
            entry_point: entry.main_class.clone(),
            version_tag,
            internal: entry.internal,
            working: entry.working,
            kind,
            configs: Vec::new(),
        }
    }

    /// Remote filename of the target artifact.
    pub fn filename(&self) -> &str {
        self.download_url
            .rsplit('/')
            .next()
            .unwrap_or(self.download_url.as_str())
    }

    /// Filename without its extension; names the per-target cache directory.
    pub fn base_name(&self) -> &str {
        let filename = self.filename();
        filename
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .unwrap_or(filename)
    }

    /// The jar the launch classpath ends with.
    pub fn jar_name(&self) -> String {
        match self.kind {
            TargetKind::Standard => format!("{}.jar", self.base_name()),
            TargetKind::Fabric => FABRIC_BOOTSTRAP_JAR.to_string(),
        }
    }

    /// Per-target directory under the cache root.
    pub fn cache_dir(&self, cache_root: &Path) -> PathBuf {
        cache_root.join(self.base_name())
    }

    pub fn version_family(&self) -> VersionFamily {
        if self.version_tag.starts_with("1.12") {
            VersionFamily::Legacy
        } else {
            VersionFamily::Modern
        }
    }
}

/// Registry of all launchable targets, built once at startup and passed by
/// reference to whoever needs it.
#[derive(Debug, Default)]
pub struct TargetRegistry {
    targets: Vec<Target>,
}

impl TargetRegistry {
    /// Build the registry from catalog records, skipping hidden entries.
    pub fn from_entries(entries: &[CatalogEntry]) -> Self {
        let targets = entries
            .iter()
            .filter(|e| e.show_in_loader)
            .map(Target::from_entry)
            .collect();
        Self { targets }
    }

    pub fn all(&self) -> &[Target] {
        &self.targets
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Find a target by name: exact case-insensitive match first, then
    /// substring match.
    pub fn find(&self, name: &str) -> Option<&Target> {
        let needle = name.to_lowercase();
        self.targets
            .iter()
            .find(|t| t.name.to_lowercase() == needle)
            .or_else(|| {
                self.targets
                    .iter()
                    .find(|t| t.name.to_lowercase().contains(&needle))
            })
    }

    /// Attach config records to their targets by name.
    pub fn attach_configs(&mut self, entries: &[ConfigEntry]) {
        for entry in entries {
            if let Some(target) = self
                .targets
                .iter_mut()
                .find(|t| entry.client_name.contains(&t.name))
            {
                target.configs.push(TargetConfig::from_entry(entry));
            } else {
                log::debug!("Config {} references unknown target", entry.id);
            }
        }
    }
}
