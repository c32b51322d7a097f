/// Sectioned key/value settings persisted as JSON under the data root.
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_SECTION: &str = "options";

/// Keys the launch pipeline reads.
pub const KEY_RAM: &str = "ram";
pub const KEY_NICKNAME: &str = "nickname";

pub const DEFAULT_RAM_MB: u32 = 2048;
pub const DEFAULT_NICKNAME: &str = "Player";

/// User preferences store. Every `set` writes through to disk; the file is
/// created empty on first use.
pub struct Settings {
    path: PathBuf,
    sections: BTreeMap<String, BTreeMap<String, String>>,
}

impl Settings {
    /// Load the settings file, creating an empty one when missing.
    pub fn load_or_create(path: PathBuf) -> Result<Self> {
        let sections = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings file {:?}", path))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse settings file {:?}", path))?
        } else {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create settings dir {:?}", parent))?;
            }
            let empty = BTreeMap::new();
            fs::write(&path, serde_json::to_string_pretty(&empty)?)
                .with_context(|| format!("Failed to create settings file {:?}", path))?;
            log::debug!("Settings file created");
            empty
        };

        Ok(Self { path, sections })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get a setting value.
    pub fn get(&self, key: &str, section: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|s| s.get(key))
            .map(String::as_str)
    }

    /// Set a setting and write the store back to disk.
    pub fn set(&mut self, key: &str, value: &str, section: &str) -> Result<()> {
        self.sections
            .entry(section.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
        self.save()
    }

    fn save(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.sections)
            .context("Failed to serialize settings")?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write settings file {:?}", self.path))
    }

    /// Child-process memory ceiling in megabytes.
    pub fn ram_mb(&self) -> u32 {
        self.get(KEY_RAM, DEFAULT_SECTION)
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_RAM_MB)
    }

    /// Display name passed to the child process.
    pub fn nickname(&self) -> String {
        self.get(KEY_NICKNAME, DEFAULT_SECTION)
            .unwrap_or(DEFAULT_NICKNAME)
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn creates_empty_store_on_first_use() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("settings.json");
        let settings = Settings::load_or_create(path.clone()).unwrap();

        assert!(path.exists());
        assert_eq!(settings.get("ram", DEFAULT_SECTION), None);
        assert_eq!(settings.ram_mb(), DEFAULT_RAM_MB);
        assert_eq!(settings.nickname(), DEFAULT_NICKNAME);
    }

    #[test]
    fn set_persists_across_reload() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("settings.json");

        let mut settings = Settings::load_or_create(path.clone()).unwrap();
        settings.set("ram", "4096", DEFAULT_SECTION).unwrap();
        settings.set("nickname", "Nova", DEFAULT_SECTION).unwrap();
        settings.set("theme", "dark", "display").unwrap();

        let reloaded = Settings::load_or_create(path).unwrap();
        assert_eq!(reloaded.ram_mb(), 4096);
        assert_eq!(reloaded.nickname(), "Nova");
        assert_eq!(reloaded.get("theme", "display"), Some("dark"));
        // Sections are isolated.
        assert_eq!(reloaded.get("theme", DEFAULT_SECTION), None);
    }

    #[test]
    fn unparsable_ram_falls_back_to_default() {
        let tmp = tempdir().unwrap();
        let mut settings =
            Settings::load_or_create(tmp.path().join("settings.json")).unwrap();
        settings.set("ram", "a lot", DEFAULT_SECTION).unwrap();
        assert_eq!(settings.ram_mb(), DEFAULT_RAM_MB);
    }
}
