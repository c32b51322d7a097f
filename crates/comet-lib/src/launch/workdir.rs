/// Scoped working-directory change.
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Changes the process working directory on entry and restores the previous
/// one on drop, so every exit path of a launch — including spawn failures
/// and panics unwinding through the orchestrator — puts the directory back.
pub struct WorkdirGuard {
    previous: PathBuf,
}

impl WorkdirGuard {
    pub fn enter(dir: &Path) -> Result<Self> {
        let previous = std::env::current_dir().context("Failed to read working directory")?;
        std::env::set_current_dir(dir)
            .with_context(|| format!("Failed to enter working directory {:?}", dir))?;
        log::debug!("Working directory: {:?}", dir);
        Ok(Self { previous })
    }

    pub fn previous(&self) -> &Path {
        &self.previous
    }
}

impl Drop for WorkdirGuard {
    fn drop(&mut self) {
        if let Err(e) = std::env::set_current_dir(&self.previous) {
            log::warn!(
                "Failed to restore working directory {:?}: {}",
                self.previous,
                e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn restores_previous_directory_on_drop() {
        let tmp = tempdir().unwrap();
        let before = std::env::current_dir().unwrap();

        {
            let guard = WorkdirGuard::enter(tmp.path()).unwrap();
            assert_eq!(
                std::env::current_dir().unwrap().canonicalize().unwrap(),
                tmp.path().canonicalize().unwrap()
            );
            assert_eq!(guard.previous(), before.as_path());
        }

        assert_eq!(std::env::current_dir().unwrap(), before);
    }

    #[test]
    fn entering_missing_directory_fails_without_changing_cwd() {
        let before = std::env::current_dir().unwrap();
        let result = WorkdirGuard::enter(Path::new("/definitely/not/a/real/dir"));
        assert!(result.is_err());
        assert_eq!(std::env::current_dir().unwrap(), before);
    }
}
