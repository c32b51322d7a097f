/// Asset acquisition: cache presence checks, resumable downloads and
/// archive extraction into the per-asset cache layout.
use crate::progress::ProgressSink;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Failure modes for a single asset. The orchestrator reports these and
/// moves on; one bad asset never aborts the whole launch sequence.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("transfer failed: {0}")]
    Transfer(#[source] reqwest::Error),
    #[error("archive error: {0}")]
    Archive(#[source] zip::result::ZipError),
    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error),
}

/// Downloads assets from the selected content server into the cache root.
///
/// Presence on disk is the only acquired-state marker: a per-asset directory
/// for archives, `<base>/<base>.jar` for jars. Interrupted transfers resume
/// from the size of the partial destination file.
pub struct AssetFetcher {
    cache_root: PathBuf,
    base_url: String,
    client: reqwest::Client,
    sink: Arc<dyn ProgressSink>,
}

impl AssetFetcher {
    pub fn new(
        cache_root: PathBuf,
        base_url: String,
        client: reqwest::Client,
        sink: Arc<dyn ProgressSink>,
    ) -> Self {
        Self {
            cache_root,
            base_url,
            client,
            sink,
        }
    }

    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    /// Local path of a file directly under the cache root.
    pub fn local_path(&self, filename: &str) -> PathBuf {
        self.cache_root.join(filename)
    }

    /// Remote URL for a logical path: absolute URLs pass through verbatim,
    /// anything else resolves against the selected content server.
    pub fn resolve_url(&self, logical_path: &str) -> String {
        if is_absolute_url(logical_path) {
            logical_path.to_string()
        } else {
            format!("{}{}", self.base_url, file_name_of(logical_path))
        }
    }

    /// Make an asset available in the cache, downloading and unpacking it
    /// only when the presence check fails.
    ///
    /// `destination` overrides the default download location (used for
    /// per-target config files); `raw` leaves a fetched jar at the
    /// destination instead of relocating it into the per-asset directory.
    pub async fn ensure_available(
        &self,
        logical_path: &str,
        destination: Option<&Path>,
        raw: bool,
    ) -> Result<(), FetchError> {
        let filename = file_name_of(logical_path).to_string();
        let asset_dir = self.cache_root.join(base_name_of(&filename));
        let dest = destination
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.cache_root.join(&filename));

        if self.is_cached(logical_path, &filename, &asset_dir, &dest) {
            log::debug!("{} already downloaded, skip", filename);
            return Ok(());
        }

        log::debug!("Downloading {} to {:?}", filename, dest);

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await?;
        }

        self.download_file(logical_path, &filename, &dest).await?;
        self.postprocess(&filename, &dest, &asset_dir, raw).await
    }

    /// Presence check. Absolute-URL assets key off the literal destination
    /// path; everything else keys off the conventional cache layout.
    fn is_cached(&self, logical_path: &str, filename: &str, asset_dir: &Path, dest: &Path) -> bool {
        if is_absolute_url(logical_path) {
            return dest.exists();
        }

        if filename.ends_with(".jar") {
            asset_dir
                .join(format!("{}.jar", base_name_of(filename)))
                .exists()
        } else {
            asset_dir.is_dir()
        }
    }

    /// Streaming download with byte-range resume. The resume offset is the
    /// size of whatever partial file is already at the destination.
    async fn download_file(
        &self,
        logical_path: &str,
        filename: &str,
        dest: &Path,
    ) -> Result<(), FetchError> {
        let offset = match fs::metadata(dest).await {
            Ok(meta) => meta.len(),
            Err(_) => 0,
        };

        let url = self.resolve_url(logical_path);
        let mut request = self.client.get(&url);
        if offset > 0 {
            log::debug!("Resuming {} from byte {}", filename, offset);
            request = request.header(reqwest::header::RANGE, format!("bytes={}-", offset));
        }

        let response = request
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(FetchError::Transfer)?;

        let total_size = response.content_length();

        self.sink.task_started(filename);

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(dest)
            .await?;

        let mut transferred: u64 = 0;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(FetchError::Transfer)?;
            file.write_all(&chunk).await?;
            transferred += chunk.len() as u64;
            self.sink.bytes_transferred(transferred, total_size);
        }
        file.flush().await?;

        self.sink.task_finished(filename);
        Ok(())
    }

    /// Post-process a finished download by extension: archives unpack into
    /// the per-asset directory, jars relocate there unless `raw`.
    ///
    /// The per-asset directory only comes into existence here, after the
    /// transfer succeeded, so a failed download cannot leave an empty entry
    /// that a later presence check would trust.
    async fn postprocess(
        &self,
        filename: &str,
        dest: &Path,
        asset_dir: &Path,
        raw: bool,
    ) -> Result<(), FetchError> {
        let result = if filename.ends_with(".zip") {
            match self.extract_archive(dest, asset_dir) {
                Ok(()) => fs::remove_file(dest).await.map_err(FetchError::from),
                Err(e) => Err(e),
            }
        } else if filename.ends_with(".jar") && !raw {
            match fs::create_dir_all(asset_dir).await {
                Ok(()) => fs::rename(dest, asset_dir.join(filename))
                    .await
                    .map_err(FetchError::from),
                Err(e) => Err(FetchError::from(e)),
            }
        } else {
            Ok(())
        };

        if let Err(e) = result {
            // Never let a half-written entry satisfy a later presence check.
            if dest.exists() {
                let _ = fs::remove_file(dest).await;
            }
            return Err(e);
        }

        Ok(())
    }

    /// Extract a zip archive, staging into a temporary sibling directory and
    /// renaming into place so an interrupted extraction cannot leave a
    /// half-populated asset directory behind.
    fn extract_archive(&self, archive_path: &Path, final_dir: &Path) -> Result<(), FetchError> {
        let staging = self.cache_root.join(format!(
            ".{}.staging",
            final_dir
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "asset".to_string())
        ));
        if staging.exists() {
            std::fs::remove_dir_all(&staging)?;
        }
        std::fs::create_dir_all(&staging)?;

        if let Err(e) = extract_into(archive_path, &staging) {
            let _ = std::fs::remove_dir_all(&staging);
            return Err(e);
        }

        if final_dir.exists() {
            std::fs::remove_dir_all(final_dir)?;
        }
        std::fs::rename(&staging, final_dir)?;

        log::debug!("Extracted archive into {:?}", final_dir);
        Ok(())
    }
}

fn extract_into(archive_path: &Path, staging: &Path) -> Result<(), FetchError> {
    let file = std::fs::File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(file).map_err(FetchError::Archive)?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(FetchError::Archive)?;
        let outpath = staging.join(entry.name());

        if entry.name().ends_with('/') {
            std::fs::create_dir_all(&outpath)?;
        } else {
            if let Some(parent) = outpath.parent() {
                if !parent.exists() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            let mut outfile = std::fs::File::create(&outpath)?;
            std::io::copy(&mut entry, &mut outfile)?;
        }

        // Preserve executable bits for bundled runtimes
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                std::fs::set_permissions(&outpath, std::fs::Permissions::from_mode(mode))?;
            }
        }
    }

    Ok(())
}

fn is_absolute_url(path: &str) -> bool {
    url::Url::parse(path)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

fn file_name_of(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn base_name_of(filename: &str) -> &str {
    filename
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(filename)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::SilentSink;
    use std::io::Write;
    use tempfile::tempdir;

    fn fetcher(root: &Path) -> AssetFetcher {
        AssetFetcher::new(
            root.to_path_buf(),
            "https://example.org/".to_string(),
            reqwest::Client::new(),
            Arc::new(SilentSink),
        )
    }

    fn write_zip(path: &Path, name: &str, contents: &[u8]) {
        let file = std::fs::File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        zip.start_file::<&str, ()>(name, zip::write::FileOptions::default())
            .unwrap();
        zip.write_all(contents).unwrap();
        zip.finish().unwrap();
    }

    #[test]
    fn url_resolution() {
        let tmp = tempdir().unwrap();
        let f = fetcher(tmp.path());

        assert_eq!(
            f.resolve_url("natives.zip"),
            "https://example.org/natives.zip"
        );
        assert_eq!(
            f.resolve_url("https://mirror.example.net/custom.json"),
            "https://mirror.example.net/custom.json"
        );
    }

    #[test]
    fn absolute_url_detection() {
        assert!(is_absolute_url("https://example.org/a.json"));
        assert!(is_absolute_url("http://example.org/a.json"));
        assert!(!is_absolute_url("libraries.zip"));
        assert!(!is_absolute_url("dir/libraries.zip"));
    }

    #[test]
    fn extraction_stages_then_renames() {
        let tmp = tempdir().unwrap();
        let f = fetcher(tmp.path());

        let archive = tmp.path().join("bundle.zip");
        write_zip(&archive, "inner/file.txt", b"payload");

        let final_dir = tmp.path().join("bundle");
        f.extract_archive(&archive, &final_dir).unwrap();

        assert!(final_dir.join("inner/file.txt").exists());
        assert!(!tmp.path().join(".bundle.staging").exists());
    }

    #[test]
    fn bad_archive_leaves_no_final_dir() {
        let tmp = tempdir().unwrap();
        let f = fetcher(tmp.path());

        let archive = tmp.path().join("broken.zip");
        std::fs::write(&archive, b"this is not a zip").unwrap();

        let final_dir = tmp.path().join("broken");
        assert!(f.extract_archive(&archive, &final_dir).is_err());
        assert!(!final_dir.exists());
    }

    #[tokio::test]
    async fn presence_checks_follow_cache_layout() {
        let tmp = tempdir().unwrap();
        let f = fetcher(tmp.path());

        // Archive asset: presence is the per-asset directory.
        assert!(!f.is_cached("natives.zip", "natives.zip", &tmp.path().join("natives"), &tmp.path().join("natives.zip")));
        fs::create_dir_all(tmp.path().join("natives")).await.unwrap();
        assert!(f.is_cached("natives.zip", "natives.zip", &tmp.path().join("natives"), &tmp.path().join("natives.zip")));

        // Jar asset: presence is <base>/<base>.jar, not the bare directory.
        let jar_dir = tmp.path().join("aurora");
        fs::create_dir_all(&jar_dir).await.unwrap();
        assert!(!f.is_cached("aurora.jar", "aurora.jar", &jar_dir, &tmp.path().join("aurora.jar")));
        fs::write(jar_dir.join("aurora.jar"), b"jar").await.unwrap();
        assert!(f.is_cached("aurora.jar", "aurora.jar", &jar_dir, &tmp.path().join("aurora.jar")));

        // Absolute-URL asset: presence keys off the literal destination.
        let dest = tmp.path().join("aurora/config/default.json");
        assert!(!f.is_cached("https://x.example/default.json", "default.json", &tmp.path().join("default"), &dest));
        fs::create_dir_all(dest.parent().unwrap()).await.unwrap();
        fs::write(&dest, b"{}").await.unwrap();
        assert!(f.is_cached("https://x.example/default.json", "default.json", &tmp.path().join("default"), &dest));
    }
}
