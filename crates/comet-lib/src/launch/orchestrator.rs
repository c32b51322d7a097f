/// Launch orchestration: requirement fetching, process supervision and
/// post-run log analysis.
use super::invocation::{build_invocation, requirement_bundles};
use super::types::{LaunchOutcome, OsType, RunPhase};
use super::workdir::WorkdirGuard;
use crate::catalog::types::FABRIC_BOOTSTRAP_JAR;
use crate::catalog::{Target, TargetConfig, TargetKind};
use crate::crash::LogClassifier;
use crate::fetch::{AssetFetcher, FetchError};
use crate::progress::{ProgressSink, TitleHook};
use crate::settings::Settings;
use anyhow::{Context, Result};
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::AsyncBufReadExt;
use tokio::sync::{mpsc, watch, Mutex};

/// Resets the window title when a launch scope ends, whatever the path out.
struct TitleScope {
    hook: Arc<dyn TitleHook>,
}

impl Drop for TitleScope {
    fn drop(&mut self) {
        self.hook.reset_title();
    }
}

/// Drives the full pipeline for one target: fetch requirements, fetch the
/// target artifact, build and spawn the invocation, stream output, classify.
///
/// A single in-process gate serializes overlapping `run` calls, so a second
/// caller (the interactive loop and a control surface, say) cannot race
/// unguarded cache writes.
pub struct Orchestrator {
    fetcher: AssetFetcher,
    classifier: LogClassifier,
    sink: Arc<dyn ProgressSink>,
    title: Arc<dyn TitleHook>,
    run_gate: Mutex<()>,
}

impl Orchestrator {
    pub fn new(
        fetcher: AssetFetcher,
        classifier: LogClassifier,
        sink: Arc<dyn ProgressSink>,
        title: Arc<dyn TitleHook>,
    ) -> Self {
        Self {
            fetcher,
            classifier,
            sink,
            title,
            run_gate: Mutex::new(()),
        }
    }

    pub fn fetcher(&self) -> &AssetFetcher {
        &self.fetcher
    }

    fn advance(&self, phase: &mut RunPhase, next: RunPhase) {
        log::debug!("Launch phase: {} -> {}", phase, next);
        *phase = next;
    }

    /// Run a target to completion. Blocks until the child's output streams
    /// close; per-asset fetch failures are reported and skipped, but a
    /// missing target artifact short-circuits the run before spawn.
    pub async fn run(&self, target: &Target, settings: &Settings) -> Result<LaunchOutcome> {
        let _gate = self.run_gate.lock().await;

        log::info!("Running {}", target.name);
        self.title.set_title(&format!("Comet >> {}", target.name));
        let _title = TitleScope {
            hook: self.title.clone(),
        };

        let mut phase = RunPhase::Idle;
        let cache_dir = target.cache_dir(self.fetcher.cache_root());

        // Requirements first, in a fixed order: later steps assume earlier
        // bundles are already on disk.
        self.advance(&mut phase, RunPhase::DownloadingRequirements);
        for bundle in requirement_bundles(target) {
            if let Err(e) = self.fetcher.ensure_available(bundle, None, false).await {
                log::error!("Failed to download {}: {}", bundle, e);
                self.sink
                    .notice(&format!("Failed to download {}: {}", bundle, e));
            }
        }

        self.advance(&mut phase, RunPhase::DownloadingSelf);
        if let Err(e) = self.ensure_artifact(target).await {
            log::error!("Failed to download {}: {}", target.name, e);
            self.sink
                .notice(&format!("Failed to download {}: {}", target.name, e));
        }
        if !cache_dir.join(target.jar_name()).exists() {
            // Without the artifact there is nothing to spawn.
            self.advance(&mut phase, RunPhase::Done);
            return Ok(LaunchOutcome {
                launched: false,
                verdict: None,
            });
        }

        self.advance(&mut phase, RunPhase::Launching);
        let invocation = build_invocation(
            target,
            &cache_dir,
            settings.ram_mb(),
            &settings.nickname(),
            OsType::current(),
        );
        log::debug!("{}", invocation.command_line());

        self.sink
            .task_started(&format!("{} {}", target.name, settings.nickname()));

        let workdir = WorkdirGuard::enter(&cache_dir)?;

        let mut child = tokio::process::Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.current_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .context("Failed to spawn runtime process")?;

        self.advance(&mut phase, RunPhase::Running);

        // Elapsed-time ticker, cancelled once the output pump finishes.
        let (cancel_tx, mut cancel_rx) = watch::channel(false);
        let ticker_sink = self.sink.clone();
        let ticker = tokio::spawn(async move {
            let start = Instant::now();
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        ticker_sink.elapsed(start.elapsed().as_secs());
                    }
                    _ = cancel_rx.changed() => break,
                }
            }
        });

        // Pump stdout and stderr into one merged line stream.
        let (line_tx, mut line_rx) = mpsc::unbounded_channel::<String>();
        if let Some(stdout) = child.stdout.take() {
            let tx = line_tx.clone();
            tokio::spawn(async move {
                let mut lines = tokio::io::BufReader::new(stdout).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
            });
        }
        if let Some(stderr) = child.stderr.take() {
            let tx = line_tx.clone();
            tokio::spawn(async move {
                let mut lines = tokio::io::BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
            });
        }
        drop(line_tx);

        let mut buffer = String::new();
        while let Some(line) = line_rx.recv().await {
            self.sink.child_line(&line);
            buffer.push_str(&line);
            buffer.push('\n');
        }

        let _ = cancel_tx.send(true);
        let _ = ticker.await;

        // The exit status is logged for diagnostics only; crash detection
        // works from the captured text.
        match child.wait().await {
            Ok(status) => log::debug!("Runtime process exited: {}", status),
            Err(e) => log::warn!("Failed to wait for runtime process: {}", e),
        }

        self.advance(&mut phase, RunPhase::LogAnalysis);
        drop(workdir);

        let verdict = self.classifier.classify(&buffer, &target.name)?;
        if let Some(ref verdict) = verdict {
            self.sink.notice(&format!(
                "Game crashed because {}",
                verdict.category.reason()
            ));
            self.sink.await_acknowledgment();
        } else {
            log::info!("{} finished", target.name);
        }

        self.advance(&mut phase, RunPhase::Done);
        self.sink.task_finished(&target.name);

        Ok(LaunchOutcome {
            launched: true,
            verdict,
        })
    }

    /// Fetch the target's own artifact. Standard targets follow the normal
    /// jar path into the per-asset directory; Fabric targets fetch the
    /// fixed bootstrap jar raw into their cache dir.
    async fn ensure_artifact(&self, target: &Target) -> Result<(), FetchError> {
        match target.kind {
            TargetKind::Standard => {
                self.fetcher
                    .ensure_available(target.filename(), None, false)
                    .await
            }
            TargetKind::Fabric => {
                let cache_dir = target.cache_dir(self.fetcher.cache_root());
                let dest = cache_dir.join(FABRIC_BOOTSTRAP_JAR);
                if dest.is_file() {
                    log::debug!("{} already downloaded, skip", FABRIC_BOOTSTRAP_JAR);
                    return Ok(());
                }
                tokio::fs::create_dir_all(&cache_dir).await?;
                self.fetcher
                    .ensure_available(FABRIC_BOOTSTRAP_JAR, Some(&dest), true)
                    .await
            }
        }
    }

    /// Install one of the target's config files through the fetcher's raw
    /// path; presence keys off the installed file itself.
    pub async fn install_config(
        &self,
        target: &Target,
        config: &TargetConfig,
    ) -> Result<(), FetchError> {
        let dest = target
            .cache_dir(self.fetcher.cache_root())
            .join(&config.config_dir)
            .join(&config.filename);
        self.fetcher
            .ensure_available(&config.file_url, Some(&dest), true)
            .await
    }
}
