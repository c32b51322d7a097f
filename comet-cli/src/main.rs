mod console;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use comet_lib::catalog::CatalogClient;
use comet_lib::crash::LogClassifier;
use comet_lib::fetch::AssetFetcher;
use comet_lib::launch::Orchestrator;
use comet_lib::net::endpoint::DEFAULT_ENDPOINTS;
use comet_lib::net::{http_client, EndpointSelector, DOWNLOAD_TIMEOUT_SECS};
use comet_lib::settings::{Settings, DEFAULT_SECTION};
use comet_lib::updater;
use console::{ConsoleSink, ConsoleTitle};
use std::path::PathBuf;
use std::sync::Arc;

const DEFAULT_API_URL: &str = "https://api.cometlauncher.org/";

#[derive(Parser)]
#[command(name = "comet", version, about = "Client launcher")]
struct Cli {
    /// Root directory for the asset cache and crash logs
    #[arg(long, default_value = ".")]
    data_dir: PathBuf,

    /// Catalog API base URL
    #[arg(long)]
    api_url: Option<String>,

    /// Content server base URL, skipping endpoint probing
    #[arg(long)]
    server: Option<String>,

    /// Network timeout in seconds for catalog and probe requests
    #[arg(long, default_value_t = comet_lib::net::DEFAULT_TIMEOUT_SECS)]
    timeout: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List launchable targets from the catalog
    List,
    /// Download a target's requirements and run it
    Run {
        /// Target name (case-insensitive, prefix is enough)
        name: String,
    },
    /// Install every published config for a target
    Configs { name: String },
    /// Read a setting
    Get {
        key: String,
        #[arg(long, default_value = DEFAULT_SECTION)]
        section: String,
    },
    /// Write a setting
    Set {
        key: String,
        value: String,
        #[arg(long, default_value = DEFAULT_SECTION)]
        section: String,
    },
    /// Check for a newer launcher release
    CheckUpdate,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let cache_root = cli.data_dir.join("data");
    let reports_dir = cli.data_dir.join("crash_logs");
    std::fs::create_dir_all(&cache_root)
        .with_context(|| format!("Failed to create cache root {:?}", cache_root))?;

    let mut settings = Settings::load_or_create(cache_root.join("settings.json"))?;
    let probe_client = http_client(cli.timeout)?;

    match &cli.command {
        Command::List => {
            let registry = load_registry(&cli, &cache_root, &probe_client).await?;
            for (i, target) in registry.all().iter().enumerate() {
                let marker = if target.working { "" } else { "  [not working]" };
                println!("{}. {} <{}>{}", i + 1, target.name, target.version_tag, marker);
            }
        }
        Command::Run { name } => {
            let registry = load_registry(&cli, &cache_root, &probe_client).await?;
            let target = registry
                .find(name)
                .with_context(|| format!("No target matches '{}'", name))?;
            if !target.working {
                log::warn!("{} is marked as not working", target.name);
            }

            let orchestrator = build_orchestrator(&cli, cache_root.clone(), reports_dir).await?;
            let outcome = orchestrator.run(target, &settings).await?;
            if !outcome.launched {
                anyhow::bail!("{} could not be started", target.name);
            }
        }
        Command::Configs { name } => {
            let registry = load_registry(&cli, &cache_root, &probe_client).await?;
            let target = registry
                .find(name)
                .with_context(|| format!("No target matches '{}'", name))?;
            if target.configs.is_empty() {
                println!("{} has no published configs", target.name);
                return Ok(());
            }

            let orchestrator = build_orchestrator(&cli, cache_root.clone(), reports_dir).await?;
            for config in &target.configs {
                match orchestrator.install_config(target, config).await {
                    Ok(()) => println!("Installed {}", config.filename),
                    Err(e) => log::error!("Failed to install {}: {}", config.filename, e),
                }
            }
        }
        Command::Get { key, section } => match settings.get(key, section) {
            Some(value) => println!("{}", value),
            None => println!("(unset)"),
        },
        Command::Set {
            key,
            value,
            section,
        } => {
            settings.set(key, value, section)?;
            println!("{}.{} = {}", section, key, value);
        }
        Command::CheckUpdate => {
            let local = env!("CARGO_PKG_VERSION");
            match updater::check_latest(
                &probe_client,
                updater::GITHUB_API,
                updater::RELEASE_REPOSITORY,
                local,
            )
            .await
            {
                Ok(Some(remote)) => println!("Update available: {} -> {}", local, remote),
                Ok(None) => println!("Up to date ({})", local),
                Err(e) => log::warn!("Update check failed: {}", e),
            }
        }
    }

    Ok(())
}

async fn load_registry(
    cli: &Cli,
    cache_root: &std::path::Path,
    client: &reqwest::Client,
) -> Result<comet_lib::TargetRegistry> {
    let api_url = cli.api_url.clone().unwrap_or_else(|| DEFAULT_API_URL.to_string());
    let catalog = CatalogClient::new(api_url, client.clone(), cache_root.to_path_buf());
    catalog.load_registry().await
}

/// Select a content server and assemble the launch pipeline.
async fn build_orchestrator(
    cli: &Cli,
    cache_root: PathBuf,
    reports_dir: PathBuf,
) -> Result<Orchestrator> {
    let base_url = match &cli.server {
        Some(server) => {
            let mut server = server.clone();
            if !server.ends_with('/') {
                server.push('/');
            }
            server
        }
        None => {
            let probe_client = http_client(cli.timeout)?;
            let mut selector = EndpointSelector::new(DEFAULT_ENDPOINTS, probe_client);
            selector
                .select()
                .await
                .context("No content server is reachable")?
        }
    };

    let sink = Arc::new(ConsoleSink::new());
    let fetcher = AssetFetcher::new(
        cache_root,
        base_url,
        http_client(DOWNLOAD_TIMEOUT_SECS)?,
        sink.clone(),
    );
    let classifier = LogClassifier::new(reports_dir);

    Ok(Orchestrator::new(
        fetcher,
        classifier,
        sink,
        Arc::new(ConsoleTitle),
    ))
}
