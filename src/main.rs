use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use sportsbook_odds::config::{load_proxies, ConfigOverrides, ProxyRotation, Settings};
use sportsbook_odds::core::Supervisor;
use sportsbook_odds::log_info;
use sportsbook_odds::logging::{init_logging, LogContext};
use sportsbook_odds::session::PlaywrightLauncher;

#[derive(Parser)]
#[command(name = "sportsbook-odds")]
#[command(about = "Collects sportsbook football odds into a JSON snapshot")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[arg(short, long, default_value = "settings.yaml", help = "Settings file path")]
    config: PathBuf,

    #[arg(short, long, help = "Proxy list file; enables proxies")]
    proxies: Option<PathBuf>,

    #[arg(short, long, help = "Output file path")]
    output: Option<PathBuf>,

    #[arg(long, help = "Stop after this many sessions instead of running forever")]
    max_restarts: Option<u64>,

    #[arg(short, long, help = "Enable verbose logging")]
    verbose: bool,

    #[arg(long, help = "Validate settings and proxies, then exit")]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load_from_file(&cli.config)
        .await
        .with_context(|| format!("Failed to load settings from {}", cli.config.display()))?;

    ConfigOverrides::apply(&mut settings);
    if let Some(output) = cli.output {
        settings.output_path = output;
    }
    if let Some(proxies) = cli.proxies {
        settings.proxies_path = proxies;
        settings.use_proxy = true;
    }
    if cli.verbose {
        settings.logging.level = "debug".to_string();
    }
    settings.validate().context("Invalid settings after overrides")?;

    init_logging(&settings.logging)?;

    let context = LogContext::new("main", "startup")
        .with_string_field("version", env!("CARGO_PKG_VERSION"))
        .with_string_field("output", settings.output_path.display().to_string());
    log_info!(context, "Sportsbook odds collector starting up");

    let proxies = if settings.use_proxy {
        let proxies = load_proxies(&settings.proxies_path).await?;
        Some(ProxyRotation::new(proxies)?)
    } else {
        None
    };

    if cli.check {
        info!(
            "Settings OK: cycle every {}s, {} proxies",
            settings.timeout,
            proxies.as_ref().map_or(0, ProxyRotation::proxy_count)
        );
        return Ok(());
    }

    PlaywrightLauncher::ensure_supported().context("This binary cannot start a browser")?;

    let launcher = PlaywrightLauncher::new(&settings);
    let mut supervisor = Supervisor::new(launcher, settings, proxies);
    let report = supervisor.run(cli.max_restarts).await;

    info!("Shutting down after {} sessions", report.attempts);
    Ok(())
}
