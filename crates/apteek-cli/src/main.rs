use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

use apteek_scrape::{FetchConfig, HttpFetcher};
use apteek_storage::{PgPharmacyStore, PgReviewStore};
use apteek_sync::{build_scheduler, build_scrapers, AppConfig, ChainRegistry, Orchestrator};
use apteek_web::{AppState, CaptchaDisabled, CaptchaVerifier, RecaptchaVerifier};

#[derive(Debug, Parser)]
#[command(name = "apteek-cli")]
#[command(about = "Estonian pharmacy locator service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the API server with the scheduled scraper.
    Serve,
    /// Run one scrape cycle and exit.
    Sync,
    /// Apply pending database migrations and exit.
    Migrate,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();
}

async fn load_registry(config: &AppConfig) -> ChainRegistry {
    match &config.chains_file {
        Some(path) => match ChainRegistry::load(path).await {
            Ok(registry) => registry,
            Err(err) => {
                warn!(error = %err, "could not load the chain registry, enabling all chains");
                ChainRegistry::all_enabled()
            }
        },
        None => ChainRegistry::all_enabled(),
    }
}

async fn build_orchestrator(
    config: &AppConfig,
    store: Arc<PgPharmacyStore>,
) -> Result<Arc<Orchestrator>> {
    let fetcher = HttpFetcher::new(FetchConfig {
        timeout: Duration::from_secs(config.http_timeout_secs),
        user_agent: config.user_agent.clone(),
    })
    .context("building the scraper HTTP client")?;

    let registry = load_registry(config).await;
    let scrapers = build_scrapers(&registry, Arc::new(fetcher), store);
    Ok(Arc::new(Orchestrator::new(scrapers)))
}

fn captcha_from_config(config: &AppConfig) -> Arc<dyn CaptchaVerifier> {
    match &config.recaptcha_secret {
        Some(secret) => Arc::new(RecaptchaVerifier::new(
            secret.clone(),
            config.allowed_domains.clone(),
        )),
        None => {
            warn!("no captcha secret configured, review writes are ungated");
            Arc::new(CaptchaDisabled)
        }
    }
}

async fn serve(config: AppConfig) -> Result<()> {
    let pool = apteek_storage::connect(&config.database_url).await?;
    let pharmacies = Arc::new(PgPharmacyStore::new(pool.clone()));
    let reviews = Arc::new(PgReviewStore::new(pool));

    let orchestrator = build_orchestrator(&config, pharmacies.clone()).await?;

    // catch up immediately, then twice a year on the cron
    let startup = orchestrator.clone();
    tokio::spawn(async move { startup.run_cycle().await });

    if config.scheduler_enabled {
        let scheduler = build_scheduler(orchestrator, &config.scrape_cron).await?;
        scheduler.start().await.context("starting the scheduler")?;
        info!(cron = %config.scrape_cron, "scrape scheduler started");
    } else {
        info!("scrape scheduler disabled");
    }

    let state = AppState {
        pharmacies,
        reviews,
        captcha: captcha_from_config(&config),
    };
    apteek_web::serve(state, &config.bind_addr).await
}

async fn sync_once(config: AppConfig) -> Result<()> {
    let pool = apteek_storage::connect(&config.database_url).await?;
    let store = Arc::new(PgPharmacyStore::new(pool));
    let orchestrator = build_orchestrator(&config, store).await?;
    orchestrator.run_cycle().await;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();
    let config = AppConfig::from_env();

    let cli = Cli::parse();
    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::Sync => sync_once(config).await,
        Commands::Migrate => {
            apteek_storage::connect(&config.database_url).await?;
            info!("database schema is up to date");
            Ok(())
        }
    }
}
