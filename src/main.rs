//! # Web Ranking
//!
//! Compares website traffic metrics across third-party providers and
//! estimates the most-read articles of a news site. Every lookup walks an
//! ordered chain of sources and falls back to deterministic synthetic data
//! when none of them delivers, so a run always produces a report.
//!
//! ## Usage
//!
//! ```sh
//! web_ranking --domains triesteallnews.it ilpiccolo.it -o comparison.csv
//! web_ranking --articles daily --analytics
//! web_ranking --mode web
//! ```
//!
//! ## Architecture
//!
//! 1. **Config**: YAML file plus environment secrets, loaded once
//! 2. **Engines**: [`ranking::RankingEngine`] and [`articles::ArticleEngine`]
//!    resolve data through [`resolver::resolve`]
//! 3. **Output**: text report, CSV, or JSON via [`outputs`], or the JSON API
//!    in [`web`]

use clap::Parser;
use reqwest::Client;
use std::error::Error;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod articles;
mod cli;
mod config;
mod jobs;
mod models;
mod outputs;
mod ranking;
mod resolver;
mod sources;
mod synthetic;
mod utils;
mod web;

use articles::ArticleEngine;
use cli::{Cli, Mode};
use config::{Config, masked, set_api_key};
use jobs::JobBoard;
use ranking::RankingEngine;
use utils::build_client;

type MainResult = Result<(), Box<dyn Error + Send + Sync>>;

#[tokio::main]
#[instrument]
async fn main() -> MainResult {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("web_ranking starting up");

    if let Ok(path) = dotenvy::dotenv() {
        debug!(path = %path.display(), "Loaded .env");
    }

    let args = Cli::parse();
    debug!(?args.mode, config = %args.config.display(), "Parsed CLI arguments");

    if let Some((provider, key)) = &args.set_key {
        let config = set_api_key(&args.config, provider, key)?;
        println!("Saved {provider} key {} to {}", masked(key), args.config.display());
        println!("Configured providers: {}", config.configured_providers().join(", "));
        return Ok(());
    }

    let mut config = Config::load(&args.config)?.with_env_overrides();
    if args.mock {
        config.use_mock_data = true;
    }
    info!(
        providers = ?config.configured_providers(),
        mock = config.use_mock_data,
        "Configuration loaded"
    );
    let client = build_client(&config)?;

    let result = match args.mode {
        Mode::Web => run_web(&config, &client).await,
        Mode::Cli => run_cli(&args, &config, &client).await,
    };

    let elapsed = start_time.elapsed();
    match &result {
        Ok(()) => info!(elapsed_ms = elapsed.as_millis() as u64, "web_ranking finished"),
        Err(e) => error!(elapsed_ms = elapsed.as_millis() as u64, error = %e, "web_ranking failed"),
    }
    result
}

async fn run_web(config: &Config, client: &Client) -> MainResult {
    let state = web::AppState {
        ranking: Arc::new(RankingEngine::new(config, client)),
        articles: Arc::new(ArticleEngine::new(config, client)?),
        jobs: JobBoard::start(),
    };
    println!("Web interface on http://{}:{}", config.web.host, config.web.port);
    println!("Press Ctrl+C to stop the server");
    web::serve(config, state).await
}

/// One-shot run. `--output` goes to the comparison when domains are given,
/// else to the analytics summary, else to the article listing.
async fn run_cli(args: &Cli, config: &Config, client: &Client) -> MainResult {
    if !args.has_action() {
        eprintln!("Error: nothing to do in cli mode");
        eprintln!("Example: web_ranking --domains google.com facebook.com");
        return Err("no domains, articles period, or zone info requested".into());
    }
    let mut output = args.output.as_deref();

    if args.zone_info {
        let insights = articles::cloudflare::zone_insights(config, client).await;
        println!("Zone: {}", insights.zone_name);
        println!("Status: {}", insights.zone_status);
        println!("Plan: {}", insights.zone_plan);
        println!("Connected: {}", insights.cloudflare_connected);
        println!("Checked: {}", insights.last_updated);
    }

    if !args.domains.is_empty() {
        println!("Web Ranking Tool - CLI Mode");
        println!("{}", "=".repeat(50));
        let engine = RankingEngine::new(config, client);
        let comparison = engine.compare_websites(&args.domains, args.all_sources).await;
        outputs::generate_report(&comparison, output.take()).await?;
    }

    if let Some(period) = args.articles {
        let engine = ArticleEngine::new(config, client)?;
        let articles_output = if args.analytics { None } else { output.take() };
        let resolution = engine.get_most_read_articles(period, args.limit).await;
        outputs::export_articles(
            &resolution.value,
            period,
            &resolution.outcome.to_string(),
            articles_output,
        )
        .await?;

        if args.analytics {
            let analytics = engine.get_article_analytics(period).await;
            outputs::export_analytics(&analytics, output.take()).await?;
        }
    }
    Ok(())
}
