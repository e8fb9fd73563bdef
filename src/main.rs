//! phishscan: URL phishing classification service

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use phishscan::{
    auth::TokenAuthority,
    config::{Config, LogFormat, LoggingConfig},
    http::{auth::AuthState, AppState, HttpServer},
    prediction::create_dispatcher,
    scanning::FeatureExtractor,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "phishscan")]
#[command(about = "URL feature extraction and multi-model phishing classification")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API server
    Serve {
        /// Listen address override
        #[arg(short, long)]
        listen: Option<String>,
    },

    /// Issue a bearer token for API clients
    IssueToken {
        /// Subject embedded in the token
        #[arg(short, long)]
        subject: String,
    },

    /// Print the feature vector of a URL as JSON
    Extract {
        /// URL to analyze
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load_or_default(&cli.config)?;
    init_logging(&config.logging, cli.verbose)?;

    match cli.command {
        Commands::Serve { listen } => {
            if let Some(addr) = listen {
                config.server.listen_addr = addr;
            }
            config.validate_for_serving()?;
            serve(config).await
        }
        Commands::IssueToken { subject } => {
            config.validate_signing()?;
            issue_token(&config, &subject)
        }
        Commands::Extract { url } => extract(&config, &url).await,
    }
}

fn init_logging(logging: &LoggingConfig, verbose: u8) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.filter_directives(verbose)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let result = match logging.format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    result.map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))
}

async fn serve(config: Config) -> Result<()> {
    info!("Starting phishscan API...");

    let authority = TokenAuthority::new(&config.auth).context("Invalid auth configuration")?;
    match config.auth.token_ttl_secs {
        Some(ttl) => info!("Bearer tokens expire after {}s", ttl),
        None => info!("Bearer tokens are issued without expiry"),
    }

    let extractor = FeatureExtractor::new(&config.scanning).context("Failed to build page fetcher")?;
    let dispatcher =
        create_dispatcher(&config.prediction).context("Failed to build prediction backend")?;
    info!(
        "Serving {} prediction model(s): {}",
        config.prediction.models.len(),
        dispatcher.model_names().collect::<Vec<_>>().join(", ")
    );

    let app_state = AppState {
        extractor: Arc::new(extractor),
        dispatcher: Arc::new(dispatcher),
        news_timestamp: config.server.news_timestamp,
    };
    let auth_state = AuthState::new(Arc::new(authority));

    let server = HttpServer::new(config.server.clone(), app_state, auth_state);
    server
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await
}

fn issue_token(config: &Config, subject: &str) -> Result<()> {
    let authority = TokenAuthority::new(&config.auth).context("Invalid auth configuration")?;
    let token = authority.issue(subject);
    println!("{}", serde_json::json!({ "access_token": token }));
    Ok(())
}

async fn extract(config: &Config, url: &str) -> Result<()> {
    let extractor = FeatureExtractor::new(&config.scanning).context("Failed to build page fetcher")?;
    let features = extractor.extract(url).await;
    println!("{}", serde_json::to_string_pretty(&features)?);
    Ok(())
}
