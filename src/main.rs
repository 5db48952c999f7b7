use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use campus_hub_api::auth::{Claims, TokenVerifier};
use campus_hub_api::cache::{MemoryTtlCache, PgTtlCache, TtlCache};
use campus_hub_api::config::AppConfig;
use campus_hub_api::database::{DocumentStore, MemoryStore, PgDocumentStore};
use campus_hub_api::fixtures::Fixture;
use campus_hub_api::{app, AppState};

#[derive(Parser)]
#[command(name = "campus-hub-api")]
#[command(about = "Campus Hub API - student community backend")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Run the HTTP server")]
    Serve {
        #[arg(long, env = "PORT", default_value_t = 3000, help = "Port to listen on")]
        port: u16,
        #[arg(long, value_enum, default_value_t = StoreKind::Memory, help = "Document store backend")]
        store: StoreKind,
        #[arg(long, help = "Seed fixture file (.yaml, .yml or .json)")]
        seed: Option<PathBuf>,
    },

    #[command(about = "Mint a bearer token for a user id")]
    Token {
        #[arg(help = "Token subject (user id)")]
        sub: String,
        #[arg(long, help = "Email claim")]
        email: Option<String>,
        #[arg(long, help = "Display name claim")]
        name: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StoreKind {
    Memory,
    Postgres,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before the config singleton reads the environment
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")))
        .init();

    let config = campus_hub_api::config::config().clone();

    match Cli::parse().command {
        Commands::Serve { port, store, seed } => serve(config, port, store, seed).await,
        Commands::Token { sub, email, name } => {
            let verifier = TokenVerifier::from_config(&config.security);
            let mut claims = Claims::new(sub, email, verifier.expiry_hours());
            if let Some(name) = name {
                claims = claims.with_name(name);
            }
            println!("{}", verifier.issue(&claims)?);
            Ok(())
        }
    }
}

async fn serve(config: AppConfig, port: u16, store: StoreKind, seed: Option<PathBuf>) -> anyhow::Result<()> {
    tracing::info!("Starting Campus Hub API in {:?} mode", config.environment);
    if campus_hub_api::is_production!() && config.security.jwt_secret.is_empty() {
        anyhow::bail!("JWT_SECRET must be set in production");
    }

    let (store, cache): (Arc<dyn DocumentStore>, Arc<dyn TtlCache>) = match store {
        StoreKind::Memory => (Arc::new(MemoryStore::new()), Arc::new(MemoryTtlCache::new())),
        StoreKind::Postgres => {
            let pg = PgDocumentStore::connect(&config.database)
                .await
                .context("failed to connect to PostgreSQL")?;
            let cache = PgTtlCache::new(pg.pool().clone())
                .await
                .context("failed to prepare cache table")?;
            (Arc::new(pg), Arc::new(cache))
        }
    };

    if let Some(path) = seed {
        let written = Fixture::from_path(&path)?.seed(&store).await?;
        tracing::info!("Loaded {} documents from {}", written, path.display());
    }

    let state = AppState::new(config, store, cache);
    let bind_addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Campus Hub API listening on http://{}", bind_addr);
    axum::serve(listener, app(state).into_make_service_with_connect_info::<SocketAddr>())
        .await
        .context("server error")?;
    Ok(())
}
