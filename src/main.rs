//! Game Platform Mock Server - CLI Entry Point

use anyhow::Result;
use clap::Parser;
use game_platform_mock::callback::DEFAULT_APP_ID;
use game_platform_mock::{router, AppState, CallbackTargets, GameMockConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(
    name = "game-platform-mock",
    about = "Mock game-platform API - configurable status codes, latency, and callbacks",
    version
)]
struct Args {
    /// Address to listen on
    #[arg(short, long, default_value = "0.0.0.0:8080")]
    bind: SocketAddr,

    /// Optional YAML file overriding the startup configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Callback environment ("prod" targets the production platform)
    #[arg(long, env = "env", default_value = "")]
    env: String,

    /// Application id reported in callbacks
    #[arg(long, default_value = DEFAULT_APP_ID)]
    app_id: String,

    /// Send every callback to this URL instead of the platform
    #[arg(long, value_name = "URL")]
    callback_url: Option<String>,

    /// Include the expected token in 401 error messages
    #[arg(long)]
    echo_expected_token: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'L', long, default_value = "info")]
    log_level: Level,

    /// Print the startup configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Validate configuration and exit
    #[arg(long)]
    validate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let defaults = GameMockConfig::startup(args.env.clone());
    let config = match &args.config {
        Some(path) => {
            info!(path = ?path, "Loading configuration");
            GameMockConfig::from_file(path, &defaults)?
        }
        None => defaults,
    };

    if args.print_config {
        println!("{}", serde_yaml::to_string(&config)?);
        return Ok(());
    }

    if args.validate {
        config.validate()?;
        println!("Configuration is valid");
        return Ok(());
    }

    let targets = match args.callback_url {
        Some(url) => CallbackTargets::fixed(url),
        None => CallbackTargets::default(),
    };

    let state = AppState::new(config, args.app_id, targets)?
        .with_echo_expected_token(args.echo_expected_token);
    let dispatcher = state.dispatcher.clone();

    let listener = TcpListener::bind(args.bind).await?;
    info!(address = %listener.local_addr()?, env = %args.env, "Starting game platform mock");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let stats = dispatcher.stats();
    info!(
        dispatched = stats.dispatched(),
        delivered = stats.delivered(),
        failed = stats.failed(),
        "Game platform mock stopped"
    );

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
