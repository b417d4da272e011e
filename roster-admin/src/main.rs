//! roster-admin - admin console for the roster contacts and documents API

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use roster_common::config::ConfigResolver;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use roster_admin::cli::{self, Cli};
use roster_admin::session::{ConfiguredAuthenticator, FileStore, Session};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    // Config is resolved before logging so the configured level applies;
    // resolver messages logged before init are dropped.
    let config = ConfigResolver::new(args.overrides())
        .resolve()
        .context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting roster-admin {}", env!("CARGO_PKG_VERSION"));
    info!("API: {}", config.api.base_url);
    debug!("Data folder: {}", config.data_folder.display());

    let store = Arc::new(FileStore::in_folder(&config.data_folder));
    let authenticator = Arc::new(ConfiguredAuthenticator::new(config.login.clone()));
    let session = Session::init(store, authenticator);

    cli::run(args.command, config, session).await
}
