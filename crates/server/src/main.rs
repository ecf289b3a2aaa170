use std::path::Path;

use clap::{Parser, Subcommand};
use tracing::info;

use sweeplog_server::api::{self, AppState};
use sweeplog_server::config::SweeplogConfig;

/// Sweeplog HTTP server.
#[derive(Parser, Debug)]
#[command(name = "sweeplog-server", about = "HTTP server for cleaning reports")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "sweeplog.toml")]
    config: String,

    /// Override the bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port.
    #[arg(long)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run database migrations for the configured record backend, then exit.
    Migrate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration from TOML file, or use defaults if the file does not exist.
    let config_exists = Path::new(&cli.config).exists();
    let mut config: SweeplogConfig = if config_exists {
        let contents = std::fs::read_to_string(&cli.config)?;
        toml::from_str(&contents)?
    } else {
        toml::from_str("")?
    };

    sweeplog_server::telemetry::init();

    if !config_exists {
        info!(path = %cli.config, "config file not found, using defaults");
    }

    if let Some(Commands::Migrate) = cli.command {
        return run_migrate(&config).await;
    }

    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let records = sweeplog_server::record_factory::create_record_store(&config.records).await?;
    info!(backend = %config.records.backend, "record store initialized");

    let scheme =
        sweeplog_server::attachment_factory::locator_scheme(&config.attachments, &config.server)?;
    let attachments = sweeplog_server::attachment_factory::create_attachment_store(
        &config.attachments,
        &config.server,
    )
    .await?;
    info!(
        backend = %config.attachments.backend,
        base = scheme.base(),
        "attachment store initialized"
    );

    let state = AppState::new(attachments, scheme, records)
        .with_body_limit(config.attachments.request_body_limit());
    let app = api::router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "sweeplog-server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("sweeplog-server shut down");
    Ok(())
}

/// Run the `migrate` subcommand: connecting the record store applies its schema.
async fn run_migrate(config: &SweeplogConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!(backend = %config.records.backend, "running record backend migrations...");
    let _records = sweeplog_server::record_factory::create_record_store(&config.records).await?;
    info!(backend = %config.records.backend, "record backend migrations complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("received SIGINT"); }
        () = terminate => { info!("received SIGTERM"); }
    }
}
