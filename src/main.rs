use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use devex_scorecard::config::AppConfig;
use devex_scorecard::server::{create_router, shutdown_signal, AppState};
use devex_scorecard::workflow::sweep::reconcile_all_installations;

#[derive(Parser)]
#[command(name = "devex-scorecard", about = "Keeps one developer-experience scorecard issue per repository")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    /// Reconcile every installed repository once the server is up
    #[arg(long)]
    reconcile_on_start: bool,

    /// With --reconcile-on-start, regenerate issues that are already open
    #[arg(long, requires = "reconcile_on_start")]
    force: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if cli.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    let config = AppConfig::load(cli.config.as_deref())?;

    tracing::info!(
        host = %config.server.host,
        port = %config.server.port,
        environment = ?config.environment,
        "Starting DevEx Scorecard server"
    );

    let state = Arc::new(AppState::new(&config)?);

    if cli.reconcile_on_start {
        let sweep_state = Arc::clone(&state);
        let force = cli.force;
        tokio::spawn(async move {
            match &sweep_state.platform {
                Some(platform) => {
                    reconcile_all_installations(&**platform, &sweep_state.reconciler, force)
                        .await;
                }
                None => tracing::warn!("Startup reconciliation skipped: no issue tracker configured"),
            }
        });
    }

    let app = create_router(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind(format!(
        "{}:{}",
        config.server.host, config.server.port
    ))
    .await?;

    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");

    Ok(())
}
