use std::sync::Arc;

use axum::{routing::post, Router};
use tower_http::trace::TraceLayer;

use crate::assessment::claude::ClaudeGenerator;
use crate::assessment::AssessmentGenerator;
use crate::config::AppConfig;
use crate::platform::github::GitHubPlatform;
use crate::platform::Platform;
use crate::scoring::ScoringModel;
use crate::webhook::signature::SignatureVerifier;
use crate::workflow::Reconciler;

/// Everything a request needs, built once at startup and never mutated.
pub struct AppState {
    pub verifier: SignatureVerifier,
    pub platform: Option<Arc<dyn Platform>>,
    pub reconciler: Reconciler,
}

impl AppState {
    /// Build every collaborator from configuration, failing fast on any
    /// invalid setting.
    pub fn new(config: &AppConfig) -> crate::error::Result<Self> {
        let verifier = SignatureVerifier::new(config.webhook_secret(), config.environment)?;
        let scoring = Arc::new(ScoringModel::new(config.scoring.clone())?);

        let platform: Option<Arc<dyn Platform>> = match &config.github {
            Some(github) => Some(Arc::new(GitHubPlatform::new(github)?) as Arc<dyn Platform>),
            None => {
                tracing::warn!("No [github] configuration; scorecard issues cannot be managed");
                None
            }
        };

        let generator: Option<Arc<dyn AssessmentGenerator>> = match &config.assessment {
            Some(assessment) => Some(Arc::new(ClaudeGenerator::new(
                assessment,
                &scoring.describe_guide(),
            )?) as Arc<dyn AssessmentGenerator>),
            None => {
                tracing::info!("No [assessment] configuration; issues use the static template");
                None
            }
        };

        let reconciler = Reconciler::new(
            platform.clone(),
            generator,
            scoring,
            config.tracking.clone(),
        );

        Ok(Self::from_parts(verifier, platform, reconciler))
    }

    pub fn from_parts(
        verifier: SignatureVerifier,
        platform: Option<Arc<dyn Platform>>,
        reconciler: Reconciler,
    ) -> Self {
        Self {
            verifier,
            platform,
            reconciler,
        }
    }
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/webhooks/github", post(crate::webhook::handler::handle_webhook))
        .route("/health", axum::routing::get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "ok"
}

/// Resolve on SIGINT or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
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
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
