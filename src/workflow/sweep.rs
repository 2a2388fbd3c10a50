use crate::platform::Platform;
use crate::workflow::reconcile::Reconciler;

/// Totals of a sweep across all installations.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepSummary {
    pub reconciled: usize,
    pub failed: usize,
}

/// Reconcile every repository of every installation.
///
/// Failures are logged and counted; the sweep always runs to completion.
pub async fn reconcile_all_installations(
    platform: &dyn Platform,
    reconciler: &Reconciler,
    force: bool,
) -> SweepSummary {
    let mut summary = SweepSummary::default();

    tracing::info!(force, "Reconciling scorecards for all installations...");

    let installations = match platform.list_installations().await {
        Ok(installations) => installations,
        Err(e) => {
            tracing::error!(error = %e, "Failed to list installations on startup");
            return summary;
        }
    };

    tracing::info!(count = installations.len(), "Found installations");

    for installation in installations {
        let repos = match platform.list_installation_repos(installation.id).await {
            Ok(repos) => repos,
            Err(e) => {
                tracing::warn!(
                    installation_id = installation.id,
                    error = %e,
                    "Failed to list repos for installation"
                );
                continue;
            }
        };

        for repo in repos {
            match reconciler
                .create_or_update(installation.id, &repo, force)
                .await
            {
                Ok(outcome) => {
                    tracing::info!(repo = %repo, outcome = %outcome.describe(), "Repository reconciled");
                    summary.reconciled += 1;
                }
                Err(e) => {
                    tracing::warn!(repo = %repo, error = %e, "Failed to reconcile repository");
                    summary.failed += 1;
                }
            }
        }
    }

    tracing::info!(
        reconciled = summary.reconciled,
        failed = summary.failed,
        "Startup reconciliation complete"
    );
    summary
}
