use std::sync::Arc;

use crate::assessment::{AssessmentGenerator, RepositoryContext};
use crate::config::TrackingConfig;
use crate::error::{AppError, Result};
use crate::platform::types::{Issue, IssueState, IssueUpdate, NewIssue, Repository};
use crate::platform::Platform;
use crate::scoring::{ResponseNormalizer, ScoringModel};
use crate::webhook::router::Intent;
use crate::workflow::template;
use crate::workflow::types::{BodySource, ReconcileOutcome, TrackedState};

/// Converges each repository to exactly one open, current scorecard issue.
///
/// Deduplication relies solely on searching the tracker for the discriminator
/// label and title; nothing is persisted locally. Two deliveries racing through
/// the create path can still produce two issues.
pub struct Reconciler {
    platform: Option<Arc<dyn Platform>>,
    generator: Option<Arc<dyn AssessmentGenerator>>,
    scoring: Arc<ScoringModel>,
    tracking: TrackingConfig,
}

impl Reconciler {
    pub fn new(
        platform: Option<Arc<dyn Platform>>,
        generator: Option<Arc<dyn AssessmentGenerator>>,
        scoring: Arc<ScoringModel>,
        tracking: TrackingConfig,
    ) -> Self {
        Self {
            platform,
            generator,
            scoring,
            tracking,
        }
    }

    pub fn tracking(&self) -> &TrackingConfig {
        &self.tracking
    }

    fn platform(&self) -> Result<&dyn Platform> {
        self.platform
            .as_deref()
            .ok_or_else(|| AppError::Config("No issue tracker is configured".to_string()))
    }

    /// Act on a classified event. `Ignore` yields no outcomes.
    pub async fn handle(&self, intent: &Intent) -> Result<Vec<ReconcileOutcome>> {
        match intent {
            Intent::CreateOrUpdateForRepository {
                repository,
                installation_id,
            } => Ok(vec![
                self.create_or_update(*installation_id, repository, false)
                    .await?,
            ]),
            Intent::CreateOrUpdateForInstalledRepositories {
                repositories,
                installation_id,
            } => {
                let mut outcomes = Vec::with_capacity(repositories.len());
                for repository in repositories {
                    outcomes.push(
                        self.create_or_update(*installation_id, repository, false)
                            .await?,
                    );
                }
                Ok(outcomes)
            }
            Intent::RerunRequested {
                repository,
                issue,
                installation_id,
            } => Ok(vec![self.rerun(*installation_id, repository, issue).await?]),
            Intent::Ignore => Ok(Vec::new()),
        }
    }

    pub async fn create_or_update(
        &self,
        installation_id: u64,
        repo: &Repository,
        force: bool,
    ) -> Result<ReconcileOutcome> {
        let platform = self.platform()?;
        let state = TrackedState::from_issue(
            self.find_tracked_issue(platform, installation_id, repo)
                .await,
        );

        match state {
            TrackedState::Absent => {
                let (body, source) = self.generate_body(platform, installation_id, repo).await?;
                let issue = platform
                    .create_issue(
                        installation_id,
                        repo,
                        &NewIssue {
                            title: self.tracking.issue_title.clone(),
                            body,
                            labels: vec![self.tracking.issue_label.clone()],
                        },
                    )
                    .await?;

                tracing::info!(repo = %repo, issue = issue.number, source = ?source, "Created scorecard issue");
                Ok(ReconcileOutcome::Created {
                    issue_number: issue.number,
                })
            }
            TrackedState::OpenCurrent(issue) if !force => {
                tracing::info!(repo = %repo, issue = issue.number, "Scorecard issue already open");
                Ok(ReconcileOutcome::Unchanged {
                    issue_number: issue.number,
                })
            }
            TrackedState::OpenCurrent(issue) => {
                let (body, source) = self.generate_body(platform, installation_id, repo).await?;
                let update = IssueUpdate {
                    body: Some(body),
                    ..IssueUpdate::default()
                };
                platform
                    .update_issue(installation_id, repo, issue.number, &update)
                    .await?;

                tracing::info!(repo = %repo, issue = issue.number, source = ?source, "Updated scorecard issue");
                Ok(ReconcileOutcome::Updated {
                    issue_number: issue.number,
                })
            }
            TrackedState::ClosedStale(issue) => {
                let (body, source) = self.generate_body(platform, installation_id, repo).await?;
                let update = IssueUpdate {
                    body: Some(body),
                    state: Some(IssueState::Open),
                    ..IssueUpdate::default()
                };
                platform
                    .update_issue(installation_id, repo, issue.number, &update)
                    .await?;

                tracing::info!(repo = %repo, issue = issue.number, source = ?source, "Reopened scorecard issue");
                Ok(ReconcileOutcome::Reopened {
                    issue_number: issue.number,
                })
            }
        }
    }

    /// Regenerate the body of `issue` in place, leaving its state alone, and
    /// append a comment recording the rerun.
    pub async fn rerun(
        &self,
        installation_id: u64,
        repo: &Repository,
        issue: &Issue,
    ) -> Result<ReconcileOutcome> {
        let platform = self.platform()?;
        let (body, source) = self.generate_body(platform, installation_id, repo).await?;

        let update = IssueUpdate {
            body: Some(body),
            ..IssueUpdate::default()
        };
        platform
            .update_issue(installation_id, repo, issue.number, &update)
            .await?;
        platform
            .post_comment(
                installation_id,
                repo,
                issue.number,
                &template::render_rerun_comment(chrono::Utc::now()),
            )
            .await?;

        tracing::info!(repo = %repo, issue = issue.number, source = ?source, "Scorecard rerun complete");
        Ok(ReconcileOutcome::Rerun {
            issue_number: issue.number,
        })
    }

    /// First issue carrying the discriminator label and title, in any state.
    /// Lookup failures degrade to "not found".
    pub async fn find_tracked_issue(
        &self,
        platform: &dyn Platform,
        installation_id: u64,
        repo: &Repository,
    ) -> Option<Issue> {
        let issues = match platform
            .list_issues_with_label(installation_id, repo, &self.tracking.issue_label)
            .await
        {
            Ok(issues) => issues,
            Err(e) => {
                tracing::warn!(
                    repo = %repo,
                    error = %e,
                    "Tracked issue lookup failed, treating as absent"
                );
                return None;
            }
        };

        issues
            .into_iter()
            .find(|issue| issue.title == self.tracking.issue_title)
    }

    /// Build a complete issue body before anything is written.
    async fn generate_body(
        &self,
        platform: &dyn Platform,
        installation_id: u64,
        repo: &Repository,
    ) -> Result<(String, BodySource)> {
        let now = chrono::Utc::now();

        let Some(generator) = &self.generator else {
            tracing::debug!(repo = %repo, "No assessment generator configured, using fallback body");
            return Ok((template::render_fallback(repo, now), BodySource::Fallback));
        };

        let context = RepositoryContext::collect(platform, installation_id, repo).await;

        match generator.generate(&context).await {
            Ok(raw) => {
                let result = ResponseNormalizer::new(&self.scoring).normalize(&raw);
                let category = self.scoring.category_of(result.score);
                tracing::info!(
                    repo = %repo,
                    score = result.score,
                    color = %result.color,
                    category = %category.name,
                    "Assessment normalized"
                );
                Ok((
                    template::render_scorecard(repo, &result, &category, now),
                    BodySource::Assessment,
                ))
            }
            Err(AppError::AssessmentUnavailable(msg)) => {
                tracing::error!(repo = %repo, error = %msg, "Assessment generator unreachable");
                Err(AppError::AssessmentUnavailable(msg))
            }
            Err(e) => {
                tracing::warn!(repo = %repo, error = %e, "Assessment failed, using fallback body");
                Ok((template::render_fallback(repo, now), BodySource::Fallback))
            }
        }
    }
}
