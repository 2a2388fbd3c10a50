use crate::config::TrackingConfig;
use crate::platform::types::{Issue, IssueState, Repository};
use crate::webhook::events::{EventPayload, RepositoryPayload};
use crate::workflow::template;

/// What an inbound event asks of the reconciler. Closed set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    CreateOrUpdateForRepository {
        repository: Repository,
        installation_id: u64,
    },
    CreateOrUpdateForInstalledRepositories {
        repositories: Vec<Repository>,
        installation_id: u64,
    },
    RerunRequested {
        repository: Repository,
        issue: Issue,
        installation_id: u64,
    },
    Ignore,
}

impl Intent {
    pub fn name(&self) -> &'static str {
        match self {
            Intent::CreateOrUpdateForRepository { .. } => "create_or_update",
            Intent::CreateOrUpdateForInstalledRepositories { .. } => "create_or_update_installed",
            Intent::RerunRequested { .. } => "rerun",
            Intent::Ignore => "ignore",
        }
    }
}

/// Classify an event. Rules are tried in order and the first match wins, so an
/// issue edit is never reinterpreted as a repository event.
pub fn classify(
    event_type: &str,
    action: Option<&str>,
    payload: &EventPayload,
    tracking: &TrackingConfig,
) -> Intent {
    let installation_id = payload.installation.as_ref().map(|i| i.id);

    if let Some(issue) = &payload.issue {
        if issue.title == tracking.issue_title
            && action == Some("edited")
            && issue
                .body
                .as_deref()
                .is_some_and(template::is_rerun_requested)
        {
            let repository = payload
                .repository
                .as_ref()
                .and_then(RepositoryPayload::to_repository);

            return match (repository, installation_id) {
                (Some(repository), Some(installation_id)) => Intent::RerunRequested {
                    repository,
                    issue: Issue {
                        number: issue.number,
                        title: issue.title.clone(),
                        body: issue.body.clone().unwrap_or_default(),
                        state: issue.state.unwrap_or(IssueState::Open),
                        labels: Vec::new(),
                    },
                    installation_id,
                },
                _ => {
                    tracing::warn!(
                        issue = issue.number,
                        "Rerun requested without repository or installation context"
                    );
                    Intent::Ignore
                }
            };
        }
    }

    if event_type == "repository" && matches!(action, Some("created") | Some("edited")) {
        if let (Some(repository), Some(installation_id)) = (
            payload
                .repository
                .as_ref()
                .and_then(RepositoryPayload::to_repository),
            installation_id,
        ) {
            return Intent::CreateOrUpdateForRepository {
                repository,
                installation_id,
            };
        }
    }

    let added = match (event_type, action) {
        ("installation", Some("created")) => Some(&payload.repositories),
        ("installation_repositories", Some("added")) => Some(&payload.repositories_added),
        _ => None,
    };
    if let (Some(added), Some(installation_id)) = (added, installation_id) {
        let repositories: Vec<Repository> = added
            .iter()
            .filter_map(RepositoryPayload::to_repository)
            .collect();
        if !repositories.is_empty() {
            return Intent::CreateOrUpdateForInstalledRepositories {
                repositories,
                installation_id,
            };
        }
    }

    Intent::Ignore
}
