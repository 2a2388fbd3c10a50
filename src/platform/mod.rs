pub mod github;
pub mod types;

use async_trait::async_trait;

use crate::error::Result;
use types::*;

/// Issue-tracker operations, each scoped to one installation.
#[async_trait]
pub trait Platform: Send + Sync {
    /// List all installations of this GitHub App.
    async fn list_installations(&self) -> Result<Vec<Installation>>;

    /// List all repositories accessible to an installation.
    async fn list_installation_repos(&self, installation_id: u64) -> Result<Vec<Repository>>;

    /// List issues carrying `label`, open and closed.
    async fn list_issues_with_label(
        &self,
        installation_id: u64,
        repo: &Repository,
        label: &str,
    ) -> Result<Vec<Issue>>;

    async fn create_issue(
        &self,
        installation_id: u64,
        repo: &Repository,
        issue: &NewIssue,
    ) -> Result<Issue>;

    /// Apply a partial update in a single request.
    async fn update_issue(
        &self,
        installation_id: u64,
        repo: &Repository,
        issue_number: u64,
        update: &IssueUpdate,
    ) -> Result<Issue>;

    /// Post a comment on an issue.
    async fn post_comment(
        &self,
        installation_id: u64,
        repo: &Repository,
        issue_number: u64,
        body: &str,
    ) -> Result<()>;

    /// Fetch a file from the default branch. `None` when it does not exist.
    async fn get_file_content(
        &self,
        installation_id: u64,
        repo: &Repository,
        path: &str,
    ) -> Result<Option<String>>;
}
