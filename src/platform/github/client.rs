use async_trait::async_trait;
use octocrab::Octocrab;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::GitHubConfig;
use crate::error::{AppError, Result};
use crate::platform::types::*;
use crate::platform::Platform;

use super::auth::AppSigner;
use super::mapper;

pub struct GitHubPlatform {
    signer: AppSigner,
    /// Cache of installation tokens: installation_id -> (token, expiry)
    token_cache: Arc<RwLock<HashMap<u64, (String, chrono::DateTime<chrono::Utc>)>>>,
}

impl GitHubPlatform {
    pub fn new(config: &GitHubConfig) -> Result<Self> {
        let key_pem = std::fs::read(&config.private_key_path).map_err(|e| {
            AppError::Config(format!(
                "Failed to read GitHub App private key at {}: {e}",
                config.private_key_path.display()
            ))
        })?;

        Ok(Self {
            signer: AppSigner::from_pem(config.app_id, &key_pem)?,
            token_cache: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    fn app_client(&self) -> Result<Octocrab> {
        let jwt = self.signer.app_jwt()?;
        Octocrab::builder()
            .personal_token(jwt)
            .build()
            .map_err(|e| AppError::GitHubApi(format!("Failed to build JWT client: {e}")))
    }

    async fn access_token(&self, installation_id: u64) -> Result<String> {
        {
            let cache = self.token_cache.read().await;
            if let Some((token, expiry)) = cache.get(&installation_id) {
                if *expiry > chrono::Utc::now() + chrono::Duration::minutes(5) {
                    return Ok(token.clone());
                }
            }
        }

        let url = format!("/app/installations/{installation_id}/access_tokens");
        let response: serde_json::Value = self
            .app_client()?
            .post(&url, None::<&()>)
            .await
            .map_err(|e| AppError::GitHubApi(format!("Failed to create installation token: {e}")))?;

        let token = response["token"]
            .as_str()
            .ok_or_else(|| AppError::GitHubApi("No token in response".to_string()))?
            .to_string();

        let expires_at = response["expires_at"]
            .as_str()
            .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&chrono::Utc))
            .unwrap_or_else(|| chrono::Utc::now() + chrono::Duration::hours(1));

        let mut cache = self.token_cache.write().await;
        cache.insert(installation_id, (token.clone(), expires_at));

        Ok(token)
    }

    /// Get an octocrab instance authenticated as an installation.
    async fn installation_client(&self, installation_id: u64) -> Result<Octocrab> {
        let token = self.access_token(installation_id).await?;
        Octocrab::builder()
            .personal_token(token)
            .build()
            .map_err(|e| AppError::GitHubApi(format!("Failed to build octocrab client: {e}")))
    }
}

/// Largest page the REST API serves.
const PAGE_SIZE: usize = 100;

/// Request pages 1, 2, ... until one comes back short.
async fn collect_pages<F, Fut>(mut fetch_page: F) -> Result<Vec<Value>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Vec<Value>>>,
{
    let mut items = Vec::new();
    let mut page = 1;
    loop {
        let batch = fetch_page(page).await?;
        let full = batch.len() >= PAGE_SIZE;
        items.extend(batch);
        if !full {
            return Ok(items);
        }
        page += 1;
    }
}

fn is_not_found(error: &octocrab::Error) -> bool {
    matches!(error, octocrab::Error::GitHub { source, .. } if source.status_code.as_u16() == 404)
}

#[async_trait]
impl Platform for GitHubPlatform {
    async fn list_installations(&self) -> Result<Vec<Installation>> {
        let client = self.app_client()?;

        let installations = collect_pages(|page| {
            let client = &client;
            async move {
                let url = format!("/app/installations?per_page={PAGE_SIZE}&page={page}");
                let batch: Vec<Value> = client
                    .get(url, None::<&()>)
                    .await
                    .map_err(|e| AppError::GitHubApi(format!("Failed to list installations: {e}")))?;
                Ok(batch)
            }
        })
        .await?;

        Ok(installations
            .iter()
            .filter_map(|i| i["id"].as_u64())
            .map(|id| Installation { id })
            .collect())
    }

    async fn list_installation_repos(&self, installation_id: u64) -> Result<Vec<Repository>> {
        let client = self.installation_client(installation_id).await?;

        let repos = collect_pages(|page| {
            let client = &client;
            async move {
                let url = format!("/installation/repositories?per_page={PAGE_SIZE}&page={page}");
                let mut response: Value = client.get(url, None::<&()>).await.map_err(|e| {
                    AppError::GitHubApi(format!("Failed to list installation repos: {e}"))
                })?;
                Ok(match response["repositories"].take() {
                    Value::Array(repos) => repos,
                    _ => Vec::new(),
                })
            }
        })
        .await?;

        Ok(repos.iter().filter_map(mapper::map_repository).collect())
    }

    async fn list_issues_with_label(
        &self,
        installation_id: u64,
        repo: &Repository,
        label: &str,
    ) -> Result<Vec<Issue>> {
        let client = self.installation_client(installation_id).await?;
        let labels = [label.to_string()];

        let first_page = client
            .issues(&repo.owner, &repo.name)
            .list()
            .labels(&labels)
            .state(octocrab::params::State::All)
            .per_page(100)
            .send()
            .await?;

        let issues = client.all_pages(first_page).await?;

        // The issues endpoint also returns pull requests
        Ok(issues
            .into_iter()
            .filter(|i| i.pull_request.is_none())
            .map(mapper::map_issue)
            .collect())
    }

    async fn create_issue(
        &self,
        installation_id: u64,
        repo: &Repository,
        issue: &NewIssue,
    ) -> Result<Issue> {
        let client = self.installation_client(installation_id).await?;

        let created = client
            .issues(&repo.owner, &repo.name)
            .create(&issue.title)
            .body(issue.body.clone())
            .labels(issue.labels.clone())
            .send()
            .await?;

        Ok(mapper::map_issue(created))
    }

    async fn update_issue(
        &self,
        installation_id: u64,
        repo: &Repository,
        issue_number: u64,
        update: &IssueUpdate,
    ) -> Result<Issue> {
        let client = self.installation_client(installation_id).await?;
        let issues = client.issues(&repo.owner, &repo.name);

        let mut builder = issues.update(issue_number);
        if let Some(title) = &update.title {
            builder = builder.title(title);
        }
        if let Some(body) = &update.body {
            builder = builder.body(body);
        }
        if let Some(state) = update.state {
            builder = builder.state(mapper::map_state(state));
        }
        if let Some(labels) = &update.labels {
            builder = builder.labels(labels.as_slice());
        }

        let updated = builder.send().await?;

        Ok(mapper::map_issue(updated))
    }

    async fn post_comment(
        &self,
        installation_id: u64,
        repo: &Repository,
        issue_number: u64,
        body: &str,
    ) -> Result<()> {
        let client = self.installation_client(installation_id).await?;

        client
            .issues(&repo.owner, &repo.name)
            .create_comment(issue_number, body)
            .await?;

        Ok(())
    }

    async fn get_file_content(
        &self,
        installation_id: u64,
        repo: &Repository,
        path: &str,
    ) -> Result<Option<String>> {
        let client = self.installation_client(installation_id).await?;

        let url = format!(
            "/repos/{}/{}/contents/{}",
            repo.owner,
            repo.name,
            urlencoding::encode(path)
        );
        let response: std::result::Result<serde_json::Value, _> =
            client.get(&url, None::<&()>).await;

        match response {
            Ok(value) => Ok(mapper::decode_content(&value)),
            Err(e) if is_not_found(&e) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
