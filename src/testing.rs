//! In-memory collaborators for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::assessment::{AssessmentGenerator, RepositoryContext};
use crate::error::{AppError, Result};
use crate::platform::types::*;
use crate::platform::Platform;

#[derive(Default)]
struct FakeState {
    issues: HashMap<String, Vec<Issue>>,
    comments: HashMap<(String, u64), Vec<String>>,
    files: HashMap<(String, String), String>,
    installations: Vec<(u64, Vec<Repository>)>,
    next_number: u64,
    updates: usize,
    fail_lookups: bool,
    fail_writes: bool,
    fail_comments: bool,
    fail_file_reads: bool,
}

/// Issue tracker backed by a map, with switchable failures.
#[derive(Default)]
pub struct FakePlatform {
    state: Mutex<FakeState>,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_issue(
        &self,
        repo: &Repository,
        title: &str,
        body: &str,
        state: IssueState,
        labels: &[&str],
    ) -> u64 {
        let mut s = self.state.lock().unwrap();
        s.next_number += 1;
        let number = s.next_number;
        s.issues.entry(repo.full_name.clone()).or_default().push(Issue {
            number,
            title: title.to_string(),
            body: body.to_string(),
            state,
            labels: labels.iter().map(|l| l.to_string()).collect(),
        });
        number
    }

    pub fn add_installation(&self, id: u64, repos: Vec<Repository>) {
        self.state.lock().unwrap().installations.push((id, repos));
    }

    pub fn put_file(&self, repo: &Repository, path: &str, content: &str) {
        self.state
            .lock()
            .unwrap()
            .files
            .insert((repo.full_name.clone(), path.to_string()), content.to_string());
    }

    pub fn issues(&self, repo: &Repository) -> Vec<Issue> {
        self.state
            .lock()
            .unwrap()
            .issues
            .get(&repo.full_name)
            .cloned()
            .unwrap_or_default()
    }

    pub fn issue(&self, repo: &Repository, number: u64) -> Option<Issue> {
        self.issues(repo).into_iter().find(|i| i.number == number)
    }

    pub fn comments(&self, repo: &Repository, number: u64) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .comments
            .get(&(repo.full_name.clone(), number))
            .cloned()
            .unwrap_or_default()
    }

    pub fn update_count(&self) -> usize {
        self.state.lock().unwrap().updates
    }

    pub fn fail_lookups(&self) {
        self.state.lock().unwrap().fail_lookups = true;
    }

    pub fn fail_writes(&self) {
        self.state.lock().unwrap().fail_writes = true;
    }

    /// Reject comments only; issue writes still succeed.
    pub fn fail_comments(&self) {
        self.state.lock().unwrap().fail_comments = true;
    }

    pub fn fail_file_reads(&self) {
        self.state.lock().unwrap().fail_file_reads = true;
    }
}

#[async_trait]
impl Platform for FakePlatform {
    async fn list_installations(&self) -> Result<Vec<Installation>> {
        let s = self.state.lock().unwrap();
        Ok(s.installations
            .iter()
            .map(|(id, _)| Installation { id: *id })
            .collect())
    }

    async fn list_installation_repos(&self, installation_id: u64) -> Result<Vec<Repository>> {
        let s = self.state.lock().unwrap();
        s.installations
            .iter()
            .find(|(id, _)| *id == installation_id)
            .map(|(_, repos)| repos.clone())
            .ok_or_else(|| AppError::GitHubApi(format!("unknown installation {installation_id}")))
    }

    async fn list_issues_with_label(
        &self,
        _installation_id: u64,
        repo: &Repository,
        label: &str,
    ) -> Result<Vec<Issue>> {
        let s = self.state.lock().unwrap();
        if s.fail_lookups {
            return Err(AppError::GitHubApi("lookup unavailable".to_string()));
        }
        Ok(s.issues
            .get(&repo.full_name)
            .map(|issues| issues.iter().filter(|i| i.has_label(label)).cloned().collect())
            .unwrap_or_default())
    }

    async fn create_issue(
        &self,
        _installation_id: u64,
        repo: &Repository,
        issue: &NewIssue,
    ) -> Result<Issue> {
        let mut s = self.state.lock().unwrap();
        if s.fail_writes {
            return Err(AppError::GitHubApi("write rejected".to_string()));
        }
        s.next_number += 1;
        let created = Issue {
            number: s.next_number,
            title: issue.title.clone(),
            body: issue.body.clone(),
            state: IssueState::Open,
            labels: issue.labels.clone(),
        };
        s.issues
            .entry(repo.full_name.clone())
            .or_default()
            .push(created.clone());
        Ok(created)
    }

    async fn update_issue(
        &self,
        _installation_id: u64,
        repo: &Repository,
        issue_number: u64,
        update: &IssueUpdate,
    ) -> Result<Issue> {
        let mut s = self.state.lock().unwrap();
        if s.fail_writes {
            return Err(AppError::GitHubApi("write rejected".to_string()));
        }
        s.updates += 1;
        let issue = s
            .issues
            .get_mut(&repo.full_name)
            .and_then(|issues| issues.iter_mut().find(|i| i.number == issue_number))
            .ok_or_else(|| AppError::GitHubApi(format!("issue #{issue_number} not found")))?;

        if let Some(title) = &update.title {
            issue.title = title.clone();
        }
        if let Some(body) = &update.body {
            issue.body = body.clone();
        }
        if let Some(state) = update.state {
            issue.state = state;
        }
        if let Some(labels) = &update.labels {
            issue.labels = labels.clone();
        }
        Ok(issue.clone())
    }

    async fn post_comment(
        &self,
        _installation_id: u64,
        repo: &Repository,
        issue_number: u64,
        body: &str,
    ) -> Result<()> {
        let mut s = self.state.lock().unwrap();
        if s.fail_writes || s.fail_comments {
            return Err(AppError::GitHubApi("write rejected".to_string()));
        }
        s.comments
            .entry((repo.full_name.clone(), issue_number))
            .or_default()
            .push(body.to_string());
        Ok(())
    }

    async fn get_file_content(
        &self,
        _installation_id: u64,
        repo: &Repository,
        path: &str,
    ) -> Result<Option<String>> {
        let s = self.state.lock().unwrap();
        if s.fail_file_reads {
            return Err(AppError::GitHubApi("contents unavailable".to_string()));
        }
        Ok(s.files
            .get(&(repo.full_name.clone(), path.to_string()))
            .cloned())
    }
}

enum Script {
    Text(String),
    Fail,
    Unreachable,
}

/// Generator that replays a fixed response and counts calls.
pub struct ScriptedGenerator {
    script: Script,
    calls: AtomicUsize,
}

impl ScriptedGenerator {
    fn with(script: Script) -> Self {
        Self {
            script,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn text(text: &str) -> Self {
        Self::with(Script::Text(text.to_string()))
    }

    /// Fails after a response was obtained (e.g. an API error status).
    pub fn failing() -> Self {
        Self::with(Script::Fail)
    }

    /// Fails before any response exists.
    pub fn unreachable() -> Self {
        Self::with(Script::Unreachable)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AssessmentGenerator for ScriptedGenerator {
    async fn generate(&self, _context: &RepositoryContext) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            Script::Text(text) => Ok(text.clone()),
            Script::Fail => Err(AppError::Assessment("API returned 500".to_string())),
            Script::Unreachable => Err(AppError::AssessmentUnavailable(
                "connection refused".to_string(),
            )),
        }
    }
}
