use serde::Deserialize;

use crate::platform::types::{IssueState, Repository};

/// Every payload shape this service reacts to, flattened. Fields absent from
/// a given event type are `None`/empty; the router decides what they mean.
#[derive(Debug, Default, Deserialize)]
pub struct EventPayload {
    pub action: Option<String>,
    pub repository: Option<RepositoryPayload>,
    pub installation: Option<InstallationPayload>,
    pub issue: Option<IssuePayload>,
    /// `installation` events list the repositories granted at install time.
    #[serde(default)]
    pub repositories: Vec<RepositoryPayload>,
    /// `installation_repositories` events list the repositories just added.
    #[serde(default)]
    pub repositories_added: Vec<RepositoryPayload>,
}

impl EventPayload {
    pub fn parse(payload: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(payload)
    }
}

#[derive(Debug, Deserialize)]
pub struct RepositoryPayload {
    pub name: Option<String>,
    pub full_name: Option<String>,
    pub owner: Option<OwnerPayload>,
}

/// GitHub sends the owner as an account object; some sources send the login.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum OwnerPayload {
    Login(String),
    Account { login: String },
}

impl OwnerPayload {
    pub fn login(&self) -> &str {
        match self {
            OwnerPayload::Login(login) => login,
            OwnerPayload::Account { login } => login,
        }
    }
}

impl RepositoryPayload {
    /// Prefer explicit owner and name; fall back to `full_name`.
    pub fn to_repository(&self) -> Option<Repository> {
        if let (Some(owner), Some(name)) = (&self.owner, &self.name) {
            if !owner.login().is_empty() && !name.is_empty() {
                return Some(Repository::new(owner.login(), name));
            }
        }
        self.full_name
            .as_deref()
            .and_then(Repository::from_full_name)
    }
}

#[derive(Debug, Deserialize)]
pub struct InstallationPayload {
    pub id: u64,
}

#[derive(Debug, Deserialize)]
pub struct IssuePayload {
    pub number: u64,
    #[serde(default)]
    pub title: String,
    pub body: Option<String>,
    pub state: Option<IssueState>,
}
