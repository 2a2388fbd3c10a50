use base64::Engine;

use crate::platform::types;

/// Map an octocrab issue to our platform issue type.
pub fn map_issue(issue: octocrab::models::issues::Issue) -> types::Issue {
    let state = match issue.state {
        octocrab::models::IssueState::Closed => types::IssueState::Closed,
        _ => types::IssueState::Open,
    };

    types::Issue {
        number: issue.number,
        title: issue.title,
        body: issue.body.unwrap_or_default(),
        state,
        labels: issue.labels.into_iter().map(|l| l.name).collect(),
    }
}

pub fn map_state(state: types::IssueState) -> octocrab::models::IssueState {
    match state {
        types::IssueState::Open => octocrab::models::IssueState::Open,
        types::IssueState::Closed => octocrab::models::IssueState::Closed,
    }
}

/// Map an entry of `/installation/repositories` to a repository.
pub fn map_repository(value: &serde_json::Value) -> Option<types::Repository> {
    value["full_name"]
        .as_str()
        .and_then(types::Repository::from_full_name)
}

/// Decode the base64 `content` of a contents-API response. GitHub wraps the
/// encoded text at 60 columns.
pub fn decode_content(value: &serde_json::Value) -> Option<String> {
    let encoded: String = value["content"]
        .as_str()?
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .ok()?;
    Some(String::from_utf8_lossy(&bytes).into_owned())
}
