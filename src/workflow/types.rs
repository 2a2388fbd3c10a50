use crate::platform::types::{Issue, IssueState};

/// Observed state of a repository's tracked issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackedState {
    Absent,
    OpenCurrent(Issue),
    ClosedStale(Issue),
}

impl TrackedState {
    pub fn from_issue(issue: Option<Issue>) -> Self {
        match issue {
            None => TrackedState::Absent,
            Some(issue) if issue.state == IssueState::Closed => TrackedState::ClosedStale(issue),
            Some(issue) => TrackedState::OpenCurrent(issue),
        }
    }
}

/// Outcome of reconciling one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// A new tracked issue was opened.
    Created { issue_number: u64 },
    /// The tracked issue was already open; nothing changed.
    Unchanged { issue_number: u64 },
    /// The open tracked issue was regenerated on a forced update.
    Updated { issue_number: u64 },
    /// A closed tracked issue was regenerated and reopened.
    Reopened { issue_number: u64 },
    /// The body was regenerated on request and a comment appended.
    Rerun { issue_number: u64 },
}

impl ReconcileOutcome {
    pub fn issue_number(&self) -> u64 {
        match self {
            ReconcileOutcome::Created { issue_number }
            | ReconcileOutcome::Unchanged { issue_number }
            | ReconcileOutcome::Updated { issue_number }
            | ReconcileOutcome::Reopened { issue_number }
            | ReconcileOutcome::Rerun { issue_number } => *issue_number,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            ReconcileOutcome::Created { issue_number } => {
                format!("Created scorecard issue #{issue_number}")
            }
            ReconcileOutcome::Unchanged { issue_number } => {
                format!("Scorecard issue #{issue_number} already open")
            }
            ReconcileOutcome::Updated { issue_number } => {
                format!("Updated scorecard issue #{issue_number}")
            }
            ReconcileOutcome::Reopened { issue_number } => {
                format!("Reopened scorecard issue #{issue_number}")
            }
            ReconcileOutcome::Rerun { issue_number } => {
                format!("Regenerated scorecard issue #{issue_number}")
            }
        }
    }
}

/// Where a regenerated body came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodySource {
    Assessment,
    Fallback,
}
