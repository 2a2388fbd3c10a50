//! Markdown rendered into the tracked issue, and the rerun control it carries.

use std::sync::LazyLock;

use regex::Regex;

use crate::platform::types::Repository;
use crate::scoring::{Category, Color, ScorecardResult};

const RERUN_LABEL: &str = "**Re-run scorecard**";
pub const RERUN_CONTROL_UNCHECKED: &str = "- [ ] **Re-run scorecard**";

const EMPTY_ANALYSIS: &str = "No analysis was returned for this repository.";
const FOOTER: &str = "---\n*Generated by DevEx Scorecard*";

/// Task-list checkbox markers: `[ ]`, `[x]`, `[X]`.
static TASK_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([ xX])\]").expect("static regex is valid"));

/// Escape checkbox markers in assessment text so it can never render as
/// the rerun control. Only the template itself emits a live checkbox.
fn neutralize(text: &str) -> String {
    TASK_MARKER.replace_all(text, r"\[$1]").into_owned()
}

/// True when `body` contains the rerun control in its checked form.
pub fn is_rerun_requested(body: &str) -> bool {
    body.lines().any(|line| {
        let line = line.trim();
        (line.starts_with("- [x]") || line.starts_with("- [X]"))
            && line[5..].trim_start() == RERUN_LABEL
    })
}

fn color_marker(color: Color) -> &'static str {
    match color {
        Color::Green => "🟢",
        Color::Yellow => "🟡",
        Color::Red => "🔴",
    }
}

fn rerun_section() -> String {
    format!("### Refresh\n\nTick the box below to regenerate this scorecard.\n\n{RERUN_CONTROL_UNCHECKED}")
}

pub fn render_scorecard(
    repo: &Repository,
    result: &ScorecardResult,
    category: &Category,
    generated_at: chrono::DateTime<chrono::Utc>,
) -> String {
    let analysis = if result.analysis.trim().is_empty() {
        EMPTY_ANALYSIS.to_string()
    } else {
        neutralize(result.analysis.trim())
    };

    let recommendations = result
        .recommendations
        .iter()
        .map(|r| format!("- {}", neutralize(r)))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "# Developer Experience Scorecard for `{repo}`\n\n\
         {marker} **Score: {score}/100** ({color}) · **{category}**: {category_description}\n\n\
         ## Analysis\n\n{analysis}\n\n\
         ## Recommendations\n\n{recommendations}\n\n\
         {rerun}\n\n\
         _Last generated {timestamp}_\n\n{FOOTER}",
        marker = color_marker(result.color),
        score = result.score,
        color = result.color,
        category = category.name,
        category_description = category.description,
        rerun = rerun_section(),
        timestamp = generated_at.format("%Y-%m-%d %H:%M UTC"),
    )
}

/// Static body used when no assessment could be produced.
pub fn render_fallback(repo: &Repository, generated_at: chrono::DateTime<chrono::Utc>) -> String {
    format!(
        "# Developer Experience Scorecard for `{repo}`\n\n\
         An automated assessment is not available right now.\n\n\
         ## Checklist\n\n\
         - A README explains what the project does and how to build it\n\
         - A CODEOWNERS file names who reviews changes\n\
         - A contribution guide describes the development workflow\n\
         - Continuous integration runs on every pull request\n\n\
         {rerun}\n\n\
         _Last generated {timestamp}_\n\n{FOOTER}",
        rerun = rerun_section(),
        timestamp = generated_at.format("%Y-%m-%d %H:%M UTC"),
    )
}

pub fn render_rerun_comment(generated_at: chrono::DateTime<chrono::Utc>) -> String {
    format!(
        "The scorecard was regenerated on {} as requested.\n\n{FOOTER}",
        generated_at.format("%Y-%m-%d %H:%M UTC")
    )
}
