use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::model::{Color, ScorecardResult, ScoringModel};

pub const ANALYSIS_PLACEHOLDER: &str =
    "The assessment did not include an analysis of this repository.";

pub const FALLBACK_RECOMMENDATION: &str =
    "Review the repository's README, contribution guide and code ownership to improve developer experience.";

/// First `{` through last `}`, across newlines.
static JSON_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("static regex is valid"));

/// A coerced field value and whether a fallback was substituted.
#[derive(Debug, Clone, PartialEq)]
pub struct Coerced<T> {
    pub value: T,
    pub used_fallback: bool,
}

impl<T> Coerced<T> {
    fn accepted(value: T) -> Self {
        Self {
            value,
            used_fallback: false,
        }
    }

    fn fallback(value: T) -> Self {
        Self {
            value,
            used_fallback: true,
        }
    }
}

/// Turns untrusted generator output into a bounded `ScorecardResult`.
#[derive(Debug, Clone)]
pub struct ResponseNormalizer<'a> {
    model: &'a ScoringModel,
}

impl<'a> ResponseNormalizer<'a> {
    pub fn new(model: &'a ScoringModel) -> Self {
        Self { model }
    }

    /// Never fails. Anything that is not a JSON object yields the fallback result.
    pub fn normalize(&self, raw_text: &str) -> ScorecardResult {
        match extract_object(raw_text) {
            Some(object) => self.from_object(&object),
            None => {
                tracing::debug!("Assessment contained no JSON object, using fallback result");
                self.fallback_result(raw_text)
            }
        }
    }

    pub fn fallback_result(&self, raw_text: &str) -> ScorecardResult {
        let score = self.model.default_score();
        ScorecardResult {
            score,
            color: self.model.color_of(score),
            analysis: raw_text.to_string(),
            recommendations: vec![FALLBACK_RECOMMENDATION.to_string()],
        }
    }

    fn from_object(&self, object: &serde_json::Map<String, Value>) -> ScorecardResult {
        let score = self.coerce_score(object.get("score"));
        let color = self.coerce_color(object.get("color"), score.value);
        let analysis = coerce_analysis(object.get("analysis"));
        let recommendations = coerce_recommendations(object.get("recommendations"));

        tracing::debug!(
            score_fallback = score.used_fallback,
            color_fallback = color.used_fallback,
            analysis_fallback = analysis.used_fallback,
            recommendations_fallback = recommendations.used_fallback,
            "Normalized assessment"
        );

        ScorecardResult {
            score: score.value,
            color: color.value,
            analysis: analysis.value,
            recommendations: recommendations.value,
        }
    }

    pub fn coerce_score(&self, value: Option<&Value>) -> Coerced<u8> {
        let parsed = match value {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
            _ => None,
        };

        match parsed.filter(|n| n.is_finite()) {
            Some(n) => Coerced::accepted(n.round().clamp(0.0, 100.0) as u8),
            None => Coerced::fallback(self.model.default_score()),
        }
    }

    pub fn coerce_color(&self, value: Option<&Value>, score: u8) -> Coerced<Color> {
        match value.and_then(Value::as_str).and_then(Color::from_exact) {
            Some(color) => Coerced::accepted(color),
            None => Coerced::fallback(self.model.color_of(score)),
        }
    }
}

fn extract_object(raw_text: &str) -> Option<serde_json::Map<String, Value>> {
    let span = JSON_SPAN.find(raw_text)?;
    match serde_json::from_str::<Value>(span.as_str()) {
        Ok(Value::Object(object)) => Some(object),
        Ok(_) => None,
        Err(e) => {
            tracing::debug!(error = %e, "Assessment JSON span failed to parse");
            None
        }
    }
}

pub fn coerce_analysis(value: Option<&Value>) -> Coerced<String> {
    match value.and_then(Value::as_str).map(str::trim) {
        Some(text) if !text.is_empty() => Coerced::accepted(text.to_string()),
        _ => Coerced::fallback(ANALYSIS_PLACEHOLDER.to_string()),
    }
}

pub fn coerce_recommendations(value: Option<&Value>) -> Coerced<Vec<String>> {
    let kept: Vec<String> = match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    };

    if kept.is_empty() {
        Coerced::fallback(vec![FALLBACK_RECOMMENDATION.to_string()])
    } else {
        Coerced::accepted(kept)
    }
}
