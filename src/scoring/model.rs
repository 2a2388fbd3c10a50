use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Traffic-light color of a scorecard. Ordered `Red < Yellow < Green`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Yellow,
    Green,
}

impl Color {
    pub fn as_str(&self) -> &'static str {
        match self {
            Color::Red => "red",
            Color::Yellow => "yellow",
            Color::Green => "green",
        }
    }

    /// Exact, case-sensitive match on the three canonical names.
    pub fn from_exact(value: &str) -> Option<Self> {
        match value {
            "red" => Some(Color::Red),
            "yellow" => Some(Color::Yellow),
            "green" => Some(Color::Green),
            _ => None,
        }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named score band used for human-readable categorization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRange {
    pub name: String,
    pub min: i64,
    pub max: i64,
    pub description: String,
}

impl ScoreRange {
    fn new(name: &str, min: i64, max: i64, description: &str) -> Self {
        Self {
            name: name.to_string(),
            min,
            max,
            description: description.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub green_threshold: i64,
    pub yellow_threshold: i64,
    pub red_threshold: i64,
    pub default_score: i64,
    pub ranges: Vec<ScoreRange>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            green_threshold: 80,
            yellow_threshold: 60,
            red_threshold: 40,
            default_score: 50,
            ranges: vec![
                ScoreRange::new(
                    "Exceptional",
                    90,
                    100,
                    "Best-in-class developer experience with little left to improve",
                ),
                ScoreRange::new(
                    "Excellent",
                    80,
                    89,
                    "Strong developer experience with minor gaps",
                ),
                ScoreRange::new(
                    "Good",
                    70,
                    79,
                    "Solid foundations with a few notable improvements available",
                ),
                ScoreRange::new(
                    "Fair",
                    60,
                    69,
                    "Usable but several areas slow contributors down",
                ),
                ScoreRange::new(
                    "Needs Improvement",
                    40,
                    59,
                    "Contributors will hit friction in onboarding and daily work",
                ),
                ScoreRange::new(
                    "Poor",
                    20,
                    39,
                    "Significant gaps in documentation, tooling or ownership",
                ),
                ScoreRange::new(
                    "Critical",
                    0,
                    19,
                    "Basic developer experience essentials are missing",
                ),
            ],
        }
    }
}

impl ScoringConfig {
    /// Check every invariant, naming the offending field on failure.
    pub fn validate(&self) -> Result<()> {
        if self.green_threshold <= self.yellow_threshold {
            return Err(AppError::Config(format!(
                "scoring.green_threshold ({}) must be greater than scoring.yellow_threshold ({})",
                self.green_threshold, self.yellow_threshold
            )));
        }
        if self.yellow_threshold <= self.red_threshold {
            return Err(AppError::Config(format!(
                "scoring.yellow_threshold ({}) must be greater than scoring.red_threshold ({})",
                self.yellow_threshold, self.red_threshold
            )));
        }
        if !(0..=100).contains(&self.default_score) {
            return Err(AppError::Config(format!(
                "scoring.default_score ({}) must be within 0..=100",
                self.default_score
            )));
        }
        if self.ranges.is_empty() {
            return Err(AppError::Config(
                "scoring.ranges must contain at least one band".to_string(),
            ));
        }

        for range in &self.ranges {
            if range.min > range.max {
                return Err(AppError::Config(format!(
                    "scoring.ranges[{}]: min ({}) is greater than max ({})",
                    range.name, range.min, range.max
                )));
            }
            if range.min < 0 || range.max > 100 {
                return Err(AppError::Config(format!(
                    "scoring.ranges[{}]: {}..={} falls outside 0..=100",
                    range.name, range.min, range.max
                )));
            }
        }

        let mut ascending: Vec<&ScoreRange> = self.ranges.iter().collect();
        ascending.sort_by_key(|r| r.min);

        if ascending[0].min != 0 {
            return Err(AppError::Config(format!(
                "scoring.ranges[{}]: lowest band must start at 0, starts at {}",
                ascending[0].name, ascending[0].min
            )));
        }
        for pair in ascending.windows(2) {
            if pair[1].min != pair[0].max + 1 {
                return Err(AppError::Config(format!(
                    "scoring.ranges[{}]: must start at {} to follow band {}",
                    pair[1].name,
                    pair[0].max + 1,
                    pair[0].name
                )));
            }
        }
        let highest = ascending[ascending.len() - 1];
        if highest.max != 100 {
            return Err(AppError::Config(format!(
                "scoring.ranges[{}]: highest band must end at 100, ends at {}",
                highest.name, highest.max
            )));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub description: String,
}

/// The outcome of one assessment, always within bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScorecardResult {
    pub score: u8,
    pub color: Color,
    pub analysis: String,
    pub recommendations: Vec<String>,
}

/// Validated scoring configuration with the two classification axes:
/// color (thresholds) and category (bands). They are independent and may
/// disagree around band boundaries.
#[derive(Debug, Clone)]
pub struct ScoringModel {
    config: ScoringConfig,
    /// Bands ordered by descending `min`.
    bands: Vec<ScoreRange>,
}

impl ScoringModel {
    pub fn new(config: ScoringConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_valid(config))
    }

    fn from_valid(config: ScoringConfig) -> Self {
        let mut bands = config.ranges.clone();
        bands.sort_by(|a, b| b.min.cmp(&a.min));
        Self { config, bands }
    }

    pub fn color_of(&self, score: u8) -> Color {
        let score = i64::from(score);
        if score >= self.config.green_threshold {
            Color::Green
        } else if score >= self.config.yellow_threshold {
            Color::Yellow
        } else {
            Color::Red
        }
    }

    pub fn category_of(&self, score: u8) -> Category {
        let score = i64::from(score);
        self.bands
            .iter()
            .find(|band| band.min <= score)
            .or_else(|| self.bands.last())
            .map(|band| Category {
                name: band.name.clone(),
                description: band.description.clone(),
            })
            .unwrap_or_else(|| Category {
                name: "Unrated".to_string(),
                description: String::new(),
            })
    }

    pub fn default_score(&self) -> u8 {
        // Validated to 0..=100 at construction.
        self.config.default_score.clamp(0, 100) as u8
    }

    /// Human-readable rendering of the bands and thresholds, highest first.
    pub fn describe_guide(&self) -> String {
        let mut guide = String::from("Score bands (0-100):\n");
        for band in &self.bands {
            guide.push_str(&format!(
                "- {}-{} {}: {}\n",
                band.min, band.max, band.name, band.description
            ));
        }
        guide.push_str(&format!(
            "Colors: green at {} or above, yellow at {} or above, red below {}. \
             Scores below {} indicate critical gaps.",
            self.config.green_threshold,
            self.config.yellow_threshold,
            self.config.yellow_threshold,
            self.config.red_threshold
        ));
        guide
    }
}

impl Default for ScoringModel {
    fn default() -> Self {
        Self::from_valid(ScoringConfig::default())
    }
}
