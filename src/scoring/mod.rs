pub mod model;
pub mod normalizer;

pub use model::{Category, Color, ScoreRange, ScorecardResult, ScoringConfig, ScoringModel};
pub use normalizer::ResponseNormalizer;
