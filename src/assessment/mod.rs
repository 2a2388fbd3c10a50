pub mod claude;
pub mod context;
pub mod prompt;

use async_trait::async_trait;

use crate::error::Result;

pub use context::RepositoryContext;

/// Produces a raw, untrusted assessment for a repository. The text is expected,
/// not guaranteed, to contain a JSON scorecard.
#[async_trait]
pub trait AssessmentGenerator: Send + Sync {
    async fn generate(&self, context: &RepositoryContext) -> Result<String>;
}
