use crate::platform::types::Repository;
use crate::platform::Platform;

/// Files read from the repository to brief the generator.
pub const CONTEXT_FILES: [&str; 2] = ["README.md", "CODEOWNERS"];

const MISSING_FILE: &str = "not found or inaccessible";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextFile {
    pub path: String,
    /// `None` when the file is missing or could not be read.
    pub content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryContext {
    pub repository: Repository,
    pub files: Vec<ContextFile>,
}

impl RepositoryContext {
    /// Read the context files. Read failures are recorded as missing files.
    pub async fn collect(
        platform: &dyn Platform,
        installation_id: u64,
        repository: &Repository,
    ) -> Self {
        let mut files = Vec::with_capacity(CONTEXT_FILES.len());

        for path in CONTEXT_FILES {
            let content = match platform
                .get_file_content(installation_id, repository, path)
                .await
            {
                Ok(content) => content,
                Err(e) => {
                    tracing::warn!(repo = %repository, path, error = %e, "Failed to read context file");
                    None
                }
            };
            files.push(ContextFile {
                path: path.to_string(),
                content,
            });
        }

        Self {
            repository: repository.clone(),
            files,
        }
    }

    /// Plain-text rendering used in the generator prompt.
    pub fn render(&self) -> String {
        let mut out = format!("Repository: {}\n", self.repository.full_name);
        for file in &self.files {
            out.push_str(&format!("\n=== {} ===\n", file.path));
            match &file.content {
                Some(content) => out.push_str(content.trim_end()),
                None => out.push_str(&format!("{} {MISSING_FILE}.", file.path)),
            }
            out.push('\n');
        }
        out
    }
}
