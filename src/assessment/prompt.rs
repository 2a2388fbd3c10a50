use crate::assessment::RepositoryContext;

pub fn system_prompt(scoring_guide: &str) -> String {
    format!(
        r#"You are a developer experience reviewer. You assess how easy it is for a new contributor to understand, build and contribute to a repository.

## Scoring Guide
{scoring_guide}

## Output
Respond with a single JSON object and nothing else:

{{
  "score": <integer 0-100>,
  "color": "red" | "yellow" | "green",
  "analysis": "<a short paragraph explaining the score>",
  "recommendations": ["<concrete improvement>", "..."]
}}

## Guidelines
- Base the assessment only on the repository context you are given.
- Missing files are a finding in themselves; mention them.
- Keep recommendations specific and actionable, most impactful first."#
    )
}

pub fn user_message(context: &RepositoryContext) -> String {
    format!(
        "Generate a developer experience scorecard for the repository {}.\n\n{}",
        context.repository.full_name,
        context.render()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::types::Repository;
    use crate::scoring::ScoringModel;

    #[test]
    fn test_system_prompt_embeds_guide() {
        let guide = ScoringModel::default().describe_guide();
        let prompt = system_prompt(&guide);
        assert!(prompt.contains(&guide));
        assert!(prompt.contains("\"recommendations\""));
    }

    #[test]
    fn test_user_message_names_repository() {
        let context = RepositoryContext {
            repository: Repository::new("acme", "widgets"),
            files: Vec::new(),
        };
        assert!(user_message(&context).starts_with(
            "Generate a developer experience scorecard for the repository acme/widgets."
        ));
    }
}
