use async_trait::async_trait;
use tracing::debug;

use crate::client::OpenAiClient;
use crate::prompts;
use prospector_core::{AppConfig, CoreError, Judgment, LlmError, Playbook, Solution, Stage};

/// Label used when an opportunity-flagged judgment carries no description at
/// all. A possible silent-data-loss point; applied only in
/// [`problem_statement`] so it is easy to turn into an error later.
pub const GENERIC_OPPORTUNITY: &str =
    "A viable business opportunity identified from Reddit discussion";

/// The three structured-output stages the orchestrator runs per post.
#[async_trait]
pub trait OpportunityModel: Send + Sync {
    async fn judge(&self, context: &str) -> Result<Judgment, CoreError>;

    async fn propose(
        &self,
        problem: &str,
        market: &str,
        context: &str,
    ) -> Result<Solution, CoreError>;

    async fn playbook(
        &self,
        problem: &str,
        market: &str,
        solution: &str,
    ) -> Result<Playbook, CoreError>;
}

/// Best available statement of what the post is about, with the documented
/// fallback chain for opportunity posts.
pub fn problem_statement(judgment: &Judgment) -> String {
    if !judgment.problem_description.trim().is_empty() {
        return judgment.problem_description.clone();
    }
    if let Some(opportunity) = &judgment.opportunity_description {
        if !opportunity.trim().is_empty() {
            return opportunity.clone();
        }
    }
    GENERIC_OPPORTUNITY.to_string()
}

pub struct OpenAiModel {
    client: OpenAiClient,
}

impl OpenAiModel {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: OpenAiClient::new(config),
        }
    }
}

#[async_trait]
impl OpportunityModel for OpenAiModel {
    async fn judge(&self, context: &str) -> Result<Judgment, CoreError> {
        let value = self
            .client
            .complete_json(Stage::Judgment, &prompts::judgment_prompt(context))
            .await?;

        let judgment: Judgment = serde_json::from_value(value).map_err(|e| {
            LlmError::MalformedResponse {
                stage: Stage::Judgment,
                details: e.to_string(),
            }
        })?;
        debug!(
            "Judgment: viable={} confidence={:.2}",
            judgment.is_viable, judgment.confidence_score
        );
        Ok(judgment.normalized())
    }

    async fn propose(
        &self,
        problem: &str,
        market: &str,
        context: &str,
    ) -> Result<Solution, CoreError> {
        let value = self
            .client
            .complete_json(
                Stage::Solution,
                &prompts::solution_prompt(problem, market, context),
            )
            .await?;

        let solution: Solution = serde_json::from_value(value).map_err(|e| {
            LlmError::MalformedResponse {
                stage: Stage::Solution,
                details: e.to_string(),
            }
        })?;
        Ok(solution.normalized())
    }

    async fn playbook(
        &self,
        problem: &str,
        market: &str,
        solution: &str,
    ) -> Result<Playbook, CoreError> {
        let value = self
            .client
            .complete_json(
                Stage::Playbook,
                &prompts::playbook_prompt(problem, market, solution),
            )
            .await?;

        let playbook: Playbook = serde_json::from_value(value).map_err(|e| {
            LlmError::MalformedResponse {
                stage: Stage::Playbook,
                details: e.to_string(),
            }
        })?;

        // A playbook with no prompts is useless downstream; treat it the same
        // as an empty response.
        if playbook.prompts.is_empty() {
            return Err(CoreError::Llm(LlmError::EmptyResponse {
                stage: Stage::Playbook,
            }));
        }
        Ok(playbook)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn judgment_with(problem: &str, opportunity: Option<&str>) -> Judgment {
        Judgment {
            is_viable: true,
            is_opportunity: Some(true),
            problem_description: problem.to_string(),
            opportunity_description: opportunity.map(|s| s.to_string()),
            target_market: String::new(),
            confidence_score: 0.5,
        }
    }

    #[test]
    fn problem_statement_prefers_problem_description() {
        let judgment = judgment_with("a concrete pain point", Some("an opportunity"));
        assert_eq!(problem_statement(&judgment), "a concrete pain point");
    }

    #[test]
    fn problem_statement_falls_back_to_opportunity() {
        let judgment = judgment_with("", Some("resellable service"));
        assert_eq!(problem_statement(&judgment), "resellable service");
    }

    #[test]
    fn problem_statement_falls_back_to_generic_label() {
        let judgment = judgment_with("  ", None);
        assert_eq!(problem_statement(&judgment), GENERIC_OPPORTUNITY);
    }
}
