use std::sync::Arc;

use crate::llm::parser::parse_tech_stack;
use crate::llm::prompts::{setup_prompt, summary_prompt, tech_stack_prompt, PromptContext};
use crate::llm::provider::LLMProvider;
use crate::models::{Derived, FallbackReason, Insights, TechStack};
use crate::taxonomy;

/// Produces the narrative insights for an analysis. Every insight is always
/// present: when the model is missing or fails, a local heuristic value is
/// used and tagged with the reason.
#[derive(Clone)]
pub struct InsightGenerator {
    llm: Option<Arc<dyn LLMProvider>>,
}

impl InsightGenerator {
    pub fn new(llm: Option<Arc<dyn LLMProvider>>) -> Self {
        Self { llm }
    }

    /// A generator that only uses heuristics.
    pub fn offline() -> Self {
        Self { llm: None }
    }

    pub fn model(&self) -> Option<&str> {
        self.llm.as_deref().map(|llm| llm.model())
    }

    pub async fn generate(&self, ctx: &PromptContext<'_>) -> Insights {
        let (summary, tech_stack) = futures::join!(self.summary(ctx), self.tech_stack(ctx));
        let setup = self.setup_instructions(ctx, &tech_stack.value).await;

        let insights = Insights::new(summary, tech_stack, setup);
        if let Some(error) = &insights.error {
            tracing::warn!(repository = %ctx.info.name, "{}", error);
        }
        insights
    }

    async fn ask(&self, what: &str, prompt: String) -> Result<(String, String), FallbackReason> {
        let Some(llm) = &self.llm else {
            return Err(FallbackReason::ModelUnavailable);
        };

        match llm.generate(&prompt).await {
            Ok(text) => Ok((text, llm.model().to_string())),
            Err(e) => {
                tracing::warn!("{} request to {} failed: {}", what, llm.name(), e);
                Err(FallbackReason::RequestFailed(e.to_string()))
            }
        }
    }

    async fn summary(&self, ctx: &PromptContext<'_>) -> Derived<String> {
        match self.ask("Summary", summary_prompt(ctx)).await {
            Ok((text, model)) => Derived::from_model(text, model),
            Err(reason) => Derived::fallback(
                taxonomy::fallback_summary(ctx.info, ctx.readme, ctx.manifests),
                reason,
            ),
        }
    }

    async fn tech_stack(&self, ctx: &PromptContext<'_>) -> Derived<TechStack> {
        let fallback = || taxonomy::fallback_tech_stack(ctx.languages, ctx.manifests, ctx.tree);

        match self.ask("Tech stack", tech_stack_prompt(ctx)).await {
            Ok((text, model)) => match parse_tech_stack(&text) {
                Ok(stack) => Derived::from_model(stack, model),
                Err(e) => {
                    tracing::warn!("Tech stack answer from {} was not usable: {}", model, e);
                    Derived::fallback(fallback(), FallbackReason::MalformedResponse(e.to_string()))
                }
            },
            Err(reason) => Derived::fallback(fallback(), reason),
        }
    }

    async fn setup_instructions(
        &self,
        ctx: &PromptContext<'_>,
        tech_stack: &TechStack,
    ) -> Derived<String> {
        match self.ask("Setup", setup_prompt(ctx, tech_stack)).await {
            Ok((text, model)) => Derived::from_model(text, model),
            Err(reason) => Derived::fallback(
                taxonomy::fallback_setup_instructions(ctx.info, ctx.readme, ctx.manifests),
                reason,
            ),
        }
    }
}
