//! Answer generation grounded in the fused retrieval context.

use super::chat::{ChatClient, ChatError};
use super::fusion::FusedContext;

/// Reply used when retrieval produced no grounding material.
pub const NO_INFORMATION_MESSAGE: &str =
    "The retrieved documents do not contain this information.";

const SYSTEM_PROMPT: &str = r#"You are a planning and zoning assistant specialized in interpreting municipal zoning by-laws. You help professionals such as architects, engineers, urban planners, and developers by giving reliable, regulation-based answers using only the retrieved document context.

Your answers must be:
- Strictly based on the retrieved context; do not guess or fabricate
- Technically accurate and legally sound
- Well-structured, with numerical clarity for dimensional rules
- Verifiable: always end with a References line citing the section numbers or clauses stated in the context

If the answer is not found in the context, say: "The retrieved documents do not contain this information.""#;

/// Generates natural-language answers from a query and its fused context.
pub struct AnswerService {
    chat: Box<dyn ChatClient>,
}

impl AnswerService {
    /// Construct the service over the given chat client.
    pub fn new(chat: Box<dyn ChatClient>) -> Self {
        Self { chat }
    }

    /// Produce an answer grounded in the fused context.
    ///
    /// An empty context short-circuits to [`NO_INFORMATION_MESSAGE`] without
    /// calling the model; generating from nothing only invites fabrication.
    pub async fn answer(&self, query: &str, context: &FusedContext) -> Result<String, ChatError> {
        if context.is_empty() {
            tracing::info!("Fused context is empty; reporting no information found");
            return Ok(NO_INFORMATION_MESSAGE.to_string());
        }

        let prompt = build_prompt(query, &context.render());
        self.chat.complete(SYSTEM_PROMPT, &prompt).await
    }
}

fn build_prompt(query: &str, context: &str) -> String {
    format!(
        "Provide a comprehensive response to the following query based on the \
provided context from the zoning by-law:\n\n\
QUERY: {query}\n\n\
CONTEXT:\n{context}\n\n\
Present all relevant regulations and requirements clearly with their \
specific references."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::fusion::{QueryVariant, RetrievalHit, VariantBlock};
    use crate::record::RecordPayload;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    struct RecordingChat {
        prompts: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl ChatClient for RecordingChat {
        async fn complete(&self, _: &str, user_prompt: &str) -> Result<String, ChatError> {
            self.prompts.lock().unwrap().push(user_prompt.to_string());
            Ok("Grounded answer.".to_string())
        }
    }

    fn context_with_hit() -> FusedContext {
        FusedContext {
            blocks: vec![VariantBlock {
                variant: QueryVariant::Original,
                query: "rear yard setback".into(),
                hits: vec![RetrievalHit {
                    id: "3".into(),
                    score: 0.9,
                    payload: RecordPayload {
                        text: "The rear yard must be at least 1.5 metres.".into(),
                        hierarchy: "Permitted Uses > Setbacks".into(),
                        ..Default::default()
                    },
                }],
            }],
        }
    }

    #[tokio::test]
    async fn grounds_the_prompt_in_the_rendered_context() {
        let prompts = Arc::new(Mutex::new(Vec::new()));
        let service = AnswerService::new(Box::new(RecordingChat {
            prompts: Arc::clone(&prompts),
        }));

        let answer = service
            .answer("rear yard setback", &context_with_hit())
            .await
            .expect("answer");
        assert_eq!(answer, "Grounded answer.");

        let recorded = prompts.lock().unwrap();
        assert_eq!(recorded.len(), 1);
        assert!(recorded[0].contains("QUERY: rear yard setback"));
        assert!(recorded[0].contains("Permitted Uses > Setbacks"));
    }

    #[tokio::test]
    async fn empty_context_short_circuits_without_a_model_call() {
        struct PanickingChat;

        #[async_trait]
        impl ChatClient for PanickingChat {
            async fn complete(&self, _: &str, _: &str) -> Result<String, ChatError> {
                panic!("the model must not be called for an empty context");
            }
        }

        let service = AnswerService::new(Box::new(PanickingChat));
        let answer = service
            .answer("anything", &FusedContext::default())
            .await
            .expect("answer");
        assert_eq!(answer, NO_INFORMATION_MESSAGE);
    }
}
