//! Answer synthesis over retrieved transcript excerpts.

mod chat;
pub mod context;

pub use chat::{ChatModel, OpenAIChatModel};
pub use context::{format_context_for_prompt, select_context};

use crate::config::Prompts;
use crate::error::{Result, VidqaError};
use crate::retrieval::Retriever;
use crate::vector_store::SearchResult;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// An excerpt shown to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextChunk {
    pub content: String,
    /// Position of the excerpt in the transcript.
    pub chunk_order: usize,
    /// Similarity to the question.
    pub score: f32,
}

impl From<SearchResult> for ContextChunk {
    fn from(result: SearchResult) -> Self {
        Self {
            content: result.document.content,
            chunk_order: result.document.chunk_order,
            score: result.score,
        }
    }
}

/// A generated answer and the excerpts it was grounded on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
    pub context: Vec<ContextChunk>,
}

/// Answers questions from a transcript retriever.
pub struct RagEngine {
    model: Arc<dyn ChatModel>,
    prompts: Prompts,
    max_context_chars: usize,
}

impl RagEngine {
    pub fn new(model: Arc<dyn ChatModel>, prompts: Prompts, max_context_chars: usize) -> Self {
        Self {
            model,
            prompts,
            max_context_chars,
        }
    }

    /// Retrieve excerpts for the question and ask the model to answer from them.
    #[instrument(skip(self, retriever), fields(question = %question))]
    pub async fn answer(&self, retriever: &Retriever, question: &str) -> Result<Answer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(VidqaError::InvalidInput("Question is empty".to_string()));
        }

        let results = retriever.retrieve(question).await?;
        if results.is_empty() {
            info!("No excerpts retrieved; answering without the model");
            return Ok(Answer {
                answer: self.prompts.rag.no_context.clone(),
                context: Vec::new(),
            });
        }

        let context = select_context(results, self.max_context_chars);

        let mut vars = HashMap::new();
        vars.insert("question".to_string(), question.to_string());
        vars.insert("context".to_string(), format_context_for_prompt(&context));

        let system = self.prompts.render_with_custom(&self.prompts.rag.system, &vars);
        let user = self.prompts.render_with_custom(&self.prompts.rag.user, &vars);

        let answer = self.model.complete(&system, &user).await?;
        debug!(
            "Answered with {} using {} excerpts",
            self.model.model(),
            context.len()
        );

        Ok(Answer {
            answer: answer.trim().to_string(),
            context,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::testing::EchoModel;
    use super::*;
    use crate::retrieval::testing::LetterEmbedder;
    use crate::vector_store::{Document, MemoryVectorStore};

    fn retriever(texts: &[&str], k: usize, min_score: f32) -> Retriever {
        let docs = texts
            .iter()
            .enumerate()
            .map(|(i, t)| Document::new(t.to_string(), i, LetterEmbedder::vector(t)))
            .collect();
        Retriever::new(
            Arc::new(MemoryVectorStore::from_documents(docs)),
            Arc::new(LetterEmbedder::new()),
            k,
            min_score,
        )
    }

    #[tokio::test]
    async fn test_answer_uses_retrieved_context() {
        let model = Arc::new(EchoModel::new("  Bananas are yellow.  "));
        let engine = RagEngine::new(model.clone(), Prompts::default(), 6000);
        let retriever = retriever(&["bananas are yellow", "the sky is blue", "zzz"], 2, -1.0);

        let answer = engine.answer(&retriever, "what colour are bananas?").await.unwrap();
        assert_eq!(answer.answer, "Bananas are yellow.");
        assert_eq!(answer.context.len(), 2);
        assert_eq!(answer.context[0].content, "bananas are yellow");

        let prompts = model.prompts.lock().unwrap();
        let (system, user) = &prompts[0];
        assert!(system.contains("Answer ONLY using the provided transcript excerpts"));
        assert!(user.starts_with("Context:\nbananas are yellow\n\n"));
        assert!(user.ends_with("Question: what colour are bananas?"));
    }

    #[tokio::test]
    async fn test_blank_question_rejected() {
        let model = Arc::new(EchoModel::new("unused"));
        let engine = RagEngine::new(model.clone(), Prompts::default(), 6000);
        let retriever = retriever(&["anything"], 4, -1.0);

        let err = engine.answer(&retriever, "  ").await.unwrap_err();
        assert!(matches!(err, VidqaError::InvalidInput(_)));
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn test_no_context_skips_model() {
        let model = Arc::new(EchoModel::new("unused"));
        let engine = RagEngine::new(model.clone(), Prompts::default(), 6000);
        // Nothing clears the threshold.
        let retriever = retriever(&["qqq"], 4, 0.5);

        let answer = engine.answer(&retriever, "abc").await.unwrap();
        assert_eq!(answer.answer, Prompts::default().rag.no_context);
        assert!(answer.context.is_empty());
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn test_model_errors_propagate() {
        let model = Arc::new(EchoModel {
            fail: true,
            ..EchoModel::new("unused")
        });
        let engine = RagEngine::new(model, Prompts::default(), 6000);
        let retriever = retriever(&["abc"], 4, -1.0);

        let err = engine.answer(&retriever, "abc").await.unwrap_err();
        assert!(matches!(err, VidqaError::OpenAI(_)));
    }

    #[tokio::test]
    async fn test_context_budget_limits_excerpts() {
        let model = Arc::new(EchoModel::new("ok"));
        let engine = RagEngine::new(model, Prompts::default(), 20);
        let retriever = retriever(&["aaaaaaaaaaaaaaa", "aaaaaaaaaaaaaab"], 4, -1.0);

        let answer = engine.answer(&retriever, "a").await.unwrap();
        assert_eq!(answer.context.len(), 1);
    }
}
