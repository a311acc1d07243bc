//! Query scenarios from raw documents to the formatted answer.

use super::*;
use crate::rag::QueryStatus;
use crate::{build_or_load, SqliteVectorIndex};
use askdocs_core::NoResultsPolicy;

async fn built_index(config: &AppConfig) -> Arc<SqliteVectorIndex> {
    let (index, _) = build_or_load(config, &MockProvider::new(DIMENSIONS), false)
        .await
        .unwrap();
    Arc::new(index)
}

#[tokio::test]
async fn test_sky_question_is_grounded_in_document() {
    let (_temp, mut config) = workspace(&[("sky.txt", "The sky is blue. Grass is green.")]);
    config.top_k = 1;

    let index = built_index(&config).await;
    let llm = RecordingLlm::new("  The sky is blue.  \n");
    let pipeline = pipeline(&config, index, CountingEmbedder::new(), llm.clone());

    let retrieval = pipeline
        .retriever()
        .retrieve("What color is the sky?", 1)
        .await
        .unwrap();
    assert_eq!(retrieval.texts(), vec!["The sky is blue. Grass is green."]);

    let response = pipeline.answer("What color is the sky?").await;
    assert_eq!(response.status, QueryStatus::Answered);
    assert_eq!(response.answer, "The sky is blue.");
    assert_eq!(response.previews.len(), 1);
    assert_eq!(response.previews[0].text, "The sky is blue. Grass is green.");
    assert!(response.previews[0]
        .source
        .as_deref()
        .unwrap()
        .ends_with("sky.txt"));

    let prompts = llm.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("What color is the sky?"));
    assert!(prompts[0].contains("The sky is blue. Grass is green."));
    assert_eq!(prompts[0].matches("What color is the sky?").count(), 1);
}

#[tokio::test]
async fn test_most_relevant_document_ranks_first() {
    let (_temp, config) = workspace(&[
        ("a_pasta.txt", "Pasta needs salted boiling water and patience."),
        ("b_sky.txt", "The sky is blue because of Rayleigh scattering."),
        ("c_trains.txt", "Freight trains haul containers across continents."),
    ]);

    let index = built_index(&config).await;
    let pipeline = pipeline(
        &config,
        index,
        CountingEmbedder::new(),
        RecordingLlm::new("ok"),
    );

    let retrieval = pipeline
        .retriever()
        .retrieve("Why is the sky blue?", 3)
        .await
        .unwrap();
    assert_eq!(retrieval.len(), 3);
    assert!(retrieval.hits[0].text.contains("Rayleigh"));
    assert!(retrieval.hits.windows(2).all(|w| w[0].score >= w[1].score));
}

#[tokio::test]
async fn test_empty_query_makes_no_calls() {
    let (_temp, config) = workspace(&[("sky.txt", "The sky is blue.")]);
    let index = built_index(&config).await;
    let embedder = CountingEmbedder::new();
    let llm = RecordingLlm::new("unused");
    let pipeline = pipeline(&config, index, embedder.clone(), llm.clone());

    for query in ["", "   ", "\n\t"] {
        let response = pipeline.answer(query).await;
        assert_eq!(response.status, QueryStatus::EmptyQuery);
        assert_eq!(response.answer, "Please enter a question.");
        assert!(response.previews.is_empty());
    }

    assert_eq!(embedder.embedded(), 0);
    assert_eq!(llm.calls(), 0);
}

#[tokio::test]
async fn test_no_results_skips_generation_by_default() {
    let (_temp, config) = workspace(&[]);
    let index = built_index(&config).await;
    assert!(index.is_empty());

    let llm = RecordingLlm::new("unused");
    let pipeline = pipeline(&config, index, CountingEmbedder::new(), llm.clone());

    let response = pipeline.answer("Anything in there?").await;
    assert_eq!(response.status, QueryStatus::NoResults);
    assert_eq!(
        response.answer,
        "I couldn't find any relevant information in the documents."
    );
    assert_eq!(llm.calls(), 0);
}

#[tokio::test]
async fn test_general_knowledge_policy_still_generates() {
    let (_temp, mut config) = workspace(&[]);
    config.no_results_policy = NoResultsPolicy::GeneralKnowledge;
    let index = built_index(&config).await;

    let llm = RecordingLlm::new("Paris is the capital of France.");
    let pipeline = pipeline(&config, index, CountingEmbedder::new(), llm.clone());

    let response = pipeline.answer("What is the capital of France?").await;
    assert_eq!(response.status, QueryStatus::Answered);
    assert_eq!(response.answer, "Paris is the capital of France.");
    assert!(response.previews.is_empty());
    assert_eq!(llm.calls(), 1);
    assert!(llm.prompts()[0].contains("What is the capital of France?"));
}

#[tokio::test]
async fn test_unreachable_embedder_is_reported_not_raised() {
    let (_temp, config) = workspace(&[("sky.txt", "The sky is blue.")]);
    let index = built_index(&config).await;
    let llm = RecordingLlm::new("unused");
    let pipeline = pipeline(&config, index, Arc::new(UnreachableEmbedder), llm.clone());

    let response = pipeline.answer("What color is the sky?").await;
    assert_eq!(response.status, QueryStatus::RetrievalFailed);
    assert!(response
        .answer
        .starts_with("Sorry, I could not process your question: "));
    assert!(response.answer.contains("connection refused"));
    assert_eq!(llm.calls(), 0);
}

#[tokio::test]
async fn test_markup_from_model_is_stripped() {
    let (_temp, config) = workspace(&[("sky.txt", "The sky is blue.")]);
    let index = built_index(&config).await;
    let llm = RecordingLlm::new("<p>The <b>sky</b> is blue.</p><br/>- <<i>script>Rayleigh</i>");
    let pipeline = pipeline(&config, index, CountingEmbedder::new(), llm);

    let response = pipeline.answer("What color is the sky?").await;
    assert_eq!(response.status, QueryStatus::Answered);
    assert_eq!(response.answer, "The sky is blue.\n• Rayleigh");
}

#[tokio::test]
async fn test_long_chunks_are_truncated_in_prompt() {
    let long = format!("sky {}", "word ".repeat(400));
    let (_temp, mut config) = workspace(&[("long.txt", long.as_str())]);
    config.chunk_size = 1500;
    config.chunk_overlap = 100;
    config.context_chars = 50;
    config.preview_chars = 20;

    let index = built_index(&config).await;
    let llm = RecordingLlm::new("ok");
    let pipeline = pipeline(&config, index, CountingEmbedder::new(), llm.clone());

    let response = pipeline.answer("sky").await;
    assert_eq!(response.previews[0].text.chars().count(), 23);
    assert!(response.previews[0].text.ends_with("..."));

    let prompt = &llm.prompts()[0];
    let expected: String = long.chars().take(50).collect();
    assert!(prompt.contains(&format!("1. {}", expected.trim_end())));
    assert!(!prompt.contains(&long.chars().take(51).collect::<String>()));
}
