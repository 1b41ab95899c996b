use axum::Router;
use std::sync::Arc;

use linguaflow_api::{
    config::Config,
    create_router,
    models::completion::Difficulty,
    models::question::{AnswerOption, WordQuestion},
    services::AppState,
    store::MemoryStore,
};

/// Builds the full router on top of an in-memory store, seeded with a small
/// word-question pool. Hermetic: no external services.
pub async fn create_test_app() -> (Router, Arc<MemoryStore>) {
    // Initialize tracing for tests
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    let config = Config::for_tests();

    let store = Arc::new(MemoryStore::new());
    store.seed_questions(seed_questions());

    let app_state = Arc::new(AppState::new(config, store.clone()));

    (create_router(app_state), store)
}

fn seed_questions() -> Vec<WordQuestion> {
    let mut questions = Vec::new();
    for (difficulty, prompt, correct) in [
        (Difficulty::Beginner, "What does \"hund\" mean?", "dog"),
        (Difficulty::Beginner, "What does \"katt\" mean?", "cat"),
        (
            Difficulty::Intermediate,
            "What does \"förbättra\" mean?",
            "improve",
        ),
        (
            Difficulty::Advanced,
            "What does \"förutsättning\" mean?",
            "precondition",
        ),
    ] {
        questions.push(WordQuestion {
            id: None,
            difficulty,
            prompt: prompt.to_string(),
            options: vec![
                AnswerOption {
                    id: "a".to_string(),
                    text: correct.to_string(),
                },
                AnswerOption {
                    id: "b".to_string(),
                    text: "house".to_string(),
                },
                AnswerOption {
                    id: "c".to_string(),
                    text: "tree".to_string(),
                },
            ],
            correct_option_id: "a".to_string(),
        });
    }
    questions
}
