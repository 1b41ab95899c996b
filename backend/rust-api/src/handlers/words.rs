use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use crate::error::ApiError;
use crate::metrics::WORD_QUESTIONS_SERVED_TOTAL;
use crate::models::completion::Difficulty;
use crate::models::question::WordQuizResponse;
use crate::services::AppState;

/// GET /wordsquiz/{difficulty} — question pool for one tier. Public: gating
/// happens on the completion write path, not here.
pub async fn word_questions(
    State(state): State<Arc<AppState>>,
    Path(difficulty): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let difficulty: Difficulty = difficulty
        .parse()
        .map_err(|_| ApiError::Validation(format!("Unknown quiz difficulty: {}", difficulty)))?;

    let questions = state.store.list_questions(difficulty).await?;

    WORD_QUESTIONS_SERVED_TOTAL
        .with_label_values(&[&difficulty.to_string()])
        .inc_by(questions.len() as u64);

    Ok(Json(WordQuizResponse { questions }))
}
