use axum::{extract::State, response::IntoResponse, Extension, Json};
use serde_json::json;
use std::sync::Arc;

use crate::error::ApiError;
use crate::extractors::AppJson;
use crate::metrics::QUIZ_COMPLETIONS_TOTAL;
use crate::middlewares::auth::JwtClaims;
use crate::models::completion::{
    AchievementsResponse, CompletionView, QuizStatusResponse, UpdateAchievementsRequest,
    UpdateAchievementsResponse,
};
use crate::services::{achievement_service::AchievementService, AppState};

/// GET /quiz/achievements/check — completion history (newest first) plus the
/// per-difficulty booleans the client derives its gating UI from.
pub async fn check_achievements(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
) -> Result<impl IntoResponse, ApiError> {
    let service = AchievementService::new(state.store.clone());

    let completions = service.achievements(&claims.sub).await?;
    let status = service.status(&claims.sub).await?;

    Ok(Json(AchievementsResponse {
        success: true,
        completions: completions.into_iter().map(CompletionView::from).collect(),
        status,
    }))
}

/// POST /quiz/achievements/update — records a completion after re-checking
/// the prerequisite server-side.
pub async fn update_achievements(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    AppJson(payload): AppJson<UpdateAchievementsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let service = AchievementService::new(state.store.clone());

    let completion = service.record_completion(&claims.sub, payload).await?;

    QUIZ_COMPLETIONS_TOTAL
        .with_label_values(&[&completion.difficulty.to_string()])
        .inc();

    Ok(Json(UpdateAchievementsResponse {
        success: true,
        quiz_completion: CompletionView::from(completion),
    }))
}

/// GET /quiz/status — the coarse onboarding proficiency flag.
pub async fn quiz_status(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
) -> Result<impl IntoResponse, ApiError> {
    let service = AchievementService::new(state.store.clone());
    let has_completed = service.proficiency_status(&claims.sub).await?;
    Ok(Json(QuizStatusResponse { has_completed }))
}

/// POST /quiz/status/complete — sets the proficiency flag; idempotent.
pub async fn complete_quiz_status(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
) -> Result<impl IntoResponse, ApiError> {
    let service = AchievementService::new(state.store.clone());
    service.complete_proficiency(&claims.sub).await?;
    Ok(Json(json!({ "success": true })))
}
