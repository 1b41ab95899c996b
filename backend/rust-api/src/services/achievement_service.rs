use std::collections::HashSet;
use std::sync::Arc;

use validator::Validate;

use crate::error::ApiError;
use crate::models::completion::{
    Difficulty, DifficultyStatus, QuizCompletion, UpdateAchievementsRequest,
};
use crate::services::progression;
use crate::store::DataStore;

pub struct AchievementService {
    store: Arc<dyn DataStore>,
}

impl AchievementService {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    async fn require_user(&self, user_id: &str) -> Result<(), ApiError> {
        self.store
            .find_user_by_id(user_id)
            .await?
            .map(|_| ())
            .ok_or(ApiError::NotFound("User"))
    }

    /// Write path for quiz completions. Re-verifies the prerequisite
    /// server-side before accepting the upsert: a rejected request performs
    /// no write.
    pub async fn record_completion(
        &self,
        user_id: &str,
        req: UpdateAchievementsRequest,
    ) -> Result<QuizCompletion, ApiError> {
        req.validate()
            .map_err(|e| ApiError::Validation(format!("Validation error: {}", e)))?;

        let difficulty: Difficulty = req
            .level
            .parse()
            .map_err(|_| ApiError::Validation(format!("Unknown quiz level: {}", req.level)))?;

        self.require_user(user_id).await?;

        if difficulty.prerequisite().is_some() {
            let completed = self.completed_set(user_id).await?;
            progression::check_prerequisite(difficulty, &completed)
                .map_err(ApiError::PrerequisiteNotMet)?;
        }

        let completion = self
            .store
            .upsert_completion(user_id, difficulty, req.score)
            .await?;

        tracing::info!(
            user_id = %user_id,
            difficulty = %difficulty,
            score = completion.score,
            "Quiz completion recorded"
        );
        Ok(completion)
    }

    /// Completion history, newest first.
    pub async fn achievements(&self, user_id: &str) -> Result<Vec<QuizCompletion>, ApiError> {
        self.require_user(user_id).await?;
        Ok(self.store.list_completions(user_id).await?)
    }

    /// Per-difficulty booleans derived from completion existence.
    pub async fn status(&self, user_id: &str) -> Result<DifficultyStatus, ApiError> {
        self.require_user(user_id).await?;
        let completed = self.completed_set(user_id).await?;
        Ok(DifficultyStatus {
            beginner: completed.contains(&Difficulty::Beginner),
            intermediate: completed.contains(&Difficulty::Intermediate),
            advanced: completed.contains(&Difficulty::Advanced),
        })
    }

    /// The coarse onboarding flag, independent of the three tier
    /// completions.
    pub async fn proficiency_status(&self, user_id: &str) -> Result<bool, ApiError> {
        let user = self
            .store
            .find_user_by_id(user_id)
            .await?
            .ok_or(ApiError::NotFound("User"))?;
        Ok(user.has_completed_proficiency_quiz)
    }

    /// Sets the onboarding flag; idempotent, never reset.
    pub async fn complete_proficiency(&self, user_id: &str) -> Result<(), ApiError> {
        if !self.store.mark_proficiency_complete(user_id).await? {
            return Err(ApiError::NotFound("User"));
        }
        Ok(())
    }

    async fn completed_set(&self, user_id: &str) -> Result<HashSet<Difficulty>, ApiError> {
        let completions = self.store.list_completions(user_id).await?;
        Ok(completions.into_iter().map(|c| c.difficulty).collect())
    }
}
