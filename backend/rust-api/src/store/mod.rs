use anyhow::Result;
use async_trait::async_trait;

use crate::models::{
    completion::{Difficulty, QuizCompletion},
    question::WordQuestion,
    session::SessionRecord,
    user::User,
};

pub mod memory;
pub mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

/// Persistence seam. Handlers receive an `Arc<dyn DataStore>` through
/// `AppState` instead of reaching for a global client; `MongoStore` backs
/// production, `MemoryStore` backs the test suite and local development.
///
/// Errors are raw `anyhow` here; services wrap them into
/// `ApiError::Storage` at the handler boundary.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Connectivity probe for the health endpoint.
    async fn ping(&self) -> Result<()>;

    // Users
    async fn insert_user(&self, user: &User) -> Result<User>;
    async fn find_user_by_id(&self, user_id: &str) -> Result<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;
    /// Sets `hasCompletedProficiencyQuiz` to true. Idempotent; returns false
    /// when the user does not exist.
    async fn mark_proficiency_complete(&self, user_id: &str) -> Result<bool>;

    // Sessions (one active row per user, replaced on login)
    async fn upsert_session(&self, session: &SessionRecord) -> Result<()>;
    async fn find_session(&self, token_hash: &str) -> Result<Option<SessionRecord>>;
    async fn delete_session(&self, token_hash: &str) -> Result<()>;

    // Quiz completions (unique per (userId, difficulty))
    /// Atomic insert-or-overwrite; refreshes `completedAt` on every call.
    async fn upsert_completion(
        &self,
        user_id: &str,
        difficulty: Difficulty,
        score: i32,
    ) -> Result<QuizCompletion>;
    async fn find_completion(
        &self,
        user_id: &str,
        difficulty: Difficulty,
    ) -> Result<Option<QuizCompletion>>;
    /// Fresh query each call, ordered by `completedAt` descending.
    async fn list_completions(&self, user_id: &str) -> Result<Vec<QuizCompletion>>;

    // Word quiz content
    async fn list_questions(&self, difficulty: Difficulty) -> Result<Vec<WordQuestion>>;
}
