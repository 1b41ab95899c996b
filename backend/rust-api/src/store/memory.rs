use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use mongodb::bson::oid::ObjectId;

use crate::models::{
    completion::{Difficulty, QuizCompletion},
    question::WordQuestion,
    session::SessionRecord,
    user::User,
};

use super::DataStore;

#[derive(Default)]
struct Inner {
    users: HashMap<String, User>,
    /// token_hash -> session (at most one row per user, enforced on upsert)
    sessions: HashMap<String, SessionRecord>,
    completions: HashMap<(String, Difficulty), QuizCompletion>,
    questions: Vec<WordQuestion>,
}

/// In-memory store used by the integration test suite and local development.
/// Mirrors the MongoDB semantics the handlers depend on: upsert-per-user
/// sessions, one completion per (user, difficulty), descending list order.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Test/dev helper: load word-quiz content.
    pub fn seed_questions(&self, questions: Vec<WordQuestion>) {
        self.write().questions.extend(questions);
    }
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn insert_user(&self, user: &User) -> Result<User> {
        let mut created = user.clone();
        let id = created.id.get_or_insert_with(ObjectId::new).to_hex();
        self.write().users.insert(id, created.clone());
        Ok(created)
    }

    async fn find_user_by_id(&self, user_id: &str) -> Result<Option<User>> {
        Ok(self.read().users.get(user_id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .read()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .read()
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn mark_proficiency_complete(&self, user_id: &str) -> Result<bool> {
        let mut inner = self.write();
        match inner.users.get_mut(user_id) {
            Some(user) => {
                user.has_completed_proficiency_quiz = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn upsert_session(&self, session: &SessionRecord) -> Result<()> {
        let mut inner = self.write();
        // Replace any prior session row for this user.
        inner.sessions.retain(|_, s| s.user_id != session.user_id);
        inner
            .sessions
            .insert(session.token_hash.clone(), session.clone());
        Ok(())
    }

    async fn find_session(&self, token_hash: &str) -> Result<Option<SessionRecord>> {
        Ok(self.read().sessions.get(token_hash).cloned())
    }

    async fn delete_session(&self, token_hash: &str) -> Result<()> {
        self.write().sessions.remove(token_hash);
        Ok(())
    }

    async fn upsert_completion(
        &self,
        user_id: &str,
        difficulty: Difficulty,
        score: i32,
    ) -> Result<QuizCompletion> {
        let mut inner = self.write();
        let completion = inner
            .completions
            .entry((user_id.to_string(), difficulty))
            .and_modify(|c| {
                c.score = score;
                c.completed_at = Utc::now();
            })
            .or_insert_with(|| QuizCompletion {
                id: Some(ObjectId::new()),
                user_id: user_id.to_string(),
                difficulty,
                score,
                completed_at: Utc::now(),
            });
        Ok(completion.clone())
    }

    async fn find_completion(
        &self,
        user_id: &str,
        difficulty: Difficulty,
    ) -> Result<Option<QuizCompletion>> {
        Ok(self
            .read()
            .completions
            .get(&(user_id.to_string(), difficulty))
            .cloned())
    }

    async fn list_completions(&self, user_id: &str) -> Result<Vec<QuizCompletion>> {
        let mut completions: Vec<QuizCompletion> = self
            .read()
            .completions
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        completions.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        Ok(completions)
    }

    async fn list_questions(&self, difficulty: Difficulty) -> Result<Vec<WordQuestion>> {
        Ok(self
            .read()
            .questions
            .iter()
            .filter(|q| q.difficulty == difficulty)
            .cloned()
            .collect())
    }
}
