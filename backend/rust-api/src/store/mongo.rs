use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime};
use mongodb::options::{FindOneAndUpdateOptions, IndexOptions, ReturnDocument, UpdateOptions};
use mongodb::{Database, IndexModel};

use crate::models::{
    completion::{Difficulty, QuizCompletion},
    question::WordQuestion,
    session::SessionRecord,
    user::User,
};

use super::DataStore;

const USERS: &str = "users";
const SESSIONS: &str = "sessions";
const COMPLETIONS: &str = "quiz_completions";
const QUESTIONS: &str = "word_questions";

/// Production store backed by MongoDB.
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Unique indexes backing the data-model invariants: one user per
    /// email/username, one session per user, one completion per
    /// (user, difficulty). The completion upsert relies on the last one to
    /// stay atomic under concurrent submissions.
    pub async fn ensure_indexes(&self) -> Result<()> {
        let unique = IndexOptions::builder().unique(true).build();

        self.db
            .collection::<User>(USERS)
            .create_indexes(vec![
                IndexModel::builder()
                    .keys(doc! { "email": 1 })
                    .options(unique.clone())
                    .build(),
                IndexModel::builder()
                    .keys(doc! { "username": 1 })
                    .options(unique.clone())
                    .build(),
            ])
            .await
            .context("Failed to create user indexes")?;

        self.db
            .collection::<SessionRecord>(SESSIONS)
            .create_indexes(vec![
                IndexModel::builder()
                    .keys(doc! { "userId": 1 })
                    .options(unique.clone())
                    .build(),
                IndexModel::builder()
                    .keys(doc! { "tokenHash": 1 })
                    .build(),
            ])
            .await
            .context("Failed to create session indexes")?;

        self.db
            .collection::<QuizCompletion>(COMPLETIONS)
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "userId": 1, "difficulty": 1 })
                    .options(unique)
                    .build(),
            )
            .await
            .context("Failed to create completion index")?;

        Ok(())
    }

    fn object_id(user_id: &str) -> Result<ObjectId> {
        ObjectId::parse_str(user_id).context("Invalid user ID format")
    }
}

#[async_trait]
impl DataStore for MongoStore {
    async fn ping(&self) -> Result<()> {
        self.db
            .run_command(doc! { "ping": 1 })
            .await
            .context("MongoDB ping failed")?;
        Ok(())
    }

    async fn insert_user(&self, user: &User) -> Result<User> {
        let collection = self.db.collection::<User>(USERS);
        let result = collection
            .insert_one(user)
            .await
            .context("Failed to insert user")?;

        let id = result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| anyhow!("Failed to get inserted user ID"))?;

        let mut created = user.clone();
        created.id = Some(id);
        Ok(created)
    }

    async fn find_user_by_id(&self, user_id: &str) -> Result<Option<User>> {
        let object_id = Self::object_id(user_id)?;
        self.db
            .collection::<User>(USERS)
            .find_one(doc! { "_id": object_id })
            .await
            .context("Failed to query user by id")
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.db
            .collection::<User>(USERS)
            .find_one(doc! { "email": email })
            .await
            .context("Failed to query user by email")
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.db
            .collection::<User>(USERS)
            .find_one(doc! { "username": username })
            .await
            .context("Failed to query user by username")
    }

    async fn mark_proficiency_complete(&self, user_id: &str) -> Result<bool> {
        let object_id = Self::object_id(user_id)?;
        let result = self
            .db
            .collection::<User>(USERS)
            .update_one(
                doc! { "_id": object_id },
                doc! { "$set": { "hasCompletedProficiencyQuiz": true } },
            )
            .await
            .context("Failed to update proficiency flag")?;
        Ok(result.matched_count > 0)
    }

    async fn upsert_session(&self, session: &SessionRecord) -> Result<()> {
        // One session per user: the upsert replaces any prior row for this
        // userId, which is exactly how logging in elsewhere invalidates the
        // previous grant.
        self.db
            .collection::<SessionRecord>(SESSIONS)
            .update_one(
                doc! { "userId": &session.user_id },
                doc! { "$set": {
                    "tokenHash": &session.token_hash,
                    "createdAt": BsonDateTime::from_millis(session.created_at.timestamp_millis()),
                    "expiresAt": BsonDateTime::from_millis(session.expires_at.timestamp_millis()),
                } },
            )
            .with_options(UpdateOptions::builder().upsert(true).build())
            .await
            .context("Failed to upsert session")?;
        Ok(())
    }

    async fn find_session(&self, token_hash: &str) -> Result<Option<SessionRecord>> {
        self.db
            .collection::<SessionRecord>(SESSIONS)
            .find_one(doc! { "tokenHash": token_hash })
            .await
            .context("Failed to query session")
    }

    async fn delete_session(&self, token_hash: &str) -> Result<()> {
        self.db
            .collection::<SessionRecord>(SESSIONS)
            .delete_one(doc! { "tokenHash": token_hash })
            .await
            .context("Failed to delete session")?;
        Ok(())
    }

    async fn upsert_completion(
        &self,
        user_id: &str,
        difficulty: Difficulty,
        score: i32,
    ) -> Result<QuizCompletion> {
        let now = Utc::now();
        let updated = self
            .db
            .collection::<QuizCompletion>(COMPLETIONS)
            .find_one_and_update(
                doc! { "userId": user_id, "difficulty": difficulty.as_str() },
                doc! { "$set": {
                    "score": score,
                    "completedAt": BsonDateTime::from_millis(now.timestamp_millis()),
                } },
            )
            .with_options(
                FindOneAndUpdateOptions::builder()
                    .upsert(true)
                    .return_document(ReturnDocument::After)
                    .build(),
            )
            .await
            .context("Failed to upsert quiz completion")?;

        updated.ok_or_else(|| anyhow!("Upsert returned no completion document"))
    }

    async fn find_completion(
        &self,
        user_id: &str,
        difficulty: Difficulty,
    ) -> Result<Option<QuizCompletion>> {
        self.db
            .collection::<QuizCompletion>(COMPLETIONS)
            .find_one(doc! { "userId": user_id, "difficulty": difficulty.as_str() })
            .await
            .context("Failed to query quiz completion")
    }

    async fn list_completions(&self, user_id: &str) -> Result<Vec<QuizCompletion>> {
        let mut cursor = self
            .db
            .collection::<QuizCompletion>(COMPLETIONS)
            .find(doc! { "userId": user_id })
            .sort(doc! { "completedAt": -1 })
            .await
            .context("Failed to query quiz completions")?;

        let mut completions = Vec::new();
        while let Some(completion) = cursor
            .try_next()
            .await
            .context("Failed to read quiz completion from cursor")?
        {
            completions.push(completion);
        }
        Ok(completions)
    }

    async fn list_questions(&self, difficulty: Difficulty) -> Result<Vec<WordQuestion>> {
        let mut cursor = self
            .db
            .collection::<WordQuestion>(QUESTIONS)
            .find(doc! { "difficulty": difficulty.as_str() })
            .await
            .context("Failed to query word questions")?;

        let mut questions = Vec::new();
        while let Some(question) = cursor
            .try_next()
            .await
            .context("Failed to read word question from cursor")?
        {
            questions.push(question);
        }
        Ok(questions)
    }
}
