use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use super::completion::Difficulty;

/// Vocabulary question stored in the "word_questions" collection. Served to
/// the client verbatim, including the correct option id: answers are
/// evaluated client-side by the quiz session engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordQuestion {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub difficulty: Difficulty,
    pub prompt: String,
    pub options: Vec<AnswerOption>,
    #[serde(rename = "correctOptionId")]
    pub correct_option_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerOption {
    pub id: String,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct WordQuizResponse {
    pub questions: Vec<WordQuestion>,
}
