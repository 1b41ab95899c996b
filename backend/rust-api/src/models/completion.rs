use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::bson_datetime_as_chrono;

/// Quiz difficulty tiers, totally ordered for prerequisite checks:
/// INTERMEDIATE requires a BEGINNER completion, ADVANCED an INTERMEDIATE one.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [
        Difficulty::Beginner,
        Difficulty::Intermediate,
        Difficulty::Advanced,
    ];

    /// Stored enum value (canonical uppercase).
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "BEGINNER",
            Difficulty::Intermediate => "INTERMEDIATE",
            Difficulty::Advanced => "ADVANCED",
        }
    }

    /// The immediately lower tier that must be completed first.
    pub fn prerequisite(&self) -> Option<Difficulty> {
        match self {
            Difficulty::Beginner => None,
            Difficulty::Intermediate => Some(Difficulty::Beginner),
            Difficulty::Advanced => Some(Difficulty::Intermediate),
        }
    }
}

impl fmt::Display for Difficulty {
    // Lowercase for user-facing messages and URL segments.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        };
        f.write_str(name)
    }
}

impl FromStr for Difficulty {
    type Err = ();

    // Case-insensitive: clients send "beginner", the store holds "BEGINNER".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "beginner" => Ok(Difficulty::Beginner),
            "intermediate" => Ok(Difficulty::Intermediate),
            "advanced" => Ok(Difficulty::Advanced),
            _ => Err(()),
        }
    }
}

/// One row per (userId, difficulty) in the "quiz_completions" collection.
/// Re-completions overwrite `score` and refresh `completedAt` via upsert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizCompletion {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(rename = "userId")]
    pub user_id: String,
    pub difficulty: Difficulty,
    pub score: i32,
    #[serde(rename = "completedAt", with = "bson_datetime_as_chrono")]
    pub completed_at: DateTime<Utc>,
}

/// Client-facing completion record.
#[derive(Debug, Serialize)]
pub struct CompletionView {
    pub level: &'static str,
    pub score: i32,
    pub completed_at: DateTime<Utc>,
}

impl From<QuizCompletion> for CompletionView {
    fn from(c: QuizCompletion) -> Self {
        CompletionView {
            level: c.difficulty.as_str(),
            score: c.score,
            completed_at: c.completed_at,
        }
    }
}

/// Request body for POST /quiz/achievements/update.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateAchievementsRequest {
    pub level: String,

    #[validate(range(min = 0, max = 100, message = "Score must be between 0 and 100"))]
    pub score: i32,
}

#[derive(Debug, Serialize)]
pub struct UpdateAchievementsResponse {
    pub success: bool,
    pub quiz_completion: CompletionView,
}

#[derive(Debug, Serialize)]
pub struct AchievementsResponse {
    pub success: bool,
    pub completions: Vec<CompletionView>,
    pub status: DifficultyStatus,
}

/// Per-difficulty completion booleans.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct DifficultyStatus {
    pub beginner: bool,
    pub intermediate: bool,
    pub advanced: bool,
}

#[derive(Debug, Serialize)]
pub struct QuizStatusResponse {
    pub has_completed: bool,
}
