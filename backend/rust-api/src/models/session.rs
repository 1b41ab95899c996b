use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use super::bson_datetime_as_chrono;

/// Name of the httpOnly cookie carrying the opaque session id.
pub const SESSION_COOKIE: &str = "session_id";

/// Login grant stored in the "sessions" collection. Only the SHA-256 hash of
/// the opaque cookie value is persisted; the raw id never touches the store.
/// A unique index on `userId` plus upsert-on-login keeps at most one active
/// session per user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(rename = "tokenHash")]
    pub token_hash: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "createdAt", with = "bson_datetime_as_chrono")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "expiresAt", with = "bson_datetime_as_chrono")]
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}
