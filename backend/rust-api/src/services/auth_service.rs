use std::sync::Arc;

use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiError;
use crate::middlewares::auth::{JwtClaims, JwtService};
use crate::models::{
    session::SessionRecord,
    user::{LoginRequest, LoginResponse, RegisterRequest, User, UserProfile, USERNAME_RE},
};
use crate::store::DataStore;

const SESSION_TTL_SHORT_SECONDS: i64 = 3600; // 1 hour
const SESSION_TTL_LONG_SECONDS: i64 = 2_592_000; // 30 days

/// Credentials issued by a successful login: the JSON body plus the opaque
/// session id (cookie value) and its lifetime.
pub struct LoginOutcome {
    pub response: LoginResponse,
    pub session_token: String,
    pub session_ttl_seconds: i64,
}

pub struct AuthService {
    store: Arc<dyn DataStore>,
    jwt_service: JwtService,
    access_token_ttl_seconds: i64,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn DataStore>,
        jwt_service: JwtService,
        access_token_ttl_seconds: i64,
    ) -> Self {
        Self {
            store,
            jwt_service,
            access_token_ttl_seconds,
        }
    }

    pub fn hash_password(&self, password: &str) -> Result<String, ApiError> {
        hash(password, DEFAULT_COST)
            .map_err(|e| ApiError::Storage(anyhow::anyhow!("Failed to hash password: {}", e)))
    }

    pub fn verify_password(&self, password: &str, password_hash: &str) -> Result<bool, ApiError> {
        verify(password, password_hash)
            .map_err(|e| ApiError::Storage(anyhow::anyhow!("Failed to verify password: {}", e)))
    }

    /// SHA-256 hex of an opaque session id; only the hash is persisted.
    fn hash_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        hex::encode(hasher.finalize())
    }

    pub async fn register(&self, req: RegisterRequest) -> Result<UserProfile, ApiError> {
        req.validate()
            .map_err(|e| ApiError::Validation(format!("Validation error: {}", e)))?;
        if !USERNAME_RE.is_match(&req.username) {
            return Err(ApiError::Validation(
                "Username may only contain letters, digits and underscores".to_string(),
            ));
        }

        if self.store.find_user_by_email(&req.email).await?.is_some() {
            return Err(ApiError::Conflict(
                "User with this email already exists".to_string(),
            ));
        }
        if self
            .store
            .find_user_by_username(&req.username)
            .await?
            .is_some()
        {
            return Err(ApiError::Conflict(
                "User with this username already exists".to_string(),
            ));
        }

        let user = User {
            id: None,
            email: req.email,
            username: req.username,
            password_hash: self.hash_password(&req.password)?,
            created_at: Utc::now(),
            has_completed_proficiency_quiz: false,
        };

        let created = self.store.insert_user(&user).await?;

        tracing::info!(email = %created.email, "User registered");
        Ok(UserProfile::from(created))
    }

    pub async fn login(&self, req: LoginRequest) -> Result<LoginOutcome, ApiError> {
        req.validate()
            .map_err(|e| ApiError::Validation(format!("Validation error: {}", e)))?;

        let user = self
            .store
            .find_user_by_email(&req.email)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))?;

        if !self.verify_password(&req.password, &user.password_hash)? {
            tracing::warn!(email = %req.email, "Failed login attempt: invalid password");
            return Err(ApiError::Unauthorized(
                "Invalid email or password".to_string(),
            ));
        }

        let user_id = user
            .id
            .map(|id| id.to_hex())
            .ok_or_else(|| ApiError::Storage(anyhow::anyhow!("User ID not found")))?;

        let session_ttl_seconds = if req.keep_logged_in {
            SESSION_TTL_LONG_SECONDS
        } else {
            SESSION_TTL_SHORT_SECONDS
        };
        let session_token = self
            .create_session(&user_id, session_ttl_seconds)
            .await?;

        let access_token = self.generate_access_token(&user_id, &user.email)?;

        tracing::info!(user_id = %user_id, email = %user.email, "Successful login");

        Ok(LoginOutcome {
            response: LoginResponse {
                access_token,
                user: UserProfile::from(user),
            },
            session_token,
            session_ttl_seconds,
        })
    }

    /// Creates the single active session for this user. The opaque id goes
    /// into the cookie; the store holds only its hash. Upsert-by-user
    /// replaces any previous session.
    async fn create_session(&self, user_id: &str, ttl_seconds: i64) -> Result<String, ApiError> {
        let token = Uuid::new_v4().to_string();
        let now = Utc::now();

        let session = SessionRecord {
            id: None,
            token_hash: Self::hash_token(&token),
            user_id: user_id.to_string(),
            created_at: now,
            expires_at: now + Duration::seconds(ttl_seconds),
        };
        self.store.upsert_session(&session).await?;

        Ok(token)
    }

    /// Cookie-path session validation. Read-only: expiry does not delete
    /// the row, it only refuses the request.
    pub async fn authenticate_session(&self, session_token: &str) -> Result<User, ApiError> {
        let session = self
            .store
            .find_session(&Self::hash_token(session_token))
            .await?
            .ok_or(ApiError::NotAuthenticated)?;

        if session.is_expired(Utc::now()) {
            return Err(ApiError::SessionExpired);
        }

        self.store
            .find_user_by_id(&session.user_id)
            .await?
            .ok_or(ApiError::NotFound("User"))
    }

    pub async fn logout(&self, session_token: &str) -> Result<(), ApiError> {
        self.store
            .delete_session(&Self::hash_token(session_token))
            .await?;
        Ok(())
    }

    fn generate_access_token(&self, user_id: &str, email: &str) -> Result<String, ApiError> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.access_token_ttl_seconds);

        let claims = JwtClaims {
            sub: user_id.to_string(),
            email: email.to_string(),
            exp: exp.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        self.jwt_service
            .generate_token(claims)
            .map_err(|e| ApiError::Storage(anyhow::anyhow!("Failed to generate token: {}", e)))
    }
}
