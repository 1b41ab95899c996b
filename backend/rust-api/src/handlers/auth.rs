use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::sync::Arc;

use crate::error::ApiError;
use crate::extractors::AppJson;
use crate::metrics::{LOGINS_TOTAL, REGISTRATIONS_TOTAL};
use crate::middlewares::auth::JwtService;
use crate::models::{
    session::{LogoutResponse, SESSION_COOKIE},
    user::{LoginRequest, RegisterRequest, RegisterResponse},
};
use crate::services::{auth_service::AuthService, AppState};

fn auth_service(state: &AppState) -> AuthService {
    AuthService::new(
        state.store.clone(),
        JwtService::new(&state.config.jwt_secret),
        state.config.access_token_ttl_seconds,
    )
}

fn session_cookie(state: &AppState, token: String, ttl_seconds: i64) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(state.config.cookie_secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(ttl_seconds))
        .build()
}

fn expired_session_cookie(state: &AppState) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .secure(state.config.cookie_secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::ZERO)
        .build()
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<Response, ApiError> {
    let service = auth_service(&state);

    let user = match service.register(payload).await {
        Ok(user) => user,
        Err(e) => {
            REGISTRATIONS_TOTAL.with_label_values(&["failure"]).inc();
            return Err(e);
        }
    };
    REGISTRATIONS_TOTAL.with_label_values(&["success"]).inc();

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            success: true,
            user,
        }),
    )
        .into_response())
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Response, ApiError> {
    let service = auth_service(&state);

    let outcome = match service.login(payload).await {
        Ok(outcome) => outcome,
        Err(e) => {
            LOGINS_TOTAL.with_label_values(&["failure"]).inc();
            return Err(e);
        }
    };
    LOGINS_TOTAL.with_label_values(&["success"]).inc();

    let jar = jar.add(session_cookie(
        &state,
        outcome.session_token,
        outcome.session_ttl_seconds,
    ));

    Ok((jar, Json(outcome.response)).into_response())
}

/// Cookie-authenticated. Deletes the session row and clears the cookie;
/// a missing cookie is a 401, an unknown or expired one still clears.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Response, ApiError> {
    let token = jar
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or(ApiError::NotAuthenticated)?;

    let service = auth_service(&state);
    service.logout(&token).await?;

    let jar = jar.add(expired_session_cookie(&state));
    Ok((jar, Json(LogoutResponse { success: true })).into_response())
}
