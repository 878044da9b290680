use axum::Json;
use axum::extract::State;
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Deserialize;
use serde_json::{Value, json};
use time::Duration;
use tracing::info;

use crate::AppState;
use crate::error::ApiError;

pub const SESSION_COOKIE: &str = "admin_session";

/// What a session token resolves to: a user and a role, nothing more.
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub username: String,
    pub role: String,
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(form): Json<LoginForm>,
) -> Result<(CookieJar, Json<Value>), ApiError> {
    let admin = state
        .admin_repo
        .get_by_username(form.username.trim())
        .await?;

    // Verify against the stored hash only; there is no fallback.
    let valid = admin
        .as_ref()
        .map(|a| bcrypt::verify(&form.password, &a.password_hash).unwrap_or(false))
        .unwrap_or(false);

    let Some(admin) = admin.filter(|_| valid) else {
        return Err(ApiError::Unauthorized("invalid username or password"));
    };

    let token = uuid::Uuid::new_v4().to_string();
    info!("Creating session for admin '{}'", admin.username);

    state
        .sessions
        .insert(
            token.clone(),
            AdminSession {
                username: admin.username.clone(),
                role: admin.role.clone(),
            },
            state.config.session_ttl,
        )
        .await;

    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .build();

    Ok((
        jar.add(cookie),
        Json(json!({ "success": true, "username": admin.username, "role": admin.role })),
    ))
}

pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Json<Value>) {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.sessions.remove(cookie.value()).await;
    }

    let mut cookie = Cookie::from(SESSION_COOKIE);
    cookie.set_value("");
    cookie.set_path("/");
    cookie.set_max_age(Duration::seconds(0));

    (jar.add(cookie), Json(json!({ "success": true })))
}
