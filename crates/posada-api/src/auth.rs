use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use posada_db::Database;
use posada_types::api::{
    LoginRequest, LoginResponse, RegisterRequest, RegisterResponse, UpdateProfileRequest,
};

use crate::convert::user_from_row;
use crate::error::ApiError;
use crate::middleware::Claims;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // Validate input
    if req.username.len() < 3 || req.username.len() > 32 {
        return Err(ApiError::BadRequest(
            "username must be between 3 and 32 characters".into(),
        ));
    }
    if req.password.len() < 8 {
        return Err(ApiError::BadRequest(
            "password must be at least 8 characters".into(),
        ));
    }

    let password_hash = hash_password(&req.password)?;
    let user_id = Uuid::new_v4();

    // Uniqueness rides on the username index; a losing race still comes
    // back as Duplicate.
    let db = state.clone();
    let uid = user_id.to_string();
    let username = req.username.clone();
    let email = req.email.clone();
    tokio::task::spawn_blocking(move || {
        db.db.create_user(&uid, &username, email.as_deref(), &password_hash)
    })
    .await
    .map_err(ApiError::internal)??;

    let token = create_token(&state.jwt_secret, user_id, &req.username, false)
        .map_err(ApiError::internal)?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse { user_id, token }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let username = req.username.clone();
    let user = tokio::task::spawn_blocking(move || db.db.get_user_by_username(&username))
        .await
        .map_err(ApiError::internal)??
        .ok_or(ApiError::Unauthorized)?;

    // Verify password
    let parsed_hash = PasswordHash::new(&user.password).map_err(ApiError::internal)?;
    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::Unauthorized)?;

    let user_id: Uuid = user.id.parse().map_err(ApiError::internal)?;

    let token = create_token(&state.jwt_secret, user_id, &user.username, user.admin)
        .map_err(ApiError::internal)?;

    Ok(Json(LoginResponse {
        user_id,
        username: user.username,
        admin: user.admin,
        token,
    }))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let uid = claims.sub.to_string();
    let user = tokio::task::spawn_blocking(move || db.db.get_user_by_id(&uid))
        .await
        .map_err(ApiError::internal)??
        .ok_or_else(|| ApiError::not_found(format!("user {} not found", claims.sub)))?;

    Ok(Json(user_from_row(user)))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let uid = claims.sub.to_string();
    let user = tokio::task::spawn_blocking(move || db.db.get_user_by_id(&uid))
        .await
        .map_err(ApiError::internal)??
        .ok_or_else(|| ApiError::not_found(format!("user {} not found", claims.sub)))?;

    // Changing the password requires proving the current one
    let password_hash = match &req.new_password {
        Some(new_password) => {
            let current = req
                .current_password
                .as_deref()
                .ok_or_else(|| ApiError::BadRequest("current password is required".into()))?;

            let parsed_hash = PasswordHash::new(&user.password).map_err(ApiError::internal)?;
            Argon2::default()
                .verify_password(current.as_bytes(), &parsed_hash)
                .map_err(|_| ApiError::BadRequest("current password is incorrect".into()))?;

            if new_password.len() < 8 {
                return Err(ApiError::BadRequest(
                    "password must be at least 8 characters".into(),
                ));
            }
            hash_password(new_password)?
        }
        None => user.password.clone(),
    };

    let username = match &req.username {
        Some(name) if *name != user.username => {
            if name.len() < 3 || name.len() > 32 {
                return Err(ApiError::BadRequest(
                    "username must be between 3 and 32 characters".into(),
                ));
            }
            name.clone()
        }
        _ => user.username.clone(),
    };

    let email = req.email.clone().or_else(|| user.email.clone());
    if let Some(new_email) = &email {
        if Some(new_email) != user.email.as_ref() {
            let db = state.clone();
            let check_email = new_email.clone();
            let uid = claims.sub.to_string();
            let taken =
                tokio::task::spawn_blocking(move || db.db.email_taken_by_other(&check_email, &uid))
                    .await
                    .map_err(ApiError::internal)??;
            if taken {
                return Err(ApiError::BadRequest("email is already in use".into()));
            }
        }
    }

    let db = state.clone();
    let uid = claims.sub.to_string();
    let new_username = username.clone();
    tokio::task::spawn_blocking(move || {
        db.db.update_user(&uid, &new_username, email.as_deref(), &password_hash)
    })
    .await
    .map_err(ApiError::internal)??;

    Ok(Json(serde_json::json!({ "detail": "profile updated" })))
}

/// Startup hook: create or promote the configured admin account.
pub fn bootstrap_admin(db: &Database, username: &str, password: &str) -> anyhow::Result<()> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hash failed: {}", e))?
        .to_string();

    db.ensure_admin(&Uuid::new_v4().to_string(), username, &hash)?;
    Ok(())
}

fn hash_password(password: &str) -> Result<String, ApiError> {
    // Hash with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    Ok(argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(ApiError::internal)?
        .to_string())
}

fn create_token(secret: &str, user_id: Uuid, username: &str, admin: bool) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        admin,
        exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}
