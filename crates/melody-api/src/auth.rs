use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, response::IntoResponse};
use tracing::{error, info, warn};

use melody_types::api::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse, UserSummary};

use crate::error::ApiError;
use crate::{AppState, blocking};

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.username.is_empty() {
        return Err(ApiError::MissingField("username"));
    }
    if req.password.is_empty() {
        return Err(ApiError::MissingField("password"));
    }

    let username = req.username.clone();
    // Existence check and insert are separate statements. Two registrations
    // racing past the check are settled by the UNIQUE index, which also
    // surfaces as a conflict.
    let user_id = blocking(&state, move |db| {
        if db.get_user_by_username(&req.username)?.is_some() {
            return Err(ApiError::Conflict);
        }
        let password_hash = hash_password(&req.password)?;
        Ok(db.create_user(&req.username, &password_hash)?)
    })
    .await
    .inspect_err(|e| {
        if matches!(e, ApiError::Conflict) {
            warn!("Registration rejected, username '{}' taken", username);
        }
    })?;

    info!("Registered user {} ({})", username, user_id);

    Ok(Json(RegisterResponse {
        success: true,
        user: UserSummary {
            id: user_id,
            username,
        },
    }))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    const BAD_CREDENTIALS: &str = "invalid username or password";

    if req.username.is_empty() || req.password.is_empty() {
        return Err(ApiError::Unauthorized(BAD_CREDENTIALS));
    }

    let user = blocking(&state, move |db| {
        let Some(user) = db.get_user_by_username(&req.username)? else {
            return Err(ApiError::Unauthorized(BAD_CREDENTIALS));
        };
        if !verify_password(&req.password, &user.password)? {
            return Err(ApiError::Unauthorized(BAD_CREDENTIALS));
        }
        Ok(user)
    })
    .await?;

    Ok(Json(LoginResponse {
        success: true,
        token: display_token(user.id),
        user: UserSummary {
            id: user.id,
            username: user.username,
        },
    }))
}

/// Opaque value handed back on login. Deterministic in the user id and
/// checked by nothing, so it must not be treated as a credential.
pub fn display_token(user_id: i64) -> String {
    format!("token-{user_id}")
}

/// Hash with Argon2id and a random salt, producing a PHC string.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("Password hashing failed: {}", e);
            ApiError::Internal
        })
}

/// `Ok(false)` on a wrong password; `Err` only when the stored hash is corrupt.
pub fn verify_password(password: &str, stored: &str) -> Result<bool, ApiError> {
    let parsed_hash = PasswordHash::new(stored).map_err(|e| {
        error!("Stored password hash does not parse: {}", e);
        ApiError::Internal
    })?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
