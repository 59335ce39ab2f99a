use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::constants::ERR_INVALID_USERNAME;
use crate::error::{AppError, Result};
use crate::models::User;
use crate::security::{fingerprint_api_key, generate_api_key};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub status: &'static str,
    pub data: RegisterData,
}

#[derive(Debug, Serialize)]
pub struct RegisterData {
    pub message: &'static str,
    pub api_key: String,
    pub usage_limit: i32,
}

/// Register a new user
///
/// Issues a fresh API key, returned only in this response. The store keeps
/// the key's fingerprint. Returns 400 if the username is already taken.
pub async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>> {
    if !User::validate_username(&payload.username) {
        tracing::warn!("Invalid username: {:?}", payload.username);
        return Err(AppError::InvalidInput(ERR_INVALID_USERNAME.to_string()));
    }

    let api_key = generate_api_key();
    let api_key_hash = fingerprint_api_key(&api_key, &state.config.api_key_pepper);
    let user = User::new(
        payload.username,
        api_key_hash,
        state.config.default_usage_limit,
    );

    state.users.insert_user(&user).await?;

    tracing::info!("New user registered: {}", user.username);

    Ok(Json(RegisterResponse {
        status: "success",
        data: RegisterData {
            message: "User created",
            api_key,
            usage_limit: user.usage_limit,
        },
    }))
}
