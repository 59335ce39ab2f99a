use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::constants::API_KEY_HEADERS;
use crate::error::AppError;
use crate::models::User;
use crate::security::fingerprint_api_key;
use crate::AppState;

/// The user owning the API key presented in `x-api-key` or `api-key`
///
/// Rejects with 401 when the header is absent or the key is unknown.
pub struct AuthenticatedUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let api_key = API_KEY_HEADERS
            .iter()
            .find_map(|name| parts.headers.get(*name))
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(AppError::MissingApiKey)?;

        let api_key_hash = fingerprint_api_key(api_key, &state.config.api_key_pepper);

        match state.users.find_by_key_hash(&api_key_hash).await? {
            Some(user) => Ok(AuthenticatedUser(user)),
            None => {
                tracing::warn!("Request with unknown API key");
                Err(AppError::InvalidApiKey)
            }
        }
    }
}
