// SPDX-FileCopyrightText: 2026 Keyfold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the vault REST API.
//!
//! Error mapping collapses both cryptographic failure kinds into one 401
//! "authentication failed" body, so the wire gives no oracle between "wrong
//! key" and "corrupted data". Internal failures are logged server-side and
//! surface as a generic 500.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use keyfold_core::{KeyfoldError, SecretMeta};
use keyfold_engine::Key2;

use crate::auth::AuthUser;
use crate::server::GatewayState;

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// A transport-mapped error: HTTP status plus a sanitized message.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.to_string(),
        }
    }
}

impl From<KeyfoldError> for ApiError {
    fn from(err: KeyfoldError) -> Self {
        let (status, message) = match &err {
            KeyfoldError::DuplicateName(_) => (StatusCode::CONFLICT, err.to_string()),
            KeyfoldError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
            e if e.is_auth_failure() => {
                (StatusCode::UNAUTHORIZED, "authentication failed".to_string())
            }
            KeyfoldError::Unauthenticated => {
                (StatusCode::UNAUTHORIZED, "unauthorized".to_string())
            }
            _ => {
                tracing::error!(error = %err, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
        };
        Self { status, message }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

/// Request body for POST /v1/accounts.
#[derive(Serialize, Deserialize)]
pub struct CreateAccountRequest {
    pub name: String,
    pub master_password: String,
}

/// Response body for POST /v1/accounts.
#[derive(Serialize, Deserialize)]
pub struct CreateAccountResponse {
    pub user_id: i64,
    pub session_code: String,
    pub code: String,
    pub token: String,
}

/// Request body for POST /v1/sessions.
#[derive(Serialize, Deserialize)]
pub struct LoginRequest {
    pub user_id: i64,
    pub session_code: String,
    pub code: String,
}

/// Response body for POST /v1/sessions.
#[derive(Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Request body for POST /v1/secrets.
#[derive(Serialize, Deserialize)]
pub struct SaveSecretRequest {
    pub name: String,
    pub value: String,
    pub session_code: String,
    pub code: String,
}

/// Response body for POST /v1/secrets.
#[derive(Debug, Serialize, Deserialize)]
pub struct SaveSecretResponse {
    pub secret_id: i64,
}

/// Request body for POST /v1/secrets/retrieve.
#[derive(Serialize, Deserialize)]
pub struct RetrieveSecretRequest {
    pub name: String,
    pub session_code: String,
    pub code: String,
}

/// Response body for POST /v1/secrets/retrieve.
#[derive(Serialize, Deserialize)]
pub struct RetrieveSecretResponse {
    pub value: String,
}

/// Response body for GET /v1/secrets.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListSecretsResponse {
    pub secrets: Vec<SecretMeta>,
}

/// Response body for GET /health.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// POST /v1/accounts
///
/// Enroll a user and issue a session token. The `code` field appears in this
/// response and nowhere else, ever.
pub async fn create_account(
    State(state): State<GatewayState>,
    Json(body): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<CreateAccountResponse>), ApiError> {
    if body.name.is_empty() || body.master_password.is_empty() {
        return Err(ApiError::bad_request("name and master_password are required"));
    }

    let master_password = SecretString::from(body.master_password);
    let enrollment = state.engine.create_user(&body.name, &master_password).await?;
    let token = keyfold_session::issue(
        state.cache.as_ref(),
        enrollment.user_id,
        state.session_ttl,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateAccountResponse {
            user_id: enrollment.user_id,
            session_code: enrollment.session_code,
            code: enrollment.code,
            token,
        }),
    ))
}

/// POST /v1/sessions
///
/// Login: verify the key2 fragments against the stored verifier and issue a
/// fresh session token.
pub async fn login(
    State(state): State<GatewayState>,
    Json(body): Json<LoginRequest>,
) -> Result<(StatusCode, Json<LoginResponse>), ApiError> {
    state
        .engine
        .verify_fragments(body.user_id, &body.session_code, &body.code)
        .await?;
    let token =
        keyfold_session::issue(state.cache.as_ref(), body.user_id, state.session_ttl).await?;

    Ok((StatusCode::CREATED, Json(LoginResponse { token })))
}

/// POST /v1/secrets
pub async fn save_secret(
    State(state): State<GatewayState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<SaveSecretRequest>,
) -> Result<(StatusCode, Json<SaveSecretResponse>), ApiError> {
    if body.name.is_empty() {
        return Err(ApiError::bad_request("name is required"));
    }

    let key2 = Key2::from_fragments(&body.session_code, &body.code)?;
    let secret_id = state
        .engine
        .save_secret(user.0, &body.name, &key2, body.value.as_bytes())
        .await?;

    Ok((StatusCode::CREATED, Json(SaveSecretResponse { secret_id })))
}

/// POST /v1/secrets/retrieve
pub async fn retrieve_secret(
    State(state): State<GatewayState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<RetrieveSecretRequest>,
) -> Result<Json<RetrieveSecretResponse>, ApiError> {
    let key2 = Key2::from_fragments(&body.session_code, &body.code)?;
    let plaintext = state
        .engine
        .retrieve_secret(user.0, &body.name, &key2)
        .await?;
    let value = String::from_utf8(plaintext)
        .map_err(|_| KeyfoldError::Internal("stored value is not valid UTF-8".to_string()))?;

    Ok(Json(RetrieveSecretResponse { value }))
}

/// GET /v1/secrets
pub async fn list_secrets(
    State(state): State<GatewayState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ListSecretsResponse>, ApiError> {
    let secrets = state.engine.list_secrets(user.0).await?;
    Ok(Json(ListSecretsResponse { secrets }))
}

/// GET /health (public)
pub async fn get_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
