// SPDX-FileCopyrightText: 2026 Keyfold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session middleware for the gateway.
//!
//! Accepts the token from `Authorization: Bearer <token>` or a `session`
//! cookie (header checked first). The token resolves through the cache to a
//! user id, which must still name a live user row. All failures collapse to
//! one 401 body -- the middleware never reveals whether a token was unknown,
//! expired, or orphaned.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use tracing::debug;

use keyfold_core::KeyMaterialStore;

use crate::handlers::ErrorResponse;
use crate::server::GatewayState;

/// The authenticated user id, inserted into request extensions by
/// [`session_middleware`].
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub i64);

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "session";

pub async fn session_middleware(
    State(state): State<GatewayState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = extract_token(&request) else {
        debug!("request carried no session token");
        return unauthorized();
    };

    let user_id = match keyfold_session::resolve(state.cache.as_ref(), &token).await {
        Ok(user_id) => user_id,
        Err(err) => {
            debug!(error = %err, "session token did not resolve");
            return unauthorized();
        }
    };

    // The session may outlive the user row; confirm it still exists.
    match state.store.get_user(user_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            debug!(user_id, "session resolved to a deleted user");
            return unauthorized();
        }
        Err(err) => {
            tracing::error!(error = %err, "user lookup failed during auth");
            return unauthorized();
        }
    }

    request.extensions_mut().insert(AuthUser(user_id));
    next.run(request).await
}

/// Pull the token from the Authorization header or the session cookie.
fn extract_token(request: &Request) -> Option<String> {
    if let Some(bearer) = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        && !bearer.is_empty()
    {
        return Some(bearer.to_string());
    }

    request
        .headers()
        .get("cookie")
        .and_then(|v| v.to_str().ok())
        .and_then(|cookies| {
            cookies.split(';').find_map(|pair| {
                let (name, value) = pair.trim().split_once('=')?;
                (name == SESSION_COOKIE && !value.is_empty()).then(|| value.to_string())
            })
        })
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            error: "unauthorized".to_string(),
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request_with_headers(headers: &[(&str, &str)]) -> Request {
        let mut builder = axum::http::Request::builder().uri("/v1/secrets");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn bearer_token_is_extracted() {
        let request = request_with_headers(&[("authorization", "Bearer abc123")]);
        assert_eq!(extract_token(&request), Some("abc123".to_string()));
    }

    #[test]
    fn session_cookie_is_extracted() {
        let request = request_with_headers(&[("cookie", "theme=dark; session=tok456")]);
        assert_eq!(extract_token(&request), Some("tok456".to_string()));
    }

    #[test]
    fn header_takes_precedence_over_cookie() {
        let request = request_with_headers(&[
            ("authorization", "Bearer header-token"),
            ("cookie", "session=cookie-token"),
        ]);
        assert_eq!(extract_token(&request), Some("header-token".to_string()));
    }

    #[test]
    fn missing_and_empty_tokens_are_none() {
        assert_eq!(extract_token(&request_with_headers(&[])), None);
        let request = request_with_headers(&[("cookie", "session=")]);
        assert_eq!(extract_token(&request), None);
        let request = request_with_headers(&[("authorization", "Basic dXNlcg==")]);
        assert_eq!(extract_token(&request), None);
    }
}
