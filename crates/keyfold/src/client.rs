// SPDX-FileCopyrightText: 2026 Keyfold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! CLI client: talks to a running vault server over its REST API.
//!
//! The master password and the 5-digit code are always read through hidden
//! prompts and never echoed or persisted. The session-code fragment lands in
//! the credentials file (that is its purpose); the code never does.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use keyfold_config::KeyfoldConfig;
use keyfold_gateway::handlers::{
    CreateAccountRequest, CreateAccountResponse, ErrorResponse, ListSecretsResponse,
    LoginRequest, LoginResponse, RetrieveSecretRequest, RetrieveSecretResponse,
    SaveSecretRequest, SaveSecretResponse,
};

use crate::creds::{self, Credentials};

/// Client-side errors: transport failures, server rejections, local state.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Server(String),

    #[error("session expired or revoked; run `keyfold login`")]
    SessionExpired,

    #[error("{0}")]
    Credentials(String),

    #[error("{0}")]
    Prompt(String),
}

struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    fn new(config: &KeyfoldConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.client.server_url.trim_end_matches('/').to_string(),
        }
    }

    async fn post<T: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&str>,
        body: &T,
    ) -> Result<R, ClientError> {
        let mut request = self.http.post(format!("{}{path}", self.base_url)).json(body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        Self::read_response(request.send().await?).await
    }

    async fn get<R: DeserializeOwned>(&self, path: &str, token: &str) -> Result<R, ClientError> {
        let response = self
            .http
            .get(format!("{}{path}", self.base_url))
            .bearer_auth(token)
            .send()
            .await?;
        Self::read_response(response).await
    }

    async fn read_response<R: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<R, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let message = response
            .json::<ErrorResponse>()
            .await
            .map(|e| e.error)
            .unwrap_or_else(|_| format!("server returned {status}"));
        if status == reqwest::StatusCode::UNAUTHORIZED && message == "unauthorized" {
            return Err(ClientError::SessionExpired);
        }
        Err(ClientError::Server(message))
    }
}

pub async fn signup(config: &KeyfoldConfig) -> Result<(), ClientError> {
    let name = prompt_line("Account name: ")?;
    let password = prompt_password("Master password: ")?;
    let confirm = prompt_password("Confirm master password: ")?;
    if password != confirm {
        return Err(ClientError::Prompt("passwords do not match".to_string()));
    }

    let api = ApiClient::new(config);
    let response: CreateAccountResponse = api
        .post(
            "/v1/accounts",
            None,
            &CreateAccountRequest {
                name,
                master_password: password,
            },
        )
        .await?;

    creds::save(&Credentials {
        user_id: response.user_id,
        token: response.token,
        session_code: response.session_code,
    })?;

    println!("Account created (user id {}).", response.user_id);
    println!();
    println!("    Your code is: {}", response.code);
    println!();
    println!("Memorize it. It is required for every secret operation and");
    println!("will never be shown again.");
    Ok(())
}

pub async fn login(config: &KeyfoldConfig) -> Result<(), ClientError> {
    let mut credentials = creds::load()?;
    let code = prompt_password("Code: ")?;

    let api = ApiClient::new(config);
    let response: LoginResponse = api
        .post(
            "/v1/sessions",
            None,
            &LoginRequest {
                user_id: credentials.user_id,
                session_code: credentials.session_code.clone(),
                code,
            },
        )
        .await?;

    credentials.token = response.token;
    creds::save(&credentials)?;
    println!("Session refreshed.");
    Ok(())
}

pub async fn set_secret(config: &KeyfoldConfig, name: &str) -> Result<(), ClientError> {
    let credentials = creds::load()?;
    let value = prompt_password("Secret value: ")?;
    let code = prompt_password("Code: ")?;

    let api = ApiClient::new(config);
    let response: SaveSecretResponse = api
        .post(
            "/v1/secrets",
            Some(&credentials.token),
            &SaveSecretRequest {
                name: name.to_string(),
                value,
                session_code: credentials.session_code.clone(),
                code,
            },
        )
        .await?;

    println!("Secret \"{name}\" stored (id {}).", response.secret_id);
    Ok(())
}

pub async fn get_secret(config: &KeyfoldConfig, name: &str) -> Result<(), ClientError> {
    let credentials = creds::load()?;
    let code = prompt_password("Code: ")?;

    let api = ApiClient::new(config);
    let response: RetrieveSecretResponse = api
        .post(
            "/v1/secrets/retrieve",
            Some(&credentials.token),
            &RetrieveSecretRequest {
                name: name.to_string(),
                session_code: credentials.session_code.clone(),
                code,
            },
        )
        .await?;

    println!("{}", response.value);
    Ok(())
}

pub async fn list_secrets(config: &KeyfoldConfig) -> Result<(), ClientError> {
    let credentials = creds::load()?;

    let api = ApiClient::new(config);
    let response: ListSecretsResponse = api.get("/v1/secrets", &credentials.token).await?;

    if response.secrets.is_empty() {
        println!("No secrets stored.");
        return Ok(());
    }
    for secret in response.secrets {
        println!("{}\t{}", secret.name, secret.created_at);
    }
    Ok(())
}

pub fn whoami() -> Result<(), ClientError> {
    let credentials = creds::load()?;
    println!("user id: {}", credentials.user_id);
    println!("session token: present");
    println!("session code: present ({} chars)", credentials.session_code.len());
    Ok(())
}

fn prompt_line(prompt: &str) -> Result<String, ClientError> {
    use std::io::Write;

    eprint!("{prompt}");
    std::io::stderr()
        .flush()
        .map_err(|e| ClientError::Prompt(e.to_string()))?;

    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .map_err(|e| ClientError::Prompt(e.to_string()))?;
    let trimmed = line.trim().to_string();
    if trimmed.is_empty() {
        return Err(ClientError::Prompt("input must not be empty".to_string()));
    }
    Ok(trimmed)
}

fn prompt_password(prompt: &str) -> Result<String, ClientError> {
    let value = rpassword::prompt_password(prompt)
        .map_err(|e| ClientError::Prompt(format!("failed to read input: {e}")))?;
    if value.is_empty() {
        return Err(ClientError::Prompt("input must not be empty".to_string()));
    }
    Ok(value)
}
