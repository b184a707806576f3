//! Identity provider backed by a hosted GoTrue-style auth REST API.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use sie_core::model::{Credentials, User, UserId};
use storage::{AuthError, IdentityProvider, SignUpOutcome};

use crate::config::BackendConfig;

#[derive(Debug, Clone)]
struct HostedSession {
    user: User,
    access_token: String,
}

pub struct HostedIdentityProvider {
    client: Client,
    config: BackendConfig,
    session: Mutex<Option<HostedSession>>,
}

impl HostedIdentityProvider {
    #[must_use]
    pub fn new(config: BackendConfig) -> Self {
        Self {
            client: Client::new(),
            config,
            session: Mutex::new(None),
        }
    }

    /// Build a client from `SIE_BACKEND_URL` / `SIE_BACKEND_ANON_KEY`.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        BackendConfig::from_env().map(Self::new)
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.client
            .post(self.config.endpoint(path))
            .header("apikey", self.config.anon_key())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Option<HostedSession>>, AuthError> {
        self.session
            .lock()
            .map_err(|e| AuthError::Provider(e.to_string()))
    }

    fn store(&self, session: Option<HostedSession>) -> Result<(), AuthError> {
        *self.lock()? = session;
        Ok(())
    }
}

#[async_trait]
impl IdentityProvider for HostedIdentityProvider {
    async fn sign_up(&self, credentials: &Credentials) -> Result<SignUpOutcome, AuthError> {
        let response = self
            .post("/auth/v1/signup")
            .json(&PasswordRequest::from(credentials))
            .send()
            .await
            .map_err(transport)?;
        let body: SignUpResponse = success_json(response).await?;

        match body {
            SignUpResponse::Session(session) => {
                let user = session.user.clone().into_user(credentials);
                self.store(Some(HostedSession {
                    user: user.clone(),
                    access_token: session.access_token,
                }))?;
                Ok(SignUpOutcome::SignedIn(user))
            }
            SignUpResponse::User(user) => {
                Ok(SignUpOutcome::ConfirmationRequired(user.into_user(credentials)))
            }
        }
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<User, AuthError> {
        let response = self
            .post("/auth/v1/token?grant_type=password")
            .json(&PasswordRequest::from(credentials))
            .send()
            .await
            .map_err(transport)?;
        let session: SessionResponse = success_json(response).await?;

        let user = session.user.into_user(credentials);
        self.store(Some(HostedSession {
            user: user.clone(),
            access_token: session.access_token,
        }))?;
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let session = self.lock()?.take();
        let Some(session) = session else {
            return Ok(());
        };

        let response = self
            .post("/auth/v1/logout")
            .bearer_auth(&session.access_token)
            .send()
            .await
            .map_err(transport)?;

        // An expired token is as good as a revoked one.
        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => Ok(()),
            status => Err(error_from_response(status, response).await),
        }
    }

    async fn current_user(&self) -> Result<Option<User>, AuthError> {
        let session = self.lock()?.clone();
        let Some(session) = session else {
            return Ok(None);
        };

        let response = self
            .client
            .get(self.config.endpoint("/auth/v1/user"))
            .header("apikey", self.config.anon_key())
            .bearer_auth(&session.access_token)
            .send()
            .await
            .map_err(transport)?;

        if response.status() == StatusCode::UNAUTHORIZED {
            tracing::debug!(user_id = %session.user.id, "session expired");
            self.store(None)?;
            return Ok(None);
        }
        let user: ApiUser = success_json(response).await?;
        Ok(Some(User {
            id: UserId::new(user.id),
            email: user.email.unwrap_or(session.user.email),
        }))
    }
}

//
// ─── WIRE TYPES ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Serialize)]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
}

impl<'a> From<&'a Credentials> for PasswordRequest<'a> {
    fn from(credentials: &'a Credentials) -> Self {
        Self {
            email: credentials.email(),
            password: credentials.password(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ApiUser {
    id: String,
    email: Option<String>,
}

impl ApiUser {
    fn into_user(self, credentials: &Credentials) -> User {
        User {
            id: UserId::new(self.id),
            email: self
                .email
                .unwrap_or_else(|| credentials.email().to_owned()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    access_token: String,
    user: ApiUser,
}

/// Sign-up returns a session when no confirmation is needed, the bare user
/// otherwise.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(SessionResponse),
    User(ApiUser),
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    error_code: Option<String>,
    error: Option<String>,
    msg: Option<String>,
    message: Option<String>,
    error_description: Option<String>,
}

impl ErrorBody {
    fn text(&self) -> &str {
        self.msg
            .as_deref()
            .or(self.message.as_deref())
            .or(self.error_description.as_deref())
            .or(self.error.as_deref())
            .unwrap_or("")
    }
}

fn transport(err: reqwest::Error) -> AuthError {
    AuthError::Provider(err.to_string())
}

async fn success_json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, AuthError> {
    let status = response.status();
    if !status.is_success() {
        return Err(error_from_response(status, response).await);
    }
    response.json().await.map_err(transport)
}

async fn error_from_response(status: StatusCode, response: Response) -> AuthError {
    let body = response.json::<ErrorBody>().await.unwrap_or_default();
    map_error(status, &body)
}

fn map_error(status: StatusCode, body: &ErrorBody) -> AuthError {
    let code = body.error_code.as_deref().unwrap_or("");
    let text = body.text().to_ascii_lowercase();

    match code {
        "user_already_exists" | "email_exists" => return AuthError::DuplicateAccount,
        "weak_password" => return AuthError::WeakPassword,
        "email_address_invalid" => return AuthError::InvalidEmail,
        "email_not_confirmed" => return AuthError::ConfirmationRequired,
        "invalid_credentials" => return AuthError::InvalidCredentials,
        _ => {}
    }

    if text.contains("already registered") {
        AuthError::DuplicateAccount
    } else if text.contains("not confirmed") {
        AuthError::ConfirmationRequired
    } else if text.contains("invalid login credentials")
        || body.error.as_deref() == Some("invalid_grant")
    {
        AuthError::InvalidCredentials
    } else if text.contains("password") && status == StatusCode::UNPROCESSABLE_ENTITY {
        AuthError::WeakPassword
    } else {
        AuthError::Provider(format!("{status}: {}", body.text()))
    }
}
