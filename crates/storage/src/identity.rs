//! Identity provider contract and an in-process implementation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sie_core::model::{Credentials, User, UserId};
use thiserror::Error;
use uuid::Uuid;

/// Failures reported by an identity provider.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("an account with this email already exists")]
    DuplicateAccount,

    #[error("password rejected by the identity provider")]
    WeakPassword,

    #[error("email address rejected by the identity provider")]
    InvalidEmail,

    #[error("email address not confirmed yet")]
    ConfirmationRequired,

    #[error("identity provider error: {0}")]
    Provider(String),
}

/// Result of a successful sign-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    /// Account created and a session is active.
    SignedIn(User),
    /// Account created; the session starts after the email is confirmed.
    ConfirmationRequired(User),
}

impl SignUpOutcome {
    #[must_use]
    pub fn user(&self) -> &User {
        match self {
            Self::SignedIn(user) | Self::ConfirmationRequired(user) => user,
        }
    }
}

/// Sign up / in / out against an external identity service.
///
/// Implementations hold the current session. Every call is attempted once.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_up(&self, credentials: &Credentials) -> Result<SignUpOutcome, AuthError>;

    async fn sign_in(&self, credentials: &Credentials) -> Result<User, AuthError>;

    /// Drop the local session. Signing out without a session succeeds.
    async fn sign_out(&self) -> Result<(), AuthError>;

    async fn current_user(&self) -> Result<Option<User>, AuthError>;
}

#[derive(Debug, Clone)]
struct Account {
    user: User,
    password: String,
    confirmed: bool,
}

#[derive(Debug, Default)]
struct IdentityState {
    accounts: HashMap<String, Account>,
    session: Option<User>,
}

/// Identity provider kept in process memory, for tests and offline use.
#[derive(Debug, Clone, Default)]
pub struct InMemoryIdentityProvider {
    state: Arc<Mutex<IdentityState>>,
    require_confirmation: bool,
}

impl InMemoryIdentityProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// New accounts must be confirmed with `confirm_email` before signing in.
    #[must_use]
    pub fn requiring_confirmation() -> Self {
        Self {
            require_confirmation: true,
            ..Self::default()
        }
    }

    /// Mark an account's email as confirmed.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for an unknown email.
    pub fn confirm_email(&self, email: &str) -> Result<(), AuthError> {
        let mut state = self.lock()?;
        let account = state
            .accounts
            .get_mut(&email.trim().to_ascii_lowercase())
            .ok_or(AuthError::InvalidCredentials)?;
        account.confirmed = true;
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, IdentityState>, AuthError> {
        self.state
            .lock()
            .map_err(|e| AuthError::Provider(e.to_string()))
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn sign_up(&self, credentials: &Credentials) -> Result<SignUpOutcome, AuthError> {
        let mut state = self.lock()?;
        if state.accounts.contains_key(credentials.email()) {
            return Err(AuthError::DuplicateAccount);
        }

        let user = User {
            id: UserId::new(Uuid::new_v4().to_string()),
            email: credentials.email().to_owned(),
        };
        state.accounts.insert(
            user.email.clone(),
            Account {
                user: user.clone(),
                password: credentials.password().to_owned(),
                confirmed: !self.require_confirmation,
            },
        );

        if self.require_confirmation {
            return Ok(SignUpOutcome::ConfirmationRequired(user));
        }
        state.session = Some(user.clone());
        Ok(SignUpOutcome::SignedIn(user))
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<User, AuthError> {
        let mut state = self.lock()?;
        let account = state
            .accounts
            .get(credentials.email())
            .filter(|a| a.password == credentials.password())
            .ok_or(AuthError::InvalidCredentials)?;
        if !account.confirmed {
            return Err(AuthError::ConfirmationRequired);
        }
        let user = account.user.clone();
        state.session = Some(user.clone());
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.lock()?.session = None;
        Ok(())
    }

    async fn current_user(&self) -> Result<Option<User>, AuthError> {
        Ok(self.lock()?.session.clone())
    }
}
