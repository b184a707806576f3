use std::sync::Arc;

use sie_core::model::{Credentials, User};
use storage::{IdentityProvider, SignUpOutcome};

use crate::error::ServiceError;

/// Sign-up, sign-in and sign-out on top of an identity provider.
///
/// Form input is validated locally before any provider call, so a
/// `ServiceError::Validation` always means nothing was sent.
#[derive(Clone)]
pub struct SessionManager {
    provider: Arc<dyn IdentityProvider>,
}

impl SessionManager {
    #[must_use]
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self { provider }
    }

    /// Register a new account.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for bad form input and
    /// `ServiceError::Auth` when the provider rejects the request.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, ServiceError> {
        let credentials = Credentials::new(email, password)?;
        let outcome = self.provider.sign_up(&credentials).await?;
        match &outcome {
            SignUpOutcome::SignedIn(user) => {
                tracing::info!(user_id = %user.id, "signed up");
            }
            SignUpOutcome::ConfirmationRequired(user) => {
                tracing::info!(user_id = %user.id, "signed up, waiting for email confirmation");
            }
        }
        Ok(outcome)
    }

    /// Start a session for an existing account.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for bad form input and
    /// `ServiceError::Auth` when the provider rejects the credentials.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<User, ServiceError> {
        let credentials = Credentials::new(email, password)?;
        let user = self.provider.sign_in(&credentials).await?;
        tracing::info!(user_id = %user.id, "signed in");
        Ok(user)
    }

    /// End the current session. Calling this while signed out succeeds.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Auth` if the provider call fails.
    pub async fn sign_out(&self) -> Result<(), ServiceError> {
        self.provider.sign_out().await?;
        tracing::debug!("signed out");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `ServiceError::Auth` if the provider cannot be reached.
    pub async fn current_user(&self) -> Result<Option<User>, ServiceError> {
        Ok(self.provider.current_user().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sie_core::model::ValidationError;
    use storage::{AuthError, InMemoryIdentityProvider};

    fn manager(provider: InMemoryIdentityProvider) -> SessionManager {
        SessionManager::new(Arc::new(provider))
    }

    #[tokio::test]
    async fn sign_up_then_sign_in_round_trip() {
        let manager = manager(InMemoryIdentityProvider::new());
        let outcome = manager.sign_up("Learner@Example.com", "secret1").await.unwrap();
        assert!(matches!(outcome, SignUpOutcome::SignedIn(_)));
        assert_eq!(outcome.user().email, "learner@example.com");

        manager.sign_out().await.unwrap();
        assert_eq!(manager.current_user().await.unwrap(), None);

        let user = manager.sign_in("learner@example.com", "secret1").await.unwrap();
        assert_eq!(manager.current_user().await.unwrap(), Some(user));
    }

    #[tokio::test]
    async fn invalid_form_never_reaches_provider() {
        let manager = manager(InMemoryIdentityProvider::new());
        let err = manager.sign_up("learner@example.com", "abc").await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Validation(ValidationError::PasswordTooShort { min: 6 })
        ));
        // the short-password account must not exist
        let err = manager.sign_in("learner@example.com", "abcdef").await.unwrap_err();
        assert!(matches!(err, ServiceError::Auth(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn duplicate_sign_up_is_reported() {
        let manager = manager(InMemoryIdentityProvider::new());
        manager.sign_up("a@b.co", "secret1").await.unwrap();
        let err = manager.sign_up("A@B.co", "secret2").await.unwrap_err();
        assert!(matches!(err, ServiceError::Auth(AuthError::DuplicateAccount)));
    }

    #[tokio::test]
    async fn unconfirmed_account_has_no_session() {
        let manager = manager(InMemoryIdentityProvider::requiring_confirmation());
        let outcome = manager.sign_up("a@b.co", "secret1").await.unwrap();
        assert!(matches!(outcome, SignUpOutcome::ConfirmationRequired(_)));
        assert_eq!(manager.current_user().await.unwrap(), None);
        let err = manager.sign_in("a@b.co", "secret1").await.unwrap_err();
        assert!(matches!(err, ServiceError::Auth(AuthError::ConfirmationRequired)));
    }

    #[tokio::test]
    async fn sign_out_is_idempotent() {
        let manager = manager(InMemoryIdentityProvider::new());
        manager.sign_out().await.unwrap();
        manager.sign_out().await.unwrap();
    }
}
