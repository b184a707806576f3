use thiserror::Error;

/// Minimum password length accepted before contacting the identity provider.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Client-side form validation failures. Caught before any network call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("email is required")]
    MissingEmail,

    #[error("email address is not valid")]
    MalformedEmail,

    #[error("password is required")]
    MissingPassword,

    #[error("password must be at least {min} characters")]
    PasswordTooShort { min: usize },
}

/// Email/password pair that passed form validation.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    email: String,
    password: String,
}

impl Credentials {
    /// Validate raw form input.
    ///
    /// The email is trimmed and lowercased; the password is kept verbatim.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` when a field is missing or malformed.
    pub fn new(email: &str, password: &str) -> Result<Self, ValidationError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(ValidationError::MissingEmail);
        }
        if !looks_like_email(email) {
            return Err(ValidationError::MalformedEmail);
        }
        if password.is_empty() {
            return Err(ValidationError::MissingPassword);
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::PasswordTooShort {
                min: MIN_PASSWORD_LEN,
            });
        }
        Ok(Self {
            email: email.to_ascii_lowercase(),
            password: password.to_owned(),
        })
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

fn looks_like_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !value.chars().any(char::is_whitespace)
}
