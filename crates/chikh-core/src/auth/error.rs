use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Account is disabled or locked: {0}")]
    AccountUnavailable(String),

    #[error("Identity handshake failed: {0}")]
    HandshakeFailure(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Credential storage error: {0}")]
    Storage(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl AuthError {
    /// Truncate a response body to avoid logging excessive data
    pub(crate) fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Map a failed identity-service response to an error.
    ///
    /// The identity service reports credential problems as 400 with an
    /// upper-case code in `error.message`, e.g. `INVALID_PASSWORD`.
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            400 => match Self::error_code(body).as_deref() {
                Some(code) if is_credential_code(code) => AuthError::InvalidCredentials,
                Some(code) if code.starts_with("USER_DISABLED") => {
                    AuthError::AccountUnavailable(code.to_string())
                }
                Some(code) if code.starts_with("TOO_MANY_ATTEMPTS") => AuthError::RateLimited,
                _ => AuthError::InvalidResponse(format!("Status {}: {}", status, truncated)),
            },
            401 | 403 => AuthError::InvalidCredentials,
            429 => AuthError::RateLimited,
            500..=599 => AuthError::ServerError(truncated),
            _ => AuthError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }

    fn error_code(body: &str) -> Option<String> {
        let value: serde_json::Value = serde_json::from_str(body).ok()?;
        value
            .pointer("/error/message")
            .and_then(|m| m.as_str())
            .map(|m| m.split(':').next().unwrap_or(m).trim().to_string())
    }
}

fn is_credential_code(code: &str) -> bool {
    matches!(
        code,
        "EMAIL_NOT_FOUND"
            | "INVALID_PASSWORD"
            | "INVALID_EMAIL"
            | "INVALID_LOGIN_CREDENTIALS"
            | "INVALID_REFRESH_TOKEN"
            | "TOKEN_EXPIRED"
            | "USER_NOT_FOUND"
            | "MISSING_PASSWORD"
    )
}
