use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::error::AppError;

/// Caller credentials forwarded to the backend. Handlers receive it as an
/// extractor and pass it explicitly to every backend call.
#[derive(Clone)]
pub struct Session {
    token: String,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Result<Self, AppError> {
        let token = token.into().trim().to_string();
        if token.is_empty() {
            return Err(AppError::Unauthorized("missing session token".to_string()));
        }
        Ok(Self { token })
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }

    /// Stable key for per-session bookkeeping that never stores the token.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.token.hash(&mut hasher);
        hasher.finish()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("fingerprint", &format_args!("{:016x}", self.fingerprint()))
            .finish()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or_else(|| AppError::Unauthorized("missing Authorization header".to_string()))?
            .to_str()
            .map_err(|_| AppError::Unauthorized("malformed Authorization header".to_string()))?;

        let token = header
            .strip_prefix("Bearer ")
            .or_else(|| header.strip_prefix("bearer "))
            .ok_or_else(|| AppError::Unauthorized("expected a Bearer token".to_string()))?;

        Session::new(token)
    }
}

#[cfg(test)]
mod tests {
    use super::Session;

    #[test]
    fn blank_token_is_rejected() {
        assert!(Session::new("   ").is_err());
    }

    #[test]
    fn fingerprint_is_stable_and_debug_hides_token() {
        let a = Session::new("secret-token").unwrap();
        let b = Session::new(" secret-token ").unwrap();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.bearer(), "Bearer secret-token");
        assert!(!format!("{a:?}").contains("secret-token"));
    }
}
