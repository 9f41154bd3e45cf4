//! Administrative access check.
//!
//! Callers present `Authorization: Bearer <token>`. A request without
//! credentials is unauthorized; one with unknown credentials is
//! forbidden. Neither gets a body.

use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use tracing::debug;

/// Why a request was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDenied {
    /// No usable credentials were sent.
    Unauthorized,
    /// Credentials were sent but do not grant admin access.
    Forbidden,
}

impl AccessDenied {
    pub fn status(self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
        }
    }
}

/// Bearer tokens that grant administrative access.
///
/// With no tokens configured every request is forbidden.
#[derive(Debug, Clone, Default)]
pub struct AdminAuth {
    tokens: Vec<String>,
}

impl AdminAuth {
    pub fn new(tokens: impl IntoIterator<Item = String>) -> Self {
        Self {
            tokens: tokens.into_iter().filter(|t| !t.is_empty()).collect(),
        }
    }

    pub fn has_tokens(&self) -> bool {
        !self.tokens.is_empty()
    }

    /// Checks the request headers for an admin token.
    pub fn authorize(&self, headers: &HeaderMap) -> Result<(), AccessDenied> {
        let token = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AccessDenied::Unauthorized)?;

        if self.tokens.iter().any(|known| known == token) {
            Ok(())
        } else {
            debug!("Rejected request with unknown admin token");
            Err(AccessDenied::Forbidden)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_authorize() {
        let auth = AdminAuth::new(vec!["s3cret".to_string()]);

        assert_eq!(auth.authorize(&headers("Bearer s3cret")), Ok(()));
        assert_eq!(
            auth.authorize(&headers("Bearer nope")),
            Err(AccessDenied::Forbidden)
        );
        assert_eq!(
            auth.authorize(&headers("Basic czNjcmV0")),
            Err(AccessDenied::Unauthorized)
        );
        assert_eq!(
            auth.authorize(&HeaderMap::new()),
            Err(AccessDenied::Unauthorized)
        );
    }

    #[test]
    fn test_no_tokens_means_closed() {
        let auth = AdminAuth::new(vec![String::new()]);
        assert!(!auth.has_tokens());
        assert_eq!(
            auth.authorize(&headers("Bearer ")),
            Err(AccessDenied::Unauthorized)
        );
        assert_eq!(
            auth.authorize(&headers("Bearer anything")),
            Err(AccessDenied::Forbidden)
        );
    }
}
