//! Request extractors.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::response::ApiError;

/// Token of the session the request runs under.
///
/// Placed in the request extensions by the session middleware, so any handler
/// behind it can rely on it being present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken(pub String);

impl SessionToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for SessionToken
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionToken>()
            .cloned()
            .ok_or_else(ApiError::invalid_session)
    }
}
