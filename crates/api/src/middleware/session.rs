//! Session middleware.
//!
//! Every non-probe request runs under a session. Requests without a token get
//! a fresh one, echoed back in `X-Session-Token`; requests with a token that
//! no longer names a live session are rejected before any handler runs.

use axum::{
    extract::{Request, State},
    http::{HeaderName, HeaderValue, Method},
    middleware::Next,
    response::Response,
};
use gateway_core::{Error, SESSION_HEADER};
use telemetry::metrics;
use tracing::{debug, warn};

use crate::extractors::SessionToken;
use crate::response::ApiError;
use crate::state::AppState;

/// `X-Session-Token`, normalized for header maps.
pub const SESSION_HEADER_NAME: HeaderName = HeaderName::from_static("x-session-token");

pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if request.method() == Method::OPTIONS || request.uri().path().starts_with("/health") {
        return Ok(next.run(request).await);
    }

    let provided = request
        .headers()
        .get(SESSION_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    if let Some(token) = provided {
        if !state.sessions.validate(&token).await? {
            metrics().sessions_rejected.inc();
            warn!(path = %request.uri().path(), "Rejected invalid session token");
            return Err(Error::InvalidSession.into());
        }

        request.extensions_mut().insert(SessionToken(token));
        return Ok(next.run(request).await);
    }

    let session = state.sessions.create(None, None).await?;
    debug!(token = %session.token, "Issued session to tokenless request");

    let header = HeaderValue::from_str(&session.token)
        .map_err(|_| ApiError::internal("Invalid session token"))?;
    request
        .extensions_mut()
        .insert(SessionToken(session.token));

    let mut response = next.run(request).await;
    response.headers_mut().insert(SESSION_HEADER_NAME, header);
    Ok(response)
}
