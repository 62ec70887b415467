//! Authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::auth::Caller;
use crate::error::AppError;
use crate::state::AppState;

/// The authenticated caller of a request.
///
/// Add it as a handler parameter to require authentication:
///
/// ```ignore
/// async fn my_handler(Authorized(caller): Authorized) -> AppResult<Json<()>> {
///     tracing::info!(subject = %caller.subject, "handling request");
///     Ok(Json(()))
/// }
/// ```
///
/// Rejects with 401 on missing or invalid credentials, and with 503 when the
/// identity provider cannot be reached.
#[derive(Debug, Clone)]
pub struct Authorized(pub Caller);

impl FromRequestParts<AppState> for Authorized {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let caller = state.authenticator.authenticate(&parts.headers).await?;
        Ok(Authorized(caller))
    }
}
