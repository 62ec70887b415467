use std::sync::Arc;

use crate::auth::Authenticator;
use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone; everything that is not already `Clone` sits behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: movies_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Resolves callers for the [`crate::middleware::auth::Authorized`] extractor.
    pub authenticator: Arc<Authenticator>,
}
