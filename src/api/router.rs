//! Report API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Routes are nested under `/api/`.

use axum::routing::get;
use axum::Router;

use crate::api::endpoints;
use crate::api::types::ApiContext;

/// Build the report API router.
///
/// NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
pub fn report_api_router(ctx: ApiContext) -> Router {
    let routes = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/reports/status", get(endpoints::reports::status))
        .route("/reports/rdv/:domain", get(endpoints::reports::rdv))
        .with_state(ctx);

    Router::new().nest("/api", routes)
}
