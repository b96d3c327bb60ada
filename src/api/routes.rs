use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;

use crate::api::handlers::{self, AppState};
use crate::store::traits::Store;

/// Page routes under `base_route`.
///
/// A single wildcard route serves both addressing modes; the handlers tell
/// an id from a path by looking at the captured segment.
pub fn create_router<S: Store + 'static>(base_route: &str) -> Router<AppState<S>> {
    let base = format!("/{}", base_route.trim_matches('/'));

    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Collection
        .route(
            &base,
            get(handlers::list_pages::<S>).post(handlers::create_page::<S>),
        )
        // Single page, by id or by hierarchical path
        .route(
            &format!("{}/*path", base),
            get(handlers::get_page::<S>)
                .put(handlers::edit_page::<S>)
                .patch(handlers::edit_page::<S>)
                .post(handlers::edit_page::<S>)
                .delete(handlers::delete_page::<S>),
        )
        .layer(CorsLayer::permissive())
}
