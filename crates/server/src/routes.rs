//! Route configuration.

use crate::handlers;
use crate::metrics::metrics_handler;
use crate::state::AppState;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use tower_http::trace::TraceLayer;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Health check (unauthenticated for load balancers/k8s probes)
        .route("/v1/health", get(handlers::health_check))
        // Lists
        .route(
            "/v1/lists/{list_id}",
            put(handlers::ensure_list)
                .get(handlers::get_list_head)
                .delete(handlers::delete_list),
        )
        .route(
            "/v1/lists/{list_id}/articles",
            post(handlers::append_article),
        )
        .route("/v1/lists/{list_id}/pages", get(handlers::list_chain))
        // Pages
        .route(
            "/v1/pages/{page_id}",
            get(handlers::get_page).put(handlers::replace_page),
        );

    let mut router = Router::new().merge(api_routes);

    // The endpoint is unauthenticated; restrict it at the network level.
    if state.config.server.metrics_enabled {
        let metrics_routes = Router::new().route("/metrics", get(metrics_handler));
        router = router.merge(metrics_routes);
    }

    let body_limit = state.config.server.max_body_bytes;

    router
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
