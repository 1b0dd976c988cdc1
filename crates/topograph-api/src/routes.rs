use crate::{handlers, AppState};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // Catalog
        .route("/datasets", get(handlers::datasets))
        .route("/datasets/rescan", post(handlers::rescan_datasets))
        // Canonical graph with layout
        .route("/graph", get(handlers::get_graph))
        .route("/graph_layout", post(handlers::store_graph_layout))
        // Filter-function values
        .route("/filter_function", get(handlers::get_filter_function))
        // Summary graph
        .route("/mog", get(handlers::get_summary_graph))
        .route("/mog_layout", post(handlers::store_summary_layout))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .layer(TraceLayer::new_for_http())
}
