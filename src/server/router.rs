use crate::server::handlers;
use crate::server::state::AppState;
use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/markets", get(handlers::markets))
        .route("/categories", get(handlers::categories))
        .route("/trending", get(handlers::trending))
        .route("/coins/list", get(handlers::coins_list))
        .route("/coins/{id}/chart", get(handlers::coin_chart))
        .route("/chart", get(handlers::chart_by_query));

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
