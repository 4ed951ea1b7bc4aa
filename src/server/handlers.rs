use crate::server::error::AppError;
use crate::server::state::AppState;
use axum::{
    extract::{Path, Query, RawQuery, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn markets(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<Value>, AppError> {
    let raw = raw.unwrap_or_default();
    let json = state.proxy.markets(&raw, &params).await?;
    Ok(Json(json))
}

pub async fn categories(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    Ok(Json(state.proxy.categories().await?))
}

pub async fn trending(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    Ok(Json(state.proxy.trending().await?))
}

pub async fn coins_list(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    Ok(Json(state.proxy.coins_list().await?))
}

pub async fn coin_chart(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    Ok(Json(state.proxy.coin_chart(&id).await?))
}

#[derive(Debug, Deserialize)]
pub struct ChartQuery {
    id: Option<String>,
}

/// Query-string form of [`coin_chart`]; a missing `id` is a bad request.
pub async fn chart_by_query(
    State(state): State<AppState>,
    Query(query): Query<ChartQuery>,
) -> Result<Json<Value>, AppError> {
    let id = query.id.unwrap_or_default();
    Ok(Json(state.proxy.coin_chart(&id).await?))
}
