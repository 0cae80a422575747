use crate::errors::Result;
use crate::http::{AppState, require_json, success};
use crate::store::{self, NewProduct};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::Response,
};

pub async fn list_products(State(state): State<AppState>) -> Result<Response> {
    let products = store::list_products(&state.pool).await?;
    Ok(success(StatusCode::OK, products))
}

pub async fn create_product(
    State(state): State<AppState>,
    payload: Result<Json<NewProduct>, JsonRejection>,
) -> Result<Response> {
    let new_product = require_json(payload)?;
    let product = store::create_product(&state.pool, &new_product).await?;
    Ok(success(StatusCode::CREATED, product))
}
