use crate::errors::Result;
use crate::http::{AppState, require_json, success};
use crate::store::{self, NewPurchase};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::Response,
};

pub async fn list_purchases(State(state): State<AppState>) -> Result<Response> {
    let purchases = store::list_purchases(&state.pool).await?;
    Ok(success(StatusCode::OK, purchases))
}

pub async fn create_purchase(
    State(state): State<AppState>,
    payload: Result<Json<NewPurchase>, JsonRejection>,
) -> Result<Response> {
    let new_purchase = require_json(payload)?;
    let purchase = store::create_purchase(&state.pool, &new_purchase).await?;
    Ok(success(StatusCode::CREATED, purchase))
}
