use crate::coerce::lenient_i64;
use crate::errors::{Error, Result};
use crate::godown::{DateRange, GodownItem, GodownSale, InwardEntry, MortalityRecord, overview};
use crate::http::{AppState, require_json, success, success_message};
use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::Response,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;

/// Optional inclusive `from`/`to` bounds accepted by every list endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    #[serde(default)]
    from: Option<String>,
    #[serde(default)]
    to: Option<String>,
}

fn parse_bound(field: Option<&str>, name: &str) -> Result<Option<NaiveDate>> {
    match field.filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                Error::Validation(format!("Invalid {} date, expected YYYY-MM-DD", name))
            }),
    }
}

impl RangeQuery {
    fn into_range(self) -> Result<DateRange> {
        Ok(DateRange {
            from: parse_bound(self.from.as_deref(), "from")?,
            to: parse_bound(self.to.as_deref(), "to")?,
        })
    }
}

// ----- inward entries -----

pub async fn list_inward(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> Result<Response> {
    let entries = state.godown.list_inward(query.into_range()?).await;
    Ok(success(StatusCode::OK, entries))
}

pub async fn create_inward(
    State(state): State<AppState>,
    payload: Result<Json<InwardEntry>, JsonRejection>,
) -> Result<Response> {
    let entry = state.godown.create_inward(require_json(payload)?).await?;
    Ok(success(StatusCode::CREATED, entry))
}

pub async fn update_inward(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<InwardEntry>, JsonRejection>,
) -> Result<Response> {
    let entry = state
        .godown
        .update_inward(&id, require_json(payload)?)
        .await?;
    Ok(success(StatusCode::OK, entry))
}

pub async fn delete_inward(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response> {
    state.godown.delete_inward(&id).await?;
    Ok(success_message("Inward entry deleted successfully"))
}

// ----- godown sales -----

pub async fn list_sales(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> Result<Response> {
    let sales = state.godown.list_sales(query.into_range()?).await;
    Ok(success(StatusCode::OK, sales))
}

pub async fn create_sale(
    State(state): State<AppState>,
    payload: Result<Json<GodownSale>, JsonRejection>,
) -> Result<Response> {
    let sale = state.godown.create_sale(require_json(payload)?).await?;
    Ok(success(StatusCode::CREATED, sale))
}

pub async fn update_sale(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<GodownSale>, JsonRejection>,
) -> Result<Response> {
    let sale = state.godown.update_sale(&id, require_json(payload)?).await?;
    Ok(success(StatusCode::OK, sale))
}

pub async fn delete_sale(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response> {
    state.godown.delete_sale(&id).await?;
    Ok(success_message("Godown sale deleted successfully"))
}

// ----- mortality records -----

pub async fn list_mortality(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> Result<Response> {
    let records = state.godown.list_mortality(query.into_range()?).await;
    Ok(success(StatusCode::OK, records))
}

pub async fn create_mortality(
    State(state): State<AppState>,
    payload: Result<Json<MortalityRecord>, JsonRejection>,
) -> Result<Response> {
    let record = state.godown.create_mortality(require_json(payload)?).await?;
    Ok(success(StatusCode::CREATED, record))
}

pub async fn update_mortality(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<MortalityRecord>, JsonRejection>,
) -> Result<Response> {
    let record = state
        .godown
        .update_mortality(&id, require_json(payload)?)
        .await?;
    Ok(success(StatusCode::OK, record))
}

pub async fn delete_mortality(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response> {
    state.godown.delete_mortality(&id).await?;
    Ok(success_message("Mortality record deleted successfully"))
}

// ----- legacy godown items -----

pub async fn list_items(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> Result<Response> {
    let items = state.godown.list_items(query.into_range()?).await;
    Ok(success(StatusCode::OK, items))
}

pub async fn create_item(
    State(state): State<AppState>,
    payload: Result<Json<GodownItem>, JsonRejection>,
) -> Result<Response> {
    let item = state.godown.create_item(require_json(payload)?).await?;
    Ok(success(StatusCode::CREATED, item))
}

pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<GodownItem>, JsonRejection>,
) -> Result<Response> {
    let item = state.godown.update_item(&id, require_json(payload)?).await?;
    Ok(success(StatusCode::OK, item))
}

pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response> {
    state.godown.delete_item(&id).await?;
    Ok(success_message("Godown item deleted successfully"))
}

// ----- overview & capacity -----

pub async fn stock_overview(State(state): State<AppState>) -> Result<Response> {
    let inward = state.godown.list_inward(DateRange::default()).await;
    let sales = state.godown.list_sales(DateRange::default()).await;
    let mortality = state.godown.list_mortality(DateRange::default()).await;
    let capacity = state.godown.capacity().await;
    let snapshot = overview::build_overview(
        &inward,
        &sales,
        &mortality,
        capacity,
        Utc::now().date_naive(),
    );
    Ok(success(StatusCode::OK, snapshot))
}

pub async fn get_capacity(State(state): State<AppState>) -> Result<Response> {
    let capacity = state.godown.capacity().await;
    Ok(success(StatusCode::OK, json!({ "capacity": capacity })))
}

#[derive(Debug, Deserialize)]
pub struct CapacityUpdate {
    #[serde(default, deserialize_with = "lenient_i64")]
    capacity: i64,
}

pub async fn set_capacity(
    State(state): State<AppState>,
    payload: Result<Json<CapacityUpdate>, JsonRejection>,
) -> Result<Response> {
    let update = require_json(payload)?;
    if update.capacity <= 0 {
        return Err(Error::Validation(
            "Capacity must be a positive number".to_string(),
        ));
    }
    let capacity = state.godown.set_capacity(update.capacity).await?;
    Ok(success(StatusCode::OK, json!({ "capacity": capacity })))
}
