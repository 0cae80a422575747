//! HTTP surface: the axum router, shared state, and the single place where
//! crate errors become status codes and JSON error bodies.

pub mod godown;
pub mod products;
pub mod purchases;
pub mod sales;

use crate::errors::Error;
use crate::godown::GodownStore;
use crate::store::DbPool;
use axum::{
    Json, Router,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub godown: Arc<GodownStore>,
}

/// Success envelope: `{"success": true, "data": ...}` with the given status.
pub(crate) fn success<T: Serialize>(status: StatusCode, data: T) -> Response {
    (status, Json(json!({ "success": true, "data": data }))).into_response()
}

/// Success envelope for operations that report a message instead of data.
pub(crate) fn success_message(message: &str) -> Response {
    (
        StatusCode::OK,
        Json(json!({ "success": true, "message": message })),
    )
        .into_response()
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, kind) = match &self {
            Error::Validation(_) => (StatusCode::BAD_REQUEST, "Validation error"),
            Error::MalformedRequest(_) => (StatusCode::BAD_REQUEST, "Invalid JSON"),
            Error::NotFound(_) => (StatusCode::NOT_FOUND, "Not found"),
            Error::Database(_) | Error::Rusqlite(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error")
            }
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
        };
        let message = match &self {
            Error::Validation(msg)
            | Error::MalformedRequest(msg)
            | Error::NotFound(msg)
            | Error::Database(msg) => msg.clone(),
            other => other.to_string(),
        };
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        (status, Json(json!({ "error": kind, "message": message }))).into_response()
    }
}

/// Unwraps an axum JSON extraction, mapping a rejection (unparsable body,
/// wrong content type) to the 400 invalid-JSON response.
pub(crate) fn require_json<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, Error> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(rejection) => Err(Error::MalformedRequest(rejection.body_text())),
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/products",
            get(products::list_products).post(products::create_product),
        )
        .route(
            "/api/sales",
            get(sales::list_sales)
                .post(sales::create_sale)
                .delete(sales::delete_sale),
        )
        .route(
            "/api/purchases",
            get(purchases::list_purchases).post(purchases::create_purchase),
        )
        .route(
            "/api/godown/inward",
            get(godown::list_inward).post(godown::create_inward),
        )
        .route(
            "/api/godown/inward/:id",
            axum::routing::put(godown::update_inward).delete(godown::delete_inward),
        )
        .route(
            "/api/godown/sales",
            get(godown::list_sales).post(godown::create_sale),
        )
        .route(
            "/api/godown/sales/:id",
            axum::routing::put(godown::update_sale).delete(godown::delete_sale),
        )
        .route(
            "/api/godown/mortality",
            get(godown::list_mortality).post(godown::create_mortality),
        )
        .route(
            "/api/godown/mortality/:id",
            axum::routing::put(godown::update_mortality).delete(godown::delete_mortality),
        )
        .route(
            "/api/godown/items",
            get(godown::list_items).post(godown::create_item),
        )
        .route(
            "/api/godown/items/:id",
            axum::routing::put(godown::update_item).delete(godown::delete_item),
        )
        .route("/api/godown/overview", get(godown::stock_overview))
        .route(
            "/api/godown/capacity",
            get(godown::get_capacity).put(godown::set_capacity),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod test_utils {
    use super::*;
    use crate::errors::Result;
    use crate::store::test_utils::setup_test_store;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    pub(crate) async fn test_app() -> Result<(Router, tempfile::TempDir)> {
        let dir = tempfile::tempdir()?;
        let pool = setup_test_store().await?;
        let godown = Arc::new(GodownStore::load(dir.path().join("godown-store.json"))?);
        let app = router(AppState { pool, godown });
        Ok((app, dir))
    }

    pub(crate) async fn send_json(
        app: Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let request = match body {
            Some(json_body) => Request::builder()
                .method(method)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json_body.to_string()))
                .unwrap(),
            None => Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        };
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }
}
