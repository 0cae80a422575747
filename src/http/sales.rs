use crate::errors::{Error, Result};
use crate::http::{AppState, require_json, success, success_message};
use crate::store::{self, NewSale};
use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::Response,
};
use serde::Deserialize;

pub async fn list_sales(State(state): State<AppState>) -> Result<Response> {
    let sales = store::list_sales(&state.pool).await?;
    Ok(success(StatusCode::OK, sales))
}

pub async fn create_sale(
    State(state): State<AppState>,
    payload: Result<Json<NewSale>, JsonRejection>,
) -> Result<Response> {
    let new_sale = require_json(payload)?;
    let sale = store::create_sale(&state.pool, &new_sale).await?;
    Ok(success(StatusCode::CREATED, sale))
}

#[derive(Debug, Deserialize)]
pub struct DeleteSaleQuery {
    #[serde(default)]
    id: Option<String>,
}

pub async fn delete_sale(
    State(state): State<AppState>,
    Query(query): Query<DeleteSaleQuery>,
) -> Result<Response> {
    let id = query
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| Error::Validation("Sale ID is required".to_string()))?;
    store::delete_sale(&state.pool, &id).await?;
    Ok(success_message("Sale deleted successfully"))
}

#[cfg(test)]
mod tests {
    use crate::errors::Result;
    use crate::http::test_utils::{send_json, test_app};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_post_sale_accepts_sloppy_numerics() -> Result<()> {
        let (app, _dir) = test_app().await?;

        let (status, body) = send_json(
            app,
            "POST",
            "/api/sales",
            Some(json!({
                "saleInvoiceNo": "SI-7",
                "numberOfCages": "4",
                "ratePerKg": "oops",
                "paymentMode": "Bitcoin"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["numberOfCages"], json!(4));
        assert_eq!(body["data"]["numberOfBirds"], json!(64));
        assert_eq!(body["data"]["ratePerKg"], json!(0.0));
        assert_eq!(body["data"]["paymentMode"], json!(null));
        Ok(())
    }

    #[tokio::test]
    async fn test_get_sales_empty_store() -> Result<()> {
        let (app, _dir) = test_app().await?;

        let (status, body) = send_json(app, "GET", "/api/sales", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], json!([]));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_sale_requires_id() -> Result<()> {
        let (app, _dir) = test_app().await?;

        let (status, body) = send_json(app, "DELETE", "/api/sales", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], json!("Validation error"));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_sale_unknown_id_is_404() -> Result<()> {
        let (app, _dir) = test_app().await?;

        let (status, body) = send_json(app, "DELETE", "/api/sales?id=424242", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], json!("Not found"));
        Ok(())
    }

    #[tokio::test]
    async fn test_sale_create_then_delete_round_trip() -> Result<()> {
        let (app, _dir) = test_app().await?;

        let (_, body) = send_json(
            app.clone(),
            "POST",
            "/api/sales",
            Some(json!({"saleInvoiceNo": "SI-9"})),
        )
        .await;
        let id = body["data"]["id"].as_i64().unwrap();

        let (status, body) =
            send_json(app.clone(), "DELETE", &format!("/api/sales?id={}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(true));

        let (_, body) = send_json(app, "GET", "/api/sales", None).await;
        assert_eq!(body["data"], json!([]));
        Ok(())
    }
}
