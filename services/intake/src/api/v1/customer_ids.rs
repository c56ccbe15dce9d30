//! Customer ID endpoints.
//!
//! The form calls `next` to pre-fill the ID field and `validate` as the user
//! edits it. Neither reserves anything; IDs are only claimed when a site
//! visit is stored.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};
use sitevisit_id::{next_customer_id, validate_customer_id, CustomerId};

use crate::api::error::{ApiError, FieldError};
use crate::issuer;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NextCustomerIdResponse {
    pub customer_id: CustomerId,
    pub previous: Option<CustomerId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateRequest {
    pub customer_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateResponse {
    pub customer_id: String,
    pub valid: bool,
}

#[derive(Debug, Deserialize)]
pub struct SuccessorRequest {
    #[serde(default)]
    pub previous: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessorResponse {
    pub customer_id: CustomerId,
}

/// GET /v1/customer-ids/next
pub async fn preview_next(
    State(state): State<AppState>,
) -> Result<Json<NextCustomerIdResponse>, ApiError> {
    let preview = issuer::preview_next(state.store()).await?;
    Ok(Json(NextCustomerIdResponse {
        customer_id: preview.next,
        previous: preview.previous,
    }))
}

/// POST /v1/customer-ids/validate
pub async fn validate(
    payload: Result<Json<ValidateRequest>, JsonRejection>,
) -> Result<Json<ValidateResponse>, ApiError> {
    let Json(req) = payload?;
    let valid = validate_customer_id(&req.customer_id);
    Ok(Json(ValidateResponse {
        customer_id: req.customer_id,
        valid,
    }))
}

/// POST /v1/customer-ids/successor
///
/// Stateless: computes the ID after `previous` without touching the store.
pub async fn successor(
    payload: Result<Json<SuccessorRequest>, JsonRejection>,
) -> Result<Json<SuccessorResponse>, ApiError> {
    let Json(req) = payload?;
    let customer_id = next_customer_id(req.previous.as_deref()).map_err(|e| {
        ApiError::bad_request(
            "invalid_customer_id",
            format!("Previous customer ID is malformed: {e}"),
        )
        .with_details(vec![FieldError {
            field: "previous".to_string(),
            message: e.to_string(),
            code: Some(e.code().to_string()),
        }])
    })?;
    Ok(Json(SuccessorResponse { customer_id }))
}
