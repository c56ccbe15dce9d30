//! Site visit endpoints.

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::issuer;
use crate::model::{NewSiteVisit, SiteVisit};
use crate::state::AppState;

const DEFAULT_LIMIT: usize = 100;
const MAX_LIMIT: usize = 500;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ListSiteVisitsResponse {
    pub items: Vec<SiteVisit>,
    pub total: usize,
}

/// POST /v1/site-visits
pub async fn create_site_visit(
    State(state): State<AppState>,
    payload: Result<Json<NewSiteVisit>, JsonRejection>,
) -> Result<(StatusCode, Json<SiteVisit>), ApiError> {
    let Json(req) = payload?;
    let visit = issuer::create_visit(
        state.store(),
        state.exporter(),
        req,
        state.issue_retries(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(visit)))
}

/// GET /v1/site-visits
pub async fn list_site_visits(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListSiteVisitsResponse>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let items = state.store().list(limit).await?;
    let total = items.len();
    Ok(Json(ListSiteVisitsResponse { items, total }))
}
