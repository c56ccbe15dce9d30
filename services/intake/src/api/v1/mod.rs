//! API v1 routes.

mod customer_ids;
mod site_visits;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

/// Create API v1 routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/customer-ids/next", get(customer_ids::preview_next))
        .route("/customer-ids/validate", post(customer_ids::validate))
        .route("/customer-ids/successor", post(customer_ids::successor))
        .route(
            "/site-visits",
            post(site_visits::create_site_visit).get(site_visits::list_site_visits),
        )
}
