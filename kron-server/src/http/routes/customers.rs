//! Customer registration endpoint

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};

use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::models::RegisterCustomerRequest;
use crate::registration;

/// Body sent back when a customer has been stored.
pub const CUSTOMER_SAVED: &str = "Customer saved successfully.";

/// POST /customer/add - register a customer with existing tags
async fn add_customer(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterCustomerRequest>, JsonRejection>,
) -> Result<(StatusCode, &'static str), ApiError> {
    tracing::info!("registration request received");
    let Json(req) = payload?;
    let username = req.username.clone().unwrap_or_default();

    let registered = registration::register(&*state.store, req).await?;

    if !registered.links.is_complete() {
        tracing::warn!(
            username = %username,
            customer_id = registered.customer_id,
            linked = registered.links.linked,
            failed = registered.links.failed,
            "customer saved with missing tag links"
        );
    }
    tracing::info!(
        username = %username,
        customer_id = registered.customer_id,
        linked = registered.links.linked,
        "customer saved"
    );

    Ok((StatusCode::OK, CUSTOMER_SAVED))
}

/// Customer routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/customer/add", post(add_customer))
}
