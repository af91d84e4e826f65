//! Order placement endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::Order;
use document_store::DocumentStore;
use domain::input;

use super::AppState;
use crate::error::ApiError;

/// POST /users/{user_id}/checkout: buy the whole cart.
#[tracing::instrument(skip(state))]
pub async fn buy_from_cart<S: DocumentStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(user_id): Path<String>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let user_id = input::user_id(&user_id)?;

    let order = state.commerce.checkout().buy_from_cart(user_id).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// POST /users/{user_id}/instant-buy/{product_id}: buy one product directly.
#[tracing::instrument(skip(state))]
pub async fn instant_buy<S: DocumentStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path((user_id, product_id)): Path<(String, String)>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let user_id = input::user_id(&user_id)?;
    let product_id = input::product_id(&product_id)?;

    let order = state
        .commerce
        .checkout()
        .instant_buy(product_id, user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(order)))
}
