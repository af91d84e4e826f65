//! Cart endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{CartEntry, Money};
use document_store::DocumentStore;
use domain::input;
use serde::Serialize;

use super::{AppState, MessageResponse};
use crate::error::ApiError;

#[derive(Serialize)]
pub struct CartResponse {
    pub user_id: String,
    pub items: Vec<CartEntry>,
    pub total: Money,
}

/// POST /users/{user_id}/cart/{product_id}: add a product snapshot.
#[tracing::instrument(skip(state))]
pub async fn add<S: DocumentStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path((user_id, product_id)): Path<(String, String)>,
) -> Result<(StatusCode, Json<CartEntry>), ApiError> {
    let user_id = input::user_id(&user_id)?;
    let product_id = input::product_id(&product_id)?;

    let entry = state
        .commerce
        .cart()
        .add_to_cart(product_id, user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// DELETE /users/{user_id}/cart/{product_id}: drop every entry of a product.
#[tracing::instrument(skip(state))]
pub async fn remove<S: DocumentStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path((user_id, product_id)): Path<(String, String)>,
) -> Result<Json<MessageResponse>, ApiError> {
    let user_id = input::user_id(&user_id)?;
    let product_id = input::product_id(&product_id)?;

    state
        .commerce
        .cart()
        .remove_item(product_id, user_id)
        .await?;
    Ok(Json(MessageResponse::new(
        "item successfully removed from cart",
    )))
}

/// GET /users/{user_id}/cart: cart contents with their total.
#[tracing::instrument(skip(state))]
pub async fn get<S: DocumentStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(user_id): Path<String>,
) -> Result<Json<CartResponse>, ApiError> {
    let user_id = input::user_id(&user_id)?;

    let summary = state.commerce.cart().cart_summary(user_id).await?;
    Ok(Json(CartResponse {
        user_id: summary.user_id.to_string(),
        items: summary.items,
        total: summary.total.total,
    }))
}
