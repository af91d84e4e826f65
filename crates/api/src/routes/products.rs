//! Catalog endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use common::Product;
use document_store::DocumentStore;
use serde::Deserialize;

use super::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub name: String,
}

/// GET /products: list the whole catalog.
#[tracing::instrument(skip(state))]
pub async fn list<S: DocumentStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let products = state.commerce.catalog().list_products().await?;
    Ok(Json(products))
}

/// GET /products/search?name=: products whose name contains the query.
#[tracing::instrument(skip(state, params), fields(query = %params.name))]
pub async fn search<S: DocumentStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let products = state
        .commerce
        .catalog()
        .search_products(&params.name)
        .await?;
    Ok(Json(products))
}
