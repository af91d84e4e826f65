//! Address endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{Address, AddressFields};
use document_store::DocumentStore;
use domain::{AddressSlot, input};

use super::{AppState, MessageResponse};
use crate::error::ApiError;

fn fields(payload: Result<Json<AddressFields>, JsonRejection>) -> Result<AddressFields, ApiError> {
    payload
        .map(|Json(fields)| fields)
        .map_err(|rejection| ApiError::BadRequest(format!("invalid address: {}", rejection.body_text())))
}

/// POST /users/{user_id}/addresses: fill the next free slot.
#[tracing::instrument(skip(state, payload))]
pub async fn add<S: DocumentStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(user_id): Path<String>,
    payload: Result<Json<AddressFields>, JsonRejection>,
) -> Result<(StatusCode, Json<Address>), ApiError> {
    let user_id = input::user_id(&user_id)?;
    let fields = fields(payload)?;

    let address = state
        .commerce
        .addresses()
        .add_address(user_id, fields)
        .await?;
    Ok((StatusCode::CREATED, Json(address)))
}

async fn edit<S: DocumentStore + 'static>(
    state: &AppState<S>,
    user_id: &str,
    slot: AddressSlot,
    payload: Result<Json<AddressFields>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let user_id = input::user_id(user_id)?;
    let fields = fields(payload)?;

    state
        .commerce
        .addresses()
        .edit_address(user_id, slot, fields)
        .await?;
    let message = match slot {
        AddressSlot::Home => "successfully updated the home address",
        AddressSlot::Work => "successfully updated the work address",
    };
    Ok(Json(MessageResponse::new(message)))
}

/// PUT /users/{user_id}/addresses/home: overwrite slot 0.
#[tracing::instrument(skip(state, payload))]
pub async fn edit_home<S: DocumentStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(user_id): Path<String>,
    payload: Result<Json<AddressFields>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    edit(&state, &user_id, AddressSlot::Home, payload).await
}

/// PUT /users/{user_id}/addresses/work: overwrite slot 1.
#[tracing::instrument(skip(state, payload))]
pub async fn edit_work<S: DocumentStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(user_id): Path<String>,
    payload: Result<Json<AddressFields>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    edit(&state, &user_id, AddressSlot::Work, payload).await
}

/// DELETE /users/{user_id}/addresses: clear both slots.
#[tracing::instrument(skip(state))]
pub async fn delete<S: DocumentStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(user_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let user_id = input::user_id(&user_id)?;

    state.commerce.addresses().delete_addresses(user_id).await?;
    Ok(Json(MessageResponse::new("successfully deleted")))
}
