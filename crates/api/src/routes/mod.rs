//! Request handlers, one module per resource.

pub mod addresses;
pub mod cart;
pub mod checkout;
pub mod health;
pub mod metrics;
pub mod products;

use document_store::DocumentStore;
use domain::Commerce;
use serde::Serialize;

/// Shared application state accessible from all handlers.
pub struct AppState<S: DocumentStore> {
    pub commerce: Commerce<S>,
}

/// Body of responses that carry only a confirmation.
#[derive(Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

impl MessageResponse {
    pub fn new(message: &'static str) -> Self {
        Self { message }
    }
}
