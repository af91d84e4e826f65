//! Domain error types.

use std::time::Duration;

use common::{OrderId, ProductId, UserId};
use document_store::StoreError;
use thiserror::Error;

use crate::address::AddressSlot;
use crate::checkout::CheckoutStage;

/// Coarse classification of a [`CommerceError`], stable across variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A malformed or missing identifier or query.
    InvalidInput,
    /// The user, product or address slot does not exist.
    NotFound,
    /// A stored document or aggregation result had an unexpected shape.
    DecodingFailed,
    /// The address slot policy rejected the request.
    LimitExceeded,
    /// A lookup or aggregation could not be completed by the store.
    StoreReadFailed,
    /// An update or insert was rejected by the store.
    StoreWriteFailed,
    /// The operation deadline elapsed.
    Timeout,
}

/// Errors that can occur during cart, checkout, address and catalog operations.
#[derive(Debug, Error)]
pub enum CommerceError {
    #[error("Invalid user id: {0}")]
    InvalidUserId(String),

    #[error("Invalid product id: {0}")]
    InvalidProductId(String),

    #[error("Invalid search query: {0}")]
    InvalidQuery(String),

    /// Bulk checkout was requested for a user whose cart is empty.
    #[error("Cart is empty for user {0}")]
    EmptyCart(UserId),

    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    #[error("User not found: {0}")]
    UserNotFound(UserId),

    #[error("User {user_id} has no {slot} address")]
    AddressSlotNotFound { user_id: UserId, slot: AddressSlot },

    #[error("Product decoding failed: {0}")]
    ProductDecodingFailed(#[source] StoreError),

    #[error("User decoding failed: {0}")]
    UserDecodingFailed(#[source] StoreError),

    /// An aggregation returned rows that do not fit the expected result record.
    #[error("Unexpected aggregation result: {0}")]
    UnexpectedAggregate(String),

    #[error("User {user_id} already has {limit} addresses")]
    AddressLimitExceeded { user_id: UserId, limit: usize },

    #[error("Lookup failed: {0}")]
    LookupFailed(#[source] StoreError),

    #[error("Aggregation failed: {0}")]
    AggregationFailed(#[source] StoreError),

    #[error("Cart update failed: {0}")]
    CartUpdateFailed(#[source] StoreError),

    #[error("Cart remove failed: {0}")]
    CartRemoveFailed(#[source] StoreError),

    /// A write of an order commit failed. Writes completed before `stage`
    /// stay applied.
    #[error("Purchase of order {order_id} failed at {stage}: {source}")]
    PurchaseFailed {
        order_id: OrderId,
        stage: CheckoutStage,
        #[source]
        source: StoreError,
    },

    #[error("Address update failed: {0}")]
    AddressUpdateFailed(#[source] StoreError),

    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },
}

impl CommerceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CommerceError::InvalidUserId(_)
            | CommerceError::InvalidProductId(_)
            | CommerceError::InvalidQuery(_)
            | CommerceError::EmptyCart(_) => ErrorKind::InvalidInput,
            CommerceError::ProductNotFound(_)
            | CommerceError::UserNotFound(_)
            | CommerceError::AddressSlotNotFound { .. } => ErrorKind::NotFound,
            CommerceError::ProductDecodingFailed(_)
            | CommerceError::UserDecodingFailed(_)
            | CommerceError::UnexpectedAggregate(_) => ErrorKind::DecodingFailed,
            CommerceError::AddressLimitExceeded { .. } => ErrorKind::LimitExceeded,
            CommerceError::LookupFailed(_) | CommerceError::AggregationFailed(_) => {
                ErrorKind::StoreReadFailed
            }
            CommerceError::CartUpdateFailed(_)
            | CommerceError::CartRemoveFailed(_)
            | CommerceError::PurchaseFailed { .. }
            | CommerceError::AddressUpdateFailed(_) => ErrorKind::StoreWriteFailed,
            CommerceError::Timeout { .. } => ErrorKind::Timeout,
        }
    }

    /// Maps a failed product lookup.
    pub(crate) fn product_lookup(err: StoreError) -> Self {
        if err.is_decoding() {
            CommerceError::ProductDecodingFailed(err)
        } else {
            CommerceError::LookupFailed(err)
        }
    }

    /// Maps a failed user lookup.
    pub(crate) fn user_lookup(err: StoreError) -> Self {
        if err.is_decoding() {
            CommerceError::UserDecodingFailed(err)
        } else {
            CommerceError::LookupFailed(err)
        }
    }

    /// Maps a failed aggregation.
    pub(crate) fn aggregation(err: StoreError) -> Self {
        if err.is_decoding() {
            CommerceError::UserDecodingFailed(err)
        } else {
            CommerceError::AggregationFailed(err)
        }
    }
}
