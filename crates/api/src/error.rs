//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{CommerceError, ErrorKind};

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// The request body could not be read.
    BadRequest(String),
    /// Failure reported by a commerce operation.
    Commerce(CommerceError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Commerce(err) => commerce_error_to_response(&err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

/// Maps an error to its status and public message.
///
/// Messages are fixed per variant. Store and decoding details are logged
/// and never returned.
fn commerce_error_to_response(err: &CommerceError) -> (StatusCode, String) {
    let status = match err.kind() {
        ErrorKind::InvalidInput | ErrorKind::LimitExceeded => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
        ErrorKind::DecodingFailed | ErrorKind::StoreReadFailed | ErrorKind::StoreWriteFailed => {
            tracing::error!(error = %err, kind = ?err.kind(), "commerce operation failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let message = match err {
        CommerceError::InvalidUserId(_) => "invalid user id",
        CommerceError::InvalidProductId(_) => "invalid product id",
        CommerceError::InvalidQuery(_) => "invalid search index",
        CommerceError::EmptyCart(_) => "cart is empty",
        CommerceError::ProductNotFound(_) => "product not found",
        CommerceError::UserNotFound(_) => "user not found",
        CommerceError::AddressSlotNotFound { .. } => "address not found",
        CommerceError::AddressLimitExceeded { .. } => "not allowed",
        CommerceError::CartUpdateFailed(_) => "cannot add this product to the cart",
        CommerceError::CartRemoveFailed(_) => "cannot remove this item from the cart",
        CommerceError::PurchaseFailed { .. } => "cannot update the purchase",
        CommerceError::AddressUpdateFailed(_) => "cannot update the address",
        CommerceError::Timeout { .. } => "request timed out",
        CommerceError::ProductDecodingFailed(_)
        | CommerceError::UserDecodingFailed(_)
        | CommerceError::UnexpectedAggregate(_)
        | CommerceError::LookupFailed(_)
        | CommerceError::AggregationFailed(_) => "internal server error",
    };

    (status, message.to_string())
}

impl From<CommerceError> for ApiError {
    fn from(err: CommerceError) -> Self {
        ApiError::Commerce(err)
    }
}
