//! Parsing of raw request identifiers and queries.

use common::{ProductId, UserId};

use crate::error::CommerceError;

/// Parses a user id, rejecting empty and malformed input.
pub fn user_id(raw: &str) -> Result<UserId, CommerceError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(CommerceError::InvalidUserId("user id is empty".to_string()));
    }
    raw.parse()
        .map_err(|e: common::IdParseError| CommerceError::InvalidUserId(e.to_string()))
}

/// Parses a product id, rejecting empty and malformed input.
pub fn product_id(raw: &str) -> Result<ProductId, CommerceError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(CommerceError::InvalidProductId(
            "product id is empty".to_string(),
        ));
    }
    raw.parse()
        .map_err(|e: common::IdParseError| CommerceError::InvalidProductId(e.to_string()))
}

/// Checks a catalog search query is non-empty.
pub fn search_query(raw: &str) -> Result<&str, CommerceError> {
    if raw.is_empty() {
        return Err(CommerceError::InvalidQuery(
            "invalid search index".to_string(),
        ));
    }
    Ok(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_ids() {
        let id = UserId::new();
        assert_eq!(user_id(&id.to_string()).unwrap(), id);

        let id = ProductId::new();
        assert_eq!(product_id(&format!(" {id} ")).unwrap(), id);
    }

    #[test]
    fn empty_ids_are_rejected() {
        assert!(matches!(
            user_id(""),
            Err(CommerceError::InvalidUserId(msg)) if msg == "user id is empty"
        ));
        assert!(matches!(
            product_id("   "),
            Err(CommerceError::InvalidProductId(msg)) if msg == "product id is empty"
        ));
    }

    #[test]
    fn malformed_ids_are_rejected() {
        assert!(matches!(
            user_id("64b7f0c2e4"),
            Err(CommerceError::InvalidUserId(_))
        ));
        assert!(matches!(
            product_id("abc"),
            Err(CommerceError::InvalidProductId(_))
        ));
    }

    #[test]
    fn empty_search_query_is_rejected() {
        assert!(search_query("").is_err());
        assert_eq!(search_query("mug").unwrap(), "mug");
    }
}
