//! Cart total aggregation.

use common::{Money, UserId};
use document_store::{
    Accumulator, DocumentStore, DocumentStoreExt, GroupRow, Pipeline, UserArray,
};
use serde::Serialize;

use crate::error::CommerceError;

/// Sum of the prices of every entry in a user's cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CartTotal {
    pub user_id: UserId,
    pub total: Money,
}

impl CartTotal {
    pub fn zero(user_id: UserId) -> Self {
        Self {
            user_id,
            total: Money::zero(),
        }
    }

    /// Reads the total out of the rows of a per-user sum pipeline.
    ///
    /// Returns `Ok(None)` when there are no rows, which the pipeline produces
    /// both for an empty cart and for a missing user.
    pub fn from_rows(user_id: UserId, rows: &[GroupRow]) -> Result<Option<Self>, CommerceError> {
        match rows {
            [] => Ok(None),
            [row] if row.id == user_id => Ok(Some(Self {
                user_id,
                total: Money::from_cents(row.value),
            })),
            [row] => Err(CommerceError::UnexpectedAggregate(format!(
                "cart total grouped under user {} instead of {user_id}",
                row.id
            ))),
            _ => Err(CommerceError::UnexpectedAggregate(format!(
                "cart total produced {} rows for user {user_id}",
                rows.len()
            ))),
        }
    }
}

pub(crate) fn cart_total_pipeline(user_id: UserId) -> Pipeline {
    Pipeline::new()
        .match_user(user_id)
        .unwind(UserArray::Cart)
        .group(Accumulator::SumPrice)
}

/// Runs the cart total aggregation for one user.
///
/// An empty cart yields a zero total; a user that does not exist yields
/// `UserNotFound`.
pub(crate) async fn compute_cart_total<S>(
    store: &S,
    user_id: UserId,
) -> Result<CartTotal, CommerceError>
where
    S: DocumentStore + ?Sized,
{
    let rows = store
        .aggregate_users(cart_total_pipeline(user_id))
        .await
        .map_err(CommerceError::aggregation)?;

    if let Some(total) = CartTotal::from_rows(user_id, &rows)? {
        return Ok(total);
    }

    let exists = store
        .user_exists(user_id)
        .await
        .map_err(CommerceError::user_lookup)?;
    if exists {
        Ok(CartTotal::zero(user_id))
    } else {
        Err(CommerceError::UserNotFound(user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_rows_is_undecided() {
        assert_eq!(CartTotal::from_rows(UserId::new(), &[]).unwrap(), None);
    }

    #[test]
    fn single_row_for_the_user() {
        let user_id = UserId::new();
        let rows = [GroupRow {
            id: user_id,
            value: 3500,
        }];

        let total = CartTotal::from_rows(user_id, &rows).unwrap().unwrap();
        assert_eq!(total.total, Money::from_cents(3500));
    }

    #[test]
    fn row_for_another_user_is_rejected() {
        let rows = [GroupRow {
            id: UserId::new(),
            value: 1,
        }];

        assert!(matches!(
            CartTotal::from_rows(UserId::new(), &rows),
            Err(CommerceError::UnexpectedAggregate(_))
        ));
    }

    #[test]
    fn several_rows_are_rejected() {
        let user_id = UserId::new();
        let row = GroupRow {
            id: user_id,
            value: 1,
        };

        assert!(CartTotal::from_rows(user_id, &[row, row]).is_err());
    }

    #[test]
    fn pipeline_shape() {
        let user_id = UserId::new();
        let pipeline = cart_total_pipeline(user_id);

        assert_eq!(pipeline.matched_user(), Some(user_id));
        assert_eq!(pipeline.unwound(), Some(UserArray::Cart));
        assert_eq!(pipeline.validate().unwrap(), Accumulator::SumPrice);
    }
}
