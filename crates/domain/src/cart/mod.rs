//! Cart mutation and cart totals.

mod total;

use std::sync::Arc;

use common::{CartEntry, ProductId, UserId};
use document_store::{DocumentStore, UserUpdate};
use serde::Serialize;

use crate::deadline::{Deadlines, with_deadline};
use crate::error::CommerceError;
use crate::locks::UserLocks;

pub use total::CartTotal;
pub(crate) use total::compute_cart_total;

/// A user's cart contents together with their total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartSummary {
    pub user_id: UserId,
    pub items: Vec<CartEntry>,
    pub total: CartTotal,
}

/// Service for reading and mutating a user's cart.
pub struct CartService<S: DocumentStore> {
    store: Arc<S>,
    locks: UserLocks,
    deadlines: Deadlines,
}

impl<S: DocumentStore> CartService<S> {
    pub fn new(store: Arc<S>, locks: UserLocks, deadlines: Deadlines) -> Self {
        Self {
            store,
            locks,
            deadlines,
        }
    }

    /// Appends a snapshot of the product to the user's cart.
    ///
    /// The snapshot is taken at call time; later catalog changes do not
    /// reach it.
    #[tracing::instrument(skip(self))]
    pub async fn add_to_cart(
        &self,
        product_id: ProductId,
        user_id: UserId,
    ) -> Result<CartEntry, CommerceError> {
        with_deadline("add_to_cart", self.deadlines.cart_mutation, async {
            let _guard = self.locks.lock(user_id).await;

            let product = self
                .store
                .find_product(product_id)
                .await
                .map_err(CommerceError::product_lookup)?
                .ok_or(CommerceError::ProductNotFound(product_id))?;

            let entry = CartEntry::snapshot(&product);
            let result = self
                .store
                .update_user(user_id, UserUpdate::PushCartEntries(vec![entry.clone()]))
                .await
                .map_err(CommerceError::CartUpdateFailed)?;
            if result.matched_nothing() {
                return Err(CommerceError::UserNotFound(user_id));
            }

            metrics::counter!("cart_items_added_total").increment(1);
            tracing::debug!(%product_id, price = %entry.price, "added product to cart");
            Ok(entry)
        })
        .await
    }

    /// Removes every cart entry copied from the product.
    ///
    /// Removing a product that is not in the cart succeeds without change.
    #[tracing::instrument(skip(self))]
    pub async fn remove_item(
        &self,
        product_id: ProductId,
        user_id: UserId,
    ) -> Result<(), CommerceError> {
        with_deadline("remove_item", self.deadlines.cart_mutation, async {
            let _guard = self.locks.lock(user_id).await;

            let result = self
                .store
                .update_user(user_id, UserUpdate::PullCartEntries(product_id))
                .await
                .map_err(CommerceError::CartRemoveFailed)?;
            if result.matched_nothing() {
                return Err(CommerceError::UserNotFound(user_id));
            }

            if result.modified > 0 {
                metrics::counter!("cart_items_removed_total").increment(1);
            }
            Ok(())
        })
        .await
    }

    /// Returns the user's cart entries in the order they were added.
    #[tracing::instrument(skip(self))]
    pub async fn get_cart(&self, user_id: UserId) -> Result<Vec<CartEntry>, CommerceError> {
        with_deadline("get_cart", self.deadlines.cart_read, self.read_cart(user_id)).await
    }

    /// Computes the sum of prices across the user's cart.
    #[tracing::instrument(skip(self))]
    pub async fn cart_total(&self, user_id: UserId) -> Result<CartTotal, CommerceError> {
        with_deadline(
            "cart_total",
            self.deadlines.cart_read,
            compute_cart_total(self.store.as_ref(), user_id),
        )
        .await
    }

    /// Reads the cart and its total as of the same moment.
    #[tracing::instrument(skip(self))]
    pub async fn cart_summary(&self, user_id: UserId) -> Result<CartSummary, CommerceError> {
        with_deadline("cart_summary", self.deadlines.cart_read, async {
            let _guard = self.locks.lock(user_id).await;

            let items = self.read_cart(user_id).await?;
            let total = compute_cart_total(self.store.as_ref(), user_id).await?;
            Ok(CartSummary {
                user_id,
                items,
                total,
            })
        })
        .await
    }

    async fn read_cart(&self, user_id: UserId) -> Result<Vec<CartEntry>, CommerceError> {
        let user = self
            .store
            .find_user(user_id)
            .await
            .map_err(CommerceError::user_lookup)?
            .ok_or(CommerceError::UserNotFound(user_id))?;
        Ok(user.cart)
    }
}
