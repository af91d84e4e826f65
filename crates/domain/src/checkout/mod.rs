//! Order commits: bulk checkout of the cart and instant buy of one product.

mod state;

use std::sync::Arc;
use std::time::Instant;

use common::{CartEntry, Order, OrderId, ProductId, UserId};
use document_store::{DocumentStore, UserUpdate};

use crate::cart::compute_cart_total;
use crate::deadline::{Deadlines, with_deadline};
use crate::error::CommerceError;
use crate::locks::UserLocks;

pub use state::{CheckoutStage, CheckoutState};

/// Drives one order through the commit stages, tracking the state reached.
///
/// Lives outside the deadline so the progress made before a timeout can
/// still be reported once the commit future is dropped.
struct Commit<'a, S: DocumentStore> {
    store: &'a S,
    user_id: UserId,
    order_id: OrderId,
    state: CheckoutState,
    in_flight: Option<CheckoutStage>,
}

impl<'a, S: DocumentStore> Commit<'a, S> {
    fn new(store: &'a S, user_id: UserId) -> Self {
        Self {
            store,
            user_id,
            order_id: OrderId::new(),
            state: CheckoutState::default(),
            in_flight: None,
        }
    }

    /// Runs `stages` in order for `order`, attaching `items` to it.
    async fn run_all(
        &mut self,
        stages: &[CheckoutStage],
        order: &Order,
        items: &[CartEntry],
    ) -> Result<(), CommerceError> {
        for &stage in stages {
            let update = match stage {
                CheckoutStage::AppendOrder => UserUpdate::PushOrder(order.clone()),
                CheckoutStage::AttachItems => UserUpdate::PushOrderItems {
                    order_id: order.id,
                    items: items.to_vec(),
                },
                CheckoutStage::ClearCart => UserUpdate::ReplaceCart(Vec::new()),
            };
            self.run(stage, update).await?;
        }
        Ok(())
    }

    async fn run(&mut self, stage: CheckoutStage, update: UserUpdate) -> Result<(), CommerceError> {
        let next = self.state.advance(stage);
        debug_assert!(next.is_some(), "{stage} cannot run from {}", self.state);

        self.in_flight = Some(stage);
        let result = match self.store.update_user(self.user_id, update).await {
            Ok(result) => result,
            Err(source) => {
                self.report_partial(stage, &source);
                return Err(CommerceError::PurchaseFailed {
                    order_id: self.order_id,
                    stage,
                    source,
                });
            }
        };
        self.in_flight = None;
        if result.matched_nothing() {
            return Err(CommerceError::UserNotFound(self.user_id));
        }

        if let Some(next) = next {
            self.state = next;
        }
        Ok(())
    }

    /// Records a commit cut off by its deadline while `in_flight` was running.
    fn timed_out(&self) {
        if let Some(stage) = self.in_flight {
            self.report_partial(stage, &"deadline elapsed");
        }
    }

    fn report_partial(&self, stage: CheckoutStage, cause: &dyn std::fmt::Display) {
        if self.state == CheckoutState::CartActive {
            return;
        }
        tracing::warn!(
            user_id = %self.user_id,
            order_id = %self.order_id,
            %stage,
            reached = %self.state,
            error = %cause,
            "order commit partially applied"
        );
        metrics::counter!("checkout_partial_failures_total", "stage" => stage.label())
            .increment(1);
    }
}

/// Service converting carts and single products into orders.
pub struct CheckoutService<S: DocumentStore> {
    store: Arc<S>,
    locks: UserLocks,
    deadlines: Deadlines,
}

impl<S: DocumentStore> CheckoutService<S> {
    pub fn new(store: Arc<S>, locks: UserLocks, deadlines: Deadlines) -> Self {
        Self {
            store,
            locks,
            deadlines,
        }
    }

    /// Buys everything in the user's cart as one order and empties the cart.
    ///
    /// Returns the committed order, priced at the cart total. Writes that
    /// succeeded before a failing stage or the deadline are not undone.
    #[tracing::instrument(skip(self))]
    pub async fn buy_from_cart(&self, user_id: UserId) -> Result<Order, CommerceError> {
        let started = Instant::now();
        let mut commit = Commit::new(self.store.as_ref(), user_id);
        let result = with_deadline("buy_from_cart", self.deadlines.checkout, async {
            let _guard = self.locks.lock(user_id).await;

            let user = self
                .store
                .find_user(user_id)
                .await
                .map_err(CommerceError::user_lookup)?
                .ok_or(CommerceError::UserNotFound(user_id))?;
            if user.cart.is_empty() {
                return Err(CommerceError::EmptyCart(user_id));
            }
            let total = compute_cart_total(self.store.as_ref(), user_id).await?;

            let mut order = Order::with_id(commit.order_id, total.total);
            commit
                .run_all(&CheckoutStage::BULK, &order, &user.cart)
                .await?;

            order.items = user.cart;
            Ok(order)
        })
        .await;
        if let Err(CommerceError::Timeout { .. }) = &result {
            commit.timed_out();
        }
        let order = result?;

        metrics::counter!("orders_placed_total", "kind" => "cart").increment(1);
        metrics::histogram!("checkout_duration_seconds").record(started.elapsed().as_secs_f64());
        tracing::info!(order_id = %order.id, price = %order.price, items = order.items.len(), "order placed from cart");
        Ok(order)
    }

    /// Buys a single product without touching the user's cart.
    #[tracing::instrument(skip(self))]
    pub async fn instant_buy(
        &self,
        product_id: ProductId,
        user_id: UserId,
    ) -> Result<Order, CommerceError> {
        let started = Instant::now();
        let mut commit = Commit::new(self.store.as_ref(), user_id);
        let result = with_deadline("instant_buy", self.deadlines.instant_buy, async {
            let _guard = self.locks.lock(user_id).await;

            let product = self
                .store
                .find_product(product_id)
                .await
                .map_err(CommerceError::product_lookup)?
                .ok_or(CommerceError::ProductNotFound(product_id))?;
            let items = vec![CartEntry::snapshot(&product)];

            let mut order = Order::with_id(commit.order_id, product.price);
            commit
                .run_all(&CheckoutStage::INSTANT, &order, &items)
                .await?;

            order.items = items;
            Ok(order)
        })
        .await;
        if let Err(CommerceError::Timeout { .. }) = &result {
            commit.timed_out();
        }
        let order = result?;

        metrics::counter!("orders_placed_total", "kind" => "instant").increment(1);
        metrics::histogram!("checkout_duration_seconds").record(started.elapsed().as_secs_f64());
        tracing::info!(order_id = %order.id, price = %order.price, "instant order placed");
        Ok(order)
    }
}
