//! Order commit state machine.

use serde::Serialize;

/// Where a user's cart stands during a bulk checkout.
///
/// State transitions:
/// ```text
/// CartActive ──AppendOrder──► OrderPending ──AttachItems──► OrderPending ──ClearCart──► CartCleared
/// ```
///
/// Every transition is a separate store write. A failure leaves the user in
/// the state reached so far; nothing is rolled back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
pub enum CheckoutState {
    /// The cart holds the items to be bought; no order exists yet.
    #[default]
    CartActive,

    /// The order is in the user's history; the cart has not been emptied.
    OrderPending,

    /// The cart was emptied (terminal state).
    CartCleared,
}

impl CheckoutState {
    /// Returns the state reached by successfully completing `stage` from
    /// this state, or None if the stage cannot run here.
    pub fn advance(self, stage: CheckoutStage) -> Option<CheckoutState> {
        match (self, stage) {
            (CheckoutState::CartActive, CheckoutStage::AppendOrder) => {
                Some(CheckoutState::OrderPending)
            }
            (CheckoutState::OrderPending, CheckoutStage::AttachItems) => {
                Some(CheckoutState::OrderPending)
            }
            (CheckoutState::OrderPending, CheckoutStage::ClearCart) => {
                Some(CheckoutState::CartCleared)
            }
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, CheckoutState::CartCleared)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutState::CartActive => "CartActive",
            CheckoutState::OrderPending => "OrderPending",
            CheckoutState::CartCleared => "CartCleared",
        }
    }
}

impl std::fmt::Display for CheckoutState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One store write of an order commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CheckoutStage {
    /// Push the new order onto the user's order history.
    AppendOrder,
    /// Copy the bought entries into the order's item list.
    AttachItems,
    /// Replace the cart with an empty one. Bulk checkout only.
    ClearCart,
}

impl CheckoutStage {
    /// Stages of a bulk checkout, in order.
    pub const BULK: [CheckoutStage; 3] = [
        CheckoutStage::AppendOrder,
        CheckoutStage::AttachItems,
        CheckoutStage::ClearCart,
    ];

    /// Stages of an instant buy, in order.
    pub const INSTANT: [CheckoutStage; 2] =
        [CheckoutStage::AppendOrder, CheckoutStage::AttachItems];

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutStage::AppendOrder => "append order",
            CheckoutStage::AttachItems => "attach items",
            CheckoutStage::ClearCart => "clear cart",
        }
    }

    /// Label used for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            CheckoutStage::AppendOrder => "append_order",
            CheckoutStage::AttachItems => "attach_items",
            CheckoutStage::ClearCart => "clear_cart",
        }
    }
}

impl std::fmt::Display for CheckoutStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
