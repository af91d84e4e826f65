//! Update specifications applied to a single user document.

use common::{Address, AddressFields, CartEntry, Order, OrderId, ProductId, User};

/// An update to one user document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserUpdate {
    /// Appends each entry to the cart, preserving order.
    PushCartEntries(Vec<CartEntry>),

    /// Removes every cart entry copied from the given product.
    PullCartEntries(ProductId),

    /// Replaces the whole cart.
    ReplaceCart(Vec<CartEntry>),

    /// Appends an order to the order history.
    PushOrder(Order),

    /// Appends items to the order with the given id. Matches nothing if the
    /// user has no such order.
    PushOrderItems {
        order_id: OrderId,
        items: Vec<CartEntry>,
    },

    /// Appends an address.
    PushAddress(Address),

    /// Overwrites the four scalar fields of the address at `slot`. Matches
    /// nothing if the slot does not exist.
    SetAddressSlot { slot: usize, fields: AddressFields },

    /// Replaces the whole address list.
    ReplaceAddresses(Vec<Address>),
}

/// Discriminant of a [`UserUpdate`], used for logging and fault injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateKind {
    PushCartEntries,
    PullCartEntries,
    ReplaceCart,
    PushOrder,
    PushOrderItems,
    PushAddress,
    SetAddressSlot,
    ReplaceAddresses,
}

impl UpdateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateKind::PushCartEntries => "push_cart_entries",
            UpdateKind::PullCartEntries => "pull_cart_entries",
            UpdateKind::ReplaceCart => "replace_cart",
            UpdateKind::PushOrder => "push_order",
            UpdateKind::PushOrderItems => "push_order_items",
            UpdateKind::PushAddress => "push_address",
            UpdateKind::SetAddressSlot => "set_address_slot",
            UpdateKind::ReplaceAddresses => "replace_addresses",
        }
    }
}

impl std::fmt::Display for UpdateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of an update.
///
/// `matched` is 0 when the user does not exist or the update's element
/// filter (order id, address slot) found nothing. Backends that cannot tell
/// whether a matched document actually changed report `modified == matched`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateResult {
    pub matched: u64,
    pub modified: u64,
}

impl UpdateResult {
    pub fn matched_nothing(&self) -> bool {
        self.matched == 0
    }
}

impl UserUpdate {
    pub fn kind(&self) -> UpdateKind {
        match self {
            UserUpdate::PushCartEntries(_) => UpdateKind::PushCartEntries,
            UserUpdate::PullCartEntries(_) => UpdateKind::PullCartEntries,
            UserUpdate::ReplaceCart(_) => UpdateKind::ReplaceCart,
            UserUpdate::PushOrder(_) => UpdateKind::PushOrder,
            UserUpdate::PushOrderItems { .. } => UpdateKind::PushOrderItems,
            UserUpdate::PushAddress(_) => UpdateKind::PushAddress,
            UserUpdate::SetAddressSlot { .. } => UpdateKind::SetAddressSlot,
            UserUpdate::ReplaceAddresses(_) => UpdateKind::ReplaceAddresses,
        }
    }

    /// Applies the update to a decoded user document.
    ///
    /// Returns `None` if the element filter matched nothing (the document is
    /// left untouched), otherwise whether the document changed.
    pub fn apply(self, user: &mut User) -> Option<bool> {
        match self {
            UserUpdate::PushCartEntries(entries) => {
                let changed = !entries.is_empty();
                user.cart.extend(entries);
                Some(changed)
            }
            UserUpdate::PullCartEntries(product_id) => {
                let before = user.cart.len();
                user.cart.retain(|e| e.product_id != product_id);
                Some(user.cart.len() != before)
            }
            UserUpdate::ReplaceCart(cart) => {
                let changed = user.cart != cart;
                user.cart = cart;
                Some(changed)
            }
            UserUpdate::PushOrder(order) => {
                user.orders.push(order);
                Some(true)
            }
            UserUpdate::PushOrderItems { order_id, items } => {
                let order = user.orders.iter_mut().find(|o| o.id == order_id)?;
                let changed = !items.is_empty();
                order.items.extend(items);
                Some(changed)
            }
            UserUpdate::PushAddress(address) => {
                user.addresses.push(address);
                Some(true)
            }
            UserUpdate::SetAddressSlot { slot, fields } => {
                let address = user.addresses.get_mut(slot)?;
                let changed = address.fields != fields;
                address.fields = fields;
                Some(changed)
            }
            UserUpdate::ReplaceAddresses(addresses) => {
                let changed = user.addresses != addresses;
                user.addresses = addresses;
                Some(changed)
            }
        }
    }
}
