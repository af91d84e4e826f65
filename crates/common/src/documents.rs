//! Document shapes stored in the `products` and `users` collections.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AddressId, Money, OrderId, ProductId, UserId};

/// A catalog product. Read-only to the cart and checkout logic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    pub image: String,
}

impl Product {
    pub fn new(name: impl Into<String>, price: Money, image: impl Into<String>) -> Self {
        Self {
            id: ProductId::new(),
            name: name.into(),
            price,
            image: image.into(),
        }
    }
}

/// Denormalized copy of a [`Product`] taken when it enters a cart or order.
///
/// Later catalog changes never reach an existing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartEntry {
    pub product_id: ProductId,
    pub name: String,
    pub price: Money,
    pub image: String,
}

impl CartEntry {
    /// Copies the product's current fields.
    pub fn snapshot(product: &Product) -> Self {
        Self {
            product_id: product.id,
            name: product.name.clone(),
            price: product.price,
            image: product.image.clone(),
        }
    }
}

/// How an order is paid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub digital: bool,
    pub cash_on_delivery: bool,
}

impl PaymentMethod {
    pub fn cash_on_delivery() -> Self {
        Self {
            digital: false,
            cash_on_delivery: true,
        }
    }
}

impl Default for PaymentMethod {
    fn default() -> Self {
        Self::cash_on_delivery()
    }
}

/// An order in a user's history. Never modified once checkout completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub ordered_at: DateTime<Utc>,
    pub price: Money,
    #[serde(default)]
    pub discount: Option<Money>,
    #[serde(default)]
    pub payment: PaymentMethod,
    #[serde(default)]
    pub items: Vec<CartEntry>,
}

impl Order {
    /// A fresh, item-less order stamped with the current time.
    pub fn new(price: Money) -> Self {
        Self::with_id(OrderId::new(), price)
    }

    /// Like [`Order::new`], with an id chosen by the caller.
    pub fn with_id(id: OrderId, price: Money) -> Self {
        Self {
            id,
            ordered_at: Utc::now(),
            price,
            discount: None,
            payment: PaymentMethod::default(),
            items: Vec::new(),
        }
    }
}

/// The four scalar fields of an address, written together on edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressFields {
    pub house: String,
    pub street: String,
    pub city: String,
    pub postal_code: String,
}

/// A stored address. Its role (home or work) is its position in the list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub id: AddressId,
    #[serde(flatten)]
    pub fields: AddressFields,
}

impl Address {
    pub fn new(fields: AddressFields) -> Self {
        Self {
            id: AddressId::new(),
            fields,
        }
    }
}

/// A user document with its embedded cart, addresses and order history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub cart: Vec<CartEntry>,
    #[serde(default)]
    pub addresses: Vec<Address>,
    #[serde(default)]
    pub orders: Vec<Order>,
}

impl User {
    /// A new user with an empty cart, no addresses and no orders.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            id: UserId::new(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            created_at: Utc::now(),
            cart: Vec::new(),
            addresses: Vec::new(),
            orders: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_copies_product_fields() {
        let product = Product::new("Widget", Money::from_cents(1000), "widget.png");
        let entry = CartEntry::snapshot(&product);

        assert_eq!(entry.product_id, product.id);
        assert_eq!(entry.name, "Widget");
        assert_eq!(entry.price, Money::from_cents(1000));
        assert_eq!(entry.image, "widget.png");
    }

    #[test]
    fn new_order_defaults_to_cash_on_delivery() {
        let order = Order::new(Money::from_cents(500));
        assert!(order.payment.cash_on_delivery);
        assert!(!order.payment.digital);
        assert!(order.items.is_empty());
        assert_eq!(order.discount, None);
    }

    #[test]
    fn address_fields_are_flattened() {
        let address = Address::new(AddressFields {
            house: "12".into(),
            street: "Main St".into(),
            city: "Springfield".into(),
            postal_code: "12345".into(),
        });
        let json = serde_json::to_value(&address).unwrap();
        assert_eq!(json["city"], "Springfield");
        assert_eq!(json["postal_code"], "12345");
        assert!(json.get("fields").is_none());
    }

    #[test]
    fn user_without_embedded_arrays_decodes_empty() {
        let json = serde_json::json!({
            "id": UserId::new(),
            "first_name": "Ada",
            "last_name": "Lovelace",
            "email": "ada@example.com",
            "created_at": "2024-01-01T00:00:00Z",
        });
        let user: User = serde_json::from_value(json).unwrap();
        assert!(user.cart.is_empty());
        assert!(user.addresses.is_empty());
        assert!(user.orders.is_empty());
    }
}
