//! Shared types for the commerce backend.
//!
//! Identifiers, money, and the document shapes that live in the `products`
//! and `users` collections.

pub mod documents;
pub mod ids;
pub mod money;

pub use documents::{
    Address, AddressFields, CartEntry, Order, PaymentMethod, Product, User,
};
pub use ids::{AddressId, IdParseError, OrderId, ProductId, UserId};
pub use money::Money;
