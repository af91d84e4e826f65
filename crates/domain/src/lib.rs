//! Cart, checkout and address logic over a document store.
//!
//! This crate provides:
//! - [`CartService`]: cart mutation and cart totals
//! - [`CheckoutService`]: bulk checkout and instant buy
//! - [`AddressService`]: the two-slot home/work address policy
//! - [`CatalogService`]: product listing and search
//! - [`Commerce`]: all of the above sharing one store and one lock registry
//!
//! Every operation runs under a deadline from [`Deadlines`], and every
//! mutation holds the user's lock from [`UserLocks`] for its whole duration.

pub mod address;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod commerce;
pub mod deadline;
pub mod error;
pub mod input;
pub mod locks;

pub use address::{AddressCount, AddressService, AddressSlot, MAX_ADDRESSES};
pub use cart::{CartService, CartSummary, CartTotal};
pub use catalog::CatalogService;
pub use checkout::{CheckoutService, CheckoutStage, CheckoutState};
pub use commerce::Commerce;
pub use deadline::Deadlines;
pub use error::{CommerceError, ErrorKind};
pub use locks::UserLocks;
