//! Facade bundling every service over one store.

use std::sync::Arc;

use document_store::DocumentStore;

use crate::address::AddressService;
use crate::cart::CartService;
use crate::catalog::CatalogService;
use crate::checkout::CheckoutService;
use crate::deadline::Deadlines;
use crate::locks::UserLocks;

/// All commerce services sharing one store handle and one lock registry, so
/// cart, checkout and address operations on the same user are serialized
/// against each other.
pub struct Commerce<S: DocumentStore> {
    store: Arc<S>,
    cart: CartService<S>,
    checkout: CheckoutService<S>,
    addresses: AddressService<S>,
    catalog: CatalogService<S>,
}

impl<S: DocumentStore> Commerce<S> {
    pub fn new(store: S) -> Self {
        Self::with_deadlines(store, Deadlines::default())
    }

    pub fn with_deadlines(store: S, deadlines: Deadlines) -> Self {
        let store = Arc::new(store);
        let locks = UserLocks::new();
        Self {
            cart: CartService::new(store.clone(), locks.clone(), deadlines),
            checkout: CheckoutService::new(store.clone(), locks.clone(), deadlines),
            addresses: AddressService::new(store.clone(), locks, deadlines),
            catalog: CatalogService::new(store.clone(), deadlines),
            store,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn cart(&self) -> &CartService<S> {
        &self.cart
    }

    pub fn checkout(&self) -> &CheckoutService<S> {
        &self.checkout
    }

    pub fn addresses(&self) -> &AddressService<S> {
        &self.addresses
    }

    pub fn catalog(&self) -> &CatalogService<S> {
        &self.catalog
    }
}
