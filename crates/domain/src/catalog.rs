//! Read-only catalog queries.

use std::sync::Arc;

use common::Product;
use document_store::{DocumentStore, ProductFilter};

use crate::deadline::{Deadlines, with_deadline};
use crate::error::CommerceError;
use crate::input;

/// Service listing and searching catalog products.
pub struct CatalogService<S: DocumentStore> {
    store: Arc<S>,
    deadlines: Deadlines,
}

impl<S: DocumentStore> CatalogService<S> {
    pub fn new(store: Arc<S>, deadlines: Deadlines) -> Self {
        Self { store, deadlines }
    }

    /// Returns every product in insertion order.
    #[tracing::instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>, CommerceError> {
        with_deadline("list_products", self.deadlines.catalog, async {
            self.store
                .find_products(ProductFilter::All)
                .await
                .map_err(CommerceError::product_lookup)
        })
        .await
    }

    /// Returns products whose name contains `query`, case-sensitively.
    #[tracing::instrument(skip(self))]
    pub async fn search_products(&self, query: &str) -> Result<Vec<Product>, CommerceError> {
        let query = input::search_query(query)?;
        with_deadline("search_products", self.deadlines.catalog, async {
            self.store
                .find_products(ProductFilter::name_contains(query))
                .await
                .map_err(CommerceError::product_lookup)
        })
        .await
    }
}
