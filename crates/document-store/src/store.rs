use async_trait::async_trait;
use common::{Product, ProductId, User, UserId};

use crate::{GroupRow, Pipeline, ProductFilter, Result, UpdateResult, UserUpdate};

/// Core trait for document store implementations.
///
/// All implementations must be thread-safe (Send + Sync). Each method is a
/// single store call; callers compose them without any transaction.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Inserts a product. Fails with `DuplicateKey` if the id is taken.
    async fn insert_product(&self, product: Product) -> Result<()>;

    /// Finds a product by id.
    ///
    /// Returns None if no such product exists; a stored document that does
    /// not decode fails with `Serialization`.
    async fn find_product(&self, id: ProductId) -> Result<Option<Product>>;

    /// Finds every product passing the filter, in insertion order.
    async fn find_products(&self, filter: ProductFilter) -> Result<Vec<Product>>;

    /// Inserts a user. Fails with `DuplicateKey` if the id is taken.
    async fn insert_user(&self, user: User) -> Result<()>;

    /// Finds a user by id.
    async fn find_user(&self, id: UserId) -> Result<Option<User>>;

    /// Runs an aggregation pipeline over the users collection.
    async fn aggregate_users(&self, pipeline: Pipeline) -> Result<Vec<GroupRow>>;

    /// Applies an update to exactly one user document.
    async fn update_user(&self, id: UserId, update: UserUpdate) -> Result<UpdateResult>;

    /// Short name of the backend, for health reporting.
    fn backend(&self) -> &'static str;

    /// Checks the store can serve requests.
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

/// Extension trait providing convenience methods for document stores.
#[async_trait]
pub trait DocumentStoreExt: DocumentStore {
    /// Checks if a user document exists.
    async fn user_exists(&self, id: UserId) -> Result<bool> {
        Ok(self.find_user(id).await?.is_some())
    }

    /// Inserts several products in order, stopping at the first failure.
    async fn insert_products(&self, products: Vec<Product>) -> Result<()> {
        for product in products {
            self.insert_product(product).await?;
        }
        Ok(())
    }
}

// Blanket implementation for all DocumentStore implementations
impl<T: DocumentStore + ?Sized> DocumentStoreExt for T {}
