use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use common::{Product, ProductId, User, UserId};
use serde_json::Value;
use tokio::sync::RwLock;

use crate::{
    GroupRow, Pipeline, ProductFilter, Result, StoreError, UpdateKind, UpdateResult, UserUpdate,
    store::DocumentStore,
};

#[derive(Debug, Default)]
struct Faults {
    latency: Option<Duration>,
    failing_updates: HashSet<UpdateKind>,
    fail_aggregations: bool,
}

/// In-memory document store for testing and single-process runs.
///
/// Documents are kept as JSON values and decoded on every read, so a stored
/// document of the wrong shape surfaces as a `Serialization` error exactly
/// as it would from a real database. Latency and per-update failures can be
/// injected to exercise timeouts and partially applied operations.
#[derive(Clone, Default)]
pub struct InMemoryDocumentStore {
    products: Arc<RwLock<Vec<(ProductId, Value)>>>,
    users: Arc<RwLock<HashMap<UserId, Value>>>,
    faults: Arc<Mutex<Faults>>,
}

impl InMemoryDocumentStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored products.
    pub async fn product_count(&self) -> usize {
        self.products.read().await.len()
    }

    /// Returns the number of stored users.
    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }

    /// Overwrites a catalog product in place, inserting it if absent.
    pub async fn replace_product(&self, product: Product) -> Result<()> {
        let doc = serde_json::to_value(&product)?;
        let mut products = self.products.write().await;
        match products.iter_mut().find(|(id, _)| *id == product.id) {
            Some((_, existing)) => *existing = doc,
            None => products.push((product.id, doc)),
        }
        Ok(())
    }

    /// Stores a raw product document without checking its shape.
    pub async fn insert_raw_product(&self, id: ProductId, doc: Value) {
        self.products.write().await.push((id, doc));
    }

    /// Clears all documents and faults.
    pub async fn clear(&self) {
        self.products.write().await.clear();
        self.users.write().await.clear();
        self.clear_faults();
    }

    /// Delays every subsequent store call by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        self.faults().latency = Some(latency);
    }

    /// Makes every subsequent update of the given kind fail.
    pub fn fail_update(&self, kind: UpdateKind) {
        self.faults().failing_updates.insert(kind);
    }

    /// Configures whether aggregation pipelines fail.
    pub fn set_fail_aggregations(&self, fail: bool) {
        self.faults().fail_aggregations = fail;
    }

    /// Removes all injected latency and failures.
    pub fn clear_faults(&self) {
        *self.faults() = Faults::default();
    }

    fn faults(&self) -> std::sync::MutexGuard<'_, Faults> {
        self.faults.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn delay(&self) {
        let latency = self.faults().latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn insert_product(&self, product: Product) -> Result<()> {
        self.delay().await;
        let doc = serde_json::to_value(&product)?;

        let mut products = self.products.write().await;
        if products.iter().any(|(id, _)| *id == product.id) {
            return Err(StoreError::DuplicateKey {
                collection: "products",
                id: product.id.to_string(),
            });
        }
        products.push((product.id, doc));
        Ok(())
    }

    async fn find_product(&self, id: ProductId) -> Result<Option<Product>> {
        self.delay().await;
        let products = self.products.read().await;
        products
            .iter()
            .find(|(pid, _)| *pid == id)
            .map(|(_, doc)| serde_json::from_value(doc.clone()).map_err(StoreError::from))
            .transpose()
    }

    async fn find_products(&self, filter: ProductFilter) -> Result<Vec<Product>> {
        self.delay().await;
        let products = self.products.read().await;
        let mut found = Vec::new();
        for (_, doc) in products.iter() {
            let product: Product = serde_json::from_value(doc.clone())?;
            if filter.matches_name(&product.name) {
                found.push(product);
            }
        }
        Ok(found)
    }

    async fn insert_user(&self, user: User) -> Result<()> {
        self.delay().await;
        let doc = serde_json::to_value(&user)?;

        let mut users = self.users.write().await;
        if users.contains_key(&user.id) {
            return Err(StoreError::DuplicateKey {
                collection: "users",
                id: user.id.to_string(),
            });
        }
        users.insert(user.id, doc);
        Ok(())
    }

    async fn find_user(&self, id: UserId) -> Result<Option<User>> {
        self.delay().await;
        let users = self.users.read().await;
        users
            .get(&id)
            .map(|doc| serde_json::from_value(doc.clone()).map_err(StoreError::from))
            .transpose()
    }

    async fn aggregate_users(&self, pipeline: Pipeline) -> Result<Vec<GroupRow>> {
        self.delay().await;
        let fail = self.faults().fail_aggregations;
        if fail {
            return Err(StoreError::Unavailable(
                "injected aggregation failure".to_string(),
            ));
        }
        pipeline.validate()?;

        let users = self.users.read().await;
        let decoded = match pipeline.matched_user() {
            Some(id) => users
                .get(&id)
                .map(|doc| serde_json::from_value::<User>(doc.clone()))
                .into_iter()
                .collect::<std::result::Result<Vec<_>, _>>()?,
            None => users
                .values()
                .map(|doc| serde_json::from_value::<User>(doc.clone()))
                .collect::<std::result::Result<Vec<_>, _>>()?,
        };

        pipeline.evaluate(&decoded)
    }

    async fn update_user(&self, id: UserId, update: UserUpdate) -> Result<UpdateResult> {
        self.delay().await;
        let kind = update.kind();
        let fail = self.faults().failing_updates.contains(&kind);
        if fail {
            return Err(StoreError::Unavailable(format!("injected failure on {kind}")));
        }

        let mut users = self.users.write().await;
        let Some(doc) = users.get_mut(&id) else {
            return Ok(UpdateResult::default());
        };

        let mut user: User = serde_json::from_value(doc.clone())?;
        let Some(changed) = update.apply(&mut user) else {
            return Ok(UpdateResult::default());
        };
        *doc = serde_json::to_value(&user)?;

        tracing::trace!(user_id = %id, %kind, changed, "user document updated");
        Ok(UpdateResult {
            matched: 1,
            modified: u64::from(changed),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{CartEntry, Money};

    fn product(name: &str, cents: i64) -> Product {
        Product::new(name, Money::from_cents(cents), format!("{name}.png"))
    }

    async fn store_with_user() -> (InMemoryDocumentStore, UserId) {
        let store = InMemoryDocumentStore::new();
        let user = User::new("Test", "User", "test@example.com");
        let id = user.id;
        store.insert_user(user).await.unwrap();
        (store, id)
    }

    #[tokio::test]
    async fn insert_and_find_product() {
        let store = InMemoryDocumentStore::new();
        let widget = product("Widget", 1000);
        let id = widget.id;

        store.insert_product(widget.clone()).await.unwrap();

        assert_eq!(store.find_product(id).await.unwrap(), Some(widget));
        assert_eq!(store.find_product(ProductId::new()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn duplicate_product_is_rejected() {
        let store = InMemoryDocumentStore::new();
        let widget = product("Widget", 1000);

        store.insert_product(widget.clone()).await.unwrap();
        let result = store.insert_product(widget).await;

        assert!(matches!(
            result,
            Err(StoreError::DuplicateKey {
                collection: "products",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn find_products_filters_by_name_in_insertion_order() {
        let store = InMemoryDocumentStore::new();
        store.insert_product(product("Blue Mug", 500)).await.unwrap();
        store.insert_product(product("Lamp", 2500)).await.unwrap();
        store.insert_product(product("Red Mug", 700)).await.unwrap();

        let mugs = store
            .find_products(ProductFilter::name_contains("Mug"))
            .await
            .unwrap();
        let names: Vec<_> = mugs.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Blue Mug", "Red Mug"]);

        let all = store.find_products(ProductFilter::All).await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn malformed_product_fails_to_decode() {
        let store = InMemoryDocumentStore::new();
        let id = ProductId::new();
        store
            .insert_raw_product(id, serde_json::json!({ "id": id, "price": "free" }))
            .await;

        let err = store.find_product(id).await.unwrap_err();
        assert!(err.is_decoding());
    }

    #[tokio::test]
    async fn update_missing_user_matches_nothing() {
        let store = InMemoryDocumentStore::new();
        let result = store
            .update_user(UserId::new(), UserUpdate::ReplaceCart(vec![]))
            .await
            .unwrap();
        assert!(result.matched_nothing());
    }

    #[tokio::test]
    async fn push_then_aggregate_cart() {
        let (store, user_id) = store_with_user().await;
        let entries = vec![
            CartEntry::snapshot(&product("A", 1000)),
            CartEntry::snapshot(&product("B", 2000)),
        ];

        let result = store
            .update_user(user_id, UserUpdate::PushCartEntries(entries))
            .await
            .unwrap();
        assert_eq!(result, UpdateResult { matched: 1, modified: 1 });

        let rows = store
            .aggregate_users(
                Pipeline::new()
                    .match_user(user_id)
                    .unwind(crate::UserArray::Cart)
                    .group(crate::Accumulator::SumPrice),
            )
            .await
            .unwrap();
        assert_eq!(rows, vec![GroupRow { id: user_id, value: 3000 }]);
    }

    #[tokio::test]
    async fn injected_update_failure_leaves_document_unchanged() {
        let (store, user_id) = store_with_user().await;
        store.fail_update(UpdateKind::PushCartEntries);

        let result = store
            .update_user(
                user_id,
                UserUpdate::PushCartEntries(vec![CartEntry::snapshot(&product("A", 1))]),
            )
            .await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));

        let user = store.find_user(user_id).await.unwrap().unwrap();
        assert!(user.cart.is_empty());

        store.clear_faults();
        store
            .update_user(user_id, UserUpdate::ReplaceCart(vec![]))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn injected_aggregation_failure() {
        let (store, user_id) = store_with_user().await;
        store.set_fail_aggregations(true);

        let result = store
            .aggregate_users(
                Pipeline::new()
                    .match_user(user_id)
                    .group(crate::Accumulator::Count),
            )
            .await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }

    #[tokio::test]
    async fn replace_product_does_not_touch_cart_snapshots() {
        let (store, user_id) = store_with_user().await;
        let mut widget = product("Widget", 1000);
        store.insert_product(widget.clone()).await.unwrap();
        store
            .update_user(
                user_id,
                UserUpdate::PushCartEntries(vec![CartEntry::snapshot(&widget)]),
            )
            .await
            .unwrap();

        widget.price = Money::from_cents(9999);
        store.replace_product(widget.clone()).await.unwrap();

        let user = store.find_user(user_id).await.unwrap().unwrap();
        assert_eq!(user.cart[0].price, Money::from_cents(1000));
        assert_eq!(
            store.find_product(widget.id).await.unwrap().unwrap().price,
            Money::from_cents(9999)
        );
    }

    #[tokio::test]
    async fn clear_removes_everything() {
        let (store, _) = store_with_user().await;
        store.insert_product(product("A", 1)).await.unwrap();

        store.clear().await;

        assert_eq!(store.user_count().await, 0);
        assert_eq!(store.product_count().await, 0);
    }
}
