use async_trait::async_trait;
use common::{Product, ProductId, User, UserId};
use futures_util::TryStreamExt;
use serde::de::DeserializeOwned;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    Accumulator, GroupRow, Pipeline, ProductFilter, Result, StoreError, UpdateResult, UserUpdate,
    store::DocumentStore,
};

/// SQLSTATE raised when a cast or sum leaves the bigint range.
const NUMERIC_VALUE_OUT_OF_RANGE: &str = "22003";

/// PostgreSQL-backed document store.
///
/// Each collection is a table of `(id, doc jsonb)` rows. Every update is a
/// single `UPDATE ... WHERE id = $1` statement, so one call touches exactly
/// one user document and no call spans a transaction.
#[derive(Clone)]
pub struct PostgresDocumentStore {
    pool: PgPool,
}

impl PostgresDocumentStore {
    /// Creates a new store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to the database at `url`.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPool::connect(url).await?;
        Ok(Self::new(pool))
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn decode<T: DeserializeOwned>(row: &PgRow) -> Result<T> {
        let doc: serde_json::Value = row.try_get("doc")?;
        Ok(serde_json::from_value(doc)?)
    }

    fn insert_error(e: sqlx::Error, collection: &'static str, id: Uuid) -> StoreError {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return StoreError::DuplicateKey {
                collection,
                id: id.to_string(),
            };
        }
        StoreError::Database(e)
    }

    fn aggregate_error(e: sqlx::Error) -> StoreError {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.code().as_deref() == Some(NUMERIC_VALUE_OUT_OF_RANGE)
        {
            return StoreError::AggregateOverflow;
        }
        StoreError::Database(e)
    }

    fn pipeline_sql(pipeline: &Pipeline, accumulator: Accumulator) -> String {
        let value = match accumulator {
            Accumulator::SumPrice => "COALESCE(SUM((e.elem->>'price')::bigint), 0)::bigint",
            Accumulator::Count => "COUNT(*)::bigint",
        };

        let mut sql = format!("SELECT u.id AS id, {value} AS value FROM users AS u");
        if let Some(array) = pipeline.unwound() {
            sql.push_str(&format!(
                " CROSS JOIN LATERAL jsonb_array_elements(COALESCE(u.doc->'{}', '[]'::jsonb)) AS e(elem)",
                array.field()
            ));
        }
        if pipeline.matched_user().is_some() {
            sql.push_str(" WHERE u.id = $1");
        }
        sql.push_str(" GROUP BY u.id ORDER BY u.seq");
        sql
    }
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn insert_product(&self, product: Product) -> Result<()> {
        let id = product.id.as_uuid();
        let doc = serde_json::to_value(&product)?;

        sqlx::query("INSERT INTO products (id, doc) VALUES ($1, $2)")
            .bind(id)
            .bind(doc)
            .execute(&self.pool)
            .await
            .map_err(|e| Self::insert_error(e, "products", id))?;

        Ok(())
    }

    async fn find_product(&self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query("SELECT doc FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::decode).transpose()
    }

    async fn find_products(&self, filter: ProductFilter) -> Result<Vec<Product>> {
        let query = match &filter {
            ProductFilter::All => sqlx::query("SELECT doc FROM products ORDER BY seq"),
            ProductFilter::NameContains(text) => sqlx::query(
                "SELECT doc FROM products WHERE strpos(doc->>'name', $1) > 0 ORDER BY seq",
            )
            .bind(text.as_str()),
        };

        let mut rows = query.fetch(&self.pool);
        let mut products = Vec::new();
        while let Some(row) = rows.try_next().await? {
            products.push(Self::decode(&row)?);
        }
        Ok(products)
    }

    async fn insert_user(&self, user: User) -> Result<()> {
        let id = user.id.as_uuid();
        let doc = serde_json::to_value(&user)?;

        sqlx::query("INSERT INTO users (id, doc) VALUES ($1, $2)")
            .bind(id)
            .bind(doc)
            .execute(&self.pool)
            .await
            .map_err(|e| Self::insert_error(e, "users", id))?;

        Ok(())
    }

    async fn find_user(&self, id: UserId) -> Result<Option<User>> {
        let row = sqlx::query("SELECT doc FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::decode).transpose()
    }

    async fn aggregate_users(&self, pipeline: Pipeline) -> Result<Vec<GroupRow>> {
        let accumulator = pipeline.validate()?;
        let sql = Self::pipeline_sql(&pipeline, accumulator);

        let mut query = sqlx::query(&sql);
        if let Some(id) = pipeline.matched_user() {
            query = query.bind(id.as_uuid());
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(Self::aggregate_error)?;
        rows.iter()
            .map(|row| -> Result<GroupRow> {
                Ok(GroupRow {
                    id: UserId::from_uuid(row.try_get::<Uuid, _>("id")?),
                    value: row.try_get::<i64, _>("value")?,
                })
            })
            .collect()
    }

    async fn update_user(&self, id: UserId, update: UserUpdate) -> Result<UpdateResult> {
        let kind = update.kind();
        let user_id = id.as_uuid();

        let query = match update {
            UserUpdate::PushCartEntries(entries) => sqlx::query(
                "UPDATE users SET doc = jsonb_set(doc, '{cart}', \
                 COALESCE(doc->'cart', '[]'::jsonb) || $2::jsonb) WHERE id = $1",
            )
            .bind(user_id)
            .bind(serde_json::to_value(&entries)?),

            UserUpdate::PullCartEntries(product_id) => sqlx::query(
                "UPDATE users SET doc = jsonb_set(doc, '{cart}', COALESCE(\
                 (SELECT jsonb_agg(e.elem ORDER BY e.ord) \
                  FROM jsonb_array_elements(doc->'cart') WITH ORDINALITY AS e(elem, ord) \
                  WHERE e.elem->>'product_id' <> $2), \
                 '[]'::jsonb)) WHERE id = $1",
            )
            .bind(user_id)
            .bind(product_id.to_string()),

            UserUpdate::ReplaceCart(cart) => {
                sqlx::query("UPDATE users SET doc = jsonb_set(doc, '{cart}', $2::jsonb) WHERE id = $1")
                    .bind(user_id)
                    .bind(serde_json::to_value(&cart)?)
            }

            UserUpdate::PushOrder(order) => sqlx::query(
                "UPDATE users SET doc = jsonb_set(doc, '{orders}', \
                 COALESCE(doc->'orders', '[]'::jsonb) || jsonb_build_array($2::jsonb)) WHERE id = $1",
            )
            .bind(user_id)
            .bind(serde_json::to_value(&order)?),

            UserUpdate::PushOrderItems { order_id, items } => sqlx::query(
                "UPDATE users AS u SET doc = jsonb_set(u.doc, ARRAY['orders', o.idx::text, 'items'], \
                 COALESCE(u.doc->'orders'->o.idx->'items', '[]'::jsonb) || $3::jsonb) \
                 FROM (SELECT (e.ord - 1)::int AS idx \
                       FROM users AS s, jsonb_array_elements(s.doc->'orders') WITH ORDINALITY AS e(elem, ord) \
                       WHERE s.id = $1 AND e.elem->>'id' = $2 LIMIT 1) AS o \
                 WHERE u.id = $1",
            )
            .bind(user_id)
            .bind(order_id.to_string())
            .bind(serde_json::to_value(&items)?),

            UserUpdate::PushAddress(address) => sqlx::query(
                "UPDATE users SET doc = jsonb_set(doc, '{addresses}', \
                 COALESCE(doc->'addresses', '[]'::jsonb) || jsonb_build_array($2::jsonb)) WHERE id = $1",
            )
            .bind(user_id)
            .bind(serde_json::to_value(&address)?),

            UserUpdate::SetAddressSlot { slot, fields } => sqlx::query(
                "UPDATE users SET doc = jsonb_set(doc, ARRAY['addresses', $2::text], \
                 (doc->'addresses'->$2) || $3::jsonb) \
                 WHERE id = $1 AND jsonb_array_length(COALESCE(doc->'addresses', '[]'::jsonb)) > $2",
            )
            .bind(user_id)
            .bind(i32::try_from(slot).unwrap_or(i32::MAX))
            .bind(serde_json::to_value(&fields)?),

            UserUpdate::ReplaceAddresses(addresses) => sqlx::query(
                "UPDATE users SET doc = jsonb_set(doc, '{addresses}', $2::jsonb) WHERE id = $1",
            )
            .bind(user_id)
            .bind(serde_json::to_value(&addresses)?),
        };

        let matched = query.execute(&self.pool).await?.rows_affected();
        tracing::debug!(%id, %kind, matched, "user document updated");

        Ok(UpdateResult {
            matched,
            modified: matched,
        })
    }
}
