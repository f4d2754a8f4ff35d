//! Product and tag repository.
//!
//! Listing is keyset-based: rows are ordered by id descending and the
//! boundary is a strict `id < before`, so a page boundary never depends on
//! the boundary row still existing.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;

use threadline_core::{Product, ProductId, Tag, TagId, TagRef};

use super::memory::{MemoryStore, ProductRecord};
use super::{Database, RepositoryError, map_unique_violation};

/// Input for creating a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub image: Vec<String>,
    pub tag_ids: Vec<TagId>,
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    description: String,
    price: Decimal,
    images: Vec<String>,
    tags: Json<Vec<Tag>>,
    created_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            name: row.name,
            description: row.description,
            price: row.price,
            image: row.images,
            tags: row.tags.0.into_iter().map(TagRef::Populated).collect(),
            date: row.created_at,
        }
    }
}

const SELECT_PRODUCTS: &str = r"
    SELECT p.id, p.name, p.description, p.price, p.images, p.created_at,
           COALESCE(
               json_agg(json_build_object('id', t.id, 'name', t.name) ORDER BY t.id)
                   FILTER (WHERE t.id IS NOT NULL),
               '[]'::json
           ) AS tags
    FROM shop.product p
    LEFT JOIN shop.product_tag pt ON pt.product_id = p.id
    LEFT JOIN shop.tag t ON t.id = pt.tag_id
";

/// Repository for catalog database operations.
pub struct ProductRepository<'a> {
    db: &'a Database,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Up to `fetch` products with id strictly below `before` (or from the
    /// newest when `before` is `None`), newest first, tags populated.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_before(
        &self,
        before: Option<ProductId>,
        fetch: u32,
    ) -> Result<Vec<Product>, RepositoryError> {
        match self.db {
            Database::Memory(store) => {
                let products = store.products.read().await;
                let upper = before.map_or(std::ops::Bound::Unbounded, std::ops::Bound::Excluded);
                let rows: Vec<ProductRecord> = products
                    .range((std::ops::Bound::Unbounded, upper))
                    .rev()
                    .take(fetch as usize)
                    .map(|(_, record)| record.clone())
                    .collect();
                drop(products);
                Ok(populate(store, rows).await)
            }
            Database::Postgres(pool) => {
                let sql = format!(
                    "{SELECT_PRODUCTS}
                    WHERE ($1::BIGINT IS NULL OR p.id < $1)
                    GROUP BY p.id
                    ORDER BY p.id DESC
                    LIMIT $2"
                );
                let rows: Vec<ProductRow> = sqlx::query_as(&sql)
                    .bind(before)
                    .bind(i64::from(fetch))
                    .fetch_all(pool)
                    .await?;
                Ok(rows.into_iter().map(Product::from).collect())
            }
        }
    }

    /// Get a product by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        match self.db {
            Database::Memory(store) => {
                let record = store.products.read().await.get(&id).cloned();
                match record {
                    Some(record) => Ok(populate(store, vec![record]).await.pop()),
                    None => Ok(None),
                }
            }
            Database::Postgres(pool) => {
                let sql = format!("{SELECT_PRODUCTS} WHERE p.id = $1 GROUP BY p.id");
                let row: Option<ProductRow> = sqlx::query_as(&sql)
                    .bind(id)
                    .fetch_optional(pool)
                    .await?;
                Ok(row.map(Product::from))
            }
        }
    }

    /// Create a product. Every tag id must already exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if a tag does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, new: &NewProduct) -> Result<Product, RepositoryError> {
        let id = match self.db {
            Database::Memory(store) => {
                {
                    let tags = store.tags.read().await;
                    if !new.tag_ids.iter().all(|id| tags.contains_key(id)) {
                        return Err(RepositoryError::NotFound);
                    }
                }
                let mut products = store.products.write().await;
                let id = store.next_product_id();
                products.insert(
                    id,
                    ProductRecord {
                        id,
                        name: new.name.clone(),
                        description: new.description.clone(),
                        price: new.price,
                        image: new.image.clone(),
                        tag_ids: new.tag_ids.clone(),
                        created_at: Utc::now(),
                    },
                );
                id
            }
            Database::Postgres(pool) => {
                let mut tx = pool.begin().await?;

                let id: ProductId = sqlx::query_scalar(
                    r"
                    INSERT INTO shop.product (name, description, price, images)
                    VALUES ($1, $2, $3, $4)
                    RETURNING id
                    ",
                )
                .bind(&new.name)
                .bind(&new.description)
                .bind(new.price)
                .bind(&new.image)
                .fetch_one(&mut *tx)
                .await?;

                for tag_id in &new.tag_ids {
                    sqlx::query(
                        "INSERT INTO shop.product_tag (product_id, tag_id) VALUES ($1, $2)",
                    )
                    .bind(id)
                    .bind(tag_id)
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| match e {
                        sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                            RepositoryError::NotFound
                        }
                        other => RepositoryError::Database(other),
                    })?;
                }

                tx.commit().await?;
                id
            }
        };

        self.get(id).await?.ok_or_else(|| {
            RepositoryError::DataCorruption(format!("product {id} vanished after insert"))
        })
    }

    /// Delete a product. Returns whether a row was removed.
    ///
    /// Carts may still reference the id afterwards.
    #[cfg(test)]
    pub(crate) async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        match self.db {
            Database::Memory(store) => Ok(store.products.write().await.remove(&id).is_some()),
            Database::Postgres(pool) => {
                let result = sqlx::query("DELETE FROM shop.product WHERE id = $1")
                    .bind(id)
                    .execute(pool)
                    .await?;
                Ok(result.rows_affected() > 0)
            }
        }
    }

    /// Create a tag.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name is taken.
    pub async fn create_tag(&self, name: &str) -> Result<Tag, RepositoryError> {
        match self.db {
            Database::Memory(store) => {
                let mut tags = store.tags.write().await;
                if tags.values().any(|t| t.name == name) {
                    return Err(RepositoryError::Conflict("tag already exists".to_owned()));
                }
                let tag = Tag {
                    id: store.next_tag_id(),
                    name: name.to_owned(),
                };
                tags.insert(tag.id, tag.clone());
                Ok(tag)
            }
            Database::Postgres(pool) => {
                let id: TagId =
                    sqlx::query_scalar("INSERT INTO shop.tag (name) VALUES ($1) RETURNING id")
                        .bind(name)
                        .fetch_one(pool)
                        .await
                        .map_err(|e| map_unique_violation(e, "tag"))?;
                Ok(Tag {
                    id,
                    name: name.to_owned(),
                })
            }
        }
    }

    /// Find a tag by exact name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_tag(&self, name: &str) -> Result<Option<Tag>, RepositoryError> {
        match self.db {
            Database::Memory(store) => Ok(store
                .tags
                .read()
                .await
                .values()
                .find(|t| t.name == name)
                .cloned()),
            Database::Postgres(pool) => {
                let row: Option<(TagId, String)> =
                    sqlx::query_as("SELECT id, name FROM shop.tag WHERE name = $1")
                        .bind(name)
                        .fetch_optional(pool)
                        .await?;
                Ok(row.map(|(id, name)| Tag { id, name }))
            }
        }
    }
}

/// Resolve tag ids to populated tags; ids without a tag row are dropped.
async fn populate(store: &MemoryStore, rows: Vec<ProductRecord>) -> Vec<Product> {
    let tags = store.tags.read().await;
    rows.into_iter()
        .map(|record| {
            let mut product_tags: Vec<Tag> = record
                .tag_ids
                .iter()
                .filter_map(|id| tags.get(id).cloned())
                .collect();
            product_tags.sort_by_key(|t| t.id);
            Product {
                id: record.id,
                name: record.name,
                description: record.description,
                price: record.price,
                image: record.image,
                tags: product_tags.into_iter().map(TagRef::Populated).collect(),
                date: record.created_at,
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn new_product(name: &str, price: i64) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            description: String::new(),
            price: Decimal::from(price),
            image: vec![],
            tag_ids: vec![],
        }
    }

    #[tokio::test]
    async fn test_memory_ids_increase_and_list_descends() {
        let db = Database::memory();
        let repo = ProductRepository::new(&db);
        for i in 0..5 {
            repo.create(&new_product(&format!("p{i}"), 10)).await.unwrap();
        }

        let page = repo.list_before(None, 3).await.unwrap();
        let ids: Vec<i64> = page.iter().map(|p| p.id.as_i64()).collect();
        assert_eq!(ids, vec![5, 4, 3]);

        let next = repo.list_before(Some(ProductId::new(3)), 3).await.unwrap();
        let ids: Vec<i64> = next.iter().map(|p| p.id.as_i64()).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[tokio::test]
    async fn test_memory_tags_are_populated() {
        let db = Database::memory();
        let repo = ProductRepository::new(&db);
        let linen = repo.create_tag("linen").await.unwrap();
        let product = repo
            .create(&NewProduct {
                tag_ids: vec![linen.id],
                ..new_product("shirt", 20)
            })
            .await
            .unwrap();

        assert_eq!(product.tags, vec![TagRef::Populated(linen)]);
    }

    #[tokio::test]
    async fn test_memory_create_rejects_unknown_tag() {
        let db = Database::memory();
        let repo = ProductRepository::new(&db);
        let result = repo
            .create(&NewProduct {
                tag_ids: vec![TagId::new(99)],
                ..new_product("shirt", 20)
            })
            .await;
        assert!(matches!(result, Err(RepositoryError::NotFound)));
    }

    #[tokio::test]
    async fn test_memory_duplicate_tag_conflicts() {
        let db = Database::memory();
        let repo = ProductRepository::new(&db);
        repo.create_tag("linen").await.unwrap();
        assert!(matches!(
            repo.create_tag("linen").await,
            Err(RepositoryError::Conflict(_))
        ));
    }
}
