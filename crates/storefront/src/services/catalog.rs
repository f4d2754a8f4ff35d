//! Keyset pagination over the product catalog.
//!
//! Products are ordered by id descending. A cursor is the id of the last
//! product of the previous page and is only ever used as a strict upper
//! bound, so:
//! - products inserted after a cursor was issued get larger ids and never
//!   appear on, or shift, later pages of that walk;
//! - deleting the product a cursor names does not break the walk.
//!
//! Pagination is not snapshot-isolated; deletions of not-yet-seen products
//! simply make them absent from later pages.

use tracing::instrument;

use threadline_core::{Product, ProductId};

use crate::config::{CatalogConfig, HasMorePolicy};
use crate::db::{Database, ProductRepository, RepositoryError};

/// One page of the catalog.
#[derive(Debug, Clone)]
pub struct CatalogPage {
    pub products: Vec<Product>,
    pub has_more: bool,
    /// Id of the last product on this page; `None` for an empty page.
    pub next_cursor: Option<ProductId>,
}

/// Cursor pager over the catalog.
pub struct CatalogService<'a> {
    products: ProductRepository<'a>,
    config: CatalogConfig,
}

impl<'a> CatalogService<'a> {
    #[must_use]
    pub const fn new(db: &'a Database, config: CatalogConfig) -> Self {
        Self {
            products: ProductRepository::new(db),
            config,
        }
    }

    /// Effective page size: absent or zero falls back to the default, large
    /// values are clamped to the maximum.
    #[must_use]
    pub fn resolve_limit(&self, requested: Option<u32>) -> u32 {
        match requested {
            None | Some(0) => self.config.default_page_limit,
            Some(limit) => limit.min(self.config.max_page_limit),
        }
    }

    /// The first `limit` products with id below `cursor` (or from the newest
    /// when `cursor` is `None`).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the underlying query fails.
    #[instrument(skip(self), fields(policy = ?self.config.has_more_policy))]
    pub async fn list(
        &self,
        cursor: Option<ProductId>,
        limit: u32,
    ) -> Result<CatalogPage, RepositoryError> {
        let limit = limit.max(1);

        let (products, has_more) = match self.config.has_more_policy {
            HasMorePolicy::LookAhead => {
                let mut products = self
                    .products
                    .list_before(cursor, limit.saturating_add(1))
                    .await?;
                let has_more = products.len() > limit as usize;
                products.truncate(limit as usize);
                (products, has_more)
            }
            HasMorePolicy::Naive => {
                let products = self.products.list_before(cursor, limit).await?;
                let has_more = !products.is_empty();
                (products, has_more)
            }
        };

        let next_cursor = products.last().map(|p| p.id);
        tracing::debug!(
            returned = products.len(),
            has_more,
            next_cursor = ?next_cursor,
            "catalog page served"
        );

        Ok(CatalogPage {
            products,
            has_more,
            next_cursor,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::db::NewProduct;

    async fn seed(db: &Database, count: usize) {
        let repo = ProductRepository::new(db);
        for i in 0..count {
            repo.create(&NewProduct {
                name: format!("Product {i}"),
                description: String::new(),
                price: Decimal::from(10),
                image: vec![],
                tag_ids: vec![],
            })
            .await
            .unwrap();
        }
    }

    fn config(policy: HasMorePolicy) -> CatalogConfig {
        CatalogConfig {
            has_more_policy: policy,
            ..CatalogConfig::default()
        }
    }

    /// Follow cursors until `has_more` is false, recording page sizes.
    async fn walk(
        catalog: &CatalogService<'_>,
        limit: u32,
    ) -> (Vec<ProductId>, Vec<(usize, bool)>) {
        let mut ids = Vec::new();
        let mut pages = Vec::new();
        let mut cursor = None;
        loop {
            let page = catalog.list(cursor, limit).await.unwrap();
            pages.push((page.products.len(), page.has_more));
            ids.extend(page.products.iter().map(|p| p.id));
            cursor = page.next_cursor;
            if !page.has_more {
                break;
            }
        }
        (ids, pages)
    }

    #[tokio::test]
    async fn test_lookahead_25_items_takes_three_calls() {
        let db = Database::memory();
        seed(&db, 25).await;
        let catalog = CatalogService::new(&db, config(HasMorePolicy::LookAhead));

        let (ids, pages) = walk(&catalog, 10).await;
        assert_eq!(pages, vec![(10, true), (10, true), (5, false)]);
        assert_eq!(ids.len(), 25);
    }

    #[tokio::test]
    async fn test_exhaustive_walk_is_complete_descending_and_unique() {
        let db = Database::memory();
        seed(&db, 37).await;

        for policy in [HasMorePolicy::LookAhead, HasMorePolicy::Naive] {
            let catalog = CatalogService::new(&db, config(policy));
            let (ids, _) = walk(&catalog, 10).await;

            let mut expected: Vec<ProductId> = (1..=37).map(ProductId::new).collect();
            expected.reverse();
            assert_eq!(ids, expected, "policy {policy:?}");
        }
    }

    #[tokio::test]
    async fn test_lookahead_exact_multiple_reports_no_more() {
        let db = Database::memory();
        seed(&db, 30).await;
        let catalog = CatalogService::new(&db, config(HasMorePolicy::LookAhead));

        let (_, pages) = walk(&catalog, 10).await;
        assert_eq!(pages, vec![(10, true), (10, true), (10, false)]);
    }

    #[tokio::test]
    async fn test_naive_policy_overreports_on_exhausting_page() {
        let db = Database::memory();
        seed(&db, 30).await;
        let catalog = CatalogService::new(&db, config(HasMorePolicy::Naive));

        // The third page is full and exhausts the collection but still claims
        // more; a fourth, empty call is needed to learn otherwise.
        let (ids, pages) = walk(&catalog, 10).await;
        assert_eq!(pages, vec![(10, true), (10, true), (10, true), (0, false)]);
        assert_eq!(ids.len(), 30);
    }

    #[tokio::test]
    async fn test_naive_policy_with_25_items() {
        let db = Database::memory();
        seed(&db, 25).await;
        let catalog = CatalogService::new(&db, config(HasMorePolicy::Naive));

        let (_, pages) = walk(&catalog, 10).await;
        assert_eq!(pages, vec![(10, true), (10, true), (5, true), (0, false)]);
    }

    #[tokio::test]
    async fn test_empty_catalog() {
        let db = Database::memory();
        for policy in [HasMorePolicy::LookAhead, HasMorePolicy::Naive] {
            let catalog = CatalogService::new(&db, config(policy));
            let page = catalog.list(None, 10).await.unwrap();
            assert!(page.products.is_empty());
            assert!(!page.has_more);
            assert_eq!(page.next_cursor, None);
        }
    }

    #[tokio::test]
    async fn test_head_insert_does_not_shift_issued_cursor() {
        let db = Database::memory();
        seed(&db, 20).await;
        let catalog = CatalogService::new(&db, config(HasMorePolicy::LookAhead));

        let first = catalog.list(None, 10).await.unwrap();
        let cursor = first.next_cursor;
        assert_eq!(cursor, Some(ProductId::new(11)));

        seed(&db, 5).await;

        let second = catalog.list(cursor, 10).await.unwrap();
        let ids: Vec<i64> = second.products.iter().map(|p| p.id.as_i64()).collect();
        assert_eq!(ids, (1..=10).rev().collect::<Vec<_>>());
        assert!(!second.has_more);
    }

    #[tokio::test]
    async fn test_deleting_cursor_item_keeps_walk_valid() {
        let db = Database::memory();
        seed(&db, 15).await;
        let catalog = CatalogService::new(&db, config(HasMorePolicy::LookAhead));

        let first = catalog.list(None, 5).await.unwrap();
        let cursor = first.next_cursor.unwrap();
        assert!(ProductRepository::new(&db).delete(cursor).await.unwrap());

        let second = catalog.list(Some(cursor), 5).await.unwrap();
        let ids: Vec<i64> = second.products.iter().map(|p| p.id.as_i64()).collect();
        assert_eq!(ids, vec![10, 9, 8, 7, 6]);
    }

    #[test]
    fn test_resolve_limit() {
        let db = Database::memory();
        let catalog = CatalogService::new(&db, CatalogConfig::default());
        assert_eq!(catalog.resolve_limit(None), 10);
        assert_eq!(catalog.resolve_limit(Some(0)), 10);
        assert_eq!(catalog.resolve_limit(Some(25)), 25);
        assert_eq!(catalog.resolve_limit(Some(5_000)), 100);
    }
}
