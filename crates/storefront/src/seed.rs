//! Catalog seeding.
//!
//! A [`CatalogSeed`] is the YAML document accepted by `threadline-cli seed`,
//! or generated demo data. Tags are referenced by name and created on demand;
//! products are always inserted, so seeding twice duplicates them.

use rust_decimal::Decimal;
use serde::Deserialize;

use threadline_core::TagId;

use crate::db::{Database, NewProduct, ProductRepository, RepositoryError};

/// Catalog seed document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogSeed {
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub products: Vec<SeedProduct>,
}

/// One product of a seed document.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedProduct {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub image: Vec<String>,
    /// Tag names; each must be listed in [`CatalogSeed::tags`].
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Outcome of [`seed_catalog`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub tags_created: usize,
    pub tags_existing: usize,
    pub products_inserted: usize,
}

const DEMO_TAGS: [&str; 4] = ["linen", "cotton", "outerwear", "accessories"];
const DEMO_SIZES: [&str; 3] = ["S", "M", "L"];

impl CatalogSeed {
    /// Generated demo catalog of `count` products cycling through a few tags.
    #[must_use]
    pub fn demo(count: usize) -> Self {
        let products = (1..=count)
            .zip(DEMO_TAGS.iter().cycle())
            .zip(DEMO_SIZES.iter().cycle())
            .map(|((n, tag), size)| SeedProduct {
                name: format!("Demo {tag} piece {n}"),
                description: format!("Size {size} sample item"),
                price: Decimal::new(1_500 + 250 * i64::try_from(n % 20).unwrap_or_default(), 2),
                image: vec![format!("https://images.threadline.example/demo/{n}.jpg")],
                tags: vec![(*tag).to_owned()],
            })
            .collect();

        Self {
            tags: DEMO_TAGS.iter().map(|t| (*t).to_owned()).collect(),
            products,
        }
    }

    /// Check the document before touching storage. Returns every problem found.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        for (index, product) in self.products.iter().enumerate() {
            if product.name.trim().is_empty() {
                errors.push(format!("product #{index}: name is empty"));
            }
            if product.price.is_sign_negative() {
                errors.push(format!("product {:?}: price is negative", product.name));
            }
            for tag in &product.tags {
                if !self.tags.contains(tag) {
                    errors.push(format!(
                        "product {:?}: tag {tag:?} is not declared",
                        product.name
                    ));
                }
            }
        }
        errors
    }
}

/// Insert the seed into `db`, oldest product first so the first listed
/// product gets the smallest id.
///
/// # Errors
///
/// Returns `RepositoryError` on the first failed insert; earlier inserts are
/// kept.
pub async fn seed_catalog(db: &Database, seed: &CatalogSeed) -> Result<SeedReport, RepositoryError> {
    let repo = ProductRepository::new(db);
    let mut report = SeedReport::default();
    let mut tag_ids: Vec<(String, TagId)> = Vec::with_capacity(seed.tags.len());

    for name in &seed.tags {
        let tag = match repo.find_tag(name).await? {
            Some(tag) => {
                report.tags_existing += 1;
                tag
            }
            None => {
                report.tags_created += 1;
                repo.create_tag(name).await?
            }
        };
        tag_ids.push((name.clone(), tag.id));
    }

    for product in &seed.products {
        let tag_ids = product
            .tags
            .iter()
            .filter_map(|name| tag_ids.iter().find(|(n, _)| n == name).map(|(_, id)| *id))
            .collect();
        repo.create(&NewProduct {
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price,
            image: product.image.clone(),
            tag_ids,
        })
        .await?;
        report.products_inserted += 1;
    }

    tracing::info!(
        tags_created = report.tags_created,
        products = report.products_inserted,
        backend = db.kind(),
        "catalog seeded"
    );
    Ok(report)
}
