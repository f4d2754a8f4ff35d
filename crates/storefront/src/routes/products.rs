//! Catalog route handlers.

use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
};
use serde::Deserialize;
use tracing::instrument;

use threadline_core::{ProductId, ProductListResponse, ProductResponse};

use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::services::CatalogService;
use crate::state::AppState;

/// Raw `GET /product/list` query.
///
/// Both parameters arrive as strings: an unparseable `limit` silently falls
/// back to the default while a malformed `lastId` is rejected.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub last_id: Option<String>,
    pub limit: Option<String>,
}

impl ListParams {
    fn cursor(&self) -> Result<Option<ProductId>> {
        let Some(raw) = self
            .last_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        else {
            return Ok(None);
        };

        raw.parse()
            .map(Some)
            .map_err(|_| AppError::BadRequest(format!("'lastId' must be an integer id, got {raw:?}")))
    }

    fn limit(&self) -> Option<u32> {
        self.limit.as_deref().and_then(|s| s.trim().parse().ok())
    }
}

/// One keyset page of the catalog, newest first.
#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    query: std::result::Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<ProductListResponse>> {
    let Query(params) = query?;
    let cursor = params.cursor()?;

    let catalog = CatalogService::new(state.db(), state.config().catalog);
    let limit = catalog.resolve_limit(params.limit());
    let page = catalog.list(cursor, limit).await?;

    Ok(Json(ProductListResponse {
        success: true,
        products: page.products,
        has_more: page.has_more,
        next_cursor: page.next_cursor,
    }))
}

/// A single product.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>> {
    let id: ProductId = id
        .parse()
        .map_err(|_| AppError::BadRequest(format!("invalid product id {id:?}")))?;

    let product = ProductRepository::new(state.db())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

    Ok(Json(ProductResponse {
        success: true,
        product,
    }))
}
