//! Catalog client against a live storefront: keyset paging end to end.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::collections::HashSet;

use threadline_client::{CatalogClient, ClientError, ProductSource};
use threadline_core::{ProductId, TagId};
use threadline_integration_tests::{TestServer, notifier};
use threadline_storefront::config::HasMorePolicy;
use threadline_storefront::seed::CatalogSeed;

/// Drive visibility signals until the client stops fetching; returns the
/// number of requests issued.
async fn scroll_to_end<S: ProductSource>(catalog: &CatalogClient<S>) -> usize {
    let mut fetches = 0;
    while let Some(fetch) = catalog.on_last_item_visible() {
        fetch.await.unwrap();
        fetches += 1;
    }
    fetches
}

#[tokio::test]
async fn test_scrolling_pages_ten_ten_five() {
    let server = TestServer::spawn(25).await;
    let catalog = CatalogClient::new(server.client(), 10, notifier());

    catalog.on_last_item_visible().unwrap().await.unwrap();
    assert_eq!(catalog.len(), 10);
    assert!(catalog.has_more());
    catalog.on_last_item_visible().unwrap().await.unwrap();
    assert_eq!(catalog.len(), 20);
    assert!(catalog.has_more());
    catalog.on_last_item_visible().unwrap().await.unwrap();
    assert_eq!(catalog.len(), 25);
    assert!(!catalog.has_more());

    assert!(catalog.on_last_item_visible().is_none());
}

#[tokio::test]
async fn test_exhaustive_walk_has_no_gaps_or_duplicates() {
    let server = TestServer::spawn(43).await;
    let catalog = CatalogClient::new(server.client(), 7, notifier());

    assert_eq!(catalog.load_all().await.unwrap(), 43);

    let ids: Vec<i64> = catalog.products().iter().map(|p| p.id.as_i64()).collect();
    assert_eq!(ids, (1..=43).rev().collect::<Vec<_>>());
}

#[tokio::test]
async fn test_naive_policy_needs_an_extra_empty_page() {
    let server = TestServer::spawn_with(CatalogSeed::demo(30), HasMorePolicy::Naive).await;
    let naive = CatalogClient::new(server.client(), 10, notifier());
    assert_eq!(scroll_to_end(&naive).await, 4);
    assert_eq!(naive.len(), 30);

    let server = TestServer::spawn_with(CatalogSeed::demo(30), HasMorePolicy::LookAhead).await;
    let look_ahead = CatalogClient::new(server.client(), 10, notifier());
    assert_eq!(scroll_to_end(&look_ahead).await, 3);
    assert_eq!(look_ahead.len(), 30);
}

#[tokio::test]
async fn test_tags_arrive_populated_and_filter() {
    let server = TestServer::spawn(12).await;
    let catalog = CatalogClient::new(server.client(), 5, notifier());
    catalog.load_all().await.unwrap();

    let first = catalog.products().into_iter().next().unwrap();
    assert!(first.tags.iter().all(|t| t.name().is_some()));

    // Demo tags are created in order, so tag 1 is "linen": products 1, 5, 9.
    let linen = catalog.filter_by_tags(&HashSet::from([TagId::new(1)]));
    let ids: Vec<i64> = linen.iter().map(|p| p.id.as_i64()).collect();
    assert_eq!(ids, vec![9, 5, 1]);
}

#[tokio::test]
async fn test_product_detail() {
    let server = TestServer::spawn(3).await;
    let api = server.client();

    let product = api.product(ProductId::new(2)).await.unwrap();
    assert_eq!(product.id, ProductId::new(2));

    let err = api.product(ProductId::new(99)).await.unwrap_err();
    assert!(matches!(err, ClientError::Api { status: 404, .. }));
}

#[tokio::test]
async fn test_unreachable_server_notifies_and_keeps_state() {
    let server = TestServer::spawn(3).await;
    let api = server.client();
    drop(server);
    tokio::task::yield_now().await;

    let notices = notifier();
    let catalog = CatalogClient::new(api, 10, notices.clone());
    catalog.on_last_item_visible().unwrap().await.unwrap();

    assert!(catalog.is_empty());
    assert!(catalog.has_more());
    assert!(!catalog.is_loading());
    assert_eq!(notices.notices().len(), 1);
}
