//! Integration tests for discount codes applied through the cart store.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;

use tableside_cart::{
    AddItemOptions, CachedDiscounts, DiscountOutcome, MemoryStorage, Promotion, PromotionBook,
};
use tableside_core::SessionIdentity;
use tableside_integration_tests::{FailingDiscounts, menu_item, promotions, store_over, store_with};

#[tokio::test]
async fn test_lookup_failure_clears_discount() {
    let store = store_with(
        Arc::new(MemoryStorage::new()),
        Arc::new(FailingDiscounts),
        Duration::ZERO,
    );
    store.observe_session(&SessionIdentity::table("4"));
    store.wait_loaded().await;
    store.add_item(&menu_item("A", 20), AddItemOptions::default());

    let outcome = store.apply_discount_code("SAVE10").await;
    match outcome {
        DiscountOutcome::Rejected { reason } => {
            assert_eq!(reason, "Failed to apply discount code");
        }
        DiscountOutcome::Applied(_) => panic!("lookup failure must not apply a discount"),
    }
    assert_eq!(store.discount(), None);
    assert_eq!(store.discount_code(), "");
    assert_eq!(store.total(), Decimal::from(20));
}

#[tokio::test]
async fn test_discount_follows_the_session() {
    let storage = MemoryStorage::new();
    let store = store_over(Arc::new(storage));

    store.observe_session(&SessionIdentity::table("1"));
    store.wait_loaded().await;
    store.add_item(&menu_item("A", 40), AddItemOptions::default());
    assert!(store.apply_discount_code(" save10 ").await.is_success());
    assert_eq!(store.discount_code(), "SAVE10");
    store.flush().await;

    store.observe_session(&SessionIdentity::table("2"));
    store.wait_loaded().await;
    assert_eq!(store.discount(), None);
    assert_eq!(store.discount_code(), "");

    store.observe_session(&SessionIdentity::table("1"));
    store.wait_loaded().await;
    assert_eq!(store.discount_code(), "SAVE10");
    assert_eq!(store.discount_amount(), Decimal::from(4));
    assert_eq!(store.total(), Decimal::from(36));
}

#[tokio::test]
async fn test_totals_track_cart_changes_under_discount() {
    let store = store_over(Arc::new(MemoryStorage::new()));
    store.observe_session(&SessionIdentity::table("1"));
    store.wait_loaded().await;

    store.add_item(&menu_item("A", 10), AddItemOptions::default());
    assert!(store.apply_discount_code("FIVEOFF").await.is_success());
    assert_eq!(store.total(), Decimal::from(5));

    store.add_item(&menu_item("A", 10), AddItemOptions::default());
    assert_eq!(store.total(), Decimal::from(15));

    store.clear().await;
    assert_eq!(store.discount(), None);
    assert_eq!(store.total(), Decimal::ZERO);
}

#[tokio::test]
async fn test_minimum_subtotal_promotion() {
    let book = PromotionBook::new([
        Promotion::fixed_amount("BIGORDER", Decimal::from(10)).with_min_subtotal(Decimal::from(50)),
    ]);
    let store = store_with(
        Arc::new(MemoryStorage::new()),
        Arc::new(book),
        Duration::ZERO,
    );
    store.observe_session(&SessionIdentity::table("1"));
    store.wait_loaded().await;

    store.add_item(&menu_item("A", 30), AddItemOptions::default());
    assert!(store.apply_discount_code("BIGORDER").await.is_success());
    assert_eq!(store.discount_amount(), Decimal::ZERO);

    store.add_item(&menu_item("B", 25), AddItemOptions::default());
    assert_eq!(store.discount_amount(), Decimal::from(10));
    assert_eq!(store.total(), Decimal::from(45));
}

#[tokio::test]
async fn test_cached_discounts_behind_store() {
    let store = store_with(
        Arc::new(MemoryStorage::new()),
        Arc::new(CachedDiscounts::new(promotions(), Duration::from_secs(60))),
        Duration::ZERO,
    );
    store.observe_session(&SessionIdentity::customer("Ana"));
    store.wait_loaded().await;
    store.add_item(&menu_item("A", 100), AddItemOptions::default());

    assert!(store.apply_discount_code("SAVE10").await.is_success());
    assert!(store.apply_discount_code("SAVE10").await.is_success());
    assert_eq!(store.total(), Decimal::from(90));

    assert!(!store.apply_discount_code("NOPE").await.is_success());
    assert_eq!(store.total(), Decimal::from(100));
}
