//! Integration tests for cart persistence.
//!
//! Covers the file backend end to end, tolerance of malformed stored carts
//! and a storage backend that fails every call.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use rust_decimal::Decimal;
use serde_json::Value;

use tableside_cart::{AddItemOptions, CartStorage, FileStorage, LoadPhase, MemoryStorage};
use tableside_core::{AddOn, ItemId, SessionIdentity};
use tableside_integration_tests::{FailingStorage, menu_item, store_over};

// =============================================================================
// File Storage
// =============================================================================

#[tokio::test]
async fn test_cart_survives_store_restart() {
    let dir = tempfile::tempdir().unwrap();

    let first = store_over(Arc::new(FileStorage::new(dir.path())));
    first.observe_session(&SessionIdentity::customer("Jane Doe"));
    first.wait_loaded().await;
    first.add_item(
        &menu_item("pho", 14),
        AddItemOptions::default()
            .with_qty(2)
            .with_add_ons(vec![AddOn::new("egg", Decimal::new(150, 2))])
            .with_instructions("broth on the side"),
    );
    assert!(first.apply_discount_code("fiveoff").await.is_success());
    first.flush().await;
    let saved = first.state();
    drop(first);

    let second = store_over(Arc::new(FileStorage::new(dir.path())));
    second.observe_session(&SessionIdentity::customer("jane doe"));
    second.wait_loaded().await;

    assert_eq!(second.state(), saved);
    assert_eq!(second.subtotal(), Decimal::from(31));
    assert_eq!(second.total(), Decimal::from(26));
}

#[tokio::test]
async fn test_stored_blob_shape() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_over(Arc::new(FileStorage::new(dir.path())));

    store.observe_session(&SessionIdentity::table("7"));
    store.wait_loaded().await;
    store.add_item(&menu_item("A", 10), AddItemOptions::default());
    store.flush().await;

    let raw = std::fs::read_to_string(dir.path().join("cart_table_7.json")).unwrap();
    let blob: Value = serde_json::from_str(&raw).unwrap();

    assert!(blob["items"].is_array());
    assert!(blob["discount"].is_null());
    assert_eq!(blob["discountCode"], "");
    assert!(blob["timestamp"].as_i64().unwrap() > 0);
    assert_eq!(blob["items"][0]["id"], "A");
    assert_eq!(blob["items"][0]["qty"], 1);
}

#[tokio::test]
async fn test_free_form_table_and_ticket_numbers_persist() {
    let dir = tempfile::tempdir().unwrap();

    let first = store_over(Arc::new(FileStorage::new(dir.path())));
    first.observe_session(&SessionIdentity::table("Patio 3"));
    first.wait_loaded().await;
    first.add_item(&menu_item("A", 10), AddItemOptions::default());
    first.flush().await;

    first.observe_session(&SessionIdentity::ticket("#12"));
    first.wait_loaded().await;
    first.add_item(&menu_item("B", 4), AddItemOptions::default().with_qty(3));
    first.flush().await;
    drop(first);

    let second = store_over(Arc::new(FileStorage::new(dir.path())));
    second.observe_session(&SessionIdentity::table("Patio 3"));
    second.wait_loaded().await;
    let items = second.items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, ItemId::new("A"));

    second.observe_session(&SessionIdentity::ticket("#12"));
    second.wait_loaded().await;
    assert_eq!(second.item_count(), 3);
}

#[tokio::test]
async fn test_clear_deletes_file() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_over(Arc::new(FileStorage::new(dir.path())));

    store.observe_session(&SessionIdentity::ticket("42"));
    store.wait_loaded().await;
    store.add_item(&menu_item("A", 10), AddItemOptions::default());
    store.flush().await;

    let path = dir.path().join("cart_ticket_42.json");
    assert!(path.exists());

    store.clear().await;
    assert!(!path.exists());
    assert!(store.items().is_empty());
}

// =============================================================================
// Malformed Stored Carts
// =============================================================================

#[tokio::test]
async fn test_unparseable_blob_loads_empty_cart() {
    let storage = MemoryStorage::new();
    storage
        .set("cart_table_1", "{not json".to_string())
        .await
        .unwrap();

    let store = store_over(Arc::new(storage));
    store.observe_session(&SessionIdentity::table("1"));
    store.wait_loaded().await;

    assert_eq!(store.load_phase(), LoadPhase::Loaded);
    assert!(store.items().is_empty());
    assert_eq!(store.discount_code(), "");
}

#[tokio::test]
async fn test_bad_fields_fall_back_individually() {
    let storage = MemoryStorage::new();
    let blob = serde_json::json!({
        "items": "not a list",
        "discount": { "code": "SAVE10", "kind": { "type": "percentage", "value": "10" } },
        "discountCode": "SAVE10",
        "timestamp": 1,
    });
    storage
        .set("cart_table_1", blob.to_string())
        .await
        .unwrap();

    let store = store_over(Arc::new(storage));
    store.observe_session(&SessionIdentity::table("1"));
    store.wait_loaded().await;

    assert!(store.items().is_empty());
    assert!(store.discount().is_some());
    assert_eq!(store.discount_code(), "SAVE10");
}

#[tokio::test]
async fn test_falsy_discount_fields_are_ignored() {
    let storage = MemoryStorage::new();
    let blob = serde_json::json!({
        "items": [],
        "discount": false,
        "discountCode": 42,
    });
    storage
        .set("cart_table_1", blob.to_string())
        .await
        .unwrap();

    let store = store_over(Arc::new(storage));
    store.observe_session(&SessionIdentity::table("1"));
    store.wait_loaded().await;

    assert_eq!(store.discount(), None);
    assert_eq!(store.discount_code(), "");
}

// =============================================================================
// Failing Backend
// =============================================================================

#[tokio::test]
async fn test_failing_storage_still_serves_cart() {
    let store = store_over(Arc::new(FailingStorage));

    store.observe_session(&SessionIdentity::table("3"));
    store.wait_loaded().await;
    assert_eq!(store.load_phase(), LoadPhase::Loaded);
    assert!(store.items().is_empty());

    store.add_item(&menu_item("A", 10), AddItemOptions::default().with_qty(2));
    store.flush().await;
    assert!(store.update_qty(&ItemId::new("A"), 5));
    assert_eq!(store.item_count(), 5);
    assert_eq!(store.total(), Decimal::from(50));

    store.clear().await;
    assert!(store.items().is_empty());
}
