//! Lifecycle of the process-wide storage instance.
//!
//! Kept in its own test binary: the instance is global to the process.

use std::sync::Arc;

use ecoair_store::{BackendChoice, Error, NewFavorite, StoreConfig};

#[tokio::test]
async fn init_global_close_lifecycle() {
    assert!(matches!(ecoair_store::global(), Err(Error::NotInitialized)));

    let config = StoreConfig::in_memory(BackendChoice::Relational);
    let first = ecoair_store::init(&config).await.unwrap();
    first.add_favorite(&NewFavorite::new("Lagos")).await.unwrap();

    // A second init hands back the same instance and ignores its config
    let again = ecoair_store::init(&StoreConfig::in_memory(BackendChoice::KeyValue))
        .await
        .unwrap();
    assert!(Arc::ptr_eq(&first, &again));

    let global = ecoair_store::global().unwrap();
    assert!(global.is_favorite("lagos").await.unwrap());

    ecoair_store::close().await.unwrap();
    assert!(matches!(ecoair_store::global(), Err(Error::NotInitialized)));
    // Handles kept from before the close see a closed connection
    assert!(matches!(first.list_favorites().await, Err(Error::Closed)));
    // Closing again is harmless
    ecoair_store::close().await.unwrap();

    // A fresh init opens new, empty storage
    let reopened = ecoair_store::init(&config).await.unwrap();
    assert!(!Arc::ptr_eq(&first, &reopened));
    assert!(reopened.list_favorites().await.unwrap().is_empty());
    ecoair_store::close().await.unwrap();
}
