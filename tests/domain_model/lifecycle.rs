//! Lifecycle Tests
//!
//! Creation, lookup and destruction of items, and release of everything a
//! store owns when it is dropped.

use crate::common::*;
use std::sync::Arc;

#[test]
fn create_round_trips_constructor_args() {
    let (mut store, domain) = recorded_store();
    let key = store.create::<Vec<u8>, _>("bytes", vec![1u8, 2, 3]).unwrap();
    let item = store.item(key).unwrap();

    assert_eq!(item.read().unwrap(), vec![1, 2, 3]);
    assert_eq!(item.state(), ItemState::Live);
    assert_eq!(item.name(), "bytes");
    assert_eq!(domain.count_for(item.source()), 1);
}

#[test]
fn destroyed_item_is_unreachable() {
    let (mut store, domain) = recorded_store();
    let keep = store.create::<Counter, _>("keep", 1i64).unwrap();
    let gone = store.create::<Counter, _>("gone", 2i64).unwrap();
    let gone_source = store.item(gone).unwrap().source();

    store.destroy(gone).unwrap();

    assert_eq!(store.len(), 1);
    assert_eq!(store.item_ids(), vec![keep.id()]);
    assert_eq!(store.item_names(), vec!["keep"]);
    assert!(store.find::<Counter>("gone").is_none());
    assert!(matches!(store.item(gone), Err(Error::StaleItem(id)) if id == gone.id()));
    assert_eq!(store.state_of(gone.id()), ItemState::Destroyed);
    assert_eq!(domain.subscriber_count(gone_source), 0);
    assert_eq!(store.item(keep).unwrap().read().unwrap(), Counter(1));
}

#[test]
fn destroy_releases_value() {
    let token = Arc::new(());
    let (mut store, _domain) = recorded_store();
    let key = store.create::<Tracked, _>("tracked", token.clone()).unwrap();
    assert!(Arc::strong_count(&token) > 1);

    store.destroy(key).unwrap();
    assert_eq!(Arc::strong_count(&token), 1);
}

#[test]
fn dropping_store_releases_every_item() {
    const N: usize = 16;
    let token = Arc::new(());
    let (mut store, domain) = recorded_store();
    let mut sources = Vec::new();
    for i in 0..N {
        let key = store
            .create::<Tracked, _>(format!("item-{i}"), token.clone())
            .unwrap();
        sources.push(store.item(key).unwrap().source());
    }
    assert_eq!(store.len(), N);

    drop(store);

    assert_eq!(Arc::strong_count(&token), 1);
    assert!(sources.iter().all(|s| domain.subscriber_count(*s) == 0));
}

#[test]
fn keys_do_not_cross_stores() {
    let (mut first, _d1) = recorded_store();
    let (mut second, _d2) = recorded_store();
    let key = first.create::<Counter, _>("shared-name", 1i64).unwrap();
    second.create::<Counter, _>("shared-name", 2i64).unwrap();

    let err = second.item(key).unwrap_err();
    assert!(matches!(err, Error::ForeignItem { store, .. } if store == second.id()));
    assert!(second.destroy(key).is_err());
    assert_eq!(first.item(key).unwrap().read().unwrap(), Counter(1));
}

#[test]
fn names_are_unique_per_store() {
    let (mut store, _domain) = recorded_store();
    store.create::<Counter, _>("n", 1i64).unwrap();
    assert!(matches!(
        store.create::<String, _>("n", "other"),
        Err(Error::DuplicateName(_))
    ));
}

#[test]
fn find_resolves_typed_keys() {
    let (mut store, _domain) = recorded_store();
    let key = store.create::<Counter, _>("hits", 0i64).unwrap();
    assert_eq!(store.find::<Counter>("hits"), Some(key));
    assert_eq!(store.find::<String>("hits"), None);
}
