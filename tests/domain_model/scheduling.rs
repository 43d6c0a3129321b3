//! Scheduling Tests
//!
//! Stores driven by a cooperative domain: triggers are queued, delivered
//! on `run_pending`, and turned into model-hook executions.

use crate::common::*;
use parking_lot::Mutex;
use std::sync::Arc;

#[test]
fn model_hook_sees_latest_value() {
    init_tracing();
    let domain = CooperativeDomain::shared("model");
    let mut store = DataStore::builder()
        .name("vehicle")
        .affinity(Affinity::new(domain.clone()))
        .build()
        .unwrap();
    let speed = store.create::<Counter, _>("speed", 0i64).unwrap();
    let store = Arc::new(store);

    let seen = Arc::new(Mutex::new(Vec::new()));
    let weak = Arc::downgrade(&store);
    let log = seen.clone();
    store.on_execute(move |triggers| {
        if let Some(store) = weak.upgrade() {
            let value = store.item(speed).unwrap().read().unwrap();
            log.lock().push((triggers, value));
        }
    });

    // Creation write is still queued.
    assert_eq!(domain.pending(), 1);
    store.item(speed).unwrap().write(Counter(10));
    store.item(speed).unwrap().write(Counter(20));

    let stats = domain.run_pending();
    assert_eq!(stats.events, 3);
    assert_eq!(stats.executed, 1);
    assert_eq!(*seen.lock(), vec![(3, Counter(20))]);

    // Nothing new: the hook does not run again.
    assert_eq!(domain.run_pending().executed, 0);
    assert_eq!(store.executions(), 1);
}

#[test]
fn stores_in_one_domain_execute_independently() {
    let domain = CooperativeDomain::shared("model");
    let build = || {
        DataStore::builder()
            .affinity(Affinity::new(domain.clone()))
            .build()
            .unwrap()
    };
    let mut sensors = build();
    let mut actuators = build();
    let input = sensors.create::<Counter, _>("input", 0i64).unwrap();
    let output = actuators.create::<Counter, _>("output", 0i64).unwrap();
    domain.run_pending();

    sensors.item(input).unwrap().write(Counter(1));
    let stats = domain.run_pending();
    assert_eq!(stats.executed, 1);
    assert_eq!(sensors.executions(), 2);
    assert_eq!(actuators.executions(), 1);

    actuators.item(output).unwrap().write(Counter(1));
    domain.run_pending();
    assert_eq!(actuators.executions(), 2);
}

#[test]
fn affinity_change_moves_items_between_domains() {
    let old = CooperativeDomain::shared("old");
    let new = CooperativeDomain::shared("new");
    let mut store = DataStore::builder()
        .affinity(Affinity::new(old.clone()))
        .build()
        .unwrap();
    let key = store.create::<Counter, _>("c", 0i64).unwrap();
    old.run_pending();

    store.set_affinity(Affinity::new(new.clone()));
    let item = store.item(key).unwrap();
    assert_eq!(item.affinity().domain_name(), Some("new"));
    assert_eq!(old.subscriber_count(item.source()), 0);
    assert_eq!(new.subscriber_count(item.source()), 1);

    item.write(Counter(3));
    assert_eq!(old.pending(), 0);
    assert_eq!(new.run_pending().executed, 1);
}

#[test]
fn external_store_trigger_runs_hooks() {
    let domain = CooperativeDomain::shared("model");
    let store = DataStore::builder()
        .affinity(Affinity::new(domain.clone()))
        .build()
        .unwrap();
    let runs = Arc::new(Mutex::new(0u32));
    let counter = runs.clone();
    store.on_execute(move |_| *counter.lock() += 1);

    assert!(store.trigger());
    domain.run_pending();
    assert_eq!(*runs.lock(), 1);
}

#[test]
fn dropped_store_is_not_woken() {
    let domain = CooperativeDomain::shared("model");
    let mut store = DataStore::builder()
        .affinity(Affinity::new(domain.clone()))
        .build()
        .unwrap();
    let key = store.create::<Counter, _>("c", 0i64).unwrap();
    let source = store.item(key).unwrap().source();
    drop(store);

    assert_eq!(domain.subscriber_count(source), 0);
    // The creation trigger is still queued but has nobody to wake.
    assert_eq!(domain.run_pending().executed, 0);
}
