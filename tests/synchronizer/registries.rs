use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use synchronizer::{
    IntegerLockKeyFactory, LockRegistryConfig, StringLockKeyFactory, Synchronizer,
    SynchronizerConfig,
};

use crate::support::{blocked_elsewhere, try_from_other_thread, ScriptedCoordinator};

fn local() -> Arc<Synchronizer> {
    Arc::new(
        Synchronizer::builder()
            .with_registry(LockRegistryConfig::new("orders", StringLockKeyFactory).unwrap())
            .build()
            .unwrap(),
    )
}

fn distributed(coordinator: &ScriptedCoordinator) -> Arc<Synchronizer> {
    Arc::new(
        Synchronizer::builder()
            .with_config(SynchronizerConfig::distributed("/locks"))
            .with_client(Arc::new(coordinator.clone()))
            .with_registry(LockRegistryConfig::new("orders", StringLockKeyFactory).unwrap())
            .build()
            .unwrap(),
    )
}

fn concurrent_lookups_share_one_handle(synchronizer: Arc<Synchronizer>) {
    let barrier = Arc::new(Barrier::new(16));
    let workers: Vec<_> = (0..16)
        .map(|_| {
            let synchronizer = synchronizer.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                synchronizer
                    .registry("orders")
                    .unwrap()
                    .get_lock(&"order-42".into())
                    .unwrap()
            })
        })
        .collect();

    let locks: Vec<_> = workers.into_iter().map(|w| w.join().unwrap()).collect();
    for lock in &locks {
        assert!(Arc::ptr_eq(&locks[0], lock));
    }
    assert_eq!(synchronizer.registry("orders").unwrap().len(), 1);
}

#[test]
fn equal_keys_share_one_local_handle() {
    concurrent_lookups_share_one_handle(local());
}

#[test]
fn equal_keys_share_one_interprocess_handle() {
    let coordinator = ScriptedCoordinator::new();
    concurrent_lookups_share_one_handle(distributed(&coordinator));
    assert_eq!(coordinator.ops(), vec!["new_mutex"]);
}

#[test]
fn distinct_keys_are_independent() {
    let synchronizer = local();
    let _held = synchronizer.acquire("orders", "order-1", None).unwrap();

    assert!(try_from_other_thread(&synchronizer, "orders", "order-2").is_ok());
    assert!(blocked_elsewhere(&synchronizer, "orders", "order-1"));
}

#[test]
fn reentrant_holds_must_all_be_released() {
    let coordinator = ScriptedCoordinator::new();
    let synchronizer = distributed(&coordinator);

    let guards: Vec<_> = (0..3)
        .map(|_| synchronizer.acquire("orders", "order-42", None).unwrap())
        .collect();
    assert_eq!(guards[0].lock().hold_count(), 3);

    for guard in guards.into_iter().rev() {
        assert!(blocked_elsewhere(&synchronizer, "orders", "order-42"));
        synchronizer.release(guard).unwrap();
    }
    assert!(try_from_other_thread(&synchronizer, "orders", "order-42").is_ok());

    // one cluster release per outermost hold: ours, then the other thread's
    let ops: Vec<_> = coordinator
        .ops()
        .into_iter()
        .filter(|op| *op != "try_acquire")
        .collect();
    assert_eq!(ops, vec!["new_mutex", "release", "release"]);
}

#[test]
fn interprocess_paths_are_base_registry_key() {
    let coordinator = ScriptedCoordinator::new();
    let synchronizer = Synchronizer::builder()
        .with_config(SynchronizerConfig::distributed("/zk/base/path"))
        .with_client(Arc::new(coordinator.clone()))
        .with_registry(LockRegistryConfig::new("mylocks", IntegerLockKeyFactory).unwrap())
        .build()
        .unwrap();

    let guard = synchronizer.acquire("mylocks", 777i32, None).unwrap();
    assert!(coordinator.is_held("/zk/base/path/mylocks/777"));
    drop(guard);
    assert!(!coordinator.is_held("/zk/base/path/mylocks/777"));
    assert_eq!(
        coordinator.calls()[0],
        ("new_mutex", "/zk/base/path/mylocks/777".to_string())
    );
}

#[test]
fn idle_unreferenced_handles_are_evicted() {
    let synchronizer = Synchronizer::builder()
        .with_config(SynchronizerConfig::local().with_idle_eviction(Duration::ZERO))
        .with_registry(LockRegistryConfig::new("orders", StringLockKeyFactory).unwrap())
        .build()
        .unwrap();
    let registry = synchronizer.registry("orders").unwrap();

    let held = synchronizer.acquire("orders", "held", None).unwrap();
    let referenced = registry.get_lock(&"referenced".into()).unwrap();
    drop(synchronizer.acquire("orders", "released", None).unwrap());

    assert_eq!(synchronizer.purge_idle(), 1);
    assert_eq!(registry.len(), 2);

    drop(held);
    drop(referenced);
    assert_eq!(synchronizer.purge_idle(), 2);
    assert!(registry.is_empty());
}
