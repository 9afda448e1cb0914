use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use synchronizer::distributed::InMemoryCoordinator;
use synchronizer::{
    InterProcessLockRegistry, LockError, LockRegistryConfig, LockingPolicy, StringLockKeyFactory,
    Synchronizer, SynchronizerConfig,
};

use crate::support::try_from_other_thread;

fn orders_node(coordinator: &InMemoryCoordinator) -> Arc<Synchronizer> {
    Arc::new(
        Synchronizer::builder()
            .with_config(SynchronizerConfig::distributed("/shop/locks"))
            .with_client(Arc::new(coordinator.clone()))
            .with_registry(
                LockRegistryConfig::new("orders", StringLockKeyFactory)
                    .unwrap()
                    .with_policy(LockingPolicy::Strict),
            )
            .build()
            .unwrap(),
    )
}

#[test]
fn second_caller_waits_for_the_first_to_unlock() {
    let coordinator = InMemoryCoordinator::new();
    let synchronizer = orders_node(&coordinator);
    let released = Arc::new(AtomicBool::new(false));
    let (locked_tx, locked_rx) = mpsc::channel();

    let first = {
        let synchronizer = synchronizer.clone();
        let released = released.clone();
        thread::spawn(move || {
            let guard = synchronizer.acquire("orders", "order-42", None).unwrap();
            locked_tx.send(()).unwrap();
            thread::sleep(Duration::from_millis(50));
            released.store(true, Ordering::SeqCst);
            synchronizer.release(guard).unwrap();
        })
    };

    locked_rx.recv().unwrap();
    let guard = synchronizer.acquire("orders", "order-42", None).unwrap();
    assert!(released.load(Ordering::SeqCst));
    assert!(coordinator.is_held("/shop/locks/orders/b3JkZXItNDI"));
    drop(guard);
    first.join().unwrap();
}

#[test]
fn nodes_sharing_a_coordinator_exclude_each_other() {
    let coordinator = InMemoryCoordinator::new();
    let node_a = orders_node(&coordinator);
    let node_b = orders_node(&coordinator);

    let guard = node_a.acquire("orders", "order-42", None).unwrap();
    assert!(matches!(
        try_from_other_thread(&node_b, "orders", "order-42"),
        Err(LockError::Timeout { .. })
    ));
    // b's own threads are not blocked on other keys
    assert!(try_from_other_thread(&node_b, "orders", "order-43").is_ok());

    drop(guard);
    assert!(try_from_other_thread(&node_b, "orders", "order-42").is_ok());
    // one mutex per node per key
    assert_eq!(coordinator.mutexes_created(), 3);
}

#[test]
fn distributed_scope_without_client_degrades_to_local() {
    let synchronizer = Arc::new(
        Synchronizer::builder()
            .with_config(
                SynchronizerConfig::distributed("/shop/locks")
                    .with_require_coordination_client(false),
            )
            .with_registry(LockRegistryConfig::new("locks", StringLockKeyFactory).unwrap())
            .build()
            .unwrap(),
    );

    let guard = synchronizer.acquire("locks", "k", None).unwrap();
    assert!(matches!(
        try_from_other_thread(&synchronizer, "locks", "k"),
        Err(LockError::Timeout { .. })
    ));
    synchronizer.release(guard).unwrap();

    let registry = InterProcessLockRegistry::new(
        "/shop/locks",
        &LockRegistryConfig::new("locks", StringLockKeyFactory).unwrap(),
        LockingPolicy::Strict,
        None,
    )
    .unwrap();
    assert!(!registry.handle(&"k".into()).unwrap().is_distributed());
}

#[test]
fn distributed_scope_without_client_is_fatal_by_default() {
    let err = Synchronizer::builder()
        .with_config(SynchronizerConfig::distributed("/shop/locks"))
        .build()
        .unwrap_err();
    assert!(matches!(err, LockError::Configuration(_)));
}

#[test]
fn registries_are_isolated_by_name() {
    let coordinator = InMemoryCoordinator::new();
    let synchronizer = Arc::new(
        Synchronizer::builder()
            .with_config(SynchronizerConfig::distributed("/shop/locks"))
            .with_client(Arc::new(coordinator.clone()))
            .with_registry(LockRegistryConfig::new("orders", StringLockKeyFactory).unwrap())
            .with_registry(LockRegistryConfig::new("invoices", StringLockKeyFactory).unwrap())
            .build()
            .unwrap(),
    );

    let _guard = synchronizer.acquire("orders", "42", None).unwrap();
    assert!(try_from_other_thread(&synchronizer, "invoices", "42").is_ok());
    assert!(coordinator.is_held("/shop/locks/orders/NDI"));
    assert!(!coordinator.is_held("/shop/locks/invoices/NDI"));
}
