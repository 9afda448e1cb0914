use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use synchronizer::distributed::InMemoryCoordinator;
use synchronizer::{
    Interceptor, LockError, LockRegistryConfig, LongLockKeyFactory, PositiveDuration,
    SyncBinding, Synchronizer, SynchronizerConfig,
};

fn interceptor(coordinator: &InMemoryCoordinator) -> Interceptor {
    let synchronizer = Synchronizer::builder()
        .with_config(SynchronizerConfig::distributed("/bank"))
        .with_client(Arc::new(coordinator.clone()))
        .with_registry(LockRegistryConfig::new("accounts", LongLockKeyFactory).unwrap())
        .build()
        .unwrap();

    Interceptor::new(Arc::new(synchronizer))
        .with_binding("debit", SyncBinding::keyed("accounts"))
        .unwrap()
        .with_binding("credit", SyncBinding::keyed("accounts"))
        .unwrap()
        .with_binding(
            "month_end",
            SyncBinding::keyless("month_end").with_timeout(PositiveDuration::from_millis(10).unwrap()),
        )
        .unwrap()
}

#[test]
fn intercepted_units_are_mutually_exclusive_per_key() {
    let coordinator = InMemoryCoordinator::new();
    let interceptor = Arc::new(interceptor(&coordinator));
    let inside = Arc::new(AtomicUsize::new(0));
    let overlaps = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(4));

    let workers: Vec<_> = ["debit", "credit", "debit", "credit"]
        .into_iter()
        .map(|unit| {
            let interceptor = interceptor.clone();
            let inside = inside.clone();
            let overlaps = overlaps.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                interceptor
                    .intercept(unit, 7i64, || {
                        if inside.fetch_add(1, Ordering::SeqCst) > 0 {
                            overlaps.fetch_add(1, Ordering::SeqCst);
                        }
                        thread::sleep(Duration::from_millis(5));
                        inside.fetch_sub(1, Ordering::SeqCst);
                    })
                    .unwrap();
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(overlaps.load(Ordering::SeqCst), 0);
    assert!(!coordinator.is_held("/bank/accounts/7"));
}

#[test]
fn keyless_units_use_their_bound_timeout() {
    let coordinator = InMemoryCoordinator::new();
    let interceptor = Arc::new(interceptor(&coordinator));
    let _held = interceptor
        .synchronizer()
        .acquire_keyless("month_end", None)
        .unwrap();

    let other = interceptor.clone();
    let err = thread::spawn(move || other.intercept_keyless("month_end", || ()).unwrap_err())
        .join()
        .unwrap();
    assert!(
        matches!(err, LockError::Timeout { timeout, .. } if timeout == Duration::from_millis(10))
    );
}

#[test]
fn conflicting_bindings_are_rejected() {
    let coordinator = InMemoryCoordinator::new();
    let mut interceptor = interceptor(&coordinator);

    assert!(interceptor.bind("debit", SyncBinding::keyed("accounts")).is_ok());
    assert!(matches!(
        interceptor.bind("debit", SyncBinding::keyless("debit")),
        Err(LockError::Configuration(_))
    ));
    assert_eq!(
        interceptor.bind("refund", SyncBinding::keyed("refunds")),
        Err(LockError::UnknownRegistry("refunds".into()))
    );
}
