use screenpass_checkout_core::{CheckoutError, LoadingCoordinator};

#[test]
fn busy_iff_outstanding_tokens() {
    let loading = LoadingCoordinator::new();
    assert!(!loading.is_busy());

    let a = loading.acquire();
    let b = loading.acquire();
    assert!(loading.is_busy());
    assert_eq!(loading.outstanding(), 2);

    loading.release(&a).expect("release a");
    // One operation finished while another is still running: no flicker.
    assert!(loading.is_busy());

    loading.release(&b).expect("release b");
    assert!(!loading.is_busy());
    assert_eq!(loading.outstanding(), 0);
}

#[test]
fn releasing_more_than_acquired_fails() {
    let loading = LoadingCoordinator::new();
    let token = loading.acquire();
    loading.release(&token).expect("first release");
    let err = loading.release(&token).expect_err("second release must fail");
    assert_eq!(err, CheckoutError::BusyUnderflow);
    assert_eq!(loading.outstanding(), 0);
}

#[test]
fn scoped_guard_releases_on_drop() {
    let loading = LoadingCoordinator::new();
    {
        let _guard = loading.acquire_scoped();
        assert!(loading.is_busy());
    }
    assert!(!loading.is_busy());
}

#[test]
fn scoped_guard_explicit_release_is_single_shot() {
    let loading = LoadingCoordinator::new();
    let guard = loading.acquire_scoped();
    guard.release().expect("explicit release");
    assert!(!loading.is_busy());
}

#[test]
fn overlapping_scopes_agree_on_one_signal() {
    let loading = LoadingCoordinator::new();
    let connect = loading.acquire_scoped();
    let purchase = loading.acquire_scoped();
    drop(connect);
    assert!(loading.is_busy());
    drop(purchase);
    assert!(!loading.is_busy());
}
