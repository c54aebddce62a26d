//! Stock integrity under concurrent reservations and competing checkouts.

use verdant_commerce::models::order::OrderRequestItem;
use verdant_commerce::{InventoryLedger, OrderError};
use verdant_core::UserId;
use verdant_integration_tests::TestBackend;

/// Many tasks race to reserve single units: exactly `stock` reservations
/// may win and the level must land on zero, never below.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_reserves_never_oversell() {
    let backend = TestBackend::new();
    let product = backend.seed_product("WID-1", 1000, 100).await;
    let ledger = InventoryLedger::new(backend.products.clone());

    let mut handles = Vec::new();
    for _ in 0..200 {
        let ledger = ledger.clone();
        handles.push(tokio::spawn(async move {
            ledger.reserve(product, 1).await.is_ok()
        }));
    }

    let mut succeeded = 0;
    for handle in handles {
        if handle.await.expect("task completes") {
            succeeded += 1;
        }
    }

    assert_eq!(succeeded, 100);
    assert_eq!(backend.stock_of(product).await, 0);
}

/// Two checkouts race for P x3 with stock(P) = 5. Exactly one order may
/// materialize and the final stock is 2.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_competing_checkouts_one_winner() {
    let backend = TestBackend::new();
    let product = backend.seed_product("WID-1", 1000, 5).await;

    let mut handles = Vec::new();
    for user in [UserId::new(1), UserId::new(2)] {
        let orders = backend.orders.clone();
        handles.push(tokio::spawn(async move {
            orders
                .create_order(
                    user,
                    &[OrderRequestItem {
                        product_id: product,
                        quantity: 3,
                    }],
                )
                .await
        }));
    }

    let mut winners = 0;
    for handle in handles {
        match handle.await.expect("task completes") {
            Ok(_) => winners += 1,
            // The loser either failed the check phase or lost the
            // reservation race after passing it; both are acceptable, a
            // silent partial order is not.
            Err(
                OrderError::InsufficientStock { .. } | OrderError::StockConflict(_),
            ) => {}
            Err(other) => panic!("unexpected checkout failure: {other}"),
        }
    }

    assert_eq!(winners, 1);
    assert_eq!(backend.stock_of(product).await, 2);

    // The loser left nothing behind: only the winner's order exists.
    let all_orders: usize = backend
        .orders
        .find_by_user(UserId::new(1))
        .await
        .expect("query")
        .len()
        + backend
            .orders
            .find_by_user(UserId::new(2))
            .await
            .expect("query")
            .len();
    assert_eq!(all_orders, 1);
}

/// Interleaved reserves and releases: the final level must account for
/// every successful operation exactly once.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_interleaved_reserve_release_is_consistent() {
    let backend = TestBackend::new();
    let product = backend.seed_product("WID-1", 1000, 10).await;
    let ledger = InventoryLedger::new(backend.products.clone());

    let mut reserve_handles = Vec::new();
    let mut release_handles = Vec::new();
    for _ in 0..50 {
        let reserver = ledger.clone();
        reserve_handles.push(tokio::spawn(
            async move { reserver.reserve(product, 2).await.is_ok() },
        ));
        let releaser = ledger.clone();
        release_handles.push(tokio::spawn(async move {
            releaser.release(product, 1).await.expect("release");
        }));
    }

    let mut reserved = 0i32;
    for handle in reserve_handles {
        if handle.await.expect("task completes") {
            reserved += 1;
        }
    }
    for handle in release_handles {
        handle.await.expect("task completes");
    }

    let final_stock = backend.stock_of(product).await;
    assert_eq!(final_stock, 10 - 2 * reserved + 50);
    assert!(final_stock >= 0);
}
