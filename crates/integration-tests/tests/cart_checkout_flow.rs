//! End-to-end cart and checkout flows over the in-memory backend.

use verdant_commerce::CartError;
use verdant_commerce::models::order::OrderRequestItem;
use verdant_core::{OrderStatus, OwnerKey, Price, SessionId, UserId};
use verdant_integration_tests::TestBackend;

/// The full journey: a guest fills a cart, signs in, the cart merges, and
/// checkout turns the merged cart into a pending order with frozen prices.
#[tokio::test]
async fn test_guest_to_order_journey() {
    let backend = TestBackend::new();
    let plant = backend.seed_product("PLANT-MON-6", 3499, 10).await;
    let pot = backend.seed_product("POT-CER-8", 2450, 10).await;

    let session = SessionId::generate();
    let guest = OwnerKey::Session(session);
    backend
        .carts
        .add_item(&guest, plant, 2)
        .await
        .expect("guest adds plant");
    backend
        .carts
        .add_item(&guest, pot, 1)
        .await
        .expect("guest adds pot");

    // Sign-in: the guest cart folds into the (empty) account cart.
    let user = UserId::new(7);
    let outcome = backend
        .carts
        .merge_guest_into_account(session, user)
        .await
        .expect("merge");
    assert!(outcome.skipped.is_empty());
    assert_eq!(outcome.cart.total_items, 3);
    assert_eq!(outcome.cart.total_amount, Price::from_cents(9448));

    // Checkout the merged cart.
    let requested: Vec<OrderRequestItem> = outcome
        .cart
        .items
        .iter()
        .map(|item| OrderRequestItem {
            product_id: item.product_id,
            quantity: item.quantity,
        })
        .collect();
    let order = backend
        .orders
        .create_order(user, &requested)
        .await
        .expect("checkout");

    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.total_amount, Price::from_cents(9448));
    assert_eq!(backend.stock_of(plant).await, 8);
    assert_eq!(backend.stock_of(pot).await, 9);

    // Payment confirmation is the collaborator's job; the engine just
    // applies the transition.
    let paid = backend
        .orders
        .update_status(order.id, OrderStatus::Paid)
        .await
        .expect("mark paid");
    assert_eq!(paid.status, OrderStatus::Paid);
}

/// With stock 5 at 10.00, adding 3 succeeds with a 30.00 total; adding 3
/// more must fail on the cumulative quantity and leave the cart untouched.
#[tokio::test]
async fn test_cumulative_add_rejected_beyond_stock() {
    let backend = TestBackend::new();
    let product = backend.seed_product("WID-1", 1000, 5).await;
    let owner = OwnerKey::Account(UserId::new(1));

    let view = backend
        .carts
        .add_item(&owner, product, 3)
        .await
        .expect("first add");
    assert_eq!(view.total_amount, Price::from_cents(3000));

    let err = backend
        .carts
        .add_item(&owner, product, 3)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CartError::InsufficientStock {
            requested: 6,
            available: 5,
            ..
        }
    ));

    let view = backend.carts.get_cart(&owner).await.expect("get cart");
    assert_eq!(view.items.len(), 1);
    assert_eq!(view.items[0].quantity, 3);

    // Cart additions are advisory; stock is untouched either way.
    assert_eq!(backend.stock_of(product).await, 5);
}

/// Account holds P x1, guest holds P x2 and Q x1 with stock(P) = 2. P's
/// merge is skipped and reported; Q still merges; the guest cart is
/// deleted.
#[tokio::test]
async fn test_partial_merge_reports_skipped_lines() {
    let backend = TestBackend::new();
    let p = backend.seed_product("P", 1000, 2).await;
    let q = backend.seed_product("Q", 500, 5).await;

    let session = SessionId::generate();
    let guest = OwnerKey::Session(session);
    let user = UserId::new(1);
    let account = OwnerKey::Account(user);

    backend
        .carts
        .add_item(&account, p, 1)
        .await
        .expect("account add");
    backend.carts.add_item(&guest, p, 2).await.expect("guest add");
    backend.carts.add_item(&guest, q, 1).await.expect("guest add");

    let outcome = backend
        .carts
        .merge_guest_into_account(session, user)
        .await
        .expect("merge");

    assert_eq!(outcome.skipped.len(), 1);
    assert_eq!(outcome.skipped[0].product_id, p);
    assert_eq!(outcome.skipped[0].requested, 2);

    let p_line = outcome
        .cart
        .items
        .iter()
        .find(|item| item.product_id == p)
        .expect("p line");
    assert_eq!(p_line.quantity, 1);
    assert!(outcome.cart.items.iter().any(|item| item.product_id == q));

    // The guest key now resolves to a fresh, empty cart.
    let fresh = backend.carts.get_cart(&guest).await.expect("fresh cart");
    assert!(fresh.items.is_empty());
}

/// An order's total and line prices must not move when the catalog price
/// changes afterwards, while the cart (live prices) follows the catalog.
#[tokio::test]
async fn test_order_prices_frozen_cart_prices_live() {
    let backend = TestBackend::new();
    let product = backend.seed_product("WID-1", 1000, 10).await;
    let user = UserId::new(1);
    let owner = OwnerKey::Account(user);

    backend
        .carts
        .add_item(&owner, product, 2)
        .await
        .expect("add");
    let order = backend
        .orders
        .create_order(
            user,
            &[OrderRequestItem {
                product_id: product,
                quantity: 2,
            }],
        )
        .await
        .expect("order");

    assert!(backend.products.set_price(product, Price::from_cents(2500)));

    let order = backend.orders.find_order(order.id).await.expect("reread");
    assert_eq!(order.items[0].unit_price, Price::from_cents(1000));
    assert_eq!(order.total_amount, Price::from_cents(2000));

    let cart = backend.carts.get_cart(&owner).await.expect("cart");
    assert_eq!(cart.items[0].unit_price, Price::from_cents(2500));
    assert_eq!(cart.total_amount, Price::from_cents(5000));
}

/// Cancelling a pending order returns its stock; the terminal state then
/// rejects further transitions.
#[tokio::test]
async fn test_cancel_restocks_and_is_terminal() {
    let backend = TestBackend::new();
    let product = backend.seed_product("WID-1", 1000, 5).await;
    let user = UserId::new(1);

    let order = backend
        .orders
        .create_order(
            user,
            &[OrderRequestItem {
                product_id: product,
                quantity: 4,
            }],
        )
        .await
        .expect("order");
    assert_eq!(backend.stock_of(product).await, 1);

    backend
        .orders
        .update_status(order.id, OrderStatus::Cancelled)
        .await
        .expect("cancel");
    assert_eq!(backend.stock_of(product).await, 5);

    let err = backend
        .orders
        .update_status(order.id, OrderStatus::Paid)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        verdant_commerce::OrderError::InvalidTransition { .. }
    ));
}
