//! Order lifecycle integration tests.
//!
//! These run against a real `PostgreSQL` instance with migrations applied
//! (`protech-cli migrate`) and are ignored by default:
//!
//! ```bash
//! DATABASE_URL=postgres://localhost/protech_test cargo test -- --ignored
//! ```

#![allow(clippy::unwrap_used)]

use rust_decimal::Decimal;
use sqlx::PgPool;

use protech_api::config::PricingConfig;
use protech_api::db::{OrderRepository, ProductRepository, UserRepository};
use protech_api::models::{Product, ProductDraft, ShippingAddress, User};
use protech_api::services::auth::{UserIdentity, hash_password};
use protech_api::services::orders::{OrderError, OrderLine, OrderRequest, OrderService};
use protech_core::{OrderStatus, PaymentStatus, ProductId, UserRole};

async fn pool() -> PgPool {
    let url = std::env::var("PROTECH_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .expect("set DATABASE_URL to run integration tests");
    PgPool::connect(&url).await.unwrap()
}

fn unique_tag() -> String {
    use rand::Rng;
    let n: u64 = rand::rng().random();
    format!("{n:016x}")
}

async fn make_user(pool: &PgPool) -> User {
    let tag = unique_tag();
    let email = format!("buyer-{tag}@example.com").parse().unwrap();
    let hash = hash_password("integration test password").unwrap();
    UserRepository::new(pool)
        .create("Test Buyer", &email, &hash, UserRole::Customer)
        .await
        .unwrap()
}

async fn make_product(pool: &PgPool, price: Decimal, stock: i32) -> Product {
    let draft = ProductDraft {
        name: format!("Test Widget {}", unique_tag()),
        brand: "TEST".to_owned(),
        category: "Testing".to_owned(),
        description: "integration test product".to_owned(),
        price,
        stock,
        images: vec![],
    };
    ProductRepository::new(pool).create(&draft).await.unwrap()
}

fn address() -> ShippingAddress {
    ShippingAddress {
        full_name: "Test Buyer".to_owned(),
        phone: "+1 555 0100".to_owned(),
        email: "buyer@example.com".to_owned(),
        address: "1 Main St".to_owned(),
        city: "Springfield".to_owned(),
        postal_code: Some("12345".to_owned()),
        country: "USA".to_owned(),
    }
}

fn request(lines: Vec<(ProductId, i32)>) -> OrderRequest {
    OrderRequest {
        items: lines
            .into_iter()
            .map(|(product_id, quantity)| OrderLine {
                product_id,
                quantity,
            })
            .collect(),
        shipping_address: address(),
        payment_method: "Cash on Delivery".to_owned(),
    }
}

async fn stock_of(pool: &PgPool, id: ProductId) -> i32 {
    ProductRepository::new(pool)
        .get(id)
        .await
        .unwrap()
        .unwrap()
        .stock
}

#[tokio::test]
#[ignore = "requires a migrated PostgreSQL database"]
async fn order_creation_decrements_stock_and_computes_totals() {
    let pool = pool().await;
    let user = make_user(&pool).await;
    let product = make_product(&pool, Decimal::new(2500, 2), 10).await;

    let service = OrderService::new(&pool, PricingConfig::default(), None);
    let order = service
        .create_order(user.id, request(vec![(product.id, 3)]))
        .await
        .unwrap();

    assert_eq!(stock_of(&pool, product.id).await, 7);
    assert_eq!(order.status, OrderStatus::Processing);
    assert_eq!(order.payment_status, PaymentStatus::Pending);
    assert_eq!(order.subtotal, Decimal::new(7500, 2));
    assert_eq!(order.total, order.subtotal + order.shipping + order.tax);
    assert!(order.order_number.starts_with("ORD-"));
}

#[tokio::test]
#[ignore = "requires a migrated PostgreSQL database"]
async fn failed_order_leaves_stock_untouched() {
    let pool = pool().await;
    let user = make_user(&pool).await;
    let plenty = make_product(&pool, Decimal::from(10), 50).await;
    let scarce = make_product(&pool, Decimal::from(10), 2).await;

    let service = OrderService::new(&pool, PricingConfig::default(), None);
    // Second line exceeds stock; the first line's reservation must roll back.
    let err = service
        .create_order(user.id, request(vec![(plenty.id, 5), (scarce.id, 3)]))
        .await
        .unwrap_err();

    assert!(matches!(err, OrderError::InsufficientStock { .. }));
    assert_eq!(stock_of(&pool, plenty.id).await, 50);
    assert_eq!(stock_of(&pool, scarce.id).await, 2);
}

#[tokio::test]
#[ignore = "requires a migrated PostgreSQL database"]
async fn concurrent_orders_never_oversell() {
    let pool = pool().await;
    let user = make_user(&pool).await;
    let product = make_product(&pool, Decimal::from(10), 4).await;

    // 8 buyers race for 4 units.
    let mut handles = Vec::new();
    for _ in 0..8 {
        let pool = pool.clone();
        let user_id = user.id;
        let product_id = product.id;
        handles.push(tokio::spawn(async move {
            let service = OrderService::new(&pool, PricingConfig::default(), None);
            service
                .create_order(user_id, request(vec![(product_id, 1)]))
                .await
                .is_ok()
        }));
    }

    let mut successes = 0;
    for handle in handles {
        if handle.await.unwrap() {
            successes += 1;
        }
    }

    assert_eq!(successes, 4);
    assert_eq!(stock_of(&pool, product.id).await, 0);
}

#[tokio::test]
#[ignore = "requires a migrated PostgreSQL database"]
async fn line_items_snapshot_price_and_name() {
    let pool = pool().await;
    let user = make_user(&pool).await;
    let product = make_product(&pool, Decimal::new(9999, 2), 10).await;

    let service = OrderService::new(&pool, PricingConfig::default(), None);
    let order = service
        .create_order(user.id, request(vec![(product.id, 1)]))
        .await
        .unwrap();

    // Reprice the product after the order.
    let repriced = ProductDraft {
        name: "Renamed Widget".to_owned(),
        brand: product.brand.clone(),
        category: product.category.clone(),
        description: product.description.clone(),
        price: Decimal::new(1, 2),
        stock: 9,
        images: vec![],
    };
    ProductRepository::new(&pool)
        .update(product.id, &repriced)
        .await
        .unwrap();

    let reread = OrderRepository::new(&pool)
        .get(order.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reread.items[0].price, Decimal::new(9999, 2));
    assert_eq!(reread.items[0].name, product.name);
    assert_eq!(reread.subtotal, Decimal::new(9999, 2));
}

#[tokio::test]
#[ignore = "requires a migrated PostgreSQL database"]
async fn cancellation_restores_stock_exactly_once() {
    let pool = pool().await;
    let user = make_user(&pool).await;
    let product = make_product(&pool, Decimal::from(10), 10).await;

    let service = OrderService::new(&pool, PricingConfig::default(), None);
    let order = service
        .create_order(user.id, request(vec![(product.id, 4)]))
        .await
        .unwrap();
    assert_eq!(stock_of(&pool, product.id).await, 6);

    let identity = UserIdentity {
        user_id: user.id,
        role: UserRole::Customer,
    };

    let cancelled = service.cancel_order(order.id, identity).await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(stock_of(&pool, product.id).await, 10);

    // A second cancel must fail and must not restore again.
    let err = service.cancel_order(order.id, identity).await.unwrap_err();
    assert!(matches!(err, OrderError::NotCancellable(_)));
    assert_eq!(stock_of(&pool, product.id).await, 10);
}

#[tokio::test]
#[ignore = "requires a migrated PostgreSQL database"]
async fn shipped_orders_cannot_be_cancelled() {
    let pool = pool().await;
    let user = make_user(&pool).await;
    let product = make_product(&pool, Decimal::from(10), 10).await;

    let service = OrderService::new(&pool, PricingConfig::default(), None);
    let order = service
        .create_order(user.id, request(vec![(product.id, 2)]))
        .await
        .unwrap();

    service
        .update_status(order.id, OrderStatus::Confirmed)
        .await
        .unwrap();
    service
        .update_status(order.id, OrderStatus::Shipped)
        .await
        .unwrap();

    let identity = UserIdentity {
        user_id: user.id,
        role: UserRole::Customer,
    };
    let err = service.cancel_order(order.id, identity).await.unwrap_err();
    assert!(matches!(err, OrderError::NotCancellable(OrderStatus::Shipped)));
    assert_eq!(stock_of(&pool, product.id).await, 8);
}

#[tokio::test]
#[ignore = "requires a migrated PostgreSQL database"]
async fn delivery_settles_cash_on_delivery_payment() {
    let pool = pool().await;
    let user = make_user(&pool).await;
    let product = make_product(&pool, Decimal::from(10), 10).await;

    let service = OrderService::new(&pool, PricingConfig::default(), None);
    let order = service
        .create_order(user.id, request(vec![(product.id, 1)]))
        .await
        .unwrap();
    assert_eq!(order.payment_status, PaymentStatus::Pending);

    service
        .update_status(order.id, OrderStatus::Confirmed)
        .await
        .unwrap();
    service
        .update_status(order.id, OrderStatus::Shipped)
        .await
        .unwrap();
    let delivered = service
        .update_status(order.id, OrderStatus::Delivered)
        .await
        .unwrap();

    assert_eq!(delivered.status, OrderStatus::Delivered);
    assert_eq!(delivered.payment_status, PaymentStatus::Paid);
    assert!(delivered.paid_at.is_some());
    assert!(delivered.delivered_at.is_some());
}

#[tokio::test]
#[ignore = "requires a migrated PostgreSQL database"]
async fn status_chain_cannot_skip_or_reverse() {
    let pool = pool().await;
    let user = make_user(&pool).await;
    let product = make_product(&pool, Decimal::from(10), 10).await;

    let service = OrderService::new(&pool, PricingConfig::default(), None);
    let order = service
        .create_order(user.id, request(vec![(product.id, 1)]))
        .await
        .unwrap();

    // Skipping confirmed is rejected.
    let err = service
        .update_status(order.id, OrderStatus::Shipped)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::InvalidTransition { .. }));

    service
        .update_status(order.id, OrderStatus::Confirmed)
        .await
        .unwrap();

    // Reversing is rejected.
    let err = service
        .update_status(order.id, OrderStatus::Processing)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::InvalidTransition { .. }));
}

#[tokio::test]
#[ignore = "requires a migrated PostgreSQL database"]
async fn foreign_orders_cannot_be_cancelled_by_other_customers() {
    let pool = pool().await;
    let owner = make_user(&pool).await;
    let stranger = make_user(&pool).await;
    let product = make_product(&pool, Decimal::from(10), 10).await;

    let service = OrderService::new(&pool, PricingConfig::default(), None);
    let order = service
        .create_order(owner.id, request(vec![(product.id, 1)]))
        .await
        .unwrap();

    let identity = UserIdentity {
        user_id: stranger.id,
        role: UserRole::Customer,
    };
    let err = service.cancel_order(order.id, identity).await.unwrap_err();
    assert!(matches!(err, OrderError::NotOwner));

    // An admin may cancel on the customer's behalf.
    let admin = UserIdentity {
        user_id: stranger.id,
        role: UserRole::Admin,
    };
    let cancelled = service.cancel_order(order.id, admin).await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
}
