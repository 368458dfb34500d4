mod common;

use rust_decimal::Decimal;
use serde_json::json;
use std::str::FromStr;
use storefront_client::admin::{ProductInput, UserUpdate};
use storefront_client::orders::OrderStatus;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_products(mock_server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/admin/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            common::product(1, "Laptop", 999.99, 5),
            common::product(2, "Mouse", 19.99, 50),
            common::product(3, "Monitor", 249.0, 8)
        ])))
        .mount(mock_server)
        .await;
}

fn ids(products: &[storefront_client::products::Product]) -> Vec<i64> {
    products.iter().map(|p| p.id).collect()
}

#[tokio::test]
async fn test_delete_product_removes_exactly_that_id() {
    let mock_server = MockServer::start().await;
    let storefront = common::logged_in(&mock_server, true).await;
    mount_products(&mock_server).await;

    Mock::given(method("DELETE"))
        .and(path("/admin/products/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "Product deleted successfully" })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let admin = storefront.admin();
    admin.fetch_products().await.unwrap();
    admin.delete_product(2).await.unwrap();

    assert_eq!(ids(&admin.products()), vec![1, 3]);
}

#[tokio::test]
async fn test_failed_create_leaves_list_unchanged() {
    let mock_server = MockServer::start().await;
    let storefront = common::logged_in(&mock_server, true).await;
    mount_products(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/admin/products"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "error": "Invalid image data" })))
        .mount(&mock_server)
        .await;

    let admin = storefront.admin();
    admin.fetch_products().await.unwrap();

    let input = ProductInput::new("Webcam", Decimal::from_str("59.00").unwrap(), 10);
    let err = admin.create_product(&input).await.unwrap_err();

    assert_eq!(err.status(), Some(400));
    assert_eq!(ids(&admin.products()), vec![1, 2, 3]);
    assert_eq!(admin.error().as_deref(), Some("Invalid image data"));
}

#[tokio::test]
async fn test_create_and_update_product() {
    let mock_server = MockServer::start().await;
    let storefront = common::logged_in(&mock_server, true).await;
    mount_products(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/admin/products"))
        .and(body_json(json!({
            "name": "Webcam",
            "price": 59.5,
            "stock_quantity": 10,
            "category": "Electronics"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "message": "Product created successfully",
            "product": common::product(4, "Webcam", 59.5, 10)
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/admin/products/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Product updated successfully",
            "product": common::product(1, "Laptop Pro", 1299.0, 3)
        })))
        .mount(&mock_server)
        .await;

    let admin = storefront.admin();
    admin.fetch_products().await.unwrap();

    let input = ProductInput::new("Webcam", Decimal::from_str("59.50").unwrap(), 10).category("Electronics");
    admin.create_product(&input).await.unwrap();
    assert_eq!(ids(&admin.products()), vec![1, 2, 3, 4]);

    let laptop = admin.products()[0].clone();
    let update = ProductInput::from(&laptop);
    admin.update_product(1, &update).await.unwrap();

    let products = admin.products();
    assert_eq!(products[0].name, "Laptop Pro");
    assert_eq!(products[0].stock_quantity, 3);
    assert_eq!(products.len(), 4);
}

#[tokio::test]
async fn test_users_orders_and_stats() {
    let mock_server = MockServer::start().await;
    let storefront = common::logged_in(&mock_server, true).await;

    Mock::given(method("GET"))
        .and(path("/admin/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_users": 2, "total_products": 3, "total_orders": 1, "total_revenue": 24.0
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/admin/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([common::user(1, true), common::user(2, false)])))
        .mount(&mock_server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/admin/users/2"))
        .and(body_json(json!({ "is_admin": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "User updated successfully",
            "user": common::user(2, true)
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/admin/users/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "User deleted successfully" })))
        .mount(&mock_server)
        .await;

    let order = json!({
        "id": 9, "user_id": 2, "total_amount": 24.0, "status": "pending",
        "shipping_address": "Sam Shopper, 1 Market St, Portland, OR 97201, US",
        "order_items": []
    });
    let mut shipped = order.clone();
    shipped["status"] = json!("shipped");
    Mock::given(method("GET"))
        .and(path("/admin/orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([order])))
        .mount(&mock_server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/admin/orders/9/status"))
        .and(body_json(json!({ "status": "shipped" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Order status updated",
            "order": shipped
        })))
        .mount(&mock_server)
        .await;

    let admin = storefront.admin();

    let stats = admin.fetch_stats().await.unwrap();
    assert_eq!(stats.total_revenue, Decimal::from(24));
    assert_eq!(admin.stats(), Some(stats));

    admin.fetch_users().await.unwrap();
    let update = UserUpdate {
        is_admin: Some(true),
        ..UserUpdate::default()
    };
    admin.update_user(2, &update).await.unwrap();
    assert!(admin.users().iter().all(|u| u.is_admin));
    admin.delete_user(1).await.unwrap();
    assert_eq!(admin.users().iter().map(|u| u.id).collect::<Vec<_>>(), vec![2]);

    admin.fetch_orders().await.unwrap();
    admin.update_order_status(9, OrderStatus::Shipped).await.unwrap();
    assert_eq!(admin.orders()[0].status, OrderStatus::Shipped);
    assert!(!admin.is_loading());
}

#[tokio::test]
async fn test_non_admin_is_refused_without_request() {
    let mock_server = MockServer::start().await;
    let storefront = common::logged_in(&mock_server, false).await;

    Mock::given(method("GET"))
        .and(path("/admin/stats"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let err = storefront.admin().fetch_stats().await.unwrap_err();
    assert_eq!(err.user_message(), "Admin access required");
    assert_eq!(storefront.admin().error().as_deref(), Some("Admin access required"));
}
