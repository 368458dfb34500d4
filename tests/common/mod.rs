#![allow(dead_code)]

use serde_json::{json, Value};
use storefront_client::auth::Credentials;
use storefront_client::Storefront;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN: &str = "test_access_token";

pub fn init_logging() {
    let _ = pretty_env_logger::try_init();
}

pub fn user(id: i64, is_admin: bool) -> Value {
    json!({
        "id": id,
        "email": "shopper@example.com",
        "first_name": "Sam",
        "last_name": "Shopper",
        "is_admin": is_admin,
        "created_at": "2024-01-15T08:00:00"
    })
}

pub fn product(id: i64, name: &str, price: f64, stock: i64) -> Value {
    json!({
        "id": id,
        "name": name,
        "description": format!("{} description", name),
        "price": price,
        "stock_quantity": stock,
        "stock": stock,
        "quantity": stock,
        "category": "Electronics",
        "image_url": "",
        "image_data": null,
        "created_at": "2024-02-01T10:00:00"
    })
}

pub fn cart_line(id: i64, product_id: i64, quantity: i64, price: f64) -> Value {
    json!({
        "id": id,
        "product_id": product_id,
        "quantity": quantity,
        "product": {
            "id": product_id,
            "name": format!("Product {}", product_id),
            "price": price,
            "stock_quantity": 25,
            "category": "Electronics"
        }
    })
}

pub fn cart(lines: Vec<Value>) -> Value {
    let count = lines.len();
    json!({ "id": 1, "user_id": 1, "items": lines, "total_items": count })
}

pub fn address(id: i64, is_default: bool) -> Value {
    json!({
        "id": id,
        "user_id": 1,
        "full_name": "Sam Shopper",
        "address_line1": format!("{} Market St", id),
        "address_line2": "",
        "city": "Portland",
        "state": "OR",
        "postal_code": "97201",
        "country": "US",
        "phone_number": "",
        "is_default": is_default,
        "created_at": "2024-02-10T12:00:00"
    })
}

/// Log a fresh client in against the mock server
pub async fn logged_in(server: &MockServer, is_admin: bool) -> Storefront {
    init_logging();
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Login successful",
            "access_token": TOKEN,
            "user": user(1, is_admin)
        })))
        .mount(server)
        .await;

    let storefront = Storefront::new(&server.uri()).unwrap();
    storefront
        .auth()
        .login(&Credentials::new("shopper@example.com", "password123"))
        .await
        .unwrap();
    storefront
}
