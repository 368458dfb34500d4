mod common;

use serde_json::json;
use storefront_client::shipping::AddressInput;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_set_default_leaves_single_default() {
    let mock_server = MockServer::start().await;
    let storefront = common::logged_in(&mock_server, false).await;

    Mock::given(method("GET"))
        .and(path("/shipping/addresses"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            common::address(1, true),
            common::address(2, false),
            common::address(3, false)
        ])))
        .mount(&mock_server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/shipping/addresses/3/set-default"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Default address set successfully",
            "address": common::address(3, true)
        })))
        .mount(&mock_server)
        .await;

    let book = storefront.addresses();
    book.fetch().await.unwrap();
    book.set_default(3).await.unwrap();

    let defaults: Vec<i64> = book.addresses().iter().filter(|a| a.is_default).map(|a| a.id).collect();
    assert_eq!(defaults, vec![3]);
    assert_eq!(book.default_address().map(|a| a.id), Some(3));
}

#[tokio::test]
async fn test_create_validates_before_sending() {
    let mock_server = MockServer::start().await;
    let storefront = common::logged_in(&mock_server, false).await;

    Mock::given(method("POST"))
        .and(path("/shipping/addresses"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "message": "Shipping address created successfully",
            "address": common::address(5, false)
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut input = AddressInput {
        full_name: "Sam Shopper".to_string(),
        address_line1: "5 Market St".to_string(),
        city: "Portland".to_string(),
        state: "OR".to_string(),
        postal_code: "".to_string(),
        country: "US".to_string(),
        ..AddressInput::default()
    };
    let err = storefront.addresses().create(&input).await.unwrap_err();
    assert_eq!(err.user_message(), "postal_code is required");

    input.postal_code = "97201".to_string();
    let created = storefront.addresses().create(&input).await.unwrap();
    assert_eq!(created.id, 5);
    assert_eq!(storefront.addresses().addresses().len(), 1);
}

#[tokio::test]
async fn test_delete_address() {
    let mock_server = MockServer::start().await;
    let storefront = common::logged_in(&mock_server, false).await;

    Mock::given(method("GET"))
        .and(path("/shipping/addresses"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([common::address(1, true), common::address(2, false)])),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/shipping/addresses/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "Shipping address deleted successfully" })))
        .mount(&mock_server)
        .await;

    let book = storefront.addresses();
    book.fetch().await.unwrap();
    book.delete(2).await.unwrap();

    assert_eq!(book.addresses().iter().map(|a| a.id).collect::<Vec<_>>(), vec![1]);
}
