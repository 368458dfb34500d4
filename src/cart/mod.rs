//! Shopping cart: HTTP client, reconciliation state and container

mod state;
mod store;
mod types;

use async_trait::async_trait;
use reqwest::Method;
use serde::Serialize;

use crate::error::Result;
use crate::fetch::Transport;

pub use state::{CartState, Reconciled, Ticket};
pub use store::{CartBackend, CartStore};
pub use types::{Cart, CartItem};

#[derive(Debug, Serialize)]
struct CartLineRequest {
    product_id: i64,
    quantity: u32,
}

/// Client for the `/cart` endpoints
#[derive(Clone)]
pub struct CartApi {
    transport: Transport,
}

impl CartApi {
    pub fn new(transport: Transport) -> Self {
        Self { transport }
    }

    async fn send(&self, method: Method, path: &str, body: Option<&CartLineRequest>) -> Result<Cart> {
        let mut request = self.transport.authed(method, path)?;
        if let Some(body) = body {
            request = request.json(body)?;
        }
        let value = request.execute::<serde_json::Value>().await?;
        types::parse_cart(value)
    }
}

#[async_trait]
impl CartBackend for CartApi {
    async fn fetch(&self) -> Result<Cart> {
        self.send(Method::GET, "/cart", None).await
    }

    async fn add(&self, product_id: i64, quantity: u32) -> Result<Cart> {
        let body = CartLineRequest { product_id, quantity };
        self.send(Method::POST, "/cart/add", Some(&body)).await
    }

    async fn update(&self, product_id: i64, quantity: u32) -> Result<Cart> {
        let body = CartLineRequest { product_id, quantity };
        self.send(Method::PUT, "/cart/update", Some(&body)).await
    }

    async fn remove(&self, product_id: i64) -> Result<Cart> {
        self.send(Method::DELETE, &format!("/cart/remove/{product_id}"), None).await
    }

    async fn clear(&self) -> Result<Cart> {
        self.send(Method::DELETE, "/cart/clear", None).await
    }
}
