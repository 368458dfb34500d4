//! Cart state container

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use log::{debug, warn};
use rust_decimal::Decimal;

use crate::error::Result;
use crate::products::Product;

use super::state::{validate_quantity, CartState};
use super::types::Cart;

/// Server side of the cart
///
/// Every operation answers with the server's full cart after the change.
#[async_trait]
pub trait CartBackend: Send + Sync {
    async fn fetch(&self) -> Result<Cart>;
    async fn add(&self, product_id: i64, quantity: u32) -> Result<Cart>;
    async fn update(&self, product_id: i64, quantity: u32) -> Result<Cart>;
    async fn remove(&self, product_id: i64) -> Result<Cart>;
    async fn clear(&self) -> Result<Cart>;
}

/// Client-visible cart kept in sync with the server's
pub struct CartStore {
    backend: Arc<dyn CartBackend>,
    state: Mutex<CartState>,
}

impl CartStore {
    pub fn new(backend: Arc<dyn CartBackend>) -> Self {
        Self {
            backend,
            state: Mutex::new(CartState::new()),
        }
    }

    fn state(&self) -> MutexGuard<'_, CartState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current lines
    pub fn snapshot(&self) -> Cart {
        self.state().cart().clone()
    }

    pub fn total_items(&self) -> u32 {
        self.state().cart().total_items()
    }

    pub fn total_amount(&self) -> Decimal {
        self.state().cart().total_amount()
    }

    pub fn is_loading(&self) -> bool {
        self.state().is_loading()
    }

    /// Message of the last failed operation
    pub fn error(&self) -> Option<String> {
        self.state().error().map(str::to_string)
    }

    pub fn clear_error(&self) {
        self.state().clear_error();
    }

    async fn run<F>(&self, targets: &[i64], request: F) -> Result<Cart>
    where
        F: Future<Output = Result<Cart>>,
    {
        let ticket = self.state().begin(targets);
        let result = request.await;

        let mut state = self.state();
        if !state.is_current(&ticket) {
            debug!("Ignoring cart response issued before the last reset");
            return result.map(|_| state.cart().clone());
        }

        match result {
            Ok(snapshot) => {
                let outcome = state.reconcile(&ticket, snapshot);
                state.finish(&ticket);
                if outcome.stale > 0 {
                    warn!("Kept newer local state for {} cart line(s)", outcome.stale);
                }
                Ok(state.cart().clone())
            }
            Err(e) => {
                state.finish(&ticket);
                state.set_error(e.user_message());
                Err(e)
            }
        }
    }

    /// Load the server's cart
    pub async fn fetch(&self) -> Result<Cart> {
        self.run(&[], self.backend.fetch()).await
    }

    /// Add `quantity` of a product on the server
    pub async fn add_item(&self, product_id: i64, quantity: u32) -> Result<Cart> {
        validate_quantity(quantity)?;
        self.run(&[product_id], self.backend.add(product_id, quantity)).await
    }

    /// Set a line's quantity on the server
    ///
    /// Quantities below one are rejected before any request is made.
    pub async fn update_quantity(&self, product_id: i64, quantity: u32) -> Result<Cart> {
        validate_quantity(quantity)?;
        self.run(&[product_id], self.backend.update(product_id, quantity)).await
    }

    /// Remove a line on the server
    pub async fn remove_item(&self, product_id: i64) -> Result<Cart> {
        self.run(&[product_id], self.backend.remove(product_id)).await
    }

    /// Empty the cart on the server and locally
    pub async fn clear(&self) -> Result<Cart> {
        let targets: Vec<i64> = self.state().cart().items().iter().map(|i| i.product_id).collect();
        self.run(&targets, self.backend.clear()).await
    }

    /// Optimistically add a product, without a server round trip
    pub fn add_local(&self, product: &Product, quantity: u32) -> Result<Cart> {
        let mut state = self.state();
        state.add_local(product, quantity)?;
        Ok(state.cart().clone())
    }

    /// Optimistically change a line's quantity
    pub fn update_local(&self, product_id: i64, quantity: u32) -> Result<Cart> {
        let mut state = self.state();
        state.update_local(product_id, quantity)?;
        Ok(state.cart().clone())
    }

    /// Optimistically drop a line
    pub fn remove_local(&self, product_id: i64) -> bool {
        self.state().remove_local(product_id)
    }

    pub fn clear_local(&self) {
        self.state().clear_local();
    }

    /// Drop all local state; responses to requests already in flight are ignored
    pub fn reset(&self) {
        self.state().reset();
    }
}
