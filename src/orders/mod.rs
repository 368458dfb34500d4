//! Order placement and history

mod types;

use std::sync::{Mutex, PoisonError};

use log::{debug, info};
use reqwest::Method;

use crate::error::{Error, Result};
use crate::fetch::Transport;

pub use types::*;

/// Client for the `/orders` endpoints
#[derive(Clone)]
pub struct OrdersApi {
    transport: Transport,
}

impl OrdersApi {
    pub fn new(transport: Transport) -> Self {
        Self { transport }
    }

    /// Orders of the current user, newest first
    pub async fn list(&self) -> Result<Vec<Order>> {
        self.transport
            .authed(Method::GET, "/orders")?
            .execute::<Vec<Order>>()
            .await
    }

    /// Place an order
    pub async fn create(&self, order: &NewOrder) -> Result<Order> {
        if order.items.is_empty() {
            return Err(Error::validation("Order items are required"));
        }
        let envelope = self
            .transport
            .authed(Method::POST, "/orders")?
            .json(order)?
            .execute::<OrderEnvelope>()
            .await?;
        info!("Placed order {}", envelope.order.id);
        Ok(envelope.order)
    }
}

#[derive(Debug, Default)]
struct HistoryState {
    orders: Vec<Order>,
    loading: bool,
    error: Option<String>,
    /// Bumped by [`OrderHistory::invalidate`]
    generation: u64,
}

/// Cached order history of the current user
///
/// Responses to requests sent before [`invalidate`](OrderHistory::invalidate)
/// are returned to the caller but not cached.
pub struct OrderHistory {
    api: OrdersApi,
    state: Mutex<HistoryState>,
}

impl OrderHistory {
    pub fn new(api: OrdersApi) -> Self {
        Self {
            api,
            state: Mutex::new(HistoryState::default()),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, HistoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn orders(&self) -> Vec<Order> {
        self.state().orders.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state().loading
    }

    pub fn error(&self) -> Option<String> {
        self.state().error.clone()
    }

    pub(crate) fn generation(&self) -> u64 {
        self.state().generation
    }

    pub async fn fetch(&self) -> Result<Vec<Order>> {
        let generation = {
            let mut state = self.state();
            state.loading = true;
            state.error = None;
            state.generation
        };
        let result = self.api.list().await;

        let mut state = self.state();
        if state.generation != generation {
            debug!("Discarding order history from before the last invalidation");
            return result;
        }
        state.loading = false;
        match result {
            Ok(orders) => {
                state.orders = orders.clone();
                Ok(orders)
            }
            Err(e) => {
                state.error = Some(e.user_message());
                Err(e)
            }
        }
    }

    /// Put a freshly placed order at the head of the history
    pub fn record(&self, order: Order) {
        let generation = self.generation();
        self.record_at(generation, order);
    }

    /// Like [`record`](Self::record), unless the history was invalidated after `generation`
    pub(crate) fn record_at(&self, generation: u64, order: Order) {
        let mut state = self.state();
        if state.generation != generation {
            debug!("Not recording order {} placed before the last invalidation", order.id);
            return;
        }
        state.orders.retain(|o| o.id != order.id);
        state.orders.insert(0, order);
    }

    /// Drop the cached history; requests in flight no longer update it
    pub fn invalidate(&self) {
        let mut state = self.state();
        let generation = state.generation + 1;
        *state = HistoryState {
            generation,
            ..HistoryState::default()
        };
    }
}
