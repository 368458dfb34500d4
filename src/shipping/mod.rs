//! Saved shipping addresses

mod types;

use std::sync::{Mutex, PoisonError};

use log::debug;
use reqwest::Method;

use crate::error::Result;
use crate::fetch::Transport;

pub use types::*;

/// Client for the `/shipping/addresses` endpoints
#[derive(Clone)]
pub struct ShippingApi {
    transport: Transport,
}

impl ShippingApi {
    pub fn new(transport: Transport) -> Self {
        Self { transport }
    }

    /// Addresses of the current user, default first
    pub async fn list(&self) -> Result<Vec<ShippingAddress>> {
        self.transport
            .authed(Method::GET, "/shipping/addresses")?
            .execute::<Vec<ShippingAddress>>()
            .await
    }

    pub async fn create(&self, input: &AddressInput) -> Result<ShippingAddress> {
        input.validate()?;
        let envelope = self
            .transport
            .authed(Method::POST, "/shipping/addresses")?
            .json(&input.normalized())?
            .execute::<AddressEnvelope>()
            .await?;
        Ok(envelope.address)
    }

    pub async fn update(&self, id: i64, input: &AddressInput) -> Result<ShippingAddress> {
        input.validate()?;
        let envelope = self
            .transport
            .authed(Method::PUT, &format!("/shipping/addresses/{id}"))?
            .json(&input.normalized())?
            .execute::<AddressEnvelope>()
            .await?;
        Ok(envelope.address)
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        self.transport
            .authed(Method::DELETE, &format!("/shipping/addresses/{id}"))?
            .execute_unit()
            .await
    }

    pub async fn set_default(&self, id: i64) -> Result<ShippingAddress> {
        let envelope = self
            .transport
            .authed(Method::PUT, &format!("/shipping/addresses/{id}/set-default"))?
            .execute::<AddressEnvelope>()
            .await?;
        Ok(envelope.address)
    }
}

#[derive(Debug, Default)]
struct BookState {
    addresses: Vec<ShippingAddress>,
    loading: bool,
    error: Option<String>,
    /// Bumped by [`AddressBook::invalidate`]
    generation: u64,
}

impl BookState {
    /// Insert or replace `address`; a default address demotes every other one
    fn upsert(&mut self, address: ShippingAddress) {
        if address.is_default {
            for other in self.addresses.iter_mut() {
                other.is_default = false;
            }
        }
        match self.addresses.iter_mut().find(|a| a.id == address.id) {
            Some(slot) => *slot = address,
            None => self.addresses.push(address),
        }
        // Default first, as the server lists them.
        self.addresses.sort_by_key(|a| !a.is_default);
    }
}

/// Cached address book of the current user
///
/// At most one address is marked default after any mutation. Responses to
/// requests sent before [`invalidate`](AddressBook::invalidate) are not cached.
pub struct AddressBook {
    api: ShippingApi,
    state: Mutex<BookState>,
}

impl AddressBook {
    pub fn new(api: ShippingApi) -> Self {
        Self {
            api,
            state: Mutex::new(BookState::default()),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, BookState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn addresses(&self) -> Vec<ShippingAddress> {
        self.state().addresses.clone()
    }

    pub fn default_address(&self) -> Option<ShippingAddress> {
        self.state().addresses.iter().find(|a| a.is_default).cloned()
    }

    pub fn is_loading(&self) -> bool {
        self.state().loading
    }

    pub fn error(&self) -> Option<String> {
        self.state().error.clone()
    }

    fn generation(&self) -> u64 {
        self.state().generation
    }

    /// Fold a finished request into the cache unless it was invalidated meanwhile
    fn settle<T, A>(&self, generation: u64, result: Result<T>, apply: A) -> Result<T>
    where
        A: FnOnce(&mut BookState, &T),
    {
        let mut state = self.state();
        if state.generation != generation {
            debug!("Discarding address response from before the last invalidation");
            return result;
        }
        match &result {
            Ok(value) => apply(&mut state, value),
            Err(e) => state.error = Some(e.user_message()),
        }
        result
    }

    pub async fn fetch(&self) -> Result<Vec<ShippingAddress>> {
        let generation = {
            let mut state = self.state();
            state.loading = true;
            state.error = None;
            state.generation
        };
        let result = self.api.list().await;

        let mut state = self.state();
        if state.generation != generation {
            debug!("Discarding address list from before the last invalidation");
            return result;
        }
        state.loading = false;
        match result {
            Ok(addresses) => {
                state.addresses.clear();
                for address in addresses {
                    state.upsert(address);
                }
                Ok(state.addresses.clone())
            }
            Err(e) => {
                state.error = Some(e.user_message());
                Err(e)
            }
        }
    }

    pub async fn create(&self, input: &AddressInput) -> Result<ShippingAddress> {
        let generation = self.generation();
        let result = self.api.create(input).await;
        let address = self.settle(generation, result, |state, address| state.upsert(address.clone()))?;
        debug!("Created shipping address {}", address.id);
        Ok(address)
    }

    pub async fn update(&self, id: i64, input: &AddressInput) -> Result<ShippingAddress> {
        let generation = self.generation();
        let result = self.api.update(id, input).await;
        self.settle(generation, result, |state, address| state.upsert(address.clone()))
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let generation = self.generation();
        let result = self.api.delete(id).await;
        self.settle(generation, result, |state, _| state.addresses.retain(|a| a.id != id))
    }

    pub async fn set_default(&self, id: i64) -> Result<ShippingAddress> {
        let generation = self.generation();
        let result = self.api.set_default(id).await.map(|mut address| {
            address.is_default = true;
            address
        });
        self.settle(generation, result, |state, address| state.upsert(address.clone()))
    }

    /// Drop the cached book; requests in flight no longer update it
    pub fn invalidate(&self) {
        let mut state = self.state();
        let generation = state.generation + 1;
        *state = BookState {
            generation,
            ..BookState::default()
        };
    }
}
