//! Admin back-office: product, user and order management

mod types;

use std::sync::{Mutex, MutexGuard, PoisonError};

use log::{debug, info};
use reqwest::Method;

use crate::auth::User;
use crate::error::{Error, Result};
use crate::fetch::{FetchBuilder, Transport};
use crate::orders::{Order, OrderStatus};
use crate::products::Product;

pub use types::{AdminStats, ProductInput, UserUpdate};
use types::{OrderEnvelope, ProductEnvelope, StatusUpdate, UserEnvelope};

/// Client for the `/admin` endpoints
#[derive(Clone)]
pub struct AdminApi {
    transport: Transport,
}

impl AdminApi {
    pub fn new(transport: Transport) -> Self {
        Self { transport }
    }

    fn admin(&self, method: Method, path: &str) -> Result<FetchBuilder<'_>> {
        let request = self.transport.authed(method, path)?;
        if !self.transport.session().is_admin() {
            return Err(Error::auth("Admin access required"));
        }
        Ok(request)
    }

    pub async fn stats(&self) -> Result<AdminStats> {
        self.admin(Method::GET, "/admin/stats")?.execute().await
    }

    pub async fn products(&self) -> Result<Vec<Product>> {
        self.admin(Method::GET, "/admin/products")?.execute().await
    }

    pub async fn create_product(&self, input: &ProductInput) -> Result<Product> {
        input.validate()?;
        let envelope: ProductEnvelope = self
            .admin(Method::POST, "/admin/products")?
            .json(input)?
            .execute()
            .await?;
        Ok(envelope.product)
    }

    pub async fn update_product(&self, id: i64, input: &ProductInput) -> Result<Product> {
        input.validate()?;
        let envelope: ProductEnvelope = self
            .admin(Method::PUT, &format!("/admin/products/{id}"))?
            .json(input)?
            .execute()
            .await?;
        Ok(envelope.product)
    }

    pub async fn delete_product(&self, id: i64) -> Result<()> {
        self.admin(Method::DELETE, &format!("/admin/products/{id}"))?
            .execute_unit()
            .await
    }

    pub async fn users(&self) -> Result<Vec<User>> {
        self.admin(Method::GET, "/admin/users")?.execute().await
    }

    pub async fn update_user(&self, id: i64, update: &UserUpdate) -> Result<User> {
        let envelope: UserEnvelope = self
            .admin(Method::PUT, &format!("/admin/users/{id}"))?
            .json(update)?
            .execute()
            .await?;
        Ok(envelope.user)
    }

    pub async fn delete_user(&self, id: i64) -> Result<()> {
        self.admin(Method::DELETE, &format!("/admin/users/{id}"))?
            .execute_unit()
            .await
    }

    /// Every order in the shop, newest first
    pub async fn orders(&self) -> Result<Vec<Order>> {
        self.admin(Method::GET, "/admin/orders")?.execute().await
    }

    pub async fn update_order_status(&self, id: i64, status: OrderStatus) -> Result<Order> {
        let envelope: OrderEnvelope = self
            .admin(Method::PUT, &format!("/admin/orders/{id}/status"))?
            .json(&StatusUpdate { status })?
            .execute()
            .await?;
        Ok(envelope.order)
    }
}

#[derive(Debug, Default)]
struct AdminState {
    stats: Option<AdminStats>,
    products: Vec<Product>,
    users: Vec<User>,
    orders: Vec<Order>,
    loading: usize,
    error: Option<String>,
    /// Bumped by [`AdminStore::reset`]
    generation: u64,
}

/// Cached back-office lists
///
/// Lists only change after the server confirms a mutation. Responses to
/// requests sent before a reset are returned to the caller but not cached.
pub struct AdminStore {
    api: AdminApi,
    state: Mutex<AdminState>,
}

impl AdminStore {
    pub fn new(api: AdminApi) -> Self {
        Self {
            api,
            state: Mutex::new(AdminState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, AdminState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn stats(&self) -> Option<AdminStats> {
        self.state().stats.clone()
    }

    pub fn products(&self) -> Vec<Product> {
        self.state().products.clone()
    }

    pub fn users(&self) -> Vec<User> {
        self.state().users.clone()
    }

    pub fn orders(&self) -> Vec<Order> {
        self.state().orders.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state().loading > 0
    }

    pub fn error(&self) -> Option<String> {
        self.state().error.clone()
    }

    pub fn clear_error(&self) {
        self.state().error = None;
    }

    /// Run `request`, tracking loading, and fold its result into the cache
    ///
    /// `apply` sees the state only when the request succeeded and no reset
    /// happened while it was in flight.
    async fn track<T, F, A>(&self, request: F, apply: A) -> Result<T>
    where
        F: std::future::Future<Output = Result<T>>,
        A: FnOnce(&mut AdminState, &T),
    {
        let generation = {
            let mut state = self.state();
            state.loading += 1;
            state.error = None;
            state.generation
        };
        let result = request.await;

        let mut state = self.state();
        if state.generation != generation {
            debug!("Discarding admin response from before the last reset");
            return result;
        }
        state.loading = state.loading.saturating_sub(1);
        match &result {
            Ok(value) => apply(&mut state, value),
            Err(e) => state.error = Some(e.user_message()),
        }
        result
    }

    pub async fn fetch_stats(&self) -> Result<AdminStats> {
        self.track(self.api.stats(), |state, stats| state.stats = Some(stats.clone()))
            .await
    }

    pub async fn fetch_products(&self) -> Result<Vec<Product>> {
        let products = self
            .track(self.api.products(), |state, products| state.products = products.clone())
            .await?;
        debug!("Loaded {} products for admin", products.len());
        Ok(products)
    }

    /// Create a product; the list gains it only once the server confirms
    pub async fn create_product(&self, input: &ProductInput) -> Result<Product> {
        let product = self
            .track(self.api.create_product(input), |state, product| {
                state.products.push(product.clone())
            })
            .await?;
        info!("Created product {} ({})", product.id, product.name);
        Ok(product)
    }

    pub async fn update_product(&self, id: i64, input: &ProductInput) -> Result<Product> {
        self.track(self.api.update_product(id, input), |state, product| {
            if let Some(slot) = state.products.iter_mut().find(|p| p.id == product.id) {
                *slot = product.clone();
            }
        })
        .await
    }

    pub async fn delete_product(&self, id: i64) -> Result<()> {
        self.track(self.api.delete_product(id), |state, _| {
            state.products.retain(|p| p.id != id)
        })
        .await?;
        info!("Deleted product {id}");
        Ok(())
    }

    pub async fn fetch_users(&self) -> Result<Vec<User>> {
        self.track(self.api.users(), |state, users| state.users = users.clone())
            .await
    }

    pub async fn update_user(&self, id: i64, update: &UserUpdate) -> Result<User> {
        self.track(self.api.update_user(id, update), |state, user| {
            if let Some(slot) = state.users.iter_mut().find(|u| u.id == user.id) {
                *slot = user.clone();
            }
        })
        .await
    }

    pub async fn delete_user(&self, id: i64) -> Result<()> {
        self.track(self.api.delete_user(id), |state, _| state.users.retain(|u| u.id != id))
            .await
    }

    pub async fn fetch_orders(&self) -> Result<Vec<Order>> {
        self.track(self.api.orders(), |state, orders| state.orders = orders.clone())
            .await
    }

    pub async fn update_order_status(&self, id: i64, status: OrderStatus) -> Result<Order> {
        let order = self
            .track(self.api.update_order_status(id, status), |state, order| {
                if let Some(slot) = state.orders.iter_mut().find(|o| o.id == order.id) {
                    *slot = order.clone();
                }
            })
            .await?;
        info!("Order {} is now {}", order.id, order.status);
        Ok(order)
    }

    /// Drop every cached list; requests in flight no longer update the cache
    pub fn reset(&self) {
        let mut state = self.state();
        let generation = state.generation + 1;
        *state = AdminState {
            generation,
            ..AdminState::default()
        };
    }
}
