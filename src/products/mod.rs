//! Product catalog

mod types;

use std::sync::{Mutex, PoisonError};

use log::debug;
use reqwest::Method;

use crate::error::Result;
use crate::fetch::Transport;

pub use types::*;
pub(crate) use types::{canonical_stock, non_empty};

/// Client for the public `/products` endpoints
#[derive(Clone)]
pub struct ProductsApi {
    transport: Transport,
}

impl ProductsApi {
    pub fn new(transport: Transport) -> Self {
        Self { transport }
    }

    /// List products matching `query`
    pub async fn list(&self, query: &ProductQuery) -> Result<Vec<Product>> {
        query.validate()?;
        let mut request = self.transport.request(Method::GET, "/products");
        for (key, value) in query.pairs() {
            request = request.query(key, value);
        }
        request.execute::<Vec<Product>>().await
    }

    /// Fetch a single product
    pub async fn get(&self, id: i64) -> Result<Product> {
        self.transport
            .request(Method::GET, &format!("/products/{id}"))
            .execute::<Product>()
            .await
    }

    /// Distinct category names
    pub async fn categories(&self) -> Result<Vec<String>> {
        self.transport
            .request(Method::GET, "/products/categories")
            .execute::<Vec<String>>()
            .await
    }
}

#[derive(Debug, Default)]
struct CatalogState {
    items: Vec<Product>,
    query: ProductQuery,
    loading: bool,
    error: Option<String>,
    /// Bumped by [`ProductCatalog::invalidate`]
    generation: u64,
}

/// Cached product listing
pub struct ProductCatalog {
    api: ProductsApi,
    state: Mutex<CatalogState>,
}

impl ProductCatalog {
    pub fn new(api: ProductsApi) -> Self {
        Self {
            api,
            state: Mutex::new(CatalogState::default()),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, CatalogState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn items(&self) -> Vec<Product> {
        self.state().items.clone()
    }

    /// Filters used by the last successful fetch
    pub fn query(&self) -> ProductQuery {
        self.state().query.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state().loading
    }

    pub fn error(&self) -> Option<String> {
        self.state().error.clone()
    }

    /// Look up a product in the cached listing
    pub fn cached(&self, id: i64) -> Option<Product> {
        self.state().items.iter().find(|p| p.id == id).cloned()
    }

    /// Replace the cached listing with a fresh one
    pub async fn fetch(&self, query: ProductQuery) -> Result<Vec<Product>> {
        let generation = {
            let mut state = self.state();
            state.loading = true;
            state.error = None;
            state.generation
        };

        let result = self.api.list(&query).await;

        let mut state = self.state();
        if state.generation != generation {
            debug!("Discarding catalog listing from before the last invalidation");
            return result;
        }
        state.loading = false;
        match result {
            Ok(items) => {
                debug!("Catalog refreshed with {} products", items.len());
                state.items = items.clone();
                state.query = query;
                Ok(items)
            }
            Err(e) => {
                state.error = Some(e.user_message());
                Err(e)
            }
        }
    }

    /// Fetch one product and refresh its cached copy
    pub async fn fetch_one(&self, id: i64) -> Result<Product> {
        let generation = self.state().generation;
        let result = self.api.get(id).await;
        let mut state = self.state();
        if state.generation != generation {
            return result;
        }
        match result {
            Ok(product) => {
                if let Some(slot) = state.items.iter_mut().find(|p| p.id == id) {
                    *slot = product.clone();
                }
                Ok(product)
            }
            Err(e) => {
                state.error = Some(e.user_message());
                Err(e)
            }
        }
    }

    /// Category names for the filter menu
    pub async fn categories(&self) -> Result<Vec<String>> {
        self.api.categories().await
    }

    /// Drop the cached listing; fetches in flight no longer update it
    pub fn invalidate(&self) {
        let mut state = self.state();
        let generation = state.generation + 1;
        *state = CatalogState {
            generation,
            ..CatalogState::default()
        };
    }
}
