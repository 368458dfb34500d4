//! Storefront Client Library
//!
//! A typed client for the storefront REST backend: product browsing, a cart
//! kept in sync with the server, checkout, order history, saved shipping
//! addresses and the admin back-office.

pub mod admin;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod error;
pub mod fetch;
pub mod orders;
pub mod products;
pub mod shipping;
mod timestamp;

use std::sync::Arc;

use log::{info, warn};
use reqwest::Client;
use url::Url;

use crate::admin::{AdminApi, AdminStore};
use crate::auth::{AuthApi, AuthStore, SessionHandle, User};
use crate::cart::{CartApi, CartStore};
use crate::checkout::Checkout;
use crate::config::ClientOptions;
use crate::error::{Error, Result};
use crate::fetch::Transport;
use crate::orders::{Order, OrderHistory, OrdersApi};
use crate::products::{ProductCatalog, ProductsApi};
use crate::shipping::{AddressBook, ShippingApi};

/// The main entry point for the storefront client
///
/// Owns one HTTP client, the session shared by every request, and the state
/// containers built on top of them.
pub struct Storefront {
    url: String,
    session: SessionHandle,
    options: ClientOptions,
    orders_api: OrdersApi,
    auth: AuthStore,
    catalog: ProductCatalog,
    cart: CartStore,
    orders: OrderHistory,
    addresses: AddressBook,
    admin: AdminStore,
}

impl Storefront {
    /// Create a new storefront client
    ///
    /// # Arguments
    ///
    /// * `api_url` - Base URL of the REST API, e.g. `http://localhost:5000/api`
    ///
    /// # Example
    ///
    /// ```
    /// use storefront_client::Storefront;
    ///
    /// let storefront = Storefront::new("http://localhost:5000/api").unwrap();
    /// assert!(!storefront.auth().is_authenticated());
    /// ```
    pub fn new(api_url: &str) -> Result<Self> {
        Self::new_with_options(api_url, ClientOptions::default())
    }

    /// Create a new storefront client with custom options
    ///
    /// # Example
    ///
    /// ```
    /// use std::time::Duration;
    /// use storefront_client::{Storefront, config::ClientOptions};
    ///
    /// let options = ClientOptions::default().with_request_timeout(Some(Duration::from_secs(5)));
    /// let storefront = Storefront::new_with_options("http://localhost:5000/api", options).unwrap();
    /// ```
    pub fn new_with_options(api_url: &str, options: ClientOptions) -> Result<Self> {
        let parsed = Url::parse(api_url)?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::config(format!("Unsupported API URL scheme: {}", parsed.scheme())));
        }

        let mut builder = Client::builder();
        if let Some(timeout) = options.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build()?;

        let session = SessionHandle::new();
        let transport = Transport::new(api_url, http_client, session.clone(), &options);
        let orders_api = OrdersApi::new(transport.clone());

        Ok(Self {
            url: transport.base_url().to_string(),
            auth: AuthStore::new(AuthApi::new(transport.clone()), session.clone()),
            catalog: ProductCatalog::new(ProductsApi::new(transport.clone())),
            cart: CartStore::new(Arc::new(CartApi::new(transport.clone()))),
            orders: OrderHistory::new(orders_api.clone()),
            addresses: AddressBook::new(ShippingApi::new(transport.clone())),
            admin: AdminStore::new(AdminApi::new(transport)),
            orders_api,
            session,
            options,
        })
    }

    /// Create a client from `STOREFRONT_API_URL` and the other environment settings
    pub fn from_env() -> Result<Self> {
        let url = std::env::var(config::API_URL_ENV)
            .map_err(|_| Error::config(format!("{} is not set", config::API_URL_ENV)))?;
        Self::new_with_options(&url, ClientOptions::from_env()?)
    }

    /// Base URL of the REST API
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// The session shared by every request
    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn auth(&self) -> &AuthStore {
        &self.auth
    }

    pub fn catalog(&self) -> &ProductCatalog {
        &self.catalog
    }

    pub fn cart(&self) -> &CartStore {
        &self.cart
    }

    pub fn orders(&self) -> &OrderHistory {
        &self.orders
    }

    pub fn addresses(&self) -> &AddressBook {
        &self.addresses
    }

    pub fn admin(&self) -> &AdminStore {
        &self.admin
    }

    /// Start a checkout over the cached address book
    pub fn checkout(&self) -> Checkout {
        Checkout::new(self.addresses.addresses())
    }

    /// Place the order prepared by `checkout` and record it in the history
    pub async fn place_order(&self, checkout: &Checkout) -> Result<Order> {
        let generation = self.orders.generation();
        let order = checkout.place_order(&self.orders_api, &self.cart).await?;
        self.orders.record_at(generation, order.clone());
        Ok(order)
    }

    /// Resume a session from a stored token, loading the user and cart
    ///
    /// A token the server rejects is discarded.
    pub async fn restore_session(&self, access_token: &str) -> Result<User> {
        self.auth.restore(access_token)?;
        let (user, cart) = tokio::join!(self.auth.refresh_user(), self.cart.fetch());
        match user.and_then(|user| cart.map(|cart| (user, cart))) {
            Ok((user, cart)) => {
                info!("Restored session for user {} with {} cart line(s)", user.id, cart.items().len());
                Ok(user)
            }
            Err(e) => {
                if matches!(e.status(), Some(401) | Some(422)) {
                    warn!("Stored session rejected: {}", e);
                    self.logout();
                }
                Err(e)
            }
        }
    }

    /// Sign out and drop every piece of user-scoped state
    pub fn logout(&self) {
        self.auth.logout();
        self.cart.reset();
        self.orders.invalidate();
        self.addresses.invalidate();
        self.admin.reset();
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::auth::{Credentials, Registration, User};
    pub use crate::cart::{Cart, CartItem};
    pub use crate::checkout::{Checkout, CheckoutStep, PaymentMethod};
    pub use crate::config::ClientOptions;
    pub use crate::error::{Error, Result};
    pub use crate::orders::{Order, OrderStatus};
    pub use crate::products::{Product, ProductQuery};
    pub use crate::shipping::{AddressInput, ShippingAddress};
    pub use crate::Storefront;
}
