//! Admin back-office types

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::auth::User;
use crate::error::{Error, Result};
use crate::orders::{Order, OrderStatus};
use crate::products::{non_empty, Product, ProductImage};

/// Dashboard counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdminStats {
    pub total_users: u64,
    pub total_products: u64,
    pub total_orders: u64,
    pub total_revenue: Decimal,
}

/// Product form contents for create and update
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProductInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub stock_quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Inline image as a `data:` URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_data: Option<String>,
}

impl ProductInput {
    pub fn new(name: &str, price: Decimal, stock_quantity: u32) -> Self {
        Self {
            name: name.to_string(),
            price,
            stock_quantity,
            ..Self::default()
        }
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = non_empty(Some(description.to_string()));
        self
    }

    pub fn category(mut self, category: &str) -> Self {
        self.category = non_empty(Some(category.to_string()));
        self
    }

    pub fn image_url(mut self, url: &str) -> Self {
        self.image_url = non_empty(Some(url.to_string()));
        self
    }

    /// Attach an uploaded image, sent inline as base64
    pub fn with_image_bytes(mut self, mime_type: &str, bytes: &[u8]) -> Result<Self> {
        if !mime_type.starts_with("image/") {
            return Err(Error::validation(format!("{mime_type} is not an image type")));
        }
        if bytes.is_empty() {
            return Err(Error::validation("Image file is empty"));
        }
        self.image_data = Some(ProductImage::to_data_url(mime_type, bytes));
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::validation("Product name is required"));
        }
        if self.price < Decimal::ZERO {
            return Err(Error::validation("Price cannot be negative"));
        }
        Ok(())
    }
}

impl From<&Product> for ProductInput {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price,
            stock_quantity: product.stock_quantity,
            category: product.category.clone(),
            image_url: product.image_url.clone(),
            image_data: None,
        }
    }
}

/// Partial user update; absent fields are left unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,
}

#[derive(Debug, Serialize)]
pub(crate) struct StatusUpdate {
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProductEnvelope {
    pub product: Product,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserEnvelope {
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OrderEnvelope {
    pub order: Order,
}
