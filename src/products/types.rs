//! Product types and the canonical product schema

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A product as exposed by the catalog
///
/// Incoming payloads are validated by [`RawProduct`]; stock is only ever
/// exposed as `stock_quantity`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawProduct")]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock_quantity: u32,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub image_data: Option<String>,
    #[serde(with = "crate::timestamp::option", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Wire form of a product, before validation
///
/// The backend has emitted stock as `stock_quantity`, `stock` and `quantity`,
/// sometimes all three at once.
#[derive(Debug, Deserialize)]
pub struct RawProduct {
    id: i64,
    name: String,
    #[serde(default)]
    description: Option<String>,
    price: Decimal,
    #[serde(default)]
    stock_quantity: Option<i64>,
    #[serde(default)]
    stock: Option<i64>,
    #[serde(default)]
    quantity: Option<i64>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    image_data: Option<String>,
    #[serde(default, with = "crate::timestamp::option")]
    created_at: Option<DateTime<Utc>>,
}

impl TryFrom<RawProduct> for Product {
    type Error = Error;

    fn try_from(raw: RawProduct) -> Result<Self> {
        let stock = canonical_stock(raw.id, [raw.stock_quantity, raw.stock, raw.quantity])?;
        if raw.price < Decimal::ZERO {
            return Err(Error::schema(format!("product {} has a negative price", raw.id)));
        }

        Ok(Product {
            id: raw.id,
            name: raw.name,
            description: non_empty(raw.description),
            price: raw.price,
            stock_quantity: stock,
            category: non_empty(raw.category),
            image_url: non_empty(raw.image_url),
            image_data: non_empty(raw.image_data),
            created_at: raw.created_at,
        })
    }
}

/// Resolve the stock spellings to one value; all present spellings must agree
pub(crate) fn canonical_stock(id: i64, spellings: [Option<i64>; 3]) -> Result<u32> {
    let mut present = spellings.into_iter().flatten();
    let Some(first) = present.next() else {
        return Err(Error::schema(format!("product {id} has no stock quantity")));
    };
    if present.any(|other| other != first) {
        return Err(Error::schema(format!("product {id} reports conflicting stock quantities")));
    }
    u32::try_from(first).map_err(|_| Error::schema(format!("product {id} has an invalid stock quantity {first}")))
}

pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Image attached to a product
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductImage {
    /// Externally hosted image
    Url(String),
    /// Image bytes carried inline as a `data:` URL
    Inline { mime_type: String, bytes: Vec<u8> },
}

impl ProductImage {
    /// Parse a `data:<mime>;base64,<payload>` URL
    pub fn from_data_url(data_url: &str) -> Result<Self> {
        let rest = data_url
            .strip_prefix("data:")
            .ok_or_else(|| Error::schema("inline image is not a data URL"))?;
        let (meta, payload) = rest
            .split_once(',')
            .ok_or_else(|| Error::schema("inline image has no payload"))?;
        let mime_type = meta
            .strip_suffix(";base64")
            .ok_or_else(|| Error::schema("inline image is not base64 encoded"))?;
        if !mime_type.starts_with("image/") {
            return Err(Error::schema(format!("inline payload is {mime_type}, not an image")));
        }
        Ok(ProductImage::Inline {
            mime_type: mime_type.to_string(),
            bytes: STANDARD.decode(payload.trim())?,
        })
    }

    /// Encode raw bytes as a `data:` URL
    pub fn to_data_url(mime_type: &str, bytes: &[u8]) -> String {
        format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes))
    }
}

impl Product {
    /// The product image, preferring a hosted URL over inline data
    pub fn image(&self) -> Result<Option<ProductImage>> {
        if let Some(url) = &self.image_url {
            return Ok(Some(ProductImage::Url(url.clone())));
        }
        self.image_data
            .as_deref()
            .map(ProductImage::from_data_url)
            .transpose()
    }

    pub fn in_stock(&self) -> bool {
        self.stock_quantity > 0
    }
}

/// Filters for the product listing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
}

impl ProductQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }

    pub fn search(mut self, term: &str) -> Self {
        self.search = Some(term.to_string());
        self
    }

    pub fn price_range(mut self, min: Option<Decimal>, max: Option<Decimal>) -> Self {
        self.min_price = min;
        self.max_price = max;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if let (Some(min), Some(max)) = (self.min_price, self.max_price) {
            if min > max {
                return Err(Error::validation("Minimum price is above maximum price"));
            }
        }
        Ok(())
    }

    pub(crate) fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(category) = self.category.as_ref().filter(|s| !s.is_empty()) {
            pairs.push(("category", category.clone()));
        }
        if let Some(search) = self.search.as_ref().filter(|s| !s.trim().is_empty()) {
            pairs.push(("search", search.trim().to_string()));
        }
        if let Some(min) = self.min_price {
            pairs.push(("min_price", min.to_string()));
        }
        if let Some(max) = self.max_price {
            pairs.push(("max_price", max.to_string()));
        }
        pairs
    }
}
