//! Cart types

use log::warn;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::products::Product;

/// One cart line, with the product details denormalized for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartItem {
    /// Server-side line id; `None` for lines only added locally
    pub id: Option<i64>,
    pub product_id: i64,
    pub quantity: u32,
    pub name: String,
    pub price: Decimal,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub image_data: Option<String>,
    pub available_stock: Option<u32>,
}

impl CartItem {
    /// A line for `product` that has not been confirmed by the server
    pub fn from_product(product: &Product, quantity: u32) -> Self {
        Self {
            id: None,
            product_id: product.id,
            quantity,
            name: product.name.clone(),
            price: product.price,
            category: product.category.clone(),
            image_url: product.image_url.clone(),
            image_data: product.image_data.clone(),
            available_stock: Some(product.stock_quantity),
        }
    }

    pub fn subtotal(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// An ordered list of cart lines
///
/// Totals are always computed from the lines; totals sent by the server are
/// ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCart")]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    pub fn new(items: Vec<CartItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<CartItem> {
        self.items
    }

    pub(crate) fn items_mut(&mut self) -> &mut Vec<CartItem> {
        &mut self.items
    }

    pub fn line(&self, product_id: i64) -> Option<&CartItem> {
        self.items.iter().find(|i| i.product_id == product_id)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of quantities over all lines
    pub fn total_items(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Sum of price times quantity over all lines
    pub fn total_amount(&self) -> Decimal {
        self.items.iter().map(CartItem::subtotal).sum()
    }
}

#[derive(Debug, Deserialize)]
struct RawCart {
    #[serde(default)]
    items: Vec<RawCartItem>,
}

#[derive(Debug, Deserialize)]
struct RawCartItem {
    #[serde(default)]
    id: Option<i64>,
    #[serde(default)]
    product_id: Option<i64>,
    quantity: i64,
    #[serde(default)]
    product: Option<RawCartProduct>,
}

#[derive(Debug, Deserialize)]
struct RawCartProduct {
    id: i64,
    name: String,
    price: Decimal,
    #[serde(default)]
    stock_quantity: Option<i64>,
    #[serde(default)]
    stock: Option<i64>,
    #[serde(default)]
    available_stock: Option<i64>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    image_data: Option<String>,
}

impl TryFrom<RawCart> for Cart {
    type Error = Error;

    fn try_from(raw: RawCart) -> Result<Self> {
        let mut items = Vec::with_capacity(raw.items.len());
        for line in raw.items {
            let Some(product) = line.product else {
                // The product was deleted after it was put in the cart.
                warn!("Dropping cart line {:?} without product details", line.id);
                continue;
            };
            if let Some(product_id) = line.product_id {
                if product_id != product.id {
                    return Err(Error::schema(format!(
                        "cart line {:?} refers to product {} but carries product {}",
                        line.id, product_id, product.id
                    )));
                }
            }
            let quantity = u32::try_from(line.quantity)
                .ok()
                .filter(|q| *q >= 1)
                .ok_or_else(|| Error::schema(format!("cart line for product {} has quantity {}", product.id, line.quantity)))?;
            let stock = [product.stock_quantity, product.stock, product.available_stock];
            let available_stock = match stock.iter().any(Option::is_some) {
                true => Some(crate::products::canonical_stock(product.id, stock)?),
                false => None,
            };

            items.push(CartItem {
                id: line.id,
                product_id: product.id,
                quantity,
                name: product.name,
                price: product.price,
                category: crate::products::non_empty(product.category),
                image_url: crate::products::non_empty(product.image_url),
                image_data: crate::products::non_empty(product.image_data),
                available_stock,
            });
        }
        Ok(Cart { items })
    }
}

/// Read a cart from either a bare cart or a `{"message", "cart"}` envelope
pub(crate) fn parse_cart(value: serde_json::Value) -> Result<Cart> {
    match value {
        serde_json::Value::Object(mut map) if map.contains_key("cart") => {
            let cart = map.remove("cart").unwrap_or_default();
            serde_json::from_value(cart).map_err(Error::payload)
        }
        other => serde_json::from_value(other).map_err(Error::payload),
    }
}
