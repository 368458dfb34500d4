//! Three-step checkout: address, payment, review

use log::{info, warn};

use crate::cart::{Cart, CartStore};
use crate::error::{Error, Result};
use crate::orders::{NewOrder, NewOrderLine, Order, OrdersApi};
use crate::shipping::ShippingAddress;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutStep {
    Address,
    Payment,
    Review,
}

/// Payment choice shown to the user; no payment is actually taken
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PaymentMethod {
    #[default]
    Card,
    Paypal,
}

/// Checkout wizard state
#[derive(Debug, Clone)]
pub struct Checkout {
    step: CheckoutStep,
    addresses: Vec<ShippingAddress>,
    selected: Option<i64>,
    payment: PaymentMethod,
}

impl Checkout {
    /// Start at the address step with the default address preselected
    pub fn new(addresses: Vec<ShippingAddress>) -> Self {
        let selected = addresses.iter().find(|a| a.is_default).map(|a| a.id);
        Self {
            step: CheckoutStep::Address,
            addresses,
            selected,
            payment: PaymentMethod::default(),
        }
    }

    pub fn step(&self) -> CheckoutStep {
        self.step
    }

    pub fn addresses(&self) -> &[ShippingAddress] {
        &self.addresses
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment
    }

    pub fn selected_address(&self) -> Option<&ShippingAddress> {
        let id = self.selected?;
        self.addresses.iter().find(|a| a.id == id)
    }

    /// Replace the address list, keeping the selection if it still exists
    pub fn set_addresses(&mut self, addresses: Vec<ShippingAddress>) {
        let keep = self
            .selected
            .filter(|id| addresses.iter().any(|a| a.id == *id));
        self.selected = keep.or_else(|| addresses.iter().find(|a| a.is_default).map(|a| a.id));
        self.addresses = addresses;
    }

    pub fn select_address(&mut self, id: i64) -> Result<()> {
        if !self.addresses.iter().any(|a| a.id == id) {
            return Err(Error::validation(format!("Unknown shipping address {id}")));
        }
        self.selected = Some(id);
        Ok(())
    }

    pub fn set_payment_method(&mut self, method: PaymentMethod) {
        self.payment = method;
    }

    /// Advance one step
    pub fn next(&mut self) -> Result<CheckoutStep> {
        self.step = match self.step {
            CheckoutStep::Address => {
                if self.selected_address().is_none() {
                    return Err(Error::validation("Please select a shipping address"));
                }
                CheckoutStep::Payment
            }
            CheckoutStep::Payment => CheckoutStep::Review,
            CheckoutStep::Review => {
                return Err(Error::validation("Already at the last checkout step"));
            }
        };
        Ok(self.step)
    }

    /// Go back one step; stays put at the address step
    pub fn back(&mut self) -> CheckoutStep {
        self.step = match self.step {
            CheckoutStep::Review => CheckoutStep::Payment,
            CheckoutStep::Payment | CheckoutStep::Address => CheckoutStep::Address,
        };
        self.step
    }

    /// Order request for `cart` shipped to the selected address
    pub fn build_order(&self, cart: &Cart) -> Result<NewOrder> {
        if cart.is_empty() {
            return Err(Error::validation("Your cart is empty"));
        }
        let address = self
            .selected_address()
            .ok_or_else(|| Error::validation("Please select a shipping address"))?;

        Ok(NewOrder {
            items: cart
                .items()
                .iter()
                .map(|line| NewOrderLine {
                    product_id: line.product_id,
                    quantity: line.quantity,
                })
                .collect(),
            shipping_address: address.clone(),
        })
    }

    /// Submit the order, then empty the cart
    ///
    /// Once the server has accepted the order the cart is emptied locally
    /// even if clearing the server cart fails.
    pub async fn place_order(&self, orders: &OrdersApi, cart: &CartStore) -> Result<Order> {
        if self.step != CheckoutStep::Review {
            return Err(Error::validation("Review the order before placing it"));
        }
        let request = self.build_order(&cart.snapshot())?;
        let order = orders.create(&request).await?;
        info!("Order {} placed for {}", order.id, order.total_amount);

        if let Err(e) = cart.clear().await {
            warn!("Order {} placed but the cart could not be cleared: {}", order.id, e);
            cart.clear_local();
        }
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::CartItem;
    use crate::products::Product;

    fn address(id: i64, is_default: bool) -> ShippingAddress {
        ShippingAddress {
            id,
            user_id: None,
            full_name: "Grace Hopper".into(),
            address_line1: "2 Compiler Rd".into(),
            address_line2: None,
            city: "Arlington".into(),
            state: "VA".into(),
            postal_code: "22201".into(),
            country: "US".into(),
            phone_number: None,
            is_default,
            created_at: None,
        }
    }

    fn cart() -> Cart {
        let product: Product = serde_json::from_value(serde_json::json!({
            "id": 9, "name": "Keyboard", "price": "49.50", "stock_quantity": 4
        }))
        .unwrap();
        Cart::new(vec![CartItem::from_product(&product, 2)])
    }

    #[test]
    fn test_preselects_default_address() {
        let checkout = Checkout::new(vec![address(1, false), address(2, true)]);
        assert_eq!(checkout.selected_address().map(|a| a.id), Some(2));
        assert_eq!(checkout.step(), CheckoutStep::Address);
    }

    #[test]
    fn test_next_requires_address() {
        let mut checkout = Checkout::new(vec![address(1, false)]);
        assert!(checkout.next().is_err());
        assert_eq!(checkout.step(), CheckoutStep::Address);

        checkout.select_address(1).unwrap();
        assert_eq!(checkout.next().unwrap(), CheckoutStep::Payment);
        assert_eq!(checkout.next().unwrap(), CheckoutStep::Review);
        assert!(checkout.next().is_err());
        assert_eq!(checkout.step(), CheckoutStep::Review);
    }

    #[test]
    fn test_back_walks_to_address_and_stops() {
        let mut checkout = Checkout::new(vec![address(1, true)]);
        checkout.next().unwrap();
        checkout.next().unwrap();

        assert_eq!(checkout.back(), CheckoutStep::Payment);
        assert_eq!(checkout.back(), CheckoutStep::Address);
        assert_eq!(checkout.back(), CheckoutStep::Address);
    }

    #[test]
    fn test_select_unknown_address_fails() {
        let mut checkout = Checkout::new(vec![address(1, false)]);
        assert!(checkout.select_address(5).is_err());
        assert!(checkout.selected_address().is_none());
    }

    #[test]
    fn test_build_order_uses_product_ids() {
        let checkout = Checkout::new(vec![address(3, true)]);
        let order = checkout.build_order(&cart()).unwrap();

        assert_eq!(order.items, vec![NewOrderLine { product_id: 9, quantity: 2 }]);
        assert_eq!(order.shipping_address.id, 3);

        assert!(checkout.build_order(&Cart::default()).is_err());
        assert!(Checkout::new(vec![]).build_order(&cart()).is_err());
    }

    #[test]
    fn test_set_addresses_keeps_selection() {
        let mut checkout = Checkout::new(vec![address(1, true), address(2, false)]);
        checkout.select_address(2).unwrap();

        checkout.set_addresses(vec![address(2, false), address(4, true)]);
        assert_eq!(checkout.selected_address().map(|a| a.id), Some(2));

        checkout.set_addresses(vec![address(4, true)]);
        assert_eq!(checkout.selected_address().map(|a| a.id), Some(4));
    }
}
