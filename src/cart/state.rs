//! Cart state and its reducers
//!
//! Server operations are sequenced with tickets. Every line key (product id)
//! remembers the newest ticket whose response was applied to it; a snapshot
//! from an older ticket never overwrites that line again. A line with a
//! request in flight is left to that request's own response: snapshots from
//! other tickets are parked for the line and only applied if the request
//! fails.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::products::Product;

use super::types::{Cart, CartItem};

/// Snapshot value held back for a line while a request targets it
#[derive(Debug, Clone)]
struct Deferred {
    seq: u64,
    /// `applied` of the line when the value was parked
    base: u64,
    item: Option<CartItem>,
}

#[derive(Debug, Clone, Default)]
struct LineVersion {
    applied: u64,
    outstanding: usize,
    deferred: Option<Deferred>,
}

/// Handle for one in-flight server operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    seq: u64,
    epoch: u64,
    targets: Vec<i64>,
}

/// Cart lines plus the bookkeeping needed to reconcile them
#[derive(Debug, Default)]
pub struct CartState {
    cart: Cart,
    versions: HashMap<i64, LineVersion>,
    last_ticket: u64,
    epoch: u64,
    pending: usize,
    error: Option<String>,
}

/// What a reconciliation did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reconciled {
    /// Lines taken from the snapshot (including removals)
    pub applied: usize,
    /// Lines where the snapshot was older than local knowledge, or parked
    /// behind a request in flight
    pub stale: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Apply,
    Defer,
    Stale,
}

fn verdict(versions: &HashMap<i64, LineVersion>, ticket: &Ticket, key: i64) -> Verdict {
    let Some(version) = versions.get(&key) else {
        return Verdict::Apply;
    };
    if ticket.seq < version.applied {
        Verdict::Stale
    } else if version.outstanding > 0 && !ticket.targets.contains(&key) {
        Verdict::Defer
    } else {
        Verdict::Apply
    }
}

/// Replace, insert or drop the line for `key`
fn put_line(items: &mut Vec<CartItem>, key: i64, item: Option<CartItem>) {
    let position = items.iter().position(|i| i.product_id == key);
    match (position, item) {
        (Some(pos), Some(item)) => items[pos] = item,
        (Some(pos), None) => {
            items.remove(pos);
        }
        (None, Some(item)) => items.push(item),
        (None, None) => {}
    }
}

pub(crate) fn validate_quantity(quantity: u32) -> Result<()> {
    if quantity < 1 {
        return Err(Error::validation("Quantity must be at least 1"));
    }
    Ok(())
}

impl CartState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn is_loading(&self) -> bool {
        self.pending > 0
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn set_error(&mut self, message: String) {
        self.error = Some(message);
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Start a server operation that targets the given lines
    pub fn begin(&mut self, targets: &[i64]) -> Ticket {
        self.last_ticket += 1;
        for key in targets {
            self.versions.entry(*key).or_default().outstanding += 1;
        }
        self.pending += 1;
        self.error = None;
        Ticket {
            seq: self.last_ticket,
            epoch: self.epoch,
            targets: targets.to_vec(),
        }
    }

    /// Whether the ticket was issued since the last reset
    pub fn is_current(&self, ticket: &Ticket) -> bool {
        ticket.epoch == self.epoch
    }

    /// Mark the ticket's operation as finished
    ///
    /// Call after [`reconcile`](Self::reconcile) when the operation succeeded.
    /// A line left without requests in flight takes any snapshot value parked
    /// for it, unless a request targeting it succeeded in the meantime.
    pub fn finish(&mut self, ticket: &Ticket) {
        if !self.is_current(ticket) {
            return;
        }
        self.pending = self.pending.saturating_sub(1);
        for key in &ticket.targets {
            let Some(version) = self.versions.get_mut(key) else {
                continue;
            };
            version.outstanding = version.outstanding.saturating_sub(1);
            if version.outstanding > 0 {
                continue;
            }
            let Some(deferred) = version.deferred.take() else {
                continue;
            };
            if deferred.base == version.applied && deferred.seq >= version.applied {
                version.applied = deferred.seq;
                put_line(self.cart.items_mut(), *key, deferred.item);
            }
        }
    }

    /// Merge a server snapshot obtained with `ticket`
    pub fn reconcile(&mut self, ticket: &Ticket, snapshot: Cart) -> Reconciled {
        let mut outcome = Reconciled::default();
        if !self.is_current(ticket) {
            outcome.stale = snapshot.items().len();
            return outcome;
        }

        let current = std::mem::take(self.cart.items_mut());
        let incoming = snapshot.into_items();

        let mut keys: Vec<i64> = Vec::with_capacity(current.len() + incoming.len());
        let every_key = current
            .iter()
            .chain(incoming.iter())
            .map(|i| i.product_id)
            .chain(ticket.targets.iter().copied());
        for key in every_key {
            if !keys.contains(&key) {
                keys.push(key);
            }
        }

        let mut local_lines: HashMap<i64, CartItem> = current.into_iter().map(|i| (i.product_id, i)).collect();
        let mut remote_lines: HashMap<i64, CartItem> = incoming.into_iter().map(|i| (i.product_id, i)).collect();
        let mut merged = Vec::with_capacity(keys.len());

        for key in keys {
            let local = local_lines.remove(&key);
            let remote = remote_lines.remove(&key);
            let present = local.is_some() || remote.is_some();

            match verdict(&self.versions, ticket, key) {
                Verdict::Apply => {
                    self.versions.entry(key).or_default().applied = ticket.seq;
                    if present {
                        outcome.applied += 1;
                    }
                    merged.extend(remote);
                }
                Verdict::Defer => {
                    let version = self.versions.entry(key).or_default();
                    let newer = version.deferred.as_ref().map_or(true, |d| d.seq <= ticket.seq);
                    if newer {
                        version.deferred = Some(Deferred {
                            seq: ticket.seq,
                            base: version.applied,
                            item: remote,
                        });
                    }
                    if present {
                        outcome.stale += 1;
                    }
                    merged.extend(local);
                }
                Verdict::Stale => {
                    if present {
                        outcome.stale += 1;
                    }
                    merged.extend(local);
                }
            }
        }

        *self.cart.items_mut() = merged;
        outcome
    }

    /// Forget everything and invalidate in-flight tickets
    pub fn reset(&mut self) {
        let epoch = self.epoch + 1;
        *self = Self {
            epoch,
            ..Self::default()
        };
    }

    /// Add `quantity` of `product` without asking the server
    ///
    /// An existing line for the product is incremented.
    pub fn add_local(&mut self, product: &Product, quantity: u32) -> Result<()> {
        validate_quantity(quantity)?;
        match self.cart.items_mut().iter_mut().find(|i| i.product_id == product.id) {
            Some(line) => line.quantity = line.quantity.saturating_add(quantity),
            None => self.cart.items_mut().push(CartItem::from_product(product, quantity)),
        }
        Ok(())
    }

    /// Set a line's quantity without asking the server
    pub fn update_local(&mut self, product_id: i64, quantity: u32) -> Result<()> {
        validate_quantity(quantity)?;
        match self.cart.items_mut().iter_mut().find(|i| i.product_id == product_id) {
            Some(line) => {
                line.quantity = quantity;
                Ok(())
            }
            None => Err(Error::validation(format!("Product {product_id} is not in the cart"))),
        }
    }

    /// Drop a line without asking the server; returns whether it existed
    pub fn remove_local(&mut self, product_id: i64) -> bool {
        let items = self.cart.items_mut();
        let before = items.len();
        items.retain(|i| i.product_id != product_id);
        items.len() != before
    }

    pub fn clear_local(&mut self) {
        self.cart.items_mut().clear();
    }
}
