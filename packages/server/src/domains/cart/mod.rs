//! Cart reducer - an in-memory, quantity-keyed line-item collection.
//!
//! Carts never touch the database; clients hold the state and replay
//! transitions. Every transition is synchronous and total (no failure
//! conditions), and totals are derived on read so they can never go stale.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::common::ListingId;

/// Platform fee rate applied to the subtotal (2%).
const PLATFORM_FEE_RATE: Decimal = Decimal::from_parts(2, 0, 0, false, 2);

/// One purchasable line: a listing at a unit price, with a quantity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    pub listing_id: ListingId,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}

/// Ordered collection of line items with derived money totals.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add one unit of a listing. A listing already in the cart gets its
    /// quantity incremented; insertion order is preserved either way.
    pub fn add(&mut self, listing_id: ListingId, name: &str, unit_price: Decimal) {
        if let Some(item) = self.items.iter_mut().find(|i| i.listing_id == listing_id) {
            item.quantity += 1;
            return;
        }
        self.items.push(CartItem {
            listing_id,
            name: name.to_string(),
            unit_price,
            quantity: 1,
        });
    }

    /// Remove a listing entirely. No-op when absent.
    pub fn remove(&mut self, listing_id: ListingId) {
        self.items.retain(|i| i.listing_id != listing_id);
    }

    /// Replace a listing's quantity; zero (or below) removes the line.
    /// No-op when the listing is absent.
    pub fn set_quantity(&mut self, listing_id: ListingId, quantity: i64) {
        if quantity <= 0 {
            self.remove(listing_id);
            return;
        }
        if let Some(item) = self.items.iter_mut().find(|i| i.listing_id == listing_id) {
            item.quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Sum of price x quantity across current items.
    pub fn subtotal(&self) -> Decimal {
        self.items
            .iter()
            .map(|i| i.unit_price * Decimal::from(i.quantity))
            .sum()
    }

    /// Platform fee: 2% of the subtotal, rounded to cents. Charged to the
    /// seller at settlement, so it never inflates the buyer's total.
    pub fn platform_fee(&self) -> Decimal {
        (self.subtotal() * PLATFORM_FEE_RATE).round_dp(2)
    }

    /// What the buyer pays.
    pub fn total(&self) -> Decimal {
        self.subtotal()
    }
}
