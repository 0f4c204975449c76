//! Cart Aggregate
//!
//! Checkout input. Prices are not taken from the client; they are snapshotted
//! from the catalogue when the order is placed.

use serde::Deserialize;
use uuid::Uuid;

use crate::domain::value_objects::Quantity;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct CartItem {
    pub product_id: Uuid,
    pub quantity: Quantity,
}

#[derive(Clone, Debug, Default)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Self { Self::default() }

    pub fn items(&self) -> &[CartItem] { &self.items }
    pub fn item_count(&self) -> usize { self.items.len() }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    /// Adds a line, merging with an existing line for the same product.
    pub fn add_item(&mut self, item: CartItem) {
        if let Some(existing) = self.items.iter_mut().find(|i| i.product_id == item.product_id) {
            existing.quantity = existing.quantity.add(item.quantity);
        } else {
            self.items.push(item);
        }
    }
}

impl FromIterator<CartItem> for Cart {
    fn from_iter<I: IntoIterator<Item = CartItem>>(iter: I) -> Self {
        let mut cart = Cart::new();
        for item in iter { cart.add_item(item); }
        cart
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn test_cart_merges_lines() {
        let milk = Uuid::now_v7();
        let cart: Cart = [
            CartItem { product_id: milk, quantity: Quantity::new(2).unwrap() },
            CartItem { product_id: Uuid::now_v7(), quantity: Quantity::new(1).unwrap() },
            CartItem { product_id: milk, quantity: Quantity::new(1).unwrap() },
        ].into_iter().collect();
        assert_eq!(cart.item_count(), 2);
        assert_eq!(cart.items()[0].quantity.value(), 3); // Merged
    }

    #[test]
    fn test_zero_quantity_line_is_rejected_on_decode() {
        let raw = serde_json::json!({ "product_id": Uuid::now_v7(), "quantity": 0 });
        assert!(serde_json::from_value::<CartItem>(raw).is_err());
    }
}
