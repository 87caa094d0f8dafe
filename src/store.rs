//! Basket and cart stores.
//!
//! The app only talks to these through the [`CompareList`] and [`CartStore`]
//! traits. The in-memory versions are what the binary runs with.

use crate::models::Product;
use tracing::debug;

/// Products the user has picked for comparison.
pub trait CompareList {
    fn products(&self) -> &[Product];

    /// Adds `product` unless one with the same id is already present.
    /// Returns whether it was added.
    fn add_to_compare(&mut self, product: Product) -> bool;

    /// Returns whether a product was removed.
    fn remove_from_compare(&mut self, id: &str) -> bool;

    fn clear_compare(&mut self);
}

#[derive(Debug, Clone, PartialEq)]
pub struct CartItem {
    pub product: Product,
    pub quantity: u32,
}

/// Receives the basket when the user moves on to checkout.
pub trait CartStore {
    /// Replaces the cart with one unit of each product.
    fn set_cart_from_compare(&mut self, products: &[Product]);

    fn items(&self) -> &[CartItem];
}

#[derive(Debug, Default)]
pub struct InMemoryCompareList {
    products: Vec<Product>,
}

impl CompareList for InMemoryCompareList {
    fn products(&self) -> &[Product] {
        &self.products
    }

    fn add_to_compare(&mut self, product: Product) -> bool {
        let id = product.product_id();
        if self.products.iter().any(|p| p.product_id() == id) {
            return false;
        }
        debug!(%id, "Added to compare list");
        self.products.push(product);
        true
    }

    fn remove_from_compare(&mut self, id: &str) -> bool {
        let before = self.products.len();
        self.products.retain(|p| p.product_id() != id);
        before != self.products.len()
    }

    fn clear_compare(&mut self) {
        self.products.clear();
    }
}

#[derive(Debug, Default)]
pub struct InMemoryCart {
    items: Vec<CartItem>,
}

impl CartStore for InMemoryCart {
    fn set_cart_from_compare(&mut self, products: &[Product]) {
        self.items = products
            .iter()
            .cloned()
            .map(|product| CartItem {
                product,
                quantity: 1,
            })
            .collect();
    }

    fn items(&self) -> &[CartItem] {
        &self.items
    }
}
