//! Basket comparison across delivery platforms.
//!
//! [`compare_basket`] totals the basket per platform, picks the cheapest
//! platform that can fulfil the whole basket, and reports how much more every
//! other complete basket costs. [`lowest_price`] and [`lowest_price_platform`]
//! annotate single products and deliberately ignore availability.
//!
//! Nothing here performs I/O; the same inputs always give the same result.

use crate::error::CompareError;
use crate::models::{Amount, DetectedLocation, Platform, PlatformId, Product};
use std::collections::BTreeMap;

/// One platform's row in a [`ComparisonResult`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformTotal {
    pub platform: PlatformId,
    /// Sum of prices of basket products in stock on this platform.
    pub total: Amount,
    pub available_count: usize,
    pub total_products: usize,
    /// `total` minus the cheapest complete basket; zero for the winner and
    /// for partial baskets.
    pub savings: Amount,
}

impl PlatformTotal {
    pub fn is_fully_available(&self) -> bool {
        self.available_count == self.total_products
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonResult {
    pub products: Vec<Product>,
    /// One entry per platform, in the order the platforms were given.
    pub basket_totals: Vec<PlatformTotal>,
    /// `None` when no platform stocks every product in the basket.
    pub cheapest_platform: Option<PlatformId>,
    pub location: String,
}

impl ComparisonResult {
    pub fn total_for(&self, platform: PlatformId) -> Option<&PlatformTotal> {
        self.basket_totals.iter().find(|t| t.platform == platform)
    }
}

/// Checks that a comparison can run: a non-empty basket and a resolved
/// location.
pub fn check_preconditions<'a>(
    products: &[Product],
    location: Option<&'a DetectedLocation>,
) -> Result<&'a DetectedLocation, CompareError> {
    if products.is_empty() {
        return Err(CompareError::InvalidPreconditions(
            "Please add at least 1 product to compare",
        ));
    }
    location.ok_or(CompareError::InvalidPreconditions(
        "Please detect your location first",
    ))
}

/// Compares the basket across `platforms`.
///
/// # Errors
///
/// [`CompareError::InvalidPreconditions`] when `products` is empty or
/// `location` is `None`.
pub fn compare_basket(
    products: &[Product],
    platforms: &[Platform],
    location: Option<&DetectedLocation>,
) -> Result<ComparisonResult, CompareError> {
    let location = check_preconditions(products, location)?;

    let mut basket_totals: Vec<PlatformTotal> = platforms
        .iter()
        .map(|p| {
            let available: Vec<&Product> = products
                .iter()
                .filter(|product| product.is_available_on(p.id))
                .collect();
            PlatformTotal {
                platform: p.id,
                total: available.iter().map(|product| product.price_on(p.id)).sum(),
                available_count: available.len(),
                total_products: products.len(),
                savings: Amount::ZERO,
            }
        })
        .collect();

    // Ties keep the earlier platform.
    let cheapest = basket_totals
        .iter()
        .filter(|t| t.is_fully_available())
        .fold(None::<&PlatformTotal>, |best, t| match best {
            Some(b) if b.total <= t.total => Some(b),
            _ => Some(t),
        })
        .map(|t| (t.platform, t.total));

    if let Some((winner, winner_total)) = cheapest {
        for t in basket_totals
            .iter_mut()
            .filter(|t| t.platform != winner && t.is_fully_available())
        {
            t.savings = t.total - winner_total;
        }
    }

    Ok(ComparisonResult {
        products: products.to_vec(),
        basket_totals,
        cheapest_platform: cheapest.map(|(id, _)| id),
        location: location.label().to_string(),
    })
}

/// Lowest listed price for a product, regardless of stock.
pub fn lowest_price(prices: &BTreeMap<PlatformId, Amount>) -> Option<Amount> {
    prices.values().copied().min()
}

/// Platform listing the lowest price, regardless of stock. Ties go to the
/// first platform in platform order.
pub fn lowest_price_platform(prices: &BTreeMap<PlatformId, Amount>) -> Option<PlatformId> {
    prices
        .iter()
        .fold(None::<(PlatformId, Amount)>, |best, (&id, &price)| match best {
            Some((_, low)) if low <= price => best,
            _ => Some((id, price)),
        })
        .map(|(id, _)| id)
}
