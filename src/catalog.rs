//! The product list the user picks from.
//!
//! A catalog ships inside the binary; `catalog.path` in `config.toml` can
//! point at a replacement JSON file with the same shape.

use crate::config::CatalogConfig;
use crate::error::CatalogError;
use crate::models::Product;
use std::fs;
use tracing::{error, info, warn};

const EMBEDDED_CATALOG: &str = include_str!("../data/catalog.json");

pub fn parse(json: &str) -> Result<Vec<Product>, CatalogError> {
    Ok(serde_json::from_str(json)?)
}

pub fn load_from(path: &str) -> Result<Vec<Product>, CatalogError> {
    let content = fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_string(),
        source,
    })?;
    parse(&content)
}

pub fn embedded() -> Vec<Product> {
    parse(EMBEDDED_CATALOG).unwrap_or_else(|e| {
        error!("Bundled catalog is invalid: {}", e);
        Vec::new()
    })
}

/// Loads the configured catalog, falling back to the bundled one.
pub fn load(config: &CatalogConfig) -> Vec<Product> {
    if let Some(path) = config.path.as_deref() {
        match load_from(path) {
            Ok(products) => {
                info!("Loaded {} products from {}", products.len(), path);
                return products;
            }
            Err(e) => warn!("{}. Using bundled catalog.", e),
        }
    }
    embedded()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PLATFORMS;
    use std::collections::HashSet;

    #[test]
    fn bundled_catalog_parses_with_unique_ids() {
        let products = parse(EMBEDDED_CATALOG).unwrap();
        assert!(!products.is_empty());

        let ids: HashSet<String> = products.iter().map(|p| p.product_id()).collect();
        assert_eq!(ids.len(), products.len());
    }

    #[test]
    fn bundled_products_list_every_platform() {
        for p in embedded() {
            for platform in &PLATFORMS {
                assert!(p.prices.contains_key(&platform.id), "{} lacks a price", p.name);
                assert!(p.availability.contains_key(&platform.id), "{} lacks stock", p.name);
            }
        }
    }

    #[test]
    fn unreadable_path_falls_back_to_bundled() {
        let config = CatalogConfig {
            path: Some("no/such/catalog.json".into()),
        };
        assert_eq!(load(&config), embedded());
    }

    #[test]
    fn unknown_platform_key_is_rejected() {
        let err = parse(
            r#"[{"category":"x","id":1,"name":"X","rating":1,
                "prices":{"amazon":10},"availability":{}}]"#,
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::Parse(_)));
    }
}
