use crate::domain::AssetClass;
use crate::error::AllocationError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub product_name: String,
    /// Expected annual return in percent.
    pub annual_return: f64,
    pub asset_class: String,
    pub sub_asset_class: String,
    pub liquidity: String,
    #[serde(default)]
    pub pros: Vec<String>,
    #[serde(default)]
    pub cons: Vec<String>,
    pub risk_level: String,
    #[serde(default)]
    pub description: String,
}

/// Asset class display name -> sub-asset -> products.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductCatalog(BTreeMap<String, BTreeMap<String, Vec<Product>>>);

impl ProductCatalog {
    pub fn from_json(json: &str) -> Result<Self, AllocationError> {
        let catalog: Self = serde_json::from_str(json).map_err(|e| {
            AllocationError::DataUnavailable(format!("product catalog is malformed: {e}"))
        })?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self, AllocationError> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path).await.map_err(|e| {
            AllocationError::DataUnavailable(format!(
                "failed to read product catalog {}: {e}",
                path.display()
            ))
        })?;
        let catalog = Self::from_json(&json)?;
        tracing::info!(path = %path.display(), products = catalog.len(), "product catalog loaded");
        Ok(catalog)
    }

    fn validate(&self) -> Result<(), AllocationError> {
        for product in self.list_products() {
            if product.product_name.trim().is_empty() {
                return Err(AllocationError::DataUnavailable(
                    "product_name must be non-empty".to_string(),
                ));
            }
            if !product.annual_return.is_finite() {
                return Err(AllocationError::DataUnavailable(format!(
                    "product {} has a non-finite annual_return",
                    product.product_name
                )));
            }
        }
        Ok(())
    }

    /// All products, sorted by asset class name, then sub-asset name.
    pub fn list_products(&self) -> Vec<&Product> {
        self.0
            .values()
            .flat_map(|subs| subs.values())
            .flatten()
            .collect()
    }

    pub fn products_for(&self, class: AssetClass, sub_asset: &str) -> &[Product] {
        self.0
            .get(class.display_name())
            .and_then(|subs| subs.get(sub_asset))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.0.values().flat_map(|subs| subs.values()).map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
