use crate::amount::compute_amount_for;
use crate::catalog::ProductCatalog;
use crate::domain::{round2, AllocationResult, AssetClass, InvestmentHorizon};
use crate::error::AllocationError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductAmount {
    pub product_name: String,
    pub annual_return: f64,
    pub percentage_split: f64,
    pub investment_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubAssetProducts {
    pub percentage: f64,
    pub investment_amount: f64,
    pub products: Vec<ProductAmount>,
}

/// Asset class -> sub-asset -> amounts per product.
pub type ProductAllocationResult = BTreeMap<AssetClass, BTreeMap<String, SubAssetProducts>>;

/// Turns the sub-asset percentages of `allocation` into monetary amounts per
/// catalog product. A sub-asset's percentage is split evenly across its
/// products; each share is discounted at the product's own annual return.
pub fn compute_product_allocations(
    allocation: &AllocationResult,
    target_amount: f64,
    horizon: &str,
    catalog: &ProductCatalog,
) -> Result<ProductAllocationResult, AllocationError> {
    if !target_amount.is_finite() || target_amount <= 0.0 {
        return Err(AllocationError::InvalidInput(format!(
            "targetAmount must be greater than zero (got {target_amount})"
        )));
    }
    if horizon.is_empty() {
        return Err(AllocationError::InvalidInput(
            "investmentHorizon is required".to_string(),
        ));
    }
    let horizon: InvestmentHorizon = horizon.parse()?;

    let mut out = ProductAllocationResult::new();
    for (class, asset) in &allocation.assets {
        for (sub_asset, percentage) in &asset.sub_assets {
            let products = catalog.products_for(*class, sub_asset);
            if products.is_empty() {
                tracing::warn!(%class, sub_asset = %sub_asset, "no catalog products for sub-asset");
                continue;
            }

            let split = percentage / products.len() as f64;
            let mut amounts = Vec::with_capacity(products.len());
            for product in products {
                let investment_amount =
                    compute_amount_for(split, target_amount, product.annual_return, horizon)?;
                amounts.push(ProductAmount {
                    product_name: product.product_name.clone(),
                    annual_return: product.annual_return,
                    percentage_split: round2(split),
                    investment_amount,
                });
            }

            let investment_amount = round2(amounts.iter().map(|p| p.investment_amount).sum());
            out.entry(*class).or_default().insert(
                sub_asset.clone(),
                SubAssetProducts {
                    percentage: *percentage,
                    investment_amount,
                    products: amounts,
                },
            );
        }
    }

    tracing::info!(
        target_amount,
        %horizon,
        classes = out.len(),
        "product allocations computed"
    );
    Ok(out)
}
