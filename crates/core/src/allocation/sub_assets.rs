use crate::domain::{round2, Allocation, AssetClass, RiskTolerance};
use crate::matrix::SubAllocationWeights;
use std::collections::BTreeMap;

pub type SubAllocations = BTreeMap<AssetClass, BTreeMap<String, f64>>;

/// Splits each class percentage across its sub-assets by the weights for `risk`.
///
/// Classes without weight rows, or whose weights for `risk` sum to 0, are left
/// out of the result. Each sub-asset share is rounded on its own, so a class's
/// sub-assets may drift from the parent by up to 0.01 per sub-asset.
pub fn expand(
    allocation: &Allocation,
    risk: RiskTolerance,
    weights: &SubAllocationWeights,
) -> SubAllocations {
    let mut out = SubAllocations::new();

    for (class, percentage) in allocation.iter() {
        let display_name = class.display_name();
        let Some(sub_rows) = weights.get(display_name) else {
            tracing::warn!(%class, display_name, "no sub-allocation weights for asset class");
            continue;
        };

        let class_weights: Vec<(&str, u32)> = sub_rows
            .iter()
            .filter_map(|(sub, by_risk)| by_risk.get(&risk).map(|w| (sub.as_str(), *w)))
            .collect();

        let total_weight: u64 = class_weights.iter().map(|(_, w)| u64::from(*w)).sum();
        if total_weight == 0 {
            tracing::warn!(%class, %risk, "sub-allocation weights sum to 0; skipping class");
            continue;
        }

        let subs: BTreeMap<String, f64> = class_weights
            .into_iter()
            .map(|(sub, w)| {
                let share = f64::from(w) / total_weight as f64 * percentage;
                (sub.to_string(), round2(share))
            })
            .collect();

        tracing::debug!(%class, sub_assets = ?subs, "sub-allocations computed");
        out.insert(class, subs);
    }

    out
}
