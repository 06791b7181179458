use crate::allocation::sub_assets::SubAllocations;
use crate::domain::{round2, Allocation, AllocationResult, AssetAllocation};
use std::collections::BTreeMap;

/// Builds the two-level tree. Classes without sub-allocations get an explicit
/// empty map rather than being omitted.
pub fn format(allocation: &Allocation, mut sub_allocations: SubAllocations) -> AllocationResult {
    let assets = allocation
        .iter()
        .map(|(class, percentage)| {
            let sub_assets = sub_allocations.remove(&class).unwrap_or_else(|| {
                tracing::debug!(%class, "no sub-assets; emitting empty map");
                BTreeMap::new()
            });
            (
                class,
                AssetAllocation {
                    percentage: round2(percentage),
                    sub_assets,
                },
            )
        })
        .collect();

    AllocationResult { assets }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AssetClass;

    #[test]
    fn rounds_percentages_and_fills_empty_sub_maps() {
        let allocation: Allocation = [
            (AssetClass::Cash, 33.33333),
            (AssetClass::Equity, 66.66667),
        ]
        .into_iter()
        .collect();
        let mut subs = SubAllocations::new();
        subs.insert(
            AssetClass::Equity,
            BTreeMap::from([("Large Cap".to_string(), 66.67)]),
        );

        let result = format(&allocation, subs);
        assert_eq!(result.assets[&AssetClass::Cash].percentage, 33.33);
        assert!(result.assets[&AssetClass::Cash].sub_assets.is_empty());
        assert_eq!(result.assets[&AssetClass::Equity].percentage, 66.67);
        assert_eq!(
            result.assets[&AssetClass::Equity].sub_assets["Large Cap"],
            66.67
        );
    }
}
