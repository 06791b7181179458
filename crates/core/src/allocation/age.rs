use crate::domain::{AgeGroup, Allocation};
use crate::matrix::AgeAdjustmentTable;

/// Adds the age bucket's deltas to the classes present in `allocation`.
/// A missing bucket row leaves the allocation unchanged.
pub fn apply(allocation: &Allocation, age: u32, table: &AgeAdjustmentTable) -> Allocation {
    let group = AgeGroup::from_age(age);
    let mut out = allocation.clone();

    let Some(deltas) = table.get(&group) else {
        tracing::warn!(age, %group, "no age adjustment rule; skipping age stage");
        return out;
    };

    for (class, delta) in deltas {
        out.add(*class, *delta);
    }
    tracing::debug!(age, %group, ?out, "age adjustments applied");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AssetClass;
    use std::collections::BTreeMap;

    fn base() -> Allocation {
        [
            (AssetClass::Cash, 20.0),
            (AssetClass::Equity, 40.0),
            (AssetClass::FixedIncome, 40.0),
        ]
        .into_iter()
        .collect()
    }

    fn table() -> AgeAdjustmentTable {
        let mut t = AgeAdjustmentTable::new();
        t.insert(
            AgeGroup::From30To45,
            BTreeMap::from([(AssetClass::Equity, 5.0), (AssetClass::FixedIncome, -5.0)]),
        );
        t.insert(
            AgeGroup::From45To60,
            BTreeMap::from([(AssetClass::Equity, -5.0), (AssetClass::RealEstate, 5.0)]),
        );
        t
    }

    #[test]
    fn applies_deltas_for_inclusive_bucket() {
        let out = apply(&base(), 45, &table());
        assert_eq!(out.get(AssetClass::Equity), Some(45.0));
        assert_eq!(out.get(AssetClass::FixedIncome), Some(35.0));

        let out = apply(&base(), 30, &table());
        assert_eq!(out.get(AssetClass::Equity), Some(45.0));
    }

    #[test]
    fn ignores_deltas_for_absent_classes() {
        let out = apply(&base(), 46, &table());
        assert_eq!(out.get(AssetClass::Equity), Some(35.0));
        assert!(!out.contains(AssetClass::RealEstate));
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn missing_bucket_is_a_no_op() {
        let input = base();
        assert_eq!(apply(&input, 25, &table()), input);
        assert_eq!(apply(&input, 70, &table()), input);
    }
}
