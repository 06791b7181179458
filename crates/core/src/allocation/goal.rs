//! Goal-specific tuning.
//!
//! Each goal maps to a pure strategy `(allocation, tuning) -> allocation`. After the
//! strategy runs, the total is settled back to 100 on the largest class.

use crate::domain::{Allocation, AssetClass, Goal};
use crate::error::AllocationError;
use crate::matrix::{GoalTuning, GoalTuningTable};

pub type Strategy = fn(&Allocation, &GoalTuning) -> Allocation;

pub(crate) const SUM_TOLERANCE: f64 = 0.01;

const EMERGENCY_CASH_FLOOR: f64 = 40.0;
const WEALTH_EQUITY_BOOST: f64 = 10.0;
const BIG_PURCHASE_CAP: f64 = 30.0;

const NON_CASH_CLASSES: [AssetClass; 4] = [
    AssetClass::Equity,
    AssetClass::FixedIncome,
    AssetClass::Commodities,
    AssetClass::RealEstate,
];

pub fn strategy_for(goal: Goal) -> Strategy {
    match goal {
        Goal::EmergencyFund => emergency_fund,
        Goal::Retirement => retirement,
        Goal::WealthAccumulation => wealth_accumulation,
        Goal::ChildEducation => child_education,
        Goal::BigPurchase => big_purchase,
    }
}

/// Runs the goal stage. An empty goal is rejected; a goal without a tuning row
/// is skipped; a goal with a row but no strategy only gets the settle step.
pub fn apply(
    allocation: &Allocation,
    goal: &str,
    table: &GoalTuningTable,
) -> Result<Allocation, AllocationError> {
    if goal.is_empty() {
        return Err(AllocationError::InvalidInput("goal is required".to_string()));
    }

    let Some(tuning) = table.get(goal) else {
        tracing::warn!(goal, "no goal tuning row; skipping goal stage");
        return Ok(allocation.clone());
    };

    let tuned = match Goal::from_name(goal) {
        Some(g) => strategy_for(g)(allocation, tuning),
        None => {
            tracing::warn!(goal, "goal has a tuning row but no strategy");
            allocation.clone()
        }
    };

    let settled = settle_on_largest(&tuned);
    tracing::debug!(goal, allocation = ?settled, "goal tuning applied");
    Ok(settled)
}

/// If the total is off 100 by more than the tolerance, puts the whole deviation
/// on the largest class (first in iteration order on ties).
pub fn settle_on_largest(allocation: &Allocation) -> Allocation {
    let mut out = allocation.clone();
    let total = out.total();
    if (total - 100.0).abs() > SUM_TOLERANCE {
        if let Some(largest) = out.largest() {
            out.add(largest, 100.0 - total);
        }
    }
    out
}

/// Raises cash to the floor and takes the deficit evenly from the other four
/// classes, even if one of them goes negative.
pub fn emergency_fund(allocation: &Allocation, _tuning: &GoalTuning) -> Allocation {
    let mut out = allocation.clone();
    if let Some(cash) = out.get(AssetClass::Cash) {
        if cash < EMERGENCY_CASH_FLOOR {
            let deficit = EMERGENCY_CASH_FLOOR - cash;
            out.set(AssetClass::Cash, EMERGENCY_CASH_FLOOR);

            let per_class = deficit / NON_CASH_CLASSES.len() as f64;
            for class in NON_CASH_CLASSES {
                out.add(class, -per_class);
            }
        }
    }
    out
}

pub fn retirement(allocation: &Allocation, tuning: &GoalTuning) -> Allocation {
    let mut out = allocation.clone();
    if let Some(boost) = tuning.fixed_income_boost {
        out.add(AssetClass::FixedIncome, boost);
    }
    if let Some(boost) = tuning.real_estate_boost {
        out.add(AssetClass::RealEstate, boost);
    }
    out
}

/// Boosts equity when it is not already the (joint) largest class, then spreads
/// `100 - total` evenly over every other class.
pub fn wealth_accumulation(allocation: &Allocation, _tuning: &GoalTuning) -> Allocation {
    let mut out = allocation.clone();
    let (Some(equity), Some(max)) = (out.get(AssetClass::Equity), out.max_value()) else {
        return out;
    };
    if equity >= max {
        return out;
    }

    out.add(AssetClass::Equity, WEALTH_EQUITY_BOOST);
    let remaining = 100.0 - out.total();
    let others: Vec<AssetClass> = out.classes().filter(|c| *c != AssetClass::Equity).collect();
    if !others.is_empty() {
        let share = remaining / others.len() as f64;
        for class in others {
            out.add(class, share);
        }
    }
    out
}

pub fn child_education(allocation: &Allocation, tuning: &GoalTuning) -> Allocation {
    let mut out = allocation.clone();
    if let Some(boost) = tuning.fixed_income_boost {
        out.add(AssetClass::FixedIncome, boost);
    }
    if let Some(reduction) = tuning.equity_reduction_moderate {
        out.add(AssetClass::Equity, -reduction);
    }
    out
}

/// Caps every class at 30 and pools the excess over the classes left strictly
/// under the cap. Only active when the row is flagged `balanced`.
pub fn big_purchase(allocation: &Allocation, tuning: &GoalTuning) -> Allocation {
    let mut out = allocation.clone();
    if tuning.balanced != Some(true) {
        return out;
    }

    let mut pool = 0.0;
    let classes: Vec<AssetClass> = out.classes().collect();
    for class in &classes {
        if let Some(v) = out.get(*class) {
            if v > BIG_PURCHASE_CAP {
                pool += v - BIG_PURCHASE_CAP;
                out.set(*class, BIG_PURCHASE_CAP);
            }
        }
    }

    let under_cap: Vec<AssetClass> = classes
        .iter()
        .copied()
        .filter(|c| out.get(*c).is_some_and(|v| v < BIG_PURCHASE_CAP))
        .collect();
    if !under_cap.is_empty() && pool > 0.0 {
        let share = pool / under_cap.len() as f64;
        for class in under_cap {
            out.add(class, share);
        }
    }

    settle_on_largest(&out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::fixtures;

    fn alloc(pairs: &[(AssetClass, f64)]) -> Allocation {
        pairs.iter().copied().collect()
    }

    fn assert_close(actual: Option<f64>, expected: f64) {
        let actual = actual.expect("class present");
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    fn low_short() -> Allocation {
        alloc(&[
            (AssetClass::Cash, 25.0),
            (AssetClass::Equity, 15.0),
            (AssetClass::FixedIncome, 40.0),
            (AssetClass::Commodities, 10.0),
            (AssetClass::RealEstate, 10.0),
        ])
    }

    #[test]
    fn emergency_fund_raises_cash_and_spreads_deficit() {
        let out = emergency_fund(&low_short(), &GoalTuning::default());
        assert_close(out.get(AssetClass::Cash), 40.0);
        assert_close(out.get(AssetClass::Equity), 11.25);
        assert_close(out.get(AssetClass::FixedIncome), 36.25);
        assert_close(out.get(AssetClass::Commodities), 6.25);
        assert_close(out.get(AssetClass::RealEstate), 6.25);
        assert!((out.total() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn emergency_fund_allows_negative_classes() {
        let input = alloc(&[
            (AssetClass::Cash, 0.0),
            (AssetClass::Equity, 5.0),
            (AssetClass::FixedIncome, 85.0),
            (AssetClass::Commodities, 5.0),
            (AssetClass::RealEstate, 5.0),
        ]);
        let out = emergency_fund(&input, &GoalTuning::default());
        assert_close(out.get(AssetClass::Equity), -5.0);
        assert_close(out.get(AssetClass::Cash), 40.0);
    }

    #[test]
    fn emergency_fund_leaves_sufficient_cash_alone() {
        let input = alloc(&[(AssetClass::Cash, 45.0), (AssetClass::Equity, 55.0)]);
        assert_eq!(emergency_fund(&input, &GoalTuning::default()), input);
    }

    #[test]
    fn retirement_adds_configured_boosts() {
        let tuning = GoalTuning {
            fixed_income_boost: Some(5.0),
            real_estate_boost: Some(2.5),
            ..Default::default()
        };
        let out = retirement(&low_short(), &tuning);
        assert_close(out.get(AssetClass::FixedIncome), 45.0);
        assert_close(out.get(AssetClass::RealEstate), 12.5);

        let untouched = retirement(&low_short(), &GoalTuning::default());
        assert_eq!(untouched, low_short());
    }

    #[test]
    fn wealth_accumulation_boosts_equity_and_rebalances_others() {
        let input = alloc(&[
            (AssetClass::Cash, 10.0),
            (AssetClass::Equity, 30.0),
            (AssetClass::FixedIncome, 40.0),
            (AssetClass::Commodities, 10.0),
            (AssetClass::RealEstate, 10.0),
        ]);
        let out = wealth_accumulation(&input, &GoalTuning::default());
        assert_close(out.get(AssetClass::Equity), 40.0);
        assert_close(out.get(AssetClass::Cash), 7.5);
        assert_close(out.get(AssetClass::FixedIncome), 37.5);
        assert_close(out.get(AssetClass::Commodities), 7.5);
        assert_close(out.get(AssetClass::RealEstate), 7.5);
    }

    #[test]
    fn wealth_accumulation_skips_when_equity_is_already_largest() {
        let input = alloc(&[
            (AssetClass::Cash, 20.0),
            (AssetClass::Equity, 40.0),
            (AssetClass::FixedIncome, 40.0),
        ]);
        assert_eq!(wealth_accumulation(&input, &GoalTuning::default()), input);
    }

    #[test]
    fn child_education_shifts_equity_into_fixed_income() {
        let tuning = GoalTuning {
            fixed_income_boost: Some(5.0),
            equity_reduction_moderate: Some(5.0),
            ..Default::default()
        };
        let out = child_education(&low_short(), &tuning);
        assert_close(out.get(AssetClass::FixedIncome), 45.0);
        assert_close(out.get(AssetClass::Equity), 10.0);
    }

    #[test]
    fn big_purchase_caps_and_pools_excess() {
        let input = alloc(&[
            (AssetClass::Equity, 50.0),
            (AssetClass::Cash, 10.0),
            (AssetClass::FixedIncome, 20.0),
            (AssetClass::Commodities, 10.0),
            (AssetClass::RealEstate, 10.0),
        ]);
        let tuning = GoalTuning {
            balanced: Some(true),
            ..Default::default()
        };
        let out = big_purchase(&input, &tuning);
        assert_close(out.get(AssetClass::Equity), 30.0);
        assert_close(out.get(AssetClass::Cash), 15.0);
        assert_close(out.get(AssetClass::FixedIncome), 25.0);
        assert_close(out.get(AssetClass::Commodities), 15.0);
        assert_close(out.get(AssetClass::RealEstate), 15.0);
        assert!((out.total() - 100.0).abs() <= SUM_TOLERANCE);
    }

    #[test]
    fn big_purchase_requires_balanced_flag() {
        let input = low_short();
        let off = GoalTuning {
            balanced: Some(false),
            ..Default::default()
        };
        assert_eq!(big_purchase(&input, &off), input);
        assert_eq!(big_purchase(&input, &GoalTuning::default()), input);
    }

    #[test]
    fn big_purchase_settles_drift_on_largest_class() {
        // Two classes over the cap and none under: the pool has nowhere to go.
        let input = alloc(&[(AssetClass::Cash, 60.0), (AssetClass::Equity, 40.0)]);
        let tuning = GoalTuning {
            balanced: Some(true),
            ..Default::default()
        };
        let out = big_purchase(&input, &tuning);
        assert_close(out.get(AssetClass::Cash), 70.0);
        assert_close(out.get(AssetClass::Equity), 30.0);
    }

    #[test]
    fn settle_puts_deviation_on_first_largest() {
        let input = alloc(&[
            (AssetClass::Cash, 10.0),
            (AssetClass::Equity, 40.0),
            (AssetClass::FixedIncome, 40.0),
            (AssetClass::Commodities, 20.0),
        ]);
        let out = settle_on_largest(&input);
        assert_close(out.get(AssetClass::Equity), 30.0);
        assert_close(out.get(AssetClass::FixedIncome), 40.0);
    }

    #[test]
    fn empty_goal_is_invalid_input() {
        let m = fixtures::matrix();
        let err = apply(&low_short(), "", &m.goal_tuning).unwrap_err();
        assert_eq!(err, AllocationError::InvalidInput("goal is required".into()));
    }

    #[test]
    fn blank_goal_has_no_tuning_row() {
        let m = fixtures::matrix();
        let out = apply(&low_short(), "  ", &m.goal_tuning).unwrap();
        assert_eq!(out, low_short());
    }

    #[test]
    fn unknown_goal_is_skipped() {
        let m = fixtures::matrix();
        let out = apply(&low_short(), "Vacation", &m.goal_tuning).unwrap();
        assert_eq!(out, low_short());
    }

    #[test]
    fn retirement_row_is_settled_back_to_100() {
        let m = fixtures::matrix();
        let out = apply(&low_short(), "Retirement", &m.goal_tuning).unwrap();
        // +5 fixed income, +5 real estate, then -10 on fixed income (largest).
        assert_close(out.get(AssetClass::FixedIncome), 35.0);
        assert_close(out.get(AssetClass::RealEstate), 15.0);
        assert!((out.total() - 100.0).abs() <= SUM_TOLERANCE);
    }

    #[test]
    fn every_goal_has_a_strategy() {
        let m = fixtures::matrix();
        for goal in Goal::ALL {
            let out = apply(&low_short(), goal.name(), &m.goal_tuning).unwrap();
            assert!((out.total() - 100.0).abs() <= SUM_TOLERANCE, "{}", goal.name());
        }
    }
}
