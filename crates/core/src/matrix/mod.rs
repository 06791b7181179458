//! Rule tables driving the allocation pipeline.
//!
//! Two JSON documents back the tables: the rules document carries the base
//! allocation, age adjustments and goal tuning; the weights document carries the
//! sub-allocation weights. Tables are parsed into typed rows once and never
//! mutated afterwards.

pub mod source;

use crate::domain::{AgeGroup, Allocation, AssetClass, RiskTolerance};
use crate::error::AllocationError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use source::{FileMatrixSource, HttpMatrixSource, MatrixSource};

pub const RULES_DOCUMENT: &str = "allocation_matrix.json";
pub const WEIGHTS_DOCUMENT: &str = "sub_allocation_matrix.json";

pub(crate) const BASE_ALLOCATION_SECTION: &str = "risk_horizon_allocation";
pub(crate) const AGE_ADJUSTMENT_SECTION: &str = "age_adjustment_rules";
pub(crate) const GOAL_TUNING_SECTION: &str = "goal_tuning";

/// `"<RiskCode>+<HorizonCode>"` -> percentage per asset class.
pub type BaseAllocationTable = BTreeMap<String, Allocation>;

/// Age bucket -> delta per asset class.
pub type AgeAdjustmentTable = BTreeMap<AgeGroup, BTreeMap<AssetClass, f64>>;

/// Goal name -> tuning parameters.
pub type GoalTuningTable = BTreeMap<String, GoalTuning>;

/// Asset class display name -> sub-asset -> risk level -> weight.
pub type SubAllocationWeights = BTreeMap<String, BTreeMap<String, BTreeMap<RiskTolerance, u32>>>;

/// Tuning parameters of one goal row. Keys not listed here are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GoalTuning {
    #[serde(rename = "fixedIncome_boost")]
    pub fixed_income_boost: Option<f64>,
    #[serde(rename = "realEstate_boost")]
    pub real_estate_boost: Option<f64>,
    #[serde(rename = "equityReduction_moderate")]
    pub equity_reduction_moderate: Option<f64>,
    pub balanced: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AllocationMatrix {
    pub base_allocation: BaseAllocationTable,
    pub age_adjustments: AgeAdjustmentTable,
    pub goal_tuning: GoalTuningTable,
    pub sub_allocation_weights: SubAllocationWeights,
}

impl AllocationMatrix {
    pub fn from_documents(rules_json: &str, weights_json: &str) -> Result<Self, AllocationError> {
        let rules = parse_document(rules_json, RULES_DOCUMENT)?;
        let matrix = Self {
            base_allocation: take_section(&rules, RULES_DOCUMENT, BASE_ALLOCATION_SECTION)?,
            age_adjustments: known_age_deltas(take_section(
                &rules,
                RULES_DOCUMENT,
                AGE_ADJUSTMENT_SECTION,
            )?),
            goal_tuning: take_section(&rules, RULES_DOCUMENT, GOAL_TUNING_SECTION)?,
            sub_allocation_weights: parse_weights(weights_json)?,
        };
        matrix.validate()?;
        Ok(matrix)
    }

    pub fn validate(&self) -> Result<(), AllocationError> {
        if self.base_allocation.is_empty() {
            return Err(AllocationError::DataUnavailable(format!(
                "{BASE_ALLOCATION_SECTION} must be non-empty"
            )));
        }

        for (key, row) in &self.base_allocation {
            if row.is_empty() {
                return Err(AllocationError::DataUnavailable(format!(
                    "base allocation row {key} must be non-empty"
                )));
            }
            if let Some((class, v)) = row.iter().find(|(_, v)| !v.is_finite()) {
                return Err(AllocationError::DataUnavailable(format!(
                    "base allocation row {key} has a non-finite {class} value: {v}"
                )));
            }
        }

        for (group, row) in &self.age_adjustments {
            if let Some((class, v)) = row.iter().find(|(_, v)| !v.is_finite()) {
                return Err(AllocationError::DataUnavailable(format!(
                    "age adjustment {group} has a non-finite {class} delta: {v}"
                )));
            }
        }

        for (goal, row) in &self.goal_tuning {
            let numbers = [
                row.fixed_income_boost,
                row.real_estate_boost,
                row.equity_reduction_moderate,
            ];
            if numbers.into_iter().flatten().any(|v| !v.is_finite()) {
                return Err(AllocationError::DataUnavailable(format!(
                    "goal tuning {goal} has a non-finite parameter"
                )));
            }
        }

        Ok(())
    }
}

pub(crate) fn parse_document(json: &str, document: &str) -> Result<serde_json::Value, AllocationError> {
    serde_json::from_str(json)
        .map_err(|e| AllocationError::DataUnavailable(format!("{document} is not valid JSON: {e}")))
}

pub(crate) fn take_section<T: DeserializeOwned>(
    doc: &serde_json::Value,
    document: &str,
    section: &str,
) -> Result<T, AllocationError> {
    let value = doc.get(section).cloned().ok_or_else(|| {
        AllocationError::DataUnavailable(format!("{document} is missing section {section}"))
    })?;
    serde_json::from_value(value).map_err(|e| {
        AllocationError::DataUnavailable(format!("{document} section {section} is malformed: {e}"))
    })
}

pub(crate) fn parse_weights(json: &str) -> Result<SubAllocationWeights, AllocationError> {
    let raw: BTreeMap<String, BTreeMap<String, BTreeMap<String, u32>>> =
        serde_json::from_str(json).map_err(|e| {
            AllocationError::DataUnavailable(format!("{WEIGHTS_DOCUMENT} is malformed: {e}"))
        })?;

    Ok(raw
        .into_iter()
        .map(|(class, subs)| {
            let subs = subs
                .into_iter()
                .map(|(sub_asset, by_risk)| {
                    let by_risk = by_risk
                        .into_iter()
                        .filter_map(|(risk, weight)| match risk.parse::<RiskTolerance>() {
                            Ok(risk) => Some((risk, weight)),
                            Err(_) => {
                                tracing::warn!(%class, %sub_asset, %risk, "ignoring weight for unknown risk level");
                                None
                            }
                        })
                        .collect();
                    (sub_asset, by_risk)
                })
                .collect();
            (class, subs)
        })
        .collect())
}

pub(crate) fn parse_age_adjustments(rules_json: &str) -> Result<AgeAdjustmentTable, AllocationError> {
    parse_rules_section(rules_json, AGE_ADJUSTMENT_SECTION).map(known_age_deltas)
}

/// Drops deltas keyed by names outside the asset class set.
fn known_age_deltas(raw: BTreeMap<AgeGroup, BTreeMap<String, f64>>) -> AgeAdjustmentTable {
    raw.into_iter()
        .map(|(group, deltas)| {
            let deltas = deltas
                .into_iter()
                .filter_map(|(key, delta)| match AssetClass::from_key(&key) {
                    Some(class) => Some((class, delta)),
                    None => {
                        tracing::warn!(%group, class = %key, "ignoring age delta for unknown asset class");
                        None
                    }
                })
                .collect();
            (group, deltas)
        })
        .collect()
}

pub(crate) fn parse_rules_section<T: DeserializeOwned>(
    rules_json: &str,
    section: &str,
) -> Result<T, AllocationError> {
    let doc = parse_document(rules_json, RULES_DOCUMENT)?;
    take_section(&doc, RULES_DOCUMENT, section)
}
