use crate::domain::{Allocation, InvestmentHorizon, RiskTolerance};
use crate::error::AllocationError;
use crate::matrix::BaseAllocationTable;

/// Row key of the base allocation table, e.g. `Mid+Mod`.
pub fn risk_horizon_key(risk: RiskTolerance, horizon: InvestmentHorizon) -> String {
    format!("{}+{}", risk.matrix_code(), horizon.matrix_code())
}

/// Returns an owned copy of the matching base row.
pub fn resolve(
    risk: RiskTolerance,
    horizon: InvestmentHorizon,
    table: &BaseAllocationTable,
) -> Result<Allocation, AllocationError> {
    let key = risk_horizon_key(risk, horizon);
    tracing::debug!(%key, "looking up base allocation");

    let row = table.get(&key).ok_or_else(|| {
        tracing::error!(%key, "no base allocation row");
        AllocationError::RuleNotFound(format!(
            "no base allocation for riskTolerance/investmentHorizon key {key}"
        ))
    })?;
    Ok(row.clone())
}
