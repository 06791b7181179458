//! Allocation pipeline: base row lookup, age deltas, goal tuning, normalization,
//! then sub-asset expansion and formatting.

pub mod age;
pub mod base;
pub mod goal;
pub mod normalize;
pub mod result;
pub mod sub_assets;

use crate::domain::{Allocation, AllocationResult, UserInput};
use crate::error::AllocationError;
use crate::matrix::{AllocationMatrix, MatrixSource};

/// Top-level percentages after every adjustment stage, before formatting.
pub fn final_allocation(
    input: &UserInput,
    matrix: &AllocationMatrix,
) -> Result<Allocation, AllocationError> {
    let base = base::resolve(
        input.risk_tolerance,
        input.investment_horizon,
        &matrix.base_allocation,
    )?;
    let aged = age::apply(&base, input.age, &matrix.age_adjustments);
    let tuned = goal::apply(&aged, &input.goal, &matrix.goal_tuning)?;
    normalize::normalize(&tuned)
}

pub fn compute_allocation(
    input: &UserInput,
    matrix: &AllocationMatrix,
) -> Result<AllocationResult, AllocationError> {
    tracing::info!(
        risk_tolerance = %input.risk_tolerance,
        investment_horizon = %input.investment_horizon,
        age = input.age,
        goal = %input.goal,
        "computing allocation"
    );

    let allocation = final_allocation(input, matrix)?;
    let subs = sub_assets::expand(
        &allocation,
        input.risk_tolerance,
        &matrix.sub_allocation_weights,
    );
    let result = result::format(&allocation, subs);

    tracing::info!(
        classes = result.assets.len(),
        total = result.total_percentage(),
        "allocation computed"
    );
    Ok(result)
}

/// Loads the matrix from `source` for this call only, then computes.
pub async fn compute_allocation_with_source(
    input: &UserInput,
    source: &dyn MatrixSource,
) -> Result<AllocationResult, AllocationError> {
    let matrix = source.load_matrix().await?;
    compute_allocation(input, &matrix)
}
