use crate::domain::{round2, InvestmentHorizon};
use crate::error::AllocationError;

/// Present value of a percentage share of `target_amount`, discounted at
/// `annual_return` percent per year over the horizon:
///
/// `(percentage_split / 100 * target_amount) / (1 + annual_return / 100) ^ years`
///
/// Rounded to two decimals.
pub fn compute_amount(
    percentage_split: f64,
    target_amount: f64,
    annual_return: f64,
    horizon: &str,
) -> Result<f64, AllocationError> {
    let horizon: InvestmentHorizon = horizon.parse()?;
    compute_amount_for(percentage_split, target_amount, annual_return, horizon)
}

pub fn compute_amount_for(
    percentage_split: f64,
    target_amount: f64,
    annual_return: f64,
    horizon: InvestmentHorizon,
) -> Result<f64, AllocationError> {
    for (name, value) in [
        ("percentageSplit", percentage_split),
        ("targetAmount", target_amount),
        ("annualReturn", annual_return),
    ] {
        if !value.is_finite() {
            return Err(AllocationError::InvalidInput(format!(
                "{name} must be a finite number (got {value})"
            )));
        }
    }

    let growth = 1.0 + annual_return / 100.0;
    if growth <= 0.0 {
        return Err(AllocationError::MathError(format!(
            "annualReturn {annual_return} leaves a non-positive growth factor"
        )));
    }

    let years = horizon.years();
    let denominator = growth.powi(years);
    if denominator == 0.0 || !denominator.is_finite() {
        return Err(AllocationError::MathError(format!(
            "discount factor out of range for annualReturn {annual_return} over {years} years"
        )));
    }

    let amount = (percentage_split / 100.0) * target_amount / denominator;
    if !amount.is_finite() {
        return Err(AllocationError::MathError(format!(
            "investment amount overflowed for percentageSplit {percentage_split}, targetAmount {target_amount}"
        )));
    }

    let amount = round2(amount);
    tracing::debug!(
        percentage_split,
        target_amount,
        annual_return,
        %horizon,
        years,
        amount,
        "investment amount computed"
    );
    Ok(amount)
}
