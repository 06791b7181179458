use crate::allocation::goal::SUM_TOLERANCE;
use crate::domain::Allocation;
use crate::error::AllocationError;

/// Scales every class by `100 / total` when the total is off 100 by more than
/// the tolerance.
pub fn normalize(allocation: &Allocation) -> Result<Allocation, AllocationError> {
    let total = allocation.total();
    if !total.is_finite() {
        return Err(AllocationError::MathError(format!(
            "allocation total is not finite: {total}"
        )));
    }
    if (total - 100.0).abs() <= SUM_TOLERANCE {
        return Ok(allocation.clone());
    }
    if total == 0.0 {
        return Err(AllocationError::MathError(
            "cannot normalize an allocation whose total is 0".to_string(),
        ));
    }

    let factor = 100.0 / total;
    if !factor.is_finite() {
        return Err(AllocationError::MathError(format!(
            "normalization factor overflowed for allocation total {total}"
        )));
    }

    let mut out = allocation.clone();
    out.scale(factor);
    if let Some((class, v)) = out.iter().find(|(_, v)| !v.is_finite()) {
        return Err(AllocationError::MathError(format!(
            "normalized {class} share is not finite: {v}"
        )));
    }
    tracing::debug!(total_before = total, "allocation normalized");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AssetClass;

    #[test]
    fn scales_to_100() {
        let input: Allocation = [(AssetClass::Cash, 30.0), (AssetClass::Equity, 90.0)]
            .into_iter()
            .collect();
        let out = normalize(&input).unwrap();
        assert!((out.get(AssetClass::Cash).unwrap() - 25.0).abs() < 1e-9);
        assert!((out.get(AssetClass::Equity).unwrap() - 75.0).abs() < 1e-9);
    }

    #[test]
    fn within_tolerance_is_unchanged() {
        let input: Allocation = [(AssetClass::Cash, 40.005), (AssetClass::Equity, 60.0)]
            .into_iter()
            .collect();
        assert_eq!(normalize(&input).unwrap(), input);
    }

    #[test]
    fn zero_total_is_math_error() {
        let input: Allocation = [(AssetClass::Cash, 10.0), (AssetClass::Equity, -10.0)]
            .into_iter()
            .collect();
        assert!(matches!(
            normalize(&input),
            Err(AllocationError::MathError(_))
        ));
        assert!(matches!(
            normalize(&Allocation::default()),
            Err(AllocationError::MathError(_))
        ));
    }

    #[test]
    fn subnormal_total_is_math_error() {
        let input: Allocation = [(AssetClass::Cash, 1e-310), (AssetClass::Equity, 0.0)]
            .into_iter()
            .collect();
        assert!(matches!(
            normalize(&input),
            Err(AllocationError::MathError(_))
        ));
    }

    #[test]
    fn overflowing_share_is_math_error() {
        // Total is 50, so the factor of 2 pushes cash past f64::MAX.
        let input: Allocation = [
            (AssetClass::Cash, 1e308),
            (AssetClass::Equity, -1e308),
            (AssetClass::FixedIncome, 50.0),
        ]
        .into_iter()
        .collect();
        assert!(matches!(
            normalize(&input),
            Err(AllocationError::MathError(_))
        ));
    }
}
