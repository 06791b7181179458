use crate::domain::input::{InvestmentHorizon, RiskTolerance, UserInput};
use crate::error::AllocationError;
use serde::{Deserialize, Serialize};

/// Inbound allocation request as it arrives on the wire. Every field may be absent;
/// `into_input` turns it into a validated [`UserInput`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInputRequest {
    pub risk_tolerance: Option<String>,
    pub investment_horizon: Option<String>,
    pub age: Option<i64>,
    pub goal: Option<String>,
}

impl UserInputRequest {
    pub fn into_input(self) -> Result<UserInput, AllocationError> {
        let risk_tolerance: RiskTolerance = required(self.risk_tolerance, "riskTolerance")?.parse()?;
        let investment_horizon: InvestmentHorizon =
            required(self.investment_horizon, "investmentHorizon")?.parse()?;

        let age = self
            .age
            .ok_or_else(|| AllocationError::InvalidInput("age is required".to_string()))?;
        let age = u32::try_from(age).map_err(|_| {
            AllocationError::InvalidInput(format!("age must be a non-negative integer (got {age})"))
        })?;

        // Empty goals are rejected by the goal stage, not here.
        let goal = self.goal.unwrap_or_default();

        Ok(UserInput {
            risk_tolerance,
            investment_horizon,
            age,
            goal,
        })
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, AllocationError> {
    value
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AllocationError::InvalidInput(format!("{field} is required")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(v: serde_json::Value) -> UserInputRequest {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn accepts_complete_request() {
        let input = request(json!({
            "riskTolerance": "Medium",
            "investmentHorizon": "Long",
            "age": 35,
            "goal": "Retirement",
        }))
        .into_input()
        .unwrap();
        assert_eq!(input.risk_tolerance, RiskTolerance::Medium);
        assert_eq!(input.investment_horizon, InvestmentHorizon::Long);
        assert_eq!(input.age, 35);
        assert_eq!(input.goal, "Retirement");
    }

    #[test]
    fn rejects_missing_enums() {
        let err = request(json!({"investmentHorizon": "Long", "age": 35, "goal": "Retirement"}))
            .into_input()
            .unwrap_err();
        assert_eq!(
            err,
            AllocationError::InvalidInput("riskTolerance is required".into())
        );

        let err = request(json!({"riskTolerance": "Low", "age": 35, "goal": "Retirement"}))
            .into_input()
            .unwrap_err();
        assert_eq!(
            err,
            AllocationError::InvalidInput("investmentHorizon is required".into())
        );
    }

    #[test]
    fn rejects_unknown_horizon_and_negative_age() {
        let err = request(json!({
            "riskTolerance": "Low",
            "investmentHorizon": "Eternal",
            "age": 35,
            "goal": "Retirement",
        }))
        .into_input()
        .unwrap_err();
        assert!(matches!(err, AllocationError::InvalidInput(_)));

        let err = request(json!({
            "riskTolerance": "Low",
            "investmentHorizon": "Short",
            "age": -1,
            "goal": "Retirement",
        }))
        .into_input()
        .unwrap_err();
        assert!(matches!(err, AllocationError::InvalidInput(_)));
    }

    #[test]
    fn missing_goal_passes_through_as_empty() {
        let input = request(json!({"riskTolerance": "High", "investmentHorizon": "Short", "age": 20}))
            .into_input()
            .unwrap();
        assert!(input.goal.is_empty());
    }

    #[test]
    fn padded_enum_labels_are_rejected() {
        let err = request(json!({
            "riskTolerance": " Low",
            "investmentHorizon": "Short",
            "age": 35,
            "goal": "Retirement",
        }))
        .into_input()
        .unwrap_err();
        assert!(matches!(err, AllocationError::InvalidInput(_)));

        let err = request(json!({
            "riskTolerance": "Low",
            "investmentHorizon": "Short ",
            "age": 35,
            "goal": "Retirement",
        }))
        .into_input()
        .unwrap_err();
        assert!(matches!(err, AllocationError::InvalidInput(_)));
    }

    #[test]
    fn goal_is_passed_through_verbatim() {
        let input = request(json!({
            "riskTolerance": "Low",
            "investmentHorizon": "Short",
            "age": 35,
            "goal": " Retirement",
        }))
        .into_input()
        .unwrap();
        assert_eq!(input.goal, " Retirement");
    }
}
