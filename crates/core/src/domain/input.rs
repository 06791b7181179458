use crate::error::AllocationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskTolerance {
    Low,
    Medium,
    High,
}

impl RiskTolerance {
    pub fn label(self) -> &'static str {
        match self {
            RiskTolerance::Low => "Low",
            RiskTolerance::Medium => "Medium",
            RiskTolerance::High => "High",
        }
    }

    /// Short code used in base-allocation row keys.
    pub fn matrix_code(self) -> &'static str {
        match self {
            RiskTolerance::Low => "Low",
            RiskTolerance::Medium => "Mid",
            RiskTolerance::High => "High",
        }
    }
}

impl FromStr for RiskTolerance {
    type Err = AllocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Low" => Ok(RiskTolerance::Low),
            "Medium" => Ok(RiskTolerance::Medium),
            "High" => Ok(RiskTolerance::High),
            other => Err(AllocationError::InvalidInput(format!(
                "unsupported riskTolerance: {other:?}"
            ))),
        }
    }
}

impl fmt::Display for RiskTolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum InvestmentHorizon {
    Short,
    Moderate,
    Long,
}

impl InvestmentHorizon {
    pub fn label(self) -> &'static str {
        match self {
            InvestmentHorizon::Short => "Short",
            InvestmentHorizon::Moderate => "Moderate",
            InvestmentHorizon::Long => "Long",
        }
    }

    /// Short code used in base-allocation row keys.
    pub fn matrix_code(self) -> &'static str {
        match self {
            InvestmentHorizon::Short => "Short",
            InvestmentHorizon::Moderate => "Mod",
            InvestmentHorizon::Long => "Long",
        }
    }

    /// Discounting period in whole years.
    pub fn years(self) -> i32 {
        match self {
            InvestmentHorizon::Short => 2,
            InvestmentHorizon::Moderate => 5,
            InvestmentHorizon::Long => 8,
        }
    }
}

impl FromStr for InvestmentHorizon {
    type Err = AllocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Short" => Ok(InvestmentHorizon::Short),
            "Moderate" => Ok(InvestmentHorizon::Moderate),
            "Long" => Ok(InvestmentHorizon::Long),
            other => Err(AllocationError::InvalidInput(format!(
                "unsupported investmentHorizon: {other:?}"
            ))),
        }
    }
}

impl fmt::Display for InvestmentHorizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Age buckets used as keys of the age adjustment table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AgeGroup {
    #[serde(rename = "<30")]
    Under30,
    #[serde(rename = "30-45")]
    From30To45,
    #[serde(rename = "45-60")]
    From45To60,
    #[serde(rename = "60+")]
    Over60,
}

impl AgeGroup {
    /// Boundaries are inclusive on the upper end: 45 is still "30-45", 46 is "45-60".
    pub fn from_age(age: u32) -> Self {
        match age {
            0..=29 => AgeGroup::Under30,
            30..=45 => AgeGroup::From30To45,
            46..=60 => AgeGroup::From45To60,
            _ => AgeGroup::Over60,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AgeGroup::Under30 => "<30",
            AgeGroup::From30To45 => "30-45",
            AgeGroup::From45To60 => "45-60",
            AgeGroup::Over60 => "60+",
        }
    }
}

impl fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Financial goals with a dedicated tuning strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Goal {
    EmergencyFund,
    Retirement,
    WealthAccumulation,
    ChildEducation,
    BigPurchase,
}

impl Goal {
    pub const ALL: [Goal; 5] = [
        Goal::EmergencyFund,
        Goal::Retirement,
        Goal::WealthAccumulation,
        Goal::ChildEducation,
        Goal::BigPurchase,
    ];

    /// Exact, case-sensitive match on the goal name. Unknown names yield `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        Goal::ALL.into_iter().find(|g| g.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Goal::EmergencyFund => "Emergency Fund",
            Goal::Retirement => "Retirement",
            Goal::WealthAccumulation => "Wealth Accumulation",
            Goal::ChildEducation => "Child Education",
            Goal::BigPurchase => "Big Purchase",
        }
    }
}

/// Validated user input for one allocation request.
#[derive(Debug, Clone, PartialEq)]
pub struct UserInput {
    pub risk_tolerance: RiskTolerance,
    pub investment_horizon: InvestmentHorizon,
    pub age: u32,
    pub goal: String,
}
