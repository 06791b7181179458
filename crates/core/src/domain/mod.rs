pub mod allocation;
pub mod contract;
pub mod input;

pub use allocation::{round2, Allocation, AllocationResult, AssetAllocation, AssetClass};
pub use contract::UserInputRequest;
pub use input::{AgeGroup, Goal, InvestmentHorizon, RiskTolerance, UserInput};
