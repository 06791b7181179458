use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Top-level asset classes. Declaration order is the iteration order of every
/// allocation map, which also decides ties when picking the largest class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AssetClass {
    Cash,
    Equity,
    FixedIncome,
    Commodities,
    RealEstate,
}

impl AssetClass {
    pub const ALL: [AssetClass; 5] = [
        AssetClass::Cash,
        AssetClass::Equity,
        AssetClass::FixedIncome,
        AssetClass::Commodities,
        AssetClass::RealEstate,
    ];

    pub fn key(self) -> &'static str {
        match self {
            AssetClass::Cash => "cash",
            AssetClass::Equity => "equity",
            AssetClass::FixedIncome => "fixedIncome",
            AssetClass::Commodities => "commodities",
            AssetClass::RealEstate => "realEstate",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.key() == key)
    }

    /// Name used by the sub-allocation weight table and the product catalog.
    pub fn display_name(self) -> &'static str {
        match self {
            AssetClass::Cash => "Cash Equivalence",
            AssetClass::Equity => "Equity",
            AssetClass::FixedIncome => "Fixed Income",
            AssetClass::Commodities => "Commodities",
            AssetClass::RealEstate => "Real Estate",
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Percentage per asset class.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Allocation(BTreeMap<AssetClass, f64>);

impl Allocation {
    pub fn get(&self, class: AssetClass) -> Option<f64> {
        self.0.get(&class).copied()
    }

    pub fn contains(&self, class: AssetClass) -> bool {
        self.0.contains_key(&class)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (AssetClass, f64)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }

    pub fn classes(&self) -> impl Iterator<Item = AssetClass> + '_ {
        self.0.keys().copied()
    }

    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    /// Class holding the single largest percentage; on ties the first class in
    /// iteration order wins.
    pub fn largest(&self) -> Option<AssetClass> {
        let mut best: Option<(AssetClass, f64)> = None;
        for (class, value) in self.iter() {
            match best {
                Some((_, b)) if value <= b => {}
                _ => best = Some((class, value)),
            }
        }
        best.map(|(class, _)| class)
    }

    pub fn max_value(&self) -> Option<f64> {
        self.0.values().copied().reduce(f64::max)
    }

    /// Overwrites the value of a class already present. Absent classes are left absent.
    pub fn set(&mut self, class: AssetClass, value: f64) -> bool {
        match self.0.get_mut(&class) {
            Some(v) => {
                *v = value;
                true
            }
            None => false,
        }
    }

    /// Adds `delta` to a class already present. Absent classes are left absent.
    pub fn add(&mut self, class: AssetClass, delta: f64) -> bool {
        match self.0.get_mut(&class) {
            Some(v) => {
                *v += delta;
                true
            }
            None => false,
        }
    }

    pub fn scale(&mut self, factor: f64) {
        for v in self.0.values_mut() {
            *v *= factor;
        }
    }
}

impl FromIterator<(AssetClass, f64)> for Allocation {
    fn from_iter<I: IntoIterator<Item = (AssetClass, f64)>>(iter: I) -> Self {
        Allocation(iter.into_iter().collect())
    }
}

/// One asset class of the formatted result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetAllocation {
    pub percentage: f64,
    #[serde(default)]
    pub sub_assets: BTreeMap<String, f64>,
}

/// Two-level percentage tree: `{assets: {class: {percentage, subAssets}}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationResult {
    pub assets: BTreeMap<AssetClass, AssetAllocation>,
}

impl AllocationResult {
    pub fn total_percentage(&self) -> f64 {
        self.assets.values().map(|a| a.percentage).sum()
    }
}

/// Rounds half away from zero to two decimals.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
