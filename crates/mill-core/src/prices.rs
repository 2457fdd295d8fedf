use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

/// Integer prices for every facility of one side.
///
/// Search steps own their vectors outright; moves go through
/// [`PriceVector::with_price`], which hands back a modified copy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceVector(Vec<i64>);

impl PriceVector {
    pub fn new(prices: Vec<i64>) -> Self {
        Self(prices)
    }

    /// Half of each facility's upper bound, rounded down.
    pub fn canonical_start(upper_bounds: &[i64]) -> Self {
        Self(upper_bounds.iter().map(|b| b / 2).collect())
    }

    /// Copy of `self` with coordinate `index` set to `price`.
    pub fn with_price(&self, index: usize, price: i64) -> Self {
        let mut prices = self.0.clone();
        prices[index] = price;
        Self(prices)
    }

    pub fn as_slice(&self) -> &[i64] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<i64> {
        self.0
    }
}

impl Deref for PriceVector {
    type Target = [i64];

    fn deref(&self) -> &[i64] {
        &self.0
    }
}

impl From<Vec<i64>> for PriceVector {
    fn from(prices: Vec<i64>) -> Self {
        Self(prices)
    }
}

impl FromIterator<i64> for PriceVector {
    fn from_iter<T: IntoIterator<Item = i64>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for PriceVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, p) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", p)?;
        }
        Ok(())
    }
}
