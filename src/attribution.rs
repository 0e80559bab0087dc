use crate::{
    error::Result,
    measure::{FuzzyMeasure, MeasureTable},
    utils::shapley_weights,
    validation::validate_element,
};
use rayon::prelude::*;
use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};
use tracing::debug;

#[cfg(feature = "serde")]
use {
    serde::{Deserialize, Serialize},
    tabled::Tabled,
};

#[cfg(feature = "borsh")]
use borsh::{BorshDeserialize, BorshSerialize};

/// Elements above which indices are computed in parallel
const PARALLEL_THRESHOLD: usize = 8;

/// Per-element attribution index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Index {
    /// Shapley-weighted mean of marginal contributions
    Shapley,
    /// Uniform mean of marginal contributions
    Banzhaf,
    /// Shapley-weighted `−d ln d` of marginal contributions
    Entropy,
}

/// Index value for one element
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize, Tabled))]
#[cfg_attr(feature = "borsh", derive(BorshSerialize, BorshDeserialize))]
pub struct AttributionValue {
    pub element: usize,
    pub value: f64,
    pub percent: f64,
}

impl Display for AttributionValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "element: {}, value: {}, percent: {}",
            self.element, self.value, self.percent
        )
    }
}

impl Index {
    pub const ALL: [Index; 3] = [Index::Shapley, Index::Banzhaf, Index::Entropy];

    pub fn name(&self) -> &'static str {
        match self {
            Index::Shapley => "shapley",
            Index::Banzhaf => "banzhaf",
            Index::Entropy => "entropy",
        }
    }

    /// Index of a single element, read off the measure's stored table
    pub fn value(&self, measure: &FuzzyMeasure, element: usize) -> Result<f64> {
        validate_element(measure.set(), element)?;
        let table = measure.table()?;
        Ok(self.on_table(table, element))
    }

    /// Index of every element, in element order
    pub fn values(&self, measure: &FuzzyMeasure) -> Result<Vec<f64>> {
        let table = measure.table()?;
        let n = table.n();

        let use_parallel = n > PARALLEL_THRESHOLD;
        debug!(index = self.name(), n, use_parallel, "computing attribution");

        let values = if use_parallel {
            (0..n)
                .into_par_iter()
                .map(|element| self.on_table(table, element))
                .collect()
        } else {
            (0..n)
                .map(|element| self.on_table(table, element))
                .collect()
        };
        Ok(values)
    }

    fn on_table(&self, table: &MeasureTable, element: usize) -> f64 {
        let values = table.values();
        let n = table.n();
        match self {
            Index::Shapley => {
                let weights = shapley_weights(n);
                marginal_sum(values, element, |size, d| weights[size] * d)
            }
            Index::Banzhaf => {
                let scale = 1.0 / (1usize << (n - 1)) as f64;
                scale * marginal_sum(values, element, |_, d| d)
            }
            Index::Entropy => {
                let weights = shapley_weights(n);
                marginal_sum(values, element, |size, d| weights[size] * entropy_term(d))
            }
        }
    }
}

impl Display for Index {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Index {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "shapley" => Ok(Index::Shapley),
            "banzhaf" => Ok(Index::Banzhaf),
            "entropy" => Ok(Index::Entropy),
            other => Err(format!("unknown index '{other}'")),
        }
    }
}

/// Sum `term(|S|, μ(S ∪ {e}) − μ(S))` over every coalition `S` without `e`
fn marginal_sum<F>(values: &[f64], element: usize, term: F) -> f64
where
    F: Fn(usize, f64) -> f64,
{
    let bit = 1 << element;
    (0..values.len())
        .filter(|&mask| mask & bit == 0)
        .map(|mask| {
            let size = mask.count_ones() as usize;
            term(size, values[mask | bit] - values[mask])
        })
        .sum()
}

/// `−d ln d`, with the limit 0 at `d = 0`
fn entropy_term(d: f64) -> f64 {
    if d <= 0.0 { 0.0 } else { -d * d.ln() }
}

pub fn shapley_value(measure: &FuzzyMeasure, element: usize) -> Result<f64> {
    Index::Shapley.value(measure, element)
}

pub fn banzhaf_value(measure: &FuzzyMeasure, element: usize) -> Result<f64> {
    Index::Banzhaf.value(measure, element)
}

pub fn entropy_value(measure: &FuzzyMeasure, element: usize) -> Result<f64> {
    Index::Entropy.value(measure, element)
}

pub fn shapley_values(measure: &FuzzyMeasure) -> Result<Vec<f64>> {
    Index::Shapley.values(measure)
}

pub fn banzhaf_values(measure: &FuzzyMeasure) -> Result<Vec<f64>> {
    Index::Banzhaf.values(measure)
}

pub fn entropy_values(measure: &FuzzyMeasure) -> Result<Vec<f64>> {
    Index::Entropy.values(measure)
}

/// Entropy of the measure scaled to `[0, 1]` by `ln n`
pub fn normalized_entropy(measure: &FuzzyMeasure) -> Result<f64> {
    let n = measure.len();
    if n <= 1 {
        return Ok(0.0);
    }
    let total: f64 = entropy_values(measure)?.iter().sum();
    Ok(total / (n as f64).ln())
}

/// Index values with each element's share of the positive total
pub fn attribution_report(measure: &FuzzyMeasure, index: Index) -> Result<Vec<AttributionValue>> {
    let values = index.values(measure)?;

    let total: f64 = values.iter().map(|v| v.max(0.0)).sum();
    let report = values
        .into_iter()
        .enumerate()
        .map(|(element, value)| {
            let percent = if total > 0.0 {
                value.max(0.0) / total
            } else {
                0.0
            };
            AttributionValue {
                element,
                value,
                percent,
            }
        })
        .collect();

    Ok(report)
}
