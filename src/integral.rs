//! Discrete Choquet, Sugeno and Shilkret integrals.
//!
//! All three sort the contributions once in decreasing order (stable, so equal
//! values keep their original order) and walk the chain of top-k index sets
//! `P₁ ⊂ P₂ ⊂ … ⊂ Pₙ`. `Pₖ` is the ascending tail `A₍ₙ₋ₖ₊₁..ₙ₎` of the
//! textbook definitions.

use crate::{
    error::{FuzzyMeasureError, Result},
    measure::FuzzyMeasure,
    mobius::MobiusTable,
    types::Subset,
};
use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};
use tracing::trace;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Which fuzzy integral to evaluate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Integral {
    /// `Σ cₖ (μ(Pₖ) − μ(Pₖ₋₁))`
    ///
    /// Lies in `[min c, max c]` for any real contributions.
    Choquet,
    /// `maxₖ min(cₖ, μ(Pₖ))`
    ///
    /// Contributions are compared against measure values, so the result lies in
    /// `[min c, max c]` only when the contributions lie in `[0, 1]`.
    Sugeno,
    /// `maxₖ cₖ · μ(Pₖ)`
    ///
    /// Lies in `[min c, max c]` for non-negative contributions; negative
    /// contributions are scaled towards zero by `μ(Pₖ) ≤ 1`.
    Shilkret,
}

impl Integral {
    pub const ALL: [Integral; 3] = [Integral::Choquet, Integral::Sugeno, Integral::Shilkret];

    pub fn name(&self) -> &'static str {
        match self {
            Integral::Choquet => "choquet",
            Integral::Sugeno => "sugeno",
            Integral::Shilkret => "shilkret",
        }
    }

    /// Integrate `contributions` with respect to `measure`
    pub fn evaluate(&self, measure: &FuzzyMeasure, contributions: &[f64]) -> Result<f64> {
        self.evaluate_with(measure, contributions, None)
    }

    /// Integrate after mapping every contribution through `measurable`
    pub fn evaluate_with(
        &self,
        measure: &FuzzyMeasure,
        contributions: &[f64],
        measurable: Option<&dyn Fn(f64) -> f64>,
    ) -> Result<f64> {
        let chain = DecreasingChain::new(measure, contributions, measurable)?;
        let value = match self {
            Integral::Choquet => chain.choquet(),
            Integral::Sugeno => chain.sugeno(),
            Integral::Shilkret => chain.shilkret(),
        };
        trace!(integral = self.name(), value, "integral evaluated");
        Ok(value)
    }
}

impl Display for Integral {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Integral {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "choquet" => Ok(Integral::Choquet),
            "sugeno" => Ok(Integral::Sugeno),
            "shilkret" => Ok(Integral::Shilkret),
            other => Err(format!("unknown integral '{other}'")),
        }
    }
}

pub fn choquet(measure: &FuzzyMeasure, contributions: &[f64]) -> Result<f64> {
    Integral::Choquet.evaluate(measure, contributions)
}

pub fn sugeno(measure: &FuzzyMeasure, contributions: &[f64]) -> Result<f64> {
    Integral::Sugeno.evaluate(measure, contributions)
}

pub fn shilkret(measure: &FuzzyMeasure, contributions: &[f64]) -> Result<f64> {
    Integral::Shilkret.evaluate(measure, contributions)
}

/// Choquet integral from the Möbius representation: `Σ_{A≠∅} m(A) · min_{i∈A} xᵢ`
pub fn choquet_mobius(table: &MobiusTable, contributions: &[f64]) -> Result<f64> {
    check_dimension(table.n(), contributions)?;

    let coefficients = table.coefficients();
    let mut minima = vec![f64::INFINITY; coefficients.len()];
    let mut total = 0.0;
    for mask in 1..coefficients.len() {
        let lowest = mask.trailing_zeros() as usize;
        minima[mask] = minima[mask & (mask - 1)].min(contributions[lowest]);
        total += coefficients[mask] * minima[mask];
    }
    Ok(total)
}

fn check_dimension(expected: usize, contributions: &[f64]) -> Result<()> {
    if contributions.len() != expected {
        return Err(FuzzyMeasureError::DimensionMismatch {
            expected,
            actual: contributions.len(),
        });
    }
    Ok(())
}

/// Contributions in decreasing order with the measure of each top-k set
struct DecreasingChain {
    values: Vec<f64>,
    measures: Vec<f64>,
}

impl DecreasingChain {
    fn new(
        measure: &FuzzyMeasure,
        contributions: &[f64],
        measurable: Option<&dyn Fn(f64) -> f64>,
    ) -> Result<Self> {
        check_dimension(measure.len(), contributions)?;

        let mapped: Vec<f64> = match measurable {
            Some(f) => contributions.iter().map(|&x| f(x)).collect(),
            None => contributions.to_vec(),
        };

        let mut order: Vec<usize> = (0..mapped.len()).collect();
        order.sort_by(|&a, &b| mapped[b].total_cmp(&mapped[a]));

        let mut subset = Subset::EMPTY;
        let mut values = Vec::with_capacity(order.len());
        let mut measures = Vec::with_capacity(order.len());
        for idx in order {
            subset = subset.with(idx);
            values.push(mapped[idx]);
            measures.push(measure.value(subset)?);
        }

        Ok(Self { values, measures })
    }

    fn choquet(&self) -> f64 {
        // μ of the set before the largest contribution is μ(∅) = 0, taken as a
        // literal rather than evaluated
        let mut previous = 0.0;
        let mut total = 0.0;
        for (&value, &mu) in self.values.iter().zip(&self.measures) {
            total += value * (mu - previous);
            previous = mu;
        }
        total
    }

    fn sugeno(&self) -> f64 {
        self.values
            .iter()
            .zip(&self.measures)
            .map(|(&value, &mu)| value.min(mu))
            .reduce(f64::max)
            .unwrap_or(0.0)
    }

    fn shilkret(&self) -> f64 {
        self.values
            .iter()
            .zip(&self.measures)
            .map(|(&value, &mu)| value * mu)
            .reduce(f64::max)
            .unwrap_or(0.0)
    }
}
