//! Möbius and zeta transforms of set functions.
//!
//! `m(A) = Σ_{B⊆A} (−1)^{|A|−|B|} μ(B)` and its inverse `μ(A) = Σ_{B⊆A} m(B)`.
//! Single coefficients enumerate the submasks of `A`; whole tables use the
//! in-place subset-sum transform, one pass per element.

use crate::{
    error::{FuzzyMeasureError, Result},
    measure::{FuzzyMeasure, MeasureTable},
    subset::Submasks,
    types::Subset,
    validation::validate_universe_size,
};
use faer::{Col, Mat};
use tracing::debug;

/// Möbius coefficient of one subset, straight from the definition
pub fn mobius(measure: &FuzzyMeasure, subset: Subset) -> Result<f64> {
    measure.set().check_subset(subset)?;
    let size = subset.len();
    Submasks::new(subset).try_fold(0.0, |acc: f64, b: Subset| -> Result<f64> {
        let term = measure.value(b)?;
        Ok(if (size - b.len()) % 2 == 0 {
            acc + term
        } else {
            acc - term
        })
    })
}

/// Sum of the Möbius coefficients of all subsets of `subset`
pub fn zeta(table: &MobiusTable, subset: Subset) -> Result<f64> {
    table.check_subset(subset)?;
    Ok(Submasks::new(subset)
        .map(|b| table.coefficients[b.mask()])
        .sum())
}

/// Möbius coefficients of every subset, indexed by mask
#[derive(Debug, Clone, PartialEq)]
pub struct MobiusTable {
    n: usize,
    coefficients: Vec<f64>,
}

impl MobiusTable {
    /// Copy of the table stored on the measure, see [`FuzzyMeasure::mobius_table`]
    pub fn from_measure(measure: &FuzzyMeasure) -> Result<Self> {
        Ok(measure.mobius_table()?.clone())
    }

    pub fn from_table(table: &MeasureTable) -> Self {
        let n = table.n();
        debug!(n, "computing mobius table");

        let mut coefficients = table.values().to_vec();
        for element in 0..n {
            let bit = 1 << element;
            for mask in 0..coefficients.len() {
                if mask & bit != 0 {
                    coefficients[mask] -= coefficients[mask ^ bit];
                }
            }
        }
        Self { n, coefficients }
    }

    /// Wrap coefficients given per mask for an `n`-element universe
    pub fn from_coefficients(n: usize, coefficients: Vec<f64>) -> Result<Self> {
        validate_universe_size(n)?;
        let expected = 1 << n;
        if coefficients.len() != expected {
            return Err(FuzzyMeasureError::DimensionMismatch {
                expected,
                actual: coefficients.len(),
            });
        }
        Ok(Self { n, coefficients })
    }

    /// Number of elements in the universe
    pub fn n(&self) -> usize {
        self.n
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn get(&self, subset: Subset) -> Result<f64> {
        self.check_subset(subset)?;
        Ok(self.coefficients[subset.mask()])
    }

    /// Set function values recovered from the coefficients
    pub fn zeta_table(&self) -> MeasureTable {
        let mut values = self.coefficients.clone();
        for element in 0..self.n {
            let bit = 1 << element;
            for mask in 0..values.len() {
                if mask & bit != 0 {
                    values[mask] += values[mask ^ bit];
                }
            }
        }
        MeasureTable::from_values(self.n, values)
    }

    /// Largest subset size with a coefficient beyond `tolerance`
    ///
    /// A measure is k-additive when this is k. Additive measures give 1.
    pub fn additivity_order(&self, tolerance: f64) -> usize {
        self.coefficients
            .iter()
            .enumerate()
            .filter(|(_, c)| c.abs() > tolerance)
            .map(|(mask, _)| mask.count_ones() as usize)
            .max()
            .unwrap_or(0)
    }

    fn check_subset(&self, subset: Subset) -> Result<()> {
        let outside = subset.mask() & !Subset::full(self.n).mask();
        if outside != 0 {
            return Err(FuzzyMeasureError::InvalidElement {
                element: outside.trailing_zeros() as usize,
                size: self.n,
            });
        }
        Ok(())
    }
}

/// Largest universe a dense operator is built for; the matrix has `4^n` entries
pub const MAX_OPERATOR_ELEMENTS: usize = 12;

fn validate_operator_size(n: usize) -> Result<usize> {
    if n > MAX_OPERATOR_ELEMENTS {
        return Err(FuzzyMeasureError::TooManyElements {
            count: n,
            limit: MAX_OPERATOR_ELEMENTS,
        });
    }
    Ok(1 << n)
}

/// Dense zeta matrix: entry `(A, B)` is 1 when `B ⊆ A`
pub fn zeta_operator(n: usize) -> Result<Mat<f64>> {
    let size = validate_operator_size(n)?;
    Ok(Mat::from_fn(size, size, |a, b| if a & b == b { 1.0 } else { 0.0 }))
}

/// Dense Möbius matrix: entry `(A, B)` is `(−1)^{|A|−|B|}` when `B ⊆ A`
pub fn mobius_operator(n: usize) -> Result<Mat<f64>> {
    let size = validate_operator_size(n)?;
    Ok(Mat::from_fn(size, size, |a, b| {
        if a & b != b {
            0.0
        } else if (a.count_ones() - b.count_ones()) % 2 == 0 {
            1.0
        } else {
            -1.0
        }
    }))
}

/// Apply a dense transform matrix to a table of per-mask values
pub fn apply_operator(operator: &Mat<f64>, values: &[f64]) -> Result<Vec<f64>> {
    if operator.ncols() != values.len() {
        return Err(FuzzyMeasureError::DimensionMismatch {
            expected: operator.ncols(),
            actual: values.len(),
        });
    }
    let column = Col::from_fn(values.len(), |i| values[i]);
    let result: Col<f64> = operator.as_ref() * column.as_ref();
    Ok((0..result.nrows()).map(|i| result[i]).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        measure::MeasureFamily, subset::SubsetEnumerator, types::FixedSet, utils::approx_eq,
    };

    const TOL: f64 = 1e-12;

    fn lambda_measure() -> FuzzyMeasure {
        FuzzyMeasure::lambda(vec![0.4, 0.25, 0.37, 0.2]).unwrap()
    }

    #[test]
    fn test_additive_mobius_lives_on_singletons() {
        let measure = FuzzyMeasure::additive(vec![0.2, 0.1, 0.3, 0.15, 0.25]).unwrap();
        let table = MobiusTable::from_measure(&measure).unwrap();

        assert!(approx_eq(table.get(Subset::from_mask(0b00100)).unwrap(), 0.3, TOL));
        assert!(approx_eq(table.get(Subset::from_mask(0b00101)).unwrap(), 0.0, TOL));
        assert_eq!(table.get(Subset::EMPTY).unwrap(), 0.0);
        assert_eq!(table.additivity_order(1e-9), 1);
    }

    #[test]
    fn test_lambda_pair_coefficient() {
        // m({i, j}) = λ dᵢ dⱼ for a λ-measure
        let measure = lambda_measure();
        let lambda = measure.lambda_parameter().unwrap();
        let m = mobius(&measure, Subset::from_mask(0b0011)).unwrap();
        assert!(approx_eq(m, lambda * 0.4 * 0.25, TOL));
    }

    #[test]
    fn test_single_coefficient_matches_table() {
        let measure = lambda_measure();
        let table = MobiusTable::from_measure(&measure).unwrap();
        for subset in SubsetEnumerator::new(4).iter() {
            let direct = mobius(&measure, subset).unwrap();
            assert!(approx_eq(direct, table.get(subset).unwrap(), TOL), "{subset}");
        }
    }

    #[test]
    fn test_zeta_inverts_mobius() {
        let measure = lambda_measure();
        let table = MobiusTable::from_measure(&measure).unwrap();
        let recovered = table.zeta_table();
        for subset in SubsetEnumerator::new(4).iter() {
            let expected = measure.value(subset).unwrap();
            assert!(approx_eq(zeta(&table, subset).unwrap(), expected, TOL));
            assert!(approx_eq(recovered.get(subset).unwrap(), expected, TOL));
        }
    }

    #[test]
    fn test_dense_operators_agree_with_fast_transforms() {
        let measure = lambda_measure();
        let values = measure.table().unwrap().values().to_vec();
        let fast = MobiusTable::from_measure(&measure).unwrap();

        let dense = apply_operator(&mobius_operator(4).unwrap(), &values).unwrap();
        for (a, b) in dense.iter().zip(fast.coefficients()) {
            assert!(approx_eq(*a, *b, TOL));
        }

        let back = apply_operator(&zeta_operator(4).unwrap(), &dense).unwrap();
        for (a, b) in back.iter().zip(&values) {
            assert!(approx_eq(*a, *b, TOL));
        }

        assert!(matches!(
            apply_operator(&zeta_operator(2).unwrap(), &values),
            Err(FuzzyMeasureError::DimensionMismatch {
                expected: 4,
                actual: 16
            })
        ));
    }

    #[test]
    fn test_operators_are_inverse() {
        let mobius = mobius_operator(3).unwrap();
        let zeta = zeta_operator(3).unwrap();
        let product: Mat<f64> = mobius.as_ref() * zeta.as_ref();
        for i in 0..8 {
            for j in 0..8 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_eq!(product[(i, j)], expected);
            }
        }
    }

    #[test]
    fn test_from_coefficients_and_measure_round_trip() {
        // 2-additive capacity on three elements
        let coefficients = vec![0.0, 0.2, 0.3, 0.1, 0.4, -0.1, 0.1, 0.0];
        let table = MobiusTable::from_coefficients(3, coefficients).unwrap();
        assert_eq!(table.additivity_order(1e-12), 2);

        let set = FixedSet::new(vec![0.0; 3]).unwrap();
        let measure = FuzzyMeasure::from_mobius(set, &table).unwrap();
        assert!(matches!(measure.family(), MeasureFamily::Explicit(_)));
        assert!(approx_eq(measure.value_of(&[0, 1]).unwrap(), 0.6, TOL));
        assert!(approx_eq(measure.value_of(&[0, 2]).unwrap(), 0.5, TOL));

        assert!(MobiusTable::from_coefficients(3, vec![0.0; 4]).is_err());
    }

    #[test]
    fn test_oversized_universes_are_rejected() {
        assert!(matches!(
            MobiusTable::from_coefficients(64, vec![]),
            Err(FuzzyMeasureError::TooManyElements { count: 64, .. })
        ));
        assert!(matches!(
            MobiusTable::from_coefficients(25, vec![]),
            Err(FuzzyMeasureError::TooManyElements { count: 25, .. })
        ));
        assert!(matches!(
            zeta_operator(64),
            Err(FuzzyMeasureError::TooManyElements {
                count: 64,
                limit: MAX_OPERATOR_ELEMENTS
            })
        ));
        assert!(mobius_operator(MAX_OPERATOR_ELEMENTS + 1).is_err());
        assert!(mobius_operator(0).is_ok());
    }

    #[test]
    fn test_from_measure_uses_stored_table() {
        let measure = lambda_measure();
        let stored = measure.mobius_table().unwrap();
        assert_eq!(&MobiusTable::from_measure(&measure).unwrap(), stored);
    }

    #[test]
    fn test_subset_outside_universe() {
        let table = MobiusTable::from_measure(&lambda_measure()).unwrap();
        assert!(matches!(
            zeta(&table, Subset::from_mask(0b10000)),
            Err(FuzzyMeasureError::InvalidElement {
                element: 4,
                size: 4
            })
        ));
        assert!(mobius(&lambda_measure(), Subset::from_mask(0b10000)).is_err());
    }
}
