use crate::{
    error::{FuzzyMeasureError, Result},
    types::{FixedSet, MAX_ELEMENTS},
};

/// Tolerance on `Σ d = 1` for additive measures
pub(crate) const ADDITIVE_SUM_TOLERANCE: f64 = 1e-9;

/// Tolerance on boundary values and monotonicity of explicit tables
pub(crate) const TABLE_TOLERANCE: f64 = 1e-9;

/// Check a universe of `n` elements is small enough to enumerate
pub(crate) fn validate_universe_size(n: usize) -> Result<()> {
    if n > MAX_ELEMENTS {
        return Err(FuzzyMeasureError::TooManyElements {
            count: n,
            limit: MAX_ELEMENTS,
        });
    }
    Ok(())
}

/// Check every density lies in `[0, 1]`
pub(crate) fn validate_unit_densities(set: &FixedSet) -> Result<()> {
    for (idx, &d) in set.densities().iter().enumerate() {
        if !(0.0..=1.0).contains(&d) {
            return Err(FuzzyMeasureError::InvariantViolation(format!(
                "density {d} of element {idx} is outside [0, 1]"
            )));
        }
    }
    Ok(())
}

/// Check the densities form a probability distribution
pub(crate) fn validate_additive(set: &FixedSet) -> Result<()> {
    validate_unit_densities(set)?;

    let total = set.total();
    if (total - 1.0).abs() > ADDITIVE_SUM_TOLERANCE {
        return Err(FuzzyMeasureError::InvariantViolation(format!(
            "additive densities sum to {total}, expected 1"
        )));
    }
    Ok(())
}

/// Check an element index belongs to the universe
pub(crate) fn validate_element(set: &FixedSet, element: usize) -> Result<()> {
    if element >= set.len() {
        return Err(FuzzyMeasureError::InvalidElement {
            element,
            size: set.len(),
        });
    }
    Ok(())
}

/// Check an explicit subset table is a normalized, monotone set function
pub(crate) fn validate_table(set: &FixedSet, values: &[f64]) -> Result<()> {
    let n_subsets = set.subset_count();
    if values.len() != n_subsets {
        return Err(FuzzyMeasureError::InvariantViolation(format!(
            "measure table has {} entries, expected {n_subsets}",
            values.len()
        )));
    }

    if let Some((mask, v)) = values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(FuzzyMeasureError::InvariantViolation(format!(
            "measure value {v} of subset {mask:#b} is not finite"
        )));
    }

    if values[0].abs() > TABLE_TOLERANCE {
        return Err(FuzzyMeasureError::InvariantViolation(format!(
            "measure of the empty set is {}, expected 0",
            values[0]
        )));
    }

    let full = n_subsets - 1;
    if full != 0 && (values[full] - 1.0).abs() > TABLE_TOLERANCE {
        return Err(FuzzyMeasureError::InvariantViolation(format!(
            "measure of the universe is {}, expected 1",
            values[full]
        )));
    }

    // Monotone iff adding any single element never decreases the value
    for mask in 0..n_subsets {
        for element in 0..set.len() {
            let bit = 1 << element;
            if mask & bit == 0 && values[mask | bit] + TABLE_TOLERANCE < values[mask] {
                return Err(FuzzyMeasureError::InvariantViolation(format!(
                    "measure is not monotone: subset {:#b} has value {} below subset {mask:#b} with {}",
                    mask | bit,
                    values[mask | bit],
                    values[mask]
                )));
            }
        }
    }

    Ok(())
}
