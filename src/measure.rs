use crate::{
    error::{FuzzyMeasureError, Result},
    lambda::{Bisection, LambdaSolver, RootFinder},
    mobius::MobiusTable,
    subset::SubsetEnumerator,
    types::{FixedSet, Subset},
    validation::{validate_additive, validate_element, validate_table, validate_unit_densities},
};
use std::{
    fmt::{Debug, Formatter},
    sync::{Arc, OnceLock},
};
use tracing::debug;

#[cfg(feature = "serde")]
use {
    serde::{Deserialize, Serialize},
    tabled::Tabled,
};

#[cfg(feature = "borsh")]
use borsh::{BorshDeserialize, BorshSerialize};

/// Monotone map `[0, 1] -> [0, 1]` applied to the cardinality ratio of a symmetric measure
pub type SymmetricFn = Arc<dyn Fn(f64) -> f64 + Send + Sync>;

/// The family a fuzzy measure belongs to
#[derive(Clone)]
pub enum MeasureFamily {
    /// 1 on subsets containing the element, 0 elsewhere
    Dirac(usize),
    /// Sum of densities; densities must sum to one
    Additive,
    /// `f(|A| / n)`, or the bare ratio without a function
    Symmetric(Option<SymmetricFn>),
    /// Sugeno λ-measure, λ solved from the densities
    Lambda,
    /// Arbitrary capacity given as a value per subset mask
    Explicit(Vec<f64>),
}

impl MeasureFamily {
    /// Symmetric family shaped by `f`, which the caller keeps monotone
    pub fn symmetric<F>(f: F) -> Self
    where
        F: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        MeasureFamily::Symmetric(Some(Arc::new(f)))
    }

    pub fn name(&self) -> &'static str {
        match self {
            MeasureFamily::Dirac(_) => "dirac",
            MeasureFamily::Additive => "additive",
            MeasureFamily::Symmetric(_) => "symmetric",
            MeasureFamily::Lambda => "lambda",
            MeasureFamily::Explicit(_) => "explicit",
        }
    }
}

impl Debug for MeasureFamily {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            MeasureFamily::Dirac(element) => f.debug_tuple("Dirac").field(element).finish(),
            MeasureFamily::Additive => f.write_str("Additive"),
            MeasureFamily::Symmetric(func) => f
                .debug_tuple("Symmetric")
                .field(&func.as_ref().map(|_| "fn"))
                .finish(),
            MeasureFamily::Lambda => f.write_str("Lambda"),
            MeasureFamily::Explicit(values) => f.debug_tuple("Explicit").field(values).finish(),
        }
    }
}

/// A fuzzy measure over a fixed universe
///
/// Immutable once built. For the λ family the parameter is solved at most once
/// and then shared read-only, so a measure can be evaluated from many threads.
/// The full value table and its Möbius transform are derived on first use and
/// kept for the lifetime of the measure.
#[derive(Debug, Clone)]
pub struct FuzzyMeasure {
    set: FixedSet,
    family: MeasureFamily,
    lambda: OnceLock<f64>,
    table: OnceLock<MeasureTable>,
    mobius: OnceLock<MobiusTable>,
}

impl FuzzyMeasure {
    /// Build a measure, solving λ with the default bisection solver when needed
    pub fn new(set: FixedSet, family: MeasureFamily) -> Result<Self> {
        Self::with_solver(set, family, &LambdaSolver::<Bisection>::default())
    }

    /// Build a measure, solving λ with the given solver when needed
    pub fn with_solver<R: RootFinder>(
        set: FixedSet,
        family: MeasureFamily,
        solver: &LambdaSolver<R>,
    ) -> Result<Self> {
        match &family {
            MeasureFamily::Dirac(element) => validate_element(&set, *element)?,
            MeasureFamily::Additive => validate_additive(&set)?,
            MeasureFamily::Symmetric(_) => {}
            MeasureFamily::Lambda => validate_unit_densities(&set)?,
            MeasureFamily::Explicit(values) => validate_table(&set, values)?,
        }

        let measure = Self {
            set,
            family,
            lambda: OnceLock::new(),
            table: OnceLock::new(),
            mobius: OnceLock::new(),
        };
        if matches!(measure.family, MeasureFamily::Lambda) {
            measure.solve(solver)?;
        }
        Ok(measure)
    }

    /// Additive measure from densities summing to one
    pub fn additive(densities: Vec<f64>) -> Result<Self> {
        Self::new(FixedSet::new(densities)?, MeasureFamily::Additive)
    }

    /// λ-fuzzy measure from singleton densities
    pub fn lambda(densities: Vec<f64>) -> Result<Self> {
        Self::new(FixedSet::new(densities)?, MeasureFamily::Lambda)
    }

    /// λ-fuzzy measure whose λ is left unsolved until [`FuzzyMeasure::solve`]
    pub fn deferred_lambda(set: FixedSet) -> Result<Self> {
        validate_unit_densities(&set)?;
        Ok(Self {
            set,
            family: MeasureFamily::Lambda,
            lambda: OnceLock::new(),
            table: OnceLock::new(),
            mobius: OnceLock::new(),
        })
    }

    /// Explicit measure whose values are the zeta transform of a Möbius table
    pub fn from_mobius(set: FixedSet, mobius: &MobiusTable) -> Result<Self> {
        if mobius.n() != set.len() {
            return Err(FuzzyMeasureError::DimensionMismatch {
                expected: set.len(),
                actual: mobius.n(),
            });
        }
        let values = mobius.zeta_table().into_values();
        let measure = Self::new(set, MeasureFamily::Explicit(values))?;
        let _ = measure.mobius.set(mobius.clone());
        Ok(measure)
    }

    /// Solve λ, or return the stored value if already solved
    pub fn solve<R: RootFinder>(&self, solver: &LambdaSolver<R>) -> Result<f64> {
        if !matches!(self.family, MeasureFamily::Lambda) {
            return Err(FuzzyMeasureError::InvariantViolation(format!(
                "the {} family has no lambda parameter",
                self.family.name()
            )));
        }
        if let Some(lambda) = self.lambda.get() {
            return Ok(*lambda);
        }
        let lambda = solver.solve(&self.set)?;
        Ok(*self.lambda.get_or_init(|| lambda))
    }

    /// The solved λ, if this is a solved λ-measure
    pub fn lambda_parameter(&self) -> Option<f64> {
        self.lambda.get().copied()
    }

    pub fn set(&self) -> &FixedSet {
        &self.set
    }

    pub fn family(&self) -> &MeasureFamily {
        &self.family
    }

    /// Number of elements in the universe
    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Measure of a subset
    ///
    /// The empty set is 0 and the universe is 1 for every family; neither goes
    /// through the family formula.
    pub fn value(&self, subset: Subset) -> Result<f64> {
        self.set.check_subset(subset)?;
        let densities = self.set.densities();
        self.bounded_value(subset, subset.elements().map(|idx| densities[idx]))
    }

    /// Measure of the subset made of the given element indices
    pub fn value_of(&self, indices: &[usize]) -> Result<f64> {
        self.value(Subset::from_indices(indices, self.len())?)
    }

    /// Measure of every subset, indexed by mask
    ///
    /// Built on the first call and stored; later calls return the same table.
    pub fn table(&self) -> Result<&MeasureTable> {
        if let Some(table) = self.table.get() {
            return Ok(table);
        }
        let table = self.build_table()?;
        Ok(self.table.get_or_init(|| table))
    }

    /// Möbius coefficients of every subset, derived from [`FuzzyMeasure::table`] and stored
    pub fn mobius_table(&self) -> Result<&MobiusTable> {
        if let Some(mobius) = self.mobius.get() {
            return Ok(mobius);
        }
        let mobius = MobiusTable::from_table(self.table()?);
        Ok(self.mobius.get_or_init(|| mobius))
    }

    fn build_table(&self) -> Result<MeasureTable> {
        let enumerator = SubsetEnumerator::for_set(&self.set);
        debug!(
            family = self.family.name(),
            n = self.len(),
            subsets = enumerator.count(),
            "building measure table"
        );

        let mut values = Vec::with_capacity(enumerator.count());
        let mut failure = None;
        enumerator.scan(&self.set, |subset, selected| {
            match self.bounded_value(subset, selected.iter().copied()) {
                Ok(v) => values.push(v),
                Err(e) => {
                    failure.get_or_insert(e);
                }
            }
        });

        match failure {
            Some(e) => Err(e),
            None => Ok(MeasureTable::from_values(self.len(), values)),
        }
    }

    fn bounded_value<I>(&self, subset: Subset, selected: I) -> Result<f64>
    where
        I: Iterator<Item = f64>,
    {
        // An unsolved λ-measure refuses every subset, boundaries included
        let lambda = match self.family {
            MeasureFamily::Lambda => Some(
                *self
                    .lambda
                    .get()
                    .ok_or(FuzzyMeasureError::NotInitialized)?,
            ),
            _ => None,
        };

        if subset.is_empty() {
            return Ok(0.0);
        }
        if subset == self.set.universe() {
            return Ok(1.0);
        }

        let value = match &self.family {
            MeasureFamily::Dirac(element) => {
                if subset.contains(*element) {
                    1.0
                } else {
                    0.0
                }
            }
            MeasureFamily::Additive => selected.sum(),
            MeasureFamily::Symmetric(f) => {
                let ratio = subset.len() as f64 / self.len() as f64;
                f.as_ref().map_or(ratio, |f| f(ratio))
            }
            MeasureFamily::Lambda => match lambda {
                Some(l) if l != 0.0 => {
                    let product: f64 = selected.map(|d| 1.0 + l * d).product();
                    (product - 1.0) / l
                }
                _ => selected.sum(),
            },
            MeasureFamily::Explicit(values) => values[subset.mask()],
        };
        Ok(value)
    }
}

/// One row of a measure table, for reporting layers
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize, Tabled))]
#[cfg_attr(feature = "borsh", derive(BorshSerialize, BorshDeserialize))]
pub struct SubsetValue {
    pub subset: Subset,
    pub cardinality: usize,
    pub value: f64,
}

/// Values of a set function for all `2^n` subsets, indexed by mask
#[derive(Debug, Clone, PartialEq)]
pub struct MeasureTable {
    n: usize,
    values: Vec<f64>,
}

impl MeasureTable {
    pub(crate) fn from_values(n: usize, values: Vec<f64>) -> Self {
        debug_assert_eq!(values.len(), 1 << n);
        Self { n, values }
    }

    /// Number of elements in the universe
    pub fn n(&self) -> usize {
        self.n
    }

    /// Number of subsets
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, subset: Subset) -> Result<f64> {
        self.values.get(subset.mask()).copied().ok_or_else(|| {
            let outside = subset.mask() & !Subset::full(self.n).mask();
            FuzzyMeasureError::InvalidElement {
                element: outside.trailing_zeros() as usize,
                size: self.n,
            }
        })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    /// Check `A ⊆ B ⇒ μ(A) ≤ μ(B)` within `tolerance`
    pub fn is_monotone(&self, tolerance: f64) -> bool {
        (0..self.values.len()).all(|mask| {
            (0..self.n).all(|element| {
                let bit = 1 << element;
                mask & bit != 0 || self.values[mask] <= self.values[mask | bit] + tolerance
            })
        })
    }

    /// Check `μ(∅) = 0` and `μ(universe) = 1` within `tolerance`
    pub fn is_normalized(&self, tolerance: f64) -> bool {
        let full = self.values.len() - 1;
        self.values[0].abs() <= tolerance
            && (full == 0 || (self.values[full] - 1.0).abs() <= tolerance)
    }

    /// One row per subset, in mask order
    pub fn rows(&self) -> Vec<SubsetValue> {
        self.values
            .iter()
            .enumerate()
            .map(|(mask, &value)| {
                let subset = Subset::from_mask(mask);
                SubsetValue {
                    subset,
                    cardinality: subset.len(),
                    value,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lambda::{Brent, SolverConfig};

    const TOL: f64 = 1e-9;

    fn set(densities: &[f64]) -> FixedSet {
        FixedSet::new(densities.to_vec()).unwrap()
    }

    #[test]
    fn test_dirac() {
        let measure = FuzzyMeasure::new(set(&[0.1, 0.2, 0.3]), MeasureFamily::Dirac(1)).unwrap();
        assert_eq!(measure.value_of(&[1]).unwrap(), 1.0);
        assert_eq!(measure.value_of(&[0, 2]).unwrap(), 0.0);
        assert_eq!(measure.value_of(&[0, 1]).unwrap(), 1.0);

        let err = FuzzyMeasure::new(set(&[0.1, 0.2]), MeasureFamily::Dirac(2)).unwrap_err();
        assert!(matches!(
            err,
            FuzzyMeasureError::InvalidElement {
                element: 2,
                size: 2
            }
        ));
    }

    #[test]
    fn test_additive() {
        let measure = FuzzyMeasure::additive(vec![0.2, 0.1, 0.3, 0.15, 0.25]).unwrap();
        assert_eq!(measure.value_of(&[0, 2]).unwrap(), 0.5);
        assert!((measure.value_of(&[1, 3, 4]).unwrap() - 0.5).abs() < TOL);
        assert_eq!(measure.value(measure.set().universe()).unwrap(), 1.0);

        assert!(matches!(
            FuzzyMeasure::additive(vec![0.2, 0.1]),
            Err(FuzzyMeasureError::InvariantViolation(_))
        ));
    }

    #[test]
    fn test_symmetric() {
        let bare = FuzzyMeasure::new(set(&[0.0; 4]), MeasureFamily::Symmetric(None)).unwrap();
        assert_eq!(bare.value_of(&[0]).unwrap(), 0.25);
        assert_eq!(bare.value_of(&[1, 3]).unwrap(), 0.5);

        let squared =
            FuzzyMeasure::new(set(&[0.0; 4]), MeasureFamily::symmetric(|t| t * t)).unwrap();
        assert_eq!(squared.value_of(&[1, 3]).unwrap(), 0.25);
        assert_eq!(squared.value_of(&[0, 1, 2]).unwrap(), 0.5625);
    }

    #[test]
    fn test_lambda() {
        let measure = FuzzyMeasure::lambda(vec![0.4, 0.25, 0.37, 0.2]).unwrap();
        let lambda = measure.lambda_parameter().unwrap();
        assert!((lambda + 0.4403).abs() < 1e-4);

        // μ({0, 1}) = 0.4 + 0.25 + λ·0.4·0.25
        let expected = 0.65 + lambda * 0.1;
        assert!((measure.value_of(&[0, 1]).unwrap() - expected).abs() < 1e-12);
        assert!((measure.value_of(&[0, 1]).unwrap() - 0.606).abs() < 1e-3);

        // Singletons keep their density
        assert!((measure.value_of(&[2]).unwrap() - 0.37).abs() < 1e-12);
    }

    #[test]
    fn test_lambda_degenerate_is_additive() {
        let measure = FuzzyMeasure::lambda(vec![0.5, 0.3, 0.2]).unwrap();
        assert_eq!(measure.lambda_parameter(), Some(0.0));
        assert_eq!(measure.value_of(&[0, 1]).unwrap(), 0.8);
    }

    #[test]
    fn test_deferred_lambda() {
        let measure = FuzzyMeasure::deferred_lambda(set(&[0.4, 0.25, 0.37, 0.2])).unwrap();
        assert!(matches!(
            measure.value_of(&[0]),
            Err(FuzzyMeasureError::NotInitialized)
        ));
        assert!(matches!(
            measure.value(Subset::EMPTY),
            Err(FuzzyMeasureError::NotInitialized)
        ));
        assert!(matches!(
            measure.table(),
            Err(FuzzyMeasureError::NotInitialized)
        ));

        let solved = measure.solve(&LambdaSolver::<Bisection>::default()).unwrap();
        // Already solved: a different solver does not change the stored value
        let again = measure
            .solve(&LambdaSolver::new(Brent, SolverConfig::default()))
            .unwrap();
        assert_eq!(solved, again);
        assert!(measure.value_of(&[0]).is_ok());
    }

    #[test]
    fn test_solve_on_other_family() {
        let measure = FuzzyMeasure::new(set(&[0.5, 0.5]), MeasureFamily::Symmetric(None)).unwrap();
        assert!(measure.solve(&LambdaSolver::<Bisection>::default()).is_err());
        assert_eq!(measure.lambda_parameter(), None);
    }

    #[test]
    fn test_subset_outside_universe() {
        let measure = FuzzyMeasure::additive(vec![0.5, 0.5]).unwrap();
        assert!(matches!(
            measure.value(Subset::from_mask(0b100)),
            Err(FuzzyMeasureError::InvalidElement { element: 2, .. })
        ));
        assert!(measure.value_of(&[5]).is_err());
    }

    #[test]
    fn test_table_matches_value() {
        let measure = FuzzyMeasure::lambda(vec![0.3, 0.15, 0.05, 0.2]).unwrap();
        let table = measure.table().unwrap();
        assert_eq!(table.len(), 16);
        assert_eq!(table.n(), 4);
        for subset in SubsetEnumerator::new(4).iter() {
            assert_eq!(table.get(subset).unwrap(), measure.value(subset).unwrap());
        }
        assert!(table.is_monotone(TOL));
        assert!(table.is_normalized(TOL));
        assert_eq!(table.values()[0], 0.0);
        assert_eq!(table.values()[15], 1.0);
    }

    #[test]
    fn test_table_get_boundaries_and_outside() {
        let measure = FuzzyMeasure::additive(vec![0.5, 0.25, 0.25]).unwrap();
        let table = measure.table().unwrap();
        assert_eq!(table.get(Subset::EMPTY).unwrap(), 0.0);
        assert_eq!(table.get(Subset::full(3)).unwrap(), 1.0);
        assert!(matches!(
            table.get(Subset::from_mask(0b10_0101)),
            Err(FuzzyMeasureError::InvalidElement {
                element: 5,
                size: 3
            })
        ));

        let empty = FuzzyMeasure::new(set(&[]), MeasureFamily::Symmetric(None)).unwrap();
        assert_eq!(empty.table().unwrap().get(Subset::EMPTY).unwrap(), 0.0);
    }

    #[test]
    fn test_tables_are_stored() {
        let measure = FuzzyMeasure::lambda(vec![0.4, 0.25, 0.37, 0.2]).unwrap();
        let first = measure.table().unwrap();
        let second = measure.table().unwrap();
        assert!(std::ptr::eq(first, second));

        let mobius = measure.mobius_table().unwrap();
        assert!(std::ptr::eq(mobius, measure.mobius_table().unwrap()));
        assert_eq!(mobius, &MobiusTable::from_table(first));

        // Failures are not stored: a deferred measure builds its table once solved
        let deferred = FuzzyMeasure::deferred_lambda(set(&[0.4, 0.25, 0.37, 0.2])).unwrap();
        assert!(deferred.table().is_err());
        deferred.solve(&LambdaSolver::<Bisection>::default()).unwrap();
        assert_eq!(deferred.table().unwrap(), first);
    }

    #[test]
    fn test_table_rows() {
        let measure = FuzzyMeasure::new(set(&[0.0; 2]), MeasureFamily::Symmetric(None)).unwrap();
        let rows = measure.table().unwrap().rows();
        assert_eq!(rows.len(), 4);
        assert_eq!(
            rows[2],
            SubsetValue {
                subset: Subset::from_mask(0b10),
                cardinality: 1,
                value: 0.5,
            }
        );
    }

    #[test]
    fn test_explicit() {
        let values = vec![0.0, 0.1, 0.6, 1.0];
        let measure =
            FuzzyMeasure::new(set(&[0.0, 0.0]), MeasureFamily::Explicit(values.clone())).unwrap();
        assert_eq!(measure.table().unwrap().values(), values.as_slice());

        let not_monotone = vec![0.0, 0.7, 0.2, 0.5, 0.1, 0.8, 0.3, 1.0];
        assert!(FuzzyMeasure::new(set(&[0.0; 3]), MeasureFamily::Explicit(not_monotone)).is_err());
    }

    #[test]
    fn test_empty_universe() {
        let measure = FuzzyMeasure::new(set(&[]), MeasureFamily::Symmetric(None)).unwrap();
        assert_eq!(measure.value(Subset::EMPTY).unwrap(), 0.0);
        assert_eq!(measure.table().unwrap().values(), &[0.0]);
    }

    #[test]
    fn test_measure_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FuzzyMeasure>();
    }
}
