use crate::{
    error::{FuzzyMeasureError, Result},
    validation::validate_universe_size,
};
use std::fmt::{Display, Formatter};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "borsh")]
use borsh::{BorshDeserialize, BorshSerialize};

/// Largest universe we enumerate subsets for
pub const MAX_ELEMENTS: usize = 24;

/// The universe: one density per element, fixed after construction
#[derive(Debug, Clone, PartialEq)]
pub struct FixedSet {
    densities: Vec<f64>,
}

impl FixedSet {
    /// Create a universe from its singleton densities
    ///
    /// Densities must be finite. Families that need them in `[0, 1]` check that
    /// themselves when a measure is built.
    pub fn new(densities: Vec<f64>) -> Result<Self> {
        validate_universe_size(densities.len())?;
        if let Some((idx, d)) = densities.iter().enumerate().find(|(_, d)| !d.is_finite()) {
            return Err(FuzzyMeasureError::InvariantViolation(format!(
                "density {d} of element {idx} is not finite"
            )));
        }
        Ok(Self { densities })
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.densities.len()
    }

    /// Check if the universe is empty
    pub fn is_empty(&self) -> bool {
        self.densities.is_empty()
    }

    pub fn densities(&self) -> &[f64] {
        &self.densities
    }

    /// Density of a single element
    pub fn density(&self, element: usize) -> Result<f64> {
        self.densities
            .get(element)
            .copied()
            .ok_or(FuzzyMeasureError::InvalidElement {
                element,
                size: self.len(),
            })
    }

    /// Sum of all densities
    pub fn total(&self) -> f64 {
        self.densities.iter().sum()
    }

    /// The subset holding every element
    pub fn universe(&self) -> Subset {
        Subset::full(self.len())
    }

    /// Number of subsets, `2^n`
    pub fn subset_count(&self) -> usize {
        1 << self.len()
    }

    /// Ensure a subset only refers to elements of this universe
    pub fn check_subset(&self, subset: Subset) -> Result<()> {
        let outside = subset.mask() & !self.universe().mask();
        if outside != 0 {
            return Err(FuzzyMeasureError::InvalidElement {
                element: outside.trailing_zeros() as usize,
                size: self.len(),
            });
        }
        Ok(())
    }
}

/// A subset of the universe, bit `i` set when element `i` is selected
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "borsh", derive(BorshSerialize, BorshDeserialize))]
pub struct Subset(usize);

impl Subset {
    pub const EMPTY: Subset = Subset(0);

    pub fn from_mask(mask: usize) -> Self {
        Subset(mask)
    }

    /// Subset holding all `n` elements
    pub fn full(n: usize) -> Self {
        Subset((1 << n) - 1)
    }

    /// Build a subset from element indices of an `n`-element universe
    pub fn from_indices(indices: &[usize], n: usize) -> Result<Self> {
        indices.iter().try_fold(Subset::EMPTY, |acc, &idx| {
            if idx >= n {
                Err(FuzzyMeasureError::InvalidElement {
                    element: idx,
                    size: n,
                })
            } else {
                Ok(acc.with(idx))
            }
        })
    }

    pub fn mask(self) -> usize {
        self.0
    }

    pub fn contains(self, element: usize) -> bool {
        (self.0 >> element) & 1 == 1
    }

    /// Cardinality
    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn with(self, element: usize) -> Self {
        Subset(self.0 | (1 << element))
    }

    pub fn without(self, element: usize) -> Self {
        Subset(self.0 & !(1 << element))
    }

    pub fn is_subset_of(self, other: Subset) -> bool {
        self.0 & other.0 == self.0
    }

    /// Element indices in increasing order
    pub fn elements(self) -> impl Iterator<Item = usize> {
        let mut rest = self.0;
        std::iter::from_fn(move || {
            if rest == 0 {
                return None;
            }
            let idx = rest.trailing_zeros() as usize;
            rest &= rest - 1;
            Some(idx)
        })
    }
}

impl Display for Subset {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, idx) in self.elements().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{idx}")?;
        }
        write!(f, "}}")
    }
}
