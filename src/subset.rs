//! Subset enumeration over a fixed universe.
//!
//! Subsets are identified by their bitmask, so enumerating the power set is an
//! index range `0..2^n`. Element values for a subset are decomposed into a
//! caller-owned scratch buffer rather than a fresh allocation per subset.

use crate::types::{FixedSet, MAX_ELEMENTS, Subset};

/// Enumerates all `2^n` subsets of an `n`-element universe
#[derive(Debug, Clone, Copy)]
pub struct SubsetEnumerator {
    n: usize,
}

impl SubsetEnumerator {
    /// Enumerator for an `n`-element universe
    ///
    /// # Panics
    ///
    /// Panics if `n` exceeds [`MAX_ELEMENTS`]. A [`FixedSet`] never does, so
    /// [`SubsetEnumerator::for_set`] cannot panic.
    pub fn new(n: usize) -> Self {
        assert!(
            n <= MAX_ELEMENTS,
            "cannot enumerate subsets of {n} elements, the limit is {MAX_ELEMENTS}"
        );
        Self { n }
    }

    pub fn for_set(set: &FixedSet) -> Self {
        Self::new(set.len())
    }

    /// Number of subsets
    pub fn count(&self) -> usize {
        1 << self.n
    }

    /// Lazy iteration over every subset in mask order
    pub fn iter(&self) -> impl Iterator<Item = Subset> + use<> {
        (0..self.count()).map(Subset::from_mask)
    }

    /// Subsets that do not contain `element`
    pub fn without(&self, element: usize) -> impl Iterator<Item = Subset> + use<> {
        self.iter().filter(move |s| !s.contains(element))
    }

    /// Visit every subset together with its selected densities
    ///
    /// The slice handed to `visit` lives in a single scratch buffer that is
    /// reused across subsets.
    pub fn scan<F>(&self, set: &FixedSet, mut visit: F)
    where
        F: FnMut(Subset, &[f64]),
    {
        let densities = set.densities();
        let mut scratch = Vec::with_capacity(self.n);
        for subset in self.iter() {
            scratch.clear();
            scratch.extend(subset.elements().map(|idx| densities[idx]));
            visit(subset, &scratch);
        }
    }
}

/// Iterate `(subset, densities)` pairs, allocating the density vector per subset
pub fn enumerate(set: &FixedSet) -> impl Iterator<Item = (Subset, Vec<f64>)> + '_ {
    SubsetEnumerator::for_set(set).iter().map(move |subset| {
        let values = subset
            .elements()
            .map(|idx| set.densities()[idx])
            .collect();
        (subset, values)
    })
}

/// All subsets of a given subset, from the subset itself down to the empty set
#[derive(Debug, Clone)]
pub struct Submasks {
    of: usize,
    next: Option<usize>,
}

impl Submasks {
    pub fn new(of: Subset) -> Self {
        Self {
            of: of.mask(),
            next: Some(of.mask()),
        }
    }
}

impl Iterator for Submasks {
    type Item = Subset;

    fn next(&mut self) -> Option<Subset> {
        let current = self.next?;
        self.next = if current == 0 {
            None
        } else {
            Some((current - 1) & self.of)
        };
        Some(Subset::from_mask(current))
    }
}
