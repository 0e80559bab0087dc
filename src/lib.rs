//! Fuzzy measure and fuzzy integral library
//!
//! This library builds fuzzy measures (Dirac, additive, symmetric, Sugeno λ and
//! explicit capacities) over a finite universe of weighted elements, converts them
//! to and from their Möbius representation, aggregates contribution vectors with
//! the Choquet, Sugeno and Shilkret integrals, and attributes the measure to its
//! elements through Shapley, Banzhaf and entropy indices.

pub mod attribution;
pub mod error;
pub mod integral;
pub mod lambda;
pub mod measure;
pub mod mobius;
pub mod subset;
pub mod types;
pub mod utils;
mod validation;

// Re-export main types and functions
pub use attribution::{
    AttributionValue, Index, attribution_report, banzhaf_value, banzhaf_values, entropy_value,
    entropy_values, normalized_entropy, shapley_value, shapley_values,
};
pub use error::{FuzzyMeasureError, Result};
pub use integral::{Integral, choquet, choquet_mobius, shilkret, sugeno};
pub use lambda::{
    Bisection, Bracket, Brent, LambdaSolver, RootFinder, SolverConfig, SolverConfigBuilder,
};
pub use measure::{FuzzyMeasure, MeasureFamily, MeasureTable, SubsetValue, SymmetricFn};
pub use mobius::{MobiusTable, mobius, zeta};
pub use subset::{Submasks, SubsetEnumerator};
pub use types::{FixedSet, MAX_ELEMENTS, Subset};
