//! Solving for the λ parameter of a Sugeno λ-fuzzy measure.
//!
//! λ is the non-zero root of `g(λ) = ∏(1 + λ dᵢ) − λ − 1` on `[−1, 0) ∪ (0, ∞)`.
//! The sign of `1 − Σ dᵢ` picks the half line holding the root, and `g` is
//! monotone there, so a sign-change bracket always exists once found. The
//! degenerate case `Σ dᵢ = 1` has `λ = 0` and never reaches the root finder.

use crate::{
    error::{FuzzyMeasureError, Result},
    types::FixedSet,
    validation::validate_unit_densities,
};
use derive_builder::Builder;
use tracing::{debug, trace, warn};

/// Distance from zero of the inner bracket endpoint
const INNER_ENDPOINT: f64 = 1e-12;

pub const DEFAULT_TOLERANCE: f64 = 1e-12;
pub const DEFAULT_MAX_ITERATIONS: usize = 200;
pub const DEFAULT_VERIFY_TOLERANCE: f64 = 1e-5;
pub const DEFAULT_DEGENERATE_TOLERANCE: f64 = 1e-9;
pub const DEFAULT_MAX_BRACKET_EXPANSIONS: usize = 64;

/// Interval whose endpoints give opposite signs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bracket {
    pub lower: f64,
    pub upper: f64,
}

/// Strategy for locating a root of a scalar function inside a bracket
pub trait RootFinder {
    fn find_root(
        &self,
        f: &dyn Fn(f64) -> f64,
        bracket: Bracket,
        tolerance: f64,
        max_iterations: usize,
    ) -> Result<f64>;
}

/// Interval halving on sign change
#[derive(Debug, Clone, Copy, Default)]
pub struct Bisection;

impl RootFinder for Bisection {
    fn find_root(
        &self,
        f: &dyn Fn(f64) -> f64,
        bracket: Bracket,
        tolerance: f64,
        max_iterations: usize,
    ) -> Result<f64> {
        let (mut a, mut b) = (bracket.lower, bracket.upper);
        let mut fa = f(a);
        let fb = f(b);

        if fa == 0.0 {
            return Ok(a);
        }
        if fb == 0.0 {
            return Ok(b);
        }
        if fa.signum() == fb.signum() {
            return Err(FuzzyMeasureError::NoConvergence {
                iterations: 0,
                residual: fa.abs().min(fb.abs()),
            });
        }

        for iteration in 0..max_iterations {
            let mid = 0.5 * (a + b);
            let fm = f(mid);
            trace!(iteration, mid, fm, "bisection step");

            if fm == 0.0 || 0.5 * (b - a) <= tolerance * mid.abs().max(1.0) {
                return Ok(mid);
            }
            if fm.signum() == fa.signum() {
                a = mid;
                fa = fm;
            } else {
                b = mid;
            }
        }

        Err(FuzzyMeasureError::NoConvergence {
            iterations: max_iterations,
            residual: f(0.5 * (a + b)).abs(),
        })
    }
}

/// Brent's method: inverse quadratic interpolation guarded by bisection
#[derive(Debug, Clone, Copy, Default)]
pub struct Brent;

impl RootFinder for Brent {
    fn find_root(
        &self,
        f: &dyn Fn(f64) -> f64,
        bracket: Bracket,
        tolerance: f64,
        max_iterations: usize,
    ) -> Result<f64> {
        let (mut a, mut b) = (bracket.lower, bracket.upper);
        let (mut fa, mut fb) = (f(a), f(b));

        if fa == 0.0 {
            return Ok(a);
        }
        if fb == 0.0 {
            return Ok(b);
        }
        if fa.signum() == fb.signum() {
            return Err(FuzzyMeasureError::NoConvergence {
                iterations: 0,
                residual: fa.abs().min(fb.abs()),
            });
        }

        let (mut c, mut fc) = (b, fb);
        let mut d = b - a;
        let mut e = d;

        for iteration in 0..max_iterations {
            // Keep the root between b and c
            if fb.signum() == fc.signum() {
                c = a;
                fc = fa;
                d = b - a;
                e = d;
            }
            // b is the best estimate so far
            if fc.abs() < fb.abs() {
                a = b;
                b = c;
                c = a;
                fa = fb;
                fb = fc;
                fc = fa;
            }

            let tol = 2.0 * f64::EPSILON * b.abs() + 0.5 * tolerance;
            let xm = 0.5 * (c - b);
            trace!(iteration, b, fb, "brent step");

            if xm.abs() <= tol || fb == 0.0 {
                return Ok(b);
            }

            if e.abs() >= tol && fa.abs() > fb.abs() {
                let s = fb / fa;
                let (mut p, mut q) = if a == c {
                    (2.0 * xm * s, 1.0 - s)
                } else {
                    let qa = fa / fc;
                    let r = fb / fc;
                    (
                        s * (2.0 * xm * qa * (qa - r) - (b - a) * (r - 1.0)),
                        (qa - 1.0) * (r - 1.0) * (s - 1.0),
                    )
                };
                if p > 0.0 {
                    q = -q;
                }
                p = p.abs();

                let min1 = 3.0 * xm * q - (tol * q).abs();
                let min2 = (e * q).abs();
                if 2.0 * p < min1.min(min2) {
                    e = d;
                    d = p / q;
                } else {
                    d = xm;
                    e = d;
                }
            } else {
                d = xm;
                e = d;
            }

            a = b;
            fa = fb;
            b += if d.abs() > tol { d } else { tol.copysign(xm) };
            fb = f(b);
        }

        Err(FuzzyMeasureError::NoConvergence {
            iterations: max_iterations,
            residual: fb.abs(),
        })
    }
}

/// Budget and tolerances for the λ solve
#[derive(Debug, Clone, Copy, PartialEq, Builder)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct SolverConfig {
    /// Relative bracket width at which the root finder stops
    #[builder(default = "DEFAULT_TOLERANCE")]
    pub tolerance: f64,
    #[builder(default = "DEFAULT_MAX_ITERATIONS")]
    pub max_iterations: usize,
    /// Largest `|g(λ)|` accepted when substituting the root back
    #[builder(default = "DEFAULT_VERIFY_TOLERANCE")]
    pub verify_tolerance: f64,
    /// `|Σ d − 1|` below which λ is taken to be exactly zero
    #[builder(default = "DEFAULT_DEGENERATE_TOLERANCE")]
    pub degenerate_tolerance: f64,
    /// Doublings allowed while searching an upper bracket on `(0, ∞)`
    #[builder(default = "DEFAULT_MAX_BRACKET_EXPANSIONS")]
    pub max_bracket_expansions: usize,
}

impl SolverConfigBuilder {
    fn validate(&self) -> std::result::Result<(), String> {
        let positive = [
            ("tolerance", self.tolerance),
            ("verify_tolerance", self.verify_tolerance),
            ("degenerate_tolerance", self.degenerate_tolerance),
        ];
        for (name, value) in positive {
            if let Some(v) = value {
                if !(v.is_finite() && v > 0.0) {
                    return Err(format!("{name} must be a positive finite number, got {v}"));
                }
            }
        }
        if self.max_iterations == Some(0) {
            return Err("max_iterations must be at least 1".to_string());
        }
        Ok(())
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            verify_tolerance: DEFAULT_VERIFY_TOLERANCE,
            degenerate_tolerance: DEFAULT_DEGENERATE_TOLERANCE,
            max_bracket_expansions: DEFAULT_MAX_BRACKET_EXPANSIONS,
        }
    }
}

/// The characteristic function `g(λ) = ∏(1 + λ dᵢ) − λ − 1`
///
/// Evaluated through `ln_1p`/`exp_m1` so the sign stays reliable close to zero.
pub fn characteristic(densities: &[f64], lambda: f64) -> f64 {
    let log_product: f64 = densities.iter().map(|d| (lambda * d).ln_1p()).sum();
    log_product.exp_m1() - lambda
}

/// Finds λ for a density vector using a pluggable root finder
#[derive(Debug, Clone, Default)]
pub struct LambdaSolver<R = Bisection> {
    finder: R,
    config: SolverConfig,
}

impl<R: RootFinder> LambdaSolver<R> {
    pub fn new(finder: R, config: SolverConfig) -> Self {
        Self { finder, config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Solve `∏(1 + λ dᵢ) = 1 + λ` for the densities of `set`
    pub fn solve(&self, set: &FixedSet) -> Result<f64> {
        validate_unit_densities(set)?;

        let densities = set.densities();
        let total = set.total();
        if (total - 1.0).abs() <= self.config.degenerate_tolerance {
            debug!(total, "densities sum to one, lambda is zero");
            return Ok(0.0);
        }

        let g = |lambda: f64| characteristic(densities, lambda);
        let bracket = if total > 1.0 {
            Bracket {
                lower: -1.0,
                upper: -INNER_ENDPOINT,
            }
        } else {
            self.upper_bracket(&g)?
        };
        debug!(total, ?bracket, "solving for lambda");

        let lambda = self.finder.find_root(
            &g,
            bracket,
            self.config.tolerance,
            self.config.max_iterations,
        )?;

        let residual = g(lambda).abs();
        if !residual.is_finite() || residual > self.config.verify_tolerance {
            warn!(lambda, residual, "lambda does not satisfy its equation");
            return Err(FuzzyMeasureError::NoConvergence {
                iterations: self.config.max_iterations,
                residual,
            });
        }

        debug!(lambda, residual, "lambda solved");
        Ok(lambda)
    }

    /// Double the upper endpoint until `g` turns positive
    fn upper_bracket(&self, g: &dyn Fn(f64) -> f64) -> Result<Bracket> {
        let mut upper = 1.0;
        for _ in 0..self.config.max_bracket_expansions {
            if g(upper) > 0.0 {
                return Ok(Bracket {
                    lower: INNER_ENDPOINT,
                    upper,
                });
            }
            upper *= 2.0;
        }

        warn!(upper, "no sign change found for lambda on (0, inf)");
        Err(FuzzyMeasureError::NoConvergence {
            iterations: self.config.max_bracket_expansions,
            residual: g(upper).abs(),
        })
    }
}
