use fuzzy_measure::{
    Bisection, Brent, FixedSet, FuzzyMeasure, Integral, LambdaSolver, MeasureFamily, MobiusTable,
    SolverConfig, Subset, SubsetEnumerator, choquet_mobius, lambda::characteristic, mobius,
    shapley_values, zeta,
};
use proptest::prelude::*;

const TOL: f64 = 1e-9;

fn build_measure(densities: Vec<f64>, kind: u8, element: usize, exponent: f64) -> FuzzyMeasure {
    let family = match kind {
        0 => MeasureFamily::Lambda,
        1 => MeasureFamily::Additive,
        2 => MeasureFamily::symmetric(move |t| t.powf(exponent)),
        _ => MeasureFamily::Dirac(element),
    };
    let densities = if kind == 1 {
        let total: f64 = densities.iter().sum();
        densities.iter().map(|d| d / total).collect()
    } else {
        densities
    };
    FuzzyMeasure::new(FixedSet::new(densities).unwrap(), family).unwrap()
}

fn arb_measure() -> impl Strategy<Value = FuzzyMeasure> {
    (2usize..=6).prop_flat_map(|n| {
        (
            prop::collection::vec(0.05f64..0.95, n),
            0u8..4,
            0..n,
            0.2f64..3.0,
        )
            .prop_map(|(densities, kind, element, exponent)| {
                build_measure(densities, kind, element, exponent)
            })
    })
}

/// Contributions in `[0, 1]`, where all three integrals stay within the contribution range
fn arb_measure_with_contributions() -> impl Strategy<Value = (FuzzyMeasure, Vec<f64>)> {
    arb_measure().prop_flat_map(|measure| {
        let n = measure.len();
        (Just(measure), prop::collection::vec(0.0f64..=1.0, n))
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn boundary_values(measure in arb_measure()) {
        prop_assert_eq!(measure.value(Subset::EMPTY).unwrap(), 0.0);
        prop_assert_eq!(measure.value(measure.set().universe()).unwrap(), 1.0);
    }

    #[test]
    fn monotone_under_inclusion(measure in arb_measure()) {
        let n = measure.len();
        for subset in SubsetEnumerator::new(n).iter() {
            let base = measure.value(subset).unwrap();
            for element in (0..n).filter(|&e| !subset.contains(e)) {
                let larger = measure.value(subset.with(element)).unwrap();
                prop_assert!(
                    base <= larger + TOL,
                    "{} -> {}: {} > {}", subset, subset.with(element), base, larger
                );
            }
        }
    }

    #[test]
    fn lambda_is_stable_and_satisfies_equation(
        densities in prop::collection::vec(0.05f64..0.95, 2..=6)
    ) {
        let set = FixedSet::new(densities.clone()).unwrap();
        let bisection = LambdaSolver::<Bisection>::default();
        let first = bisection.solve(&set).unwrap();
        let second = bisection.solve(&set).unwrap();
        prop_assert_eq!(first, second);

        let brent = LambdaSolver::new(Brent, SolverConfig::default()).solve(&set).unwrap();
        prop_assert!((first - brent).abs() <= 1e-6 * first.abs().max(1.0));

        prop_assert!(characteristic(&densities, first).abs() < 1e-5);
        prop_assert!(first >= -1.0);
    }

    #[test]
    fn mobius_zeta_round_trip(measure in arb_measure()) {
        let table = MobiusTable::from_measure(&measure).unwrap();
        for subset in SubsetEnumerator::new(measure.len()).iter() {
            let expected = measure.value(subset).unwrap();
            prop_assert!((zeta(&table, subset).unwrap() - expected).abs() < TOL);

            let direct = mobius(&measure, subset).unwrap();
            prop_assert!((direct - table.get(subset).unwrap()).abs() < TOL);
        }
    }

    #[test]
    fn integrals_stay_within_contribution_range(
        (measure, contributions) in arb_measure_with_contributions()
    ) {
        let lo = contributions.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = contributions.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        for integral in Integral::ALL {
            let value = integral.evaluate(&measure, &contributions).unwrap();
            prop_assert!(
                lo - TOL <= value && value <= hi + TOL,
                "{} = {} outside [{}, {}]", integral, value, lo, hi
            );
        }
    }

    #[test]
    fn choquet_forms_agree((measure, contributions) in arb_measure_with_contributions()) {
        let table = MobiusTable::from_measure(&measure).unwrap();
        let sorted = Integral::Choquet.evaluate(&measure, &contributions).unwrap();
        let via_mobius = choquet_mobius(&table, &contributions).unwrap();
        prop_assert!((sorted - via_mobius).abs() < TOL);
    }

    #[test]
    fn shapley_efficiency_four_elements(
        densities in prop::collection::vec(0.05f64..0.95, 4),
        kind in 0u8..4,
        element in 0usize..4,
        exponent in 0.2f64..3.0,
    ) {
        let measure = build_measure(densities, kind, element, exponent);
        let total: f64 = shapley_values(&measure).unwrap().iter().sum();
        prop_assert!((total - 1.0).abs() < TOL, "total = {}", total);
    }
}
