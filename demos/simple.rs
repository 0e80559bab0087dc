use fuzzy_measure::{FuzzyMeasure, Index, Integral, MobiusTable, attribution_report, error::Result};

fn main() -> Result<()> {
    // Four criteria with singleton densities summing past one, so λ < 0
    let densities = vec![0.4, 0.25, 0.37, 0.2];
    let measure = FuzzyMeasure::lambda(densities.clone())?;

    if let Some(lambda) = measure.lambda_parameter() {
        println!("lambda = {lambda:.6}");
    }
    println!("mu({{0, 1}}) = {:.6}", measure.value_of(&[0, 1])?);

    let mobius = MobiusTable::from_measure(&measure)?;
    println!("additivity order = {}", mobius.additivity_order(1e-12));

    // Aggregate the densities themselves as contributions
    println!();
    for integral in Integral::ALL {
        let value = integral.evaluate(&measure, &densities)?;
        println!("{:>9}  {value:>9.6}", integral.name());
    }

    println!();
    println!("{:>9}  {:>9}  {:>9}", "Element", "Shapley", "Percent");
    for av in attribution_report(&measure, Index::Shapley)? {
        println!("{:>9}  {:>9.6}  {:>9.2}%", av.element, av.value, av.percent * 100.0);
    }

    Ok(())
}
