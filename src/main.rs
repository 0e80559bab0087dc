use clap::{Parser, ValueEnum};
use fuzzy_measure::{
    AttributionValue, Bisection, Brent, FixedSet, FuzzyMeasure, Index, Integral, LambdaSolver,
    MeasureFamily, SolverConfig, SubsetValue, attribution_report, normalized_entropy,
};
use serde::Serialize;
use std::{process::ExitCode, str::FromStr};
use tabled::{Table, Tabled, settings::Style};
use tracing_subscriber::EnvFilter;

/// Evaluate fuzzy measures, fuzzy integrals and attribution indices
#[derive(Debug, Parser)]
#[command(name = "fuzzy-measure", version)]
struct Cli {
    /// Singleton densities, comma separated
    #[arg(long, value_delimiter = ',', required = true)]
    densities: Vec<f64>,

    /// Measure family: additive, lambda, dirac:<element> or symmetric[:<exponent>]
    #[arg(long, default_value = "lambda")]
    family: FamilyArg,

    /// Contributions to integrate, comma separated
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    contributions: Option<Vec<f64>>,

    /// Root finder used for the lambda family
    #[arg(long, value_enum, default_value_t = Method::Bisection)]
    solver: Method,

    /// Include the value of every subset
    #[arg(long)]
    table: bool,

    /// Print JSON instead of tables
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Method {
    Bisection,
    Brent,
}

#[derive(Debug, Clone, Copy)]
enum FamilyArg {
    Dirac(usize),
    Additive,
    Symmetric(Option<f64>),
    Lambda,
}

impl FromStr for FamilyArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, arg) = match s.split_once(':') {
            Some((name, arg)) => (name, Some(arg)),
            None => (s, None),
        };
        match (name.to_ascii_lowercase().as_str(), arg) {
            ("additive", None) => Ok(FamilyArg::Additive),
            ("lambda", None) => Ok(FamilyArg::Lambda),
            ("dirac", Some(element)) => element
                .parse()
                .map(FamilyArg::Dirac)
                .map_err(|e| format!("invalid dirac element '{element}': {e}")),
            ("symmetric", None) => Ok(FamilyArg::Symmetric(None)),
            ("symmetric", Some(exponent)) => exponent
                .parse()
                .map(|p| FamilyArg::Symmetric(Some(p)))
                .map_err(|e| format!("invalid symmetric exponent '{exponent}': {e}")),
            _ => Err(format!("unknown measure family '{s}'")),
        }
    }
}

impl From<FamilyArg> for MeasureFamily {
    fn from(arg: FamilyArg) -> Self {
        match arg {
            FamilyArg::Dirac(element) => MeasureFamily::Dirac(element),
            FamilyArg::Additive => MeasureFamily::Additive,
            FamilyArg::Symmetric(None) => MeasureFamily::Symmetric(None),
            FamilyArg::Symmetric(Some(p)) => MeasureFamily::symmetric(move |t| t.powf(p)),
            FamilyArg::Lambda => MeasureFamily::Lambda,
        }
    }
}

#[derive(Debug, Serialize, Tabled)]
struct IntegralValue {
    integral: Integral,
    value: f64,
}

#[derive(Debug, Serialize)]
struct Report {
    family: &'static str,
    lambda: Option<f64>,
    integrals: Vec<IntegralValue>,
    shapley: Vec<AttributionValue>,
    banzhaf: Vec<AttributionValue>,
    entropy: Vec<AttributionValue>,
    normalized_entropy: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    table: Option<Vec<SubsetValue>>,
}

fn build_measure(cli: &Cli) -> fuzzy_measure::Result<FuzzyMeasure> {
    let set = FixedSet::new(cli.densities.clone())?;
    let family = MeasureFamily::from(cli.family);
    match cli.solver {
        Method::Bisection => FuzzyMeasure::with_solver(
            set,
            family,
            &LambdaSolver::new(Bisection, SolverConfig::default()),
        ),
        Method::Brent => FuzzyMeasure::with_solver(
            set,
            family,
            &LambdaSolver::new(Brent, SolverConfig::default()),
        ),
    }
}

fn run(cli: &Cli) -> fuzzy_measure::Result<Report> {
    let measure = build_measure(cli)?;

    let integrals = match &cli.contributions {
        Some(contributions) => Integral::ALL
            .into_iter()
            .map(|integral| -> fuzzy_measure::Result<IntegralValue> {
                Ok(IntegralValue {
                    integral,
                    value: integral.evaluate(&measure, contributions)?,
                })
            })
            .collect::<fuzzy_measure::Result<Vec<_>>>()?,
        None => Vec::new(),
    };

    let table = if cli.table {
        Some(measure.table()?.rows())
    } else {
        None
    };

    Ok(Report {
        family: measure.family().name(),
        lambda: measure.lambda_parameter(),
        integrals,
        shapley: attribution_report(&measure, Index::Shapley)?,
        banzhaf: attribution_report(&measure, Index::Banzhaf)?,
        entropy: attribution_report(&measure, Index::Entropy)?,
        normalized_entropy: normalized_entropy(&measure)?,
        table,
    })
}

fn print_tables(report: &Report) {
    println!("family: {}", report.family);
    if let Some(lambda) = report.lambda {
        println!("lambda: {lambda}");
    }

    if !report.integrals.is_empty() {
        println!("\n{}", Table::new(&report.integrals).with(Style::psql()));
    }

    for (name, rows) in [
        ("shapley", &report.shapley),
        ("banzhaf", &report.banzhaf),
        ("entropy", &report.entropy),
    ] {
        println!("\n{name}\n{}", Table::new(rows).with(Style::psql()));
    }
    println!("\nnormalized entropy: {}", report.normalized_entropy);

    if let Some(table) = &report.table {
        println!("\n{}", Table::new(table).with(Style::psql()));
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let report = match run(&cli) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if cli.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing report: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        print_tables(&report);
    }

    ExitCode::SUCCESS
}
