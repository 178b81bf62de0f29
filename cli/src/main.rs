use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use rdcf::{
    api::{AnalyzerBuilder, SensitivityReport, ValuationAnalyzer},
    config::Settings,
    error::RdcfError,
    init_logger,
    models::{ValuationMode, ValuationParams, ValuationReport},
    services::InMemoryFinancialsSource,
    utils::{format_rate, format_value},
    valuation::ValuationEngine,
};

#[derive(Parser)]
#[command(name = "rdcf")]
#[command(about = "Reverse DCF valuation from free cash flow or earnings")]
pub struct Cli {
    /// YAML settings file overriding the built-in defaults
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone)]
pub struct RateArgs {
    /// Discount rate as a fraction (e.g. 0.10)
    #[arg(short, long, allow_hyphen_values = true)]
    pub discount_rate: Option<f64>,
    /// Terminal growth rate as a fraction (e.g. 0.03)
    #[arg(short, long, allow_hyphen_values = true)]
    pub terminal_rate: Option<f64>,
    /// Forecast horizon in years
    #[arg(short, long)]
    pub years: Option<usize>,
}

impl RateArgs {
    fn resolve(&self, defaults: ValuationParams) -> ValuationParams {
        ValuationParams::new(
            self.discount_rate.unwrap_or(defaults.discount_rate),
            self.terminal_rate.unwrap_or(defaults.terminal_rate),
            self.years.unwrap_or(defaults.years),
        )
    }
}

#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Company list CSV with a name,slug header
    #[arg(long, default_value = "data/company_list.csv")]
    pub companies: PathBuf,
    /// Directory of <identifier>.json financials
    #[arg(long, conflicts_with = "source_url")]
    pub source_dir: Option<PathBuf>,
    /// Financials URL template; {id} is replaced by the company identifier
    #[arg(long)]
    pub source_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Value a series given on the command line
    Compute {
        /// Comma-separated values, oldest first
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true, required = true)]
        series: Vec<f64>,
        #[command(flatten)]
        rates: RateArgs,
        /// Unit label printed after the value
        #[arg(long, default_value = "")]
        unit: String,
    },
    /// Find the best-matching company for a name
    Resolve {
        query: String,
        #[arg(long, default_value = "data/company_list.csv")]
        companies: PathBuf,
    },
    /// Resolve a company, fetch its financials and value it
    Value {
        query: String,
        /// fcf or earnings
        #[arg(short, long, default_value = "fcf")]
        mode: ValuationMode,
        #[command(flatten)]
        rates: RateArgs,
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Value a company over the configured discount and terminal rate ranges
    Grid {
        query: String,
        #[arg(short, long, default_value = "fcf")]
        mode: ValuationMode,
        #[arg(short, long)]
        years: Option<usize>,
        #[command(flatten)]
        source: SourceArgs,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    init_logger()?;

    let cli = Cli::parse();
    let settings = match &cli.config {
        Some(path) => Settings::from_yaml_file(path)?,
        None => Settings::default(),
    };

    let outcome = run(cli.command, settings).await;
    match outcome {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            tracing::debug!(error = %e, kind = e.kind(), "Command failed");
            eprintln!("❌ {}", e.user_message());
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn run(command: Commands, settings: Settings) -> Result<(), RdcfError> {
    match command {
        Commands::Compute { series, rates, unit } => {
            let params = rates.resolve(settings.defaults);
            let engine = ValuationEngine::new(settings.assumptions);
            let breakdown = engine.compute_breakdown(
                &series,
                params.discount_rate,
                params.terminal_rate,
                params.years,
            )?;

            println!(
                "📊 Reverse DCF ({} periods, r={}, g={}, {} years)",
                series.len(),
                format_rate(params.discount_rate),
                format_rate(params.terminal_rate),
                params.years
            );
            println!(
                "   Present value of forecast: {}",
                format_value(breakdown.present_value_sum, &unit)
            );
            println!(
                "   Discounted terminal value: {}",
                format_value(breakdown.terminal_value, &unit)
            );
            println!("📈 Intrinsic Value: {}", format_value(breakdown.total(), &unit));
        }
        Commands::Resolve { query, companies } => {
            let analyzer = AnalyzerBuilder::new()
                .with_settings(settings)
                .with_companies_csv(companies)
                .with_source(Arc::new(InMemoryFinancialsSource::new()))
                .build()?;
            let resolved = analyzer.resolve(&query)?;
            println!(
                "✅ Selected Company: {} ({}), score {}",
                resolved.company.name, resolved.company.identifier, resolved.score
            );
        }
        Commands::Value {
            query,
            mode,
            rates,
            source,
        } => {
            let params = rates.resolve(settings.defaults);
            let analyzer = build_analyzer(settings, source)?;
            let resolved = analyzer.resolve(&query)?;
            println!("✅ Selected Company: {}", resolved.company.name);

            let report = analyzer.value(&resolved.company, mode, params).await?;
            print_report(&report);
        }
        Commands::Grid {
            query,
            mode,
            years,
            source,
        } => {
            let years = years.unwrap_or(settings.defaults.years);
            let analyzer = build_analyzer(settings, source)?;
            let resolved = analyzer.resolve(&query)?;
            println!("✅ Selected Company: {}", resolved.company.name);

            let report = analyzer.sensitivity(&resolved.company, mode, years).await?;
            print_grid(&report);
        }
    }

    Ok(())
}

fn build_analyzer(settings: Settings, source: SourceArgs) -> Result<ValuationAnalyzer, RdcfError> {
    let mut builder = AnalyzerBuilder::new()
        .with_settings(settings)
        .with_companies_csv(source.companies);
    if let Some(url) = source.source_url {
        builder = builder.with_source_url(url);
    }
    let dir = source
        .source_dir
        .unwrap_or_else(|| PathBuf::from("data/financials"));
    builder = builder.with_source_dir(dir);
    builder.build()
}

fn print_report(report: &ValuationReport) {
    println!("📑 Series ({}): {:?}", report.mode.display_name(), report.series);
    println!(
        "   r={} g={} years={}",
        format_rate(report.params.discount_rate),
        format_rate(report.params.terminal_rate),
        report.params.years
    );
    println!(
        "   Present value of forecast: {}",
        format_value(report.breakdown.present_value_sum, &report.unit)
    );
    println!(
        "   Discounted terminal value: {}",
        format_value(report.breakdown.terminal_value, &report.unit)
    );
    let label = match report.mode {
        ValuationMode::FreeCashFlow => "FCF",
        ValuationMode::Earnings => "Earnings",
    };
    println!("📈 Intrinsic Value ({}): {}", label, report.formatted);
}

fn print_grid(report: &SensitivityReport) {
    let grid = &report.grid;
    println!(
        "📊 Sensitivity ({}, {} years, unit {})",
        report.mode.display_name(),
        grid.years,
        report.unit
    );

    print!("{:>8}", "r \\ g");
    for g in &grid.terminal_rates {
        print!("{:>12}", format_rate(*g));
    }
    println!();

    for (r, row) in grid.discount_rates.iter().zip(&grid.rows) {
        print!("{:>8}", format_rate(*r));
        for cell in row {
            match cell.value {
                Some(v) => print!("{:>12.2}", v),
                None => print!("{:>12}", "-"),
            }
        }
        println!();
    }
}
