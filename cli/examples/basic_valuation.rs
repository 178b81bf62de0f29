//! Basic Valuation Example
//!
//! Values a literal cash-flow series with the engine, then runs the full
//! resolve -> fetch -> value pipeline against an in-memory financials source.

use rdcf::prelude::*;
use rdcf::services::InMemoryFinancialsSource;
use std::error::Error;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    rdcf::init_logger()?;

    println!("🚀 Basic Valuation Example");
    println!("{}", "=".repeat(60));

    // Example 1: the engine on its own
    println!("\n📊 Example 1: Engine only");
    let engine = ValuationEngine::default();
    let breakdown = engine.compute_breakdown(&[100.0; 5], 0.10, 0.03, 5)?;
    println!("   Present value of forecast: {:.2}", breakdown.present_value_sum);
    println!("   Discounted terminal value: {:.2}", breakdown.terminal_value);
    println!("   Intrinsic value:           {:.2}", breakdown.total());

    // Example 2: failures are typed, not panics
    println!("\n⚠️  Example 2: Rejected inputs");
    for (series, r, g, years) in [
        (vec![100.0, 100.0], 0.10, 0.03, 5),
        (vec![100.0; 5], 0.05, 0.05, 5),
    ] {
        match compute(&series, r, g, years) {
            Ok(v) => println!("   unexpected value {:.2}", v),
            Err(e) => println!("❌ {} ({})", e.user_message(), e.kind()),
        }
    }

    // Example 3: the full pipeline
    println!("\n📈 Example 3: Resolve and value a company");
    let directory = CompanyDirectory::new(vec![
        Company::new("Infosys", "INFY"),
        Company::new("Tata Consultancy Services", "TCS"),
    ]);
    let mut facts = RawFacts {
        fcf_series: vec![22000.0, 23500.0, 24100.0, 25800.0, 26900.0],
        ..Default::default()
    };
    facts.eps = Some("₹ 61.2".to_string());
    let source = InMemoryFinancialsSource::new().with("INFY", facts);

    let analyzer = AnalyzerBuilder::new()
        .with_directory(Arc::new(directory))
        .with_source(Arc::new(source))
        .build()?;

    for mode in [ValuationMode::FreeCashFlow, ValuationMode::Earnings] {
        match analyzer.value_query("infosys ltd", mode, ValuationParams::default()).await {
            Ok(report) => println!("✅ {} [{}]: {}", report.company.name, mode.display_name(), report.formatted),
            Err(e) => println!("❌ {}", e.user_message()),
        }
    }

    Ok(())
}
