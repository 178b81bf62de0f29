use rdcf::api::AnalyzerBuilder;
use rdcf::error::RdcfError;
use rdcf::models::{ValuationMode, ValuationParams};

#[tokio::main]
async fn main() -> Result<(), RdcfError> {
    println!("Company Valuation Example");
    println!("=========================");

    let analyzer = AnalyzerBuilder::new()
        .with_companies_csv("data/company_list.csv")
        .with_source_dir("data/financials")
        .build()?;

    for query in ["infosys", "Tata Consultancy", "reliance ind", "Unknown Holdings"] {
        println!("\n🏢 {}", query);
        println!("{}", "-".repeat(40));

        let resolved = match analyzer.resolve(query) {
            Ok(resolved) => resolved,
            Err(e) => {
                println!("❌ {}", e.user_message());
                continue;
            }
        };
        println!("✅ Selected Company: {} (score {})", resolved.company.name, resolved.score);

        for mode in [ValuationMode::FreeCashFlow, ValuationMode::Earnings] {
            match analyzer.value(&resolved.company, mode, ValuationParams::default()).await {
                Ok(report) => println!("📈 {}: {}", mode.display_name(), report.formatted),
                Err(e) => println!("❌ {}: {}", mode.display_name(), e.user_message()),
            }
        }
    }

    // Horizons longer than the fetched history are rejected, not padded
    let report = analyzer
        .value_query("Wipro", ValuationMode::FreeCashFlow, ValuationParams::default().with_years(8))
        .await;
    if let Err(e) = report {
        println!("\n⚠️  8-year horizon: {}", e.user_message());
    }

    Ok(())
}
