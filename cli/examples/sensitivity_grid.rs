//! Sensitivity Grid Example
//!
//! Sweeps discount and terminal rates for a flat cash-flow series and prints
//! the resulting table. Pairs with terminal >= discount show as "-".

use rdcf::utils::format_rate;
use rdcf::valuation::{sweep, PercentRange, SweepSeries, ValuationEngine};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    rdcf::init_logger()?;

    let engine = ValuationEngine::default();
    let discount_rates = PercentRange::new(5, 12).fractions();
    let terminal_rates = PercentRange::new(1, 6).fractions();
    let series = [80.0, 90.0, 100.0, 110.0, 120.0];

    let grid = sweep(&engine, SweepSeries::Observed(&series), &discount_rates, &terminal_rates, 5)?;

    println!("📊 Sensitivity over {} years", grid.years);
    print!("{:>8}", "r \\ g");
    for g in &grid.terminal_rates {
        print!("{:>10}", format_rate(*g));
    }
    println!();
    for (r, row) in grid.discount_rates.iter().zip(&grid.rows) {
        print!("{:>8}", format_rate(*r));
        for cell in row {
            match cell.value {
                Some(v) => print!("{:>10.1}", v),
                None => print!("{:>10}", "-"),
            }
        }
        println!();
    }
    println!("\n✅ {} valid cells", grid.valid_cells().count());

    Ok(())
}
