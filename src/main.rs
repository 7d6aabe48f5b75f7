//! Business case CLI
//!
//! Runs a projection or a sensitivity sweep for a business record JSON file

use anyhow::{Context, Result};
use bizcase::projection::{Metrics, ProjectionResult};
use bizcase::scenario::{Evaluation, ScenarioRunner, SensitivityTable};
use bizcase::BusinessRecord;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Cash-flow projections and investment metrics for business cases
#[derive(Parser)]
#[command(name = "bizcase", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Project monthly cash flows and compute metrics
    Project {
        /// Business record JSON file
        record: PathBuf,

        /// Write the period table to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Annual discount rate, overriding financial.interest_rate
        #[arg(long)]
        discount_rate: Option<f64>,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Sweep each driver of the record over its candidate values
    Sensitivity {
        /// Business record JSON file
        record: PathBuf,

        /// Annual discount rate for every candidate, overriding financial.interest_rate
        #[arg(long)]
        discount_rate: Option<f64>,

        /// Print the sweep as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    match Cli::parse().command {
        Commands::Project {
            record,
            csv,
            discount_rate,
            json,
        } => run_project(&record, csv.as_deref(), discount_rate, json),
        Commands::Sensitivity {
            record,
            discount_rate,
            json,
        } => run_sensitivity(&record, discount_rate, json),
    }
}

fn load_runner(path: &Path) -> Result<ScenarioRunner> {
    ScenarioRunner::from_path(path)
        .with_context(|| format!("failed to load business record {}", path.display()))
}

fn run_project(path: &Path, csv_path: Option<&Path>, discount_rate: Option<f64>, json: bool) -> Result<()> {
    let runner = load_runner(path)?;
    let rate = discount_rate.unwrap_or_else(|| runner.record().discount_rate());
    let evaluation = runner.evaluate_at(rate);

    if let Some(csv_path) = csv_path {
        write_csv(csv_path, runner.record(), &evaluation.projection)
            .with_context(|| format!("failed to write {}", csv_path.display()))?;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&evaluation)?);
        return Ok(());
    }

    print_projection(runner.record(), rate, &evaluation);
    if let Some(csv_path) = csv_path {
        println!("\nFull results written to: {}", csv_path.display());
    }
    Ok(())
}

fn run_sensitivity(path: &Path, discount_rate: Option<f64>, json: bool) -> Result<()> {
    let runner = load_runner(path)?;
    let table = match discount_rate {
        Some(rate) => runner.run_sensitivity(&runner.record().drivers, rate),
        None => runner.run_record_sensitivity(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&table)?);
        return Ok(());
    }

    print_sensitivity(runner.record(), &table);
    Ok(())
}

fn write_csv(path: &Path, record: &BusinessRecord, projection: &ProjectionResult) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;

    let mut header: Vec<String> = ["Period", "Year", "MonthInYear"].iter().map(|s| s.to_string()).collect();
    header.extend(record.customers.segments.iter().map(|s| format!("Volume_{}", s.id)));
    header.extend(
        [
            "TotalVolume",
            "Price",
            "RevenueOrBenefit",
            "CostSavingsBenefit",
            "EfficiencyBenefit",
            "COGS",
            "GrossMargin",
            "Opex",
            "Capex",
            "NetCashFlow",
            "CumulativeCashFlow",
        ]
        .iter()
        .map(|s| s.to_string()),
    );
    writer.write_record(&header)?;

    for (row, cumulative) in projection.periods.iter().zip(&projection.cumulative_cash_flow) {
        let mut fields = vec![
            row.period.to_string(),
            row.year.to_string(),
            row.month_in_year.to_string(),
        ];
        fields.extend(row.volume_by_segment.iter().map(|v| format!("{:.6}", v)));
        fields.extend(
            [
                row.total_volume,
                row.price,
                row.revenue_or_benefit,
                row.cost_savings_benefit,
                row.efficiency_benefit,
                row.cogs,
                row.gross_margin(),
                row.opex,
                row.capex,
                row.net_cash_flow,
                *cumulative,
            ]
            .iter()
            .map(|v| format!("{:.6}", v)),
        );
        writer.write_record(&fields)?;
    }

    writer.flush()?;
    Ok(())
}

fn print_metrics(metrics: &Metrics) {
    println!("  NPV: {:.2}", metrics.npv);
    match &metrics.irr {
        Ok(irr) => println!("  IRR: {:.4}%", irr * 100.0),
        Err(err) => println!("  IRR: n/a ({})", err),
    }
    match metrics.payback_period {
        Some(p) => println!("  Payback Period: {}", p),
        None => println!("  Payback Period: never"),
    }
    println!("  Peak Funding Required: {:.2}", metrics.peak_funding_required);
}

fn print_projection(record: &BusinessRecord, rate: f64, evaluation: &Evaluation) {
    println!("{}", record.meta.title);
    println!("Model: {:?}, Periods: {}, Discount Rate: {:.4}\n", record.business_model(), record.meta.periods, rate);

    println!(
        "{:>4} {:>8} {:>16} {:>14} {:>14} {:>14} {:>16} {:>16}",
        "Year", "Periods", "Revenue/Benefit", "COGS", "Opex", "Capex", "Net Cash Flow", "Cumulative"
    );
    for year in evaluation.projection.annual_rollup() {
        println!(
            "{:>4} {:>8} {:>16.2} {:>14.2} {:>14.2} {:>14.2} {:>16.2} {:>16.2}",
            year.year,
            year.periods,
            year.revenue_or_benefit,
            year.cogs,
            year.opex,
            year.capex,
            year.net_cash_flow,
            year.closing_cumulative,
        );
    }

    let summary = evaluation.projection.summary();
    println!("\nSummary:");
    println!("  Total Revenue/Benefit: {:.2}", summary.total_revenue_or_benefit);
    println!("  Total Gross Margin: {:.2}", summary.total_gross_margin);
    println!("  Total Net Cash Flow: {:.2}", summary.total_net_cash_flow);
    println!("  Final Cumulative: {:.2}", summary.final_cumulative);
    print_metrics(&evaluation.metrics);
}

fn print_sensitivity(record: &BusinessRecord, table: &SensitivityTable) {
    println!("{}", record.meta.title);
    println!("\nBase case:");
    print_metrics(&table.base);

    for sweep in &table.sweeps {
        println!("\nDriver '{}' ({})", sweep.key, sweep.path);
        for point in &sweep.points {
            match &point.outcome {
                Ok(m) => println!(
                    "  {:>14.4}  NPV {:>16.2}  IRR {:>10}  Payback {:>6}",
                    point.value,
                    m.npv,
                    m.irr_value().map(|r| format!("{:.2}%", r * 100.0)).unwrap_or_else(|| "n/a".into()),
                    m.payback_period.map(|p| p.to_string()).unwrap_or_else(|| "never".into()),
                ),
                Err(err) => println!("  {:>14.4}  failed: {}", point.value, err),
            }
        }
    }

    println!("\nTornado (NPV swing):");
    for bar in table.tornado() {
        println!(
            "  {:<24} {:>16.2} .. {:<16.2} swing {:.2}",
            bar.key, bar.low_npv, bar.high_npv, bar.swing
        );
    }
}
