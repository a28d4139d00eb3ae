// Entry point: analyse one fleet workbook and write the JSON report.
//
// - Reads the workbook (xlsx or a directory of CSV sheets),
// - runs the analysis and optionally asks the model for a summary,
// - writes `report.json` (and the vehicle CSV when asked for),
// - and prints Markdown previews of the main tables to the console.
mod aggregate;
mod analysis;
mod cli;
mod cost;
mod error;
mod loader;
mod output;
mod parameters;
mod reports;
mod summary;
mod tours;
mod types;
mod util;
mod workbook;

use anyhow::Context;
use clap::{crate_version, Parser};
use cli::Args;
use summary::{attach_summary, GeminiSummary};
use tracing::info;
use types::{AnalysisPayload, VehiclePreviewRow};
use workbook::Workbook;

fn print_previews(report: &AnalysisPayload, max_rows: usize) {
    let vehicles: Vec<VehiclePreviewRow> = report.vehicles.iter().map(VehiclePreviewRow::from).collect();
    output::preview_table(
        "Vehicle BEV Feasibility and Cost",
        Some("Sorted by vehicle id"),
        &vehicles,
        max_rows,
    );
    output::preview_table("Fuel Type Summary", None, &report.fuel_summary, max_rows);
    let recent = &report.daily_trend[report.daily_trend.len().saturating_sub(max_rows)..];
    output::preview_table("Daily Trend", Some("Most recent days"), recent, max_rows);
}

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().without_time().compact().init();
    info!(version = crate_version!(), "starting…");

    let args = Args::parse();

    let workbook = Workbook::open(&args.workbook)
        .with_context(|| format!("failed to open workbook `{}`", args.workbook.display()))?;
    let run = analysis::analyse(&workbook, args.default_energy_limit_kwh).context("analysis failed")?;
    let mut report = run.payload;

    let load = &run.load_report;
    println!(
        "Processing workbook... ({} trips loaded of {} rows)",
        util::format_int(load.loaded_rows),
        util::format_int(load.total_rows)
    );
    if load.missing_vehicle_id > 0 {
        println!(
            "Note: {} rows skipped for a missing vehicle id.",
            util::format_int(load.missing_vehicle_id)
        );
    }
    if !load.missing_columns.is_empty() {
        println!("Note: missing columns {}.", load.missing_columns.join(", "));
    }
    println!();

    if args.ai.enabled {
        let generator = GeminiSummary::new(args.ai.api_key.clone(), args.ai.model.clone(), args.ai.timeout());
        attach_summary(&mut report, &generator);
    }

    print_previews(&report, args.preview_rows);

    output::write_json(&args.output, &report)
        .with_context(|| format!("failed to write `{}`", args.output.display()))?;
    println!("(Full report exported to {})", args.output.display());
    if let Some(path) = &args.vehicles_csv {
        output::write_csv(path, &report.vehicles)
            .with_context(|| format!("failed to write `{}`", path.display()))?;
        println!("(Vehicle table exported to {})", path.display());
    }

    println!(
        "\nSummary: {} vehicles, {} tours, {} km, BEV feasible {}/{}, cost-efficient {}, both {}",
        util::format_int(report.total_vehicles),
        util::format_int(report.total_tours),
        util::format_number(report.total_mileage, 0),
        util::format_int(report.feasibility_breakdown.yes),
        util::format_int(report.total_vehicles),
        util::format_int(report.cost_efficiency_breakdown.yes),
        util::format_int(report.both_yes_count),
    );
    if let Some(summary) = &report.ai_summary {
        println!("\n{}", summary.headline);
        for bullet in &summary.bullets {
            println!("- {}", bullet);
        }
    }
    Ok(())
}
