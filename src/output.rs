use crate::error::Result;
use crate::types::{VehicleAnalysis, VehiclePreviewRow};
use crate::util::{format_int, format_number};
use serde::Serialize;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

impl From<&VehicleAnalysis> for VehiclePreviewRow {
    fn from(v: &VehicleAnalysis) -> Self {
        Self {
            vehicle_id: v.vehicle_id,
            license_no: v.license_no.clone().unwrap_or_else(|| "-".to_string()),
            fuel_type: v.fuel_type,
            tour_count: v.tour_count,
            days: format!("{}/{}", format_int(v.feasible_days), format_int(v.total_days)),
            annual_mileage: format_number(v.annual_mileage, 0),
            cost_bev: format_number(v.cost_bev, 2),
            economy_per_year: format_number(v.economy_per_year, 2),
            combined_flag: v.combined_flag,
        }
    }
}

/// Markdown rendering of the first `max_rows` rows, or `None` when there is
/// nothing to show.
pub fn render_table<T>(rows: &[T], max_rows: usize) -> Option<String>
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        return None;
    }
    Some(Table::new(slice).with(Style::markdown()).to_string())
}

pub fn preview_table<T>(title: &str, note: Option<&str>, rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("{}", title);
    if let Some(n) = note {
        println!("({})", n);
    }
    println!();
    match render_table(rows, max_rows) {
        Some(table) => println!("{}\n", table),
        None => println!("(no rows)\n"),
    }
}
