//! One analysis run: workbook in, report out. No state outlives the call.

use crate::aggregate::aggregate_vehicles;
use crate::error::Result;
use crate::loader::{load_trips, load_vehicles, LoadReport};
use crate::parameters::read_parameters;
use crate::reports::assemble;
use crate::tours::{infer_period_months, prepare_tours};
use crate::types::AnalysisPayload;
use crate::workbook::{Workbook, TOURS_SHEET, VEHICLES_SHEET};
use tracing::{info, instrument};

#[derive(Debug)]
pub struct AnalysisRun {
    pub payload: AnalysisPayload,
    pub load_report: LoadReport,
}

#[instrument(skip_all)]
pub fn analyse(workbook: &Workbook, default_energy_limit_kwh: f64) -> Result<AnalysisRun> {
    let params = read_parameters(workbook, default_energy_limit_kwh)?;
    let (raw_trips, load_report) = load_trips(workbook.sheet(TOURS_SHEET)?);
    let registry = load_vehicles(workbook.sheet(VEHICLES_SHEET)?);

    let trips = prepare_tours(&raw_trips, &registry, params.energy_limit_kwh);
    let period_months = match params.period_months {
        Some(months) if months > 0.0 => months,
        _ => infer_period_months(&trips),
    };
    info!(
        energy_limit_kwh = params.energy_limit_kwh,
        period_months,
        trips = trips.len(),
        "prepared trips"
    );

    let totals = aggregate_vehicles(&trips);
    let payload = assemble(&params, period_months, &trips, &totals, &registry);
    info!(
        vehicles = payload.total_vehicles,
        both_yes = payload.both_yes_count,
        "assembled report"
    );
    Ok(AnalysisRun { payload, load_report })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Flag, FuelType};
    use crate::workbook::{Cell, Sheet, TCO_SHEET};
    use approx::assert_abs_diff_eq;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    fn tours(limit: Option<f64>, period: Option<f64>) -> Sheet {
        let mut header: Vec<Cell> = ["tourid", "vehicleid", "starttime", "endtime", "mileage", "fuelconsumption"]
            .into_iter()
            .map(text)
            .collect();
        header.resize(31, Cell::Empty);
        header[30] = limit.map_or(Cell::Empty, Cell::Number);

        let trip = |tour: f64, vehicle: f64, start: &str, km: f64, fuel: f64| {
            vec![
                Cell::Number(tour),
                Cell::Number(vehicle),
                text(start),
                Cell::Empty,
                Cell::Number(km),
                Cell::Number(fuel),
            ]
        };
        let mut second = trip(2.0, 1.0, "2024-01-01 14:00", 100.0, 20.0);
        second.resize(33, Cell::Empty);
        second[32] = period.map_or(Cell::Empty, Cell::Number);

        Sheet::new(
            TOURS_SHEET,
            vec![
                header,
                trip(1.0, 1.0, "2024-01-01 08:00", 200.0, 50.0),
                second,
                trip(3.0, 1.0, "2024-01-31 08:00", 100.0, 10.0),
                trip(4.0, 2.0, "2024-01-15 08:00", 150.0, 30.0),
                trip(5.0, 3.0, "2024-01-15 09:00", 80.0, 40.0),
                trip(6.0, 3.0, "garbage", 80.0, 40.0),
            ],
        )
    }

    fn vehicles() -> Sheet {
        Sheet::new(
            VEHICLES_SHEET,
            vec![
                vec![text("vehicleid"), text("licenseno"), text("fueltypes")],
                vec![Cell::Number(1.0), text("D-1"), text("Diesel")],
                vec![Cell::Number(2.0), text("L-2"), text("LNG")],
            ],
        )
    }

    fn tco() -> Sheet {
        let mut rows = vec![vec![Cell::Empty; 4]; 25];
        // vehicle price (row 2) and external fuel price (row 15)
        rows[1] = vec![Cell::Empty, Cell::Number(100_000.0), Cell::Number(120_000.0), Cell::Number(200_000.0)];
        rows[14] = vec![Cell::Empty, Cell::Number(1.5), Cell::Number(1.2), Cell::Number(0.3)];
        Sheet::new(TCO_SHEET, rows)
    }

    #[test]
    fn test_full_run() {
        let wb = Workbook::from_sheets(vec![tours(Some(300.0), None), vehicles(), tco()]);
        let run = analyse(&wb, 1000.0).unwrap();
        let report = &run.payload;

        assert_eq!(run.load_report.loaded_rows, 6);
        assert_eq!(report.energy_limit_kwh, 300.0);
        // 2024-01-01 .. 2024-01-31 spans 30 days
        assert_abs_diff_eq!(report.period_months, 1.0);
        assert_eq!(report.total_tours, 5);
        assert_eq!(report.total_vehicles, 3);
        assert_eq!(report.start_date, "2024-01-01");
        assert_eq!(report.end_date, "2024-01-31");
        assert_abs_diff_eq!(report.total_mileage, 630.0);

        let v1 = &report.vehicles[0];
        assert_eq!(v1.fuel_type, FuelType::Diesel);
        assert_eq!(v1.feasible_days, 1);
        assert_eq!(v1.infeasible_days, 1);
        assert_eq!(v1.feasibility_flag, Flag::No);

        let v3 = &report.vehicles[2];
        assert_eq!(v3.fuel_type, FuelType::Unknown);
        assert_eq!(v3.total_energy_kwh, 0.0);
        assert_eq!(v3.economy_per_year, 0.0);
        assert_eq!(v3.combined_flag, Flag::Yes);

        for v in &report.vehicles {
            assert_eq!(v.total_days, v.feasible_days + v.infeasible_days);
            assert_eq!(v.cost_efficiency_flag.is_yes(), v.economy_per_year >= 0.0);
        }
        assert_eq!(
            report.feasibility_breakdown.yes + report.feasibility_breakdown.no,
            report.total_vehicles
        );
        assert_eq!(report.daily_trend.len(), 3);
        assert!(report.ai_summary.is_none());
    }

    #[test]
    fn test_stated_period_and_default_limit() {
        let wb = Workbook::from_sheets(vec![tours(None, Some(6.0)), vehicles(), tco()]);
        let report = analyse(&wb, 1000.0).unwrap().payload;
        assert_eq!(report.energy_limit_kwh, 1000.0);
        assert_eq!(report.period_months, 6.0);
        assert_abs_diff_eq!(report.vehicles[0].annual_mileage, 400.0 * 2.0);
        assert_eq!(report.vehicles[0].feasibility_flag, Flag::Yes);
    }

    #[test]
    fn test_report_serializes_expected_keys() {
        let wb = Workbook::from_sheets(vec![tours(Some(300.0), None), vehicles(), tco()]);
        let report = analyse(&wb, 1000.0).unwrap().payload;
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["vehicles"][0]["vehicleid"], 1);
        assert_eq!(json["vehicles"][0]["fueltypes"], "diesel");
        assert_eq!(json["vehicles"][0]["both"], "no");
        assert!(json["feasibility_breakdown"]["yes"].is_u64());
        assert!(json["tco_parameters"]["bev"]["vehicle_price"].is_f64());
        assert!(json["economy_extremes"]["top_savers"].is_array());
        assert!(json["ai_summary"].is_null());
    }
}
