//! Trip preparation: timestamp parsing, energy estimation and per-trip /
//! per-day feasibility against the daily energy budget.

use crate::types::{FuelType, RawTrip, TripRecord, VehicleRecord};
use crate::util::cell_datetime;
use std::collections::HashMap;
use tracing::debug;

// Calibration values: estimated kWh per unit of fuel burned. Candidates for
// configuration; the cost model derives its diesel/LNG conversion from them.
pub const DIESEL_KWH_PER_UNIT: f64 = 5.0;
pub const LNG_KWH_PER_UNIT: f64 = 7.0;
pub const ELECTRIC_KWH_PER_UNIT: f64 = 1.0;

pub fn energy_multiplier(fuel_type: FuelType) -> f64 {
    match fuel_type {
        FuelType::Diesel => DIESEL_KWH_PER_UNIT,
        FuelType::Lng => LNG_KWH_PER_UNIT,
        FuelType::Electric => ELECTRIC_KWH_PER_UNIT,
        FuelType::Petrol | FuelType::Unknown => 0.0,
    }
}

/// Enrich raw trips and order them by (vehicle, date, start, tour id).
///
/// The ordering decides which trip is the last of its day: only that trip
/// carries the day's energy total and day feasibility.
pub fn prepare_tours(raw: &[RawTrip], vehicles: &[VehicleRecord], energy_limit_kwh: f64) -> Vec<TripRecord> {
    // Later registry rows win on duplicate ids.
    let fuel_by_vehicle: HashMap<i64, FuelType> =
        vehicles.iter().map(|v| (v.vehicle_id, v.fuel_type)).collect();

    let mut trips: Vec<TripRecord> = raw
        .iter()
        .filter_map(|r| {
            let start = cell_datetime(&r.start)?;
            let fuel_type = fuel_by_vehicle
                .get(&r.vehicle_id)
                .copied()
                .unwrap_or(FuelType::Unknown);
            let estimated_energy_kwh = r.fuel_consumption.unwrap_or(0.0) * energy_multiplier(fuel_type);
            Some(TripRecord {
                tour_id: r.tour_id.clone(),
                vehicle_id: r.vehicle_id,
                start,
                end: cell_datetime(&r.end),
                date: start.date(),
                mileage: r.mileage,
                fuel_consumption: r.fuel_consumption,
                fuel_type,
                estimated_energy_kwh,
                trip_feasible: classify(estimated_energy_kwh, energy_limit_kwh),
                day_energy_kwh: None,
                day_feasible: None,
            })
        })
        .collect();

    let dropped = raw.len() - trips.len();
    if dropped > 0 {
        debug!(dropped, "dropped trips with unparsable start time");
    }

    // Missing tour ids sort after present ones.
    trips.sort_by(|a, b| {
        (a.vehicle_id, a.date, a.start, a.tour_id.is_none(), &a.tour_id)
            .cmp(&(b.vehicle_id, b.date, b.start, b.tour_id.is_none(), &b.tour_id))
    });

    for day in trips.chunk_by_mut(|a, b| a.vehicle_id == b.vehicle_id && a.date == b.date) {
        let total: f64 = day
            .iter()
            .map(|t| t.estimated_energy_kwh)
            .filter(|e| !e.is_nan())
            .sum();
        if let Some(last) = day.last_mut() {
            last.day_energy_kwh = Some(total);
            last.day_feasible = classify(total, energy_limit_kwh);
        }
    }

    trips
}

/// `None` when the energy figure itself is undefined.
fn classify(energy_kwh: f64, energy_limit_kwh: f64) -> Option<bool> {
    (!energy_kwh.is_nan()).then_some(energy_kwh <= energy_limit_kwh)
}

/// Reporting period in months spanned by the trips' start times, at least 1.
pub fn infer_period_months(trips: &[TripRecord]) -> f64 {
    let (Some(first), Some(last)) = (
        trips.iter().map(|t| t.start).min(),
        trips.iter().map(|t| t.start).max(),
    ) else {
        return 1.0;
    };
    let days = (last - first).num_days();
    if days <= 0 {
        1.0
    } else {
        (days as f64 / 30.0).max(1.0)
    }
}
