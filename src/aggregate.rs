use crate::types::TripRecord;
use crate::util::ratio_or_zero;
use std::collections::BTreeMap;

/// Per-vehicle sums over the prepared trip table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VehicleTotals {
    pub vehicle_id: i64,
    pub total_mileage: f64,
    pub total_fuel: f64,
    pub total_energy_kwh: f64,
    pub tour_count: usize,
    pub feasible_tours: usize,
    pub infeasible_tours: usize,
    pub feasible_days: usize,
    pub infeasible_days: usize,
    pub total_days: usize,
    pub avg_consumption_per_100km: f64,
    pub feasible_rate: f64,
}

/// Reduce trips to one row per vehicle, ordered by vehicle id.
///
/// Day counts come from the day classification, which only the last trip
/// of each (vehicle, date) carries, so they count days rather than trips.
pub fn aggregate_vehicles(trips: &[TripRecord]) -> Vec<VehicleTotals> {
    let mut map: BTreeMap<i64, VehicleTotals> = BTreeMap::new();
    for t in trips {
        let e = map.entry(t.vehicle_id).or_insert_with(|| VehicleTotals {
            vehicle_id: t.vehicle_id,
            ..Default::default()
        });
        e.total_mileage += t.mileage.unwrap_or(0.0);
        e.total_fuel += t.fuel_consumption.unwrap_or(0.0);
        if !t.estimated_energy_kwh.is_nan() {
            e.total_energy_kwh += t.estimated_energy_kwh;
        }
        e.tour_count += 1;
        match t.trip_feasible {
            Some(true) => e.feasible_tours += 1,
            Some(false) => e.infeasible_tours += 1,
            None => {}
        }
        match t.day_feasible {
            Some(true) => e.feasible_days += 1,
            Some(false) => e.infeasible_days += 1,
            None => {}
        }
    }

    map.into_values()
        .map(|mut v| {
            v.total_days = v.feasible_days + v.infeasible_days;
            v.avg_consumption_per_100km = ratio_or_zero(v.total_fuel, v.total_mileage) * 100.0;
            v.feasible_rate = ratio_or_zero(v.feasible_tours as f64, v.tour_count as f64);
            v
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tours::prepare_tours;
    use crate::types::{FuelType, RawTrip, TourId, VehicleRecord};
    use crate::workbook::Cell;
    use approx::assert_abs_diff_eq;

    fn trip(tour_id: i64, vehicle_id: i64, start: &str, mileage: f64, fuel: f64) -> RawTrip {
        RawTrip {
            tour_id: Some(TourId::Number(tour_id)),
            vehicle_id,
            start: Cell::Text(start.to_string()),
            end: Cell::Empty,
            mileage: Some(mileage),
            fuel_consumption: Some(fuel),
        }
    }

    fn registry() -> Vec<VehicleRecord> {
        vec![
            VehicleRecord { vehicle_id: 1, license_no: None, fuel_type: FuelType::Diesel },
            VehicleRecord { vehicle_id: 2, license_no: None, fuel_type: FuelType::Lng },
        ]
    }

    #[test]
    fn test_totals_and_rates() {
        let raw = [
            trip(1, 1, "2024-01-01 08:00", 200.0, 50.0),
            trip(2, 1, "2024-01-01 14:00", 100.0, 20.0),
            trip(3, 1, "2024-01-02 08:00", 100.0, 10.0),
            trip(4, 2, "2024-01-01 08:00", 300.0, 30.0),
        ];
        let trips = prepare_tours(&raw, &registry(), 300.0);
        let totals = aggregate_vehicles(&trips);
        assert_eq!(totals.len(), 2);

        let v1 = &totals[0];
        assert_eq!(v1.vehicle_id, 1);
        assert_abs_diff_eq!(v1.total_mileage, 400.0);
        assert_abs_diff_eq!(v1.total_fuel, 80.0);
        assert_abs_diff_eq!(v1.total_energy_kwh, 400.0);
        assert_eq!(v1.tour_count, 3);
        assert_eq!(v1.feasible_tours, 3);
        assert_eq!(v1.infeasible_tours, 0);
        assert_eq!(v1.feasible_days, 1);
        assert_eq!(v1.infeasible_days, 1);
        assert_eq!(v1.total_days, 2);
        assert_abs_diff_eq!(v1.avg_consumption_per_100km, 20.0);
        assert_abs_diff_eq!(v1.feasible_rate, 1.0);

        let v2 = &totals[1];
        assert_abs_diff_eq!(v2.total_energy_kwh, 210.0);
        assert_eq!(v2.total_days, v2.feasible_days + v2.infeasible_days);
    }

    #[test]
    fn test_zero_mileage_guarded() {
        let raw = [trip(1, 1, "2024-01-01 08:00", 0.0, 10.0)];
        let trips = prepare_tours(&raw, &registry(), 300.0);
        let totals = aggregate_vehicles(&trips);
        assert_eq!(totals[0].avg_consumption_per_100km, 0.0);
        assert_abs_diff_eq!(totals[0].feasible_rate, 1.0);
    }

    #[test]
    fn test_no_trips() {
        assert!(aggregate_vehicles(&[]).is_empty());
    }
}
