use crate::aggregate::VehicleTotals;
use crate::cost::{economy_per_year, technology_costs, weighted_energy_price};
use crate::parameters::ParameterSet;
use crate::types::{
    AnalysisPayload, Breakdown, DailyTrendRow, EconomyExtremes, EconomyHighlight, Flag, FuelSummaryRow, FuelType,
    Insights, TcoParameters, TripRecord, VehicleAnalysis, VehicleRecord,
};
use crate::util::{average, format_number, ratio_or_zero, round2};
use chrono::NaiveDate;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

const EXTREMES_LEN: usize = 5;

/// Join a vehicle's trip totals with its registry entry and cost it under
/// every technology.
pub fn analyse_vehicle(
    totals: &VehicleTotals,
    registry: Option<&VehicleRecord>,
    params: &TcoParameters,
    period_months: f64,
) -> VehicleAnalysis {
    let fuel_type = registry.map_or(FuelType::Unknown, |v| v.fuel_type);
    let annual_mileage = ratio_or_zero(totals.total_mileage * 12.0, period_months);
    let annual_energy_kwh = ratio_or_zero(totals.total_energy_kwh * 12.0, period_months);

    let costs = technology_costs(totals.avg_consumption_per_100km, fuel_type, annual_mileage, params);
    let economy = economy_per_year(fuel_type, &costs);

    let feasibility_flag = Flag::from(totals.infeasible_days == 0);
    let cost_efficiency_flag = Flag::from(economy >= 0.0);
    let combined_flag = Flag::from(feasibility_flag.is_yes() && cost_efficiency_flag.is_yes());

    VehicleAnalysis {
        vehicle_id: totals.vehicle_id,
        license_no: registry.and_then(|v| v.license_no.clone()),
        fuel_type,
        total_mileage: totals.total_mileage,
        total_fuel: totals.total_fuel,
        total_energy_kwh: totals.total_energy_kwh,
        tour_count: totals.tour_count,
        feasible_tours: totals.feasible_tours,
        infeasible_tours: totals.infeasible_tours,
        feasible_days: totals.feasible_days,
        infeasible_days: totals.infeasible_days,
        total_days: totals.total_days,
        avg_consumption_per_100km: totals.avg_consumption_per_100km,
        annual_mileage,
        annual_energy_kwh,
        cost_diesel: costs.diesel,
        cost_lng: costs.lng,
        cost_bev: costs.bev,
        economy_per_year: economy,
        feasibility_flag,
        cost_efficiency_flag,
        combined_flag,
        feasible_rate: totals.feasible_rate,
    }
}

pub fn breakdown<F>(vehicles: &[VehicleAnalysis], flag: F) -> Breakdown
where
    F: Fn(&VehicleAnalysis) -> Flag,
{
    vehicles.iter().fold(Breakdown::default(), |mut acc, v| {
        match flag(v) {
            Flag::Yes => acc.yes += 1,
            Flag::No => acc.no += 1,
        }
        acc
    })
}

pub fn generate_fuel_summary(vehicles: &[VehicleAnalysis]) -> Vec<FuelSummaryRow> {
    #[derive(Default)]
    struct Acc {
        vehicles: usize,
        feasible: usize,
        cost_efficient: usize,
        economies: Vec<f64>,
    }
    let mut map: BTreeMap<FuelType, Acc> = BTreeMap::new();
    for v in vehicles {
        let e = map.entry(v.fuel_type).or_default();
        e.vehicles += 1;
        e.feasible += usize::from(v.feasibility_flag.is_yes());
        e.cost_efficient += usize::from(v.cost_efficiency_flag.is_yes());
        e.economies.push(v.economy_per_year);
    }
    map.into_iter()
        .map(|(fuel_type, acc)| FuelSummaryRow {
            fuel_type,
            vehicles: acc.vehicles,
            feasible: acc.feasible,
            cost_efficient: acc.cost_efficient,
            avg_economy: round2(average(&acc.economies)),
            total_economy: round2(acc.economies.iter().sum()),
        })
        .collect()
}

/// Five best and five worst BEV cases by yearly economy. Ties go to the
/// lower vehicle id in both lists.
pub fn generate_economy_extremes(vehicles: &[VehicleAnalysis]) -> EconomyExtremes {
    let top = |best_first: bool| -> Vec<EconomyHighlight> {
        let mut sorted: Vec<&VehicleAnalysis> = vehicles.iter().collect();
        sorted.sort_by(|a, b| {
            let by_economy = a
                .economy_per_year
                .partial_cmp(&b.economy_per_year)
                .unwrap_or(Ordering::Equal);
            let by_economy = if best_first { by_economy.reverse() } else { by_economy };
            by_economy.then_with(|| a.vehicle_id.cmp(&b.vehicle_id))
        });
        sorted
            .into_iter()
            .take(EXTREMES_LEN)
            .map(EconomyHighlight::from)
            .collect()
    };
    EconomyExtremes {
        top_savers: top(true),
        top_risks: top(false),
    }
}

pub fn generate_daily_trend(trips: &[TripRecord]) -> Vec<DailyTrendRow> {
    #[derive(Default)]
    struct Acc {
        tours: usize,
        mileage: f64,
        fuel: f64,
        energy: f64,
        feasible: usize,
    }
    let mut map: BTreeMap<NaiveDate, Acc> = BTreeMap::new();
    for t in trips {
        let e = map.entry(t.date).or_default();
        e.tours += 1;
        e.mileage += t.mileage.unwrap_or(0.0);
        e.fuel += t.fuel_consumption.unwrap_or(0.0);
        if !t.estimated_energy_kwh.is_nan() {
            e.energy += t.estimated_energy_kwh;
        }
        e.feasible += usize::from(t.trip_feasible == Some(true));
    }
    map.into_iter()
        .map(|(date, acc)| DailyTrendRow {
            date: date.format("%Y-%m-%d").to_string(),
            tour_count: acc.tours,
            mileage_sum: round2(acc.mileage),
            fuel_sum: round2(acc.fuel),
            energy_sum: round2(acc.energy),
            feasible_rate: round2(ratio_or_zero(acc.feasible as f64, acc.tours as f64)),
        })
        .collect()
}

/// Narrative text built only from figures computed elsewhere in the report.
pub fn build_insights(
    fuel_summary: &[FuelSummaryRow],
    feasibility: Breakdown,
    cost_efficiency: Breakdown,
    extremes: &EconomyExtremes,
    params: &TcoParameters,
    energy_limit_kwh: f64,
    operating_days: usize,
) -> Insights {
    let fuel_mix = fuel_summary
        .iter()
        .map(|row| {
            format!(
                "{}: {} vehicles, {} feasible, {} cost-efficient, mean economy {:.0} € / vehicle",
                row.fuel_type.as_str().to_uppercase(),
                row.vehicles,
                row.feasible,
                row.cost_efficient,
                row.avg_economy
            )
        })
        .collect::<Vec<_>>()
        .join(" | ");

    let mut economy_notes = Vec::new();
    if let Some(top) = extremes.top_savers.first() {
        economy_notes.push(format!(
            "Best BEV case: vehicle #{} saves {:.0} € annually versus its incumbent drivetrain.",
            top.vehicle_id, top.economy_per_year
        ));
    }
    if let Some(worst) = extremes.top_risks.first() {
        economy_notes.push(format!(
            "Toughest case: vehicle #{} requires {:.0} € extra per year to go BEV.",
            worst.vehicle_id,
            worst.economy_per_year.abs()
        ));
    }
    let economy_chart = if economy_notes.is_empty() {
        "The economy chart highlights vehicles with the largest BEV savings or losses.".to_string()
    } else {
        economy_notes.join(" ")
    };

    let bev = &params.bev;
    Insights {
        graphs_overview: format!(
            "The economy chart compares the five strongest and five weakest BEV cases \
             (incumbent diesel/LNG cost minus BEV cost). The flag chart groups vehicles by \
             feasibility and cost-efficiency. The trend line follows daily mileage and tour \
             volume across the {operating_days} operating days in the upload."
        ),
        feasibility: format!(
            "{} vehicles stay within the {:.0} kWh daily energy budget on every operating day, \
             while {} need additional charging capacity.",
            feasibility.yes, energy_limit_kwh, feasibility.no
        ),
        cost_efficiency: format!(
            "Cost-efficiency compares each vehicle's incumbent annual cost with its BEV cost. \
             {} vehicles deliver net savings; {} remain more expensive after subsidy.",
            cost_efficiency.yes, cost_efficiency.no
        ),
        economy_chart,
        fuel_mix,
        tco_logic: format!(
            "TCO inputs come from the workbook: diesel capex {} €, BEV capex {} € with a {:.0}% \
             subsidy, and blended BEV energy cost {:.2} €/kWh. Mileage is annualised over the \
             reporting period.",
            format_number(params.diesel.vehicle_price, 0),
            format_number(bev.vehicle_price, 0),
            bev.subsidy_pct,
            weighted_energy_price(bev)
        ),
    }
}

/// Merge per-vehicle totals with the registry and costs, then derive every
/// fleet-level section of the report.
pub fn assemble(
    params: &ParameterSet,
    period_months: f64,
    trips: &[TripRecord],
    totals: &[VehicleTotals],
    registry: &[VehicleRecord],
) -> AnalysisPayload {
    // Later registry rows win on duplicate ids, as in trip preparation.
    let by_id: HashMap<i64, &VehicleRecord> = registry.iter().map(|v| (v.vehicle_id, v)).collect();
    let vehicles: Vec<VehicleAnalysis> = totals
        .iter()
        .map(|t| {
            analyse_vehicle(
                t,
                by_id.get(&t.vehicle_id).copied(),
                &params.technologies,
                period_months,
            )
        })
        .collect();

    let feasibility_breakdown = breakdown(&vehicles, |v| v.feasibility_flag);
    let cost_efficiency_breakdown = breakdown(&vehicles, |v| v.cost_efficiency_flag);
    let both_yes_count = vehicles.iter().filter(|v| v.combined_flag.is_yes()).count();
    let fuel_summary = generate_fuel_summary(&vehicles);
    let economy_extremes = generate_economy_extremes(&vehicles);
    let daily_trend = generate_daily_trend(trips);

    let insights = build_insights(
        &fuel_summary,
        feasibility_breakdown,
        cost_efficiency_breakdown,
        &economy_extremes,
        &params.technologies,
        params.energy_limit_kwh,
        daily_trend.len(),
    );

    AnalysisPayload {
        energy_limit_kwh: params.energy_limit_kwh,
        period_months,
        start_date: daily_trend.first().map(|d| d.date.clone()).unwrap_or_default(),
        end_date: daily_trend.last().map(|d| d.date.clone()).unwrap_or_default(),
        total_vehicles: vehicles.len(),
        total_tours: trips.len(),
        total_mileage: trips.iter().map(|t| t.mileage.unwrap_or(0.0)).sum(),
        total_energy_kwh: trips
            .iter()
            .map(|t| t.estimated_energy_kwh)
            .filter(|e| !e.is_nan())
            .sum(),
        vehicles,
        fuel_summary,
        feasibility_breakdown,
        cost_efficiency_breakdown,
        both_yes_count,
        economy_extremes,
        daily_trend,
        tco_parameters: params.technologies.clone(),
        insights,
        ai_summary: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TechnologyParameters;
    use approx::assert_abs_diff_eq;

    fn totals(vehicle_id: i64, infeasible_days: usize) -> VehicleTotals {
        VehicleTotals {
            vehicle_id,
            total_mileage: 10_000.0,
            total_fuel: 3_000.0,
            total_energy_kwh: 15_000.0,
            tour_count: 20,
            feasible_tours: 18,
            infeasible_tours: 2,
            feasible_days: 10 - infeasible_days,
            infeasible_days,
            total_days: 10,
            avg_consumption_per_100km: 30.0,
            feasible_rate: 0.9,
        }
    }

    fn vehicle(vehicle_id: i64, fuel_type: FuelType) -> VehicleRecord {
        VehicleRecord {
            vehicle_id,
            license_no: Some(format!("TRK-{vehicle_id}")),
            fuel_type,
        }
    }

    fn analysis(vehicle_id: i64, fuel_type: FuelType, economy: f64, feasible: bool) -> VehicleAnalysis {
        let registry = vehicle(vehicle_id, fuel_type);
        let mut v = analyse_vehicle(&totals(vehicle_id, 0), Some(&registry), &TcoParameters::default(), 12.0);
        v.economy_per_year = economy;
        v.feasibility_flag = Flag::from(feasible);
        v.cost_efficiency_flag = Flag::from(economy >= 0.0);
        v.combined_flag = Flag::from(feasible && economy >= 0.0);
        v
    }

    fn cheap_bev() -> TcoParameters {
        let diesel = TechnologyParameters {
            vehicle_price: 100_000.0,
            own_fuel_share: 0.0,
            external_fuel_price: 1.5,
            ..Default::default()
        };
        let bev = TechnologyParameters {
            vehicle_price: 100_000.0,
            own_fuel_share: 100.0,
            own_fuel_price: 0.1,
            ..Default::default()
        };
        TcoParameters { diesel: diesel.clone(), lng: diesel, bev }
    }

    #[test]
    fn test_analyse_vehicle_annualises_and_flags() {
        let v = analyse_vehicle(&totals(1, 0), Some(&vehicle(1, FuelType::Diesel)), &cheap_bev(), 6.0);
        assert_abs_diff_eq!(v.annual_mileage, 20_000.0);
        assert_abs_diff_eq!(v.annual_energy_kwh, 30_000.0);
        // diesel: 200 * 30 * 1.5; bev: 200 * 150 * 0.1
        assert_abs_diff_eq!(v.cost_diesel, 9_000.0, epsilon = 1e-6);
        assert_abs_diff_eq!(v.cost_bev, 3_000.0, epsilon = 1e-6);
        assert_abs_diff_eq!(v.economy_per_year, 6_000.0, epsilon = 1e-6);
        assert_eq!(v.feasibility_flag, Flag::Yes);
        assert_eq!(v.cost_efficiency_flag, Flag::Yes);
        assert_eq!(v.combined_flag, Flag::Yes);
        assert_eq!(v.license_no.as_deref(), Some("TRK-1"));
    }

    #[test]
    fn test_unregistered_vehicle_has_no_economy() {
        let v = analyse_vehicle(&totals(5, 2), None, &cheap_bev(), 6.0);
        assert_eq!(v.fuel_type, FuelType::Unknown);
        assert_eq!(v.economy_per_year, 0.0);
        assert_eq!(v.cost_efficiency_flag, Flag::Yes);
        assert_eq!(v.feasibility_flag, Flag::No);
        assert_eq!(v.combined_flag, Flag::No);
        assert!(v.license_no.is_none());
    }

    #[test]
    fn test_fuel_summary_grouping() {
        let vehicles = vec![
            analysis(1, FuelType::Lng, 100.0, true),
            analysis(2, FuelType::Diesel, 1_000.0, true),
            analysis(3, FuelType::Diesel, -500.5, false),
        ];
        let rows = generate_fuel_summary(&vehicles);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].fuel_type, FuelType::Diesel);
        assert_eq!(rows[0].vehicles, 2);
        assert_eq!(rows[0].feasible, 1);
        assert_eq!(rows[0].cost_efficient, 1);
        assert_abs_diff_eq!(rows[0].total_economy, 499.5);
        assert_abs_diff_eq!(rows[0].avg_economy, 249.75);
        assert_eq!(rows[1].fuel_type, FuelType::Lng);
    }

    #[test]
    fn test_breakdowns() {
        let vehicles = vec![
            analysis(1, FuelType::Diesel, 10.0, true),
            analysis(2, FuelType::Diesel, -10.0, true),
            analysis(3, FuelType::Diesel, 10.0, false),
        ];
        assert_eq!(breakdown(&vehicles, |v| v.feasibility_flag), Breakdown { yes: 2, no: 1 });
        assert_eq!(breakdown(&vehicles, |v| v.cost_efficiency_flag), Breakdown { yes: 2, no: 1 });
    }

    #[test]
    fn test_economy_extremes() {
        let vehicles: Vec<_> = (1..=7)
            .map(|i| analysis(i, FuelType::Diesel, (i as f64 - 4.0) * 100.0, true))
            .collect();
        let ex = generate_economy_extremes(&vehicles);
        let savers: Vec<i64> = ex.top_savers.iter().map(|h| h.vehicle_id).collect();
        let risks: Vec<i64> = ex.top_risks.iter().map(|h| h.vehicle_id).collect();
        assert_eq!(savers, vec![7, 6, 5, 4, 3]);
        assert_eq!(risks, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_economy_extremes_ties_favour_lower_ids() {
        let vehicles: Vec<_> = (1..=7)
            .map(|i| analysis(i, FuelType::Diesel, 0.0, true))
            .collect();
        let ex = generate_economy_extremes(&vehicles);
        let savers: Vec<i64> = ex.top_savers.iter().map(|h| h.vehicle_id).collect();
        let risks: Vec<i64> = ex.top_risks.iter().map(|h| h.vehicle_id).collect();
        assert_eq!(savers, vec![1, 2, 3, 4, 5]);
        assert_eq!(risks, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_insights_use_aggregates() {
        let vehicles = vec![
            analysis(11, FuelType::Diesel, 1_500.0, true),
            analysis(12, FuelType::Lng, -2_500.0, false),
        ];
        let summary = generate_fuel_summary(&vehicles);
        let extremes = generate_economy_extremes(&vehicles);
        let insights = build_insights(
            &summary,
            breakdown(&vehicles, |v| v.feasibility_flag),
            breakdown(&vehicles, |v| v.cost_efficiency_flag),
            &extremes,
            &cheap_bev(),
            300.0,
            42,
        );
        assert!(insights.feasibility.starts_with("1 vehicles stay within the 300 kWh"));
        assert!(insights.economy_chart.contains("vehicle #11 saves 1500 €"));
        assert!(insights.economy_chart.contains("vehicle #12 requires 2500 € extra"));
        assert!(insights.fuel_mix.starts_with("DIESEL: 1 vehicles"));
        assert!(insights.tco_logic.contains("diesel capex 100,000 €"));
        assert!(insights.graphs_overview.contains("42 operating days"));
    }
}
