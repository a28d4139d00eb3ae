use crate::workbook::Cell;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::fmt;
use tabled::Tabled;

/// The three drivetrains every vehicle is costed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TechnologyKey {
    Diesel,
    Lng,
    Bev,
}

impl TechnologyKey {
    pub fn as_str(self) -> &'static str {
        match self {
            TechnologyKey::Diesel => "diesel",
            TechnologyKey::Lng => "lng",
            TechnologyKey::Bev => "bev",
        }
    }
}

impl fmt::Display for TechnologyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized fuel type of a registered vehicle.
///
/// Variant order is the alphabetical order of the rendered names, so sorting
/// by `FuelType` matches sorting by its text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FuelType {
    Diesel,
    Electric,
    Lng,
    Petrol,
    Unknown,
}

impl FuelType {
    pub fn as_str(self) -> &'static str {
        match self {
            FuelType::Diesel => "diesel",
            FuelType::Electric => "electric",
            FuelType::Lng => "lng",
            FuelType::Petrol => "petrol",
            FuelType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FuelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rendered as `"yes"` / `"no"` in the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Flag {
    Yes,
    No,
}

impl Flag {
    pub fn is_yes(self) -> bool {
        self == Flag::Yes
    }
}

impl From<bool> for Flag {
    fn from(value: bool) -> Self {
        if value {
            Flag::Yes
        } else {
            Flag::No
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Flag::Yes => "yes",
            Flag::No => "no",
        })
    }
}

/// Economic inputs for one drivetrain, in the row order of the
/// `TCO-calculation` sheet. Percentages are stored as written (e.g. `40` for 40%).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TechnologyParameters {
    pub vehicle_price: f64,
    pub lifetime_years: f64,
    pub subsidy_pct: f64,
    pub residual_pct: f64,
    pub replacement_value: f64,
    pub maintenance_per_km: f64,
    pub tax: f64,
    pub insurance: f64,
    pub tyre_life_km: f64,
    pub tyre_count: f64,
    pub tyre_cost: f64,
    pub own_fuel_share: f64,
    pub own_fuel_price: f64,
    pub external_fuel_price: f64,
    pub lubricant_pct: f64,
    pub adblue_pct: f64,
    pub adblue_price: f64,
    pub battery_cost: f64,
    pub battery_life_km: f64,
    pub toll_ct_per_km: f64,
    pub toll_share_pct: f64,
    pub interest_pct: f64,
    pub overhead_pct: f64,
}

impl TechnologyParameters {
    pub const FIELD_COUNT: usize = 23;

    /// Builds a record from the 23 sheet values in row order.
    pub fn from_values(values: [f64; Self::FIELD_COUNT]) -> Self {
        let [
            vehicle_price,
            lifetime_years,
            subsidy_pct,
            residual_pct,
            replacement_value,
            maintenance_per_km,
            tax,
            insurance,
            tyre_life_km,
            tyre_count,
            tyre_cost,
            own_fuel_share,
            own_fuel_price,
            external_fuel_price,
            lubricant_pct,
            adblue_pct,
            adblue_price,
            battery_cost,
            battery_life_km,
            toll_ct_per_km,
            toll_share_pct,
            interest_pct,
            overhead_pct,
        ] = values;
        Self {
            vehicle_price,
            lifetime_years,
            subsidy_pct,
            residual_pct,
            replacement_value,
            maintenance_per_km,
            tax,
            insurance,
            tyre_life_km,
            tyre_count,
            tyre_cost,
            own_fuel_share,
            own_fuel_price,
            external_fuel_price,
            lubricant_pct,
            adblue_pct,
            adblue_price,
            battery_cost,
            battery_life_km,
            toll_ct_per_km,
            toll_share_pct,
            interest_pct,
            overhead_pct,
        }
    }
}

/// One parameter record per drivetrain.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TcoParameters {
    pub diesel: TechnologyParameters,
    pub lng: TechnologyParameters,
    pub bev: TechnologyParameters,
}

impl TcoParameters {
    pub fn get(&self, key: TechnologyKey) -> &TechnologyParameters {
        match key {
            TechnologyKey::Diesel => &self.diesel,
            TechnologyKey::Lng => &self.lng,
            TechnologyKey::Bev => &self.bev,
        }
    }

    /// Subsidy reference price shared by all drivetrains.
    pub fn base_price(&self) -> f64 {
        self.diesel.vehicle_price
    }
}

/// Trip identifier as written in the sheet. Numeric ids order before text ids.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TourId {
    Number(i64),
    Text(String),
}

/// A trip row as read from the `tours` sheet, before any derivation.
#[derive(Debug, Clone)]
pub struct RawTrip {
    pub tour_id: Option<TourId>,
    pub vehicle_id: i64,
    pub start: Cell,
    pub end: Cell,
    pub mileage: Option<f64>,
    pub fuel_consumption: Option<f64>,
}

/// A trip after timestamp parsing, energy estimation and feasibility tagging.
#[derive(Debug, Clone, PartialEq)]
pub struct TripRecord {
    pub tour_id: Option<TourId>,
    pub vehicle_id: i64,
    pub start: NaiveDateTime,
    pub end: Option<NaiveDateTime>,
    pub date: NaiveDate,
    pub mileage: Option<f64>,
    pub fuel_consumption: Option<f64>,
    pub fuel_type: FuelType,
    pub estimated_energy_kwh: f64,
    pub trip_feasible: Option<bool>,
    /// Set only on the last trip of its (vehicle, date) group.
    pub day_energy_kwh: Option<f64>,
    /// Set only on the last trip of its (vehicle, date) group.
    pub day_feasible: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VehicleRecord {
    pub vehicle_id: i64,
    pub license_no: Option<String>,
    pub fuel_type: FuelType,
}

#[derive(Debug, Clone, Serialize)]
pub struct VehicleAnalysis {
    #[serde(rename = "vehicleid")]
    pub vehicle_id: i64,
    #[serde(rename = "licenseno")]
    pub license_no: Option<String>,
    #[serde(rename = "fueltypes")]
    pub fuel_type: FuelType,
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
    pub annual_mileage: f64,
    pub annual_energy_kwh: f64,
    pub cost_diesel: f64,
    pub cost_lng: f64,
    pub cost_bev: f64,
    pub economy_per_year: f64,
    pub feasibility_flag: Flag,
    pub cost_efficiency_flag: Flag,
    #[serde(rename = "both")]
    pub combined_flag: Flag,
    pub feasible_rate: f64,
}

/// Console preview of a vehicle; numbers are pre-formatted.
#[derive(Debug, Clone, Tabled)]
pub struct VehiclePreviewRow {
    #[tabled(rename = "Vehicle")]
    pub vehicle_id: i64,
    #[tabled(rename = "License")]
    pub license_no: String,
    #[tabled(rename = "Fuel")]
    pub fuel_type: FuelType,
    #[tabled(rename = "Tours")]
    pub tour_count: usize,
    #[tabled(rename = "Days (ok/total)")]
    pub days: String,
    #[tabled(rename = "Annual km")]
    pub annual_mileage: String,
    #[tabled(rename = "BEV cost")]
    pub cost_bev: String,
    #[tabled(rename = "Economy/yr")]
    pub economy_per_year: String,
    #[tabled(rename = "Both")]
    pub combined_flag: Flag,
}

#[derive(Debug, Clone, Serialize, Tabled)]
pub struct FuelSummaryRow {
    #[serde(rename = "fueltypes")]
    #[tabled(rename = "Fuel")]
    pub fuel_type: FuelType,
    #[tabled(rename = "Vehicles")]
    pub vehicles: usize,
    #[tabled(rename = "Feasible")]
    pub feasible: usize,
    #[tabled(rename = "CostEfficient")]
    pub cost_efficient: usize,
    #[tabled(rename = "AvgEconomy")]
    pub avg_economy: f64,
    #[tabled(rename = "TotalEconomy")]
    pub total_economy: f64,
}

#[derive(Debug, Clone, Serialize, Tabled)]
pub struct DailyTrendRow {
    #[tabled(rename = "Date")]
    pub date: String,
    #[tabled(rename = "Tours")]
    pub tour_count: usize,
    #[tabled(rename = "Mileage")]
    pub mileage_sum: f64,
    #[tabled(rename = "Fuel")]
    pub fuel_sum: f64,
    #[tabled(rename = "Energy kWh")]
    pub energy_sum: f64,
    #[tabled(rename = "FeasibleRate")]
    pub feasible_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EconomyHighlight {
    #[serde(rename = "vehicleid")]
    pub vehicle_id: i64,
    #[serde(rename = "licenseno")]
    pub license_no: Option<String>,
    #[serde(rename = "fueltypes")]
    pub fuel_type: FuelType,
    pub economy_per_year: f64,
    pub cost_bev: f64,
}

impl From<&VehicleAnalysis> for EconomyHighlight {
    fn from(v: &VehicleAnalysis) -> Self {
        Self {
            vehicle_id: v.vehicle_id,
            license_no: v.license_no.clone(),
            fuel_type: v.fuel_type,
            economy_per_year: v.economy_per_year,
            cost_bev: v.cost_bev,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct EconomyExtremes {
    pub top_savers: Vec<EconomyHighlight>,
    pub top_risks: Vec<EconomyHighlight>,
}

/// Count of vehicles per flag value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Breakdown {
    pub yes: usize,
    pub no: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Insights {
    pub graphs_overview: String,
    pub feasibility: String,
    pub cost_efficiency: String,
    pub economy_chart: String,
    pub fuel_mix: String,
    pub tco_logic: String,
}

/// Narrative interpretation returned by the AI summary collaborator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AiSummary {
    pub headline: String,
    pub bullets: Vec<String>,
    pub cautions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisPayload {
    pub energy_limit_kwh: f64,
    pub period_months: f64,
    pub start_date: String,
    pub end_date: String,
    pub total_vehicles: usize,
    pub total_tours: usize,
    pub total_mileage: f64,
    pub total_energy_kwh: f64,
    pub vehicles: Vec<VehicleAnalysis>,
    pub fuel_summary: Vec<FuelSummaryRow>,
    pub feasibility_breakdown: Breakdown,
    pub cost_efficiency_breakdown: Breakdown,
    pub both_yes_count: usize,
    pub economy_extremes: EconomyExtremes,
    pub daily_trend: Vec<DailyTrendRow>,
    pub tco_parameters: TcoParameters,
    pub insights: Insights,
    pub ai_summary: Option<AiSummary>,
}
