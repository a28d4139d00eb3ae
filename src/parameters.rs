//! Energy limit, reporting period and per-technology economics, read from
//! fixed cells of the workbook.

use crate::error::Result;
use crate::types::{TcoParameters, TechnologyKey, TechnologyParameters};
use crate::util::{cell_f64, is_blank};
use crate::workbook::{Sheet, Workbook, TCO_SHEET, TOURS_SHEET};
use tracing::{debug, warn};

pub const ENERGY_LIMIT_CELL: &str = "AE1";
pub const PERIOD_MONTHS_CELL: &str = "AG3";

/// First sheet row (1-based) of the 23-row parameter block.
const FIRST_PARAMETER_ROW: usize = 2;

const FIELD_NAMES: [&str; TechnologyParameters::FIELD_COUNT] = [
    "vehicle_price",
    "lifetime_years",
    "subsidy_pct",
    "residual_pct",
    "replacement_value",
    "maintenance_per_km",
    "tax",
    "insurance",
    "tyre_life_km",
    "tyre_count",
    "tyre_cost",
    "own_fuel_share",
    "own_fuel_price",
    "external_fuel_price",
    "lubricant_pct",
    "adblue_pct",
    "adblue_price",
    "battery_cost",
    "battery_life_km",
    "toll_ct_per_km",
    "toll_share_pct",
    "interest_pct",
    "overhead_pct",
];

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSet {
    pub energy_limit_kwh: f64,
    /// `None` when the sheet does not state a usable period; the caller
    /// infers it from trip dates.
    pub period_months: Option<f64>,
    pub technologies: TcoParameters,
}

fn technology_column(key: TechnologyKey) -> &'static str {
    match key {
        TechnologyKey::Diesel => "B",
        TechnologyKey::Lng => "C",
        TechnologyKey::Bev => "D",
    }
}

pub fn read_parameters(workbook: &Workbook, default_energy_limit_kwh: f64) -> Result<ParameterSet> {
    let tours = workbook.sheet(TOURS_SHEET)?;
    let tco = workbook.sheet(TCO_SHEET)?;

    let energy_limit_kwh = read_energy_limit(tours, default_energy_limit_kwh);
    let period_months = read_period_months(tours);
    let technologies = TcoParameters {
        diesel: read_technology(tco, TechnologyKey::Diesel),
        lng: read_technology(tco, TechnologyKey::Lng),
        bev: read_technology(tco, TechnologyKey::Bev),
    };

    Ok(ParameterSet {
        energy_limit_kwh,
        period_months,
        technologies,
    })
}

fn read_energy_limit(tours: &Sheet, default: f64) -> f64 {
    let cell = tours.at(ENERGY_LIMIT_CELL);
    if is_blank(cell) {
        debug!(default, "energy limit cell blank, using default");
        return default;
    }
    match cell_f64(cell) {
        Some(limit) if limit > 0.0 => limit,
        _ => {
            warn!(?cell, default, "energy limit cell unusable, using default");
            default
        }
    }
}

fn read_period_months(tours: &Sheet) -> Option<f64> {
    let period = cell_f64(tours.at(PERIOD_MONTHS_CELL));
    if period.is_none() {
        debug!("period length not stated, will infer from trips");
    }
    period
}

fn read_technology(tco: &Sheet, key: TechnologyKey) -> TechnologyParameters {
    let column = technology_column(key);
    let mut values = [0.0; TechnologyParameters::FIELD_COUNT];
    for (offset, value) in values.iter_mut().enumerate() {
        let reference = format!("{}{}", column, FIRST_PARAMETER_ROW + offset);
        let cell = tco.at(&reference);
        match cell_f64(cell) {
            Some(v) => *value = v,
            None => {
                if !is_blank(cell) {
                    warn!(technology = %key, field = FIELD_NAMES[offset], ?cell, "non-numeric parameter read as 0");
                }
            }
        }
    }
    TechnologyParameters::from_values(values)
}
