//! Annualized total cost of ownership per drivetrain.

use crate::tours::{DIESEL_KWH_PER_UNIT, LNG_KWH_PER_UNIT};
use crate::types::{FuelType, TcoParameters, TechnologyKey, TechnologyParameters};
use crate::util::ratio_or_zero;

/// Express a vehicle's consumption per 100 km in the units of `target`.
///
/// Diesel and LNG convert into each other at 5:7 and into kWh at their
/// energy multipliers. Every other pairing has no conversion rule and
/// yields 0, including anything electric (there is no BEV → fuel inverse).
pub fn convert_consumption(avg_consumption: f64, actual: FuelType, target: TechnologyKey) -> f64 {
    if avg_consumption <= 0.0 {
        return 0.0;
    }
    match (target, actual) {
        (TechnologyKey::Diesel, FuelType::Diesel) | (TechnologyKey::Lng, FuelType::Lng) => avg_consumption,
        (TechnologyKey::Diesel, FuelType::Lng) => avg_consumption * LNG_KWH_PER_UNIT / DIESEL_KWH_PER_UNIT,
        (TechnologyKey::Lng, FuelType::Diesel) => avg_consumption * DIESEL_KWH_PER_UNIT / LNG_KWH_PER_UNIT,
        (TechnologyKey::Bev, FuelType::Diesel) => avg_consumption * DIESEL_KWH_PER_UNIT,
        (TechnologyKey::Bev, FuelType::Lng) => avg_consumption * LNG_KWH_PER_UNIT,
        _ => 0.0,
    }
}

/// Blend of own-supply and external energy price, weighted by own share (%).
pub fn weighted_energy_price(p: &TechnologyParameters) -> f64 {
    let share = p.own_fuel_share / 100.0;
    share * p.own_fuel_price + (1.0 - share) * p.external_fuel_price
}

/// The individual cost lines behind one technology's annual total.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CostBreakdown {
    pub depreciation: f64,
    pub maintenance: f64,
    pub fixed: f64,
    pub tyres: f64,
    pub energy: f64,
    pub lubricant: f64,
    pub adblue: f64,
    pub battery: f64,
    pub toll: f64,
    pub interest: f64,
    pub total: f64,
}

impl CostBreakdown {
    /// Sum of all lines before the overhead surcharge.
    pub fn base_total(&self) -> f64 {
        self.depreciation
            + self.maintenance
            + self.fixed
            + self.tyres
            + self.energy
            + self.lubricant
            + self.adblue
            + self.battery
            + self.toll
            + self.interest
    }
}

/// Annual cost of running a vehicle with the given profile as `target`.
///
/// `base_price` is the subsidy reference shared across technologies; only
/// the price premium above it is subsidized.
pub fn technology_cost(
    avg_consumption: f64,
    actual: FuelType,
    annual_mileage: f64,
    p: &TechnologyParameters,
    target: TechnologyKey,
    base_price: f64,
) -> CostBreakdown {
    let consumption = convert_consumption(avg_consumption, actual, target);
    let per_100 = annual_mileage / 100.0;

    let energy = per_100 * consumption * weighted_energy_price(p);
    let lubricant = energy * p.lubricant_pct / 100.0;
    let adblue = per_100 * (p.adblue_pct / 100.0) * consumption * p.adblue_price;
    let battery = if p.battery_cost != 0.0 && p.battery_life_km != 0.0 {
        annual_mileage * p.battery_cost / p.battery_life_km
    } else {
        0.0
    };
    let toll = p.toll_ct_per_km / 100.0 * (p.toll_share_pct / 100.0) * annual_mileage;

    // No clamping: a residual above 100% or a high replacement value passes through.
    let remaining_value = p.vehicle_price * (1.0 - p.residual_pct / 100.0).powf(p.lifetime_years);
    let depreciation = ratio_or_zero(p.replacement_value - remaining_value, p.lifetime_years);

    let maintenance = p.maintenance_per_km * annual_mileage;
    let fixed = p.tax + p.insurance;
    let tyres = ratio_or_zero(p.tyre_count * p.tyre_cost * annual_mileage, p.tyre_life_km);

    let subsidy = (p.vehicle_price - base_price).max(0.0) * p.subsidy_pct / 100.0;
    let interest = (p.vehicle_price - subsidy) / 2.0 * p.interest_pct / 100.0;

    let mut breakdown = CostBreakdown {
        depreciation,
        maintenance,
        fixed,
        tyres,
        energy,
        lubricant,
        adblue,
        battery,
        toll,
        interest,
        total: 0.0,
    };
    breakdown.total = breakdown.base_total() * (1.0 + p.overhead_pct / 100.0);
    breakdown
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TechnologyCosts {
    pub diesel: f64,
    pub lng: f64,
    pub bev: f64,
}

/// Annual totals for all three technologies.
pub fn technology_costs(
    avg_consumption: f64,
    actual: FuelType,
    annual_mileage: f64,
    params: &TcoParameters,
) -> TechnologyCosts {
    let base_price = params.base_price();
    let total = |key| {
        technology_cost(avg_consumption, actual, annual_mileage, params.get(key), key, base_price).total
    };
    TechnologyCosts {
        diesel: total(TechnologyKey::Diesel),
        lng: total(TechnologyKey::Lng),
        bev: total(TechnologyKey::Bev),
    }
}

/// Yearly saving of switching to BEV from the incumbent drivetrain.
/// Vehicles that are neither diesel nor LNG have no comparison basis.
pub fn economy_per_year(actual: FuelType, costs: &TechnologyCosts) -> f64 {
    match actual {
        FuelType::Diesel => costs.diesel - costs.bev,
        FuelType::Lng => costs.lng - costs.bev,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn params() -> TechnologyParameters {
        TechnologyParameters {
            vehicle_price: 100_000.0,
            lifetime_years: 5.0,
            subsidy_pct: 0.0,
            residual_pct: 20.0,
            replacement_value: 100_000.0,
            maintenance_per_km: 0.1,
            tax: 1_000.0,
            insurance: 2_000.0,
            tyre_life_km: 100_000.0,
            tyre_count: 6.0,
            tyre_cost: 500.0,
            own_fuel_share: 50.0,
            own_fuel_price: 1.0,
            external_fuel_price: 2.0,
            lubricant_pct: 1.0,
            adblue_pct: 5.0,
            adblue_price: 0.5,
            battery_cost: 0.0,
            battery_life_km: 0.0,
            toll_ct_per_km: 20.0,
            toll_share_pct: 50.0,
            interest_pct: 4.0,
            overhead_pct: 10.0,
        }
    }

    #[test]
    fn test_own_type_conversion_is_identity() {
        assert_eq!(convert_consumption(31.7, FuelType::Diesel, TechnologyKey::Diesel), 31.7);
        assert_eq!(convert_consumption(31.7, FuelType::Lng, TechnologyKey::Lng), 31.7);
    }

    #[test]
    fn test_conversion_table() {
        assert_abs_diff_eq!(convert_consumption(10.0, FuelType::Lng, TechnologyKey::Diesel), 14.0);
        assert_abs_diff_eq!(convert_consumption(14.0, FuelType::Diesel, TechnologyKey::Lng), 10.0);
        assert_abs_diff_eq!(convert_consumption(30.0, FuelType::Diesel, TechnologyKey::Bev), 150.0);
        assert_abs_diff_eq!(convert_consumption(30.0, FuelType::Lng, TechnologyKey::Bev), 210.0);
        assert_eq!(convert_consumption(30.0, FuelType::Electric, TechnologyKey::Bev), 0.0);
        assert_eq!(convert_consumption(30.0, FuelType::Electric, TechnologyKey::Diesel), 0.0);
        assert_eq!(convert_consumption(30.0, FuelType::Petrol, TechnologyKey::Lng), 0.0);
        assert_eq!(convert_consumption(-1.0, FuelType::Diesel, TechnologyKey::Diesel), 0.0);
    }

    #[test]
    fn test_weighted_energy_price() {
        assert_abs_diff_eq!(weighted_energy_price(&params()), 1.5);
    }

    #[test]
    fn test_cost_lines() {
        let p = params();
        let c = technology_cost(30.0, FuelType::Diesel, 100_000.0, &p, TechnologyKey::Diesel, 100_000.0);
        // 1000 * 30 * 1.5
        assert_abs_diff_eq!(c.energy, 45_000.0);
        assert_abs_diff_eq!(c.lubricant, 450.0);
        // 1000 * 0.05 * 30 * 0.5
        assert_abs_diff_eq!(c.adblue, 750.0);
        assert_eq!(c.battery, 0.0);
        assert_abs_diff_eq!(c.toll, 10_000.0);
        // (100000 - 100000 * 0.8^5) / 5
        assert_abs_diff_eq!(c.depreciation, (100_000.0 - 32_768.0) / 5.0, epsilon = 1e-6);
        assert_abs_diff_eq!(c.maintenance, 10_000.0);
        assert_abs_diff_eq!(c.fixed, 3_000.0);
        assert_abs_diff_eq!(c.tyres, 3_000.0);
        assert_abs_diff_eq!(c.interest, 2_000.0);
        assert_abs_diff_eq!(c.total, c.base_total() * 1.1, epsilon = 1e-6);
    }

    #[test]
    fn test_zero_divisors_resolve_to_zero() {
        let mut p = params();
        p.lifetime_years = 0.0;
        p.tyre_life_km = 0.0;
        p.battery_cost = 30_000.0;
        let c = technology_cost(30.0, FuelType::Diesel, 100_000.0, &p, TechnologyKey::Diesel, 0.0);
        assert_eq!(c.depreciation, 0.0);
        assert_eq!(c.tyres, 0.0);
        assert_eq!(c.battery, 0.0);
        assert!(c.total.is_finite());
    }

    #[test]
    fn test_battery_wear_and_subsidy() {
        let mut p = params();
        p.vehicle_price = 250_000.0;
        p.subsidy_pct = 80.0;
        p.battery_cost = 40_000.0;
        p.battery_life_km = 800_000.0;
        let c = technology_cost(30.0, FuelType::Diesel, 100_000.0, &p, TechnologyKey::Bev, 100_000.0);
        assert_abs_diff_eq!(c.battery, 5_000.0);
        // subsidy = 150000 * 0.8 = 120000; (250000 - 120000) / 2 * 4%
        assert_abs_diff_eq!(c.interest, 2_600.0);
        // 150 kWh/100km
        assert_abs_diff_eq!(c.energy, 1_000.0 * 150.0 * 1.5);
    }

    #[test]
    fn test_depreciation_not_clamped() {
        let mut p = params();
        p.replacement_value = 0.0;
        let c = technology_cost(0.0, FuelType::Diesel, 0.0, &p, TechnologyKey::Diesel, 0.0);
        assert!(c.depreciation < 0.0);
    }

    #[test]
    fn test_economy_per_year() {
        let costs = TechnologyCosts {
            diesel: 12_000.0,
            lng: 11_000.0,
            bev: 10_500.0,
        };
        assert_abs_diff_eq!(economy_per_year(FuelType::Diesel, &costs), 1_500.0);
        assert_abs_diff_eq!(economy_per_year(FuelType::Lng, &costs), 500.0);
        assert_eq!(economy_per_year(FuelType::Unknown, &costs), 0.0);
        assert_eq!(economy_per_year(FuelType::Electric, &costs), 0.0);
    }

    #[test]
    fn test_technology_costs_use_diesel_base_price() {
        let mut tco = TcoParameters {
            diesel: params(),
            lng: params(),
            bev: params(),
        };
        tco.bev.vehicle_price = 200_000.0;
        tco.bev.subsidy_pct = 50.0;
        let costs = technology_costs(30.0, FuelType::Diesel, 50_000.0, &tco);
        let bev = technology_cost(30.0, FuelType::Diesel, 50_000.0, &tco.bev, TechnologyKey::Bev, 100_000.0);
        assert_abs_diff_eq!(costs.bev, bev.total);
        assert!(costs.bev > costs.diesel);
    }
}
