use crate::types::{FuelType, RawTrip, TourId, VehicleRecord};
use crate::util::{cell_f64, cell_i64, cell_text};
use crate::workbook::{Cell, Sheet};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub missing_vehicle_id: usize,
    pub missing_columns: Vec<&'static str>,
}

const TRIP_COLUMNS: [&str; 6] = [
    "tourid",
    "vehicleid",
    "starttime",
    "endtime",
    "mileage",
    "fuelconsumption",
];

/// Column positions of the trip sheet; absent columns read as empty cells.
struct TripColumns {
    tour_id: Option<usize>,
    vehicle_id: Option<usize>,
    start: Option<usize>,
    end: Option<usize>,
    mileage: Option<usize>,
    fuel: Option<usize>,
}

fn field(row: &[Cell], col: Option<usize>) -> Cell {
    col.and_then(|c| row.get(c)).cloned().unwrap_or(Cell::Empty)
}

/// Integral ids stay numeric so `"2"` and `2.0` compare equal; anything
/// else keeps its text.
fn tour_id(cell: &Cell) -> Option<TourId> {
    cell_i64(cell)
        .map(TourId::Number)
        .or_else(|| cell_text(cell).map(TourId::Text))
}

/// Read trip rows from the `tours` sheet. Timestamps stay unparsed; rows
/// without a vehicle id cannot be attributed and are dropped here.
pub fn load_trips(sheet: &Sheet) -> (Vec<RawTrip>, LoadReport) {
    let cols = TripColumns {
        tour_id: sheet.column("tourid"),
        vehicle_id: sheet.column("vehicleid"),
        start: sheet.column("starttime"),
        end: sheet.column("endtime"),
        mileage: sheet.column("mileage"),
        fuel: sheet.column("fuelconsumption"),
    };
    let missing_columns: Vec<&'static str> = TRIP_COLUMNS
        .into_iter()
        .filter(|name| sheet.column(name).is_none())
        .collect();
    if !missing_columns.is_empty() {
        warn!(?missing_columns, "trip sheet lacks columns, values treated as absent");
    }

    let mut total_rows = 0usize;
    let mut missing_vehicle_id = 0usize;
    let mut trips = Vec::new();

    for row in sheet.data_rows() {
        total_rows += 1;
        let Some(vehicle_id) = cell_i64(&field(row, cols.vehicle_id)) else {
            missing_vehicle_id += 1;
            continue;
        };
        trips.push(RawTrip {
            tour_id: tour_id(&field(row, cols.tour_id)),
            vehicle_id,
            start: field(row, cols.start),
            end: field(row, cols.end),
            mileage: cell_f64(&field(row, cols.mileage)),
            fuel_consumption: cell_f64(&field(row, cols.fuel)),
        });
    }

    let report = LoadReport {
        total_rows,
        loaded_rows: trips.len(),
        missing_vehicle_id,
        missing_columns,
    };
    info!(
        total = report.total_rows,
        loaded = report.loaded_rows,
        skipped = report.missing_vehicle_id,
        "loaded trip rows"
    );
    (trips, report)
}

/// Read the vehicle registry from the `vehicles` sheet.
pub fn load_vehicles(sheet: &Sheet) -> Vec<VehicleRecord> {
    let Some(id_col) = sheet.column("vehicleid") else {
        warn!("vehicle sheet has no vehicleid column, every trip maps to unknown fuel");
        return Vec::new();
    };
    let license_col = sheet.column("licenseno");
    let fuel_col = sheet.column("fueltypes");

    let vehicles: Vec<VehicleRecord> = sheet
        .data_rows()
        .filter_map(|row| {
            let vehicle_id = cell_i64(&field(row, Some(id_col)))?;
            Some(VehicleRecord {
                vehicle_id,
                license_no: cell_text(&field(row, license_col)),
                fuel_type: normalize_fuel_type(&field(row, fuel_col)),
            })
        })
        .collect();
    debug!(count = vehicles.len(), "loaded vehicle registry");
    vehicles
}

/// Map free-text fuel descriptions onto the known fuel types.
///
/// Checks run in a fixed order, so `"Diesel/LNG dual"` counts as LNG.
pub fn normalize_fuel_type(cell: &Cell) -> FuelType {
    let Cell::Text(raw) = cell else {
        return FuelType::Unknown;
    };
    let text = raw.trim().to_lowercase();
    if text.is_empty() || text == "{}" || text == "nan" {
        FuelType::Unknown
    } else if text.contains("lng") {
        FuelType::Lng
    } else if text.contains("diesel") {
        FuelType::Diesel
    } else if text.contains("electric") || text.contains("bev") {
        FuelType::Electric
    } else if text.contains("petrol") || text.contains("gasoline") {
        FuelType::Petrol
    } else {
        FuelType::Unknown
    }
}
