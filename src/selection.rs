//! Vehicle selection matching: explicit members first, then CECO ranges against the
//! vehicle's current cost center.

use tracing::warn;

use crate::model::{CostCenterRange, VehicleId, VehicleSelection};

/// Total over malformed data: a cost center or bound that is not an integer is a
/// non-match for that range, never an error.
pub fn vehicle_in_selection(vehicle: &VehicleId, cost_center: Option<&str>, selection: &VehicleSelection) -> bool {
    if selection.vehicles.iter().any(|v| v == vehicle) {
        return true;
    }
    let Some(ceco) = cost_center else { return false; };
    let Some(ceco_num) = parse_ceco(ceco) else {
        warn!(
            target: "fleet_authz::selection",
            "non-numeric cost center '{}' for vehicle {}; selection {} treated as no match",
            ceco, vehicle, selection.id
        );
        return false;
    };
    selection.cost_center_ranges.iter().any(|r| range_contains(r, ceco_num, selection))
}

fn range_contains(range: &CostCenterRange, ceco: i64, selection: &VehicleSelection) -> bool {
    match (parse_ceco(&range.start_ceco), parse_ceco(&range.end_ceco)) {
        (Some(start), Some(end)) => start <= ceco && ceco <= end,
        _ => {
            warn!(
                target: "fleet_authz::selection",
                "malformed cost center range [{}, {}] in selection {}; skipped",
                range.start_ceco, range.end_ceco, selection.id
            );
            false
        }
    }
}

fn parse_ceco(s: &str) -> Option<i64> { s.parse::<i64>().ok() }
