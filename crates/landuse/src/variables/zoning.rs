//! Zoning capacity: dwelling-unit capacity per parcel and the per-form
//! is-allowed predicate.
//!
//! Zoning limits come either as a density (dwelling units per acre) or as a
//! floor-area ratio. Both are reconciled to one dwelling-unit figure with a
//! fixed gross unit size.

use crate::catalog::{Form, FormEntry};
use crate::config::{GROSS_AVE_UNIT_SIZE, UNDERBUILD_MIN_RATIO};
use crate::datasets::{ParcelId, Parcels, ZoningBaseline};
use crate::error::SimError;
use crate::settings::Settings;

// =============================================================================
// Capacity
// =============================================================================

/// Maximum dwelling units on a parcel.
///
/// Uses the density estimate (`max_dua * acres`) when defined, else the
/// floor-area estimate (`max_far * sqft / 1000`), else zero. Rounded half to
/// even and never negative.
pub fn zoned_du(
    max_dua: Option<f64>,
    parcel_acres: f64,
    max_far: Option<f64>,
    parcel_size: f64,
) -> u32 {
    let density = max_dua.map(|dua| dua * parcel_acres).filter(|v| v.is_finite());
    let floor_area = max_far
        .map(|far| far * parcel_size / GROSS_AVE_UNIT_SIZE)
        .filter(|v| v.is_finite());
    let estimate = density.or(floor_area).unwrap_or(0.0);
    estimate.round_ties_even().max(0.0) as u32
}

/// Additional units allowed beyond what exists, or zero when the increment is
/// not more than half the existing stock. An empty parcel with any capacity
/// always qualifies.
pub fn zoned_du_underbuild(zoned_du: u32, existing_units: u32) -> u32 {
    let increment = zoned_du.saturating_sub(existing_units);
    if increment == 0 {
        return 0;
    }
    if existing_units == 0 {
        return increment;
    }
    let ratio = increment as f64 / existing_units as f64;
    if ratio > UNDERBUILD_MIN_RATIO {
        increment
    } else {
        0
    }
}

/// Baseline value under the baseline scenario; otherwise the larger of the
/// baseline and the upzone, ignoring whichever is missing.
pub fn conditional_upzone(baseline: Option<f64>, upzone: Option<f64>, is_baseline: bool) -> Option<f64> {
    if is_baseline {
        return baseline;
    }
    match (baseline, upzone) {
        (Some(b), Some(u)) => Some(b.max(u)),
        (b, u) => b.or(u),
    }
}

/// PDA density floor: parcels inside a PDA, outside the exempt counties, get at
/// least `pda_min_dua` units per acre (missing density counts as the floor).
pub fn apply_pda_dua_floor(
    max_dua: Option<f64>,
    pda: Option<&str>,
    county_id: u32,
    settings: &Settings,
) -> Option<f64> {
    let floor_applies =
        pda.is_some() && !settings.pda_floor_exempt_counties.contains(&county_id);
    if !floor_applies {
        return max_dua;
    }
    let floor = settings.pda_min_dua;
    Some(max_dua.filter(|v| !v.is_nan()).unwrap_or(floor).max(floor))
}

// =============================================================================
// Is-allowed predicate
// =============================================================================

/// True when any of the codes has positive zoned capacity on the parcel.
/// Parcels with no zoning row, or no value for a code, are not allowed.
pub fn is_allowed_on(zoning: &ZoningBaseline, parcel_id: ParcelId, codes: &[u32]) -> bool {
    codes
        .iter()
        .any(|&code| zoning.capacity(parcel_id, code).is_some_and(|c| c > 0.0))
}

/// Per-parcel allowance for a form, aligned with the parcel rows.
///
/// A code the zoning table does not define at all is a configuration error:
/// the form could never be evaluated correctly.
pub fn is_allowed(
    form: Form,
    entry: &FormEntry,
    parcels: &Parcels,
    zoning: &ZoningBaseline,
) -> Result<Vec<bool>, SimError> {
    if let Some(code) = entry.building_types.iter().find(|c| !zoning.defines(**c)) {
        return Err(SimError::config(format!(
            "form '{form}' references building type {code}, which the zoning table does not define"
        )));
    }
    Ok(parcels
        .rows()
        .iter()
        .map(|p| is_allowed_on(zoning, p.parcel_id, &entry.building_types))
        .collect())
}
