//! Square-foot pro-forma development feasibility.
//!
//! For each parcel and each building form in the catalog, the engine checks
//! whether zoning allows the form and, if so, walks the discrete FAR steps and
//! parking configurations up to the parcel's zoned maximum, keeping the one
//! with the greatest margin of capitalized revenue over construction and land
//! cost:
//!
//!   `revenue = bulk * efficiency * weighted_rent / cap_rate`
//!   `profit  = revenue - bulk * cost_per_sqft - land_cost`
//!
//! Only parcels with a positive best margin get a record. The table is
//! rebuilt from scratch on every run.

pub mod config;
pub mod cost_table;
pub mod lookup;
pub mod systems;
pub mod types;

#[cfg(test)]
mod tests;

use bevy::prelude::*;

pub use config::{ParkingConfig, ProFormaConfig};
pub use cost_table::{CostEntry, CostTable};
pub use lookup::{evaluate_parcel, max_far_for_form, weighted_rent, ParcelInputs};
pub use systems::{compute_feasibility, run_feasibility, FeasibilityInputs};
pub use types::{FeasibilityRecord, FeasibilityTable};

// =============================================================================
// Plugin
// =============================================================================

pub struct FeasibilityPlugin;

impl Plugin for FeasibilityPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ProFormaConfig>()
            .init_resource::<FeasibilityTable>();
    }
}
