//! Simulation models wired to the external runner and aggregator: hedonic
//! prices, location choice, relocation and transition, and network
//! accessibility.

pub mod accessibility;
pub mod frames;
pub mod hedonic;
pub mod location_choice;
pub mod reference;
pub mod relocation;
pub mod runner;


use bevy::prelude::*;

pub use accessibility::{neighborhood_vars, price_vars};
pub use frames::{buildings_frame, costar_frame, households_frame, jobs_frame, training_frame, BuildingFilter};
pub use hedonic::{
    nrh_estimate, nrh_simulate, rrh_estimate, rrh_simulate, rsh_estimate, rsh_simulate,
    PriceColumn,
};
pub use location_choice::{
    elcm_estimate, elcm_simulate, hlcmo_estimate, hlcmo_simulate, hlcmr_estimate, hlcmr_simulate,
};
pub use reference::{CoefficientRunner, NodeAggregator};
pub use relocation::{households_relocation, households_transition, jobs_relocation, jobs_transition};
pub use runner::{
    AggregationInputs, ModelRunner, NetworkAggregation, NetworkAggregator, RunnerError,
    StatisticalRunner,
};

// =============================================================================
// Plugin
// =============================================================================

/// Installs the built-in runner and aggregator unless the app already
/// provided its own.
pub struct ModelsPlugin;

impl Plugin for ModelsPlugin {
    fn build(&self, app: &mut App) {
        if !app.world().contains_resource::<ModelRunner>() {
            app.insert_resource(ModelRunner::new(CoefficientRunner));
        }
        if !app.world().contains_resource::<NetworkAggregation>() {
            app.insert_resource(NetworkAggregation::new(NodeAggregator));
        }
    }
}
