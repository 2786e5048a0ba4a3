//! Model dispatch: every model name maps to a `ModelId`, and every id to a
//! one-shot system registered in the world at startup.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use bevy::ecs::system::SystemId;
use bevy::prelude::*;

use crate::error::SimError;
use crate::models::{
    elcm_estimate, elcm_simulate, hlcmo_estimate, hlcmo_simulate, hlcmr_estimate, hlcmr_simulate,
    households_relocation, households_transition, jobs_relocation, jobs_transition,
    neighborhood_vars, nrh_estimate, nrh_simulate, price_vars, rrh_estimate, rrh_simulate,
    rsh_estimate, rsh_simulate,
};
use crate::proforma::run_feasibility;
use crate::SimYear;

/// A registered model system.
pub type ModelSystem = SystemId<(), Result<(), SimError>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModelId {
    RshEstimate,
    RshSimulate,
    RrhEstimate,
    RrhSimulate,
    NrhEstimate,
    NrhSimulate,
    HlcmoEstimate,
    HlcmoSimulate,
    HlcmrEstimate,
    HlcmrSimulate,
    ElcmEstimate,
    ElcmSimulate,
    HouseholdsRelocation,
    JobsRelocation,
    HouseholdsTransition,
    JobsTransition,
    NeighborhoodVars,
    PriceVars,
    Feasibility,
}

impl ModelId {
    pub const ALL: [ModelId; 19] = [
        ModelId::RshEstimate,
        ModelId::RshSimulate,
        ModelId::RrhEstimate,
        ModelId::RrhSimulate,
        ModelId::NrhEstimate,
        ModelId::NrhSimulate,
        ModelId::HlcmoEstimate,
        ModelId::HlcmoSimulate,
        ModelId::HlcmrEstimate,
        ModelId::HlcmrSimulate,
        ModelId::ElcmEstimate,
        ModelId::ElcmSimulate,
        ModelId::HouseholdsRelocation,
        ModelId::JobsRelocation,
        ModelId::HouseholdsTransition,
        ModelId::JobsTransition,
        ModelId::NeighborhoodVars,
        ModelId::PriceVars,
        ModelId::Feasibility,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ModelId::RshEstimate => "rsh_estimate",
            ModelId::RshSimulate => "rsh_simulate",
            ModelId::RrhEstimate => "rrh_estimate",
            ModelId::RrhSimulate => "rrh_simulate",
            ModelId::NrhEstimate => "nrh_estimate",
            ModelId::NrhSimulate => "nrh_simulate",
            ModelId::HlcmoEstimate => "hlcmo_estimate",
            ModelId::HlcmoSimulate => "hlcmo_simulate",
            ModelId::HlcmrEstimate => "hlcmr_estimate",
            ModelId::HlcmrSimulate => "hlcmr_simulate",
            ModelId::ElcmEstimate => "elcm_estimate",
            ModelId::ElcmSimulate => "elcm_simulate",
            ModelId::HouseholdsRelocation => "households_relocation",
            ModelId::JobsRelocation => "jobs_relocation",
            ModelId::HouseholdsTransition => "households_transition",
            ModelId::JobsTransition => "jobs_transition",
            ModelId::NeighborhoodVars => "neighborhood_vars",
            ModelId::PriceVars => "price_vars",
            ModelId::Feasibility => "feasibility",
        }
    }

    fn register(self, world: &mut World) -> ModelSystem {
        match self {
            ModelId::RshEstimate => world.register_system(rsh_estimate),
            ModelId::RshSimulate => world.register_system(rsh_simulate),
            ModelId::RrhEstimate => world.register_system(rrh_estimate),
            ModelId::RrhSimulate => world.register_system(rrh_simulate),
            ModelId::NrhEstimate => world.register_system(nrh_estimate),
            ModelId::NrhSimulate => world.register_system(nrh_simulate),
            ModelId::HlcmoEstimate => world.register_system(hlcmo_estimate),
            ModelId::HlcmoSimulate => world.register_system(hlcmo_simulate),
            ModelId::HlcmrEstimate => world.register_system(hlcmr_estimate),
            ModelId::HlcmrSimulate => world.register_system(hlcmr_simulate),
            ModelId::ElcmEstimate => world.register_system(elcm_estimate),
            ModelId::ElcmSimulate => world.register_system(elcm_simulate),
            ModelId::HouseholdsRelocation => world.register_system(households_relocation),
            ModelId::JobsRelocation => world.register_system(jobs_relocation),
            ModelId::HouseholdsTransition => world.register_system(households_transition),
            ModelId::JobsTransition => world.register_system(jobs_transition),
            ModelId::NeighborhoodVars => world.register_system(neighborhood_vars),
            ModelId::PriceVars => world.register_system(price_vars),
            ModelId::Feasibility => world.register_system(run_feasibility),
        }
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelId {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelId::ALL
            .into_iter()
            .find(|id| id.name() == s)
            .ok_or_else(|| SimError::config(format!("unknown model '{s}'")))
    }
}

/// Parse an ordered list of model names. The first unknown name fails.
pub fn parse_models<S: AsRef<str>>(names: &[S]) -> Result<Vec<ModelId>, SimError> {
    names.iter().map(|n| n.as_ref().parse()).collect()
}

// =============================================================================
// Registry
// =============================================================================

/// Every model's registered system, resolved once at startup.
#[derive(Resource, Debug, Default)]
pub struct ModelRegistry {
    systems: HashMap<ModelId, ModelSystem>,
}

impl ModelRegistry {
    pub fn build(world: &mut World) -> Self {
        let systems = ModelId::ALL
            .into_iter()
            .map(|id| (id, id.register(world)))
            .collect();
        Self { systems }
    }

    pub fn get(&self, id: ModelId) -> Option<ModelSystem> {
        self.systems.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }
}

// =============================================================================
// Driver
// =============================================================================

pub fn run_model(world: &mut World, id: ModelId) -> Result<(), SimError> {
    let system = world
        .get_resource::<ModelRegistry>()
        .and_then(|r| r.get(id))
        .ok_or_else(|| SimError::Dispatch(format!("model '{id}' is not registered")))?;
    world
        .run_system(system)
        .map_err(|e| SimError::Dispatch(format!("model '{id}': {e}")))?
}

/// Run `models` in order for each year. Stops at the first failing model.
pub fn run_models(
    world: &mut World,
    models: &[ModelId],
    years: impl IntoIterator<Item = u32>,
) -> Result<(), SimError> {
    for year in years {
        world.insert_resource(SimYear(year));
        info!("Running year {}", year);
        let year_start = Instant::now();
        for &id in models {
            info!("Running model '{}'", id);
            let start = Instant::now();
            run_model(world, id)?;
            info!(
                "Time to execute model '{}': {:.2}s",
                id,
                start.elapsed().as_secs_f64()
            );
        }
        info!(
            "Time to execute year {}: {:.2}s",
            year,
            year_start.elapsed().as_secs_f64()
        );
    }
    Ok(())
}
