//! Location choice: owner and renter households (hlcmo, hlcmr) choose among
//! residential buildings, jobs (elcm) among non-residential ones.
//!
//! Simulation offers one alternative row per vacant unit and places every
//! chooser without a building.

use std::collections::HashMap;

use bevy::prelude::*;

use crate::config::UNPLACED_BUILDING_ID;
use crate::datasets::{
    occupancy, Agent, AgentId, BuildingId, Buildings, FittedModels, Frame, Households, Jobs,
    Nodes, Parcels,
};
use crate::error::SimError;
use crate::settings::Settings;

use super::frames::{buildings_frame, households_frame, jobs_frame, BuildingFilter};
use super::runner::{require_runner, ModelRunner};

pub const HLCMO_CONFIG: &str = "hlcmo.yaml";
pub const HLCMR_CONFIG: &str = "hlcmr.yaml";
pub const ELCM_CONFIG: &str = "elcm.yaml";

// =============================================================================
// Helpers
// =============================================================================

/// Repeat each alternative once per vacant unit. Supply comes from
/// `supply_column`; buildings at or over capacity drop out.
pub fn vacant_units(
    alternatives: &Frame,
    supply_column: &str,
    occupied: &HashMap<BuildingId, u32>,
) -> Result<Frame, SimError> {
    let supply = alternatives.column(supply_column).ok_or_else(|| {
        SimError::config(format!("alternatives have no '{supply_column}' column"))
    })?;
    let mut rows = Vec::new();
    for (i, (id, units)) in alternatives.index().iter().zip(supply).enumerate() {
        let units = if units.is_finite() && *units > 0.0 { *units as u32 } else { 0 };
        let vacant = units.saturating_sub(occupied.get(id).copied().unwrap_or(0));
        rows.extend(std::iter::repeat(i).take(vacant as usize));
    }
    Ok(alternatives.take(&rows))
}

/// Rows of an agent frame whose building is unset.
pub fn unplaced_choosers(agents: &Frame) -> Frame {
    match agents.column("building_id") {
        Some(ids) => {
            let keep: Vec<bool> = ids.iter().map(|b| *b == UNPLACED_BUILDING_ID).collect();
            agents.filter(&keep)
        }
        None => agents.clone(),
    }
}

/// Place agents in their chosen buildings. An assignment to a building that
/// does not exist, or for an unknown agent, is a runner failure.
pub fn apply_choices<A: Agent>(
    model: &str,
    agents: &mut [A],
    choices: &HashMap<AgentId, BuildingId>,
    buildings: &Buildings,
) -> Result<usize, SimError> {
    let positions: HashMap<AgentId, usize> = agents
        .iter()
        .enumerate()
        .map(|(i, a)| (a.agent_id(), i))
        .collect();
    // Validate first so a bad assignment leaves the table untouched.
    for (agent, building) in choices {
        if !buildings.contains(*building) {
            return Err(SimError::upstream(
                model,
                format!("agent {agent} assigned to unknown building {building}"),
            ));
        }
        if !positions.contains_key(agent) {
            return Err(SimError::upstream(model, format!("unknown agent {agent}")));
        }
    }
    for (agent, building) in choices {
        if let Some(&i) = positions.get(agent) {
            agents[i].set_building_id(Some(*building));
        }
    }
    Ok(choices.len())
}

struct ChoiceSpec {
    model: &'static str,
    config: &'static str,
    filter: BuildingFilter,
    supply_column: &'static str,
}

const HLCMO_ESTIMATE: ChoiceSpec = ChoiceSpec {
    model: "hlcmo_estimate",
    config: HLCMO_CONFIG,
    filter: BuildingFilter::Residential,
    supply_column: "residential_units",
};
const HLCMO_SIMULATE: ChoiceSpec = ChoiceSpec { model: "hlcmo_simulate", ..HLCMO_ESTIMATE };
const HLCMR_ESTIMATE: ChoiceSpec = ChoiceSpec {
    model: "hlcmr_estimate",
    config: HLCMR_CONFIG,
    ..HLCMO_ESTIMATE
};
const HLCMR_SIMULATE: ChoiceSpec = ChoiceSpec { model: "hlcmr_simulate", ..HLCMR_ESTIMATE };
const ELCM_ESTIMATE: ChoiceSpec = ChoiceSpec {
    model: "elcm_estimate",
    config: ELCM_CONFIG,
    filter: BuildingFilter::NonResidential,
    supply_column: "job_spaces",
};
const ELCM_SIMULATE: ChoiceSpec = ChoiceSpec { model: "elcm_simulate", ..ELCM_ESTIMATE };

fn alternatives(
    spec: &ChoiceSpec,
    parcels: &Parcels,
    buildings: &Buildings,
    settings: &Settings,
    nodes: &Nodes,
) -> Result<Frame, SimError> {
    buildings_frame(parcels, buildings.rows(), settings, &nodes.0, true, spec.filter)
}

fn estimate_choice(
    spec: &ChoiceSpec,
    runner: &Option<Res<ModelRunner>>,
    choosers: &Frame,
    alternatives: &Frame,
    fitted: &mut FittedModels,
) -> Result<(), SimError> {
    let runner = require_runner(runner, spec.model)?;
    let params = runner
        .lcm_estimate(choosers, alternatives, spec.config)
        .map_err(|e| SimError::upstream(spec.model, e))?;
    info!(
        "{}: estimated on {} choosers, {} alternatives",
        spec.model,
        choosers.len(),
        alternatives.len()
    );
    fitted.0.insert(spec.config.to_string(), params);
    Ok(())
}

fn simulate_choice(
    spec: &ChoiceSpec,
    runner: &Option<Res<ModelRunner>>,
    agents: &Frame,
    alternatives: &Frame,
    occupied: &HashMap<BuildingId, u32>,
    fitted: &FittedModels,
) -> Result<HashMap<AgentId, BuildingId>, SimError> {
    let runner = require_runner(runner, spec.model)?;
    let choosers = unplaced_choosers(agents);
    if choosers.is_empty() {
        info!("{}: no unplaced choosers", spec.model);
        return Ok(HashMap::new());
    }
    let units = vacant_units(alternatives, spec.supply_column, occupied)?;
    if units.len() < choosers.len() {
        warn!(
            "{}: {} choosers for {} vacant units",
            spec.model,
            choosers.len(),
            units.len()
        );
    }
    runner
        .lcm_simulate(&choosers, &units, spec.config, fitted.0.get(spec.config))
        .map_err(|e| SimError::upstream(spec.model, e))
}

// =============================================================================
// Systems
// =============================================================================

#[allow(clippy::too_many_arguments)]
fn hlcm_estimate(
    spec: &ChoiceSpec,
    runner: Option<Res<ModelRunner>>,
    parcels: Res<Parcels>,
    buildings: Res<Buildings>,
    households: Res<Households>,
    settings: Res<Settings>,
    nodes: Res<Nodes>,
    mut fitted: ResMut<FittedModels>,
) -> Result<(), SimError> {
    let choosers = households_frame(&households.0)?;
    let alts = alternatives(spec, &parcels, &buildings, &settings, &nodes)?;
    estimate_choice(spec, &runner, &choosers, &alts, &mut fitted)
}

#[allow(clippy::too_many_arguments)]
fn hlcm_simulate(
    spec: &ChoiceSpec,
    runner: Option<Res<ModelRunner>>,
    parcels: Res<Parcels>,
    buildings: Res<Buildings>,
    mut households: ResMut<Households>,
    settings: Res<Settings>,
    nodes: Res<Nodes>,
    fitted: Res<FittedModels>,
) -> Result<(), SimError> {
    let agents = households_frame(&households.0)?;
    let alts = alternatives(spec, &parcels, &buildings, &settings, &nodes)?;
    let occupied = occupancy(&households.0);
    let choices = simulate_choice(spec, &runner, &agents, &alts, &occupied, &fitted)?;
    let placed = apply_choices(spec.model, &mut households.0, &choices, &buildings)?;
    info!("{}: placed {} households", spec.model, placed);
    Ok(())
}

pub fn hlcmo_estimate(
    runner: Option<Res<ModelRunner>>,
    parcels: Res<Parcels>,
    buildings: Res<Buildings>,
    households: Res<Households>,
    settings: Res<Settings>,
    nodes: Res<Nodes>,
    fitted: ResMut<FittedModels>,
) -> Result<(), SimError> {
    hlcm_estimate(&HLCMO_ESTIMATE, runner, parcels, buildings, households, settings, nodes, fitted)
}

pub fn hlcmo_simulate(
    runner: Option<Res<ModelRunner>>,
    parcels: Res<Parcels>,
    buildings: Res<Buildings>,
    households: ResMut<Households>,
    settings: Res<Settings>,
    nodes: Res<Nodes>,
    fitted: Res<FittedModels>,
) -> Result<(), SimError> {
    hlcm_simulate(&HLCMO_SIMULATE, runner, parcels, buildings, households, settings, nodes, fitted)
}

pub fn hlcmr_estimate(
    runner: Option<Res<ModelRunner>>,
    parcels: Res<Parcels>,
    buildings: Res<Buildings>,
    households: Res<Households>,
    settings: Res<Settings>,
    nodes: Res<Nodes>,
    fitted: ResMut<FittedModels>,
) -> Result<(), SimError> {
    hlcm_estimate(&HLCMR_ESTIMATE, runner, parcels, buildings, households, settings, nodes, fitted)
}

pub fn hlcmr_simulate(
    runner: Option<Res<ModelRunner>>,
    parcels: Res<Parcels>,
    buildings: Res<Buildings>,
    households: ResMut<Households>,
    settings: Res<Settings>,
    nodes: Res<Nodes>,
    fitted: Res<FittedModels>,
) -> Result<(), SimError> {
    hlcm_simulate(&HLCMR_SIMULATE, runner, parcels, buildings, households, settings, nodes, fitted)
}

pub fn elcm_estimate(
    runner: Option<Res<ModelRunner>>,
    parcels: Res<Parcels>,
    buildings: Res<Buildings>,
    jobs: Res<Jobs>,
    settings: Res<Settings>,
    nodes: Res<Nodes>,
    mut fitted: ResMut<FittedModels>,
) -> Result<(), SimError> {
    let spec = &ELCM_ESTIMATE;
    let choosers = jobs_frame(&jobs.0, &settings)?;
    let alts = alternatives(spec, &parcels, &buildings, &settings, &nodes)?;
    estimate_choice(spec, &runner, &choosers, &alts, &mut fitted)
}

pub fn elcm_simulate(
    runner: Option<Res<ModelRunner>>,
    parcels: Res<Parcels>,
    buildings: Res<Buildings>,
    mut jobs: ResMut<Jobs>,
    settings: Res<Settings>,
    nodes: Res<Nodes>,
    fitted: Res<FittedModels>,
) -> Result<(), SimError> {
    let spec = &ELCM_SIMULATE;
    let agents = jobs_frame(&jobs.0, &settings)?;
    let alts = alternatives(spec, &parcels, &buildings, &settings, &nodes)?;
    let occupied = occupancy(&jobs.0);
    let choices = simulate_choice(spec, &runner, &agents, &alts, &occupied, &fitted)?;
    let placed = apply_choices(spec.model, &mut jobs.0, &choices, &buildings)?;
    info!("{}: placed {} jobs", spec.model, placed);
    Ok(())
}
