//! Relocation and transition of households and jobs.
//!
//! Relocation unplaces a random share of agents so the location choice
//! models re-place them; transition grows a table by cloning random rows.

use bevy::prelude::*;
use rand::seq::index::sample;
use rand::Rng;

use crate::datasets::{Agent, Households, Jobs};
use crate::error::SimError;
use crate::settings::Settings;
use crate::sim_rng::SimRng;

/// Unplace `floor(len * rate)` agents drawn without replacement. Returns how
/// many of them had a building.
pub fn relocate<A: Agent>(agents: &mut [A], rate: f64, rng: &mut impl Rng) -> usize {
    let n = ((agents.len() as f64 * rate) as usize).min(agents.len());
    let mut moved = 0;
    for i in sample(rng, agents.len(), n) {
        if agents[i].building_id().is_some() {
            moved += 1;
        }
        agents[i].set_building_id(None);
    }
    moved
}

/// Append `round(len * rate)` copies of randomly drawn agents (with
/// replacement). Copies get fresh ids above the current maximum and no
/// building. Returns the number added.
pub fn grow<A: Agent>(agents: &mut Vec<A>, rate: f64, rng: &mut impl Rng) -> usize {
    if agents.is_empty() {
        return 0;
    }
    let n = (agents.len() as f64 * rate).round() as usize;
    let mut next_id = agents.iter().map(Agent::agent_id).max().unwrap_or(0) + 1;
    agents.reserve(n);
    for _ in 0..n {
        let source = rng.gen_range(0..agents.len());
        let mut copy = agents[source].clone();
        copy.set_agent_id(next_id);
        copy.set_building_id(None);
        next_id += 1;
        agents.push(copy);
    }
    n
}

// =============================================================================
// Systems
// =============================================================================

pub fn households_relocation(
    settings: Res<Settings>,
    mut rng: ResMut<SimRng>,
    mut households: ResMut<Households>,
) -> Result<(), SimError> {
    let moved = relocate(&mut households.0, settings.household_relocation_rate, &mut rng.0);
    info!("households_relocation: {} households moving", moved);
    Ok(())
}

pub fn jobs_relocation(
    settings: Res<Settings>,
    mut rng: ResMut<SimRng>,
    mut jobs: ResMut<Jobs>,
) -> Result<(), SimError> {
    let moved = relocate(&mut jobs.0, settings.job_relocation_rate, &mut rng.0);
    info!("jobs_relocation: {} jobs moving", moved);
    Ok(())
}

pub fn households_transition(
    settings: Res<Settings>,
    mut rng: ResMut<SimRng>,
    mut households: ResMut<Households>,
) -> Result<(), SimError> {
    let added = grow(&mut households.0, settings.household_growth_rate, &mut rng.0);
    info!(
        "households_transition: added {} households, total {}",
        added,
        households.0.len()
    );
    Ok(())
}

pub fn jobs_transition(
    settings: Res<Settings>,
    mut rng: ResMut<SimRng>,
    mut jobs: ResMut<Jobs>,
) -> Result<(), SimError> {
    let added = grow(&mut jobs.0, settings.job_growth_rate, &mut rng.0);
    info!("jobs_transition: added {} jobs, total {}", added, jobs.0.len());
    Ok(())
}
