//! Hedonic price models: residential sales (rsh), residential rent (rrh) and
//! non-residential rent (nrh).
//!
//! Estimation hands the observations to the runner and keeps the fitted
//! parameters; simulation predicts a price for every building and writes it
//! back onto the buildings table.

use std::collections::HashMap;

use bevy::prelude::*;

use crate::datasets::{
    Apartments, Building, BuildingId, Buildings, Costar, FittedModels, Frame, HomeSales, Nodes,
    Parcels,
};
use crate::error::SimError;
use crate::settings::Settings;

use super::frames::{buildings_frame, costar_frame, training_frame, BuildingFilter};
use super::runner::{require_runner, ModelRunner, StatisticalRunner};

pub const RSH_CONFIG: &str = "rsh.yaml";
pub const RRH_CONFIG: &str = "rrh.yaml";
pub const NRH_CONFIG: &str = "nrh.yaml";

/// Building column a hedonic simulation writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceColumn {
    ResidentialSalesPrice,
    ResidentialRent,
    NonResidentialRent,
}

impl PriceColumn {
    pub fn name(self) -> &'static str {
        match self {
            PriceColumn::ResidentialSalesPrice => "residential_sales_price",
            PriceColumn::ResidentialRent => "residential_rent",
            PriceColumn::NonResidentialRent => "non_residential_rent",
        }
    }

    pub fn set(self, building: &mut Building, value: f64) {
        let slot = match self {
            PriceColumn::ResidentialSalesPrice => &mut building.residential_sales_price,
            PriceColumn::ResidentialRent => &mut building.residential_rent,
            PriceColumn::NonResidentialRent => &mut building.non_residential_rent,
        };
        *slot = Some(value).filter(|v| v.is_finite());
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn estimate(
    model: &str,
    config: &str,
    runner: &dyn StatisticalRunner,
    frame: &Frame,
    fitted: &mut FittedModels,
) -> Result<(), SimError> {
    let params = runner
        .hedonic_estimate(frame, config)
        .map_err(|e| SimError::upstream(model, e))?;
    info!(
        "{}: estimated on {} observations, {} coefficients",
        model,
        frame.len(),
        params.coefficients.len()
    );
    fitted.0.insert(config.to_string(), params);
    Ok(())
}

/// Write simulated values back by building id. The runner must return one
/// value per frame row.
pub fn write_back(
    model: &str,
    buildings: &mut Buildings,
    ids: &[BuildingId],
    values: &[f64],
    column: PriceColumn,
) -> Result<(), SimError> {
    if ids.len() != values.len() {
        return Err(SimError::upstream(
            model,
            format!("returned {} values for {} buildings", values.len(), ids.len()),
        ));
    }
    let by_id: HashMap<BuildingId, f64> = ids.iter().copied().zip(values.iter().copied()).collect();
    for b in buildings.rows_mut() {
        if let Some(v) = by_id.get(&b.building_id) {
            column.set(b, *v);
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn simulate(
    model: &str,
    config: &str,
    column: PriceColumn,
    runner: &dyn StatisticalRunner,
    parcels: &Parcels,
    settings: &Settings,
    nodes: &Nodes,
    fitted: &FittedModels,
    buildings: &mut Buildings,
) -> Result<(), SimError> {
    let frame = buildings_frame(
        parcels,
        buildings.rows(),
        settings,
        &nodes.0,
        false,
        BuildingFilter::All,
    )?;
    let values = runner
        .hedonic_simulate(&frame, config, fitted.0.get(config))
        .map_err(|e| SimError::upstream(model, e))?;
    write_back(model, buildings, frame.index(), &values, column)?;
    info!("{}: simulated {} for {} buildings", model, column.name(), frame.len());
    Ok(())
}

// =============================================================================
// Systems
// =============================================================================

pub fn rsh_estimate(
    runner: Option<Res<ModelRunner>>,
    parcels: Res<Parcels>,
    homesales: Res<HomeSales>,
    nodes: Res<Nodes>,
    mut fitted: ResMut<FittedModels>,
) -> Result<(), SimError> {
    let runner = require_runner(&runner, "rsh_estimate")?;
    let frame = training_frame(&homesales.0, &parcels, &nodes.0)?;
    estimate("rsh_estimate", RSH_CONFIG, runner, &frame, &mut fitted)
}

pub fn rsh_simulate(
    runner: Option<Res<ModelRunner>>,
    parcels: Res<Parcels>,
    settings: Res<Settings>,
    nodes: Res<Nodes>,
    fitted: Res<FittedModels>,
    mut buildings: ResMut<Buildings>,
) -> Result<(), SimError> {
    let runner = require_runner(&runner, "rsh_simulate")?;
    simulate(
        "rsh_simulate",
        RSH_CONFIG,
        PriceColumn::ResidentialSalesPrice,
        runner,
        &parcels,
        &settings,
        &nodes,
        &fitted,
        &mut buildings,
    )
}

pub fn rrh_estimate(
    runner: Option<Res<ModelRunner>>,
    parcels: Res<Parcels>,
    apartments: Res<Apartments>,
    nodes: Res<Nodes>,
    mut fitted: ResMut<FittedModels>,
) -> Result<(), SimError> {
    let runner = require_runner(&runner, "rrh_estimate")?;
    let frame = training_frame(&apartments.0, &parcels, &nodes.0)?;
    estimate("rrh_estimate", RRH_CONFIG, runner, &frame, &mut fitted)
}

pub fn rrh_simulate(
    runner: Option<Res<ModelRunner>>,
    parcels: Res<Parcels>,
    settings: Res<Settings>,
    nodes: Res<Nodes>,
    fitted: Res<FittedModels>,
    mut buildings: ResMut<Buildings>,
) -> Result<(), SimError> {
    let runner = require_runner(&runner, "rrh_simulate")?;
    simulate(
        "rrh_simulate",
        RRH_CONFIG,
        PriceColumn::ResidentialRent,
        runner,
        &parcels,
        &settings,
        &nodes,
        &fitted,
        &mut buildings,
    )
}

pub fn nrh_estimate(
    runner: Option<Res<ModelRunner>>,
    parcels: Res<Parcels>,
    costar: Res<Costar>,
    nodes: Res<Nodes>,
    mut fitted: ResMut<FittedModels>,
) -> Result<(), SimError> {
    let runner = require_runner(&runner, "nrh_estimate")?;
    let frame = costar_frame(&costar.0, &parcels, &nodes.0)?;
    estimate("nrh_estimate", NRH_CONFIG, runner, &frame, &mut fitted)
}

pub fn nrh_simulate(
    runner: Option<Res<ModelRunner>>,
    parcels: Res<Parcels>,
    settings: Res<Settings>,
    nodes: Res<Nodes>,
    fitted: Res<FittedModels>,
    mut buildings: ResMut<Buildings>,
) -> Result<(), SimError> {
    let runner = require_runner(&runner, "nrh_simulate")?;
    simulate(
        "nrh_simulate",
        NRH_CONFIG,
        PriceColumn::NonResidentialRent,
        runner,
        &parcels,
        &settings,
        &nodes,
        &fitted,
        &mut buildings,
    )
}
