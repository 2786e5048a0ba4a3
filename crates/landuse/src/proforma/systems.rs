//! Feasibility step: evaluate every catalog form on every parcel and publish
//! the feasibility table.

use std::collections::{BTreeMap, BTreeSet};

use bevy::prelude::*;

use crate::catalog::{FormCatalog, Use};
use crate::datasets::{Buildings, NodePrices, NodeTable, Parcels, ScenarioInputs, ZoningBaseline};
use crate::error::SimError;
use crate::settings::Settings;
use crate::variables::{is_allowed, land_cost, ParcelPrices, ParcelVariables};
use crate::SimYear;

use super::config::ProFormaConfig;
use super::cost_table::CostTable;
use super::lookup::{evaluate_parcel, ParcelInputs};
use super::types::FeasibilityTable;

/// Tables the feasibility computation reads.
pub struct FeasibilityInputs<'a> {
    pub parcels: &'a Parcels,
    pub buildings: &'a Buildings,
    pub zoning: &'a ZoningBaseline,
    pub scenario: &'a ScenarioInputs,
    pub node_prices: Option<&'a NodeTable>,
    pub settings: &'a Settings,
}

/// Build a fresh feasibility table. Configuration problems (undefined zoning
/// code, a price surface missing a needed use) abort the whole computation;
/// per-parcel data gaps only drop that parcel.
pub fn compute_feasibility(
    inputs: &FeasibilityInputs,
    catalog: &FormCatalog,
    config: &ProFormaConfig,
    year: Option<u32>,
) -> Result<FeasibilityTable, SimError> {
    let vars = ParcelVariables::compute(
        inputs.parcels,
        inputs.buildings,
        inputs.zoning,
        inputs.scenario,
        inputs.settings,
    );
    let price_source = ParcelPrices::new(
        inputs.parcels,
        inputs.buildings,
        &vars,
        inputs.node_prices,
        inputs.settings,
    );

    let needed: BTreeSet<Use> = catalog
        .iter()
        .flat_map(|(_, entry)| entry.uses.iter().map(|(u, _)| *u))
        .collect();
    let mut prices: BTreeMap<Use, Vec<Option<f64>>> = BTreeMap::new();
    for use_ in needed {
        prices.insert(use_, price_source.price_for_use(use_)?);
    }
    let residential = match prices.get(&Use::Residential) {
        Some(p) => p.clone(),
        None => price_source.residential(),
    };

    let costs = CostTable::generate(catalog, config)?;
    let mut table = FeasibilityTable::new(year);

    for (form, entry) in catalog.iter() {
        table.ensure_section(form);
        let allowed = is_allowed(form, entry, inputs.parcels, inputs.zoning)?;
        let mut n_allowed = 0usize;
        let mut n_unpriced = 0usize;
        let mut n_feasible = 0usize;

        for (i, parcel) in inputs.parcels.rows().iter().enumerate() {
            if !allowed[i] {
                continue;
            }
            n_allowed += 1;
            let v = &vars.rows[i];

            let mut parcel_prices = BTreeMap::new();
            for (use_, _) in &entry.uses {
                if let Some(price) = prices.get(use_).and_then(|p| p[i]) {
                    parcel_prices.insert(*use_, price);
                }
            }
            if parcel_prices.len() < entry.uses.len() {
                n_unpriced += 1;
                continue;
            }

            let parcel_inputs = ParcelInputs {
                parcel_id: parcel.parcel_id,
                parcel_size: parcel.parcel_size,
                parcel_acres: parcel.parcel_acres,
                max_far: v.max_far,
                max_height: v.max_height,
                max_dua: v.max_dua,
                nodev: v.nodev,
                land_cost: land_cost(v.total_sqft, residential[i], parcel.parcel_size),
                prices: parcel_prices,
            };
            if let Some(record) =
                evaluate_parcel(form, entry, costs.entries(form), &parcel_inputs, config)
            {
                table.insert(form, parcel.parcel_id, record);
                n_feasible += 1;
            }
        }

        if n_unpriced > 0 {
            debug!("Feasibility {}: {} allowed parcels have no price", form, n_unpriced);
        }
        info!(
            "Feasibility {}: {} allowed, {} feasible",
            form, n_allowed, n_feasible
        );
    }

    Ok(table)
}

/// Recompute and fully replace the feasibility table.
#[allow(clippy::too_many_arguments)]
pub fn run_feasibility(
    parcels: Res<Parcels>,
    buildings: Res<Buildings>,
    zoning: Res<ZoningBaseline>,
    scenario: Res<ScenarioInputs>,
    node_prices: Res<NodePrices>,
    settings: Res<Settings>,
    catalog: Res<FormCatalog>,
    config: Res<ProFormaConfig>,
    year: Option<Res<SimYear>>,
    mut table: ResMut<FeasibilityTable>,
) -> Result<(), SimError> {
    if node_prices.0.is_none() {
        warn!("Node price surface not computed; non-residential prices are zero");
    }
    let inputs = FeasibilityInputs {
        parcels: &parcels,
        buildings: &buildings,
        zoning: &zoning,
        scenario: &scenario,
        node_prices: node_prices.0.as_ref(),
        settings: &settings,
    };
    let fresh = compute_feasibility(&inputs, &catalog, &config, year.map(|y| y.0))?;
    info!(
        "Feasibility table: {} records over {} parcels",
        fresh.len(),
        parcels.len()
    );
    table.replace(fresh);
    Ok(())
}
