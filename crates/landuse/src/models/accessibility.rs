//! Network accessibility steps. `neighborhood_vars` publishes the node
//! variables merged into model frames; `price_vars` publishes the price
//! surface the feasibility step reads for non-residential uses.

use bevy::prelude::*;

use crate::datasets::{Buildings, Households, Jobs, NodePrices, Nodes, Parcels};
use crate::error::SimError;
use crate::settings::Settings;

use super::runner::{require_aggregator, AggregationInputs, NetworkAggregation};

pub const NEIGHBORHOOD_NETWORK_CONFIG: &str = "networks.yaml";
pub const PRICE_NETWORK_CONFIG: &str = "networks2.yaml";

pub fn neighborhood_vars(
    aggregator: Option<Res<NetworkAggregation>>,
    parcels: Res<Parcels>,
    buildings: Res<Buildings>,
    households: Res<Households>,
    jobs: Res<Jobs>,
    settings: Res<Settings>,
    mut nodes: ResMut<Nodes>,
) -> Result<(), SimError> {
    let aggregator = require_aggregator(&aggregator, "neighborhood_vars")?;
    let inputs = AggregationInputs {
        parcels: &parcels,
        buildings: &buildings,
        households: &households,
        jobs: &jobs,
        settings: &settings,
    };
    let table = aggregator
        .aggregate(NEIGHBORHOOD_NETWORK_CONFIG, &inputs)
        .map_err(|e| SimError::upstream("neighborhood_vars", e))?;
    info!(
        "neighborhood_vars: {} node variables",
        table.column_names().count()
    );
    nodes.0 = table;
    Ok(())
}

pub fn price_vars(
    aggregator: Option<Res<NetworkAggregation>>,
    parcels: Res<Parcels>,
    buildings: Res<Buildings>,
    households: Res<Households>,
    jobs: Res<Jobs>,
    settings: Res<Settings>,
    mut prices: ResMut<NodePrices>,
) -> Result<(), SimError> {
    let aggregator = require_aggregator(&aggregator, "price_vars")?;
    let inputs = AggregationInputs {
        parcels: &parcels,
        buildings: &buildings,
        households: &households,
        jobs: &jobs,
        settings: &settings,
    };
    let table = aggregator
        .aggregate(PRICE_NETWORK_CONFIG, &inputs)
        .map_err(|e| SimError::upstream("price_vars", e))?;
    info!(
        "price_vars: price surface with {} columns",
        table.column_names().count()
    );
    prices.0 = Some(table);
    Ok(())
}
