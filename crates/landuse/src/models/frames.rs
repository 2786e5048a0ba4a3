//! Numeric frames handed to the statistical runner, with node variables
//! merged in through each row's parcel.

use std::collections::BTreeSet;

use crate::config::{RESIDENTIAL_GENERAL_TYPE, UNPLACED_BUILDING_ID};
use crate::datasets::{
    Agent, Building, CostarRecord, Frame, Household, Job, NodeId, NodeTable, Parcels,
    TrainingRecord,
};
use crate::error::SimError;
use crate::settings::Settings;
use crate::variables::{
    building_general_type, building_node_id, building_zone_id, costar_node_id, costar_zone_id,
    job_empsix_id, job_naics,
};

/// Which buildings a location choice model sees as alternatives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildingFilter {
    All,
    /// General type is residential.
    Residential,
    /// General type is anything else, including unmapped types.
    NonResidential,
}

impl BuildingFilter {
    pub fn keeps(self, general_type: Option<&str>) -> bool {
        let residential = general_type == Some(RESIDENTIAL_GENERAL_TYPE);
        match self {
            BuildingFilter::All => true,
            BuildingFilter::Residential => residential,
            BuildingFilter::NonResidential => !residential,
        }
    }
}

fn or_zero(v: Option<f64>) -> f64 {
    v.filter(|x| x.is_finite()).unwrap_or(0.0)
}

fn or_nan<T: Into<f64>>(v: Option<T>) -> f64 {
    v.map(Into::into).unwrap_or(f64::NAN)
}

/// Buildings with their own columns zero-filled, then node variables merged
/// (node gaps stay `NaN`).
pub fn buildings_frame(
    parcels: &Parcels,
    buildings: &[Building],
    settings: &Settings,
    nodes: &NodeTable,
    add_prices: bool,
    filter: BuildingFilter,
) -> Result<Frame, SimError> {
    let rows: Vec<&Building> = buildings
        .iter()
        .filter(|b| filter.keeps(building_general_type(settings, b)))
        .collect();

    let mut frame = Frame::new(rows.iter().map(|b| b.building_id).collect());
    let col = |f: &dyn Fn(&Building) -> f64| rows.iter().map(|b| f(*b)).collect::<Vec<f64>>();

    frame.insert_column("building_type_id", col(&|b| b.building_type_id as f64))?;
    frame.insert_column("residential_units", col(&|b| b.residential_units as f64))?;
    frame.insert_column("non_residential_sqft", col(&|b| b.non_residential_sqft))?;
    frame.insert_column("building_sqft", col(&|b| b.building_sqft))?;
    frame.insert_column("job_spaces", col(&|b| b.job_spaces as f64))?;
    frame.insert_column(
        "zone_id",
        col(&|b| building_zone_id(parcels, b).map_or(0.0, |z| z as f64)),
    )?;
    if add_prices {
        frame.insert_column(
            "residential_sales_price",
            col(&|b| or_zero(b.residential_sales_price)),
        )?;
        frame.insert_column("residential_rent", col(&|b| or_zero(b.residential_rent)))?;
        frame.insert_column(
            "non_residential_rent",
            col(&|b| or_zero(b.non_residential_rent)),
        )?;
    }

    let node_ids: Vec<Option<NodeId>> = rows.iter().map(|b| building_node_id(parcels, b)).collect();
    frame.merge_nodes(&node_ids, nodes)?;
    Ok(frame)
}

pub fn households_frame(households: &[Household]) -> Result<Frame, SimError> {
    Frame::new(households.iter().map(Agent::agent_id).collect())
        .with_column("building_id", building_ids(households))?
        .with_column("persons", households.iter().map(|h| h.persons as f64).collect())?
        .with_column("income", households.iter().map(|h| h.income).collect())
}

pub fn jobs_frame(jobs: &[Job], settings: &Settings) -> Result<Frame, SimError> {
    Frame::new(jobs.iter().map(Agent::agent_id).collect())
        .with_column("building_id", building_ids(jobs))?
        .with_column("naics", jobs.iter().map(|j| job_naics(j) as f64).collect())?
        .with_column(
            "empsix_id",
            jobs.iter().map(|j| or_nan(job_empsix_id(settings, j))).collect(),
        )
}

fn building_ids<A: Agent>(agents: &[A]) -> Vec<f64> {
    agents
        .iter()
        .map(|a| a.building_id().map_or(UNPLACED_BUILDING_ID, |b| b as f64))
        .collect()
}

/// Home sales or apartment observations. Each value key becomes a column;
/// records lacking a key get `NaN`.
pub fn training_frame(
    records: &[TrainingRecord],
    parcels: &Parcels,
    nodes: &NodeTable,
) -> Result<Frame, SimError> {
    let keys: BTreeSet<&str> = records
        .iter()
        .flat_map(|r| r.values.keys().map(String::as_str))
        .collect();
    let mut frame = Frame::new(records.iter().map(|r| r.record_id).collect());
    for key in keys {
        frame.insert_column(
            key,
            records.iter().map(|r| or_nan(r.values.get(key).copied())).collect(),
        )?;
    }
    let node_ids: Vec<Option<NodeId>> = records
        .iter()
        .map(|r| parcels.get(r.parcel_id).and_then(|p| p.node_id))
        .collect();
    frame.merge_nodes(&node_ids, nodes)?;
    Ok(frame)
}

pub fn costar_frame(
    records: &[CostarRecord],
    parcels: &Parcels,
    nodes: &NodeTable,
) -> Result<Frame, SimError> {
    let mut frame = Frame::new(records.iter().map(|r| r.record_id).collect())
        .with_column("rent", records.iter().map(|r| or_nan(r.rent())).collect())?
        .with_column("stories", records.iter().map(|r| or_nan(r.stories())).collect())?
        .with_column(
            "zone_id",
            records
                .iter()
                .map(|r| costar_zone_id(parcels, r).map_or(0.0, |z| z as f64))
                .collect(),
        )?;
    let node_ids: Vec<Option<NodeId>> = records.iter().map(|r| costar_node_id(parcels, r)).collect();
    frame.merge_nodes(&node_ids, nodes)?;
    Ok(frame)
}
