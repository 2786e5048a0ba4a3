//! Input and output tables, one ECS resource per table.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::ZONING_BUILDING_TYPE_CODES;

pub type ParcelId = i64;
pub type BuildingId = i64;
pub type AgentId = i64;
pub type NodeId = i64;
pub type ZoneId = i64;

// =============================================================================
// Parcels
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parcel {
    pub parcel_id: ParcelId,
    pub parcel_acres: f64,
    /// Land area in square feet.
    pub parcel_size: f64,
    pub zone_id: ZoneId,
    pub county_id: u32,
    /// Priority development area, used for price shifters and the density floor.
    #[serde(default)]
    pub pda: Option<String>,
    #[serde(default)]
    pub node_id: Option<NodeId>,
}

/// Parcel table. Row order is stable and every per-parcel series computed
/// from it is aligned with [`Parcels::rows`].
#[derive(Resource, Debug, Clone, Default)]
pub struct Parcels {
    rows: Vec<Parcel>,
    index: HashMap<ParcelId, usize>,
}

impl Parcels {
    pub fn new(rows: Vec<Parcel>) -> Self {
        let mut parcels = Self::default();
        for row in rows {
            parcels.push(row);
        }
        parcels
    }

    /// Append a parcel, replacing any existing row with the same id.
    pub fn push(&mut self, parcel: Parcel) {
        match self.index.get(&parcel.parcel_id) {
            Some(&i) => self.rows[i] = parcel,
            None => {
                self.index.insert(parcel.parcel_id, self.rows.len());
                self.rows.push(parcel);
            }
        }
    }

    pub fn rows(&self) -> &[Parcel] {
        &self.rows
    }

    pub fn get(&self, id: ParcelId) -> Option<&Parcel> {
        self.index.get(&id).map(|&i| &self.rows[i])
    }

    pub fn position(&self, id: ParcelId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// =============================================================================
// Buildings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub building_id: BuildingId,
    pub parcel_id: ParcelId,
    pub building_type_id: u32,
    #[serde(default)]
    pub residential_units: u32,
    #[serde(default)]
    pub non_residential_sqft: f64,
    /// Total floor area, residential and non-residential.
    #[serde(default)]
    pub building_sqft: f64,
    /// Job spaces available for the employment location choice model.
    #[serde(default)]
    pub job_spaces: u32,
    /// Hedonic outputs, written back by the simulate steps.
    #[serde(default)]
    pub residential_sales_price: Option<f64>,
    #[serde(default)]
    pub residential_rent: Option<f64>,
    #[serde(default)]
    pub non_residential_rent: Option<f64>,
}

#[derive(Resource, Debug, Clone, Default)]
pub struct Buildings {
    rows: Vec<Building>,
    index: HashMap<BuildingId, usize>,
}

impl Buildings {
    pub fn new(rows: Vec<Building>) -> Self {
        let mut buildings = Self::default();
        for row in rows {
            buildings.push(row);
        }
        buildings
    }

    pub fn push(&mut self, building: Building) {
        match self.index.get(&building.building_id) {
            Some(&i) => self.rows[i] = building,
            None => {
                self.index.insert(building.building_id, self.rows.len());
                self.rows.push(building);
            }
        }
    }

    pub fn rows(&self) -> &[Building] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [Building] {
        &mut self.rows
    }

    pub fn get(&self, id: BuildingId) -> Option<&Building> {
        self.index.get(&id).map(|&i| &self.rows[i])
    }

    pub fn contains(&self, id: BuildingId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Existing floor area and residential units summed per parcel.
    pub fn totals_by_parcel(&self) -> HashMap<ParcelId, (f64, u32)> {
        let mut totals: HashMap<ParcelId, (f64, u32)> = HashMap::new();
        for b in &self.rows {
            let entry = totals.entry(b.parcel_id).or_insert((0.0, 0));
            entry.0 += b.building_sqft;
            entry.1 += b.residential_units;
        }
        totals
    }
}

// =============================================================================
// Agents
// =============================================================================

/// A located agent (household or job) that relocation and transition models
/// move around.
pub trait Agent: Clone {
    fn agent_id(&self) -> AgentId;
    fn set_agent_id(&mut self, id: AgentId);
    fn building_id(&self) -> Option<BuildingId>;
    fn set_building_id(&mut self, building: Option<BuildingId>);
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Household {
    pub household_id: AgentId,
    #[serde(default)]
    pub building_id: Option<BuildingId>,
    #[serde(default)]
    pub persons: u32,
    #[serde(default)]
    pub income: f64,
}

impl Agent for Household {
    fn agent_id(&self) -> AgentId {
        self.household_id
    }
    fn set_agent_id(&mut self, id: AgentId) {
        self.household_id = id;
    }
    fn building_id(&self) -> Option<BuildingId> {
        self.building_id
    }
    fn set_building_id(&mut self, building: Option<BuildingId>) {
        self.building_id = building;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub job_id: AgentId,
    #[serde(default)]
    pub building_id: Option<BuildingId>,
    /// NAICS sector.
    pub sector_id: u32,
}

impl Agent for Job {
    fn agent_id(&self) -> AgentId {
        self.job_id
    }
    fn set_agent_id(&mut self, id: AgentId) {
        self.job_id = id;
    }
    fn building_id(&self) -> Option<BuildingId> {
        self.building_id
    }
    fn set_building_id(&mut self, building: Option<BuildingId>) {
        self.building_id = building;
    }
}

#[derive(Resource, Debug, Clone, Default)]
pub struct Households(pub Vec<Household>);

#[derive(Resource, Debug, Clone, Default)]
pub struct Jobs(pub Vec<Job>);

/// Units or job spaces taken, per building.
pub fn occupancy<A: Agent>(agents: &[A]) -> HashMap<BuildingId, u32> {
    let mut counts = HashMap::new();
    for a in agents {
        if let Some(b) = a.building_id() {
            *counts.entry(b).or_insert(0) += 1;
        }
    }
    counts
}

// =============================================================================
// Zoning
// =============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ZoningRow {
    pub parcel_id: ParcelId,
    #[serde(default)]
    pub max_far: Option<f64>,
    #[serde(default)]
    pub max_dua: Option<f64>,
    #[serde(default)]
    pub max_height: Option<f64>,
    #[serde(default)]
    pub nodev: bool,
    /// Zoned capacity per building-type code; a missing code means no value.
    #[serde(default)]
    pub capacities: BTreeMap<u32, f64>,
}

/// Baseline zoning, keyed by parcel.
#[derive(Resource, Debug, Clone)]
pub struct ZoningBaseline {
    rows: HashMap<ParcelId, ZoningRow>,
    /// Building-type codes the table defines (its capacity columns).
    building_types: BTreeSet<u32>,
}

impl Default for ZoningBaseline {
    fn default() -> Self {
        Self {
            rows: HashMap::new(),
            building_types: ZONING_BUILDING_TYPE_CODES.into_iter().collect(),
        }
    }
}

impl ZoningBaseline {
    /// Build the table; defined codes are the standard columns plus any code
    /// appearing in a row.
    pub fn new(rows: Vec<ZoningRow>) -> Self {
        let mut zoning = Self::default();
        for row in rows {
            zoning.insert(row);
        }
        zoning
    }

    /// Build the table with an explicit set of defined codes.
    pub fn with_building_types(rows: Vec<ZoningRow>, codes: impl IntoIterator<Item = u32>) -> Self {
        let mut zoning = Self {
            rows: HashMap::new(),
            building_types: codes.into_iter().collect(),
        };
        for row in rows {
            zoning.insert(row);
        }
        zoning
    }

    pub fn insert(&mut self, row: ZoningRow) {
        self.building_types.extend(row.capacities.keys().copied());
        self.rows.insert(row.parcel_id, row);
    }

    pub fn get(&self, parcel_id: ParcelId) -> Option<&ZoningRow> {
        self.rows.get(&parcel_id)
    }

    pub fn defines(&self, code: u32) -> bool {
        self.building_types.contains(&code)
    }

    /// Zoned capacity for a code on a parcel; `None` when either is missing.
    pub fn capacity(&self, parcel_id: ParcelId, code: u32) -> Option<f64> {
        self.rows
            .get(&parcel_id)
            .and_then(|r| r.capacities.get(&code))
            .copied()
            .filter(|v| !v.is_nan())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioUpzone {
    pub parcel_id: ParcelId,
    #[serde(default)]
    pub far_up: Option<f64>,
    #[serde(default)]
    pub dua_up: Option<f64>,
}

/// Upzoning inputs applied outside the baseline scenario.
#[derive(Resource, Debug, Clone, Default)]
pub struct ScenarioInputs {
    rows: HashMap<ParcelId, ScenarioUpzone>,
}

impl ScenarioInputs {
    pub fn new(rows: Vec<ScenarioUpzone>) -> Self {
        Self {
            rows: rows.into_iter().map(|r| (r.parcel_id, r)).collect(),
        }
    }

    pub fn insert(&mut self, row: ScenarioUpzone) {
        self.rows.insert(row.parcel_id, row);
    }

    pub fn far_up(&self, parcel_id: ParcelId) -> Option<f64> {
        self.rows.get(&parcel_id).and_then(|r| r.far_up)
    }

    pub fn dua_up(&self, parcel_id: ParcelId) -> Option<f64> {
        self.rows.get(&parcel_id).and_then(|r| r.dua_up)
    }
}

// =============================================================================
// Estimation data
// =============================================================================

/// Observation used to estimate a hedonic model (home sale or apartment rent).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingRecord {
    pub record_id: i64,
    pub parcel_id: ParcelId,
    #[serde(default)]
    pub values: BTreeMap<String, f64>,
}

#[derive(Resource, Debug, Clone, Default)]
pub struct HomeSales(pub Vec<TrainingRecord>);

#[derive(Resource, Debug, Clone, Default)]
pub struct Apartments(pub Vec<TrainingRecord>);

/// Commercial rent observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostarRecord {
    pub record_id: i64,
    pub parcel_id: ParcelId,
    #[serde(rename = "PropertyType")]
    pub property_type: String,
    #[serde(rename = "averageweightedrent", default)]
    pub average_weighted_rent: Option<f64>,
    #[serde(rename = "number_of_stories", default)]
    pub number_of_stories: Option<f64>,
}

impl CostarRecord {
    pub fn general_type(&self) -> &str {
        &self.property_type
    }

    pub fn rent(&self) -> Option<f64> {
        self.average_weighted_rent
    }

    pub fn stories(&self) -> Option<f64> {
        self.number_of_stories
    }
}

#[derive(Resource, Debug, Clone, Default)]
pub struct Costar(pub Vec<CostarRecord>);

// =============================================================================
// Network node tables
// =============================================================================

/// Node-level variables produced by the network aggregator, by column name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeTable {
    columns: BTreeMap<String, HashMap<NodeId, f64>>,
}

impl NodeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_column(mut self, name: impl Into<String>, values: HashMap<NodeId, f64>) -> Self {
        self.columns.insert(name.into(), values);
        self
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn get(&self, column: &str, node: NodeId) -> Option<f64> {
        self.columns
            .get(column)
            .and_then(|c| c.get(&node))
            .copied()
            .filter(|v| !v.is_nan())
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Neighborhood accessibility variables, merged into frames for the runners.
#[derive(Resource, Debug, Clone, Default)]
pub struct Nodes(pub NodeTable);

/// Accessibility-weighted price surface; `None` until the price step has run.
#[derive(Resource, Debug, Clone, Default)]
pub struct NodePrices(pub Option<NodeTable>);

// =============================================================================
// Fitted models
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FittedModel {
    pub coefficients: BTreeMap<String, f64>,
}

/// Estimated parameters by model configuration name.
#[derive(Resource, Debug, Clone, Default)]
pub struct FittedModels(pub BTreeMap<String, FittedModel>);
