//! JSON input bundle for the headless driver.

use std::path::Path;

use bevy::prelude::*;
use serde::Deserialize;

use crate::error::SimError;

use super::tables::*;

/// Every input table in one document. Missing tables load empty.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Dataset {
    pub parcels: Vec<Parcel>,
    pub buildings: Vec<Building>,
    pub households: Vec<Household>,
    pub jobs: Vec<Job>,
    pub zoning_baseline: Vec<ZoningRow>,
    /// Capacity columns of the zoning table; the standard codes when omitted.
    pub zoning_building_types: Option<Vec<u32>>,
    pub scenario_inputs: Vec<ScenarioUpzone>,
    pub homesales: Vec<TrainingRecord>,
    pub apartments: Vec<TrainingRecord>,
    pub costar: Vec<CostarRecord>,
}

impl Dataset {
    pub fn from_json_str(json: &str) -> Result<Self, SimError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    /// Replace the world's tables with this dataset's.
    pub fn insert_into(self, world: &mut World) {
        info!(
            "Loading dataset: {} parcels, {} buildings, {} households, {} jobs",
            self.parcels.len(),
            self.buildings.len(),
            self.households.len(),
            self.jobs.len()
        );
        let zoning = match self.zoning_building_types {
            Some(codes) => ZoningBaseline::with_building_types(self.zoning_baseline, codes),
            None => ZoningBaseline::new(self.zoning_baseline),
        };
        world.insert_resource(Parcels::new(self.parcels));
        world.insert_resource(Buildings::new(self.buildings));
        world.insert_resource(Households(self.households));
        world.insert_resource(Jobs(self.jobs));
        world.insert_resource(zoning);
        world.insert_resource(ScenarioInputs::new(self.scenario_inputs));
        world.insert_resource(HomeSales(self.homesales));
        world.insert_resource(Apartments(self.apartments));
        world.insert_resource(Costar(self.costar));
    }
}
