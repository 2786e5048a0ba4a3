//! Shared dataset: one resource per named table.
//!
//! Input tables (`parcels`, `buildings`, `households`, `jobs`,
//! `zoning_baseline`, estimation data) are loaded once; node tables and the
//! feasibility table are published by model steps under their own resources.

mod frame;
mod loader;
mod tables;

#[cfg(test)]
mod tests;

pub use frame::Frame;
pub use loader::Dataset;
pub use tables::*;

use bevy::prelude::*;

pub struct DatasetsPlugin;

impl Plugin for DatasetsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Parcels>()
            .init_resource::<Buildings>()
            .init_resource::<Households>()
            .init_resource::<Jobs>()
            .init_resource::<ZoningBaseline>()
            .init_resource::<ScenarioInputs>()
            .init_resource::<HomeSales>()
            .init_resource::<Apartments>()
            .init_resource::<Costar>()
            .init_resource::<Nodes>()
            .init_resource::<NodePrices>()
            .init_resource::<FittedModels>();
    }
}
