//! Regional land-use microsimulation: parcel zoning capacity, price
//! attributes, pro-forma development feasibility, and the hedonic, location
//! choice and transition models that run around them.
//!
//! All tables live as resources in a bevy `World`. Models are one-shot
//! systems dispatched by [`registry::ModelId`].

use bevy::prelude::*;

pub mod catalog;
pub mod config;
pub mod datasets;
pub mod error;
pub mod models;
pub mod proforma;
pub mod registry;
pub mod settings;
pub mod sim_rng;
pub mod variables;

#[cfg(any(test, feature = "bench"))]
pub mod test_harness;

pub use error::SimError;

use catalog::FormCatalog;
use proforma::ProFormaConfig;
use registry::ModelRegistry;
use settings::Settings;
use sim_rng::SimRng;

/// Year currently being simulated.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimYear(pub u32);

/// Validate settings and pro-forma config, then install them together with
/// the catalog built from both and an RNG seeded from the settings.
pub fn configure(
    world: &mut World,
    settings: Settings,
    proforma: ProFormaConfig,
) -> Result<(), SimError> {
    settings.validate()?;
    proforma.validate()?;
    let catalog = FormCatalog::build(&settings, &proforma)?;
    info!(
        "Configured scenario '{}': {} forms, {} FAR steps, seed {}",
        settings.scenario,
        catalog.len(),
        proforma.fars.len(),
        settings.rng_seed
    );
    world.insert_resource(SimRng::from_seed_u64(settings.rng_seed));
    world.insert_resource(catalog);
    world.insert_resource(proforma);
    world.insert_resource(settings);
    Ok(())
}

pub struct LandUsePlugin;

impl Plugin for LandUsePlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((
            datasets::DatasetsPlugin,
            proforma::FeasibilityPlugin,
            models::ModelsPlugin,
        ));

        if let Err(e) = configure(app.world_mut(), Settings::default(), ProFormaConfig::default()) {
            error!("Default configuration rejected: {}", e);
        }

        let registry = ModelRegistry::build(app.world_mut());
        app.insert_resource(registry);
    }
}
