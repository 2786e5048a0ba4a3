//! # TestRegion: headless harness for land-use integration tests
//!
//! Wraps a bevy `App` with `MinimalPlugins` + `LandUsePlugin`. Builder
//! methods seed the tables, `run` dispatches models by name, and the
//! accessors and assertions read the results back.

use bevy::app::App;
use bevy::prelude::*;

use crate::catalog::Form;
use crate::config::SQFT_PER_ACRE;
use crate::datasets::{
    AgentId, Building, BuildingId, Buildings, Household, Households, Job, Jobs, NodeId,
    NodePrices, NodeTable, Parcel, ParcelId, Parcels, ScenarioInputs, ScenarioUpzone,
    ZoningBaseline, ZoningRow,
};
use crate::error::SimError;
use crate::proforma::{FeasibilityRecord, FeasibilityTable, ProFormaConfig};
use crate::registry::{parse_models, run_models};
use crate::settings::Settings;
use crate::LandUsePlugin;

/// Zone every harness parcel belongs to unless stated otherwise.
pub const TEST_ZONE: i64 = 1;
/// Alameda county id.
pub const TEST_COUNTY: u32 = 1;

pub struct TestRegion {
    app: App,
}

impl Default for TestRegion {
    fn default() -> Self {
        Self::new()
    }
}

impl TestRegion {
    // -----------------------------------------------------------------------
    // Constructors
    // -----------------------------------------------------------------------

    /// Empty region with default settings and pro-forma config.
    pub fn new() -> Self {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_plugins(LandUsePlugin);
        Self { app }
    }

    // -----------------------------------------------------------------------
    // Configuration
    // -----------------------------------------------------------------------

    /// Replace the settings (and rebuild the catalog). Panics when invalid.
    pub fn with_settings(mut self, settings: Settings) -> Self {
        let proforma = self.resource::<ProFormaConfig>().clone();
        self.configure(settings, proforma);
        self
    }

    /// Replace the pro-forma config (and rebuild the catalog). Panics when
    /// invalid.
    pub fn with_proforma(mut self, proforma: ProFormaConfig) -> Self {
        let settings = self.resource::<Settings>().clone();
        self.configure(settings, proforma);
        self
    }

    /// Apply a settings change in place.
    pub fn with_settings_mut(self, f: impl FnOnce(&mut Settings)) -> Self {
        let mut settings = self.resource::<Settings>().clone();
        f(&mut settings);
        self.with_settings(settings)
    }

    fn configure(&mut self, settings: Settings, proforma: ProFormaConfig) {
        if let Err(e) = crate::configure(self.app.world_mut(), settings, proforma) {
            panic!("TestRegion configuration rejected: {e}");
        }
    }

    // -----------------------------------------------------------------------
    // Tables
    // -----------------------------------------------------------------------

    /// Add a parcel of `size_sqft` in the test zone and county, on node `id`.
    pub fn with_parcel(mut self, id: ParcelId, size_sqft: f64) -> Self {
        self.app.world_mut().resource_mut::<Parcels>().push(Parcel {
            parcel_id: id,
            parcel_acres: size_sqft / SQFT_PER_ACRE,
            parcel_size: size_sqft,
            zone_id: TEST_ZONE,
            county_id: TEST_COUNTY,
            pda: None,
            node_id: Some(id),
        });
        self
    }

    /// Zone a parcel with a FAR limit, permitting `codes` with capacity.
    pub fn with_far_zoning(self, parcel_id: ParcelId, max_far: f64, codes: &[u32]) -> Self {
        self.with_zoning(ZoningRow {
            parcel_id,
            max_far: Some(max_far),
            capacities: codes.iter().map(|c| (*c, 1.0)).collect(),
            ..Default::default()
        })
    }

    pub fn with_zoning(mut self, row: ZoningRow) -> Self {
        self.app
            .world_mut()
            .resource_mut::<ZoningBaseline>()
            .insert(row);
        self
    }

    pub fn with_upzone(mut self, parcel_id: ParcelId, far_up: Option<f64>, dua_up: Option<f64>) -> Self {
        self.app
            .world_mut()
            .resource_mut::<ScenarioInputs>()
            .insert(ScenarioUpzone { parcel_id, far_up, dua_up });
        self
    }

    pub fn with_building(mut self, building: Building) -> Self {
        self.app.world_mut().resource_mut::<Buildings>().push(building);
        self
    }

    /// A single-family home (type 1) that sold at `price` per sqft.
    pub fn with_home(self, id: BuildingId, parcel_id: ParcelId, units: u32, price: f64) -> Self {
        self.with_building(Building {
            building_id: id,
            parcel_id,
            building_type_id: 1,
            residential_units: units,
            non_residential_sqft: 0.0,
            building_sqft: units as f64 * 1_000.0,
            job_spaces: 0,
            residential_sales_price: Some(price),
            residential_rent: None,
            non_residential_rent: None,
        })
    }

    /// An office building (type 4) with `job_spaces` spaces.
    pub fn with_office(self, id: BuildingId, parcel_id: ParcelId, job_spaces: u32) -> Self {
        self.with_building(Building {
            building_id: id,
            parcel_id,
            building_type_id: 4,
            residential_units: 0,
            non_residential_sqft: job_spaces as f64 * 250.0,
            building_sqft: job_spaces as f64 * 250.0,
            job_spaces,
            residential_sales_price: None,
            residential_rent: None,
            non_residential_rent: None,
        })
    }

    pub fn with_household(mut self, id: AgentId, building: Option<BuildingId>) -> Self {
        self.app.world_mut().resource_mut::<Households>().0.push(Household {
            household_id: id,
            building_id: building,
            persons: 2,
            income: 80_000.0,
        });
        self
    }

    pub fn with_job(mut self, id: AgentId, building: Option<BuildingId>, sector_id: u32) -> Self {
        self.app.world_mut().resource_mut::<Jobs>().0.push(Job {
            job_id: id,
            building_id: building,
            sector_id,
        });
        self
    }

    /// Publish a price surface with the same price for every node and use.
    pub fn with_uniform_prices(mut self, nodes: &[NodeId], price: f64) -> Self {
        let mut table = NodeTable::new();
        for name in ["residential", "retail", "industrial", "office"] {
            table = table.with_column(name, nodes.iter().map(|n| (*n, price)).collect());
        }
        self.app.world_mut().resource_mut::<NodePrices>().0 = Some(table);
        self
    }

    // -----------------------------------------------------------------------
    // Running
    // -----------------------------------------------------------------------

    /// Run the named models for each year.
    pub fn run(&mut self, models: &[&str], years: impl IntoIterator<Item = u32>) -> Result<(), SimError> {
        let ids = parse_models(models)?;
        run_models(self.app.world_mut(), &ids, years)
    }

    /// Run the feasibility step once for `year`. Panics on error.
    pub fn feasibility_for(mut self, year: u32) -> Self {
        if let Err(e) = self.run(&["feasibility"], [year]) {
            panic!("feasibility failed: {e}");
        }
        self
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn resource<T: Resource>(&self) -> &T {
        self.app.world().resource::<T>()
    }

    pub fn feasibility(&self) -> &FeasibilityTable {
        self.resource::<FeasibilityTable>()
    }

    pub fn record(&self, parcel_id: ParcelId, form: Form) -> Option<&FeasibilityRecord> {
        self.feasibility().get(parcel_id, form)
    }

    pub fn households(&self) -> &[Household] {
        &self.resource::<Households>().0
    }

    pub fn jobs(&self) -> &[Job] {
        &self.resource::<Jobs>().0
    }

    pub fn unplaced_households(&self) -> usize {
        self.households().iter().filter(|h| h.building_id.is_none()).count()
    }

    // -----------------------------------------------------------------------
    // Assertions
    // -----------------------------------------------------------------------

    pub fn assert_feasible(&self, parcel_id: ParcelId, form: Form) {
        assert!(
            self.record(parcel_id, form).is_some(),
            "Expected parcel {parcel_id} to be feasible for {form}"
        );
    }

    pub fn assert_not_feasible(&self, parcel_id: ParcelId, form: Form) {
        assert!(
            self.record(parcel_id, form).is_none(),
            "Expected no {form} record for parcel {parcel_id}, found {:?}",
            self.record(parcel_id, form)
        );
    }

    pub fn assert_resource_exists<T: Resource>(&self) {
        assert!(
            self.app.world().get_resource::<T>().is_some(),
            "Expected resource {} to exist",
            std::any::type_name::<T>()
        );
    }
}
