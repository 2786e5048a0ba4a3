//! Derived parcel columns.

use crate::datasets::{Buildings, ParcelId, Parcels, ScenarioInputs, ZoningBaseline};
use crate::settings::Settings;

use super::zoning::{apply_pda_dua_floor, conditional_upzone, zoned_du, zoned_du_underbuild};

/// Derived zoning and existing-stock attributes of one parcel.
#[derive(Debug, Clone, PartialEq)]
pub struct ParcelAttributes {
    pub parcel_id: ParcelId,
    pub max_far: Option<f64>,
    pub max_dua: Option<f64>,
    pub max_height: Option<f64>,
    pub nodev: bool,
    pub zoned_du: u32,
    pub zoned_du_underbuild: u32,
    /// Existing floor area over all buildings on the parcel.
    pub total_sqft: f64,
    pub total_residential_units: u32,
    pub county: Option<String>,
    pub cost_shifter: Option<f64>,
    pub price_shifter: f64,
}

/// Derived attributes for every parcel, aligned with [`Parcels::rows`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParcelVariables {
    pub rows: Vec<ParcelAttributes>,
}

impl ParcelVariables {
    pub fn compute(
        parcels: &Parcels,
        buildings: &Buildings,
        zoning: &ZoningBaseline,
        scenario: &ScenarioInputs,
        settings: &Settings,
    ) -> Self {
        let totals = buildings.totals_by_parcel();
        let is_baseline = settings.is_baseline();

        let rows = parcels
            .rows()
            .iter()
            .map(|p| {
                let zone = zoning.get(p.parcel_id);
                let max_far = conditional_upzone(
                    zone.and_then(|z| z.max_far),
                    scenario.far_up(p.parcel_id),
                    is_baseline,
                );
                let max_dua = apply_pda_dua_floor(
                    conditional_upzone(
                        zone.and_then(|z| z.max_dua),
                        scenario.dua_up(p.parcel_id),
                        is_baseline,
                    ),
                    p.pda.as_deref(),
                    p.county_id,
                    settings,
                );
                let (total_sqft, total_residential_units) =
                    totals.get(&p.parcel_id).copied().unwrap_or((0.0, 0));
                let du = zoned_du(max_dua, p.parcel_acres, max_far, p.parcel_size);

                ParcelAttributes {
                    parcel_id: p.parcel_id,
                    max_far,
                    max_dua,
                    max_height: zone.and_then(|z| z.max_height),
                    nodev: zone.is_some_and(|z| z.nodev),
                    zoned_du: du,
                    zoned_du_underbuild: zoned_du_underbuild(du, total_residential_units),
                    total_sqft,
                    total_residential_units,
                    county: settings.county_name(p.county_id).map(str::to_string),
                    cost_shifter: settings.cost_shifter(p.county_id),
                    price_shifter: settings.price_shifter(p.pda.as_deref()),
                }
            })
            .collect();

        Self { rows }
    }

    pub fn get(&self, position: usize) -> Option<&ParcelAttributes> {
        self.rows.get(position)
    }
}
