//! Feasibility records and the published feasibility table.

use std::collections::BTreeMap;

use bevy::prelude::*;
use serde::Serialize;

use crate::catalog::Form;
use crate::datasets::ParcelId;

use super::config::ParkingConfig;

/// Most profitable configuration of one form on one parcel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeasibilityRecord {
    pub max_profit_far: f64,
    pub max_profit: f64,
    pub parking_config: ParkingConfig,
    pub building_sqft: f64,
    pub residential_sqft: f64,
    pub non_residential_sqft: f64,
    pub residential_units: u32,
    pub stories: f64,
    pub building_cost: f64,
    pub building_revenue: f64,
    /// Annual rent per sqft, blended over the form's use mix.
    pub weighted_rent: f64,
}

/// Parcels x forms. A section exists for every evaluated form, even when no
/// parcel is feasible for it; a parcel is present in a section only when the
/// form is allowed there and profitable.
#[derive(Resource, Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeasibilityTable {
    year: Option<u32>,
    sections: BTreeMap<Form, BTreeMap<ParcelId, FeasibilityRecord>>,
}

impl FeasibilityTable {
    pub fn new(year: Option<u32>) -> Self {
        Self {
            year,
            sections: BTreeMap::new(),
        }
    }

    pub fn year(&self) -> Option<u32> {
        self.year
    }

    /// Create an empty section for a form if it has none yet.
    pub fn ensure_section(&mut self, form: Form) {
        self.sections.entry(form).or_default();
    }

    pub fn insert(&mut self, form: Form, parcel_id: ParcelId, record: FeasibilityRecord) {
        self.sections
            .entry(form)
            .or_default()
            .insert(parcel_id, record);
    }

    /// Replace the whole table with a newer run.
    pub fn replace(&mut self, other: FeasibilityTable) {
        *self = other;
    }

    pub fn get(&self, parcel_id: ParcelId, form: Form) -> Option<&FeasibilityRecord> {
        self.sections.get(&form).and_then(|s| s.get(&parcel_id))
    }

    pub fn form_section(&self, form: Form) -> Option<&BTreeMap<ParcelId, FeasibilityRecord>> {
        self.sections.get(&form)
    }

    pub fn forms(&self) -> impl Iterator<Item = Form> + '_ {
        self.sections.keys().copied()
    }

    /// Every feasible form on one parcel.
    pub fn row(&self, parcel_id: ParcelId) -> BTreeMap<Form, &FeasibilityRecord> {
        self.sections
            .iter()
            .filter_map(|(form, s)| s.get(&parcel_id).map(|r| (*form, r)))
            .collect()
    }

    /// The form with the highest profit on a parcel.
    pub fn best_for_parcel(&self, parcel_id: ParcelId) -> Option<(Form, &FeasibilityRecord)> {
        self.row(parcel_id)
            .into_iter()
            .max_by(|a, b| a.1.max_profit.total_cmp(&b.1.max_profit))
    }

    /// Number of (parcel, form) records.
    pub fn len(&self) -> usize {
        self.sections.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
