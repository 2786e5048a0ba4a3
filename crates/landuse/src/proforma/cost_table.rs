//! Construction cost per sqft for every form, parking configuration and FAR
//! step, computed once on the reference parcel.

use std::collections::BTreeMap;

use crate::catalog::{Form, FormCatalog, FormEntry};
use crate::error::SimError;

use super::config::{ParkingConfig, ProFormaConfig};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostEntry {
    pub far: f64,
    pub parking: ParkingConfig,
    pub stories: f64,
    /// Includes parking and the profit factor.
    pub cost_per_sqft: f64,
}

/// Feasible (FAR, parking) combinations per form, ordered by FAR step then by
/// the configured parking order.
#[derive(Debug, Clone, Default)]
pub struct CostTable {
    forms: BTreeMap<Form, Vec<CostEntry>>,
}

impl CostTable {
    pub fn generate(catalog: &FormCatalog, config: &ProFormaConfig) -> Result<Self, SimError> {
        let mut forms = BTreeMap::new();
        for (form, entry) in catalog.iter() {
            forms.insert(form, form_costs(form, entry, config)?);
        }
        Ok(Self { forms })
    }

    pub fn entries(&self, form: Form) -> &[CostEntry] {
        self.forms.get(&form).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Stalls per sqft of floor area for the form's use mix.
fn parking_rate(form: Form, entry: &FormEntry, config: &ProFormaConfig) -> Result<f64, SimError> {
    let mut rate = 0.0;
    for (use_, share) in &entry.uses {
        let r = config.parking_rates.get(use_).ok_or_else(|| {
            SimError::config(format!("form '{form}' uses '{use_}', which has no parking rate"))
        })?;
        rate += share * r;
    }
    Ok(rate / config.sqft_per_rate)
}

/// Share-weighted construction cost for each height bin.
fn weighted_costs(
    form: Form,
    entry: &FormEntry,
    config: &ProFormaConfig,
) -> Result<Vec<f64>, SimError> {
    let bins = config.heights_for_costs.len() + 1;
    let mut weighted = vec![0.0; bins];
    for (use_, share) in &entry.uses {
        let costs = config
            .costs
            .get(use_)
            .filter(|c| c.len() == bins)
            .ok_or_else(|| {
                SimError::config(format!(
                    "form '{form}' uses '{use_}', which has no construction costs"
                ))
            })?;
        for (w, c) in weighted.iter_mut().zip(costs) {
            *w += share * c;
        }
    }
    Ok(weighted)
}

/// Building height in stories for one parking configuration, or `None` when
/// surface parking leaves no room for the footprint.
pub fn stories(parking: ParkingConfig, bulk: f64, parking_sqft: f64, footprint: f64) -> Option<f64> {
    let stories = match parking {
        ParkingConfig::Underground => bulk / footprint,
        ParkingConfig::Deck => (bulk + parking_sqft) / footprint,
        ParkingConfig::Surface => {
            let available = footprint - parking_sqft;
            if available <= 0.0 {
                return None;
            }
            bulk / available
        }
    };
    Some(stories)
}

fn form_costs(
    form: Form,
    entry: &FormEntry,
    config: &ProFormaConfig,
) -> Result<Vec<CostEntry>, SimError> {
    let rate = parking_rate(form, entry, config)?;
    let costs = weighted_costs(form, entry, config)?;
    let footprint = config.parcel_size * config.parcel_coverage;

    let mut entries = Vec::with_capacity(config.fars.len() * config.parking_configs.len());
    for &far in &config.fars {
        let bulk = far * config.parcel_size;
        let stalls = bulk * rate;
        for &parking in &config.parking_configs {
            let (Some(&sqft_per_stall), Some(&parking_cost)) =
                (config.parking_sqft.get(&parking), config.parking_cost.get(&parking))
            else {
                return Err(SimError::config(format!(
                    "parking config '{parking}' has no size or cost"
                )));
            };
            let parking_sqft = stalls * sqft_per_stall;
            let Some(stories) = stories(parking, bulk, parking_sqft, footprint) else {
                continue;
            };
            let bin = config.height_bin(stories * config.height_per_story);
            let building_cost = bulk * costs[bin] + parking_sqft * parking_cost;
            entries.push(CostEntry {
                far,
                parking,
                stories,
                cost_per_sqft: building_cost / bulk * config.profit_factor,
            });
        }
    }
    Ok(entries)
}
