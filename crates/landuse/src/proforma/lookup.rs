//! Per-parcel evaluation against the cost table.

use std::collections::BTreeMap;

use crate::catalog::{Form, FormEntry, Use};
use crate::config::GROSS_AVE_UNIT_SIZE;
use crate::datasets::ParcelId;

use super::config::ProFormaConfig;
use super::cost_table::CostEntry;
use super::types::FeasibilityRecord;

/// Everything the pro-forma needs to know about one parcel.
#[derive(Debug, Clone, PartialEq)]
pub struct ParcelInputs {
    pub parcel_id: ParcelId,
    pub parcel_size: f64,
    pub parcel_acres: f64,
    pub max_far: Option<f64>,
    pub max_height: Option<f64>,
    pub max_dua: Option<f64>,
    pub nodev: bool,
    pub land_cost: f64,
    /// Price per sqft by use as read from the price functions. Residential is
    /// a sale price; other uses are annual rents.
    pub prices: BTreeMap<Use, f64>,
}

/// Annual rent per sqft for the form's mix, or `None` when a needed price is
/// missing. Residential sale prices are capitalized into rents first.
pub fn weighted_rent(entry: &FormEntry, prices: &BTreeMap<Use, f64>, cap_rate: f64) -> Option<f64> {
    let mut rent = 0.0;
    for (use_, share) in &entry.uses {
        let price = *prices.get(use_)?;
        let annual = if use_.is_residential() { price * cap_rate } else { price };
        rent += share * annual;
    }
    Some(rent)
}

/// Largest FAR the zoning limits allow for the form on this parcel; 0.0 when
/// the parcel cannot be developed.
pub fn max_far_for_form(
    form: Form,
    entry: &FormEntry,
    inputs: &ParcelInputs,
    config: &ProFormaConfig,
) -> f64 {
    if inputs.nodev || inputs.parcel_size <= 0.0 {
        return 0.0;
    }

    let finite = |v: Option<f64>| v.filter(|x| x.is_finite());
    let mut limits = Vec::with_capacity(3);
    if let Some(far) = finite(inputs.max_far) {
        limits.push(far);
    }
    if let Some(height) = finite(inputs.max_height) {
        limits.push(height / config.height_per_story * config.parcel_coverage);
    }
    let residential_share = entry.residential_share();
    if let Some(dua) = finite(inputs.max_dua) {
        if residential_share > 0.0 {
            let units = dua * inputs.parcel_acres;
            limits.push(units * GROSS_AVE_UNIT_SIZE / inputs.parcel_size / residential_share);
        }
    }

    let Some(mut max_far) = limits.into_iter().reduce(f64::min) else {
        return 0.0;
    };
    match form {
        Form::Retail => max_far = max_far.min(config.max_retail_far),
        Form::Industrial => max_far = max_far.min(config.max_industrial_far),
        _ => {}
    }
    if max_far > 0.0 {
        max_far
    } else {
        0.0
    }
}

/// Pick the most profitable cost-table entry within the parcel's capacity.
/// Returns `None` when nothing fits, a price is missing, or the best margin
/// is not positive.
pub fn evaluate_parcel(
    form: Form,
    entry: &FormEntry,
    costs: &[CostEntry],
    inputs: &ParcelInputs,
    config: &ProFormaConfig,
) -> Option<FeasibilityRecord> {
    let max_far = max_far_for_form(form, entry, inputs, config);
    if max_far <= 0.0 {
        return None;
    }
    let rent = weighted_rent(entry, &inputs.prices, config.cap_rate)?;

    let mut best: Option<(f64, &CostEntry)> = None;
    for cost in costs.iter().filter(|c| c.far <= max_far) {
        let bulk = cost.far * inputs.parcel_size;
        let revenue = bulk * config.building_efficiency * rent / config.cap_rate;
        let profit = revenue - bulk * cost.cost_per_sqft - inputs.land_cost;
        if best.map_or(true, |(p, _)| profit > p) {
            best = Some((profit, cost));
        }
    }

    let (profit, cost) = best?;
    if profit.is_nan() || profit <= 0.0 {
        return None;
    }

    let building_sqft = cost.far * inputs.parcel_size;
    let residential_sqft = building_sqft * entry.residential_share();
    Some(FeasibilityRecord {
        max_profit_far: cost.far,
        max_profit: profit,
        parking_config: cost.parking,
        building_sqft,
        residential_sqft,
        non_residential_sqft: building_sqft - residential_sqft,
        residential_units: (residential_sqft / GROSS_AVE_UNIT_SIZE).round_ties_even() as u32,
        stories: cost.stories,
        building_cost: building_sqft * cost.cost_per_sqft,
        building_revenue: building_sqft * config.building_efficiency * rent / config.cap_rate,
        weighted_rent: rent,
    })
}
