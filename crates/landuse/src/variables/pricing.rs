//! Achievable price or rent per parcel and use.
//!
//! Residential prices come from a zone-level quantile of observed prices,
//! clipped to a plausible band and then adjusted by county cost shifters and
//! PDA price shifters. Other uses read the network price surface by node.

use std::collections::HashMap;

use crate::catalog::Use;
use crate::config::{
    LAND_COST_PER_SQFT, RESIDENTIAL_GENERAL_TYPE, RESIDENTIAL_PRICE_CEILING,
    RESIDENTIAL_PRICE_FLOOR,
};
use crate::datasets::{Buildings, NodeTable, Parcels, ZoneId};
use crate::error::SimError;
use crate::settings::Settings;

use super::parcels::ParcelVariables;

/// Read-only view over the tables a price lookup needs.
pub struct ParcelPrices<'a> {
    parcels: &'a Parcels,
    buildings: &'a Buildings,
    variables: &'a ParcelVariables,
    node_prices: Option<&'a NodeTable>,
    settings: &'a Settings,
}

impl<'a> ParcelPrices<'a> {
    pub fn new(
        parcels: &'a Parcels,
        buildings: &'a Buildings,
        variables: &'a ParcelVariables,
        node_prices: Option<&'a NodeTable>,
        settings: &'a Settings,
    ) -> Self {
        Self {
            parcels,
            buildings,
            variables,
            node_prices,
            settings,
        }
    }

    /// Price per sqft for every parcel, aligned with the parcel rows. `None`
    /// marks a parcel with no price for the use.
    pub fn price_for_use(&self, use_: Use) -> Result<Vec<Option<f64>>, SimError> {
        match use_ {
            Use::Residential => Ok(self.residential()),
            _ => self.from_node_surface(use_),
        }
    }

    /// Zone quantile, clipped, then divided by the cost shifter and multiplied
    /// by the price shifter. Parcels in zones without observations, or in
    /// counties without a cost shifter, have no price.
    pub fn residential(&self) -> Vec<Option<f64>> {
        let zone_prices = zone_price_quantiles(
            self.parcels,
            self.buildings,
            self.settings,
            self.settings.residential_price_quantile,
        );
        self.parcels
            .rows()
            .iter()
            .zip(&self.variables.rows)
            .map(|(p, v)| {
                let base = zone_prices.get(&p.zone_id)?;
                let cost_shifter = v.cost_shifter?;
                Some(adjust_residential_price(*base, cost_shifter, v.price_shifter))
            })
            .collect()
    }

    fn from_node_surface(&self, use_: Use) -> Result<Vec<Option<f64>>, SimError> {
        let Some(surface) = self.node_prices else {
            // Surface not computed yet: every parcel prices at zero.
            return Ok(vec![Some(0.0); self.parcels.len()]);
        };
        if !surface.has_column(use_.name()) {
            return Err(SimError::config(format!(
                "use '{use_}' has no column in the node price surface"
            )));
        }
        Ok(self
            .parcels
            .rows()
            .iter()
            .map(|p| p.node_id.and_then(|n| surface.get(use_.name(), n)))
            .collect())
    }
}

/// Quantile of observed residential prices per zone, clipped to the band.
/// Buildings whose general type is not residential, or without a price, are
/// skipped.
pub fn zone_price_quantiles(
    parcels: &Parcels,
    buildings: &Buildings,
    settings: &Settings,
    q: f64,
) -> HashMap<ZoneId, f64> {
    let mut by_zone: HashMap<ZoneId, Vec<f64>> = HashMap::new();
    for b in buildings.rows() {
        if settings.general_type(b.building_type_id) != Some(RESIDENTIAL_GENERAL_TYPE) {
            continue;
        }
        let Some(price) = b.residential_sales_price.filter(|v| v.is_finite()) else {
            continue;
        };
        let Some(parcel) = parcels.get(b.parcel_id) else {
            continue;
        };
        by_zone.entry(parcel.zone_id).or_default().push(price);
    }

    by_zone
        .into_iter()
        .filter_map(|(zone, mut prices)| {
            quantile(&mut prices, q)
                .map(|v| (zone, v.clamp(RESIDENTIAL_PRICE_FLOOR, RESIDENTIAL_PRICE_CEILING)))
        })
        .collect()
}

/// Linear-interpolation quantile of finite values. Sorts in place.
pub fn quantile(values: &mut [f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let pos = q.clamp(0.0, 1.0) * (values.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(values[lo] + (values[hi] - values[lo]) * frac)
}

/// Clip the zone base price, then apply the shifters. Final values may leave
/// the band when shifters differ from 1.
pub fn adjust_residential_price(base: f64, cost_shifter: f64, price_shifter: f64) -> f64 {
    base.clamp(RESIDENTIAL_PRICE_FLOOR, RESIDENTIAL_PRICE_CEILING) / cost_shifter * price_shifter
}

/// Purchase price of the existing buildings; zero when no price is known.
pub fn building_purchase_price(total_sqft: f64, price_sqft: Option<f64>) -> f64 {
    price_sqft
        .map(|p| total_sqft * p)
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Cost of acquiring the parcel: existing buildings plus raw land.
pub fn land_cost(total_sqft: f64, price_sqft: Option<f64>, parcel_size: f64) -> f64 {
    building_purchase_price(total_sqft, price_sqft) + parcel_size * LAND_COST_PER_SQFT
}
