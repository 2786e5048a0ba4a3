//! Pro-forma parameters: FAR steps, use mixes, parking, construction costs.
//!
//! Defaults describe a square-foot pro-forma calibrated for Bay Area costs.
//! A JSON override only needs to list the keys it changes.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::catalog::{Form, Use};
use crate::error::SimError;

// =============================================================================
// Parking
// =============================================================================

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ParkingConfig {
    Surface,
    Deck,
    Underground,
}

impl ParkingConfig {
    pub const ALL: [ParkingConfig; 3] = [
        ParkingConfig::Surface,
        ParkingConfig::Deck,
        ParkingConfig::Underground,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ParkingConfig::Surface => "surface",
            ParkingConfig::Deck => "deck",
            ParkingConfig::Underground => "underground",
        }
    }
}

impl fmt::Display for ParkingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Config
// =============================================================================

#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProFormaConfig {
    /// Reference parcel size (sqft) the cost table is computed for.
    pub parcel_size: f64,
    /// Candidate floor-area ratios, ascending.
    pub fars: Vec<f64>,
    /// Uses with a price function.
    pub uses: Vec<Use>,
    /// Use mix per form; shares are normalized by the catalog.
    pub forms: BTreeMap<Form, BTreeMap<Use, f64>>,
    /// Multiplier on construction cost covering developer profit.
    pub profit_factor: f64,
    /// Leasable share of gross floor area.
    pub building_efficiency: f64,
    /// Share of the parcel the building footprint may cover.
    pub parcel_coverage: f64,
    pub cap_rate: f64,
    /// Parking stalls per `sqft_per_rate` of floor area, per use.
    pub parking_rates: BTreeMap<Use, f64>,
    pub sqft_per_rate: f64,
    /// Parking configurations tried for every FAR step, in order.
    pub parking_configs: Vec<ParkingConfig>,
    /// Floor area per stall.
    pub parking_sqft: BTreeMap<ParkingConfig, f64>,
    /// Construction cost per sqft of parking.
    pub parking_cost: BTreeMap<ParkingConfig, f64>,
    /// Construction cost per sqft by height bin; one entry per bound in
    /// `heights_for_costs` plus one for anything taller.
    pub costs: BTreeMap<Use, Vec<f64>>,
    /// Upper bounds (ft) of the cost height bins, ascending.
    pub heights_for_costs: Vec<f64>,
    pub height_per_story: f64,
    pub max_retail_far: f64,
    pub max_industrial_far: f64,
}

impl Default for ProFormaConfig {
    fn default() -> Self {
        let forms = [
            (Form::Retail, vec![(Use::Retail, 1.0)]),
            (Form::Industrial, vec![(Use::Industrial, 1.0)]),
            (Form::Office, vec![(Use::Office, 1.0)]),
            (Form::Residential, vec![(Use::Residential, 1.0)]),
            (
                Form::MixedResidential,
                vec![(Use::Retail, 0.1), (Use::Residential, 0.9)],
            ),
            (Form::MixedOffice, vec![(Use::Office, 0.7), (Use::Residential, 0.3)]),
        ]
        .into_iter()
        .map(|(form, mix)| (form, mix.into_iter().collect()))
        .collect();

        let costs = [
            (Use::Retail, vec![160.0, 175.0, 200.0, 230.0]),
            (Use::Industrial, vec![140.0, 175.0, 200.0, 230.0]),
            (Use::Office, vec![160.0, 175.0, 200.0, 230.0]),
            (Use::Residential, vec![170.0, 190.0, 210.0, 240.0]),
        ]
        .into_iter()
        .collect();

        Self {
            parcel_size: 10_000.0,
            fars: vec![
                0.1, 0.25, 0.5, 0.75, 1.0, 1.5, 1.8, 2.0, 2.25, 2.5, 2.75, 3.0, 3.25, 3.5, 3.75,
                4.0, 4.5, 5.0, 5.5, 6.0, 6.5, 7.0, 9.0, 11.0,
            ],
            uses: Use::ALL.to_vec(),
            forms,
            profit_factor: 1.1,
            building_efficiency: 0.7,
            parcel_coverage: 0.8,
            cap_rate: 0.05,
            parking_rates: [
                (Use::Retail, 2.0),
                (Use::Industrial, 0.6),
                (Use::Office, 1.0),
                (Use::Residential, 1.0),
            ]
            .into_iter()
            .collect(),
            sqft_per_rate: 1_000.0,
            parking_configs: ParkingConfig::ALL.to_vec(),
            parking_sqft: [
                (ParkingConfig::Surface, 300.0),
                (ParkingConfig::Deck, 250.0),
                (ParkingConfig::Underground, 250.0),
            ]
            .into_iter()
            .collect(),
            parking_cost: [
                (ParkingConfig::Surface, 30.0),
                (ParkingConfig::Deck, 90.0),
                (ParkingConfig::Underground, 110.0),
            ]
            .into_iter()
            .collect(),
            costs,
            heights_for_costs: vec![15.0, 55.0, 120.0],
            height_per_story: 12.0,
            max_retail_far: 2.0,
            max_industrial_far: 2.0,
        }
    }
}

fn positive(key: &str, value: f64) -> Result<(), SimError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SimError::config(format!("{key} must be positive, got {value}")))
    }
}

fn unit_share(key: &str, value: f64) -> Result<(), SimError> {
    if value.is_finite() && value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(SimError::config(format!("{key} must be within (0, 1], got {value}")))
    }
}

impl ProFormaConfig {
    pub fn from_json_str(json: &str) -> Result<Self, SimError> {
        let config: ProFormaConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), SimError> {
        positive("parcel_size", self.parcel_size)?;
        positive("profit_factor", self.profit_factor)?;
        positive("cap_rate", self.cap_rate)?;
        positive("sqft_per_rate", self.sqft_per_rate)?;
        positive("height_per_story", self.height_per_story)?;
        positive("max_retail_far", self.max_retail_far)?;
        positive("max_industrial_far", self.max_industrial_far)?;
        unit_share("building_efficiency", self.building_efficiency)?;
        unit_share("parcel_coverage", self.parcel_coverage)?;

        if self.fars.is_empty() {
            return Err(SimError::config("fars lists no FAR steps"));
        }
        for (i, far) in self.fars.iter().enumerate() {
            positive("fars", *far)?;
            if i > 0 && *far <= self.fars[i - 1] {
                return Err(SimError::config(format!(
                    "fars must be strictly ascending, got {} after {}",
                    far,
                    self.fars[i - 1]
                )));
            }
        }

        for (i, h) in self.heights_for_costs.iter().enumerate() {
            positive("heights_for_costs", *h)?;
            if i > 0 && *h <= self.heights_for_costs[i - 1] {
                return Err(SimError::config("heights_for_costs must be strictly ascending"));
            }
        }
        let bins = self.heights_for_costs.len() + 1;
        for use_ in &self.uses {
            match self.costs.get(use_) {
                Some(c) if c.len() == bins => {
                    for cost in c {
                        positive(&format!("costs['{use_}']"), *cost)?;
                    }
                }
                Some(c) => {
                    return Err(SimError::config(format!(
                        "costs['{use_}'] has {} height bins, expected {bins}",
                        c.len()
                    )))
                }
                None => {
                    return Err(SimError::config(format!(
                        "use '{use_}' has no construction costs"
                    )))
                }
            }
            match self.parking_rates.get(use_) {
                Some(rate) if rate.is_finite() && *rate >= 0.0 => {}
                _ => {
                    return Err(SimError::config(format!(
                        "parking_rates['{use_}'] must be a non-negative number"
                    )))
                }
            }
        }

        if self.parking_configs.is_empty() {
            return Err(SimError::config("parking_configs lists no configuration"));
        }
        for config in &self.parking_configs {
            let sqft = self.parking_sqft.get(config).copied().ok_or_else(|| {
                SimError::config(format!("parking config '{config}' has no parking_sqft"))
            })?;
            positive(&format!("parking_sqft['{config}']"), sqft)?;
            let cost = self.parking_cost.get(config).copied().ok_or_else(|| {
                SimError::config(format!("parking config '{config}' has no parking_cost"))
            })?;
            positive(&format!("parking_cost['{config}']"), cost)?;
        }
        Ok(())
    }

    /// Index of the cost bin a building of `height` ft falls into.
    pub fn height_bin(&self, height: f64) -> usize {
        self.heights_for_costs
            .iter()
            .position(|bound| height <= *bound)
            .unwrap_or(self.heights_for_costs.len())
    }
}
