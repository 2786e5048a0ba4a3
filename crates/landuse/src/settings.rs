//! Run settings.
//!
//! Every recognized key is a field with a default, so a settings file only
//! needs to list overrides. Unknown keys are rejected at load time and
//! [`Settings::validate`] runs eagerly, so a malformed file fails before any
//! model touches the tables.

use std::collections::BTreeMap;
use std::path::Path;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::catalog::Form;
use crate::config::BASELINE_SCENARIO;
use crate::error::SimError;

#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Zoning scenario; anything other than `"baseline"` applies upzoning.
    pub scenario: String,
    /// NAICS sector id -> six-way employment category name.
    pub naics_to_empsix: BTreeMap<u32, String>,
    /// Employment category name -> numeric id.
    pub empsix_name_to_id: BTreeMap<String, u32>,
    /// County FIPS id -> county name.
    pub county_id_map: BTreeMap<u32, String>,
    /// County name -> construction cost shifter (divides residential price).
    pub cost_shifters: BTreeMap<String, f64>,
    /// PDA name -> price shifter (multiplies residential price).
    pub pda_price_shifters: BTreeMap<String, f64>,
    /// Form -> zoning building-type codes that permit it.
    pub form_to_btype: BTreeMap<Form, Vec<u32>>,
    /// Building type id -> general type ("Residential", "Office", ...).
    pub building_type_map: BTreeMap<u32, String>,
    /// Quantile of observed residential prices taken per zone.
    pub residential_price_quantile: f64,
    /// Density floor (units/acre) for parcels inside a PDA.
    pub pda_min_dua: f64,
    /// Counties where the PDA density floor does not apply.
    pub pda_floor_exempt_counties: Vec<u32>,
    pub household_relocation_rate: f64,
    pub job_relocation_rate: f64,
    pub household_growth_rate: f64,
    pub job_growth_rate: f64,
    pub rng_seed: u64,
}

impl Default for Settings {
    fn default() -> Self {
        let county_id_map = [
            (1, "Alameda"),
            (13, "Contra Costa"),
            (41, "Marin"),
            (55, "Napa"),
            (75, "San Francisco"),
            (81, "San Mateo"),
            (85, "Santa Clara"),
            (95, "Solano"),
            (97, "Sonoma"),
        ]
        .into_iter()
        .map(|(id, name)| (id, name.to_string()))
        .collect::<BTreeMap<u32, String>>();
        let cost_shifters = county_id_map
            .values()
            .map(|name| (name.clone(), 1.0))
            .collect();

        let form_to_btype = [
            (Form::Residential, vec![1, 2, 3]),
            (Form::Industrial, vec![7, 8, 9]),
            (Form::Retail, vec![10, 11]),
            (Form::Office, vec![4]),
            (Form::MixedResidential, vec![12]),
            (Form::MixedOffice, vec![14]),
        ]
        .into_iter()
        .collect();

        let building_type_map = [
            (1, "Residential"),
            (2, "Residential"),
            (3, "Residential"),
            (4, "Office"),
            (5, "Hotel"),
            (6, "School"),
            (7, "Industrial"),
            (8, "Industrial"),
            (9, "Industrial"),
            (10, "Retail"),
            (11, "Retail"),
            (12, "Residential"),
            (13, "Retail"),
            (14, "Office"),
        ]
        .into_iter()
        .map(|(id, name)| (id, name.to_string()))
        .collect();

        Self {
            scenario: BASELINE_SCENARIO.to_string(),
            naics_to_empsix: BTreeMap::new(),
            empsix_name_to_id: BTreeMap::new(),
            county_id_map,
            cost_shifters,
            pda_price_shifters: BTreeMap::new(),
            form_to_btype,
            building_type_map,
            residential_price_quantile: 0.5,
            pda_min_dua: 16.0,
            pda_floor_exempt_counties: vec![75],
            household_relocation_rate: 0.05,
            job_relocation_rate: 0.08,
            household_growth_rate: 0.05,
            job_growth_rate: 0.05,
            rng_seed: crate::sim_rng::DEFAULT_SEED,
        }
    }
}

impl Settings {
    /// Parse and validate settings from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, SimError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    /// Check value ranges and cross-references. The first offending key is
    /// named in the error.
    pub fn validate(&self) -> Result<(), SimError> {
        if !(0.0..=1.0).contains(&self.residential_price_quantile) {
            return Err(SimError::config(format!(
                "residential_price_quantile must be within [0, 1], got {}",
                self.residential_price_quantile
            )));
        }
        for (key, rate) in [
            ("household_relocation_rate", self.household_relocation_rate),
            ("job_relocation_rate", self.job_relocation_rate),
            ("household_growth_rate", self.household_growth_rate),
            ("job_growth_rate", self.job_growth_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(SimError::config(format!(
                    "{key} must be within [0, 1], got {rate}"
                )));
            }
        }
        if !self.pda_min_dua.is_finite() || self.pda_min_dua < 0.0 {
            return Err(SimError::config(format!(
                "pda_min_dua must be a non-negative number, got {}",
                self.pda_min_dua
            )));
        }
        for (county, shifter) in &self.cost_shifters {
            if !shifter.is_finite() || *shifter <= 0.0 {
                return Err(SimError::config(format!(
                    "cost_shifters['{county}'] must be positive, got {shifter}"
                )));
            }
        }
        for name in self.county_id_map.values() {
            if !self.cost_shifters.contains_key(name) {
                return Err(SimError::config(format!(
                    "cost_shifters has no entry for county '{name}'"
                )));
            }
        }
        for (pda, shifter) in &self.pda_price_shifters {
            if !shifter.is_finite() || *shifter <= 0.0 {
                return Err(SimError::config(format!(
                    "pda_price_shifters['{pda}'] must be positive, got {shifter}"
                )));
            }
        }
        for (form, codes) in &self.form_to_btype {
            if codes.is_empty() {
                return Err(SimError::config(format!(
                    "form_to_btype['{form}'] lists no building types"
                )));
            }
        }
        for (naics, empsix) in &self.naics_to_empsix {
            if !self.empsix_name_to_id.is_empty() && !self.empsix_name_to_id.contains_key(empsix)
            {
                return Err(SimError::config(format!(
                    "naics_to_empsix[{naics}] = '{empsix}' has no entry in empsix_name_to_id"
                )));
            }
        }
        Ok(())
    }

    pub fn is_baseline(&self) -> bool {
        self.scenario == BASELINE_SCENARIO
    }

    pub fn county_name(&self, county_id: u32) -> Option<&str> {
        self.county_id_map.get(&county_id).map(String::as_str)
    }

    /// Cost shifter for a county id, through the county name.
    pub fn cost_shifter(&self, county_id: u32) -> Option<f64> {
        self.county_name(county_id)
            .and_then(|name| self.cost_shifters.get(name))
            .copied()
    }

    /// Price shifter for a parcel's PDA; 1.0 outside PDAs or for unmapped PDAs.
    pub fn price_shifter(&self, pda: Option<&str>) -> f64 {
        pda.and_then(|p| self.pda_price_shifters.get(p))
            .copied()
            .unwrap_or(1.0)
    }

    pub fn general_type(&self, building_type_id: u32) -> Option<&str> {
        self.building_type_map
            .get(&building_type_id)
            .map(String::as_str)
    }

    pub fn empsix(&self, naics: u32) -> Option<&str> {
        self.naics_to_empsix.get(&naics).map(String::as_str)
    }

    pub fn empsix_id(&self, naics: u32) -> Option<u32> {
        self.empsix(naics)
            .and_then(|name| self.empsix_name_to_id.get(name))
            .copied()
    }
}
