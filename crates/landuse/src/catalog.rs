//! Form/Use catalog.
//!
//! A building **form** is an archetype (office tower, mixed residential, ...)
//! made of a mix of space **uses**. Each form is permitted by one or more
//! zoning building-type codes. The catalog is assembled once from
//! [`Settings`] and [`ProFormaConfig`] and is read-only afterwards.

use std::collections::BTreeMap;
use std::fmt;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::proforma::ProFormaConfig;
use crate::settings::Settings;

// =============================================================================
// Use
// =============================================================================

/// Space-use category with its own achievable price or rent.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Use {
    Retail,
    Industrial,
    Office,
    Residential,
}

impl Use {
    pub const ALL: [Use; 4] = [Use::Retail, Use::Industrial, Use::Office, Use::Residential];

    /// Column name in node price surfaces and in the feasibility inputs.
    pub fn name(self) -> &'static str {
        match self {
            Use::Retail => "retail",
            Use::Industrial => "industrial",
            Use::Office => "office",
            Use::Residential => "residential",
        }
    }

    pub fn is_residential(self) -> bool {
        self == Use::Residential
    }
}

impl fmt::Display for Use {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Form
// =============================================================================

/// Building archetype evaluated by the pro-forma.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Form {
    Retail,
    Industrial,
    Office,
    Residential,
    MixedResidential,
    MixedOffice,
}

impl Form {
    pub const ALL: [Form; 6] = [
        Form::Retail,
        Form::Industrial,
        Form::Office,
        Form::Residential,
        Form::MixedResidential,
        Form::MixedOffice,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Form::Retail => "retail",
            Form::Industrial => "industrial",
            Form::Office => "office",
            Form::Residential => "residential",
            Form::MixedResidential => "mixedresidential",
            Form::MixedOffice => "mixedoffice",
        }
    }
}

impl fmt::Display for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// What a single form is made of and which zoning codes permit it.
#[derive(Debug, Clone, PartialEq)]
pub struct FormEntry {
    /// Use shares, normalized to sum to 1.0. Only uses with a positive share.
    pub uses: Vec<(Use, f64)>,
    /// Zoning building-type codes that legally permit the form.
    pub building_types: Vec<u32>,
}

impl FormEntry {
    /// Share of floor area in residential use (0.0 for purely commercial forms).
    pub fn residential_share(&self) -> f64 {
        self.uses
            .iter()
            .filter(|(u, _)| u.is_residential())
            .map(|(_, s)| s)
            .sum()
    }

    pub fn share_of(&self, use_: Use) -> f64 {
        self.uses
            .iter()
            .find(|(u, _)| *u == use_)
            .map(|(_, s)| *s)
            .unwrap_or(0.0)
    }
}

/// Read-only registry of every form the pro-forma evaluates.
#[derive(Resource, Debug, Clone, Default)]
pub struct FormCatalog {
    entries: BTreeMap<Form, FormEntry>,
}

impl FormCatalog {
    /// Build the catalog from the pro-forma use mixes and the settings'
    /// form-to-building-type map. Every form the pro-forma evaluates must have
    /// at least one permitting code and a positive use mix.
    pub fn build(settings: &Settings, proforma: &ProFormaConfig) -> Result<Self, SimError> {
        let mut entries = BTreeMap::new();
        for (&form, mix) in &proforma.forms {
            let building_types = settings
                .form_to_btype
                .get(&form)
                .filter(|codes| !codes.is_empty())
                .cloned()
                .ok_or_else(|| {
                    SimError::config(format!(
                        "form '{form}' has no entry in form_to_btype"
                    ))
                })?;

            let total: f64 = mix.values().filter(|s| **s > 0.0).sum();
            if total <= 0.0 || !total.is_finite() {
                return Err(SimError::config(format!(
                    "form '{form}' has no positive use shares"
                )));
            }

            let mut uses = Vec::with_capacity(mix.len());
            for (&use_, &share) in mix {
                if share <= 0.0 {
                    continue;
                }
                if !proforma.uses.contains(&use_) {
                    return Err(SimError::config(format!(
                        "form '{form}' uses '{use_}', which has no price function"
                    )));
                }
                uses.push((use_, share / total));
            }

            entries.insert(
                form,
                FormEntry {
                    uses,
                    building_types,
                },
            );
        }
        Ok(Self { entries })
    }

    pub fn get(&self, form: Form) -> Result<&FormEntry, SimError> {
        self.entries
            .get(&form)
            .ok_or_else(|| SimError::config(format!("form '{form}' is not in the catalog")))
    }

    /// Forms in deterministic order.
    pub fn forms(&self) -> impl Iterator<Item = Form> + '_ {
        self.entries.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Form, &FormEntry)> {
        self.entries.iter().map(|(f, e)| (*f, e))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_catalog() -> FormCatalog {
        FormCatalog::build(&Settings::default(), &ProFormaConfig::default()).unwrap()
    }

    #[test]
    fn test_default_catalog_has_every_form() {
        let catalog = default_catalog();
        assert_eq!(catalog.len(), Form::ALL.len());
        for form in Form::ALL {
            assert!(catalog.get(form).is_ok(), "missing {form}");
        }
    }

    #[test]
    fn test_shares_are_normalized() {
        let catalog = default_catalog();
        for (form, entry) in catalog.iter() {
            let total: f64 = entry.uses.iter().map(|(_, s)| s).sum();
            assert!((total - 1.0).abs() < 1e-9, "{form} shares sum to {total}");
        }
    }

    #[test]
    fn test_mixed_residential_mix() {
        let catalog = default_catalog();
        let entry = catalog.get(Form::MixedResidential).unwrap();
        assert!((entry.residential_share() - 0.9).abs() < 1e-9);
        assert!((entry.share_of(Use::Retail) - 0.1).abs() < 1e-9);
        assert_eq!(entry.share_of(Use::Office), 0.0);
        assert_eq!(entry.building_types, vec![12]);
    }

    #[test]
    fn test_residential_permitted_by_three_codes() {
        let catalog = default_catalog();
        let entry = catalog.get(Form::Residential).unwrap();
        assert_eq!(entry.building_types, vec![1, 2, 3]);
    }

    #[test]
    fn test_form_without_btype_is_configuration_error() {
        let mut settings = Settings::default();
        settings.form_to_btype.remove(&Form::MixedOffice);
        let err = FormCatalog::build(&settings, &ProFormaConfig::default()).unwrap_err();
        assert!(err.is_configuration());
        assert!(format!("{err}").contains("mixedoffice"));
    }

    #[test]
    fn test_use_without_price_function_is_configuration_error() {
        let mut proforma = ProFormaConfig::default();
        proforma.uses.retain(|u| *u != Use::Retail);
        let err = FormCatalog::build(&Settings::default(), &proforma).unwrap_err();
        assert!(format!("{err}").contains("retail"), "got: {err}");
    }

    #[test]
    fn test_serde_names_match_display() {
        for form in Form::ALL {
            let json = serde_json::to_string(&form).unwrap();
            assert_eq!(json, format!("\"{}\"", form.name()));
        }
        for use_ in Use::ALL {
            let json = serde_json::to_string(&use_).unwrap();
            assert_eq!(json, format!("\"{}\"", use_.name()));
        }
    }
}
