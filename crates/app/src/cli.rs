//! Command line: `bayarea <first_year> <last_year> <model>...`

use std::ops::RangeInclusive;

use clap::Parser;

use landuse::registry::ModelId;
use landuse::SimError;

/// Settings JSON; defaults apply when unset.
pub const SETTINGS_ENV: &str = "BAYAREA_SETTINGS";
/// Pro-forma config JSON; defaults apply when unset.
pub const PROFORMA_ENV: &str = "BAYAREA_PROFORMA";
/// Dataset JSON; the run starts from empty tables when unset.
pub const DATA_ENV: &str = "BAYAREA_DATA";
/// Where to write the final feasibility table, if anywhere.
pub const OUTPUT_ENV: &str = "BAYAREA_OUTPUT";

/// Run land-use models over a range of years.
#[derive(Debug, Clone, PartialEq, Parser)]
#[command(name = "bayarea")]
pub struct RunArgs {
    /// First simulated year.
    pub first_year: u32,
    /// Last simulated year, inclusive.
    pub last_year: u32,
    /// Models to run each year, in order (e.g. price_vars feasibility).
    #[arg(required = true, value_parser = parse_model)]
    pub models: Vec<ModelId>,
}

fn parse_model(s: &str) -> Result<ModelId, String> {
    s.parse::<ModelId>().map_err(|e| e.to_string())
}

impl RunArgs {
    /// The simulated years; a reversed range is a configuration error.
    pub fn years(&self) -> Result<RangeInclusive<u32>, SimError> {
        if self.last_year < self.first_year {
            return Err(SimError::config(format!(
                "last year {} is before first year {}",
                self.last_year, self.first_year
            )));
        }
        Ok(self.first_year..=self.last_year)
    }
}

#[cfg(test)]
mod tests {
    use clap::error::ErrorKind;

    use super::*;

    #[test]
    fn test_parse_years_and_models() {
        let args =
            RunArgs::try_parse_from(["bayarea", "2010", "2012", "price_vars", "feasibility"]).unwrap();
        assert_eq!(args.years().unwrap(), 2010..=2012);
        assert_eq!(args.models, vec![ModelId::PriceVars, ModelId::Feasibility]);
    }

    #[test]
    fn test_missing_models_is_usage_error() {
        let err = RunArgs::try_parse_from(["bayarea", "2010", "2011"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        assert!(RunArgs::try_parse_from(["bayarea"]).is_err());
    }

    #[test]
    fn test_reversed_years_rejected() {
        let args = RunArgs::try_parse_from(["bayarea", "2012", "2010", "feasibility"]).unwrap();
        assert!(args.years().unwrap_err().is_configuration());
    }

    #[test]
    fn test_bad_year_and_unknown_model() {
        let err = RunArgs::try_parse_from(["bayarea", "twenty", "2010", "feasibility"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
        let err = RunArgs::try_parse_from(["bayarea", "2010", "2010", "developer"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
        assert!(err.to_string().contains("developer"));
    }

    #[test]
    fn test_help_is_not_a_year() {
        let err = RunArgs::try_parse_from(["bayarea", "--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
    }
}
