// ---------------------------------------------------------------------------
// SimError: typed failures for the land-use pipeline
// ---------------------------------------------------------------------------

use std::fmt;

/// Errors that abort a simulation year.
///
/// Per-parcel data gaps never show up here: a missing price or zoning value is
/// resolved locally (zero, not allowed, not feasible). Only structural problems
/// and failures of the external runners are surfaced as errors.
#[derive(Debug)]
pub enum SimError {
    /// Settings or catalog are inconsistent (unknown building-type code, a use
    /// with no price function, a form without a catalog entry, bad values).
    Configuration(String),
    /// The statistical runner or network aggregator failed.
    UpstreamModel { model: String, message: String },
    /// A table the model needs is not present in the world.
    MissingTable(&'static str),
    /// A model name or id could not be resolved or run.
    Dispatch(String),
    /// I/O error while reading settings or input tables.
    Io(std::io::Error),
    /// Malformed JSON input.
    Parse(String),
}

impl SimError {
    pub fn config(msg: impl Into<String>) -> Self {
        SimError::Configuration(msg.into())
    }

    pub fn upstream(model: impl Into<String>, message: impl fmt::Display) -> Self {
        SimError::UpstreamModel {
            model: model.into(),
            message: message.to_string(),
        }
    }

    /// True for settings/catalog problems, as opposed to runtime failures.
    pub fn is_configuration(&self) -> bool {
        matches!(self, SimError::Configuration(_))
    }
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::Configuration(msg) => write!(f, "Configuration error: {msg}"),
            SimError::UpstreamModel { model, message } => {
                write!(f, "Upstream model '{model}' failed: {message}")
            }
            SimError::MissingTable(name) => write!(f, "Missing required table: {name}"),
            SimError::Dispatch(msg) => write!(f, "Model dispatch error: {msg}"),
            SimError::Io(e) => write!(f, "I/O error: {e}"),
            SimError::Parse(msg) => write!(f, "Parse error: {msg}"),
        }
    }
}

impl std::error::Error for SimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SimError {
    fn from(e: std::io::Error) -> Self {
        SimError::Io(e)
    }
}

impl From<serde_json::Error> for SimError {
    fn from(e: serde_json::Error) -> Self {
        SimError::Parse(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_configuration_names_offender() {
        let err = SimError::config("form 'office' references building type 99");
        let msg = format!("{err}");
        assert!(msg.contains("Configuration error"), "got: {msg}");
        assert!(msg.contains("office"), "got: {msg}");
        assert!(err.is_configuration());
    }

    #[test]
    fn test_display_upstream() {
        let err = SimError::upstream("rsh_simulate", "singular matrix");
        let msg = format!("{err}");
        assert!(msg.contains("rsh_simulate"), "got: {msg}");
        assert!(msg.contains("singular matrix"), "got: {msg}");
        assert!(!err.is_configuration());
    }

    #[test]
    fn test_from_io_has_source() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "settings.json");
        let err: SimError = io_err.into();
        assert!(matches!(err, SimError::Io(_)));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<u32>("not a number").unwrap_err();
        let err: SimError = json_err.into();
        assert!(matches!(err, SimError::Parse(_)));
    }
}
