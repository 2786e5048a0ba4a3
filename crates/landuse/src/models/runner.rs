//! Seams to the external statistical runner and network aggregator.
//!
//! Both are black boxes: the land-use crate builds the input frames, hands
//! them over with a model configuration name, and writes back whatever comes
//! out. Failures surface as [`SimError::UpstreamModel`].

use std::collections::HashMap;
use std::error::Error;

use bevy::prelude::*;

use crate::datasets::{AgentId, BuildingId, Buildings, FittedModel, Frame, Households, Jobs, NodeTable, Parcels};
use crate::error::SimError;
use crate::settings::Settings;

pub type RunnerError = Box<dyn Error + Send + Sync>;

/// Hedonic and location-choice estimation/simulation.
pub trait StatisticalRunner: Send + Sync {
    fn hedonic_estimate(&self, frame: &Frame, config: &str) -> Result<FittedModel, RunnerError>;

    /// One predicted value per frame row, in row order.
    fn hedonic_simulate(
        &self,
        frame: &Frame,
        config: &str,
        fitted: Option<&FittedModel>,
    ) -> Result<Vec<f64>, RunnerError>;

    fn lcm_estimate(
        &self,
        choosers: &Frame,
        alternatives: &Frame,
        config: &str,
    ) -> Result<FittedModel, RunnerError>;

    /// Chosen building per chooser id. Each alternatives row is one vacant
    /// unit, indexed by building id.
    fn lcm_simulate(
        &self,
        choosers: &Frame,
        alternatives: &Frame,
        config: &str,
        fitted: Option<&FittedModel>,
    ) -> Result<HashMap<AgentId, BuildingId>, RunnerError>;
}

/// Tables available to a network aggregation.
pub struct AggregationInputs<'a> {
    pub parcels: &'a Parcels,
    pub buildings: &'a Buildings,
    pub households: &'a Households,
    pub jobs: &'a Jobs,
    pub settings: &'a Settings,
}

/// Accessibility aggregation of parcel-level quantities onto network nodes.
pub trait NetworkAggregator: Send + Sync {
    fn aggregate(&self, config: &str, inputs: &AggregationInputs) -> Result<NodeTable, RunnerError>;
}

#[derive(Resource)]
pub struct ModelRunner(pub Box<dyn StatisticalRunner>);

impl ModelRunner {
    pub fn new(runner: impl StatisticalRunner + 'static) -> Self {
        Self(Box::new(runner))
    }
}

#[derive(Resource)]
pub struct NetworkAggregation(pub Box<dyn NetworkAggregator>);

impl NetworkAggregation {
    pub fn new(aggregator: impl NetworkAggregator + 'static) -> Self {
        Self(Box::new(aggregator))
    }
}

/// The installed runner, or a configuration error naming the model that
/// needed it.
pub fn require_runner<'a>(
    runner: &'a Option<Res<ModelRunner>>,
    model: &str,
) -> Result<&'a dyn StatisticalRunner, SimError> {
    runner
        .as_deref()
        .map(|r| r.0.as_ref())
        .ok_or_else(|| SimError::config(format!("{model} needs a statistical runner; none is installed")))
}

pub fn require_aggregator<'a>(
    aggregator: &'a Option<Res<NetworkAggregation>>,
    model: &str,
) -> Result<&'a dyn NetworkAggregator, SimError> {
    aggregator
        .as_deref()
        .map(|a| a.0.as_ref())
        .ok_or_else(|| SimError::config(format!("{model} needs a network aggregator; none is installed")))
}
