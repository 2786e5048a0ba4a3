//! Built-in runner and aggregator for driving the models without the external
//! statistical and network tooling.
//!
//! [`CoefficientRunner`] only simulates: it applies coefficients already in
//! [`FittedModels`] as a linear score. [`NodeAggregator`] aggregates onto the
//! parcel's own node with no network search.

use std::collections::{BTreeMap, HashMap};

use crate::config::RESIDENTIAL_GENERAL_TYPE;
use crate::datasets::{AgentId, BuildingId, FittedModel, Frame, NodeId, NodeTable};

use super::accessibility::PRICE_NETWORK_CONFIG;
use super::runner::{AggregationInputs, NetworkAggregator, RunnerError, StatisticalRunner};

/// Coefficient key for the constant term.
pub const INTERCEPT: &str = "intercept";

// =============================================================================
// Coefficient runner
// =============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct CoefficientRunner;

/// `intercept + sum(coef * column)` per row; missing values count as zero.
pub fn linear_scores(frame: &Frame, fitted: &FittedModel) -> Result<Vec<f64>, RunnerError> {
    let mut scores = vec![fitted.coefficients.get(INTERCEPT).copied().unwrap_or(0.0); frame.len()];
    for (name, coef) in &fitted.coefficients {
        if name == INTERCEPT {
            continue;
        }
        let column = frame
            .column(name)
            .ok_or_else(|| format!("frame has no column '{name}'"))?;
        for (s, v) in scores.iter_mut().zip(column) {
            if v.is_finite() {
                *s += coef * v;
            }
        }
    }
    Ok(scores)
}

impl StatisticalRunner for CoefficientRunner {
    fn hedonic_estimate(&self, _frame: &Frame, config: &str) -> Result<FittedModel, RunnerError> {
        Err(format!("cannot estimate {config}: load fitted coefficients instead").into())
    }

    fn hedonic_simulate(
        &self,
        frame: &Frame,
        config: &str,
        fitted: Option<&FittedModel>,
    ) -> Result<Vec<f64>, RunnerError> {
        let fitted = fitted.ok_or_else(|| format!("{config} has no fitted coefficients"))?;
        linear_scores(frame, fitted)
    }

    fn lcm_estimate(
        &self,
        _choosers: &Frame,
        _alternatives: &Frame,
        config: &str,
    ) -> Result<FittedModel, RunnerError> {
        Err(format!("cannot estimate {config}: load fitted coefficients instead").into())
    }

    /// Choosers, in id order, take the best-scoring remaining unit. Without
    /// coefficients every unit scores the same and units go in frame order.
    fn lcm_simulate(
        &self,
        choosers: &Frame,
        alternatives: &Frame,
        _config: &str,
        fitted: Option<&FittedModel>,
    ) -> Result<HashMap<AgentId, BuildingId>, RunnerError> {
        let scores = match fitted {
            Some(f) => linear_scores(alternatives, f)?,
            None => vec![0.0; alternatives.len()],
        };
        let mut order: Vec<usize> = (0..alternatives.len()).collect();
        order.sort_by(|a, b| scores[*b].total_cmp(&scores[*a]));

        let mut ids: Vec<AgentId> = choosers.index().to_vec();
        ids.sort_unstable();
        Ok(ids
            .into_iter()
            .zip(order)
            .map(|(agent, row)| (agent, alternatives.index()[row]))
            .collect())
    }
}

// =============================================================================
// Node aggregator
// =============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct NodeAggregator;

#[derive(Default)]
struct Mean {
    sum: HashMap<NodeId, f64>,
    count: HashMap<NodeId, f64>,
}

impl Mean {
    fn add(&mut self, node: NodeId, value: f64) {
        *self.sum.entry(node).or_default() += value;
        *self.count.entry(node).or_default() += 1.0;
    }

    fn finish(self) -> HashMap<NodeId, f64> {
        let count = self.count;
        self.sum
            .into_iter()
            .map(|(n, s)| (n, s / count.get(&n).copied().unwrap_or(1.0)))
            .collect()
    }
}

impl NodeAggregator {
    /// Sums of stock and agents per node.
    fn neighborhood(&self, inputs: &AggregationInputs) -> NodeTable {
        let mut sums: BTreeMap<&str, HashMap<NodeId, f64>> = BTreeMap::new();
        let mut building_node = HashMap::new();
        for b in inputs.buildings.rows() {
            let Some(node) = inputs.parcels.get(b.parcel_id).and_then(|p| p.node_id) else {
                continue;
            };
            building_node.insert(b.building_id, node);
            *sums.entry("residential_units").or_default().entry(node).or_default() +=
                b.residential_units as f64;
            *sums.entry("job_spaces").or_default().entry(node).or_default() += b.job_spaces as f64;
        }
        for h in &inputs.households.0 {
            if let Some(node) = h.building_id.and_then(|b| building_node.get(&b)) {
                *sums.entry("households").or_default().entry(*node).or_default() += 1.0;
            }
        }
        for j in &inputs.jobs.0 {
            if let Some(node) = j.building_id.and_then(|b| building_node.get(&b)) {
                *sums.entry("jobs").or_default().entry(*node).or_default() += 1.0;
            }
        }
        let mut table = NodeTable::new();
        for name in ["residential_units", "job_spaces", "households", "jobs"] {
            table = table.with_column(name, sums.remove(name).unwrap_or_default());
        }
        table
    }

    /// Mean prices per node: residential sales price, and non-residential rent
    /// split by general type.
    fn prices(&self, inputs: &AggregationInputs) -> NodeTable {
        let mut residential = Mean::default();
        let mut by_type: BTreeMap<&str, Mean> = BTreeMap::new();
        for b in inputs.buildings.rows() {
            let Some(node) = inputs.parcels.get(b.parcel_id).and_then(|p| p.node_id) else {
                continue;
            };
            let general = inputs.settings.general_type(b.building_type_id);
            if general == Some(RESIDENTIAL_GENERAL_TYPE) {
                if let Some(p) = b.residential_sales_price.filter(|v| v.is_finite()) {
                    residential.add(node, p);
                }
                continue;
            }
            let column = match general {
                Some("Retail") => "retail",
                Some("Industrial") => "industrial",
                Some("Office") => "office",
                _ => continue,
            };
            if let Some(rent) = b.non_residential_rent.filter(|v| v.is_finite()) {
                by_type.entry(column).or_default().add(node, rent);
            }
        }
        let mut table = NodeTable::new().with_column("residential", residential.finish());
        for name in ["retail", "industrial", "office"] {
            let values = by_type.remove(name).map(Mean::finish).unwrap_or_default();
            table = table.with_column(name, values);
        }
        table
    }
}

impl NetworkAggregator for NodeAggregator {
    fn aggregate(&self, config: &str, inputs: &AggregationInputs) -> Result<NodeTable, RunnerError> {
        if config == PRICE_NETWORK_CONFIG {
            Ok(self.prices(inputs))
        } else {
            Ok(self.neighborhood(inputs))
        }
    }
}
