//! Column-oriented numeric frame handed to the statistical runner.
//!
//! Missing values are `NaN`, as the runner expects.

use std::collections::BTreeMap;

use crate::error::SimError;

use super::tables::{NodeId, NodeTable};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    index: Vec<i64>,
    columns: BTreeMap<String, Vec<f64>>,
}

impl Frame {
    pub fn new(index: Vec<i64>) -> Self {
        Self {
            index,
            columns: BTreeMap::new(),
        }
    }

    pub fn index(&self) -> &[i64] {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn insert_column(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<(), SimError> {
        let name = name.into();
        if values.len() != self.index.len() {
            return Err(SimError::config(format!(
                "column '{name}' has {} values for {} rows",
                values.len(),
                self.index.len()
            )));
        }
        self.columns.insert(name, values);
        Ok(())
    }

    pub fn with_column(mut self, name: impl Into<String>, values: Vec<f64>) -> Result<Self, SimError> {
        self.insert_column(name, values)?;
        Ok(self)
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Join every node variable onto the rows through their node ids.
    /// Rows without a node, or nodes absent from the table, get `NaN`.
    pub fn merge_nodes(&mut self, node_ids: &[Option<NodeId>], nodes: &NodeTable) -> Result<(), SimError> {
        let names: Vec<String> = nodes.column_names().map(str::to_string).collect();
        for name in names {
            let values = node_ids
                .iter()
                .map(|node| node.and_then(|n| nodes.get(&name, n)).unwrap_or(f64::NAN))
                .collect();
            self.insert_column(name, values)?;
        }
        Ok(())
    }

    /// Keep only rows whose mask entry is `true`.
    pub fn filter(&self, keep: &[bool]) -> Frame {
        let rows: Vec<usize> = keep
            .iter()
            .enumerate()
            .filter(|(_, k)| **k)
            .map(|(i, _)| i)
            .collect();
        self.take(&rows)
    }

    /// New frame made of the given row positions, in order. Positions may
    /// repeat; out-of-range positions are skipped.
    pub fn take(&self, rows: &[usize]) -> Frame {
        let rows: Vec<usize> = rows.iter().copied().filter(|&i| i < self.len()).collect();
        Frame {
            index: rows.iter().map(|&i| self.index[i]).collect(),
            columns: self
                .columns
                .iter()
                .map(|(name, values)| (name.clone(), rows.iter().map(|&i| values[i]).collect()))
                .collect(),
        }
    }
}
