//! The dashboard's reactive surface: selector options and the two chart handlers. The tables are
//! built once and never mutated, and every handler call recomputes its figure from them.

use std::collections::BTreeSet;

use log::{debug, info, warn};
use polars::prelude::*;
use serde::Serialize;

use crate::chart::{self, Figure};
use crate::config::Config;
use crate::error::{EstatedashError, Result};
use crate::metric::Metric;
use crate::{build_tables, Tables, COL};

/// Column of `region_counts` holding the number of distinct regions per state
pub const REGION_COUNT: &str = "Regions";

/// Type for the loaded dashboard data and the selector defaults
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub tables: Tables,
    pub config: Config,
    states: BTreeSet<String>,
}

/// Sizes of the loaded tables and the selector defaults
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Summary {
    pub fact_shape: (usize, usize),
    pub boundary_shape: (usize, usize),
    pub state_count: usize,
    pub default_state: String,
    pub default_metric: Metric,
}

impl Dashboard {
    /// Build the tables from the inputs named in `config`
    pub fn load(config: &Config) -> Result<Self> {
        let tables = build_tables(config)?;
        Self::from_tables(tables, config.clone())
    }

    /// Wrap already built tables, collecting the selectable states from the fact table
    pub fn from_tables(tables: Tables, config: Config) -> Result<Self> {
        let states: BTreeSet<String> = tables
            .fact
            .column(COL::STATE_NAME)?
            .str()?
            .into_iter()
            .flatten()
            .map(String::from)
            .collect();
        info!("Dashboard ready with {} selectable states", states.len());
        Ok(Self {
            tables,
            config,
            states,
        })
    }

    /// Distinct state codes of the fact table, sorted alphabetically
    pub fn state_options(&self) -> Vec<&str> {
        self.states.iter().map(String::as_str).collect()
    }

    pub fn metric_options(&self) -> Vec<Metric> {
        Metric::options()
    }

    /// The configured default state, or the first available one when the fact table has no rows
    /// for it.
    pub fn default_state(&self) -> Option<&str> {
        if self.states.contains(&self.config.default_state) {
            return Some(&self.config.default_state);
        }
        let fallback = self.states.iter().next().map(String::as_str);
        warn!(
            "Default state '{}' has no data, falling back to {fallback:?}",
            self.config.default_state
        );
        fallback
    }

    pub fn default_metric(&self) -> Metric {
        self.config.default_metric
    }

    /// Line chart of `metric` for the regions of `state`
    pub fn update_graph(&self, state: &str, metric: Metric) -> Result<Figure> {
        if !self.states.contains(state) {
            return Err(EstatedashError::UnknownState(state.to_string()));
        }
        debug!("Updating graph for state {state} and metric '{metric}'");
        chart::time_series(&self.tables.fact, state, metric)
    }

    /// National choropleth of `metric`
    pub fn update_map(&self, metric: Metric) -> Result<Figure> {
        debug!("Updating map for metric '{metric}'");
        chart::choropleth(&self.tables.boundary, metric)
    }

    /// Both figures for the default selections
    pub fn initial_figures(&self) -> Result<(Figure, Figure)> {
        let metric = self.default_metric();
        let state = self
            .default_state()
            .ok_or_else(|| EstatedashError::UnknownState(self.config.default_state.clone()))?;
        Ok((self.update_graph(state, metric)?, self.update_map(metric)?))
    }

    /// Number of distinct regions per state in the fact table, sorted by state
    pub fn region_counts(&self) -> Result<DataFrame> {
        Ok(self
            .tables
            .fact
            .clone()
            .lazy()
            .group_by([col(COL::STATE_NAME)])
            .agg([col(COL::REGION_NAME)
                .n_unique()
                .cast(DataType::UInt32)
                .alias(REGION_COUNT)])
            .sort([COL::STATE_NAME], SortMultipleOptions::default())
            .collect()?)
    }

    pub fn summary(&self) -> Summary {
        Summary {
            fact_shape: self.tables.fact.shape(),
            boundary_shape: self.tables.boundary.shape(),
            state_count: self.states.len(),
            default_state: self
                .default_state()
                .unwrap_or(&self.config.default_state)
                .to_string(),
            default_metric: self.default_metric(),
        }
    }
}
