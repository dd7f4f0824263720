use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::metric::{Metric, SourceTable};

/// How the national aggregate row at the top of each Zillow table is identified.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum NationalRow {
    /// Drop the first data row, whatever it contains
    Positional,
    /// Drop rows with this `RegionName`, or with a `RegionType` of `country`
    Named(String),
}

impl Default for NationalRow {
    fn default() -> Self {
        NationalRow::Named("United States".into())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Directory every input path is resolved against
    pub base_path: String,
    pub rent_file: String,
    pub home_value_file: String,
    pub price_cut_file: String,
    pub boundary_file: String,
    pub national_row: NationalRow,
    pub default_state: String,
    pub default_metric: Metric,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_path: ".".into(),
            rent_file: "RealEstate_Data/Zillow_ZORI_Index.csv".into(),
            home_value_file: "RealEstate_Data/Zillow_ZHVI_Index.csv".into(),
            price_cut_file: "RealEstate_Data/Zillow_Mean_Percent_Cut.csv".into(),
            boundary_file: "cb_2018_us_state_500k.zip".into(),
            national_row: NationalRow::default(),
            default_state: "NC".into(),
            default_metric: Metric::RentIndex,
        }
    }
}

impl Config {
    /// Resolved path of one of the three metric tables
    pub fn source_path(&self, table: SourceTable) -> PathBuf {
        let file = match table {
            SourceTable::Rent => &self.rent_file,
            SourceTable::HomeValue => &self.home_value_file,
            SourceTable::PriceCut => &self.price_cut_file,
        };
        Path::new(&self.base_path).join(file)
    }

    /// Resolved path of the state boundary dataset
    pub fn boundary_path(&self) -> PathBuf {
        Path::new(&self.base_path).join(&self.boundary_file)
    }
}
