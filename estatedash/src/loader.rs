//! Reading the wide Zillow research tables from disk.

use std::path::Path;

use log::{debug, info};
use polars::prelude::*;

use crate::config::NationalRow;
use crate::error::{EstatedashError, Result};
use crate::metric::SourceTable;
use crate::COL;

/// Columns carrying no analytical value, dropped straight after load
const UNUSED_COLUMNS: [&str; 3] = [COL::REGION_ID, COL::SIZE_RANK, COL::REGION_TYPE];

/// A metric table in its downloaded wide layout: one row per region and one column per date.
#[derive(Debug, Clone)]
pub struct WideTable {
    pub source: SourceTable,
    pub df: DataFrame,
}

impl WideTable {
    /// Every column that is not an identifier column. Once the table has been reordered these are
    /// exactly the date columns.
    pub fn date_columns(&self) -> Vec<String> {
        self.df
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .filter(|name| !COL::ID_COLUMNS.contains(&name.as_str()))
            .collect()
    }

    /// Fetch a column, reporting which table it was missing from.
    pub fn column(&self, name: &str) -> Result<&Series> {
        self.df
            .column(name)
            .map_err(|_| EstatedashError::MissingColumn {
                table: self.source.to_string(),
                column: name.to_string(),
            })
    }
}

/// Load one metric table, drop its national aggregate row and its unused columns.
pub fn load_metric_table(
    path: &Path,
    source: SourceTable,
    national_row: &NationalRow,
) -> Result<WideTable> {
    if !path.exists() {
        return Err(EstatedashError::MissingInput(path.to_path_buf()));
    }
    info!("Attempting to load {source} from {}", path.display());
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    if df.get_column_index(COL::REGION_NAME).is_none() {
        return Err(EstatedashError::MissingColumn {
            table: source.to_string(),
            column: COL::REGION_NAME.to_string(),
        });
    }

    let mut df = drop_national_rows(df, national_row)?;
    for name in UNUSED_COLUMNS {
        if df.get_column_index(name).is_some() {
            df = df.drop(name)?;
        }
    }
    info!("Loaded {source} with shape: {:?}", df.shape());
    debug!("{df:#?}");
    Ok(WideTable { source, df })
}

fn drop_national_rows(df: DataFrame, national_row: &NationalRow) -> Result<DataFrame> {
    match national_row {
        NationalRow::Positional => Ok(df.slice(1, df.height().saturating_sub(1))),
        NationalRow::Named(name) => {
            let mut is_national = col(COL::REGION_NAME).eq(lit(name.as_str()));
            if df.get_column_index(COL::REGION_TYPE).is_some() {
                is_national =
                    is_national.or(col(COL::REGION_TYPE).eq(lit(COL::NATIONAL_REGION_TYPE)));
            }
            Ok(df
                .lazy()
                .filter(is_national.fill_null(lit(false)).not())
                .collect()?)
        }
    }
}
