//! Reshaping the wide metric tables: deriving the state code, putting the identifier columns
//! first and unpivoting the date columns into long form.

use log::{debug, info};
use polars::prelude::*;

use crate::dates::normalize_dates;
use crate::error::Result;
use crate::loader::WideTable;
use crate::COL;

/// Derive the state code, reorder the columns and cast every date column to `Float64`.
pub fn prepare(table: WideTable) -> Result<WideTable> {
    let table = derive_state_name(table)?;
    reorder(table)
}

/// Add a `StateName` column holding the last two characters of each region's name, unless the
/// table already carries one. Zillow labels metros as `"Asheville, NC"`.
pub fn derive_state_name(mut table: WideTable) -> Result<WideTable> {
    if table.df.get_column_index(COL::STATE_NAME).is_some() {
        return Ok(table);
    }
    let states: Vec<Option<String>> = table
        .column(COL::REGION_NAME)?
        .str()?
        .into_iter()
        .map(|region| region.map(state_suffix))
        .collect();
    table.df.with_column(Series::new(COL::STATE_NAME, states))?;
    Ok(table)
}

fn state_suffix(region: &str) -> String {
    let start = region
        .char_indices()
        .rev()
        .nth(1)
        .map(|(idx, _)| idx)
        .unwrap_or(0);
    region[start..].to_string()
}

/// Date headers are recognised by containing something other than letters; any other purely
/// alphabetic column (`City`, `Metro`, ...) is discarded.
fn is_date_header(name: &str) -> bool {
    name.is_empty() || !name.chars().all(char::is_alphabetic)
}

/// Put `RegionName` and `StateName` first, followed by the date columns as `Float64`.
pub fn reorder(table: WideTable) -> Result<WideTable> {
    let mut columns = Vec::with_capacity(table.df.width());
    for name in COL::ID_COLUMNS {
        columns.push(table.column(name)?.cast(&DataType::String)?);
    }
    for name in table.date_columns() {
        if is_date_header(&name) {
            columns.push(table.column(&name)?.cast(&DataType::Float64)?);
        } else {
            debug!("Discarding column '{name}' from {}", table.source);
        }
    }
    Ok(WideTable {
        source: table.source,
        df: DataFrame::new(columns)?,
    })
}

/// Unpivot a prepared table into `RegionName, StateName, Date, <value column>`, one row per
/// region and date column. Headers are normalised to month dates on the way, so a header in an
/// unsupported format fails the whole table.
pub fn unpivot(table: &WideTable) -> Result<DataFrame> {
    let value_column = table.source.value_column();
    let date_columns = table.date_columns();
    let dates = normalize_dates(&date_columns)?;
    let regions = table.column(COL::REGION_NAME)?;
    let states = table.column(COL::STATE_NAME)?;
    let height = table.df.height();

    let mut long = DataFrame::new(vec![
        Series::new_empty(COL::REGION_NAME, &DataType::String),
        Series::new_empty(COL::STATE_NAME, &DataType::String),
        Series::new_empty(COL::DATE, &DataType::Date),
        Series::new_empty(value_column, &DataType::Float64),
    ])?;
    for (header, date) in date_columns.iter().zip(dates) {
        let date_series =
            DateChunked::from_naive_date(COL::DATE, std::iter::repeat(date).take(height))
                .into_series();
        let values = table.column(header)?.clone().with_name(value_column);
        let frame = DataFrame::new(vec![regions.clone(), states.clone(), date_series, values])?;
        long.vstack_mut(&frame)?;
    }
    info!(
        "Unpivoted {} from {:?} to {:?}",
        table.source,
        table.df.shape(),
        long.shape()
    );
    Ok(long)
}
