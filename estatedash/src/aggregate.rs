//! Per-state summaries of the most recent period, used to colour the national map.

use log::{debug, info};
use polars::prelude::*;

use crate::dates::normalize_dates;
use crate::error::{EstatedashError, Result};
use crate::loader::WideTable;
use crate::COL;

/// Name of the date column holding the latest period. Chosen by parsed date rather than by
/// position so a resorted file still yields the newest observations; on equal dates the later
/// column wins.
pub fn most_recent_column(table: &WideTable) -> Result<String> {
    let columns = table.date_columns();
    let dates = normalize_dates(&columns)?;
    columns
        .into_iter()
        .zip(dates)
        .max_by_key(|(_, date)| *date)
        .map(|(column, _)| column)
        .ok_or_else(|| EstatedashError::MissingColumn {
            table: table.source.to_string(),
            column: "<any date column>".into(),
        })
}

/// Median of each region's most recent value, per state. The result is keyed by `STUSPS` so it
/// joins directly onto the boundary table, and sorted by state code. Regions without a state code
/// are ignored and states without regions are absent.
pub fn state_medians(table: &WideTable) -> Result<DataFrame> {
    let recent = most_recent_column(table)?;
    let value_column = table.source.value_column();
    info!("Most recent period of {} is '{recent}'", table.source);

    let medians = table
        .df
        .clone()
        .lazy()
        .filter(col(COL::STATE_NAME).is_not_null())
        .group_by([col(COL::STATE_NAME).alias(COL::STUSPS)])
        .agg([col(recent.as_str()).median().alias(value_column)])
        .collect()?
        .sort([COL::STUSPS], SortMultipleOptions::default())?;
    debug!("{medians:#?}");
    Ok(medians)
}

#[cfg(test)]
mod tests {
    use polars::df;

    use super::*;
    use crate::metric::SourceTable;

    fn home_values() -> WideTable {
        WideTable {
            source: SourceTable::HomeValue,
            df: df!(
                COL::REGION_NAME => &["Asheville, NC", "Raleigh, NC", "Durham, NC", "Charlotte, NC",
                    "Austin, TX", "Nowhere"],
                COL::STATE_NAME => &[Some("NC"), Some("NC"), Some("NC"), Some("NC"), Some("TX"), None],
                "2020-01-31" => &[1.0, 1.0, 1.0, 1.0, 1.0, 1.0],
                "2020-03-31" => &[300.0, 100.0, 400.0, 200.0, 500.0, 900.0],
                "2020-02-29" => &[2.0, 2.0, 2.0, 2.0, 2.0, 2.0]
            )
            .unwrap(),
        }
    }

    #[test]
    fn most_recent_column_should_be_chosen_by_date() -> anyhow::Result<()> {
        assert_eq!(most_recent_column(&home_values())?, "2020-03-31");
        Ok(())
    }

    #[test]
    fn medians_should_average_middle_values_for_even_counts() -> anyhow::Result<()> {
        let medians = state_medians(&home_values())?;
        let expected = df!(
            COL::STUSPS => &["NC", "TX"],
            COL::HOME_PRICE => &[250.0, 500.0]
        )?;
        assert_eq!(medians, expected);
        Ok(())
    }

    #[test]
    fn table_without_dates_should_fail() {
        let table = WideTable {
            source: SourceTable::Rent,
            df: df!(
                COL::REGION_NAME => &["Asheville, NC"],
                COL::STATE_NAME => &["NC"]
            )
            .unwrap(),
        };
        assert!(matches!(
            most_recent_column(&table),
            Err(EstatedashError::MissingColumn { .. })
        ));
    }
}
