use log::{debug, info};
use polars::frame::DataFrame;

use crate::config::Config;
use crate::error::Result;
use crate::metric::SourceTable;

// Re-exports
pub use column_names as COL;
pub use dashboard::Dashboard;

// Modules
pub mod aggregate;
pub mod chart;
pub mod column_names;
pub mod config;
pub mod dashboard;
pub mod dates;
pub mod error;
pub mod formatters;
pub mod geo;
pub mod join;
pub mod loader;
pub mod metric;
pub mod reshape;

/// The two finished tables the dashboard views are drawn from
#[derive(Debug, Clone)]
pub struct Tables {
    /// `RegionName, StateName, Date, HomePrice, RentPrice, PercentPriceCut, PTR`
    pub fact: DataFrame,
    /// `STUSPS, NAME, geometry, RentPrice, HomePrice, PercentPriceCut, PTR`
    pub boundary: DataFrame,
}

/// Per-source outputs of the reshaping stage
struct Reshaped {
    long: DataFrame,
    medians: DataFrame,
}

fn reshape_source(config: &Config, source: SourceTable) -> Result<Reshaped> {
    let table = loader::load_metric_table(
        &config.source_path(source),
        source,
        &config.national_row,
    )?;
    let table = reshape::prepare(table)?;
    Ok(Reshaped {
        medians: aggregate::state_medians(&table)?,
        long: reshape::unpivot(&table)?,
    })
}

/// Run the whole pipeline: load, reshape and aggregate the three metric tables, read the state
/// boundaries and join everything into the fact and boundary tables. Any failure is fatal.
pub fn build_tables(config: &Config) -> Result<Tables> {
    debug!("config: {config:?}");
    let rent = reshape_source(config, SourceTable::Rent)?;
    let home = reshape_source(config, SourceTable::HomeValue)?;
    let price_cut = reshape_source(config, SourceTable::PriceCut)?;
    let states = geo::load_boundaries(&config.boundary_path())?;

    let fact = join::fact_table(rent.long, home.long, price_cut.long)?;
    let boundary = join::boundary_table(states, rent.medians, home.medians, price_cut.medians)?;
    info!(
        "Tables ready: fact {:?}, boundary {:?}",
        fact.shape(),
        boundary.shape()
    );
    Ok(Tables { fact, boundary })
}


#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use polars::prelude::*;

    use super::*;
    use crate::error::EstatedashError;

    #[test]
    fn pipeline_should_build_both_tables() -> anyhow::Result<()> {
        let (_dir, config) = test_fixtures::inputs();
        let tables = build_tables(&config)?;

        let asheville = tables
            .fact
            .clone()
            .lazy()
            .filter(col(COL::REGION_NAME).eq(lit("Asheville, NC")))
            .collect()?
            .sort([COL::DATE], SortMultipleOptions::default())?;
        assert_eq!(asheville.height(), 2);
        let dates: Vec<Option<NaiveDate>> =
            asheville.column(COL::DATE)?.date()?.as_date_iter().collect();
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2020, 1, 1),
                NaiveDate::from_ymd_opt(2020, 2, 1)
            ]
        );
        let rents: Vec<f64> = asheville
            .column(COL::RENT_PRICE)?
            .f64()?
            .into_no_null_iter()
            .collect();
        assert_eq!(rents, vec![1000.0, 1010.0]);

        // Austin has no January home value and Cheyenne has no home values at all
        assert_eq!(tables.fact.height(), 5);
        assert!(tables
            .fact
            .column(COL::REGION_NAME)?
            .str()?
            .into_no_null_iter()
            .all(|region| region != "Cheyenne, WY" && region != "United States"));
        Ok(())
    }

    #[test]
    fn state_without_every_aggregate_should_be_left_off_the_map() -> anyhow::Result<()> {
        let (_dir, config) = test_fixtures::inputs();
        let boundary = build_tables(&config)?
            .boundary
            .sort([COL::STUSPS], SortMultipleOptions::default())?;
        let codes: Vec<&str> = boundary
            .column(COL::STUSPS)?
            .str()?
            .into_no_null_iter()
            .collect();
        assert_eq!(codes, vec!["NC", "TX"]);

        // Medians of the latest month: NC rents 1010 and 1210, NC home values 303000 and 363000
        let nc_rent = boundary.column(COL::RENT_PRICE)?.f64()?.get(0);
        assert_eq!(nc_rent, Some(1110.0));
        let nc_ptr = boundary.column(COL::PTR)?.f64()?.get(0);
        assert_eq!(nc_ptr, Some(333000.0 / (12.0 * 1110.0)));
        Ok(())
    }

    #[test]
    fn boundaries_without_state_names_should_still_be_mapped() -> anyhow::Result<()> {
        let (dir, mut config) = test_fixtures::inputs();
        std::fs::write(
            dir.path().join("unnamed.geojson"),
            test_fixtures::boundaries(false),
        )?;
        config.boundary_file = "unnamed.geojson".into();

        let boundary = build_tables(&config)?
            .boundary
            .sort([COL::STUSPS], SortMultipleOptions::default())?;
        let codes: Vec<&str> = boundary
            .column(COL::STUSPS)?
            .str()?
            .into_no_null_iter()
            .collect();
        assert_eq!(codes, vec!["NC", "TX"]);
        assert_eq!(boundary.column(COL::STATE_FULL_NAME)?.null_count(), 2);
        Ok(())
    }

    #[test]
    fn missing_input_should_stop_the_pipeline() {
        let (_dir, mut config) = test_fixtures::inputs();
        config.price_cut_file = "missing.csv".into();
        assert!(matches!(
            build_tables(&config),
            Err(EstatedashError::MissingInput(_))
        ));
    }
}
