//! Combining the per-metric tables. Both joins are inner joins: a region-date (or a state) only
//! survives when all three metrics are available for it.

use log::{debug, info};
use polars::prelude::*;

use crate::error::{EstatedashError, Result};
use crate::COL;

/// `PTR = HomePrice / (12 * RentPrice)` and the price-cut fraction as a percentage
fn derived_columns() -> [Expr; 2] {
    [
        (col(COL::HOME_PRICE) / (lit(12.0) * col(COL::RENT_PRICE))).alias(COL::PTR),
        (col(COL::PERCENT_PRICE_CUT) * lit(100.0)).alias(COL::PERCENT_PRICE_CUT),
    ]
}

fn inner_join_on(left: LazyFrame, right: LazyFrame, keys: &[&str]) -> LazyFrame {
    let keys: Vec<Expr> = keys.iter().map(|key| col(key)).collect();
    left.join(right, &keys, &keys, JoinArgs::new(JoinType::Inner))
}

fn non_empty(df: DataFrame, name: &str) -> Result<DataFrame> {
    if df.height() == 0 {
        return Err(EstatedashError::EmptyJoin(format!(
            "the {name} has no row with all three metrics"
        )));
    }
    info!("Built {name} with shape: {:?}", df.shape());
    debug!("{df:#?}");
    Ok(df)
}

/// Join the three long tables on `(RegionName, StateName, Date)` into the fact table
/// `RegionName, StateName, Date, HomePrice, RentPrice, PercentPriceCut, PTR`.
pub fn fact_table(rent: DataFrame, home: DataFrame, price_cut: DataFrame) -> Result<DataFrame> {
    let joined = inner_join_on(home.lazy(), rent.lazy(), &COL::LONG_KEY);
    let df = inner_join_on(joined, price_cut.lazy(), &COL::LONG_KEY)
        .with_columns(derived_columns())
        .drop_nulls(None)
        .collect()?;
    non_empty(df, "fact table")
}

/// Join the boundary geometries with the three per-state medians on `STUSPS`.
pub fn boundary_table(
    states: DataFrame,
    rent: DataFrame,
    home: DataFrame,
    price_cut: DataFrame,
) -> Result<DataFrame> {
    let keys = [COL::STUSPS];
    let joined = inner_join_on(states.lazy(), rent.lazy(), &keys);
    let joined = inner_join_on(joined, home.lazy(), &keys);
    // `NAME` is optional and may be null
    let required = [
        COL::STUSPS,
        COL::GEOMETRY,
        COL::RENT_PRICE,
        COL::HOME_PRICE,
        COL::PERCENT_PRICE_CUT,
        COL::PTR,
    ];
    let df = inner_join_on(joined, price_cut.lazy(), &keys)
        .with_columns(derived_columns())
        .drop_nulls(Some(required.iter().map(|name| col(name)).collect()))
        .collect()?;
    non_empty(df, "boundary table")
}
