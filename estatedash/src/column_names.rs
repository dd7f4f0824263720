//! This module stores the column names used across the pipeline. Source column names must stay
//! synchronised with the headers of the upstream Zillow research tables and with the property
//! names of the state boundary dataset.

// Source columns that are dropped straight after load
pub const REGION_ID: &str = "RegionID";
pub const SIZE_RANK: &str = "SizeRank";
pub const REGION_TYPE: &str = "RegionType";

// Identifier columns
pub const REGION_NAME: &str = "RegionName";
pub const STATE_NAME: &str = "StateName";
pub const DATE: &str = "Date";

// Metric columns
pub const RENT_PRICE: &str = "RentPrice";
pub const HOME_PRICE: &str = "HomePrice";
pub const PERCENT_PRICE_CUT: &str = "PercentPriceCut";
pub const PTR: &str = "PTR";

// Boundary columns
pub const STUSPS: &str = "STUSPS";
pub const STATE_FULL_NAME: &str = "NAME";
pub const GEOMETRY: &str = "geometry";

/// Region type value marking the national aggregate row
pub const NATIONAL_REGION_TYPE: &str = "country";

/// Identifier columns of every reshaped metric table, in output order
pub const ID_COLUMNS: [&str; 2] = [REGION_NAME, STATE_NAME];

/// Composite key of the long-form metric tables
pub const LONG_KEY: [&str; 3] = [REGION_NAME, STATE_NAME, DATE];
