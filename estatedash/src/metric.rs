//! Metrics offered by the dashboard and the source tables they come from.

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

use crate::COL;

/// A metric selectable in the dashboard. The `Display` form is the label shown in the metric
/// selector; parsing also accepts the internal column name, ignoring ASCII case.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum Metric {
    #[strum(to_string = "Estimated Price to Rent Ratio", serialize = "PTR")]
    #[serde(rename = "Estimated Price to Rent Ratio", alias = "PTR")]
    PriceToRentRatio,
    #[strum(to_string = "Median Percent of Price Cuts", serialize = "PercentPriceCut")]
    #[serde(rename = "Median Percent of Price Cuts", alias = "PercentPriceCut")]
    PercentPriceCut,
    #[strum(to_string = "Zillow Observed Rent Index", serialize = "RentPrice")]
    #[serde(rename = "Zillow Observed Rent Index", alias = "RentPrice")]
    #[default]
    RentIndex,
    #[strum(to_string = "Zillow Home Value Index", serialize = "HomePrice")]
    #[serde(rename = "Zillow Home Value Index", alias = "HomePrice")]
    HomeValueIndex,
}

impl Metric {
    /// Metric selector options, in display order
    pub fn options() -> Vec<Metric> {
        Metric::iter().collect()
    }

    /// Column holding this metric in the fact and boundary tables
    pub fn column(&self) -> &'static str {
        match self {
            Metric::PriceToRentRatio => COL::PTR,
            Metric::PercentPriceCut => COL::PERCENT_PRICE_CUT,
            Metric::RentIndex => COL::RENT_PRICE,
            Metric::HomeValueIndex => COL::HOME_PRICE,
        }
    }

    /// Named Plotly continuous colour scale used for the choropleth
    pub fn color_scale(&self) -> &'static str {
        match self {
            Metric::PriceToRentRatio => "tealrose",
            Metric::PercentPriceCut => "sunset",
            Metric::RentIndex => "darkmint",
            Metric::HomeValueIndex => "haline",
        }
    }
}

/// The three wide Zillow research tables the pipeline is built from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum SourceTable {
    #[strum(to_string = "rent index table")]
    Rent,
    #[strum(to_string = "home value index table")]
    HomeValue,
    #[strum(to_string = "price cut table")]
    PriceCut,
}

impl SourceTable {
    /// Name given to the value column once the table is unpivoted
    pub fn value_column(&self) -> &'static str {
        match self {
            SourceTable::Rent => COL::RENT_PRICE,
            SourceTable::HomeValue => COL::HOME_PRICE,
            SourceTable::PriceCut => COL::PERCENT_PRICE_CUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn metric_should_parse_from_label_or_column() {
        assert_eq!(
            Metric::from_str("Zillow Observed Rent Index").unwrap(),
            Metric::RentIndex
        );
        assert_eq!(
            Metric::from_str("ptr").unwrap(),
            Metric::PriceToRentRatio,
            "parsing should be case insensitive"
        );
        assert_eq!(
            Metric::from_str("PercentPriceCut").unwrap(),
            Metric::PercentPriceCut
        );
        assert!(Metric::from_str("Mortgage Rate").is_err());
    }

    #[test]
    fn metric_mappings_match_dashboard_lookup_tables() {
        let mappings: Vec<(String, &str, &str)> = Metric::options()
            .into_iter()
            .map(|m| (m.to_string(), m.column(), m.color_scale()))
            .collect();
        assert_eq!(
            mappings,
            vec![
                ("Estimated Price to Rent Ratio".to_string(), "PTR", "tealrose"),
                ("Median Percent of Price Cuts".to_string(), "PercentPriceCut", "sunset"),
                ("Zillow Observed Rent Index".to_string(), "RentPrice", "darkmint"),
                ("Zillow Home Value Index".to_string(), "HomePrice", "haline"),
            ]
        );
    }

    #[test]
    fn metric_should_deserialize_from_label_or_alias() {
        #[derive(Serialize, Deserialize)]
        struct Wrapper {
            metric: Metric,
        }
        let parsed: Wrapper = serde_json::from_str(r#"{"metric": "Zillow Home Value Index"}"#)
            .expect("label should deserialize");
        assert_eq!(parsed.metric, Metric::HomeValueIndex);
        let parsed: Wrapper =
            serde_json::from_str(r#"{"metric": "PTR"}"#).expect("column alias should deserialize");
        assert_eq!(parsed.metric, Metric::PriceToRentRatio);
    }
}
