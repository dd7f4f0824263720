use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use enum_dispatch::enum_dispatch;
use geo::geometry::Geometry;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_json::Value;
use std::fmt::Write as FmtWrite;
use std::io::Cursor;
use std::io::Write;
use wkb::geom_to_wkb;
use wkt::TryFromWkt;

use crate::dates::month_label;
use crate::COL;

/// Days between 0001-01-01 and the unix epoch, the origin of polars dates
const EPOCH_DAYS_FROM_CE: i32 = 719_163;

fn parse_wkt(wkt_str: &str) -> Result<Geometry<f64>> {
    Geometry::try_from_wkt_str(wkt_str)
        .map_err(|err| anyhow!("Invalid `Geometry<f64>` from well-known text string: {err}"))
}

/// Convert a polars series of WKT geometries into hex encoded WKB strings
fn convert_wkt_to_wkb_string(s: &Series) -> PolarsResult<Option<Series>> {
    let ca = s.str()?;
    let wkb_strings = ca
        .into_iter()
        .map(|opt_wkt| {
            opt_wkt
                .map(|wkt_str| {
                    let geom = parse_wkt(wkt_str)
                        .map_err(|err| PolarsError::ComputeError(err.to_string().into()))?;
                    let bytes = geom_to_wkb(&geom).map_err(|err| {
                        PolarsError::ComputeError(format!("Failed to format geom: {err:?}").into())
                    })?;
                    Ok(bytes.iter().fold(String::new(), |mut acc, byte| {
                        let _ = write!(acc, "{byte:02x}");
                        acc
                    }))
                })
                .transpose()
        })
        .collect::<PolarsResult<Vec<Option<String>>>>()?;
    Ok(Some(Series::new(COL::GEOMETRY, wkb_strings)))
}

/// Convert from polars `AnyValue` to `serde_json::Value`. Covers the types the dashboard tables
/// hold; dates are written as `YYYY-MM-DD`.
fn any_value_to_json(value: &AnyValue) -> Result<Value> {
    match value {
        AnyValue::Null => Ok(Value::Null),
        AnyValue::Boolean(b) => Ok(Value::Bool(*b)),
        AnyValue::String(s) => Ok(Value::String((*s).to_string())),
        AnyValue::StringOwned(s) => Ok(Value::String(s.to_string())),
        AnyValue::Int8(n) => Ok(json!(*n)),
        AnyValue::Int16(n) => Ok(json!(*n)),
        AnyValue::Int32(n) => Ok(json!(*n)),
        AnyValue::Int64(n) => Ok(json!(*n)),
        AnyValue::UInt8(n) => Ok(json!(*n)),
        AnyValue::UInt16(n) => Ok(json!(*n)),
        AnyValue::UInt32(n) => Ok(json!(*n)),
        AnyValue::UInt64(n) => Ok(json!(*n)),
        AnyValue::Float32(n) => Ok(json!(*n)),
        AnyValue::Float64(n) => Ok(json!(*n)),
        AnyValue::Date(days) => NaiveDate::from_num_days_from_ce_opt(days + EPOCH_DAYS_FROM_CE)
            .map(|date| Value::String(month_label(&date)))
            .ok_or_else(|| anyhow!("Date out of range: {days}")),
        _ => Err(anyhow!("Failed to convert type {}", value.dtype())),
    }
}

/// One GeoJSON feature per row. Every column except `geometry` becomes a property; when
/// `id_column` is given its value is also used as the feature id. Tables without a geometry
/// column produce features with a null geometry.
pub fn features(df: &DataFrame, id_column: Option<&str>) -> Result<Vec<geojson::Feature>> {
    let geometry_col = df.column(COL::GEOMETRY).ok();
    let other_cols = match geometry_col {
        Some(_) => df.drop(COL::GEOMETRY)?,
        None => df.clone(),
    };
    let geometries: Vec<Option<&str>> = match geometry_col {
        Some(geoms) => geoms.str()?.into_iter().collect(),
        None => vec![None; df.height()],
    };

    let mut features = Vec::with_capacity(df.height());
    for (idx, geom) in geometries.into_iter().enumerate() {
        let geometry = geom
            .map(parse_wkt)
            .transpose()?
            .map(|geom| geojson::Geometry::from(&geom));
        let mut properties = serde_json::Map::new();
        for col in other_cols.get_columns() {
            let val = any_value_to_json(&col.get(idx)?)?;
            properties.insert(col.name().to_string(), val);
        }
        let id = match id_column {
            Some(name) => match properties.get(name) {
                Some(Value::String(id)) => Some(geojson::feature::Id::String(id.clone())),
                Some(Value::Number(id)) => Some(geojson::feature::Id::Number(id.clone())),
                _ => return Err(anyhow!("Row {idx} has no usable id in column '{name}'")),
            },
            None => None,
        };
        features.push(geojson::Feature {
            bbox: None,
            geometry,
            id,
            properties: Some(properties),
            foreign_members: None,
        });
    }
    Ok(features)
}

pub fn feature_collection(
    df: &DataFrame,
    id_column: Option<&str>,
) -> Result<geojson::FeatureCollection> {
    Ok(geojson::FeatureCollection {
        bbox: None,
        features: features(df, id_column)?,
        foreign_members: None,
    })
}

/// Trait to define different output generators. Defines two
/// functions, format which generates a serialized string of the
/// `DataFrame` and save which writes the same output to a writer
#[enum_dispatch]
pub trait OutputGenerator {
    fn save(&self, writer: &mut impl Write, df: &mut DataFrame) -> Result<()>;
    fn format(&self, df: &mut DataFrame) -> Result<String> {
        // Just creating an empty vec to store the buffered output
        let mut data: Vec<u8> = vec![];
        let mut buff = Cursor::new(&mut data);
        self.save(&mut buff, df)?;

        Ok(String::from_utf8(data)?)
    }
}

/// Enum of OutputFormatters one for each potential
/// output type
#[enum_dispatch(OutputGenerator)]
#[derive(Serialize, Deserialize, Debug)]
pub enum OutputFormatter {
    GeoJSON(GeoJSONFormatter),
    GeoJSONSeq(GeoJSONSeqFormatter),
    Csv(CSVFormatter),
}

/// Format the results as geojson sequence format
/// This is one line per feature serialized as a
/// geojson feature
#[derive(Serialize, Deserialize, Debug)]
pub struct GeoJSONSeqFormatter;

impl OutputGenerator for GeoJSONSeqFormatter {
    fn save(&self, writer: &mut impl Write, df: &mut DataFrame) -> Result<()> {
        for feature in features(df, None)? {
            writeln!(writer, "{feature}")?;
        }
        Ok(())
    }
}

/// Define what format geometries are represented in
///
/// Wkb: Well-known binary, hex encoded
/// Wkt: Well-known text
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeoFormat {
    Wkb,
    Wkt,
}

/// Format the results as a CSV file with the
/// geometry encoded in the specified format
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct CSVFormatter {
    pub geo_format: Option<GeoFormat>,
}

impl OutputGenerator for CSVFormatter {
    fn save(&self, writer: &mut impl Write, df: &mut DataFrame) -> Result<()> {
        let has_geometry = df.get_column_index(COL::GEOMETRY).is_some();
        if let (Some(GeoFormat::Wkb), true) = (self.geo_format, has_geometry) {
            let mut df = df
                .clone()
                .lazy()
                .with_column(
                    col(COL::GEOMETRY)
                        .map(
                            |s: Series| convert_wkt_to_wkb_string(&s),
                            GetOutput::from_type(DataType::String),
                        )
                        .alias(COL::GEOMETRY),
                )
                .collect()?;
            CsvWriter::new(writer).finish(&mut df)?;
        } else {
            CsvWriter::new(writer).finish(df)?;
        };
        Ok(())
    }
}

/// Format the results as a geojson feature collection
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct GeoJSONFormatter;

impl OutputGenerator for GeoJSONFormatter {
    fn format(&self, df: &mut DataFrame) -> Result<String> {
        Ok(feature_collection(df, None)?.to_string())
    }

    fn save(&self, writer: &mut impl Write, df: &mut DataFrame) -> Result<()> {
        let result = self.format(df)?;
        writer.write_all(result.as_bytes())?;

        Ok(())
    }
}
