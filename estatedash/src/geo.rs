use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;

use anyhow::{bail, Context};
use flatgeobuf::geozero::ToWkt;
use flatgeobuf::{FallibleStreamingIterator, FeatureProperties, FgbReader};
use log::{debug, info};
use polars::{frame::DataFrame, prelude::NamedFrom, series::Series};
use wkt::ToWkt as _;

use crate::error::{EstatedashError, Result};
use crate::COL;

/// File formats the state boundaries can be read from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BoundaryFormat {
    FlatGeobuf,
    GeoJson,
    Zip,
}

impl BoundaryFormat {
    fn from_name(name: &str) -> Option<Self> {
        let extension = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "fgb" => Some(BoundaryFormat::FlatGeobuf),
            "geojson" | "json" => Some(BoundaryFormat::GeoJson),
            "zip" => Some(BoundaryFormat::Zip),
            _ => None,
        }
    }
}

/// A boundary feature as read from disk: its properties as strings and its geometry as WKT
struct RawFeature {
    properties: HashMap<String, String>,
    wkt: String,
}

/// Read the state boundaries into a `STUSPS, NAME, geometry` dataframe with WKT geometries.
///
/// `path` may point at a FlatGeobuf or GeoJSON file, or at a zip archive containing one.
pub fn load_boundaries(path: &Path) -> Result<DataFrame> {
    if !path.exists() {
        return Err(EstatedashError::MissingInput(path.to_path_buf()));
    }
    let name = path.to_string_lossy();
    let format = BoundaryFormat::from_name(&name)
        .ok_or_else(|| EstatedashError::UnsupportedBoundaryFormat(name.to_string()))?;
    info!("Attempting to load boundaries from {name}");

    let features = match format {
        BoundaryFormat::FlatGeobuf => read_fgb(BufReader::new(File::open(path)?))?,
        BoundaryFormat::GeoJson => read_geojson(&std::fs::read_to_string(path)?)?,
        BoundaryFormat::Zip => {
            let (entry, format, bytes) = read_archive(path)?.ok_or_else(|| {
                EstatedashError::UnsupportedBoundaryFormat(format!(
                    "{name} contains no .fgb or .geojson file"
                ))
            })?;
            debug!("Reading boundaries from archive entry {entry}");
            match format {
                BoundaryFormat::FlatGeobuf => read_fgb(Cursor::new(bytes))?,
                BoundaryFormat::GeoJson => {
                    let text = String::from_utf8(bytes).map_err(anyhow::Error::from)?;
                    read_geojson(&text)?
                }
                BoundaryFormat::Zip => {
                    return Err(EstatedashError::UnsupportedBoundaryFormat(format!(
                        "nested archive {entry}"
                    )))
                }
            }
        }
    };
    features_to_df(features)
}

/// Extract the first FlatGeobuf or GeoJSON entry of a zip archive
fn read_archive(path: &Path) -> anyhow::Result<Option<(String, BoundaryFormat, Vec<u8>)>> {
    let mut archive = zip::ZipArchive::new(File::open(path)?)?;
    for idx in 0..archive.len() {
        let mut entry = archive.by_index(idx)?;
        let entry_name = entry.name().to_string();
        match BoundaryFormat::from_name(&entry_name) {
            Some(format @ (BoundaryFormat::FlatGeobuf | BoundaryFormat::GeoJson))
                if entry.is_file() =>
            {
                let mut bytes = Vec::with_capacity(entry.size() as usize);
                entry.read_to_end(&mut bytes)?;
                return Ok(Some((entry_name, format, bytes)));
            }
            _ => debug!("Skipping archive entry {entry_name}"),
        }
    }
    Ok(None)
}

fn read_fgb<R: Read + Seek>(reader: R) -> anyhow::Result<Vec<RawFeature>> {
    let mut fgb = FgbReader::open(reader)?.select_all()?;
    let mut features = vec![];
    while let Some(feature) = fgb.next()? {
        features.push(RawFeature {
            properties: feature.properties()?,
            wkt: feature.to_wkt()?,
        });
    }
    Ok(features)
}

fn read_geojson(text: &str) -> anyhow::Result<Vec<RawFeature>> {
    let features = match text.parse::<geojson::GeoJson>()? {
        geojson::GeoJson::FeatureCollection(collection) => collection.features,
        geojson::GeoJson::Feature(feature) => vec![feature],
        geojson::GeoJson::Geometry(_) => bail!("GeoJSON boundaries need feature properties"),
    };
    features
        .into_iter()
        .map(|feature| {
            let geometry = feature
                .geometry
                .context("GeoJSON boundary feature without geometry")?;
            let geometry: geo::Geometry<f64> = geometry.try_into()?;
            let properties = feature
                .properties
                .unwrap_or_default()
                .into_iter()
                .map(|(key, value)| match value {
                    serde_json::Value::String(s) => (key, s),
                    other => (key, other.to_string()),
                })
                .collect();
            Ok(RawFeature {
                properties,
                wkt: geometry.wkt_string(),
            })
        })
        .collect()
}

fn features_to_df(features: Vec<RawFeature>) -> Result<DataFrame> {
    let mut codes: Vec<String> = Vec::with_capacity(features.len());
    let mut names: Vec<Option<String>> = Vec::with_capacity(features.len());
    let mut geoms: Vec<String> = Vec::with_capacity(features.len());

    for mut feature in features {
        let code = feature
            .properties
            .remove(COL::STUSPS)
            .ok_or_else(|| EstatedashError::MissingProperty(COL::STUSPS.into()))?;
        codes.push(code);
        names.push(feature.properties.remove(COL::STATE_FULL_NAME));
        geoms.push(feature.wkt);
    }

    let result = DataFrame::new(vec![
        Series::new(COL::STUSPS, codes),
        Series::new(COL::STATE_FULL_NAME, names),
        Series::new(COL::GEOMETRY, geoms),
    ])?;
    info!("Loaded boundaries with shape: {:?}", result.shape());
    Ok(result)
}
