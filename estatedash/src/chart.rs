//! Plotly figure descriptions for the two dashboard views. Figures are plain serde structs so
//! they can be handed to any Plotly front end as JSON.

use itertools::izip;
use log::debug;
use polars::prelude::*;
use serde::Serialize;

use crate::dates::month_label;
use crate::error::Result;
use crate::formatters::feature_collection;
use crate::metric::Metric;
use crate::COL;

const TEMPLATE: &str = "plotly_dark";
const FONT_SIZE: u32 = 16;
const FONT_COLOR: &str = "#7FDBFF";
/// Headroom above the largest state value on the map's colour range
const COLOR_RANGE_HEADROOM: f64 = 1.2;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

impl Figure {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self).map_err(anyhow::Error::from)?)
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Trace {
    Scatter(ScatterTrace),
    Choropleth(ChoroplethTrace),
}

/// One region's line in the time-series view
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ScatterTrace {
    pub name: String,
    pub mode: String,
    pub x: Vec<String>,
    pub y: Vec<f64>,
    pub hovertemplate: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ChoroplethTrace {
    pub geojson: geojson::FeatureCollection,
    pub locations: Vec<String>,
    pub locationmode: String,
    pub z: Vec<f64>,
    pub hovertext: Vec<String>,
    pub coloraxis: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Layout {
    pub title: Title,
    pub template: String,
    pub font: Font,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xaxis: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geo: Option<Geo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coloraxis: Option<ColorAxis>,
}

impl Layout {
    /// Dark template with a centred title, shared by both views
    fn titled(text: String) -> Self {
        Layout {
            title: Title {
                text,
                x: 0.5,
                xanchor: "center".into(),
            },
            template: TEMPLATE.into(),
            font: Font {
                size: FONT_SIZE,
                color: FONT_COLOR.into(),
            },
            xaxis: None,
            yaxis: None,
            geo: None,
            coloraxis: None,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Title {
    pub text: String,
    pub x: f64,
    pub xanchor: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Font {
    pub size: u32,
    pub color: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Axis {
    pub title: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Geo {
    pub scope: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ColorAxis {
    pub colorscale: String,
    pub cmin: f64,
    pub cmax: f64,
}

/// Line chart of `metric` for every region of `state`, one trace per region, points ordered by
/// date. Traces are sorted by region name, not by the order regions first appear in the fact
/// table.
pub fn time_series(fact: &DataFrame, state: &str, metric: Metric) -> Result<Figure> {
    let column = metric.column();
    let rows = fact
        .clone()
        .lazy()
        .filter(col(COL::STATE_NAME).eq(lit(state)))
        .select([col(COL::REGION_NAME), col(COL::DATE), col(column)])
        .collect()?
        .sort([COL::REGION_NAME, COL::DATE], SortMultipleOptions::default())?;
    debug!("Plotting {} rows of {column} for {state}", rows.height());

    let hovertemplate = format!("Date: %{{x}} <br>{column}: %{{y}}");
    let mut traces: Vec<ScatterTrace> = vec![];
    for (region, date, value) in izip!(
        rows.column(COL::REGION_NAME)?.str()?,
        rows.column(COL::DATE)?.date()?.as_date_iter(),
        rows.column(column)?.f64()?
    ) {
        let (Some(region), Some(date), Some(value)) = (region, date, value) else {
            continue;
        };
        match traces.last_mut() {
            Some(trace) if trace.name == region => {
                trace.x.push(month_label(&date));
                trace.y.push(value);
            }
            _ => traces.push(ScatterTrace {
                name: region.to_string(),
                mode: "lines+markers".into(),
                x: vec![month_label(&date)],
                y: vec![value],
                hovertemplate: hovertemplate.clone(),
            }),
        }
    }

    let mut layout = Layout::titled(format!("Recorded Cities in {state}"));
    layout.xaxis = Some(Axis {
        title: COL::DATE.into(),
    });
    layout.yaxis = Some(Axis {
        title: column.into(),
    });
    Ok(Figure {
        data: traces.into_iter().map(Trace::Scatter).collect(),
        layout,
    })
}

/// US state choropleth of `metric`, coloured on `[0, 1.2 * max]`.
pub fn choropleth(boundary: &DataFrame, metric: Metric) -> Result<Figure> {
    let column = metric.column();
    let values = boundary.column(column)?.f64()?;
    let cmax = values.max().unwrap_or(0.0) * COLOR_RANGE_HEADROOM;
    let locations: Vec<String> = boundary
        .column(COL::STUSPS)?
        .str()?
        .into_iter()
        .map(|code| code.unwrap_or_default().to_string())
        .collect();

    let trace = ChoroplethTrace {
        geojson: feature_collection(boundary, Some(COL::STUSPS))?,
        locationmode: "USA-states".into(),
        z: values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect(),
        hovertext: locations.clone(),
        locations,
        coloraxis: "coloraxis".into(),
    };

    let mut layout = Layout::titled(format!("National View: {metric}"));
    layout.geo = Some(Geo {
        scope: "usa".into(),
    });
    layout.coloraxis = Some(ColorAxis {
        colorscale: metric.color_scale().into(),
        cmin: 0.0,
        cmax,
    });
    Ok(Figure {
        data: vec![Trace::Choropleth(trace)],
        layout,
    })
}
