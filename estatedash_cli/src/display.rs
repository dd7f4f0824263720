use std::collections::{HashMap, HashSet};

use comfy_table::{presets::NOTHING, *};
use itertools::izip;

use estatedash::{dashboard::Summary, dashboard::REGION_COUNT, metric::Metric, Dashboard, COL};

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(NOTHING)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_style(comfy_table::TableComponent::BottomBorder, '─')
        .set_style(comfy_table::TableComponent::MiddleHeaderIntersections, '─')
        .set_style(comfy_table::TableComponent::HeaderLines, '─')
        .set_style(comfy_table::TableComponent::BottomBorderIntersections, '─')
        .set_style(comfy_table::TableComponent::TopBorder, '─')
        .set_style(comfy_table::TableComponent::TopBorderIntersections, '─');
    table
}

fn bold_header(names: &[&str]) -> Vec<Cell> {
    names
        .iter()
        .map(|name| Cell::new(name).add_attribute(Attribute::Bold))
        .collect()
}

pub fn display_states(dashboard: &Dashboard) -> anyhow::Result<()> {
    let region_counts = dashboard.region_counts()?;
    let counts: HashMap<&str, u32> = izip!(
        region_counts.column(COL::STATE_NAME)?.str()?,
        region_counts.column(REGION_COUNT)?.u32()?,
    )
    .filter_map(|(state, regions)| Some((state?, regions?)))
    .collect();
    let on_map: HashSet<&str> = dashboard
        .tables
        .boundary
        .column(COL::STUSPS)?
        .str()?
        .into_iter()
        .flatten()
        .collect();
    let default_state = dashboard.default_state();

    let mut table = new_table();
    table.set_header(bold_header(&["State", "Regions", "On map", "Default"]));
    for state in dashboard.state_options() {
        table.add_row(vec![
            state.to_string(),
            counts.get(state).copied().unwrap_or_default().to_string(),
            if on_map.contains(state) { "yes" } else { "no" }.to_string(),
            if default_state == Some(state) { "*" } else { "" }.to_string(),
        ]);
    }
    println!("\n{}", table);
    Ok(())
}

pub fn display_metrics(default_metric: Metric) {
    let mut table = new_table();
    table.set_header(bold_header(&["Metric", "Column", "Colour scale", "Default"]));
    for metric in Metric::options() {
        table.add_row(vec![
            metric.to_string(),
            metric.column().to_string(),
            metric.color_scale().to_string(),
            if metric == default_metric { "*" } else { "" }.to_string(),
        ]);
    }
    println!("\n{}", table);
}

pub fn display_summary(summary: &Summary) {
    let shape = |(rows, columns): (usize, usize)| format!("{rows} rows × {columns} columns");
    let mut table = new_table();
    table
        .add_row(vec![
            Cell::new("Fact table").add_attribute(Attribute::Bold),
            shape(summary.fact_shape).into(),
        ])
        .add_row(vec![
            Cell::new("Boundary table").add_attribute(Attribute::Bold),
            shape(summary.boundary_shape).into(),
        ])
        .add_row(vec![
            Cell::new("Selectable states").add_attribute(Attribute::Bold),
            summary.state_count.to_string().into(),
        ])
        .add_row(vec![
            Cell::new("Default state").add_attribute(Attribute::Bold),
            summary.default_state.as_str().into(),
        ])
        .add_row(vec![
            Cell::new("Default metric").add_attribute(Attribute::Bold),
            summary.default_metric.to_string().into(),
        ]);
    if let Some(column) = table.column_mut(0) {
        column.set_cell_alignment(CellAlignment::Right);
    }
    println!("\n{}", table);
}
