use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{command, Args, Parser, Subcommand};
use enum_dispatch::enum_dispatch;
use estatedash::{
    chart::Figure,
    config::Config,
    formatters::{
        CSVFormatter, GeoFormat, GeoJSONFormatter, GeoJSONSeqFormatter, OutputFormatter,
        OutputGenerator,
    },
    metric::Metric,
    Dashboard,
};
use log::{debug, info};
use polars::frame::DataFrame;
use serde::{Deserialize, Serialize};
use spinners::{Spinner, Spinners};
use strum_macros::EnumString;

use crate::display::{display_metrics, display_states, display_summary};
use crate::error::EstatedashCliResult;

const DEFAULT_PROGRESS_SPINNER: Spinners = Spinners::Dots;
const COMPLETE_PROGRESS_STRING: &str = "✔";
const RUNNING_TAIL_STRING: &str = "...";
const LOADING_STRING: &str = "Loading and joining the Zillow tables";
const GRAPH_FILE: &str = "graph.json";
const MAP_FILE: &str = "map.json";

/// Defines the output formats tables can be exported in.
#[derive(Clone, Debug, Deserialize, Serialize, EnumString, PartialEq, Eq)]
#[strum(ascii_case_insensitive)]
pub enum OutputFormat {
    GeoJSON,
    GeoJSONSeq,
    Csv,
}

/// The two finished tables that can be exported.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, EnumString, PartialEq, Eq)]
#[strum(ascii_case_insensitive)]
pub enum TableKind {
    Fact,
    Boundary,
}

fn write_output<T, U>(
    output_generator: T,
    mut data: DataFrame,
    output_file: Option<U>,
) -> EstatedashCliResult<()>
where
    T: OutputGenerator,
    U: AsRef<Path>,
{
    if let Some(output_file) = output_file {
        let mut f = File::create(output_file).context("Failed to write output")?;
        output_generator.save(&mut f, &mut data)?;
    } else {
        let mut stdout_lock = std::io::stdout().lock();
        output_generator.save(&mut stdout_lock, &mut data)?;
    };
    Ok(())
}

fn write_figure<U>(figure: &Figure, output_file: Option<U>) -> EstatedashCliResult<()>
where
    U: AsRef<Path>,
{
    let json = figure.to_json()?;
    if let Some(output_file) = output_file {
        let mut f = File::create(output_file).context("Failed to write figure")?;
        f.write_all(json.as_bytes())?;
    } else {
        println!("{json}");
    }
    Ok(())
}

/// Build the dashboard tables, showing a spinner unless `quiet`.
fn load_dashboard(config: &Config, quiet: bool) -> EstatedashCliResult<Dashboard> {
    let sp = (!quiet).then(|| {
        Spinner::with_timer(
            DEFAULT_PROGRESS_SPINNER,
            LOADING_STRING.to_string() + RUNNING_TAIL_STRING,
        )
    });
    let dashboard = Dashboard::load(config)?;
    if let Some(mut s) = sp {
        s.stop_with_symbol(COMPLETE_PROGRESS_STRING);
    }
    Ok(dashboard)
}

/// Trait that defines what to run when a given subcommand is invoked.
#[enum_dispatch]
pub trait RunCommand {
    fn run(&self, config: Config) -> EstatedashCliResult<()>;
}

/// The `states` command lists the states that can be selected, with their region counts.
#[derive(Args, Debug)]
pub struct StatesCommand {
    #[arg(from_global)]
    quiet: bool,
}

impl RunCommand for StatesCommand {
    fn run(&self, config: Config) -> EstatedashCliResult<()> {
        info!("Running `states` subcommand");
        let dashboard = load_dashboard(&config, self.quiet)?;
        display_states(&dashboard)?;
        Ok(())
    }
}

/// The `metrics` command lists the selectable metrics. It needs no input data.
#[derive(Args, Debug)]
pub struct MetricsCommand;

impl RunCommand for MetricsCommand {
    fn run(&self, config: Config) -> EstatedashCliResult<()> {
        info!("Running `metrics` subcommand");
        display_metrics(config.default_metric);
        Ok(())
    }
}

/// The `timeseries` command writes the line chart of one state and metric as Plotly JSON.
#[derive(Args, Debug)]
pub struct TimeseriesCommand {
    #[arg(short = 's', long, help = "State code, defaults to the configured state")]
    state: Option<String>,
    #[arg(
        short = 'm',
        long,
        help = "Metric display name or column name, defaults to the configured metric"
    )]
    metric: Option<Metric>,
    #[arg(short = 'o', long, help = "Output file to place the figure")]
    output_file: Option<PathBuf>,
    #[arg(from_global)]
    quiet: bool,
}

impl RunCommand for TimeseriesCommand {
    fn run(&self, config: Config) -> EstatedashCliResult<()> {
        info!("Running `timeseries` subcommand");
        debug!("{:#?}", self);
        let dashboard = load_dashboard(&config, self.quiet)?;
        let state = self
            .state
            .as_deref()
            .or(dashboard.default_state())
            .unwrap_or(&dashboard.config.default_state);
        let metric = self.metric.unwrap_or(dashboard.default_metric());
        let figure = dashboard.update_graph(state, metric)?;
        write_figure(&figure, self.output_file.as_ref())
    }
}

/// The `map` command writes the national choropleth of one metric as Plotly JSON.
#[derive(Args, Debug)]
pub struct MapCommand {
    #[arg(
        short = 'm',
        long,
        help = "Metric display name or column name, defaults to the configured metric"
    )]
    metric: Option<Metric>,
    #[arg(short = 'o', long, help = "Output file to place the figure")]
    output_file: Option<PathBuf>,
    #[arg(from_global)]
    quiet: bool,
}

impl RunCommand for MapCommand {
    fn run(&self, config: Config) -> EstatedashCliResult<()> {
        info!("Running `map` subcommand");
        let dashboard = load_dashboard(&config, self.quiet)?;
        let metric = self.metric.unwrap_or(dashboard.default_metric());
        let figure = dashboard.update_map(metric)?;
        write_figure(&figure, self.output_file.as_ref())
    }
}

/// The `render` command writes both figures for the default selections, as the dashboard first
/// shows them, into `graph.json` and `map.json`.
#[derive(Args, Debug)]
pub struct RenderCommand {
    #[arg(short = 'o', long, help = "Directory to place the figures, created if missing")]
    output_dir: PathBuf,
    #[arg(from_global)]
    quiet: bool,
}

impl RunCommand for RenderCommand {
    fn run(&self, config: Config) -> EstatedashCliResult<()> {
        info!("Running `render` subcommand");
        let dashboard = load_dashboard(&config, self.quiet)?;
        let (graph, map) = dashboard.initial_figures()?;
        std::fs::create_dir_all(&self.output_dir)?;
        write_figure(&graph, Some(self.output_dir.join(GRAPH_FILE)))?;
        write_figure(&map, Some(self.output_dir.join(MAP_FILE)))
    }
}

/// The `export` command writes the fact or boundary table in a given format.
#[derive(Args, Debug)]
pub struct ExportCommand {
    #[arg(short = 't', long, value_name = "fact|boundary", help = "Table to export")]
    table: TableKind,
    #[arg(
        short = 'f',
        long,
        value_name = "geojson|geojsonseq|csv",
        help = "Output format for the results"
    )]
    output_format: OutputFormat,
    #[arg(long, help = "Write CSV geometries as hex encoded WKB instead of WKT")]
    wkb: bool,
    #[arg(short = 'o', long, help = "Output file to place the results")]
    output_file: Option<PathBuf>,
    #[arg(from_global)]
    quiet: bool,
}

impl ExportCommand {
    fn formatter(&self) -> OutputFormatter {
        match self.output_format {
            OutputFormat::GeoJSON => OutputFormatter::GeoJSON(GeoJSONFormatter),
            OutputFormat::GeoJSONSeq => OutputFormatter::GeoJSONSeq(GeoJSONSeqFormatter),
            OutputFormat::Csv => OutputFormatter::Csv(CSVFormatter {
                geo_format: Some(if self.wkb { GeoFormat::Wkb } else { GeoFormat::Wkt }),
            }),
        }
    }
}

impl RunCommand for ExportCommand {
    fn run(&self, config: Config) -> EstatedashCliResult<()> {
        info!("Running `export` subcommand");
        let dashboard = load_dashboard(&config, self.quiet)?;
        let data = match self.table {
            TableKind::Fact => dashboard.tables.fact,
            TableKind::Boundary => dashboard.tables.boundary,
        };
        write_output(self.formatter(), data, self.output_file.as_ref())
    }
}

/// The `summary` command prints the table shapes and the selector defaults.
#[derive(Args, Debug)]
pub struct SummaryCommand {
    #[arg(long, help = "Print the summary as JSON")]
    json: bool,
    #[arg(from_global)]
    quiet: bool,
}

impl RunCommand for SummaryCommand {
    fn run(&self, config: Config) -> EstatedashCliResult<()> {
        info!("Running `summary` subcommand");
        let summary = load_dashboard(&config, self.quiet)?.summary();
        if self.json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else {
            display_summary(&summary);
        }
        Ok(())
    }
}

/// The entrypoint for the CLI.
#[derive(Parser, Debug)]
#[command(version, about="Estatedash turns Zillow research tables into state and national views", long_about = None, name="estatedash")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
    #[arg(
        short = 'c',
        long = "config",
        help = "Path to a TOML config file, defaults to <config dir>/estatedash/config.toml",
        global = true
    )]
    pub config: Option<PathBuf>,
    #[arg(
        short = 'q',
        long = "quiet",
        help = "\
            Do not print the loading spinner. Results and logs (when `RUST_LOG`\n\
            is set) will still be printed.",
        global = true
    )]
    quiet: bool,
}

/// Commands contains the list of subcommands avaliable for use in the CLI.
/// Each command should implement the RunCommand trait and specify the list
/// of required args for that command.
#[derive(Subcommand, Debug)]
#[enum_dispatch(RunCommand)]
pub enum Commands {
    /// List the selectable states and how many regions each has
    States(StatesCommand),
    /// List the selectable metrics
    Metrics(MetricsCommand),
    /// Write the time series chart of a state as Plotly JSON
    Timeseries(TimeseriesCommand),
    /// Write the national choropleth as Plotly JSON
    Map(MapCommand),
    /// Write the default time series and choropleth as Plotly JSON files
    Render(RenderCommand),
    /// Export the fact or boundary table
    Export(ExportCommand),
    /// Print the table shapes and selector defaults
    Summary(SummaryCommand),
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use tempfile::{NamedTempFile, TempDir};

    use super::*;

    const RENT: &str = "\
RegionID,SizeRank,RegionName,2020-01,2020-02
102001,0,United States,1400,1410
394531,1,\"Asheville, NC\",1000,1010
394533,2,\"Austin, TX\",1500,1510
";

    const HOME_VALUES: &str = "\
RegionID,SizeRank,RegionName,RegionType,StateName,2020-01-31,2020-02-29
102001,0,United States,country,,250000,251000
394531,1,\"Asheville, NC\",msa,NC,300000,303000
394533,2,\"Austin, TX\",msa,TX,400000,401000
";

    const PRICE_CUTS: &str = "\
RegionID,SizeRank,RegionName,RegionType,StateName,2020-01-31,2020-02-29
102001,0,United States,country,,0.11,0.12
394531,1,\"Asheville, NC\",msa,NC,0.1,0.15
394533,2,\"Austin, TX\",msa,TX,0.3,0.35
";

    const STATES: &str = r#"{"type": "FeatureCollection", "features": [
        {"type": "Feature", "properties": {"STUSPS": "NC", "NAME": "North Carolina"}, "geometry": {"type": "Point", "coordinates": [-79.0, 35.5]}},
        {"type": "Feature", "properties": {"STUSPS": "TX", "NAME": "Texas"}, "geometry": {"type": "Point", "coordinates": [-99.0, 31.0]}}
    ]}"#;

    fn inputs() -> (TempDir, Config) {
        let dir = TempDir::new().unwrap();
        for (name, contents) in [
            ("rent.csv", RENT),
            ("home.csv", HOME_VALUES),
            ("cuts.csv", PRICE_CUTS),
            ("states.geojson", STATES),
        ] {
            std::fs::write(dir.path().join(name), contents).unwrap();
        }
        let config = Config {
            base_path: dir.path().to_string_lossy().to_string(),
            rent_file: "rent.csv".into(),
            home_value_file: "home.csv".into(),
            price_cut_file: "cuts.csv".into(),
            boundary_file: "states.geojson".into(),
            ..Config::default()
        };
        (dir, config)
    }

    #[test]
    fn export_command_should_write_csv() {
        let (_dir, config) = inputs();
        let output = NamedTempFile::new().unwrap();
        let export_command = ExportCommand {
            table: TableKind::Fact,
            output_format: OutputFormat::Csv,
            wkb: false,
            output_file: Some(output.path().to_path_buf()),
            quiet: true,
        };
        let result = export_command.run(config);
        assert!(result.is_ok(), "{result:?}");
        let contents = std::fs::read_to_string(output.path()).unwrap();
        assert!(contents.starts_with("RegionName,StateName,Date,HomePrice,RentPrice"));
        assert_eq!(contents.lines().count(), 5, "Header plus two regions over two months");
    }

    #[test]
    fn timeseries_command_should_write_plotly_json() {
        let (_dir, config) = inputs();
        let output = NamedTempFile::new().unwrap();
        let command = TimeseriesCommand {
            state: Some("TX".into()),
            metric: Some(Metric::HomeValueIndex),
            output_file: Some(output.path().to_path_buf()),
            quiet: true,
        };
        command.run(config).unwrap();
        let figure: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(output.path()).unwrap()).unwrap();
        assert_eq!(figure["data"][0]["name"], "Austin, TX");
        assert_eq!(figure["layout"]["title"]["text"], "Recorded Cities in TX");
    }

    #[test]
    fn render_command_should_write_both_default_figures() {
        let (dir, config) = inputs();
        let output_dir = dir.path().join("figures");
        let command = RenderCommand {
            output_dir: output_dir.clone(),
            quiet: true,
        };
        command.run(config).unwrap();
        let read = |name: &str| -> serde_json::Value {
            serde_json::from_str(&std::fs::read_to_string(output_dir.join(name)).unwrap())
                .unwrap()
        };
        let graph = read(GRAPH_FILE);
        assert_eq!(graph["data"][0]["type"], "scatter");
        assert_eq!(graph["layout"]["title"]["text"], "Recorded Cities in NC");
        let map = read(MAP_FILE);
        assert_eq!(map["data"][0]["type"], "choropleth");
    }

    #[test]
    fn timeseries_command_should_reject_unknown_state() {
        let (_dir, config) = inputs();
        let command = TimeseriesCommand {
            state: Some("ZZ".into()),
            metric: None,
            output_file: None,
            quiet: true,
        };
        assert!(command.run(config).is_err());
    }

    #[test]
    fn output_type_should_deserialize_properly() {
        let output_format = OutputFormat::from_str("GeoJSON");
        assert_eq!(
            output_format.unwrap(),
            OutputFormat::GeoJSON,
            "geojson format should be parsed correctly"
        );
        let output_format = OutputFormat::from_str("GeoJson");
        assert_eq!(
            output_format.unwrap(),
            OutputFormat::GeoJSON,
            "parsing should be case insensitive"
        );
        let output_format = OutputFormat::from_str("geojsonseq");
        assert_eq!(
            output_format.unwrap(),
            OutputFormat::GeoJSONSeq,
            "correct variants should parse correctly"
        );
        let output_format = OutputFormat::from_str("geoparquet");
        assert!(output_format.is_err(), "non listed formats should fail");
    }

    #[test]
    fn metric_argument_should_accept_label_or_column() {
        let cli = Cli::try_parse_from([
            "estatedash",
            "map",
            "-m",
            "Estimated Price to Rent Ratio",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Map(MapCommand {
                metric: Some(Metric::PriceToRentRatio),
                ..
            }))
        ));
        let cli =
            Cli::try_parse_from(["estatedash", "-q", "timeseries", "-m", "rentprice"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Timeseries(TimeseriesCommand {
                metric: Some(Metric::RentIndex),
                quiet: true,
                ..
            }))
        ));
    }

    #[test]
    fn cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
