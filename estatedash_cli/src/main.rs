mod cli;
mod display;
mod error;

use std::path::Path;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, RunCommand};
use error::EstatedashCliResult;
use estatedash::config::Config;
use log::debug;

const DEFAULT_LOGGING_LEVEL: &str = "warn";

fn main() -> Result<()> {
    // Set RUST_LOG to `DEFAULT_LOGGING_LEVEL` if not set
    let _ =
        std::env::var("RUST_LOG").map_err(|_| std::env::set_var("RUST_LOG", DEFAULT_LOGGING_LEVEL));
    pretty_env_logger::init_timed();
    let args = Cli::parse();
    debug!("args: {args:?}");
    let config = read_config_from_toml(args.config.as_deref())?;
    debug!("config: {config:?}");

    if let Some(command) = args.command {
        command.run(config)?;
    }
    Ok(())
}

/// Read the config from `path`, or from the user's config directory when no path is given
/// (Linux: ~/.config/estatedash/config.toml). A missing default file gives the default config; a
/// missing explicit file is an error.
fn read_config_from_toml(path: Option<&Path>) -> EstatedashCliResult<Config> {
    let file_path = match (path, dirs::config_dir()) {
        (Some(path), _) => path.to_path_buf(),
        (None, Some(dir)) => dir.join("estatedash").join("config.toml"),
        (None, None) => return Ok(Config::default()),
    };
    match std::fs::read_to_string(&file_path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && path.is_none() => {
            Ok(Config::default())
        }
        Err(e) => Err(e.into()),
    }
}
