mod config;
mod data;
mod error;
mod render;
mod theme;

use anyhow::{Context, Result};
use clap::Parser;
use log::debug;

use config::{Cli, PlotConfig};
use data::aggregate::aggregate;
use data::loader::load_file;
use theme::Theme;

fn main() -> Result<()> {
    env_logger::init();

    let config = PlotConfig::from(Cli::parse());
    run(&config)
}

/// Load, aggregate, render. Nothing is written unless loading succeeded.
fn run(config: &PlotConfig) -> Result<()> {
    let dataset = load_file(&config.input, config.hue.as_deref())
        .with_context(|| format!("loading {}", config.input.display()))?;

    if let Some(column) = &dataset.hue_column {
        debug!("grouping by '{column}'");
    }
    let series = aggregate(&dataset, config.error_bar);
    for s in &series {
        let rows: usize = s.points.iter().map(|p| p.count).sum();
        debug!("series {s} from {rows} of {} measurements", dataset.len());
    }

    let theme = Theme::new(config.style);
    render::render(&series, config, &theme)
        .with_context(|| format!("writing {}", config.output.display()))?;
    Ok(())
}
