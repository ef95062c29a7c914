use std::path::PathBuf;

use clap::Parser;

use crate::data::aggregate::ErrorBar;
use crate::render::scale::Scale;
use crate::theme::Style;

pub const DEFAULT_INPUT: &str = "compares.csv";
pub const DEFAULT_OUTPUT: &str = "compares.pdf";
pub const DEFAULT_X_LABEL: &str = "Anzahl der Elemente";
pub const DEFAULT_Y_LABEL: &str = "Durchschnittliche Anzahl der Vergleiche";

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

/// Plot measured comparison counts against input size.
///
/// Without arguments, reads `compares.csv` from the working directory and
/// writes a log-log chart to `compares.pdf`.
#[derive(Debug, Parser)]
#[command(name = "compare-plot", version, about)]
pub struct Cli {
    /// Measurement table (.csv, .tsv, .json or .parquet)
    #[arg(default_value = DEFAULT_INPUT)]
    pub input: PathBuf,

    /// Chart file (.pdf or .svg)
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    #[arg(long, default_value = DEFAULT_X_LABEL)]
    pub x_label: String,

    #[arg(long, default_value = DEFAULT_Y_LABEL)]
    pub y_label: String,

    /// Caption above the chart
    #[arg(long)]
    pub title: Option<String>,

    /// linear, ln, log2, log10 or log<base>
    #[arg(long, default_value = "log2")]
    pub x_scale: Scale,

    /// linear, ln, log2, log10 or log<base>
    #[arg(long, default_value = "log2")]
    pub y_scale: Scale,

    /// Band around the mean: none, se or ci95
    #[arg(long, default_value = "ci95")]
    pub errorbar: ErrorBar,

    /// Draw one line per distinct value of this column
    #[arg(long)]
    pub hue: Option<String>,

    /// darkgrid or whitegrid
    #[arg(long, default_value = "darkgrid")]
    pub style: Style,

    /// Figure width in points
    #[arg(long, default_value_t = 640, value_parser = clap::value_parser!(u32).range(100..))]
    pub width: u32,

    /// Figure height in points
    #[arg(long, default_value_t = 480, value_parser = clap::value_parser!(u32).range(100..))]
    pub height: u32,
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Everything one run needs, independent of where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub hue: Option<String>,
    pub error_bar: ErrorBar,
    pub x_label: String,
    pub y_label: String,
    pub title: Option<String>,
    pub x_scale: Scale,
    pub y_scale: Scale,
    pub style: Style,
    pub width: u32,
    pub height: u32,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT),
            output: PathBuf::from(DEFAULT_OUTPUT),
            hue: None,
            error_bar: ErrorBar::default(),
            x_label: DEFAULT_X_LABEL.to_string(),
            y_label: DEFAULT_Y_LABEL.to_string(),
            title: None,
            x_scale: Scale::default(),
            y_scale: Scale::default(),
            style: Style::default(),
            width: 640,
            height: 480,
        }
    }
}

impl From<Cli> for PlotConfig {
    fn from(cli: Cli) -> Self {
        Self {
            input: cli.input,
            output: cli.output,
            hue: cli.hue,
            error_bar: cli.errorbar,
            x_label: cli.x_label,
            y_label: cli.y_label,
            title: cli.title,
            x_scale: cli.x_scale,
            y_scale: cli.y_scale,
            style: cli.style,
            width: cli.width,
            height: cli.height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_arguments_reproduce_the_defaults() {
        let cli = Cli::try_parse_from(["compare-plot"]).unwrap();
        assert_eq!(PlotConfig::from(cli), PlotConfig::default());
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "compare-plot",
            "runs.tsv",
            "-o",
            "runs.svg",
            "--y-scale",
            "linear",
            "--errorbar",
            "none",
            "--hue",
            "algorithm",
            "--style",
            "whitegrid",
        ])
        .unwrap();
        let config = PlotConfig::from(cli);

        assert_eq!(config.input, PathBuf::from("runs.tsv"));
        assert_eq!(config.output, PathBuf::from("runs.svg"));
        assert_eq!(config.x_scale, Scale::Log { base: 2.0 });
        assert_eq!(config.y_scale, Scale::Linear);
        assert_eq!(config.error_bar, ErrorBar::None);
        assert_eq!(config.hue.as_deref(), Some("algorithm"));
        assert_eq!(config.style, Style::WhiteGrid);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(Cli::try_parse_from(["compare-plot", "--x-scale", "log0"]).is_err());
        assert!(Cli::try_parse_from(["compare-plot", "--width", "10"]).is_err());
    }
}
