use std::fmt;
use std::str::FromStr;

use super::model::{CompareDataset, Series, SeriesPoint};

/// z-score of the two-sided 95% normal interval.
const Z_95: f64 = 1.959_963_984_540_054;

// ---------------------------------------------------------------------------
// Error band kind
// ---------------------------------------------------------------------------

/// How the uncertainty around each mean is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorBar {
    /// Line only.
    None,
    /// Mean ± one standard error.
    StdErr,
    /// Normal-approximation 95% confidence interval of the mean.
    #[default]
    Ci95,
}

impl ErrorBar {
    fn half_width(self, std_err: f64) -> f64 {
        match self {
            ErrorBar::None => 0.0,
            ErrorBar::StdErr => std_err,
            ErrorBar::Ci95 => Z_95 * std_err,
        }
    }
}

impl FromStr for ErrorBar {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(ErrorBar::None),
            "se" => Ok(ErrorBar::StdErr),
            "ci" | "ci95" => Ok(ErrorBar::Ci95),
            other => Err(format!("unknown error bar '{other}' (expected none, se or ci95)")),
        }
    }
}

impl fmt::Display for ErrorBar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorBar::None => "none",
            ErrorBar::StdErr => "se",
            ErrorBar::Ci95 => "ci95",
        })
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Collapse repeated measurements into one mean per `num_items`, per hue.
///
/// Series come out in order of first appearance of their hue value; points
/// inside a series are sorted by `num_items`.
pub fn aggregate(dataset: &CompareDataset, error_bar: ErrorBar) -> Vec<Series> {
    dataset
        .hue_values()
        .into_iter()
        .map(|hue| {
            let mut samples: Vec<(f64, f64)> = dataset
                .measurements
                .iter()
                .filter(|m| m.hue.as_deref() == hue)
                .map(|m| (m.num_items, m.num_compares))
                .collect();
            samples.sort_by(|a, b| a.0.total_cmp(&b.0));

            let points = samples
                .chunk_by(|a, b| a.0 == b.0)
                .map(|group| summarize(group, error_bar))
                .collect();

            Series {
                name: hue.map(str::to_string),
                points,
            }
        })
        .collect()
}

fn summarize(group: &[(f64, f64)], error_bar: ErrorBar) -> SeriesPoint {
    let n = group.len();
    let mean = group.iter().map(|&(_, y)| y).sum::<f64>() / n as f64;

    let std_err = if n > 1 {
        let var = group.iter().map(|&(_, y)| (y - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        (var / n as f64).sqrt()
    } else {
        0.0
    };
    let half = error_bar.half_width(std_err);

    SeriesPoint {
        num_items: group[0].0,
        mean,
        lower: mean - half,
        upper: mean + half,
        count: n,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Measurement;

    fn dataset(rows: &[(f64, f64)]) -> CompareDataset {
        CompareDataset::from_measurements(
            rows.iter().map(|&(x, y)| Measurement::new(x, y)).collect(),
            None,
        )
    }

    #[test]
    fn repeated_sizes_collapse_to_their_mean() {
        let ds = dataset(&[(64.0, 400.0), (32.0, 170.0), (64.0, 440.0), (32.0, 190.0)]);
        let series = aggregate(&ds, ErrorBar::None);

        assert_eq!(series.len(), 1);
        let points = &series[0].points;
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].num_items, 32.0);
        assert_eq!(points[0].mean, 180.0);
        assert_eq!(points[0].count, 2);
        assert_eq!(points[1].mean, 420.0);
        assert_eq!(points[1].lower, points[1].upper);
    }

    #[test]
    fn standard_error_band() {
        let ds = dataset(&[(8.0, 10.0), (8.0, 30.0), (8.0, 50.0), (8.0, 30.0)]);
        let mean = 30.0;
        let sd = ((400.0 + 0.0 + 400.0 + 0.0) / 3.0_f64).sqrt();
        let se = sd / 2.0;

        let p = aggregate(&ds, ErrorBar::StdErr)[0].points[0];
        assert!((p.mean - mean).abs() < 1e-12);
        assert!((p.upper - (mean + se)).abs() < 1e-9);
        assert!((p.lower - (mean - se)).abs() < 1e-9);

        let ci = aggregate(&ds, ErrorBar::Ci95)[0].points[0];
        assert!((ci.upper - ci.mean - Z_95 * se).abs() < 1e-9);
    }

    #[test]
    fn single_sample_has_zero_width_band() {
        let p = aggregate(&dataset(&[(32.0, 170.0)]), ErrorBar::Ci95)[0].points[0];
        assert_eq!((p.lower, p.mean, p.upper), (170.0, 170.0, 170.0));
    }

    #[test]
    fn hue_groups_become_separate_series() {
        let ds = CompareDataset::from_measurements(
            vec![
                Measurement::new(32.0, 170.0).with_hue("quick"),
                Measurement::new(32.0, 130.0).with_hue("merge"),
                Measurement::new(64.0, 420.0).with_hue("quick"),
            ],
            Some("algorithm".into()),
        );
        let series = aggregate(&ds, ErrorBar::Ci95);

        assert_eq!(series.len(), 2);
        assert_eq!(series[0].name.as_deref(), Some("quick"));
        assert_eq!(series[0].points.len(), 2);
        assert_eq!(series[1].name.as_deref(), Some("merge"));
        assert_eq!(series[1].points[0].mean, 130.0);
    }

    #[test]
    fn parses_error_bar_names() {
        assert_eq!("SE".parse::<ErrorBar>().unwrap(), ErrorBar::StdErr);
        assert_eq!("ci95".parse::<ErrorBar>().unwrap(), ErrorBar::Ci95);
        assert!("sd".parse::<ErrorBar>().is_err());
    }
}
