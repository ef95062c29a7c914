use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use crate::error::PlotError;

/// Fraction of the data span added on each side of an axis.
const MARGIN: f64 = 0.05;

/// Axis scale. Logarithmic axes are drawn in exponent space, so the chart
/// itself always works on a linear `f64` coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scale {
    Linear,
    Log { base: f64 },
}

impl Default for Scale {
    fn default() -> Self {
        Scale::Log { base: 2.0 }
    }
}

impl FromStr for Scale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        match s.as_str() {
            "linear" => return Ok(Scale::Linear),
            "ln" => return Ok(Scale::Log { base: std::f64::consts::E }),
            _ => {}
        }
        let base = s
            .strip_prefix("log")
            .ok_or_else(|| format!("unknown scale '{s}' (expected linear, ln or log<base>)"))?;
        let base: f64 = if base.is_empty() {
            10.0
        } else {
            base.parse()
                .map_err(|_| format!("invalid logarithm base in '{s}'"))?
        };
        if !(base.is_finite() && base > 1.0) {
            return Err(format!("logarithm base must be greater than 1, got {base}"));
        }
        Ok(Scale::Log { base })
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scale::Linear => f.write_str("linear"),
            Scale::Log { base } if *base == std::f64::consts::E => f.write_str("ln"),
            Scale::Log { base } => write!(f, "log{base}"),
        }
    }
}

impl Scale {
    /// Map a data value into chart coordinates.
    pub fn forward(&self, v: f64) -> f64 {
        match self {
            Scale::Linear => v,
            Scale::Log { base } if *base == 2.0 => v.log2(),
            Scale::Log { base } if *base == 10.0 => v.log10(),
            Scale::Log { base } => v.ln() / base.ln(),
        }
    }

    /// Reject values the scale cannot represent.
    pub fn check(&self, axis: &'static str, v: f64) -> Result<(), PlotError> {
        match self {
            Scale::Log { .. } if v <= 0.0 => Err(PlotError::NonPositiveValue { axis, value: v }),
            _ => Ok(()),
        }
    }

    /// Chart-coordinate range covering all `values` plus a margin.
    ///
    /// `values` must be non-empty and already checked.
    pub fn range(&self, values: impl IntoIterator<Item = f64>) -> Range<f64> {
        let (lo, hi) = values
            .into_iter()
            .map(|v| self.forward(v))
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        let span = hi - lo;
        if span <= 0.0 || !span.is_finite() {
            return (lo - 0.5)..(hi + 0.5);
        }
        (lo - span * MARGIN)..(hi + span * MARGIN)
    }

    /// Upper bound on how many labelled ticks the axis should get.
    pub fn tick_count(&self, range: &Range<f64>) -> usize {
        match self {
            // one per integer exponent, thinned out by plotters if too dense
            Scale::Log { .. } if whole_exponents(range) >= 2 => {
                whole_exponents(range).clamp(2, 12)
            }
            Scale::Log { .. } | Scale::Linear => 8,
        }
    }

    /// Tick label for a chart coordinate on an axis spanning `range`.
    ///
    /// Log axes label powers as `base^k`. When the range holds fewer than two
    /// of them, ticks fall between powers and are labelled with the value.
    pub fn tick_label(&self, v: f64, range: &Range<f64>) -> String {
        match self {
            Scale::Linear => format_number(v),
            Scale::Log { base } if whole_exponents(range) < 2 => {
                let value = base.powf(v);
                format_number(if value.abs() >= 10.0 { value.round() } else { value })
            }
            Scale::Log { base } => {
                let k = v.round();
                if (v - k).abs() > 1e-9 {
                    return String::new();
                }
                let base = if *base == std::f64::consts::E {
                    "e".to_string()
                } else {
                    format_number(*base)
                };
                format!("{base}^{k:.0}")
            }
        }
    }
}

/// Number of integers in `range`.
fn whole_exponents(range: &Range<f64>) -> usize {
    let n = range.end.floor() - range.start.ceil() + 1.0;
    if n > 0.0 { n as usize } else { 0 }
}

/// Short decimal rendering without float noise.
fn format_number(v: f64) -> String {
    if v == v.trunc() && v.abs() < 1e15 {
        return format!("{v:.0}");
    }
    let s = format!("{v:.3}");
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}
