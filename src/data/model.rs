use std::fmt;

// ---------------------------------------------------------------------------
// Measurement – one row of the input table
// ---------------------------------------------------------------------------

/// A single measurement: how many comparisons one run needed for a given
/// input size.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    /// Input size (x).
    pub num_items: f64,
    /// Observed comparison count (y).
    pub num_compares: f64,
    /// Value of the hue column, if one was selected.
    pub hue: Option<String>,
}

impl Measurement {
    pub fn new(num_items: f64, num_compares: f64) -> Self {
        Self {
            num_items,
            num_compares,
            hue: None,
        }
    }

    pub fn with_hue(mut self, hue: impl Into<String>) -> Self {
        self.hue = Some(hue.into());
        self
    }
}

// ---------------------------------------------------------------------------
// CompareDataset – the complete loaded table
// ---------------------------------------------------------------------------

/// All measurements in file order.
#[derive(Debug, Clone, Default)]
pub struct CompareDataset {
    pub measurements: Vec<Measurement>,
    /// Name of the grouping column the hue values came from.
    pub hue_column: Option<String>,
}

impl CompareDataset {
    pub fn from_measurements(measurements: Vec<Measurement>, hue_column: Option<String>) -> Self {
        CompareDataset {
            measurements,
            hue_column,
        }
    }

    /// Number of measurements.
    pub fn len(&self) -> usize {
        self.measurements.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }

    /// Distinct hue values in order of first appearance.
    pub fn hue_values(&self) -> Vec<Option<&str>> {
        let mut seen: Vec<Option<&str>> = Vec::new();
        for m in &self.measurements {
            let hue = m.hue.as_deref();
            if !seen.contains(&hue) {
                seen.push(hue);
            }
        }
        seen
    }
}

// ---------------------------------------------------------------------------
// Aggregated series
// ---------------------------------------------------------------------------

/// The estimate for all measurements sharing one `num_items` value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    pub num_items: f64,
    pub mean: f64,
    /// Lower edge of the error band (equals `mean` without a band).
    pub lower: f64,
    /// Upper edge of the error band.
    pub upper: f64,
    /// How many measurements contributed.
    pub count: usize,
}

/// One line of the chart, sorted by `num_items`.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    /// Hue value, `None` when the dataset is not grouped.
    pub name: Option<String>,
    pub points: Vec<SeriesPoint>,
}

impl fmt::Display for Series {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name} ({} points)", self.points.len()),
            None => write!(f, "<all> ({} points)", self.points.len()),
        }
    }
}
