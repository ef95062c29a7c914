use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Array, Float64Array, StringArray};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use log::{debug, info};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CompareDataset, Measurement};
use crate::error::PlotError;

/// Column holding the input size.
pub const NUM_ITEMS: &str = "num_items";
/// Column holding the comparison count.
pub const NUM_COMPARES: &str = "num_compares";

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load measurements from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv` / `.tsv` – header row naming `num_items` and `num_compares`
/// * `.json`         – `[{ "num_items": 32, "num_compares": 170 }, ...]`
/// * `.parquet`      – numeric `num_items` and `num_compares` columns
///
/// `hue` names an optional grouping column that must also be present.
pub fn load_file(path: &Path, hue: Option<&str>) -> Result<CompareDataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let measurements = match ext.as_str() {
        "csv" => load_delimited(path, b',', hue)?,
        "tsv" => load_delimited(path, b'\t', hue)?,
        "json" => load_json(path, hue)?,
        "parquet" | "pq" => load_parquet(path, hue)?,
        other => return Err(PlotError::UnsupportedInput(other.to_string()).into()),
    };

    if measurements.is_empty() {
        return Err(PlotError::EmptyDataset(path.to_path_buf()).into());
    }
    info!("Loaded {} measurements from {}", measurements.len(), path.display());

    Ok(CompareDataset::from_measurements(
        measurements,
        hue.map(str::to_string),
    ))
}

fn missing(path: &Path, column: &str) -> PlotError {
    PlotError::MissingColumn {
        path: path.to_path_buf(),
        column: column.to_string(),
    }
}

fn parse_number(path: &Path, row: usize, column: &str, raw: &str) -> Result<f64, PlotError> {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(PlotError::InvalidValue {
            path: path.to_path_buf(),
            row,
            column: column.to_string(),
            value: raw.to_string(),
        }),
    }
}

// ---------------------------------------------------------------------------
// CSV / TSV loader
// ---------------------------------------------------------------------------

/// Header row with column names; columns are located by name, so their order
/// does not matter and unrelated columns are ignored.
fn load_delimited(path: &Path, delimiter: u8, hue: Option<&str>) -> Result<Vec<Measurement>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    debug!("{}: columns {:?}", path.display(), headers);

    let position = |column: &str| -> Result<usize, PlotError> {
        headers
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| missing(path, column))
    };
    let x_idx = position(NUM_ITEMS)?;
    let y_idx = position(NUM_COMPARES)?;
    let hue_idx = hue.map(|col| position(col)).transpose()?;

    let mut measurements = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;

        let num_items = parse_number(path, row_no, NUM_ITEMS, record.get(x_idx).unwrap_or(""))?;
        let num_compares =
            parse_number(path, row_no, NUM_COMPARES, record.get(y_idx).unwrap_or(""))?;

        let mut m = Measurement::new(num_items, num_compares);
        if let Some(idx) = hue_idx {
            m = m.with_hue(record.get(idx).unwrap_or("").trim());
        }
        measurements.push(m);
    }

    Ok(measurements)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented array, the default `df.to_json(orient='records')`:
///
/// ```json
/// [
///   { "num_items": 32, "num_compares": 170 },
///   { "num_items": 64, "num_compares": 431 }
/// ]
/// ```
fn load_json(path: &Path, hue: Option<&str>) -> Result<Vec<Measurement>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut measurements = Vec::with_capacity(records.len());

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let number = |column: &str| -> Result<f64, PlotError> {
            match obj.get(column) {
                None => Err(missing(path, column)),
                Some(JsonValue::Number(n)) => n
                    .as_f64()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| PlotError::InvalidValue {
                        path: path.to_path_buf(),
                        row: i,
                        column: column.to_string(),
                        value: n.to_string(),
                    }),
                Some(JsonValue::String(s)) => parse_number(path, i, column, s),
                Some(other) => Err(PlotError::InvalidValue {
                    path: path.to_path_buf(),
                    row: i,
                    column: column.to_string(),
                    value: other.to_string(),
                }),
            }
        };

        let mut m = Measurement::new(number(NUM_ITEMS)?, number(NUM_COMPARES)?);
        if let Some(col) = hue {
            let value = obj.get(col).ok_or_else(|| missing(path, col))?;
            m = m.with_hue(match value {
                JsonValue::String(s) => s.clone(),
                other => other.to_string(),
            });
        }
        measurements.push(m);
    }

    Ok(measurements)
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file written by Pandas or Polars.
///
/// Expected schema: numeric `num_items` and `num_compares` columns (any
/// integer or float width); an optional hue column of any type.
fn load_parquet(path: &Path, hue: Option<&str>) -> Result<Vec<Measurement>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut measurements = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;

        let x = numeric_column(path, NUM_ITEMS, batch_column(&batch, path, NUM_ITEMS)?)?;
        let y = numeric_column(path, NUM_COMPARES, batch_column(&batch, path, NUM_COMPARES)?)?;
        let hue_values = match hue {
            Some(name) => Some(string_column(batch_column(&batch, path, name)?)?),
            None => None,
        };

        let offset = measurements.len();
        for row in 0..batch.num_rows() {
            let value = |arr: &Float64Array, name: &str| -> Result<f64, PlotError> {
                if arr.is_null(row) || !arr.value(row).is_finite() {
                    return Err(PlotError::InvalidValue {
                        path: path.to_path_buf(),
                        row: offset + row,
                        column: name.to_string(),
                        value: if arr.is_null(row) {
                            "null".to_string()
                        } else {
                            arr.value(row).to_string()
                        },
                    });
                }
                Ok(arr.value(row))
            };

            let mut m = Measurement::new(value(&x, NUM_ITEMS)?, value(&y, NUM_COMPARES)?);
            if let Some(hues) = &hue_values {
                let label = if hues.is_null(row) { "" } else { hues.value(row) };
                m = m.with_hue(label);
            }
            measurements.push(m);
        }
    }

    Ok(measurements)
}

// -- Arrow helpers --

fn batch_column<'a>(
    batch: &'a RecordBatch,
    path: &Path,
    name: &str,
) -> Result<&'a Arc<dyn Array>, PlotError> {
    batch
        .schema()
        .index_of(name)
        .map(|idx| batch.column(idx))
        .map_err(|_| missing(path, name))
}

/// Widen any numeric column to `Float64`.
fn numeric_column(path: &Path, name: &str, col: &Arc<dyn Array>) -> Result<Float64Array> {
    if !col.data_type().is_numeric() {
        return Err(PlotError::InvalidValue {
            path: path.to_path_buf(),
            row: 0,
            column: name.to_string(),
            value: format!("{:?}", col.data_type()),
        }
        .into());
    }
    let widened = cast(col, &DataType::Float64)
        .with_context(|| format!("casting '{name}' to Float64"))?;
    Ok(widened
        .as_any()
        .downcast_ref::<Float64Array>()
        .context("expected Float64Array after cast")?
        .clone())
}

/// Render any column as text for use as a hue label.
fn string_column(col: &Arc<dyn Array>) -> Result<StringArray> {
    let text = cast(col, &DataType::Utf8).context("casting hue column to Utf8")?;
    Ok(text
        .as_any()
        .downcast_ref::<StringArray>()
        .context("expected StringArray after cast")?
        .clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn write(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    fn plot_error(err: anyhow::Error) -> PlotError {
        err.downcast::<PlotError>().expect("expected a PlotError")
    }

    #[test]
    fn loads_csv_in_file_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "compares.csv", "num_items,num_compares\n32,170\n32,181\n64,431\n");

        let ds = load_file(&path, None).unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.measurements[0], Measurement::new(32.0, 170.0));
        assert_eq!(ds.measurements[2], Measurement::new(64.0, 431.0));
        assert!(ds.hue_column.is_none());
    }

    #[test]
    fn column_order_and_extra_columns_do_not_matter() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "compares.csv",
            "run,num_compares,num_items\n0,170,32\n1,431,64\n",
        );

        let ds = load_file(&path, None).unwrap();
        assert_eq!(ds.measurements[1], Measurement::new(64.0, 431.0));
    }

    #[test]
    fn misspelled_column_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "compares.csv", "num_item,num_compares\n32,170\n");

        match plot_error(load_file(&path, None).unwrap_err()) {
            PlotError::MissingColumn { column, .. } => assert_eq!(column, NUM_ITEMS),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn non_numeric_cell_reports_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "compares.csv", "num_items,num_compares\n32,170\n64,lots\n");

        match plot_error(load_file(&path, None).unwrap_err()) {
            PlotError::InvalidValue { row, column, value, .. } => {
                assert_eq!(row, 1);
                assert_eq!(column, NUM_COMPARES);
                assert_eq!(value, "lots");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn non_finite_cells_are_invalid() {
        let dir = tempfile::tempdir().unwrap();
        for (raw, row) in [("NaN", 1), ("inf", 0), ("-infinity", 1)] {
            let contents = if row == 0 {
                format!("num_items,num_compares\n32,{raw}\n64,431\n")
            } else {
                format!("num_items,num_compares\n32,170\n64,{raw}\n")
            };
            let path = write(&dir, "compares.csv", &contents);

            match plot_error(load_file(&path, None).unwrap_err()) {
                PlotError::InvalidValue { row: r, value, .. } => {
                    assert_eq!(r, row);
                    assert_eq!(value, raw);
                }
                other => panic!("unexpected error for {raw}: {other}"),
            }
        }
    }

    #[test]
    fn header_only_is_empty_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "compares.csv", "num_items,num_compares\n");

        assert!(matches!(
            plot_error(load_file(&path, None).unwrap_err()),
            PlotError::EmptyDataset(_)
        ));
    }

    #[test]
    fn tsv_with_hue_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "compares.tsv",
            "algorithm\tnum_items\tnum_compares\nquick\t32\t170\nmerge\t32\t130\n",
        );

        let ds = load_file(&path, Some("algorithm")).unwrap();
        assert_eq!(ds.hue_column.as_deref(), Some("algorithm"));
        assert_eq!(ds.measurements[1].hue.as_deref(), Some("merge"));
    }

    #[test]
    fn missing_hue_column_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "compares.csv", "num_items,num_compares\n32,170\n");

        assert!(matches!(
            plot_error(load_file(&path, Some("algorithm")).unwrap_err()),
            PlotError::MissingColumn { .. }
        ));
    }

    #[test]
    fn loads_json_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "compares.json",
            r#"[{"num_items": 32, "num_compares": 170}, {"num_items": "64", "num_compares": 431.5}]"#,
        );

        let ds = load_file(&path, None).unwrap();
        assert_eq!(ds.measurements[1], Measurement::new(64.0, 431.5));
    }

    #[test]
    fn json_missing_field_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "compares.json", r#"[{"num_items": 32}]"#);

        assert!(matches!(
            plot_error(load_file(&path, None).unwrap_err()),
            PlotError::MissingColumn { .. }
        ));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "compares.xlsx", "");

        assert!(matches!(
            plot_error(load_file(&path, None).unwrap_err()),
            PlotError::UnsupportedInput(ext) if ext == "xlsx"
        ));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_file(&dir.path().join("compares.csv"), None).is_err());
    }

    #[test]
    fn loads_parquet_with_integer_columns() {
        use arrow::array::{Int64Array, UInt32Array};
        use arrow::datatypes::{Field, Schema};
        use parquet::arrow::ArrowWriter;

        let schema = Arc::new(Schema::new(vec![
            Field::new(NUM_ITEMS, DataType::UInt32, false),
            Field::new(NUM_COMPARES, DataType::Int64, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(UInt32Array::from(vec![32, 64])),
                Arc::new(Int64Array::from(vec![170, 431])),
            ],
        )
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("compares.parquet");
        let file = fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let ds = load_file(&path, None).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.measurements[1], Measurement::new(64.0, 431.0));
    }
}
