//! CSV loading and DataFrame ↔ ndarray bridging

use crate::error::{NephroError, Result};
use ndarray::Array2;
use polars::prelude::*;
use std::path::Path;

use super::Cohort;

/// Load a CSV file into a DataFrame
pub fn load_csv(path: &Path) -> Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_infer_schema_length(Some(1000))
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    Ok(df)
}

/// Write a DataFrame to CSV, creating parent directories as needed
pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::File::create(path)?;
    CsvWriter::new(&mut file).finish(df)?;
    Ok(())
}

/// Encode the string `Sex` column into numeric `Sex_encoded` (female = 1.0).
/// No-op if the frame already carries `Sex_encoded` or has no `Sex` column.
pub fn encode_sex(df: &mut DataFrame) -> Result<()> {
    if df.column("Sex_encoded").is_ok() || df.column("Sex").is_err() {
        return Ok(());
    }

    let sex = df.column("Sex")?.as_materialized_series().str()?;
    let encoded: Vec<f64> = sex
        .into_iter()
        .map(|v| if v == Some("female") { 1.0 } else { 0.0 })
        .collect();

    df.with_column(Series::new("Sex_encoded".into(), encoded))?;
    Ok(())
}

/// Extract named columns from a DataFrame into a row-major Array2<f64>
pub fn to_feature_matrix(df: &DataFrame, col_names: &[String]) -> Result<Array2<f64>> {
    let n_rows = df.height();
    let n_cols = col_names.len();

    let col_data: Vec<Vec<f64>> = col_names
        .iter()
        .map(|col_name| {
            let series = df
                .column(col_name)
                .map_err(|_| NephroError::DataError(format!("column not found: {}", col_name)))?;
            let series_f64 = series
                .cast(&DataType::Float64)
                .map_err(|e| NephroError::DataError(e.to_string()))?;
            let values: Vec<f64> = series_f64
                .f64()
                .map_err(|e| NephroError::DataError(e.to_string()))?
                .into_iter()
                .map(|v| v.unwrap_or(0.0))
                .collect();
            Ok(values)
        })
        .collect::<Result<Vec<_>>>()?;

    let x = Array2::from_shape_fn((n_rows, n_cols), |(i, j)| col_data[j][i]);
    Ok(x)
}

/// Build a Cohort from a DataFrame, pulling out the given feature columns
pub fn cohort_from_frame(df: &DataFrame, feature_cols: &[String]) -> Result<Cohort> {
    let features = to_feature_matrix(df, feature_cols)?;
    Ok(Cohort {
        feature_names: feature_cols.to_vec(),
        features,
    })
}

/// Build a DataFrame from a Cohort, one series per feature column
pub fn cohort_to_frame(cohort: &Cohort) -> Result<DataFrame> {
    let columns: Vec<Column> = cohort
        .feature_names
        .iter()
        .enumerate()
        .map(|(j, name)| {
            let values: Vec<f64> = cohort.features.column(j).to_vec();
            Column::new(name.as_str().into(), values)
        })
        .collect();
    let df = DataFrame::new(columns)?;
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_sex() {
        let mut df = df!(
            "Sex" => &["female", "male", "female"],
            "Age" => &[61.0, 48.0, 73.0]
        )
        .unwrap();

        encode_sex(&mut df).unwrap();
        let encoded = df.column("Sex_encoded").unwrap();
        let vals: Vec<f64> = encoded.f64().unwrap().into_iter().flatten().collect();
        assert_eq!(vals, vec![1.0, 0.0, 1.0]);

        // Second call is a no-op
        encode_sex(&mut df).unwrap();
        assert_eq!(df.width(), 3);
    }

    #[test]
    fn test_to_feature_matrix() {
        let df = df!(
            "a" => &[1.0, 2.0],
            "b" => &[3.0, 4.0]
        )
        .unwrap();

        let x = to_feature_matrix(&df, &["a".to_string(), "b".to_string()]).unwrap();
        assert_eq!(x.shape(), &[2, 2]);
        assert_eq!(x[[0, 1]], 3.0);
        assert_eq!(x[[1, 0]], 2.0);

        assert!(to_feature_matrix(&df, &["missing".to_string()]).is_err());
    }

    #[test]
    fn test_csv_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cohort.csv");

        let mut df = df!(
            "Age" => &[52.0, 67.0],
            "SCr" => &[0.9, 1.7]
        )
        .unwrap();

        write_csv(&mut df, &path).unwrap();
        let loaded = load_csv(&path).unwrap();
        assert_eq!(loaded.height(), 2);
        assert_eq!(loaded.width(), 2);
    }
}
