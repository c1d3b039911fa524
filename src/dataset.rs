use crate::error::{AppError, Result};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// A single named column. Numeric when every cell parses as f64,
/// text otherwise (e.g. the Date column of a price history).
#[derive(Debug, Clone, PartialEq)]
pub enum Series {
    Numeric(Vec<f64>),
    Text(Vec<String>),
}

impl Series {
    fn len(&self) -> usize {
        match self {
            Series::Numeric(values) => values.len(),
            Series::Text(values) => values.len(),
        }
    }
}

/// One company's price table. Rows are chronologically ordered, so the
/// last row is the latest trading day. Immutable after construction.
#[derive(Debug, Clone)]
pub struct Dataset {
    columns: Vec<String>,
    series: HashMap<String, Series>,
}

impl Dataset {
    pub fn new(columns: Vec<String>, series: HashMap<String, Series>) -> Self {
        Self { columns, series }
    }

    pub fn rows(&self) -> usize {
        self.columns
            .first()
            .and_then(|name| self.series.get(name))
            .map_or(0, Series::len)
    }

    /// The column's values, if the column exists and is numeric.
    pub fn numeric(&self, name: &str) -> Option<&[f64]> {
        match self.series.get(name) {
            Some(Series::Numeric(values)) => Some(values),
            _ => None,
        }
    }

    pub fn latest(&self, name: &str) -> Option<f64> {
        self.numeric(name)?.last().copied()
    }

    pub fn max(&self, name: &str) -> Option<f64> {
        let values = self.numeric(name)?;
        if values.is_empty() {
            return None;
        }
        Some(values.iter().copied().fold(f64::NEG_INFINITY, f64::max))
    }

    pub fn min(&self, name: &str) -> Option<f64> {
        let values = self.numeric(name)?;
        if values.is_empty() {
            return None;
        }
        Some(values.iter().copied().fold(f64::INFINITY, f64::min))
    }

    pub fn sum(&self, name: &str) -> Option<f64> {
        Some(self.numeric(name)?.iter().sum())
    }

    pub fn mean(&self, name: &str) -> Option<f64> {
        let values = self.numeric(name)?;
        if values.is_empty() {
            return None;
        }
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Pearson correlation coefficient over two columns paired by row
/// position. Degenerate inputs (fewer than two rows, a constant column)
/// yield NaN, matching the standard definition.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    if n == 0 {
        return f64::NAN;
    }

    let n_f = n as f64;
    let mean_x = x[..n].iter().sum::<f64>() / n_f;
    let mean_y = y[..n].iter().sum::<f64>() / n_f;

    let mut covariance = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for i in 0..n {
        let dx = x[i] - mean_x;
        let dy = y[i] - mean_y;
        covariance += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    covariance / (var_x * var_y).sqrt()
}

/// All loaded company tables, keyed by lowercase company name. Built once
/// at startup and shared read-only for the rest of the process lifetime.
/// Keys iterate in sorted order, which also fixes the tie-break for
/// company extraction from chat messages.
#[derive(Debug, Default)]
pub struct DatasetStore {
    datasets: BTreeMap<String, Dataset>,
}

impl DatasetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scans `dir` for CSV files and parses each into a dataset. The key
    /// is the filename lowercased and truncated at the first dot, so
    /// `AAPL.v2.csv` loads as `aapl`. A missing directory is fatal; a
    /// file that fails to parse is skipped with a warning. Duplicate
    /// keys keep the last file loaded in sorted filename order.
    pub fn load(dir: &Path) -> Result<Self> {
        let entries = std::fs::read_dir(dir).map_err(|e| {
            AppError::Dataset(format!(
                "Cannot read dataset directory {}: {}",
                dir.display(),
                e
            ))
        })?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .collect();
        paths.sort();

        let mut store = Self::new();
        for path in paths {
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !file_name.ends_with(".csv") {
                continue;
            }

            let key = file_name
                .split('.')
                .next()
                .unwrap_or(file_name)
                .to_lowercase();

            match read_csv_dataset(&path) {
                Ok(dataset) => {
                    if store.datasets.contains_key(&key) {
                        warn!("Duplicate dataset key '{}', replacing previous table", key);
                    }
                    info!("Loaded dataset '{}' ({} rows)", key, dataset.rows());
                    store.datasets.insert(key, dataset);
                }
                Err(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                }
            }
        }

        Ok(store)
    }

    pub fn insert(&mut self, key: impl Into<String>, dataset: Dataset) {
        self.datasets.insert(key.into(), dataset);
    }

    pub fn get(&self, key: &str) -> Option<&Dataset> {
        self.datasets.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.datasets.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Dataset)> {
        self.datasets.iter().map(|(key, dataset)| (key.as_str(), dataset))
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }
}

fn read_csv_dataset(path: &Path) -> Result<Dataset> {
    let mut reader = csv::Reader::from_path(path)?;
    let columns: Vec<String> = reader
        .headers()?
        .iter()
        .map(|header| header.trim().to_string())
        .collect();

    let mut cells: Vec<Vec<String>> = vec![Vec::new(); columns.len()];
    for record in reader.records() {
        let record = record?;
        for (i, field) in record.iter().enumerate() {
            cells[i].push(field.trim().to_string());
        }
    }

    let mut series = HashMap::with_capacity(columns.len());
    for (name, values) in columns.iter().zip(cells) {
        let parsed: Option<Vec<f64>> = values.iter().map(|v| v.parse::<f64>().ok()).collect();
        let column = match parsed {
            Some(numbers) => Series::Numeric(numbers),
            None => Series::Text(values),
        };
        series.insert(name.clone(), column);
    }

    Ok(Dataset::new(columns, series))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, contents: &str) {
        let mut file = std::fs::File::create(dir.join(name)).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
    }

    fn numeric_dataset(columns: Vec<(&str, Vec<f64>)>) -> Dataset {
        let names: Vec<String> = columns.iter().map(|(name, _)| name.to_string()).collect();
        let series = columns
            .into_iter()
            .map(|(name, values)| (name.to_string(), Series::Numeric(values)))
            .collect();
        Dataset::new(names, series)
    }

    #[test]
    fn test_load_parses_numeric_and_text_columns() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "acme.csv",
            "Date,Open,Close\n2024-01-02,9.0,10.0\n2024-01-03,11.0,12.0\n",
        );

        let store = DatasetStore::load(dir.path()).unwrap();
        let dataset = store.get("acme").unwrap();

        assert_eq!(dataset.rows(), 2);
        assert_eq!(dataset.numeric("Open"), Some(&[9.0, 11.0][..]));
        assert_eq!(dataset.numeric("Date"), None);
        assert_eq!(dataset.latest("Close"), Some(12.0));
    }

    #[test]
    fn test_load_key_truncates_at_first_dot() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "AAPL.daily.csv", "Close\n1.0\n");

        let store = DatasetStore::load(dir.path()).unwrap();
        assert!(store.get("aapl").is_some());
        assert!(store.get("aapl.daily").is_none());
    }

    #[test]
    fn test_load_ignores_non_csv_files() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "acme.csv", "Close\n1.0\n");
        write_file(dir.path(), "notes.txt", "not a table");

        let store = DatasetStore::load(dir.path()).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_load_skips_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "bad.csv", "Open,Close\n1.0\n");
        write_file(dir.path(), "good.csv", "Close\n1.0\n2.0\n");

        let store = DatasetStore::load(dir.path()).unwrap();
        assert!(store.get("bad").is_none());
        assert!(store.get("good").is_some());
    }

    #[test]
    fn test_load_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(DatasetStore::load(&missing).is_err());
    }

    #[test]
    fn test_load_duplicate_keys_last_wins() {
        let dir = tempfile::tempdir().unwrap();
        // Both derive the key "acme"; "acme.csv" sorts after "ACME.csv".
        write_file(dir.path(), "ACME.csv", "Close\n1.0\n");
        write_file(dir.path(), "acme.csv", "Close\n2.0\n");

        let store = DatasetStore::load(dir.path()).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("acme").unwrap().latest("Close"), Some(2.0));
    }

    #[test]
    fn test_store_iterates_in_sorted_key_order() {
        let mut store = DatasetStore::new();
        store.insert("zeta", numeric_dataset(vec![("Close", vec![1.0])]));
        store.insert("acme", numeric_dataset(vec![("Close", vec![1.0])]));

        let keys: Vec<&str> = store.keys().collect();
        assert_eq!(keys, vec!["acme", "zeta"]);
    }

    #[test]
    fn test_column_aggregates() {
        let dataset = numeric_dataset(vec![
            ("Close", vec![10.0, 12.0, 14.0]),
            ("Volume", vec![100.0, 200.0, 300.0]),
        ]);

        assert_eq!(dataset.latest("Close"), Some(14.0));
        assert_eq!(dataset.max("Close"), Some(14.0));
        assert_eq!(dataset.min("Close"), Some(10.0));
        assert_eq!(dataset.sum("Volume"), Some(600.0));
        assert_eq!(dataset.mean("Close"), Some(12.0));
        assert_eq!(dataset.latest("Open"), None);
    }

    #[test]
    fn test_aggregates_on_empty_column() {
        let dataset = numeric_dataset(vec![("Close", vec![])]);
        assert_eq!(dataset.latest("Close"), None);
        assert_eq!(dataset.max("Close"), None);
        assert_eq!(dataset.mean("Close"), None);
    }

    #[test]
    fn test_pearson_known_coefficient() {
        // Hand-computed: cov = 1, var_x = 2, var_y = 2 -> r = 0.5.
        let r = pearson(&[1.0, 2.0, 3.0], &[1.0, 3.0, 2.0]);
        assert!((r - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_perfect_correlation() {
        let r = pearson(&[10.0, 12.0, 14.0], &[100.0, 200.0, 300.0]);
        assert!((r - 1.0).abs() < 1e-12);

        let r = pearson(&[1.0, 2.0, 3.0], &[6.0, 4.0, 2.0]);
        assert!((r + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_degenerate_inputs_are_nan() {
        assert!(pearson(&[], &[]).is_nan());
        assert!(pearson(&[1.0], &[2.0]).is_nan());
        assert!(pearson(&[5.0, 5.0, 5.0], &[1.0, 2.0, 3.0]).is_nan());
    }
}
