use polars::prelude::*;
use rayon::prelude::*;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, Sender, channel};
use std::thread;
use std::time::Instant;
use tracing::{debug, info, trace};

use crate::domain::GridError;
use crate::infer::{ColumnDescriptor, ColumnTypeClassifier, LeadingRowsClassifier};

#[derive(Debug)]
enum FileType {
    Csv,
    Parquet,
    Arrow,
}

#[derive(Debug)]
struct FileInfo {
    path: PathBuf,
    file_size: u64,
    file_type: FileType,
}

/// One column of the loaded dataset: descriptor plus the raw cells,
/// column-major. Cells keep true nulls, the summary engine needs them to
/// count missing values.
pub struct Column {
    pub descriptor: ColumnDescriptor,
    pub values: Vec<Option<String>>,
    pub max_width: usize,
}

impl Column {
    /// Build a column from already-materialized cells, classifying its type
    /// with the given strategy. This is the row-source boundary: anything
    /// that can produce string cells can feed the engine.
    pub fn from_values(
        name: &str,
        values: Vec<Option<String>>,
        classifier: &dyn ColumnTypeClassifier,
    ) -> Self {
        let ty = classifier.classify(&values);
        let max_width = values
            .iter()
            .flatten()
            .map(|s| s.chars().count())
            .fold(name.chars().count(), usize::max);
        Column {
            descriptor: ColumnDescriptor::new(name, ty),
            values,
            max_width,
        }
    }
}

/// A fully loaded dataset, owned wholesale by the current view and replaced
/// on every dataset change.
pub struct Dataset {
    pub name: String,
    pub columns: Vec<Column>,
}

impl Dataset {
    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }
}

fn detect_file_type(path: &Path) -> Result<FileType, GridError> {
    match path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_uppercase())
        .as_deref()
    {
        Some("CSV") => Ok(FileType::Csv),
        Some("PARQUET") | Some("PQ") => Ok(FileType::Parquet),
        Some("ARROW") | Some("IPC") | Some("FEATHER") => Ok(FileType::Arrow),
        _ => Err(GridError::UnknownFileType),
    }
}

fn file_info(path: &Path) -> Result<FileInfo, GridError> {
    let metadata = fs::metadata(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => GridError::FileNotFound,
        ErrorKind::PermissionDenied => GridError::PermissionDenied,
        _ => GridError::Io(e),
    })?;
    if !metadata.is_file() {
        return Err(GridError::RowSourceLoad(format!(
            "{} is not a file",
            path.display()
        )));
    }
    Ok(FileInfo {
        path: path.to_path_buf(),
        file_size: metadata.len(),
        file_type: detect_file_type(path)?,
    })
}

fn load_csv(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyCsvReader::new(PlPath::Local(path.into()))
        .with_has_header(true)
        .finish()
}

fn load_parquet(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyFrame::scan_parquet(PlPath::Local(path.into()), ScanArgsParquet::default())
}

fn load_arrow(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyFrame::scan_ipc(
        PlPath::Local(path.into()),
        polars::io::ipc::IpcScanOptions,
        UnifiedScanArgs::default(),
    )
}

fn load_column(
    df: &DataFrame,
    col_name: &str,
    classifier: &dyn ColumnTypeClassifier,
) -> Result<Column, PolarsError> {
    let col = df.column(col_name)?.cast(&DataType::String)?;
    let series = col.str()?;
    let mut values = Vec::with_capacity(series.len());
    for value in series.into_iter() {
        let cell = value.map(|s| s.replace("\r\n", " ↵ ").replace('\n', " ↵ "));
        values.push(cell);
    }
    Ok(Column::from_values(col_name, values, classifier))
}

/// Load a dataset file and materialize it column-major with inferred types.
/// Every column holds all cells as strings in memory; loading and
/// classification run one column per rayon worker.
pub fn load_dataset(path: &Path, sample_rows: usize) -> Result<Dataset, GridError> {
    let info = file_info(path)?;
    debug!(
        "Loading {:?} ({} bytes, {:?})",
        info.path, info.file_size, info.file_type
    );
    let frame = match info.file_type {
        FileType::Csv => load_csv(&info.path)?,
        FileType::Parquet => load_parquet(&info.path)?,
        FileType::Arrow => load_arrow(&info.path)?,
    };

    let start_time = Instant::now();
    let df = frame.collect()?;
    let classifier = LeadingRowsClassifier::new(sample_rows);
    let columns: Result<Vec<Column>, PolarsError> = df
        .get_column_names()
        .par_iter()
        .map(|name| load_column(&df, name, &classifier))
        .collect();
    let columns = columns?;
    info!(
        "Loaded {} columns in {}ms",
        columns.len(),
        start_time.elapsed().as_millis()
    );

    let name = info
        .path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("???")
        .to_string();
    Ok(Dataset { name, columns })
}

/// Outcome of one load request, tagged with the generation it belongs to.
pub struct LoadResult {
    pub generation: u64,
    pub outcome: Result<Dataset, GridError>,
}

/// Runs dataset loads off the UI thread and hands results back over a
/// channel. Each request bumps a generation counter; the model compares the
/// result's generation against the latest one, so a slow load that is
/// superseded by a newer selection can never overwrite newer state.
pub struct DatasetLoader {
    tx: Sender<LoadResult>,
    rx: Receiver<LoadResult>,
    generation: u64,
    sample_rows: usize,
}

impl DatasetLoader {
    pub fn new(sample_rows: usize) -> Self {
        let (tx, rx) = channel();
        DatasetLoader {
            tx,
            rx,
            generation: 0,
            sample_rows,
        }
    }

    /// Start loading `path` in the background; supersedes any in-flight load.
    pub fn request(&mut self, path: PathBuf) -> u64 {
        self.generation += 1;
        let generation = self.generation;
        let sample_rows = self.sample_rows;
        let tx = self.tx.clone();
        trace!("Load request generation {generation}: {:?}", path);
        thread::spawn(move || {
            let outcome = load_dataset(&path, sample_rows);
            // The receiver is gone when the app is shutting down.
            let _ = tx.send(LoadResult {
                generation,
                outcome,
            });
        });
        generation
    }

    /// True when `result` belongs to the most recent request.
    pub fn is_current(&self, result: &LoadResult) -> bool {
        result.generation == self.generation
    }

    pub fn try_recv(&self) -> Option<LoadResult> {
        self.rx.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    fn write_csv(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        write!(file, "{content}").unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn loads_a_csv_with_inferred_types() {
        let file = write_csv("amount,when,label\n1.5,2021-05-03,foo\n2.5,2021-05-04,bar\n");
        let dataset = load_dataset(file.path(), 1).unwrap();
        assert_eq!(dataset.row_count(), 2);
        let types: Vec<_> = dataset
            .columns
            .iter()
            .map(|c| c.descriptor.inferred_type)
            .collect();
        use crate::infer::ColumnType::*;
        assert_eq!(types, vec![Number, Date, Text]);
    }

    #[test]
    fn missing_cells_stay_null() {
        let file = write_csv("x\n1\n\n3\n");
        let dataset = load_dataset(file.path(), 1).unwrap();
        let nulls = dataset.columns[0]
            .values
            .iter()
            .filter(|v| v.is_none())
            .count();
        assert_eq!(nulls, 1);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let file = tempfile::Builder::new().suffix(".xyz").tempfile().unwrap();
        assert!(matches!(
            load_dataset(file.path(), 1),
            Err(GridError::UnknownFileType)
        ));
    }

    #[test]
    fn missing_file_is_reported() {
        assert!(matches!(
            load_dataset(Path::new("/nonexistent/data.csv"), 1),
            Err(GridError::FileNotFound)
        ));
    }

    #[test]
    fn stale_results_are_detectable_by_generation() {
        let file_a = write_csv("x\n1\n");
        let file_b = write_csv("x\n2\n");
        let mut loader = DatasetLoader::new(1);
        let first = loader.request(file_a.path().to_path_buf());
        let second = loader.request(file_b.path().to_path_buf());
        assert!(first < second);

        let mut seen = 0;
        let deadline = Instant::now() + Duration::from_secs(10);
        while seen < 2 && Instant::now() < deadline {
            if let Some(result) = loader.try_recv() {
                seen += 1;
                // Only the second request may count as current.
                assert_eq!(loader.is_current(&result), result.generation == second);
            } else {
                thread::sleep(Duration::from_millis(10));
            }
        }
        assert_eq!(seen, 2);
    }
}
