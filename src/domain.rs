use polars::error::PolarsError;
use std::io::Error as IoError;

/// Application wide error type. Catalog and row source failures are surfaced
/// to the UI as a retryable state; the per-column engines never error, they
/// degrade (NaN, zero counts, empty bins) instead.
#[derive(Debug)]
pub enum GridError {
    Io(IoError),
    Polars(PolarsError),
    CatalogLoad(String),
    RowSourceLoad(String),
    FileNotFound,
    PermissionDenied,
    UnknownFileType,
}

impl From<IoError> for GridError {
    fn from(err: IoError) -> Self {
        GridError::Io(err)
    }
}

impl From<PolarsError> for GridError {
    fn from(err: PolarsError) -> Self {
        GridError::Polars(err)
    }
}

impl From<serde_json::Error> for GridError {
    fn from(err: serde_json::Error) -> Self {
        GridError::CatalogLoad(err.to_string())
    }
}

impl std::fmt::Display for GridError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GridError::Io(e) => write!(f, "io error: {e}"),
            GridError::Polars(e) => write!(f, "dataframe error: {e}"),
            GridError::CatalogLoad(e) => write!(f, "failed to load catalog: {e}"),
            GridError::RowSourceLoad(e) => write!(f, "failed to load dataset: {e}"),
            GridError::FileNotFound => write!(f, "file not found"),
            GridError::PermissionDenied => write!(f, "permission denied"),
            GridError::UnknownFileType => write!(f, "unknown file type"),
        }
    }
}

/// User intents produced by the controller and consumed by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    Quit,
    MoveUp,
    MoveDown,
    MovePageUp,
    MovePageDown,
    MoveBeginning,
    MoveEnd,
    MoveLeft,
    MoveRight,
    ToggleSort,
    ToggleSummary,
    NextDataset,
    PrevDataset,
    LoadSelected,
    Retry,
    Help,
    Exit,
    Resize(usize, usize),
}

#[derive(Debug, Clone)]
pub struct GridConfig {
    /// Controller event poll timeout in milliseconds.
    pub event_poll_ms: u64,
    /// Minimum interval between resize-driven window recomputations.
    pub resize_throttle_ms: u64,
    /// Fixed row height. 1 for a terminal grid; a pixel height for hosts
    /// that render taller rows.
    pub row_height_px: u32,
    /// Leading rows sampled for column type inference.
    pub sample_rows: usize,
    /// Buckets per numeric column histogram.
    pub bin_count: usize,
    pub max_column_width: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        GridConfig {
            event_poll_ms: 100,
            resize_throttle_ms: 50,
            row_height_px: 1,
            sample_rows: 1,
            bin_count: crate::histogram::DEFAULT_BIN_COUNT,
            max_column_width: 40,
        }
    }
}

pub const HELP_TEXT: &str = "tably key bindings

  Up/Down          scroll rows
  PgUp/PgDn        scroll one page
  Home/End         jump to first / last row
  Left/Right       select column
  s                sort by selected column (asc -> desc -> off)
  v                show / hide summary statistics
  Tab / Shift-Tab  select next / previous dataset
  Enter            load selected dataset
  r                retry a failed load
  ?                this help
  Esc              close popup
  q                quit
";
