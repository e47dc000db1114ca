use rayon::prelude::*;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace};

use crate::catalog::DatasetEntry;
use crate::domain::{GridConfig, GridError, Message};
use crate::histogram::{self, HistogramBin};
use crate::loader::{Dataset, DatasetLoader};
use crate::sort::{SortOrder, SortPolicy, sort_rows};
use crate::stats::{self, ColumnSummary};
use crate::throttle::Throttle;
use crate::ui::{
    COLUMN_SPACING, COLUMN_WIDTH_MARGIN, STATUSLINE_HEIGHT, SUMMARY_BLOCK_HEIGHT,
    TABLE_HEADER_HEIGHT, TITLE_HEIGHT,
};
use crate::window::{RowWindow, ViewportMetrics};

#[derive(Debug, PartialEq, Eq)]
pub enum Status {
    Empty,
    Loading,
    Ready,
    Quitting,
}

/// Vertical split of the terminal. Recomputed on resize and when the summary
/// block is toggled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GridLayout {
    pub width: usize,
    pub height: usize,
    pub summary_height: usize,
    pub table_height: usize,
}

impl GridLayout {
    pub fn from_values(width: usize, height: usize, show_summary: bool) -> Self {
        let summary_height = if show_summary {
            SUMMARY_BLOCK_HEIGHT
        } else {
            0
        };
        let table_height = height
            .saturating_sub(TITLE_HEIGHT + TABLE_HEADER_HEIGHT + STATUSLINE_HEIGHT)
            .saturating_sub(summary_height);
        let layout = GridLayout {
            width,
            height,
            summary_height,
            table_height,
        };
        trace!("Build GridLayout: {:?}", layout);
        layout
    }
}

/// Header cell handed to the rendering layer.
pub struct HeaderCell {
    pub column: usize,
    pub label: String,
    pub width: usize,
    pub sort: Option<SortOrder>,
    pub selected: bool,
}

/// Owns everything belonging to the current view: the loaded dataset, its
/// descriptors and summaries, the row-index mapping, sort state and the
/// virtualized row window. Replaced wholesale on every dataset change; all
/// updates run on the single event-loop thread.
pub struct Model {
    config: GridConfig,
    pub status: Status,
    catalog: Vec<DatasetEntry>,
    selected_entry: usize,
    loader: DatasetLoader,
    load_failed: bool,
    load_error: Option<String>,
    dataset: Option<Dataset>,
    summaries: Vec<ColumnSummary>,
    histograms: Vec<Vec<HistogramBin>>,
    rows: Vec<usize>,
    sort: SortPolicy,
    selected_column: usize,
    offset_column: usize,
    show_summary: bool,
    show_help: bool,
    viewport: ViewportMetrics,
    window: RowWindow,
    resize_events: Throttle<(usize, usize)>,
    layout: GridLayout,
    status_message: String,
    last_status_message_update: Instant,
}

impl Model {
    pub fn init(
        config: GridConfig,
        catalog: Vec<DatasetEntry>,
        ui_width: usize,
        ui_height: usize,
    ) -> Result<Self, GridError> {
        let layout = GridLayout::from_values(ui_width, ui_height, true);
        let mut model = Model {
            status: Status::Empty,
            loader: DatasetLoader::new(config.sample_rows),
            resize_events: Throttle::new(Duration::from_millis(config.resize_throttle_ms)),
            window: RowWindow::empty(config.row_height_px),
            viewport: ViewportMetrics {
                height_px: layout.table_height as u32 * config.row_height_px,
                scroll_top_px: 0,
            },
            config,
            catalog,
            selected_entry: 0,
            load_failed: false,
            load_error: None,
            dataset: None,
            summaries: Vec::new(),
            histograms: Vec::new(),
            rows: Vec::new(),
            sort: SortPolicy::default(),
            selected_column: 0,
            offset_column: 0,
            show_summary: true,
            show_help: false,
            layout,
            status_message: "Started tably!".to_string(),
            last_status_message_update: Instant::now(),
        };
        // One load per mount: the initial selection is fetched exactly once.
        if !model.catalog.is_empty() {
            model.load_selected();
        }
        Ok(model)
    }

    // -------------------- Message handling ---------------------- //

    pub fn update(&mut self, message: Message) -> Result<(), GridError> {
        trace!("Update: {:?}", message);
        match message {
            Message::Quit => self.quit(),
            Message::MoveUp => self.scroll_rows(-1),
            Message::MoveDown => self.scroll_rows(1),
            Message::MovePageUp => self.scroll_rows(-(self.layout.table_height as i64)),
            Message::MovePageDown => self.scroll_rows(self.layout.table_height as i64),
            Message::MoveBeginning => self.scroll_to(0),
            Message::MoveEnd => self.scroll_to(u64::MAX),
            Message::MoveLeft => self.select_column(self.selected_column.saturating_sub(1)),
            Message::MoveRight => self.select_column(self.selected_column + 1),
            Message::ToggleSort => self.apply_sort(),
            Message::ToggleSummary => self.toggle_summary(),
            Message::NextDataset => self.select_entry(1),
            Message::PrevDataset => self.select_entry(-1),
            Message::LoadSelected => self.load_selected(),
            Message::Retry => self.retry(),
            Message::Help => self.show_help = true,
            Message::Exit => self.show_help = false,
            Message::Resize(width, height) => self.resize_events.submit((width, height)),
        }
        Ok(())
    }

    /// Drive pending work: throttled resizes and finished loads. Called once
    /// per event-loop iteration.
    pub fn tick(&mut self) {
        if let Some((width, height)) = self.resize_events.poll() {
            self.apply_resize(width, height);
        }
        while let Some(result) = self.loader.try_recv() {
            if !self.loader.is_current(&result) {
                // A newer selection superseded this load; last request wins.
                trace!("Dropping stale load result generation {}", result.generation);
                continue;
            }
            match result.outcome {
                Ok(dataset) => self.set_dataset(dataset),
                Err(e) => {
                    info!("Load failed: {e}");
                    self.load_failed = true;
                    self.load_error = Some(e.to_string());
                    self.status = if self.dataset.is_some() {
                        Status::Ready
                    } else {
                        Status::Empty
                    };
                    self.set_status_message("Load failed, press r to retry".to_string());
                }
            }
        }
    }

    fn quit(&mut self) {
        // The view is being torn down, nothing pending may fire after this.
        self.resize_events.cancel();
        self.status = Status::Quitting;
    }

    // -------------------- Dataset lifecycle ---------------------- //

    /// Install a fully-materialized dataset as the current view. This is the
    /// row-source boundary: descriptors, summaries, histograms and the row
    /// mapping are all recomputed from scratch, nothing survives from the
    /// previous dataset.
    pub fn set_dataset(&mut self, dataset: Dataset) {
        let start_time = Instant::now();
        self.summaries = dataset
            .columns
            .par_iter()
            .map(|c| stats::summarize(&c.values, c.descriptor.inferred_type))
            .collect();
        self.histograms = dataset
            .columns
            .par_iter()
            .zip(&self.summaries)
            .map(|(c, summary)| match summary.numeric_extent() {
                Some((min, max)) => {
                    histogram::bin_values(&c.values, min, max, self.config.bin_count)
                }
                None => Vec::new(),
            })
            .collect();
        debug!(
            "Summarized {} columns in {}ms",
            dataset.columns.len(),
            start_time.elapsed().as_millis()
        );

        self.rows = (0..dataset.row_count()).collect();
        self.sort.reset();
        self.selected_column = 0;
        self.offset_column = 0;
        self.viewport.scroll_top_px = 0;
        self.load_failed = false;
        self.load_error = None;
        self.set_status_message(format!(
            "Loaded {} ({} rows)",
            dataset.name,
            dataset.row_count()
        ));
        self.dataset = Some(dataset);
        self.status = Status::Ready;
        self.recompute_window();
    }

    fn load_selected(&mut self) {
        let Some(entry) = self.catalog.get(self.selected_entry) else {
            return;
        };
        let name = entry.name.clone();
        let path = PathBuf::from(&entry.url);
        info!("Loading dataset {} from {}", name, path.display());
        self.load_failed = false;
        self.load_error = None;
        self.status = Status::Loading;
        self.set_status_message(format!("Loading {name} ..."));
        self.loader.request(path);
    }

    fn retry(&mut self) {
        if self.load_failed {
            self.load_selected();
        }
    }

    fn select_entry(&mut self, step: i64) {
        if self.catalog.is_empty() {
            return;
        }
        let len = self.catalog.len() as i64;
        let next = (self.selected_entry as i64 + step).rem_euclid(len);
        self.selected_entry = next as usize;
        let entry = &self.catalog[self.selected_entry];
        self.set_status_message(format!(
            "Selected {} ({} rows), Enter to load",
            entry.name, entry.row_count
        ));
    }

    // -------------------- Sorting ---------------------- //

    fn apply_sort(&mut self) {
        let Some(dataset) = &self.dataset else {
            return;
        };
        let Some(column) = dataset.columns.get(self.selected_column) else {
            return;
        };
        let order = self.sort.toggle(self.selected_column);
        // Always rebuilt from the original load order, so that cycling back
        // to unsorted restores it exactly.
        self.rows = (0..dataset.row_count()).collect();
        if let Some(order) = order {
            sort_rows(
                &mut self.rows,
                &column.values,
                column.descriptor.inferred_type,
                order,
            );
        }
        debug!(
            "Sorted column {} ({:?})",
            column.descriptor.name, order
        );
        self.recompute_window();
    }

    // -------------------- Scrolling & window ---------------------- //

    fn max_scroll_top(&self) -> u64 {
        RowWindow::max_scroll_top(
            self.rows.len(),
            self.config.row_height_px,
            self.viewport.height_px,
        )
    }

    fn scroll_rows(&mut self, delta: i64) {
        let step = delta.unsigned_abs() * self.config.row_height_px as u64;
        let target = if delta < 0 {
            self.viewport.scroll_top_px.saturating_sub(step)
        } else {
            self.viewport.scroll_top_px.saturating_add(step)
        };
        self.scroll_to(target);
    }

    fn scroll_to(&mut self, scroll_top_px: u64) {
        self.viewport.scroll_top_px = scroll_top_px.min(self.max_scroll_top());
        self.recompute_window();
    }

    fn recompute_window(&mut self) {
        self.window = RowWindow::compute(
            self.rows.len(),
            self.config.row_height_px,
            self.viewport,
        );
    }

    fn apply_resize(&mut self, width: usize, height: usize) {
        trace!(
            "UI was resized! w:{}->{}, h:{}->{}",
            self.layout.width, width, self.layout.height, height
        );
        self.layout = GridLayout::from_values(width, height, self.show_summary);
        self.viewport.height_px = self.layout.table_height as u32 * self.config.row_height_px;
        self.scroll_to(self.viewport.scroll_top_px);
    }

    fn toggle_summary(&mut self) {
        self.show_summary = !self.show_summary;
        // The table area grows or shrinks with the summary block.
        self.apply_resize(self.layout.width, self.layout.height);
    }

    // -------------------- Column selection ---------------------- //

    fn select_column(&mut self, column: usize) {
        let Some(dataset) = &self.dataset else {
            return;
        };
        if dataset.columns.is_empty() {
            return;
        }
        self.selected_column = column.min(dataset.columns.len() - 1);
        self.ensure_column_visible();
    }

    fn column_width(&self, column: usize) -> usize {
        let Some(dataset) = &self.dataset else {
            return 0;
        };
        let col = &dataset.columns[column];
        let width = col
            .max_width
            .max(col.descriptor.display_name.chars().count())
            + COLUMN_WIDTH_MARGIN;
        width.min(self.config.max_column_width)
    }

    /// Columns that fit the current layout, starting at the column offset.
    /// The last one may render clipped.
    pub fn visible_columns(&self) -> Vec<usize> {
        let Some(dataset) = &self.dataset else {
            return Vec::new();
        };
        let mut visible = Vec::new();
        let mut used = 0;
        for column in self.offset_column..dataset.columns.len() {
            let width = self.column_width(column) + COLUMN_SPACING;
            if !visible.is_empty() && used + width > self.layout.width {
                // A partially fitting trailing column still renders, clipped.
                if used < self.layout.width {
                    visible.push(column);
                }
                break;
            }
            visible.push(column);
            used += width;
        }
        visible
    }

    fn ensure_column_visible(&mut self) {
        if self.selected_column < self.offset_column {
            self.offset_column = self.selected_column;
            return;
        }
        while !self.visible_columns().contains(&self.selected_column)
            && self.offset_column < self.selected_column
        {
            self.offset_column += 1;
        }
    }

    // -------------------- Rendering boundary ---------------------- //

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn layout(&self) -> GridLayout {
        self.layout
    }

    pub fn window(&self) -> RowWindow {
        self.window
    }

    pub fn show_summary(&self) -> bool {
        self.show_summary
    }

    pub fn show_help(&self) -> bool {
        self.show_help
    }

    pub fn load_failed(&self) -> bool {
        self.load_failed
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn dataset_name(&self) -> Option<&str> {
        self.dataset.as_ref().map(|d| d.name.as_str())
    }

    pub fn catalog(&self) -> &[DatasetEntry] {
        &self.catalog
    }

    pub fn selected_entry(&self) -> usize {
        self.selected_entry
    }

    pub fn selected_column(&self) -> usize {
        self.selected_column
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    pub fn summaries(&self) -> &[ColumnSummary] {
        &self.summaries
    }

    pub fn histogram_for(&self, column: usize) -> &[HistogramBin] {
        self.histograms.get(column).map_or(&[], Vec::as_slice)
    }

    pub fn headers(&self) -> Vec<HeaderCell> {
        let Some(dataset) = &self.dataset else {
            return Vec::new();
        };
        self.visible_columns()
            .into_iter()
            .map(|idx| HeaderCell {
                column: idx,
                label: dataset.columns[idx].descriptor.display_name.clone(),
                width: self.column_width(idx),
                sort: self.sort.order_for(idx),
                selected: idx == self.selected_column,
            })
            .collect()
    }

    /// The rows the window materializes, as (absolute row number, cells of
    /// the visible columns). Null cells render as the placeholder glyph.
    pub fn visible_rows(&self) -> Vec<(usize, Vec<String>)> {
        let Some(dataset) = &self.dataset else {
            return Vec::new();
        };
        let columns = self.visible_columns();
        self.window
            .range()
            .filter_map(|view_idx| {
                let row = *self.rows.get(view_idx)?;
                let cells = columns
                    .iter()
                    .map(|&c| match &dataset.columns[c].values[row] {
                        Some(value) => value.clone(),
                        None => "∅".to_string(),
                    })
                    .collect();
                Some((row, cells))
            })
            .collect()
    }

    fn set_status_message(&mut self, message: String) {
        self.status_message = message;
        self.last_status_message_update = Instant::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infer::LeadingRowsClassifier;
    use crate::loader::Column;

    fn dataset(name: &str, columns: Vec<(&str, Vec<Option<&str>>)>) -> Dataset {
        let classifier = LeadingRowsClassifier::default();
        Dataset {
            name: name.to_string(),
            columns: columns
                .into_iter()
                .map(|(col_name, values)| {
                    Column::from_values(
                        col_name,
                        values.into_iter().map(|v| v.map(str::to_string)).collect(),
                        &classifier,
                    )
                })
                .collect(),
        }
    }

    fn ready_model(ds: Dataset) -> Model {
        let mut model = Model::init(GridConfig::default(), Vec::new(), 80, 24).unwrap();
        model.set_dataset(ds);
        model
    }

    fn first_column_cells(model: &Model) -> Vec<String> {
        model
            .visible_rows()
            .into_iter()
            .map(|(_, cells)| cells[0].clone())
            .collect()
    }

    #[test]
    fn installing_a_dataset_builds_summaries_and_window() {
        let model = ready_model(dataset(
            "t",
            vec![("x", vec![Some("1"), Some("2"), Some("3"), None])],
        ));
        assert_eq!(model.status, Status::Ready);
        assert_eq!(model.summaries().len(), 1);
        let lines = model.summaries()[0].summary_lines();
        assert_eq!(lines[0], ("min", "1.00".to_string()));
        assert_eq!(lines[2], ("mean", "2.00".to_string()));
        assert_eq!(lines[4], ("nullCount", "1".to_string()));
        assert_eq!(model.window().range(), 0..4);
    }

    #[test]
    fn numeric_columns_get_histograms_text_columns_do_not() {
        let model = ready_model(dataset(
            "t",
            vec![
                ("x", vec![Some("1"), Some("5"), Some("9")]),
                ("label", vec![Some("a"), Some("b"), Some("c")]),
            ],
        ));
        assert!(!model.histogram_for(0).is_empty());
        assert!(model.histogram_for(1).is_empty());
        let total: usize = model.histogram_for(0).iter().map(|b| b.count).sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn sort_gesture_cycles_ascending_descending_original() {
        let mut model = ready_model(dataset(
            "t",
            vec![("x", vec![Some("3"), Some("1"), Some("2")])],
        ));
        assert_eq!(first_column_cells(&model), vec!["3", "1", "2"]);

        model.update(Message::ToggleSort).unwrap();
        assert_eq!(first_column_cells(&model), vec!["1", "2", "3"]);

        model.update(Message::ToggleSort).unwrap();
        assert_eq!(first_column_cells(&model), vec!["3", "2", "1"]);

        model.update(Message::ToggleSort).unwrap();
        assert_eq!(first_column_cells(&model), vec!["3", "1", "2"]);
    }

    #[test]
    fn sorting_another_column_resets_the_previous_one() {
        let mut model = ready_model(dataset(
            "t",
            vec![
                ("x", vec![Some("2"), Some("1")]),
                ("y", vec![Some("b"), Some("a")]),
            ],
        ));
        model.update(Message::ToggleSort).unwrap();
        let sorted_by_x = model.headers();
        assert_eq!(sorted_by_x[0].sort, Some(SortOrder::Ascending));

        model.update(Message::MoveRight).unwrap();
        model.update(Message::ToggleSort).unwrap();
        let headers = model.headers();
        assert_eq!(headers[0].sort, None);
        assert_eq!(headers[1].sort, Some(SortOrder::Ascending));
        assert_eq!(first_column_cells(&model), vec!["1", "2"]);
    }

    #[test]
    fn scrolling_moves_the_window_within_bounds() {
        let values: Vec<Option<String>> = (0..50_000).map(|i| Some(i.to_string())).collect();
        let classifier = LeadingRowsClassifier::default();
        let ds = Dataset {
            name: "big".to_string(),
            columns: vec![Column::from_values("x", values, &classifier)],
        };
        let mut model = ready_model(ds);

        model.update(Message::MoveEnd).unwrap();
        let window = model.window();
        assert_eq!(window.range().end, 50_000);
        assert!(window.visible_count <= model.layout().table_height + 1);

        model.update(Message::MoveBeginning).unwrap();
        assert_eq!(model.window().first_visible, 0);

        for _ in 0..5 {
            model.update(Message::MovePageDown).unwrap();
        }
        assert!(model.window().range().end <= 50_000);
    }

    #[test]
    fn resize_flows_through_the_throttle() {
        let mut model = ready_model(dataset("t", vec![("x", vec![Some("1"), Some("2")])]));
        let before = model.layout();
        model.update(Message::Resize(120, 40)).unwrap();
        // Nothing happens until the throttle fires on the next tick.
        assert_eq!(model.layout(), before);
        model.tick();
        assert_eq!(model.layout().width, 120);
        assert_eq!(model.layout().height, 40);
    }

    #[test]
    fn resize_to_zero_height_is_not_fatal() {
        let mut model = ready_model(dataset("t", vec![("x", vec![Some("1")])]));
        model.update(Message::Resize(80, 0)).unwrap();
        model.tick();
        assert_eq!(model.window().visible_count, 0);
    }

    #[test]
    fn toggling_the_summary_resizes_the_table_area() {
        let mut model = ready_model(dataset("t", vec![("x", vec![Some("1")])]));
        let with_summary = model.layout().table_height;
        model.update(Message::ToggleSummary).unwrap();
        assert_eq!(
            model.layout().table_height,
            with_summary + SUMMARY_BLOCK_HEIGHT
        );
    }

    #[test]
    fn quitting_cancels_pending_resizes() {
        let mut model = ready_model(dataset("t", vec![("x", vec![Some("1")])]));
        let before = model.layout();
        model.update(Message::Resize(10, 10)).unwrap();
        model.update(Message::Quit).unwrap();
        model.tick();
        // The cancelled resize never executed against the torn-down view.
        assert_eq!(model.layout(), before);
        assert_eq!(model.status, Status::Quitting);
    }

    #[test]
    fn empty_dataset_stays_renderable() {
        let model = ready_model(dataset("empty", vec![("x", vec![])]));
        assert_eq!(model.window().range(), 0..0);
        assert!(model.visible_rows().is_empty());
        assert_eq!(model.summaries().len(), 1);
    }
}
