/// Viewport geometry threaded in explicitly by the rendering layer. No
/// ambient window/DOM lookups inside the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewportMetrics {
    pub height_px: u32,
    pub scroll_top_px: u64,
}

/// The slice of rows that must be materialized for the current scroll
/// position, plus the pixel math that keeps the scroll space of the
/// non-materialized rows intact.
///
/// Recomputed on mount, every scroll tick and (throttled) resize. The
/// computation is O(1) in the total row count, which is what makes grids of
/// tens of thousands of rows cheap to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowWindow {
    pub first_visible: usize,
    pub visible_count: usize,
    pub row_height: u32,
    pub total_rows: usize,
}

impl RowWindow {
    pub fn empty(row_height: u32) -> Self {
        RowWindow {
            first_visible: 0,
            visible_count: 0,
            row_height,
            total_rows: 0,
        }
    }

    pub fn compute(total_rows: usize, row_height: u32, viewport: ViewportMetrics) -> Self {
        // A zero-height viewport (mid-resize) and an empty grid are both
        // valid, the window is simply empty.
        if total_rows == 0 || row_height == 0 || viewport.height_px == 0 {
            return RowWindow {
                total_rows,
                ..RowWindow::empty(row_height)
            };
        }

        let rh = row_height as u64;
        let first = ((viewport.scroll_top_px / rh) as usize).min(total_rows);
        let bottom_px = viewport.scroll_top_px.saturating_add(viewport.height_px as u64);
        let last = (bottom_px.div_ceil(rh) as usize).min(total_rows);

        RowWindow {
            first_visible: first,
            visible_count: last.saturating_sub(first),
            row_height,
            total_rows,
        }
    }

    /// Row indices to materialize, always within `[0, total_rows)`.
    pub fn range(&self) -> std::ops::Range<usize> {
        self.first_visible..self.first_visible + self.visible_count
    }

    /// Pixels of scroll space occupied by the rows above the window.
    pub fn leading_offset_px(&self) -> u64 {
        self.first_visible as u64 * self.row_height as u64
    }

    /// Full height of the virtual grid.
    pub fn total_height_px(&self) -> u64 {
        self.total_rows as u64 * self.row_height as u64
    }

    /// Largest useful scroll offset for the given viewport: scrolling past it
    /// would only show blank space below the last row.
    pub fn max_scroll_top(total_rows: usize, row_height: u32, height_px: u32) -> u64 {
        let total = total_rows as u64 * row_height as u64;
        total.saturating_sub(height_px as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport(height_px: u32, scroll_top_px: u64) -> ViewportMetrics {
        ViewportMetrics {
            height_px,
            scroll_top_px,
        }
    }

    #[test]
    fn empty_grid_yields_an_empty_window() {
        let w = RowWindow::compute(0, 75, viewport(600, 0));
        assert_eq!(w.range(), 0..0);
        assert_eq!(w.total_height_px(), 0);
    }

    #[test]
    fn zero_height_viewport_is_valid() {
        let w = RowWindow::compute(1000, 75, viewport(0, 300));
        assert_eq!(w.visible_count, 0);
    }

    #[test]
    fn window_never_exceeds_the_row_range() {
        let total = 50_000;
        for scroll in [0u64, 74, 75, 76, 1_000_000, u64::MAX / 2, u64::MAX] {
            let w = RowWindow::compute(total, 75, viewport(600, scroll));
            assert!(w.range().end <= total);
        }
    }

    #[test]
    fn viewport_taller_than_content_shows_everything() {
        let w = RowWindow::compute(5, 75, viewport(1000, 0));
        assert_eq!(w.range(), 0..5);
    }

    #[test]
    fn scrolling_advances_the_first_visible_row() {
        let w = RowWindow::compute(10_000, 75, viewport(600, 750));
        assert_eq!(w.first_visible, 10);
        // 600px / 75px = 8 fully visible rows.
        assert_eq!(w.visible_count, 8);
        assert_eq!(w.leading_offset_px(), 750);
    }

    #[test]
    fn partially_visible_edge_rows_are_materialized() {
        // Scrolled mid-row: the clipped row at the top and at the bottom both
        // need to be rendered.
        let w = RowWindow::compute(10_000, 75, viewport(600, 740));
        assert_eq!(w.first_visible, 9);
        assert_eq!(w.range().end, 18);
    }

    #[test]
    fn terminal_grid_uses_unit_row_height() {
        let w = RowWindow::compute(200, 1, viewport(40, 12));
        assert_eq!(w.range(), 12..52);
    }

    #[test]
    fn max_scroll_stops_at_the_last_page() {
        assert_eq!(RowWindow::max_scroll_top(100, 75, 600), 100 * 75 - 600);
        assert_eq!(RowWindow::max_scroll_top(5, 75, 600), 0);
    }
}
