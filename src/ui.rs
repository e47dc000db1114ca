use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Clear, Paragraph, Sparkline},
};

use crate::domain::HELP_TEXT;
use crate::model::{HeaderCell, Model, Status};
use crate::sort::SortOrder;

pub const TITLE_HEIGHT: usize = 1;
pub const TABLE_HEADER_HEIGHT: usize = 1;
pub const STATUSLINE_HEIGHT: usize = 1;
/// Tallest summary variant (numeric: min/max/mean/stdDev/nullCount).
pub const SUMMARY_STAT_LINES: usize = 5;
/// Summary lines plus one histogram strip.
pub const SUMMARY_BLOCK_HEIGHT: usize = SUMMARY_STAT_LINES + 1;
pub const COLUMN_WIDTH_MARGIN: usize = 2;
pub const COLUMN_SPACING: usize = 1;

/// Render the full view. Pure presentation: every value shown here comes out
/// of the model's rendering-boundary accessors.
pub fn draw(model: &Model, frame: &mut Frame) {
    let area = frame.area();
    let summary_height = model.layout().summary_height;
    let [title_area, header_area, summary_area, table_area, status_area] =
        Layout::vertical([
            Constraint::Length(TITLE_HEIGHT as u16),
            Constraint::Length(TABLE_HEADER_HEIGHT as u16),
            Constraint::Length(summary_height as u16),
            Constraint::Min(0),
            Constraint::Length(STATUSLINE_HEIGHT as u16),
        ])
        .areas(area);

    let headers = model.headers();
    draw_title(model, frame, title_area);
    draw_header(&headers, frame, header_area);
    if summary_height > 0 {
        draw_summaries(model, &headers, frame, summary_area);
    }
    draw_rows(model, &headers, frame, table_area);
    draw_status(model, frame, status_area);
    if model.show_help() {
        draw_help(frame, area);
    }
}

fn pad(text: &str, width: usize) -> String {
    let truncated: String = text.chars().take(width).collect();
    format!("{truncated:<width$}")
}

fn draw_title(model: &Model, frame: &mut Frame, area: Rect) {
    let mut spans = vec![Span::from(" tably ").bold()];
    if let Some(name) = model.dataset_name() {
        spans.push(Span::from(name).yellow());
    }
    if model.catalog().len() > 1 {
        let entry = &model.catalog()[model.selected_entry()];
        spans.push(Span::from(format!(
            "  [{}/{} {}]",
            model.selected_entry() + 1,
            model.catalog().len(),
            entry.name
        )));
    }
    frame.render_widget(Line::from(spans), area);
}

fn draw_header(headers: &[HeaderCell], frame: &mut Frame, area: Rect) {
    let mut spans = Vec::with_capacity(headers.len() * 2);
    for header in headers {
        let indicator = match header.sort {
            Some(SortOrder::Ascending) => "▲",
            Some(SortOrder::Descending) => "▼",
            None => " ",
        };
        let label = pad(
            &format!("{}{indicator}", header.label),
            header.width,
        );
        let span = if header.selected {
            Span::from(label).bold().reversed()
        } else {
            Span::from(label).bold()
        };
        spans.push(span);
        spans.push(Span::from(" ".repeat(COLUMN_SPACING)));
    }
    frame.render_widget(Line::from(spans), area);
}

fn draw_summaries(model: &Model, headers: &[HeaderCell], frame: &mut Frame, area: Rect) {
    let mut x = area.x;
    for header in headers {
        let width = (header.width as u16).min(area.right().saturating_sub(x));
        if width == 0 {
            break;
        }
        let column_area = Rect::new(x, area.y, width, area.height);
        if let Some(summary) = model.summaries().get(header.column) {
            let lines: Vec<Line> = summary
                .summary_lines()
                .into_iter()
                .map(|(label, value)| Line::from(format!("{label}: {value}")).dim())
                .collect();
            let stats_area = Rect {
                height: column_area.height.saturating_sub(1),
                ..column_area
            };
            frame.render_widget(Paragraph::new(lines), stats_area);

            let bins = model.histogram_for(header.column);
            if !bins.is_empty() && column_area.height > SUMMARY_STAT_LINES as u16 {
                let counts: Vec<u64> = bins.iter().map(|b| b.count as u64).collect();
                let spark_area = Rect::new(x, area.y + SUMMARY_STAT_LINES as u16, width, 1);
                frame.render_widget(Sparkline::default().data(&counts), spark_area);
            }
        }

        x += header.width as u16 + COLUMN_SPACING as u16;
        if x >= area.right() {
            break;
        }
    }
}

fn draw_rows(model: &Model, headers: &[HeaderCell], frame: &mut Frame, area: Rect) {
    let lines: Vec<Line> = model
        .visible_rows()
        .into_iter()
        .map(|(abs_row, cells)| {
            let mut spans = Vec::with_capacity(cells.len() * 2);
            for (cell, header) in cells.iter().zip(headers) {
                spans.push(Span::from(pad(cell, header.width)));
                spans.push(Span::from(" ".repeat(COLUMN_SPACING)));
            }
            let line = Line::from(spans);
            // Zebra striping by absolute row, stable under sorting.
            if abs_row % 2 == 1 { line.dim() } else { line }
        })
        .collect();
    frame.render_widget(Text::from(lines), area);
}

fn draw_status(model: &Model, frame: &mut Frame, area: Rect) {
    let line = if model.load_failed() {
        let detail = model.load_error().unwrap_or("unknown error");
        Line::from(vec![
            Span::from(format!(" Load failed: {detail} ")).red(),
            Span::from("(r to retry)"),
        ])
    } else {
        let loading = if model.status == Status::Loading {
            " [loading]"
        } else {
            ""
        };
        Line::from(format!(" {}{loading}", model.status_message()))
    };
    frame.render_widget(line, area);
}

fn draw_help(frame: &mut Frame, area: Rect) {
    let width = area.width.min(44);
    let height = area.height.min(18);
    let popup = Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    );
    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(HELP_TEXT)
            .block(Block::bordered().title(Line::from(" Help ").centered()))
            .style(Style::new()),
        popup,
    );
}
