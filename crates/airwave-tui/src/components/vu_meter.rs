//! Stacked-column level meter.
//!
//! Columns are drawn from the maximum height down to row 1: a column's cell
//! at row `r` is filled when its height ≥ `r`. Fill colors follow the fixed
//! row→tier mapping (green low, amber mid, red high) regardless of the
//! selected theme; a baseline rule closes the meter underneath.

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::theme::{meter_tier_color, Theme};

const CELL_FILLED: &str = "▮ ";
const CELL_EMPTY: &str = "· ";

/// Build the meter rows, top row first, baseline last.
pub fn meter_lines(heights: &[u8], max_height: u8, theme: &Theme) -> Vec<Line<'static>> {
    let mut lines = Vec::with_capacity(usize::from(max_height) + 1);
    for row in (1..=max_height).rev() {
        let tier = meter_tier_color(row, max_height);
        let spans = heights
            .iter()
            .map(|&h| {
                if h >= row {
                    Span::styled(CELL_FILLED, ratatui::style::Style::default().fg(tier))
                } else {
                    Span::styled(CELL_EMPTY, theme.style_dim())
                }
            })
            .collect::<Vec<_>>();
        lines.push(Line::from(spans));
    }
    lines.push(Line::from(Span::styled(
        "─".repeat(heights.len() * 2),
        theme.style_border(),
    )));
    lines
}

pub fn draw(frame: &mut Frame, area: Rect, theme: &Theme, heights: &[u8], max_height: u8) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let paragraph = Paragraph::new(meter_lines(heights, max_height, theme)).centered();
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::DARK;

    fn filled_cells(line: &Line<'_>) -> Vec<bool> {
        line.spans.iter().map(|s| s.content == CELL_FILLED).collect()
    }

    #[test]
    fn test_row_count_is_max_height_plus_baseline() {
        let lines = meter_lines(&[1, 5, 10], 10, &DARK);
        assert_eq!(lines.len(), 11);
    }

    #[test]
    fn test_cell_filled_iff_height_reaches_row() {
        let heights = [1u8, 5, 10];
        let lines = meter_lines(&heights, 10, &DARK);
        // Top row (row 10): only the full column is lit.
        assert_eq!(filled_cells(&lines[0]), vec![false, false, true]);
        // Row 5: the middle and full columns.
        assert_eq!(filled_cells(&lines[5]), vec![false, true, true]);
        // Bottom row (row 1): everything ≥ 1.
        assert_eq!(filled_cells(&lines[9]), vec![true, true, true]);
    }

    #[test]
    fn test_baseline_spans_all_columns() {
        let lines = meter_lines(&[2, 2, 2, 2], 10, &DARK);
        let baseline = &lines[10].spans[0].content;
        assert_eq!(baseline.chars().count(), 8);
        assert!(baseline.chars().all(|c| c == '─'));
    }
}
