//! Info panel: free-form lines or a small table, never both.

use ratatui::{
    layout::{Constraint, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use airwave_core::session::InfoContent;

use crate::components::truncate_width;
use crate::theme::Theme;

pub fn text_lines(lines: &[String], theme: &Theme, width: usize) -> Vec<Line<'static>> {
    lines
        .iter()
        .map(|l| Line::from(Span::styled(truncate_width(l, width), theme.style_text())))
        .collect()
}

pub fn draw(frame: &mut Frame, area: Rect, theme: &Theme, info: &InfoContent) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.style_border())
        .title(Span::styled(" Info ", theme.style_title()));
    let inner_width = area.width.saturating_sub(2) as usize;

    match info {
        InfoContent::Empty => {
            frame.render_widget(Paragraph::new("").block(block), area);
        }
        InfoContent::Lines(lines) => {
            let paragraph = Paragraph::new(text_lines(lines, theme, inner_width)).block(block);
            frame.render_widget(paragraph, area);
        }
        InfoContent::Table { headers, rows } => {
            let columns = headers.len().max(1);
            let widths =
                vec![Constraint::Percentage((100 / columns as u16).max(1)); columns];
            let header_row = Row::new(
                headers
                    .iter()
                    .map(|h| Cell::from(Span::styled(h.clone(), theme.style_title()))),
            );
            let body = rows.iter().map(|cells| {
                Row::new(
                    cells
                        .iter()
                        .map(|c| Cell::from(Span::styled(c.clone(), theme.style_text()))),
                )
            });
            let table = Table::new(body, widths).header(header_row).block(block);
            frame.render_widget(table, area);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::DARK;

    #[test]
    fn test_lines_are_clipped_to_panel_width() {
        let lines = vec!["a long line that will not fit".to_string()];
        let built = text_lines(&lines, &DARK, 6);
        assert_eq!(built[0].spans[0].content, "a long");
    }
}
