//! Bottom hint bar with the key legend.

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::theme::Theme;

pub fn draw(frame: &mut Frame, area: Rect, theme: &Theme, hints: &str) {
    let line = Line::from(vec![
        Span::styled(" Keys: ", theme.style_dim()),
        Span::styled(hints.to_string(), theme.style_dim()),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}
