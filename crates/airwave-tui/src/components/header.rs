//! Session header with an active-recording badge.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::theme::Theme;

pub fn title_line(theme: &Theme, recording: bool) -> Line<'static> {
    let mut spans = vec![Span::styled(
        "((·)) A I R W A V E",
        Style::default().fg(theme.title).add_modifier(Modifier::BOLD),
    )];
    if recording {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            "● REC",
            Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
        ));
    }
    Line::from(spans)
}

pub fn draw(frame: &mut Frame, area: Rect, theme: &Theme, recording: bool) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.style_border());
    let paragraph = Paragraph::new(title_line(theme, recording))
        .block(block)
        .centered();
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::DARK;

    #[test]
    fn test_rec_badge_only_while_recording() {
        let idle = title_line(&DARK, false);
        let busy = title_line(&DARK, true);
        assert_eq!(idle.spans.len(), 1);
        assert!(busy.spans.iter().any(|s| s.content.contains("REC")));
    }
}
