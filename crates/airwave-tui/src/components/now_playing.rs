//! Now-playing panel: station name and the last known track title.

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use airwave_core::session::SessionState;

use crate::theme::Theme;

/// Body line; tolerates a completely empty state.
pub fn body_line(state: &SessionState, theme: &Theme) -> Line<'static> {
    let title = if state.track_title.is_empty() {
        "Fetching…".to_string()
    } else {
        state.track_title.clone()
    };
    let mut spans = Vec::new();
    if state.paused {
        spans.push(Span::styled("⏸ ".to_string(), theme.style_dim()));
    }
    spans.push(Span::styled("♪ ".to_string(), theme.style_accent()));
    spans.push(Span::styled(title, theme.style_text()));
    Line::from(spans)
}

pub fn station_label(state: &SessionState) -> String {
    if state.station_name.is_empty() {
        "Unknown Station".to_string()
    } else {
        state.station_name.clone()
    }
}

pub fn draw(frame: &mut Frame, area: Rect, theme: &Theme, state: &SessionState) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.style_border())
        .title(Span::styled(
            format!(" {} ", station_label(state)),
            theme.style_title(),
        ));
    let paragraph = Paragraph::new(body_line(state, theme))
        .block(block)
        .centered();
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::DARK;

    #[test]
    fn test_placeholders_for_empty_state() {
        let state = SessionState::default();
        assert_eq!(station_label(&state), "Unknown Station");
        let line = body_line(&state, &DARK);
        assert!(line.spans.iter().any(|s| s.content.contains("Fetching…")));
    }

    #[test]
    fn test_pause_marker_prefixes_title() {
        let state = SessionState {
            track_title: "Song A".to_string(),
            paused: true,
            ..SessionState::default()
        };
        let line = body_line(&state, &DARK);
        assert!(line.spans[0].content.contains('⏸'));
        assert!(line.spans.iter().any(|s| s.content == "Song A"));
    }
}
