//! Frame builders. Pure given a state snapshot; layout order is the
//! user-facing contract: header, now-playing, info, level meter, hint bar.

pub mod header;
pub mod info_panel;
pub mod keys_bar;
pub mod now_playing;
pub mod vu_meter;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::Frame;
use unicode_width::UnicodeWidthChar;

use airwave_core::session::SessionState;

use crate::meter::LEVEL_MAX;
use crate::theme::Theme;

pub struct FrameAreas {
    pub header: Rect,
    pub now_playing: Rect,
    pub info: Rect,
    pub meter: Rect,
    pub hints: Rect,
}

pub fn compute_layout(area: Rect, meter_visible: bool) -> FrameAreas {
    let meter_height = if meter_visible {
        u16::from(LEVEL_MAX) + 1 // rows plus the baseline rule
    } else {
        0
    };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(6),
            Constraint::Length(meter_height),
            Constraint::Length(1),
        ])
        .split(area);
    FrameAreas {
        header: chunks[0],
        now_playing: chunks[1],
        info: chunks[2],
        meter: chunks[3],
        hints: chunks[4],
    }
}

/// Draw the whole dashboard from a state snapshot.
pub fn draw_dashboard(frame: &mut Frame, state: &SessionState, theme: &Theme, bars: &[u8]) {
    let areas = compute_layout(frame.area(), state.meter_visible);
    header::draw(frame, areas.header, theme, state.recording_path.is_some());
    now_playing::draw(frame, areas.now_playing, theme, state);
    info_panel::draw(frame, areas.info, theme, &state.info);
    if state.meter_visible {
        vu_meter::draw(frame, areas.meter, theme, bars, LEVEL_MAX);
    }
    keys_bar::draw(frame, areas.hints, theme, &state.hints);
}

/// Clip a string to a display width, unicode-aware.
pub fn truncate_width(s: &str, max_width: usize) -> String {
    let mut width = 0;
    let mut out = String::new();
    for ch in s.chars() {
        let w = ch.width().unwrap_or(0);
        if width + w > max_width {
            break;
        }
        width += w;
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_preserves_component_order() {
        let areas = compute_layout(Rect::new(0, 0, 80, 40), true);
        assert!(areas.header.y < areas.now_playing.y);
        assert!(areas.now_playing.y < areas.info.y);
        assert!(areas.info.y < areas.meter.y);
        assert!(areas.meter.y < areas.hints.y);
        assert_eq!(areas.meter.height, u16::from(LEVEL_MAX) + 1);
    }

    #[test]
    fn test_hidden_meter_collapses_to_zero_rows() {
        let areas = compute_layout(Rect::new(0, 0, 80, 40), false);
        assert_eq!(areas.meter.height, 0);
    }

    #[test]
    fn test_truncate_width_is_unicode_aware() {
        assert_eq!(truncate_width("hello", 10), "hello");
        assert_eq!(truncate_width("hello", 3), "hel");
        // CJK chars are two columns wide.
        assert_eq!(truncate_width("音楽ラジオ", 5), "音楽");
    }
}
