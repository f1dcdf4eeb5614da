//! Modal input modes.
//!
//! The dispatcher switches on an explicit mode machine instead of nesting
//! blocking read loops: while a modal mode is active it owns every key, and
//! `input_active` is held on the session for exactly that span.

use std::time::{Duration, Instant};

use ratatui::crossterm::event::{KeyCode, KeyEvent};
use tui_input::{backend::crossterm::EventHandler, Input};

/// What the dispatcher does with a finished quick-pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickPurpose {
    Station,
    Theme,
}

/// What the dispatcher does with an accepted text entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextPurpose {
    RecordFilename,
    FavoriteName,
}

pub enum Mode {
    Normal,
    QuickPick(QuickPick),
    TextInput(TextEntry),
}

impl Mode {
    pub fn is_modal(&self) -> bool {
        !matches!(self, Mode::Normal)
    }
}

// ── Quick-pick ────────────────────────────────────────────────────────────────

#[derive(Debug, PartialEq)]
pub enum PickOutcome {
    Pending,
    /// Selection finished: `Some(zero-based index)` or `None` for no selection.
    Done(Option<usize>),
}

/// Numeric quick-pick over a 1-based displayed list.
///
/// Digits accumulate into a buffer. A single digit finalizes immediately
/// when one digit is enough to address the whole list; otherwise input
/// finalizes on Enter or once `timeout` has elapsed since the last digit.
/// Escape or `q` cancels and discards the buffer.
pub struct QuickPick {
    pub purpose: PickPurpose,
    max_index: usize,
    timeout: Duration,
    buffer: String,
    last_digit_at: Instant,
}

impl QuickPick {
    pub fn new(purpose: PickPurpose, max_index: usize, timeout: Duration, now: Instant) -> Self {
        Self {
            purpose,
            max_index,
            timeout,
            buffer: String::new(),
            last_digit_at: now,
        }
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn on_key(&mut self, code: KeyCode, now: Instant) -> PickOutcome {
        match code {
            KeyCode::Esc => PickOutcome::Done(None),
            KeyCode::Char('q') | KeyCode::Char('Q') => PickOutcome::Done(None),
            KeyCode::Enter => PickOutcome::Done(self.finalize()),
            KeyCode::Char(c) if c.is_ascii_digit() => {
                if self.buffer.is_empty() && c == '0' {
                    // A list index never starts with 0.
                    return PickOutcome::Pending;
                }
                self.buffer.push(c);
                self.last_digit_at = now;
                if self.max_index <= 9 {
                    return PickOutcome::Done(self.finalize());
                }
                PickOutcome::Pending
            }
            _ => PickOutcome::Pending,
        }
    }

    /// Idle-timeout check; call at render cadence.
    pub fn on_tick(&mut self, now: Instant) -> PickOutcome {
        if !self.buffer.is_empty() && now.duration_since(self.last_digit_at) >= self.timeout {
            return PickOutcome::Done(self.finalize());
        }
        PickOutcome::Pending
    }

    fn finalize(&self) -> Option<usize> {
        let chosen: usize = self.buffer.parse().ok()?;
        if (1..=self.max_index).contains(&chosen) {
            Some(chosen - 1)
        } else {
            None
        }
    }
}

// ── Text entry ────────────────────────────────────────────────────────────────

#[derive(Debug, PartialEq)]
pub enum TextOutcome {
    Pending,
    Accepted(String),
    Cancelled,
}

/// Single-key line editor rendered live into the info panel.
pub struct TextEntry {
    pub purpose: TextPurpose,
    pub prompt: String,
    input: Input,
}

impl TextEntry {
    pub fn new(purpose: TextPurpose, prompt: impl Into<String>, initial: &str) -> Self {
        Self {
            purpose,
            prompt: prompt.into(),
            input: Input::new(initial.to_string()),
        }
    }

    pub fn value(&self) -> &str {
        self.input.value()
    }

    pub fn on_key(&mut self, key: KeyEvent) -> TextOutcome {
        match key.code {
            KeyCode::Enter => TextOutcome::Accepted(self.input.value().to_string()),
            KeyCode::Esc => TextOutcome::Cancelled,
            KeyCode::Char(c) if c.is_control() => TextOutcome::Pending,
            _ => {
                self.input
                    .handle_event(&ratatui::crossterm::event::Event::Key(key));
                TextOutcome::Pending
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::{KeyEventKind, KeyEventState, KeyModifiers};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn pick(max_index: usize) -> (QuickPick, Instant) {
        let now = Instant::now();
        (
            QuickPick::new(
                PickPurpose::Station,
                max_index,
                Duration::from_millis(700),
                now,
            ),
            now,
        )
    }

    #[test]
    fn test_single_digit_finalizes_immediately_when_list_fits() {
        let (mut qp, now) = pick(9);
        assert_eq!(qp.on_key(KeyCode::Char('3'), now), PickOutcome::Done(Some(2)));
    }

    #[test]
    fn test_two_digits_within_window_select_twelve() {
        let (mut qp, now) = pick(15);
        assert_eq!(qp.on_key(KeyCode::Char('1'), now), PickOutcome::Pending);
        let later = now + Duration::from_millis(300);
        assert_eq!(qp.on_key(KeyCode::Char('2'), later), PickOutcome::Pending);
        // Still inside the window: nothing finalizes yet.
        assert_eq!(
            qp.on_tick(later + Duration::from_millis(300)),
            PickOutcome::Pending
        );
        assert_eq!(
            qp.on_tick(later + Duration::from_millis(700)),
            PickOutcome::Done(Some(11))
        );
    }

    #[test]
    fn test_single_digit_times_out_to_first_entry() {
        let (mut qp, now) = pick(15);
        assert_eq!(qp.on_key(KeyCode::Char('1'), now), PickOutcome::Pending);
        assert_eq!(
            qp.on_tick(now + Duration::from_millis(701)),
            PickOutcome::Done(Some(0))
        );
    }

    #[test]
    fn test_enter_finalizes_early() {
        let (mut qp, now) = pick(15);
        qp.on_key(KeyCode::Char('1'), now);
        qp.on_key(KeyCode::Char('2'), now);
        assert_eq!(qp.on_key(KeyCode::Enter, now), PickOutcome::Done(Some(11)));
    }

    #[test]
    fn test_escape_and_q_cancel_discarding_buffer() {
        let (mut qp, now) = pick(15);
        qp.on_key(KeyCode::Char('1'), now);
        assert_eq!(qp.on_key(KeyCode::Esc, now), PickOutcome::Done(None));

        let (mut qp, now) = pick(15);
        qp.on_key(KeyCode::Char('1'), now);
        assert_eq!(qp.on_key(KeyCode::Char('q'), now), PickOutcome::Done(None));
    }

    #[test]
    fn test_leading_zero_is_never_accepted() {
        let (mut qp, now) = pick(15);
        assert_eq!(qp.on_key(KeyCode::Char('0'), now), PickOutcome::Pending);
        assert_eq!(qp.buffer(), "");
        // With an empty buffer the timeout never fires.
        assert_eq!(
            qp.on_tick(now + Duration::from_secs(10)),
            PickOutcome::Pending
        );
        // But a zero after a first digit is a normal digit.
        qp.on_key(KeyCode::Char('1'), now);
        qp.on_key(KeyCode::Char('0'), now);
        assert_eq!(qp.on_key(KeyCode::Enter, now), PickOutcome::Done(Some(9)));
    }

    #[test]
    fn test_out_of_range_input_is_no_selection() {
        let (mut qp, now) = pick(12);
        qp.on_key(KeyCode::Char('1'), now);
        qp.on_key(KeyCode::Char('4'), now);
        assert_eq!(qp.on_key(KeyCode::Enter, now), PickOutcome::Done(None));
    }

    #[test]
    fn test_text_entry_edits_and_accepts() {
        let mut entry = TextEntry::new(TextPurpose::RecordFilename, "Filename: ", "");
        entry.on_key(key(KeyCode::Char('a')));
        entry.on_key(key(KeyCode::Char('b')));
        entry.on_key(key(KeyCode::Char('c')));
        entry.on_key(key(KeyCode::Backspace));
        assert_eq!(entry.value(), "ab");
        assert_eq!(
            entry.on_key(key(KeyCode::Enter)),
            TextOutcome::Accepted("ab".to_string())
        );
    }

    #[test]
    fn test_text_entry_ignores_control_chars_and_cancels_on_escape() {
        let mut entry = TextEntry::new(TextPurpose::FavoriteName, "Name: ", "seed");
        assert_eq!(entry.on_key(key(KeyCode::Char('\u{7}'))), TextOutcome::Pending);
        assert_eq!(entry.value(), "seed");
        assert_eq!(entry.on_key(key(KeyCode::Esc)), TextOutcome::Cancelled);
    }
}
