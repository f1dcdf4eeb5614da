//! Named color palettes for the dashboard.

use ratatui::style::{Color, Modifier, Style};

/// A selectable palette. Slots are named by role; components never hardcode
/// colors outside the meter tiers below.
#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub name: &'static str,
    pub border: Color,
    pub title: Color,
    pub text: Color,
    pub accent: Color,
    pub dim: Color,
}

pub const DARK: Theme = Theme {
    name: "dark",
    border: Color::Rgb(40, 40, 52),
    title: Color::Rgb(210, 210, 225),
    text: Color::Rgb(210, 210, 225),
    accent: Color::Rgb(255, 95, 95),
    dim: Color::Rgb(115, 115, 138),
};

pub const CLASSIC: Theme = Theme {
    name: "classic",
    border: Color::Rgb(80, 140, 200),
    title: Color::Rgb(230, 230, 240),
    text: Color::Rgb(200, 205, 215),
    accent: Color::Rgb(255, 184, 80),
    dim: Color::Rgb(110, 120, 140),
};

// Commodore 64 inspired palette (approximate).
pub const C64: Theme = Theme {
    name: "c64",
    border: Color::Rgb(184, 163, 255),
    title: Color::Rgb(224, 215, 255),
    text: Color::Rgb(199, 184, 255),
    accent: Color::Rgb(224, 215, 255),
    dim: Color::Rgb(120, 104, 200),
};

pub const MATRIX: Theme = Theme {
    name: "matrix",
    border: Color::Rgb(0, 120, 40),
    title: Color::Rgb(130, 255, 160),
    text: Color::Rgb(80, 200, 120),
    accent: Color::Rgb(200, 255, 200),
    dim: Color::Rgb(40, 120, 70),
};

pub const THEMES: &[Theme] = &[DARK, CLASSIC, C64, MATRIX];

pub fn by_name(name: &str) -> &'static Theme {
    THEMES
        .iter()
        .find(|t| t.name.eq_ignore_ascii_case(name.trim()))
        .unwrap_or(&THEMES[0])
}

impl Theme {
    pub fn style_text(&self) -> Style {
        Style::default().fg(self.text)
    }

    pub fn style_title(&self) -> Style {
        Style::default().fg(self.title).add_modifier(Modifier::BOLD)
    }

    pub fn style_border(&self) -> Style {
        Style::default().fg(self.border)
    }

    pub fn style_dim(&self) -> Style {
        Style::default().fg(self.dim)
    }

    pub fn style_accent(&self) -> Style {
        Style::default().fg(self.accent)
    }
}

// ── Meter tier colors ─────────────────────────────────────────────────────────
//
// Fixed row→color mapping, independent of the selected theme: low rows
// green, mid rows amber, top rows red.

const METER_LOW: Color = Color::Rgb(80, 200, 120);
const METER_MID: Color = Color::Rgb(255, 200, 80);
const METER_HIGH: Color = Color::Rgb(255, 95, 95);

pub fn meter_tier_color(row: u8, max_height: u8) -> Color {
    let frac = f32::from(row) / f32::from(max_height.max(1));
    if frac <= 0.5 {
        METER_LOW
    } else if frac <= 0.8 {
        METER_MID
    } else {
        METER_HIGH
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_by_name_falls_back_to_dark() {
        assert_eq!(by_name("c64").name, "c64");
        assert_eq!(by_name("C64").name, "c64");
        assert_eq!(by_name("no-such-theme").name, "dark");
    }

    #[test]
    fn test_meter_tiers_ordered_green_to_red() {
        assert_eq!(meter_tier_color(1, 10), METER_LOW);
        assert_eq!(meter_tier_color(5, 10), METER_LOW);
        assert_eq!(meter_tier_color(7, 10), METER_MID);
        assert_eq!(meter_tier_color(10, 10), METER_HIGH);
    }
}
