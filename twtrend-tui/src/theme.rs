//! Colour tokens for the twtrend TUI.
//!
//! Dark background, cyan accent. Price moves follow the Taiwan board
//! convention: a rise is red, a fall is green.

use ratatui::style::{Color, Modifier, Style};

pub const ACCENT: Color = Color::Rgb(0, 215, 255);
pub const RISE: Color = Color::Rgb(255, 75, 75);
pub const FALL: Color = Color::Rgb(0, 200, 110);
pub const WARNING: Color = Color::Rgb(255, 165, 0);
pub const ERROR: Color = Color::Rgb(255, 20, 147);
pub const MUTED: Color = Color::Rgb(120, 140, 170);
pub const TEXT: Color = Color::White;

/// Line colours for chart series, cycled by column index.
pub const SERIES: [Color; 8] = [
    Color::Rgb(0, 215, 255),
    Color::Rgb(255, 165, 0),
    Color::Rgb(180, 130, 255),
    Color::Rgb(255, 105, 180),
    Color::Rgb(130, 220, 90),
    Color::Rgb(255, 230, 80),
    Color::Rgb(100, 160, 255),
    Color::Rgb(200, 200, 200),
];

/// Colour of a signed change. Unchanged is plain text.
pub fn change_color(change: f64) -> Color {
    if change > 0.0 {
        RISE
    } else if change < 0.0 {
        FALL
    } else {
        TEXT
    }
}

pub fn series_color(index: usize) -> Color {
    SERIES[index % SERIES.len()]
}

pub fn accent() -> Style {
    Style::default().fg(ACCENT)
}

pub fn accent_bold() -> Style {
    accent().add_modifier(Modifier::BOLD)
}

pub fn muted() -> Style {
    Style::default().fg(MUTED)
}

pub fn text() -> Style {
    Style::default().fg(TEXT)
}

pub fn warning() -> Style {
    Style::default().fg(WARNING)
}

pub fn error() -> Style {
    Style::default().fg(ERROR)
}

pub fn change(change: f64) -> Style {
    Style::default().fg(change_color(change))
}

pub fn header() -> Style {
    accent_bold()
}

pub fn panel_border(active: bool) -> Style {
    if active {
        accent()
    } else {
        muted()
    }
}

pub fn panel_title(active: bool) -> Style {
    if active {
        accent_bold()
    } else {
        muted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rise_is_red_and_fall_is_green() {
        assert_eq!(change_color(1.5), RISE);
        assert_eq!(change_color(-0.01), FALL);
        assert_eq!(change_color(0.0), TEXT);
    }

    #[test]
    fn series_colours_cycle() {
        assert_eq!(series_color(0), series_color(SERIES.len()));
        assert_ne!(series_color(0), series_color(1));
    }
}
