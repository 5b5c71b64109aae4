use ratatui::style::{Color, Modifier, Style};

use crate::model::ScripType;

pub const TEXT: Color = Color::Gray;
pub const MUTED: Color = Color::DarkGray;
pub const ACCENT: Color = Color::Cyan;
pub const GOOD_DEAL_BG: Color = Color::Rgb(22, 70, 40);

pub fn title_style() -> Style {
    Style::default().fg(ACCENT)
}

pub fn header_style() -> Style {
    Style::default().fg(MUTED).add_modifier(Modifier::BOLD)
}

pub fn value_style() -> Style {
    Style::default().fg(Color::White)
}

pub fn error_style() -> Style {
    Style::default().fg(Color::Red)
}

pub fn selected_style() -> Style {
    Style::default()
        .fg(Color::Black)
        .bg(ACCENT)
        .add_modifier(Modifier::BOLD)
}

pub fn highlighted_row_style() -> Style {
    Style::default().fg(Color::LightGreen).bg(GOOD_DEAL_BG)
}

/// Maps the colour hint of a materia group to a terminal colour.
pub fn stat_color(hint: Option<&str>) -> Color {
    match hint.map(|h| h.trim().to_ascii_lowercase()) {
        Some(h) if h == "red" => Color::LightRed,
        Some(h) if h == "purple" => Color::LightMagenta,
        Some(h) if h == "yellow" => Color::Yellow,
        Some(h) if h == "blue" => Color::LightBlue,
        Some(h) if h == "green" => Color::LightGreen,
        Some(h) => parse_hex(&h).unwrap_or(TEXT),
        None => TEXT,
    }
}

pub fn scrip_style(scrip: Option<&ScripType>) -> Style {
    match scrip {
        Some(ScripType::Orange) => Style::default().fg(Color::Rgb(255, 165, 0)),
        Some(ScripType::Purple) => Style::default().fg(Color::Magenta),
        _ => Style::default().fg(MUTED),
    }
}

fn parse_hex(hint: &str) -> Option<Color> {
    let hex = hint.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(hex.get(range)?, 16).ok();
    Some(Color::Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}
