use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap};
use ratatui::Frame;

use crate::market::{SortKey, StatColumn, THRESHOLD_MAX, THRESHOLD_MIN};
use crate::model::{format_gil, AppSnapshot, Focus, SettingsField};
use crate::nav::market_url;
use crate::theme::{
    error_style, header_style, highlighted_row_style, scrip_style, selected_style, stat_color,
    title_style, value_style, MUTED, TEXT,
};

const COLUMNS_PER_ROW: usize = 2;

pub fn draw(f: &mut Frame, s: &AppSnapshot) {
    let area = f.size();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(area);

    draw_header(f, chunks[0], s);
    draw_stat_bar(f, chunks[1], s);
    draw_tables(f, chunks[2], s);
    draw_footer(f, chunks[3], s);

    if s.show_listings {
        draw_listings_overlay(f, area, s);
    }
    if s.show_settings {
        draw_settings_overlay(f, area, s);
    }
    if s.timing.visible {
        draw_timing_overlay(f, area, s);
    }
    if let Some(input) = &s.world_input {
        draw_world_prompt(f, area, input);
    }
}

fn draw_header(f: &mut Frame, area: Rect, s: &AppSnapshot) {
    let status = if s.loading {
        let target = s.pending_world.as_deref().unwrap_or(&s.world);
        Span::styled(format!("Loading {target}…"), Style::default().fg(TEXT))
    } else if let Some(err) = &s.last_error {
        Span::styled(err.to_string(), error_style())
    } else if let Some(updated) = s.last_updated {
        Span::styled(
            format!(
                "{} items · {} deals · updated {}",
                s.entry_count,
                s.view.highlighted_count(),
                updated.format("%H:%M:%S")
            ),
            Style::default().fg(TEXT),
        )
    } else {
        Span::styled("No data yet", Style::default().fg(MUTED))
    };

    let line = Line::from(vec![
        Span::styled("World ", header_style()),
        Span::styled(s.world.clone(), value_style().add_modifier(Modifier::BOLD)),
        Span::raw("  ·  "),
        Span::styled("Sort ", header_style()),
        Span::styled(
            format!("{} {}", s.view.sort_key.label(), s.view.sort_order.arrow()),
            value_style(),
        ),
        Span::raw("  ·  "),
        Span::styled("Highlight ≤ ", header_style()),
        Span::styled(format!("{}%", s.view.threshold), value_style()),
        Span::raw("  ·  "),
        status,
    ]);

    let block = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .title(Span::styled(
                "Materia Market Board",
                title_style().add_modifier(Modifier::BOLD),
            )),
    );
    f.render_widget(block, area);
}

fn draw_stat_bar(f: &mut Frame, area: Rect, s: &AppSnapshot) {
    let mut spans = Vec::with_capacity(s.view.chips.len() * 2);
    for (idx, chip) in s.view.chips.iter().enumerate() {
        let marker = if chip.selected { "✓" } else { " " };
        let label = format!("[{marker}] {} ({})", chip.stat, chip.count);
        let style = if s.focus == Focus::Stats && idx == s.stat_cursor {
            selected_style()
        } else if chip.selected {
            title_style()
        } else {
            Style::default().fg(MUTED)
        };
        spans.push(Span::styled(label, style));
        spans.push(Span::raw("  "));
    }
    if spans.is_empty() {
        spans.push(Span::styled("No stats discovered", Style::default().fg(MUTED)));
    }

    let title = if s.focus == Focus::Stats {
        "Filter by Stats (Space toggles)"
    } else {
        "Filter by Stats"
    };
    let bar = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(bar, area);
}

fn draw_tables(f: &mut Frame, area: Rect, s: &AppSnapshot) {
    let columns = &s.view.columns;
    if columns.is_empty() {
        let message = if s.loading {
            "Loading materia data…"
        } else if s.all_stats.is_empty() {
            "No materia loaded. Press r to refresh or w to pick a world."
        } else {
            "No stats selected."
        };
        let block = Paragraph::new(message)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(block, area);
        return;
    }

    let grid_rows = columns.len().div_ceil(COLUMNS_PER_ROW);
    let row_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Ratio(1, grid_rows as u32); grid_rows])
        .split(area);

    for (grid_row, row_area) in row_areas.iter().enumerate() {
        let start = grid_row * COLUMNS_PER_ROW;
        let end = (start + COLUMNS_PER_ROW).min(columns.len());
        let count = end - start;
        let cells = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Ratio(1, count as u32); count])
            .split(*row_area);
        for (offset, cell) in cells.iter().enumerate() {
            let index = start + offset;
            draw_stat_table(f, *cell, s, index, &columns[index]);
        }
    }

    if s.loading {
        render_loading_overlay(f, area, "Refreshing…");
    }
}

fn draw_stat_table(f: &mut Frame, area: Rect, s: &AppSnapshot, index: usize, column: &StatColumn) {
    let accent = stat_color(column.color.as_deref());
    let focused = s.focus == Focus::Tables && index == s.column_cursor;

    // One header cell per sort key so every digit shortcut has a visible column.
    let header = Row::new(SortKey::ALL.iter().map(|key| {
        let indicator = s.view.sort_indicator(*key);
        Cell::from(format!("{}{}", key.label(), indicator))
    }))
    .style(header_style());

    let rows: Vec<Row> = column
        .rows
        .iter()
        .map(|row| {
            let entry = &row.entry;
            let style = if row.highlighted {
                highlighted_row_style()
            } else {
                Style::default().fg(TEXT)
            };
            Row::new(vec![
                Cell::from(Span::styled(entry.name.clone(), Style::default().fg(accent))),
                Cell::from(format!("+{}", entry.stat_increase.unwrap_or(0))),
                Cell::from(
                    entry
                        .average_gil
                        .map(format_gil)
                        .unwrap_or_else(|| "N/A".to_string()),
                ),
                Cell::from(Span::styled(
                    entry
                        .scrip_cost
                        .map(|c| c.to_string())
                        .unwrap_or_else(|| "—".to_string()),
                    scrip_style(entry.scrip_type.as_ref()),
                )),
                Cell::from(
                    entry
                        .cheapest()
                        .map(|listing| format_gil(listing.price_gil()))
                        .unwrap_or_else(|| "—".to_string()),
                ),
                Cell::from(entry.total_quantity.to_string()),
                Cell::from(entry.listing_count.to_string()),
                Cell::from(
                    entry
                        .historical_avg
                        .map(format_gil)
                        .unwrap_or_else(|| "N/A".to_string()),
                ),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Min(16),
        Constraint::Length(6),
        Constraint::Length(11),
        Constraint::Length(7),
        Constraint::Length(11),
        Constraint::Length(6),
        Constraint::Length(9),
        Constraint::Length(11),
    ];

    let border_style = if focused {
        Style::default().fg(accent).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(accent)
    };
    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(Span::styled(
                    format!("● {} ({})", column.stat, column.rows.len()),
                    Style::default().fg(accent).add_modifier(Modifier::BOLD),
                )),
        )
        .highlight_style(selected_style());

    let mut state = TableState::default();
    if focused && !column.rows.is_empty() {
        state.select(Some(s.row_cursor));
    }
    f.render_stateful_widget(table, area, &mut state);
}

fn draw_footer(f: &mut Frame, area: Rect, s: &AppSnapshot) {
    let hint = match s.focus {
        Focus::Stats => "←/→ stat · Space toggle · Tab tables · 1-8 sort · w world · r refresh · s settings · t timing · q quit",
        Focus::Tables => "↑/↓ row · ←/→ table · Enter open market · l listings · Tab stats · 1-8 sort · q quit",
    };
    let footer = Paragraph::new(hint).style(Style::default().fg(MUTED));
    f.render_widget(footer, area);
}

fn draw_listings_overlay(f: &mut Frame, area: Rect, s: &AppSnapshot) {
    let popup = centered_rect(area, 60, 16);
    f.render_widget(Clear, popup);

    let Some(row) = s.selected_row() else {
        let block = Paragraph::new("No item selected.")
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title("Listings"));
        f.render_widget(block, popup);
        return;
    };
    let entry = &row.entry;

    let mut lines = vec![
        Line::from(Span::styled(
            entry.name.clone(),
            title_style().add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled("Avg ", header_style()),
            Span::styled(
                entry
                    .average_gil
                    .map(format_gil)
                    .unwrap_or_else(|| "N/A".to_string()),
                value_style(),
            ),
            Span::styled("  Hist ", header_style()),
            Span::styled(
                entry
                    .historical_avg
                    .map(format_gil)
                    .unwrap_or_else(|| "N/A".to_string()),
                value_style(),
            ),
            Span::styled("  Listings ", header_style()),
            Span::styled(entry.listing_count.to_string(), value_style()),
        ]),
        Line::from(Span::styled(market_url(entry.id), Style::default().fg(MUTED))),
        Line::from(""),
    ];
    let listing_lines = entry.listing_lines();
    if listing_lines.is_empty() {
        lines.push(Line::from(Span::styled(
            "No current listings.",
            Style::default().fg(MUTED),
        )));
    } else {
        lines.extend(listing_lines.into_iter().map(Line::from));
    }

    let block = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Cheapest listings (Esc closes)"),
        );
    f.render_widget(block, popup);
}

fn draw_settings_overlay(f: &mut Frame, area: Rect, s: &AppSnapshot) {
    let popup = centered_rect(area, 50, 9);
    f.render_widget(Clear, popup);

    let fields = [
        (
            SettingsField::HighlightThreshold,
            format!(
                "{}% of historical average ({}–{})",
                s.view.threshold, THRESHOLD_MIN, THRESHOLD_MAX
            ),
        ),
        (
            SettingsField::SortColumn,
            s.view.sort_key.label().to_string(),
        ),
        (
            SettingsField::SortDirection,
            s.view.sort_order.label().to_string(),
        ),
    ];

    let mut lines: Vec<Line> = fields
        .into_iter()
        .map(|(field, value)| {
            let style = if field == s.settings_cursor {
                selected_style()
            } else {
                Style::default().fg(TEXT)
            };
            Line::from(vec![
                Span::styled(format!("{:<20}", field.label()), style),
                Span::raw(" ◀ "),
                Span::styled(value, value_style()),
                Span::raw(" ▶"),
            ])
        })
        .collect();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Rows are highlighted when the current price is at or below the threshold.",
        Style::default().fg(MUTED),
    )));

    let block = Paragraph::new(lines).wrap(Wrap { trim: true }).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Settings (↑/↓ select · ←/→ adjust · s closes)"),
    );
    f.render_widget(block, popup);
}

fn draw_timing_overlay(f: &mut Frame, area: Rect, s: &AppSnapshot) {
    let popup = centered_rect(area, 60, 14);
    f.render_widget(Clear, popup);

    let mut lines: Vec<Line> = Vec::new();
    if let Some(err) = &s.timing.error {
        lines.push(Line::from(Span::styled(err.clone(), error_style())));
    }
    for (name, summary) in s.timing.lines() {
        lines.push(Line::from(Span::styled(
            name,
            value_style().add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(Span::styled(summary, Style::default().fg(TEXT))));
    }
    if lines.is_empty() && !s.timing.loading {
        lines.push(Line::from(Span::styled(
            "No timing data recorded.",
            Style::default().fg(MUTED),
        )));
    }

    let block = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title("API Timing (t closes)"),
    );
    f.render_widget(block, popup);
    if s.timing.loading {
        render_loading_overlay(f, popup, "Loading…");
    }
}

fn draw_world_prompt(f: &mut Frame, area: Rect, input: &str) {
    let popup = centered_rect(area, 40, 3);
    f.render_widget(Clear, popup);
    let line = Line::from(vec![
        Span::styled(input.to_string(), value_style()),
        Span::styled("▏", title_style()),
    ]);
    let block = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .title("World (Enter loads · Esc cancels)"),
    );
    f.render_widget(block, popup);
}

fn render_loading_overlay(f: &mut Frame, area: Rect, message: &str) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let text_width = message.chars().count() as u16 + 4;
    let overlay_width = text_width.min(area.width);
    let overlay_height = 3.min(area.height).max(1);
    let x = area.x + (area.width.saturating_sub(overlay_width)) / 2;
    let y = area.y + (area.height.saturating_sub(overlay_height)) / 2;
    let overlay = Rect {
        x,
        y,
        width: overlay_width,
        height: overlay_height,
    };
    f.render_widget(Clear, overlay);
    let block = Paragraph::new(message)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(block, overlay);
}

fn centered_rect(area: Rect, percent_x: u16, height: u16) -> Rect {
    let width = (area.width.saturating_mul(percent_x) / 100).max(20).min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    use crate::errors::{AppError, AppErrorKind};
    use crate::model::{AppEvent, AppSettings, AppState, MateriaEntry};

    use super::*;

    fn loaded_state() -> AppState {
        let mut state = AppState::new(&AppSettings::default());
        let ticket = state.begin_fetch("Aether");
        state.apply(AppEvent::MateriaLoaded {
            request_id: ticket.request_id,
            world: "Aether".into(),
            entries: vec![MateriaEntry {
                id: 41760,
                name: "Craftsman's Command Materia XII".into(),
                stat: "Control".into(),
                stat_increase: Some(36),
                average_gil: Some(12000),
                historical_avg: Some(13000),
                color: Some("Blue".into()),
                ..Default::default()
            }],
        });
        state
    }

    fn render(state: &AppState) -> String {
        let backend = TestBackend::new(140, 30);
        let mut terminal = Terminal::new(backend).expect("terminal");
        let snapshot = state.clone_snapshot();
        terminal.draw(|f| draw(f, &snapshot)).expect("draw");
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect::<String>()
    }

    #[test]
    fn renders_tables_for_selected_stats() {
        let state = loaded_state();
        let screen = render(&state);
        assert!(screen.contains("Materia Market Board"));
        assert!(screen.contains("Control (1)"));
        assert!(screen.contains("12,000"));
    }

    #[test]
    fn renders_overlays_without_panicking() {
        let mut state = loaded_state();
        state.show_settings = true;
        state.show_listings = true;
        state.timing.open();
        state.begin_world_input();
        let screen = render(&state);
        assert!(screen.contains("World (Enter loads"));

        let mut tiny = AppState::new(&AppSettings::default());
        tiny.show_listings = true;
        let backend = TestBackend::new(10, 4);
        let mut terminal = Terminal::new(backend).expect("terminal");
        let snapshot = tiny.clone_snapshot();
        terminal.draw(|f| draw(f, &snapshot)).expect("draw");
    }

    #[test]
    fn header_counts_deals() {
        let screen = render(&loaded_state());
        assert!(screen.contains("1 items · 1 deals"));
    }

    #[test]
    fn every_sort_key_has_a_visible_header() {
        let mut state = loaded_state();
        for key in SortKey::ALL {
            state.set_sort(key);
            let screen = render(&state);
            let header = format!("{}{}", key.label(), state.filter.sort_order.arrow());
            assert!(screen.contains(&header), "missing header {header}");
        }
        assert!(render(&state).contains("13,000"));
    }

    #[test]
    fn failed_switch_shows_the_loaded_world() {
        let mut state = loaded_state();
        let ticket = state.begin_fetch("Primla");
        assert!(render(&state).contains("Loading Primla"));
        state.apply(AppEvent::MateriaFailed {
            request_id: ticket.request_id,
            world: "Primla".into(),
            error: AppError::new(AppErrorKind::Network, "HTTP 404"),
        });
        let screen = render(&state);
        assert!(screen.contains("World Aether"));
        assert!(!screen.contains("Primla"));
    }

    #[test]
    fn centered_rect_fits_inside_area() {
        let area = Rect::new(0, 0, 10, 4);
        let rect = centered_rect(area, 60, 16);
        assert!(rect.width <= area.width);
        assert!(rect.height <= area.height);
    }
}
