//! UI rendering.
//!
//! Draws the whole frame each pass: title bar, legend pane, map pane,
//! status line, edit line, and the modal overlay on top when visible.
//! Pane content is clipped by ratatui, so an over-long legend row or an
//! oversized composite never wraps or writes out of bounds.

use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use crate::compositor::CellGrid;
use crate::legend::{self, LegendRow, RowKind};
use crate::palette::{self, ColorAssignment};

use super::state::{App, Focus, LEGEND_WIDTH};

/// Main render entry point. Called each frame by the event loop.
pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);

    render_title_bar(app, frame, rows[0]);

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(LEGEND_WIDTH), Constraint::Min(1)])
        .split(rows[1]);
    render_legend_pane(app, frame, panes[0]);
    render_map_pane(app, frame, panes[1]);

    let status = Paragraph::new(Line::styled(
        app.status.clone(),
        Style::default().fg(app.status_color),
    ));
    frame.render_widget(status, rows[2]);
    render_edit_line(app, frame, rows[3]);

    if app.overlay.visible {
        render_overlay(app, frame, area);
    }
}

fn render_title_bar(app: &App, frame: &mut Frame, area: Rect) {
    let title = Paragraph::new(Line::from(vec![
        Span::raw("ASCII"),
        Span::styled(" GIS", Style::default().fg(palette::TITLE_ACCENT)),
    ]));
    frame.render_widget(title, area);

    let focus = Paragraph::new(Line::styled(
        format!("[ {} ]", app.focus.label()),
        Style::default().add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Right);
    frame.render_widget(focus, area);
}

fn render_legend_pane(app: &App, frame: &mut Frame, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title("Layers");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(project) = app.project.as_ref() else {
        return;
    };
    let rows = legend::flatten(&project.tree);
    let selected = if app.focus == Focus::Legend && !rows.is_empty() {
        Some(app.legend_cursor.min(rows.len() - 1))
    } else {
        None
    };

    let lines: Vec<Line> = rows
        .iter()
        .enumerate()
        .take(inner.height as usize)
        .map(|(index, row)| legend_row_line(row, Some(index) == selected, &app.colors))
        .collect();
    frame.render_widget(Paragraph::new(lines), inner);
}

/// Compose one legend row: indent, fold glyph, visibility box, color
/// swatch, label. Selection inverts the whole row.
fn legend_row_line(row: &LegendRow, selected: bool, colors: &ColorAssignment) -> Line<'static> {
    let indent = "  ".repeat(row.depth);
    let prefix = format!(
        "{indent}{} {} ",
        row.expand_glyph(),
        row.visibility_glyph()
    );
    let swatch = match row.kind {
        RowKind::Group => "  ".to_string(),
        RowKind::Layer(geometry) => {
            let glyph = crate::compositor::type_glyph(geometry);
            format!("{glyph}{glyph}")
        }
    };
    let label = format!(" {}", row.label());

    if selected {
        let style = Style::default()
            .fg(palette::SELECTION_FG)
            .bg(palette::SELECTION_BG);
        return Line::from(Span::styled(format!("{prefix}{swatch}{label}"), style));
    }

    let swatch_style = match row.kind {
        RowKind::Group => Style::default(),
        RowKind::Layer(_) => Style::default().fg(colors.color(row.id)),
    };
    Line::from(vec![
        Span::raw(prefix),
        Span::styled(swatch, swatch_style),
        Span::raw(label),
    ])
}

fn render_map_pane(app: &mut App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled("Map", Style::default().add_modifier(Modifier::BOLD)));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    app.ensure_map_grid(inner.width as usize, inner.height as usize);
    let Some(grid) = app.map_grid.as_ref() else {
        return;
    };

    let lines: Vec<Line> = (0..inner.height as usize)
        .map(|y| map_row_line(grid, y, inner.width as usize, app.ascii_mode, app.color_mode))
        .collect();
    frame.render_widget(Paragraph::new(lines), inner);
}

/// One map row as spans: glyphs with foreground color in ascii mode,
/// colored blocks otherwise, plain blanks for empty cells.
fn map_row_line(
    grid: &CellGrid,
    y: usize,
    width: usize,
    ascii_mode: bool,
    color_mode: bool,
) -> Line<'static> {
    let spans: Vec<Span> = (0..width)
        .map(|x| {
            let cell = grid.get(x, y);
            if cell.is_empty() {
                return Span::raw(" ");
            }
            let color = if color_mode {
                palette::slot_color(cell.slot)
            } else {
                palette::DEFAULT_MAP_COLOR
            };
            if ascii_mode {
                Span::styled(cell.glyph.to_string(), Style::default().fg(color))
            } else {
                Span::styled(" ", Style::default().bg(color))
            }
        })
        .collect();
    Line::from(spans)
}

fn render_edit_line(app: &App, frame: &mut Frame, area: Rect) {
    let accepting_input = app.focus == Focus::CommandEntry || app.pending_dialog.is_some();
    let mut spans = vec![Span::raw(app.edit_input.clone())];
    if accepting_input {
        spans.push(Span::styled(
            " ",
            Style::default()
                .fg(palette::SELECTION_FG)
                .bg(palette::SELECTION_BG),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_overlay(app: &App, frame: &mut Frame, area: Rect) {
    let rect = centered_rect(50, 50, area);
    frame.render_widget(Clear, rect);
    let lines: Vec<Line> = app.overlay.content.lines().map(Line::raw).collect();
    let block = Block::default()
        .borders(Borders::ALL)
        .title(app.overlay.title.clone());
    frame.render_widget(Paragraph::new(lines).block(block), rect);
}

/// Create a centered rect with given percentage of parent dimensions.
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
