//! TUI rendering

use super::app::{App, Input, View};
use super::widgets::{category_line, KeyHints};
use crate::cli::abbreviate;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

/// Draw the UI
pub fn draw(f: &mut Frame, app: &App) {
    match app.state.view {
        View::Journals => draw_journals(f, app),
        View::Detail => draw_detail(f, app),
        View::Help => draw_help(f),
    }

    // Draw status message if present
    if let Some(ref msg) = app.state.status_message {
        draw_status(f, msg);
    }

    // Draw confirmation dialog if present
    if let Some(ref dialog) = app.state.confirm_dialog {
        draw_confirm(f, &dialog.title, &dialog.message);
    }
}

/// Draw the journal list
fn draw_journals(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(f.area());

    // Title
    let title = Paragraph::new(Line::from(vec![
        Span::styled(
            "SCImago Journal Rank",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(
                "   {} journals, {} categories, {} areas",
                app.stats.journals, app.stats.categories, app.stats.areas
            ),
            Style::default().fg(Color::DarkGray),
        ),
    ]))
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, chunks[0]);

    // Search bar
    let (search_text, search_style) = match app.state.input {
        Some(input) => {
            let prompt = match input {
                Input::Search => "Keyword: ",
                Input::ExportPath => "Export to: ",
            };
            (
                format!("{}{}_", prompt, app.state.input_buffer),
                Style::default().fg(Color::Yellow),
            )
        }
        None if app.state.search_query.is_empty() => {
            ("Press / to search".to_string(), Style::default().fg(Color::DarkGray))
        }
        None => (app.state.search_query.clone(), Style::default()),
    };
    let search = Paragraph::new(search_text)
        .style(search_style)
        .block(Block::default().title("Search").borders(Borders::ALL));
    f.render_widget(search, chunks[1]);

    // Journal table
    let rows: Vec<Row> = app
        .visible_journals()
        .map(|journal| {
            Row::new(vec![
                Cell::from(journal.id.to_string()),
                Cell::from(journal.title.clone()),
                Cell::from(abbreviate(&journal.categories, "categories")),
                Cell::from(abbreviate(&journal.areas, "domains")),
            ])
        })
        .collect();

    let header = Row::new(vec!["ID", "Title", "Categories", "Domains"])
        .style(Style::default().add_modifier(Modifier::BOLD));

    let table_title = format!("Journals ({} of {})", app.visible.len(), app.journals.len());
    let table = Table::new(
        rows,
        [
            Constraint::Length(7),
            Constraint::Percentage(40),
            Constraint::Percentage(35),
            Constraint::Percentage(25),
        ],
    )
    .header(header)
    .block(Block::default().title(table_title).borders(Borders::ALL))
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    );

    let mut state = TableState::default();
    if !app.visible.is_empty() {
        state.select(Some(app.state.selected));
    }
    f.render_stateful_widget(table, chunks[2], &mut state);

    // Help
    let help = KeyHints::new(vec![
        ("↑/↓", "Navigate"),
        ("Enter", "Details"),
        ("/", "Search"),
        ("e", "Export"),
        ("u", "Update"),
        ("?", "Help"),
        ("q", "Quit"),
    ]);
    f.render_widget(help, chunks[3]);
}

/// Draw the journal detail view
fn draw_detail(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Length(1),
        ])
        .split(f.area());

    if let Some(detail) = &app.detail {
        let j = &detail.journal;
        let info = &j.info;

        let title = Paragraph::new(info.title.clone())
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(title, chunks[0]);

        let field = |name: &str, value: String| {
            Line::from(vec![
                Span::styled(format!("{:<24}", name), Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(value),
            ])
        };
        let section = |name: &str| {
            Line::from(Span::styled(
                name.to_string(),
                Style::default().add_modifier(Modifier::UNDERLINED),
            ))
        };

        let mut lines = vec![
            field("ID", j.id.to_string()),
            field("Source ID", info.source_id.clone()),
            field("Type", info.journal_type.clone()),
            field("ISSN", info.issn.clone()),
            field("Publisher", info.publisher.clone()),
            field("Country", info.country.clone()),
            field("Region", info.region.clone()),
            Line::from(""),
            field("SJR", info.sjr.to_string()),
            field(
                "Impact factor",
                j.impact_factor.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string()),
            ),
            field("H index", info.h_index.to_string()),
            field("Docs (last year)", info.last_year_docs.to_string()),
            field("Docs (3 years)", info.three_years_docs.to_string()),
            field("References", info.refs.to_string()),
            field("Cites (3 years)", info.cites.to_string()),
            field("Citable docs (3 years)", info.citable_docs.to_string()),
            field("Cites / doc (2 years)", info.cites_per_doc.to_string()),
            field("Refs / doc", info.refs_per_doc.to_string()),
            Line::from(""),
            section("Categories"),
        ];
        lines.extend(detail.categories.iter().map(category_line));
        lines.push(Line::from(""));
        lines.push(section("Areas"));
        lines.extend(detail.areas.iter().map(|a| Line::from(format!("  • {}", a))));

        let details = Paragraph::new(lines)
            .block(Block::default().title("Details").borders(Borders::ALL))
            .wrap(Wrap { trim: false })
            .scroll((app.state.scroll_offset.min(u16::MAX as usize) as u16, 0));
        f.render_widget(details, chunks[1]);
    }

    let help = KeyHints::new(vec![("↑/↓", "Scroll"), ("Esc", "Back")]);
    f.render_widget(help, chunks[2]);
}

/// Draw the help view
fn draw_help(f: &mut Frame) {
    let area = centered_rect(60, 80, f.area());

    f.render_widget(Clear, area);

    let heading = |text: &'static str| {
        Line::from(Span::styled(
            text,
            Style::default().add_modifier(Modifier::UNDERLINED),
        ))
    };

    let help_text = vec![
        Line::from(Span::styled(
            "scimagojr Help",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        heading("Global"),
        Line::from("  Ctrl+C, Ctrl+Q  Quit"),
        Line::from("  ?               Show help"),
        Line::from(""),
        heading("Journal List"),
        Line::from("  ↑/k, ↓/j        Navigate"),
        Line::from("  PgUp/PgDn, g/G  Jump"),
        Line::from("  Enter           View details"),
        Line::from("  /               Search titles"),
        Line::from("  Esc             Clear search"),
        Line::from("  e               Export shown journals to CSV"),
        Line::from("  u               Download and import the feed"),
        Line::from("  q               Quit"),
        Line::from(""),
        heading("Quartiles"),
        Line::from(vec![
            Span::styled("  Q1 ", Style::default().fg(Color::Cyan)),
            Span::styled("Q2 ", Style::default().fg(Color::Green)),
            Span::styled("Q3 ", Style::default().fg(Color::Yellow)),
            Span::styled("Q4 ", Style::default().fg(Color::Red)),
            Span::styled("- ", Style::default().fg(Color::Gray)),
        ]),
        Line::from(""),
        Line::from("Press any key to close"),
    ];

    let help = Paragraph::new(help_text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .wrap(Wrap { trim: false });

    f.render_widget(help, area);
}

/// Draw status message
fn draw_status(f: &mut Frame, message: &str) {
    let area = Rect {
        x: 0,
        y: f.area().height.saturating_sub(1),
        width: f.area().width,
        height: 1,
    };

    let status =
        Paragraph::new(message).style(Style::default().fg(Color::Yellow).bg(Color::DarkGray));

    f.render_widget(status, area);
}

/// Draw confirmation dialog
fn draw_confirm(f: &mut Frame, title: &str, message: &str) {
    let area = centered_rect(50, 30, f.area());

    f.render_widget(Clear, area);

    let text = vec![
        Line::from(message),
        Line::from(""),
        Line::from("[y] Yes  [n] No"),
    ];

    let dialog = Paragraph::new(text)
        .block(Block::default().title(title).borders(Borders::ALL))
        .wrap(Wrap { trim: false });

    f.render_widget(dialog, area);
}

/// Create a centered rect
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
