//! Terminal setup and the per-frame draw. Layout, top to bottom: the
//! package (or help) table, the log pane, and the two one-line status
//! slots for filter help and command help.

use std::io::{self, Stdout};

use anyhow::Result;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Layout};
use ratatui::style::{Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Paragraph, Row as TableRow, Table, TableState};
use ratatui::{Frame, Terminal};

use crate::app::App;
use crate::model::Row;

pub type Term = Terminal<CrosstermBackend<Stdout>>;

pub fn setup_terminal() -> Result<Term> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    crossterm::execute!(stdout, EnterAlternateScreen)?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

pub fn restore_terminal(terminal: &mut Term) -> Result<()> {
    disable_raw_mode()?;
    crossterm::execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

pub fn draw(frame: &mut Frame, app: &App) {
    let log_height = u16::try_from(app.config.logsize)
        .unwrap_or(u16::MAX)
        .saturating_add(2);
    let [table_area, log_area, filter_area, command_area] = Layout::vertical([
        Constraint::Min(3),
        Constraint::Length(log_height),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    if app.controller.current() == "help" {
        draw_help_table(frame, app, table_area);
    } else {
        draw_package_table(frame, app, table_area);
    }

    let logs: Vec<Line> = app
        .logs
        .recent(app.config.logsize)
        .iter()
        .map(|entry| Line::from(entry.format_for_display()))
        .collect();
    frame.render_widget(
        Paragraph::new(logs).block(Block::bordered().title("Logs")),
        log_area,
    );

    let pad = " ".repeat(app.ui.prompt.len().max(1));
    frame.render_widget(
        Paragraph::new(format!("{pad}   {}", app.ui.filter_line)),
        filter_area,
    );
    frame.render_widget(
        Paragraph::new(format!("{}   {}", app.ui.prompt, app.ui.command_line)),
        command_area,
    );
}

fn draw_package_table(frame: &mut Frame, app: &App, area: ratatui::layout::Rect) {
    let rows: Vec<TableRow> = app
        .ui
        .list
        .reference()
        .map(|row| match row {
            Row::Package(package) => package.with(|p| {
                TableRow::new(vec![
                    package.name().to_string(),
                    p.match_state().marker().to_string(),
                    p.upstream_display(),
                    p.rawhide_display(),
                ])
            }),
            Row::Doc(doc) => TableRow::new(vec![
                doc.section.clone(),
                String::new(),
                doc.keys.clone(),
                doc.doc.clone(),
            ]),
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(40),
            Constraint::Length(5),
            Constraint::Length(13),
            Constraint::Min(32),
        ],
    )
    .header(
        TableRow::new(vec!["package", "match", "upstream", "rawhide"])
            .style(Style::default().add_modifier(Modifier::BOLD)),
    )
    .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    let mut state = TableState::default();
    state.select(Some(app.ui.selected()));
    frame.render_stateful_widget(table, area, &mut state);
}

fn draw_help_table(frame: &mut Frame, app: &App, area: ratatui::layout::Rect) {
    let rows: Vec<TableRow> = app
        .ui
        .list
        .reference()
        .map(|row| match row {
            Row::Doc(doc) => {
                let cells = vec![doc.section.clone(), doc.keys.clone(), doc.doc.clone()];
                if doc.keys.is_empty() {
                    TableRow::new(cells).style(Style::default().add_modifier(Modifier::BOLD))
                } else {
                    TableRow::new(cells)
                }
            }
            Row::Package(package) => TableRow::new(vec![
                String::new(),
                String::new(),
                package.name().to_string(),
            ]),
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(9),
            Constraint::Length(9),
            Constraint::Min(65),
        ],
    )
    .header(
        TableRow::new(vec!["mode", "keys", "documentation"])
            .style(Style::default().add_modifier(Modifier::BOLD)),
    )
    .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    let mut state = TableState::default();
    state.select(Some(app.ui.selected()));
    frame.render_stateful_widget(table, area, &mut state);
}
