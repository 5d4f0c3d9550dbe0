use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Cell, Clear, List, ListItem, Paragraph, Row, Table, Tabs},
    Frame, Terminal,
};
use std::io;
use std::path::PathBuf;
use tracing::info;

use crate::config::Config;
use crate::data::cleaning::CleaningOp;
use crate::data::data_view::DataView;
use crate::data::file_format::FileFormat;
use crate::session::FileSession;
use crate::utils::logging;

/// Interactive front-end over a batch of file sessions. One session per
/// input file; every toggle mutates the active session and the next draw
/// recomputes its table from the pristine load.
pub struct App {
    config: Config,
    sessions: Vec<FileSession>,
    active: usize,
    column_cursor: usize,
    status: String,
    show_logs: bool,
    should_quit: bool,
}

impl App {
    pub fn new(mut sessions: Vec<FileSession>, load_errors: Vec<String>, config: Config) -> Self {
        // Sessions default to "opposite"; a concrete configured format
        // overrides that per file
        let configured = match config.behavior.default_export_format.as_str() {
            "csv" => Some(FileFormat::Csv),
            "xlsx" => Some(FileFormat::Xlsx),
            _ => None,
        };
        if let Some(format) = configured {
            for session in &mut sessions {
                session.export_format = format;
            }
        }

        let status = if !load_errors.is_empty() {
            load_errors.join(" | ")
        } else if sessions.is_empty() {
            "No files loaded".to_string()
        } else {
            format!("{} file(s) loaded", sessions.len())
        };

        Self {
            config,
            sessions,
            active: 0,
            column_cursor: 0,
            status,
            show_logs: false,
            should_quit: false,
        }
    }

    fn session(&self) -> Option<&FileSession> {
        self.sessions.get(self.active)
    }

    fn session_mut(&mut self) -> Option<&mut FileSession> {
        self.sessions.get_mut(self.active)
    }

    pub fn run(mut self) -> Result<()> {
        if let Err(e) = enable_raw_mode() {
            return Err(anyhow::anyhow!("Failed to enable raw mode: {}", e));
        }

        let mut stdout = io::stdout();
        if let Err(e) = execute!(stdout, EnterAlternateScreen, EnableMouseCapture) {
            let _ = disable_raw_mode();
            return Err(anyhow::anyhow!("Failed to setup terminal: {}", e));
        }

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = match Terminal::new(backend) {
            Ok(t) => t,
            Err(e) => {
                let _ = disable_raw_mode();
                return Err(anyhow::anyhow!("Failed to create terminal: {}", e));
            }
        };

        let res = self.run_app(&mut terminal);

        // Always restore terminal, even on error
        let _ = disable_raw_mode();
        let _ = execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        );
        let _ = terminal.show_cursor();

        res
    }

    fn run_app<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        terminal.draw(|f| self.ui(f))?;

        loop {
            if event::poll(std::time::Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    // Only handle key press; release events double-trigger
                    // toggles on Windows
                    if key.kind != crossterm::event::KeyEventKind::Press {
                        continue;
                    }
                    self.handle_key(key);
                }
            }

            if self.should_quit {
                return Ok(());
            }

            terminal.draw(|f| self.ui(f))?;
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if self.show_logs {
            match key.code {
                KeyCode::Esc | KeyCode::F(5) | KeyCode::Char('q') => self.show_logs = false,
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true
            }
            KeyCode::F(5) => self.show_logs = true,

            KeyCode::Tab | KeyCode::Right => self.next_session(),
            KeyCode::BackTab | KeyCode::Left => self.prev_session(),

            KeyCode::Char('d') => self.toggle_op(CleaningOp::RemoveDuplicates),
            KeyCode::Char('f') => self.toggle_op(CleaningOp::FillMissingNumeric),
            KeyCode::Char('v') => {
                if let Some(session) = self.session_mut() {
                    session.show_chart = !session.show_chart;
                }
            }
            KeyCode::Char('t') => {
                if let Some(session) = self.session_mut() {
                    session.export_format = match session.export_format {
                        FileFormat::Csv => FileFormat::Xlsx,
                        FileFormat::Xlsx => FileFormat::Csv,
                    };
                }
            }

            KeyCode::Up | KeyCode::Char('k') => {
                self.column_cursor = self.column_cursor.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if let Some(session) = self.session() {
                    let max = session.pristine().column_count().saturating_sub(1);
                    self.column_cursor = (self.column_cursor + 1).min(max);
                }
            }
            KeyCode::Char(' ') => self.toggle_column_at_cursor(),
            KeyCode::Char('a') => {
                if let Some(session) = self.session_mut() {
                    session.select_all_columns();
                    self.status = "All columns selected".to_string();
                }
            }

            KeyCode::Char('e') | KeyCode::Enter => self.export_active(),
            _ => {}
        }
    }

    fn next_session(&mut self) {
        if !self.sessions.is_empty() {
            self.active = (self.active + 1) % self.sessions.len();
            self.column_cursor = 0;
        }
    }

    fn prev_session(&mut self) {
        if !self.sessions.is_empty() {
            self.active = (self.active + self.sessions.len() - 1) % self.sessions.len();
            self.column_cursor = 0;
        }
    }

    fn toggle_op(&mut self, op: CleaningOp) {
        if let Some(session) = self.session_mut() {
            session.toggle_op(op);
            let enabled = session.has_op(op);
            self.status = format!(
                "{} {}",
                op.label(),
                if enabled { "enabled" } else { "disabled" }
            );
        }
    }

    fn toggle_column_at_cursor(&mut self) {
        let cursor = self.column_cursor;
        if let Some(session) = self.session_mut() {
            let names = session.pristine().column_names();
            if let Some(name) = names.get(cursor) {
                let name = name.clone();
                session.toggle_column(&name);
            }
        }
    }

    fn export_active(&mut self) {
        let output_dir = self
            .config
            .behavior
            .output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));

        let result = match self.session() {
            Some(session) => {
                let rows = session.current_view().row_count();
                session.export().and_then(|artifact| {
                    let path = artifact.save_to_dir(&output_dir)?;
                    info!(target: "export", "Saved {} ({})", path.display(), artifact.content_type);
                    Ok((rows, path))
                })
            }
            None => {
                self.status = "Nothing to export".to_string();
                return;
            }
        };

        match result {
            Ok((rows, path)) => {
                self.status = format!("Exported {} rows to {}", rows, path.display());
            }
            Err(e) => {
                self.status = format!("Export failed: {}", e);
            }
        }
    }

    fn ui(&self, f: &mut Frame) {
        let has_chart = self.session().map(|s| s.show_chart).unwrap_or(false);
        let mut constraints = vec![
            Constraint::Length(3), // file tabs
            Constraint::Length(2), // file info
            Constraint::Min(5),    // main area
        ];
        if has_chart {
            constraints.push(Constraint::Length(10));
        }
        constraints.push(Constraint::Length(3)); // status

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(f.area());

        self.render_tabs(f, chunks[0]);
        self.render_file_info(f, chunks[1]);
        self.render_main(f, chunks[2]);
        if has_chart {
            self.render_chart(f, chunks[3]);
        }
        self.render_status(f, chunks[chunks.len() - 1]);

        if self.show_logs {
            self.render_logs(f);
        }
    }

    fn render_tabs(&self, f: &mut Frame, area: Rect) {
        let titles: Vec<Line> = if self.sessions.is_empty() {
            vec![Line::from("(no files)")]
        } else {
            self.sessions
                .iter()
                .map(|s| Line::from(s.file_name.clone()))
                .collect()
        };

        let tabs = Tabs::new(titles)
            .select(self.active)
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
            .block(Block::default().borders(Borders::ALL).title(" Files "));
        f.render_widget(tabs, area);
    }

    fn render_file_info(&self, f: &mut Frame, area: Rect) {
        let line = if let Some(session) = self.session() {
            let table = session.pristine();
            Line::from(vec![
                Span::styled(
                    session.file_name.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw(format!(
                    "  {:.2} KB  {} rows x {} columns",
                    session.file_size as f64 / 1024.0,
                    table.row_count(),
                    table.column_count()
                )),
            ])
        } else {
            Line::from("Load CSV or XLSX files to begin")
        };
        f.render_widget(Paragraph::new(line), area);
    }

    fn render_main(&self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(28), Constraint::Min(20)])
            .split(area);

        self.render_column_picker(f, chunks[0]);
        self.render_preview(f, chunks[1]);
    }

    fn render_column_picker(&self, f: &mut Frame, area: Rect) {
        let items: Vec<ListItem> = if let Some(session) = self.session() {
            session
                .pristine()
                .column_names()
                .iter()
                .enumerate()
                .map(|(idx, name)| {
                    let selected = session.selection.contains(name);
                    let marker = if selected { "[x]" } else { "[ ]" };
                    let mut style = Style::default();
                    if idx == self.column_cursor {
                        style = style.fg(Color::Yellow).add_modifier(Modifier::BOLD);
                    }
                    if !selected {
                        style = style.add_modifier(Modifier::DIM);
                    }
                    ListItem::new(format!("{} {}", marker, name)).style(style)
                })
                .collect()
        } else {
            Vec::new()
        };

        let list = List::new(items).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Columns (space toggles) "),
        );
        f.render_widget(list, area);
    }

    fn render_preview(&self, f: &mut Frame, area: Rect) {
        let Some(session) = self.session() else {
            let empty = Paragraph::new("No data")
                .block(Block::default().borders(Borders::ALL).title(" Preview "));
            f.render_widget(empty, area);
            return;
        };

        let view = session.current_view();
        let names = view.column_names();
        if names.is_empty() {
            let empty = Paragraph::new("No columns selected")
                .block(Block::default().borders(Borders::ALL).title(" Preview "));
            f.render_widget(empty, area);
            return;
        }

        let show_row_numbers = self.config.display.show_row_numbers;
        let mut header_cells: Vec<Cell> = Vec::with_capacity(names.len() + 1);
        if show_row_numbers {
            header_cells.push(Cell::from("#"));
        }
        header_cells.extend(names.iter().map(|n| Cell::from(n.clone())));
        let header = Row::new(header_cells)
            .style(Style::default().add_modifier(Modifier::BOLD));

        let preview_rows = self.config.display.preview_rows;
        let rows: Vec<Row> = (0..view.row_count().min(preview_rows))
            .filter_map(|i| view.get_row_as_strings(i).map(|cells| (i, cells)))
            .map(|(i, cells)| {
                if show_row_numbers {
                    let mut numbered = Vec::with_capacity(cells.len() + 1);
                    numbered.push(format!("{}", i + 1));
                    numbered.extend(cells);
                    Row::new(numbered)
                } else {
                    Row::new(cells)
                }
            })
            .collect();

        let width = (100 / names.len().max(1)) as u16;
        let mut widths: Vec<Constraint> = Vec::with_capacity(names.len() + 1);
        if show_row_numbers {
            widths.push(Constraint::Length(5));
        }
        widths.extend(names.iter().map(|_| Constraint::Percentage(width)));

        let title = format!(
            " Preview (first {} of {} rows) ",
            view.row_count().min(preview_rows),
            view.row_count()
        );
        let table = Table::new(rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title(title));
        f.render_widget(table, area);
    }

    fn render_chart(&self, f: &mut Frame, area: Rect) {
        let Some(session) = self.session() else {
            return;
        };

        let view = session.current_view();
        let numeric: Vec<String> = view
            .numeric_columns()
            .iter()
            .take(2)
            .map(|c| c.name.clone())
            .collect();

        if numeric.is_empty() {
            let msg = Paragraph::new("No numeric columns to chart")
                .block(Block::default().borders(Borders::ALL).title(" Chart "));
            f.render_widget(msg, area);
            return;
        }

        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(
                numeric
                    .iter()
                    .map(|_| Constraint::Percentage((100 / numeric.len()) as u16))
                    .collect::<Vec<_>>(),
            )
            .split(area);

        for (chunk, name) in chunks.iter().zip(&numeric) {
            self.render_column_bars(f, *chunk, &view, name);
        }
    }

    fn render_column_bars(&self, f: &mut Frame, area: Rect, view: &DataView, column: &str) {
        let values = view.numeric_values(column);
        let max_bars = self.config.display.chart_max_bars;

        // BarChart takes u64 heights; shift so the smallest value sits at zero
        let offset = values
            .iter()
            .map(|(_, v)| *v)
            .fold(0.0_f64, |acc, v| acc.min(v));

        let bars: Vec<Bar> = values
            .iter()
            .take(max_bars)
            .map(|(row_idx, v)| {
                Bar::default()
                    .label(Line::from(format!("{}", row_idx)))
                    .value((v - offset).round() as u64)
                    .text_value(format!("{}", v))
            })
            .collect();

        let chart = BarChart::default()
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" {} ", column)),
            )
            .bar_width(5)
            .bar_gap(1)
            .bar_style(Style::default().fg(Color::Cyan))
            .value_style(Style::default().fg(Color::Black).bg(Color::Cyan))
            .data(BarGroup::default().bars(&bars));
        f.render_widget(chart, area);
    }

    fn render_status(&self, f: &mut Frame, area: Rect) {
        let mut spans = vec![];
        if let Some(session) = self.session() {
            let dedup = session.has_op(CleaningOp::RemoveDuplicates);
            let fill = session.has_op(CleaningOp::FillMissingNumeric);
            spans.push(Span::styled(
                format!("[d]edup:{}", if dedup { "on" } else { "off" }),
                toggle_style(dedup),
            ));
            spans.push(Span::raw("  "));
            spans.push(Span::styled(
                format!("[f]ill:{}", if fill { "on" } else { "off" }),
                toggle_style(fill),
            ));
            spans.push(Span::raw("  "));
            spans.push(Span::styled(
                format!("[v]iz:{}", if session.show_chart { "on" } else { "off" }),
                toggle_style(session.show_chart),
            ));
            spans.push(Span::raw("  "));
            spans.push(Span::raw(format!(
                "[t]arget:{}  [e]xport  [q]uit  F5:logs",
                session.export_format.label()
            )));
        }

        let lines = vec![Line::from(spans), Line::from(self.status.clone())];
        let status = Paragraph::new(lines)
            .block(Block::default().borders(Borders::TOP));
        f.render_widget(status, area);
    }

    fn render_logs(&self, f: &mut Frame) {
        let area = centered_rect(80, 70, f.area());

        let entries = logging::get_log_buffer()
            .map(|b| b.get_recent(area.height.saturating_sub(2) as usize))
            .unwrap_or_default();

        let items: Vec<ListItem> = entries
            .iter()
            .map(|e| ListItem::new(e.format_for_display()))
            .collect();

        let list = List::new(items).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Logs (Esc to close) "),
        );
        f.render_widget(Clear, area);
        f.render_widget(list, area);
    }
}

fn toggle_style(on: bool) -> Style {
    if on {
        Style::default().fg(Color::Green)
    } else {
        Style::default().add_modifier(Modifier::DIM)
    }
}

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

/// Launch the interactive front-end over the given file paths.
pub fn run_tui(paths: &[String], config: Config) -> Result<()> {
    let (sessions, errors) = crate::session::load_sessions(paths);
    let app = App::new(sessions, errors, config);
    app.run()
}
