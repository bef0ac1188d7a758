use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyModifiers,
    MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use eframe::egui::{Color32, Pos2, Rect as CanvasRect, Vec2};
use mediamap::chart::ChartFrame;
use mediamap::cli::{parse_args, DatasetEntry};
use mediamap::text_fit::{fit_text, DeterministicTextMeasure};
use mediamap::{ClickOutcome, Dataset, Error, RenderOptions, TreemapChart};
use ratatui::backend::CrosstermBackend;
use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Layout, Rect as UiRect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap};
use ratatui::{Frame, Terminal};
use std::io::{self, stdout};
use std::time::{Duration, Instant};
use unicode_width::UnicodeWidthStr;

/// Below this the fading overlay is left off the screen.
const TOOLTIP_MIN_OPACITY: f32 = 0.5;

/// Scaling between the chart's canvas space and a block of terminal cells.
#[derive(Debug, Clone, Copy)]
struct CellMapping {
    area: UiRect,
    sx: f32,
    sy: f32,
}

impl CellMapping {
    fn new(area: UiRect, chart: &TreemapChart) -> Option<Self> {
        if area.width == 0 || area.height == 0 || chart.width() <= 0.0 || chart.height() <= 0.0 {
            return None;
        }
        Some(Self {
            area,
            sx: area.width as f32 / chart.width(),
            sy: area.height as f32 / chart.height(),
        })
    }

    /// Center of a terminal cell in canvas space, `None` outside the area.
    fn cell_to_canvas(&self, x: u16, y: u16) -> Option<Pos2> {
        if !point_in_rect(self.area, x, y) {
            return None;
        }
        Some(Pos2::new(
            ((x - self.area.x) as f32 + 0.5) / self.sx,
            ((y - self.area.y) as f32 + 0.5) / self.sy,
        ))
    }

    /// Inclusive cell bounds covered by a canvas rectangle.
    fn bounds(&self, rect: CanvasRect) -> Option<(u16, u16, u16, u16)> {
        if rect.width() <= 0.0 || rect.height() <= 0.0 {
            return None;
        }
        let area = self.area;
        let max_x = area.x.saturating_add(area.width.saturating_sub(1));
        let max_y = area.y.saturating_add(area.height.saturating_sub(1));

        let x0 = area.x.saturating_add((rect.min.x * self.sx).floor().max(0.0) as u16);
        let y0 = area.y.saturating_add((rect.min.y * self.sy).floor().max(0.0) as u16);
        let x1 = area
            .x
            .saturating_add(((rect.max.x * self.sx).ceil().max(1.0) as u16).saturating_sub(1));
        let y1 = area
            .y
            .saturating_add(((rect.max.y * self.sy).ceil().max(1.0) as u16).saturating_sub(1));

        let (x0, y0) = (x0.clamp(area.x, max_x), y0.clamp(area.y, max_y));
        let (x1, y1) = (x1.clamp(area.x, max_x), y1.clamp(area.y, max_y));
        if x1 < x0 || y1 < y0 {
            return None;
        }
        Some((x0, y0, x1, y1))
    }
}

struct App {
    datasets: Vec<DatasetEntry>,
    selected: Option<usize>,
    options: RenderOptions,
    chart: Option<TreemapChart>,
    /// Dataset the chart was drawn from, kept for replays
    data: Option<Dataset>,
    started: Instant,
    status: String,
    mapping: Option<CellMapping>,
    screen: Vec2,
    should_quit: bool,
}

impl App {
    fn new(datasets: Vec<DatasetEntry>, options: RenderOptions) -> Self {
        Self {
            selected: if datasets.is_empty() { None } else { Some(0) },
            datasets,
            options,
            chart: None,
            data: None,
            started: Instant::now(),
            status: String::from("Enter: visualize   Tab: next dataset"),
            mapping: None,
            screen: Vec2::INFINITY,
            should_quit: false,
        }
    }

    fn now(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    fn visualize(&mut self) {
        self.data = match self.selected.and_then(|i| self.datasets.get(i)) {
            Some(entry) => match entry.load() {
                Ok(data) => Some(data),
                Err(err) => {
                    log::warn!("{err}");
                    self.status = err.to_string();
                    return;
                }
            },
            None => None,
        };
        self.render();
    }

    /// Draw the current dataset again from scratch.
    fn render(&mut self) {
        let now = self.now();
        match TreemapChart::render(
            self.data.as_ref(),
            self.options.clone(),
            &DeterministicTextMeasure::default(),
            now,
        ) {
            Ok(chart) => {
                self.status = format!("{} documents", chart.documents().len());
                self.chart = Some(chart);
            }
            Err(err) => {
                log::warn!("{err}");
                self.status = err.to_string();
            }
        }
    }

    fn next_dataset(&mut self) {
        if self.datasets.is_empty() {
            return;
        }
        self.selected = Some(self.selected.map_or(0, |i| (i + 1) % self.datasets.len()));
    }

    fn toggle_animation(&mut self) {
        self.options.play_animation = !self.options.play_animation;
        if !self.options.play_animation {
            if let Some(chart) = self.chart.as_mut() {
                chart.finish_animation();
            }
        }
        self.status = format!(
            "Animation {}",
            if self.options.play_animation { "on" } else { "off" }
        );
    }

    fn on_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && matches!(key.code, KeyCode::Char('c')) {
            self.should_quit = true;
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Enter | KeyCode::Char('v') => self.visualize(),
            KeyCode::Tab | KeyCode::Char('n') => self.next_dataset(),
            KeyCode::Char('r') => {
                if self.chart.is_some() {
                    self.render();
                }
            }
            KeyCode::Char('a') => self.toggle_animation(),
            KeyCode::Esc => {
                let now = self.now();
                if let Some(chart) = self.chart.as_mut() {
                    chart.hide_tooltip(now);
                }
            }
            _ => {}
        }
    }

    fn on_mouse(&mut self, event: MouseEvent) {
        let now = self.now();
        let screen = self.screen;
        let (Some(chart), Some(mapping)) = (self.chart.as_mut(), self.mapping) else {
            return;
        };
        let canvas_pos = mapping.cell_to_canvas(event.column, event.row);
        let page_pos = Pos2::new(event.column as f32, event.row as f32);

        match event.kind {
            MouseEventKind::Moved | MouseEventKind::Drag(_) => {
                chart.pointer_moved(canvas_pos, page_pos, screen, now);
            }
            MouseEventKind::Down(MouseButton::Left) => {
                let outcome = canvas_pos.and_then(|pos| chart.click(pos, now));
                match outcome {
                    Some(ClickOutcome::OpenLink(url)) => {
                        log::info!("Selected link {url}");
                        self.status = if url.is_empty() {
                            String::from("(document has no link)")
                        } else {
                            url
                        };
                    }
                    Some(ClickOutcome::Handled) | None => {}
                }
            }
            _ => {}
        }
    }
}

fn point_in_rect(rect: UiRect, x: u16, y: u16) -> bool {
    x >= rect.x
        && x < rect.x.saturating_add(rect.width)
        && y >= rect.y
        && y < rect.y.saturating_add(rect.height)
}

fn to_color(c: Color32) -> Color {
    Color::Rgb(c.r(), c.g(), c.b())
}

fn cell_width(text: &str) -> f32 {
    text.width() as f32
}

struct TreemapWidget<'a> {
    frame: &'a ChartFrame<'a>,
    mapping: CellMapping,
    hovered: Option<usize>,
}

impl Widget for TreemapWidget<'_> {
    fn render(self, area: UiRect, buf: &mut Buffer) {
        for y in area.y..area.y.saturating_add(area.height) {
            for x in area.x..area.x.saturating_add(area.width) {
                buf[(x, y)]
                    .set_char(' ')
                    .set_style(Style::default().bg(Color::White));
            }
        }

        for lf in &self.frame.leaves {
            let Some((x0, y0, x1, y1)) = self.mapping.bounds(lf.rect) else {
                continue;
            };

            let bg = to_color(lf.leaf.fill);
            let border_color = if self.hovered == Some(lf.leaf.document) {
                Color::Black
            } else {
                to_color(lf.leaf.group_color)
            };

            for y in y0..=y1 {
                for x in x0..=x1 {
                    buf[(x, y)]
                        .set_char(' ')
                        .set_style(Style::default().bg(bg).fg(Color::Black));
                }
            }

            if x1 > x0 {
                for x in x0..=x1 {
                    buf[(x, y0)]
                        .set_char('─')
                        .set_style(Style::default().fg(border_color).bg(bg));
                    buf[(x, y1)]
                        .set_char('─')
                        .set_style(Style::default().fg(border_color).bg(bg));
                }
            }
            if y1 > y0 {
                for y in y0..=y1 {
                    buf[(x0, y)]
                        .set_char('│')
                        .set_style(Style::default().fg(border_color).bg(bg));
                    buf[(x1, y)]
                        .set_char('│')
                        .set_style(Style::default().fg(border_color).bg(bg));
                }
            }
            buf[(x0, y0)].set_char('┌');
            buf[(x1, y0)].set_char('┐');
            buf[(x0, y1)].set_char('└');
            buf[(x1, y1)].set_char('┘');

            // Terminal text has no opacity: labels appear halfway through their fade
            if lf.label_opacity < 0.5 || y1 < y0 + 2 {
                continue;
            }
            let inner = x1.saturating_sub(x0).saturating_sub(1);
            let label = fit_text(&lf.leaf.label, inner as f32, &cell_width);
            let label_width = label.width() as u16;
            if label_width == 0 || label_width > inner {
                continue;
            }
            let x = x0 + 1 + (inner - label_width) / 2;
            let y = y0 + (y1 - y0) / 2;
            buf.set_string(
                x,
                y,
                &label,
                Style::default().fg(Color::Black).bg(bg).add_modifier(Modifier::BOLD),
            );
        }
    }
}

fn draw_tooltip(frame: &mut Frame, chart: &mut TreemapChart, now: f64) {
    let tooltip = chart.tooltip();
    if !tooltip.is_displayed() || tooltip.opacity(now) < TOOLTIP_MIN_OPACITY {
        return;
    }
    let style = *tooltip.style();
    let content = tooltip.content().clone();

    let lines = content.lines();
    let text_width = lines.iter().map(|l| l.width()).max().unwrap_or(0) as u16;
    let width = text_width.saturating_add(2).min(frame.area().width);
    let height = (lines.len() as u16).saturating_add(2).min(frame.area().height);
    chart.tooltip_mut().set_size(Vec2::new(width as f32, height as f32));

    let pos = chart.tooltip().position();
    let root = frame.area();
    let x = (pos.x.max(0.0) as u16).min(root.width.saturating_sub(width));
    let y = (pos.y.max(0.0) as u16).min(root.height.saturating_sub(height));
    let area = UiRect::new(x, y, width, height);

    let text_style = Style::default().fg(to_color(style.text)).bg(to_color(style.background));
    let mut body: Vec<Line> = Vec::with_capacity(lines.len());
    for (i, line) in lines.into_iter().enumerate() {
        if i == 0 {
            body.push(Line::from(Span::styled(line, text_style.add_modifier(Modifier::BOLD))));
        } else {
            body.push(Line::from(Span::styled(line, text_style)));
        }
    }

    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(body)
            .style(text_style)
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(to_color(style.border))),
            ),
        area,
    );
}

fn draw_ui(frame: &mut Frame, app: &mut App) {
    let now = app.now();
    let root = frame.area();
    app.screen = Vec2::new(root.width as f32, root.height as f32);

    let split = Layout::horizontal([Constraint::Length(36), Constraint::Min(30)]).split(root);
    let (left, right) = (split[0], split[1]);

    let left_block = Block::default().title(" MediaMap TUI ").borders(Borders::ALL);
    let left_inner = left_block.inner(left);
    frame.render_widget(left_block, left);

    let left_rows = Layout::vertical([
        Constraint::Min(4),
        Constraint::Length(5),
        Constraint::Length(7),
    ])
    .split(left_inner);

    let dataset_lines: Vec<Line> = if app.datasets.is_empty() {
        vec![Line::from(Span::styled(
            "(no datasets given)",
            Style::default().fg(Color::Gray),
        ))]
    } else {
        app.datasets
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                if app.selected == Some(i) {
                    Line::from(Span::styled(
                        format!("> {}", entry.name),
                        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                    ))
                } else {
                    Line::from(format!("  {}", entry.name))
                }
            })
            .collect()
    };
    frame.render_widget(
        Paragraph::new(dataset_lines)
            .block(Block::default().title(" Datasets ").borders(Borders::ALL)),
        left_rows[0],
    );

    frame.render_widget(
        Paragraph::new(app.status.as_str())
            .wrap(Wrap { trim: true })
            .block(Block::default().title(" Status ").borders(Borders::ALL)),
        left_rows[1],
    );

    let help_lines = vec![
        Line::from("Enter: visualize  Tab: next"),
        Line::from("Hover: details  Click: link"),
        Line::from("r: replay  a: animation"),
        Line::from("Esc: hide details"),
        Line::from("q: quit"),
    ];
    frame.render_widget(
        Paragraph::new(help_lines).block(Block::default().title(" Controls ").borders(Borders::ALL)),
        left_rows[2],
    );

    let treemap_block = Block::default().title(" Treemap ").borders(Borders::ALL);
    let treemap_inner = treemap_block.inner(right);
    frame.render_widget(treemap_block, right);

    let Some(chart) = app.chart.as_mut() else {
        app.mapping = None;
        frame.render_widget(
            Paragraph::new("Nothing drawn yet. Pick a dataset and press Enter.")
                .style(Style::default().fg(Color::Gray)),
            treemap_inner,
        );
        return;
    };

    app.mapping = CellMapping::new(treemap_inner, chart);
    chart.update(now);
    if let Some(mapping) = app.mapping {
        let chart_frame = chart.frame(now);
        frame.render_widget(
            TreemapWidget {
                frame: &chart_frame,
                mapping,
                hovered: chart.hovered(),
            },
            treemap_inner,
        );
    }
    draw_tooltip(frame, chart, now);
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>, mut app: App) -> io::Result<()> {
    if app.selected.is_some() {
        app.visualize();
    }

    loop {
        terminal.draw(|frame| {
            draw_ui(frame, &mut app);
        })?;

        if app.should_quit {
            break;
        }

        if event::poll(Duration::from_millis(30))? {
            match event::read()? {
                Event::Key(key) => app.on_key(key),
                Event::Mouse(mouse) => app.on_mouse(mouse),
                Event::Resize(_, _) => {}
                Event::FocusGained | Event::FocusLost | Event::Paste(_) => {}
            }
        }
    }

    Ok(())
}

fn main() -> io::Result<()> {
    env_logger::init();

    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(Error::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };
    let options = match args.render_options() {
        Ok(v) => v,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };
    let app = App::new(args.datasets.into_iter().map(DatasetEntry::new).collect(), options);

    enable_raw_mode()?;
    crossterm::execute!(stdout(), EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let app_result = run_app(&mut terminal, app);

    disable_raw_mode()?;
    crossterm::execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    app_result
}
