// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Stepmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Terminal viewer.
//!
//! Replays a finished response chunk by chunk (ratatui + crossterm) and re-renders the whole text
//! received so far on every tick, the way a live stream arrives.

use std::{
    error::Error,
    io,
    time::{Duration, Instant},
};

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::{Clear, Paragraph},
};

use crate::engine::{DiagramMounts, KeyInput};
use crate::locale::{Catalog, Lang};
use crate::model::{MountId, ResponseFlow};
use crate::render::RenderOptions;
use crate::stream::{ChunkFeeder, StreamBuffer};
use crate::view::{
    self, layout_solution, layout_tree, MarkdownRenderer, PaintOptions, ProblemView, RenderTree,
    SolutionRenderer,
};

mod demo;
mod theme;

pub use demo::{DEMO_CHAT, DEMO_RESPONSE};
use theme::TuiTheme;

pub const DEFAULT_CHUNK_BYTES: usize = 24;
pub const DEFAULT_TICK: Duration = Duration::from_millis(60);

/// What the viewer replays and how.
#[derive(Debug, Clone, PartialEq)]
pub struct TuiConfig {
    pub response: String,
    /// Protocol of the response; `None` renders it as a chat message.
    pub flow: Option<ResponseFlow>,
    pub chunk_bytes: usize,
    pub tick: Duration,
    pub lang: Lang,
    pub options: RenderOptions,
}

impl Default for TuiConfig {
    fn default() -> Self {
        Self {
            response: DEMO_RESPONSE.to_owned(),
            flow: Some(ResponseFlow::Solve),
            chunk_bytes: DEFAULT_CHUNK_BYTES,
            tick: DEFAULT_TICK,
            lang: Lang::En,
            options: RenderOptions::default(),
        }
    }
}

/// Runs the interactive terminal viewer until the user quits.
pub fn run(config: TuiConfig) -> Result<(), Box<dyn Error>> {
    let theme = TuiTheme::from_env()?;
    let tick = config.tick;
    let mut terminal = TerminalSession::new()?;
    let mut app = App::new(config, theme);
    let mut last_tick = Instant::now();

    while !app.should_quit {
        terminal.draw(|frame| draw(frame, &mut app))?;

        let timeout = tick.saturating_sub(last_tick.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }

        let since = last_tick.elapsed();
        if since >= tick {
            app.tick(since);
            last_tick = Instant::now();
        }
    }

    Ok(())
}

enum Pipeline {
    Chat { renderer: MarkdownRenderer, tree: RenderTree },
    Solution { renderer: SolutionRenderer, flow: ResponseFlow, views: Vec<ProblemView> },
}

impl Pipeline {
    fn new(flow: Option<ResponseFlow>, lang: Lang, options: RenderOptions) -> Self {
        let localizer = Catalog::new(lang);
        match flow {
            None => Self::Chat {
                renderer: MarkdownRenderer::new(localizer, options),
                tree: RenderTree::default(),
            },
            Some(flow) => Self::Solution {
                renderer: SolutionRenderer::new(localizer, options),
                flow,
                views: Vec::new(),
            },
        }
    }

    fn render(&mut self, source: &str) {
        match self {
            Self::Chat { renderer, tree } => *tree = renderer.render(source),
            Self::Solution { renderer, flow, views } => *views = renderer.render(source, *flow),
        }
    }

    fn mounts(&self) -> &DiagramMounts {
        match self {
            Self::Chat { renderer, .. } => renderer.mounts(),
            Self::Solution { renderer, .. } => renderer.mounts(),
        }
    }

    fn reset(&mut self) {
        match self {
            Self::Chat { renderer, tree } => {
                renderer.reset();
                *tree = RenderTree::default();
            }
            Self::Solution { renderer, views, .. } => {
                renderer.reset();
                views.clear();
            }
        }
    }

    fn lines(&self, options: &PaintOptions) -> Vec<view::Line> {
        match self {
            Self::Chat { renderer, tree } => layout_tree(tree, renderer.mounts(), options),
            Self::Solution { renderer, views, .. } => {
                layout_solution(views, renderer.mounts(), renderer.localizer(), options)
            }
        }
    }
}

pub(crate) struct App {
    feeder: ChunkFeeder,
    buffer: StreamBuffer,
    pipeline: Pipeline,
    theme: TuiTheme,
    /// First visible line; `None` follows the end of the text.
    scroll: Option<usize>,
    /// First line shown by the last draw.
    last_top: usize,
    focus: Option<MountId>,
    show_source: bool,
    paused: bool,
    elapsed: Duration,
    should_quit: bool,
}

impl App {
    fn new(config: TuiConfig, theme: TuiTheme) -> Self {
        let mut app = Self {
            feeder: ChunkFeeder::new(config.response, config.chunk_bytes),
            buffer: StreamBuffer::new(),
            pipeline: Pipeline::new(config.flow, config.lang, config.options),
            theme,
            scroll: None,
            last_top: 0,
            focus: None,
            show_source: false,
            paused: false,
            elapsed: Duration::ZERO,
            should_quit: false,
        };
        app.rerender();
        app
    }

    /// Advances the animation clock and feeds one chunk unless paused.
    pub(crate) fn tick(&mut self, dt: Duration) {
        self.elapsed += dt;
        if self.paused {
            return;
        }
        let Some(chunk) = self.feeder.next_chunk() else {
            return;
        };
        self.buffer.push_str(chunk);
        self.rerender();
    }

    fn rerender(&mut self) {
        self.pipeline.render(self.buffer.as_str());
        if let Some(focus) = &self.focus {
            if !self.pipeline.mounts().focusable().contains(focus) {
                tracing::debug!(mount = %focus, "focused board went away");
                self.focus = None;
            }
        }
    }

    fn restart(&mut self) {
        tracing::debug!("restarting stream");
        self.feeder.rewind();
        self.buffer.clear();
        self.pipeline.reset();
        self.scroll = None;
        self.focus = None;
        self.rerender();
    }

    fn cycle_focus(&mut self) {
        let boards = self.pipeline.mounts().focusable();
        self.focus = match &self.focus {
            None => boards.first().cloned(),
            Some(current) => {
                let next =
                    boards.iter().position(|mount| mount == current).map_or(0, |idx| idx + 1);
                boards.get(next).cloned()
            }
        };
    }

    pub(crate) fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
                return;
            }
            KeyCode::Tab => {
                self.cycle_focus();
                return;
            }
            _ => {}
        }

        if let (Some(focus), Some(input)) = (&self.focus, board_key(key.code)) {
            if self.pipeline.mounts().dispatch_key(focus, input) {
                return;
            }
        }

        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.scroll_by(1),
            KeyCode::Char('k') | KeyCode::Up => self.scroll_by(-1),
            KeyCode::PageDown => self.scroll_by(10),
            KeyCode::PageUp => self.scroll_by(-10),
            KeyCode::Char('g') | KeyCode::Home => self.scroll = Some(0),
            KeyCode::Char('G') | KeyCode::End => self.scroll = None,
            KeyCode::Char('s') => self.show_source = !self.show_source,
            KeyCode::Char(' ') => self.paused = !self.paused,
            KeyCode::Char('r') => self.restart(),
            _ => {}
        }
    }

    fn scroll_by(&mut self, delta: isize) {
        let current = self.scroll.unwrap_or(self.last_top);
        self.scroll = Some(current.saturating_add_signed(delta));
    }

    fn paint_options(&self, width: usize) -> PaintOptions {
        PaintOptions {
            width,
            show_source: self.show_source,
            focused: self.focus.clone(),
            elapsed: self.elapsed,
        }
    }

    fn status_line(&self) -> Line<'static> {
        let (sent, total) = self.feeder.progress();
        let state = if self.paused {
            "paused"
        } else if self.feeder.is_finished() {
            "done"
        } else {
            "streaming"
        };
        let mut spans =
            vec![Span::styled(format!(" {state} {sent}/{total} B "), self.theme.status_style())];
        if let Some(focus) = &self.focus {
            spans.push(Span::styled(format!(" board {focus} "), self.theme.status_key_style()));
        }
        let keys = [
            ("q", "quit"),
            ("tab", "focus"),
            ("s", "source"),
            ("space", "pause"),
            ("r", "restart"),
        ];
        for (key, label) in keys {
            spans.push(Span::styled(format!(" {key}"), self.theme.status_key_style()));
            spans.push(Span::styled(format!(" {label}"), self.theme.status_style()));
        }
        Line::from(spans)
    }
}

fn board_key(code: KeyCode) -> Option<KeyInput> {
    match code {
        KeyCode::Up => Some(KeyInput::Up),
        KeyCode::Down => Some(KeyInput::Down),
        KeyCode::Left => Some(KeyInput::Left),
        KeyCode::Right => Some(KeyInput::Right),
        KeyCode::Char(ch @ ('h' | 'j' | 'k' | 'l' | '+' | '=' | '-' | '0')) => {
            Some(KeyInput::Char(ch))
        }
        _ => None,
    }
}

fn styled_line(theme: &TuiTheme, line: view::Line) -> Line<'static> {
    Line::from(
        line.spans
            .into_iter()
            .map(|span| Span::styled(span.text, theme.tone_style(span.tone)))
            .collect::<Vec<_>>(),
    )
}

fn draw(frame: &mut Frame<'_>, app: &mut App) {
    let area = frame.size();
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);
    let body = layout[0];
    let status = layout[1];

    let lines = app.pipeline.lines(&app.paint_options(usize::from(body.width).saturating_sub(1)));
    let height = usize::from(body.height);
    let max_scroll = lines.len().saturating_sub(height);
    let top = app.scroll.map_or(max_scroll, |scroll| scroll.min(max_scroll));
    if app.scroll.is_some() {
        app.scroll = Some(top);
    }
    app.last_top = top;

    let visible: Vec<Line<'static>> = lines
        .into_iter()
        .skip(top)
        .take(height)
        .map(|line| styled_line(&app.theme, line))
        .collect();
    frame.render_widget(Clear, body);
    frame.render_widget(Paragraph::new(visible).style(app.theme.base_style()), body);
    frame.render_widget(Paragraph::new(app.status_line()).style(app.theme.status_style()), status);
}

struct TerminalSession {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TerminalSession {
    fn new() -> Result<Self, Box<dyn Error>> {
        enable_raw_mode()?;

        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen).map_err(|err| {
            teardown_terminal();
            err
        })?;

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).map_err(|err| {
            teardown_terminal();
            err
        })?;
        terminal.clear().map_err(|err| {
            teardown_terminal();
            err
        })?;

        Ok(Self { terminal })
    }

    fn draw(&mut self, draw_fn: impl FnOnce(&mut Frame<'_>)) -> io::Result<()> {
        self.terminal.draw(draw_fn)?;
        Ok(())
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = self.terminal.show_cursor();
        teardown_terminal();
    }
}

fn teardown_terminal() {
    let _ = disable_raw_mode();
    let mut stdout = io::stdout();
    let _ = execute!(stdout, LeaveAlternateScreen);
}

#[cfg(test)]
pub(crate) mod testing {
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::{backend::TestBackend, Terminal};

    use super::{draw, App, TuiConfig};
    use super::theme::TuiTheme;

    /// Drives an [`App`] against an in-memory terminal.
    pub(crate) struct HeadlessTui {
        pub(crate) app: App,
        terminal: Terminal<TestBackend>,
        tick: std::time::Duration,
    }

    impl HeadlessTui {
        pub(crate) fn new(config: TuiConfig, width: u16, height: u16) -> Self {
            let tick = config.tick;
            let terminal = Terminal::new(TestBackend::new(width, height)).expect("test terminal");
            Self { app: App::new(config, TuiTheme::default()), terminal, tick }
        }

        pub(crate) fn tick(&mut self) {
            self.app.tick(self.tick);
        }

        pub(crate) fn run_to_end(&mut self) {
            while !self.app.feeder.is_finished() {
                self.tick();
            }
        }

        pub(crate) fn press(&mut self, code: KeyCode) {
            self.app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
        }

        /// Draws one frame and returns the screen, rows joined by `'\n'`, trailing spaces trimmed.
        pub(crate) fn screen(&mut self) -> String {
            let app = &mut self.app;
            self.terminal.draw(|frame| draw(frame, app)).expect("draw");
            let buffer = self.terminal.backend().buffer();
            let width = usize::from(buffer.area.width);
            buffer
                .content()
                .chunks(width)
                .map(|row| {
                    row.iter().map(|cell| cell.symbol()).collect::<String>().trim_end().to_owned()
                })
                .collect::<Vec<_>>()
                .join("\n")
        }
    }
}

#[cfg(test)]
mod tests;
