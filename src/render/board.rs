// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Stepmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Interactive board for `jessecode` blocks.
//!
//! The board keeps a bounding box in world coordinates and redraws the parsed script every time
//! it is rendered. While the board has focus, keys pan by a fixed fraction of the visible span or
//! zoom around the center. The key listener holds only a weak handle to the board state and is
//! detached before the mount target is released.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::engine::{
    DiagramEngine, EngineError, EngineInstance, ErrorPanel, InputRouter, KeyInput, ListenerLease,
    MountLease,
};
use crate::format::jessecode::{Coords, ElementKind};
use crate::format::{parse_jessecode, JesseScript};
use crate::model::{DiagramKind, MountId};

use super::text::canvas_to_string_trimmed;
use super::{format_tick, AxisScale, Canvas, CanvasError, RenderOptions};

const PAN_FRACTION: f64 = 0.05;
const ZOOM_FACTOR: f64 = 1.25;
const MIN_BOARD_WIDTH: usize = 11;
const MIN_BOARD_HEIGHT: usize = 5;
const INIT_ERROR_KIND: &str = "Initialization";
const MAX_TICKS: f64 = 256.0;

/// Visible world rectangle, stored as `[left, top, right, bottom]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox([f64; 4]);

impl Default for BoundingBox {
    fn default() -> Self {
        Self([-1.0, 10.0, 11.0, -10.0])
    }
}

impl BoundingBox {
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self([left, top, right, bottom])
    }

    pub fn as_array(&self) -> [f64; 4] {
        self.0
    }

    pub fn left(&self) -> f64 {
        self.0[0]
    }

    pub fn top(&self) -> f64 {
        self.0[1]
    }

    pub fn right(&self) -> f64 {
        self.0[2]
    }

    pub fn bottom(&self) -> f64 {
        self.0[3]
    }

    fn shifted(self, dx: f64, dy: f64) -> Self {
        let [left, top, right, bottom] = self.0;
        Self([left + dx, top + dy, right + dx, bottom + dy])
    }

    /// Scales both spans by `factor` around the center.
    fn scaled(self, factor: f64) -> Self {
        let [left, top, right, bottom] = self.0;
        let (cx, cy) = ((left + right) / 2.0, (top + bottom) / 2.0);
        let (hw, hh) = ((right - left) / 2.0 * factor, (top - bottom) / 2.0 * factor);
        Self([cx - hw, cy + hh, cx + hw, cy - hh])
    }

    /// Applies one navigation key. Returns `None` for keys the board does not handle.
    pub fn navigate(self, key: KeyInput) -> Option<Self> {
        let dx = (self.right() - self.left()) * PAN_FRACTION;
        let dy = (self.top() - self.bottom()) * PAN_FRACTION;
        match key {
            KeyInput::Up | KeyInput::Char('k') => Some(self.shifted(0.0, dy)),
            KeyInput::Down | KeyInput::Char('j') => Some(self.shifted(0.0, -dy)),
            KeyInput::Left | KeyInput::Char('h') => Some(self.shifted(-dx, 0.0)),
            KeyInput::Right | KeyInput::Char('l') => Some(self.shifted(dx, 0.0)),
            KeyInput::Char('+' | '=') => Some(self.scaled(1.0 / ZOOM_FACTOR)),
            KeyInput::Char('-') => Some(self.scaled(ZOOM_FACTOR)),
            KeyInput::Char('0') => Some(Self::default()),
            KeyInput::Char(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BoardError {
    TooSmall { width: usize, height: usize },
    Listener(EngineError),
    Canvas(CanvasError),
}

impl fmt::Display for BoardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooSmall { width, height } => write!(
                f,
                "board area {width}x{height} is smaller than {MIN_BOARD_WIDTH}x{MIN_BOARD_HEIGHT}"
            ),
            Self::Listener(err) => write!(f, "{err}"),
            Self::Canvas(err) => write!(f, "canvas error: {err}"),
        }
    }
}

impl std::error::Error for BoardError {}

impl From<CanvasError> for BoardError {
    fn from(err: CanvasError) -> Self {
        Self::Canvas(err)
    }
}

impl From<EngineError> for BoardError {
    fn from(err: EngineError) -> Self {
        Self::Listener(err)
    }
}

impl From<BoardError> for ErrorPanel {
    fn from(err: BoardError) -> Self {
        ErrorPanel::new(INIT_ERROR_KIND, err.to_string())
    }
}

#[derive(Debug)]
struct BoardState {
    bbox: BoundingBox,
    script: JesseScript,
}

struct Viewport {
    xs: AxisScale,
    ys: AxisScale,
    width: usize,
    height: usize,
}

impl Viewport {
    fn new(bbox: BoundingBox, width: usize, height: usize) -> Self {
        Self {
            xs: AxisScale::new(bbox.left(), bbox.right(), width),
            ys: AxisScale::new(bbox.top(), bbox.bottom(), height),
            width,
            height,
        }
    }

    fn cell(&self, at: Coords) -> (i64, i64) {
        (self.xs.cell(at[0]), self.ys.cell(at[1]))
    }
}

/// Grid step near `span / target` from the 1-2-5 series.
fn tick_step(span: f64, target: usize) -> f64 {
    let raw = span.abs() / target.max(1) as f64;
    if !raw.is_finite() || raw <= 0.0 {
        return 1.0;
    }
    let magnitude = 10f64.powf(raw.log10().floor());
    let step = match raw / magnitude {
        norm if norm <= 1.0 => 1.0,
        norm if norm <= 2.0 => 2.0,
        norm if norm <= 5.0 => 5.0,
        _ => 10.0,
    };
    step * magnitude
}

fn ticks(lo: f64, hi: f64, step: f64) -> impl Iterator<Item = f64> {
    let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
    let first = (lo / step).ceil();
    let last = (hi / step).floor();
    let (first, last) = if first.is_finite() && last.is_finite() && last - first <= MAX_TICKS {
        (first as i64, last as i64)
    } else {
        (1, 0)
    };
    (first..=last)
        .map(move |k| k as f64 * step)
        .filter(move |value| value.abs() > step * 1e-9)
}

fn draw_axes(canvas: &mut Canvas, view: &Viewport, bbox: BoundingBox) -> Result<(), CanvasError> {
    let axis_row =
        view.ys.contains(0.0).then(|| view.ys.cell(0.0)).and_then(|row| usize::try_from(row).ok());
    let axis_col =
        view.xs.contains(0.0).then(|| view.xs.cell(0.0)).and_then(|col| usize::try_from(col).ok());

    if let Some(row) = axis_row.filter(|row| *row < view.height) {
        canvas.draw_hline(0, view.width - 1, row)?;
        let step = tick_step(bbox.right() - bbox.left(), view.width / 10);
        for value in ticks(bbox.left(), bbox.right(), step) {
            let label = format_tick(value);
            let col = view.xs.cell(value) - (label.chars().count() as i64) / 2;
            for (offset, ch) in label.chars().enumerate() {
                canvas.plot_under(col + offset as i64, row as i64 + 1, ch);
            }
        }
    }
    if let Some(col) = axis_col.filter(|col| *col < view.width) {
        canvas.draw_vline(col, 0, view.height - 1)?;
        let step = tick_step(bbox.top() - bbox.bottom(), view.height / 4);
        for value in ticks(bbox.bottom(), bbox.top(), step) {
            let row = view.ys.cell(value);
            for (offset, ch) in format_tick(value).chars().enumerate() {
                canvas.plot_under(col as i64 + 1 + offset as i64, row, ch);
            }
        }
    }
    Ok(())
}

/// Clips the infinite line through `p` along `d` to `bbox`.
fn clip_line(p: Coords, d: Coords, bbox: BoundingBox) -> Option<(Coords, Coords)> {
    let mut t0 = f64::NEG_INFINITY;
    let mut t1 = f64::INFINITY;
    let bounds = [(p[0], d[0], bbox.left(), bbox.right()), (p[1], d[1], bbox.bottom(), bbox.top())];
    for (start, delta, lo, hi) in bounds {
        let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
        if delta.abs() < 1e-12 {
            if start < lo || start > hi {
                return None;
            }
            continue;
        }
        let (a, b) = ((lo - start) / delta, (hi - start) / delta);
        t0 = t0.max(a.min(b));
        t1 = t1.min(a.max(b));
    }
    (t0.is_finite() && t1.is_finite() && t0 <= t1)
        .then(|| ([p[0] + t0 * d[0], p[1] + t0 * d[1]], [p[0] + t1 * d[0], p[1] + t1 * d[1]]))
}

fn draw_script(canvas: &mut Canvas, view: &Viewport, state: &BoardState) {
    let mut labels = Vec::new();
    for element in state.script.elements.iter().filter(|element| element.visible) {
        match &element.kind {
            ElementKind::Point { at } => {
                let (x, y) = view.cell(*at);
                canvas.plot(x, y, '●');
                if let Some(label) = &element.label {
                    labels.push((x + 1, y - 1, label.clone()));
                }
            }
            ElementKind::Segment { from, to } => {
                canvas.draw_segment(view.cell(*from), view.cell(*to), '·');
            }
            ElementKind::Line { through, to } => {
                let direction = [to[0] - through[0], to[1] - through[1]];
                if let Some((a, b)) = clip_line(*through, direction, state.bbox) {
                    canvas.draw_segment(view.cell(a), view.cell(b), '·');
                }
            }
            ElementKind::Circle { center, radius } => {
                let samples = 4 * view.width.max(view.height);
                for step in 0..samples {
                    let angle = std::f64::consts::TAU * step as f64 / samples as f64;
                    let at = [center[0] + radius * angle.cos(), center[1] + radius * angle.sin()];
                    let (x, y) = view.cell(at);
                    canvas.plot_under(x, y, '·');
                }
            }
            ElementKind::Polygon { vertices } => {
                for (idx, from) in vertices.iter().enumerate() {
                    let to = vertices[(idx + 1) % vertices.len()];
                    canvas.draw_segment(view.cell(*from), view.cell(to), '·');
                }
            }
            ElementKind::Text { at, text } => {
                let (x, y) = view.cell(*at);
                labels.push((x, y, text.clone()));
            }
            ElementKind::FunctionGraph { expr, domain } => {
                let mut previous: Option<(i64, i64)> = None;
                for column in 0..view.width {
                    let x = view.xs.value(column);
                    let inside = domain.map_or(true, |(lo, hi)| (lo..=hi).contains(&x));
                    let y = expr.eval(&[x]);
                    if !inside || !y.is_finite() {
                        previous = None;
                        continue;
                    }
                    let cell = (column as i64, view.ys.cell(y));
                    match previous {
                        // Steep jumps are poles, not slopes.
                        Some(prev) if (prev.1 - cell.1).abs() < view.height as i64 => {
                            canvas.draw_segment(prev, cell, '•');
                        }
                        _ => {
                            canvas.plot_under(cell.0, cell.1, '•');
                        }
                    }
                    previous = Some(cell);
                }
            }
        }
    }
    for (x, y, text) in labels {
        canvas.write_clipped(x, y, &text);
    }
}

fn draw_board(state: &BoardState, width: usize, height: usize) -> Result<String, CanvasError> {
    let mut canvas = Canvas::new(width, height)?;
    let view = Viewport::new(state.bbox, width, height);
    draw_axes(&mut canvas, &view, state.bbox)?;
    draw_script(&mut canvas, &view, state);
    Ok(canvas_to_string_trimmed(&canvas))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BoardEngine;

/// A live board. Field order matters: the listener detaches before the mount target is released.
pub struct BoardInstance {
    _listener: ListenerLease,
    lease: MountLease,
    state: Rc<RefCell<BoardState>>,
    width: usize,
    height: usize,
}

impl fmt::Debug for BoardInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoardInstance")
            .field("mount", self.lease.mount_id())
            .field("bbox", &self.state.borrow().bbox)
            .finish()
    }
}

impl BoardInstance {
    pub fn bounding_box(&self) -> BoundingBox {
        self.state.borrow().bbox
    }

    pub fn element_count(&self) -> usize {
        self.state.borrow().script.elements.len()
    }
}

impl DiagramEngine for BoardEngine {
    type Instance = BoardInstance;

    fn kind_label(&self) -> &'static str {
        DiagramKind::ScriptedGraph.label()
    }

    fn construct(
        &self,
        lease: MountLease,
        content: &str,
        options: &RenderOptions,
        input: &InputRouter,
    ) -> Result<Self::Instance, ErrorPanel> {
        let (width, height) = (options.board_width, options.board_height);
        if width < MIN_BOARD_WIDTH || height < MIN_BOARD_HEIGHT {
            return Err(BoardError::TooSmall { width, height }.into());
        }
        let script = parse_jessecode(content)
            .map_err(|err| ErrorPanel::new(self.kind_label(), err.to_string()))?;

        let state = Rc::new(RefCell::new(BoardState { bbox: BoundingBox::default(), script }));
        let weak = Rc::downgrade(&state);
        let listener = input
            .attach(lease.mount_id(), move |key| {
                let Some(state) = weak.upgrade() else {
                    return false;
                };
                let mut state = state.borrow_mut();
                match state.bbox.navigate(key) {
                    Some(bbox) => {
                        state.bbox = bbox;
                        true
                    }
                    None => false,
                }
            })
            .map_err(BoardError::from)?;

        tracing::debug!(
            mount = %lease.mount_id(),
            elements = state.borrow().script.elements.len(),
            "board initialized"
        );
        Ok(BoardInstance { _listener: listener, lease, state, width, height })
    }
}

impl EngineInstance for BoardInstance {
    fn mount_id(&self) -> &MountId {
        self.lease.mount_id()
    }

    fn render(&self) -> Result<String, ErrorPanel> {
        let state = self.state.borrow();
        draw_board(&state, self.width, self.height).map_err(|err| BoardError::from(err).into())
    }

    fn is_interactive(&self) -> bool {
        true
    }
}
