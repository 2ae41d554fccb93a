// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Stepmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Text-mode diagram engines.
//!
//! Every engine draws onto a [`Canvas`] and hands back plain Unicode text; the view layer decides
//! where that text lands. The streaming placeholder lives here too since it is the stand-in for an
//! engine that is not allowed to run yet.

use std::fmt;
use std::time::Duration;

pub mod board;
pub mod flowchart;
pub mod force_plot;
pub mod function_plot;
pub mod placeholder;
pub(crate) mod text;

pub use board::{BoardEngine, BoardError, BoardInstance};
pub use flowchart::{render_flowchart, FlowchartEngine, FlowchartInstance, FlowchartRenderError};
pub use force_plot::{ForcePlotEngine, ForcePlotError, ForcePlotInstance};
pub use function_plot::{FunctionPlotEngine, FunctionPlotInstance, PlotError};
pub use placeholder::{Placeholder, ShimmerFrame};

/// Sizes and timings shared by every engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub plot_width: usize,
    pub plot_height: usize,
    pub board_width: usize,
    pub board_height: usize,
    pub placeholder_period: Duration,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            plot_width: 60,
            plot_height: 16,
            board_width: 61,
            board_height: 21,
            placeholder_period: Duration::from_secs(1),
        }
    }
}

pub const UNICODE_BOX_HORIZONTAL: char = '─';
pub const UNICODE_BOX_VERTICAL: char = '│';
pub const UNICODE_BOX_TOP_LEFT: char = '┌';
pub const UNICODE_BOX_TOP_RIGHT: char = '┐';
pub const UNICODE_BOX_BOTTOM_LEFT: char = '└';
pub const UNICODE_BOX_BOTTOM_RIGHT: char = '┘';
pub const UNICODE_BOX_TEE_RIGHT: char = '├';
pub const UNICODE_BOX_TEE_LEFT: char = '┤';
pub const UNICODE_BOX_TEE_DOWN: char = '┬';
pub const UNICODE_BOX_TEE_UP: char = '┴';
pub const UNICODE_BOX_CROSS: char = '┼';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BoxEdges(u8);

impl BoxEdges {
    const NONE: Self = Self(0);
    const LEFT: Self = Self(1 << 0);
    const RIGHT: Self = Self(1 << 1);
    const UP: Self = Self(1 << 2);
    const DOWN: Self = Self(1 << 3);

    fn is_empty(self) -> bool {
        self.0 == 0
    }

    fn contains(self, other: Self) -> bool {
        (self.0 & other.0) != 0
    }

    fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

fn box_edges_from_char(ch: char) -> Option<BoxEdges> {
    let (l, r, u, d) = (BoxEdges::LEFT, BoxEdges::RIGHT, BoxEdges::UP, BoxEdges::DOWN);
    match ch {
        UNICODE_BOX_HORIZONTAL => Some(l.union(r)),
        UNICODE_BOX_VERTICAL => Some(u.union(d)),
        UNICODE_BOX_TOP_LEFT => Some(r.union(d)),
        UNICODE_BOX_TOP_RIGHT => Some(l.union(d)),
        UNICODE_BOX_BOTTOM_LEFT => Some(r.union(u)),
        UNICODE_BOX_BOTTOM_RIGHT => Some(l.union(u)),
        UNICODE_BOX_TEE_RIGHT => Some(u.union(d).union(r)),
        UNICODE_BOX_TEE_LEFT => Some(u.union(d).union(l)),
        UNICODE_BOX_TEE_DOWN => Some(l.union(r).union(d)),
        UNICODE_BOX_TEE_UP => Some(l.union(r).union(u)),
        UNICODE_BOX_CROSS => Some(l.union(r).union(u).union(d)),
        _ => None,
    }
}

fn box_char_from_edges(edges: BoxEdges) -> char {
    match edges.0 {
        0 => ' ',
        1..=3 => UNICODE_BOX_HORIZONTAL,
        4 | 8 | 12 => UNICODE_BOX_VERTICAL,
        10 => UNICODE_BOX_TOP_LEFT,
        9 => UNICODE_BOX_TOP_RIGHT,
        6 => UNICODE_BOX_BOTTOM_LEFT,
        5 => UNICODE_BOX_BOTTOM_RIGHT,
        14 => UNICODE_BOX_TEE_RIGHT,
        13 => UNICODE_BOX_TEE_LEFT,
        11 => UNICODE_BOX_TEE_DOWN,
        7 => UNICODE_BOX_TEE_UP,
        _ => UNICODE_BOX_CROSS,
    }
}

/// A fixed-size, bounds-checked character grid.
///
/// Collisions are deterministic: plain characters overwrite, box-drawing characters merge into
/// junctions (`┼`, `├`, `┤`, `┬`, `┴`). The `plot_*` and `draw_segment` helpers take signed
/// coordinates and silently clip, which is what data-driven engines want; the `draw_*` helpers
/// are strict and report out-of-bounds geometry as an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canvas {
    width: usize,
    height: usize,
    cells: Vec<char>,
    box_edges: Vec<BoxEdges>,
}

impl Canvas {
    pub fn new(width: usize, height: usize) -> Result<Self, CanvasError> {
        Self::new_filled(width, height, ' ')
    }

    pub fn new_filled(width: usize, height: usize, fill: char) -> Result<Self, CanvasError> {
        let len = width.checked_mul(height).ok_or(CanvasError::AreaOverflow { width, height })?;
        Ok(Self { width, height, cells: vec![fill; len], box_edges: vec![BoxEdges::NONE; len] })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn in_bounds(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height
    }

    pub fn get(&self, x: usize, y: usize) -> Result<char, CanvasError> {
        let idx = self.index_of(x, y)?;
        Ok(self.render_at(x, y, idx))
    }

    pub fn set(&mut self, x: usize, y: usize, ch: char) -> Result<(), CanvasError> {
        let idx = self.index_of(x, y)?;
        if let Some(edges) = box_edges_from_char(ch) {
            self.box_edges[idx] = self.box_edges[idx].union(edges);
        } else {
            self.cells[idx] = ch;
            self.box_edges[idx] = BoxEdges::NONE;
        }
        Ok(())
    }

    /// True when the cell holds neither a character nor box edges.
    pub fn is_blank(&self, x: usize, y: usize) -> bool {
        match self.index_of(x, y) {
            Ok(idx) => self.box_edges[idx].is_empty() && self.cells[idx] == ' ',
            Err(_) => false,
        }
    }

    /// Sets `(x, y)` when it lies on the canvas; returns whether it did.
    pub fn plot(&mut self, x: i64, y: i64, ch: char) -> bool {
        let (Ok(x), Ok(y)) = (usize::try_from(x), usize::try_from(y)) else {
            return false;
        };
        self.set(x, y, ch).is_ok()
    }

    /// Like [`Canvas::plot`] but leaves occupied cells alone.
    pub fn plot_under(&mut self, x: i64, y: i64, ch: char) -> bool {
        let (Ok(ux), Ok(uy)) = (usize::try_from(x), usize::try_from(y)) else {
            return false;
        };
        if !self.is_blank(ux, uy) {
            return false;
        }
        self.plot(x, y, ch)
    }

    /// Bresenham segment between two cells, clipped to the canvas. Occupied cells are kept.
    ///
    /// Endpoints may lie arbitrarily far off the canvas; only the visible part is walked.
    pub fn draw_segment(&mut self, from: (i64, i64), to: (i64, i64), ch: char) {
        let Some((from, to)) = self.clip_segment(from, to) else {
            return;
        };
        let (mut x, mut y) = from;
        let dx = (to.0 - x).abs();
        let dy = -(to.1 - y).abs();
        let sx = if x < to.0 { 1 } else { -1 };
        let sy = if y < to.1 { 1 } else { -1 };
        let mut err = dx + dy;

        loop {
            self.plot_under(x, y, ch);
            if x == to.0 && y == to.1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// Liang-Barsky clip of the segment `from..=to` against the canvas rectangle.
    fn clip_segment(&self, from: (i64, i64), to: (i64, i64)) -> Option<((i64, i64), (i64, i64))> {
        if self.width == 0 || self.height == 0 {
            return None;
        }
        let (x0, y0) = (from.0 as f64, from.1 as f64);
        let (dx, dy) = (to.0 as f64 - x0, to.1 as f64 - y0);
        let mut t0 = 0.0_f64;
        let mut t1 = 1.0_f64;
        let bounds = [
            (x0, dx, 0.0, (self.width - 1) as f64),
            (y0, dy, 0.0, (self.height - 1) as f64),
        ];
        for (start, delta, lo, hi) in bounds {
            if delta == 0.0 {
                if start < lo || start > hi {
                    return None;
                }
                continue;
            }
            let (a, b) = ((lo - start) / delta, (hi - start) / delta);
            t0 = t0.max(a.min(b));
            t1 = t1.min(a.max(b));
        }
        if t0 > t1 {
            return None;
        }
        let max_x = (self.width - 1) as f64;
        let max_y = (self.height - 1) as f64;
        let cell = |t: f64| {
            (
                (x0 + t * dx).round().clamp(0.0, max_x) as i64,
                (y0 + t * dy).round().clamp(0.0, max_y) as i64,
            )
        };
        Some((cell(t0), cell(t1)))
    }

    /// Writes `text` starting at `(x, y)`, clipped on every side.
    pub fn write_clipped(&mut self, x: i64, y: i64, text: &str) {
        for (offset, ch) in text.chars().enumerate() {
            let Ok(offset) = i64::try_from(offset) else {
                break;
            };
            self.plot(x + offset, y, ch);
        }
    }

    /// Writes `text` left-to-right starting at `(x, y)`, clipping at the right edge.
    pub fn write_str(&mut self, x: usize, y: usize, text: &str) -> Result<(), CanvasError> {
        if y >= self.height {
            return Err(self.out_of_bounds(x, y));
        }
        for (x, ch) in (x..self.width).zip(text.chars()) {
            self.set(x, y, ch)?;
        }
        Ok(())
    }

    pub fn draw_hline(&mut self, x0: usize, x1: usize, y: usize) -> Result<(), CanvasError> {
        let (min_x, max_x) = if x0 <= x1 { (x0, x1) } else { (x1, x0) };
        self.check(min_x, y)?;
        self.check(max_x, y)?;
        for x in min_x..=max_x {
            self.set(x, y, UNICODE_BOX_HORIZONTAL)?;
        }
        Ok(())
    }

    pub fn draw_vline(&mut self, x: usize, y0: usize, y1: usize) -> Result<(), CanvasError> {
        let (min_y, max_y) = if y0 <= y1 { (y0, y1) } else { (y1, y0) };
        self.check(x, min_y)?;
        self.check(x, max_y)?;
        for y in min_y..=max_y {
            self.set(x, y, UNICODE_BOX_VERTICAL)?;
        }
        Ok(())
    }

    /// Draws a single-line box with corners at `(x0, y0)` and `(x1, y1)`. Nothing is drawn when
    /// any corner is off the canvas.
    pub fn draw_box(
        &mut self,
        x0: usize,
        y0: usize,
        x1: usize,
        y1: usize,
    ) -> Result<(), CanvasError> {
        let (min_x, max_x) = if x0 <= x1 { (x0, x1) } else { (x1, x0) };
        let (min_y, max_y) = if y0 <= y1 { (y0, y1) } else { (y1, y0) };
        self.check(max_x, min_y)?;
        self.check(min_x, max_y)?;

        if min_y == max_y {
            return self.draw_hline(min_x, max_x, min_y);
        }
        if min_x == max_x {
            return self.draw_vline(min_x, min_y, max_y);
        }

        for x in (min_x + 1)..max_x {
            self.set(x, min_y, UNICODE_BOX_HORIZONTAL)?;
            self.set(x, max_y, UNICODE_BOX_HORIZONTAL)?;
        }
        for y in (min_y + 1)..max_y {
            self.set(min_x, y, UNICODE_BOX_VERTICAL)?;
            self.set(max_x, y, UNICODE_BOX_VERTICAL)?;
        }
        self.set(min_x, min_y, UNICODE_BOX_TOP_LEFT)?;
        self.set(max_x, min_y, UNICODE_BOX_TOP_RIGHT)?;
        self.set(min_x, max_y, UNICODE_BOX_BOTTOM_LEFT)?;
        self.set(max_x, max_y, UNICODE_BOX_BOTTOM_RIGHT)?;
        Ok(())
    }

    fn check(&self, x: usize, y: usize) -> Result<(), CanvasError> {
        if self.in_bounds(x, y) {
            Ok(())
        } else {
            Err(self.out_of_bounds(x, y))
        }
    }

    fn out_of_bounds(&self, x: usize, y: usize) -> CanvasError {
        CanvasError::OutOfBounds { x, y, width: self.width, height: self.height }
    }

    fn index_of(&self, x: usize, y: usize) -> Result<usize, CanvasError> {
        self.check(x, y)?;
        Ok((y * self.width) + x)
    }

    fn render_at(&self, x: usize, y: usize, idx: usize) -> char {
        let edges = self.box_edges[idx];
        if edges.is_empty() {
            return self.cells[idx];
        }
        let connected = self.connected_box_edges(x, y, edges);
        box_char_from_edges(if connected.is_empty() { edges } else { connected })
    }

    fn connected_box_edges(&self, x: usize, y: usize, edges: BoxEdges) -> BoxEdges {
        let neighbours = [
            (BoxEdges::LEFT, BoxEdges::RIGHT, x.checked_sub(1).map(|nx| (nx, y))),
            (BoxEdges::RIGHT, BoxEdges::LEFT, Some((x + 1, y)).filter(|(nx, _)| *nx < self.width)),
            (BoxEdges::UP, BoxEdges::DOWN, y.checked_sub(1).map(|ny| (x, ny))),
            (BoxEdges::DOWN, BoxEdges::UP, Some((x, y + 1)).filter(|(_, ny)| *ny < self.height)),
        ];

        let mut connected = BoxEdges::NONE;
        for (side, facing, cell) in neighbours {
            let Some((nx, ny)) = cell else {
                continue;
            };
            if edges.contains(side) && self.box_edges[(ny * self.width) + nx].contains(facing) {
                connected = connected.union(side);
            }
        }
        connected
    }
}

impl fmt::Display for Canvas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use std::fmt::Write as _;

        for y in 0..self.height {
            for x in 0..self.width {
                f.write_char(self.render_at(x, y, (y * self.width) + x))?;
            }
            if y + 1 < self.height {
                f.write_char('\n')?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanvasError {
    AreaOverflow { width: usize, height: usize },
    OutOfBounds { x: usize, y: usize, width: usize, height: usize },
}

impl fmt::Display for CanvasError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AreaOverflow { width, height } => {
                write!(f, "canvas area overflow: {width}*{height}")
            }
            Self::OutOfBounds { x, y, width, height } => {
                write!(f, "out of bounds: ({x},{y}) for {width}x{height} canvas")
            }
        }
    }
}

impl std::error::Error for CanvasError {}

/// Linear map from a world interval onto `cells` grid positions (`0..cells`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct AxisScale {
    lo: f64,
    hi: f64,
    cells: usize,
}

impl AxisScale {
    pub(crate) fn new(lo: f64, hi: f64, cells: usize) -> Self {
        Self { lo, hi, cells }
    }

    pub(crate) fn lo(&self) -> f64 {
        self.lo
    }

    pub(crate) fn hi(&self) -> f64 {
        self.hi
    }

    /// Cell index of `value`; may fall outside `0..cells`.
    pub(crate) fn cell(&self, value: f64) -> i64 {
        let span = self.hi - self.lo;
        if self.cells < 2 || span == 0.0 || !value.is_finite() {
            return 0;
        }
        let last = (self.cells - 1) as f64;
        let cell = ((value - self.lo) / span * last).round();
        cell.clamp(i64::MIN as f64 / 2.0, i64::MAX as f64 / 2.0) as i64
    }

    /// World value at the center of cell `index`.
    pub(crate) fn value(&self, index: usize) -> f64 {
        if self.cells < 2 {
            return self.lo;
        }
        self.lo + (self.hi - self.lo) * index as f64 / (self.cells - 1) as f64
    }

    pub(crate) fn contains(&self, value: f64) -> bool {
        let (min, max) = if self.lo <= self.hi { (self.lo, self.hi) } else { (self.hi, self.lo) };
        (min..=max).contains(&value)
    }
}

/// Formats an axis tick: integers without a fraction, everything else with up to two decimals.
pub(crate) fn format_tick(value: f64) -> String {
    if !value.is_finite() {
        return "?".to_owned();
    }
    let rounded = value.round();
    if (value - rounded).abs() < 1e-9 && rounded.abs() < 1e15 {
        let mut buf = itoa::Buffer::new();
        return buf.format(rounded as i64).to_owned();
    }
    let text = format!("{value:.2}");
    text.trim_end_matches('0').trim_end_matches('.').to_owned()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{format_tick, AxisScale, Canvas, CanvasError};

    #[test]
    fn set_and_get_in_bounds() {
        let mut c = Canvas::new_filled(3, 2, '.').expect("canvas");
        c.set(1, 0, 'X').expect("set");
        assert_eq!(c.get(1, 0).expect("get"), 'X');
        assert_eq!(c.to_string(), ".X.\n...");
    }

    #[test]
    fn out_of_bounds_access_errors() {
        let mut c = Canvas::new(2, 2).expect("canvas");
        assert_eq!(
            c.set(2, 0, 'X').unwrap_err(),
            CanvasError::OutOfBounds { x: 2, y: 0, width: 2, height: 2 }
        );
        assert!(c.get(0, 2).is_err());
    }

    #[test]
    fn rejects_area_overflow() {
        assert_eq!(
            Canvas::new_filled(usize::MAX, 2, '.').unwrap_err(),
            CanvasError::AreaOverflow { width: usize::MAX, height: 2 }
        );
    }

    #[test]
    fn write_str_clips_at_right_edge() {
        let mut c = Canvas::new_filled(4, 1, '.').expect("canvas");
        c.write_str(2, 0, "abcdef").expect("write");
        assert_eq!(c.to_string(), "..ab");
    }

    #[test]
    fn write_clipped_accepts_negative_origins() {
        let mut c = Canvas::new_filled(4, 1, '.').expect("canvas");
        c.write_clipped(-2, 0, "abcd");
        c.write_clipped(0, 3, "zz");
        assert_eq!(c.to_string(), "cd..");
    }

    #[test]
    fn draw_box_draws_corners_and_is_not_partial_when_clipped() {
        let mut c = Canvas::new_filled(6, 5, '.').expect("canvas");
        c.draw_box(1, 1, 4, 3).expect("box");
        assert_eq!(c.to_string(), "......\n.┌──┐.\n.│..│.\n.└──┘.\n......");

        let mut c = Canvas::new_filled(4, 3, '.').expect("canvas");
        assert!(c.draw_box(0, 0, 4, 2).is_err());
        assert_eq!(c.to_string(), "....\n....\n....");
    }

    #[test]
    fn crossing_lines_merge_into_junctions() {
        let mut c = Canvas::new_filled(5, 5, '.').expect("canvas");
        c.draw_hline(0, 4, 2).expect("hline");
        c.draw_vline(2, 0, 4).expect("vline");
        assert_eq!(c.to_string(), "..│..\n..│..\n──┼──\n..│..\n..│..");

        let mut c = Canvas::new_filled(5, 5, '.').expect("canvas");
        c.draw_hline(0, 4, 2).expect("hline");
        c.draw_vline(2, 2, 4).expect("vline");
        assert_eq!(c.to_string(), ".....\n.....\n──┬──\n..│..\n..│..");
    }

    #[test]
    fn segments_keep_existing_cells() {
        let mut c = Canvas::new_filled(4, 4, ' ').expect("canvas");
        c.set(1, 1, '●').expect("set");
        c.draw_segment((0, 0), (3, 3), '·');
        assert_eq!(c.to_string(), "·   \n ●  \n  · \n   ·");
    }

    #[test]
    fn segments_clip_outside_the_canvas() {
        let mut c = Canvas::new_filled(3, 1, '.').expect("canvas");
        c.draw_segment((-5, 0), (10, 0), '-');
        assert_eq!(c.to_string(), "---");
    }

    #[test]
    fn segments_with_far_endpoints_only_walk_the_visible_part() {
        let mut c = Canvas::new_filled(3, 1, '.').expect("canvas");
        c.draw_segment((0, 0), (i64::MAX / 2, 0), '-');
        assert_eq!(c.to_string(), "---");

        let mut c = Canvas::new_filled(3, 3, '.').expect("canvas");
        c.draw_segment((-1_000_000_000, -1_000_000_000), (1_000_000_000, 1_000_000_000), '*');
        assert_eq!(c.to_string(), "*..\n.*.\n..*");

        let mut c = Canvas::new_filled(3, 1, '.').expect("canvas");
        c.draw_segment((0, 5), (i64::MAX / 2, 5), '-');
        assert_eq!(c.to_string(), "...");
    }

    #[test]
    fn axis_scale_maps_both_ends() {
        let scale = AxisScale::new(-1.0, 1.0, 5);
        assert_eq!(scale.cell(-1.0), 0);
        assert_eq!(scale.cell(0.0), 2);
        assert_eq!(scale.cell(1.0), 4);
        assert_eq!(scale.value(4), 1.0);

        let flipped = AxisScale::new(10.0, -10.0, 21);
        assert_eq!(flipped.cell(10.0), 0);
        assert_eq!(flipped.cell(-10.0), 20);
        assert!(flipped.contains(0.0));
    }

    #[rstest]
    #[case(3.0, "3")]
    #[case(-12.0, "-12")]
    #[case(0.5, "0.5")]
    #[case(1.234, "1.23")]
    #[case(f64::NAN, "?")]
    fn formats_ticks(#[case] value: f64, #[case] expected: &str) {
        assert_eq!(format_tick(value), expected);
    }
}
