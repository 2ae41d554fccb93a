// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Stepmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! `plot-function` fences: a JSON description of function traces, sampled onto a canvas.
//!
//! ```json
//! { "title": "Parabola", "xAxis": { "domain": [-3, 3] }, "grid": true,
//!   "data": [ { "fn": "x^2 - 1" }, { "points": [[0, -1]], "fnType": "points" } ] }
//! ```

use std::f64::consts::TAU;
use std::fmt;

use serde::Deserialize;

use super::text::{centered_start, text_len, truncate_with_ellipsis};
use super::{format_tick, AxisScale, Canvas, CanvasError, RenderOptions};
use crate::engine::{DiagramEngine, EngineInstance, ErrorPanel, InputRouter, MountLease};
use crate::format::{parse_expr, Expr, ExprError};
use crate::model::{DiagramKind, MountId};

const DEFAULT_DOMAIN: (f64, f64) = (-5.0, 5.0);
const MARKERS: [char; 5] = ['•', '∘', '×', '+', '⋄'];
const MIN_WIDTH: usize = 8;
const MIN_HEIGHT: usize = 4;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlotSpec {
    title: Option<String>,
    #[serde(default)]
    x_axis: AxisSpec,
    #[serde(default)]
    y_axis: AxisSpec,
    #[serde(default)]
    grid: bool,
    #[serde(default)]
    data: Vec<TraceSpec>,
}

#[derive(Debug, Default, Deserialize)]
struct AxisSpec {
    domain: Option<[f64; 2]>,
    label: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TraceSpec {
    #[serde(rename = "fn")]
    function: Option<String>,
    points: Option<Vec<[f64; 2]>>,
    fn_type: Option<String>,
    x: Option<String>,
    y: Option<String>,
    range: Option<[f64; 2]>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlotError {
    Json { message: String },
    InvalidDomain { axis: &'static str, lo: f64, hi: f64 },
    MissingField { trace: usize, field: &'static str },
    UnsupportedTrace { trace: usize, fn_type: String },
    Expr { trace: usize, source: ExprError },
    Canvas(CanvasError),
}

impl fmt::Display for PlotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json { message } => write!(f, "invalid plot JSON: {message}"),
            Self::InvalidDomain { axis, lo, hi } => {
                write!(f, "invalid {axis} domain [{lo}, {hi}]")
            }
            Self::MissingField { trace, field } => {
                write!(f, "trace {trace} is missing \"{field}\"")
            }
            Self::UnsupportedTrace { trace, fn_type } => {
                write!(f, "trace {trace} has unsupported fnType \"{fn_type}\"")
            }
            Self::Expr { trace, source } => write!(f, "trace {trace}: {source}"),
            Self::Canvas(err) => write!(f, "canvas error: {err}"),
        }
    }
}

impl std::error::Error for PlotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Expr { source, .. } => Some(source),
            Self::Canvas(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CanvasError> for PlotError {
    fn from(err: CanvasError) -> Self {
        Self::Canvas(err)
    }
}

#[derive(Debug, Clone)]
enum Trace {
    Function { expr: Expr, source: String },
    Points(Vec<[f64; 2]>),
    Parametric { x: Expr, y: Expr, range: (f64, f64) },
}

impl Trace {
    fn legend(&self) -> String {
        match self {
            Self::Function { source, .. } => format!("y = {source}"),
            Self::Points(points) => format!("{} point(s)", points.len()),
            Self::Parametric { .. } => "parametric".to_owned(),
        }
    }
}

fn compile_expr(trace: usize, source: &str, param: &str) -> Result<Expr, PlotError> {
    parse_expr(source, &[param]).map_err(|source| PlotError::Expr { trace, source })
}

fn compile_trace(trace: usize, spec: TraceSpec) -> Result<Trace, PlotError> {
    let fn_type = match spec.fn_type.as_deref() {
        Some(fn_type) => fn_type,
        None if spec.points.is_some() => "points",
        None => "linear",
    };

    match fn_type {
        "linear" => {
            let source = spec.function.ok_or(PlotError::MissingField { trace, field: "fn" })?;
            let expr = compile_expr(trace, &source, "x")?;
            Ok(Trace::Function { expr, source })
        }
        "points" => {
            let points = spec.points.ok_or(PlotError::MissingField { trace, field: "points" })?;
            Ok(Trace::Points(points))
        }
        "parametric" => {
            let x = spec.x.ok_or(PlotError::MissingField { trace, field: "x" })?;
            let y = spec.y.ok_or(PlotError::MissingField { trace, field: "y" })?;
            let [lo, hi] = spec.range.unwrap_or([0.0, TAU]);
            Ok(Trace::Parametric {
                x: compile_expr(trace, &x, "t")?,
                y: compile_expr(trace, &y, "t")?,
                range: (lo, hi),
            })
        }
        other => Err(PlotError::UnsupportedTrace { trace, fn_type: other.to_owned() }),
    }
}

fn checked_domain(axis: &'static str, domain: [f64; 2]) -> Result<(f64, f64), PlotError> {
    let [lo, hi] = domain;
    if !lo.is_finite() || !hi.is_finite() || lo >= hi {
        return Err(PlotError::InvalidDomain { axis, lo, hi });
    }
    Ok((lo, hi))
}

fn parametric_samples(x: &Expr, y: &Expr, range: (f64, f64), count: usize) -> Vec<(f64, f64)> {
    let steps = count.max(2) - 1;
    (0..=steps)
        .map(|step| {
            let t = range.0 + (range.1 - range.0) * step as f64 / steps as f64;
            (x.eval(&[t]), y.eval(&[t]))
        })
        .collect()
}

/// Y extent of every finite sample inside the x domain, padded by a tenth on each side.
fn fit_y_domain(traces: &[Trace], x_scale: &AxisScale, columns: usize) -> (f64, f64) {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    let mut take = |x: f64, y: f64| {
        if y.is_finite() && x_scale.contains(x) {
            lo = lo.min(y);
            hi = hi.max(y);
        }
    };

    for trace in traces {
        match trace {
            Trace::Function { expr, .. } => {
                for column in 0..columns {
                    let x = x_scale.value(column);
                    take(x, expr.eval(&[x]));
                }
            }
            Trace::Points(points) => points.iter().for_each(|[x, y]| take(*x, *y)),
            Trace::Parametric { x, y, range } => {
                for (px, py) in parametric_samples(x, y, *range, columns * 4) {
                    take(px, py);
                }
            }
        }
    }

    if !lo.is_finite() || !hi.is_finite() {
        return DEFAULT_DOMAIN;
    }
    if hi - lo < f64::EPSILON {
        return (lo - 1.0, hi + 1.0);
    }
    let pad = (hi - lo) * 0.1;
    (lo - pad, hi + pad)
}

/// The plot rectangle inside the canvas; writes outside it are dropped.
struct PlotArea {
    left: usize,
    top: usize,
    width: usize,
    height: usize,
}

impl PlotArea {
    fn put(&self, canvas: &mut Canvas, column: i64, row: i64, ch: char) {
        let (Ok(column), Ok(row)) = (usize::try_from(column), usize::try_from(row)) else {
            return;
        };
        if column < self.width && row < self.height {
            let _ = canvas.set(self.left + column, self.top + row, ch);
        }
    }

    fn put_under(&self, canvas: &mut Canvas, column: usize, row: usize, ch: char) {
        if column < self.width
            && row < self.height
            && canvas.is_blank(self.left + column, self.top + row)
        {
            let _ = canvas.set(self.left + column, self.top + row, ch);
        }
    }
}

/// Renders one `plot-function` body.
pub fn render_function_plot(content: &str, options: &RenderOptions) -> Result<String, PlotError> {
    let spec: PlotSpec =
        serde_json::from_str(content).map_err(|err| PlotError::Json { message: err.to_string() })?;

    let x_domain = match spec.x_axis.domain {
        Some(domain) => checked_domain("x", domain)?,
        None => DEFAULT_DOMAIN,
    };
    let traces = spec
        .data
        .into_iter()
        .enumerate()
        .map(|(idx, trace)| compile_trace(idx, trace))
        .collect::<Result<Vec<_>, _>>()?;

    let width = options.plot_width.max(MIN_WIDTH);
    let height = options.plot_height.max(MIN_HEIGHT);
    let x_scale = AxisScale::new(x_domain.0, x_domain.1, width);
    let y_domain = match spec.y_axis.domain {
        Some(domain) => checked_domain("y", domain)?,
        None => fit_y_domain(&traces, &x_scale, width),
    };
    // Rows grow downwards, so the top row is the high end.
    let y_scale = AxisScale::new(y_domain.1, y_domain.0, height);

    let y_ticks = [format_tick(y_domain.1), format_tick(y_domain.0)];
    let gutter = y_ticks.iter().map(|tick| text_len(tick)).max().unwrap_or(0) + 1;
    let title_rows = usize::from(spec.title.is_some()) + usize::from(spec.y_axis.label.is_some());
    let legend_rows = if traces.len() > 1 { traces.len() } else { 0 };
    let footer_rows = 1 + usize::from(spec.x_axis.label.is_some()) + legend_rows;
    let total_width = gutter + 1 + width;
    let mut canvas = Canvas::new(total_width, title_rows + height + 1 + footer_rows)?;

    let mut row = 0;
    if let Some(title) = &spec.title {
        let title = truncate_with_ellipsis(title, total_width);
        canvas.write_str(centered_start(&title, total_width), row, &title)?;
        row += 1;
    }
    if let Some(label) = &spec.y_axis.label {
        canvas.write_str(0, row, &truncate_with_ellipsis(label, total_width))?;
        row += 1;
    }

    let area = PlotArea { left: gutter + 1, top: row, width, height };
    let axis_row = area.top + height;
    canvas.draw_vline(gutter, area.top, axis_row)?;
    canvas.draw_hline(gutter, gutter + width, axis_row)?;
    canvas.write_str(gutter - text_len(&y_ticks[0]) - 1, area.top, &y_ticks[0])?;
    canvas.write_str(gutter - text_len(&y_ticks[1]) - 1, area.top + height - 1, &y_ticks[1])?;

    if spec.grid {
        for quarter in 1..4 {
            let grid_row = height * quarter / 4;
            let grid_column = width * quarter / 4;
            for column in 0..width {
                area.put_under(&mut canvas, column, grid_row, '·');
            }
            for grid_y in 0..height {
                area.put_under(&mut canvas, grid_column, grid_y, '·');
            }
        }
    }
    if y_scale.contains(0.0) {
        let zero = y_scale.cell(0.0);
        for column in 0..width {
            area.put(&mut canvas, column as i64, zero, '┈');
        }
    }
    if x_scale.contains(0.0) {
        let zero = x_scale.cell(0.0);
        for grid_y in 0..height {
            area.put(&mut canvas, zero, grid_y as i64, '┊');
        }
    }

    for (idx, trace) in traces.iter().enumerate() {
        let marker = MARKERS[idx % MARKERS.len()];
        match trace {
            Trace::Function { expr, .. } => {
                let mut previous: Option<i64> = None;
                for column in 0..width {
                    let y = expr.eval(&[x_scale.value(column)]);
                    if !y.is_finite() {
                        previous = None;
                        continue;
                    }
                    let cell = y_scale.cell(y);
                    let column = column as i64;
                    area.put(&mut canvas, column, cell, marker);
                    // Join steep neighbours, but not across a pole.
                    if let Some(prev) = previous {
                        let gap = (cell - prev).abs();
                        if gap > 1 && gap < height as i64 {
                            let (from, to) =
                                if prev < cell { (prev + 1, cell) } else { (cell + 1, prev) };
                            for fill in from..to {
                                area.put(&mut canvas, column, fill, marker);
                            }
                        }
                    }
                    previous = Some(cell);
                }
            }
            Trace::Points(points) => {
                for [x, y] in points {
                    area.put(&mut canvas, x_scale.cell(*x), y_scale.cell(*y), marker);
                }
            }
            Trace::Parametric { x, y, range } => {
                for (px, py) in parametric_samples(x, y, *range, width * 4) {
                    if px.is_finite() && py.is_finite() {
                        area.put(&mut canvas, x_scale.cell(px), y_scale.cell(py), marker);
                    }
                }
            }
        }
    }

    let mut row = axis_row + 1;
    let lo_tick = format_tick(x_domain.0);
    let hi_tick = format_tick(x_domain.1);
    canvas.write_str(area.left, row, &lo_tick)?;
    canvas.write_str((area.left + width).saturating_sub(text_len(&hi_tick)), row, &hi_tick)?;
    row += 1;
    if let Some(label) = &spec.x_axis.label {
        let label = truncate_with_ellipsis(label, width);
        canvas.write_str(area.left + centered_start(&label, width), row, &label)?;
        row += 1;
    }
    if legend_rows > 0 {
        for (idx, trace) in traces.iter().enumerate() {
            let entry = format!("{} {}", MARKERS[idx % MARKERS.len()], trace.legend());
            canvas.write_str(area.left, row, &truncate_with_ellipsis(&entry, width))?;
            row += 1;
        }
    }

    Ok(canvas.to_string().lines().map(str::trim_end).collect::<Vec<_>>().join("\n"))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FunctionPlotEngine;

/// A rendered function plot. The plot is static, so rendering happens once at construction.
#[derive(Debug)]
pub struct FunctionPlotInstance {
    lease: MountLease,
    text: String,
}

impl DiagramEngine for FunctionPlotEngine {
    type Instance = FunctionPlotInstance;

    fn kind_label(&self) -> &'static str {
        DiagramKind::FunctionPlot.label()
    }

    fn construct(
        &self,
        lease: MountLease,
        content: &str,
        options: &RenderOptions,
        _input: &InputRouter,
    ) -> Result<Self::Instance, ErrorPanel> {
        let text = render_function_plot(content, options)
            .map_err(|err| ErrorPanel::new(self.kind_label(), err.to_string()))?;
        Ok(FunctionPlotInstance { lease, text })
    }
}

impl EngineInstance for FunctionPlotInstance {
    fn mount_id(&self) -> &MountId {
        self.lease.mount_id()
    }

    fn render(&self) -> Result<String, ErrorPanel> {
        Ok(self.text.clone())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{render_function_plot, PlotError};
    use crate::render::RenderOptions;

    fn small() -> RenderOptions {
        RenderOptions { plot_width: 21, plot_height: 11, ..RenderOptions::default() }
    }

    #[test]
    fn line_through_the_origin_hits_both_corners() {
        let text = render_function_plot(
            r#"{"xAxis":{"domain":[-1,1]},"yAxis":{"domain":[-1,1]},"data":[{"fn":"x"}]}"#,
            &small(),
        )
        .expect("plot");
        let lines: Vec<&str> = text.lines().collect();
        // "-1", a space and the frame column put the plot at column 4.
        assert!(lines[0].starts_with(" 1 │"), "{text}");
        assert_eq!(lines[0].chars().nth(4 + 20), Some('•'), "{text}");
        assert!(lines[10].starts_with("-1 │"), "{text}");
        assert_eq!(lines[10].chars().nth(4), Some('•'), "{text}");
        assert!(lines[11].starts_with("   └"), "{text}");
        assert!(lines[12].trim_start().starts_with("-1"), "{text}");
        assert!(lines[12].trim_end().ends_with('1'), "{text}");
    }

    #[test]
    fn title_and_legend_are_drawn() {
        let text = render_function_plot(
            r#"{"title":"Two","data":[{"fn":"sin(x)"},{"points":[[0,0]]}]}"#,
            &small(),
        )
        .expect("plot");
        assert_eq!(text.lines().next().map(str::trim), Some("Two"));
        assert!(text.contains("• y = sin(x)"), "{text}");
        assert!(text.contains("∘ 1 point(s)"), "{text}");
    }

    #[test]
    fn poles_are_not_bridged() {
        let text = render_function_plot(
            r#"{"xAxis":{"domain":[-1,1]},"yAxis":{"domain":[-5,5]},"data":[{"fn":"1/x"}]}"#,
            &small(),
        )
        .expect("plot");
        let column_of_zero: Vec<char> =
            text.lines().take(11).filter_map(|line| line.chars().nth(4 + 10)).collect();
        assert!(column_of_zero.iter().all(|ch| *ch != '•'), "{text}");
    }

    #[rstest]
    #[case("{\"data\": [", "invalid plot JSON")]
    #[case(r#"{"data":[{"fn":"x +"}]}"#, "trace 0: unexpected end of expression")]
    #[case(r#"{"data":[{"fnType":"polar","r":"1"}]}"#, "unsupported fnType \"polar\"")]
    #[case(r#"{"data":[{"fnType":"parametric","x":"t"}]}"#, "trace 0 is missing \"y\"")]
    #[case(r#"{"xAxis":{"domain":[2,1]},"data":[]}"#, "invalid x domain [2, 1]")]
    fn rejects_bad_descriptions(#[case] content: &str, #[case] expected: &str) {
        let err = render_function_plot(content, &small()).unwrap_err();
        assert!(err.to_string().contains(expected), "{err}");
    }

    #[test]
    fn missing_fn_is_reported_with_its_trace() {
        let err = render_function_plot(r#"{"data":[{"fn":"x"},{}]}"#, &small()).unwrap_err();
        assert_eq!(err, PlotError::MissingField { trace: 1, field: "fn" });
    }

    #[test]
    fn empty_data_still_draws_axes() {
        let text = render_function_plot("{}", &small()).expect("plot");
        assert!(text.contains('└'));
        assert!(text.contains('┊'));
    }
}
