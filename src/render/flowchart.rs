// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Stepmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;

use crate::engine::{DiagramEngine, EngineInstance, ErrorPanel, InputRouter, MountLease};
use crate::format::{parse_flowchart, FlowchartParseError};
use crate::layout::{layout_flowchart, FlowchartLayout};
use crate::model::{DiagramKind, FlowDirection, FlowchartAst, MountId, NodeShape};

use super::text::{canvas_to_string_trimmed, text_len, truncate_with_ellipsis};
use super::{Canvas, CanvasError, RenderOptions};

const MAX_NODE_LABEL: usize = 24;
const MAX_EDGE_LABEL: usize = 16;
const BOX_HEIGHT: usize = 3;
const BOX_PADDING: usize = 4;
const TD_LAYER_STEP: usize = 6;
const TD_NODE_GAP: usize = 3;
const TD_LANE_MARGIN: usize = 2;
const LR_NODE_STEP: usize = 4;
const LR_MIN_GAP: usize = 6;
const LR_LANE_MARGIN: usize = 3;
const EMPTY_NOTE: &str = "(empty flowchart)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowchartRenderError {
    Parse(FlowchartParseError),
    Canvas(CanvasError),
}

impl fmt::Display for FlowchartRenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "{err}"),
            Self::Canvas(err) => write!(f, "canvas error: {err}"),
        }
    }
}

impl std::error::Error for FlowchartRenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::Canvas(err) => Some(err),
        }
    }
}

impl From<FlowchartParseError> for FlowchartRenderError {
    fn from(err: FlowchartParseError) -> Self {
        Self::Parse(err)
    }
}

impl From<CanvasError> for FlowchartRenderError {
    fn from(err: CanvasError) -> Self {
        Self::Canvas(err)
    }
}

/// One drawing instruction. Geometry is built for top-down (or left-right) flow and mirrored
/// afterwards for the reversed directions.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Prim {
    Node { x: usize, y: usize, w: usize, shape: NodeShape, label: String },
    HLine { y: usize, x0: usize, x1: usize },
    VLine { x: usize, y0: usize, y1: usize },
    Arrow { x: usize, y: usize, ch: char },
    Text { x: usize, y: usize, text: String },
}

impl Prim {
    /// Draw order: boxes, then connectors, then arrow heads, then edge labels.
    fn pass(&self) -> u8 {
        match self {
            Self::Node { .. } => 0,
            Self::HLine { .. } | Self::VLine { .. } => 1,
            Self::Arrow { .. } => 2,
            Self::Text { .. } => 3,
        }
    }

    /// Bottom-right cell this primitive touches.
    fn extent(&self) -> (usize, usize) {
        match self {
            Self::Node { x, y, w, .. } => (x + w - 1, y + BOX_HEIGHT - 1),
            Self::HLine { y, x0, x1 } => ((*x0).max(*x1), *y),
            Self::VLine { x, y0, y1 } => (*x, (*y0).max(*y1)),
            Self::Arrow { x, y, .. } => (*x, *y),
            Self::Text { x, y, text } => (x + text_len(text).saturating_sub(1), *y),
        }
    }

    fn mirror_rows(self, height: usize) -> Self {
        let flip = |y: usize| height - 1 - y;
        match self {
            Self::Node { x, y, w, shape, label } => {
                Self::Node { x, y: height - y - BOX_HEIGHT, w, shape, label }
            }
            Self::HLine { y, x0, x1 } => Self::HLine { y: flip(y), x0, x1 },
            Self::VLine { x, y0, y1 } => Self::VLine { x, y0: flip(y0), y1: flip(y1) },
            Self::Arrow { x, y, ch } => {
                Self::Arrow { x, y: flip(y), ch: if ch == '▼' { '▲' } else { ch } }
            }
            Self::Text { x, y, text } => Self::Text { x, y: flip(y), text },
        }
    }

    /// Text keeps reading left to right, so it is anchored by its right end.
    fn mirror_columns(self, width: usize) -> Self {
        let flip = |x: usize| width - 1 - x;
        match self {
            Self::Node { x, y, w, shape, label } => {
                Self::Node { x: width - x - w, y, w, shape, label }
            }
            Self::HLine { y, x0, x1 } => Self::HLine { y, x0: flip(x0), x1: flip(x1) },
            Self::VLine { x, y0, y1 } => Self::VLine { x: flip(x), y0, y1 },
            Self::Arrow { x, y, ch } => {
                Self::Arrow { x: flip(x), y, ch: if ch == '▶' { '◀' } else { ch } }
            }
            Self::Text { x, y, text } => {
                let len = text_len(&text);
                Self::Text { x: width - x - len, y, text }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct NodeBox {
    x: usize,
    y: usize,
    w: usize,
}

impl NodeBox {
    fn cx(self) -> usize {
        self.x + self.w / 2
    }

    fn cy(self) -> usize {
        self.y + 1
    }

    fn right(self) -> usize {
        self.x + self.w - 1
    }
}

struct Plan<'a> {
    ast: &'a FlowchartAst,
    layout: &'a FlowchartLayout,
    labels: Vec<String>,
}

impl<'a> Plan<'a> {
    fn new(ast: &'a FlowchartAst, layout: &'a FlowchartLayout) -> Self {
        let labels = ast
            .nodes()
            .iter()
            .map(|node| truncate_with_ellipsis(node.label(), MAX_NODE_LABEL))
            .collect();
        Self { ast, layout, labels }
    }

    fn width_of(&self, node: usize) -> usize {
        text_len(&self.labels[node]) + BOX_PADDING
    }

    fn layer_of(&self, node: usize) -> usize {
        self.layout.placement(node).map_or(0, |placement| placement.layer)
    }

    /// Edges that skip layers, point backwards, or loop are routed around the content.
    fn is_lane_edge(&self, idx: usize) -> bool {
        let edge = &self.ast.edges()[idx];
        self.layout.is_back_edge(idx) || self.layer_of(edge.to()) != self.layer_of(edge.from()) + 1
    }

    fn edge_label(&self, idx: usize) -> Option<String> {
        self.ast.edges()[idx].label().map(|label| truncate_with_ellipsis(label, MAX_EDGE_LABEL))
    }

    fn lane_edges_reach_first_layer(&self) -> bool {
        (0..self.ast.edges().len())
            .any(|idx| self.is_lane_edge(idx) && self.layer_of(self.ast.edges()[idx].to()) == 0)
    }

    fn node_prims(&self, boxes: &[NodeBox]) -> Vec<Prim> {
        self.ast
            .nodes()
            .iter()
            .zip(boxes)
            .zip(&self.labels)
            .map(|((node, b), label)| Prim::Node {
                x: b.x,
                y: b.y,
                w: b.w,
                shape: node.shape(),
                label: label.clone(),
            })
            .collect()
    }

    /// Layers are rows; edges leave through the bottom border and enter through the top one.
    fn vertical(&self) -> Vec<Prim> {
        let layers = self.layout.layers();
        let layer_widths: Vec<usize> = layers
            .iter()
            .map(|layer| {
                layer.iter().map(|node| self.width_of(*node)).sum::<usize>()
                    + TD_NODE_GAP * layer.len().saturating_sub(1)
            })
            .collect();
        let content_width = layer_widths.iter().copied().max().unwrap_or(0);
        let top = if self.lane_edges_reach_first_layer() { TD_LANE_MARGIN } else { 0 };

        let mut boxes = vec![NodeBox::default(); self.ast.nodes().len()];
        for (layer_idx, layer) in layers.iter().enumerate() {
            let mut x = (content_width - layer_widths[layer_idx]) / 2;
            let y = top + layer_idx * TD_LAYER_STEP;
            for node in layer {
                let w = self.width_of(*node);
                boxes[*node] = NodeBox { x, y, w };
                x += w + TD_NODE_GAP;
            }
        }

        let lane_step = (0..self.ast.edges().len())
            .filter(|idx| self.is_lane_edge(*idx))
            .filter_map(|idx| self.edge_label(idx))
            .map(|label| text_len(&label) + 2)
            .max()
            .unwrap_or(2);

        let mut prims = self.node_prims(&boxes);
        let mut lane = 0usize;
        for (idx, edge) in self.ast.edges().iter().enumerate() {
            let (source, target) = (boxes[edge.from()], boxes[edge.to()]);
            let turn = source.y + BOX_HEIGHT + 1;
            prims.push(Prim::VLine { x: source.cx(), y0: source.y + BOX_HEIGHT - 1, y1: turn });
            let label = self.edge_label(idx);

            if self.is_lane_edge(idx) {
                let lane_x = content_width + 1 + lane * lane_step;
                lane += 1;
                let entry = target.y - 2;
                prims.push(Prim::HLine { y: turn, x0: source.cx(), x1: lane_x });
                prims.push(Prim::VLine { x: lane_x, y0: turn, y1: entry });
                prims.push(Prim::HLine { y: entry, x0: target.cx(), x1: lane_x });
                prims.push(Prim::VLine { x: target.cx(), y0: entry, y1: target.y - 1 });
                if let Some(text) = label {
                    prims.push(Prim::Text { x: lane_x + 1, y: (turn + entry) / 2, text });
                }
            } else {
                if source.cx() != target.cx() {
                    prims.push(Prim::HLine { y: turn, x0: source.cx(), x1: target.cx() });
                }
                prims.push(Prim::VLine { x: target.cx(), y0: turn, y1: target.y - 1 });
                if let Some(text) = label {
                    prims.push(Prim::Text { x: target.cx() + 2, y: target.y - 1, text });
                }
            }
            prims.push(Prim::Arrow { x: target.cx(), y: target.y, ch: '▼' });
        }
        prims
    }

    /// Layers are columns; edges leave through the right border and stop just left of the target.
    fn horizontal(&self) -> Vec<Prim> {
        let layers = self.layout.layers();
        let column_widths: Vec<usize> = layers
            .iter()
            .map(|layer| layer.iter().map(|node| self.width_of(*node)).max().unwrap_or(0))
            .collect();
        let mut gaps = vec![LR_MIN_GAP; layers.len()];
        for (idx, edge) in self.ast.edges().iter().enumerate() {
            if self.is_lane_edge(idx) {
                continue;
            }
            if let Some(label) = self.edge_label(idx) {
                let gap = &mut gaps[self.layer_of(edge.from())];
                *gap = (*gap).max(text_len(&label) + 5);
            }
        }
        let column_heights: Vec<usize> =
            layers.iter().map(|layer| (layer.len() * LR_NODE_STEP).saturating_sub(1)).collect();
        let content_height = column_heights.iter().copied().max().unwrap_or(0);
        let left = if self.lane_edges_reach_first_layer() { LR_LANE_MARGIN } else { 0 };

        let mut column_x = Vec::with_capacity(layers.len());
        let mut x = left;
        for (width, gap) in column_widths.iter().zip(&gaps) {
            column_x.push(x);
            x += width + gap;
        }

        let mut boxes = vec![NodeBox::default(); self.ast.nodes().len()];
        for (layer_idx, layer) in layers.iter().enumerate() {
            let y0 = (content_height - column_heights[layer_idx]) / 2;
            for (k, node) in layer.iter().enumerate() {
                let w = self.width_of(*node);
                let x = column_x[layer_idx] + (column_widths[layer_idx] - w) / 2;
                boxes[*node] = NodeBox { x, y: y0 + k * LR_NODE_STEP, w };
            }
        }

        let mut prims = self.node_prims(&boxes);
        let mut lane = 0usize;
        for (idx, edge) in self.ast.edges().iter().enumerate() {
            let (source, target) = (boxes[edge.from()], boxes[edge.to()]);
            let source_layer = self.layer_of(edge.from());
            let turn =
                column_x[source_layer] + column_widths[source_layer] + gaps[source_layer] - 3;
            prims.push(Prim::HLine { y: source.cy(), x0: source.right(), x1: turn });
            let label = self.edge_label(idx);

            let (join, join_y) = if self.is_lane_edge(idx) {
                let lane_y = content_height + 1 + lane * 2;
                lane += 1;
                let entry = column_x[self.layer_of(edge.to())] - LR_LANE_MARGIN;
                prims.push(Prim::VLine { x: turn, y0: source.cy(), y1: lane_y });
                prims.push(Prim::HLine { y: lane_y, x0: turn, x1: entry });
                prims.push(Prim::VLine { x: entry, y0: lane_y, y1: target.cy() });
                if let Some(text) = label {
                    prims.push(Prim::Text { x: turn.min(entry) + 1, y: lane_y + 1, text });
                }
                (entry, target.cy())
            } else {
                if source.cy() != target.cy() {
                    prims.push(Prim::VLine { x: turn, y0: source.cy(), y1: target.cy() });
                }
                if let Some(text) = label {
                    prims.push(Prim::Text { x: source.right() + 2, y: source.y, text });
                }
                (turn, target.cy())
            };
            prims.push(Prim::HLine { y: join_y, x0: join, x1: target.x - 2 });
            prims.push(Prim::Arrow { x: target.x - 1, y: target.cy(), ch: '▶' });
        }
        prims
    }
}

fn draw_node(
    canvas: &mut Canvas,
    x: usize,
    y: usize,
    w: usize,
    shape: NodeShape,
    label: &str,
) -> Result<(), CanvasError> {
    let (x1, y1) = (x + w - 1, y + BOX_HEIGHT - 1);
    canvas.draw_box(x, y, x1, y1)?;
    let corners = match shape {
        NodeShape::Rect => None,
        NodeShape::Round => Some(['╭', '╮', '╰', '╯']),
        NodeShape::Diamond => Some(['/', '\\', '\\', '/']),
    };
    if let Some([top_left, top_right, bottom_left, bottom_right]) = corners {
        canvas.set(x, y, top_left)?;
        canvas.set(x1, y, top_right)?;
        canvas.set(x, y1, bottom_left)?;
        canvas.set(x1, y1, bottom_right)?;
    }
    canvas.write_str(x + 2, y + 1, label)
}

fn draw(mut prims: Vec<Prim>, direction: FlowDirection) -> Result<String, CanvasError> {
    let (max_x, max_y) = prims
        .iter()
        .map(Prim::extent)
        .fold((0, 0), |(mx, my), (x, y)| (mx.max(x), my.max(y)));
    let (width, height) = (max_x + 1, max_y + 1);

    if direction.is_reversed() {
        prims = if direction.is_horizontal() {
            prims.into_iter().map(|prim| prim.mirror_columns(width)).collect()
        } else {
            prims.into_iter().map(|prim| prim.mirror_rows(height)).collect()
        };
    }
    prims.sort_by_key(Prim::pass);

    let mut canvas = Canvas::new(width, height)?;
    for prim in &prims {
        match prim {
            Prim::Node { x, y, w, shape, label } => {
                draw_node(&mut canvas, *x, *y, *w, *shape, label)?;
            }
            Prim::HLine { y, x0, x1 } => canvas.draw_hline(*x0, *x1, *y)?,
            Prim::VLine { x, y0, y1 } => canvas.draw_vline(*x, *y0, *y1)?,
            Prim::Arrow { x, y, ch } => canvas.set(*x, *y, *ch)?,
            Prim::Text { x, y, text } => canvas.write_str(*x, *y, text)?,
        }
    }
    Ok(canvas_to_string_trimmed(&canvas))
}

/// Lays out and draws a parsed flowchart as box-drawing text.
pub fn render_flowchart_ast(ast: &FlowchartAst) -> Result<String, CanvasError> {
    if ast.nodes().is_empty() {
        return Ok(EMPTY_NOTE.to_owned());
    }
    let layout = layout_flowchart(ast);
    let plan = Plan::new(ast, &layout);
    let prims = if ast.direction().is_horizontal() { plan.horizontal() } else { plan.vertical() };
    draw(prims, ast.direction())
}

/// Parses Mermaid flowchart source and draws it. Edge stroke styles are drawn as solid lines.
pub fn render_flowchart(content: &str) -> Result<String, FlowchartRenderError> {
    let ast = parse_flowchart(content)?;
    Ok(render_flowchart_ast(&ast)?)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FlowchartEngine;

#[derive(Debug)]
pub struct FlowchartInstance {
    lease: MountLease,
    text: String,
}

impl DiagramEngine for FlowchartEngine {
    type Instance = FlowchartInstance;

    fn kind_label(&self) -> &'static str {
        DiagramKind::Mermaid.label()
    }

    fn construct(
        &self,
        lease: MountLease,
        content: &str,
        _options: &RenderOptions,
        _input: &InputRouter,
    ) -> Result<Self::Instance, ErrorPanel> {
        let text = render_flowchart(content)
            .map_err(|err| ErrorPanel::new(self.kind_label(), err.to_string()))?;
        Ok(FlowchartInstance { lease, text })
    }
}

impl EngineInstance for FlowchartInstance {
    fn mount_id(&self) -> &MountId {
        self.lease.mount_id()
    }

    fn render(&self) -> Result<String, ErrorPanel> {
        Ok(self.text.clone())
    }
}
