// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Stepmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! `plot-force` fences: a node/link graph laid out by a force simulation.
//!
//! The simulation follows d3-force's defaults so layouts look the way they would in a browser:
//! phyllotaxis start positions, many-body repulsion (strength -30), springs on links (distance
//! 30), a centering force, velocity decay 0.4 and alpha decaying to 0.001 over 300 ticks. It is
//! fully deterministic; coincident nodes are separated by index instead of by a random jiggle.

use std::collections::BTreeMap;
use std::f64::consts::PI;
use std::fmt;

use serde::Deserialize;
use smallvec::SmallVec;

use super::text::{canvas_to_string_trimmed, text_len, truncate_with_ellipsis};
use super::{AxisScale, Canvas, CanvasError, RenderOptions};
use crate::engine::{DiagramEngine, EngineInstance, ErrorPanel, InputRouter, MountLease};
use crate::model::{DiagramKind, MountId};

const TICKS: usize = 300;
const ALPHA_MIN: f64 = 0.001;
const VELOCITY_DECAY: f64 = 0.4;
const CHARGE_STRENGTH: f64 = -30.0;
const LINK_DISTANCE: f64 = 30.0;
const INITIAL_RADIUS: f64 = 10.0;
const MAX_LABEL: usize = 12;
/// Many-body forces are pairwise on every tick, so graph size is capped.
pub const MAX_NODES: usize = 200;
pub const MAX_LINKS: usize = 2_000;
const NODE_GLYPH: char = '●';
const LINK_GLYPH: char = '·';

#[derive(Debug, Deserialize)]
struct GraphSpec {
    #[serde(default)]
    nodes: Vec<NodeSpec>,
    #[serde(default)]
    links: Vec<LinkSpec>,
}

#[derive(Debug, Deserialize)]
struct NodeSpec {
    id: NodeKey,
    label: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LinkSpec {
    source: NodeKey,
    target: NodeKey,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum NodeKey {
    Index(u64),
    Name(String),
}

impl NodeKey {
    fn as_id(&self) -> String {
        match self {
            Self::Index(idx) => {
                let mut buf = itoa::Buffer::new();
                buf.format(*idx).to_owned()
            }
            Self::Name(name) => name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForcePlotError {
    Json { message: String },
    EmptyNodeId { node: usize },
    DuplicateNode { id: String },
    UnknownNode { link: usize, key: String },
    TooManyNodes { count: usize },
    TooManyLinks { count: usize },
    Canvas(CanvasError),
}

impl fmt::Display for ForcePlotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json { message } => write!(f, "invalid graph JSON: {message}"),
            Self::EmptyNodeId { node } => write!(f, "node {node} has an empty id"),
            Self::DuplicateNode { id } => write!(f, "duplicate node id '{id}'"),
            Self::UnknownNode { link, key } => {
                write!(f, "link {link} references unknown node '{key}'")
            }
            Self::TooManyNodes { count } => {
                write!(f, "graph has {count} nodes, at most {MAX_NODES} are drawn")
            }
            Self::TooManyLinks { count } => {
                write!(f, "graph has {count} links, at most {MAX_LINKS} are drawn")
            }
            Self::Canvas(err) => write!(f, "canvas error: {err}"),
        }
    }
}

impl std::error::Error for ForcePlotError {}

impl From<CanvasError> for ForcePlotError {
    fn from(err: CanvasError) -> Self {
        Self::Canvas(err)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Graph {
    labels: Vec<String>,
    links: Vec<(usize, usize)>,
}

fn build_graph(spec: GraphSpec) -> Result<Graph, ForcePlotError> {
    if spec.nodes.len() > MAX_NODES {
        return Err(ForcePlotError::TooManyNodes { count: spec.nodes.len() });
    }
    if spec.links.len() > MAX_LINKS {
        return Err(ForcePlotError::TooManyLinks { count: spec.links.len() });
    }
    let mut by_id = BTreeMap::<String, usize>::new();
    let mut labels = Vec::with_capacity(spec.nodes.len());
    for (idx, node) in spec.nodes.into_iter().enumerate() {
        let id = node.id.as_id();
        if id.trim().is_empty() {
            return Err(ForcePlotError::EmptyNodeId { node: idx });
        }
        if by_id.insert(id.clone(), idx).is_some() {
            return Err(ForcePlotError::DuplicateNode { id });
        }
        labels.push(node.label.or(node.name).unwrap_or(id));
    }

    // Numbers name a node id first and fall back to a node index.
    let resolve = |link: usize, key: &NodeKey| -> Result<usize, ForcePlotError> {
        let id = key.as_id();
        if let Some(idx) = by_id.get(&id) {
            return Ok(*idx);
        }
        match key {
            NodeKey::Index(idx) => usize::try_from(*idx)
                .ok()
                .filter(|idx| *idx < labels.len())
                .ok_or(ForcePlotError::UnknownNode { link, key: id }),
            NodeKey::Name(_) => Err(ForcePlotError::UnknownNode { link, key: id }),
        }
    };

    let links = spec
        .links
        .iter()
        .enumerate()
        .map(|(idx, link)| Ok((resolve(idx, &link.source)?, resolve(idx, &link.target)?)))
        .collect::<Result<Vec<_>, ForcePlotError>>()?;

    Ok(Graph { labels, links })
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct Body {
    x: f64,
    y: f64,
    vx: f64,
    vy: f64,
}

/// Runs the simulation to rest and returns final positions.
fn simulate(node_count: usize, links: &[(usize, usize)]) -> Vec<(f64, f64)> {
    let golden_angle = PI * (3.0 - 5f64.sqrt());
    let mut bodies: Vec<Body> = (0..node_count)
        .map(|idx| {
            let radius = INITIAL_RADIUS * (0.5 + idx as f64).sqrt();
            let angle = idx as f64 * golden_angle;
            Body { x: radius * angle.cos(), y: radius * angle.sin(), ..Body::default() }
        })
        .collect();

    let mut degree = vec![0usize; node_count];
    let mut neighbours: Vec<SmallVec<[usize; 4]>> = vec![SmallVec::new(); node_count];
    for (source, target) in links {
        degree[*source] += 1;
        degree[*target] += 1;
        neighbours[*source].push(*target);
    }
    let springs: Vec<(usize, usize, f64, f64)> = neighbours
        .iter()
        .enumerate()
        .flat_map(|(source, targets)| targets.iter().map(move |target| (source, *target)))
        .map(|(source, target)| {
            let strength = 1.0 / degree[source].min(degree[target]).max(1) as f64;
            let bias = degree[source] as f64 / (degree[source] + degree[target]).max(1) as f64;
            (source, target, strength, bias)
        })
        .collect();

    let alpha_decay = 1.0 - ALPHA_MIN.powf(1.0 / TICKS as f64);
    let mut alpha = 1.0;
    for _ in 0..TICKS {
        alpha += -alpha * alpha_decay;

        for &(source, target, strength, bias) in &springs {
            let (s, t) = (bodies[source], bodies[target]);
            let mut dx = t.x + t.vx - s.x - s.vx;
            let mut dy = t.y + t.vy - s.y - s.vy;
            if dx == 0.0 && dy == 0.0 {
                dx = 1e-6 * (target as f64 + 1.0);
                dy = 1e-6;
            }
            let length = (dx * dx + dy * dy).sqrt();
            let pull = (length - LINK_DISTANCE) / length * alpha * strength;
            dx *= pull;
            dy *= pull;
            bodies[target].vx -= dx * bias;
            bodies[target].vy -= dy * bias;
            bodies[source].vx += dx * (1.0 - bias);
            bodies[source].vy += dy * (1.0 - bias);
        }

        for i in 0..node_count {
            for j in 0..node_count {
                if i == j {
                    continue;
                }
                let mut dx = bodies[j].x - bodies[i].x;
                let mut dy = bodies[j].y - bodies[i].y;
                if dx == 0.0 && dy == 0.0 {
                    dx = 1e-6 * (j as f64 - i as f64);
                    dy = 1e-6;
                }
                let mut distance_sq = dx * dx + dy * dy;
                if distance_sq < 1.0 {
                    distance_sq = distance_sq.sqrt();
                }
                let weight = CHARGE_STRENGTH * alpha / distance_sq;
                bodies[i].vx += dx * weight;
                bodies[i].vy += dy * weight;
            }
        }

        for body in &mut bodies {
            body.vx *= 1.0 - VELOCITY_DECAY;
            body.vy *= 1.0 - VELOCITY_DECAY;
            body.x += body.vx;
            body.y += body.vy;
        }

        if node_count > 0 {
            let cx = bodies.iter().map(|body| body.x).sum::<f64>() / node_count as f64;
            let cy = bodies.iter().map(|body| body.y).sum::<f64>() / node_count as f64;
            for body in &mut bodies {
                body.x -= cx;
                body.y -= cy;
            }
        }
    }

    bodies.into_iter().map(|body| (body.x, body.y)).collect()
}

fn layout_to_text(
    graph: &Graph,
    positions: &[(f64, f64)],
    options: &RenderOptions,
) -> Result<String, ForcePlotError> {
    if graph.labels.is_empty() {
        return Ok("(empty graph)".to_owned());
    }

    let labels: Vec<String> =
        graph.labels.iter().map(|label| truncate_with_ellipsis(label, MAX_LABEL)).collect();
    let label_room = labels.iter().map(|label| text_len(label) + 1).max().unwrap_or(0);
    let width = options.plot_width.max(label_room + 2);
    let height = options.plot_height.max(3);

    let (mut x_lo, mut x_hi, mut y_lo, mut y_hi) =
        (f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY);
    for (x, y) in positions {
        x_lo = x_lo.min(*x);
        x_hi = x_hi.max(*x);
        y_lo = y_lo.min(*y);
        y_hi = y_hi.max(*y);
    }
    if x_hi - x_lo < 1.0 {
        x_lo -= 1.0;
        x_hi += 1.0;
    }
    if y_hi - y_lo < 1.0 {
        y_lo -= 1.0;
        y_hi += 1.0;
    }

    // Leave room on the right for the widest label.
    let x_scale = AxisScale::new(x_lo, x_hi, width - label_room);
    let y_scale = AxisScale::new(y_lo, y_hi, height);
    let cells: Vec<(i64, i64)> =
        positions.iter().map(|(x, y)| (x_scale.cell(*x), y_scale.cell(*y))).collect();

    let mut canvas = Canvas::new(width, height)?;
    for ((cx, cy), label) in cells.iter().zip(&labels) {
        canvas.write_clipped(cx + 1, *cy, label);
    }
    for (cx, cy) in &cells {
        canvas.plot(*cx, *cy, NODE_GLYPH);
    }
    for (source, target) in &graph.links {
        canvas.draw_segment(cells[*source], cells[*target], LINK_GLYPH);
    }

    Ok(canvas_to_string_trimmed(&canvas))
}

/// Renders one `plot-force` body.
pub fn render_force_plot(content: &str, options: &RenderOptions) -> Result<String, ForcePlotError> {
    let spec: GraphSpec = serde_json::from_str(content)
        .map_err(|err| ForcePlotError::Json { message: err.to_string() })?;
    let graph = build_graph(spec)?;
    let positions = simulate(graph.labels.len(), &graph.links);
    layout_to_text(&graph, &positions, options)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ForcePlotEngine;

#[derive(Debug)]
pub struct ForcePlotInstance {
    lease: MountLease,
    text: String,
}

impl DiagramEngine for ForcePlotEngine {
    type Instance = ForcePlotInstance;

    fn kind_label(&self) -> &'static str {
        DiagramKind::ForcePlot.label()
    }

    fn construct(
        &self,
        lease: MountLease,
        content: &str,
        options: &RenderOptions,
        _input: &InputRouter,
    ) -> Result<Self::Instance, ErrorPanel> {
        let text = render_force_plot(content, options)
            .map_err(|err| ErrorPanel::new(self.kind_label(), err.to_string()))?;
        Ok(ForcePlotInstance { lease, text })
    }
}

impl EngineInstance for ForcePlotInstance {
    fn mount_id(&self) -> &MountId {
        self.lease.mount_id()
    }

    fn render(&self) -> Result<String, ErrorPanel> {
        Ok(self.text.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::{build_graph, render_force_plot, simulate, ForcePlotError, GraphSpec, MAX_NODES};
    use crate::render::RenderOptions;

    fn graph(content: &str) -> Result<super::Graph, ForcePlotError> {
        let spec: GraphSpec = serde_json::from_str(content).expect("json");
        build_graph(spec)
    }

    #[test]
    fn empty_node_list_renders_a_note() {
        let text = render_force_plot(r#"{"nodes":[]}"#, &RenderOptions::default()).expect("plot");
        assert_eq!(text, "(empty graph)");
    }

    #[test]
    fn links_resolve_by_id_then_by_index() {
        let graph = graph(
            r#"{"nodes":[{"id":"a"},{"id":7,"label":"Seven"},{"id":"c"}],
                "links":[{"source":"a","target":7},{"source":2,"target":0}]}"#,
        )
        .expect("graph");
        assert_eq!(graph.labels, vec!["a", "Seven", "c"]);
        assert_eq!(graph.links, vec![(0, 1), (2, 0)]);
    }

    #[test]
    fn rejects_dangling_links_and_duplicate_ids() {
        assert_eq!(
            graph(r#"{"nodes":[{"id":"a"}],"links":[{"source":"a","target":"b"}]}"#),
            Err(ForcePlotError::UnknownNode { link: 0, key: "b".to_owned() })
        );
        assert_eq!(
            graph(r#"{"nodes":[{"id":"a"},{"id":"a"}]}"#),
            Err(ForcePlotError::DuplicateNode { id: "a".to_owned() })
        );
        assert!(render_force_plot("{\"nodes\": [", &RenderOptions::default())
            .unwrap_err()
            .to_string()
            .starts_with("invalid graph JSON"));
    }

    #[test]
    fn oversized_graphs_are_rejected_before_simulation() {
        let nodes: Vec<String> =
            (0..=MAX_NODES).map(|idx| format!("{{\"id\":{idx}}}")).collect();
        let content = format!("{{\"nodes\":[{}]}}", nodes.join(","));
        assert_eq!(graph(&content), Err(ForcePlotError::TooManyNodes { count: MAX_NODES + 1 }));
        assert!(render_force_plot(&content, &RenderOptions::default())
            .unwrap_err()
            .to_string()
            .contains("at most 200"));
    }

    #[test]
    fn simulation_is_deterministic_and_settles_linked_nodes_near_link_distance() {
        let first = simulate(2, &[(0, 1)]);
        assert_eq!(first, simulate(2, &[(0, 1)]));

        let (dx, dy) = (first[1].0 - first[0].0, first[1].1 - first[0].1);
        let distance = (dx * dx + dy * dy).sqrt();
        assert!((20.0..45.0).contains(&distance), "distance {distance}");
        // Centering keeps the centroid at the origin.
        assert!((first[0].0 + first[1].0).abs() < 1e-6);
    }

    #[test]
    fn every_node_and_label_is_drawn() {
        let text = render_force_plot(
            r#"{"nodes":[{"id":"sun"},{"id":"earth"},{"id":"moon"}],
                "links":[{"source":"sun","target":"earth"},{"source":"earth","target":"moon"}]}"#,
            &RenderOptions::default(),
        )
        .expect("plot");
        assert_eq!(text.matches('●').count(), 3, "{text}");
        for label in ["sun", "earth", "moon"] {
            assert!(text.contains(label), "{label} missing:\n{text}");
        }
    }
}
