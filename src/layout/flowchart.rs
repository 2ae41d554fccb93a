// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Stepmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeSet;

use smallvec::SmallVec;

use crate::model::FlowchartAst;

/// Layer assignment of every node, in node-index space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowchartLayout {
    layers: Vec<Vec<usize>>,
    placements: Vec<FlowNodePlacement>,
    back_edges: BTreeSet<usize>,
}

impl FlowchartLayout {
    pub fn layers(&self) -> &[Vec<usize>] {
        &self.layers
    }

    pub fn placement(&self, node: usize) -> Option<FlowNodePlacement> {
        self.placements.get(node).copied()
    }

    /// Edges (by index) that close a cycle and were ignored while layering.
    pub fn is_back_edge(&self, edge: usize) -> bool {
        self.back_edges.contains(&edge)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlowNodePlacement {
    pub layer: usize,
    pub index_in_layer: usize,
}

type Adjacency = Vec<SmallVec<[(usize, usize); 4]>>;

/// Outgoing `(edge, to)` pairs per node, in declaration order.
fn outgoing(ast: &FlowchartAst) -> Adjacency {
    let mut out: Adjacency = vec![SmallVec::new(); ast.nodes().len()];
    for (idx, edge) in ast.edges().iter().enumerate() {
        out[edge.from()].push((idx, edge.to()));
    }
    out
}

/// Depth-first search in declaration order; an edge into a node still on the stack closes a cycle.
fn find_back_edges(out: &Adjacency) -> BTreeSet<usize> {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Mark {
        Unvisited,
        OnStack,
        Done,
    }

    let mut marks = vec![Mark::Unvisited; out.len()];
    let mut back = BTreeSet::new();
    for root in 0..out.len() {
        if marks[root] != Mark::Unvisited {
            continue;
        }
        let mut stack = vec![(root, 0usize)];
        marks[root] = Mark::OnStack;
        while let Some((node, cursor)) = stack.last_mut() {
            let node = *node;
            let Some(&(edge, to)) = out[node].get(*cursor) else {
                marks[node] = Mark::Done;
                stack.pop();
                continue;
            };
            *cursor += 1;
            match marks[to] {
                Mark::OnStack => {
                    back.insert(edge);
                }
                Mark::Unvisited => {
                    marks[to] = Mark::OnStack;
                    stack.push((to, 0));
                }
                Mark::Done => {}
            }
        }
    }
    back
}

/// Kahn's algorithm over forward edges, always taking the lowest ready index.
fn topo_order(out: &Adjacency, back_edges: &BTreeSet<usize>) -> Vec<usize> {
    let mut indegree = vec![0usize; out.len()];
    for edges in out {
        for (edge, to) in edges {
            if !back_edges.contains(edge) {
                indegree[*to] += 1;
            }
        }
    }

    let mut ready: BTreeSet<usize> = (0..out.len()).filter(|node| indegree[*node] == 0).collect();
    let mut order = Vec::with_capacity(out.len());
    while let Some(node) = ready.pop_first() {
        order.push(node);
        for (edge, to) in &out[node] {
            if back_edges.contains(edge) {
                continue;
            }
            indegree[*to] -= 1;
            if indegree[*to] == 0 {
                ready.insert(*to);
            }
        }
    }
    order
}

/// Longest-path layering.
fn assign_layers(order: &[usize], out: &Adjacency, back_edges: &BTreeSet<usize>) -> Vec<usize> {
    let mut layers = vec![0usize; out.len()];
    for from in order {
        for (edge, to) in &out[*from] {
            if !back_edges.contains(edge) {
                layers[*to] = layers[*to].max(layers[*from] + 1);
            }
        }
    }
    layers
}

fn sort_layer_by_barycenter(layer: &mut [usize], previous: &[usize], predecessors: &[Vec<usize>]) {
    let position = |node: usize| previous.iter().position(|candidate| *candidate == node);
    let barycenter = |node: usize| {
        let (sum, count) = predecessors[node]
            .iter()
            .filter_map(|pred| position(*pred))
            .fold((0usize, 0usize), |(sum, count), pos| (sum + pos, count + 1));
        (count > 0).then_some((sum, count))
    };

    layer.sort_by(|a, b| match (barycenter(*a), barycenter(*b)) {
        (None, None) => a.cmp(b),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (Some((sum_a, count_a)), Some((sum_b, count_b))) => {
            // sum_a/count_a vs sum_b/count_b without floats.
            let left = (sum_a as u128) * (count_b as u128);
            let right = (sum_b as u128) * (count_a as u128);
            left.cmp(&right).then_with(|| a.cmp(b))
        }
    });
}

/// Deterministic layered layout.
///
/// - cycles are broken by ignoring back edges (found by a declaration-order DFS)
/// - layers come from longest-path layering over the remaining DAG
/// - nodes start in declaration order within a layer, then one downward barycenter sweep
pub fn layout_flowchart(ast: &FlowchartAst) -> FlowchartLayout {
    let out = outgoing(ast);
    let back_edges = find_back_edges(&out);
    let order = topo_order(&out, &back_edges);
    let node_layers = assign_layers(&order, &out, &back_edges);

    let mut predecessors = vec![Vec::new(); ast.nodes().len()];
    for (idx, edge) in ast.edges().iter().enumerate() {
        if !back_edges.contains(&idx) {
            predecessors[edge.to()].push(edge.from());
        }
    }

    let layer_count = node_layers.iter().copied().max().map_or(0, |max| max + 1);
    let mut layers = vec![Vec::<usize>::new(); layer_count];
    for (node, layer) in node_layers.iter().enumerate() {
        layers[*layer].push(node);
    }
    for idx in 1..layers.len() {
        let (done, rest) = layers.split_at_mut(idx);
        sort_layer_by_barycenter(&mut rest[0], &done[idx - 1], &predecessors);
    }

    let mut placements = vec![FlowNodePlacement::default(); ast.nodes().len()];
    for (layer, nodes) in layers.iter().enumerate() {
        for (index_in_layer, node) in nodes.iter().enumerate() {
            placements[*node] = FlowNodePlacement { layer, index_in_layer };
        }
    }

    FlowchartLayout { layers, placements, back_edges }
}

#[cfg(test)]
mod tests {
    use super::layout_flowchart;
    use crate::format::parse_flowchart;

    #[test]
    fn chain_gets_one_layer_per_node() {
        let ast = parse_flowchart("graph TD\nA --> B --> C").expect("parse");
        let layout = layout_flowchart(&ast);
        assert_eq!(layout.layers(), &[vec![0], vec![1], vec![2]]);
    }

    #[test]
    fn longest_path_wins_over_shortcuts() {
        let ast = parse_flowchart("graph TD\nA --> B\nB --> C\nA --> C").expect("parse");
        let layout = layout_flowchart(&ast);
        assert_eq!(layout.placement(2).map(|p| p.layer), Some(2));
    }

    #[test]
    fn cycles_are_broken_at_the_back_edge() {
        let ast = parse_flowchart("graph TD\nA --> B\nB --> C\nC -->|retry| A").expect("parse");
        let layout = layout_flowchart(&ast);
        assert!(layout.is_back_edge(2));
        assert!(!layout.is_back_edge(0));
        assert_eq!(layout.layers().len(), 3);
    }

    #[test]
    fn self_loops_are_back_edges() {
        let ast = parse_flowchart("graph LR\nA --> A").expect("parse");
        let layout = layout_flowchart(&ast);
        assert!(layout.is_back_edge(0));
        assert_eq!(layout.layers(), &[vec![0]]);
    }

    #[test]
    fn barycenter_sweep_follows_parents() {
        // P is declared before Q but hangs off Y, which sits right of X.
        let ast = parse_flowchart("graph TD\nX\nY\nY --> P\nX --> Q").expect("parse");
        let layout = layout_flowchart(&ast);
        let p = ast.node_index("P").expect("P");
        let q = ast.node_index("Q").expect("Q");
        assert_eq!(layout.layers()[1], vec![q, p]);
    }
}
