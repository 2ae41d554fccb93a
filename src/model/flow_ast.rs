// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Stepmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlowDirection {
    #[default]
    TopDown,
    BottomUp,
    LeftRight,
    RightLeft,
}

impl FlowDirection {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "TD" | "TB" => Some(Self::TopDown),
            "BT" => Some(Self::BottomUp),
            "LR" => Some(Self::LeftRight),
            "RL" => Some(Self::RightLeft),
            _ => None,
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Self::LeftRight | Self::RightLeft)
    }

    pub fn is_reversed(self) -> bool {
        matches!(self, Self::BottomUp | Self::RightLeft)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeShape {
    #[default]
    Rect,
    Round,
    Diamond,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EdgeStroke {
    #[default]
    Solid,
    Dotted,
    Thick,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowNode {
    mermaid_id: String,
    label: String,
    shape: NodeShape,
}

impl FlowNode {
    pub fn new(mermaid_id: impl Into<String>, label: impl Into<String>, shape: NodeShape) -> Self {
        Self { mermaid_id: mermaid_id.into(), label: label.into(), shape }
    }

    pub fn mermaid_id(&self) -> &str {
        &self.mermaid_id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn shape(&self) -> NodeShape {
        self.shape
    }
}

/// An edge between two nodes, referenced by their index in [`FlowchartAst::nodes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowEdge {
    from: usize,
    to: usize,
    label: Option<String>,
    stroke: EdgeStroke,
}

impl FlowEdge {
    pub fn new(from: usize, to: usize, label: Option<String>, stroke: EdgeStroke) -> Self {
        Self { from, to, label, stroke }
    }

    pub fn from(&self) -> usize {
        self.from
    }

    pub fn to(&self) -> usize {
        self.to
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn stroke(&self) -> EdgeStroke {
        self.stroke
    }
}

/// Flowchart in declaration order: nodes appear in the order they were first mentioned.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FlowchartAst {
    direction: FlowDirection,
    nodes: Vec<FlowNode>,
    node_index: BTreeMap<String, usize>,
    edges: Vec<FlowEdge>,
}

impl FlowchartAst {
    pub fn new(direction: FlowDirection) -> Self {
        Self { direction, ..Self::default() }
    }

    pub fn direction(&self) -> FlowDirection {
        self.direction
    }

    pub fn nodes(&self) -> &[FlowNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[FlowEdge] {
        &self.edges
    }

    pub fn node_index(&self, mermaid_id: &str) -> Option<usize> {
        self.node_index.get(mermaid_id).copied()
    }

    /// Inserts a node, or updates the label/shape of an existing one when given explicitly.
    pub fn upsert_node(
        &mut self,
        mermaid_id: &str,
        label: Option<&str>,
        shape: Option<NodeShape>,
    ) -> usize {
        if let Some(idx) = self.node_index(mermaid_id) {
            let node = &mut self.nodes[idx];
            if let Some(label) = label {
                node.label = label.to_owned();
            }
            if let Some(shape) = shape {
                node.shape = shape;
            }
            return idx;
        }

        let idx = self.nodes.len();
        self.nodes.push(FlowNode::new(
            mermaid_id,
            label.unwrap_or(mermaid_id),
            shape.unwrap_or_default(),
        ));
        self.node_index.insert(mermaid_id.to_owned(), idx);
        idx
    }

    pub fn push_edge(&mut self, edge: FlowEdge) {
        self.edges.push(edge);
    }
}

#[cfg(test)]
mod tests {
    use super::{FlowchartAst, FlowDirection, NodeShape};

    #[test]
    fn upsert_keeps_first_position_and_upgrades_label() {
        let mut ast = FlowchartAst::new(FlowDirection::LeftRight);
        let a = ast.upsert_node("A", None, None);
        let b = ast.upsert_node("B", Some("Bee"), Some(NodeShape::Round));
        let a_again = ast.upsert_node("A", Some("Start"), None);

        assert_eq!(a, a_again);
        assert_eq!(b, 1);
        assert_eq!(ast.nodes()[0].label(), "Start");
        assert_eq!(ast.nodes()[0].shape(), NodeShape::Rect);
        assert_eq!(ast.nodes()[1].shape(), NodeShape::Round);
    }
}
