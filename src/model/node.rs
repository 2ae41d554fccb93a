// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Stepmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;

/// A point inside the raw source.
///
/// `line` and `column` are 1-based; `column` counts chars. `offset` is a byte index into the raw
/// source and is `None` for synthetic nodes that were never parsed from text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub line: usize,
    pub column: usize,
    pub offset: Option<usize>,
}

/// Start/end span of a node. Once both offsets are set, `start.offset <= end.offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub start: Point,
    pub end: Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Root,
    Element,
    Text,
}

/// A node of the parsed Markdown tree (hast-shaped).
///
/// Elements carry a `tag_name` and string properties; text nodes carry `value`. Children are
/// ordered and owned by the parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxNode {
    pub node_type: NodeType,
    pub tag_name: Option<String>,
    pub value: Option<String>,
    pub properties: BTreeMap<String, String>,
    pub children: Vec<SyntaxNode>,
    pub position: Option<Position>,
}

impl SyntaxNode {
    pub fn root(position: Option<Position>) -> Self {
        Self {
            node_type: NodeType::Root,
            tag_name: None,
            value: None,
            properties: BTreeMap::new(),
            children: Vec::new(),
            position,
        }
    }

    pub fn element(tag_name: impl Into<String>, position: Option<Position>) -> Self {
        Self {
            node_type: NodeType::Element,
            tag_name: Some(tag_name.into()),
            value: None,
            properties: BTreeMap::new(),
            children: Vec::new(),
            position,
        }
    }

    pub fn text(value: impl Into<String>, position: Option<Position>) -> Self {
        Self {
            node_type: NodeType::Text,
            tag_name: None,
            value: Some(value.into()),
            properties: BTreeMap::new(),
            children: Vec::new(),
            position,
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn is_element(&self, tag_name: &str) -> bool {
        self.node_type == NodeType::Element && self.tag_name.as_deref() == Some(tag_name)
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn class_name(&self) -> Option<&str> {
        self.property("className")
    }

    /// Concatenated text of every descendant text node, in document order.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }
}

fn collect_text(node: &SyntaxNode, out: &mut String) {
    if let Some(value) = &node.value {
        out.push_str(value);
    }
    for child in &node.children {
        collect_text(child, out);
    }
}

#[cfg(test)]
mod tests {
    use super::SyntaxNode;

    #[test]
    fn text_content_walks_descendants_in_order() {
        let mut strong = SyntaxNode::element("strong", None);
        strong.children.push(SyntaxNode::text("b", None));

        let mut p = SyntaxNode::element("p", None);
        p.children.push(SyntaxNode::text("a", None));
        p.children.push(strong);
        p.children.push(SyntaxNode::text("c", None));

        assert_eq!(p.text_content(), "abc");
    }

    #[test]
    fn class_name_reads_property() {
        let code = SyntaxNode::element("code", None).with_property("className", "language-svg");
        assert_eq!(code.class_name(), Some("language-svg"));
        assert!(code.is_element("code"));
        assert!(!code.is_element("pre"));
    }
}
