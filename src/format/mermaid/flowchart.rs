// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Stepmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;

use super::ident::validate_mermaid_ident;
pub use super::ident::MermaidIdentError;

use crate::model::flow_ast::{EdgeStroke, FlowDirection, FlowEdge, FlowchartAst, NodeShape};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowchartParseError {
    MissingHeader,
    UnsupportedDiagram { keyword: String },
    InvalidDirection { line_no: usize, direction: String },
    UnsupportedSyntax { line_no: usize, line: String },
    InvalidNodeId { line_no: usize, name: String, reason: MermaidIdentError },
    InvalidNodeLabelSyntax { line_no: usize, token: String },
    EmptyNodeLabel { line_no: usize, token: String },
    EmptyEdgeLabel { line_no: usize, line: String },
}

impl fmt::Display for FlowchartParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingHeader => {
                f.write_str("expected 'graph' or 'flowchart' as the first non-empty line")
            }
            Self::UnsupportedDiagram { keyword } => {
                write!(f, "unsupported diagram type: {keyword} (only flowcharts are rendered)")
            }
            Self::InvalidDirection { line_no, direction } => write!(
                f,
                "invalid flowchart direction on line {line_no}: {direction} (expected TD/TB/LR/RL/BT)"
            ),
            Self::UnsupportedSyntax { line_no, line } => {
                write!(f, "unsupported Mermaid syntax on line {line_no}: {line}")
            }
            Self::InvalidNodeId { line_no, name, reason } => {
                write!(f, "invalid node id on line {line_no}: {name} ({reason})")
            }
            Self::InvalidNodeLabelSyntax { line_no, token } => write!(
                f,
                "invalid node label syntax on line {line_no}: {token} (expected '<id>[<label>]', '<id>(<label>)', or '<id>{{<label>}}')"
            ),
            Self::EmptyNodeLabel { line_no, token } => {
                write!(f, "empty node label on line {line_no}: {token}")
            }
            Self::EmptyEdgeLabel { line_no, line } => {
                write!(f, "empty edge label on line {line_no}: {line}")
            }
        }
    }
}

impl std::error::Error for FlowchartParseError {}

fn is_edge_op_start_char(ch: char) -> bool {
    matches!(ch, '<' | '-' | '=' | '.')
}

fn is_edge_op_char(ch: char) -> bool {
    matches!(ch, '<' | '>' | '-' | '=' | '.' | 'o' | 'x')
}

fn is_probable_edge_operator(op: &str) -> bool {
    op.chars().filter(|ch| matches!(ch, '-' | '=' | '.')).count() >= 2
}

/// Splits `line` at its first edge operator outside of node label brackets.
fn split_once_edge_operator(line: &str) -> Option<(&str, &str, &str)> {
    let mut in_label: Option<char> = None;
    let mut op_start: Option<usize> = None;

    for (idx, ch) in line.char_indices() {
        if let Some(close) = in_label {
            if ch == close {
                in_label = None;
            }
            continue;
        }

        match ch {
            '[' => in_label = Some(']'),
            '(' => in_label = Some(')'),
            '{' => in_label = Some('}'),
            '"' => in_label = Some('"'),
            _ if is_edge_op_start_char(ch) => {
                op_start = Some(idx);
                break;
            }
            _ => {}
        }
    }

    let start = op_start?;
    let end = line[start..]
        .char_indices()
        .find(|(_, ch)| !is_edge_op_char(*ch))
        .map(|(idx, _)| start + idx)
        .unwrap_or(line.len());

    // `o`/`x` are arrow heads only when a node id does not continue right after them.
    let mut end = end;
    while end > start
        && matches!(line[..end].chars().last(), Some('o' | 'x'))
        && line[end..].starts_with(|ch: char| ch.is_alphanumeric() || ch == '_')
    {
        end -= 1;
    }

    let lhs = &line[..start];
    let op = &line[start..end];
    let rhs = &line[end..];
    if lhs.trim().is_empty() || !is_probable_edge_operator(op) {
        return None;
    }

    Some((lhs, op, rhs))
}

fn is_reverse_operator(op: &str) -> bool {
    op.contains('<') && !op.contains('>')
}

fn edge_stroke(op: &str) -> EdgeStroke {
    if op.contains('=') {
        EdgeStroke::Thick
    } else if op.contains('.') {
        EdgeStroke::Dotted
    } else {
        EdgeStroke::Solid
    }
}

fn is_comment_line(trimmed: &str) -> bool {
    trimmed.starts_with("%%")
}

/// Statements that only affect styling or grouping; the box renderer has no use for them.
fn is_ignorable_line(trimmed: &str) -> bool {
    trimmed.starts_with("subgraph ")
        || trimmed == "subgraph"
        || trimmed == "end"
        || trimmed.starts_with("direction ")
        || trimmed.starts_with("style ")
        || trimmed.starts_with("class ")
        || trimmed.starts_with("classDef ")
        || trimmed.starts_with("click ")
        || trimmed.starts_with("linkStyle ")
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct NodeSpec {
    mermaid_id: String,
    label: Option<String>,
    shape: Option<NodeShape>,
}

fn unquote_label(label: &str) -> &str {
    label
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(label)
        .trim()
}

fn parse_node_spec(token: &str, line_no: usize) -> Result<NodeSpec, FlowchartParseError> {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return Err(FlowchartParseError::UnsupportedSyntax { line_no, line: token.to_owned() });
    }

    let open_delim = trimmed.char_indices().find(|(_, ch)| matches!(ch, '[' | '(' | '{'));
    let Some((open_idx, open_ch)) = open_delim else {
        validate_mermaid_ident(trimmed).map_err(|reason| FlowchartParseError::InvalidNodeId {
            line_no,
            name: trimmed.to_owned(),
            reason,
        })?;
        return Ok(NodeSpec { mermaid_id: trimmed.to_owned(), label: None, shape: None });
    };

    let (close_ch, shape) = match open_ch {
        '[' => (']', NodeShape::Rect),
        '(' => (')', NodeShape::Round),
        _ => ('}', NodeShape::Diamond),
    };

    let id_raw = trimmed[..open_idx].trim();
    validate_mermaid_ident(id_raw).map_err(|reason| FlowchartParseError::InvalidNodeId {
        line_no,
        name: id_raw.to_owned(),
        reason,
    })?;

    // `A((circle))` and `A{{hex}}` nest the delimiter; peel every matching layer.
    let mut inner = &trimmed[open_idx..];
    while let Some(rest) =
        inner.strip_prefix(open_ch).and_then(|rest| rest.strip_suffix(close_ch))
    {
        inner = rest;
    }
    if inner.len() == trimmed.len() - open_idx {
        return Err(FlowchartParseError::InvalidNodeLabelSyntax {
            line_no,
            token: trimmed.to_owned(),
        });
    }

    let label = unquote_label(inner);
    if label.is_empty() {
        return Err(FlowchartParseError::EmptyNodeLabel { line_no, token: trimmed.to_owned() });
    }

    Ok(NodeSpec {
        mermaid_id: id_raw.to_owned(),
        label: Some(label.to_owned()),
        shape: Some(shape),
    })
}

fn ensure_node(ast: &mut FlowchartAst, spec: &NodeSpec) -> usize {
    ast.upsert_node(&spec.mermaid_id, spec.label.as_deref(), spec.shape)
}

fn push_edge(
    ast: &mut FlowchartAst,
    lhs: &NodeSpec,
    op: &str,
    rhs: &NodeSpec,
    label: Option<String>,
) {
    let lhs_idx = ensure_node(ast, lhs);
    let rhs_idx = ensure_node(ast, rhs);
    let (from, to) = if is_reverse_operator(op) { (rhs_idx, lhs_idx) } else { (lhs_idx, rhs_idx) };
    ast.push_edge(FlowEdge::new(from, to, label, edge_stroke(op)));
}

const OTHER_DIAGRAM_KEYWORDS: &[&str] = &[
    "sequenceDiagram",
    "classDiagram",
    "stateDiagram",
    "stateDiagram-v2",
    "erDiagram",
    "journey",
    "gantt",
    "pie",
    "gitGraph",
    "mindmap",
    "timeline",
    "quadrantChart",
    "xychart-beta",
];

fn parse_header(trimmed: &str, line_no: usize) -> Result<FlowDirection, FlowchartParseError> {
    let mut parts = trimmed.split_whitespace();
    let keyword = parts.next().unwrap_or_default();
    if keyword != "flowchart" && keyword != "graph" {
        if OTHER_DIAGRAM_KEYWORDS.contains(&keyword) {
            return Err(FlowchartParseError::UnsupportedDiagram { keyword: keyword.to_owned() });
        }
        return Err(FlowchartParseError::MissingHeader);
    }

    let direction = match parts.next() {
        None => FlowDirection::default(),
        Some(direction) => FlowDirection::from_keyword(direction.trim_end_matches(';')).ok_or_else(
            || FlowchartParseError::InvalidDirection { line_no, direction: direction.to_owned() },
        )?,
    };
    if parts.next().is_some() {
        return Err(FlowchartParseError::UnsupportedSyntax { line_no, line: trimmed.to_owned() });
    }
    Ok(direction)
}

fn parse_statement(
    ast: &mut FlowchartAst,
    trimmed: &str,
    line_no: usize,
) -> Result<(), FlowchartParseError> {
    let Some((first_raw, first_op, tail)) = split_once_edge_operator(trimmed) else {
        let spec = parse_node_spec(trimmed, line_no)?;
        ensure_node(ast, &spec);
        return Ok(());
    };

    // Inline label syntax: `<lhs> -- <label> --> <rhs>`
    if first_op == "--" || first_op == "==" || first_op == "-." {
        if let Some((label_raw, op, rhs_raw)) = split_once_edge_operator(tail.trim_start()) {
            let label = label_raw.trim();
            if !label.is_empty() {
                let lhs = parse_node_spec(first_raw, line_no)?;
                let rhs = parse_node_spec(rhs_raw, line_no)?;
                push_edge(ast, &lhs, op, &rhs, Some(label.to_owned()));
                return Ok(());
            }
        }
    }

    let mut current = parse_node_spec(first_raw, line_no)?;
    let mut op = first_op;
    let mut rest = tail;

    loop {
        let mut label: Option<String> = None;
        let mut rhs_and_more = rest.trim_start();
        if let Some(after) = rhs_and_more.strip_prefix('|') {
            let Some(end_idx) = after.find('|') else {
                return Err(FlowchartParseError::UnsupportedSyntax {
                    line_no,
                    line: trimmed.to_owned(),
                });
            };
            let text = unquote_label(&after[..end_idx]);
            if text.is_empty() {
                return Err(FlowchartParseError::EmptyEdgeLabel {
                    line_no,
                    line: trimmed.to_owned(),
                });
            }
            label = Some(text.to_owned());
            rhs_and_more = after[end_idx + 1..].trim_start();
        }

        let next = split_once_edge_operator(rhs_and_more);
        let rhs_raw = next.map(|(rhs_raw, _, _)| rhs_raw).unwrap_or(rhs_and_more);
        let rhs = parse_node_spec(rhs_raw, line_no)?;
        push_edge(ast, &current, op, &rhs, label);

        let Some((_, next_op, next_rest)) = next else {
            return Ok(());
        };
        current = rhs;
        op = next_op;
        rest = next_rest;
    }
}

/// Parses the Mermaid `graph`/`flowchart` subset the flow-diagram engine renders.
///
/// Supported:
/// - `graph`/`flowchart` header with optional direction (`TD`, `TB`, `BT`, `LR`, `RL`)
/// - comment lines starting with `%%`, trailing `;`
/// - nodes: `<id>`, `<id>[<label>]`, `<id>(<label>)`, `<id>{<label>}` (labels may be quoted)
/// - edges: the `-->` family (`---`, `-.->`, `==>`, `<--`, …), chains `a --> b --> c`
/// - edge labels: `a -->|label| b` or `a -- label --> b`
/// - styling and grouping statements are accepted and ignored
pub fn parse_flowchart(input: &str) -> Result<FlowchartAst, FlowchartParseError> {
    let mut ast: Option<FlowchartAst> = None;

    for (idx, raw_line) in input.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = raw_line.trim().trim_end_matches(';').trim_end();
        if trimmed.is_empty() || is_comment_line(trimmed) {
            continue;
        }

        if ast.is_none() {
            ast = Some(FlowchartAst::new(parse_header(trimmed, line_no)?));
            continue;
        }
        let Some(chart) = ast.as_mut() else {
            continue;
        };

        if is_ignorable_line(trimmed) {
            continue;
        }
        parse_statement(chart, trimmed, line_no)?;
    }

    ast.ok_or(FlowchartParseError::MissingHeader)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{parse_flowchart, FlowchartParseError};
    use crate::model::flow_ast::{EdgeStroke, FlowDirection, NodeShape};

    fn edge_view(src: &str) -> Vec<(String, String, Option<String>)> {
        let ast = parse_flowchart(src).expect("parse");
        ast.edges()
            .iter()
            .map(|edge| {
                (
                    ast.nodes()[edge.from()].mermaid_id().to_owned(),
                    ast.nodes()[edge.to()].mermaid_id().to_owned(),
                    edge.label().map(str::to_owned),
                )
            })
            .collect()
    }

    #[test]
    fn parses_nodes_shapes_and_labels() {
        let ast = parse_flowchart(
            "graph TD\n  A[Read problem] --> B{Linear?}\n  B -->|yes| C(Solve directly)\n  B -- no --> D[Factor];\n",
        )
        .expect("parse");

        assert_eq!(ast.direction(), FlowDirection::TopDown);
        let labels: Vec<&str> = ast.nodes().iter().map(|node| node.label()).collect();
        assert_eq!(labels, vec!["Read problem", "Linear?", "Solve directly", "Factor"]);
        assert_eq!(ast.nodes()[1].shape(), NodeShape::Diamond);
        assert_eq!(ast.nodes()[2].shape(), NodeShape::Round);
        assert_eq!(ast.edges()[1].label(), Some("yes"));
        assert_eq!(ast.edges()[2].label(), Some("no"));
    }

    #[test]
    fn chains_and_reverse_operators() {
        assert_eq!(
            edge_view("flowchart LR\nA --> B --> C\nD <-- C"),
            vec![
                ("A".to_owned(), "B".to_owned(), None),
                ("B".to_owned(), "C".to_owned(), None),
                ("C".to_owned(), "D".to_owned(), None),
            ]
        );
    }

    #[test]
    fn strokes_follow_operator() {
        let ast = parse_flowchart("graph LR\nA -.-> B\nB ==> C\nC --- D").expect("parse");
        let strokes: Vec<EdgeStroke> = ast.edges().iter().map(|edge| edge.stroke()).collect();
        assert_eq!(strokes, vec![EdgeStroke::Dotted, EdgeStroke::Thick, EdgeStroke::Solid]);
    }

    #[test]
    fn labels_may_contain_operator_characters_when_bracketed() {
        let ast = parse_flowchart("graph TD\nA[\"x -> y\"] --> B[a - b]").expect("parse");
        assert_eq!(ast.nodes()[0].label(), "x -> y");
        assert_eq!(ast.nodes()[1].label(), "a - b");
    }

    #[test]
    fn ignores_comments_and_styling() {
        let ast = parse_flowchart(
            "%% setup\ngraph RL\nsubgraph S\nA --> B\nend\nstyle A fill:#f9f\nclassDef hot fill:#f00\nlinkStyle 0 stroke:red",
        )
        .expect("parse");
        assert_eq!(ast.direction(), FlowDirection::RightLeft);
        assert_eq!(ast.edges().len(), 1);
    }

    #[test]
    fn header_without_direction_defaults_to_top_down() {
        let ast = parse_flowchart("flowchart\nA").expect("parse");
        assert_eq!(ast.direction(), FlowDirection::TopDown);
        assert_eq!(ast.nodes().len(), 1);
    }

    #[rstest]
    #[case("", FlowchartParseError::MissingHeader)]
    #[case("A --> B", FlowchartParseError::MissingHeader)]
    #[case(
        "sequenceDiagram\nA->>B: hi",
        FlowchartParseError::UnsupportedDiagram { keyword: "sequenceDiagram".to_owned() }
    )]
    #[case(
        "graph XY",
        FlowchartParseError::InvalidDirection { line_no: 1, direction: "XY".to_owned() }
    )]
    fn rejects_bad_headers(#[case] src: &str, #[case] expected: FlowchartParseError) {
        assert_eq!(parse_flowchart(src).unwrap_err(), expected);
    }

    #[test]
    fn reports_empty_labels_with_line_numbers() {
        let err = parse_flowchart("graph TD\nA --> B\nB -->|| C").unwrap_err();
        assert!(matches!(err, FlowchartParseError::EmptyEdgeLabel { line_no: 3, .. }));

        let err = parse_flowchart("graph TD\nA[ ] --> B").unwrap_err();
        assert!(matches!(err, FlowchartParseError::EmptyNodeLabel { line_no: 2, .. }));
    }

    #[test]
    fn invalid_node_ids_are_reported() {
        let err = parse_flowchart("graph TD\nA & B --> C").unwrap_err();
        assert!(matches!(err, FlowchartParseError::InvalidNodeId { line_no: 2, .. }));
    }
}
