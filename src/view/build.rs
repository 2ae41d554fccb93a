// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Stepmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use crate::classify::{diagram_spec, dispatch, CodeRoute};
use crate::engine::DiagramMounts;
use crate::format::parse_markdown;
use crate::locale::{self, Localizer};
use crate::model::{DiagramKind, DiagramSpec, MountId, NodeType, SyntaxNode};
use crate::render::Placeholder;
use crate::sanitize::sanitize_svg;

use super::{Block, DiagramBody, DiagramFrame, Inline, ListItem};

/// Parses `source` and builds the blocks of one mount scope.
///
/// `source` is the raw text the tree was parsed from; fence completeness is judged against it.
pub(crate) fn build_blocks(
    source: &str,
    scope: &str,
    mounts: &mut DiagramMounts,
    localizer: &dyn Localizer,
) -> Vec<Block> {
    if source.trim().is_empty() {
        return Vec::new();
    }
    let root = parse_markdown(source);
    let placeholder =
        Placeholder::new(
            localizer.text(locale::GENERATING_DIAGRAM),
            mounts.options().placeholder_period,
        );
    let mut builder = TreeBuilder { source, scope, mounts, placeholder, next_ordinal: 0 };
    builder.blocks(&root.children)
}

struct TreeBuilder<'a> {
    source: &'a str,
    scope: &'a str,
    mounts: &'a mut DiagramMounts,
    placeholder: Placeholder,
    /// Document-order index of the next fenced block; stable while the text only grows.
    next_ordinal: usize,
}

fn is_inline(node: &SyntaxNode) -> bool {
    match node.node_type {
        NodeType::Text => true,
        NodeType::Root => false,
        NodeType::Element => matches!(
            node.tag_name.as_deref(),
            Some("em" | "strong" | "del" | "a" | "img" | "code" | "math" | "br" | "input" | "sup")
        ),
    }
}

fn is_display_math(node: &SyntaxNode) -> bool {
    node.is_element("math") && node.property("display") == Some("block")
}

fn heading_level(tag: &str) -> Option<u8> {
    let level = tag.strip_prefix('h')?.parse::<u8>().ok()?;
    (1..=6).contains(&level).then_some(level)
}

impl TreeBuilder<'_> {
    fn blocks(&mut self, nodes: &[SyntaxNode]) -> Vec<Block> {
        let mut out = Vec::new();
        let mut run: Vec<&SyntaxNode> = Vec::new();
        for node in nodes {
            if is_inline(node) {
                run.push(node);
                continue;
            }
            self.flush_paragraph(&mut run, &mut out);
            self.block(node, &mut out);
        }
        self.flush_paragraph(&mut run, &mut out);
        out
    }

    /// Turns a run of inline nodes into paragraphs, lifting display math out as its own block.
    fn flush_paragraph(&mut self, run: &mut Vec<&SyntaxNode>, out: &mut Vec<Block>) {
        let mut content = Vec::new();
        for node in run.drain(..) {
            if is_display_math(node) {
                push_paragraph(&mut content, out);
                out.push(Block::DisplayMath(node.text_content()));
                continue;
            }
            if let Some(inline) = self.inline(node) {
                content.push(inline);
            }
        }
        push_paragraph(&mut content, out);
    }

    fn block(&mut self, node: &SyntaxNode, out: &mut Vec<Block>) {
        let Some(tag) = node.tag_name.as_deref() else {
            out.extend(self.blocks(&node.children));
            return;
        };
        match tag {
            "p" => {
                let mut run: Vec<&SyntaxNode> = node.children.iter().collect();
                self.flush_paragraph(&mut run, out);
            }
            "blockquote" => out.push(Block::Quote(self.blocks(&node.children))),
            "ul" | "ol" => {
                let start = (tag == "ol").then(|| {
                    node.property("start").and_then(|start| start.parse().ok()).unwrap_or(1)
                });
                let items = node
                    .children
                    .iter()
                    .filter(|child| child.is_element("li"))
                    .map(|li| self.list_item(li))
                    .collect();
                out.push(Block::List { start, items });
            }
            "table" => out.push(self.table(node)),
            "pre" => {
                if let Some(code) = node.children.iter().find(|child| child.is_element("code")) {
                    out.push(self.fence(code));
                }
            }
            "hr" => out.push(Block::Rule),
            "math" => out.push(Block::DisplayMath(node.text_content())),
            _ => {
                if let Some(level) = heading_level(tag) {
                    out.push(Block::Heading { level, content: self.inlines(&node.children) });
                } else {
                    out.extend(self.blocks(&node.children));
                }
            }
        }
    }

    fn list_item(&mut self, li: &SyntaxNode) -> ListItem {
        let checked = li
            .children
            .iter()
            .chain(li.children.iter().flat_map(|child| child.children.iter()))
            .find(|node| node.is_element("input"))
            .map(|input| input.property("checked") == Some("true"));
        ListItem { checked, blocks: self.blocks(&li.children) }
    }

    fn table(&self, node: &SyntaxNode) -> Block {
        let mut head = Vec::new();
        let mut rows = Vec::new();
        for section in &node.children {
            if section.is_element("thead") {
                let nested = section.children.iter().any(|child| child.is_element("tr"));
                let cells: Vec<&SyntaxNode> = if nested {
                    section
                        .children
                        .iter()
                        .filter(|tr| tr.is_element("tr"))
                        .flat_map(|tr| tr.children.iter())
                        .collect()
                } else {
                    section.children.iter().collect()
                };
                head = cells.into_iter().map(|cell| self.inlines(&cell.children)).collect();
            } else if section.is_element("tr") {
                let row = section.children.iter().map(|cell| self.inlines(&cell.children));
                rows.push(row.collect());
            } else if section.is_element("tbody") {
                for tr in section.children.iter().filter(|tr| tr.is_element("tr")) {
                    let row = tr.children.iter().map(|cell| self.inlines(&cell.children));
                    rows.push(row.collect());
                }
            }
        }
        Block::Table { head, rows }
    }

    fn fence(&mut self, code: &SyntaxNode) -> Block {
        let ordinal = self.next_ordinal;
        self.next_ordinal += 1;
        let spec = diagram_spec(code, self.source);
        match dispatch(&spec) {
            CodeRoute::Inline => Block::Preformatted(spec.content),
            CodeRoute::Code { language } => Block::Code { language, content: spec.content },
            CodeRoute::Placeholder(kind) => {
                Block::Placeholder { kind, placeholder: self.placeholder.clone() }
            }
            CodeRoute::Diagram(kind) => Block::Diagram(self.diagram(kind, spec, ordinal)),
        }
    }

    fn diagram(&mut self, kind: DiagramKind, spec: DiagramSpec, ordinal: usize) -> DiagramFrame {
        let body = match kind {
            DiagramKind::Svg => {
                let sanitized = sanitize_svg(&spec.content);
                if !sanitized.report.is_clean() {
                    tracing::debug!(
                        scope = self.scope,
                        ordinal,
                        report = ?sanitized.report,
                        "sanitized svg fence"
                    );
                }
                DiagramBody::Markup(sanitized)
            }
            DiagramKind::GenericPlot | DiagramKind::Plain => DiagramBody::Source,
            _ => match MountId::scoped(self.scope, ordinal) {
                Ok(mount) => {
                    if self.mounts.mount(&mount, kind, &spec.content) {
                        DiagramBody::Mounted(mount)
                    } else {
                        DiagramBody::Source
                    }
                }
                Err(err) => {
                    tracing::warn!(scope = self.scope, error = %err, "invalid mount scope");
                    DiagramBody::Source
                }
            },
        };
        DiagramFrame { kind, source_language: kind.source_language(), source: spec.content, body }
    }

    fn inlines(&self, nodes: &[SyntaxNode]) -> Vec<Inline> {
        nodes.iter().filter_map(|node| self.inline(node)).collect()
    }

    fn inline(&self, node: &SyntaxNode) -> Option<Inline> {
        if node.node_type == NodeType::Text {
            return node.value.clone().map(Inline::Text);
        }
        let inline = match node.tag_name.as_deref()? {
            "em" => Inline::Emphasis(self.inlines(&node.children)),
            "strong" => Inline::Strong(self.inlines(&node.children)),
            "del" => Inline::Strike(self.inlines(&node.children)),
            "a" => Inline::Link {
                href: node.property("href").unwrap_or_default().to_owned(),
                content: self.inlines(&node.children),
            },
            "img" => Inline::Image {
                src: node.property("src").unwrap_or_default().to_owned(),
                alt: node.text_content(),
            },
            "code" => Inline::Code(node.text_content()),
            "math" => Inline::Math(node.text_content()),
            "sup" => Inline::FootnoteRef(node.text_content()),
            "br" => Inline::LineBreak,
            // Task markers are lifted onto the list item.
            "input" => return None,
            _ => Inline::Text(node.text_content()),
        };
        Some(inline)
    }
}

fn push_paragraph(content: &mut Vec<Inline>, out: &mut Vec<Block>) {
    let blank = content
        .iter()
        .all(|inline| matches!(inline, Inline::Text(text) if text.trim().is_empty()));
    if blank {
        content.clear();
        return;
    }
    out.push(Block::Paragraph(std::mem::take(content)));
}
