// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Stepmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Markdown → position-carrying syntax tree.
//!
//! The tree is hast-shaped: fenced blocks become `pre > code` with a `language-<tag>` class,
//! inline code is a bare `code`, math is `math` with `display = inline | block`. Every node keeps
//! the byte span it was parsed from so fence completeness can be judged against the raw source.
//! Element ends are trimmed of trailing whitespace, which puts a closed fence's end offset right
//! after its closing delimiter.

use std::ops::Range;

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag};

use crate::model::{Point, Position, SyntaxNode};

fn parser_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_MATH
        | Options::ENABLE_FOOTNOTES
}

/// Line-start table used to turn byte offsets into line/column points.
struct LineIndex<'a> {
    source: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    fn new(source: &'a str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(memchr::memchr_iter(b'\n', source.as_bytes()).map(|idx| idx + 1));
        Self { source, line_starts }
    }

    fn point(&self, offset: usize) -> Point {
        let offset = offset.min(self.source.len());
        let line = self.line_starts.partition_point(|start| *start <= offset);
        let line_start = self.line_starts[line.saturating_sub(1)];
        let column = match self.source.get(line_start..offset) {
            Some(prefix) => prefix.chars().count() + 1,
            None => offset - line_start + 1,
        };
        Point { line, column, offset: Some(offset) }
    }

    fn position(&self, range: &Range<usize>) -> Position {
        let end = trimmed_end(self.source, range);
        Position { start: self.point(range.start), end: self.point(end) }
    }
}

fn trimmed_end(source: &str, range: &Range<usize>) -> usize {
    match source.get(range.clone()) {
        Some(slice) => range.start + slice.trim_end().len(),
        None => range.end.min(source.len()),
    }
}

struct Frame {
    node: SyntaxNode,
    /// Closes together with the frame below it (the `code` inside a `pre`).
    closes_with_parent: bool,
}

struct TreeBuilder<'a> {
    index: LineIndex<'a>,
    stack: Vec<Frame>,
    in_table_head: bool,
}

impl<'a> TreeBuilder<'a> {
    fn new(source: &'a str) -> Self {
        let index = LineIndex::new(source);
        let root = SyntaxNode::root(Some(index.position(&(0..source.len()))));
        Self {
            index,
            stack: vec![Frame { node: root, closes_with_parent: false }],
            in_table_head: false,
        }
    }

    fn push(&mut self, node: SyntaxNode, closes_with_parent: bool) {
        self.stack.push(Frame { node, closes_with_parent });
    }

    fn append(&mut self, node: SyntaxNode) {
        if let Some(top) = self.stack.last_mut() {
            top.node.children.push(node);
        }
    }

    fn pop(&mut self) {
        loop {
            if self.stack.len() <= 1 {
                return;
            }
            let Some(frame) = self.stack.pop() else {
                return;
            };
            let closes_with_parent = frame.closes_with_parent;
            self.append(frame.node);
            if !closes_with_parent {
                return;
            }
        }
    }

    fn leaf_with_text(&self, tag_name: &str, text: &str, range: &Range<usize>) -> SyntaxNode {
        let position = self.index.position(range);
        let mut node = SyntaxNode::element(tag_name, Some(position));
        node.children.push(SyntaxNode::text(text, Some(position)));
        node
    }

    fn start(&mut self, tag: Tag<'_>, range: &Range<usize>) {
        let position = Some(self.index.position(range));
        match tag {
            Tag::CodeBlock(kind) => {
                let lang = match kind {
                    CodeBlockKind::Fenced(info) => {
                        info.split_whitespace().next().map(str::to_owned)
                    }
                    CodeBlockKind::Indented => None,
                };
                let mut code = SyntaxNode::element("code", position);
                if let Some(lang) = lang {
                    code = code.with_property("className", format!("language-{lang}"));
                }
                self.push(SyntaxNode::element("pre", position), false);
                self.push(code, true);
            }
            Tag::Paragraph => self.push(SyntaxNode::element("p", position), false),
            Tag::Heading { level, .. } => {
                let tag_name = format!("h{}", level as usize);
                self.push(SyntaxNode::element(tag_name, position), false);
            }
            Tag::BlockQuote(_) => self.push(SyntaxNode::element("blockquote", position), false),
            Tag::List(Some(start)) => {
                let node =
                    SyntaxNode::element("ol", position).with_property("start", start.to_string());
                self.push(node, false);
            }
            Tag::List(None) => self.push(SyntaxNode::element("ul", position), false),
            Tag::Item => self.push(SyntaxNode::element("li", position), false),
            Tag::Table(_) => self.push(SyntaxNode::element("table", position), false),
            Tag::TableHead => {
                self.in_table_head = true;
                self.push(SyntaxNode::element("thead", position), false);
            }
            Tag::TableRow => self.push(SyntaxNode::element("tr", position), false),
            Tag::TableCell => {
                let tag_name = if self.in_table_head { "th" } else { "td" };
                self.push(SyntaxNode::element(tag_name, position), false);
            }
            Tag::Emphasis => self.push(SyntaxNode::element("em", position), false),
            Tag::Strong => self.push(SyntaxNode::element("strong", position), false),
            Tag::Strikethrough => self.push(SyntaxNode::element("del", position), false),
            Tag::Link { dest_url, .. } => {
                let node =
                    SyntaxNode::element("a", position).with_property("href", dest_url.to_string());
                self.push(node, false);
            }
            Tag::Image { dest_url, .. } => {
                let node = SyntaxNode::element("img", position)
                    .with_property("src", dest_url.to_string());
                self.push(node, false);
            }
            Tag::FootnoteDefinition(label) => {
                let node = SyntaxNode::element("section", position)
                    .with_property("id", format!("fn-{label}"));
                self.push(node, false);
            }
            _ => self.push(SyntaxNode::element("div", position), false),
        }
    }

    fn event(&mut self, event: Event<'_>, range: Range<usize>) {
        match event {
            Event::Start(tag) => self.start(tag, &range),
            Event::End(_) => {
                if self.stack.last().is_some_and(|frame| frame.node.is_element("thead")) {
                    self.in_table_head = false;
                }
                self.pop();
            }
            Event::Text(text) => {
                let node = SyntaxNode::text(text.as_ref(), Some(self.index.position(&range)));
                self.append(node);
            }
            Event::Code(code) => {
                let node = self.leaf_with_text("code", &code, &range);
                self.append(node);
            }
            Event::InlineMath(tex) => {
                let node =
                    self.leaf_with_text("math", &tex, &range).with_property("display", "inline");
                self.append(node);
            }
            Event::DisplayMath(tex) => {
                let node =
                    self.leaf_with_text("math", &tex, &range).with_property("display", "block");
                self.append(node);
            }
            Event::Html(html) | Event::InlineHtml(html) => {
                // Raw HTML is shown as text, never injected.
                let node = SyntaxNode::text(html.as_ref(), Some(self.index.position(&range)));
                self.append(node);
            }
            Event::FootnoteReference(label) => {
                let node = self.leaf_with_text("sup", &format!("[{label}]"), &range);
                self.append(node);
            }
            Event::SoftBreak => {
                let node = SyntaxNode::text("\n", Some(self.index.position(&range)));
                self.append(node);
            }
            Event::HardBreak => {
                let node = SyntaxNode::element("br", Some(self.index.position(&range)));
                self.append(node);
            }
            Event::Rule => {
                let node = SyntaxNode::element("hr", Some(self.index.position(&range)));
                self.append(node);
            }
            Event::TaskListMarker(checked) => {
                let node = SyntaxNode::element("input", Some(self.index.position(&range)))
                    .with_property("type", "checkbox")
                    .with_property("checked", if checked { "true" } else { "false" });
                self.append(node);
            }
        }
    }

    fn finish(mut self) -> SyntaxNode {
        while self.stack.len() > 1 {
            self.pop();
        }
        match self.stack.pop() {
            Some(frame) => frame.node,
            None => SyntaxNode::root(None),
        }
    }
}

/// Parses `source` into a syntax tree. Total: any prefix of a document parses.
pub fn parse_markdown(source: &str) -> SyntaxNode {
    let mut builder = TreeBuilder::new(source);
    for (event, range) in Parser::new_ext(source, parser_options()).into_offset_iter() {
        builder.event(event, range);
    }
    builder.finish()
}

/// Visits every `code` element (block and inline) in document order.
pub fn code_nodes(root: &SyntaxNode) -> Vec<&SyntaxNode> {
    let mut out = Vec::new();
    collect_code(root, &mut out);
    out
}

fn collect_code<'a>(node: &'a SyntaxNode, out: &mut Vec<&'a SyntaxNode>) {
    if node.is_element("code") {
        out.push(node);
        return;
    }
    for child in &node.children {
        collect_code(child, out);
    }
}
