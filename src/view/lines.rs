// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Stepmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Lays a render tree out as styled text lines.
//!
//! Both the plain-text painter and the terminal viewer consume these lines; the viewer maps each
//! [`Tone`] onto a theme color, the plain painter drops tones.

use std::time::Duration;

use crate::engine::{DiagramMounts, HostView};
use crate::model::MountId;
use crate::render::text::text_len;

use super::{Block, DiagramBody, DiagramFrame, Inline, ListItem, RenderTree};

/// Semantic style of a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tone {
    Body,
    Heading,
    Strong,
    Emphasis,
    Strike,
    Code,
    Link,
    Math,
    Quote,
    Muted,
    Frame,
    Focus,
    Error,
    Shimmer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub tone: Tone,
    pub text: String,
}

impl Span {
    pub fn new(tone: Tone, text: impl Into<String>) -> Self {
        Self { tone, text: text.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Line {
    pub spans: Vec<Span>,
}

impl Line {
    pub fn new(spans: Vec<Span>) -> Self {
        Self { spans }
    }

    pub fn styled(tone: Tone, text: impl Into<String>) -> Self {
        Self { spans: vec![Span::new(tone, text)] }
    }

    pub fn blank() -> Self {
        Self::default()
    }

    pub fn is_blank(&self) -> bool {
        self.spans.iter().all(|span| span.text.trim().is_empty())
    }

    pub fn text(&self) -> String {
        self.spans.iter().map(|span| span.text.as_str()).collect()
    }

    pub fn width(&self) -> usize {
        self.spans.iter().map(|span| text_len(&span.text)).sum()
    }

    /// Appends text, merging with the last span when the tone matches.
    pub fn push(&mut self, tone: Tone, text: &str) {
        match self.spans.last_mut() {
            Some(last) if last.tone == tone => last.text.push_str(text),
            _ => self.spans.push(Span::new(tone, text)),
        }
    }

    fn prefixed(prefix: &[Span], mut line: Line) -> Self {
        let mut spans = prefix.to_vec();
        spans.append(&mut line.spans);
        Self { spans }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaintOptions {
    /// Wrap width for prose, in chars.
    pub width: usize,
    /// Diagram frames show their source instead of the rendering.
    pub show_source: bool,
    /// Board that currently holds keyboard focus.
    pub focused: Option<MountId>,
    /// Animation clock for streaming placeholders.
    pub elapsed: Duration,
}

impl Default for PaintOptions {
    fn default() -> Self {
        Self { width: 80, show_source: false, focused: None, elapsed: Duration::ZERO }
    }
}

/// Flattens inline content into styled spans. Line breaks become `'\n'` inside a span.
fn inline_spans(inlines: &[Inline], tone: Tone, out: &mut Vec<Span>) {
    for inline in inlines {
        match inline {
            Inline::Text(text) => out.push(Span::new(tone, text.clone())),
            Inline::Code(code) => out.push(Span::new(Tone::Code, format!("`{code}`"))),
            Inline::Emphasis(children) => inline_spans(children, Tone::Emphasis, out),
            Inline::Strong(children) => inline_spans(children, Tone::Strong, out),
            Inline::Strike(children) => inline_spans(children, Tone::Strike, out),
            Inline::Link { href, content } => {
                let start = out.len();
                inline_spans(content, Tone::Link, out);
                let label: String = out[start..].iter().map(|span| span.text.as_str()).collect();
                if !href.is_empty() && label.trim() != href {
                    out.push(Span::new(Tone::Muted, format!(" <{href}>")));
                }
            }
            Inline::Image { src, alt } => {
                let label = if alt.is_empty() { src.as_str() } else { alt.as_str() };
                out.push(Span::new(Tone::Muted, format!("[image: {label}]")));
            }
            Inline::Math(tex) => out.push(Span::new(Tone::Math, format!("${tex}$"))),
            Inline::FootnoteRef(label) => out.push(Span::new(Tone::Muted, label.clone())),
            Inline::LineBreak => out.push(Span::new(tone, "\n")),
        }
    }
}

/// Greedy word wrap. `first` prefixes the first line, `rest` every continuation line.
pub(crate) fn wrap_spans(spans: &[Span], width: usize, first: &[Span], rest: &[Span]) -> Vec<Line> {
    let prefix_width =
        |prefix: &[Span]| prefix.iter().map(|span| text_len(&span.text)).sum::<usize>();
    let mut lines = Vec::new();
    let mut current = Line::new(first.to_vec());
    let mut start = prefix_width(first);
    let mut col = start;
    let mut pending_space = false;

    for span in spans {
        for (piece_idx, piece) in span.text.split('\n').enumerate() {
            if piece_idx > 0 {
                lines.push(std::mem::replace(&mut current, Line::new(rest.to_vec())));
                start = prefix_width(rest);
                col = start;
                pending_space = false;
            }
            for (word_idx, word) in piece.split([' ', '\t']).enumerate() {
                if word_idx > 0 {
                    pending_space = true;
                }
                if word.is_empty() {
                    continue;
                }
                let len = text_len(word);
                let gap = usize::from(pending_space && col > start);
                if col > start && col + gap + len > width {
                    lines.push(std::mem::replace(&mut current, Line::new(rest.to_vec())));
                    start = prefix_width(rest);
                    col = start;
                } else if gap == 1 {
                    current.push(span.tone, " ");
                    col += 1;
                }
                current.push(span.tone, word);
                col += len;
                pending_space = false;
            }
        }
    }
    if col > start || lines.is_empty() {
        lines.push(current);
    }
    lines
}

struct Painter<'a> {
    mounts: &'a DiagramMounts,
    options: &'a PaintOptions,
}

impl Painter<'_> {
    fn blocks(&self, blocks: &[Block], width: usize, out: &mut Vec<Line>) {
        for (idx, block) in blocks.iter().enumerate() {
            if idx > 0 {
                out.push(Line::blank());
            }
            self.block(block, width, out);
        }
    }

    fn block(&self, block: &Block, width: usize, out: &mut Vec<Line>) {
        match block {
            Block::Heading { level, content } => {
                let mut spans = Vec::new();
                inline_spans(content, Tone::Heading, &mut spans);
                let marker =
                    Span::new(Tone::Heading, format!("{} ", "#".repeat(usize::from(*level))));
                out.extend(wrap_spans(&spans, width, &[marker], &[]));
            }
            Block::Paragraph(content) => {
                let mut spans = Vec::new();
                inline_spans(content, Tone::Body, &mut spans);
                out.extend(wrap_spans(&spans, width, &[], &[]));
            }
            Block::List { start, items } => self.list(*start, items, width, out),
            Block::Quote(children) => {
                let mut inner = Vec::new();
                self.blocks(children, width.saturating_sub(2), &mut inner);
                let bar = [Span::new(Tone::Quote, "│ ")];
                out.extend(inner.into_iter().map(|line| Line::prefixed(&bar, line)));
            }
            Block::Table { head, rows } => table(head, rows, out),
            Block::Rule => out.push(Line::styled(Tone::Muted, "─".repeat(width.max(3)))),
            Block::DisplayMath(tex) => {
                out.extend(
                    tex.trim().lines().map(|line| Line::styled(Tone::Math, format!("    {line}"))),
                );
            }
            Block::Code { language, content } => {
                out.push(Line::styled(Tone::Frame, format!("╭─ {language}")));
                out.extend(content.lines().map(|line| {
                    Line::new(vec![Span::new(Tone::Frame, "│ "), Span::new(Tone::Code, line)])
                }));
                out.push(Line::styled(Tone::Frame, "╰─"));
            }
            Block::Preformatted(content) => {
                out.extend(
                    content.lines().map(|line| Line::styled(Tone::Code, format!("  {line}"))),
                );
            }
            Block::Placeholder { placeholder, .. } => {
                let frame = placeholder.frame(self.options.elapsed);
                let mut line = Line::default();
                let parts = [
                    (Tone::Muted, frame.before),
                    (Tone::Shimmer, frame.lit),
                    (Tone::Muted, frame.after),
                ];
                for (tone, text) in parts {
                    if !text.is_empty() {
                        line.push(tone, text);
                    }
                }
                out.push(line);
            }
            Block::Diagram(frame) => self.diagram(frame, out),
        }
    }

    fn list(&self, start: Option<u64>, items: &[ListItem], width: usize, out: &mut Vec<Line>) {
        for (idx, item) in items.iter().enumerate() {
            let mut marker = match start {
                Some(start) => format!("{}. ", start + idx as u64),
                None => "• ".to_owned(),
            };
            if let Some(checked) = item.checked {
                marker.push_str(if checked { "[x] " } else { "[ ] " });
            }
            let indent = " ".repeat(text_len(&marker));
            let mut inner = Vec::new();
            self.blocks(&item.blocks, width.saturating_sub(indent.len()), &mut inner);
            if inner.is_empty() {
                inner.push(Line::blank());
            }
            let first = [Span::new(Tone::Muted, marker)];
            let rest = [Span::new(Tone::Body, indent)];
            for (line_idx, line) in inner.into_iter().enumerate() {
                let prefix: &[Span] = if line_idx == 0 { &first } else { &rest };
                out.push(Line::prefixed(prefix, line));
            }
        }
    }

    fn diagram(&self, frame: &DiagramFrame, out: &mut Vec<Line>) {
        let focused = matches!(
            &frame.body,
            DiagramBody::Mounted(mount) if self.options.focused.as_ref() == Some(mount)
        );
        let edge = if focused { Tone::Focus } else { Tone::Frame };
        let mut header = Line::styled(edge, format!("╭─ {} ", frame.kind.label()));
        header.push(Tone::Muted, &format!("[{}]", frame.source_language));
        if focused {
            header.push(Tone::Focus, " ◆");
        }
        out.push(header);

        let body: Vec<Line> = if self.options.show_source {
            source_lines(&frame.source)
        } else {
            match &frame.body {
                DiagramBody::Mounted(mount) => match self.mounts.view(mount) {
                    Some(HostView::Rendered(text)) => {
                        text.lines().map(|line| Line::styled(Tone::Body, line)).collect()
                    }
                    Some(HostView::Failed(panel)) => {
                        vec![Line::styled(Tone::Error, panel.to_string())]
                    }
                    Some(HostView::Pending) => vec![Line::styled(Tone::Muted, "…")],
                    None => source_lines(&frame.source),
                },
                DiagramBody::Markup(svg) => source_lines(&svg.markup),
                DiagramBody::Source => source_lines(&frame.source),
            }
        };
        let bar = [Span::new(edge, "│ ")];
        out.extend(body.into_iter().map(|line| Line::prefixed(&bar, line)));
        out.push(Line::styled(edge, "╰─"));
    }
}

fn source_lines(source: &str) -> Vec<Line> {
    source.lines().map(|line| Line::styled(Tone::Code, line)).collect()
}

fn cell_text(cell: &[Inline]) -> String {
    let mut spans = Vec::new();
    inline_spans(cell, Tone::Body, &mut spans);
    let text: String = spans.iter().map(|span| span.text.as_str()).collect();
    text.replace('\n', " ")
}

fn table(head: &[Vec<Inline>], rows: &[Vec<Vec<Inline>>], out: &mut Vec<Line>) {
    let head: Vec<String> = head.iter().map(|cell| cell_text(cell)).collect();
    let rows: Vec<Vec<String>> =
        rows.iter().map(|row| row.iter().map(|cell| cell_text(cell)).collect()).collect();
    let columns = rows.iter().map(Vec::len).chain(std::iter::once(head.len())).max().unwrap_or(0);
    let mut widths = vec![0usize; columns];
    for row in std::iter::once(&head).chain(rows.iter()) {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(text_len(cell));
        }
    }

    let render_row = |row: &[String], tone: Tone| {
        let mut line = Line::default();
        for (idx, width) in widths.iter().enumerate() {
            if idx > 0 {
                line.push(Tone::Muted, " │ ");
            }
            let cell = row.get(idx).map_or("", String::as_str);
            let pad = width - text_len(cell);
            line.push(tone, &format!("{cell}{}", " ".repeat(pad)));
        }
        line
    };

    if !head.is_empty() {
        out.push(render_row(&head, Tone::Strong));
        let rule: Vec<String> = widths.iter().map(|width| "─".repeat(*width)).collect();
        out.push(Line::styled(Tone::Muted, rule.join("─┼─")));
    }
    for row in &rows {
        out.push(render_row(row, Tone::Body));
    }
}

/// Lays out `tree` into lines. Trailing whitespace is the painter's concern.
pub fn layout_tree(tree: &RenderTree, mounts: &DiagramMounts, options: &PaintOptions) -> Vec<Line> {
    let mut out = Vec::new();
    Painter { mounts, options }.blocks(&tree.blocks, options.width.max(8), &mut out);
    out
}
