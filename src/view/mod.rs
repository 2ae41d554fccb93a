// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Stepmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Top-level rendering: raw response text in, a render tree out.
//!
//! Every call re-runs the whole pipeline on the text received so far. Diagram engines live in a
//! [`DiagramMounts`] owned by the renderer and survive across calls as long as their block keeps
//! its mount id and content.

use smol_str::SmolStr;

use crate::engine::DiagramMounts;
use crate::locale::{Catalog, Localizer};
use crate::model::{DiagramKind, MountId};
use crate::render::{Placeholder, RenderOptions};
use crate::sanitize::SanitizedSvg;

mod build;
pub mod lines;
pub mod plain;
pub mod solution;

pub use lines::{layout_tree, Line, PaintOptions, Span, Tone};
pub use plain::{paint_solution_text, paint_text};
pub use solution::{layout_solution, ProblemView, SolutionRenderer, StepView};

/// Mount scope used for chat-style messages.
pub const MESSAGE_SCOPE: &str = "msg";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderTree {
    pub blocks: Vec<Block>,
}

impl RenderTree {
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Mount ids of engine-backed diagram frames, in document order.
    pub fn mounted(&self) -> Vec<&MountId> {
        let mut out = Vec::new();
        collect_mounted(&self.blocks, &mut out);
        out
    }

    /// Number of streaming placeholders in the tree.
    pub fn placeholder_count(&self) -> usize {
        fn count(blocks: &[Block]) -> usize {
            blocks
                .iter()
                .map(|block| match block {
                    Block::Placeholder { .. } => 1,
                    Block::Quote(children) => count(children),
                    Block::List { items, .. } => items.iter().map(|item| count(&item.blocks)).sum(),
                    _ => 0,
                })
                .sum()
        }
        count(&self.blocks)
    }
}

fn collect_mounted<'a>(blocks: &'a [Block], out: &mut Vec<&'a MountId>) {
    for block in blocks {
        match block {
            Block::Diagram(DiagramFrame { body: DiagramBody::Mounted(mount), .. }) => {
                out.push(mount);
            }
            Block::Quote(children) => collect_mounted(children, out),
            Block::List { items, .. } => {
                for item in items {
                    collect_mounted(&item.blocks, out);
                }
            }
            _ => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading { level: u8, content: Vec<Inline> },
    Paragraph(Vec<Inline>),
    List { start: Option<u64>, items: Vec<ListItem> },
    Quote(Vec<Block>),
    Table { head: Vec<Vec<Inline>>, rows: Vec<Vec<Vec<Inline>>> },
    Rule,
    DisplayMath(String),
    /// Tagged fence that is not a diagram.
    Code { language: SmolStr, content: String },
    /// Untagged fence.
    Preformatted(String),
    /// Diagram fence whose closing delimiter has not arrived.
    Placeholder { kind: DiagramKind, placeholder: Placeholder },
    Diagram(DiagramFrame),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListItem {
    pub checked: Option<bool>,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Code(String),
    Emphasis(Vec<Inline>),
    Strong(Vec<Inline>),
    Strike(Vec<Inline>),
    Link { href: String, content: Vec<Inline> },
    Image { src: String, alt: String },
    Math(String),
    FootnoteRef(String),
    LineBreak,
}

/// Chrome around one complete diagram fence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramFrame {
    pub kind: DiagramKind,
    /// Language used when the frame shows its source.
    pub source_language: &'static str,
    pub source: String,
    pub body: DiagramBody,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagramBody {
    /// Drawn by the engine host at this mount; resolved at paint time.
    Mounted(MountId),
    /// Sanitized raw graphics.
    Markup(SanitizedSvg),
    /// No renderer for this kind; the frame shows its source.
    Source,
}

/// Renders chat-style Markdown messages.
pub struct MarkdownRenderer<L: Localizer = Catalog> {
    mounts: DiagramMounts,
    localizer: L,
}

impl<L: Localizer> MarkdownRenderer<L> {
    pub fn new(localizer: L, options: RenderOptions) -> Self {
        Self { mounts: DiagramMounts::new(options), localizer }
    }

    /// Runs one render pass over `source`, the whole text received so far.
    pub fn render(&mut self, source: &str) -> RenderTree {
        self.mounts.begin_pass();
        let blocks = build::build_blocks(source, MESSAGE_SCOPE, &mut self.mounts, &self.localizer);
        self.mounts.end_pass();
        RenderTree { blocks }
    }

    pub fn mounts(&self) -> &DiagramMounts {
        &self.mounts
    }

    pub fn mounts_mut(&mut self) -> &mut DiagramMounts {
        &mut self.mounts
    }

    pub fn localizer(&self) -> &L {
        &self.localizer
    }

    /// Releases every mounted engine.
    pub fn reset(&mut self) {
        self.mounts.clear();
    }
}
