// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Stepmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Structured solution view: the response is split into problems first and every field is
//! rendered as its own Markdown document.

use crate::engine::DiagramMounts;
use crate::format::split_problems;
use crate::locale::{self, Catalog, Localizer};
use crate::model::ResponseFlow;
use crate::render::RenderOptions;

use super::lines::{layout_tree, Line, PaintOptions, Span, Tone};
use super::{build, RenderTree};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepView {
    pub number: Option<u32>,
    pub title: String,
    pub body: RenderTree,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemView {
    pub index: usize,
    pub preamble: Option<RenderTree>,
    /// `None` until the problem header arrives (and always for the improve flow).
    pub problem: Option<RenderTree>,
    pub steps: Vec<StepView>,
    pub answer: Option<RenderTree>,
    pub answered: bool,
}

/// Renders protocol responses into per-problem views.
///
/// Mount scopes are derived from the problem index and the field (`p0.problem`, `p0.step2`), so
/// a diagram keeps its engine while later fields stream in.
pub struct SolutionRenderer<L: Localizer = Catalog> {
    mounts: DiagramMounts,
    localizer: L,
}

impl<L: Localizer> SolutionRenderer<L> {
    pub fn new(localizer: L, options: RenderOptions) -> Self {
        Self { mounts: DiagramMounts::new(options), localizer }
    }

    /// Runs one render pass over the whole response received so far.
    pub fn render(&mut self, raw: &str, flow: ResponseFlow) -> Vec<ProblemView> {
        let sections = split_problems(raw, flow);
        self.mounts.begin_pass();
        let views = sections
            .iter()
            .enumerate()
            .map(|(index, section)| {
                let scope = |field: &str| format!("p{index}.{field}");
                let mut field = |text: &str, name: &str| {
                    RenderTree {
                        blocks: build::build_blocks(
                            text,
                            &scope(name),
                            &mut self.mounts,
                            &self.localizer,
                        ),
                    }
                };
                let preamble = section.preamble.as_deref().map(|text| field(text, "preamble"));
                let problem = section.problem_text.as_deref().map(|text| field(text, "problem"));
                let steps = section
                    .explanation_steps
                    .iter()
                    .enumerate()
                    .map(|(step_idx, step)| StepView {
                        number: step.number,
                        title: step.title.clone(),
                        body: field(&step.body, &format!("step{step_idx}")),
                    })
                    .collect();
                let answer = section.final_answer.as_deref().map(|text| field(text, "answer"));
                ProblemView {
                    index,
                    preamble,
                    problem,
                    steps,
                    answer,
                    answered: section.is_answered(),
                }
            })
            .collect();
        self.mounts.end_pass();
        tracing::debug!(
            problems = sections.len(),
            mounts = self.mounts.len(),
            "rendered solution pass"
        );
        views
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

    pub fn reset(&mut self) {
        self.mounts.clear();
    }
}

fn section_title(text: &str) -> Line {
    Line::styled(Tone::Heading, format!("▌ {text}"))
}

fn indent(lines: Vec<Line>) -> impl Iterator<Item = Line> {
    lines.into_iter().map(|mut line| {
        line.spans.insert(0, Span::new(Tone::Body, "  "));
        line
    })
}

/// Lays out solution views with localized section labels.
pub fn layout_solution(
    views: &[ProblemView],
    mounts: &DiagramMounts,
    localizer: &dyn Localizer,
    options: &PaintOptions,
) -> Vec<Line> {
    let inner = PaintOptions { width: options.width.saturating_sub(2), ..options.clone() };
    let mut out = Vec::new();
    for view in views {
        if view.index > 0 {
            out.push(Line::blank());
            out.push(Line::styled(Tone::Muted, "━".repeat(options.width.max(3))));
            out.push(Line::blank());
        }
        if let Some(preamble) = &view.preamble {
            out.extend(layout_tree(preamble, mounts, options));
            out.push(Line::blank());
        }
        if let Some(problem) = &view.problem {
            let label = localizer.text(locale::PROBLEM_LABEL);
            let title = if views.len() > 1 {
                format!("{label} {}", view.index + 1)
            } else {
                label.to_owned()
            };
            out.push(section_title(&title));
            out.extend(indent(layout_tree(problem, mounts, &inner)));
            out.push(Line::blank());
        }
        if !view.steps.is_empty() {
            out.push(section_title(localizer.text(locale::EXPLANATION_LABEL)));
            for step in &view.steps {
                if let Some(number) = step.number {
                    let mut heading = format!("{} {number}", localizer.text(locale::STEP_LABEL));
                    if !step.title.is_empty() {
                        heading.push_str(": ");
                        heading.push_str(&step.title);
                    }
                    out.push(Line::styled(Tone::Strong, format!("  {heading}")));
                }
                out.extend(indent(layout_tree(&step.body, mounts, &inner)));
            }
            out.push(Line::blank());
        }
        out.push(section_title(localizer.text(locale::ANSWER_LABEL)));
        match &view.answer {
            Some(answer) if view.answered => {
                out.extend(indent(layout_tree(answer, mounts, &inner)));
            }
            _ => {
                let waiting = localizer.text(locale::AWAITING_ANSWER);
                out.push(Line::styled(Tone::Muted, format!("  {waiting}")));
            }
        }
    }
    out
}
