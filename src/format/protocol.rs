// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Stepmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Splits a sectioned Markdown-KV response into problem sections.
//!
//! Wire format (case-sensitive, one literal per line):
//! - problems are separated by `---PROBLEM_SEPARATOR---`
//! - solve flow headers: `### PROBLEM_TEXT`, `### EXPLANATION`, `### ANSWER`
//! - improve flow headers: `### IMPROVED_EXPLANATION`, `### IMPROVED_ANSWER`
//! - steps inside an explanation: `#### Step <N>: <title>`
//!
//! The splitter runs against buffers that are still streaming, so nothing here fails: missing
//! headers leave their field empty, a trailing line that is only the beginning of a protocol
//! literal is held back until it completes, and headers inside fenced code are plain text.

use std::sync::OnceLock;

use memchr::memmem;
use regex::Regex;

use crate::model::problem::{PROBLEM_SEPARATOR, STEP_MARKER_PREFIX};
use crate::model::{ExplanationStep, ProblemSection, ResponseFlow};

fn step_marker_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^#### Step (\d+):\s*(.*)$").expect("valid step marker regex"))
}

fn partial_step_number_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^#### Step \d+$").expect("valid partial step regex"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Preamble,
    Problem,
    Explanation,
    Answer,
}

fn header_field(trimmed: &str, flow: ResponseFlow) -> Option<Field> {
    if flow.problem_header() == Some(trimmed) {
        return Some(Field::Problem);
    }
    if trimmed == flow.explanation_header() {
        return Some(Field::Explanation);
    }
    if trimmed == flow.answer_header() {
        return Some(Field::Answer);
    }
    None
}

const MAX_FENCE_INDENT: usize = 3;

/// Tracks whether the scan is inside a fenced code block.
#[derive(Debug, Default)]
struct FenceTracker {
    open: Option<(char, usize)>,
}

impl FenceTracker {
    fn in_fence(&self) -> bool {
        self.open.is_some()
    }

    /// Tracks CommonMark fence delimiters: at most three spaces of indentation, and a backtick
    /// opener's info string must not contain a backtick.
    fn observe(&mut self, line: &str) {
        let trimmed = line.trim_start_matches(' ');
        if line.len() - trimmed.len() > MAX_FENCE_INDENT || trimmed.starts_with('\t') {
            return;
        }
        let Some(marker) = trimmed.chars().next().filter(|ch| matches!(ch, '`' | '~')) else {
            return;
        };
        let run = trimmed.chars().take_while(|ch| *ch == marker).count();
        if run < 3 {
            return;
        }
        let rest = &trimmed[run * marker.len_utf8()..];

        match self.open {
            None => {
                if marker == '`' && rest.contains('`') {
                    return;
                }
                self.open = Some((marker, run));
            }
            Some((open_marker, open_run)) => {
                if marker == open_marker && run >= open_run && rest.trim().is_empty() {
                    self.open = None;
                }
            }
        }
    }
}

/// Drops a final unterminated line that is only a prefix of a protocol literal.
fn withhold_partial_tail(raw: &str, flow: ResponseFlow) -> &str {
    let line_start = raw.rfind('\n').map(|idx| idx + 1).unwrap_or(0);
    let tail = raw[line_start..].trim();
    if tail.is_empty() {
        return raw;
    }

    let mut literals = vec![
        PROBLEM_SEPARATOR,
        STEP_MARKER_PREFIX,
        flow.explanation_header(),
        flow.answer_header(),
    ];
    if let Some(problem) = flow.problem_header() {
        literals.push(problem);
    }

    let is_partial_literal =
        literals.iter().any(|literal| literal.len() > tail.len() && literal.starts_with(tail));
    if is_partial_literal || partial_step_number_regex().is_match(tail) {
        &raw[..line_start]
    } else {
        raw
    }
}

fn push_field_line(slot: &mut Option<String>, line: &str) {
    slot.get_or_insert_with(String::new).push_str(line);
}

fn open_field(slot: &mut Option<String>) {
    match slot {
        Some(existing) if !existing.trim().is_empty() => existing.push_str("\n\n"),
        Some(_) => {}
        None => *slot = Some(String::new()),
    }
}

fn trimmed(slot: Option<String>) -> Option<String> {
    slot.map(|text| text.trim().to_owned())
}

/// Splits an explanation body into ordered steps.
///
/// Text before the first marker becomes an unnumbered, untitled step.
pub fn split_steps(explanation: &str) -> Vec<ExplanationStep> {
    let mut steps = Vec::<ExplanationStep>::new();
    let mut fence = FenceTracker::default();
    let mut current: Option<ExplanationStep> = None;
    let mut lead = String::new();

    for line in explanation.split_inclusive('\n') {
        if !fence.in_fence() {
            if let Some(captures) = step_marker_regex().captures(line.trim()) {
                let number = captures[1].parse::<u32>().ok().filter(|n| *n > 0);
                if let Some(number) = number {
                    if let Some(step) = current.take() {
                        steps.push(step);
                    }
                    current = Some(ExplanationStep {
                        number: Some(number),
                        title: captures[2].trim().to_owned(),
                        body: String::new(),
                    });
                    continue;
                }
            }
        }

        fence.observe(line);
        match current.as_mut() {
            Some(step) => step.body.push_str(line),
            None => lead.push_str(line),
        }
    }

    if let Some(step) = current.take() {
        steps.push(step);
    }

    let lead = lead.trim();
    if !lead.is_empty() {
        let lead = ExplanationStep { number: None, title: String::new(), body: lead.to_owned() };
        steps.insert(0, lead);
    }

    for step in &mut steps {
        step.body = step.body.trim().to_owned();
    }

    steps
}

fn parse_chunk(chunk: &str, flow: ResponseFlow) -> Option<ProblemSection> {
    if chunk.trim().is_empty() {
        return None;
    }

    let mut field = Field::Preamble;
    let mut preamble: Option<String> = None;
    let mut problem: Option<String> = None;
    let mut explanation: Option<String> = None;
    let mut answer: Option<String> = None;
    let mut fence = FenceTracker::default();

    for line in chunk.split_inclusive('\n') {
        if !fence.in_fence() {
            if let Some(next) = header_field(line.trim(), flow) {
                field = next;
                match field {
                    Field::Preamble => {}
                    Field::Problem => open_field(&mut problem),
                    Field::Explanation => open_field(&mut explanation),
                    Field::Answer => open_field(&mut answer),
                }
                continue;
            }
        }

        fence.observe(line);
        let slot = match field {
            Field::Preamble => &mut preamble,
            Field::Problem => &mut problem,
            Field::Explanation => &mut explanation,
            Field::Answer => &mut answer,
        };
        push_field_line(slot, line);
    }

    let preamble = trimmed(preamble).filter(|text| !text.is_empty());
    let explanation_steps = match &explanation {
        Some(text) => split_steps(text),
        None => Vec::new(),
    };

    Some(ProblemSection {
        preamble,
        problem_text: trimmed(problem),
        explanation_steps,
        final_answer: trimmed(answer),
    })
}

/// Splits one (possibly partial) response into its problem sections, in order.
pub fn split_problems(raw: &str, flow: ResponseFlow) -> Vec<ProblemSection> {
    let raw = withhold_partial_tail(raw, flow);
    let finder = memmem::Finder::new(PROBLEM_SEPARATOR.as_bytes());

    let mut sections = Vec::new();
    let mut start = 0usize;
    for idx in finder.find_iter(raw.as_bytes()) {
        sections.extend(parse_chunk(&raw[start..idx], flow));
        start = idx + PROBLEM_SEPARATOR.len();
    }
    sections.extend(parse_chunk(&raw[start..], flow));

    sections
}

#[cfg(test)]
mod tests;
