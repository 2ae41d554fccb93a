// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Stepmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use serde::Serialize;

/// Which response protocol a stream follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFlow {
    /// `### PROBLEM_TEXT` / `### EXPLANATION` / `### ANSWER`, problems split by the separator.
    #[default]
    Solve,
    /// `### IMPROVED_EXPLANATION` / `### IMPROVED_ANSWER`.
    Improve,
}

impl ResponseFlow {
    pub fn problem_header(self) -> Option<&'static str> {
        match self {
            Self::Solve => Some(PROBLEM_TEXT_HEADER),
            Self::Improve => None,
        }
    }

    pub fn explanation_header(self) -> &'static str {
        match self {
            Self::Solve => EXPLANATION_HEADER,
            Self::Improve => IMPROVED_EXPLANATION_HEADER,
        }
    }

    pub fn answer_header(self) -> &'static str {
        match self {
            Self::Solve => ANSWER_HEADER,
            Self::Improve => IMPROVED_ANSWER_HEADER,
        }
    }
}

pub const PROBLEM_SEPARATOR: &str = "---PROBLEM_SEPARATOR---";
pub const PROBLEM_TEXT_HEADER: &str = "### PROBLEM_TEXT";
pub const EXPLANATION_HEADER: &str = "### EXPLANATION";
pub const ANSWER_HEADER: &str = "### ANSWER";
pub const IMPROVED_EXPLANATION_HEADER: &str = "### IMPROVED_EXPLANATION";
pub const IMPROVED_ANSWER_HEADER: &str = "### IMPROVED_ANSWER";
pub const STEP_MARKER_PREFIX: &str = "#### Step ";

/// One explanation step. `number` is `None` for free text that preceded the first step marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExplanationStep {
    pub number: Option<u32>,
    pub title: String,
    pub body: String,
}

/// One question + explanation + answer unit of a response.
///
/// `problem_text` and `final_answer` are `None` until their header has arrived and `Some("")`
/// while the header is there but its body is not.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ProblemSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preamble: Option<String>,
    pub problem_text: Option<String>,
    pub explanation_steps: Vec<ExplanationStep>,
    pub final_answer: Option<String>,
}

impl ProblemSection {
    pub fn is_answered(&self) -> bool {
        matches!(&self.final_answer, Some(answer) if !answer.is_empty())
    }
}
