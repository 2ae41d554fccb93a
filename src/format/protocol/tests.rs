// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Stepmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use rstest::{fixture, rstest};

use super::{split_problems, split_steps};
use crate::model::{ExplanationStep, ResponseFlow};

const SINGLE: &str =
    "### PROBLEM_TEXT\nWhat is 2+2?\n\n### EXPLANATION\n#### Step 1: Add\n2+2=4\n\n### ANSWER\n4";

#[fixture]
fn two_problems() -> String {
    format!(
        "{SINGLE}\n---PROBLEM_SEPARATOR---\n### PROBLEM_TEXT\nSolve $$ x^2 = 9 $$\n\n### EXPLANATION\n#### Step 1: Take roots\n$$ x = \\pm 3 $$\n\n#### Step 2: Check\nBoth work.\n\n### ANSWER\n$$ x = \\pm 3 $$\n"
    )
}

#[test]
fn single_problem_is_parsed_into_fields() {
    let sections = split_problems(SINGLE, ResponseFlow::Solve);
    assert_eq!(sections.len(), 1);

    let section = &sections[0];
    assert_eq!(section.problem_text.as_deref(), Some("What is 2+2?"));
    assert_eq!(
        section.explanation_steps,
        vec![ExplanationStep { number: Some(1), title: "Add".to_owned(), body: "2+2=4".to_owned() }]
    );
    assert_eq!(section.final_answer.as_deref(), Some("4"));
    assert!(section.is_answered());
    assert_eq!(section.preamble, None);
}

#[rstest]
fn separator_yields_sections_in_order(two_problems: String) {
    let sections = split_problems(&two_problems, ResponseFlow::Solve);
    assert_eq!(sections.len(), 2);
    assert_eq!(sections[0].problem_text.as_deref(), Some("What is 2+2?"));
    assert_eq!(sections[1].problem_text.as_deref(), Some("Solve $$ x^2 = 9 $$"));

    let titles: Vec<&str> =
        sections[1].explanation_steps.iter().map(|step| step.title.as_str()).collect();
    assert_eq!(titles, vec!["Take roots", "Check"]);
    assert_eq!(sections[1].final_answer.as_deref(), Some("$$ x = \\pm 3 $$"));
}

#[rstest]
fn splitting_is_idempotent(two_problems: String) {
    let first = split_problems(&two_problems, ResponseFlow::Solve);
    let second = split_problems(&two_problems, ResponseFlow::Solve);
    assert_eq!(first, second);
}

#[rstest]
fn section_count_never_decreases_while_streaming(two_problems: String) {
    let mut previous = 0usize;
    for end in 0..=two_problems.len() {
        if !two_problems.is_char_boundary(end) {
            continue;
        }
        let count = split_problems(&two_problems[..end], ResponseFlow::Solve).len();
        assert!(count >= previous, "count dropped from {previous} to {count} at byte {end}");
        previous = count;
    }
    assert_eq!(previous, 2);
}

#[test]
fn truncated_section_keeps_present_fields_and_leaves_the_rest_empty() {
    let sections =
        split_problems(
            "### PROBLEM_TEXT\nWhat is 2+2?\n\n### EXPLANATION\n#### Step 1: Ad",
            ResponseFlow::Solve,
        );
    assert_eq!(sections.len(), 1);
    let section = &sections[0];
    assert_eq!(section.problem_text.as_deref(), Some("What is 2+2?"));
    assert_eq!(section.explanation_steps.len(), 1);
    assert_eq!(section.explanation_steps[0].title, "Ad");
    assert_eq!(section.final_answer, None);
    assert!(!section.is_answered());
}

#[test]
fn header_that_just_arrived_is_present_but_empty() {
    let sections = split_problems("### PROBLEM_TEXT\nq\n### ANSWER\n", ResponseFlow::Solve);
    assert_eq!(sections[0].final_answer.as_deref(), Some(""));
}

#[rstest]
#[case("### PROBLEM_TEXT\nq\n### ANS")]
#[case("### PROBLEM_TEXT\nq\n---PROBLEM_SEP")]
#[case("### PROBLEM_TEXT\nq\n#### Step 2")]
fn partial_protocol_literal_at_the_tail_is_withheld(#[case] raw: &str) {
    let sections = split_problems(raw, ResponseFlow::Solve);
    assert_eq!(sections.len(), 1);
    assert_eq!(sections[0].problem_text.as_deref(), Some("q"));
}

#[test]
fn headers_are_case_sensitive() {
    let sections = split_problems("### answer\n4", ResponseFlow::Solve);
    assert_eq!(sections[0].final_answer, None);
    assert_eq!(sections[0].preamble.as_deref(), Some("### answer\n4"));
}

#[test]
fn headers_inside_fenced_code_are_text() {
    let raw = "### EXPLANATION\n#### Step 1: Show format\n```text\n### ANSWER\n#### Step 9: nope\n```\n### ANSWER\n42";
    let sections = split_problems(raw, ResponseFlow::Solve);
    let section = &sections[0];
    assert_eq!(section.explanation_steps.len(), 1);
    assert!(section.explanation_steps[0].body.contains("### ANSWER"));
    assert!(section.explanation_steps[0].body.contains("#### Step 9: nope"));
    assert_eq!(section.final_answer.as_deref(), Some("42"));
}

#[rstest]
#[case("```x``` is a code span, not a fence\n")]
#[case("    ```\n")]
fn lines_that_are_not_fence_openers_keep_headers_live(#[case] line: &str) {
    let raw = format!(
        "### PROBLEM_TEXT\n{line}\n### EXPLANATION\n#### Step 1: Add\n2+2=4\n\n### ANSWER\n4"
    );
    let sections = split_problems(&raw, ResponseFlow::Solve);
    let section = &sections[0];
    assert_eq!(section.problem_text.as_deref(), Some(line.trim()));
    assert_eq!(section.explanation_steps.len(), 1);
    assert_eq!(section.explanation_steps[0].title, "Add");
    assert_eq!(section.final_answer.as_deref(), Some("4"));
}

#[test]
fn improve_flow_uses_improved_headers() {
    let raw = "### IMPROVED_EXPLANATION\n#### Step 1: Recheck\nFixed sign.\n\n### IMPROVED_ANSWER\n-3";
    let sections = split_problems(raw, ResponseFlow::Improve);
    assert_eq!(sections.len(), 1);
    assert_eq!(sections[0].problem_text, None);
    assert_eq!(sections[0].explanation_steps[0].title, "Recheck");
    assert_eq!(sections[0].final_answer.as_deref(), Some("-3"));

    let as_solve = split_problems(raw, ResponseFlow::Solve);
    assert_eq!(as_solve[0].final_answer, None);
}

#[test]
fn whitespace_only_chunks_are_skipped() {
    let raw = "\n---PROBLEM_SEPARATOR---\n   \n---PROBLEM_SEPARATOR---\n### ANSWER\n1";
    let sections = split_problems(raw, ResponseFlow::Solve);
    assert_eq!(sections.len(), 1);
}

#[test]
fn repeated_header_appends() {
    let sections = split_problems("### ANSWER\n1\n### ANSWER\n2", ResponseFlow::Solve);
    assert_eq!(sections[0].final_answer.as_deref(), Some("1\n\n\n2"));
}

#[test]
fn text_before_first_step_is_an_unnumbered_step() {
    let steps = split_steps("We start here.\n\n#### Step 1: Go\nbody\n#### Step 2:\n");
    assert_eq!(steps.len(), 3);
    assert_eq!(steps[0].number, None);
    assert_eq!(steps[0].body, "We start here.");
    assert_eq!(steps[1].number, Some(1));
    assert_eq!(steps[2].number, Some(2));
    assert_eq!(steps[2].title, "");
    assert_eq!(steps[2].body, "");
}

#[test]
fn step_zero_is_not_a_marker() {
    let steps = split_steps("#### Step 0: nope\ntext");
    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0].number, None);
}
