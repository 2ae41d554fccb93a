// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Stepmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fs;
use std::path::{Path, PathBuf};

use rstest::rstest;
use stepmark::engine::HostView;
use stepmark::format::split_problems;
use stepmark::locale::{Catalog, Lang};
use stepmark::model::{MountId, ResponseFlow};
use stepmark::render::RenderOptions;
use stepmark::stream::{ChunkFeeder, StreamBuffer};
use stepmark::view::{
    paint_solution_text, paint_text, MarkdownRenderer, PaintOptions, ProblemView, SolutionRenderer,
};

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

fn read_fixture(name: &str) -> String {
    let path = fixtures_dir().join(name);
    fs::read_to_string(&path).unwrap_or_else(|err| panic!("failed to read {path:?}: {err}"))
}

fn placeholders(views: &[ProblemView]) -> usize {
    views
        .iter()
        .flat_map(|view| {
            view.preamble
                .iter()
                .chain(view.problem.iter())
                .chain(view.steps.iter().map(|step| &step.body))
                .chain(view.answer.iter())
        })
        .map(|tree| tree.placeholder_count())
        .sum()
}

fn mounted(views: &[ProblemView]) -> Vec<MountId> {
    views
        .iter()
        .flat_map(|view| {
            view.problem
                .iter()
                .chain(view.steps.iter().map(|step| &step.body))
                .chain(view.answer.iter())
                .flat_map(|tree| tree.mounted().into_iter().cloned())
                .collect::<Vec<_>>()
        })
        .collect()
}

struct Replay {
    text: String,
    max_placeholders: usize,
    mounts: Vec<MountId>,
    constructions: Vec<Option<usize>>,
}

fn replay_solution(response: &str, flow: ResponseFlow, chunk_bytes: usize) -> Replay {
    let mut renderer = SolutionRenderer::new(Catalog::new(Lang::En), RenderOptions::default());
    let mut feeder = ChunkFeeder::new(response, chunk_bytes);
    let mut buffer = StreamBuffer::new();
    let mut views = Vec::new();
    let mut max_placeholders = 0;
    while let Some(chunk) = feeder.next_chunk() {
        buffer.push_str(chunk);
        views = renderer.render(buffer.as_str(), flow);
        max_placeholders = max_placeholders.max(placeholders(&views));
    }
    assert_eq!(placeholders(&views), 0, "every fence is closed at the end");

    let mounts = mounted(&views);
    let constructions = mounts.iter().map(|mount| renderer.mounts().constructions(mount)).collect();
    let paint = PaintOptions::default();
    let text = paint_solution_text(&views, renderer.mounts(), renderer.localizer(), &paint);
    Replay { text, max_placeholders, mounts, constructions }
}

#[rstest]
#[case::solve("solve_two_problems.md", ResponseFlow::Solve, 3)]
#[case::improve("improve_board.md", ResponseFlow::Improve, 1)]
fn chunked_replay_matches_a_single_pass(
    #[case] fixture: &str,
    #[case] flow: ResponseFlow,
    #[case] diagrams: usize,
    #[values(1, 7, 64)] chunk_bytes: usize,
) {
    let response = read_fixture(fixture);
    let whole = replay_solution(&response, flow, response.len());
    let streamed = replay_solution(&response, flow, chunk_bytes);

    assert_eq!(streamed.text, whole.text);
    assert_eq!(streamed.mounts, whole.mounts);
    assert_eq!(streamed.mounts.len(), diagrams);
    assert!(streamed.max_placeholders > 0, "an open fence was shown as a placeholder");
    // Complete fences never change, so every engine is built exactly once.
    assert!(
        streamed.constructions.iter().all(|count| *count == Some(1)),
        "{:?}",
        streamed.constructions
    );
}

#[test]
fn solve_fixture_mounts_per_problem_and_field() {
    let response = read_fixture("solve_two_problems.md");
    let replay = replay_solution(&response, ResponseFlow::Solve, 16);
    let ids: Vec<&str> = replay.mounts.iter().map(MountId::as_str).collect();
    assert_eq!(ids, vec!["p0.step1:d0", "p1.step1:d0", "p1.answer:d0"]);

    assert!(replay.text.contains("▌ Problem 1"), "{}", replay.text);
    assert!(replay.text.contains("  Step 2: Draw the loop"), "{}", replay.text);
    assert!(!replay.text.contains("Error:"), "{}", replay.text);
}

#[test]
fn improve_fixture_mounts_an_interactive_board() {
    let response = read_fixture("improve_board.md");
    let mut renderer = SolutionRenderer::new(Catalog::new(Lang::En), RenderOptions::default());
    let views = renderer.render(&response, ResponseFlow::Improve);

    assert_eq!(views.len(), 1);
    assert!(views[0].problem.is_none());
    assert!(views[0].answered);
    let board = MountId::new("p0.step0:d0").expect("mount id");
    assert_eq!(renderer.mounts().focusable(), vec![board.clone()]);
    assert!(matches!(renderer.mounts().view(&board), Some(HostView::Rendered(_))));
}

#[test]
fn solve_sections_export_as_json() {
    let response = read_fixture("solve_two_problems.md");
    let sections = split_problems(&response, ResponseFlow::Solve);
    let json = serde_json::to_value(&sections).expect("serialize sections");

    assert_eq!(json.as_array().map(Vec::len), Some(2));
    assert_eq!(json[0]["explanation_steps"][1]["number"], 2);
    assert_eq!(json[0]["explanation_steps"][1]["title"], "Factor");
    assert_eq!(
        json[1]["final_answer"].as_str().map(|answer| answer.starts_with("```plot-mermaid")),
        Some(true)
    );
    assert!(json[0].get("preamble").is_none());
}

#[test]
fn chat_fixture_routes_every_fence_kind() {
    let response = read_fixture("chat_diagrams.md");
    let mut renderer = MarkdownRenderer::new(Catalog::new(Lang::En), RenderOptions::default());
    let tree = renderer.render(&response);

    let mounted: Vec<&str> = tree.mounted().into_iter().map(MountId::as_str).collect();
    assert_eq!(mounted, vec!["msg:d0"]);

    let text = paint_text(&tree, renderer.mounts(), &PaintOptions::default());
    assert!(text.contains("╭─ Force Plot [json]"), "{text}");
    assert!(text.contains("╭─ SVG [xml]"), "{text}");
    assert!(text.contains("<circle cx=\"5\" cy=\"5\" r=\"4\"/>"), "{text}");
    assert!(!text.contains("onclick"), "{text}");
    assert!(!text.contains("<script>"), "{text}");
    assert!(text.contains("╭─ Plot [json]\n│ {\"bars\": [3, 1, 2]}"), "{text}");
    assert!(text.contains("`x = 1`"), "{text}");
}

#[test]
fn chat_placeholder_uses_the_active_locale() {
    let response = read_fixture("chat_diagrams.md");
    let cut = response.find("```svg").expect("svg fence");
    let mut renderer = MarkdownRenderer::new(Catalog::new(Lang::Zh), RenderOptions::default());
    let tree = renderer.render(&response[..cut - 40]);

    assert_eq!(tree.placeholder_count(), 1);
    let text = paint_text(&tree, renderer.mounts(), &PaintOptions::default());
    assert!(text.contains("正在生成图表…"), "{text}");
    assert!(renderer.mounts().is_empty());
}
