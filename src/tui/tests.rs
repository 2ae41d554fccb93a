// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Stepmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::time::Duration;

use crossterm::event::KeyCode;

use super::testing::HeadlessTui;
use super::{board_key, TuiConfig};
use crate::engine::KeyInput;
use crate::model::{MountId, ResponseFlow};

const CHART: &str = "```plot-mermaid\ngraph LR\nA --> B\n```\n";
const BOARD: &str = "Board:\n\n```jessecode\nA = point(2, 3) <<name: 'A'>>;\n```\n";

fn chat(response: &str, chunk_bytes: usize) -> TuiConfig {
    TuiConfig {
        response: response.to_owned(),
        flow: None,
        chunk_bytes,
        tick: Duration::from_millis(50),
        ..TuiConfig::default()
    }
}

#[test]
fn open_fence_shows_the_placeholder_until_it_closes() {
    // The first chunk stops right before the closing fence.
    let mut tui = HeadlessTui::new(chat(CHART, 33), 60, 12);

    tui.tick();
    let screen = tui.screen();
    assert!(screen.contains("Generating diagram…"), "{screen}");
    assert!(!screen.contains("┌───┐"), "{screen}");

    tui.tick();
    let screen = tui.screen();
    assert!(!screen.contains("Generating diagram…"), "{screen}");
    assert!(screen.contains("│ │ A ├─────▶│ B │"), "{screen}");
    assert!(screen.contains(" done 37/37 B "), "{screen}");
}

#[test]
fn quit_keys_stop_the_loop() {
    for code in [KeyCode::Char('q'), KeyCode::Esc] {
        let mut tui = HeadlessTui::new(chat(CHART, 8), 60, 12);
        tui.press(code);
        assert!(tui.app.should_quit);
    }
}

#[test]
fn space_pauses_the_stream() {
    let mut tui = HeadlessTui::new(chat(CHART, 8), 60, 12);
    tui.tick();
    tui.press(KeyCode::Char(' '));
    tui.tick();
    tui.tick();
    assert_eq!(tui.app.buffer.len(), 8);
    assert!(tui.screen().contains(" paused 8/37 B "));

    tui.press(KeyCode::Char(' '));
    tui.tick();
    assert_eq!(tui.app.buffer.len(), 16);
}

#[test]
fn restart_rewinds_and_releases_every_engine() {
    let mut tui = HeadlessTui::new(chat(CHART, 8), 60, 12);
    tui.run_to_end();
    assert_eq!(tui.app.pipeline.mounts().len(), 1);

    tui.press(KeyCode::Char('r'));
    assert!(tui.app.buffer.is_empty());
    assert!(tui.app.pipeline.mounts().is_empty());
    assert_eq!(tui.app.feeder.progress(), (0, CHART.len()));
}

#[test]
fn source_toggle_swaps_chart_for_fence_body() {
    let mut tui = HeadlessTui::new(chat(CHART, 64), 60, 12);
    tui.run_to_end();
    tui.press(KeyCode::Char('s'));
    let screen = tui.screen();
    assert!(screen.contains("│ graph LR"), "{screen}");
    assert!(!screen.contains("─────▶"), "{screen}");
}

#[test]
fn tab_focuses_the_board_and_arrows_pan_it() {
    let mut tui = HeadlessTui::new(chat(BOARD, 16), 80, 40);
    tui.run_to_end();

    tui.press(KeyCode::Tab);
    assert_eq!(tui.app.focus, Some(MountId::new("msg:d0").expect("mount id")));
    let before = tui.screen();
    assert!(before.contains("╭─ JesseCode [js] ◆"), "{before}");
    assert!(before.contains(" board msg:d0 "), "{before}");

    tui.press(KeyCode::Right);
    let after = tui.screen();
    assert_ne!(before, after);

    tui.press(KeyCode::Tab);
    assert_eq!(tui.app.focus, None);
}

#[test]
fn scrolling_without_focus_moves_the_viewport() {
    let text: String = (0..30).map(|idx| format!("line {idx}\n\n")).collect();
    let mut tui = HeadlessTui::new(chat(&text, 4096), 40, 6);
    tui.run_to_end();

    let following = tui.screen();
    assert!(following.contains("line 29"), "{following}");

    tui.press(KeyCode::Char('g'));
    let top = tui.screen();
    assert!(top.starts_with("line 0"), "{top}");

    tui.press(KeyCode::Char('j'));
    tui.press(KeyCode::Char('j'));
    assert!(tui.screen().starts_with("line 1"));
}

#[test]
fn demo_response_renders_both_problems() {
    let config = TuiConfig { chunk_bytes: 4096, ..TuiConfig::default() };
    assert_eq!(config.flow, Some(ResponseFlow::Solve));
    let mut tui = HeadlessTui::new(config, 100, 300);
    tui.run_to_end();

    let screen = tui.screen();
    assert!(screen.contains("▌ Problem 1"), "{screen}");
    assert!(screen.contains("▌ Problem 2"), "{screen}");
    assert!(!screen.contains(" Error: "), "{screen}");
    assert_eq!(tui.app.pipeline.mounts().focusable().len(), 1);
}

#[test]
fn board_keys_cover_pan_and_zoom() {
    assert_eq!(board_key(KeyCode::Up), Some(KeyInput::Up));
    assert_eq!(board_key(KeyCode::Char('l')), Some(KeyInput::Char('l')));
    assert_eq!(board_key(KeyCode::Char('+')), Some(KeyInput::Char('+')));
    assert_eq!(board_key(KeyCode::Char('s')), None);
    assert_eq!(board_key(KeyCode::Tab), None);
}
