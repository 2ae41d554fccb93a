// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Stepmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use super::Canvas;

pub(crate) fn truncate_with_ellipsis(text: &str, max_len: usize) -> String {
    match max_len {
        0 => String::new(),
        _ if text_len(text) <= max_len => text.to_owned(),
        1 => "…".to_owned(),
        _ => {
            let mut out: String = text.chars().take(max_len - 1).collect();
            out.push('…');
            out
        }
    }
}

pub(crate) fn text_len(text: &str) -> usize {
    text.chars().count()
}

/// Left column that centers `text` inside `width` cells.
pub(crate) fn centered_start(text: &str, width: usize) -> usize {
    width.saturating_sub(text_len(text)) / 2
}

/// Canvas rows with trailing blanks removed; trailing empty rows are dropped.
pub(crate) fn canvas_to_string_trimmed(canvas: &Canvas) -> String {
    let mut lines = Vec::<String>::with_capacity(canvas.height());
    for y in 0..canvas.height() {
        let line: String = (0..canvas.width()).filter_map(|x| canvas.get(x, y).ok()).collect();
        lines.push(line.trim_end_matches(' ').to_owned());
    }

    while matches!(lines.last(), Some(line) if line.is_empty()) {
        lines.pop();
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::{canvas_to_string_trimmed, centered_start, text_len, truncate_with_ellipsis};
    use crate::render::Canvas;

    #[test]
    fn truncate_with_ellipsis_handles_small_widths() {
        assert_eq!(truncate_with_ellipsis("hello", 0), "");
        assert_eq!(truncate_with_ellipsis("hello", 1), "…");
        assert_eq!(truncate_with_ellipsis("h", 1), "h");
        assert_eq!(truncate_with_ellipsis("hello", 2), "h…");
    }

    #[test]
    fn widths_count_chars_not_bytes() {
        assert_eq!(text_len("αβγ"), 3);
        assert_eq!(truncate_with_ellipsis("αβγ", 2), "α…");
        assert_eq!(centered_start("αβ", 6), 2);
    }

    #[test]
    fn trimmed_output_drops_trailing_blanks() {
        let mut canvas = Canvas::new(3, 3).expect("canvas");
        canvas.set(0, 0, 'A').expect("set");
        canvas.set(1, 1, 'B').expect("set");
        assert_eq!(canvas_to_string_trimmed(&canvas), "A\n B");
    }
}
