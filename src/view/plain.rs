// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Stepmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use crate::engine::DiagramMounts;
use crate::locale::Localizer;

use super::lines::{layout_tree, Line, PaintOptions};
use super::solution::{layout_solution, ProblemView};
use super::RenderTree;

fn join(lines: &[Line]) -> String {
    let mut out = String::new();
    for line in lines {
        out.push_str(line.text().trim_end());
        out.push('\n');
    }
    while out.ends_with("\n\n") {
        out.pop();
    }
    out
}

/// Paints a render tree as plain text, one `'\n'`-terminated line per row.
pub fn paint_text(tree: &RenderTree, mounts: &DiagramMounts, options: &PaintOptions) -> String {
    join(&layout_tree(tree, mounts, options))
}

pub fn paint_solution_text(
    views: &[ProblemView],
    mounts: &DiagramMounts,
    localizer: &dyn Localizer,
    options: &PaintOptions,
) -> String {
    join(&layout_solution(views, mounts, localizer, options))
}
