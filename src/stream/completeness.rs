// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Stepmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Fence completeness: has a fenced block's closing delimiter actually arrived?
//!
//! The Markdown parser closes an unterminated fence at end of input, so a structurally closed
//! block is not proof that the author's closing fence has streamed in. The check here is local
//! and cheap: it looks at the three bytes right before the node's end offset.

use crate::model::{Position, SyntaxNode};

const BACKTICK_FENCE: &[u8; 3] = b"```";
const TILDE_FENCE: &[u8; 3] = b"~~~";

pub fn is_fence_complete(node: &SyntaxNode, source: &str) -> bool {
    position_is_complete(node.position.as_ref(), source)
}

pub fn position_is_complete(position: Option<&Position>, source: &str) -> bool {
    let Some(position) = position else {
        return false;
    };

    let Some(end) = position.end.offset else {
        // Offset-less nodes are never subject to streaming truncation.
        return true;
    };

    let bytes = source.as_bytes();
    if end > bytes.len() || end < 3 {
        return false;
    }

    let tail = &bytes[end - 3..end];
    tail == BACKTICK_FENCE || tail == TILDE_FENCE
}
