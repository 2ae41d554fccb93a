// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Stepmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Text formats: the response protocol, Markdown, and the languages embedded in diagram fences.

pub mod expr;
pub mod jessecode;
pub mod markdown;
pub mod mermaid;
pub mod protocol;

pub use expr::{parse_expr, Expr, ExprError};
pub use jessecode::{parse_jessecode, JesseCodeError, JesseScript};
pub use markdown::{code_nodes, parse_markdown};
pub use mermaid::{parse_flowchart, FlowchartParseError};
pub use protocol::{split_problems, split_steps};
