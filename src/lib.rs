// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Stepmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Stepmark: streaming renderer for sectioned homework-solver Markdown.
//!
//! A response arrives as a growing text. Every render pass splits it into problems, parses each
//! field as Markdown, and routes fenced code blocks to diagram engines once their closing fence
//! has arrived. Engines are mounted per block and survive across passes while their content is
//! unchanged.

pub mod classify;
pub mod engine;
pub mod format;
pub mod layout;
pub mod locale;
pub mod model;
pub mod prompt;
pub mod render;
pub mod sanitize;
pub mod stream;
pub mod tui;
pub mod view;
