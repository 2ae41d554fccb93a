// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Stepmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Mermaid parsing for the flow-diagram engine (`plot-mermaid` fences).

pub mod flowchart;
mod ident;

pub use flowchart::{parse_flowchart, FlowchartParseError, MermaidIdentError};
