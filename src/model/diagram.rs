// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Stepmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;

use smol_str::SmolStr;

/// The closed set of visualizations a fenced block can select through its language tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DiagramKind {
    /// Not a diagram: generic code viewer (or inline code when there is no tag).
    Plain,
    FunctionPlot,
    ForcePlot,
    Mermaid,
    /// A `plot-*` tag with an unrecognized suffix; shown through the structured source viewer.
    GenericPlot,
    Svg,
    ScriptedGraph,
}

impl DiagramKind {
    pub fn is_diagram(self) -> bool {
        !matches!(self, Self::Plain)
    }

    /// Language used when the diagram frame shows its source instead of the rendering.
    pub fn source_language(self) -> &'static str {
        match self {
            Self::Plain => "text",
            Self::FunctionPlot | Self::ForcePlot | Self::GenericPlot => "json",
            Self::Mermaid => "mermaid",
            Self::Svg => "xml",
            Self::ScriptedGraph => "js",
        }
    }

    /// Label used in inline error panels (`"<label> Error: …"`).
    pub fn label(self) -> &'static str {
        match self {
            Self::Plain => "Code",
            Self::FunctionPlot => "Function Plot",
            Self::ForcePlot => "Force Plot",
            Self::Mermaid => "Mermaid",
            Self::GenericPlot => "Plot",
            Self::Svg => "SVG",
            Self::ScriptedGraph => "JesseCode",
        }
    }
}

impl fmt::Display for DiagramKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Plain => "plain",
            Self::FunctionPlot => "function-plot",
            Self::ForcePlot => "force-plot",
            Self::Mermaid => "mermaid",
            Self::GenericPlot => "generic-plot",
            Self::Svg => "svg",
            Self::ScriptedGraph => "scripted-graph",
        };
        f.write_str(name)
    }
}

/// Classification of one code node for the current render pass.
///
/// Never cached: both `content` and `is_complete` change while the response streams in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramSpec {
    pub kind: DiagramKind,
    pub language_tag: Option<SmolStr>,
    pub content: String,
    pub is_complete: bool,
}
