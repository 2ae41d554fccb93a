// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Stepmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Core data types shared by the parsing, classification and rendering stages.

pub mod diagram;
pub mod flow_ast;
pub mod ids;
pub mod node;
pub mod problem;

pub use diagram::{DiagramKind, DiagramSpec};
pub use flow_ast::{EdgeStroke, FlowDirection, FlowEdge, FlowNode, FlowchartAst, NodeShape};
pub use ids::{Id, IdError, MountId};
pub use node::{NodeType, Point, Position, SyntaxNode};
pub use problem::{ExplanationStep, ProblemSection, ResponseFlow};
