// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Stepmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Code-block classification and render-path dispatch.
//!
//! Precedence, first match wins:
//! 1. `plot-*` tags pick a plot kind by exact tag (`plot-function`, `plot-force`, `plot-mermaid`),
//!    any other suffix is a generic plot
//! 2. `svg`/`xml` tags whose trimmed content starts with `<svg` are raw graphics
//! 3. `jessecode` is the interactive board
//! 4. any other tag is a plain code view
//! 5. no tag at all is inline code
//!
//! Diagram kinds (1-3) are gated on fence completeness: partial source never reaches an engine.

use std::sync::OnceLock;

use regex::Regex;
use smol_str::SmolStr;

use crate::model::{DiagramKind, DiagramSpec, SyntaxNode};
use crate::stream::is_fence_complete;

pub const PLOT_PREFIX: &str = "plot-";
pub const FUNCTION_PLOT_TAG: &str = "plot-function";
pub const FORCE_PLOT_TAG: &str = "plot-force";
pub const MERMAID_TAG: &str = "plot-mermaid";
pub const SVG_TAG: &str = "svg";
pub const XML_TAG: &str = "xml";
pub const JESSECODE_TAG: &str = "jessecode";
const SVG_ROOT_OPEN: &str = "<svg";

fn language_class_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"language-([\w-]+)").expect("valid language class regex"))
}

/// Extracts the language tag from a code element's class name.
pub fn language_tag(class_name: Option<&str>) -> Option<&str> {
    let captures = language_class_regex().captures(class_name?)?;
    captures.get(1).map(|tag| tag.as_str())
}

/// Total, pure classification of a tag + content pair.
pub fn classify(tag: Option<&str>, content: &str) -> DiagramKind {
    let Some(tag) = tag.filter(|tag| !tag.is_empty()) else {
        return DiagramKind::Plain;
    };

    if tag.starts_with(PLOT_PREFIX) {
        return match tag {
            FUNCTION_PLOT_TAG => DiagramKind::FunctionPlot,
            FORCE_PLOT_TAG => DiagramKind::ForcePlot,
            MERMAID_TAG => DiagramKind::Mermaid,
            _ => DiagramKind::GenericPlot,
        };
    }

    if (tag == SVG_TAG || tag == XML_TAG) && content.trim_start().starts_with(SVG_ROOT_OPEN) {
        return DiagramKind::Svg;
    }

    if tag == JESSECODE_TAG {
        return DiagramKind::ScriptedGraph;
    }

    DiagramKind::Plain
}

/// Fence body as shown to renderers: the code text minus one trailing newline.
pub fn code_content(node: &SyntaxNode) -> String {
    let mut content = node.text_content();
    if content.ends_with('\n') {
        content.pop();
    }
    content
}

/// Classifies one `code` element against the raw source received so far.
///
/// Computed fresh on every pass; `content` and `is_complete` both move while the stream grows.
pub fn diagram_spec(node: &SyntaxNode, source: &str) -> DiagramSpec {
    let language_tag = language_tag(node.class_name()).map(SmolStr::new);
    let content = code_content(node);
    let kind = classify(language_tag.as_deref(), &content);
    DiagramSpec { kind, language_tag, content, is_complete: is_fence_complete(node, source) }
}

/// Where one code node goes in the render tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeRoute {
    /// No language tag: plain inline text with minimal styling.
    Inline,
    /// Tagged, not a diagram: generic code viewer.
    Code { language: SmolStr },
    /// A diagram whose closing fence has not arrived yet.
    Placeholder(DiagramKind),
    /// A complete diagram fence.
    Diagram(DiagramKind),
}

pub fn dispatch(spec: &DiagramSpec) -> CodeRoute {
    let Some(language) = spec.language_tag.as_ref() else {
        return CodeRoute::Inline;
    };

    if !spec.kind.is_diagram() {
        return CodeRoute::Code { language: language.clone() };
    }

    if spec.is_complete {
        CodeRoute::Diagram(spec.kind)
    } else {
        CodeRoute::Placeholder(spec.kind)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{classify, diagram_spec, dispatch, language_tag, CodeRoute};
    use crate::format::markdown::{code_nodes, parse_markdown};
    use crate::model::{DiagramKind, DiagramSpec};

    fn first_spec(source: &str) -> DiagramSpec {
        let root = parse_markdown(source);
        let nodes = code_nodes(&root);
        diagram_spec(nodes.first().expect("code node"), source)
    }

    #[rstest]
    #[case(Some("language-plot-force"), Some("plot-force"))]
    #[case(Some("language-rust"), Some("rust"))]
    #[case(Some("hljs language-js"), Some("js"))]
    #[case(Some("plain"), None)]
    #[case(None, None)]
    fn extracts_language_tag(#[case] class_name: Option<&str>, #[case] expected: Option<&str>) {
        assert_eq!(language_tag(class_name), expected);
    }

    #[rstest]
    #[case(Some("plot-function"), "{}", DiagramKind::FunctionPlot)]
    #[case(Some("plot-force"), "{}", DiagramKind::ForcePlot)]
    #[case(Some("plot-mermaid"), "graph TD", DiagramKind::Mermaid)]
    #[case(Some("plot-bar"), "{}", DiagramKind::GenericPlot)]
    #[case(Some("svg"), "<svg></svg>", DiagramKind::Svg)]
    #[case(Some("xml"), "  <svg viewBox=\"0 0 1 1\"/>", DiagramKind::Svg)]
    #[case(Some("xml"), "<note/>", DiagramKind::Plain)]
    #[case(Some("jessecode"), "A = point(1, 2);", DiagramKind::ScriptedGraph)]
    #[case(Some("python"), "print(1)", DiagramKind::Plain)]
    #[case(None, "x", DiagramKind::Plain)]
    fn classifies_by_precedence(
        #[case] tag: Option<&str>,
        #[case] content: &str,
        #[case] expected: DiagramKind,
    ) {
        assert_eq!(classify(tag, content), expected);
    }

    #[test]
    fn complete_force_plot_is_routed_to_its_renderer() {
        let source = "```plot-force\n{\"nodes\":[]}\n```";
        let spec = first_spec(source);
        assert_eq!(spec.kind, DiagramKind::ForcePlot);
        assert_eq!(spec.content, "{\"nodes\":[]}");
        assert!(spec.is_complete);
        assert_eq!(dispatch(&spec), CodeRoute::Diagram(DiagramKind::ForcePlot));
    }

    #[test]
    fn unterminated_force_plot_gets_a_placeholder() {
        let spec = first_spec("```plot-force\n{\"nodes\":[]");
        assert_eq!(spec.kind, DiagramKind::ForcePlot);
        assert!(!spec.is_complete);
        assert_eq!(dispatch(&spec), CodeRoute::Placeholder(DiagramKind::ForcePlot));
    }

    #[test]
    fn well_formed_looking_partial_fence_still_waits() {
        let spec = first_spec("```plot-force\n{\"nodes\":[]}\n``");
        assert!(!spec.is_complete);
        assert_eq!(dispatch(&spec), CodeRoute::Placeholder(DiagramKind::ForcePlot));
    }

    #[test]
    fn svg_tag_without_svg_root_is_plain_code() {
        let spec = first_spec("```svg\n<div>not svg</div>\n```");
        assert_eq!(spec.kind, DiagramKind::Plain);
        assert_eq!(dispatch(&spec), CodeRoute::Code { language: "svg".into() });
    }

    #[test]
    fn plain_code_is_never_gated_on_completeness() {
        let spec = first_spec("```python\nprint(1)");
        assert!(!spec.is_complete);
        assert_eq!(dispatch(&spec), CodeRoute::Code { language: "python".into() });
    }

    #[test]
    fn inline_code_short_circuits() {
        let spec = first_spec("the `plot-force` tag");
        assert_eq!(spec.language_tag, None);
        assert_eq!(dispatch(&spec), CodeRoute::Inline);
    }

    #[test]
    fn tilde_fences_complete_too() {
        let spec = first_spec("~~~jessecode\nA = point(1, 1);\n~~~\n");
        assert!(spec.is_complete);
        assert_eq!(dispatch(&spec), CodeRoute::Diagram(DiagramKind::ScriptedGraph));
    }

    #[test]
    fn classification_is_idempotent() {
        let source = "```plot-mermaid\ngraph TD\nA-->B\n```\n\n```svg\n<svg/>\n```\n";
        let root = parse_markdown(source);
        let first: Vec<DiagramSpec> =
            code_nodes(&root).into_iter().map(|node| diagram_spec(node, source)).collect();
        let root = parse_markdown(source);
        let second: Vec<DiagramSpec> =
            code_nodes(&root).into_iter().map(|node| diagram_spec(node, source)).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn completed_fences_stay_complete_as_text_is_appended() {
        let full = "```plot-function\n{\"data\":[]}\n```\n\nmore text follows";
        let closed_at = full.find("```\n\n").expect("closing fence") + 3;
        for end in closed_at..=full.len() {
            let spec = first_spec(&full[..end]);
            assert!(spec.is_complete, "incomplete again at byte {end}");
        }
    }
}
