// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Stepmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Allow-list sanitizer for raw SVG fences.
//!
//! Markup is tokenized and re-serialized; only allow-listed elements and attributes survive.
//! Everything else is dropped silently:
//! - elements outside the list are dropped with their whole subtree (`script`, `foreignObject`, …)
//! - `on*` event handlers, `href`s that are not in-document fragments, and attribute values that
//!   smuggle `javascript:` or CSS `expression(` are dropped
//! - comments, processing instructions and doctypes are dropped
//!
//! The output is always well-formed: a truncated or malformed document stops the scan and every
//! element still open is closed. A document whose root is not `<svg>` sanitizes to nothing.

use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

const ALLOWED_ELEMENTS: &[&str] = &[
    "svg",
    "g",
    "defs",
    "title",
    "desc",
    "symbol",
    "use",
    "path",
    "rect",
    "circle",
    "ellipse",
    "line",
    "polyline",
    "polygon",
    "text",
    "tspan",
    "textPath",
    "marker",
    "linearGradient",
    "radialGradient",
    "stop",
    "clipPath",
    "mask",
    "pattern",
];

const ALLOWED_ATTRIBUTES: &[&str] = &[
    "id",
    "class",
    "style",
    "xmlns",
    "xmlns:xlink",
    "version",
    "viewBox",
    "preserveAspectRatio",
    "width",
    "height",
    "x",
    "y",
    "x1",
    "y1",
    "x2",
    "y2",
    "cx",
    "cy",
    "r",
    "rx",
    "ry",
    "fx",
    "fy",
    "dx",
    "dy",
    "d",
    "points",
    "pathLength",
    "transform",
    "fill",
    "fill-opacity",
    "fill-rule",
    "stroke",
    "stroke-width",
    "stroke-opacity",
    "stroke-linecap",
    "stroke-linejoin",
    "stroke-dasharray",
    "stroke-dashoffset",
    "opacity",
    "visibility",
    "display",
    "font-family",
    "font-size",
    "font-style",
    "font-weight",
    "letter-spacing",
    "text-anchor",
    "dominant-baseline",
    "textLength",
    "lengthAdjust",
    "rotate",
    "offset",
    "stop-color",
    "stop-opacity",
    "gradientUnits",
    "gradientTransform",
    "spreadMethod",
    "patternUnits",
    "patternTransform",
    "clipPathUnits",
    "maskUnits",
    "clip-path",
    "clip-rule",
    "mask",
    "marker-start",
    "marker-mid",
    "marker-end",
    "markerWidth",
    "markerHeight",
    "markerUnits",
    "refX",
    "refY",
    "orient",
    "href",
    "xlink:href",
];

/// What the sanitizer removed. Logged, never shown to the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SanitizeReport {
    pub removed_elements: usize,
    pub removed_attributes: usize,
    pub removed_other: usize,
    /// The scan stopped early on malformed or truncated input.
    pub truncated: bool,
}

impl SanitizeReport {
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SanitizedSvg {
    pub markup: String,
    pub report: SanitizeReport,
}

fn is_allowed_element(name: &str) -> bool {
    ALLOWED_ELEMENTS.contains(&name)
}

fn is_hostile_value(value: &str) -> bool {
    let lowered: String =
        value.chars().filter(|ch| !ch.is_whitespace()).flat_map(char::to_lowercase).collect();
    lowered.contains("javascript:")
        || lowered.contains("vbscript:")
        || lowered.contains("expression(")
}

fn is_allowed_attribute(name: &str, value: &str) -> bool {
    if name.len() > 2 && name[..2].eq_ignore_ascii_case("on") {
        return false;
    }
    if !ALLOWED_ATTRIBUTES.contains(&name) {
        return false;
    }
    if (name == "href" || name == "xlink:href") && !value.trim_start().starts_with('#') {
        return false;
    }
    !is_hostile_value(value)
}

struct Writer {
    out: String,
    open: Vec<String>,
    report: SanitizeReport,
}

impl Writer {
    fn start_tag(&mut self, start: &BytesStart<'_>, name: &str, self_closing: bool) {
        self.out.push('<');
        self.out.push_str(name);

        for attr in start.attributes() {
            let Ok(attr) = attr else {
                self.report.removed_attributes += 1;
                continue;
            };
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let Ok(value) = attr.unescape_value() else {
                self.report.removed_attributes += 1;
                continue;
            };
            if !is_allowed_attribute(&key, &value) {
                tracing::debug!(element = name, attribute = %key, "dropping svg attribute");
                self.report.removed_attributes += 1;
                continue;
            }
            self.out.push(' ');
            self.out.push_str(&key);
            self.out.push_str("=\"");
            self.out.push_str(&escape(value.as_ref()));
            self.out.push('"');
        }

        if self_closing {
            self.out.push_str("/>");
        } else {
            self.out.push('>');
            self.open.push(name.to_owned());
        }
    }

    fn end_tag(&mut self) {
        if let Some(name) = self.open.pop() {
            self.out.push_str("</");
            self.out.push_str(&name);
            self.out.push('>');
        }
    }

    fn text(&mut self, text: &str) {
        if !self.open.is_empty() {
            self.out.push_str(&escape(text));
        }
    }

    fn finish(mut self) -> SanitizedSvg {
        while !self.open.is_empty() {
            self.end_tag();
        }
        SanitizedSvg { markup: self.out, report: self.report }
    }
}

/// Sanitizes one SVG document.
pub fn sanitize_svg(markup: &str) -> SanitizedSvg {
    let mut reader = Reader::from_str(markup);
    let mut writer =
        Writer { out: String::new(), open: Vec::new(), report: SanitizeReport::default() };
    let mut seen_root = false;
    // Depth inside a dropped subtree; 0 when emitting.
    let mut skip_depth = 0usize;

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(err) => {
                tracing::debug!(error = %err, "svg scan stopped on malformed input");
                writer.report.truncated = true;
                break;
            }
        };

        match event {
            Event::Eof => {
                if !writer.open.is_empty() {
                    writer.report.truncated = true;
                }
                break;
            }
            Event::Start(_) if skip_depth > 0 => skip_depth += 1,
            Event::End(_) if skip_depth > 0 => skip_depth -= 1,
            _ if skip_depth > 0 => {}
            Event::Start(start) => {
                let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                if !seen_root {
                    if name != "svg" {
                        return SanitizedSvg::default();
                    }
                    seen_root = true;
                } else if writer.open.is_empty() {
                    // Content after the root element closed.
                    break;
                }

                if is_allowed_element(&name) {
                    writer.start_tag(&start, &name, false);
                } else {
                    tracing::debug!(element = %name, "dropping svg subtree");
                    writer.report.removed_elements += 1;
                    skip_depth = 1;
                }
            }
            Event::Empty(start) => {
                let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                if !seen_root {
                    if name != "svg" {
                        return SanitizedSvg::default();
                    }
                    seen_root = true;
                    writer.start_tag(&start, &name, true);
                    break;
                }
                if writer.open.is_empty() {
                    break;
                }

                if is_allowed_element(&name) {
                    writer.start_tag(&start, &name, true);
                } else {
                    tracing::debug!(element = %name, "dropping svg element");
                    writer.report.removed_elements += 1;
                }
            }
            Event::End(_) => {
                writer.end_tag();
                if writer.open.is_empty() {
                    break;
                }
            }
            Event::Text(text) => match text.unescape() {
                Ok(text) => writer.text(&text),
                Err(_) => writer.report.removed_other += 1,
            },
            Event::CData(cdata) => {
                let text = String::from_utf8_lossy(&cdata).into_owned();
                writer.text(&text);
            }
            Event::Decl(_) => {}
            _ => {
                if seen_root {
                    writer.report.removed_other += 1;
                }
            }
        }
    }

    if !seen_root {
        return SanitizedSvg::default();
    }

    let sanitized = writer.finish();
    if !sanitized.report.is_clean() {
        tracing::debug!(report = ?sanitized.report, "sanitized svg");
    }
    sanitized
}
