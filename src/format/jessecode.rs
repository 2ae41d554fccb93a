// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Stepmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! JesseCode: the scripting subset understood by the interactive board.
//!
//! ```text
//! A = point(1, 2) <<name: 'A', size: 3>>;
//! B = point(4, -1);
//! segment(A, B);
//! circle(A, 2);
//! polygon(A, B, [4, 3]);
//! text(0.5, 8, "y = x^2");
//! f = functiongraph(map (x) -> x^2 - 3, -2, 5);
//! g = functiongraph(function(x){ return Math.sin(x); });
//! ```
//!
//! Statements end with `;` (optional before a newline). Point arguments are either a previously
//! assigned point or a coordinate pair `[x, y]`; numbers are constant expressions. `//` starts a
//! line comment. Element coordinates are resolved at parse time.

use std::collections::BTreeMap;
use std::fmt;

use super::expr::{parse_expr, Expr, ExprError};

#[derive(Debug, Clone, PartialEq)]
pub enum JesseCodeError {
    UnexpectedEnd {
        line_no: usize,
    },
    Expected {
        line_no: usize,
        expected: &'static str,
        found: String,
    },
    UnterminatedString {
        line_no: usize,
    },
    UnknownElementType {
        line_no: usize,
        name: String,
    },
    UndefinedReference {
        line_no: usize,
        name: String,
    },
    WrongArgumentCount {
        line_no: usize,
        element: &'static str,
        expected: &'static str,
        found: usize,
    },
    InvalidArgument {
        line_no: usize,
        element: &'static str,
        argument: String,
    },
    InvalidAttribute {
        line_no: usize,
        attribute: String,
    },
    Expr {
        line_no: usize,
        source: ExprError,
    },
}

impl fmt::Display for JesseCodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEnd { line_no } => {
                write!(f, "unexpected end of script on line {line_no}")
            }
            Self::Expected { line_no, expected, found } => {
                write!(f, "expected {expected} on line {line_no}, found '{found}'")
            }
            Self::UnterminatedString { line_no } => {
                write!(f, "unterminated string on line {line_no}")
            }
            Self::UnknownElementType { line_no, name } => {
                write!(f, "unknown element type '{name}' on line {line_no}")
            }
            Self::UndefinedReference { line_no, name } => {
                write!(f, "'{name}' is not defined (line {line_no})")
            }
            Self::WrongArgumentCount { line_no, element, expected, found } => write!(
                f,
                "{element} on line {line_no} takes {expected} argument(s), got {found}"
            ),
            Self::InvalidArgument { line_no, element, argument } => {
                write!(f, "invalid {element} argument on line {line_no}: {argument}")
            }
            Self::InvalidAttribute { line_no, attribute } => {
                write!(f, "invalid attribute on line {line_no}: {attribute}")
            }
            Self::Expr { line_no, source } => write!(f, "{source} (line {line_no})"),
        }
    }
}

impl std::error::Error for JesseCodeError {}

pub type Coords = [f64; 2];

#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind {
    Point { at: Coords },
    Segment { from: Coords, to: Coords },
    Line { through: Coords, to: Coords },
    Circle { center: Coords, radius: f64 },
    Polygon { vertices: Vec<Coords> },
    Text { at: Coords, text: String },
    FunctionGraph { expr: Expr, domain: Option<(f64, f64)> },
}

impl ElementKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Point { .. } => "point",
            Self::Segment { .. } => "segment",
            Self::Line { .. } => "line",
            Self::Circle { .. } => "circle",
            Self::Polygon { .. } => "polygon",
            Self::Text { .. } => "text",
            Self::FunctionGraph { .. } => "functiongraph",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoardElement {
    pub kind: ElementKind,
    /// Display name: the `name` attribute, else the assigned variable.
    pub label: Option<String>,
    pub visible: bool,
    pub line_no: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct JesseScript {
    pub elements: Vec<BoardElement>,
}

impl JesseScript {
    pub fn points(&self) -> impl Iterator<Item = (&BoardElement, Coords)> {
        self.elements.iter().filter_map(|element| match element.kind {
            ElementKind::Point { at } => Some((element, at)),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
enum AttrValue {
    Str(String),
    Number(f64),
    Bool(bool),
}

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn line_no(&self) -> usize {
        self.src[..self.pos].bytes().filter(|b| *b == b'\n').count() + 1
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn skip_trivia(&mut self) {
        loop {
            let rest = self.rest();
            let trimmed = rest.trim_start();
            self.pos += rest.len() - trimmed.len();
            if self.rest().starts_with("//") {
                let skip = self.rest().find('\n').unwrap_or(self.rest().len());
                self.pos += skip;
                continue;
            }
            return;
        }
    }

    fn eat(&mut self, literal: &str) -> bool {
        self.skip_trivia();
        if self.rest().starts_with(literal) {
            self.pos += literal.len();
            true
        } else {
            false
        }
    }

    fn ident(&mut self) -> Option<&'a str> {
        self.skip_trivia();
        let rest = self.rest();
        let len = rest
            .char_indices()
            .find(|(idx, ch)| {
                !(ch.is_ascii_alphanumeric() || *ch == '_' || *ch == '$')
                    || (*idx == 0 && ch.is_ascii_digit())
            })
            .map(|(idx, _)| idx)
            .unwrap_or(rest.len());
        if len == 0 {
            return None;
        }
        self.pos += len;
        Some(&rest[..len])
    }

    fn found(&self) -> String {
        match self.peek() {
            Some(ch) => ch.to_string(),
            None => "end of script".to_owned(),
        }
    }

    /// Captures text up to (not including) the first top-level char in `stops`.
    fn capture_until(&mut self, stops: &[char]) -> Result<&'a str, JesseCodeError> {
        let line_no = self.line_no();
        let start = self.pos;
        let mut depth = 0usize;
        let mut quote: Option<char> = None;

        for (offset, ch) in self.rest().char_indices() {
            if let Some(open) = quote {
                if ch == open {
                    quote = None;
                }
                continue;
            }
            match ch {
                '"' | '\'' => quote = Some(ch),
                '(' | '[' | '{' => depth += 1,
                ')' | ']' | '}' if depth > 0 => depth -= 1,
                _ if depth == 0 && stops.contains(&ch) => {
                    self.pos = start + offset;
                    return Ok(&self.src[start..self.pos]);
                }
                _ => {}
            }
        }

        if quote.is_some() {
            return Err(JesseCodeError::UnterminatedString { line_no });
        }
        Err(JesseCodeError::UnexpectedEnd { line_no: self.line_no() })
    }
}

fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0usize;

    for (idx, ch) in text.char_indices() {
        if let Some(open) = quote {
            if ch == open {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => quote = Some(ch),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(text[start..idx].trim());
                start = idx + 1;
            }
            _ => {}
        }
    }

    let last = text[start..].trim();
    if !last.is_empty() || !parts.is_empty() {
        parts.push(last);
    }
    parts
}

fn unquote(text: &str) -> Option<&str> {
    let text = text.trim();
    let first = text.chars().next()?;
    if !matches!(first, '"' | '\'') || text.len() < 2 || !text.ends_with(first) {
        return None;
    }
    Some(&text[1..text.len() - 1])
}

struct ScriptParser<'a> {
    cursor: Cursor<'a>,
    points: BTreeMap<String, Coords>,
    script: JesseScript,
}

impl<'a> ScriptParser<'a> {
    fn number(&self, text: &str, line_no: usize) -> Result<f64, JesseCodeError> {
        if self.points.contains_key(text.trim()) {
            return Err(JesseCodeError::Expected {
                line_no,
                expected: "a number",
                found: text.trim().to_owned(),
            });
        }
        let expr =
            parse_expr(text, &[]).map_err(|source| JesseCodeError::Expr { line_no, source })?;
        Ok(expr.eval(&[]))
    }

    fn coords(
        &self,
        text: &str,
        element: &'static str,
        line_no: usize,
    ) -> Result<Coords, JesseCodeError> {
        let text = text.trim();
        if let Some(inner) = text.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
            let parts = split_top_level(inner);
            if parts.len() != 2 {
                return Err(JesseCodeError::InvalidArgument {
                    line_no,
                    element,
                    argument: text.to_owned(),
                });
            }
            return Ok([self.number(parts[0], line_no)?, self.number(parts[1], line_no)?]);
        }

        let is_ident = !text.is_empty()
            && text.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '$')
            && !text.starts_with(|ch: char| ch.is_ascii_digit());
        if is_ident {
            return self
                .points
                .get(text)
                .copied()
                .ok_or_else(|| JesseCodeError::UndefinedReference {
                    line_no,
                    name: text.to_owned(),
                });
        }

        Err(JesseCodeError::InvalidArgument { line_no, element, argument: text.to_owned() })
    }

    fn function(&self, text: &str, line_no: usize) -> Result<Expr, JesseCodeError> {
        let text = text.trim();
        let invalid = || JesseCodeError::InvalidArgument {
            line_no,
            element: "functiongraph",
            argument: text.to_owned(),
        };

        let (param, body) = if let Some(rest) = text.strip_prefix("map") {
            let rest = rest.trim_start().strip_prefix('(').ok_or_else(invalid)?;
            let (param, rest) = rest.split_once(')').ok_or_else(invalid)?;
            let body = rest.trim_start().strip_prefix("->").ok_or_else(invalid)?;
            (param.trim(), body.trim())
        } else if let Some(rest) = text.strip_prefix("function") {
            let rest = rest.trim_start().strip_prefix('(').ok_or_else(invalid)?;
            let (param, rest) = rest.split_once(')').ok_or_else(invalid)?;
            let body = rest.trim().strip_prefix('{').and_then(|b| b.strip_suffix('}'));
            let body = body.ok_or_else(invalid)?.trim();
            let body = body.strip_prefix("return").ok_or_else(invalid)?;
            (param.trim(), body.trim().trim_end_matches(';').trim())
        } else {
            return Err(invalid());
        };

        if param.is_empty() || param.contains(',') {
            return Err(invalid());
        }
        parse_expr(body, &[param]).map_err(|source| JesseCodeError::Expr { line_no, source })
    }

    fn build(
        &self,
        element_type: &str,
        args: &[&str],
        line_no: usize,
    ) -> Result<ElementKind, JesseCodeError> {
        let count = |element: &'static str, expected: &'static str| {
            JesseCodeError::WrongArgumentCount { line_no, element, expected, found: args.len() }
        };

        match element_type {
            "point" => match args {
                [x, y] => Ok(ElementKind::Point {
                    at: [self.number(x, line_no)?, self.number(y, line_no)?],
                }),
                [pair] => Ok(ElementKind::Point { at: self.coords(pair, "point", line_no)? }),
                _ => Err(count("point", "1 or 2")),
            },
            "segment" => match args {
                [a, b] => Ok(ElementKind::Segment {
                    from: self.coords(a, "segment", line_no)?,
                    to: self.coords(b, "segment", line_no)?,
                }),
                _ => Err(count("segment", "2")),
            },
            "line" => match args {
                [a, b] => Ok(ElementKind::Line {
                    through: self.coords(a, "line", line_no)?,
                    to: self.coords(b, "line", line_no)?,
                }),
                _ => Err(count("line", "2")),
            },
            "circle" => match args {
                [center, other] => {
                    let center = self.coords(center, "circle", line_no)?;
                    let other = other.trim();
                    let radius = if other.starts_with('[') || self.points.contains_key(other) {
                        let through = self.coords(other, "circle", line_no)?;
                        (through[0] - center[0]).hypot(through[1] - center[1])
                    } else {
                        self.number(other, line_no)?
                    };
                    if !radius.is_finite() || radius < 0.0 {
                        return Err(JesseCodeError::InvalidArgument {
                            line_no,
                            element: "circle",
                            argument: other.to_owned(),
                        });
                    }
                    Ok(ElementKind::Circle { center, radius })
                }
                _ => Err(count("circle", "2")),
            },
            "polygon" => {
                if args.len() < 3 {
                    return Err(count("polygon", "at least 3"));
                }
                let vertices = args
                    .iter()
                    .map(|arg| self.coords(arg, "polygon", line_no))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(ElementKind::Polygon { vertices })
            }
            "text" => match args {
                [x, y, text] => {
                    let text = unquote(text).ok_or_else(|| JesseCodeError::InvalidArgument {
                        line_no,
                        element: "text",
                        argument: (*text).to_owned(),
                    })?;
                    Ok(ElementKind::Text {
                        at: [self.number(x, line_no)?, self.number(y, line_no)?],
                        text: text.to_owned(),
                    })
                }
                _ => Err(count("text", "3")),
            },
            "functiongraph" => match args {
                [f] => Ok(ElementKind::FunctionGraph {
                    expr: self.function(f, line_no)?,
                    domain: None,
                }),
                [f, a, b] => Ok(ElementKind::FunctionGraph {
                    expr: self.function(f, line_no)?,
                    domain: Some((self.number(a, line_no)?, self.number(b, line_no)?)),
                }),
                _ => Err(count("functiongraph", "1 or 3")),
            },
            other => Err(JesseCodeError::UnknownElementType { line_no, name: other.to_owned() }),
        }
    }

    fn attributes(
        &mut self,
        line_no: usize,
    ) -> Result<BTreeMap<String, AttrValue>, JesseCodeError> {
        let mut attrs = BTreeMap::new();
        let start = self.cursor.pos;
        let Some(len) = self.cursor.rest().find(">>") else {
            return Err(JesseCodeError::UnexpectedEnd { line_no: self.cursor.line_no() });
        };
        self.cursor.pos = start + len + 2;

        for entry in split_top_level(&self.cursor.src[start..start + len]) {
            if entry.is_empty() {
                continue;
            }
            let Some((key, value)) = entry.split_once(':') else {
                return Err(JesseCodeError::InvalidAttribute {
                    line_no,
                    attribute: entry.to_owned(),
                });
            };
            let value = value.trim();
            let value = if let Some(text) = unquote(value) {
                AttrValue::Str(text.to_owned())
            } else if value == "true" || value == "false" {
                AttrValue::Bool(value == "true")
            } else if let Ok(number) = value.parse::<f64>() {
                AttrValue::Number(number)
            } else {
                // Colors and other bare words are kept as text.
                AttrValue::Str(value.to_owned())
            };
            attrs.insert(key.trim().to_owned(), value);
        }
        Ok(attrs)
    }

    fn statement(&mut self) -> Result<(), JesseCodeError> {
        let line_no = self.cursor.line_no();
        let Some(first) = self.cursor.ident() else {
            return Err(JesseCodeError::Expected {
                line_no,
                expected: "a statement",
                found: self.cursor.found(),
            });
        };

        let checkpoint = self.cursor.pos;
        let assigned = self.cursor.eat("=") && !self.cursor.rest().starts_with('=');
        let (variable, element_type) = if assigned {
            let Some(element_type) = self.cursor.ident() else {
                return Err(JesseCodeError::Expected {
                    line_no,
                    expected: "an element type",
                    found: self.cursor.found(),
                });
            };
            (Some(first), element_type)
        } else {
            self.cursor.pos = checkpoint;
            (None, first)
        };

        if !self.cursor.eat("(") {
            return Err(JesseCodeError::Expected {
                line_no,
                expected: "'('",
                found: self.cursor.found(),
            });
        }
        let raw_args = self.cursor.capture_until(&[')'])?;
        self.cursor.pos += 1;
        let args = split_top_level(raw_args);
        let kind = self.build(element_type, &args, line_no)?;

        let attrs = if self.cursor.eat("<<") { self.attributes(line_no)? } else { BTreeMap::new() };
        self.cursor.eat(";");

        let label = match attrs.get("name") {
            Some(AttrValue::Str(name)) => Some(name.clone()),
            _ => variable.map(str::to_owned),
        };
        let visible = !matches!(attrs.get("visible"), Some(AttrValue::Bool(false)));

        if let (Some(variable), ElementKind::Point { at }) = (variable, &kind) {
            self.points.insert(variable.to_owned(), *at);
        }
        self.script.elements.push(BoardElement { kind, label, visible, line_no });
        Ok(())
    }
}

/// Parses a JesseCode script into resolved board elements.
pub fn parse_jessecode(src: &str) -> Result<JesseScript, JesseCodeError> {
    let mut parser = ScriptParser {
        cursor: Cursor { src, pos: 0 },
        points: BTreeMap::new(),
        script: JesseScript::default(),
    };

    loop {
        parser.cursor.skip_trivia();
        if parser.cursor.at_end() {
            break;
        }
        if parser.cursor.eat(";") {
            continue;
        }
        parser.statement()?;
    }

    Ok(parser.script)
}

#[cfg(test)]
mod tests {
    use super::{parse_jessecode, ElementKind, JesseCodeError};

    #[test]
    fn parses_points_and_references() {
        let script = parse_jessecode(
            "// triangle\nA = point(1, 2);\nB = point(4, -1) <<name: 'Bee'>>;\nsegment(A, B);\npolygon(A, B, [4, 3]);\n",
        )
        .expect("parse");

        assert_eq!(script.elements.len(), 4);
        assert_eq!(script.elements[0].label.as_deref(), Some("A"));
        assert_eq!(script.elements[1].label.as_deref(), Some("Bee"));
        assert_eq!(
            script.elements[2].kind,
            ElementKind::Segment { from: [1.0, 2.0], to: [4.0, -1.0] }
        );
        assert_eq!(script.elements[3].line_no, 5);
    }

    #[test]
    fn circle_accepts_radius_or_point() {
        let source = "C = point(0, 0); P = point(3, 4); circle(C, 2); circle(C, P);";
        let script = parse_jessecode(source).expect("parse");
        assert_eq!(
            script.elements[2].kind,
            ElementKind::Circle { center: [0.0, 0.0], radius: 2.0 }
        );
        assert_eq!(
            script.elements[3].kind,
            ElementKind::Circle { center: [0.0, 0.0], radius: 5.0 }
        );
    }

    #[test]
    fn functiongraph_accepts_map_and_function_forms() {
        let script = parse_jessecode(
            "f = functiongraph(map (x) -> x^2 - 3, -2, 5);\ng = functiongraph(function(t){ return Math.sin(t); });",
        )
        .expect("parse");

        let ElementKind::FunctionGraph { expr, domain } = &script.elements[0].kind else {
            panic!("expected function graph");
        };
        assert_eq!(*domain, Some((-2.0, 5.0)));
        assert!((expr.eval(&[2.0]) - 1.0).abs() < 1e-12);

        let ElementKind::FunctionGraph { expr, domain } = &script.elements[1].kind else {
            panic!("expected function graph");
        };
        assert_eq!(*domain, None);
        assert!(expr.eval(&[0.0]).abs() < 1e-12);
    }

    #[test]
    fn text_and_hidden_elements() {
        let script = parse_jessecode("text(1, 2, \"hi, there\"); point(0, 0) <<visible: false>>;")
            .expect("parse");
        assert_eq!(
            script.elements[0].kind,
            ElementKind::Text { at: [1.0, 2.0], text: "hi, there".to_owned() }
        );
        assert!(!script.elements[1].visible);
    }

    #[test]
    fn numbers_may_be_constant_expressions() {
        let script = parse_jessecode("point(2 * pi, sqrt(4));").expect("parse");
        let ElementKind::Point { at } = script.elements[0].kind else {
            panic!("expected point");
        };
        assert!((at[0] - std::f64::consts::TAU).abs() < 1e-12);
        assert_eq!(at[1], 2.0);
    }

    #[test]
    fn reports_undefined_reference_with_line() {
        let err = parse_jessecode("A = point(0, 0);\nsegment(A, Z);").unwrap_err();
        assert_eq!(err, JesseCodeError::UndefinedReference { line_no: 2, name: "Z".to_owned() });
        assert_eq!(err.to_string(), "'Z' is not defined (line 2)");
    }

    #[test]
    fn reports_unknown_element_type() {
        let err = parse_jessecode("slider(1, 2, 3);").unwrap_err();
        assert!(matches!(err, JesseCodeError::UnknownElementType { .. }));
    }

    #[test]
    fn reports_truncated_script() {
        let err = parse_jessecode("A = point(1, ").unwrap_err();
        assert!(matches!(err, JesseCodeError::UnexpectedEnd { .. }));
    }

    #[test]
    fn empty_script_is_an_empty_board() {
        let script = parse_jessecode("  // nothing here\n").expect("parse");
        assert!(script.elements.is_empty());
    }
}
