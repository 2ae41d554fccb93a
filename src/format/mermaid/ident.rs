// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Stepmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MermaidIdentError {
    Empty,
    ContainsWhitespace,
    InvalidChar { ch: char },
}

impl fmt::Display for MermaidIdentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("must not be empty"),
            Self::ContainsWhitespace => f.write_str("must not contain whitespace"),
            Self::InvalidChar { ch } => write!(f, "contains invalid character: '{ch}'"),
        }
    }
}

impl std::error::Error for MermaidIdentError {}

fn is_ident_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// Node ids are word characters only; `-` would be ambiguous with edge operators.
pub(super) fn validate_mermaid_ident(ident: &str) -> Result<(), MermaidIdentError> {
    if ident.is_empty() {
        return Err(MermaidIdentError::Empty);
    }
    if ident.chars().any(char::is_whitespace) {
        return Err(MermaidIdentError::ContainsWhitespace);
    }
    match ident.chars().find(|ch| !is_ident_char(*ch)) {
        Some(ch) => Err(MermaidIdentError::InvalidChar { ch }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::{validate_mermaid_ident, MermaidIdentError};

    #[test]
    fn accepts_word_characters() {
        assert_eq!(validate_mermaid_ident("step_2"), Ok(()));
        assert_eq!(validate_mermaid_ident("négatif"), Ok(()));
    }

    #[test]
    fn rejects_operators_and_spaces() {
        assert_eq!(validate_mermaid_ident("a-b"), Err(MermaidIdentError::InvalidChar { ch: '-' }));
        assert_eq!(validate_mermaid_ident("a b"), Err(MermaidIdentError::ContainsWhitespace));
        assert_eq!(validate_mermaid_ident(""), Err(MermaidIdentError::Empty));
    }
}
