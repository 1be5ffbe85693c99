// Weft
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Pointcut compilation errors

use super::position::Position;
use std::fmt;
use thiserror::Error;

/// Result type for pointcut compilation
pub type PointcutResult<T> = Result<T, PointcutSyntaxError>;

/// Malformed pointcut expression text
///
/// Carries the offending token and its position so configuration authors
/// can find the mistake.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct PointcutSyntaxError {
    pub kind: SyntaxErrorKind,
    /// Offending token text (`<end of input>` at the end)
    pub token: String,
    pub position: Position,
    pub message: String,
    /// Named pointcut chain the error was found in, innermost last
    pub context: Vec<String>,
}

impl PointcutSyntaxError {
    pub fn new(kind: SyntaxErrorKind, token: impl Into<String>, position: Position, message: impl Into<String>) -> Self {
        Self {
            kind,
            token: token.into(),
            position,
            message: message.into(),
            context: Vec::new(),
        }
    }

    /// Record that the error occurred inside a named pointcut
    pub fn within_named(mut self, name: impl Into<String>) -> Self {
        self.context.insert(0, name.into());
        self
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        let mut msg = format!(
            "{} at column {} near '{}': {}",
            self.kind.description(),
            self.position.column,
            self.token,
            self.message
        );
        if !self.context.is_empty() {
            msg.push_str(&format!(" (in named pointcut {})", self.context.join(" -> ")));
        }
        msg
    }
}

impl fmt::Display for PointcutSyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.user_message())
    }
}

/// Categories of syntax errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxErrorKind {
    InvalidCharacter,
    UnexpectedToken,
    UnexpectedEnd,
    EmptyExpression,
    /// `..` outside a segment separator or argument slot
    MisplacedWildcard,
    UnknownDesignator,
    UnknownReference,
    CyclicReference,
    /// A binding under `not` or `or`
    BindingNotAllowed,
    DuplicateBinding,
    /// A binding the advice requests that no designator captures
    UnboundBinding,
    InvalidNumber,
}

impl SyntaxErrorKind {
    pub fn description(&self) -> &'static str {
        match self {
            Self::InvalidCharacter => "Invalid character",
            Self::UnexpectedToken => "Unexpected token",
            Self::UnexpectedEnd => "Unexpected end of expression",
            Self::EmptyExpression => "Empty expression",
            Self::MisplacedWildcard => "Misplaced wildcard",
            Self::UnknownDesignator => "Unknown designator",
            Self::UnknownReference => "Unknown pointcut reference",
            Self::CyclicReference => "Cyclic pointcut reference",
            Self::BindingNotAllowed => "Binding not allowed here",
            Self::DuplicateBinding => "Duplicate binding",
            Self::UnboundBinding => "Unbound binding",
            Self::InvalidNumber => "Invalid number",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_mentions_column_and_token() {
        let err = PointcutSyntaxError::new(SyntaxErrorKind::UnexpectedToken, ")", Position::new(1, 12, 11), "expected a type pattern");
        let msg = err.user_message();
        assert!(msg.contains("column 12"));
        assert!(msg.contains("')'"));
    }

    #[test]
    fn test_named_context_chain() {
        let err = PointcutSyntaxError::new(SyntaxErrorKind::UnknownReference, "missing", Position::start(), "no such pointcut")
            .within_named("inner")
            .within_named("outer");
        assert_eq!(err.context, vec!["outer".to_string(), "inner".to_string()]);
        assert!(err.user_message().contains("outer -> inner"));
    }
}
