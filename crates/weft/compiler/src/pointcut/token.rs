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

//! Token definitions for the pointcut language

use super::position::Position;
use std::fmt;

/// A token of a pointcut expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// The source text that produced this token
    pub lexeme: String,
    /// Where the token starts
    pub position: Position,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, position: Position) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            position,
        }
    }

    /// The word text if this token is a word
    pub fn as_word(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Word(w) => Some(w),
            _ => None,
        }
    }

    /// Check for a specific word
    pub fn is_word(&self, word: &str) -> bool {
        self.as_word() == Some(word)
    }

    pub fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }

    /// Text shown in error messages
    pub fn display_text(&self) -> &str {
        if self.is_eof() { "<end of input>" } else { &self.lexeme }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}'", self.kind, self.display_text())
    }
}

/// Types of tokens
///
/// Identifiers and `*` wildcards lex into a single [`TokenKind::Word`] so
/// that name fragments like `get*` or `*Service` stay one token. A trailing
/// `[]` array suffix is part of the word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Word(String),
    Number(u64),
    /// `.`
    Dot,
    /// `..`
    DotDot,
    LeftParen,
    RightParen,
    Comma,
    /// `@`
    At,
    /// `!`
    Bang,
    /// `&&`
    AndAnd,
    /// `||`
    OrOr,
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Word(_) => "word",
            Self::Number(_) => "number",
            Self::Dot => "'.'",
            Self::DotDot => "'..'",
            Self::LeftParen => "'('",
            Self::RightParen => "')'",
            Self::Comma => "','",
            Self::At => "'@'",
            Self::Bang => "'!'",
            Self::AndAnd => "'&&'",
            Self::OrOr => "'||'",
            Self::Eof => "end of input",
        };
        f.write_str(name)
    }
}
