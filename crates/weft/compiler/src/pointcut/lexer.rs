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

//! Pointcut lexical analyzer

use super::error::{PointcutResult, PointcutSyntaxError, SyntaxErrorKind};
use super::position::{Position, PositionTracker};
use super::token::{Token, TokenKind};

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$' || c == '*'
}

/// Pointcut lexer
pub struct PointcutLexer<'a> {
    tracker: PositionTracker<'a>,
}

impl<'a> PointcutLexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            tracker: PositionTracker::new(input),
        }
    }

    /// Tokenize the entire input; the last token is always [`TokenKind::Eof`]
    pub fn tokenize(mut self) -> PointcutResult<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let is_eof = token.is_eof();
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }

    fn next_token(&mut self) -> PointcutResult<Token> {
        self.tracker.skip_whitespace();
        let start = self.tracker.position();

        let Some(ch) = self.tracker.next_char() else {
            return Ok(Token::new(TokenKind::Eof, "", start));
        };

        match ch {
            '(' => Ok(Token::new(TokenKind::LeftParen, "(", start)),
            ')' => Ok(Token::new(TokenKind::RightParen, ")", start)),
            ',' => Ok(Token::new(TokenKind::Comma, ",", start)),
            '@' => Ok(Token::new(TokenKind::At, "@", start)),
            '!' => Ok(Token::new(TokenKind::Bang, "!", start)),
            '.' => {
                if self.tracker.peek() == Some('.') {
                    self.tracker.next_char();
                    Ok(Token::new(TokenKind::DotDot, "..", start))
                } else {
                    Ok(Token::new(TokenKind::Dot, ".", start))
                }
            }
            '&' => self.scan_double('&', TokenKind::AndAnd, start),
            '|' => self.scan_double('|', TokenKind::OrOr, start),
            c if is_word_char(c) => self.scan_word(start),
            other => Err(PointcutSyntaxError::new(
                SyntaxErrorKind::InvalidCharacter,
                other.to_string(),
                start,
                format!("unexpected character '{}'", other),
            )),
        }
    }

    fn scan_double(&mut self, ch: char, kind: TokenKind, start: Position) -> PointcutResult<Token> {
        if self.tracker.peek() == Some(ch) {
            self.tracker.next_char();
            Ok(Token::new(kind, self.tracker.slice_from(start), start))
        } else {
            Err(PointcutSyntaxError::new(
                SyntaxErrorKind::InvalidCharacter,
                ch.to_string(),
                start,
                format!("expected '{}{}'", ch, ch),
            ))
        }
    }

    fn scan_word(&mut self, start: Position) -> PointcutResult<Token> {
        while matches!(self.tracker.peek(), Some(c) if is_word_char(c)) {
            self.tracker.next_char();
        }
        while self.tracker.peek() == Some('[') && self.tracker.peek_second() == Some(']') {
            self.tracker.next_char();
            self.tracker.next_char();
        }

        let text = self.tracker.slice_from(start);
        if text.starts_with(|c: char| c.is_ascii_digit()) {
            return match text.parse::<u64>() {
                Ok(n) => Ok(Token::new(TokenKind::Number(n), text, start)),
                Err(_) => Err(PointcutSyntaxError::new(
                    SyntaxErrorKind::InvalidNumber,
                    text,
                    start,
                    "names may not start with a digit",
                )),
            };
        }
        Ok(Token::new(TokenKind::Word(text.to_string()), text, start))
    }
}
