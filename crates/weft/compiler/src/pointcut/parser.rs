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

//! Recursive-descent parser for pointcut expressions
//!
//! Binding names are resolved while parsing: an `args(..)` or `this(..)`
//! element that names one of the bindings requested by the advice becomes a
//! capture, anything else is a type pattern. Captures are rejected under `not`
//! and `or` so the result of matching never depends on evaluation order.

use super::ast::{Pointcut, ThisPattern};
use super::compiler::NamedPointcuts;
use super::error::{PointcutResult, PointcutSyntaxError, SyntaxErrorKind};
use super::lexer::PointcutLexer;
use super::pattern::{ArgElement, ArgsPattern, FieldPattern, ModifierPattern, NamePattern, SignaturePattern, TypeElement, TypePattern};
use super::token::{Token, TokenKind};
use std::collections::BTreeSet;
use weft_common::Modifiers;

/// Everything the parser resolves names against
#[derive(Clone, Copy)]
pub struct ParseContext<'a> {
    /// Binding names requested by the advice
    pub bindings: &'a [String],
    /// Named pointcuts that `name()` may refer to
    pub named: &'a NamedPointcuts,
}

/// Pointcut parser over one expression text
pub struct PointcutParser<'a> {
    tokens: Vec<Token>,
    current: usize,
    context: ParseContext<'a>,
    /// Named pointcuts currently being expanded, outermost first
    expanding: Vec<String>,
    bound: BTreeSet<String>,
}

impl<'a> PointcutParser<'a> {
    pub fn new(input: &str, context: ParseContext<'a>) -> PointcutResult<Self> {
        Self::expanding(input, context, Vec::new())
    }

    fn expanding(input: &str, context: ParseContext<'a>, expanding: Vec<String>) -> PointcutResult<Self> {
        let tokens = PointcutLexer::new(input).tokenize()?;
        Ok(Self {
            tokens,
            current: 0,
            context,
            expanding,
            bound: BTreeSet::new(),
        })
    }

    /// Parse the whole expression
    pub fn parse(mut self) -> PointcutResult<Pointcut> {
        if self.peek().is_eof() {
            let token = self.peek().clone();
            return Err(self.error_at(&token, SyntaxErrorKind::EmptyExpression, "pointcut expression is empty"));
        }
        let root = self.parse_or()?;
        let trailing = self.peek().clone();
        if !trailing.is_eof() {
            return Err(self.error_at(&trailing, SyntaxErrorKind::UnexpectedToken, "expected '&&', '||' or end of expression"));
        }
        if self.expanding.is_empty() {
            if let Some(missing) = self.context.bindings.iter().find(|b| !self.bound.contains(*b)) {
                return Err(self.error_at(&trailing, SyntaxErrorKind::UnboundBinding, format!("`{}` is requested but never captured", missing)));
            }
        }
        Ok(root)
    }

    /// Parse the whole input as a single type pattern
    pub fn parse_type(mut self) -> PointcutResult<TypePattern> {
        if self.peek().is_eof() {
            let token = self.peek().clone();
            return Err(self.error_at(&token, SyntaxErrorKind::EmptyExpression, "type pattern is empty"));
        }
        let pattern = self.parse_type_pattern()?;
        let trailing = self.peek().clone();
        if !trailing.is_eof() {
            return Err(self.error_at(&trailing, SyntaxErrorKind::UnexpectedToken, "expected end of type pattern"));
        }
        Ok(pattern)
    }

    // Token helpers

    fn peek(&self) -> &Token {
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    fn peek_kind_at(&self, ahead: usize) -> &TokenKind {
        let idx = (self.current + ahead).min(self.tokens.len() - 1);
        &self.tokens[idx].kind
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if !token.is_eof() {
            self.current += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.peek().kind == kind
    }

    fn error_at(&self, token: &Token, kind: SyntaxErrorKind, message: impl Into<String>) -> PointcutSyntaxError {
        let kind = if token.is_eof() && kind == SyntaxErrorKind::UnexpectedToken {
            SyntaxErrorKind::UnexpectedEnd
        } else {
            kind
        };
        PointcutSyntaxError::new(kind, token.display_text(), token.position, message)
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> PointcutResult<Token> {
        if self.check(&kind) {
            Ok(self.advance())
        } else {
            let token = self.peek().clone();
            Err(self.error_at(&token, SyntaxErrorKind::UnexpectedToken, format!("expected {}", what)))
        }
    }

    fn at_or(&self) -> bool {
        self.check(&TokenKind::OrOr) || self.peek().is_word("or")
    }

    fn at_and(&self) -> bool {
        self.check(&TokenKind::AndAnd) || self.peek().is_word("and")
    }

    fn at_not(&self) -> bool {
        self.check(&TokenKind::Bang) || self.peek().is_word("not")
    }

    // Combinators

    fn parse_or(&mut self) -> PointcutResult<Pointcut> {
        let mut left = self.parse_and()?;
        while self.at_or() {
            let op = self.advance();
            let right = self.parse_and()?;
            if !left.binding_names().is_empty() || !right.binding_names().is_empty() {
                return Err(self.error_at(&op, SyntaxErrorKind::BindingNotAllowed, "captures are not allowed under '||'"));
            }
            left = Pointcut::or(left, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> PointcutResult<Pointcut> {
        let mut left = self.parse_unary()?;
        while self.at_and() {
            self.advance();
            let right = self.parse_unary()?;
            left = Pointcut::and(left, right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> PointcutResult<Pointcut> {
        if self.at_not() {
            let op = self.advance();
            let inner = self.parse_unary()?;
            if !inner.binding_names().is_empty() {
                return Err(self.error_at(&op, SyntaxErrorKind::BindingNotAllowed, "captures are not allowed under negation"));
            }
            return Ok(Pointcut::not(inner));
        }
        if self.check(&TokenKind::LeftParen) {
            self.advance();
            let inner = self.parse_or()?;
            self.expect(TokenKind::RightParen, "')'")?;
            return Ok(inner);
        }
        self.parse_designator()
    }

    // Designators

    fn parse_designator(&mut self) -> PointcutResult<Pointcut> {
        let token = self.peek().clone();
        let Some(word) = token.as_word().map(str::to_string) else {
            return Err(self.error_at(&token, SyntaxErrorKind::UnexpectedToken, "expected a pointcut designator"));
        };
        if self.peek_kind_at(1) != &TokenKind::LeftParen {
            return Err(self.error_at(&token, SyntaxErrorKind::UnexpectedToken, "expected '(' after designator name"));
        }
        self.advance();
        self.advance();

        let pointcut = match word.as_str() {
            "execution" => Pointcut::Execution(self.parse_signature()?),
            "within" => Pointcut::Within(self.parse_type_pattern()?),
            "get" => Pointcut::Get(self.parse_field()?),
            "set" => Pointcut::Set(self.parse_field()?),
            "handler" => Pointcut::Handler(self.parse_type_pattern()?),
            "annotatedWith" => {
                if self.check(&TokenKind::At) {
                    self.advance();
                }
                Pointcut::AnnotatedWith(self.parse_type_pattern()?)
            }
            "argsCount" => {
                let token = self.advance();
                match token.kind {
                    TokenKind::Number(n) => Pointcut::ArgsCount(n as usize),
                    _ => return Err(self.error_at(&token, SyntaxErrorKind::UnexpectedToken, "expected an argument count")),
                }
            }
            "argsType" => Pointcut::ArgsType(self.parse_args(false)?),
            "args" => Pointcut::Args(self.parse_args(true)?),
            "this" => Pointcut::This(self.parse_this()?),
            _ if self.check(&TokenKind::RightParen) => {
                self.advance();
                return self.expand_named(&word, &token);
            }
            _ => {
                return Err(self.error_at(&token, SyntaxErrorKind::UnknownDesignator, format!("unknown designator `{}`", word)));
            }
        };

        self.expect(TokenKind::RightParen, "')'")?;
        Ok(pointcut)
    }

    fn expand_named(&mut self, name: &str, token: &Token) -> PointcutResult<Pointcut> {
        if self.expanding.iter().any(|n| n == name) {
            return Err(self.error_at(token, SyntaxErrorKind::CyclicReference, format!("`{}` refers to itself", name)));
        }
        let Some(text) = self.context.named.get(name) else {
            return Err(self.error_at(token, SyntaxErrorKind::UnknownReference, format!("no named pointcut `{}`", name)));
        };

        let mut expanding = self.expanding.clone();
        expanding.push(name.to_string());
        let child = PointcutParser::expanding(text, self.context, expanding).map_err(|e| e.within_named(name))?;
        let tree = child.parse().map_err(|e| e.within_named(name))?;

        for binding in tree.binding_names() {
            if !self.bound.insert(binding.clone()) {
                return Err(self.error_at(token, SyntaxErrorKind::DuplicateBinding, format!("`{}` is captured twice", binding)));
            }
        }
        Ok(tree)
    }

    // Patterns

    /// Dotted pattern made of segments and `..`
    fn parse_type_pattern(&mut self) -> PointcutResult<TypePattern> {
        let mut elements = Vec::new();
        elements.push(TypeElement::Segment(self.parse_segment()?));

        loop {
            match self.peek().kind {
                TokenKind::Dot => {
                    self.advance();
                    elements.push(TypeElement::Segment(self.parse_segment()?));
                }
                TokenKind::DotDot => {
                    let dots = self.advance();
                    if !matches!(self.peek().kind, TokenKind::Word(_)) {
                        return Err(self.error_at(&dots, SyntaxErrorKind::MisplacedWildcard, "'..' must be followed by a name segment"));
                    }
                    elements.push(TypeElement::AnyDepth);
                    elements.push(TypeElement::Segment(self.parse_segment()?));
                }
                _ => break,
            }
        }
        Ok(TypePattern::new(elements))
    }

    fn parse_segment(&mut self) -> PointcutResult<NamePattern> {
        let token = self.peek().clone();
        match &token.kind {
            TokenKind::Word(word) => {
                self.advance();
                Ok(NamePattern::new(word.clone()))
            }
            TokenKind::DotDot => Err(self.error_at(&token, SyntaxErrorKind::MisplacedWildcard, "'..' must follow a name segment")),
            _ => Err(self.error_at(&token, SyntaxErrorKind::UnexpectedToken, "expected a name pattern")),
        }
    }

    fn parse_modifiers(&mut self) -> ModifierPattern {
        let mut pattern = ModifierPattern::default();
        loop {
            if let Some(m) = self.peek().as_word().and_then(Modifiers::from_keyword) {
                self.advance();
                pattern.required = pattern.required | m;
                continue;
            }
            if self.check(&TokenKind::Bang) {
                if let TokenKind::Word(word) = self.peek_kind_at(1) {
                    if let Some(m) = Modifiers::from_keyword(word) {
                        self.advance();
                        self.advance();
                        pattern.forbidden = pattern.forbidden | m;
                        continue;
                    }
                }
            }
            return pattern;
        }
    }

    /// Split `a.b.Name` into the declaring-type pattern and the member name
    fn split_qualified(&self, qualified: TypePattern, at: &Token) -> PointcutResult<(Option<TypePattern>, NamePattern)> {
        let mut elements = qualified.elements().to_vec();
        let Some(TypeElement::Segment(name)) = elements.pop() else {
            return Err(self.error_at(at, SyntaxErrorKind::UnexpectedToken, "expected a member name"));
        };
        match elements.last() {
            None => Ok((None, name)),
            Some(TypeElement::AnyDepth) => Err(self.error_at(
                at,
                SyntaxErrorKind::MisplacedWildcard,
                "'..' must be followed by a type segment before the member name",
            )),
            Some(TypeElement::Segment(_)) => Ok((Some(TypePattern::new(elements)), name)),
        }
    }

    fn parse_signature(&mut self) -> PointcutResult<SignaturePattern> {
        let modifiers = self.parse_modifiers();
        let start = self.peek().clone();
        let first = self.parse_type_pattern()?;
        let (return_type, qualified, at) = if matches!(self.peek().kind, TokenKind::Word(_)) {
            let at = self.peek().clone();
            (Some(first), self.parse_type_pattern()?, at)
        } else {
            (None, first, start)
        };
        let (declaring_type, name) = self.split_qualified(qualified, &at)?;

        self.expect(TokenKind::LeftParen, "'(' before the parameter list")?;
        let params = self.parse_arg_elements(false)?;
        self.expect(TokenKind::RightParen, "')' after the parameter list")?;

        Ok(SignaturePattern {
            modifiers,
            return_type,
            declaring_type,
            name,
            params,
        })
    }

    fn parse_field(&mut self) -> PointcutResult<FieldPattern> {
        let modifiers = self.parse_modifiers();
        let start = self.peek().clone();
        let first = self.parse_type_pattern()?;
        let (field_type, qualified, at) = if matches!(self.peek().kind, TokenKind::Word(_)) {
            let at = self.peek().clone();
            (Some(first), self.parse_type_pattern()?, at)
        } else {
            (None, first, start)
        };
        let (declaring_type, name) = self.split_qualified(qualified, &at)?;
        Ok(FieldPattern {
            modifiers,
            field_type,
            declaring_type,
            name,
        })
    }

    /// Argument list between the designator's own parentheses
    fn parse_args(&mut self, allow_bindings: bool) -> PointcutResult<ArgsPattern> {
        self.parse_arg_elements(allow_bindings)
    }

    fn parse_arg_elements(&mut self, allow_bindings: bool) -> PointcutResult<ArgsPattern> {
        let mut elements = Vec::new();
        if self.check(&TokenKind::RightParen) {
            return Ok(ArgsPattern::new(elements));
        }
        loop {
            if self.check(&TokenKind::DotDot) {
                self.advance();
                elements.push(ArgElement::AnyArgs);
            } else {
                let token = self.peek().clone();
                let pattern = self.parse_type_pattern()?;
                match pattern.as_simple_identifier().filter(|name| allow_bindings && self.is_requested(name)) {
                    Some(name) => {
                        let name = name.to_string();
                        self.bind(&name, &token)?;
                        elements.push(ArgElement::Bind(name));
                    }
                    None => elements.push(ArgElement::Type(pattern)),
                }
            }
            if self.check(&TokenKind::Comma) {
                self.advance();
            } else {
                return Ok(ArgsPattern::new(elements));
            }
        }
    }

    fn parse_this(&mut self) -> PointcutResult<ThisPattern> {
        let token = self.peek().clone();
        let pattern = self.parse_type_pattern()?;
        match pattern.as_simple_identifier().filter(|name| self.is_requested(name)) {
            Some(name) => {
                let name = name.to_string();
                self.bind(&name, &token)?;
                Ok(ThisPattern::Bind(name))
            }
            None => Ok(ThisPattern::Type(pattern)),
        }
    }

    fn is_requested(&self, name: &str) -> bool {
        self.context.bindings.iter().any(|b| b == name)
    }

    fn bind(&mut self, name: &str, token: &Token) -> PointcutResult<()> {
        if self.bound.insert(name.to_string()) {
            Ok(())
        } else {
            Err(self.error_at(token, SyntaxErrorKind::DuplicateBinding, format!("`{}` is captured twice", name)))
        }
    }
}
