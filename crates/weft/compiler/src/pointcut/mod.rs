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

//! Pointcut language
//!
//! Text is lexed into [`Token`]s, parsed into a [`Pointcut`] tree by
//! [`PointcutParser`], and evaluated against join points by [`evaluate`].
//! [`PatternCompiler`] puts a cache in front of the parser.

pub mod ast;
pub mod compiler;
pub mod error;
pub mod lexer;
pub mod matcher;
pub mod parser;
pub mod pattern;
pub mod position;
pub mod token;

pub use ast::{CompiledPointcut, Pointcut, ThisPattern};
pub use compiler::{CacheStats, NamedPointcuts, PatternCompiler};
pub use error::{PointcutResult, PointcutSyntaxError, SyntaxErrorKind};
pub use lexer::PointcutLexer;
pub use matcher::{BindingSource, Bindings, MatchResult, evaluate, evaluate_node};
pub use parser::{ParseContext, PointcutParser};
pub use pattern::{ArgElement, ArgsPattern, FieldPattern, ModifierPattern, NamePattern, SignaturePattern, TypeElement, TypePattern};
pub use position::{Position, PositionTracker};
pub use token::{Token, TokenKind};
