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

//! Weft Compiler Library
//!
//! Turns a declarative weave configuration into constructed aspects: the
//! pointcut language (lexer, parser, matcher and a caching pattern compiler),
//! the configuration model, and advice ranking.

pub mod aspect;
pub mod config;
pub mod pointcut;

pub use aspect::{Advice, AdviceKey, AdviceKind, Aspect, AspectSet, Construction, Rank};
pub use config::{AdviceDecl, AspectDecl, ConfigError, ConfigResult, NamedPointcutDecl, WeaveConfig};
pub use pointcut::{BindingSource, Bindings, CompiledPointcut, MatchResult, NamedPointcuts, PatternCompiler, PointcutSyntaxError, TypePattern};
