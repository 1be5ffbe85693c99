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

//! Stand-in advice bodies for offline weaving
//!
//! Weaving only records which advice applies where; the real bodies are
//! bound by the host when woven units run. The CLI therefore registers a
//! body of the declared kind for each symbol it is told exists, and each
//! body just traces the join point it runs at.

use tracing::info;
use weft_compiler::{AdviceKind, WeaveConfig};
use weft_core::{AdviceFn, AdviceRegistry};

/// Register a tracing body for every advice symbol in `config`
///
/// With `known` set, only symbols in that list are registered; the rest
/// stay unresolved.
pub fn tracing_bodies(config: &WeaveConfig, known: Option<&[String]>) -> AdviceRegistry {
    let registry = AdviceRegistry::new();
    for advice in config.aspects.iter().flat_map(|a| a.advice.iter()) {
        if known.is_some_and(|k| !k.contains(&advice.body)) {
            continue;
        }
        registry.register(advice.body.clone(), body_for(advice.kind));
    }
    registry
}

fn body_for(kind: AdviceKind) -> AdviceFn {
    match kind {
        AdviceKind::Before => AdviceFn::before(|ctx| {
            info!(advice = %ctx.advice(), join_point = %ctx.join_point(), "before");
            Ok(())
        }),
        AdviceKind::AfterReturning => AdviceFn::after_returning(|ctx, value| {
            info!(advice = %ctx.advice(), join_point = %ctx.join_point(), %value, "after returning");
            Ok(())
        }),
        AdviceKind::AfterThrowing => AdviceFn::after_throwing(|ctx, failure| {
            info!(advice = %ctx.advice(), join_point = %ctx.join_point(), %failure, "after throwing");
            None
        }),
        AdviceKind::After => AdviceFn::after(|ctx, _| {
            info!(advice = %ctx.advice(), join_point = %ctx.join_point(), "after");
            Ok(())
        }),
        AdviceKind::Around => AdviceFn::around(|ctx, proceed| {
            info!(advice = %ctx.advice(), join_point = %ctx.join_point(), "around");
            proceed.proceed()
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_compiler::{AdviceDecl, AspectDecl};

    #[test]
    fn test_known_symbols_limit_registration() {
        let config = WeaveConfig::with_aspects(vec![
            AspectDecl::new("A")
                .with_advice(AdviceDecl::new("x", AdviceKind::Before, "within(*)", "a.x"))
                .with_advice(AdviceDecl::new("y", AdviceKind::Around, "within(*)", "a.y")),
        ]);
        assert_eq!(tracing_bodies(&config, None).len(), 2);

        let known = vec!["a.y".to_string()];
        let registry = tracing_bodies(&config, Some(&known));
        assert!(!registry.contains("a.x"));
        assert_eq!(registry.get("a.y").map(|b| b.kind()), Some(AdviceKind::Around));
    }
}
