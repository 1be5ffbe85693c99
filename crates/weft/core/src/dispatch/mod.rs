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

//! Advice dispatcher
//!
//! Executes the advice chain of a woven join point. Every advice is one link
//! of an onion: a link runs its pre-proceed logic, hands control to the next
//! link, and runs its post-proceed logic when that returns. The innermost
//! link is the original body. An outer link's pre-proceed logic therefore
//! always runs before an inner one's, and its post-proceed logic after.

pub mod advice;

pub use advice::{ActiveAspects, AdviceFn, AdviceRegistry, Unresolved};

use crate::exec::Instance;
use crate::weaver::ShadowAdvice;
use weft_common::{Failure, JoinPoint, Outcome, Value};
use weft_compiler::{AdviceKey, BindingSource, Bindings};

/// Failure kind raised when a woven unit refers to advice the session cannot execute
pub const UNRESOLVED_ADVICE: &str = "weft.UnresolvedAdvice";

/// A captured value seen by an advice body
#[derive(Debug, Clone, Copy)]
pub enum Bound<'a> {
    Value(&'a Value),
    Receiver(&'a Instance),
}

impl<'a> Bound<'a> {
    pub fn as_value(&self) -> Option<&'a Value> {
        match self {
            Self::Value(v) => Some(v),
            Self::Receiver(_) => None,
        }
    }

    pub fn as_receiver(&self) -> Option<&'a Instance> {
        match self {
            Self::Receiver(r) => Some(r),
            Self::Value(_) => None,
        }
    }
}

/// What an advice body sees of the join point it runs at
pub struct JoinPointContext<'a> {
    join_point: &'a JoinPoint,
    advice: &'a AdviceKey,
    args: &'a [Value],
    receiver: Option<&'a Instance>,
    bindings: &'a Bindings,
}

impl<'a> JoinPointContext<'a> {
    pub fn join_point(&self) -> &'a JoinPoint {
        self.join_point
    }

    /// The advice being executed
    pub fn advice(&self) -> &'a AdviceKey {
        self.advice
    }

    /// Arguments as they reach this link
    pub fn args(&self) -> &'a [Value] {
        self.args
    }

    pub fn arg(&self, idx: usize) -> Option<&'a Value> {
        self.args.get(idx)
    }

    pub fn receiver(&self) -> Option<&'a Instance> {
        self.receiver
    }

    /// Value captured under `name` by the advice's pointcut
    pub fn binding(&self, name: &str) -> Option<Bound<'a>> {
        match self.bindings.get(name)? {
            BindingSource::Receiver => self.receiver.map(Bound::Receiver),
            BindingSource::Argument(idx) => self.args.get(*idx).map(Bound::Value),
        }
    }
}

struct ChainLink<'a> {
    advice: &'a ShadowAdvice,
    body: &'a AdviceFn,
}

struct ChainEnv<'a> {
    join_point: &'a JoinPoint,
    receiver: Option<&'a Instance>,
    terminal: &'a dyn Fn(&[Value]) -> Outcome,
}

/// Capability handed to around advice to run the rest of the chain
///
/// May be invoked any number of times, including zero.
pub struct Proceed<'a> {
    rest: &'a [ChainLink<'a>],
    args: &'a [Value],
    env: &'a ChainEnv<'a>,
}

impl Proceed<'_> {
    /// Run the inner links and the original body with the current arguments
    pub fn proceed(&self) -> Outcome {
        run_links(self.rest, self.args, self.env)
    }

    /// Run the inner links and the original body with replaced arguments
    pub fn proceed_with(&self, args: Vec<Value>) -> Outcome {
        run_links(self.rest, &args, self.env)
    }

    pub fn args(&self) -> &[Value] {
        self.args
    }
}

/// Run the chain of `advice` around `terminal`
///
/// `advice` must already be in rank order.
pub fn dispatch(
    advice: &[ShadowAdvice],
    active: &ActiveAspects,
    join_point: &JoinPoint,
    receiver: Option<&Instance>,
    args: &[Value],
    terminal: &dyn Fn(&[Value]) -> Outcome,
) -> Outcome {
    let mut links = Vec::with_capacity(advice.len());
    for a in advice {
        let body = active
            .body(&a.key)
            .ok_or_else(|| Failure::new(UNRESOLVED_ADVICE, format!("advice `{}` at {} has no body in this session", a.key, join_point)))?;
        links.push(ChainLink { advice: a, body });
    }
    let env = ChainEnv {
        join_point,
        receiver,
        terminal,
    };
    run_links(&links, args, &env)
}

fn run_links(links: &[ChainLink<'_>], args: &[Value], env: &ChainEnv<'_>) -> Outcome {
    let Some((link, rest)) = links.split_first() else {
        return (env.terminal)(args);
    };
    let ctx = JoinPointContext {
        join_point: env.join_point,
        advice: &link.advice.key,
        args,
        receiver: env.receiver,
        bindings: &link.advice.bindings,
    };

    match link.body {
        AdviceFn::Before(f) => {
            f(&ctx)?;
            run_links(rest, args, env)
        }
        AdviceFn::AfterReturning(f) => {
            let outcome = run_links(rest, args, env);
            if let Ok(value) = &outcome {
                f(&ctx, value)?;
            }
            outcome
        }
        AdviceFn::AfterThrowing(f) => match run_links(rest, args, env) {
            Err(failure) => f(&ctx, &failure).unwrap_or(Err(failure)),
            ok => ok,
        },
        AdviceFn::After(f) => {
            let outcome = run_links(rest, args, env);
            f(&ctx, &outcome)?;
            outcome
        }
        AdviceFn::Around(f) => {
            let proceed = Proceed { rest, args, env };
            f(&ctx, &proceed)
        }
    }
}
