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

//! Interpreter for unit bodies
//!
//! Executes the ops of a unit's members against an [`Instance`]. Woven join
//! points (`advised` ops) run their shadow's advice chain through the
//! dispatcher with the original ops as the innermost link.

pub mod instance;
pub mod natives;

pub use instance::Instance;
pub use natives::{NativeCall, NativeFn, NativeRegistry};

use crate::dispatch::{ActiveAspects, dispatch};
use crate::unit::{Member, Op, Operand, Unit};
use crate::weaver::Shadow;
use std::cell::Cell;
use std::sync::Arc;
use tracing::trace;
use weft_common::{Failure, JoinPointKind, Outcome, Value};

/// Failure kind for calls to members a unit does not declare
pub const NO_SUCH_METHOD: &str = "weft.NoSuchMethod";
/// Failure kind for `native` ops whose symbol is not registered
pub const UNKNOWN_NATIVE: &str = "weft.UnknownNative";
/// Failure kind for runaway self-invocation
pub const STACK_OVERFLOW: &str = "weft.StackOverflow";

const DEFAULT_MAX_DEPTH: usize = 256;

enum Flow {
    Continue,
    Return(Value),
}

struct Frame<'a> {
    instance: &'a Instance,
    args: Vec<Value>,
    last: Value,
    depth: usize,
}

impl Frame<'_> {
    fn operand(&self, operand: &Operand) -> Value {
        match operand {
            Operand::Arg(idx) => self.args.get(*idx).cloned().unwrap_or_default(),
            Operand::Const(value) => value.clone(),
            Operand::Last => self.last.clone(),
        }
    }
}

/// Executes units with a set of natives and active advice
#[derive(Debug, Clone)]
pub struct Machine {
    natives: Arc<NativeRegistry>,
    advice: Arc<ActiveAspects>,
    max_depth: usize,
}

impl Machine {
    pub fn new(natives: Arc<NativeRegistry>, advice: Arc<ActiveAspects>) -> Self {
        Self {
            natives,
            advice,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn natives(&self) -> &Arc<NativeRegistry> {
        &self.natives
    }

    pub fn advice(&self) -> &Arc<ActiveAspects> {
        &self.advice
    }

    /// Create an instance: field initials, then the constructor of matching arity
    pub fn instantiate(&self, unit: Arc<Unit>, args: Vec<Value>) -> Result<Instance, Failure> {
        let fields = unit.fields().map(|f| (f.name.clone(), f.initial.clone().unwrap_or_default())).collect();
        let instance = Instance::new(Arc::clone(&unit), fields);
        match unit.constructor(args.len()) {
            Some(ctor) => {
                self.execute_member(&instance, ctor, args, 0)?;
            }
            None if args.is_empty() => {}
            None => {
                return Err(Failure::new(NO_SUCH_METHOD, format!("{} has no constructor taking {} argument(s)", unit.name, args.len())));
            }
        }
        trace!(instance = ?instance, "instantiated");
        Ok(instance)
    }

    /// Invoke a method on an instance directly
    pub fn invoke(&self, instance: &Instance, method: &str, args: Vec<Value>) -> Outcome {
        self.invoke_at(instance, method, args, 0)
    }

    fn invoke_at(&self, instance: &Instance, method: &str, args: Vec<Value>, depth: usize) -> Outcome {
        let unit = Arc::clone(instance.unit());
        let member = unit
            .method(method, args.len())
            .ok_or_else(|| Failure::new(NO_SUCH_METHOD, format!("{} has no method {}/{}", unit.name, method, args.len())))?;
        self.execute_member(instance, member, args, depth)
    }

    fn execute_member(&self, instance: &Instance, member: &Member, args: Vec<Value>, depth: usize) -> Outcome {
        if depth >= self.max_depth {
            return Err(Failure::new(STACK_OVERFLOW, format!("call depth exceeded {} in {}", self.max_depth, member.signature())));
        }
        trace!(instance = ?instance, member = %member.signature(), "execute");
        let mut frame = Frame {
            instance,
            args,
            last: Value::Unit,
            depth,
        };
        match self.run_ops(&member.body, &mut frame)? {
            Flow::Return(value) => Ok(value),
            Flow::Continue => Ok(Value::Unit),
        }
    }

    fn run_ops(&self, ops: &[Op], frame: &mut Frame<'_>) -> Result<Flow, Failure> {
        let instance = frame.instance;
        for op in ops {
            match op {
                Op::Native { symbol } => {
                    let f = self
                        .natives
                        .get(symbol)
                        .ok_or_else(|| Failure::new(UNKNOWN_NATIVE, format!("no native registered as `{}`", symbol)))?;
                    let call = NativeCall {
                        instance,
                        args: &frame.args,
                        last: &frame.last,
                    };
                    frame.last = f(&call)?;
                }
                Op::GetField { field, .. } => frame.last = instance.field(field).unwrap_or_default(),
                Op::SetField { field, value, .. } => {
                    instance.set_field(field, frame.operand(value));
                    frame.last = Value::Unit;
                }
                Op::InvokeSelf { method, args } => {
                    let args = args.iter().map(|a| frame.operand(a)).collect();
                    frame.last = self.invoke_at(instance, method, args, frame.depth + 1)?;
                }
                Op::Return { value } => return Ok(Flow::Return(frame.operand(value))),
                Op::Throw { kind, message } => return Err(Failure::new(kind.clone(), message.clone())),
                Op::Try { body, handlers } => match self.run_ops(body, frame) {
                    Ok(Flow::Continue) => {}
                    Ok(flow @ Flow::Return(_)) => return Ok(flow),
                    Err(failure) => {
                        let Some(handler) = handlers.iter().find(|h| failure.is_a(h.exception.as_str())) else {
                            return Err(failure);
                        };
                        frame.last = Value::Str(failure.message);
                        if let flow @ Flow::Return(_) = self.run_ops(&handler.body, frame)? {
                            return Ok(flow);
                        }
                    }
                },
                Op::Advised { shadow, original } => {
                    if let flow @ Flow::Return(_) = self.run_advised(shadow, original, frame)? {
                        return Ok(flow);
                    }
                }
            }
        }
        Ok(Flow::Continue)
    }

    fn run_advised(&self, shadow: &Shadow, original: &[Op], frame: &mut Frame<'_>) -> Result<Flow, Failure> {
        let jp = &shadow.join_point;
        let instance = frame.instance;
        let receiver = jp.has_receiver().then_some(instance);
        let depth = frame.depth;

        match jp.kind {
            JoinPointKind::MethodExecution | JoinPointKind::ConstructorExecution => {
                let terminal = |args: &[Value]| -> Outcome {
                    let mut inner = Frame {
                        instance,
                        args: args.to_vec(),
                        last: Value::Unit,
                        depth,
                    };
                    match self.run_ops(original, &mut inner)? {
                        Flow::Return(value) => Ok(value),
                        Flow::Continue => Ok(Value::Unit),
                    }
                };
                let value = dispatch(&shadow.advice, &self.advice, jp, receiver, &frame.args, &terminal)?;
                Ok(Flow::Return(value))
            }
            JoinPointKind::FieldSet => {
                let value = match original {
                    [Op::SetField { value, .. }] => frame.operand(value),
                    _ => frame.last.clone(),
                };
                let terminal = |args: &[Value]| -> Outcome {
                    match original {
                        [Op::SetField { field, .. }] => instance.set_field(field, args.first().cloned().unwrap_or_default()),
                        _ => {
                            let mut inner = Frame {
                                instance,
                                args: frame.args.clone(),
                                last: frame.last.clone(),
                                depth,
                            };
                            self.run_ops(original, &mut inner)?;
                        }
                    }
                    Ok(Value::Unit)
                };
                dispatch(&shadow.advice, &self.advice, jp, receiver, &[value], &terminal)?;
                frame.last = Value::Unit;
                Ok(Flow::Continue)
            }
            JoinPointKind::FieldGet => {
                let terminal = |_: &[Value]| -> Outcome {
                    let mut inner = Frame {
                        instance,
                        args: frame.args.clone(),
                        last: frame.last.clone(),
                        depth,
                    };
                    self.run_ops(original, &mut inner)?;
                    Ok(inner.last)
                };
                let value = dispatch(&shadow.advice, &self.advice, jp, receiver, &[], &terminal)?;
                frame.last = value;
                Ok(Flow::Continue)
            }
            JoinPointKind::HandlerEntry => {
                // Set when the handler body itself returned from the member
                let returned = Cell::new(false);
                let caught = frame.last.clone();
                let terminal = |_: &[Value]| -> Outcome {
                    let mut inner = Frame {
                        instance,
                        args: frame.args.clone(),
                        last: frame.last.clone(),
                        depth,
                    };
                    returned.set(false);
                    match self.run_ops(original, &mut inner)? {
                        Flow::Return(value) => {
                            returned.set(true);
                            Ok(value)
                        }
                        Flow::Continue => Ok(inner.last),
                    }
                };
                let value = dispatch(&shadow.advice, &self.advice, jp, receiver, &[caught], &terminal)?;
                if returned.get() {
                    Ok(Flow::Return(value))
                } else {
                    frame.last = value;
                    Ok(Flow::Continue)
                }
            }
        }
    }
}
