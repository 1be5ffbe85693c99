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

//! Weaving and dispatch integration tests
//!
//! Weave units with configured aspects, execute them with the interpreter,
//! and check the observable advice behavior.

use parking_lot::Mutex;
use proptest::prelude::*;
use std::sync::Arc;
use std::thread;
use weft_common::{DiagnosticKind, Failure, TypeName, Value};
use weft_compiler::{AdviceDecl, AdviceKey, AdviceKind, AspectDecl, AspectSet, PatternCompiler, WeaveConfig};
use weft_core::{
    ActiveAspects, AdviceFn, AdviceRegistry, Handler, Machine, Member, NativeRegistry, Op, Operand, Unit, WeaveRegistry, WeaveStatus, WeavingEngine,
};

type Trace = Arc<Mutex<Vec<String>>>;

struct Fixture {
    trace: Trace,
    advice: AdviceRegistry,
    natives: Arc<NativeRegistry>,
}

impl Fixture {
    fn new() -> Self {
        let trace: Trace = Arc::default();
        let natives = Arc::new(NativeRegistry::new());
        let t = trace.clone();
        natives.register("trace.body", move |_| {
            t.lock().push("body".to_string());
            Ok(Value::Int(7))
        });
        natives.register("fail.io", |_| Err(Failure::new("IoError", "disk gone")));
        Self {
            trace,
            advice: AdviceRegistry::new(),
            natives,
        }
    }

    /// Register a before/after pair that appends `label` markers
    fn tracing_before(&self, symbol: &str, label: &str) {
        let (t, label) = (self.trace.clone(), label.to_string());
        self.advice.register(symbol, AdviceFn::before(move |_| {
            t.lock().push(label.clone());
            Ok(())
        }));
    }

    fn tracing_after(&self, symbol: &str, label: &str) {
        let (t, label) = (self.trace.clone(), label.to_string());
        self.advice.register(symbol, AdviceFn::after(move |_, _| {
            t.lock().push(label.clone());
            Ok(())
        }));
    }

    fn activate(&self, aspects: Vec<AspectDecl>) -> Arc<ActiveAspects> {
        let construction = AspectSet::construct(&WeaveConfig::with_aspects(aspects), &PatternCompiler::new());
        assert!(construction.diagnostics.is_empty(), "{:?}", construction.diagnostics);
        Arc::new(ActiveAspects::activate(construction.aspects, &self.advice))
    }

    fn machine(&self, active: &Arc<ActiveAspects>) -> Machine {
        Machine::new(Arc::clone(&self.natives), Arc::clone(active))
    }

    fn trace(&self) -> Vec<String> {
        self.trace.lock().clone()
    }
}

fn service() -> Unit {
    Unit::new("Service")
        .with_member(Member::method("run", vec![], TypeName::void(), vec![Op::native("trace.body"), Op::ret(Operand::Last)]))
        .with_member(Member::method("idle", vec![], TypeName::void(), vec![Op::native("trace.body")]))
}

fn logging() -> AspectDecl {
    AspectDecl::new("Logging").with_advice(AdviceDecl::new("enter", AdviceKind::Before, "execution(Service.run(..))", "log.enter"))
}

#[test]
fn test_logging_end_to_end() {
    let fx = Fixture::new();
    fx.tracing_before("log.enter", "enter");
    let active = fx.activate(vec![logging()]);

    let outcome = WeavingEngine::new().weave(&service(), &active).unwrap();
    assert!(outcome.changed);
    assert_eq!(outcome.applied.into_iter().collect::<Vec<_>>(), vec![AdviceKey::new("Logging", "enter")]);

    let machine = fx.machine(&active);
    let instance = machine.instantiate(Arc::new(outcome.unit), vec![]).unwrap();
    assert_eq!(machine.invoke(&instance, "run", vec![]), Ok(Value::Int(7)));
    assert_eq!(machine.invoke(&instance, "run", vec![]), Ok(Value::Int(7)));
    assert_eq!(fx.trace(), vec!["enter", "body", "enter", "body"]);
}

#[test]
fn test_unmatched_members_are_untouched() {
    let fx = Fixture::new();
    fx.tracing_before("log.enter", "enter");
    let active = fx.activate(vec![logging()]);

    let original = service();
    let woven = WeavingEngine::new().weave(&original, &active).unwrap().unit;
    assert_eq!(woven.members[1], original.members[1]);
    assert_ne!(woven.members[0], original.members[0]);

    let nothing = fx.activate(vec![AspectDecl::new("Other").with_advice(AdviceDecl::new("x", AdviceKind::Before, "execution(Nope.*(..))", "log.enter"))]);
    let outcome = WeavingEngine::new().weave(&original, &nothing).unwrap();
    assert!(!outcome.changed);
    assert_eq!(outcome.unit.to_bytes().unwrap(), original.to_bytes().unwrap());
}

#[test]
fn test_reweave_is_byte_identical() {
    let fx = Fixture::new();
    fx.tracing_before("log.enter", "enter");
    let active = fx.activate(vec![logging()]);
    let engine = WeavingEngine::new();

    let once = engine.weave(&service(), &active).unwrap().unit;
    let twice = engine.weave(&once, &active).unwrap();
    assert!(!twice.changed);
    assert_eq!(twice.unit.to_bytes().unwrap(), once.to_bytes().unwrap());

    let registry = WeaveRegistry::new();
    let first = registry.weave(Arc::new(service()), &active).unwrap();
    let second = registry.weave(Arc::clone(&first.unit), &active).unwrap();
    assert_eq!(first.status, WeaveStatus::Woven);
    assert_eq!(second.status, WeaveStatus::AlreadyWoven);
    assert_eq!(second.diagnostics[0].kind, DiagnosticKind::AlreadyWovenNotice);
    assert_eq!(second.unit.to_bytes().unwrap(), first.unit.to_bytes().unwrap());
    assert_eq!(registry.stats().weaves, 1);
}

#[test]
fn test_prewoven_unit_is_recognised_by_fresh_registry() {
    let fx = Fixture::new();
    fx.tracing_before("log.enter", "enter");
    let active = fx.activate(vec![logging()]);
    let woven = Arc::new(WeavingEngine::new().weave(&service(), &active).unwrap().unit);

    let registry = WeaveRegistry::new();
    let report = registry.weave(Arc::clone(&woven), &active).unwrap();
    assert_eq!(report.status, WeaveStatus::AlreadyWoven);
    assert!(Arc::ptr_eq(&report.unit, &woven));
    assert_eq!(registry.stats().weaves, 0);
}

#[test]
fn test_units_differing_only_in_constant_type_are_distinct() {
    let fx = Fixture::new();
    fx.tracing_before("log.enter", "enter");
    let active = fx.activate(vec![logging()]);
    let returning = |value: Value| Unit::new("Service").with_member(Member::method("run", vec![], TypeName::void(), vec![Op::ret(Operand::Const(value))]));
    let (zero, no) = (returning(Value::Int(0)), returning(Value::Bool(false)));
    assert_ne!(zero.origin_digest().unwrap(), no.origin_digest().unwrap());
    assert_ne!(zero.to_bytes().unwrap(), no.to_bytes().unwrap());

    let registry = WeaveRegistry::new();
    assert_eq!(registry.weave(Arc::new(zero), &active).unwrap().status, WeaveStatus::Woven);
    let second = registry.weave(Arc::new(no), &active).unwrap();
    assert_eq!(second.status, WeaveStatus::Woven);
    assert_eq!(registry.len(), 2);

    let machine = fx.machine(&active);
    let instance = machine.instantiate(second.unit, vec![]).unwrap();
    assert_eq!(machine.invoke(&instance, "run", vec![]), Ok(Value::Bool(false)));
}

#[test]
fn test_type_annotation_selects_every_member() {
    let fx = Fixture::new();
    fx.tracing_before("tx.begin", "begin");
    let aspect = AspectDecl::new("Tx").with_advice(AdviceDecl::new("begin", AdviceKind::Before, "annotatedWith(@tx.Transactional)", "tx.begin"));
    let active = fx.activate(vec![aspect]);

    let outcome = WeavingEngine::new().weave(&service().with_annotation("tx.Transactional"), &active).unwrap();
    assert!(outcome.changed);
    let machine = fx.machine(&active);
    let instance = machine.instantiate(Arc::new(outcome.unit), vec![]).unwrap();
    machine.invoke(&instance, "run", vec![]).unwrap();
    machine.invoke(&instance, "idle", vec![]).unwrap();
    assert_eq!(fx.trace(), vec!["begin", "body", "begin", "body"]);

    assert!(!WeavingEngine::new().weave(&service(), &active).unwrap().changed);
}

#[test]
fn test_disjoint_second_pass_merges_without_double_wrapping() {
    let fx = Fixture::new();
    fx.tracing_before("log.enter", "enter");
    fx.tracing_before("audit.enter", "audit");
    let audit = AspectDecl::new("Audit").with_advice(AdviceDecl::new("enter", AdviceKind::Before, "execution(* run(..))", "audit.enter").with_precedence(5));

    let first = fx.activate(vec![logging()]);
    let both = fx.activate(vec![logging(), audit]);
    let engine = WeavingEngine::new();

    let once = engine.weave(&service(), &first).unwrap().unit;
    let again = engine.weave(&once, &both).unwrap();
    assert_eq!(again.applied.into_iter().collect::<Vec<_>>(), vec![AdviceKey::new("Audit", "enter")]);

    let Op::Advised { shadow, original } = &again.unit.members[0].body[0] else {
        panic!("run should be advised");
    };
    assert_eq!(again.unit.members[0].body.len(), 1);
    assert!(original.iter().all(|op| !matches!(op, Op::Advised { .. })));
    let order: Vec<String> = shadow.keys().map(|k| k.to_string()).collect();
    assert_eq!(order, vec!["Audit.enter", "Logging.enter"]);

    let state = again.unit.weave_state.as_ref().unwrap();
    assert_eq!(state.origin, service().origin_digest().unwrap());
    assert_eq!(state.applied.len(), 2);

    let machine = fx.machine(&both);
    let instance = machine.instantiate(Arc::new(again.unit), vec![]).unwrap();
    machine.invoke(&instance, "run", vec![]).unwrap();
    assert_eq!(fx.trace(), vec!["audit", "enter", "body"]);
}

#[test]
fn test_precedence_nesting() {
    let fx = Fixture::new();
    fx.tracing_before("x.before", "X.before");
    fx.tracing_after("x.after", "X.after");
    fx.tracing_before("y.before", "Y.before");
    fx.tracing_after("y.after", "Y.after");
    let aspect = AspectDecl::new("Order")
        .with_advice(AdviceDecl::new("yb", AdviceKind::Before, "execution(* run(..))", "y.before").with_precedence(5))
        .with_advice(AdviceDecl::new("ya", AdviceKind::After, "execution(* run(..))", "y.after").with_precedence(5))
        .with_advice(AdviceDecl::new("xb", AdviceKind::Before, "execution(* run(..))", "x.before").with_precedence(10))
        .with_advice(AdviceDecl::new("xa", AdviceKind::After, "execution(* run(..))", "x.after").with_precedence(10));
    let active = fx.activate(vec![aspect]);

    let woven = WeavingEngine::new().weave(&service(), &active).unwrap().unit;
    let machine = fx.machine(&active);
    let instance = machine.instantiate(Arc::new(woven), vec![]).unwrap();
    machine.invoke(&instance, "run", vec![]).unwrap();
    assert_eq!(fx.trace(), vec!["X.before", "Y.before", "body", "Y.after", "X.after"]);
}

#[test]
fn test_equal_precedence_breaks_ties_by_aspect_order() {
    let fx = Fixture::new();
    fx.tracing_before("a", "first");
    fx.tracing_before("b", "second");
    let first = AspectDecl::new("First").with_advice(AdviceDecl::new("x", AdviceKind::Before, "execution(* run(..))", "a"));
    let second = AspectDecl::new("Second").with_advice(AdviceDecl::new("x", AdviceKind::Before, "execution(* run(..))", "b"));
    let active = fx.activate(vec![second, first]);

    let woven = WeavingEngine::new().weave(&service(), &active).unwrap().unit;
    let machine = fx.machine(&active);
    let instance = machine.instantiate(Arc::new(woven), vec![]).unwrap();
    machine.invoke(&instance, "run", vec![]).unwrap();
    assert_eq!(fx.trace(), vec!["second", "first", "body"]);
}

#[test]
fn test_around_without_proceed_suppresses_body_and_inner_advice() {
    let fx = Fixture::new();
    fx.tracing_before("inner", "inner");
    fx.advice.register("gate", AdviceFn::around(|_, _| Ok(Value::from("gated"))));
    let aspect = AspectDecl::new("Gate")
        .with_advice(AdviceDecl::new("gate", AdviceKind::Around, "execution(* run(..))", "gate").with_precedence(10))
        .with_advice(AdviceDecl::new("inner", AdviceKind::Before, "execution(* run(..))", "inner"));
    let active = fx.activate(vec![aspect]);

    let woven = WeavingEngine::new().weave(&service(), &active).unwrap().unit;
    let machine = fx.machine(&active);
    let instance = machine.instantiate(Arc::new(woven), vec![]).unwrap();
    assert_eq!(machine.invoke(&instance, "run", vec![]), Ok(Value::from("gated")));
    assert!(fx.trace().is_empty());
}

#[test]
fn test_exception_routing() {
    let fx = Fixture::new();
    let (t1, t2) = (fx.trace.clone(), fx.trace.clone());
    fx.advice.register("thrown", AdviceFn::after_throwing(move |_, failure| {
        t1.lock().push(format!("thrown:{}", failure.kind));
        None
    }));
    fx.advice.register("always", AdviceFn::after(move |_, _| {
        t2.lock().push("always".to_string());
        Ok(())
    }));
    fx.advice.register("recover", AdviceFn::around(|_, proceed| proceed.proceed().or_else(|_| Ok(Value::Int(-1)))));

    let unit = Unit::new("Store").with_member(Member::method("save", vec![], TypeName::void(), vec![Op::native("fail.io")]));
    let routing = AspectDecl::new("Routing")
        .with_advice(AdviceDecl::new("thrown", AdviceKind::AfterThrowing, "execution(* save())", "thrown"))
        .with_advice(AdviceDecl::new("always", AdviceKind::After, "execution(* save())", "always"));
    let active = fx.activate(vec![routing.clone()]);
    let woven = WeavingEngine::new().weave(&unit, &active).unwrap().unit;
    let machine = fx.machine(&active);
    let instance = machine.instantiate(Arc::new(woven), vec![]).unwrap();
    assert_eq!(machine.invoke(&instance, "save", vec![]), Err(Failure::new("IoError", "disk gone")));
    assert_eq!(fx.trace(), vec!["always", "thrown:IoError"]);

    fx.trace.lock().clear();
    let recovering = routing.with_advice(AdviceDecl::new("recover", AdviceKind::Around, "execution(* save())", "recover").with_precedence(100));
    let active = fx.activate(vec![recovering]);
    let woven = WeavingEngine::new().weave(&unit, &active).unwrap().unit;
    let machine = fx.machine(&active);
    let instance = machine.instantiate(Arc::new(woven), vec![]).unwrap();
    assert_eq!(machine.invoke(&instance, "save", vec![]), Ok(Value::Int(-1)));
    assert_eq!(fx.trace(), vec!["always", "thrown:IoError"]);
}

#[test]
fn test_unresolved_advice_is_fatal_for_the_unit_only() {
    let fx = Fixture::new();
    fx.tracing_before("log.enter", "enter");
    let aspect = logging().with_advice(AdviceDecl::new("missing", AdviceKind::After, "execution(* run(..))", "nowhere"));
    let active = fx.activate(vec![aspect]);

    let outcome = WeavingEngine::new().weave(&service(), &active).unwrap();
    assert_eq!(outcome.diagnostics.len(), 1);
    assert!(outcome.diagnostics[0].is_fatal());
    assert_eq!(outcome.diagnostics[0].kind, DiagnosticKind::UnresolvedAdviceReferenceError);
    assert!(outcome.applied.contains(&AdviceKey::new("Logging", "enter")));
    assert!(!outcome.considered.contains(&AdviceKey::new("Logging", "missing")));

    let registry = WeaveRegistry::new();
    let presented = Arc::new(service());
    let report = registry.weave(Arc::clone(&presented), &active).unwrap();
    assert_eq!(report.status, WeaveStatus::Rejected);
    assert!(Arc::ptr_eq(&report.unit, &presented));
    assert!(registry.is_empty());

    let elsewhere = Unit::new("Quiet").with_member(Member::method("stop", vec![], TypeName::void(), vec![]));
    let quiet = registry.weave(Arc::new(elsewhere), &active).unwrap();
    assert_eq!(quiet.status, WeaveStatus::Unchanged);
    assert!(quiet.diagnostics.is_empty());
}

#[test]
fn test_field_and_handler_join_points() {
    let fx = Fixture::new();
    fx.advice.register("double", AdviceFn::around(|ctx, proceed| {
        let v = ctx.arg(0).and_then(Value::as_int).unwrap_or_default();
        proceed.proceed_with(vec![Value::Int(v * 2)])
    }));
    fx.advice.register("hide", AdviceFn::around(|_, proceed| proceed.proceed().map(|v| Value::Int(v.as_int().unwrap_or_default() + 1))));
    let t = fx.trace.clone();
    fx.advice.register("caught", AdviceFn::before(move |ctx| {
        t.lock().push(format!("caught:{}", ctx.arg(0).and_then(Value::as_str).unwrap_or("?")));
        Ok(())
    }));

    let unit = Unit::new("Account")
        .with_member(Member::field("balance", TypeName::new("long"), Some(Value::Int(0))))
        .with_member(Member::method("deposit", vec![TypeName::new("long")], TypeName::void(), vec![Op::set_field("Account", "balance", Operand::Arg(0))]))
        .with_member(Member::method("read", vec![], TypeName::new("long"), vec![Op::get_field("Account", "balance"), Op::ret(Operand::Last)]))
        .with_member(Member::method(
            "flush",
            vec![],
            TypeName::new("String"),
            vec![Op::try_catch(
                vec![Op::native("fail.io")],
                vec![Handler {
                    exception: TypeName::new("IoError"),
                    body: vec![Op::ret(Operand::Const(Value::from("recovered")))],
                }],
            )],
        ));

    let aspect = AspectDecl::new("Fields")
        .with_advice(AdviceDecl::new("double", AdviceKind::Around, "set(long Account.balance)", "double"))
        .with_advice(AdviceDecl::new("hide", AdviceKind::Around, "get(Account.balance)", "hide"))
        .with_advice(AdviceDecl::new("caught", AdviceKind::Before, "handler(IoError)", "caught"));
    let active = fx.activate(vec![aspect]);
    let woven = WeavingEngine::new().weave(&unit, &active).unwrap().unit;

    let machine = fx.machine(&active);
    let account = machine.instantiate(Arc::new(woven), vec![]).unwrap();
    machine.invoke(&account, "deposit", vec![Value::Int(5)]).unwrap();
    assert_eq!(account.field("balance"), Some(Value::Int(10)));
    assert_eq!(machine.invoke(&account, "read", vec![]), Ok(Value::Int(11)));
    assert_eq!(machine.invoke(&account, "flush", vec![]), Ok(Value::from("recovered")));
    assert_eq!(fx.trace(), vec!["caught:disk gone"]);
}

#[test]
fn test_argument_and_receiver_bindings() {
    let fx = Fixture::new();
    let seen: Arc<Mutex<Vec<String>>> = Arc::default();
    let sink = seen.clone();
    fx.advice.register("capture", AdviceFn::before(move |ctx| {
        let amount = ctx.binding("amount").and_then(|b| b.as_value()).cloned().unwrap_or_default();
        let owner = ctx.binding("account").and_then(|b| b.as_receiver()).map(|r| r.type_name().to_string()).unwrap_or_default();
        sink.lock().push(format!("{}:{}", owner, amount));
        Ok(())
    }));
    let unit = Unit::new("Account").with_member(Member::method("pay", vec![TypeName::new("String"), TypeName::new("long")], TypeName::void(), vec![]));
    let aspect = AspectDecl::new("Audit")
        .with_advice(AdviceDecl::new("capture", AdviceKind::Before, "execution(* pay(..)) && args(.., amount) && this(account)", "capture").binding("amount").binding("account"));
    let active = fx.activate(vec![aspect]);
    let woven = WeavingEngine::new().weave(&unit, &active).unwrap().unit;

    let machine = fx.machine(&active);
    let instance = machine.instantiate(Arc::new(woven), vec![]).unwrap();
    machine.invoke(&instance, "pay", vec![Value::from("bob"), Value::Int(30)]).unwrap();
    assert_eq!(*seen.lock(), vec!["Account:30".to_string()]);
}

#[test]
fn test_self_invocation_runs_woven_body() {
    let fx = Fixture::new();
    fx.tracing_before("log.helper", "helper");
    let unit = Unit::new("Service")
        .with_member(Member::method("run", vec![], TypeName::void(), vec![Op::invoke_self("helper", vec![])]))
        .with_member(Member::method("helper", vec![], TypeName::void(), vec![Op::native("trace.body")]));
    let aspect = AspectDecl::new("Log").with_advice(AdviceDecl::new("helper", AdviceKind::Before, "execution(* helper())", "log.helper"));
    let active = fx.activate(vec![aspect]);
    let woven = WeavingEngine::new().weave(&unit, &active).unwrap().unit;

    let machine = fx.machine(&active);
    let instance = machine.instantiate(Arc::new(woven), vec![]).unwrap();
    machine.invoke(&instance, "run", vec![]).unwrap();
    assert_eq!(fx.trace(), vec!["helper", "body"]);
}

#[test]
fn test_malformed_unit_is_rejected() {
    let fx = Fixture::new();
    let active = fx.activate(vec![logging()]);
    let broken = Unit::new("Service").with_member(Member::method("run", vec![], TypeName::void(), vec![Op::get_field("Service", "ghost")]));
    let err = WeavingEngine::new().weave(&broken, &active).unwrap_err();
    assert_eq!(err.category(), "structure");
    assert!(WeaveRegistry::new().weave(Arc::new(broken), &active).is_err());
}

#[test]
fn test_registry_weaves_each_identity_once_under_contention() {
    let fx = Fixture::new();
    fx.tracing_before("log.enter", "enter");
    let active = fx.activate(vec![logging()]);
    let registry = Arc::new(WeaveRegistry::new());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let registry = Arc::clone(&registry);
            let active = Arc::clone(&active);
            thread::spawn(move || {
                let unit = if i % 2 == 0 { service() } else { Unit::new(format!("Other{}", i % 4)).with_member(Member::method("run", vec![], TypeName::void(), vec![])) };
                registry.weave(Arc::new(unit), &active).unwrap()
            })
        })
        .collect();
    let reports: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let service_bytes: Vec<Vec<u8>> = reports.iter().filter(|r| r.unit.name.as_str() == "Service").map(|r| r.unit.to_bytes().unwrap()).collect();
    assert_eq!(service_bytes.len(), 4);
    assert!(service_bytes.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(registry.stats().weaves, 3);
    assert_eq!(registry.len(), 3);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_before_advice_runs_in_precedence_order(precedences in prop::collection::vec(-20i32..20, 1..6)) {
        let fx = Fixture::new();
        let mut aspect = AspectDecl::new("Ranked");
        for (i, p) in precedences.iter().enumerate() {
            let symbol = format!("b{}", i);
            fx.tracing_before(&symbol, &format!("{}:{}", p, i));
            aspect = aspect.with_advice(AdviceDecl::new(format!("a{}", i), AdviceKind::Before, "execution(* run(..))", symbol).with_precedence(*p));
        }
        let active = fx.activate(vec![aspect]);
        let woven = WeavingEngine::new().weave(&service(), &active).unwrap().unit;
        let machine = fx.machine(&active);
        let instance = machine.instantiate(Arc::new(woven), vec![]).unwrap();
        machine.invoke(&instance, "run", vec![]).unwrap();

        let mut expected: Vec<(i32, usize)> = precedences.iter().copied().zip(0..).collect();
        expected.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        let mut want: Vec<String> = expected.iter().map(|(p, i)| format!("{}:{}", p, i)).collect();
        want.push("body".to_string());
        prop_assert_eq!(fx.trace(), want);
    }
}
