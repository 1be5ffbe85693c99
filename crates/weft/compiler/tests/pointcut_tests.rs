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

//! Pointcut language tests
//!
//! Table-driven checks of wildcard semantics and designators over a fixed set
//! of join points, plus property tests of matcher purity.

use proptest::prelude::*;
use weft_common::{JoinPoint, Modifiers, Signature, TypeName};
use weft_compiler::pointcut::{NamedPointcuts, PatternCompiler, SyntaxErrorKind, evaluate};

fn method(owner: &str, name: &str, params: &[&str], ret: &str) -> JoinPoint {
    let params = params.iter().map(|p| TypeName::new(*p)).collect();
    JoinPoint::method_execution(owner, Signature::new(name, params, TypeName::new(ret)), Modifiers::PUBLIC)
}

fn matches(text: &str, jp: &JoinPoint) -> bool {
    let compiled = PatternCompiler::new().compile(text, &[], &NamedPointcuts::new()).expect("pointcut should compile");
    evaluate(&compiled, jp).matched
}

#[test]
fn test_single_segment_wildcard() {
    let direct = method("com.example.Foo", "run", &[], "void");
    let nested = method("com.example.sub.Foo", "run", &[], "void");

    assert!(matches("within(com.example.*)", &direct));
    assert!(!matches("within(com.example.*)", &nested));
    assert!(matches("within(com.example..*)", &direct));
    assert!(matches("within(com.example..*)", &nested));
}

#[test]
fn test_wildcard_table() {
    let cases: &[(&str, &str, bool)] = &[
        ("execution(Service.run(..))", "Service", true),
        ("execution(Service.run(..))", "com.Service", false),
        ("execution(*.run(..))", "Service", true),
        ("execution(*.run(..))", "com.Service", false),
        ("execution(*..*.run(..))", "com.Service", true),
        ("execution(..Service.run(..))", "com.Service", false),
        ("execution(com..Service.run(..))", "com.a.b.Service", true),
        ("execution(com..Service.run(..))", "com.Service", true),
        ("execution(*Service.run(..))", "OrderService", true),
        ("execution(*Service.run(..))", "OrderServiceImpl", false),
        ("execution(* run(..))", "anything.at.All", true),
        ("execution(* r*(..))", "X", true),
        ("execution(* *n(..))", "X", true),
        ("execution(* *x*(..))", "X", false),
    ];
    for (text, owner, expected) in cases {
        let jp = method(owner, "run", &["int"], "void");
        if text.starts_with("execution(..") {
            let err = PatternCompiler::new().compile(text, &[], &NamedPointcuts::new()).unwrap_err();
            assert_eq!(err.kind, SyntaxErrorKind::MisplacedWildcard, "{}", text);
            continue;
        }
        assert_eq!(matches(text, &jp), *expected, "{} against {}", text, owner);
    }
}

#[test]
fn test_argument_patterns() {
    let jp = method("Svc", "put", &["String", "int", "long"], "void");
    let cases: &[(&str, bool)] = &[
        ("execution(* put(..))", true),
        ("execution(* put())", false),
        ("execution(* put(String, ..))", true),
        ("execution(* put(.., long))", true),
        ("execution(* put(.., int, ..))", true),
        ("execution(* put(.., short, ..))", false),
        ("execution(* put(*, *, *))", true),
        ("execution(* put(*, *))", false),
        ("argsType(String, int, long)", true),
        ("argsCount(3)", true),
    ];
    for (text, expected) in cases {
        assert_eq!(matches(text, &jp), *expected, "{}", text);
    }
}

#[test]
fn test_return_type_star_is_single_segment() {
    let jp = method("Svc", "load", &[], "com.example.Order");
    assert!(!matches("execution(* load())", &jp));
    assert!(matches("execution(com..* load())", &jp));
    assert!(matches("execution(com.example.Order load())", &jp));
}

#[test]
fn test_modifiers() {
    let public = method("Svc", "run", &[], "void");
    let private_static = public.clone().with_modifiers(Modifiers::PRIVATE | Modifiers::STATIC);
    assert!(matches("execution(public * run())", &public));
    assert!(!matches("execution(public * run())", &private_static));
    assert!(matches("execution(!public * run())", &private_static));
    assert!(!matches("execution(private !static * run())", &private_static));
}

#[test]
fn test_field_designators() {
    let read = JoinPoint::field_get("Account", "balance", TypeName::new("long"), "Account");
    let write = JoinPoint::field_set("Account", "balance", TypeName::new("long"), "Account");
    assert!(matches("get(Account.balance)", &read));
    assert!(!matches("get(Account.balance)", &write));
    assert!(matches("set(long Account.bal*)", &write));
    assert!(!matches("set(int Account.balance)", &write));
    assert!(!matches("execution(* balance(..))", &read));
}

#[test]
fn test_constructor_execution() {
    let ctor = JoinPoint::constructor_execution("com.Svc", vec![TypeName::new("int")], Modifiers::PUBLIC);
    assert!(matches("execution(com.Svc.new(int))", &ctor));
    assert!(matches("execution(com.*.new(..)) && within(com.*)", &ctor));
}

#[test]
fn test_syntax_errors_carry_position() {
    let cases: &[(&str, SyntaxErrorKind, usize)] = &[
        ("execution(Service.run(..)", SyntaxErrorKind::UnexpectedEnd, 26),
        ("within(a) &&", SyntaxErrorKind::UnexpectedEnd, 13),
        ("within(a) & within(b)", SyntaxErrorKind::InvalidCharacter, 11),
        ("within(com..)", SyntaxErrorKind::MisplacedWildcard, 11),
        ("nosuch(a)", SyntaxErrorKind::UnknownDesignator, 1),
        ("argsCount(x)", SyntaxErrorKind::UnexpectedToken, 11),
    ];
    for (text, kind, column) in cases {
        let err = PatternCompiler::new().compile(text, &[], &NamedPointcuts::new()).unwrap_err();
        assert_eq!(err.kind, *kind, "{}", text);
        assert_eq!(err.position.column, *column, "{}", text);
        assert!(err.user_message().contains(&format!("column {}", column)));
    }
}

fn segment() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,5}"
}

fn type_name() -> impl Strategy<Value = TypeName> {
    prop::collection::vec(segment(), 1..5).prop_map(|s| TypeName::new(s.join(".")))
}

proptest! {
    #[test]
    fn prop_matching_is_pure(owner in type_name(), name in segment(), params in prop::collection::vec(type_name(), 0..4)) {
        let jp = JoinPoint::method_execution(owner, Signature::new(name, params, TypeName::void()), Modifiers::PUBLIC);
        let compiler = PatternCompiler::new();
        let compiled = compiler.compile("within(a..*) || (execution(* *(.., *)) && !argsCount(2))", &[], &NamedPointcuts::new()).unwrap();
        let first = evaluate(&compiled, &jp);
        let second = evaluate(&compiled, &jp);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_any_depth_matches_every_descendant(prefix in segment(), rest in prop::collection::vec(segment(), 0..4), leaf in segment()) {
        let mut segments = vec![prefix.clone()];
        segments.extend(rest);
        segments.push(leaf);
        let jp = method(&segments.join("."), "run", &[], "void");
        let text = format!("within({}..*)", prefix);
        prop_assert!(matches(&text, &jp));
    }

    #[test]
    fn prop_combinators_are_commutative(owner in type_name(), count in 0usize..4) {
        let params: Vec<&str> = std::iter::repeat_n("int", count).collect();
        let jp = method(owner.as_str(), "run", &params, "void");
        let a = "within(*.*)";
        let b = "argsCount(2)";
        prop_assert_eq!(matches(&format!("{} && {}", a, b), &jp), matches(&format!("{} && {}", b, a), &jp));
        prop_assert_eq!(matches(&format!("{} || {}", a, b), &jp), matches(&format!("{} || {}", b, a), &jp));
    }

    #[test]
    fn prop_compilation_is_deterministic(name in "[a-z]{1,6}") {
        let text = format!("execution(public * com..{}*(int, ..)) && !within(test..*)", name);
        let a = PatternCompiler::new().compile(&text, &[], &NamedPointcuts::new()).unwrap();
        let b = PatternCompiler::new().compile(&text, &[], &NamedPointcuts::new()).unwrap();
        prop_assert_eq!(a.as_ref(), b.as_ref());
    }
}
