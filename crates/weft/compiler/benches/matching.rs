use criterion::{Criterion, black_box, criterion_group, criterion_main};
use weft_common::{JoinPoint, Modifiers, Signature, TypeName};
use weft_compiler::pointcut::{NamedPointcuts, PatternCompiler, evaluate};

const POINTCUT: &str = "execution(public * com.example..*Service.*(String, ..)) && !within(com.example.generated..*)";

fn benchmark_compile(c: &mut Criterion) {
    let named = NamedPointcuts::new();
    c.bench_function("compile_uncached", |b| {
        b.iter(|| {
            let compiler = PatternCompiler::new();
            compiler.compile(black_box(POINTCUT), &[], &named)
        });
    });

    let compiler = PatternCompiler::new();
    c.bench_function("compile_cached", |b| b.iter(|| compiler.compile(black_box(POINTCUT), &[], &named)));
}

fn benchmark_match(c: &mut Criterion) {
    let compiled = PatternCompiler::new().compile(POINTCUT, &[], &NamedPointcuts::new()).expect("benchmark pointcut compiles");
    let jp = JoinPoint::method_execution(
        "com.example.orders.OrderService",
        Signature::new("place", vec![TypeName::new("String"), TypeName::new("int")], TypeName::void()),
        Modifiers::PUBLIC,
    );
    c.bench_function("match_execution", |b| b.iter(|| evaluate(black_box(&compiled), black_box(&jp))));
}

criterion_group!(matching_benches, benchmark_compile, benchmark_match);
criterion_main!(matching_benches);
