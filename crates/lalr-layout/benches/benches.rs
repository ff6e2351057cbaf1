use criterion::{criterion_group, criterion_main, Criterion};
use lalr_layout::{grammar::examples, ContextSets, Grammar};

criterion_main!(benches);
criterion_group!(benches, bench_examples);

fn bench_examples(c: &mut Criterion) {
    for (name, example) in examples::ALL {
        let grammar = Grammar::define(*example).unwrap();
        let ctx = ContextSets::new(&grammar);
        let lr0 = lalr_layout::lr0(&grammar);

        let mut group = c.benchmark_group(*name);
        group.bench_function("LR0", |b| {
            b.iter(|| lalr_layout::lr0(&grammar));
        });
        group.bench_function("LALR+layout", |b| {
            b.iter(|| lalr_layout::build(&grammar, &ctx, &lr0));
        });
        group.finish();
    }
}
