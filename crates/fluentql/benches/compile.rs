use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use fluentql::{Builder, Db, Dialect, QueryConfig};

/// SELECT * FROM t WHERE col0 = ? AND col1 = ? ... with `n` predicates.
fn build_select(db: &Db, n: usize) -> Builder {
    let mut q = db.table("t");
    for i in 0..n {
        q.where_op(&format!("col{i}"), "=", i as i64);
    }
    q
}

/// `n` nested groups, each holding an `IN` sub-select.
fn build_nested(db: &Db, n: usize) -> Builder {
    let mut q = db.table("t");
    for i in 0..n {
        q.where_nested(|g| {
            g.where_eq("kind", i as i64).or_where_in_sub("id", |s| {
                s.from("other").select(["id"]).where_op("score", ">", i as i64);
            });
        });
    }
    q
}

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile/flat");

    for dialect in [Dialect::Postgres, Dialect::MySql] {
        let db = Db::new(QueryConfig::new().with_dialect(dialect));
        for n in [1, 10, 100] {
            let q = build_select(&db, n);
            group.bench_with_input(
                BenchmarkId::new(dialect.as_str(), n),
                &q,
                |b, q| b.iter(|| black_box(q.compile())),
            );
        }
    }

    group.finish();
}

fn bench_build_and_compile_nested(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile/nested");
    let db = Db::postgres();

    for n in [1, 10, 50] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let q = build_nested(&db, n);
                black_box(q.compile())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_compile, bench_build_and_compile_nested);
criterion_main!(benches);
