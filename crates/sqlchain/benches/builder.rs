use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use sqlchain::{
    Arg, ChainResult, Driver, DryRunDriver, Outcome, Predicate, PredicateSource, Query, Row,
    Value, template,
};

/// Driver that discards every statement.
struct NullDriver;

impl Driver for NullDriver {
    type Statement = ();

    fn query(&self, _sql: &str, _params: &[Value]) -> ChainResult<Vec<Row>> {
        Ok(Vec::new())
    }

    fn execute(&self, _sql: &str, _params: &[Value]) -> ChainResult<u64> {
        Ok(1)
    }

    fn last_insert_id(&self) -> u64 {
        0
    }

    fn prepare(&self, _sql: &str) -> ChainResult<()> {
        Ok(())
    }

    fn run(&self, _stmt: &(), _params: &[Value]) -> ChainResult<Outcome> {
        Ok(Outcome::Affected(1))
    }
}

/// A template with `n` identifier/value pairs:
/// INSERT INTO ?n SET ?n=?, ?n=?, ...
fn build_insert_template(n: usize) -> (String, Vec<Arg>) {
    let mut tpl = String::from("INSERT INTO ?n SET ");
    let mut args: Vec<Arg> = vec!["t".into()];
    for i in 0..n {
        if i > 0 {
            tpl.push_str(", ");
        }
        tpl.push_str("?n=?");
        args.push(format!("col{i}").into());
    }
    (tpl, args)
}

fn bench_template_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("builder/template_parse");

    for n in [1, 5, 10, 50, 100] {
        let (tpl, args) = build_insert_template(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| black_box(template::parse(&tpl, args.clone())));
        });
    }

    group.finish();
}

fn bench_nested_predicate(c: &mut Criterion) {
    let mut group = c.benchmark_group("builder/nested_predicate");

    for n in [1, 5, 10, 50] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let items = (0..n)
                    .map(|i| {
                        PredicateSource::list(vec![
                            format!("a{i} = 1").into(),
                            format!("b{i} = 2").into(),
                        ])
                    })
                    .collect::<Vec<_>>();
                black_box(Predicate::new(items, None).render());
            });
        });
    }

    group.finish();
}

fn bench_select_to_sql(c: &mut Criterion) {
    let mut group = c.benchmark_group("builder/select_to_sql");
    let driver = DryRunDriver::new();

    for n in [1, 5, 10, 50] {
        let mut q = Query::table(&driver, "t");
        for i in 0..n {
            q.fields(format!("col{i}").as_str())
                .where_cmp(&format!("col{i}"), "=", i as i64);
        }
        q.order(["-col0"]).paginate(20).page(3);
        group.bench_with_input(BenchmarkId::from_parameter(n), &q, |b, q| {
            b.iter(|| black_box(q.to_sql()));
        });
    }

    group.finish();
}

fn bench_execute_cached(c: &mut Criterion) {
    let driver = NullDriver;
    let mut q = Query::raw(&driver);
    q.prepare("INSERT INTO ?n SET ?n=?, ?n=?", vec![
        "dictionary".into(),
        "word".into(),
        "meaning".into(),
    ])
    .expect("valid template");

    c.bench_function("builder/execute_cached", |b| {
        b.iter(|| {
            q.execute(vec![Value::from("cat"), Value::from("paka")])
                .map(|q| q.affected())
        });
    });
}

criterion_group!(
    benches,
    bench_template_parse,
    bench_nested_predicate,
    bench_select_to_sql,
    bench_execute_cached
);
criterion_main!(benches);
