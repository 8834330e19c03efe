use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use schemagraph::{Command, Graph, GraphConfig, PropertyTypeSpec, Schema, SchemaDefinition};
use serde_json::json;
use std::sync::Arc;

fn schema() -> Arc<Schema> {
    let definition = SchemaDefinition::new()
        .with_type(
            "Person",
            None,
            [
                ("name", PropertyTypeSpec::from("string")),
                ("age", "number".into()),
                ("friends", vec!["array", "Person"].into()),
            ],
        )
        .with_type("Employee", Some("Person"), [("dept", "string")])
        .with_index("by_name", "Person", &["name"])
        .with_index("by_dept", "Employee", &["dept"]);
    Arc::new(Schema::new(definition).expect("valid schema"))
}

fn populate(schema: &Arc<Schema>, size: usize) -> Graph {
    let mut graph = Graph::with_config(schema.clone(), GraphConfig::default().with_history(false));
    for i in 0..size {
        graph
            .create(json!({
                "id": format!("p{}", i),
                "type": "Employee",
                "name": format!("Person{}", i % 100),
                "age": (i % 80) as i64,
                "dept": format!("Dept{}", i % 10),
                "friends": [format!("p{}", i / 2)],
            }))
            .expect("create");
    }
    graph
}

/// Benchmark node creation with index maintenance
fn bench_node_creation(c: &mut Criterion) {
    let mut group = c.benchmark_group("node_creation");
    let schema = schema();

    for size in [100, 1000, 10_000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| criterion::black_box(populate(&schema, size).len()));
        });
    }
    group.finish();
}

/// Benchmark grouped index lookups
fn bench_indexed_find(c: &mut Criterion) {
    let mut group = c.benchmark_group("indexed_find");
    let schema = schema();

    for size in [100, 1000, 10_000].iter() {
        let graph = populate(&schema, *size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let nodes = graph.find("by_dept", Some("Dept3"));
                criterion::black_box(nodes.len());
            });
        });
    }
    group.finish();
}

/// Benchmark set commands that move nodes between index buckets
fn bench_set_with_reindex(c: &mut Criterion) {
    let mut group = c.benchmark_group("set_with_reindex");
    let schema = schema();

    for size in [100, 1000, 10_000].iter() {
        let mut graph = populate(&schema, *size);
        let mut i = 0usize;
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| {
                i += 1;
                let id = format!("p{}", i % size);
                let op = graph
                    .set([id.as_str(), "dept"], format!("Dept{}", i % 7))
                    .expect("set");
                criterion::black_box(op);
            });
        });
    }
    group.finish();
}

/// Benchmark reference materialization through query
fn bench_query_references(c: &mut Criterion) {
    let schema = schema();
    let graph = populate(&schema, 1000);

    c.bench_function("query_references", |b| {
        b.iter(|| {
            let result = graph.query(["p500", "friends"]).expect("query");
            criterion::black_box(result.nodes().len());
        });
    });
}

/// Benchmark command normalization and translation without applying
fn bench_translate(c: &mut Criterion) {
    let schema = schema();
    let graph = populate(&schema, 1000);

    c.bench_function("translate_set", |b| {
        b.iter(|| {
            let command = Command::normalize(json!(["set", "p10", "age", {"value": "42"}])).expect("command");
            criterion::black_box(graph.translate(&command).expect("translate"));
        });
    });
}

criterion_group!(
    benches,
    bench_node_creation,
    bench_indexed_find,
    bench_set_with_reindex,
    bench_query_references,
    bench_translate,
);
criterion_main!(benches);
