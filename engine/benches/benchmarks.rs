//! Performance benchmarks for delta-engine

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use delta_engine::{
    add_records, changes, get, Account, Backend, ById, ChangesRequest, Email, GetRequest, GroupBy,
    Invocation, Limits, MemoryStore, RecordInput, Request,
};
use serde_json::json;

fn email(i: usize) -> RecordInput<Email> {
    RecordInput::new(
        format!("email-{i}"),
        Email {
            thread_id: Some(format!("thread-{}", i % 50)),
            subject: Some(format!("Subject {i}")),
            preview: Some("Lorem ipsum dolor sit amet".to_string()),
            received_at: Some(i as u64),
            ..Email::default()
        },
    )
}

fn populated(n: usize) -> MemoryStore<Email> {
    let store = MemoryStore::new();
    add_records(&store, (0..n).map(email).collect()).unwrap();
    store
}

fn bench_mutations(c: &mut Criterion) {
    let mut group = c.benchmark_group("mutations");

    group.bench_function("add_single", |b| {
        let store = MemoryStore::<Email>::new();
        let mut i = 0;
        b.iter(|| {
            i += 1;
            add_records(&store, vec![email(i)]).unwrap()
        })
    });

    for size in [10, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::new("add_batch", size), size, |b, &size| {
            b.iter(|| {
                let store = MemoryStore::<Email>::new();
                add_records(&store, black_box((0..size).map(email).collect())).unwrap()
            })
        });
    }

    group.bench_function("merge_existing", |b| {
        let store = populated(1000);
        let mut i = 0;
        b.iter(|| {
            i = (i + 1) % 1000;
            let patch = RecordInput::new(
                format!("email-{i}"),
                Email {
                    subject: Some("Re: updated".to_string()),
                    ..Email::default()
                },
            );
            add_records(&store, vec![patch]).unwrap()
        })
    });

    group.finish();
}

fn bench_changes(c: &mut Criterion) {
    let mut group = c.benchmark_group("changes");
    let limits = Limits::default();

    for size in [100, 1000, 10000].iter() {
        let store = populated(*size);
        group.bench_with_input(BenchmarkId::new("from_zero", size), size, |b, _| {
            b.iter(|| changes(&store, "acc", black_box(&ChangesRequest::new("0")), &limits).unwrap())
        });
    }

    let store = populated(10000);
    group.bench_function("tail_page", |b| {
        let request = ChangesRequest::new("9990").with_max_changes(100);
        b.iter(|| changes(&store, "acc", black_box(&request), &limits).unwrap())
    });

    group.finish();
}

fn bench_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("get");
    let limits = Limits::default();
    let store = populated(1000);

    group.bench_function("by_id_100", |b| {
        let request = GetRequest {
            ids: Some((0..100).map(|i| format!("email-{i}")).collect()),
            ..GetRequest::default()
        };
        b.iter(|| get(&store, "acc", black_box(&request), &ById, &limits).unwrap())
    });

    group.bench_function("by_id_projected", |b| {
        let request = GetRequest {
            ids: Some((0..100).map(|i| format!("email-{i}")).collect()),
            properties: Some(vec!["subject".to_string()]),
            ..GetRequest::default()
        };
        b.iter(|| get(&store, "acc", black_box(&request), &ById, &limits).unwrap())
    });

    group.bench_function("threads_all", |b| {
        let threads = GroupBy::threads();
        b.iter(|| get(&store, "acc", black_box(&GetRequest::default()), &threads, &limits).unwrap())
    });

    group.finish();
}

fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch");
    let account = Account::in_memory("acc");
    add_records(account.backend().emails(), (0..100).map(email).collect()).unwrap();

    let body = json!({
        "using": [],
        "methodCalls": [
            ["Email/changes", {"sinceState": "50"}, "c1"],
            ["Email/get", {"ids": ["email-1", "email-2"], "properties": ["subject"]}, "c2"],
        ],
    })
    .to_string();

    group.bench_function("process_json", |b| {
        b.iter(|| account.process_json(black_box(body.as_bytes())).unwrap())
    });

    group.bench_function("process_echo", |b| {
        b.iter(|| {
            let request = Request::new(vec![Invocation::new("Core/echo", json!({"a": 1}), "c1")]);
            account.process(black_box(request))
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_mutations,
    bench_changes,
    bench_get,
    bench_dispatch,
);
criterion_main!(benches);
