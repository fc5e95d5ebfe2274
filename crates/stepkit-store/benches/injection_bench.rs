use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::json;
use std::hint::black_box;
use stepkit_store::{DynamicObject, InjectionHooks, Store};

fn populated_store(users: usize) -> Store {
    let store = Store::new();
    for i in 0..users {
        store.set(
            "User",
            json!({
                "name": format!("user-{}", i),
                "email": format!("user-{}@example.com", i),
                "first_name": format!("First {}", i),
            }),
        );
    }
    store.set(
        "Session",
        DynamicObject::new(|name| Some(json!(format!("session-{}", name)))),
    );
    store
}

/// Benchmark injection of typical step text
fn benchmark_injection(c: &mut Criterion) {
    let mut group = c.benchmark_group("injection");
    let store = populated_store(50);

    group.bench_function("no_references", |b| {
        b.iter(|| store.inject_stored_values(black_box("I fill in the login form and press submit")))
    });

    group.bench_function("single_reference", |b| {
        b.iter(|| store.inject_stored_values(black_box("I log in as (the email of the User)")))
    });

    group.bench_function("ordinal_references", |b| {
        b.iter(|| {
            store.inject_stored_values(black_box(
                "(the first name of the 1st User) invites (the first name of the 42nd User)",
            ))
        })
    });

    group.bench_function("dynamic_object_with_hooks", |b| {
        let hooks = InjectionHooks::new().has_value(|thing, property| thing.get_property(property).is_some());
        b.iter(|| store.inject_stored_values_with(black_box("token (the token of the Session)"), &hooks))
    });

    group.finish();
}

/// Benchmark lookups as histories grow
fn benchmark_ordinal_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("ordinal_lookup");

    for history in [1, 10, 100, 1000].iter() {
        let store = populated_store(*history);
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::new("first_of", history), history, |b, _| {
            b.iter(|| store.get(black_box("1st User"), None))
        });
        group.bench_with_input(BenchmarkId::new("latest_of", history), history, |b, _| {
            b.iter(|| store.get(black_box("User"), None))
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_injection, benchmark_ordinal_lookup);
criterion_main!(benches);
