// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use criterion::{criterion_group, criterion_main, Criterion};
use kcidb_orm::{Pattern, Schema};
use serde_json::json;
use std::hint::black_box;

fn bench_parse_named(c: &mut Criterion) {
    let schema = Schema::kcidb().unwrap();

    c.bench_function("parse_named", |b| {
        b.iter(|| {
            Pattern::parse(
                black_box(">test[redhat:1077834_0; redhat:1077834_1]<build#<checkout#"),
                None,
                &schema,
            )
            .unwrap()
        })
    });
}

fn bench_parse_wildcard(c: &mut Criterion) {
    let schema = Schema::kcidb().unwrap();

    c.bench_function("parse_wildcard", |b| {
        b.iter(|| Pattern::parse(black_box(">test[t]<*$>*#"), None, &schema).unwrap())
    });
}

fn bench_format(c: &mut Criterion) {
    let schema = Schema::kcidb().unwrap();
    let pattern_list =
        Pattern::parse(r#">revision["c763deac7ff", "a b"]#>*#"#, None, &schema).unwrap();

    c.bench_function("format", |b| {
        b.iter(|| {
            for pattern in &pattern_list {
                black_box(pattern.format().unwrap());
            }
        })
    });
}

fn bench_get_id(c: &mut Criterion) {
    let schema = Schema::kcidb().unwrap();
    let test_type = schema.get_type("test").unwrap();
    let mut test = json!({});
    for field in ["id", "build_id"] {
        test[field] = json!("redhat:1");
    }
    test["origin"] = json!("redhat");
    for field in test_type.json_schema()["properties"]
        .as_object()
        .unwrap()
        .keys()
    {
        if test.get(field).is_none() {
            test[field] = json!(null);
        }
    }

    c.bench_function("get_id", |b| {
        b.iter(|| test_type.get_id(black_box(&test)).unwrap())
    });
}

criterion_group!(
    benches,
    bench_parse_named,
    bench_parse_wildcard,
    bench_format,
    bench_get_id
);
criterion_main!(benches);
