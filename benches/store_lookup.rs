use bytes::Bytes;
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use http::StatusCode;
use reqctx::chain::HandlerChain;
use reqctx::pipeline::Pipeline;
use reqctx::store::{Environment, Key, Store, Value};
use reqctx::testing::TestRequest;
use reqctx::writer;
use std::collections::HashMap;
use std::sync::Arc;

fn layered_store() -> Store {
    let mut vars = HashMap::new();
    vars.insert("id".to_string(), "42".to_string());
    Store::new()
        .with_value(Value::Environment(Environment::Standard))
        .with_value(Value::RequestVars(Arc::new(vars)))
        .with_value(Value::RequestBody(Bytes::from_static(b"{\"name\":\"ferris\"}")))
        .with_value(Value::Namespace(Arc::from("tenant-a")))
}

fn bench_store_lookup(c: &mut Criterion) {
    let store = layered_store();
    c.bench_function("store_lookup_newest", |b| {
        b.iter(|| black_box(store.namespace()))
    });
    c.bench_function("store_lookup_oldest", |b| {
        b.iter(|| black_box(store.get(Key::Environment)))
    });
    c.bench_function("store_lookup_missing", |b| {
        b.iter(|| black_box(store.get(Key::ResponseCode)))
    });
    c.bench_function("store_derive", |b| {
        b.iter(|| black_box(store.with_value(Value::ResponseCode(StatusCode::CREATED))))
    });
}

fn bench_pipeline(c: &mut Criterion) {
    let pipeline = Pipeline::builder().build();
    let chain = HandlerChain::builder()
        .handler("check", |store| {
            black_box(store.form_value("id"));
            Ok(())
        })
        .handler("reply", |store| {
            writer::text(store, StatusCode::OK, "ok")?;
            Ok(())
        })
        .build();
    c.bench_function("pipeline_form_request", |b| {
        b.iter(|| {
            let res = TestRequest::post_form("/items?page=2", &[("id", "7"), ("name", "x")])
                .map(|req| req.run(&pipeline, &chain));
            black_box(res.is_ok())
        })
    });
}

criterion_group!(benches, bench_store_lookup, bench_pipeline);
criterion_main!(benches);
