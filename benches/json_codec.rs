use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use docserve::json;
use docserve::server::decode_path;

fn sample_document() -> String {
    let items: Vec<String> = (0..200)
        .map(|i| {
            format!(
                r#"{{"id":{i},"name":"item {i}","price":{}.25,"tags":["a","b\n"],"active":true,"parent":null}}"#,
                i * 3
            )
        })
        .collect();
    format!(r#"{{"items":[{}],"total":200}}"#, items.join(","))
}

fn bench_decode(c: &mut Criterion) {
    let doc = sample_document();
    c.bench_function("json_decode_200_items", |b| {
        b.iter(|| json::decode(black_box(&doc)))
    });

    let deep = format!("{}{}", "[".repeat(900), "]".repeat(900));
    c.bench_function("json_decode_900_deep", |b| {
        b.iter(|| json::decode(black_box(&deep)))
    });
}

fn bench_encode(c: &mut Criterion) {
    let value = match json::decode(&sample_document()) {
        Ok(value) => value,
        Err(e) => panic!("sample document should decode: {e}"),
    };
    c.bench_function("json_encode_200_items", |b| {
        b.iter(|| json::encode(black_box(&value)))
    });
}

fn bench_query(c: &mut Criterion) {
    let target = "/set?id=abc123&json=%7B%22data%22:%22abcde12345%22%7D";
    c.bench_function("decode_path_set", |b| {
        b.iter(|| decode_path(black_box(target)))
    });
}

criterion_group!(benches, bench_decode, bench_encode, bench_query);
criterion_main!(benches);
