use criterion::{black_box, criterion_group, criterion_main, Criterion};

use cereal::decode::Decoder;
use cereal::node::{Node, Timestamp};
use cereal::wire::{node_from_bytes, node_to_bytes};

fn sample_doc() -> Node {
    let entry = |ix: i64| {
        Node::Record(vec![
            Node::pair("id", Node::Int64(ix)),
            Node::pair("label", Node::Str(format!("entry-{ix}"))),
            Node::pair("weight", Node::Double(ix as f64 * 0.5)),
            Node::pair("seen", Node::Timestamp(Timestamp::from_seconds(1.6e9 + ix as f64))),
        ])
    };
    Node::Record(vec![
        Node::pair("title", Node::Str("benchmark corpus".to_owned())),
        Node::pair("entries", Node::Array((0..64).map(entry).collect())),
        Node::pair(
            "origin",
            Node::Identified(
                "origin-marker".to_owned(),
                vec![Node::pair("host", Node::Str("bench.local".to_owned()))],
            ),
        ),
    ])
}

fn wide_record(n: i64) -> Node {
    Node::Record(
        (0..n)
            .map(|ix| Node::pair(format!("field{ix}"), Node::Int64(ix)))
            .collect(),
    )
}

fn serialize_bench(c: &mut Criterion) {
    let doc = sample_doc();
    c.bench_function("serialize_nested_record", |b| {
        b.iter(|| black_box(node_to_bytes(&doc)))
    });
}

fn parse_bench(c: &mut Criterion) {
    let bytes = node_to_bytes(&sample_doc());
    c.bench_function("parse_nested_record", |b| {
        b.iter(|| black_box(node_from_bytes(&bytes).unwrap()))
    });
}

fn lookup_bench(c: &mut Criterion) {
    let bytes = node_to_bytes(&wide_record(500));
    let dec = Decoder::from_bytes(&bytes).unwrap();
    c.bench_function("linear_lookup_wide_record", |b| {
        b.iter(|| black_box(dec.lookup("field250")))
    });
}

criterion_group! {
    name = codec_benches;
    config = Criterion::default();
    targets = serialize_bench, parse_bench, lookup_bench
}

criterion_main!(codec_benches);
