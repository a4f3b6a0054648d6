use criterion::{criterion_group, criterion_main, Criterion};
use vsir_core::tokenizer::Normalizer;
use vsir_core::{EngineConfig, IndexBuilder, NormalizerOptions, Stemmer};

const TEXT: &str = "The quick brown fox jumps over the lazy dog. Search engines rank \
    documents by the weight of matching terms, and evaluation compares those \
    rankings with relevance judgments collected for each topic.";

fn bench_tokenize(c: &mut Criterion) {
    let plain = Normalizer::default();
    let stemmed = Normalizer::new(&NormalizerOptions { stemmer: Stemmer::Snowball, ..Default::default() });
    c.bench_function("normalize_plain", |b| b.iter(|| plain.normalize(TEXT)));
    c.bench_function("normalize_snowball", |b| b.iter(|| stemmed.normalize(TEXT)));
}

fn bench_query(c: &mut Criterion) {
    let mut builder = IndexBuilder::new(&EngineConfig { normalize: true, ..Default::default() }).unwrap();
    for i in 0..500 {
        let text = TEXT.split_whitespace().cycle().skip(i % 17).take(20 + i % 30).collect::<Vec<_>>().join(" ");
        builder.add_document(format!("doc-{i}"), &text);
    }
    let engine = builder.finish().unwrap();
    c.bench_function("query_top10", |b| b.iter(|| engine.query("ranking relevance judgments", 10)));
}

criterion_group!(benches, bench_tokenize, bench_query);
criterion_main!(benches);
