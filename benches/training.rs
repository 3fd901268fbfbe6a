use std::hint::black_box;

use bytepair::{Trainer, TrainerConfig};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, SamplingMode, Throughput};

fn build_corpus() -> String {
    let sentences = [
        "the quick brown fox jumps over the lazy dog. ",
        "pack my box with five dozen liquor jugs. ",
        "how vexingly quick daft zebras jump! ",
        "sphinx of black quartz, judge my vow. ",
    ];
    let mut text = String::with_capacity(1 << 20);
    let mut i = 0usize;
    while text.len() < (1 << 20) {
        text.push_str(sentences[i % sentences.len()]);
        i += 1;
    }
    text
}

fn bench_training(c: &mut Criterion) {
    let corpus = build_corpus();
    let cfg = TrainerConfig::builder()
        .target_vocab_size(512)
        .show_progress(false)
        .build()
        .expect("configuration");

    let mut group = c.benchmark_group("train_text_corpus");
    group.throughput(Throughput::Bytes(corpus.len() as u64));
    group.sampling_mode(SamplingMode::Flat);
    group.sample_size(10);
    group.bench_function(BenchmarkId::from_parameter("MiB_1"), |b| {
        b.iter(|| {
            let trainer = Trainer::new(cfg.clone());
            let artifacts = trainer.train(&corpus).expect("training");
            let _ = black_box(artifacts);
        });
    });
    group.finish();
}

criterion_group!(benches, bench_training);
criterion_main!(benches);
