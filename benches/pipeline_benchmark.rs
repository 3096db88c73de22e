use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fos_classifier::{
    normalize_label, BackendError, InferenceBackend, LocalSampling, MetricsAggregator, Pipeline, PromptContext,
    PromptTemplate, Record, ResultStreamWriter,
};

/// Echoes a fixed label without any I/O.
struct EchoBackend;

impl InferenceBackend for EchoBackend {
    type Sampling = LocalSampling;

    fn name(&self) -> &str {
        "echo"
    }

    fn classify(&self, _prompt: &str, _system: Option<&str>, _sampling: &LocalSampling) -> Result<Option<String>, BackendError> {
        Ok(Some("Natural sciences".to_string()))
    }
}

fn bench_normalization(c: &mut Criterion) {
    let mut group = c.benchmark_group("Normalization");
    group.bench_function("short_label", |b| b.iter(|| normalize_label(black_box("Biology!"))));
    group.bench_function("noisy_label", |b| {
        b.iter(|| normalize_label(black_box("  The answer is:   Engineering &  Technology (Civil engineering).  ")))
    });
    group.finish();
}

fn bench_prompt_rendering(c: &mut Criterion) {
    let template: PromptTemplate = "Classify the paper.\nTitle: {title}\nAbstract: {abstract}\nAnswer with the field of science only."
        .parse()
        .unwrap();
    let abstract_text = "We study the foraging behaviour of ant colonies across seasons. ".repeat(20);
    let context = PromptContext {
        title: "Seasonal foraging in ant colonies",
        abstract_text: &abstract_text,
    };
    c.bench_function("render_prompt", |b| b.iter(|| template.render(black_box(&context))));
}

fn bench_metrics(c: &mut Criterion) {
    let mut aggregator = MetricsAggregator::new();
    for i in 0..10_000 {
        let predicted = if i % 3 == 0 { "engineering" } else { "natural sciences" };
        aggregator.record("natural sciences".to_string(), predicted.to_string());
    }
    c.bench_function("metrics_summary_10k", |b| b.iter(|| black_box(&aggregator).summary()));
}

fn bench_pipeline_run(c: &mut Criterion) {
    let pipeline = Pipeline::builder(EchoBackend)
        .with_template("{title}\n{abstract}".parse().unwrap())
        .with_label_field("main-class")
        .build()
        .unwrap();
    let records: Vec<Record> = (0..1_000)
        .map(|i| {
            Record::new(format!("oai:{}", i), format!("Paper {}", i), "Lorem ipsum dolor sit amet")
                .with_field("main-class", if i % 2 == 0 { "Natural sciences" } else { "Humanities" })
        })
        .collect();

    let mut group = c.benchmark_group("Pipeline");
    group.sample_size(20);
    group.bench_function("run_1000_records", |b| {
        b.iter(|| {
            let stream = ResultStreamWriter::new(Vec::with_capacity(256 * 1024)).unwrap();
            pipeline.run(black_box(&records), stream).unwrap()
        })
    });
    group.finish();
}

criterion_group!(benches, bench_normalization, bench_prompt_rendering, bench_metrics, bench_pipeline_run);
criterion_main!(benches);
