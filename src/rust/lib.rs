//! Batch classification of research papers with chat LLMs, scored against
//! optional ground-truth labels.
//!
//! # Basic Usage
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use fos_classifier::{
//!     load_records, LocalSampling, OllamaBackend, OllamaConfig, Pipeline, ResultStreamWriter,
//! };
//!
//! let backend = OllamaBackend::new(OllamaConfig::new("llama3"))?;
//! let pipeline = Pipeline::builder(backend)
//!     .with_template("Title: {title}\nAbstract: {abstract}\nField of science:".parse()?)
//!     .with_sampling(LocalSampling { temperature: 0.1, top_k: 10 })
//!     .with_label_field("main-class")
//!     .build()?;
//!
//! let records = load_records("test.json")?;
//! let (summary, _) = pipeline.run(&records, ResultStreamWriter::create("results.json")?)?;
//! if let Some(metrics) = summary.metrics {
//!     println!("Accuracy: {:.4}", metrics.accuracy);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Failure policy
//!
//! A failing Ollama call aborts the run; a failing OpenAI call drops that
//! record and the run continues. See [`backend`] for details.

pub mod backend;
pub mod config;
pub mod dataset;
pub mod error;
pub mod labels;
pub mod pipeline;
pub mod prep;
pub mod prompt;
pub mod record;
pub mod report;

pub use backend::{BackendError, ChatMessage, InferenceBackend, OllamaBackend, OpenAiBackend, Role};
pub use config::{HostedSampling, LocalSampling, OllamaConfig, OpenAiConfig, SamplingConfig};
pub use dataset::{default_metrics_path, load_json, load_prompt, load_records, load_template, save_json};
pub use error::{ClassifierError, Result};
pub use labels::{labels_match, normalize_label};
pub use pipeline::{
    AggregateMetrics, MetricsAggregator, Pipeline, PipelineBuilder, RecordStep, ResultStreamWriter, RunSummary,
};
pub use prompt::PromptTemplate;
pub use record::{ClassificationOutcome, PromptContext, Record};
pub use report::{metric_title, write_metrics, write_metrics_csv};

/// Initializes `env_logger`. `RUST_LOG` wins; otherwise only errors are shown,
/// or everything from `info` up when `verbose` is set.
pub fn init_logger(verbose: bool) {
    let default_filter = if verbose { "info" } else { "error" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).try_init();
}
