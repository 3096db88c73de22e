//! The per-record classification loop.
//!
//! For each record the pipeline renders the prompt, asks the backend for a
//! label, compares it with the ground truth (if any), appends the outcome to
//! the result stream and feeds the aggregator. Records are handled strictly
//! one after another, in input order.

mod builder;
mod metrics;
mod stream;

use std::io::Write;

use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};

use crate::backend::InferenceBackend;
use crate::error::Result;
use crate::labels::normalize_label;
use crate::prompt::PromptTemplate;
use crate::record::{ClassificationOutcome, Record};

pub use builder::PipelineBuilder;
pub use metrics::{AggregateMetrics, MetricsAggregator};
pub use stream::ResultStreamWriter;

/// What happened to a single record.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordStep {
    /// The backend reported a recoverable failure; nothing is persisted
    Skipped,
    Classified {
        outcome: ClassificationOutcome,
        /// Normalized (actual, predicted) labels when a ground truth exists
        evaluated: Option<(String, String)>,
    },
}

/// Totals for a finished run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Outcomes written to the result stream
    pub classified: usize,
    /// Records dropped after a recoverable backend failure
    pub skipped: usize,
    /// Outcomes that had a ground truth and entered the metrics
    pub evaluated: usize,
    /// `None` when no record carried a ground truth
    pub metrics: Option<AggregateMetrics>,
}

/// One classification run: a backend, its sampling options and the prompt.
#[derive(Debug)]
pub struct Pipeline<B: InferenceBackend> {
    backend: B,
    sampling: B::Sampling,
    template: PromptTemplate,
    system_prompt: Option<String>,
    label_field: Option<String>,
    verbose: bool,
}

impl<B: InferenceBackend> Pipeline<B> {
    /// Creates a new PipelineBuilder for fluent construction
    pub fn builder(backend: B) -> PipelineBuilder<B> {
        PipelineBuilder::new(backend)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn sampling(&self) -> &B::Sampling {
        &self.sampling
    }

    /// Classifies every record, streaming outcomes into `stream`.
    ///
    /// On success the stream is closed and its writer returned along with the
    /// run totals. Any `Err` aborts the run immediately and leaves the stream
    /// unterminated. A progress bar is drawn on stderr in verbose mode.
    ///
    /// # Errors
    /// - `MissingField` / `InvalidLabel` for a malformed record
    /// - `Backend` for a fatal backend failure
    /// - `Io` / `Json` if the stream cannot be written
    pub fn run<'r, I, W>(&self, records: I, stream: ResultStreamWriter<W>) -> Result<(RunSummary, W)>
    where
        I: IntoIterator<Item = &'r Record>,
        W: Write,
    {
        let records = records.into_iter();
        let progress = self.progress_bar(records.size_hint().1);
        self.run_with_progress(records, stream, &progress)
    }

    /// Like [`run`](Self::run), advancing `progress` once per record whether
    /// it is classified or skipped.
    pub fn run_with_progress<'r, I, W>(
        &self,
        records: I,
        mut stream: ResultStreamWriter<W>,
        progress: &ProgressBar,
    ) -> Result<(RunSummary, W)>
    where
        I: IntoIterator<Item = &'r Record>,
        W: Write,
    {
        let mut aggregator = MetricsAggregator::new();
        let mut skipped = 0;

        info!("Starting classification with backend '{}'", self.backend.name());
        for record in records {
            match self.classify_record(record)? {
                RecordStep::Skipped => skipped += 1,
                RecordStep::Classified { outcome, evaluated } => {
                    stream.append(&outcome)?;
                    if let Some((actual, predicted)) = evaluated {
                        aggregator.record(actual, predicted);
                    }
                }
            }
            progress.inc(1);
        }
        progress.finish_and_clear();

        let classified = stream.len();
        let writer = stream.finish()?;
        let metrics = aggregator.summary();
        if metrics.is_none() {
            if let Some(field) = &self.label_field {
                info!("No ground-truth labels found under '{}'", field);
            }
        }
        info!(
            "Classification finished: {} classified, {} skipped, {} evaluated",
            classified,
            skipped,
            aggregator.len()
        );

        Ok((
            RunSummary {
                classified,
                skipped,
                evaluated: aggregator.len(),
                metrics,
            },
            writer,
        ))
    }

    /// Hidden unless verbose; a spinner when the record count is unknown
    fn progress_bar(&self, len: Option<usize>) -> ProgressBar {
        if !self.verbose {
            return ProgressBar::hidden();
        }
        let bar = match len {
            Some(len) => ProgressBar::new(len as u64),
            None => ProgressBar::new_spinner(),
        };
        if let Ok(style) = ProgressStyle::default_bar().template("{msg} [{bar:40.cyan/blue}] {pos}/{len} ({eta})") {
            bar.set_style(style);
        }
        bar.set_message("Classifying");
        bar
    }

    /// Renders, invokes and compares a single record without persisting it
    pub fn classify_record(&self, record: &Record) -> Result<RecordStep> {
        let context = record.prompt_context()?;
        let prompt = self.template.render(&context);

        debug!("Classifying record {}", record.display_id());
        let predicted = match self
            .backend
            .classify(&prompt, self.system_prompt.as_deref(), &self.sampling)?
        {
            Some(label) => label,
            None => {
                warn!("Skipping record {} after backend failure", record.display_id());
                return Ok(RecordStep::Skipped);
            }
        };

        let true_label = match &self.label_field {
            Some(field) => record.label(field)?,
            None => None,
        };
        let evaluated = true_label
            .filter(|label| !label.is_empty())
            .map(|label| (normalize_label(label), normalize_label(&predicted)));
        let is_match = evaluated.as_ref().map(|(actual, predicted)| actual == predicted);

        let outcome = ClassificationOutcome {
            identifier: record.identifier()?.to_string(),
            predicted_label: predicted,
            true_label: true_label.map(str::to_string),
            is_match,
        };

        if self.verbose {
            self.print_outcome(record, &outcome);
        }

        Ok(RecordStep::Classified { outcome, evaluated })
    }

    fn print_outcome(&self, record: &Record, outcome: &ClassificationOutcome) {
        println!("Identifier: {}", outcome.identifier);
        println!("Title: {}", record.title.as_deref().unwrap_or_default());
        println!("Prediction: {}", outcome.predicted_label);
        if let Some(is_match) = outcome.is_match {
            println!("Actual: {}", outcome.true_label.as_deref().unwrap_or_default());
            println!("Match: {}", is_match);
        }
        println!("---");
    }
}
