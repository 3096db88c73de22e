use log::info;

use super::Pipeline;
use crate::backend::InferenceBackend;
use crate::config::SamplingConfig;
use crate::error::{ClassifierError, Result};
use crate::prompt::PromptTemplate;

/// A builder for constructing a [`Pipeline`] with a fluent interface.
#[derive(Debug)]
pub struct PipelineBuilder<B: InferenceBackend> {
    backend: B,
    sampling: Option<B::Sampling>,
    template: Option<PromptTemplate>,
    system_prompt: Option<String>,
    label_field: Option<String>,
    verbose: bool,
}

impl<B: InferenceBackend> PipelineBuilder<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            sampling: None,
            template: None,
            system_prompt: None,
            label_field: None,
            verbose: false,
        }
    }

    /// Sets the sampling options used for every call of the run.
    /// Falls back to the backend's defaults when not called.
    pub fn with_sampling(mut self, sampling: B::Sampling) -> Self {
        self.sampling = Some(sampling);
        self
    }

    /// Sets the prompt template (required)
    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.template = Some(template);
        self
    }

    /// Sets the system prompt. An empty string means no system message.
    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        let system_prompt = system_prompt.into();
        self.system_prompt = (!system_prompt.is_empty()).then_some(system_prompt);
        self
    }

    /// Names the record field holding the ground-truth label.
    /// Without it every outcome has an unknown match and no metrics are computed.
    pub fn with_label_field(mut self, field: impl Into<String>) -> Self {
        self.label_field = Some(field.into());
        self
    }

    /// Prints per-record diagnostics to stdout while running
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Builds the pipeline
    ///
    /// # Returns
    /// * `Result<Pipeline<B>, ClassifierError>` - The pipeline if successful, or an error if:
    ///   - No prompt template was set
    ///   - The label field name is empty
    ///   - The sampling options are out of range
    pub fn build(self) -> Result<Pipeline<B>> {
        let template = self
            .template
            .ok_or_else(|| ClassifierError::BuildError("A prompt template must be set".to_string()))?;

        if let Some(field) = &self.label_field {
            if field.trim().is_empty() {
                return Err(ClassifierError::ValidationError("Label field name cannot be empty".into()));
            }
        }

        let sampling = self.sampling.unwrap_or_default();
        sampling.validate()?;

        info!(
            "Pipeline ready: backend={}, sampling={:?}, label_field={:?}",
            self.backend.name(),
            sampling,
            self.label_field
        );

        Ok(Pipeline {
            backend: self.backend,
            sampling,
            template,
            system_prompt: self.system_prompt,
            label_field: self.label_field,
            verbose: self.verbose,
        })
    }
}
