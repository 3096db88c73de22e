use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ClassifierError, Result};

/// A single paper to classify.
///
/// `identifier`, `title` and `abstract` are optional at decode time so that a
/// malformed record aborts the run when it is reached rather than when the
/// dataset is loaded. Any other field is kept in `fields` and may be named as
/// the ground-truth label.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Record {
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, rename = "abstract")]
    pub abstract_text: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// The title/abstract pair substituted into the prompt template.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PromptContext<'a> {
    pub title: &'a str,
    pub abstract_text: &'a str,
}

impl Record {
    pub fn new(identifier: impl Into<String>, title: impl Into<String>, abstract_text: impl Into<String>) -> Self {
        Self {
            identifier: Some(identifier.into()),
            title: Some(title.into()),
            abstract_text: Some(abstract_text.into()),
            fields: Map::new(),
        }
    }

    /// Adds an auxiliary field, e.g. the ground-truth label column
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Identifier used in error messages; never fails
    pub fn display_id(&self) -> &str {
        self.identifier.as_deref().unwrap_or("<unidentified>")
    }

    pub fn identifier(&self) -> Result<&str> {
        self.identifier.as_deref().ok_or_else(|| self.missing("identifier"))
    }

    /// Borrows the fields needed to render a prompt.
    ///
    /// # Errors
    /// `MissingField` if the title or abstract is absent.
    pub fn prompt_context(&self) -> Result<PromptContext<'_>> {
        let title = self.title.as_deref().ok_or_else(|| self.missing("title"))?;
        let abstract_text = self.abstract_text.as_deref().ok_or_else(|| self.missing("abstract"))?;
        Ok(PromptContext { title, abstract_text })
    }

    /// Looks up the ground-truth label stored under `field`.
    ///
    /// Returns `Ok(None)` when the field is missing or null. Empty strings are
    /// returned as-is; callers decide whether an empty label counts.
    ///
    /// # Errors
    /// `InvalidLabel` if the field holds a number, bool, array or object.
    pub fn label(&self, field: &str) -> Result<Option<&str>> {
        let named = match field {
            "identifier" => Some(self.identifier.as_deref()),
            "title" => Some(self.title.as_deref()),
            "abstract" => Some(self.abstract_text.as_deref()),
            _ => None,
        };
        if let Some(value) = named {
            return Ok(value);
        }

        match self.fields.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(_) => Err(ClassifierError::InvalidLabel {
                identifier: self.display_id().to_string(),
                field: field.to_string(),
            }),
        }
    }

    fn missing(&self, field: &'static str) -> ClassifierError {
        ClassifierError::MissingField {
            identifier: self.display_id().to_string(),
            field,
        }
    }
}

/// The persisted result for one classified record.
///
/// `is_match` is `None` when the record carried no ground truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationOutcome {
    pub identifier: String,
    pub predicted_label: String,
    pub true_label: Option<String>,
    pub is_match: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_with_auxiliary_fields() -> Result<()> {
        let record: Record = serde_json::from_value(json!({
            "identifier": "doi:10.5061/dryad.1",
            "title": "Seed dispersal",
            "abstract": "Birds move seeds.",
            "main-class": "Natural Sciences",
            "year": 2019
        }))?;
        assert_eq!(record.identifier()?, "doi:10.5061/dryad.1");
        let context = record.prompt_context()?;
        assert_eq!(context.title, "Seed dispersal");
        assert_eq!(context.abstract_text, "Birds move seeds.");
        assert_eq!(record.label("main-class")?, Some("Natural Sciences"));
        assert_eq!(record.label("sub-class")?, None);
        Ok(())
    }

    #[test]
    fn test_missing_abstract_is_reported() {
        let record: Record = serde_json::from_value(json!({
            "identifier": "r1",
            "title": "Only a title"
        }))
        .unwrap();
        let err = record.prompt_context().unwrap_err();
        assert!(matches!(err, ClassifierError::MissingField { field: "abstract", .. }));
        assert!(err.to_string().contains("r1"));
    }

    #[test]
    fn test_label_kinds() {
        let record = Record::new("r1", "t", "a")
            .with_field("empty", "")
            .with_field("null", Value::Null)
            .with_field("number", 3);
        assert_eq!(record.label("empty").unwrap(), Some(""));
        assert_eq!(record.label("null").unwrap(), None);
        assert_eq!(record.label("title").unwrap(), Some("t"));
        assert!(matches!(record.label("number"), Err(ClassifierError::InvalidLabel { .. })));
    }

    #[test]
    fn test_outcome_serializes_null_fields() -> Result<()> {
        let outcome = ClassificationOutcome {
            identifier: "r3".into(),
            predicted_label: "Physics".into(),
            true_label: None,
            is_match: None,
        };
        let value = serde_json::to_value(&outcome)?;
        assert_eq!(value, json!({
            "identifier": "r3",
            "predicted_label": "Physics",
            "true_label": null,
            "is_match": null
        }));
        Ok(())
    }
}
