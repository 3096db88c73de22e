use std::collections::HashMap;

use log::info;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::{RawRecord, MAIN_CLASS, SUB_CLASS};
use crate::error::Result;
use crate::labels::normalize_label;

/// Field holding the free-text field of science on source records
pub const FIELD_OF_SCIENCE: &str = "fieldOfScience";

/// One main class of the classification file and its sub-classes.
#[derive(Debug, Clone, Deserialize)]
pub struct MainClassEntry {
    pub sub: Vec<String>,
}

/// Maps normalized sub-class names to their main class.
#[derive(Debug, Clone, Default)]
pub struct TaxonomyLookup {
    by_sub_class: HashMap<String, String>,
}

impl TaxonomyLookup {
    /// Builds the lookup from main classes in the order given.
    /// A sub-class listed under two main classes maps to the later one.
    pub fn new(classification: impl IntoIterator<Item = (String, MainClassEntry)>) -> Self {
        let mut by_sub_class = HashMap::new();
        for (main_class, entry) in classification {
            for sub_class in &entry.sub {
                by_sub_class.insert(normalize_label(sub_class), main_class.clone());
            }
        }
        Self { by_sub_class }
    }

    /// Builds the lookup from a decoded `{main_class: {"sub": [...]}}` file,
    /// keeping the file's key order.
    pub fn from_json(classification: Map<String, Value>) -> Result<Self> {
        let entries = classification
            .into_iter()
            .map(|(main_class, entry)| -> Result<(String, MainClassEntry)> {
                Ok((main_class, serde_json::from_value(entry)?))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(entries))
    }

    pub fn main_class_of(&self, field_of_science: &str) -> Option<&str> {
        self.by_sub_class
            .get(&normalize_label(field_of_science))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_sub_class.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_sub_class.is_empty()
    }
}

/// Records split by whether their field of science is in the taxonomy.
#[derive(Debug, Clone, Default)]
pub struct Assignment {
    pub matched: Vec<RawRecord>,
    pub unmatched: Vec<RawRecord>,
}

/// Tags each record with `main-class` and `sub-class` when its
/// `fieldOfScience` matches a known sub-class.
pub fn assign_classes(records: Vec<RawRecord>, lookup: &TaxonomyLookup) -> Assignment {
    let mut assignment = Assignment::default();
    for mut record in records {
        let main_class = match record.get(FIELD_OF_SCIENCE) {
            Some(Value::String(field)) => lookup.main_class_of(field).map(|m| (m.to_string(), field.clone())),
            _ => None,
        };
        match main_class {
            Some((main_class, field)) => {
                record.insert(MAIN_CLASS.to_string(), Value::String(main_class));
                record.insert(SUB_CLASS.to_string(), Value::String(field));
                assignment.matched.push(record);
            }
            None => assignment.unmatched.push(record),
        }
    }
    info!("Matched {} records.", assignment.matched.len());
    info!("Unmatched {} records.", assignment.unmatched.len());
    assignment
}
