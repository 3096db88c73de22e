//! Dataset preparation: assigning taxonomy classes, class statistics, and
//! sampling or splitting test sets.
//!
//! These tools work on untyped JSON objects because they add and read fields
//! that the classifier itself never looks at.

mod sampling;
mod stats;
mod taxonomy;

use serde_json::{Map, Value};

pub use sampling::{
    sample_all, sample_by_class, sample_categories, sample_records, split_train_test_validation, DataSplit,
    SampleMode,
};
pub use stats::{ClassDistribution, OrderedCounts, SummaryStatistics};
pub use taxonomy::{assign_classes, Assignment, MainClassEntry, TaxonomyLookup, FIELD_OF_SCIENCE};

/// A source record as a plain JSON object
pub type RawRecord = Map<String, Value>;

pub const MAIN_CLASS: &str = "main-class";
pub const SUB_CLASS: &str = "sub-class";
