use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::Value;

use super::{RawRecord, MAIN_CLASS, SUB_CLASS};
use crate::error::{ClassifierError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleMode {
    /// Uniformly from the whole dataset
    All,
    /// From records whose `main-class` equals a given value
    Main,
    /// From records whose `sub-class` equals a given value
    Sub,
    /// Round-robin across `main-class` groups
    Categories,
    /// 80/10/10 train/test/validation split
    Train,
}

impl FromStr for SampleMode {
    type Err = ClassifierError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "all" => Ok(Self::All),
            "main" => Ok(Self::Main),
            "sub" => Ok(Self::Sub),
            "categories" => Ok(Self::Categories),
            "train" => Ok(Self::Train),
            other => Err(ClassifierError::ValidationError(format!("Invalid sampling mode: {}", other))),
        }
    }
}

impl fmt::Display for SampleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::All => "all",
            Self::Main => "main",
            Self::Sub => "sub",
            Self::Categories => "categories",
            Self::Train => "train",
        };
        f.write_str(name)
    }
}

/// Draws `n` records without replacement.
///
/// # Errors
/// `ValidationError` if fewer than `n` records exist.
pub fn sample_all<R: Rng + ?Sized>(records: &[RawRecord], n: usize, rng: &mut R) -> Result<Vec<RawRecord>> {
    if n > records.len() {
        return Err(ClassifierError::ValidationError(format!(
            "Not enough records to sample {} items",
            n
        )));
    }
    Ok(records.choose_multiple(rng, n).cloned().collect())
}

/// Draws `n` records whose `class_field` equals `class_value`.
pub fn sample_by_class<R: Rng + ?Sized>(
    records: &[RawRecord],
    n: usize,
    class_field: &str,
    class_value: &str,
    rng: &mut R,
) -> Result<Vec<RawRecord>> {
    let filtered: Vec<&RawRecord> = records
        .iter()
        .filter(|r| matches!(r.get(class_field), Some(Value::String(v)) if v == class_value))
        .collect();
    if n > filtered.len() {
        return Err(ClassifierError::ValidationError(format!(
            "Not enough records in {} '{}' to sample {} items",
            class_field, class_value, n
        )));
    }
    Ok(filtered.choose_multiple(rng, n).map(|r| (*r).clone()).collect())
}

fn group_key(record: &RawRecord) -> String {
    match record.get(MAIN_CLASS) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Cycles through `main-class` groups in first-seen order, taking one random
/// unsampled record per group per round, until `n` records are drawn or every
/// group is exhausted. Records sharing an identifier are drawn at most once.
pub fn sample_categories<R: Rng + ?Sized>(records: &[RawRecord], n: usize, rng: &mut R) -> Vec<RawRecord> {
    let mut groups: Vec<(String, Vec<&RawRecord>)> = Vec::new();
    for record in records {
        let key = group_key(record);
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, members)) => members.push(record),
            None => groups.push((key, vec![record])),
        }
    }

    let mut samples = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    while samples.len() < n && !groups.is_empty() {
        let mut exhausted = Vec::new();
        for (i, (_, members)) in groups.iter_mut().enumerate() {
            if samples.len() >= n {
                break;
            }
            members.shuffle(rng);
            let pick = members
                .iter()
                .position(|r| !seen.contains(&identifier_key(r)));
            match pick {
                Some(pos) => {
                    let record = members.swap_remove(pos);
                    seen.insert(identifier_key(record));
                    samples.push(record.clone());
                }
                None => exhausted.push(i),
            }
        }
        for i in exhausted.into_iter().rev() {
            groups.remove(i);
        }
    }
    samples
}

fn identifier_key(record: &RawRecord) -> String {
    record.get("identifier").map(Value::to_string).unwrap_or_default()
}

/// The three partitions produced by [`split_train_test_validation`].
#[derive(Debug, Clone, Default)]
pub struct DataSplit {
    pub train: Vec<RawRecord>,
    pub test: Vec<RawRecord>,
    pub validation: Vec<RawRecord>,
}

impl DataSplit {
    /// Partitions with their file-name suffixes
    pub fn parts(&self) -> [(&'static str, &[RawRecord]); 3] {
        [
            ("train", &self.train),
            ("test", &self.test),
            ("validation", &self.validation),
        ]
    }
}

/// Shuffles and splits at `floor(0.8 * len)` and `floor(0.9 * len)`.
pub fn split_train_test_validation<R: Rng + ?Sized>(mut records: Vec<RawRecord>, rng: &mut R) -> DataSplit {
    records.shuffle(rng);
    let total = records.len();
    let train_end = total * 8 / 10;
    let test_end = total * 9 / 10;

    let validation = records.split_off(test_end);
    let test = records.split_off(train_end);
    DataSplit {
        train: records,
        test,
        validation,
    }
}

/// Dispatches a non-`train` sampling mode.
///
/// # Errors
/// `ValidationError` for `train` (use [`split_train_test_validation`]), for a
/// missing class value in `main`/`sub` mode, or when too few records match.
pub fn sample_records<R: Rng + ?Sized>(
    records: &[RawRecord],
    n: usize,
    mode: SampleMode,
    class_value: Option<&str>,
    rng: &mut R,
) -> Result<Vec<RawRecord>> {
    match mode {
        SampleMode::All => sample_all(records, n, rng),
        SampleMode::Main | SampleMode::Sub => {
            let field = if mode == SampleMode::Main { MAIN_CLASS } else { SUB_CLASS };
            let value = class_value.ok_or_else(|| {
                ClassifierError::ValidationError(format!("A class value is required when mode is '{}'", mode))
            })?;
            sample_by_class(records, n, field, value, rng)
        }
        SampleMode::Categories => Ok(sample_categories(records, n, rng)),
        SampleMode::Train => Err(ClassifierError::ValidationError(
            "Mode 'train' splits the dataset instead of sampling it".into(),
        )),
    }
}
