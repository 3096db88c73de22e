use std::collections::HashMap;
use std::fmt;
use std::io::Write;

use csv::{Terminator, WriterBuilder};
use serde::Serialize;
use serde_json::Value;

use super::{RawRecord, MAIN_CLASS, SUB_CLASS};
use crate::error::Result;

/// Occurrence counts that remember first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderedCounts {
    entries: Vec<(String, usize)>,
    index: HashMap<String, usize>,
}

impl OrderedCounts {
    pub fn add(&mut self, key: &str, n: usize) {
        match self.index.get(key) {
            Some(&i) => self.entries[i].1 += n,
            None => {
                self.index.insert(key.to_string(), self.entries.len());
                self.entries.push((key.to_string(), n));
            }
        }
    }

    pub fn get(&self, key: &str) -> usize {
        self.index.get(key).map_or(0, |&i| self.entries[i].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|(k, n)| (k.as_str(), *n))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, n)| n).sum()
    }

    /// Highest count; ties go to the key seen first
    pub fn most_common(&self) -> Option<(&str, usize)> {
        self.iter().fold(None, |best, (k, n)| match best {
            Some((_, b)) if b >= n => best,
            _ => Some((k, n)),
        })
    }

    /// Lowest count; ties go to the key seen last
    pub fn least_common(&self) -> Option<(&str, usize)> {
        self.iter().fold(None, |best, (k, n)| match best {
            Some((_, b)) if b < n => best,
            _ => Some((k, n)),
        })
    }
}

/// Main-class counts with the sub-class counts nested under each.
#[derive(Debug, Clone, Default)]
pub struct ClassDistribution {
    pub main_classes: OrderedCounts,
    pub sub_classes: HashMap<String, OrderedCounts>,
}

fn non_empty_str<'a>(record: &'a RawRecord, key: &str) -> Option<&'a str> {
    match record.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.as_str()),
        _ => None,
    }
}

impl ClassDistribution {
    /// Counts `main-class` values and, under each, the `sub-class` values.
    /// Records without a main class are ignored.
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a RawRecord>) -> Self {
        let mut dist = Self::default();
        for record in records {
            let Some(main) = non_empty_str(record, MAIN_CLASS) else {
                continue;
            };
            dist.main_classes.add(main, 1);
            if let Some(sub) = non_empty_str(record, SUB_CLASS) {
                dist.sub_classes.entry(main.to_string()).or_default().add(sub, 1);
            }
        }
        dist
    }

    /// Sub-class totals across all main classes, in first-seen order
    pub fn sub_class_totals(&self) -> OrderedCounts {
        let mut totals = OrderedCounts::default();
        for (main, _) in self.main_classes.iter() {
            if let Some(subs) = self.sub_classes.get(main) {
                for (sub, n) in subs.iter() {
                    totals.add(sub, n);
                }
            }
        }
        totals
    }

    pub fn summary(&self) -> SummaryStatistics {
        let subs = self.sub_class_totals();
        fn owned(entry: Option<(&str, usize)>) -> Option<(String, usize)> {
            entry.map(|(k, n)| (k.to_string(), n))
        }
        SummaryStatistics {
            total_entries: self.main_classes.total(),
            unique_main_classes: self.main_classes.len(),
            unique_sub_classes: subs.len(),
            most_common_main_class: owned(self.main_classes.most_common()),
            most_common_sub_class: owned(subs.most_common()),
            least_common_main_class: owned(self.main_classes.least_common()),
            least_common_sub_class: owned(subs.least_common()),
        }
    }

    /// Writes `main-class,sub-class,count`: one row per main class followed
    /// by its sub-class rows. Lines end in CRLF.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv = WriterBuilder::new().terminator(Terminator::CRLF).from_writer(writer);
        csv.write_record(["main-class", "sub-class", "count"])?;
        for (main, count) in self.main_classes.iter() {
            csv.write_record([main, "", count.to_string().as_str()])?;
            if let Some(subs) = self.sub_classes.get(main) {
                for (sub, n) in subs.iter() {
                    csv.write_record([main, sub, n.to_string().as_str()])?;
                }
            }
        }
        csv.flush()?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStatistics {
    pub total_entries: usize,
    pub unique_main_classes: usize,
    pub unique_sub_classes: usize,
    pub most_common_main_class: Option<(String, usize)>,
    pub most_common_sub_class: Option<(String, usize)>,
    pub least_common_main_class: Option<(String, usize)>,
    pub least_common_sub_class: Option<(String, usize)>,
}

impl fmt::Display for SummaryStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Summary Statistics:")?;
        writeln!(f, "Total entries: {}", self.total_entries)?;
        writeln!(f, "Unique main classes: {}", self.unique_main_classes)?;
        write!(f, "Unique sub-classes: {}", self.unique_sub_classes)?;
        let rows = [
            ("Most common main class", &self.most_common_main_class),
            ("Most common sub-class", &self.most_common_sub_class),
            ("Least common main class", &self.least_common_main_class),
            ("Least common sub-class", &self.least_common_sub_class),
        ];
        for (label, entry) in rows {
            if let Some((name, n)) = entry {
                write!(f, "\n{}: {} ({} occurrences)", label, name, n)?;
            }
        }
        Ok(())
    }
}
