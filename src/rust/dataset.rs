use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::info;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{ClassifierError, Result};
use crate::prompt::PromptTemplate;
use crate::record::Record;

/// Reads a JSON document from `path`.
pub fn load_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let value = serde_json::from_reader(BufReader::new(file))?;
    Ok(value)
}

/// Writes `value` to `path` as indented JSON.
pub fn save_json<T: Serialize + ?Sized>(value: &T, path: impl AsRef<Path>) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}

/// Loads the test dataset: a JSON array of record objects.
pub fn load_records(path: impl AsRef<Path>) -> Result<Vec<Record>> {
    let path = path.as_ref();
    let records: Vec<Record> = load_json(path)?;
    info!("Loaded {} records from {:?}", records.len(), path);
    Ok(records)
}

/// Reads a prompt file, trimming surrounding whitespace
pub fn load_prompt(path: impl AsRef<Path>) -> Result<String> {
    Ok(fs::read_to_string(path)?.trim().to_string())
}

/// Reads and parses a prompt template file
pub fn load_template(path: impl AsRef<Path>) -> Result<PromptTemplate> {
    let path = path.as_ref();
    PromptTemplate::new(load_prompt(path)?).map_err(|e| match e {
        ClassifierError::TemplateError(msg) => {
            ClassifierError::TemplateError(format!("{} (in {:?})", msg, path))
        }
        other => other,
    })
}

/// Default metrics path: `{input stem}_metrics.csv` in the working directory
pub fn default_metrics_path(test_data: impl AsRef<Path>) -> PathBuf {
    let stem = test_data
        .as_ref()
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "results".to_string());
    PathBuf::from(format!("{}_metrics.csv", stem))
}
