use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use csv::{Terminator, WriterBuilder};
use log::info;

use crate::error::Result;
use crate::pipeline::AggregateMetrics;

/// Capitalizes a metric key for display (`accuracy` -> `Accuracy`, `f1` -> `F1`)
pub fn metric_title(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Writes the two-column `Metric,Value` table with 4-decimal values and
/// CRLF line endings.
pub fn write_metrics<W: Write>(metrics: &AggregateMetrics, writer: W) -> Result<()> {
    let mut csv = WriterBuilder::new().terminator(Terminator::CRLF).from_writer(writer);
    csv.write_record(["Metric", "Value"])?;
    for (name, value) in metrics.entries() {
        csv.write_record([metric_title(name), format!("{:.4}", value)])?;
    }
    csv.flush()?;
    Ok(())
}

/// Writes the metrics report to `path`
pub fn write_metrics_csv(metrics: &AggregateMetrics, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    write_metrics(metrics, BufWriter::new(File::create(path)?))?;
    info!("Metrics saved to {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_title() {
        assert_eq!(metric_title("accuracy"), "Accuracy");
        assert_eq!(metric_title("f1"), "F1");
        assert_eq!(metric_title(""), "");
    }

    #[test]
    fn test_write_metrics() -> Result<()> {
        let metrics = AggregateMetrics {
            accuracy: 0.5,
            precision: 0.5,
            recall: 0.5,
            f1: 0.5,
        };
        let mut out = Vec::new();
        write_metrics(&metrics, &mut out)?;
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Metric,Value\r\nAccuracy,0.5000\r\nPrecision,0.5000\r\nRecall,0.5000\r\nF1,0.5000\r\n"
        );
        Ok(())
    }

    #[test]
    fn test_rounding() -> Result<()> {
        let metrics = AggregateMetrics {
            accuracy: 2.0 / 3.0,
            precision: 2.0 / 3.0,
            recall: 2.0 / 3.0,
            f1: 2.0 / 3.0,
        };
        let mut out = Vec::new();
        write_metrics(&metrics, &mut out)?;
        assert!(String::from_utf8(out).unwrap().contains("Accuracy,0.6667\r\n"));
        Ok(())
    }
}
