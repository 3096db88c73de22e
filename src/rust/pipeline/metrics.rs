use serde::Serialize;

/// Run-wide scores over every record that carried a ground-truth label.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AggregateMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

impl AggregateMetrics {
    /// The four rates in report order
    pub fn entries(&self) -> [(&'static str, f64); 4] {
        [
            ("accuracy", self.accuracy),
            ("precision", self.precision),
            ("recall", self.recall),
            ("f1", self.f1),
        ]
    }
}

/// Collects normalized (actual, predicted) label pairs in record order.
#[derive(Debug, Clone, Default)]
pub struct MetricsAggregator {
    actual: Vec<String>,
    predicted: Vec<String>,
}

impl MetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one pair; both labels are expected to be normalized already
    pub fn record(&mut self, actual: String, predicted: String) {
        self.actual.push(actual);
        self.predicted.push(predicted);
    }

    pub fn len(&self) -> usize {
        self.actual.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actual.is_empty()
    }

    /// Computes the summary, or `None` if no pair was recorded.
    ///
    /// Every disagreement is counted both as a false positive and as a false
    /// negative, so precision, recall and F1 always equal accuracy.
    pub fn summary(&self) -> Option<AggregateMetrics> {
        if self.is_empty() {
            return None;
        }

        let pairs = || self.actual.iter().zip(&self.predicted);
        let tp = pairs().filter(|(a, p)| a == p).count() as f64;
        let fp = pairs().filter(|(a, p)| a != p).count() as f64;
        let fn_ = pairs().filter(|(a, p)| a != p).count() as f64;

        let precision = if tp + fp > 0.0 { tp / (tp + fp) } else { 0.0 };
        let recall = if tp + fn_ > 0.0 { tp / (tp + fn_) } else { 0.0 };
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        let accuracy = tp / self.len() as f64;

        Some(AggregateMetrics {
            accuracy,
            precision,
            recall,
            f1,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aggregate(pairs: &[(&str, &str)]) -> MetricsAggregator {
        let mut agg = MetricsAggregator::new();
        for (a, p) in pairs {
            agg.record(a.to_string(), p.to_string());
        }
        agg
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-12, "{} != {}", a, b);
    }

    #[test]
    fn test_empty_has_no_summary() {
        assert!(MetricsAggregator::new().summary().is_none());
    }

    #[test]
    fn test_half_correct() {
        let m = aggregate(&[("biology", "biology"), ("biology", "chemistry")]).summary().unwrap();
        assert_close(m.accuracy, 0.5);
        assert_close(m.precision, 0.5);
        assert_close(m.recall, 0.5);
        assert_close(m.f1, 0.5);
    }

    #[test]
    fn test_rates_collapse_to_accuracy() {
        let m = aggregate(&[
            ("physics", "physics"),
            ("biology", "physics"),
            ("chemistry", "chemistry"),
            ("history", "arts"),
            ("law", "law"),
        ])
        .summary()
        .unwrap();
        assert_close(m.accuracy, 0.6);
        assert_close(m.precision, m.accuracy);
        assert_close(m.recall, m.accuracy);
        assert_close(m.f1, m.accuracy);
    }

    #[test]
    fn test_all_wrong_and_all_right() {
        let m = aggregate(&[("a", "b"), ("c", "d")]).summary().unwrap();
        assert_eq!(m.entries().map(|(_, v)| v), [0.0; 4]);

        let m = aggregate(&[("a", "a")]).summary().unwrap();
        assert_eq!(m.entries().map(|(_, v)| v), [1.0; 4]);
    }

    #[test]
    fn test_entry_order() {
        let m = aggregate(&[("a", "a")]).summary().unwrap();
        let names: Vec<_> = m.entries().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, ["accuracy", "precision", "recall", "f1"]);
    }
}
