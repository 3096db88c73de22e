/// Canonicalizes a label for equality comparison.
///
/// Drops every character that is not alphanumeric, whitespace or `_`,
/// lowercases the rest, collapses whitespace runs to a single space and trims
/// the ends. Predicted and ground-truth labels both go through this so that
/// case and punctuation never cause a mismatch.
///
/// # Example
/// ```
/// use fos_classifier::normalize_label;
///
/// assert_eq!(normalize_label("  Earth & Environmental Sciences! "), "earth environmental sciences");
/// assert_eq!(normalize_label("AI, & Robotics!"), normalize_label("ai robotics"));
/// ```
pub fn normalize_label(label: &str) -> String {
    let kept: String = label
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '_')
        .flat_map(char::to_lowercase)
        .collect();

    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Returns true when two labels are equal after normalization.
pub fn labels_match(predicted: &str, actual: &str) -> bool {
    normalize_label(predicted) == normalize_label(actual)
}
