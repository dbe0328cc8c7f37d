//! Edit-distance similarity in `[0, 1]`.

use strsim::levenshtein;

/// Normalized Levenshtein similarity: `(max_len - distance) / max_len`,
/// measured in chars after case-folding and trimming both inputs.
///
/// Two empty inputs score 1.0; exactly one empty input scores 0.0.
/// O(len(a) * len(b)); this is the hot path of a run.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();

    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let distance = levenshtein(&a, &b);
    (max_len - distance) as f64 / max_len as f64
}
