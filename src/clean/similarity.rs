//! Character-level sequence similarity for near-duplicate detection.

/// Similarity ratio between two strings in `0.0..=1.0`.
///
/// Computed as `2·LCS(a, b) / (|a| + |b|)` over characters: 1.0 for
/// identical strings, 0.0 for strings with nothing in common. Two empty
/// strings count as identical. Comparison is case-sensitive; callers
/// normalize beforehand.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let m = a_chars.len();
    let n = b_chars.len();

    if m == 0 && n == 0 {
        return 1.0;
    }
    if m == 0 || n == 0 {
        return 0.0;
    }

    // LCS length table, two rolling rows: only the length matters here,
    // not the alignment itself
    let mut prev = vec![0usize; n + 1];
    let mut curr = vec![0usize; n + 1];
    for i in 1..=m {
        for j in 1..=n {
            if a_chars[i - 1] == b_chars[j - 1] {
                curr[j] = prev[j - 1] + 1;
            } else {
                curr[j] = prev[j].max(curr[j - 1]);
            }
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    let lcs = prev[n];

    (2.0 * lcs as f64) / ((m + n) as f64)
}
