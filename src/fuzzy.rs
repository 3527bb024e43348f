//! Fuzzy string matching for wake words and commands
//!
//! Similarity is the Ratcliff/Obershelp ratio: twice the number of
//! characters in common matching blocks over the total length of both
//! strings. 1.0 means identical, 0.0 means nothing in common.

/// Similarity ratio between two strings in [0.0, 1.0].
///
/// Two empty strings are considered identical.
pub fn ratio(a: &str, b: &str) -> f32 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let matched = matching_chars(&a, &b);
    2.0 * matched as f32 / total as f32
}

/// Characters covered by recursively taking the longest common block.
fn matching_chars(a: &[char], b: &[char]) -> usize {
    let (ai, bi, len) = longest_block(a, b);
    if len == 0 {
        return 0;
    }
    len + matching_chars(&a[..ai], &b[..bi])
        + matching_chars(&a[ai + len..], &b[bi + len..])
}

/// Longest common contiguous block. Ties resolve to the earliest
/// position in `a`, then in `b`.
fn longest_block(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);
    let mut prev = vec![0usize; b.len() + 1];
    for i in 0..a.len() {
        let mut cur = vec![0usize; b.len() + 1];
        for j in 0..b.len() {
            if a[i] == b[j] {
                let len = prev[j] + 1;
                cur[j + 1] = len;
                if len > best.2 {
                    best = (i + 1 - len, j + 1 - len, len);
                }
            }
        }
        prev = cur;
    }
    best
}

/// Clean a token for matching: keep only alphanumeric characters.
///
/// Recognizers attach punctuation to tokens ("¿hola," vs "hola"), which
/// would drag the ratio down.
pub fn clean_token(token: &str) -> String {
    token.chars().filter(|c| c.is_alphanumeric()).collect()
}
