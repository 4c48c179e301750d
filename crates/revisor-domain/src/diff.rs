//! Word-level diff between original and proposed text
//!
//! Both strings are tokenized into alternating runs of whitespace and
//! non-whitespace, then walked with two cursors. On a mismatch, each side looks
//! ahead up to [`LOOKAHEAD`] tokens in the other sequence for its current
//! token; the side that finds it sooner "caught up" and the skipped tokens on
//! the other side are emitted as added or removed. With no match in the window
//! the pair is treated as a direct substitution.
//!
//! This is a heuristic, not a longest-common-subsequence diff: repeated words
//! inside the window can be mis-attributed. The contract callers rely on is
//! reconstruction: `same + removed` segments in order rebuild the original, and
//! `same + added` segments in order rebuild the proposal.

/// How far each side looks ahead for a resynchronization point
pub const LOOKAHEAD: usize = 5;

/// Kind of a diff segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiffKind {
    /// Present in both texts
    Same,
    /// Present only in the original
    Removed,
    /// Present only in the proposal
    Added,
}

/// A run of text with a single diff kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffSegment {
    /// Segment kind
    pub kind: DiffKind,
    /// Segment text
    pub text: String,
}

impl DiffSegment {
    fn new(kind: DiffKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// Compute the word-level diff of `original` against `proposed`
///
/// # Examples
///
/// ```
/// use revisor_domain::diff::{diff, DiffKind};
///
/// let segments = diff("begin February 15", "begin March 1");
/// assert_eq!(segments[0].kind, DiffKind::Same);
/// assert_eq!(segments[0].text, "begin ");
/// ```
pub fn diff(original: &str, proposed: &str) -> Vec<DiffSegment> {
    if original == proposed {
        return vec![DiffSegment::new(DiffKind::Same, original)];
    }

    let a = tokenize(original);
    let b = tokenize(proposed);
    let mut out: Vec<DiffSegment> = Vec::new();
    let (mut i, mut j) = (0, 0);

    while i < a.len() && j < b.len() {
        if a[i] == b[j] {
            push(&mut out, DiffKind::Same, a[i]);
            i += 1;
            j += 1;
            continue;
        }

        // Distance at which the other side reappears on each stream
        let found_in_b = (1..=LOOKAHEAD).find(|&k| j + k < b.len() && b[j + k] == a[i]);
        let found_in_a = (1..=LOOKAHEAD).find(|&k| i + k < a.len() && a[i + k] == b[j]);

        match (found_in_b, found_in_a) {
            (Some(kb), Some(ka)) if kb <= ka => {
                extend(&mut out, DiffKind::Added, &b[j..j + kb]);
                j += kb;
            }
            (Some(kb), None) => {
                extend(&mut out, DiffKind::Added, &b[j..j + kb]);
                j += kb;
            }
            (_, Some(ka)) => {
                extend(&mut out, DiffKind::Removed, &a[i..i + ka]);
                i += ka;
            }
            (None, None) => {
                push(&mut out, DiffKind::Removed, a[i]);
                push(&mut out, DiffKind::Added, b[j]);
                i += 1;
                j += 1;
            }
        }
    }

    extend(&mut out, DiffKind::Removed, &a[i..]);
    extend(&mut out, DiffKind::Added, &b[j..]);
    out
}

/// Split text into alternating whitespace and non-whitespace runs
fn tokenize(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut in_space: Option<bool> = None;

    for (idx, ch) in text.char_indices() {
        let space = ch.is_whitespace();
        match in_space {
            Some(prev) if prev != space => {
                tokens.push(&text[start..idx]);
                start = idx;
            }
            _ => {}
        }
        in_space = Some(space);
    }
    if start < text.len() {
        tokens.push(&text[start..]);
    }
    tokens
}

/// Append a token, merging into the last segment when the kind matches
fn push(out: &mut Vec<DiffSegment>, kind: DiffKind, token: &str) {
    match out.last_mut() {
        Some(last) if last.kind == kind => last.text.push_str(token),
        _ => out.push(DiffSegment::new(kind, token)),
    }
}

fn extend(out: &mut Vec<DiffSegment>, kind: DiffKind, tokens: &[&str]) {
    for token in tokens {
        push(out, kind, token);
    }
}

/// Rebuild the original text from a diff
pub fn original_side(segments: &[DiffSegment]) -> String {
    segments
        .iter()
        .filter(|s| s.kind != DiffKind::Added)
        .map(|s| s.text.as_str())
        .collect()
}

/// Rebuild the proposed text from a diff
pub fn proposed_side(segments: &[DiffSegment]) -> String {
    segments
        .iter()
        .filter(|s| s.kind != DiffKind::Removed)
        .map(|s| s.text.as_str())
        .collect()
}

/// Number of characters a diff changes
///
/// Between two `Same` segments, a removed run and an added run overlap as a
/// substitution, so each edit region counts the larger of the two.
pub fn changed_chars(segments: &[DiffSegment]) -> usize {
    let mut total = 0;
    let (mut removed, mut added) = (0, 0);

    for segment in segments {
        match segment.kind {
            DiffKind::Same => {
                total += removed.max(added);
                removed = 0;
                added = 0;
            }
            DiffKind::Removed => removed += segment.text.chars().count(),
            DiffKind::Added => added += segment.text.chars().count(),
        }
    }
    total + removed.max(added)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(segments: &[DiffSegment]) -> Vec<(DiffKind, &str)> {
        segments.iter().map(|s| (s.kind, s.text.as_str())).collect()
    }

    #[test]
    fn test_tokenize_preserves_whitespace() {
        assert_eq!(tokenize("a  b\tc"), vec!["a", "  ", "b", "\t", "c"]);
        assert_eq!(tokenize("  lead"), vec!["  ", "lead"]);
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn test_identical_is_single_same() {
        let d = diff("rollout will begin", "rollout will begin");
        assert_eq!(kinds(&d), vec![(DiffKind::Same, "rollout will begin")]);
    }

    #[test]
    fn test_substitution() {
        let d = diff("rollout will begin February 15", "rollout will begin March 1");
        assert_eq!(
            kinds(&d),
            vec![
                (DiffKind::Same, "rollout will begin "),
                (DiffKind::Removed, "February"),
                (DiffKind::Added, "March"),
                (DiffKind::Same, " "),
                (DiffKind::Removed, "15"),
                (DiffKind::Added, "1"),
            ]
        );
    }

    #[test]
    fn test_insertion_caught_up() {
        let d = diff("the plan ships", "the revised plan ships");
        assert_eq!(
            kinds(&d),
            vec![
                (DiffKind::Same, "the "),
                (DiffKind::Added, "revised "),
                (DiffKind::Same, "plan ships"),
            ]
        );
    }

    #[test]
    fn test_deletion_caught_up() {
        let d = diff("the old plan ships", "the plan ships");
        assert_eq!(
            kinds(&d),
            vec![
                (DiffKind::Same, "the "),
                (DiffKind::Removed, "old "),
                (DiffKind::Same, "plan ships"),
            ]
        );
    }

    #[test]
    fn test_tail_flush() {
        let d = diff("keep", "keep this too");
        assert_eq!(
            kinds(&d),
            vec![(DiffKind::Same, "keep"), (DiffKind::Added, " this too")]
        );

        let d = diff("", "new");
        assert_eq!(kinds(&d), vec![(DiffKind::Added, "new")]);
    }

    #[test]
    fn test_reconstruction() {
        let a = "one two three four five six";
        let b = "one 2 three five six seven";
        let d = diff(a, b);
        assert_eq!(original_side(&d), a);
        assert_eq!(proposed_side(&d), b);
    }

    #[test]
    fn test_changed_chars() {
        let d = diff("begin February 15", "begin March 1");
        // "February"→"March" counts 8, "15"→"1" counts 2
        assert_eq!(changed_chars(&d), 10);
        assert_eq!(changed_chars(&diff("same", "same")), 0);
    }
}
