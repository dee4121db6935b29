use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MatchQuality {
    Exact,
    /// Minor typo or transposition within the tolerance.
    Close,
    Incorrect,
}

impl MatchQuality {
    pub fn is_match(&self) -> bool {
        !matches!(self, MatchQuality::Incorrect)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckResult {
    pub match_quality: MatchQuality,
    pub normalized_submitted: String,
    pub normalized_expected: String,
}

/// Classifies a submitted answer against the expected one. Stateless apart
/// from its configuration; whether a `Close` match counts as a scheduling
/// success is the caller's policy, not decided here.
#[derive(Clone, Debug)]
pub struct AnswerChecker {
    pub case_sensitive: bool,
    pub typo_tolerance: usize,
}

impl Default for AnswerChecker {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            typo_tolerance: 1,
        }
    }
}

impl AnswerChecker {
    pub fn new(case_sensitive: bool, typo_tolerance: usize) -> Self {
        Self {
            case_sensitive,
            typo_tolerance,
        }
    }

    /// Multiple-choice mode: normalized equality only, never `Close`.
    pub fn check_exact(&self, submitted: &str, expected: &str) -> CheckResult {
        let normalized_submitted = self.normalize(submitted);
        let normalized_expected = self.normalize(expected);
        let match_quality = if normalized_submitted == normalized_expected {
            MatchQuality::Exact
        } else {
            MatchQuality::Incorrect
        };
        CheckResult {
            match_quality,
            normalized_submitted,
            normalized_expected,
        }
    }

    /// Free-text mode: equality, then edit distance within the typo
    /// tolerance, then slash alternatives ("the/a house").
    pub fn check_fuzzy(&self, submitted: &str, expected: &str) -> CheckResult {
        let normalized_submitted = self.normalize(submitted);
        let normalized_expected = self.normalize(expected);

        let match_quality = if normalized_submitted == normalized_expected {
            MatchQuality::Exact
        } else if edit_distance(&normalized_submitted, &normalized_expected)
            <= self.typo_tolerance
        {
            MatchQuality::Close
        } else if self.matches_alternative(&normalized_submitted, expected) {
            MatchQuality::Exact
        } else {
            MatchQuality::Incorrect
        };

        CheckResult {
            match_quality,
            normalized_submitted,
            normalized_expected,
        }
    }

    /// Collapse whitespace, NFC-normalize, fold case unless configured
    /// otherwise, strip one trailing sentence mark.
    fn normalize(&self, text: &str) -> String {
        let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
        let mut s: String = collapsed.nfc().collect();
        if !self.case_sensitive {
            s = s.to_lowercase();
        }
        if s.ends_with(['.', '!', '?']) {
            s.pop();
        }
        s
    }

    /// An expected answer like "the/a house" also accepts the forms with the
    /// slash read as a space or removed.
    fn matches_alternative(&self, submitted: &str, expected: &str) -> bool {
        if !expected.contains('/') {
            return false;
        }
        [expected.replace('/', " "), expected.replace('/', "")]
            .iter()
            .any(|alt| submitted == self.normalize(alt))
    }
}

/// Optimal string alignment distance: insertions, deletions, substitutions,
/// and adjacent transpositions each count as one edit. Transpositions matter
/// so that a swapped letter pair stays within the default tolerance.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (m, n) = (a.len(), b.len());
    if m == 0 {
        return n;
    }
    if n == 0 {
        return m;
    }

    let mut prev_prev = vec![0usize; n + 1];
    let mut prev: Vec<usize> = (0..=n).collect();
    let mut curr = vec![0usize; n + 1];

    for i in 1..=m {
        curr[0] = i;
        for j in 1..=n {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            curr[j] = (prev[j] + 1)
                .min(curr[j - 1] + 1)
                .min(prev[j - 1] + cost);
            if i > 1 && j > 1 && a[i - 1] == b[j - 2] && a[i - 2] == b[j - 1] {
                curr[j] = curr[j].min(prev_prev[j - 2] + 1);
            }
        }
        std::mem::swap(&mut prev_prev, &mut prev);
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}
