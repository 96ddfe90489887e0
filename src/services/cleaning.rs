use crate::models::{CleaningSummary, FilterConfiguration};
use regex::Regex;
use std::collections::HashSet;

/// Full-string shape check: `local@domain.tld` with no whitespace and a single `@`.
pub const VALID_EMAIL_PATTERN: &str = r"^[^@\s]+@[^@\s]+\.[^@\s]+$";

/// Output of a cleaning run: surviving emails in original order plus removal counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanResult {
    pub emails: Vec<String>,
    pub summary: CleaningSummary,
}

/// Service applying the removal rules to a candidate list
///
/// Rules run in a fixed order, each one over the survivors of the previous
/// step, and each counts only what it removes itself:
///
/// 1. trim and drop blanks
/// 2. invalid shape (`remove_invalid`)
/// 3. single-character local part (`remove_single_char_local`)
/// 4. local part starting with a digit (`remove_numeric_start_local`)
/// 5. keyword match (non-empty `keywords`)
/// 6. case-insensitive duplicates, first occurrence wins (`remove_duplicates`)
///
/// Every step is a stable filter, so relative order is preserved. There is no
/// failure mode: each candidate either passes or fails each predicate.
#[derive(Debug, Clone)]
pub struct CleaningService {
    /// Regex for the full-string validity check
    valid_pattern: Regex,
}

impl CleaningService {
    /// Create a new CleaningService with compiled regex patterns
    pub fn new() -> Self {
        Self {
            valid_pattern: Regex::new(VALID_EMAIL_PATTERN).expect("Invalid validity regex"),
        }
    }

    /// Run the pipeline over `candidates` with `config`.
    pub fn clean<S: AsRef<str>>(&self, candidates: &[S], config: &FilterConfiguration) -> CleanResult {
        let mut summary = CleaningSummary {
            original: candidates.len(),
            ..Default::default()
        };

        let mut emails: Vec<String> = candidates
            .iter()
            .map(|c| c.as_ref().trim())
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect();
        summary.removed_blank = summary.original - emails.len();

        if config.remove_invalid {
            summary.removed_invalid = retain_counting(&mut emails, |e| self.is_valid(e));
        }

        if config.remove_single_char_local {
            summary.removed_single_char =
                retain_counting(&mut emails, |e| !is_single_char_local(e));
        }

        if config.remove_numeric_start_local {
            summary.removed_numeric_start =
                retain_counting(&mut emails, |e| !is_numeric_start_local(e));
        }

        let keywords = lowercase_keywords(&config.keywords);
        if !keywords.is_empty() {
            summary.removed_keywords =
                retain_counting(&mut emails, |e| !contains_keyword(e, &keywords));
        }

        if config.remove_duplicates {
            let mut seen = HashSet::new();
            summary.removed_duplicates =
                retain_counting(&mut emails, |e| seen.insert(e.to_lowercase()));
        }

        summary.kept = emails.len();

        tracing::debug!(
            "Cleaned {} candidates - kept: {}, blank: {}, invalid: {}, single char: {}, numeric start: {}, keywords: {}, duplicates: {}",
            summary.original,
            summary.kept,
            summary.removed_blank,
            summary.removed_invalid,
            summary.removed_single_char,
            summary.removed_numeric_start,
            summary.removed_keywords,
            summary.removed_duplicates
        );

        CleanResult { emails, summary }
    }

    /// Whether `email` has the `local@domain.tld` shape.
    pub fn is_valid(&self, email: &str) -> bool {
        self.valid_pattern.is_match(email)
    }
}

impl Default for CleaningService {
    fn default() -> Self {
        Self::new()
    }
}

/// Text before the first `@`, or the whole string when there is none.
pub fn local_part(email: &str) -> &str {
    email.split_once('@').map_or(email, |(local, _)| local)
}

pub fn is_single_char_local(email: &str) -> bool {
    local_part(email).chars().count() == 1
}

pub fn is_numeric_start_local(email: &str) -> bool {
    local_part(email)
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit())
}

/// Case-insensitive substring match against already lower-cased keywords.
fn contains_keyword(email: &str, lowered_keywords: &[String]) -> bool {
    let email = email.to_lowercase();
    lowered_keywords.iter().any(|k| email.contains(k.as_str()))
}

fn lowercase_keywords(keywords: &[String]) -> Vec<String> {
    keywords
        .iter()
        .filter(|k| !k.is_empty())
        .map(|k| k.to_lowercase())
        .collect()
}

/// `Vec::retain` that reports how many items were dropped.
fn retain_counting<F>(emails: &mut Vec<String>, mut keep: F) -> usize
where
    F: FnMut(&str) -> bool,
{
    let before = emails.len();
    emails.retain(|e| keep(e));
    before - emails.len()
}
