use regex::Regex;
use std::borrow::Cow;

/// Liberal email pattern: `local@domain.tld` with a letters-only TLD of two or more.
pub const EMAIL_PATTERN: &str = r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}";

const BYTE_ORDER_MARK: char = '\u{FEFF}';

/// Extracts email-shaped substrings from arbitrary text.
///
/// Matching is case-preserving and non-overlapping, scanning left to right.
/// The tokenizer holds nothing but its compiled pattern, so one instance can be
/// shared freely and reused across runs.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    email_pattern: Regex,
}

impl Tokenizer {
    pub fn new() -> Self {
        Self {
            email_pattern: Regex::new(EMAIL_PATTERN).expect("Invalid email regex"),
        }
    }

    /// Return every email-shaped match in `text`, in order of appearance.
    pub fn extract(&self, text: &str) -> Vec<String> {
        let normalized = normalize_text(text);

        self.email_pattern
            .find_iter(&normalized)
            .map(|m| m.as_str().trim().to_string())
            .collect()
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Strip a leading byte-order mark and fold `\r\n` and `\r` into `\n`.
pub fn normalize_text(text: &str) -> Cow<'_, str> {
    let text = text.strip_prefix(BYTE_ORDER_MARK).unwrap_or(text);

    if !text.contains('\r') {
        return Cow::Borrowed(text);
    }

    Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
}
