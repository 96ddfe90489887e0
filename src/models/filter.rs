use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Requested output encoding for a cleaning run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Csv,
    Txt,
    Xlsx,
    /// Resolved to the uploaded file's extension at export time
    #[default]
    #[serde(rename = "same")]
    SameAsInput,
}

/// An output format with "same as input" already resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedFormat {
    Csv,
    Txt,
    Xlsx,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown output format '{0}' (expected csv, txt, xlsx or same)")]
pub struct ParseFormatError(pub String);

impl FromStr for OutputFormat {
    type Err = ParseFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "txt" => Ok(Self::Txt),
            "xlsx" => Ok(Self::Xlsx),
            "same" => Ok(Self::SameAsInput),
            _ => Err(ParseFormatError(s.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Csv => "csv",
            Self::Txt => "txt",
            Self::Xlsx => "xlsx",
            Self::SameAsInput => "same",
        };
        f.write_str(name)
    }
}

impl OutputFormat {
    /// Resolve against the uploaded file's extension.
    ///
    /// Extensions other than csv, txt and xlsx fall back to csv.
    pub fn resolve(self, input_extension: &str) -> ResolvedFormat {
        match self {
            Self::Csv => ResolvedFormat::Csv,
            Self::Txt => ResolvedFormat::Txt,
            Self::Xlsx => ResolvedFormat::Xlsx,
            Self::SameAsInput => match input_extension.to_ascii_lowercase().as_str() {
                "txt" => ResolvedFormat::Txt,
                "xlsx" => ResolvedFormat::Xlsx,
                _ => ResolvedFormat::Csv,
            },
        }
    }
}

impl ResolvedFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Txt => "txt",
            Self::Xlsx => "xlsx",
        }
    }

    pub fn media_type(self) -> &'static str {
        match self {
            Self::Csv => "text/csv",
            Self::Txt => "text/plain",
            Self::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        }
    }
}

/// Immutable settings for one cleaning run.
///
/// Built once from user input before the run starts and never mutated while
/// the pipeline executes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterConfiguration {
    pub remove_duplicates: bool,
    pub remove_invalid: bool,
    pub remove_single_char_local: bool,
    pub remove_numeric_start_local: bool,
    pub keywords: Vec<String>,
    pub output_format: OutputFormat,
}

/// Split a comma-separated keyword list, trimming pieces and dropping empties.
pub fn parse_keyword_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

/// Per-rule removal counts for one cleaning run.
///
/// Every removed candidate is attributed to exactly one rule, the first one in
/// pipeline order that rejected it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleaningSummary {
    pub original: usize,
    pub kept: usize,
    /// Empty or whitespace-only candidates dropped by the trim step
    pub removed_blank: usize,
    pub removed_invalid: usize,
    pub removed_single_char: usize,
    pub removed_numeric_start: usize,
    pub removed_duplicates: usize,
    pub removed_keywords: usize,
}

impl CleaningSummary {
    /// Total removed by the filter rules, excluding the trim step.
    pub fn removed_by_rules(&self) -> usize {
        self.removed_invalid
            + self.removed_single_char
            + self.removed_numeric_start
            + self.removed_duplicates
            + self.removed_keywords
    }

    /// Total removed by every step including the trim step.
    pub fn total_removed(&self) -> usize {
        self.removed_blank + self.removed_by_rules()
    }

    /// Short human-readable description of what was removed.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();

        if self.removed_invalid > 0 {
            parts.push(format!("{} invalid", self.removed_invalid));
        }
        if self.removed_single_char > 0 {
            parts.push(format!("{} single char", self.removed_single_char));
        }
        if self.removed_numeric_start > 0 {
            parts.push(format!("{} numeric start", self.removed_numeric_start));
        }
        if self.removed_keywords > 0 {
            parts.push(format!("{} by keywords", self.removed_keywords));
        }
        if self.removed_duplicates > 0 {
            parts.push(format!("{} duplicates", self.removed_duplicates));
        }

        if parts.is_empty() {
            "Nothing removed".to_string()
        } else {
            format!("Removed {}", parts.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_output_format() {
        assert_eq!("csv".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);
        assert_eq!("TXT".parse::<OutputFormat>().unwrap(), OutputFormat::Txt);
        assert_eq!("xlsx".parse::<OutputFormat>().unwrap(), OutputFormat::Xlsx);
        assert_eq!(
            "same".parse::<OutputFormat>().unwrap(),
            OutputFormat::SameAsInput
        );
        assert!("pdf".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_resolve_same_as_input() {
        assert_eq!(OutputFormat::SameAsInput.resolve("txt"), ResolvedFormat::Txt);
        assert_eq!(OutputFormat::SameAsInput.resolve("XLSX"), ResolvedFormat::Xlsx);
        assert_eq!(OutputFormat::SameAsInput.resolve("csv"), ResolvedFormat::Csv);
        // .log uploads have no matching export kind
        assert_eq!(OutputFormat::SameAsInput.resolve("log"), ResolvedFormat::Csv);
        assert_eq!(OutputFormat::Txt.resolve("xlsx"), ResolvedFormat::Txt);
    }

    #[test]
    fn test_parse_keyword_list() {
        assert_eq!(
            parse_keyword_list(" spam, test ,,noreply "),
            vec!["spam", "test", "noreply"]
        );
        assert!(parse_keyword_list("  ,  ").is_empty());
    }

    #[test]
    fn test_summary_describe() {
        let summary = CleaningSummary {
            original: 10,
            kept: 6,
            removed_invalid: 1,
            removed_duplicates: 3,
            ..Default::default()
        };
        assert_eq!(summary.removed_by_rules(), 4);
        assert_eq!(summary.describe(), "Removed 1 invalid, 3 duplicates");
        assert_eq!(CleaningSummary::default().describe(), "Nothing removed");
    }

    #[test]
    fn test_output_format_serde_names() {
        let yaml = serde_yaml_ng::to_string(&OutputFormat::SameAsInput).unwrap();
        assert_eq!(yaml.trim(), "same");
        let parsed: OutputFormat = serde_yaml_ng::from_str("xlsx").unwrap();
        assert_eq!(parsed, OutputFormat::Xlsx);
    }
}
