use crate::models::filter::{FilterConfiguration, OutputFormat, parse_keyword_list};
use serde::{Deserialize, Serialize};

/// Smallest preview size shown to the user.
pub const MIN_PREVIEW_COUNT: usize = 1;

/// Largest preview size shown to the user.
pub const MAX_PREVIEW_COUNT: usize = 10_000;

/// User settings loaded from `settings.yaml` and `MAILSIFT_*` environment variables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    pub filters: FilterSettings,
    pub preview: PreviewSettings,
    pub logging: LoggingSettings,
}

/// Default filter toggles, used when the command line does not override them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    pub remove_duplicates: bool,
    pub remove_invalid: bool,
    pub remove_single_char: bool,
    pub remove_numeric_start: bool,

    /// Comma-separated keyword list
    pub keywords: String,

    pub output_format: OutputFormat,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            remove_duplicates: true,
            remove_invalid: true,
            remove_single_char: false,
            remove_numeric_start: false,
            keywords: String::new(),
            output_format: OutputFormat::SameAsInput,
        }
    }
}

impl FilterSettings {
    pub fn to_filter_configuration(&self) -> FilterConfiguration {
        FilterConfiguration {
            remove_duplicates: self.remove_duplicates,
            remove_invalid: self.remove_invalid,
            remove_single_char_local: self.remove_single_char,
            remove_numeric_start_local: self.remove_numeric_start,
            keywords: parse_keyword_list(&self.keywords),
            output_format: self.output_format,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewSettings {
    pub enabled: bool,
    pub count: usize,
}

impl Default for PreviewSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            count: 100,
        }
    }
}

pub fn clamp_preview_count(count: usize) -> usize {
    count.clamp(MIN_PREVIEW_COUNT, MAX_PREVIEW_COUNT)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub directory: String,
    pub debug: bool,
    /// Write the log file as JSON lines
    pub json: bool,
    /// Mirror log output to stderr
    pub console: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: "logs".to_string(),
            debug: false,
            json: false,
            console: false,
        }
    }
}
