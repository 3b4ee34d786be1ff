//! Rendering lint results.
//!
//! This module provides reporters for printing lint results in various
//! formats: colored text for terminals, JSON and Markdown.

pub mod json;
pub mod markdown;
pub mod text;

use crate::lint::{LintResult, Message, Severity};
use crate::parser::PackageJson;
use std::io::{self, Write};

/// Report format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    /// Human-readable text grouped by severity
    #[default]
    Text,
    /// JSON format - machine-readable, full data
    Json,
    /// Markdown format - for CI comments and docs
    Markdown,
}

impl std::str::FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            "markdown" | "md" => Ok(ReportFormat::Markdown),
            _ => Err(format!(
                "Unknown report format: '{}'. Valid formats: text, json, markdown",
                s
            )),
        }
    }
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportFormat::Text => write!(f, "text"),
            ReportFormat::Json => write!(f, "json"),
            ReportFormat::Markdown => write!(f, "markdown"),
        }
    }
}

/// Everything a reporter needs about one linted package.
#[derive(Debug, Clone)]
pub struct ReportData {
    /// Package name, or the directory when the manifest has none
    pub package_name: String,
    /// Package version, if declared
    pub package_version: Option<String>,
    /// Diagnostics after filtering and sorting
    pub messages: Vec<Message>,
}

impl ReportData {
    pub fn new(package_name: String, package_version: Option<String>, result: LintResult) -> Self {
        Self {
            package_name,
            package_version,
            messages: result.messages,
        }
    }

    /// Builds report data from a manifest, falling back to `fallback_name`.
    pub fn for_package(pkg: Option<&PackageJson>, fallback_name: &str, result: LintResult) -> Self {
        Self::new(
            pkg.and_then(|p| p.name())
                .unwrap_or(fallback_name)
                .to_string(),
            pkg.and_then(|p| p.version()).map(str::to_string),
            result,
        )
    }

    /// Diagnostics of one severity, in report order.
    pub fn by_severity(&self, severity: Severity) -> Vec<&Message> {
        self.messages
            .iter()
            .filter(|m| m.severity == severity)
            .collect()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.messages
            .iter()
            .filter(|m| m.severity == severity)
            .count()
    }

    /// `name@version`, or just the name.
    pub fn title(&self) -> String {
        match &self.package_version {
            Some(version) => format!("{}@{}", self.package_name, version),
            None => self.package_name.clone(),
        }
    }
}

/// Trait for reporters.
pub trait Reporter {
    /// Write the report to the given writer.
    fn report<W: Write>(&self, data: &ReportData, writer: &mut W) -> io::Result<()>;
}

/// Report data in the specified format.
pub fn report<W: Write>(
    format: ReportFormat,
    data: &ReportData,
    color: bool,
    writer: &mut W,
) -> io::Result<()> {
    match format {
        ReportFormat::Text => text::TextReporter { color }.report(data, writer),
        ReportFormat::Json => json::JsonReporter.report(data, writer),
        ReportFormat::Markdown => markdown::MarkdownReporter.report(data, writer),
    }
}

/// Report data to a string.
pub fn report_to_string(format: ReportFormat, data: &ReportData) -> io::Result<String> {
    let mut buffer = Vec::new();
    report(format, data, false, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::lint::MessageCode;

    pub(crate) fn create_test_data() -> ReportData {
        let messages = vec![
            Message::new(MessageCode::UseType, Severity::Suggestion, vec!["name".to_string()]),
            Message::new(
                MessageCode::FileDoesNotExist,
                Severity::Error,
                vec!["main".to_string()],
            ),
            Message::new(
                MessageCode::ExportsGlobNoMatchedFiles,
                Severity::Warning,
                vec!["exports".to_string(), "./*".to_string()],
            ),
        ];
        ReportData::new(
            "test-package".to_string(),
            Some("1.0.0".to_string()),
            LintResult { messages },
        )
    }

    #[test]
    fn test_report_format_from_str() {
        assert_eq!("text".parse::<ReportFormat>().unwrap(), ReportFormat::Text);
        assert_eq!("JSON".parse::<ReportFormat>().unwrap(), ReportFormat::Json);
        assert_eq!(
            "md".parse::<ReportFormat>().unwrap(),
            ReportFormat::Markdown
        );
        assert!("csv".parse::<ReportFormat>().is_err());
    }

    #[test]
    fn test_report_format_display() {
        assert_eq!(format!("{}", ReportFormat::Text), "text");
        assert_eq!(format!("{}", ReportFormat::Markdown), "markdown");
    }

    #[test]
    fn test_report_data_counts() {
        let data = create_test_data();
        assert_eq!(data.count(Severity::Error), 1);
        assert_eq!(data.by_severity(Severity::Warning).len(), 1);
        assert_eq!(data.title(), "test-package@1.0.0");
    }

    #[test]
    fn test_report_to_string_dispatches_on_format() {
        let data = create_test_data();
        let json = report_to_string(ReportFormat::Json, &data).unwrap();
        assert!(json.trim_start().starts_with('{'));
        let markdown = report_to_string(ReportFormat::Markdown, &data).unwrap();
        assert!(markdown.contains('|'));
        let text = report_to_string(ReportFormat::Text, &data).unwrap();
        assert!(text.starts_with("test-package@1.0.0"));
    }

    #[test]
    fn test_for_package_falls_back_to_directory() {
        let data = ReportData::for_package(None, "./pkg", LintResult::default());
        assert_eq!(data.title(), "./pkg");
    }
}
