//! JSON report implementation.
//!
//! Prints lint results as JSON for machine-readable output.

use super::{ReportData, Reporter};
use crate::lint::{Message, Severity};
use serde::Serialize;
use std::io::{self, Write};

/// JSON reporter implementation.
pub struct JsonReporter;

/// Serializable message for JSON output, with its rendered text.
#[derive(Serialize)]
struct JsonMessage<'a> {
    #[serde(flatten)]
    message: &'a Message,
    text: String,
}

/// Summary statistics for JSON output.
#[derive(Serialize)]
struct JsonSummary {
    errors: usize,
    warnings: usize,
    suggestions: usize,
}

/// Root JSON report structure.
#[derive(Serialize)]
struct JsonReport<'a> {
    package: JsonPackage<'a>,
    summary: JsonSummary,
    messages: Vec<JsonMessage<'a>>,
}

/// Package info for JSON output.
#[derive(Serialize)]
struct JsonPackage<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<&'a str>,
}

impl Reporter for JsonReporter {
    fn report<W: Write>(&self, data: &ReportData, writer: &mut W) -> io::Result<()> {
        let report = JsonReport {
            package: JsonPackage {
                name: &data.package_name,
                version: data.package_version.as_deref(),
            },
            summary: JsonSummary {
                errors: data.count(Severity::Error),
                warnings: data.count(Severity::Warning),
                suggestions: data.count(Severity::Suggestion),
            },
            messages: data
                .messages
                .iter()
                .map(|message| JsonMessage {
                    message,
                    text: message.render(),
                })
                .collect(),
        };

        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        writeln!(writer, "{}", json)
    }
}
