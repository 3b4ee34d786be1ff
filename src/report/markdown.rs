//! Markdown report implementation.
//!
//! Prints lint results as Markdown, suitable for CI comments.

use super::{ReportData, Reporter};
use crate::lint::{format_path, Severity};
use std::io::{self, Write};

/// Markdown reporter implementation.
pub struct MarkdownReporter;

impl Reporter for MarkdownReporter {
    fn report<W: Write>(&self, data: &ReportData, writer: &mut W) -> io::Result<()> {
        writeln!(writer, "# Lint report for `{}`", data.title())?;
        writeln!(writer)?;

        writeln!(writer, "| Severity | Count |")?;
        writeln!(writer, "|----------|-------|")?;
        writeln!(writer, "| Errors | {} |", data.count(Severity::Error))?;
        writeln!(writer, "| Warnings | {} |", data.count(Severity::Warning))?;
        writeln!(writer, "| Suggestions | {} |", data.count(Severity::Suggestion))?;
        writeln!(writer)?;

        if data.messages.is_empty() {
            writeln!(writer, "No issues found.")?;
            return Ok(());
        }

        for (severity, title) in [
            (Severity::Error, "Errors"),
            (Severity::Warning, "Warnings"),
            (Severity::Suggestion, "Suggestions"),
        ] {
            let messages = data.by_severity(severity);
            if messages.is_empty() {
                continue;
            }
            writeln!(writer, "## {} ({})", title, messages.len())?;
            writeln!(writer)?;
            writeln!(writer, "| Code | Path | Message |")?;
            writeln!(writer, "|------|------|---------|")?;
            for msg in messages {
                writeln!(
                    writer,
                    "| `{}` | `{}` | {} |",
                    msg.code,
                    format_path(&msg.path),
                    escape_cell(&msg.render())
                )?;
            }
            writeln!(writer)?;
        }
        Ok(())
    }
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}
