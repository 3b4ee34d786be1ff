//! Terminal output grouped by severity.

use super::{ReportData, Reporter};
use crate::lint::{Message, Severity};
use crossterm::style::{StyledContent, Stylize};
use std::io::{self, Write};

/// Text reporter. ANSI colors are emitted only when `color` is set.
pub struct TextReporter {
    pub color: bool,
}

impl TextReporter {
    fn paint(&self, text: &str, style: fn(&str) -> StyledContent<&str>) -> String {
        if self.color {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn write_group<W: Write>(
        &self,
        writer: &mut W,
        title: &str,
        style: fn(&str) -> StyledContent<&str>,
        messages: &[&Message],
    ) -> io::Result<()> {
        if messages.is_empty() {
            return Ok(());
        }
        writeln!(writer, "{}", self.paint(title, style))?;
        for (i, msg) in messages.iter().enumerate() {
            writeln!(writer, "{}. {}", i + 1, msg.render())?;
        }
        Ok(())
    }
}

impl Reporter for TextReporter {
    fn report<W: Write>(&self, data: &ReportData, writer: &mut W) -> io::Result<()> {
        writeln!(writer, "{}", self.paint(&data.title(), |s| s.bold()))?;

        if data.messages.is_empty() {
            writeln!(writer, "{}", self.paint("All good!", |s| s.green()))?;
            return Ok(());
        }

        self.write_group(
            writer,
            "Suggestions:",
            |s| s.grey().bold(),
            &data.by_severity(Severity::Suggestion),
        )?;
        self.write_group(
            writer,
            "Warnings:",
            |s| s.yellow().bold(),
            &data.by_severity(Severity::Warning),
        )?;
        self.write_group(
            writer,
            "Errors:",
            |s| s.red().bold(),
            &data.by_severity(Severity::Error),
        )?;
        Ok(())
    }
}
