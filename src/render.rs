//! Output formatting for CLI commands.
//!
//! Supports table (human-readable), JSON and quiet (identifiers only) output.

use std::io::{self, Write};

use serde::Serialize;
use thiserror::Error;

/// Output format selected by the global flags.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Format {
    /// Padded columns.
    #[default]
    Table,
    /// One compact JSON document.
    Json,
}

/// Global output switches.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct OutputOptions {
    /// Output format.
    pub format: Format,
    /// Omit the heading row of tables.
    pub no_header: bool,
    /// Print only the first column (the object id).
    pub quiet: bool,
}

/// Errors raised while writing output.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Writing to the output failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
    /// JSON serialisation failed.
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Rows of strings under a heading.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Table {
    headings: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Empty table with the given headings.
    #[must_use]
    pub fn new(headings: &[&str]) -> Self {
        Self {
            headings: headings.iter().map(|heading| heading.to_uppercase()).collect(),
            rows: Vec::new(),
        }
    }

    /// Appends a row.
    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    /// Rows added so far.
    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    fn widths(&self) -> Vec<usize> {
        let columns = self
            .rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.headings.len()))
            .max()
            .unwrap_or_default();
        let mut widths = vec![0; columns];
        for row in std::iter::once(&self.headings).chain(&self.rows) {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }
        widths
    }

    fn write_padded<W: Write>(writer: &mut W, row: &[String], widths: &[usize]) -> io::Result<()> {
        let last = row.len().saturating_sub(1);
        let mut line = String::new();
        for (index, (cell, width)) in row.iter().zip(widths).enumerate() {
            if index == last {
                line.push_str(cell);
            } else {
                line.push_str(&format!("{cell:<width$}  "));
            }
        }
        writeln!(writer, "{}", line.trim_end())
    }

    /// Writes the table as padded columns.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Io`] when writing fails.
    pub fn write_table<W: Write>(&self, writer: &mut W, no_header: bool) -> Result<(), RenderError> {
        let widths = self.widths();
        if !no_header {
            Self::write_padded(writer, &self.headings, &widths)?;
        }
        for row in &self.rows {
            Self::write_padded(writer, row, &widths)?;
        }
        Ok(())
    }

    /// Writes the first cell of each row.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Io`] when writing fails.
    pub fn write_ids<W: Write>(&self, writer: &mut W) -> Result<(), RenderError> {
        for row in &self.rows {
            if let Some(id) = row.first() {
                writeln!(writer, "{id}")?;
            }
        }
        Ok(())
    }
}

/// Writes `value` as JSON, or `table` per the quiet and heading switches.
///
/// # Errors
///
/// Returns [`RenderError`] when serialisation or writing fails.
pub fn render<W, T>(
    writer: &mut W,
    options: OutputOptions,
    table: &Table,
    value: &T,
) -> Result<(), RenderError>
where
    W: Write,
    T: Serialize + ?Sized,
{
    match options.format {
        Format::Json => {
            serde_json::to_writer(&mut *writer, value)?;
            writeln!(writer)?;
            Ok(())
        }
        Format::Table if options.quiet => table.write_ids(writer),
        Format::Table => table.write_table(writer, options.no_header),
    }
}
