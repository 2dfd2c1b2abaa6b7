//! Two-column ASCII table parser.
//!
//! Field solvers export 1-D results as plain text: a few lines of header
//! text, an optional dashed separator, then one `x y` pair per line.
//! Comments start with `#` or `!` and may follow the data on the same line.
//! Columns are separated by whitespace or a comma.
//!
//! Any line that is not data is treated as header text until the first data
//! row. After that, a non-data line is a syntax error.

use crate::error::{IoError, IoResult};
use nom::{
    branch::alt,
    bytes::complete::take_while1,
    character::complete::{char, not_line_ending, space0, space1},
    combinator::{eof, map, opt, value},
    number::complete::double,
    IResult, Parser,
};
use std::path::Path;

/// Parsed two-column table.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    /// Header text lines preceding the data.
    pub header: Vec<String>,

    /// Data rows.
    pub rows: Vec<(f64, f64)>,
}

impl Table {
    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Split into columns, scaling each.
    pub fn scaled_columns(&self, x_scale: f64, y_scale: f64) -> (Vec<f64>, Vec<f64>) {
        self.rows.iter().map(|&(x, y)| (x * x_scale, y * y_scale)).unzip()
    }
}

/// Parse a table from text.
pub fn parse_table(content: &str) -> IoResult<Table> {
    let mut table = Table::default();

    for (idx, line) in content.lines().enumerate() {
        match parse_line(line) {
            Ok((_, Line::Row(x, y))) => table.rows.push((x, y)),
            Ok(_) => {}
            Err(_) if table.rows.is_empty() => table.header.push(line.trim().to_string()),
            Err(err) => {
                return Err(IoError::syntax(
                    idx + 1,
                    error_column(line, &err),
                    format!("expected two numeric columns, found '{}'", line.trim()),
                ))
            }
        }
    }

    if table.rows.is_empty() {
        return Err(IoError::invalid_value("table", "no data rows"));
    }
    Ok(table)
}

/// Parse a table from a file.
pub fn load_table(path: &Path) -> IoResult<Table> {
    let content = std::fs::read_to_string(path)?;
    let table = parse_table(&content)?;
    tracing::debug!(
        "Read {} rows from {} ({} header lines)",
        table.len(),
        path.display(),
        table.header.len()
    );
    Ok(table)
}

fn error_column(line: &str, err: &nom::Err<nom::error::Error<&str>>) -> usize {
    match err {
        nom::Err::Error(e) | nom::Err::Failure(e) => line.len() - e.input.len() + 1,
        nom::Err::Incomplete(_) => line.len() + 1,
    }
}

// ============================================================================
// Nom Parsers (nom 8 compatible)
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
enum Line {
    Blank,
    Comment,
    Separator,
    Row(f64, f64),
}

fn parse_line(input: &str) -> IResult<&str, Line> {
    // data row last so a failure reports its position
    alt((blank_line, comment_line, separator_line, data_row)).parse(input)
}

fn blank_line(input: &str) -> IResult<&str, Line> {
    value(Line::Blank, (space0, eof)).parse(input)
}

fn comment_marker(input: &str) -> IResult<&str, char> {
    alt((char('#'), char('!'))).parse(input)
}

fn comment_line(input: &str) -> IResult<&str, Line> {
    value(Line::Comment, (space0, comment_marker, not_line_ending)).parse(input)
}

fn separator_line(input: &str) -> IResult<&str, Line> {
    value(
        Line::Separator,
        (space0, take_while1(|c: char| c == '-' || c == '='), space0, eof),
    )
    .parse(input)
}

fn column_separator(input: &str) -> IResult<&str, ()> {
    alt((value((), (space0, char(','), space0)), value((), space1))).parse(input)
}

fn data_row(input: &str) -> IResult<&str, Line> {
    map(
        (
            space0,
            double,
            column_separator,
            double,
            space0,
            opt((comment_marker, not_line_ending)),
            eof,
        ),
        |(_, x, _, y, _, _, _)| Line::Row(x, y),
    )
    .parse(input)
}
