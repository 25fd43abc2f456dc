//! # Montana license plate county lookup
//!
//! Montana plates start with a number naming the county that issued them.
//! [CountyTable] loads the prefix table from a CSV file and answers lookups,
//! [display] formats a hit and [repl] runs the interactive query loop.

use std::collections::HashMap;
use std::io;
use std::ops::{Range, RangeInclusive};
use std::path::{Path, PathBuf};
use std::time::Instant;

use chumsky::prelude::*;
use chumsky::text::newline;
use thiserror::Error;
use tracing::instrument;

pub mod display;
pub mod repl;

pub use display::DisplayPreference;

/// Data file read at startup, relative to the working directory.
pub const DEFAULT_DATA_FILE: &str = "MontanaCounties.csv";

/// Prefix to county table, built once and read-only afterwards.
#[derive(Debug, Default)]
pub struct CountyTable {
    by_prefix: HashMap<u32, CountyRecord>,
}

impl CountyTable {
    /// Parse CSV text. The first record is a header and is discarded.
    ///
    /// When a prefix appears more than once the last record wins.
    #[instrument(skip(s))]
    pub fn from_str(s: &str) -> Result<CountyTable, MalformedData> {
        let ts = Instant::now();
        let s = s.strip_prefix('\u{feff}').unwrap_or(s);
        let lines = LineIndex::new(s);

        let mut records = parser().parse(s).map_err(|errs| {
            tracing::error!("Parse errors found: {:?}", errs);
            let line = errs.first().map_or(1, |err| lines.line_of(err.span().start));
            let message = errs.first().map(ToString::to_string).unwrap_or_default();
            MalformedData::Syntax { line, message }
        })?;

        // A final newline leaves one empty record behind.
        if records.last().is_some_and(|(_, fields)| is_blank(fields)) {
            records.pop();
        }

        let mut records = records.into_iter();
        if records.next().is_none() {
            return Err(MalformedData::MissingHeader);
        }

        let mut by_prefix = HashMap::new();
        for (offset, fields) in records {
            let line = lines.line_of(offset);
            let record = CountyRecord::from_fields(line, &fields)?;
            let prefix = record.prefix;
            if let Some(previous) = by_prefix.insert(prefix, record) {
                tracing::warn!(
                    prefix,
                    line,
                    "Prefix {prefix} redefined, replacing {}.",
                    previous.county_name
                );
            }
        }

        tracing::debug!(
            elapsed_ms = ts.elapsed().as_millis(),
            "Loaded {} counties.",
            by_prefix.len()
        );

        Ok(CountyTable { by_prefix })
    }

    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<CountyTable, LoadError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => LoadError::NotFound {
                path: path.to_path_buf(),
            },
            _ => LoadError::Unreadable {
                path: path.to_path_buf(),
                source,
            },
        })?;

        let malformed = |source| LoadError::Malformed {
            path: path.to_path_buf(),
            source,
        };
        let s = std::str::from_utf8(&bytes).map_err(|_| malformed(MalformedData::InvalidUtf8))?;
        Self::from_str(s).map_err(malformed)
    }

    #[instrument(skip(self))]
    pub fn lookup(&self, prefix: u32) -> Option<&CountyRecord> {
        let ts = Instant::now();
        let record = self.by_prefix.get(&prefix);
        tracing::debug!(
            elapsed_μs = ts.elapsed().as_micros(),
            found = record.is_some(),
            "Looked up prefix {prefix}."
        );
        record
    }

    /// Smallest and largest prefix present, `None` for an empty table.
    pub fn prefix_range(&self) -> Option<RangeInclusive<u32>> {
        let min = self.by_prefix.keys().min()?;
        let max = self.by_prefix.keys().max()?;
        Some(*min..=*max)
    }

    pub fn len(&self) -> usize {
        self.by_prefix.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_prefix.is_empty()
    }
}

/// Single county row from the data file
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CountyRecord {
    /// County name
    pub county_name: String,
    /// City serving as the county seat
    pub seat_city: String,
    /// Leading number on plates issued by this county
    pub prefix: u32,
}

impl CountyRecord {
    fn from_fields(line: usize, fields: &[String]) -> Result<CountyRecord, MalformedData> {
        let [county, seat, prefix, ..] = fields else {
            return Err(MalformedData::MissingFields {
                line,
                found: fields.len(),
            });
        };

        let value = prefix.trim();
        let prefix = value
            .parse::<u32>()
            .ok()
            .filter(|p| *p > 0)
            .ok_or_else(|| MalformedData::InvalidPrefix {
                line,
                value: value.to_string(),
            })?;

        Ok(CountyRecord {
            county_name: county.trim().to_string(),
            seat_city: seat.trim().to_string(),
            prefix,
        })
    }
}

/// Reasons a data file that was read successfully still cannot be used.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MalformedData {
    #[error("file is empty, expected a header row")]
    MissingHeader,
    #[error("file is not valid UTF-8")]
    InvalidUtf8,
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },
    #[error("line {line}: expected at least 3 fields, found {found}")]
    MissingFields { line: usize, found: usize },
    #[error("line {line}: '{value}' is not a valid prefix number")]
    InvalidPrefix { line: usize, value: String },
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not find file '{}'", path.display())]
    NotFound { path: PathBuf },
    #[error("could not read '{}': {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid data in '{}': {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: MalformedData,
    },
}

/// Maps parser offsets (in chars) to 1-based line numbers.
struct LineIndex {
    breaks: Vec<usize>,
}

impl LineIndex {
    fn new(s: &str) -> LineIndex {
        let mut breaks = Vec::new();
        let mut chars = s.chars().enumerate().peekable();
        while let Some((i, c)) = chars.next() {
            match c {
                '\n' => breaks.push(i),
                // CRLF is counted once, at its LF.
                '\r' if !matches!(chars.peek(), Some((_, '\n'))) => breaks.push(i),
                _ => {}
            }
        }
        LineIndex { breaks }
    }

    fn line_of(&self, offset: usize) -> usize {
        self.breaks.partition_point(|b| *b < offset) + 1
    }
}

fn is_blank(fields: &[String]) -> bool {
    matches!(fields, [only] if only.is_empty())
}

/// Records paired with the char offset they start at.
fn parser() -> impl Parser<char, Vec<(usize, Vec<String>)>, Error = Simple<char>> {
    // Inside quotes a doubled quote stands for one literal quote.
    let quoted = filter(|c: &char| *c != '"')
        .or(just("\"\"").to('"'))
        .repeated()
        .delimited_by(just('"'), just('"'))
        .collect::<String>()
        .labelled("Quoted field");

    let unquoted = filter(|c: &char| !matches!(c, ',' | '"' | '\r' | '\n'))
        .repeated()
        .collect::<String>()
        .labelled("Field");

    let record = quoted
        .or(unquoted)
        .separated_by(just(','))
        .map_with_span(|fields, span: Range<usize>| (span.start, fields));

    record.separated_by(newline()).then_ignore(end())
}
