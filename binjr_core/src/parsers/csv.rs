//! Delimited text parser: a header row, then one row per timestamp.

use std::{collections::HashSet, fmt, io::Read, sync::Arc};

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use encoding_rs::Encoding;
use tracing::trace;

use super::{
    DataParser, ParseError, ParsedSeries, ValueParser, lines::DecodedLines, nan_as_zero,
    timestamp::{JRDS_TIMESTAMP_PATTERN, LocalTimestampParser, TimestampParser},
};
use crate::models::series::TimeSeries;

/// Field separator of JRDS downloads.
pub const JRDS_SEPARATOR: char = ',';

/// Parses delimited text whose first column holds timestamps.
///
/// The header names the columns; every later column becomes one series keyed by its
/// header name. Blank lines are skipped. Timestamps must strictly increase.
#[derive(Clone)]
pub struct CsvParser {
    encoding: &'static Encoding,
    separator: char,
    timestamp: Arc<dyn TimestampParser>,
    value: ValueParser,
}

impl CsvParser {
    pub fn new(
        encoding: &'static Encoding,
        separator: char,
        timestamp: Arc<dyn TimestampParser>,
        value: ValueParser,
    ) -> Self {
        Self {
            encoding,
            separator,
            timestamp,
            value,
        }
    }

    /// Parser for JRDS downloads: comma separated, local timestamps in `zone`, NaN read
    /// as zero.
    pub fn jrds(encoding: &'static Encoding, zone: Tz) -> Self {
        Self::new(
            encoding,
            JRDS_SEPARATOR,
            Arc::new(LocalTimestampParser::new(JRDS_TIMESTAMP_PATTERN, zone)),
            Arc::new(nan_as_zero),
        )
    }

    pub fn with_value_parser(mut self, value: ValueParser) -> Self {
        self.value = value;
        self
    }

    pub fn separator(&self) -> char {
        self.separator
    }

    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    fn header(&self, line: &str) -> Result<Vec<String>, ParseError> {
        if line.trim().is_empty() {
            return Err(ParseError::EmptyHeader);
        }
        let names: Vec<String> = line.split(self.separator).map(|s| s.trim().to_string()).collect();
        let mut seen = HashSet::with_capacity(names.len());
        for name in &names[1..] {
            if !seen.insert(name.as_str()) {
                return Err(ParseError::DuplicateColumn { name: name.clone() });
            }
        }
        Ok(names)
    }
}

impl fmt::Debug for CsvParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CsvParser")
            .field("encoding", &self.encoding.name())
            .field("separator", &self.separator)
            .finish_non_exhaustive()
    }
}

impl DataParser for CsvParser {
    fn parse(&self, input: &mut dyn Read) -> Result<ParsedSeries, ParseError> {
        let mut lines = DecodedLines::new(input, self.encoding);
        let Some(header) = lines.next_line()? else {
            return Ok(ParsedSeries::new());
        };
        let names = self.header(&header)?;
        let mut series: Vec<TimeSeries> = vec![TimeSeries::new(); names.len() - 1];
        let mut previous: Option<DateTime<Utc>> = None;

        while let Some(row) = lines.next_line()? {
            if row.trim().is_empty() {
                continue;
            }
            let line = lines.line_no();
            let fields: Vec<&str> = row.split(self.separator).map(str::trim).collect();
            if fields.len() != names.len() {
                return Err(ParseError::ColumnCount {
                    line,
                    expected: names.len(),
                    found: fields.len(),
                });
            }

            let timestamp = self
                .timestamp
                .parse(fields[0], previous)
                .map_err(|source| ParseError::Timestamp {
                    line,
                    value: fields[0].to_string(),
                    source,
                })?;

            for ((field, name), s) in fields[1..].iter().zip(&names[1..]).zip(series.iter_mut()) {
                let value = (self.value)(field).map_err(|source| ParseError::Value {
                    line,
                    column: name.clone(),
                    value: field.to_string(),
                    source,
                })?;
                s.push(timestamp, value)
                    .map_err(|source| ParseError::OutOfOrder { line, source })?;
            }
            previous = Some(timestamp);
        }
        trace!(columns = series.len(), rows = series.first().map_or(0, TimeSeries::len), "Parsed delimited payload");

        Ok(names.into_iter().skip(1).zip(series).collect())
    }
}
