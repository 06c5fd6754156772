//! Metadata table stored next to the binary block file.
//!
//! ```text
//! index,offset,start_time,end_time,timestep,length,series_name
//! 1    ,0     ,2020-01-01,2020-12-31,86400   ,366   ,flow
//! 2    ,2114  ,2020-01-01,2020-12-31,86400   ,366   ,rain
//! ```
//!
//! The header line is written as is. In data rows every column except the
//! name is left aligned and padded to the widest of its header and values.
//! Times are `%Y-%m-%d` at exactly UTC midnight and `%Y-%m-%dT%H:%M:%S`
//! otherwise.

use crate::codec::Timestamp;
use crate::error::{BundleError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;
use tracing::warn;

/// Column names, in file order.
pub const COLUMNS: [&str; 7] = [
    "index",
    "offset",
    "start_time",
    "end_time",
    "timestep",
    "length",
    "series_name",
];

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// One row of the metadata table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesMetadata {
    /// 1-based position of the series in the bundle.
    pub index: usize,
    /// Byte offset of the block frame in the binary file.
    pub offset: u64,
    /// First timestamp (0 for an empty series).
    pub start_time: Timestamp,
    /// Last timestamp (0 for an empty series).
    pub end_time: Timestamp,
    /// Nominal step the block was compressed with.
    pub timestep: u64,
    /// Number of samples.
    pub length: usize,
    /// Series name.
    pub series_name: String,
}

impl SeriesMetadata {
    /// Returns the public summary of this row.
    pub fn info(&self) -> SeriesInfo {
        SeriesInfo {
            name: self.series_name.clone(),
            point_count: self.length,
            start_time: self.start_time,
            end_time: self.end_time,
            timestep_seconds: self.timestep,
        }
    }

    fn formatted_fields(&self) -> [String; 6] {
        [
            self.index.to_string(),
            self.offset.to_string(),
            format_timestamp(self.start_time),
            format_timestamp(self.end_time),
            self.timestep.to_string(),
            self.length.to_string(),
        ]
    }
}

/// Series summary available from the metadata file alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesInfo {
    /// Series name.
    pub name: String,
    /// Number of samples.
    pub point_count: usize,
    /// First timestamp.
    pub start_time: Timestamp,
    /// Last timestamp.
    pub end_time: Timestamp,
    /// Nominal step in seconds.
    pub timestep_seconds: u64,
}

impl fmt::Display for SeriesInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SeriesInfo{{name='{}', points={}, start={}, end={}, timestep={}s}}",
            self.name,
            self.point_count,
            format_timestamp(self.start_time),
            format_timestamp(self.end_time),
            self.timestep_seconds
        )
    }
}

/// Formats a timestamp for the metadata table.
///
/// Timestamps outside the calendar range chrono supports are written as plain
/// integers.
pub fn format_timestamp(timestamp: Timestamp) -> String {
    match DateTime::from_timestamp(timestamp, 0) {
        Some(dt) if dt.num_seconds_from_midnight() == 0 => dt.format(DATE_FORMAT).to_string(),
        Some(dt) => dt.format(DATE_TIME_FORMAT).to_string(),
        None => timestamp.to_string(),
    }
}

/// Parses a timestamp written by [`format_timestamp`].
///
/// # Errors
///
/// Returns the chrono parse error if the text is neither a date, a date-time
/// nor a plain integer.
pub fn parse_timestamp(text: &str) -> std::result::Result<Timestamp, chrono::ParseError> {
    let text = text.trim();
    let parsed = if text.contains('T') {
        NaiveDateTime::parse_from_str(text, DATE_TIME_FORMAT)
    } else {
        NaiveDate::parse_from_str(text, DATE_FORMAT).map(|d| d.and_time(NaiveTime::MIN))
    };
    match parsed {
        Ok(dt) => Ok(dt.and_utc().timestamp()),
        Err(e) => text.parse::<Timestamp>().map_err(|_| e),
    }
}

/// Writes the metadata table.
///
/// # Errors
///
/// Returns any error from the underlying writer.
pub fn write_metadata<W: Write>(writer: &mut W, rows: &[SeriesMetadata]) -> io::Result<()> {
    writeln!(writer, "{}", COLUMNS.join(","))?;

    let formatted: Vec<[String; 6]> = rows.iter().map(SeriesMetadata::formatted_fields).collect();
    let mut widths = [0usize; 6];
    for (width, name) in widths.iter_mut().zip(COLUMNS) {
        *width = name.len();
    }
    for fields in &formatted {
        for (width, field) in widths.iter_mut().zip(fields) {
            *width = (*width).max(field.len());
        }
    }

    for (row, fields) in rows.iter().zip(&formatted) {
        for (field, &width) in fields.iter().zip(&widths) {
            write!(writer, "{field:<width$},")?;
        }
        writeln!(writer, "{}", quote_name(&row.series_name))?;
    }

    Ok(())
}

fn quote_name(name: &str) -> std::borrow::Cow<'_, str> {
    if name.contains(',') {
        format!("\"{name}\"").into()
    } else {
        name.into()
    }
}

/// Reads and parses a metadata file.
///
/// # Errors
///
/// Returns `BundleError::Io` if the file cannot be read and
/// `BundleError::Metadata` if its contents are malformed.
pub fn read_metadata(path: impl AsRef<Path>) -> Result<Vec<SeriesMetadata>> {
    let file = File::open(path.as_ref())?;
    parse_metadata(BufReader::new(file))
}

/// Parses metadata rows from a reader, sorted by index.
///
/// # Errors
///
/// See [`read_metadata`].
pub fn parse_metadata<R: BufRead>(reader: R) -> Result<Vec<SeriesMetadata>> {
    let mut lines = reader.lines();

    let header = lines.next().ok_or_else(|| BundleError::Metadata {
        line: 1,
        message: "empty metadata file".to_string(),
    })??;
    if !header.trim_start_matches('\u{feff}').starts_with("index,") {
        return Err(BundleError::Metadata {
            line: 1,
            message: format!("invalid header: {header}"),
        });
    }

    let mut rows = Vec::new();
    for (i, line) in lines.enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        rows.push(parse_row(line, i + 2)?);
    }

    rows.sort_by_key(|row| row.index);
    for pair in rows.windows(2) {
        if pair[0].index == pair[1].index {
            warn!("Duplicate metadata index {}", pair[0].index);
        }
    }

    Ok(rows)
}

fn parse_row(line: &str, line_num: usize) -> Result<SeriesMetadata> {
    let fields = split_fields(line);
    if fields.len() != COLUMNS.len() {
        return Err(BundleError::Metadata {
            line: line_num,
            message: format!(
                "expected {} fields, found {}: {line}",
                COLUMNS.len(),
                fields.len()
            ),
        });
    }

    let invalid = |column: &str, detail: String| BundleError::Metadata {
        line: line_num,
        message: format!("invalid {column}: {detail}"),
    };
    let number = |column: usize| -> Result<u64> {
        let field = fields[column].trim();
        field
            .parse::<u64>()
            .map_err(|e| invalid(COLUMNS[column], format!("'{field}' ({e})")))
    };
    let time = |column: usize| -> Result<Timestamp> {
        let field = fields[column].trim();
        parse_timestamp(field).map_err(|e| invalid(COLUMNS[column], format!("'{field}' ({e})")))
    };

    Ok(SeriesMetadata {
        index: number(0)? as usize,
        offset: number(1)?,
        start_time: time(2)?,
        end_time: time(3)?,
        timestep: number(4)?,
        length: number(5)? as usize,
        series_name: fields[6].trim().to_string(),
    })
}

/// Splits on commas outside double quotes; quotes are dropped.
fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in line.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    const JAN_1_2020: Timestamp = 1_577_836_800;

    fn row(index: usize, offset: u64, name: &str) -> SeriesMetadata {
        SeriesMetadata {
            index,
            offset,
            start_time: JAN_1_2020,
            end_time: JAN_1_2020 + 365 * 86_400,
            timestep: 86_400,
            length: 366,
            series_name: name.to_string(),
        }
    }

    #[test]
    fn test_format_timestamp_midnight_boundary() {
        assert_eq!(format_timestamp(JAN_1_2020), "2020-01-01");
        assert_eq!(format_timestamp(JAN_1_2020 + 1), "2020-01-01T00:00:01");
        assert_eq!(format_timestamp(JAN_1_2020 - 1), "2019-12-31T23:59:59");
        assert_eq!(format_timestamp(0), "1970-01-01");
        assert_eq!(format_timestamp(-86_400), "1969-12-31");
        assert_eq!(format_timestamp(i64::MAX), i64::MAX.to_string());
    }

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(parse_timestamp("2020-01-01"), Ok(JAN_1_2020));
        assert_eq!(parse_timestamp("2020-01-01T00:00:01"), Ok(JAN_1_2020 + 1));
        assert_eq!(parse_timestamp(" 1969-12-31 "), Ok(-86_400));
        assert_eq!(parse_timestamp("-42"), Ok(-42));
        assert!(parse_timestamp("2020-13-01").is_err());
        assert!(parse_timestamp("yesterday").is_err());

        for ts in [JAN_1_2020, JAN_1_2020 + 3_661, -1, i64::MIN] {
            assert_eq!(parse_timestamp(&format_timestamp(ts)), Ok(ts));
        }
    }

    #[test]
    fn test_write_metadata_layout() {
        let rows = vec![row(1, 0, "flow"), row(2, 2114, "rain")];
        let mut out = Vec::new();
        write_metadata(&mut out, &rows).unwrap();
        let text = String::from_utf8(out).unwrap();

        let expected = "\
index,offset,start_time,end_time,timestep,length,series_name
1    ,0     ,2020-01-01,2020-12-31,86400   ,366   ,flow
2    ,2114  ,2020-01-01,2020-12-31,86400   ,366   ,rain
";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_column_width_follows_widest_value() {
        let mut wide = row(10, 123_456_789, "b");
        wide.end_time = JAN_1_2020 + 90;
        let rows = vec![row(9, 0, "a"), wide];
        let mut out = Vec::new();
        write_metadata(&mut out, &rows).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[1], "9    ,0        ,2020-01-01,2020-12-31         ,86400   ,366   ,a");
        assert_eq!(lines[2], "10   ,123456789,2020-01-01,2020-01-01T00:01:30,86400   ,366   ,b");
    }

    #[test]
    fn test_metadata_roundtrip() {
        let mut odd = row(3, 99, "name, with comma");
        odd.start_time = -5;
        odd.end_time = 7;
        let rows = vec![row(1, 0, "flow"), row(2, 40, "rain"), odd];

        let mut out = Vec::new();
        write_metadata(&mut out, &rows).unwrap();
        let parsed = parse_metadata(out.as_slice()).unwrap();
        assert_eq!(parsed, rows);
    }

    #[test]
    fn test_parse_sorts_and_skips_blank_lines() {
        let text = "index,offset,start_time,end_time,timestep,length,series_name\n\
                    2,30,2020-01-01,2020-01-02,86400,2,b\n\
                    \n\
                    1,0,2020-01-01,2020-01-02,86400,2,a\n";
        let rows = parse_metadata(text.as_bytes()).unwrap();
        let names: Vec<&str> = rows.iter().map(|r| r.series_name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            parse_metadata("".as_bytes()),
            Err(BundleError::Metadata { line: 1, .. })
        ));
        assert!(matches!(
            parse_metadata("name,offset\n".as_bytes()),
            Err(BundleError::Metadata { line: 1, .. })
        ));

        let short = "index,offset,start_time,end_time,timestep,length,series_name\n1,0,2020-01-01\n";
        assert!(matches!(
            parse_metadata(short.as_bytes()),
            Err(BundleError::Metadata { line: 2, .. })
        ));

        let bad_offset =
            "index,offset,start_time,end_time,timestep,length,series_name\n\n1,x,2020-01-01,2020-01-01,1,1,a\n";
        match parse_metadata(bad_offset.as_bytes()) {
            Err(BundleError::Metadata { line, message }) => {
                assert_eq!(line, 3);
                assert!(message.contains("offset"), "{message}");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_series_info_display() {
        let info = row(1, 0, "flow").info();
        assert_eq!(
            info.to_string(),
            "SeriesInfo{name='flow', points=366, start=2020-01-01, end=2020-12-31, timestep=86400s}"
        );
    }
}
