use crate::models::RawRecord;
use crate::types::Delimiter;
use csv::{ReaderBuilder, Trim};

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Header columns and data-row count read from the top of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvSample {
    pub columns: Vec<String>,
    pub rows: usize
}

fn reader_builder(delimiter: Delimiter, flexible: bool) -> ReaderBuilder {
    let mut builder = ReaderBuilder::new();

    builder
        .delimiter(delimiter.as_byte())
        .has_headers(true)
        .trim(Trim::All)
        .flexible(flexible);

    builder
}

/// Removes a leading UTF-8 byte-order mark, which spreadsheet exports often carry.
pub fn strip_byte_order_mark(content: &mut String) {
    if content.starts_with(BYTE_ORDER_MARK) {
        content.drain(..BYTE_ORDER_MARK.len_utf8());
    }
}

/// Parses the whole document into header-keyed records.
///
/// Records whose field count differs from the header are rejected, as is
/// malformed quoting; empty lines are skipped.
pub fn parse_records(content: &str, delimiter: Delimiter) -> Result<Vec<RawRecord>, csv::Error> {
    let mut reader = reader_builder(delimiter, false).from_reader(content.as_bytes());

    reader.deserialize::<RawRecord>().collect()
}

/// Reads only the header line and the next `data_lines` lines.
///
/// Ragged rows are tolerated here so that a wrong delimiter is reported as a
/// column mismatch rather than a record-length error.
pub fn sample(content: &str, delimiter: Delimiter, data_lines: usize) -> Result<CsvSample, csv::Error> {
    let head = content.split('\n').take(data_lines + 1).collect::<Vec<_>>().join("\n");
    let mut reader = reader_builder(delimiter, true).from_reader(head.as_bytes());

    let columns = reader.headers()?.iter().map(str::to_string).collect();
    let mut rows = 0;

    for record in reader.records() {
        record?;
        rows += 1;
    }

    Ok(CsvSample { columns, rows })
}
