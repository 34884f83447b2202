//! Upload parsing: raw bytes → positional CSV rows
//!
//! Only structure is checked here (text encoding, header, row count, row
//! width). Numeric coercion happens in `features`, so type errors carry the
//! column they belong to.

use crate::error::{AdapterError, AdapterResult};
use crate::schema::{Column, TableSchema, SCHEMA_V1};

/// One data row of the upload, header excluded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedRecord {
    /// 0-based data row index
    row: usize,
    fields: Vec<String>,
}

impl UploadedRecord {
    pub fn new(row: usize, fields: Vec<String>) -> Self {
        Self { row, fields }
    }

    /// 0-based data row index (header excluded)
    pub fn row(&self) -> usize {
        self.row
    }

    /// Raw (trimmed) text of a column, if the row is wide enough
    pub fn field(&self, column: Column) -> Option<&str> {
        self.fields.get(column.index()).map(String::as_str)
    }

    pub fn width(&self) -> usize {
        self.fields.len()
    }
}

/// Parse an upload against the current schema
pub fn parse_upload(bytes: &[u8]) -> AdapterResult<Vec<UploadedRecord>> {
    parse_upload_with(bytes, &SCHEMA_V1)
}

/// Parse an upload against an explicit schema
///
/// Returns exactly `schema.series_len` rows. Reading stops there, so rows
/// past the series are never inspected.
pub fn parse_upload_with(bytes: &[u8], schema: &TableSchema) -> AdapterResult<Vec<UploadedRecord>> {
    let text = std::str::from_utf8(bytes)?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let header = reader
        .headers()
        .map_err(|e| AdapterError::MalformedTable(format!("unreadable header row: {}", e)))?;
    if header.iter().all(str::is_empty) {
        return Err(AdapterError::MalformedTable(
            "missing header row".to_string(),
        ));
    }

    let mut records = Vec::with_capacity(schema.series_len);
    for (row, result) in reader.records().take(schema.series_len).enumerate() {
        let record = result
            .map_err(|e| AdapterError::MalformedTable(format!("data row {}: {}", row, e)))?;
        records.push(record);
    }

    // Row count wins over row width: a short upload is always InsufficientRows
    if records.len() < schema.series_len {
        return Err(AdapterError::InsufficientRows {
            found: records.len(),
            required: schema.series_len,
        });
    }

    let min_width = schema.min_width();
    let mut rows = Vec::with_capacity(records.len());
    for (row, record) in records.iter().enumerate() {
        if record.len() < min_width {
            return Err(AdapterError::MalformedTable(format!(
                "data row {} has {} columns, at least {} required (missing {})",
                row,
                record.len(),
                min_width,
                schema.widest_column()
            )));
        }

        rows.push(UploadedRecord::new(
            row,
            record.iter().map(str::to_string).collect(),
        ));
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "id,age,rem,deep,exercise,reserved,movement";

    fn table(data_rows: usize) -> String {
        let mut csv = String::from(HEADER);
        for i in 0..data_rows {
            csv.push_str(&format!("\np1,61,20.5,14.0,3,x,{}.5", i));
        }
        csv.push('\n');
        csv
    }

    #[test]
    fn test_parses_exactly_series_len_rows() {
        let rows = parse_upload(table(24).as_bytes()).expect("Should parse");
        assert_eq!(rows.len(), 24);
        assert_eq!(rows[0].row(), 0);
        assert_eq!(rows[23].field(Column::Movement), Some("23.5"));
    }

    #[test]
    fn test_stops_after_series_len_rows() {
        let mut csv = table(24);
        // A broken row after the series is never read
        csv.push_str("only,two\n");
        let rows = parse_upload(csv.as_bytes()).expect("Trailing rows are ignored");
        assert_eq!(rows.len(), 24);
    }

    #[test]
    fn test_invalid_utf8_is_encoding_error() {
        let mut bytes = table(24).into_bytes();
        bytes[3] = 0xFF;
        assert!(matches!(
            parse_upload(&bytes),
            Err(AdapterError::Encoding(_))
        ));
    }

    #[test]
    fn test_empty_upload_is_malformed() {
        assert!(matches!(
            parse_upload(b""),
            Err(AdapterError::MalformedTable(_))
        ));
    }

    #[test]
    fn test_header_only_is_insufficient_rows() {
        match parse_upload(format!("{}\n", HEADER).as_bytes()) {
            Err(AdapterError::InsufficientRows { found, required }) => {
                assert_eq!(found, 0);
                assert_eq!(required, 24);
            }
            other => panic!("expected InsufficientRows, got {:?}", other),
        }
    }

    #[test]
    fn test_short_table_reports_count() {
        match parse_upload(table(23).as_bytes()) {
            Err(AdapterError::InsufficientRows { found, .. }) => assert_eq!(found, 23),
            other => panic!("expected InsufficientRows, got {:?}", other),
        }
    }

    #[test]
    fn test_narrow_row_is_malformed() {
        let mut csv = String::from(HEADER);
        csv.push_str("\np1,61,20.5,14.0,3,x");
        for i in 1..24 {
            csv.push_str(&format!("\np1,61,20.5,14.0,3,x,{}", i));
        }
        let err = parse_upload(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, AdapterError::MalformedTable(ref msg) if msg.contains("data row 0")));
    }

    #[test]
    fn test_short_table_with_narrow_row_is_insufficient_rows() {
        let mut csv = String::from(HEADER);
        csv.push_str("\np1,61,20.5,14.0,3,x");
        for i in 1..10 {
            csv.push_str(&format!("\np1,61,20.5,14.0,3,x,{}", i));
        }
        match parse_upload(csv.as_bytes()) {
            Err(AdapterError::InsufficientRows { found, required }) => {
                assert_eq!(found, 10);
                assert_eq!(required, 24);
            }
            other => panic!("expected InsufficientRows, got {:?}", other),
        }
    }

    #[test]
    fn test_blank_lines_and_whitespace() {
        let mut csv = String::from(HEADER);
        csv.push('\n');
        for i in 0..24 {
            csv.push_str(&format!("\n p1 , 61 ,20.5,14.0,3,x, {} ", i));
        }
        let rows = parse_upload(csv.as_bytes()).expect("Should parse");
        assert_eq!(rows.len(), 24);
        assert_eq!(rows[0].field(Column::Age), Some("61"));
        assert_eq!(rows[5].field(Column::Movement), Some("5"));
    }

    #[test]
    fn test_crlf_line_endings() {
        let csv = table(24).replace('\n', "\r\n");
        let rows = parse_upload(csv.as_bytes()).expect("Should parse");
        assert_eq!(rows[1].field(Column::Movement), Some("1.5"));
    }
}
