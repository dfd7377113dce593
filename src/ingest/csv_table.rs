//! Header-agnostic CSV reading for spreadsheet exports.
//!
//! The sheets are hand-edited, so nothing here fails: malformed quoting is
//! accumulated best-effort and short rows are padded with empty cells.

use std::collections::HashMap;

use log::warn;

const BOM: char = '\u{feff}';

/// Split raw CSV text into rows of fields.
///
/// Quoted fields may contain commas, line breaks and `""` escapes. CRLF, LF
/// and bare CR all terminate a row. A leading byte-order mark is stripped and
/// blank lines (a single empty field) are dropped.
///
/// Quotes only open a quoted field at the very start of a field; anywhere
/// else they are kept as literal text, so ` "a,b"` splits on the comma.
pub fn parse_rows(text: &str) -> Vec<Vec<String>> {
    let body = text.strip_prefix(BOM).unwrap_or(text);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(body.as_bytes());

    let mut rows = Vec::new();
    let mut record = csv::ByteRecord::new();
    loop {
        match reader.read_byte_record(&mut record) {
            Ok(true) => {
                if record.len() == 1 && record[0].is_empty() {
                    continue;
                }
                rows.push(
                    record
                        .iter()
                        .map(|field| String::from_utf8_lossy(field).into_owned())
                        .collect(),
                );
            }
            Ok(false) => break,
            Err(e) => {
                // In-memory input has no I/O to retry; keep what was read
                warn!("stopping CSV read after {} rows: {}", rows.len(), e);
                break;
            }
        }
    }
    rows
}

/// One data row keyed by header name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CsvRecord {
    fields: HashMap<String, String>,
}

impl CsvRecord {
    /// Cell value for `name`, or `""` when the column does not exist.
    pub fn get(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or("")
    }

    pub fn has(&self, name: &str) -> bool {
        !self.get(name).is_empty()
    }

    pub fn len(&self) -> usize { self.fields.len() }
    pub fn is_empty(&self) -> bool { self.fields.is_empty() }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CsvRecord {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self { fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }
}

/// Header row plus the records built from it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub records: Vec<CsvRecord>,
}

impl CsvTable {
    pub fn from_rows(rows: Vec<Vec<String>>) -> Self {
        let mut rows = rows.into_iter();
        let Some(header_row) = rows.next() else {
            return Self::default();
        };
        let headers: Vec<String> = header_row.iter().map(|h| h.trim().to_string()).collect();
        let records = rows
            .map(|row| {
                // Extra cells past the header are ignored, missing ones read as ""
                headers
                    .iter()
                    .enumerate()
                    .map(|(idx, name)| {
                        let cell = row.get(idx).map(|c| c.trim()).unwrap_or("");
                        (name.clone(), cell.to_string())
                    })
                    .collect()
            })
            .collect();
        Self { headers, records }
    }

    pub fn parse(text: &str) -> Self {
        Self::from_rows(parse_rows(text))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h == name)
    }

    /// Names from `required` that the header row does not contain.
    pub fn missing_columns<'a>(&self, required: &[&'a str]) -> Vec<&'a str> {
        required.iter().copied().filter(|c| !self.has_column(c)).collect()
    }
}

/// First row becomes the field names; every later row becomes a record.
pub fn rows_to_records(rows: Vec<Vec<String>>) -> Vec<CsvRecord> {
    CsvTable::from_rows(rows).records
}
