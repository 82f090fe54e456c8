//! # CSV Export
//!
//! One CSV renderer used identically for expenses, drawer transactions, and
//! inventory exports.
//!
//! Format: UTF-8 with BOM (so Excel detects the encoding), CRLF line
//! endings, RFC-4180 quoting. Fields containing a comma, quote, or newline
//! are wrapped in quotes with internal quotes doubled; the doubling is
//! reversible, so any exported field parses back to its original string.

/// UTF-8 byte order mark. Prepended so spreadsheet applications pick the
/// right encoding for accented characters.
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

const SEPARATOR: char = ',';
const LINE_ENDING: &str = "\r\n";

// =============================================================================
// Field Escaping
// =============================================================================

/// Quotes a field per RFC-4180 when it contains a separator, quote, or
/// newline; returns it untouched otherwise.
pub fn escape_field(value: &str) -> String {
    if value.contains(SEPARATOR) || value.contains('"') || value.contains('\n') || value.contains('\r')
    {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Reverses [`escape_field`]: strips surrounding quotes and un-doubles
/// internal quotes. Unquoted input is returned unchanged.
pub fn unescape_field(value: &str) -> String {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 && bytes[0] == b'"' && bytes[bytes.len() - 1] == b'"' {
        value[1..value.len() - 1].replace("\"\"", "\"")
    } else {
        value.to_string()
    }
}

// =============================================================================
// Document Builder
// =============================================================================

/// A CSV document: header row, data rows, optional trailing summary rows.
#[derive(Debug, Clone, Default)]
pub struct CsvDocument {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    summary: Vec<Vec<String>>,
}

impl CsvDocument {
    /// Starts a document with the given header row.
    pub fn new<S: Into<String>>(headers: impl IntoIterator<Item = S>) -> Self {
        CsvDocument {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
            summary: Vec::new(),
        }
    }

    /// Appends one data row.
    pub fn push_row<S: Into<String>>(&mut self, row: impl IntoIterator<Item = S>) {
        self.rows.push(row.into_iter().map(Into::into).collect());
    }

    /// Appends one trailing summary row (totals, counts).
    pub fn push_summary<S: Into<String>>(&mut self, row: impl IntoIterator<Item = S>) {
        self.summary.push(row.into_iter().map(Into::into).collect());
    }

    /// Number of data rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Renders the document: BOM, header, data rows, summary rows, CRLF
    /// endings throughout.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::from(UTF8_BOM);
        let mut write_line = |fields: &[String], out: &mut Vec<u8>| {
            let line = fields
                .iter()
                .map(|f| escape_field(f))
                .collect::<Vec<_>>()
                .join(",");
            out.extend_from_slice(line.as_bytes());
            out.extend_from_slice(LINE_ENDING.as_bytes());
        };

        write_line(&self.headers, &mut out);
        for row in &self.rows {
            write_line(row, &mut out);
        }
        for row in &self.summary {
            write_line(row, &mut out);
        }
        out
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_fields_pass_through() {
        assert_eq!(escape_field("Rent"), "Rent");
        assert_eq!(escape_field("1200.00"), "1200.00");
    }

    #[test]
    fn special_fields_round_trip() {
        // Property: quoting is reversible for commas, quotes, and newlines.
        let cases = [
            "a,b",
            "say \"hi\"",
            "line1\nline2",
            "crlf\r\nend",
            "all, of \"it\"\ntogether",
            "\"leading quote",
        ];
        for original in cases {
            let escaped = escape_field(original);
            assert!(escaped.starts_with('"') && escaped.ends_with('"'));
            assert_eq!(unescape_field(&escaped), original);
        }
    }

    #[test]
    fn unescape_leaves_unquoted_input_alone() {
        assert_eq!(unescape_field("plain"), "plain");
        assert_eq!(unescape_field(""), "");
        assert_eq!(unescape_field("\""), "\"");
    }

    #[test]
    fn document_layout() {
        let mut doc = CsvDocument::new(["Date", "Category", "Amount"]);
        doc.push_row(["2026-08-27", "Rent, utilities", "1200.00"]);
        doc.push_summary(["", "Total", "1200.00"]);

        let bytes = doc.to_bytes();
        assert!(bytes.starts_with(UTF8_BOM));

        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        let lines: Vec<&str> = text.split("\r\n").collect();
        assert_eq!(lines[0], "Date,Category,Amount");
        assert_eq!(lines[1], "2026-08-27,\"Rent, utilities\",1200.00");
        assert_eq!(lines[2], ",Total,1200.00");
        // Trailing CRLF leaves one empty tail segment.
        assert_eq!(lines[3], "");
    }
}
