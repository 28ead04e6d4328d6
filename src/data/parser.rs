//! CSV record parser for spreadsheet exports
//!
//! Turns the raw text of a published sheet into ordered [`CatalogRecord`]s.
//! Parsing never fails: rows with too few values are dropped and numeric
//! fields that do not parse become NaN.

use tracing::debug;

use super::{is_numeric_field, CatalogRecord, FieldValue};

/// How rows with more values than headers are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    /// Extra trailing values are ignored and the row is kept
    #[default]
    Lenient,
    /// Rows with extra values are dropped like short rows
    Strict,
}

/// Result of parsing with row accounting
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseReport {
    /// Records in source order
    pub records: Vec<CatalogRecord>,
    /// Rows dropped for having fewer values than headers
    pub short_rows: usize,
    /// Rows with more values than headers (kept in lenient mode, dropped in strict)
    pub long_rows: usize,
}

/// Parses CSV text into records using [`ParseMode::Lenient`]
pub fn parse(raw_text: &str) -> Vec<CatalogRecord> {
    parse_with(raw_text, ParseMode::Lenient).records
}

/// Parses CSV text into records, reporting how many rows were malformed
///
/// The first line is the header row. Header names are lowercased and define
/// the field order of every record. Input with fewer than two lines yields
/// no records. A repeated header name keeps its first position and the
/// value of its last column.
pub fn parse_with(raw_text: &str, mode: ParseMode) -> ParseReport {
    let mut report = ParseReport::default();

    let lines: Vec<&str> = raw_text.trim().lines().collect();
    if lines.len() < 2 {
        return report;
    }

    let headers: Vec<String> = split_fields(lines[0])
        .into_iter()
        .map(|header| header.to_lowercase())
        .collect();

    for (index, line) in lines.iter().enumerate().skip(1) {
        let values = split_fields(line);

        if values.len() < headers.len() {
            debug!(
                line = index + 1,
                expected = headers.len(),
                found = values.len(),
                "dropping short row"
            );
            report.short_rows += 1;
            continue;
        }

        if values.len() > headers.len() {
            report.long_rows += 1;
            if mode == ParseMode::Strict {
                debug!(
                    line = index + 1,
                    expected = headers.len(),
                    found = values.len(),
                    "dropping row with extra values"
                );
                continue;
            }
        }

        let mut record = CatalogRecord::new();
        for (header, value) in headers.iter().zip(values) {
            let value = if is_numeric_field(header) {
                FieldValue::Number(coerce_number(&value))
            } else {
                FieldValue::Text(value)
            };
            record.push(header.clone(), value);
        }
        report.records.push(record);
    }

    report
}

/// Splits one line on commas outside double quotes
///
/// Each `"` toggles the quoted state and is not kept. Every value is cleaned
/// with [`clean_value`].
fn split_fields(line: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => values.push(clean_value(&std::mem::take(&mut current))),
            _ => current.push(ch),
        }
    }
    values.push(clean_value(&current));

    values
}

/// Strips one pair of wrapping double quotes, then trims whitespace
fn clean_value(raw: &str) -> String {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(trimmed)
        .trim()
        .to_string()
}

/// Converts field text to a number, with NaN for empty, invalid or non-finite input
///
/// NaN is the only non-finite value a record can hold.
fn coerce_number(raw: &str) -> f64 {
    match raw.parse::<f64>() {
        Ok(n) if n.is_finite() => n,
        _ => f64::NAN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoted_comma_stays_in_field() {
        let records = parse("name,price\n\"A, B\",10");

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text("name"), Some("A, B"));
        assert_eq!(records[0].number("price"), Some(10.0));
    }

    #[test]
    fn test_short_row_is_dropped() {
        let records = parse("a,b,c\n1,2");
        assert!(records.is_empty());
    }

    #[test]
    fn test_numeric_coercion_with_sentinel() {
        let records = parse("name,price,stock\nX,9.5,abc");

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.text("name"), Some("X"));
        assert_eq!(record.number("price"), Some(9.5));
        assert!(record.number("stock").unwrap().is_nan());
    }

    #[test]
    fn test_empty_numeric_field_is_nan() {
        let records = parse("name,stock\nX,");
        assert!(records[0].get("stock").unwrap().is_nan());
    }

    #[test]
    fn test_fewer_than_two_lines_yields_nothing() {
        assert!(parse("").is_empty());
        assert!(parse("name,price").is_empty());
        assert!(parse("name,price\n").is_empty());
        assert!(parse("\n\n  \n").is_empty());
    }

    #[test]
    fn test_headers_are_trimmed_and_lowercased() {
        let records = parse(" Name , Gender ,Notes\nRose,female,floral");

        assert_eq!(
            records[0].names().collect::<Vec<_>>(),
            vec!["name", "gender", "notes"]
        );
        assert_eq!(records[0].text("gender"), Some("female"));
    }

    #[test]
    fn test_uppercase_numeric_header_is_coerced() {
        let records = parse("Name,PRICE\nX,12");
        assert_eq!(records[0].number("price"), Some(12.0));
    }

    #[test]
    fn test_rows_keep_source_order() {
        let text = "name,price\nfirst,1\nsecond,2\nbad\nthird,3";
        let names: Vec<_> = parse(text)
            .iter()
            .map(|record| record.text("name").unwrap().to_string())
            .collect();

        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_crlf_line_endings() {
        let records = parse("name,price\r\nA,1\r\nB,2\r\n");

        assert_eq!(records.len(), 2);
        assert_eq!(records[1].text("name"), Some("B"));
        assert_eq!(records[1].number("price"), Some(2.0));
    }

    #[test]
    fn test_values_are_trimmed() {
        let records = parse("name,notes\n  Amber  ,\"  warm, sweet  \"");

        assert_eq!(records[0].text("name"), Some("Amber"));
        assert_eq!(records[0].text("notes"), Some("warm, sweet"));
    }

    #[test]
    fn test_doubled_quotes_are_dropped() {
        let records = parse("name,notes\n\"Say \"\"hi\"\"\",x");
        assert_eq!(records[0].text("name"), Some("Say hi"));
    }

    #[test]
    fn test_extra_values_ignored_in_lenient_mode() {
        let report = parse_with("name,price\nA,1,extra", ParseMode::Lenient);

        assert_eq!(report.records.len(), 1);
        assert_eq!(report.long_rows, 1);
        assert_eq!(report.records[0].len(), 2);
        assert!(report.records[0].get("extra").is_none());
    }

    #[test]
    fn test_extra_values_dropped_in_strict_mode() {
        let report = parse_with("name,price\nA,1,extra\nB,2", ParseMode::Strict);

        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].text("name"), Some("B"));
        assert_eq!(report.long_rows, 1);
    }

    #[test]
    fn test_report_counts_short_rows() {
        let report = parse_with("a,b,c\n1,2\n1,2,3\n1", ParseMode::Lenient);

        assert_eq!(report.records.len(), 1);
        assert_eq!(report.short_rows, 2);
        assert_eq!(report.long_rows, 0);
    }

    #[test]
    fn test_blank_line_is_a_row_for_single_column() {
        let records = parse("name\nA\n\nB");

        assert_eq!(records.len(), 3);
        assert_eq!(records[1].text("name"), Some(""));
    }

    #[test]
    fn test_blank_line_is_short_for_multiple_columns() {
        let report = parse_with("name,price\nA,1\n\nB,2", ParseMode::Lenient);

        assert_eq!(report.records.len(), 2);
        assert_eq!(report.short_rows, 1);
    }

    #[test]
    fn test_non_finite_numbers_become_nan() {
        let records = parse("name,price,stock\nX,inf,1e999\nY,-infinity,NaN");

        for record in &records {
            assert!(record.number("price").unwrap().is_nan());
            assert!(record.number("stock").unwrap().is_nan());
        }
    }

    #[test]
    fn test_repeated_header_keeps_last_value() {
        let records = parse("Name,name,price\nA,B,1");

        assert_eq!(records[0].len(), 2);
        assert_eq!(records[0].text("name"), Some("B"));
        assert_eq!(records[0].names().collect::<Vec<_>>(), vec!["name", "price"]);

        let json = serde_json::to_string(&records[0]).unwrap();
        assert_eq!(json, r#"{"name":"B","price":1.0}"#);
    }

    #[test]
    fn test_every_record_has_header_key_set() {
        let text = "name,price,stock\nA,1,2\nB,,\n\"C, D\",3.25,4";
        for record in parse(text) {
            assert_eq!(
                record.names().collect::<Vec<_>>(),
                vec!["name", "price", "stock"]
            );
        }
    }

    #[test]
    fn test_parsing_is_idempotent() {
        let text = "name,price,stock\nA,1,x\nB,2.5,3";
        assert_eq!(parse(text), parse(text));
    }

    #[test]
    fn test_split_fields_keeps_empty_values() {
        assert_eq!(split_fields("a,,c,"), vec!["a", "", "c", ""]);
    }
}
