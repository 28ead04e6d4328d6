//! Text rendering of catalog records for the terminal

use crate::data::{CatalogRecord, CatalogSnapshot, FieldValue};
use crate::gate::LoadOrigin;

/// Placeholder shown for NaN numeric fields
const MISSING: &str = "-";

/// Column separator
const GAP: &str = "  ";

/// Renders records as an aligned text table
///
/// Columns follow the field order of the first record.
pub fn render_table(records: &[CatalogRecord]) -> String {
    let Some(first) = records.first() else {
        return "(no records)".to_string();
    };

    let headers: Vec<&str> = first.names().collect();
    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|record| {
            headers
                .iter()
                .map(|name| record.get(name).map(cell_text).unwrap_or_default())
                .collect()
        })
        .collect();

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, header)| {
            rows.iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(header.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(format_row(headers.iter().copied(), &widths));
    lines.push(format_row(widths.iter().map(|w| "-".repeat(*w)), &widths));
    for row in &rows {
        lines.push(format_row(row.iter().map(String::as_str), &widths));
    }

    lines.join("\n")
}

/// Renders records as pretty-printed JSON
pub fn render_json(records: &[CatalogRecord]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(records)
}

/// One-line description of a load, e.g. for watch mode
pub fn summary_line(snapshot: &CatalogSnapshot, origin: LoadOrigin) -> String {
    let source = match origin {
        LoadOrigin::Cache => "cache",
        LoadOrigin::Network => "network",
        LoadOrigin::StaleFallback => "offline copy",
    };
    format!(
        "{} records from {} (captured {})",
        snapshot.len(),
        source,
        snapshot.captured_at.format("%Y-%m-%d %H:%M:%S UTC")
    )
}

fn cell_text(value: &FieldValue) -> String {
    if value.is_nan() {
        MISSING.to_string()
    } else {
        value.to_string()
    }
}

fn format_row<I, S>(cells: I, widths: &[usize]) -> String
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    let padded: Vec<String> = cells
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell.as_ref(), width = *width))
        .collect();
    padded.join(GAP).trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::parse;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_render_table_aligns_columns() {
        let records = parse("name,price,stock\nRose,10,5\n\"Oud, Noir\",129.5,");
        let table = render_table(&records);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "name       price  stock");
        assert_eq!(lines[1], "---------  -----  -----");
        assert_eq!(lines[2], "Rose       10     5");
        assert_eq!(lines[3], "Oud, Noir  129.5  -");
    }

    #[test]
    fn test_render_table_empty() {
        assert_eq!(render_table(&[]), "(no records)");
    }

    #[test]
    fn test_render_json_uses_null_for_nan() {
        let records = parse("name,stock\nRose,abc");
        let json = render_json(&records).unwrap();

        assert!(json.contains("\"name\": \"Rose\""));
        assert!(json.contains("\"stock\": null"));
    }

    #[test]
    fn test_summary_line() {
        let snapshot = CatalogSnapshot::new(
            parse("name\nA\nB"),
            Utc.with_ymd_and_hms(2026, 5, 6, 7, 8, 9).unwrap(),
        );

        assert_eq!(
            summary_line(&snapshot, LoadOrigin::StaleFallback),
            "2 records from offline copy (captured 2026-05-06 07:08:09 UTC)"
        );
    }
}
