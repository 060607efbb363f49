//! Flat string tables parsed from CSV responses.

use std::collections::BTreeMap;
use std::str::FromStr;

/// A parsed CSV: one header row plus string cells.
///
/// Cells are trimmed on parse and an empty cell reads as missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    #[must_use]
    pub const fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Column names in file order.
    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Index of a column by exact header name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cell at `row` in column `name`; `None` for missing or empty cells.
    #[must_use]
    pub fn get(&self, row: usize, name: &str) -> Option<&str> {
        let col = self.column(name)?;
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Number of data rows, excluding the header.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterates rows with by-name access.
    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(move |cells| Row {
            headers: &self.headers,
            cells,
        })
    }

    /// Every row as a header → value map, empty cells omitted.
    #[must_use]
    pub fn rows_as_maps(&self) -> Vec<BTreeMap<String, String>> {
        self.rows()
            .map(|row| {
                self.headers
                    .iter()
                    .filter_map(|h| row.get(h).map(|v| (h.clone(), v.to_string())))
                    .collect()
            })
            .collect()
    }
}

/// One table row.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    headers: &'a [String],
    cells: &'a [String],
}

impl<'a> Row<'a> {
    /// Cell in column `name`; `None` for missing or empty cells.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&'a str> {
        let col = self.headers.iter().position(|h| h == name)?;
        self.cells
            .get(col)
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }

    /// First non-empty cell among `names`.
    #[must_use]
    pub fn get_any(&self, names: &[&str]) -> Option<&'a str> {
        names.iter().find_map(|n| self.get(n))
    }

    /// Parses a cell, treating unparseable values as missing.
    #[must_use]
    pub fn parse<T: FromStr>(&self, name: &str) -> Option<T> {
        self.get(name).and_then(|s| s.parse().ok())
    }
}

/// Decodes ISO-8859-1 bytes. Every byte maps to the code point of the same
/// value, so decoding never fails.
#[must_use]
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Parses CSV text into a [`Table`].
///
/// Short rows are padded with empty cells so that every row has one cell
/// per header.
///
/// # Errors
///
/// Returns [`csv::Error`] if the input is not valid CSV.
pub fn parse_csv(text: &str) -> Result<Table, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_owned())
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let row: Vec<String> = (0..headers.len())
            .map(|i| record.get(i).unwrap_or("").trim().to_owned())
            .collect();
        rows.push(row);
    }

    Ok(Table::new(headers, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_reads_by_name() {
        let table = parse_csv("PWSID, FAC_NAME ,FAC_LAT\nNJ01,Alpha,40.5\nNJ02,,\n").unwrap();
        assert_eq!(table.headers(), ["PWSID", "FAC_NAME", "FAC_LAT"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(0, "FAC_NAME"), Some("Alpha"));
        assert_eq!(table.get(1, "FAC_NAME"), None);
        assert_eq!(table.get(0, "MISSING"), None);

        let rows: Vec<_> = table.rows().collect();
        assert_eq!(rows[0].parse::<f64>("FAC_LAT"), Some(40.5));
        assert_eq!(rows[1].parse::<f64>("FAC_LAT"), None);
    }

    #[test]
    fn short_rows_are_padded() {
        let table = parse_csv("A,B,C\n1\n").unwrap();
        assert_eq!(table.get(0, "A"), Some("1"));
        assert_eq!(table.get(0, "C"), None);
        assert_eq!(table.rows_as_maps()[0].len(), 1);
    }

    #[test]
    fn header_only_is_empty() {
        let table = parse_csv("A,B\n").unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn latin1_decodes_high_bytes() {
        assert_eq!(decode_latin1(b"Caf\xe9"), "Café");
    }

    #[test]
    fn get_any_falls_back() {
        let table = parse_csv("PWS_NAME,FAC_NAME\nBeta,\n").unwrap();
        let row = table.rows().next().unwrap();
        assert_eq!(row.get_any(&["FAC_NAME", "PWS_NAME"]), Some("Beta"));
    }
}
