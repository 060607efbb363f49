//! Tabular page output and CSV downloads.

use serde::Serialize;

use crate::RenderError;

/// A table as displayed on a page and offered for download.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DataTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl DataTable {
    #[must_use]
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: vec![],
        }
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// # Errors
    ///
    /// * If writing the CSV fails
    pub fn to_csv(&self) -> Result<String, RenderError> {
        write_csv(&self.headers, &self.rows)
    }
}

/// Writes a header row and data rows as CSV text.
///
/// # Errors
///
/// * If a record cannot be written
/// * If the output is not valid UTF-8
pub fn write_csv<H, R>(headers: &[H], rows: &[R]) -> Result<String, RenderError>
where
    H: AsRef<str>,
    R: AsRef<[String]>,
{
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());

    let headers: Vec<&str> = headers.iter().map(AsRef::as_ref).collect();
    writer.write_record(&headers)?;
    for row in rows {
        writer.write_record(row.as_ref())?;
    }

    let bytes = writer.into_inner().map_err(csv::IntoInnerError::into_error)?;
    Ok(String::from_utf8(bytes)?)
}

/// Formats an optional number for a table cell; missing values are blank.
#[must_use]
pub fn cell<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
