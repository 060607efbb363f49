//! Static CSV downloads.

use crate::SourceError;
use crate::table::{Table, decode_latin1, parse_csv};

/// Downloads a CSV and parses it into a [`Table`].
///
/// Bodies that are not valid UTF-8 are read as ISO-8859-1.
///
/// # Errors
///
/// Returns [`SourceError`] if the request fails, the server answers with a
/// non-2xx status, or the body is not CSV.
pub async fn fetch_csv(client: &reqwest::Client, url: &str) -> Result<Table, SourceError> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }

    let bytes = response.bytes().await?;
    log::debug!("Downloaded {} bytes from {url}", bytes.len());

    let table = parse_csv_bytes(&bytes)?;
    log::info!("Parsed {} records from CSV at {url}", table.len());

    Ok(table)
}

/// Parses a CSV body, falling back to ISO-8859-1 when it is not UTF-8.
fn parse_csv_bytes(bytes: &[u8]) -> Result<Table, SourceError> {
    let text = std::str::from_utf8(bytes).map_or_else(
        |_| {
            log::debug!("CSV body is not UTF-8, decoding as ISO-8859-1");
            decode_latin1(bytes)
        },
        str::to_string,
    );
    Ok(parse_csv(&text)?)
}
