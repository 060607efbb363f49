//! Terminal summaries of a page and its CSV/JSON export.

use std::path::Path;

use nj_sdwa_dashboard::Page;
use nj_sdwa_render::{BarChart, DataTable};

/// Rows of the table printed to the terminal.
const PREVIEW_ROWS: usize = 10;

/// Bars of each chart printed to the terminal.
const PREVIEW_BARS: usize = 8;

/// Widest cell printed before truncation.
const MAX_CELL_WIDTH: usize = 32;

fn truncate(cell: &str) -> String {
    if cell.chars().count() <= MAX_CELL_WIDTH {
        return cell.to_string();
    }
    let mut short: String = cell.chars().take(MAX_CELL_WIDTH - 1).collect();
    short.push('…');
    short
}

/// Renders up to `rows` rows as space-aligned columns.
pub fn format_table(table: &DataTable, rows: usize) -> String {
    let shown: Vec<Vec<String>> = std::iter::once(&table.headers)
        .chain(table.rows.iter().take(rows))
        .map(|row| row.iter().map(|c| truncate(c)).collect())
        .collect();

    let mut widths = vec![0; table.headers.len()];
    for row in &shown {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    for row in &shown {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect();
        out.push_str(line.join("  ").trim_end());
        out.push('\n');
    }
    if table.len() > rows {
        out.push_str(&format!("... {} more rows\n", table.len() - rows));
    }
    out
}

/// Renders a chart's largest bars.
pub fn format_chart(chart: &BarChart) -> String {
    let mut out = format!("{}\n", chart.title);
    if chart.is_empty() {
        out.push_str("  (no data)\n");
        return out;
    }
    for bar in chart.bars.iter().take(PREVIEW_BARS) {
        let label = match &bar.series {
            Some(series) => format!("{} [{series}]", truncate(&bar.label)),
            None => truncate(&bar.label),
        };
        out.push_str(&format!("  {label:<40} {}\n", bar.value));
    }
    if chart.bars.len() > PREVIEW_BARS {
        out.push_str(&format!("  ... {} more\n", chart.bars.len() - PREVIEW_BARS));
    }
    out
}

/// Prints a page, then writes its CSV to `csv` if given.
///
/// With `json` set, the whole page is printed as JSON instead.
///
/// # Errors
///
/// * If the page cannot be serialized or the CSV cannot be written
pub fn report<P: Page>(
    page: &P,
    charts: &[&BarChart],
    csv: Option<&Path>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(page)?);
    } else {
        for chart in charts {
            println!("{}", format_chart(chart));
        }
        println!("{} rows", page.table().len());
        print!("{}", format_table(page.table(), PREVIEW_ROWS));
    }

    if let Some(path) = csv {
        std::fs::write(path, page.csv())?;
        log::info!("Wrote {} ({})", path.display(), P::CSV_FILENAME);
    }
    Ok(())
}
