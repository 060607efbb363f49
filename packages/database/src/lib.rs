#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Read-only access to the local `EJScreen` `SQLite` database.
//!
//! The database ships two tables: the 2024 state rankings for New Jersey
//! block groups, keyed by `ID` (the block group GEOID), and a metadata
//! table describing each column. Queries always bind ids as parameters.

use std::fmt::Write as _;
use std::path::Path;

use moosicbox_json_utils::database::ToValue as _;
use nj_sdwa_models::{EjMeasure, EjScores};
use switchy_database::{Database, DatabaseValue};
use switchy_database_connection::init_sqlite_rusqlite;

/// State rankings table.
pub const SCORES_TABLE: &str = "EJSCREEN_2024_StateRankings_NJ";

/// Column metadata table (the name's spelling matches the shipped file).
pub const DESCRIPTIONS_TABLE: &str = "2024_EJSCREEEN_columns-explained";

/// Maximum bound parameters per `IN (...)` query.
const ID_CHUNK_SIZE: usize = 500;

/// Errors that can occur while reading the `EJScreen` database.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// Query failed.
    #[error("Database error: {0}")]
    Database(#[from] switchy_database::DatabaseError),

    /// The database file could not be opened.
    #[error("Failed to open database: {0}")]
    Init(String),
}

/// Opens the `EJScreen` `SQLite` file.
///
/// # Errors
///
/// Returns [`DbError::Init`] if the file is missing or cannot be opened.
pub fn open_db(path: &Path) -> Result<Box<dyn Database>, DbError> {
    if !path.is_file() {
        return Err(DbError::Init(format!(
            "{} does not exist",
            path.display()
        )));
    }

    log::debug!("Opening EJScreen database at {}", path.display());
    init_sqlite_rusqlite(Some(path)).map_err(|e| DbError::Init(e.to_string()))
}

/// Builds `SELECT "ID", <measures> FROM <scores> WHERE "ID" IN ($1, ..., $n)`.
fn scores_sql(id_count: usize) -> String {
    let mut sql = String::from("SELECT \"ID\"");
    for measure in EjMeasure::all() {
        write!(sql, ", \"{}\"", measure.column()).ok();
    }
    write!(sql, " FROM \"{SCORES_TABLE}\" WHERE \"ID\" IN (").ok();
    for i in 1..=id_count {
        if i > 1 {
            sql.push_str(", ");
        }
        write!(sql, "${i}").ok();
    }
    sql.push(')');
    sql
}

/// Reads a numeric cell regardless of whether it was stored as REAL,
/// INTEGER or TEXT.
#[allow(clippy::cast_precision_loss)]
fn numeric(row: &switchy_database::Row, col: &str) -> Option<f64> {
    if let Ok(value) = row.to_value::<Option<f64>>(col) {
        return value.filter(|v| v.is_finite());
    }
    if let Ok(value) = row.to_value::<Option<i64>>(col) {
        return value.map(|v| v as f64);
    }
    row.to_value::<Option<String>>(col)
        .ok()
        .flatten()
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

fn row_id(row: &switchy_database::Row) -> Option<String> {
    row.to_value::<String>("ID")
        .ok()
        .or_else(|| row.to_value::<i64>("ID").ok().map(|id| id.to_string()))
}

/// Fetches every measure for the given block group ids.
///
/// Ids are bound as parameters in chunks; an empty id list returns an
/// empty result without touching the database. Rows come back in database
/// order, one per matching id.
///
/// # Errors
///
/// Returns [`DbError`] if a query fails.
pub async fn query_ej_scores(
    db: &dyn Database,
    geoids: &[String],
) -> Result<Vec<EjScores>, DbError> {
    let mut scores = Vec::new();

    for chunk in geoids.chunks(ID_CHUNK_SIZE) {
        let params: Vec<DatabaseValue> = chunk
            .iter()
            .map(|id| DatabaseValue::String(id.clone()))
            .collect();

        let rows = db.query_raw_params(&scores_sql(chunk.len()), &params).await?;

        for row in &rows {
            let Some(geoid) = row_id(row) else {
                log::warn!("Skipping {SCORES_TABLE} row without an ID");
                continue;
            };
            let values = EjMeasure::all()
                .iter()
                .map(|m| (*m, numeric(row, m.column())))
                .collect();
            scores.push(EjScores { geoid, values });
        }
    }

    log::debug!(
        "Loaded EJScreen scores for {} of {} block groups",
        scores.len(),
        geoids.len()
    );

    Ok(scores)
}

/// Reads the database's own description of each known measure.
///
/// Columns the metadata table describes that are not [`EjMeasure`]s are
/// skipped. Output is in [`EjMeasure`] order.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub async fn query_column_descriptions(
    db: &dyn Database,
) -> Result<Vec<(EjMeasure, String)>, DbError> {
    let rows = db
        .query_raw_params(
            &format!("SELECT \"Column Names\", \"Description\" FROM \"{DESCRIPTIONS_TABLE}\""),
            &[],
        )
        .await?;

    let mut descriptions: Vec<(EjMeasure, String)> = rows
        .iter()
        .filter_map(|row| {
            let column: String = row.to_value("Column Names").ok()?;
            let description: String = row.to_value("Description").ok()?;
            EjMeasure::from_column(&column).map(|m| (m, description.trim().to_string()))
        })
        .collect();

    descriptions.sort_by_key(|(m, _)| *m);
    descriptions.dedup_by_key(|(m, _)| *m);

    Ok(descriptions)
}
